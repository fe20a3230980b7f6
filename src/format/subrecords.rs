//! Parsing of heap-dump segment sub-records.
//!
//! `HEAP_DUMP` and `HEAP_DUMP_SEGMENT` bodies are a packed sequence of sub-records:
//! GC roots, class dumps, instance dumps, and array dumps. Unlike top-level records,
//! sub-records carry no length prefix - each must be fully understood to find the
//! next one, which is why an unknown sub-record tag is unrecoverable corruption.
//!
//! Parsing here is header-deep: class dumps are decoded completely (their field
//! layouts are required by everything downstream), while instance and array payloads
//! are skipped over and located by offset for lazy decoding later.
//!
//! # Key Components
//!
//! - [`crate::format::subrecords::SubRecord`] - Tagged union over the sub-record kinds
//! - [`crate::format::subrecords::read_sub_record`] - Decode one sub-record at the cursor
//! - [`crate::format::subrecords::GcRoot`] - A GC root declaration with its provenance
//! - [`crate::format::subrecords::ClassDump`] - Fully decoded class structure

use strum::Display;

use crate::{
    file::parser::Parser,
    format::tags::{BasicType, SubRecordTag},
    Result,
};

/// Provenance of a GC root declaration.
///
/// The runtime reaches these objects directly (stack, static, thread, JNI handle)
/// without traversal; they are the origins for all reachability analysis.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GcRootKind {
    /// Root of unknown provenance.
    Unknown,
    /// JNI global reference.
    JniGlobal,
    /// JNI local reference in a native frame.
    JniLocal,
    /// Local variable on a Java stack frame.
    JavaFrame,
    /// Reference on a native stack.
    NativeStack,
    /// System class that is never unloaded.
    StickyClass,
    /// Object a thread is blocked on.
    ThreadBlock,
    /// Monitor currently in use.
    MonitorUsed,
    /// Running thread object.
    ThreadObject,
}

/// A GC root declaration from a heap-dump segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GcRoot {
    /// The rooted object's identifier.
    pub object_id: u64,
    /// Why the runtime considers this object a root.
    pub kind: GcRootKind,
}

/// Layout of one declared instance field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// String identifier of the field name.
    pub name_id: u64,
    /// Declared type of the field.
    pub ty: BasicType,
}

/// A fully decoded `CLASS_DUMP` sub-record.
///
/// Class dumps are the only sub-records decoded eagerly: their instance-field
/// layouts are required to interpret every instance payload, and their static
/// object references contribute edges to the object graph.
#[derive(Debug, Clone)]
pub struct ClassDump {
    /// The class object's identifier.
    pub class_id: u64,
    /// Superclass identifier, `0` for `java.lang.Object`.
    pub super_id: u64,
    /// Declared size of one instance's field data in bytes.
    pub instance_size: u32,
    /// Instance fields declared by this class (excluding superclasses), in file order.
    pub fields: Vec<FieldDescriptor>,
    /// Non-null object references held in static fields.
    pub static_refs: Vec<u64>,
    /// Total bytes of static field storage.
    pub static_storage: u32,
}

/// An `INSTANCE_DUMP` sub-record header; the field payload is located, not decoded.
#[derive(Debug, Clone, Copy)]
pub struct InstanceDump {
    /// The instance's identifier.
    pub object_id: u64,
    /// Identifier of the instance's class.
    pub class_id: u64,
    /// Absolute file offset of the field data.
    pub data_offset: u64,
    /// Length of the field data in bytes.
    pub data_len: u32,
}

/// An `OBJECT_ARRAY_DUMP` sub-record header; elements are located, not decoded.
#[derive(Debug, Clone, Copy)]
pub struct ObjectArrayDump {
    /// The array's identifier.
    pub object_id: u64,
    /// Identifier of the array's class.
    pub array_class_id: u64,
    /// Number of elements.
    pub count: u32,
    /// Absolute file offset of the element identifiers.
    pub elements_offset: u64,
}

/// A `PRIMITIVE_ARRAY_DUMP` sub-record header; the payload is skipped.
#[derive(Debug, Clone, Copy)]
pub struct PrimitiveArrayDump {
    /// The array's identifier.
    pub object_id: u64,
    /// Element type.
    pub element_type: BasicType,
    /// Number of elements.
    pub count: u32,
}

/// Tagged union over the sub-record kinds found in heap-dump segments.
#[derive(Debug, Clone)]
pub enum SubRecord {
    /// A GC root declaration.
    Root(GcRoot),
    /// A class structure dump.
    Class(ClassDump),
    /// A plain instance dump.
    Instance(InstanceDump),
    /// An object array dump.
    ObjectArray(ObjectArrayDump),
    /// A primitive array dump.
    PrimitiveArray(PrimitiveArrayDump),
}

/// Decode the sub-record at the parser's current position.
///
/// The parser must be positioned on a sub-record tag inside a heap-dump segment
/// body; on success it is left positioned on the next sub-record (or the segment
/// end).
///
/// # Arguments
/// * `parser` - Cursor over the complete dump, positioned on a sub-record tag
/// * `id_size` - Identifier width declared in the dump header
///
/// # Errors
/// Returns [`crate::Error::CorruptFormat`] for unknown sub-record tags, invalid
/// basic-type codes, or data that ends mid-structure. The error offset names the
/// sub-record's tag byte - the last position that was still well-formed.
pub fn read_sub_record(parser: &mut Parser<'_>, id_size: u32) -> Result<SubRecord> {
    let start = parser.pos() as u64;

    let raw_tag = parser
        .read_be::<u8>()
        .map_err(|_| corrupt_error!(start, "heap dump segment ends mid sub-record"))?;
    let Some(tag) = SubRecordTag::from_repr(raw_tag) else {
        return Err(corrupt_error!(
            start,
            "unknown heap dump sub-record tag 0x{:02x}",
            raw_tag
        ));
    };

    let result = match tag {
        SubRecordTag::RootUnknown => read_root(parser, id_size, GcRootKind::Unknown, 0),
        SubRecordTag::RootJniGlobal => {
            // Payload: object ID plus the JNI global ref ID (skipped).
            let root = read_root(parser, id_size, GcRootKind::JniGlobal, 0)?;
            parser.advance_by(id_size as usize)?;
            Ok(root)
        }
        SubRecordTag::RootJniLocal => read_root(parser, id_size, GcRootKind::JniLocal, 8),
        SubRecordTag::RootJavaFrame => read_root(parser, id_size, GcRootKind::JavaFrame, 8),
        SubRecordTag::RootNativeStack => read_root(parser, id_size, GcRootKind::NativeStack, 4),
        SubRecordTag::RootStickyClass => read_root(parser, id_size, GcRootKind::StickyClass, 0),
        SubRecordTag::RootThreadBlock => read_root(parser, id_size, GcRootKind::ThreadBlock, 4),
        SubRecordTag::RootMonitorUsed => read_root(parser, id_size, GcRootKind::MonitorUsed, 0),
        SubRecordTag::RootThreadObject => read_root(parser, id_size, GcRootKind::ThreadObject, 8),
        SubRecordTag::ClassDump => read_class_dump(parser, id_size, start),
        SubRecordTag::InstanceDump => read_instance_dump(parser, id_size),
        SubRecordTag::ObjectArrayDump => read_object_array_dump(parser, id_size),
        SubRecordTag::PrimitiveArrayDump => read_primitive_array_dump(parser, id_size, start),
    };

    result.map_err(|error| match error {
        crate::Error::OutOfBounds { .. } => {
            corrupt_error!(start, "truncated {} sub-record", tag)
        }
        other => other,
    })
}

fn read_root(
    parser: &mut Parser<'_>,
    id_size: u32,
    kind: GcRootKind,
    trailing: usize,
) -> Result<SubRecord> {
    let object_id = parser.read_id(id_size)?;
    parser.advance_by(trailing)?;
    Ok(SubRecord::Root(GcRoot { object_id, kind }))
}

fn read_class_dump(parser: &mut Parser<'_>, id_size: u32, start: u64) -> Result<SubRecord> {
    let class_id = parser.read_id(id_size)?;
    parser.read_be::<u32>()?; // stack trace serial
    let super_id = parser.read_id(id_size)?;
    // Loader, signers, protection domain, two reserved identifiers.
    parser.advance_by(5 * id_size as usize)?;
    let instance_size = parser.read_be::<u32>()?;

    let constant_count = parser.read_be::<u16>()?;
    for _ in 0..constant_count {
        parser.read_be::<u16>()?; // constant pool index
        let ty = read_basic_type(parser, start)?;
        parser.advance_by(ty.byte_size(id_size) as usize)?;
    }

    let static_count = parser.read_be::<u16>()?;
    let mut static_refs = Vec::new();
    let mut static_storage = 0u32;
    for _ in 0..static_count {
        parser.read_id(id_size)?; // field name string ID
        let ty = read_basic_type(parser, start)?;
        static_storage += ty.byte_size(id_size);
        if ty == BasicType::Object {
            let target = parser.read_id(id_size)?;
            if target != 0 {
                static_refs.push(target);
            }
        } else {
            parser.advance_by(ty.byte_size(id_size) as usize)?;
        }
    }

    let field_count = parser.read_be::<u16>()?;
    let mut fields = Vec::with_capacity(field_count as usize);
    for _ in 0..field_count {
        let name_id = parser.read_id(id_size)?;
        let ty = read_basic_type(parser, start)?;
        fields.push(FieldDescriptor { name_id, ty });
    }

    Ok(SubRecord::Class(ClassDump {
        class_id,
        super_id,
        instance_size,
        fields,
        static_refs,
        static_storage,
    }))
}

fn read_instance_dump(parser: &mut Parser<'_>, id_size: u32) -> Result<SubRecord> {
    let object_id = parser.read_id(id_size)?;
    parser.read_be::<u32>()?; // stack trace serial
    let class_id = parser.read_id(id_size)?;
    let data_len = parser.read_be::<u32>()?;
    let data_offset = parser.pos() as u64;
    parser.advance_by(data_len as usize)?;

    Ok(SubRecord::Instance(InstanceDump {
        object_id,
        class_id,
        data_offset,
        data_len,
    }))
}

fn read_object_array_dump(parser: &mut Parser<'_>, id_size: u32) -> Result<SubRecord> {
    let object_id = parser.read_id(id_size)?;
    parser.read_be::<u32>()?; // stack trace serial
    let count = parser.read_be::<u32>()?;
    let array_class_id = parser.read_id(id_size)?;
    let elements_offset = parser.pos() as u64;
    parser.advance_by(count as usize * id_size as usize)?;

    Ok(SubRecord::ObjectArray(ObjectArrayDump {
        object_id,
        array_class_id,
        count,
        elements_offset,
    }))
}

fn read_primitive_array_dump(
    parser: &mut Parser<'_>,
    id_size: u32,
    start: u64,
) -> Result<SubRecord> {
    let object_id = parser.read_id(id_size)?;
    parser.read_be::<u32>()?; // stack trace serial
    let count = parser.read_be::<u32>()?;
    let element_type = read_basic_type(parser, start)?;
    parser.advance_by(count as usize * element_type.byte_size(id_size) as usize)?;

    Ok(SubRecord::PrimitiveArray(PrimitiveArrayDump {
        object_id,
        element_type,
        count,
    }))
}

fn read_basic_type(parser: &mut Parser<'_>, start: u64) -> Result<BasicType> {
    let raw = parser.read_be::<u8>()?;
    BasicType::from_repr(raw)
        .ok_or_else(|| corrupt_error!(start, "invalid basic type code 0x{:02x}", raw))
}
