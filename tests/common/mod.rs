//! Shared builders that emit well-formed HPROF dump bytes for tests.
//!
//! All tests drive the library through real dump bytes rather than poking at
//! internal tables, so every assertion also exercises the binary reader.

#![allow(dead_code)]

/// Identifier width used by all test dumps.
pub const ID_SIZE: u32 = 8;

/// HPROF basic type code for object references.
pub const TYPE_OBJECT: u8 = 2;
/// HPROF basic type code for `int`.
pub const TYPE_INT: u8 = 10;
/// HPROF basic type code for `byte`.
pub const TYPE_BYTE: u8 = 8;

/// Builds the body of one heap-dump segment from packed sub-records.
#[derive(Default)]
pub struct SegmentWriter {
    buf: Vec<u8>,
}

impl SegmentWriter {
    pub fn new() -> Self {
        Self::default()
    }

    fn id(&mut self, value: u64) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    /// A `ROOT_UNKNOWN` declaration.
    pub fn root(&mut self, object_id: u64) -> &mut Self {
        self.buf.push(0xFF);
        self.id(object_id);
        self
    }

    /// A `CLASS_DUMP` with instance fields and no statics.
    ///
    /// `fields` pairs a field-name string identifier with a basic type code.
    pub fn class(
        &mut self,
        class_id: u64,
        super_id: u64,
        instance_size: u32,
        fields: &[(u64, u8)],
    ) -> &mut Self {
        self.class_with_statics(class_id, super_id, instance_size, &[], fields)
    }

    /// A `CLASS_DUMP` with static object-reference fields and instance fields.
    pub fn class_with_statics(
        &mut self,
        class_id: u64,
        super_id: u64,
        instance_size: u32,
        static_refs: &[(u64, u64)],
        fields: &[(u64, u8)],
    ) -> &mut Self {
        self.buf.push(0x20);
        self.id(class_id);
        self.buf.extend_from_slice(&0u32.to_be_bytes()); // stack trace serial
        self.id(super_id);
        for _ in 0..5 {
            self.id(0); // loader, signers, domain, reserved
        }
        self.buf.extend_from_slice(&instance_size.to_be_bytes());
        self.buf.extend_from_slice(&0u16.to_be_bytes()); // constant pool

        self.buf
            .extend_from_slice(&(static_refs.len() as u16).to_be_bytes());
        for &(name_id, target) in static_refs {
            self.id(name_id);
            self.buf.push(TYPE_OBJECT);
            self.id(target);
        }

        self.buf
            .extend_from_slice(&(fields.len() as u16).to_be_bytes());
        for &(name_id, ty) in fields {
            self.id(name_id);
            self.buf.push(ty);
        }
        self
    }

    /// An `INSTANCE_DUMP` whose payload is a sequence of object identifiers.
    pub fn instance(&mut self, object_id: u64, class_id: u64, ref_fields: &[u64]) -> &mut Self {
        self.buf.push(0x21);
        self.id(object_id);
        self.buf.extend_from_slice(&0u32.to_be_bytes());
        self.id(class_id);
        self.buf
            .extend_from_slice(&((ref_fields.len() as u32) * ID_SIZE).to_be_bytes());
        for &target in ref_fields {
            self.id(target);
        }
        self
    }

    /// An `OBJECT_ARRAY_DUMP`.
    pub fn object_array(
        &mut self,
        object_id: u64,
        array_class_id: u64,
        elements: &[u64],
    ) -> &mut Self {
        self.buf.push(0x22);
        self.id(object_id);
        self.buf.extend_from_slice(&0u32.to_be_bytes());
        self.buf
            .extend_from_slice(&(elements.len() as u32).to_be_bytes());
        self.id(array_class_id);
        for &element in elements {
            self.id(element);
        }
        self
    }

    /// A `PRIMITIVE_ARRAY_DUMP` of bytes.
    pub fn byte_array(&mut self, object_id: u64, data: &[u8]) -> &mut Self {
        self.buf.push(0x23);
        self.id(object_id);
        self.buf.extend_from_slice(&0u32.to_be_bytes());
        self.buf.extend_from_slice(&(data.len() as u32).to_be_bytes());
        self.buf.push(TYPE_BYTE);
        self.buf.extend_from_slice(data);
        self
    }

    /// Raw bytes appended verbatim, for corruption tests.
    pub fn raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// Builds a complete dump: header plus top-level records.
pub struct DumpWriter {
    buf: Vec<u8>,
}

impl DumpWriter {
    /// Start a `JAVA PROFILE 1.0.2` dump with 8-byte identifiers.
    pub fn new() -> Self {
        let mut buf = b"JAVA PROFILE 1.0.2\0".to_vec();
        buf.extend_from_slice(&ID_SIZE.to_be_bytes());
        buf.extend_from_slice(&0u64.to_be_bytes()); // timestamp
        Self { buf }
    }

    fn record(&mut self, tag: u8, body: &[u8]) -> &mut Self {
        self.buf.push(tag);
        self.buf.extend_from_slice(&0u32.to_be_bytes()); // time delta
        self.buf.extend_from_slice(&(body.len() as u32).to_be_bytes());
        self.buf.extend_from_slice(body);
        self
    }

    /// A `UTF8` string record.
    pub fn utf8(&mut self, string_id: u64, value: &str) -> &mut Self {
        let mut body = string_id.to_be_bytes().to_vec();
        body.extend_from_slice(value.as_bytes());
        self.record(0x01, &body)
    }

    /// A `LOAD_CLASS` record binding a class object to its name string.
    pub fn load_class(&mut self, class_id: u64, name_string_id: u64) -> &mut Self {
        let mut body = 1u32.to_be_bytes().to_vec(); // class serial
        body.extend_from_slice(&class_id.to_be_bytes());
        body.extend_from_slice(&0u32.to_be_bytes()); // stack trace serial
        body.extend_from_slice(&name_string_id.to_be_bytes());
        self.record(0x02, &body)
    }

    /// A `HEAP_DUMP_SEGMENT` record.
    pub fn segment(&mut self, segment: SegmentWriter) -> &mut Self {
        let body = segment.into_bytes();
        self.record(0x1C, &body)
    }

    /// The `HEAP_DUMP_END` terminator.
    pub fn end(&mut self) -> &mut Self {
        self.record(0x2C, &[])
    }

    /// A raw record with an arbitrary tag, for corruption tests.
    pub fn raw_record(&mut self, tag: u8, body: &[u8]) -> &mut Self {
        self.record(tag, body)
    }

    /// Append bytes verbatim without record framing, for corruption tests.
    pub fn raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    /// Current length of the emitted bytes.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// A dump with two classes and a three-object referrer chain.
///
/// Classes: `java.lang.Object` (0x100, no fields) and `com.example.Holder`
/// (0x200, extends Object, one object field). Objects: A (0x1), B (0x2),
/// C (0x3), all Holders, with C -> B -> A reference fields and C declared as
/// a GC root. Object O (0x4) is a field-less Object instance reachable from A.
pub fn chain_dump() -> Vec<u8> {
    let mut dump = DumpWriter::new();
    dump.utf8(0x1000, "java.lang.Object")
        .utf8(0x1001, "com.example.Holder")
        .utf8(0x1002, "value")
        .load_class(0x100, 0x1000)
        .load_class(0x200, 0x1001);

    let mut segment = SegmentWriter::new();
    segment
        .class(0x100, 0, 16, &[])
        .class(0x200, 0x100, 24, &[(0x1002, TYPE_OBJECT)])
        .instance(0x1, 0x200, &[0x4]) // A holds O
        .instance(0x2, 0x200, &[0x1]) // B holds A
        .instance(0x3, 0x200, &[0x2]) // C holds B
        .instance(0x4, 0x100, &[]) // O
        .root(0x3);
    dump.segment(segment).end();
    dump.into_bytes()
}
