//! Tag and type-code definitions for the HPROF binary format.
//!
//! The tag values here are fixed by the published HPROF format description shipped
//! with the JDK (`demo/jvmti/hprof/manual.html`) and must match dumps produced by
//! external virtual machines bit-exactly.

use strum::{Display, FromRepr};

/// Top-level record tags.
///
/// Every top-level record starts with one of these tags followed by a microsecond
/// time delta and a body length. Tags not listed here are legal in the format
/// lineage (producers may emit vendor records) and are skipped by length.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, FromRepr)]
#[repr(u8)]
pub enum RecordTag {
    /// UTF-8 string constant: identifier followed by the string bytes.
    Utf8 = 0x01,
    /// Class load notice binding a class object ID to its name string.
    LoadClass = 0x02,
    /// Class unload notice.
    UnloadClass = 0x03,
    /// Stack frame description.
    StackFrame = 0x04,
    /// Stack trace description.
    StackTrace = 0x05,
    /// Allocation site statistics.
    AllocSites = 0x06,
    /// Total live bytes/instances summary.
    HeapSummary = 0x07,
    /// Thread start notice.
    StartThread = 0x0A,
    /// Thread end notice.
    EndThread = 0x0B,
    /// A complete heap dump in a single record.
    HeapDump = 0x0C,
    /// CPU sampling statistics.
    CpuSamples = 0x0D,
    /// Control settings bitmask.
    ControlSettings = 0x0E,
    /// One segment of a heap dump split across records.
    HeapDumpSegment = 0x1C,
    /// Terminator for a segmented heap dump.
    HeapDumpEnd = 0x2C,
}

/// Sub-record tags inside `HEAP_DUMP` / `HEAP_DUMP_SEGMENT` bodies.
///
/// Sub-records carry no length field, so an unknown tag makes the rest of the
/// segment undecodable - resynchronization is impossible and the reader reports
/// corruption instead of guessing.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, FromRepr)]
#[repr(u8)]
pub enum SubRecordTag {
    /// GC root of JNI global reference.
    RootJniGlobal = 0x01,
    /// GC root of JNI local reference.
    RootJniLocal = 0x02,
    /// GC root on a Java stack frame.
    RootJavaFrame = 0x03,
    /// GC root on a native stack.
    RootNativeStack = 0x04,
    /// GC root of a sticky (system) class.
    RootStickyClass = 0x05,
    /// GC root of an object blocking a thread.
    RootThreadBlock = 0x06,
    /// GC root of a monitor in use.
    RootMonitorUsed = 0x07,
    /// GC root of a running thread object.
    RootThreadObject = 0x08,
    /// Class structure dump.
    ClassDump = 0x20,
    /// Plain object instance dump.
    InstanceDump = 0x21,
    /// Array of object references dump.
    ObjectArrayDump = 0x22,
    /// Array of primitive values dump.
    PrimitiveArrayDump = 0x23,
    /// GC root of unknown provenance.
    RootUnknown = 0xFF,
}

/// HPROF basic type codes used for field and array element types.
///
/// The numeric values are format-mandated. `Object` slots hold an identifier whose
/// width depends on the dump header; all other widths are fixed.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, FromRepr)]
#[repr(u8)]
pub enum BasicType {
    /// Object reference (identifier-sized).
    Object = 2,
    /// `boolean`, one byte.
    Boolean = 4,
    /// `char`, two bytes.
    Char = 5,
    /// `float`, four bytes.
    Float = 6,
    /// `double`, eight bytes.
    Double = 7,
    /// `byte`, one byte.
    Byte = 8,
    /// `short`, two bytes.
    Short = 9,
    /// `int`, four bytes.
    Int = 10,
    /// `long`, eight bytes.
    Long = 11,
}

impl BasicType {
    /// Byte width of a value of this type within a dump using `id_size` identifiers.
    ///
    /// # Arguments
    /// * `id_size` - Identifier width declared in the dump header (4 or 8)
    #[must_use]
    pub fn byte_size(self, id_size: u32) -> u32 {
        match self {
            BasicType::Object => id_size,
            BasicType::Boolean | BasicType::Byte => 1,
            BasicType::Char | BasicType::Short => 2,
            BasicType::Float | BasicType::Int => 4,
            BasicType::Double | BasicType::Long => 8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_tags_from_repr() {
        assert_eq!(RecordTag::from_repr(0x01), Some(RecordTag::Utf8));
        assert_eq!(RecordTag::from_repr(0x0C), Some(RecordTag::HeapDump));
        assert_eq!(RecordTag::from_repr(0x1C), Some(RecordTag::HeapDumpSegment));
        assert_eq!(RecordTag::from_repr(0x2C), Some(RecordTag::HeapDumpEnd));
        assert_eq!(RecordTag::from_repr(0x42), None);
    }

    #[test]
    fn sub_record_tags_from_repr() {
        assert_eq!(SubRecordTag::from_repr(0xFF), Some(SubRecordTag::RootUnknown));
        assert_eq!(SubRecordTag::from_repr(0x20), Some(SubRecordTag::ClassDump));
        assert_eq!(SubRecordTag::from_repr(0x21), Some(SubRecordTag::InstanceDump));
        assert_eq!(SubRecordTag::from_repr(0x30), None);
    }

    #[test]
    fn basic_type_sizes() {
        assert_eq!(BasicType::Object.byte_size(4), 4);
        assert_eq!(BasicType::Object.byte_size(8), 8);
        assert_eq!(BasicType::Boolean.byte_size(8), 1);
        assert_eq!(BasicType::Char.byte_size(8), 2);
        assert_eq!(BasicType::Int.byte_size(8), 4);
        assert_eq!(BasicType::Double.byte_size(8), 8);
    }

    #[test]
    fn basic_type_from_repr() {
        assert_eq!(BasicType::from_repr(2), Some(BasicType::Object));
        assert_eq!(BasicType::from_repr(11), Some(BasicType::Long));
        assert_eq!(BasicType::from_repr(3), None);
    }
}
