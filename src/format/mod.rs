//! HPROF binary format definitions and record streaming.
//!
//! This module implements the documented HPROF heap-dump binary format: the version
//! header, the tag-length-value top-level record stream, and the packed sub-records
//! inside heap-dump segments. It is deliberately lazy - record headers are streamed
//! without decoding payloads, and instance/array payloads are only located (offset +
//! length) so later passes and queries can decode them on demand.
//!
//! # Architecture
//!
//! - [`crate::format::header`] - Version banner negotiation and the identifier-size
//!   declaration every later read depends on
//! - [`crate::format::tags`] - Record tags, sub-record tags, and basic type codes
//! - [`crate::format::records`] - Lazy iterator over top-level record headers
//! - [`crate::format::subrecords`] - Decoding of heap-dump segment contents: GC
//!   roots, class dumps, instance and array dumps
//!
//! # Compatibility
//!
//! Tag values and structure layouts follow the HPROF format description shipped with
//! the JDK. Dumps are produced by external virtual machines, so this module treats
//! the format as a hard external contract: unknown top-level tags are skipped by
//! length (the format allows vendor records), while unknown sub-record tags are
//! reported as corruption because sub-records carry no length to skip by.

pub mod header;
pub mod records;
pub mod subrecords;
pub mod tags;

pub use header::{DumpHeader, HprofVersion};
pub use records::{RecordHeader, RecordIter};
pub use subrecords::{
    read_sub_record, ClassDump, FieldDescriptor, GcRoot, GcRootKind, InstanceDump,
    ObjectArrayDump, PrimitiveArrayDump, SubRecord,
};
pub use tags::{BasicType, RecordTag, SubRecordTag};
