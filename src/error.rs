use thiserror::Error;

macro_rules! corrupt_error {
    // Offset plus single string version
    ($offset:expr, $msg:expr) => {
        crate::Error::CorruptFormat {
            offset: $offset,
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Offset plus format string with arguments version
    ($offset:expr, $fmt:expr, $($arg:tt)*) => {
        crate::Error::CorruptFormat {
            offset: $offset,
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

macro_rules! out_of_bounds_error {
    () => {
        crate::Error::OutOfBounds {
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// This enum covers all possible error conditions that can occur while reading HPROF heap
/// dumps, building the object index, and answering graph queries. Each variant provides
/// specific context about the failure mode to enable appropriate error handling.
///
/// # Error Categories
///
/// ## Reader Errors (fatal, abort the load)
/// - [`Error::UnsupportedVersion`] - The dump's format/version banner is unrecognized
/// - [`Error::CorruptFormat`] - A record length or structure is inconsistent with the file
/// - [`Error::OutOfBounds`] - Attempted to read beyond the data boundaries
/// - [`Error::Empty`] - Empty input provided
///
/// ## Builder Errors (fatal, abort the load)
/// - [`Error::IndexBuild`] - The dump is unusable (e.g. contains no class records)
/// - [`Error::Cancelled`] - The caller cancelled an in-progress index build
///
/// ## Query Errors (per-call, the heap stays usable)
/// - [`Error::NotReady`] - Query issued against an unindexed or closed heap dump
/// - [`Error::UnknownObject`] - The object ID is absent from the index
/// - [`Error::UnknownClass`] / [`Error::UnknownClassName`] - The class is absent from the class table
/// - [`Error::UnknownLanguageTag`] - The language marker class is absent from the dump
///
/// ## I/O and External Errors
/// - [`Error::FileError`] - Filesystem I/O errors
///
/// # Examples
///
/// ```rust,ignore
/// use heapscope::{Error, HeapDump};
/// use std::path::Path;
///
/// match HeapDump::from_file(Path::new("dump.hprof")) {
///     Ok(heap) => {
///         println!("Indexed {} objects", heap.summary()?.object_count);
///     }
///     Err(Error::UnsupportedVersion(banner)) => {
///         eprintln!("Not an HPROF dump we understand: {}", banner);
///     }
///     Err(Error::CorruptFormat { offset, message, .. }) => {
///         eprintln!("Corrupt dump at 0x{:x}: {}", offset, message);
///     }
///     Err(e) => {
///         eprintln!("Other error: {}", e);
///     }
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// The dump's version banner is not a supported HPROF release.
    ///
    /// Heap dumps carry a NUL-terminated banner such as `JAVA PROFILE 1.0.2`.
    /// Dumps produced by external virtual machines must match one of the
    /// documented banners; anything else aborts the load before any record
    /// is parsed. The associated value is the banner that was found.
    #[error("Unsupported heap dump version: {0:?}")]
    UnsupportedVersion(String),

    /// The dump is damaged and could not be parsed.
    ///
    /// This error indicates a record whose declared length is inconsistent
    /// with the remaining file size, or a structure that does not conform to
    /// the HPROF binary format. The offset names the last valid record
    /// boundary so a caller can report where parsing stopped.
    ///
    /// # Fields
    ///
    /// * `offset` - File offset of the last valid record boundary
    /// * `message` - Detailed description of what was malformed
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Corrupt heap dump at offset 0x{offset:x} - {file}:{line}: {message}")]
    CorruptFormat {
        /// File offset of the last valid record boundary
        offset: u64,
        /// The message to be printed for the corruption
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// An out of bound access was attempted while reading data.
    ///
    /// This error occurs when trying to read beyond the end of the mapped
    /// file or buffer. It's a safety check to prevent overruns when reading
    /// malformed or truncated data.
    #[error("Out of bound read would have occurred! ({file}:{line})")]
    OutOfBounds {
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// Provided input was empty.
    ///
    /// This error occurs when an empty file or buffer is provided where
    /// actual heap dump data was expected.
    #[error("Provided input was empty")]
    Empty,

    /// File I/O error.
    ///
    /// Wraps standard I/O errors that can occur during file operations
    /// such as reading from disk, permission issues, or filesystem errors.
    #[error("{0}")]
    FileError(#[from] std::io::Error),

    /// The dump parsed but cannot be indexed.
    ///
    /// Raised when the first indexing pass yields no class records, which
    /// makes every instance record undecodable and the dump unusable.
    #[error("Index build failed: {0}")]
    IndexBuild(String),

    /// An in-progress index build was cancelled by the caller.
    ///
    /// All partially built state is discarded and the file handle released;
    /// no partial index is ever exposed to queries.
    #[error("Index build was cancelled")]
    Cancelled,

    /// A query was issued against an unindexed or closed heap dump.
    ///
    /// Once a heap dump session is closed its index is dropped; subsequent
    /// queries fail with this error instead of observing partial state.
    #[error("Heap dump is not ready or has been closed")]
    NotReady,

    /// The requested object ID is absent from the index.
    ///
    /// The associated value is the identifier that failed to resolve.
    #[error("Unknown object ID: 0x{0:x}")]
    UnknownObject(u64),

    /// The requested class ID is absent from the class table.
    ///
    /// The associated value is the identifier that failed to resolve.
    #[error("Unknown class ID: 0x{0:x}")]
    UnknownClass(u64),

    /// The requested class name matches no class in the dump.
    ///
    /// Raised by name-based queries such as listing the instances of a class.
    #[error("Unknown class name: {0}")]
    UnknownClassName(String),

    /// The requested guest-language marker class is absent from the dump.
    ///
    /// Raised when building a language fragment for a tag that matches no
    /// class name in the dump's class table.
    #[error("Unknown language tag: {0}")]
    UnknownLanguageTag(String),

    /// Generic error for miscellaneous failures.
    ///
    /// Used for errors that don't fit into other categories, such as
    /// memory-mapping failures.
    #[error("{0}")]
    Error(String),
}
