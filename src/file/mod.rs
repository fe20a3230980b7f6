//! Data source abstraction and low-level parsing for HPROF dumps.
//!
//! This module abstracts over the places heap-dump bytes can live (disk files,
//! memory buffers) and provides the bounds-checked reading primitives the rest of
//! the crate is built on. Nothing here understands record semantics - that lives in
//! [`crate::format`]; this layer only guarantees safe, read-only access to raw bytes.
//!
//! # Architecture
//!
//! - **Backend system** - The [`crate::file::Backend`] trait unifies pluggable data
//!   sources; parsing code never knows whether bytes come from a memory map or a
//!   `Vec<u8>`
//! - **Parsing infrastructure** - [`crate::file::parser::Parser`] offers a cursor
//!   with big-endian reads and identifier support; [`crate::file::io`] holds the
//!   underlying free functions
//!
//! # Key Components
//!
//! - [`crate::file::Backend`] - Trait for data sources
//! - [`crate::file::physical::Physical`] - Memory-mapped file backend
//! - [`crate::file::memory::Memory`] - In-memory buffer backend
//! - [`crate::file::parser::Parser`] - Bounds-checked cursor over dump bytes
//!
//! # Integration
//!
//! [`crate::format`] consumes this layer to stream record headers, and
//! [`crate::index`] keeps the chosen [`crate::file::Backend`] alive for the lifetime
//! of the built index so queries can lazily decode payloads by stored offset.

pub mod io;
pub mod memory;
pub mod parser;
pub mod physical;

pub use memory::Memory;
pub use physical::Physical;

use crate::Result;

/// A read-only source of heap dump bytes.
///
/// Implementations provide bounds-checked random access to the raw dump. The backend
/// stays alive for the lifetime of a built index: queries re-read record payloads by
/// stored offset instead of keeping decoded copies in memory.
///
/// Implementations must be [`Send`] and [`Sync`]; queries execute concurrently from
/// multiple callers against the same backend.
pub trait Backend: Send + Sync {
    /// Get a slice of the underlying data, validated against the data's bounds.
    ///
    /// # Arguments
    /// * `offset` - Start of the requested slice
    /// * `len` - Length of the requested slice
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if `offset + len` exceeds the data length.
    fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]>;

    /// Get the complete underlying data.
    fn data(&self) -> &[u8];

    /// Get the total length of the underlying data in bytes.
    fn len(&self) -> usize;

    /// Returns `true` if the backend holds no data.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
