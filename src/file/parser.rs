//! Cursor-based byte stream parser for HPROF records.
//!
//! This module provides the [`crate::file::parser::Parser`] type, a bounds-checked
//! cursor over a byte slice used to decode HPROF record headers, heap-dump sub-records,
//! and instance payloads. HPROF stores all multi-byte values big-endian; identifiers
//! are 4 or 8 bytes wide as declared once in the dump header.
//!
//! # Architecture
//!
//! The parser maintains a position within a byte slice and validates every access
//! before reading:
//!
//! - **Position tracking** - Maintains the current offset for sequential parsing
//! - **Bounds checking** - All operations validate data availability before reading
//! - **Identifier support** - [`crate::file::parser::Parser::read_id`] honors the dump's
//!   identifier width and widens to `u64`
//!
//! # Usage Examples
//!
//! ```rust
//! use heapscope::Parser;
//!
//! let data = [0x00, 0x01, 0x00, 0x00, 0x00, 0x2A];
//! let mut parser = Parser::new(&data);
//!
//! let tag = parser.read_be::<u16>()?;
//! assert_eq!(tag, 1);
//! let value = parser.read_be::<u32>()?;
//! assert_eq!(value, 42);
//! # Ok::<(), heapscope::Error>(())
//! ```

use crate::{
    file::io::{read_be_at, read_id_at, HeapIO},
    Result,
};

/// A bounds-checked cursor for reading HPROF binary structures.
///
/// `Parser` provides sequential and random access over a byte slice in big-endian
/// order. It is used for record headers, heap-dump segment sub-records, and the
/// on-demand decoding of instance field payloads at query time.
///
/// The parser maintains an internal position cursor; all read operations validate
/// data availability, so truncated or malformed dumps surface as
/// [`crate::Error::OutOfBounds`] instead of panics.
///
/// # Examples
///
/// ```rust
/// use heapscope::Parser;
///
/// let data = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];
/// let mut parser = Parser::new(&data);
///
/// let first = parser.read_be::<u32>()?;
/// assert_eq!(first, 0x01020304);
///
/// parser.seek(6)?;
/// let last = parser.read_be::<u16>()?;
/// assert_eq!(last, 0x0708);
/// # Ok::<(), heapscope::Error>(())
/// ```
pub struct Parser<'a> {
    /// The binary data being parsed
    data: &'a [u8],
    /// Current position within the data buffer
    position: usize,
}

impl<'a> Parser<'a> {
    /// Create a new [`crate::file::parser::Parser`] from a byte slice.
    ///
    /// # Arguments
    /// * `data` - The byte slice to read from
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Parser { data, position: 0 }
    }

    /// Returns the length of the underlying data buffer.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the parser has no data.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns `true` if there is more data available to parse.
    #[must_use]
    pub fn has_more_data(&self) -> bool {
        self.position < self.data.len()
    }

    /// Move the current position to the specified index.
    ///
    /// # Arguments
    /// * `pos` - The position to move the cursor to
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the position is beyond the data length.
    pub fn seek(&mut self, pos: usize) -> Result<()> {
        if pos > self.data.len() {
            return Err(out_of_bounds_error!());
        }

        self.position = pos;
        Ok(())
    }

    /// Move the position forward by the specified number of bytes.
    ///
    /// # Arguments
    /// * `step` - Amount of bytes to advance
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if advancing by step would exceed the data length.
    pub fn advance_by(&mut self, step: usize) -> Result<()> {
        let Some(next) = self.position.checked_add(step) else {
            return Err(out_of_bounds_error!());
        };

        if next > self.data.len() {
            return Err(out_of_bounds_error!());
        }

        self.position = next;
        Ok(())
    }

    /// Get the current position of the parser within the data buffer.
    #[must_use]
    pub fn pos(&self) -> usize {
        self.position
    }

    /// Get access to the underlying data buffer.
    #[must_use]
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Peek at the next byte without advancing the position.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the position is at or beyond the data length.
    pub fn peek_byte(&self) -> Result<u8> {
        if self.position >= self.data.len() {
            return Err(out_of_bounds_error!());
        }
        Ok(self.data[self.position])
    }

    /// Read a value of type `T` in big-endian order, advancing the position.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if reading `T` would exceed the data length.
    pub fn read_be<T: HeapIO>(&mut self) -> Result<T> {
        read_be_at::<T>(self.data, &mut self.position)
    }

    /// Read an HPROF identifier, widened to `u64`, advancing the position.
    ///
    /// # Arguments
    /// * `id_size` - Identifier width declared in the dump header (4 or 8)
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the read would exceed the data length.
    pub fn read_id(&mut self, id_size: u32) -> Result<u64> {
        read_id_at(self.data, &mut self.position, id_size)
    }

    /// Read `len` raw bytes, advancing the position.
    ///
    /// # Arguments
    /// * `len` - Number of bytes to read
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the read would exceed the data length.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        let Some(end) = self.position.checked_add(len) else {
            return Err(out_of_bounds_error!());
        };

        if end > self.data.len() {
            return Err(out_of_bounds_error!());
        }

        let slice = &self.data[self.position..end];
        self.position = end;
        Ok(slice)
    }
}
