//! In-memory buffer backend.
//!
//! This module provides the [`crate::file::memory::Memory`] backend implementing
//! [`crate::file::Backend`] over an owned byte buffer. It exists for dumps that are
//! already in memory - data received over the network, embedded test fixtures, or
//! buffers handed over by other tooling - and offers the same bounds-checked access
//! as the memory-mapped [`crate::file::physical::Physical`] backend.

use super::Backend;
use crate::Result;

/// A backend over an owned in-memory byte buffer.
///
/// Provides the same read-only, bounds-checked access as the memory-mapped backend
/// without touching the filesystem. Used heavily by tests and by callers that obtain
/// dump bytes from somewhere other than a file.
#[derive(Debug)]
pub struct Memory {
    /// The owned dump data
    data: Vec<u8>,
}

impl Memory {
    /// Create a new in-memory backend from an owned buffer.
    ///
    /// # Arguments
    /// * `data` - The heap dump bytes
    ///
    /// # Errors
    /// Returns [`crate::Error::Empty`] if the buffer is empty.
    pub fn new(data: Vec<u8>) -> Result<Memory> {
        if data.is_empty() {
            return Err(crate::Error::Empty);
        }

        Ok(Memory { data })
    }
}

impl Backend for Memory {
    fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]> {
        let Some(offset_end) = offset.checked_add(len) else {
            return Err(out_of_bounds_error!());
        };

        if offset_end > self.data.len() {
            return Err(out_of_bounds_error!());
        }

        Ok(&self.data[offset..offset_end])
    }

    fn data(&self) -> &[u8] {
        &self.data
    }

    fn len(&self) -> usize {
        self.data.len()
    }
}
