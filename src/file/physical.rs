//! Physical file backend for memory-mapped I/O.
//!
//! This module provides the [`crate::file::physical::Physical`] backend that implements
//! the [`crate::file::Backend`] trait for accessing heap dumps from disk using
//! memory-mapped I/O. Heap dumps are routinely gigabytes in size and are accessed in a
//! non-sequential pattern once the index is built, which makes demand paging a much
//! better fit than reading the file into memory upfront.
//!
//! # Key Components
//!
//! - [`crate::file::physical::Physical`] - Backend struct wrapping a read-only memory map
//! - [`crate::file::Backend::data_slice`] - Bounds-checked byte slice access
//!
//! # Usage Examples
//!
//! ```rust,ignore
//! use heapscope::file::{Backend, Physical};
//! use std::path::Path;
//!
//! let physical = Physical::new(Path::new("dump.hprof"))?;
//! let banner = physical.data_slice(0, 18)?;
//! assert!(banner.starts_with(b"JAVA PROFILE"));
//! # Ok::<(), heapscope::Error>(())
//! ```

use super::Backend;
use crate::{
    Error::{Error, FileError},
    Result,
};

use memmap2::Mmap;
use std::{fs, path::Path};

/// A file backend that uses memory-mapped I/O for efficient access to dumps on disk.
///
/// [`crate::file::physical::Physical`] maps the dump file directly into the process's
/// virtual address space. Only the pages actually touched by parsing and queries are
/// loaded into physical memory, and the operating system handles caching and eviction.
/// The mapping is read-only and shared; all access operations are bounds checked.
///
/// Dropping the backend releases the mapping and the underlying file handle, which is
/// how a cancelled index build leaves no resources behind.
#[derive(Debug)]
pub struct Physical {
    /// Memory-mapped file data
    data: Mmap,
}

impl Physical {
    /// Create a new physical file backend by memory-mapping the specified file.
    ///
    /// # Arguments
    /// * `path` - Path to the heap dump on disk. Accepts `&Path`, `&str`, `String`, or `PathBuf`.
    ///
    /// # Errors
    /// Returns [`crate::Error::FileError`] if the file cannot be opened or
    /// [`crate::Error::Error`] if memory mapping fails.
    pub fn new(path: impl AsRef<Path>) -> Result<Physical> {
        let file = match fs::File::open(path) {
            Ok(file) => file,
            Err(error) => return Err(FileError(error)),
        };

        let mmap = match unsafe { Mmap::map(&file) } {
            Ok(mmap) => mmap,
            Err(error) => return Err(Error(error.to_string())),
        };

        Ok(Physical { data: mmap })
    }
}

impl Backend for Physical {
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
        self.data.as_ref()
    }

    fn len(&self) -> usize {
        self.data.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_file(name: &str, contents: &[u8]) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn physical_roundtrip() {
        let path = temp_file("heapscope_physical.bin", b"JAVA PROFILE 1.0.2\0rest");
        let physical = Physical::new(&path).unwrap();

        assert_eq!(physical.len(), 23);
        assert_eq!(&physical.data()[..4], b"JAVA");
        assert_eq!(physical.data_slice(5, 7).unwrap(), b"PROFILE");

        assert!(physical.data_slice(23, 1).is_err());
        assert!(physical.data_slice(usize::MAX, 1).is_err());
        assert!(physical.data_slice(0, 24).is_err());

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn physical_invalid_path() {
        let result = Physical::new("/nonexistent/path/to/dump.hprof");
        assert!(result.is_err());
        match result.unwrap_err() {
            FileError(io_error) => {
                assert_eq!(io_error.kind(), std::io::ErrorKind::NotFound);
            }
            _ => panic!("Expected FileError"),
        }
    }

    #[test]
    fn physical_empty_file() {
        let path = temp_file("heapscope_physical_empty.bin", b"");
        let physical = Physical::new(&path).unwrap();

        assert_eq!(physical.len(), 0);
        assert!(physical.data_slice(0, 1).is_err());
        let empty: &[u8] = &[];
        assert_eq!(physical.data_slice(0, 0).unwrap(), empty);

        std::fs::remove_file(&path).unwrap();
    }
}
