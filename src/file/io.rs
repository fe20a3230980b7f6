//! Low-level byte reading helpers for HPROF data.
//!
//! This module provides the [`crate::file::io::HeapIO`] trait and the free functions
//! [`crate::file::io::read_be_at`] and [`crate::file::io::read_id_at`] used throughout
//! the reader. HPROF is a big-endian format, so all multi-byte reads are big-endian;
//! object identifiers are either 4 or 8 bytes wide depending on the dump's header and
//! are widened to `u64` on read.
//!
//! # Key Components
//!
//! - [`crate::file::io::HeapIO`] - Conversion trait between primitive types and their
//!   big-endian byte representation
//! - [`crate::file::io::read_be_at`] - Bounds-checked primitive read that advances an offset
//! - [`crate::file::io::read_id_at`] - Bounds-checked identifier read honoring the dump's
//!   identifier size
//!
//! # Examples
//!
//! ```rust
//! use heapscope::file::io::read_be_at;
//!
//! let data = [0x00, 0x00, 0x00, 0x2A];
//! let mut offset = 0;
//! let value: u32 = read_be_at(&data, &mut offset)?;
//! assert_eq!(value, 42);
//! assert_eq!(offset, 4);
//! # Ok::<(), heapscope::Error>(())
//! ```

use crate::Result;

/// Conversion between primitive types and their big-endian byte representation.
///
/// Each implementation defines a `Bytes` associated type representing the fixed-size
/// byte array required for that particular type (e.g. `[u8; 4]` for `u32`). The trait
/// is implemented for every primitive the HPROF format stores: unsigned and signed
/// integers for record headers and identifiers, and floats for primitive field values.
///
/// All implementations are thread-safe as they perform pure conversions without any
/// shared state.
pub trait HeapIO: Sized {
    /// Associated type representing the byte array type for this primitive type.
    type Bytes: Sized + for<'a> TryFrom<&'a [u8]>;

    /// Read `Self` from a byte buffer in big-endian order
    fn from_be_bytes(bytes: Self::Bytes) -> Self;
    /// Write `Self` to a byte buffer in big-endian order
    fn to_be_bytes(self) -> Self::Bytes;
}

macro_rules! impl_heap_io {
    ($($ty:ty => $len:literal),* $(,)?) => {
        $(
            impl HeapIO for $ty {
                type Bytes = [u8; $len];

                fn from_be_bytes(bytes: Self::Bytes) -> Self {
                    <$ty>::from_be_bytes(bytes)
                }

                fn to_be_bytes(self) -> Self::Bytes {
                    <$ty>::to_be_bytes(self)
                }
            }
        )*
    };
}

impl_heap_io! {
    u8 => 1,
    i8 => 1,
    u16 => 2,
    i16 => 2,
    u32 => 4,
    i32 => 4,
    u64 => 8,
    i64 => 8,
    f32 => 4,
    f64 => 8,
}

/// Read a value of type `T` from `data` at `*offset` in big-endian order.
///
/// Advances `offset` past the bytes consumed on success.
///
/// # Arguments
/// * `data` - The buffer to read from
/// * `offset` - Position to read at, advanced on success
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if the read would exceed the buffer.
pub fn read_be_at<T: HeapIO>(data: &[u8], offset: &mut usize) -> Result<T> {
    let size = std::mem::size_of::<T::Bytes>();
    let Some(end) = offset.checked_add(size) else {
        return Err(out_of_bounds_error!());
    };

    if end > data.len() {
        return Err(out_of_bounds_error!());
    }

    let Ok(bytes) = T::Bytes::try_from(&data[*offset..end]) else {
        return Err(out_of_bounds_error!());
    };

    *offset = end;
    Ok(T::from_be_bytes(bytes))
}

/// Read an HPROF identifier from `data` at `*offset`, widened to `u64`.
///
/// Identifiers are 4 or 8 bytes wide depending on the dump's header; the width is
/// fixed for the lifetime of a dump and passed in as `id_size`.
///
/// # Arguments
/// * `data` - The buffer to read from
/// * `offset` - Position to read at, advanced on success
/// * `id_size` - Identifier width declared in the dump header (4 or 8)
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if the read would exceed the buffer.
pub fn read_id_at(data: &[u8], offset: &mut usize, id_size: u32) -> Result<u64> {
    if id_size == 8 {
        read_be_at::<u64>(data, offset)
    } else {
        Ok(u64::from(read_be_at::<u32>(data, offset)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_primitives_be() {
        let data = [0x12, 0x34, 0x56, 0x78, 0x9A, 0xBC, 0xDE, 0xF0];

        let mut offset = 0;
        assert_eq!(read_be_at::<u8>(&data, &mut offset).unwrap(), 0x12);
        assert_eq!(offset, 1);

        let mut offset = 0;
        assert_eq!(read_be_at::<u16>(&data, &mut offset).unwrap(), 0x1234);

        let mut offset = 0;
        assert_eq!(read_be_at::<u32>(&data, &mut offset).unwrap(), 0x1234_5678);

        let mut offset = 0;
        assert_eq!(
            read_be_at::<u64>(&data, &mut offset).unwrap(),
            0x1234_5678_9ABC_DEF0
        );
        assert_eq!(offset, 8);
    }

    #[test]
    fn read_floats_be() {
        let mut offset = 0;
        let bytes = 1.5_f32.to_be_bytes();
        assert_eq!(read_be_at::<f32>(&bytes, &mut offset).unwrap(), 1.5);

        let mut offset = 0;
        let bytes = (-2.25_f64).to_be_bytes();
        assert_eq!(read_be_at::<f64>(&bytes, &mut offset).unwrap(), -2.25);
    }

    #[test]
    fn read_id_widths() {
        let data = [0x00, 0x00, 0x00, 0x2A, 0x00, 0x00, 0x00, 0x00];

        let mut offset = 0;
        assert_eq!(read_id_at(&data, &mut offset, 4).unwrap(), 42);
        assert_eq!(offset, 4);

        let mut offset = 0;
        assert_eq!(read_id_at(&data, &mut offset, 8).unwrap(), 42 << 32);
        assert_eq!(offset, 8);
    }

    #[test]
    fn read_out_of_bounds() {
        let data = [0x01, 0x02];
        let mut offset = 1;
        assert!(read_be_at::<u32>(&data, &mut offset).is_err());
        // Offset must be untouched on failure
        assert_eq!(offset, 1);

        let mut offset = usize::MAX;
        assert!(read_be_at::<u8>(&data, &mut offset).is_err());
    }
}
