//! Lazy streaming of top-level HPROF records.
//!
//! This module provides [`crate::format::records::RecordIter`], a lazy iterator over
//! record headers (offset + tag + length) that never decodes payloads eagerly. Record
//! bodies are decoded later by whoever needs them, using the stored offsets for
//! random access - the index builder during its passes, and queries when lazily
//! resolving instance fields.
//!
//! # Record layout
//!
//! Each top-level record is `u8` tag, `u32` microsecond time delta, `u32` body
//! length, body. A body length that overruns the remaining file is the signature of
//! a truncated or corrupt dump; the iterator reports it as
//! [`crate::Error::CorruptFormat`] carrying the offset of the last valid record
//! boundary.

use crate::{file::io::read_be_at, format::tags::RecordTag, Result};

/// Header of a single top-level record: placement in the file plus tag and length.
///
/// The payload is *not* decoded; `body_offset` and `length` locate it for later
/// random-access decoding.
#[derive(Debug, Clone, Copy)]
pub struct RecordHeader {
    /// File offset of the record's tag byte.
    pub offset: u64,
    /// Raw tag value as stored in the file.
    pub raw_tag: u8,
    /// Tag, when it is one of the known [`RecordTag`]s.
    pub tag: Option<RecordTag>,
    /// Microsecond time delta relative to the header timestamp.
    pub time_delta: u32,
    /// File offset of the record body.
    pub body_offset: u64,
    /// Body length in bytes.
    pub length: u32,
}

/// Lazy iterator over top-level record headers.
///
/// Yields `Result<RecordHeader>`; iteration ends either cleanly at end-of-file or
/// with a single terminal [`crate::Error::CorruptFormat`] when a record is truncated.
/// The iterator is cheap to restart - construct a new one from the same data.
pub struct RecordIter<'a> {
    /// Complete dump bytes.
    data: &'a [u8],
    /// Offset of the next unread record's tag byte.
    position: usize,
    /// Set after a corruption error; further iteration yields `None`.
    failed: bool,
}

impl<'a> RecordIter<'a> {
    /// Create an iterator over the records beginning at `records_offset`.
    ///
    /// # Arguments
    /// * `data` - The complete dump bytes
    /// * `records_offset` - Offset of the first record, from the parsed header
    #[must_use]
    pub fn new(data: &'a [u8], records_offset: u64) -> Self {
        RecordIter {
            data,
            position: usize::try_from(records_offset).unwrap_or(usize::MAX),
            failed: false,
        }
    }

    fn next_header(&mut self) -> Result<RecordHeader> {
        let record_offset = self.position;
        let mut cursor = self.position;

        let raw_tag = read_be_at::<u8>(self.data, &mut cursor).map_err(|_| {
            corrupt_error!(record_offset as u64, "truncated record header at end of file")
        })?;
        let time_delta = read_be_at::<u32>(self.data, &mut cursor).map_err(|_| {
            corrupt_error!(record_offset as u64, "truncated record header at end of file")
        })?;
        let length = read_be_at::<u32>(self.data, &mut cursor).map_err(|_| {
            corrupt_error!(record_offset as u64, "truncated record header at end of file")
        })?;

        let body_offset = cursor;
        let Some(end) = cursor.checked_add(length as usize) else {
            return Err(corrupt_error!(
                record_offset as u64,
                "record length 0x{:x} overflows the file",
                length
            ));
        };
        if end > self.data.len() {
            return Err(corrupt_error!(
                record_offset as u64,
                "record body of {} bytes overruns remaining {} bytes",
                length,
                self.data.len() - body_offset
            ));
        }

        self.position = end;
        Ok(RecordHeader {
            offset: record_offset as u64,
            raw_tag,
            tag: RecordTag::from_repr(raw_tag),
            time_delta,
            body_offset: body_offset as u64,
            length,
        })
    }
}

impl Iterator for RecordIter<'_> {
    type Item = Result<RecordHeader>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.position >= self.data.len() {
            return None;
        }

        match self.next_header() {
            Ok(header) => Some(Ok(header)),
            Err(error) => {
                self.failed = true;
                Some(Err(error))
            }
        }
    }
}
