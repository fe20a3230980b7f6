//! HPROF file header parsing and version negotiation.
//!
//! Every dump starts with a NUL-terminated ASCII version banner, a `u32` identifier
//! size, and a `u64` timestamp in milliseconds since the epoch. The banner is the
//! hard compatibility gate: dumps are produced by external virtual machines, and an
//! unknown banner means the record layout that follows cannot be trusted.

use crate::{Error, Result};

/// Maximum bytes scanned for the banner's NUL terminator.
const MAX_BANNER_LEN: usize = 32;

/// Banner emitted by JDK 1.2 through early 1.4 VMs.
const BANNER_101: &str = "JAVA PROFILE 1.0.1";
/// Banner emitted by modern VMs (adds segmented heap dumps).
const BANNER_102: &str = "JAVA PROFILE 1.0.2";

/// Supported HPROF format releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HprofVersion {
    /// `JAVA PROFILE 1.0.1` - heap dump in a single record.
    V101,
    /// `JAVA PROFILE 1.0.2` - heap dump may be split into segments.
    V102,
}

impl std::fmt::Display for HprofVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HprofVersion::V101 => write!(f, "{}", BANNER_101),
            HprofVersion::V102 => write!(f, "{}", BANNER_102),
        }
    }
}

/// Parsed HPROF file header.
///
/// Carries the negotiated version, the identifier width every subsequent record uses,
/// and the offset at which the record stream begins.
#[derive(Debug, Clone, Copy)]
pub struct DumpHeader {
    /// Negotiated format release.
    pub version: HprofVersion,
    /// Identifier width in bytes (4 or 8), fixed for the whole dump.
    pub id_size: u32,
    /// Dump creation time, milliseconds since the epoch.
    pub timestamp_ms: u64,
    /// File offset of the first top-level record.
    pub records_offset: u64,
}

impl DumpHeader {
    /// Parse the header at the start of `data`.
    ///
    /// # Arguments
    /// * `data` - The complete dump bytes
    ///
    /// # Errors
    /// - [`crate::Error::Empty`] if `data` is empty
    /// - [`crate::Error::UnsupportedVersion`] if the banner is not a known release
    /// - [`crate::Error::CorruptFormat`] if the banner is unterminated or the declared
    ///   identifier size is not 4 or 8
    pub fn parse(data: &[u8]) -> Result<DumpHeader> {
        if data.is_empty() {
            return Err(Error::Empty);
        }

        let scan = &data[..data.len().min(MAX_BANNER_LEN)];
        let Some(nul) = scan.iter().position(|&b| b == 0) else {
            return Err(corrupt_error!(0, "version banner is not NUL-terminated"));
        };

        let banner = String::from_utf8_lossy(&scan[..nul]).into_owned();
        let version = match banner.as_str() {
            BANNER_101 => HprofVersion::V101,
            BANNER_102 => HprofVersion::V102,
            _ => return Err(Error::UnsupportedVersion(banner)),
        };

        let mut offset = nul + 1;
        let id_size = crate::file::io::read_be_at::<u32>(data, &mut offset)
            .map_err(|_| corrupt_error!(nul as u64 + 1, "header truncated before identifier size"))?;
        if id_size != 4 && id_size != 8 {
            return Err(corrupt_error!(
                nul as u64 + 1,
                "invalid identifier size {} (expected 4 or 8)",
                id_size
            ));
        }

        let timestamp_ms = crate::file::io::read_be_at::<u64>(data, &mut offset)
            .map_err(|_| corrupt_error!(nul as u64 + 5, "header truncated before timestamp"))?;

        Ok(DumpHeader {
            version,
            id_size,
            timestamp_ms,
            records_offset: offset as u64,
        })
    }
}
