//! Checksum selection for RCH containers.
//!
//! The header stores a fixed 8-byte digest field. CRC-32 values are
//! zero-extended into it, CRC-64 values fill it.

use crate::crc::{Crc32, Crc64};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Integrity checksum algorithm recorded in a container header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChecksumKind {
    /// CRC-32 (ISO 3309).
    #[default]
    Crc32,
    /// CRC-64/ECMA-182.
    Crc64,
}

impl ChecksumKind {
    /// Header flag bit value for this algorithm.
    pub fn id(self) -> u8 {
        match self {
            Self::Crc32 => 0,
            Self::Crc64 => 1,
        }
    }

    /// Inverse of [`ChecksumKind::id`].
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            0 => Some(Self::Crc32),
            1 => Some(Self::Crc64),
            _ => None,
        }
    }

    /// Display name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Crc32 => "CRC-32",
            Self::Crc64 => "CRC-64",
        }
    }

    /// Start a streaming checksum of this kind.
    pub fn hasher(self) -> Checksum {
        match self {
            Self::Crc32 => Checksum::Crc32(Crc32::new()),
            Self::Crc64 => Checksum::Crc64(Crc64::new()),
        }
    }

    /// Compute the digest of `data` in one call.
    pub fn compute(self, data: &[u8]) -> u64 {
        let mut hasher = self.hasher();
        hasher.update(data);
        hasher.finalize()
    }
}

impl fmt::Display for ChecksumKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Running checksum over a byte stream.
#[derive(Debug, Clone)]
pub enum Checksum {
    /// CRC-32 state.
    Crc32(Crc32),
    /// CRC-64 state.
    Crc64(Crc64),
}

impl Checksum {
    /// Feed more data.
    pub fn update(&mut self, data: &[u8]) {
        match self {
            Self::Crc32(crc) => crc.update(data),
            Self::Crc64(crc) => crc.update(data),
        }
    }

    /// Final digest, widened to the header's 8-byte field.
    pub fn finalize(self) -> u64 {
        match self {
            Self::Crc32(crc) => u64::from(crc.finalize()),
            Self::Crc64(crc) => crc.finalize(),
        }
    }
}
