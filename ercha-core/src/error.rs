//! Error types for Ercha operations.
//!
//! [`ErchaError`] is the tagged result every container and pipeline
//! operation surfaces. Codec failures are folded into it by the codec crate,
//! so callers only ever match on one enum. [`ErrorKind`] is the fieldless
//! projection used for exit statuses, logging, and JSON reports.

use crate::checksum::ChecksumKind;
use serde::Serialize;
use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for Ercha operations.
#[derive(Debug, Error)]
pub enum ErchaError {
    /// I/O error from underlying reader/writer.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Bad magic, unknown version, or reserved header bits.
    #[error("Unsupported format: {message}")]
    UnsupportedFormat {
        /// What was rejected.
        message: String,
    },

    /// Input ended before a declared structure was complete.
    #[error("Truncated input: expected {expected} bytes, got {available}")]
    TruncatedInput {
        /// Bytes the structure declared.
        expected: u64,
        /// Bytes actually available.
        available: u64,
    },

    /// The LZW code stream cannot be decoded.
    #[error("Corrupt stream: {message}")]
    CorruptStream {
        /// Description of the corruption.
        message: String,
    },

    /// Payload decoded, but its checksum disagrees with the header.
    #[error("{algorithm} mismatch: expected {expected:#x}, computed {computed:#x}")]
    ChecksumMismatch {
        /// Algorithm used.
        algorithm: ChecksumKind,
        /// Digest stored in the header.
        expected: u64,
        /// Digest of the decoded bytes.
        computed: u64,
    },

    /// Dictionary filled up under the strict policy.
    #[error("Dictionary overflow: all {capacity} codes in use")]
    DictionaryOverflow {
        /// Dictionary capacity for the configured code width.
        capacity: u32,
    },

    /// Configuration value out of range or unparsable.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the problem.
        message: String,
    },

    /// Refused to replace an existing output file.
    #[error("Destination already exists: {}", path.display())]
    DestinationExists {
        /// The existing path.
        path: PathBuf,
    },
}

/// Result type alias for Ercha operations.
pub type Result<T> = std::result::Result<T, ErchaError>;

impl ErchaError {
    /// Create an invalid magic error.
    pub fn invalid_magic(expected: &[u8], found: &[u8]) -> Self {
        Self::UnsupportedFormat {
            message: format!("bad magic: expected {:02x?}, found {:02x?}", expected, found),
        }
    }

    /// Create an unsupported format error.
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            message: message.into(),
        }
    }

    /// Create a truncated input error.
    pub fn truncated(expected: u64, available: u64) -> Self {
        Self::TruncatedInput {
            expected,
            available,
        }
    }

    /// Create a corrupt stream error.
    pub fn corrupt(message: impl Into<String>) -> Self {
        Self::CorruptStream {
            message: message.into(),
        }
    }

    /// Create a checksum mismatch error.
    pub fn checksum_mismatch(algorithm: ChecksumKind, expected: u64, computed: u64) -> Self {
        Self::ChecksumMismatch {
            algorithm,
            expected,
            computed,
        }
    }

    /// Create an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// The fieldless kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Io(_) => ErrorKind::Io,
            Self::UnsupportedFormat { .. } => ErrorKind::UnsupportedFormat,
            Self::TruncatedInput { .. } => ErrorKind::TruncatedInput,
            Self::CorruptStream { .. } => ErrorKind::CorruptStream,
            Self::ChecksumMismatch { .. } => ErrorKind::ChecksumMismatch,
            Self::DictionaryOverflow { .. } => ErrorKind::DictionaryOverflow,
            Self::InvalidConfig { .. } => ErrorKind::InvalidConfig,
            Self::DestinationExists { .. } => ErrorKind::DestinationExists,
        }
    }

    /// Whether retrying the same operation can succeed.
    ///
    /// Only I/O failures and truncation qualify, and truncation only when the
    /// source can be fetched again. Everything else means the data itself is
    /// bad or the request is wrong.
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Io | ErrorKind::TruncatedInput)
    }
}

/// Error categories, without payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// See [`ErchaError::Io`].
    Io,
    /// See [`ErchaError::UnsupportedFormat`].
    UnsupportedFormat,
    /// See [`ErchaError::TruncatedInput`].
    TruncatedInput,
    /// See [`ErchaError::CorruptStream`].
    CorruptStream,
    /// See [`ErchaError::ChecksumMismatch`].
    ChecksumMismatch,
    /// See [`ErchaError::DictionaryOverflow`].
    DictionaryOverflow,
    /// See [`ErchaError::InvalidConfig`].
    InvalidConfig,
    /// See [`ErchaError::DestinationExists`].
    DestinationExists,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Io => "io",
            Self::UnsupportedFormat => "unsupported-format",
            Self::TruncatedInput => "truncated-input",
            Self::CorruptStream => "corrupt-stream",
            Self::ChecksumMismatch => "checksum-mismatch",
            Self::DictionaryOverflow => "dictionary-overflow",
            Self::InvalidConfig => "invalid-config",
            Self::DestinationExists => "destination-exists",
        };
        f.write_str(name)
    }
}
