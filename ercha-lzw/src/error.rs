//! LZW-specific error types.

use ercha_core::ErchaError;
use thiserror::Error;

/// LZW compression/decompression errors.
#[derive(Debug, Error)]
pub enum LzwError {
    /// Code neither in the dictionary nor the next code to be allocated.
    #[error("Invalid LZW code {code} at bit position {position}")]
    InvalidCode {
        /// The offending code.
        code: u16,
        /// Bit position after the code was read (0 for code-level decoding).
        position: u64,
    },

    /// Insertion into a full dictionary under the strict policy.
    #[error("Dictionary overflow (max {capacity} codes)")]
    DictionaryOverflow {
        /// Maximum number of codes allowed.
        capacity: u32,
    },

    /// Invalid bit width specified.
    #[error("Invalid bit width: {0} (must be 9-16)")]
    InvalidBitWidth(u8),

    /// Unexpected end of data.
    #[error("Unexpected end of data at bit position {position}")]
    UnexpectedEof {
        /// Bit position where EOF occurred.
        position: u64,
    },

    /// Input continues after the expected output was produced.
    #[error("{bits} unused bits after end of stream")]
    TrailingData {
        /// Number of unconsumed, non-padding bits.
        bits: u64,
    },

    /// The last code expanded past the expected output length.
    #[error("Decoded {produced} bytes, expected {expected}")]
    LengthOverrun {
        /// Expected output length.
        expected: usize,
        /// Bytes actually produced.
        produced: usize,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for LZW operations.
pub type Result<T> = std::result::Result<T, LzwError>;

impl From<LzwError> for ErchaError {
    fn from(err: LzwError) -> Self {
        match err {
            LzwError::DictionaryOverflow { capacity } => ErchaError::DictionaryOverflow { capacity },
            LzwError::InvalidBitWidth(bits) => {
                ErchaError::invalid_config(format!("max code width {} outside 9-16", bits))
            }
            LzwError::Io(e) => ErchaError::Io(e),
            other => ErchaError::corrupt(other.to_string()),
        }
    }
}
