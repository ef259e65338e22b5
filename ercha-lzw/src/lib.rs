//! # Ercha-LZW: Variable-Width LZW Compression
//!
//! This crate provides the LZW (Lempel-Ziv-Welch) codec used inside RCH
//! containers.
//!
//! ## Features
//!
//! - **Pure Rust**: No C dependencies, 100% safe Rust
//! - **Variable width**: each code is `ceil(log2(dictionary size))` bits,
//!   starting at 8 and growing up to a configurable 9-16 bit ceiling
//! - **Fixed width**: optional constant-width codes, including the two-byte
//!   layout of the first RCH tool ([`LzwConfig::LEGACY`])
//! - **Full-table policies**: freeze, reset, or strict (see
//!   [`DictionaryPolicy`])
//!
//! ## Stream format
//!
//! - 256 root codes (0-255), no clear or end-of-information codes
//! - MSB-first packing, final byte zero-padded
//! - The decoder needs the expected output length to know where the stream
//!   ends; RCH headers carry it
//!
//! ## Example
//!
//! ```rust
//! use ercha_lzw::{compress, decompress, LzwConfig};
//!
//! let original = b"TOBEORNOTTOBEORTOBEORNOT";
//!
//! let compressed = compress(original, LzwConfig::default()).unwrap();
//! let decompressed = decompress(&compressed, original.len(), LzwConfig::default()).unwrap();
//!
//! assert_eq!(decompressed, original);
//! ```
//!
//! ## Code-level interface
//!
//! ```rust
//! use ercha_lzw::{decode_codes, encode_codes, LzwConfig};
//!
//! let encoded = encode_codes(b"AAAAAAAAAA", LzwConfig::default()).unwrap();
//! // 'A', "AA", "AAA", "AAAA": four codes for ten bytes.
//! assert_eq!(encoded.codes, vec![65, 256, 257, 258]);
//! assert_eq!(encoded.dictionary_size, 259);
//!
//! let decoded = decode_codes(&encoded.codes, LzwConfig::default()).unwrap();
//! assert_eq!(decoded, b"AAAAAAAAAA");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![forbid(unsafe_code)]

mod bitstream_msb;
mod config;
mod decoder;
mod dictionary;
mod encoder;
mod error;

pub use config::{DictionaryPolicy, LzwConfig, MAX_CODE_BITS, MIN_CODE_BITS};
pub use decoder::LzwDecoder;
pub use encoder::{EncodedCodes, LzwEncoder};
pub use error::{LzwError, Result};

/// Decompress packed LZW data with the given configuration.
///
/// # Parameters
///
/// - `data`: LZW-compressed input
/// - `expected_size`: exact size of the decompressed output
/// - `config`: the configuration the data was compressed with
///
/// # Example
///
/// ```rust
/// use ercha_lzw::{decompress, compress, LzwConfig};
///
/// let original = b"Hello, World!";
/// let compressed = compress(original, LzwConfig::LEGACY).unwrap();
/// let decompressed = decompress(&compressed, original.len(), LzwConfig::LEGACY).unwrap();
/// assert_eq!(decompressed, original);
/// ```
pub fn decompress(data: &[u8], expected_size: usize, config: LzwConfig) -> Result<Vec<u8>> {
    let mut decoder = LzwDecoder::new(config)?;
    decoder.decode(data, expected_size)
}

/// Compress data with LZW using the given configuration.
///
/// # Example
///
/// ```rust
/// use ercha_lzw::{compress, LzwConfig};
///
/// let data = b"TOBEORNOTTOBEORTOBEORNOT";
/// let compressed = compress(data, LzwConfig::default()).unwrap();
/// assert!(compressed.len() < data.len());
/// ```
pub fn compress(data: &[u8], config: LzwConfig) -> Result<Vec<u8>> {
    let mut encoder = LzwEncoder::new(config)?;
    encoder.encode(data)
}

/// Encode data into unpacked codes, reporting the final dictionary size.
pub fn encode_codes(data: &[u8], config: LzwConfig) -> Result<EncodedCodes> {
    let mut encoder = LzwEncoder::new(config)?;
    encoder.encode_codes(data)
}

/// Decode an unpacked code sequence.
pub fn decode_codes(codes: &[u16], config: LzwConfig) -> Result<Vec<u8>> {
    let mut decoder = LzwDecoder::new(config)?;
    decoder.decode_codes(codes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_default() {
        let original = b"TOBEORNOTTOBEORTOBEORNOT";
        let compressed = compress(original, LzwConfig::default()).unwrap();
        let decompressed = decompress(&compressed, original.len(), LzwConfig::default()).unwrap();
        assert_eq!(decompressed, original);
    }

    #[test]
    fn test_ten_repeats_shrink() {
        let original = b"AAAAAAAAAA";
        let compressed = compress(original, LzwConfig::default()).unwrap();
        // 8 + 9 + 9 + 9 bits = 35 bits = 5 bytes.
        assert_eq!(compressed.len(), 5);
        assert!(compressed.len() < original.len());
    }

    #[test]
    fn test_empty_input() {
        let compressed = compress(b"", LzwConfig::default()).unwrap();
        assert!(compressed.is_empty());
        let decompressed = decompress(&compressed, 0, LzwConfig::default()).unwrap();
        assert!(decompressed.is_empty());
    }

    #[test]
    fn test_all_byte_values() {
        let original: Vec<u8> = (0..=255).collect();
        let compressed = compress(&original, LzwConfig::default()).unwrap();
        let decompressed = decompress(&compressed, original.len(), LzwConfig::default()).unwrap();
        assert_eq!(decompressed, original);
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert!(matches!(
            compress(b"abc", LzwConfig::new(20)),
            Err(LzwError::InvalidBitWidth(20))
        ));
    }

    #[test]
    fn test_large_input() {
        let original = b"The quick brown fox jumps over the lazy dog. ".repeat(2000);
        let compressed = compress(&original, LzwConfig::default()).unwrap();
        assert!(compressed.len() < original.len() / 4);
        let decompressed = decompress(&compressed, original.len(), LzwConfig::default()).unwrap();
        assert_eq!(decompressed, original);
    }
}
