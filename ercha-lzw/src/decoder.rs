//! LZW decoder (decompression).
//!
//! The decoder rebuilds the encoder's dictionary from the code stream alone.
//! It learns each entry one code later than the encoder did (the entry
//! `prev + first byte of current` needs the current code), so code widths
//! are computed with that owed insertion counted in.

use crate::bitstream_msb::MsbBitReader;
use crate::config::{LzwConfig, ROOT_CODES};
use crate::dictionary::{Insertion, LzwDictionary};
use crate::error::{LzwError, Result};
use tracing::debug;

/// Upper bound on output preallocation, whatever the caller expects.
const MAX_PREALLOC: usize = 16 * 1024 * 1024;

/// LZW decoder for decompression.
#[derive(Debug)]
pub struct LzwDecoder {
    /// Dictionary for code lookup.
    dict: LzwDictionary,
    /// Previously decoded code, whose successor entry is still owed.
    prev: Option<u16>,
}

impl LzwDecoder {
    /// Create a new LZW decoder with the given configuration.
    pub fn new(config: LzwConfig) -> Result<Self> {
        Ok(Self {
            dict: LzwDictionary::for_decoder(config)?,
            prev: None,
        })
    }

    /// Decode packed LZW data that expands to exactly `expected_size` bytes.
    ///
    /// Decoding stops once `expected_size` bytes are produced. It is an error
    /// if the input runs out first, if the last code overshoots the expected
    /// size, or if anything other than zero padding follows the last code.
    pub fn decode(&mut self, input: &[u8], expected_size: usize) -> Result<Vec<u8>> {
        self.reset();

        let mut reader = MsbBitReader::new(input);
        let mut output = Vec::with_capacity(expected_size.min(MAX_PREALLOC));

        while output.len() < expected_size {
            let width = self.dict.code_width(self.prev.is_some());
            let code = reader.read_bits(width)?;
            self.push_code(code, &mut output)
                .map_err(|e| with_position(e, reader.bits_read()))?;
        }

        if output.len() > expected_size {
            return Err(LzwError::LengthOverrun {
                expected: expected_size,
                produced: output.len(),
            });
        }

        if !reader.only_padding_left() {
            return Err(LzwError::TrailingData {
                bits: reader.bits_remaining(),
            });
        }

        debug!(
            bytes_in = input.len(),
            bytes_out = output.len(),
            dictionary_size = self.dict.size(),
            "lzw decode finished"
        );
        Ok(output)
    }

    /// Decode an unpacked code sequence.
    pub fn decode_codes(&mut self, codes: &[u16]) -> Result<Vec<u8>> {
        self.reset();

        let mut output = Vec::with_capacity(codes.len().min(MAX_PREALLOC));
        for &code in codes {
            self.push_code(code, &mut output)?;
        }
        Ok(output)
    }

    /// Decode one code, append its sequence, and learn the owed entry.
    fn push_code(&mut self, code: u16, out: &mut Vec<u8>) -> Result<()> {
        let Some(prev) = self.prev else {
            self.dict.write_sequence(code, out)?;
            self.prev = Some(code);
            return Ok(());
        };

        let start = out.len();
        let first = if self.dict.contains(code) {
            self.dict.write_sequence(code, out)?;
            self.dict.first_byte(code)
        } else if code as u32 == self.dict.size() && !self.dict.is_full() {
            // The encoder used the entry it had just learned: prev + prev[0].
            self.dict.write_sequence(prev, out)?;
            let first = out[start];
            out.push(first);
            first
        } else {
            return Err(LzwError::InvalidCode { code, position: 0 });
        };

        if self.dict.insert(prev, first)? == Insertion::Reset && code as u32 >= ROOT_CODES {
            // After a reset the encoder can only emit a root code.
            return Err(LzwError::InvalidCode { code, position: 0 });
        }

        self.prev = Some(code);
        Ok(())
    }

    /// Reset the decoder to initial state.
    pub fn reset(&mut self) {
        self.dict.reset();
        self.prev = None;
    }
}

fn with_position(err: LzwError, position: u64) -> LzwError {
    match err {
        LzwError::InvalidCode { code, .. } => LzwError::InvalidCode { code, position },
        other => other,
    }
}
