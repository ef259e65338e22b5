//! LZW encoder (compression).

use crate::bitstream_msb::MsbBitWriter;
use crate::config::LzwConfig;
use crate::dictionary::LzwDictionary;
use crate::error::Result;
use tracing::debug;

/// Codes produced by [`LzwEncoder::encode_codes`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedCodes {
    /// Emitted codes, in order.
    pub codes: Vec<u16>,
    /// Dictionary size after the last emission.
    pub dictionary_size: u32,
}

/// LZW encoder for compression.
///
/// Input may arrive in several [`write`](LzwEncoder::write) calls; the
/// longest match carries across chunk boundaries, so the packed output is
/// identical to a single-call encode of the concatenated input.
#[derive(Debug)]
pub struct LzwEncoder {
    /// Dictionary for string lookup.
    dict: LzwDictionary,
    /// Packed output.
    writer: MsbBitWriter,
    /// Code of the longest match so far (`w`), if any input is pending.
    current: Option<u16>,
    /// Number of codes emitted.
    codes_emitted: u64,
    /// Number of input bytes consumed.
    bytes_in: u64,
}

impl LzwEncoder {
    /// Create a new LZW encoder with the given configuration.
    pub fn new(config: LzwConfig) -> Result<Self> {
        Ok(Self {
            dict: LzwDictionary::for_encoder(config)?,
            writer: MsbBitWriter::new(),
            current: None,
            codes_emitted: 0,
            bytes_in: 0,
        })
    }

    /// Feed more input. Packed bytes accumulate until taken.
    pub fn write(&mut self, input: &[u8]) -> Result<()> {
        let writer = &mut self.writer;
        let emitted = &mut self.codes_emitted;
        scan(&mut self.dict, &mut self.current, input, |code, width| {
            *emitted += 1;
            writer.write_bits(code, width)
        })?;
        self.bytes_in += input.len() as u64;
        Ok(())
    }

    /// Take the whole bytes produced so far.
    pub fn take_output(&mut self) -> Vec<u8> {
        self.writer.take_bytes()
    }

    /// Emit the pending match and return the rest of the packed output,
    /// zero-padded to a byte boundary. The encoder is reset afterwards.
    pub fn finish(&mut self) -> Result<Vec<u8>> {
        if let Some(code) = self.current.take() {
            let width = self.dict.code_width(false);
            self.writer.write_bits(code, width)?;
            self.codes_emitted += 1;
        }

        let writer = std::mem::take(&mut self.writer);
        debug!(
            bytes_in = self.bytes_in,
            codes = self.codes_emitted,
            bits = writer.bits_written(),
            dictionary_size = self.dict.size(),
            "lzw encode finished"
        );
        let output = writer.into_vec();
        self.reset();
        Ok(output)
    }

    /// Encode `input` in one call.
    pub fn encode(&mut self, input: &[u8]) -> Result<Vec<u8>> {
        self.reset();
        self.write(input)?;
        self.finish()
    }

    /// Encode `input` into unpacked codes plus the final dictionary size.
    pub fn encode_codes(&mut self, input: &[u8]) -> Result<EncodedCodes> {
        self.reset();

        let mut codes = Vec::new();
        scan(&mut self.dict, &mut self.current, input, |code, _| {
            codes.push(code);
            Ok(())
        })?;
        if let Some(code) = self.current.take() {
            codes.push(code);
        }

        let dictionary_size = self.dict.size();
        self.reset();
        Ok(EncodedCodes {
            codes,
            dictionary_size,
        })
    }

    /// Reset the encoder to initial state, discarding pending output.
    pub fn reset(&mut self) {
        self.dict.reset();
        self.writer = MsbBitWriter::new();
        self.current = None;
        self.codes_emitted = 0;
        self.bytes_in = 0;
    }
}

/// Core LZW scan: extend the match while `w + b` is known, otherwise emit
/// `w` at the current width, learn `w + b`, and restart from `b`.
fn scan<F>(
    dict: &mut LzwDictionary,
    current: &mut Option<u16>,
    input: &[u8],
    mut emit: F,
) -> Result<()>
where
    F: FnMut(u16, u8) -> Result<()>,
{
    for &byte in input {
        let Some(w) = *current else {
            *current = Some(byte as u16);
            continue;
        };

        if let Some(code) = dict.find(w, byte) {
            *current = Some(code);
            continue;
        }

        emit(w, dict.code_width(false))?;
        dict.insert(w, byte)?;
        *current = Some(byte as u16);
    }
    Ok(())
}
