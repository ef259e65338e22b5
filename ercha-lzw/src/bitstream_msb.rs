//! MSB-first bit stream operations for LZW code packing.
//!
//! Convention, shared by both directions: codes are written most significant
//! bit first, and the first code starts at the most significant bit of the
//! first byte. The last byte is padded with zero bits. A 16-bit code written
//! at a byte boundary is therefore a big-endian `u16`.

use crate::error::{LzwError, Result};

/// MSB-first bit reader for LZW decompression.
#[derive(Debug)]
pub struct MsbBitReader<'a> {
    /// Input data.
    data: &'a [u8],
    /// Current byte position.
    byte_pos: usize,
    /// Bit buffer; the low `bits_in_buffer` bits are valid.
    buffer: u32,
    /// Number of valid bits in buffer.
    bits_in_buffer: u8,
    /// Total bits read (for error reporting).
    total_bits_read: u64,
}

impl<'a> MsbBitReader<'a> {
    /// Create a new MSB bit reader.
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            byte_pos: 0,
            buffer: 0,
            bits_in_buffer: 0,
            total_bits_read: 0,
        }
    }

    #[inline]
    fn fill_buffer(&mut self, count: u8) -> Result<()> {
        while self.bits_in_buffer < count && self.byte_pos < self.data.len() {
            self.buffer = (self.buffer << 8) | self.data[self.byte_pos] as u32;
            self.byte_pos += 1;
            self.bits_in_buffer += 8;
        }

        if self.bits_in_buffer < count {
            return Err(LzwError::UnexpectedEof {
                position: self.total_bits_read,
            });
        }

        Ok(())
    }

    /// Read up to 16 bits from the stream (MSB-first).
    pub fn read_bits(&mut self, count: u8) -> Result<u16> {
        if count == 0 || count > 16 {
            return Err(LzwError::InvalidBitWidth(count));
        }

        self.fill_buffer(count)?;

        let shift = self.bits_in_buffer - count;
        let value = (self.buffer >> shift) & ((1u32 << count) - 1);

        self.bits_in_buffer -= count;
        self.buffer &= (1u32 << self.bits_in_buffer) - 1;
        self.total_bits_read += count as u64;

        Ok(value as u16)
    }

    /// Get total bits read.
    pub fn bits_read(&self) -> u64 {
        self.total_bits_read
    }

    /// Bits not yet consumed, padding included.
    pub fn bits_remaining(&self) -> u64 {
        (self.data.len() - self.byte_pos) as u64 * 8 + self.bits_in_buffer as u64
    }

    /// True if everything left is the zero padding of the final byte.
    pub fn only_padding_left(&self) -> bool {
        self.byte_pos == self.data.len() && self.bits_in_buffer < 8 && self.buffer == 0
    }
}

/// MSB-first bit writer for LZW compression.
#[derive(Debug, Default)]
pub struct MsbBitWriter {
    /// Completed bytes not yet taken by the caller.
    output: Vec<u8>,
    /// Bit buffer; the low `bits_in_buffer` bits are pending.
    buffer: u32,
    /// Number of pending bits (always < 8 between calls).
    bits_in_buffer: u8,
    /// Total bits written, for statistics.
    total_bits: u64,
}

impl MsbBitWriter {
    /// Create a new MSB bit writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Write up to 16 bits to the stream (MSB-first).
    pub fn write_bits(&mut self, value: u16, count: u8) -> Result<()> {
        if count == 0 || count > 16 {
            return Err(LzwError::InvalidBitWidth(count));
        }

        self.buffer = (self.buffer << count) | (value as u32 & ((1u32 << count) - 1));
        self.bits_in_buffer += count;
        self.total_bits += count as u64;

        while self.bits_in_buffer >= 8 {
            self.bits_in_buffer -= 8;
            self.output.push((self.buffer >> self.bits_in_buffer) as u8);
        }
        self.buffer &= (1u32 << self.bits_in_buffer) - 1;

        Ok(())
    }

    /// Pad the pending bits with zeros to a whole byte.
    pub fn flush(&mut self) {
        if self.bits_in_buffer > 0 {
            let pad = 8 - self.bits_in_buffer;
            self.output.push((self.buffer << pad) as u8);
            self.total_bits += pad as u64;
            self.buffer = 0;
            self.bits_in_buffer = 0;
        }
    }

    /// Take the completed bytes, keeping any partial byte pending.
    pub fn take_bytes(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.output)
    }

    /// Total bits written so far, including flushed padding.
    pub fn bits_written(&self) -> u64 {
        self.total_bits
    }

    /// Flush and return all remaining output.
    pub fn into_vec(mut self) -> Vec<u8> {
        self.flush();
        self.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_msb_roundtrip() {
        let mut writer = MsbBitWriter::new();

        writer.write_bits(0b101, 3).unwrap();
        writer.write_bits(0b1100, 4).unwrap();
        writer.write_bits(0b11111111, 8).unwrap();

        let data = writer.into_vec();

        let mut reader = MsbBitReader::new(&data);
        assert_eq!(reader.read_bits(3).unwrap(), 0b101);
        assert_eq!(reader.read_bits(4).unwrap(), 0b1100);
        assert_eq!(reader.read_bits(8).unwrap(), 0b11111111);
        assert!(reader.only_padding_left());
    }

    #[test]
    fn test_msb_byte_boundary() {
        let mut writer = MsbBitWriter::new();
        writer.write_bits(0xAB, 8).unwrap();

        let data = writer.into_vec();
        assert_eq!(data, vec![0xAB]);

        let mut reader = MsbBitReader::new(&data);
        assert_eq!(reader.read_bits(8).unwrap(), 0xAB);
        assert_eq!(reader.bits_remaining(), 0);
    }

    #[test]
    fn test_sixteen_bit_codes_are_big_endian() {
        let mut writer = MsbBitWriter::new();
        writer.write_bits(0x0102, 16).unwrap();
        writer.write_bits(0xFFFE, 16).unwrap();
        assert_eq!(writer.into_vec(), vec![0x01, 0x02, 0xFF, 0xFE]);
    }

    #[test]
    fn test_take_bytes_keeps_partial_byte() {
        let mut writer = MsbBitWriter::new();
        writer.write_bits(0x1FF, 9).unwrap();
        assert_eq!(writer.take_bytes(), vec![0xFF]);
        writer.write_bits(0, 7).unwrap();
        assert_eq!(writer.take_bytes(), vec![0x80]);
        assert!(writer.into_vec().is_empty());
    }

    #[test]
    fn test_eof_and_padding() {
        let data = [0b1010_0000];
        let mut reader = MsbBitReader::new(&data);
        assert_eq!(reader.read_bits(3).unwrap(), 0b101);
        assert!(reader.only_padding_left());
        assert!(matches!(
            reader.read_bits(9),
            Err(LzwError::UnexpectedEof { position: 3 })
        ));
    }

    #[test]
    fn test_nonzero_tail_is_not_padding() {
        let data = [0b1010_0001];
        let mut reader = MsbBitReader::new(&data);
        reader.read_bits(3).unwrap();
        assert!(!reader.only_padding_left());
    }
}
