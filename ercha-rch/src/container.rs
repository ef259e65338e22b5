//! RCH container: header plus LZW payload.

use crate::header::{HEADER_SIZE, RchHeader};
use ercha_core::{ErchaError, Result};
use std::io::{Read, Write};

/// Largest payload buffer reserved up front; bigger payloads grow as read.
const MAX_PAYLOAD_PREALLOC: u64 = 64 * 1024 * 1024;

/// A complete RCH container held in memory.
///
/// The header's `compressed_len` always equals the payload length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RchContainer {
    header: RchHeader,
    payload: Vec<u8>,
}

impl RchContainer {
    /// Create a container, setting the header's payload length.
    pub fn new(mut header: RchHeader, payload: Vec<u8>) -> Self {
        header.compressed_len = payload.len() as u64;
        Self { header, payload }
    }

    /// Get the header.
    pub fn header(&self) -> &RchHeader {
        &self.header
    }

    /// Get the compressed payload.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Split into header and payload.
    pub fn into_parts(self) -> (RchHeader, Vec<u8>) {
        (self.header, self.payload)
    }

    /// Serialized size in bytes.
    pub fn encoded_len(&self) -> usize {
        HEADER_SIZE + self.payload.len()
    }

    /// Write header and payload, nothing else.
    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        self.header.write(writer)?;
        writer.write_all(&self.payload)?;
        Ok(())
    }

    /// Serialize to a new buffer.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.encoded_len());
        buf.extend_from_slice(&self.header.to_bytes());
        buf.extend_from_slice(&self.payload);
        buf
    }

    /// Read a container from a reader.
    ///
    /// Reads exactly `compressed_len` payload bytes after the header; any
    /// further input is left unread.
    pub fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let header = RchHeader::read(reader)?;

        let expected = header.compressed_len;
        let mut payload = Vec::with_capacity(expected.min(MAX_PAYLOAD_PREALLOC) as usize);
        reader.by_ref().take(expected).read_to_end(&mut payload)?;
        if (payload.len() as u64) < expected {
            return Err(ErchaError::truncated(
                header.container_len(),
                HEADER_SIZE as u64 + payload.len() as u64,
            ));
        }

        Ok(Self { header, payload })
    }

    /// Parse a container that must span all of `data`.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut cursor = data;
        let container = Self::read(&mut cursor)?;
        if !cursor.is_empty() {
            return Err(ErchaError::corrupt(format!(
                "{} trailing bytes after payload",
                cursor.len()
            )));
        }
        Ok(container)
    }

    /// Check decompressed data against the header checksum.
    pub fn verify(&self, data: &[u8]) -> Result<()> {
        verify(&self.header, data)
    }
}

/// Recompute the checksum of `data` and compare it to the header's.
pub fn verify(header: &RchHeader, data: &[u8]) -> Result<()> {
    if data.len() as u64 != header.original_len {
        return Err(ErchaError::corrupt(format!(
            "decoded {} bytes, header declares {}",
            data.len(),
            header.original_len
        )));
    }
    header.verify(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ercha_core::{ChecksumKind, ErrorKind};
    use ercha_lzw::LzwConfig;
    use std::io::Cursor;

    fn sample() -> RchContainer {
        let mut header = RchHeader::new(LzwConfig::default(), ChecksumKind::Crc32, false);
        header.original_len = 13;
        header.checksum = ChecksumKind::Crc32.compute(b"Hello, World!");
        RchContainer::new(header, vec![1, 2, 3, 4, 5, 6, 7])
    }

    #[test]
    fn test_write_read() {
        let container = sample();
        assert_eq!(container.header().compressed_len, 7);

        let mut buf = Vec::new();
        container.write(&mut buf).unwrap();
        assert_eq!(buf.len(), container.encoded_len());
        assert_eq!(buf, container.to_bytes());

        let parsed = RchContainer::read(&mut Cursor::new(&buf)).unwrap();
        assert_eq!(parsed, container);
    }

    #[test]
    fn test_read_leaves_following_bytes() {
        let mut buf = sample().to_bytes();
        buf.extend_from_slice(b"next");

        let mut cursor = Cursor::new(&buf);
        RchContainer::read(&mut cursor).unwrap();
        let mut rest = Vec::new();
        cursor.read_to_end(&mut rest).unwrap();
        assert_eq!(rest, b"next");

        let err = RchContainer::from_bytes(&buf).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CorruptStream);
    }

    #[test]
    fn test_truncated_payload() {
        let buf = sample().to_bytes();
        let err = RchContainer::from_bytes(&buf[..buf.len() - 1]).unwrap_err();
        assert!(matches!(
            err,
            ErchaError::TruncatedInput {
                expected: 37,
                available: 36
            }
        ));
    }

    #[test]
    fn test_hostile_length_does_not_allocate() {
        let mut header = sample().header;
        header.compressed_len = u64::MAX;
        let mut buf = header.to_bytes().to_vec();
        buf.extend_from_slice(&[0u8; 16]);

        let err = RchContainer::from_bytes(&buf).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TruncatedInput);
    }

    #[test]
    fn test_verify() {
        let container = sample();
        assert!(container.verify(b"Hello, World!").is_ok());
        assert_eq!(
            container.verify(b"Hello, world!").unwrap_err().kind(),
            ErrorKind::ChecksumMismatch
        );
        assert_eq!(
            container.verify(b"Hello").unwrap_err().kind(),
            ErrorKind::CorruptStream
        );
    }
}
