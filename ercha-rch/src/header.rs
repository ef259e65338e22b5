//! RCH header parsing and writing.
//!
//! Layout (30 bytes, integers little-endian):
//!
//! ```text
//! 0   magic            b"ERCH"
//! 4   version          1
//! 5   flags            see [`flags`]
//! 6   original_len     u64
//! 14  compressed_len   u64
//! 22  checksum         u64 (CRC-32 zero-extended)
//! ```

use ercha_core::{ChecksumKind, ErchaError, Result};
use ercha_lzw::{DictionaryPolicy, LzwConfig, MIN_CODE_BITS};
use serde::Serialize;
use std::io::{Read, Write};

/// RCH magic bytes.
pub const RCH_MAGIC: [u8; 4] = *b"ERCH";

/// Format revision written by this crate.
pub const RCH_VERSION: u8 = 1;

/// Serialized header size in bytes.
pub const HEADER_SIZE: usize = 30;

/// RCH header flag bits.
pub mod flags {
    /// Bits 0-2: maximum code width minus 9.
    pub const WIDTH_MASK: u8 = 0x07;
    /// Every code is written at the maximum width.
    pub const FIXED_WIDTH: u8 = 0x08;
    /// Bits 4-5: dictionary policy id.
    pub const POLICY_MASK: u8 = 0x30;
    /// Shift of the policy id.
    pub const POLICY_SHIFT: u8 = 4;
    /// Set for CRC-64, clear for CRC-32.
    pub const CRC64: u8 = 0x40;
    /// XOR-255 applied to the data before LZW.
    pub const XOR255: u8 = 0x80;
}

/// RCH container header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RchHeader {
    /// Format version.
    pub version: u8,
    /// Maximum LZW code width in bits.
    pub max_code_width: u8,
    /// Whether codes are fixed at `max_code_width`.
    pub fixed_width: bool,
    /// Full-dictionary policy.
    pub policy: DictionaryPolicy,
    /// Checksum algorithm.
    pub checksum_kind: ChecksumKind,
    /// Whether the XOR-255 pre-transform was applied.
    pub xor255: bool,
    /// Uncompressed size.
    pub original_len: u64,
    /// Payload size.
    pub compressed_len: u64,
    /// Checksum of the uncompressed data.
    pub checksum: u64,
}

impl RchHeader {
    /// Create a header for the given codec settings; sizes and checksum are zero.
    pub fn new(lzw: LzwConfig, checksum_kind: ChecksumKind, xor255: bool) -> Self {
        Self {
            version: RCH_VERSION,
            max_code_width: lzw.max_bits,
            fixed_width: lzw.fixed_width,
            policy: lzw.policy,
            checksum_kind,
            xor255,
            original_len: 0,
            compressed_len: 0,
            checksum: 0,
        }
    }

    /// LZW configuration the payload was encoded with.
    pub fn lzw_config(&self) -> LzwConfig {
        LzwConfig::new(self.max_code_width)
            .with_policy(self.policy)
            .with_fixed_width(self.fixed_width)
    }

    /// Pack the codec settings into the flags byte.
    pub fn flags(&self) -> u8 {
        let mut value = self.max_code_width.saturating_sub(MIN_CODE_BITS) & flags::WIDTH_MASK;
        if self.fixed_width {
            value |= flags::FIXED_WIDTH;
        }
        value |= self.policy.id() << flags::POLICY_SHIFT;
        if self.checksum_kind == ChecksumKind::Crc64 {
            value |= flags::CRC64;
        }
        if self.xor255 {
            value |= flags::XOR255;
        }
        value
    }

    /// Serialize to the fixed 30-byte layout.
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[0..4].copy_from_slice(&RCH_MAGIC);
        buf[4] = self.version;
        buf[5] = self.flags();
        buf[6..14].copy_from_slice(&self.original_len.to_le_bytes());
        buf[14..22].copy_from_slice(&self.compressed_len.to_le_bytes());
        buf[22..30].copy_from_slice(&self.checksum.to_le_bytes());
        buf
    }

    /// Parse and validate a serialized header.
    pub fn from_bytes(buf: &[u8; HEADER_SIZE]) -> Result<Self> {
        if buf[0..4] != RCH_MAGIC {
            return Err(ErchaError::invalid_magic(&RCH_MAGIC, &buf[0..4]));
        }

        let version = buf[4];
        check_version(version)?;

        let bits = buf[5];
        let policy_id = (bits & flags::POLICY_MASK) >> flags::POLICY_SHIFT;
        let policy = DictionaryPolicy::from_id(policy_id).ok_or_else(|| {
            ErchaError::unsupported(format!("reserved dictionary policy {}", policy_id))
        })?;
        let checksum_kind = if bits & flags::CRC64 != 0 {
            ChecksumKind::Crc64
        } else {
            ChecksumKind::Crc32
        };

        let original_len = u64::from_le_bytes(le_field(buf, 6));
        let compressed_len = u64::from_le_bytes(le_field(buf, 14));
        let checksum = u64::from_le_bytes(le_field(buf, 22));

        if (original_len == 0) != (compressed_len == 0) {
            return Err(ErchaError::corrupt(format!(
                "inconsistent lengths: {} bytes from a {} byte payload",
                original_len, compressed_len
            )));
        }
        if checksum_kind == ChecksumKind::Crc32 && checksum > u32::MAX as u64 {
            return Err(ErchaError::corrupt("CRC-32 digest wider than 32 bits"));
        }

        Ok(Self {
            version,
            max_code_width: MIN_CODE_BITS + (bits & flags::WIDTH_MASK),
            fixed_width: bits & flags::FIXED_WIDTH != 0,
            policy,
            checksum_kind,
            xor255: bits & flags::XOR255 != 0,
            original_len,
            compressed_len,
            checksum,
        })
    }

    /// Write the header to a writer.
    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&self.to_bytes())?;
        Ok(())
    }

    /// Read an RCH header from a reader.
    ///
    /// Magic and version are checked on whatever bytes are available before
    /// the length, so short foreign or newer files report a format error
    /// rather than truncation.
    pub fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let mut buf = [0u8; HEADER_SIZE];
        let filled = read_up_to(reader, &mut buf)?;

        let seen = filled.min(RCH_MAGIC.len());
        if buf[..seen] != RCH_MAGIC[..seen] {
            return Err(ErchaError::invalid_magic(&RCH_MAGIC, &buf[..seen]));
        }
        if filled > RCH_MAGIC.len() {
            check_version(buf[RCH_MAGIC.len()])?;
        }
        if filled < HEADER_SIZE {
            return Err(ErchaError::truncated(HEADER_SIZE as u64, filled as u64));
        }

        Self::from_bytes(&buf)
    }

    /// Check `data` against the stored checksum.
    pub fn verify(&self, data: &[u8]) -> Result<()> {
        let computed = self.checksum_kind.compute(data);
        if computed != self.checksum {
            return Err(ErchaError::checksum_mismatch(
                self.checksum_kind,
                self.checksum,
                computed,
            ));
        }
        Ok(())
    }

    /// Short name of the payload encoding.
    pub fn encoding(&self) -> &'static str {
        if self.xor255 { "XOR255+LZW" } else { "LZW" }
    }

    /// Human-readable summary of the codec settings.
    pub fn describe(&self) -> String {
        let width = if self.fixed_width {
            format!("fixed {}-bit", self.max_code_width)
        } else {
            format!("variable 8-{} bit", self.max_code_width)
        };
        format!(
            "{}, {} codes, {} policy, {}",
            self.encoding(),
            width,
            self.policy,
            self.checksum_kind
        )
    }

    /// Compressed size as a percentage of the original.
    pub fn ratio(&self) -> f64 {
        if self.original_len == 0 {
            return 0.0;
        }
        self.compressed_len as f64 / self.original_len as f64 * 100.0
    }

    /// Total container size, header included.
    pub fn container_len(&self) -> u64 {
        (HEADER_SIZE as u64).saturating_add(self.compressed_len)
    }
}

fn check_version(version: u8) -> Result<()> {
    if version != RCH_VERSION {
        return Err(ErchaError::unsupported(format!(
            "RCH version {} (this reader supports {})",
            version, RCH_VERSION
        )));
    }
    Ok(())
}

fn le_field(buf: &[u8; HEADER_SIZE], offset: usize) -> [u8; 8] {
    let mut field = [0u8; 8];
    field.copy_from_slice(&buf[offset..offset + 8]);
    field
}

/// Fill `buf` as far as the reader allows, returning the byte count.
pub(crate) fn read_up_to<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ercha_core::ErrorKind;
    use std::io::Cursor;

    fn sample() -> RchHeader {
        let mut header = RchHeader::new(
            LzwConfig::new(12).with_policy(DictionaryPolicy::Reset),
            ChecksumKind::Crc64,
            true,
        );
        header.original_len = 1000;
        header.compressed_len = 420;
        header.checksum = 0x0123_4567_89AB_CDEF;
        header
    }

    #[test]
    fn test_header_layout() {
        let bytes = sample().to_bytes();
        assert_eq!(&bytes[0..4], b"ERCH");
        assert_eq!(bytes[4], 1);
        // width 12 -> 3, reset -> 0x10, crc64 -> 0x40, xor -> 0x80
        assert_eq!(bytes[5], 0x03 | 0x10 | 0x40 | 0x80);
        assert_eq!(&bytes[6..14], &1000u64.to_le_bytes());
        assert_eq!(&bytes[14..22], &420u64.to_le_bytes());
        assert_eq!(&bytes[22..30], &0x0123_4567_89AB_CDEFu64.to_le_bytes());
    }

    #[test]
    fn test_header_write_read() {
        let header = sample();
        let mut buf = Vec::new();
        header.write(&mut buf).unwrap();
        assert_eq!(buf.len(), HEADER_SIZE);

        let parsed = RchHeader::read(&mut Cursor::new(&buf)).unwrap();
        assert_eq!(parsed, header);
        assert_eq!(parsed.lzw_config(), header.lzw_config());
    }

    #[test]
    fn test_default_flags() {
        let header = RchHeader::new(LzwConfig::default(), ChecksumKind::Crc32, false);
        // 16-bit ceiling, variable width, freeze, CRC-32, no transform.
        assert_eq!(header.flags(), 0x07);

        let legacy = RchHeader::new(LzwConfig::LEGACY, ChecksumKind::Crc32, false);
        assert_eq!(legacy.flags(), 0x0F);
    }

    #[test]
    fn test_bad_magic() {
        let mut bytes = sample().to_bytes();
        bytes[0] = b'X';
        let err = RchHeader::read(&mut Cursor::new(&bytes)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedFormat);

        // Short foreign input is a format error, not a truncation.
        let err = RchHeader::read(&mut Cursor::new(b"PK")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedFormat);
    }

    #[test]
    fn test_unknown_version() {
        let mut bytes = sample().to_bytes();
        bytes[4] = 2;
        let err = RchHeader::from_bytes(&bytes).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedFormat);
    }

    #[test]
    fn test_short_input_with_unknown_version() {
        let mut bytes = sample().to_bytes();
        bytes[4] = 9;
        for n in [5usize, 6, 17, 29] {
            let err = RchHeader::read(&mut Cursor::new(&bytes[..n])).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::UnsupportedFormat, "n = {}", n);
        }
    }

    #[test]
    fn test_reserved_policy() {
        let mut bytes = sample().to_bytes();
        bytes[5] |= flags::POLICY_MASK;
        let err = RchHeader::from_bytes(&bytes).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedFormat);
    }

    #[test]
    fn test_truncated_header() {
        let bytes = sample().to_bytes();
        for n in [0usize, 1, 4, 5, 29] {
            let err = RchHeader::read(&mut Cursor::new(&bytes[..n])).unwrap_err();
            assert!(
                matches!(err, ErchaError::TruncatedInput { expected: 30, available } if available == n as u64),
                "n = {}: {:?}",
                n,
                err
            );
        }
    }

    #[test]
    fn test_inconsistent_lengths() {
        let mut header = sample();
        header.compressed_len = 0;
        let err = RchHeader::from_bytes(&header.to_bytes()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CorruptStream);
    }

    #[test]
    fn test_verify() {
        let data = b"Hello, World!";
        let mut header = RchHeader::new(LzwConfig::default(), ChecksumKind::Crc32, false);
        header.checksum = 0xEC4AC3D0;
        assert!(header.verify(data).is_ok());

        let err = header.verify(b"Hello, World?").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ChecksumMismatch);
    }

    #[test]
    fn test_describe() {
        let header = sample();
        assert_eq!(
            header.describe(),
            "XOR255+LZW, variable 8-12 bit codes, reset policy, CRC-64"
        );
        let legacy = RchHeader::new(LzwConfig::LEGACY, ChecksumKind::Crc32, false);
        assert_eq!(
            legacy.describe(),
            "LZW, fixed 16-bit codes, freeze policy, CRC-32"
        );
        assert_eq!(legacy.encoding(), "LZW");
        assert_eq!(header.encoding(), "XOR255+LZW");
    }
}
