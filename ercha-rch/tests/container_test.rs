//! RCH container integration tests: framing, validation, corruption.

use ercha_core::{ChecksumKind, ErchaError, ErrorKind};
use ercha_lzw::{DictionaryPolicy, LzwConfig};
use ercha_rch::{ArchivePipeline, HEADER_SIZE, PipelineOptions, RchContainer, RchHeader};
use proptest::prelude::*;
use std::io::Cursor;

fn sample_bytes() -> Vec<u8> {
    let data = b"The RCH container wraps LZW output. ".repeat(20);
    ArchivePipeline::default()
        .compress(&data)
        .unwrap()
        .to_bytes()
}

#[test]
fn test_read_is_idempotent() {
    let bytes = sample_bytes();
    let first = RchContainer::read(&mut Cursor::new(&bytes)).unwrap();
    let second = RchContainer::read(&mut Cursor::new(&bytes)).unwrap();
    assert_eq!(first.header(), second.header());
    assert_eq!(first.payload(), second.payload());
}

#[test]
fn test_write_emits_header_then_payload() {
    let container = ArchivePipeline::default().compress(b"abcabcabc").unwrap();
    let mut out = Vec::new();
    container.write(&mut out).unwrap();

    assert_eq!(&out[..4], b"ERCH");
    assert_eq!(out.len(), HEADER_SIZE + container.payload().len());
    assert_eq!(&out[HEADER_SIZE..], container.payload());
}

#[test]
fn test_every_truncation_is_reported() {
    let bytes = sample_bytes();
    for n in 1..bytes.len() {
        let err = RchContainer::from_bytes(&bytes[..n]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TruncatedInput, "cut at {}", n);
    }
}

#[test]
fn test_foreign_files_rejected() {
    for foreign in [
        b"PK\x03\x04 this is a zip file.........".to_vec(),
        b"\x1f\x8b\x08\x00 gzip...........................".to_vec(),
        vec![0u8; HEADER_SIZE],
    ] {
        let err = RchContainer::from_bytes(&foreign).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedFormat);
    }
}

#[test]
fn test_unknown_version_rejected() {
    let mut bytes = sample_bytes();
    bytes[4] = 9;
    let err = RchContainer::from_bytes(&bytes).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedFormat);
}

#[test]
fn test_header_flags_drive_decoding() {
    let options = PipelineOptions {
        lzw: LzwConfig::new(11)
            .with_policy(DictionaryPolicy::Reset)
            .with_fixed_width(true),
        checksum: ChecksumKind::Crc64,
        xor255: true,
    };
    let data = b"flags flags flags flags".repeat(200);
    let bytes = ArchivePipeline::new(options)
        .unwrap()
        .compress(&data)
        .unwrap()
        .to_bytes();

    let header = RchHeader::read(&mut Cursor::new(&bytes)).unwrap();
    assert_eq!(header.max_code_width, 11);
    assert_eq!(header.policy, DictionaryPolicy::Reset);
    assert!(header.fixed_width);
    assert!(header.xor255);
    assert_eq!(header.checksum_kind, ChecksumKind::Crc64);

    let container = RchContainer::from_bytes(&bytes).unwrap();
    assert_eq!(
        ArchivePipeline::default().decompress(&container).unwrap(),
        data
    );
}

#[test]
fn test_single_bit_flips_never_pass() {
    let data = b"integrity matters, integrity matters".repeat(3);
    let bytes = ArchivePipeline::default()
        .compress(&data)
        .unwrap()
        .to_bytes();
    let pipeline = ArchivePipeline::default();

    let mut mismatches = 0;
    for byte in HEADER_SIZE..bytes.len() {
        for bit in 0..8 {
            let mut corrupted = bytes.clone();
            corrupted[byte] ^= 1 << bit;
            let container = RchContainer::from_bytes(&corrupted).unwrap();
            let err = pipeline.decompress(&container).unwrap_err();
            match err.kind() {
                ErrorKind::ChecksumMismatch => mismatches += 1,
                ErrorKind::CorruptStream => {}
                other => panic!("byte {} bit {}: unexpected {:?}", byte, bit, other),
            }
        }
    }
    assert!(mismatches > 0);
}

#[test]
fn test_root_code_flip_is_checksum_mismatch() {
    // Fixed 16-bit codes of unique bytes are all roots; flipping the low bit
    // of a code swaps one byte for another and only the checksum notices.
    let options = PipelineOptions::legacy();
    let mut bytes = ArchivePipeline::new(options)
        .unwrap()
        .compress(b"ABCDEFGH")
        .unwrap()
        .to_bytes();
    let last = bytes.len() - 1;
    bytes[last] ^= 0x01;

    let container = RchContainer::from_bytes(&bytes).unwrap();
    let err = ArchivePipeline::default().decompress(&container).unwrap_err();
    assert!(matches!(
        err,
        ErchaError::ChecksumMismatch {
            algorithm: ChecksumKind::Crc32,
            ..
        }
    ));
}

#[test]
fn test_legacy_layout_hand_built() {
    // Two-byte big-endian codes: 'A', 'B', 256 ("AB").
    let payload = vec![0x00, 0x41, 0x00, 0x42, 0x01, 0x00];
    let mut header = RchHeader::new(LzwConfig::LEGACY, ChecksumKind::Crc32, false);
    header.original_len = 4;
    header.checksum = ChecksumKind::Crc32.compute(b"ABAB");
    let container = RchContainer::new(header, payload);

    let parsed = RchContainer::from_bytes(&container.to_bytes()).unwrap();
    assert_eq!(
        ArchivePipeline::default().decompress(&parsed).unwrap(),
        b"ABAB"
    );
}

proptest! {
    #[test]
    fn prop_random_header_bytes_rejected(bytes in proptest::collection::vec(any::<u8>(), HEADER_SIZE)) {
        prop_assume!(&bytes[..4] != b"ERCH");
        let err = RchContainer::from_bytes(&bytes).unwrap_err();
        prop_assert_eq!(err.kind(), ErrorKind::UnsupportedFormat);
    }

    #[test]
    fn prop_truncation_detected(data in proptest::collection::vec(any::<u8>(), 1..512), cut in any::<prop::sample::Index>()) {
        let bytes = ArchivePipeline::default().compress(&data).unwrap().to_bytes();
        let n = 1 + cut.index(bytes.len() - 1);
        let err = RchContainer::read(&mut Cursor::new(&bytes[..n])).unwrap_err();
        prop_assert_eq!(err.kind(), ErrorKind::TruncatedInput);
    }
}
