//! Multi-entry archive integration tests: pack, selective unpack, inject,
//! detract, and hostile member names.

use ercha_core::{ChecksumKind, ErrorKind};
use ercha_rch::archive::ops::{DEFAULT_STDIN_NAME, detract_archive, read_archive};
use ercha_rch::archive::{ARCHIVE_MAGIC, ARCHIVE_VERSION};
use ercha_rch::{
    ArchiveMember, ArchivePipeline, EntryStatus, PipelineOptions, RchArchive, RchContainer,
};
use proptest::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

fn write_sources(dir: &Path, files: &[(&str, &[u8])]) -> Vec<PathBuf> {
    files
        .iter()
        .map(|(name, body)| {
            let path = dir.join(name);
            fs::write(&path, body).unwrap();
            path
        })
        .collect()
}

/// Hand-build an archive whose single member has an arbitrary name.
fn archive_with_name(name: &str) -> Vec<u8> {
    let container = ArchivePipeline::default().compress(b"escaped").unwrap();
    let mut bytes = ARCHIVE_MAGIC.to_vec();
    bytes.push(ARCHIVE_VERSION);
    bytes.extend_from_slice(&(name.len() as u16).to_le_bytes());
    bytes.extend_from_slice(name.as_bytes());
    bytes.extend_from_slice(&container.to_bytes());
    bytes
}

#[test]
fn test_pack_unpack_roundtrip() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let log = b"2026-01-01 INFO ok\n".repeat(300);
    let sources = write_sources(
        dir.path(),
        &[
            ("app.log", log.as_slice()),
            ("blob.bin", &[0xA5; 5000]),
            ("note", b"n"),
        ],
    );
    let archive = dir.path().join("all.erca");
    let pipeline = ArchivePipeline::new(PipelineOptions {
        checksum: ChecksumKind::Crc64,
        xor255: true,
        ..PipelineOptions::default()
    })?;

    let packed = pipeline.pack_archive(&sources, &archive, DEFAULT_STDIN_NAME, false)?;
    assert_eq!(packed.len(), 3);
    assert!(packed.iter().all(|r| r.status == EntryStatus::Packed));
    assert_eq!(packed[0].encoding, "XOR255+LZW");
    assert!(packed[0].compressed_len < log.len() as u64);

    // Any pipeline can read members; settings travel in each header.
    let out = dir.path().join("out");
    let reports =
        ArchivePipeline::default().unpack_archive(&archive, &out, &[] as &[&str], false, false)?;
    assert!(reports.iter().all(|r| !r.is_failure()));
    for source in &sources {
        let name = source.file_name().unwrap();
        assert_eq!(fs::read(out.join(name))?, fs::read(source)?);
    }
    Ok(())
}

#[test]
fn test_selective_extract() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let sources = write_sources(
        dir.path(),
        &[("a.txt", b"aaaa"), ("b.txt", b"bbbb"), ("c.txt", b"cccc")],
    );
    let archive = dir.path().join("abc.erca");
    let pipeline = ArchivePipeline::default();
    pipeline.pack_archive(&sources, &archive, DEFAULT_STDIN_NAME, false)?;

    let out = dir.path().join("some");
    let reports = pipeline.unpack_archive(&archive, &out, &["c.txt", "a.txt"], false, false)?;
    let names: Vec<_> = reports.iter().map(|r| r.name.as_str()).collect();
    // Stored order, not request order.
    assert_eq!(names, ["a.txt", "c.txt"]);
    assert_eq!(fs::read(out.join("a.txt"))?, b"aaaa");
    assert_eq!(fs::read(out.join("c.txt"))?, b"cccc");
    assert!(!out.join("b.txt").exists());
    Ok(())
}

#[test]
fn test_inject_then_detract() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let first = write_sources(dir.path(), &[("first", b"1111")]);
    let later = write_sources(dir.path(), &[("second", b"2222"), ("third", b"3333")]);
    let archive = dir.path().join("grow.erca");
    let pipeline = ArchivePipeline::default();

    pipeline.pack_archive(&first, &archive, DEFAULT_STDIN_NAME, false)?;
    let injected = pipeline.inject_archive(&archive, &later, DEFAULT_STDIN_NAME, false)?;
    assert_eq!(injected.len(), 2);
    assert!(injected.iter().all(|r| r.status == EntryStatus::Injected));

    let names = |path: &Path| -> Vec<String> {
        read_archive(path)
            .unwrap()
            .members()
            .iter()
            .map(|m| m.name().to_string())
            .collect()
    };
    assert_eq!(names(&archive), ["first", "second", "third"]);

    let report = detract_archive(&archive, &["second"], None, false)?;
    assert_eq!(report.removed, ["second"]);
    assert!(report.missing.is_empty());
    assert_eq!(names(&archive), ["first", "third"]);

    let checked = pipeline.check_archive(&archive)?;
    assert!(checked.iter().all(|r| r.status == EntryStatus::Checked));
    Ok(())
}

#[test]
fn test_appending_bytes_equals_inject() {
    let pipeline = ArchivePipeline::default();
    let one = ArchiveMember::new("one", pipeline.compress(b"1").unwrap()).unwrap();
    let two = ArchiveMember::new("two", pipeline.compress(b"22").unwrap()).unwrap();

    let mut archive = RchArchive::new();
    archive.insert(one, false).unwrap();
    let mut bytes = archive.to_bytes();
    archive.insert(two.clone(), false).unwrap();

    let mut alone = RchArchive::new();
    alone.insert(two, false).unwrap();
    bytes.extend_from_slice(&alone.to_bytes()[ARCHIVE_MAGIC.len() + 1..]);
    assert_eq!(bytes, archive.to_bytes());
}

#[test]
fn test_path_traversal_names_never_extracted() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let out = dir.path().join("jail");
    for name in ["../outside.txt", "/tmp/abs.txt", "sub/inner.txt", "..\\win.txt", ".."] {
        let archive = dir.path().join("evil.erca");
        fs::write(&archive, archive_with_name(name))?;

        let err = ArchivePipeline::default()
            .unpack_archive(&archive, &out, &[] as &[&str], true, true)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CorruptStream, "name {:?}", name);
        let err = ArchivePipeline::default().check_archive(&archive).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CorruptStream);
    }
    assert!(!dir.path().join("outside.txt").exists());
    assert!(!out.exists());
    Ok(())
}

#[test]
fn test_stdin_member_name_is_sanitized() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let sources = write_sources(dir.path(), &[("real.txt", b"real")]);
    let archive = dir.path().join("named.erca");
    let pipeline = ArchivePipeline::default();
    pipeline.pack_archive(&sources, &archive, "../../ignored", false)?;
    // The stdin name only applies to `-`.
    assert!(read_archive(&archive)?.find("real.txt").is_some());
    Ok(())
}

#[test]
fn test_container_is_not_an_archive() {
    let container = ArchivePipeline::default().compress(b"single").unwrap();
    let err = RchArchive::from_bytes(&container.to_bytes()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedFormat);
    let err = RchContainer::from_bytes(&RchArchive::new().to_bytes()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedFormat);
}

proptest! {
    #[test]
    fn prop_archive_roundtrip(bodies in proptest::collection::vec(proptest::collection::vec(any::<u8>(), 0..300), 0..6)) {
        let pipeline = ArchivePipeline::default();
        let mut archive = RchArchive::new();
        for (i, body) in bodies.iter().enumerate() {
            let member = ArchiveMember::new(format!("m{}", i), pipeline.compress(body).unwrap()).unwrap();
            archive.insert(member, false).unwrap();
        }
        let parsed = RchArchive::from_bytes(&archive.to_bytes()).unwrap();
        prop_assert_eq!(parsed.len(), bodies.len());
        for (member, body) in parsed.members().iter().zip(&bodies) {
            prop_assert_eq!(&pipeline.decompress(member.container()).unwrap(), body);
        }
    }

    #[test]
    fn prop_garbage_never_panics(bytes in proptest::collection::vec(any::<u8>(), 0..256)) {
        let mut input = ARCHIVE_MAGIC.to_vec();
        input.push(ARCHIVE_VERSION);
        input.extend_from_slice(&bytes);
        let _ = RchArchive::from_bytes(&input);
    }
}
