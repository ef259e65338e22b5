//! Filesystem boundary: reading sources, naming and writing outputs.
//!
//! Outputs are written to a temporary file in the destination directory and
//! renamed into place, so a failed or interrupted run never leaves a partial
//! file at the final path. The path `-` means stdin or stdout.

use crate::container::RchContainer;
use crate::header::RchHeader;
use crate::pipeline::ArchivePipeline;
use crate::stream::RchStreamWriter;
use ercha_core::{ErchaError, Result};
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{info, warn};

/// Path standing for stdin or stdout.
pub const STDIO_PATH: &str = "-";

/// File extension of RCH containers.
pub const RCH_EXTENSION: &str = "rch";

/// Extension appended when a decompressed name cannot be derived.
pub const FALLBACK_EXTENSION: &str = "out";

/// Longest file name produced by [`sanitize_file_name`], in bytes.
const MAX_NAME_LEN: usize = 255;

/// Outcome of a file-level operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
    /// Input path.
    pub source: PathBuf,
    /// Output path (`-` for stdout).
    pub destination: PathBuf,
    /// Uncompressed size.
    pub original_len: u64,
    /// Container payload size.
    pub compressed_len: u64,
}

/// Check whether `path` is the stdin/stdout marker.
pub fn is_stdio(path: &Path) -> bool {
    path.as_os_str() == STDIO_PATH
}

/// Reduce a name to its last path component and at most 255 bytes,
/// keeping the extension when shortening.
pub fn sanitize_file_name(name: &str) -> String {
    let base = name
        .rsplit(['/', '\\'])
        .next()
        .filter(|s| !s.is_empty() && *s != "." && *s != "..")
        .unwrap_or("unnamed");
    if base != name {
        warn!(name, sanitized = base, "path components stripped from file name");
    }
    if base.len() <= MAX_NAME_LEN {
        return base.to_string();
    }

    let (stem, ext) = match base.rfind('.') {
        Some(dot) if dot > 0 && base.len() - dot < MAX_NAME_LEN => base.split_at(dot),
        _ => (base, ""),
    };
    let mut cut = MAX_NAME_LEN - ext.len();
    while !stem.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}{}", &stem[..cut], ext)
}

pub(crate) fn source_name(source: &Path) -> String {
    if is_stdio(source) {
        return "stdin".to_string();
    }
    let name = source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    sanitize_file_name(&name)
}

/// Default container name for `source`: its file name plus `.rch`.
pub fn compressed_name(source: &Path) -> String {
    sanitize_file_name(&format!("{}.{}", source_name(source), RCH_EXTENSION))
}

/// Default output name for container `source`: `.rch` stripped, or `.out`
/// appended when there is nothing to strip.
pub fn decompressed_name(source: &Path) -> String {
    let name = source_name(source);
    let suffix = format!(".{}", RCH_EXTENSION);
    match name.strip_suffix(suffix.as_str()) {
        Some(stem) if !stem.is_empty() => stem.to_string(),
        _ => format!("{}.{}", name, FALLBACK_EXTENSION),
    }
}

/// Resolve where output for `source` goes.
///
/// An explicit `output` directory receives the derived name; any other
/// explicit path is used as is. Without `output` the derived name is placed
/// next to the source, or sent to stdout when reading stdin.
pub fn resolve_destination(source: &Path, output: Option<&Path>, derived: String) -> PathBuf {
    match output {
        Some(out) if out.is_dir() => out.join(derived),
        Some(out) => out.to_path_buf(),
        None if is_stdio(source) => PathBuf::from(STDIO_PATH),
        None => source.with_file_name(derived),
    }
}

/// Read all of `path`, or stdin for `-`.
pub fn read_input(path: &Path) -> Result<Vec<u8>> {
    let mut data = Vec::new();
    if is_stdio(path) {
        io::stdin().lock().read_to_end(&mut data)?;
    } else {
        File::open(path)?.read_to_end(&mut data)?;
    }
    Ok(data)
}

/// Read a container from `path`, or stdin for `-`.
pub fn read_container(path: &Path) -> Result<RchContainer> {
    if is_stdio(path) {
        return RchContainer::read(&mut io::stdin().lock());
    }
    RchContainer::read(&mut BufReader::new(File::open(path)?))
}

fn refuse_existing(destination: &Path, overwrite: bool) -> Result<()> {
    if !overwrite && destination.exists() {
        return Err(ErchaError::DestinationExists {
            path: destination.to_path_buf(),
        });
    }
    Ok(())
}

/// Write `destination` atomically through `fill`.
///
/// `fill` writes into a temporary file beside the destination; the file is
/// renamed into place only if `fill` succeeds. On error the temporary file
/// is removed and `destination` is untouched.
pub fn write_atomic<F>(destination: &Path, overwrite: bool, fill: F) -> Result<()>
where
    F: FnOnce(&mut File) -> Result<()>,
{
    refuse_existing(destination, overwrite)?;

    let dir = match destination.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut temp = NamedTempFile::new_in(dir)?;
    fill(temp.as_file_mut())?;
    temp.as_file().sync_all()?;

    if overwrite {
        temp.persist(destination).map_err(|e| e.error)?;
    } else {
        temp.persist_noclobber(destination).map_err(|e| {
            if e.error.kind() == io::ErrorKind::AlreadyExists {
                ErchaError::DestinationExists {
                    path: destination.to_path_buf(),
                }
            } else {
                ErchaError::Io(e.error)
            }
        })?;
    }
    Ok(())
}

/// Write `data` to `destination` atomically, or to stdout for `-`.
pub fn write_output(destination: &Path, overwrite: bool, data: &[u8]) -> Result<()> {
    if is_stdio(destination) {
        let mut stdout = io::stdout().lock();
        stdout.write_all(data)?;
        stdout.flush()?;
        return Ok(());
    }
    write_atomic(destination, overwrite, |file| {
        file.write_all(data)?;
        Ok(())
    })
}

impl ArchivePipeline {
    /// Compress `source` into a container at `destination`.
    ///
    /// Regular files are streamed through [`RchStreamWriter`]; stdin and
    /// stdout go through memory. An existing `destination` is replaced only
    /// with `overwrite`.
    pub fn compress_file(
        &self,
        source: &Path,
        destination: &Path,
        overwrite: bool,
    ) -> Result<FileReport> {
        let header = if is_stdio(source) || is_stdio(destination) {
            let container = self.compress(&read_input(source)?)?;
            write_output(destination, overwrite, &container.to_bytes())?;
            *container.header()
        } else {
            refuse_existing(destination, overwrite)?;
            let mut input = BufReader::new(File::open(source)?);
            write_atomic(destination, overwrite, |file| {
                let mut writer = RchStreamWriter::new(BufWriter::new(file), self.options())?;
                writer.copy_from(&mut input)?;
                writer.finish()?.flush()?;
                Ok(())
            })?;
            read_header(destination)?
        };

        let report = FileReport {
            source: source.to_path_buf(),
            destination: destination.to_path_buf(),
            original_len: header.original_len,
            compressed_len: header.compressed_len,
        };
        info!(
            source = %source.display(),
            destination = %destination.display(),
            original = report.original_len,
            compressed = report.compressed_len,
            "compressed"
        );
        Ok(report)
    }

    /// Restore the container at `source` to `destination`.
    ///
    /// Nothing is written unless the checksum verifies.
    pub fn decompress_file(
        &self,
        source: &Path,
        destination: &Path,
        overwrite: bool,
    ) -> Result<FileReport> {
        refuse_existing(destination, overwrite || is_stdio(destination))?;

        let container = read_container(source)?;
        let data = self.decompress(&container)?;
        write_output(destination, overwrite, &data)?;

        let report = FileReport {
            source: source.to_path_buf(),
            destination: destination.to_path_buf(),
            original_len: container.header().original_len,
            compressed_len: container.header().compressed_len,
        };
        info!(
            source = %source.display(),
            destination = %destination.display(),
            bytes = report.original_len,
            "decompressed"
        );
        Ok(report)
    }

    /// Decode and verify the container at `path` without writing anything.
    pub fn check_file(&self, path: &Path) -> Result<RchHeader> {
        let container = read_container(path)?;
        self.check(&container)
    }
}

/// Read only the header of the container at `path`.
pub fn read_header(path: &Path) -> Result<RchHeader> {
    if is_stdio(path) {
        return RchHeader::read(&mut io::stdin().lock());
    }
    RchHeader::read(&mut File::open(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_strips_directories() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\temp\\x.txt"), "x.txt");
        assert_eq!(sanitize_file_name("plain.txt"), "plain.txt");
        assert_eq!(sanitize_file_name("dir/"), "unnamed");
    }

    #[test]
    fn test_sanitize_truncates_long_names() {
        let long = format!("{}.txt", "a".repeat(300));
        let sanitized = sanitize_file_name(&long);
        assert_eq!(sanitized.len(), 255);
        assert!(sanitized.ends_with(".txt"));
    }

    #[test]
    fn test_output_names() {
        assert_eq!(compressed_name(Path::new("dir/report.txt")), "report.txt.rch");
        assert_eq!(decompressed_name(Path::new("dir/report.txt.rch")), "report.txt");
        assert_eq!(decompressed_name(Path::new("archive.bin")), "archive.bin.out");
        assert_eq!(decompressed_name(Path::new(".rch")), ".rch.out");
        assert_eq!(compressed_name(Path::new("-")), "stdin.rch");
    }

    #[test]
    fn test_resolve_destination() {
        let dir = tempfile::tempdir().unwrap();
        let source = Path::new("in/data.txt");

        assert_eq!(
            resolve_destination(source, None, compressed_name(source)),
            PathBuf::from("in/data.txt.rch")
        );
        assert_eq!(
            resolve_destination(source, Some(dir.path()), compressed_name(source)),
            dir.path().join("data.txt.rch")
        );
        assert_eq!(
            resolve_destination(source, Some(Path::new("x.rch")), compressed_name(source)),
            PathBuf::from("x.rch")
        );
        assert_eq!(
            resolve_destination(Path::new("-"), None, compressed_name(Path::new("-"))),
            PathBuf::from("-")
        );
    }

    #[test]
    fn test_write_atomic_success_and_refusal() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out.bin");

        write_atomic(&target, false, |f| Ok(f.write_all(b"first")?)).unwrap();
        assert_eq!(std::fs::read(&target).unwrap(), b"first");

        let err = write_atomic(&target, false, |f| Ok(f.write_all(b"second")?)).unwrap_err();
        assert!(matches!(err, ErchaError::DestinationExists { .. }));
        assert_eq!(std::fs::read(&target).unwrap(), b"first");

        write_atomic(&target, true, |f| Ok(f.write_all(b"third")?)).unwrap();
        assert_eq!(std::fs::read(&target).unwrap(), b"third");
    }

    #[test]
    fn test_overwrite_is_per_call() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("a.txt");
        let dst = dir.path().join("a.txt.rch");
        std::fs::write(&src, b"per call").unwrap();
        std::fs::write(&dst, b"old").unwrap();

        let pipeline = ArchivePipeline::default();
        let err = pipeline.compress_file(&src, &dst, false).unwrap_err();
        assert!(matches!(err, ErchaError::DestinationExists { .. }));
        assert_eq!(std::fs::read(&dst).unwrap(), b"old");

        pipeline.compress_file(&src, &dst, true).unwrap();
        let restored = dir.path().join("a.out");
        pipeline.decompress_file(&dst, &restored, false).unwrap();
        assert_eq!(std::fs::read(&restored).unwrap(), b"per call");
        assert!(pipeline.decompress_file(&dst, &restored, false).is_err());
        pipeline.decompress_file(&dst, &restored, true).unwrap();
    }

    #[test]
    fn test_write_atomic_failure_leaves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("never.bin");

        let err = write_atomic(&target, false, |f| {
            f.write_all(b"partial")?;
            Err(ErchaError::corrupt("interrupted"))
        })
        .unwrap_err();
        assert!(matches!(err, ErchaError::CorruptStream { .. }));
        assert!(!target.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
