//! File-level archive operations: pack, unpack, check, inject, detract.
//!
//! Members are compressed and decoded on the rayon pool; every file that
//! changes is rewritten through [`write_atomic`], so an archive on disk is
//! always either the old version or the new one.

use super::{ArchiveMember, RchArchive};
use crate::fs::{
    is_stdio, read_input, sanitize_file_name, source_name, write_atomic, write_output,
};
use crate::header::RchHeader;
use crate::pipeline::ArchivePipeline;
use ercha_core::{ErchaError, Result};
use rayon::prelude::*;
use serde::Serialize;
use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Name a member gets when its data comes from stdin and no name is given.
pub const DEFAULT_STDIN_NAME: &str = "stdin";

/// What happened to one member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    /// Added by `pack`.
    Packed,
    /// Appended by `inject`.
    Injected,
    /// Replaced an existing member during `inject`.
    Replaced,
    /// Decoded, verified and written.
    Unpacked,
    /// Written although its checksum did not verify.
    Forced,
    /// Decoded and verified, nothing written.
    Checked,
    /// The operation failed for this member.
    Failed,
    /// A requested name is not in the archive.
    Missing,
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Packed => "Packed",
            Self::Injected => "Injected",
            Self::Replaced => "Replaced",
            Self::Unpacked => "Unpacked",
            Self::Forced => "Unpacked (forced)",
            Self::Checked => "Checked",
            Self::Failed => "Failed",
            Self::Missing => "Not found",
        };
        f.write_str(text)
    }
}

/// One row of an archive operation's results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryReport {
    /// Member name.
    pub name: String,
    /// Uncompressed size.
    pub original_len: u64,
    /// Payload size.
    pub compressed_len: u64,
    /// Checksum stored in the member header.
    pub checksum: u64,
    /// Payload encoding, e.g. `LZW`.
    pub encoding: String,
    /// Whether the decoded bytes matched the stored checksum.
    pub checksum_passed: bool,
    /// Outcome.
    pub status: EntryStatus,
    /// Failure description, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EntryReport {
    fn new(name: &str, header: &RchHeader, status: EntryStatus, checksum_passed: bool) -> Self {
        Self {
            name: name.to_string(),
            original_len: header.original_len,
            compressed_len: header.compressed_len,
            checksum: header.checksum,
            encoding: header.encoding().to_string(),
            checksum_passed,
            status,
            error: None,
        }
    }

    fn failed(name: &str, header: &RchHeader, err: &ErchaError) -> Self {
        Self {
            error: Some(err.to_string()),
            ..Self::new(name, header, EntryStatus::Failed, false)
        }
    }

    fn missing(name: &str) -> Self {
        Self {
            name: name.to_string(),
            original_len: 0,
            compressed_len: 0,
            checksum: 0,
            encoding: "-".to_string(),
            checksum_passed: false,
            status: EntryStatus::Missing,
            error: None,
        }
    }

    /// Whether this row counts against the operation.
    pub fn is_failure(&self) -> bool {
        matches!(self.status, EntryStatus::Failed | EntryStatus::Missing)
    }
}

/// Outcome of removing members from an archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetractReport {
    /// Archive that was written, if any.
    pub destination: Option<PathBuf>,
    /// Names removed, in request order.
    pub removed: Vec<String>,
    /// Requested names that were not present.
    pub missing: Vec<String>,
}

/// Member name for `source`: its sanitized file name, or `stdin_name` for `-`.
pub fn member_name(source: &Path, stdin_name: &str) -> String {
    if is_stdio(source) {
        sanitize_file_name(stdin_name)
    } else {
        source_name(source)
    }
}

/// Read an archive from `path`, or stdin for `-`.
pub fn read_archive(path: &Path) -> Result<RchArchive> {
    if is_stdio(path) {
        return RchArchive::read(&mut io::stdin().lock());
    }
    RchArchive::read(&mut BufReader::new(File::open(path)?))
}

/// Write `archive` to `destination` atomically, or to stdout for `-`.
pub fn write_archive(destination: &Path, overwrite: bool, archive: &RchArchive) -> Result<()> {
    if is_stdio(destination) {
        return write_output(destination, overwrite, &archive.to_bytes());
    }
    write_atomic(destination, overwrite, |file| {
        let mut writer = BufWriter::new(file);
        archive.write(&mut writer)?;
        writer.flush()?;
        Ok(())
    })
}

/// Remove the members named in `names` from the archive at `path`.
///
/// The result goes to `output` when given, otherwise `path` is rewritten in
/// place. In place, nothing is written unless at least one member was
/// removed; `overwrite` applies to `output` only.
pub fn detract_archive<S: AsRef<str>>(
    path: &Path,
    names: &[S],
    output: Option<&Path>,
    overwrite: bool,
) -> Result<DetractReport> {
    if is_stdio(path) {
        return Err(ErchaError::invalid_config(
            "detract needs an archive file, not stdin",
        ));
    }
    let mut archive = read_archive(path)?;
    let (removed, missing) = archive.remove(names);
    for name in &missing {
        warn!(name = %name, archive = %path.display(), "member not found");
    }

    let destination = match output {
        Some(out) => {
            write_archive(out, overwrite, &archive)?;
            Some(out.to_path_buf())
        }
        None if !removed.is_empty() => {
            write_archive(path, true, &archive)?;
            Some(path.to_path_buf())
        }
        None => None,
    };

    info!(
        archive = %path.display(),
        removed = removed.len(),
        missing = missing.len(),
        remaining = archive.len(),
        "detracted"
    );
    Ok(DetractReport {
        destination,
        removed,
        missing,
    })
}

impl ArchivePipeline {
    /// Compress `sources` into named members, in parallel.
    ///
    /// Fails on the first unreadable source or codec error.
    pub fn pack_members(
        &self,
        sources: &[PathBuf],
        stdin_name: &str,
    ) -> Result<Vec<ArchiveMember>> {
        sources
            .par_iter()
            .map(|source| {
                let container = self.compress(&read_input(source)?)?;
                ArchiveMember::new(member_name(source, stdin_name), container)
            })
            .collect()
    }

    /// Pack `sources` into a new archive at `destination` (`-` for stdout).
    ///
    /// Two sources with the same file name are refused.
    pub fn pack_archive(
        &self,
        sources: &[PathBuf],
        destination: &Path,
        stdin_name: &str,
        overwrite: bool,
    ) -> Result<Vec<EntryReport>> {
        let mut archive = RchArchive::new();
        for member in self.pack_members(sources, stdin_name)? {
            archive.insert(member, false)?;
        }
        write_archive(destination, overwrite, &archive)?;

        info!(
            destination = %destination.display(),
            members = archive.len(),
            bytes = archive.encoded_len(),
            "packed"
        );
        Ok(archive
            .members()
            .iter()
            .map(|m| EntryReport::new(m.name(), m.header(), EntryStatus::Packed, true))
            .collect())
    }

    /// Compress `sources` and add them to the archive at `path`.
    ///
    /// With `replace`, members of the same name are replaced in place;
    /// otherwise a name clash fails the whole operation and the archive is
    /// left as it was.
    pub fn inject_archive(
        &self,
        path: &Path,
        sources: &[PathBuf],
        stdin_name: &str,
        replace: bool,
    ) -> Result<Vec<EntryReport>> {
        if is_stdio(path) {
            return Err(ErchaError::invalid_config(
                "inject needs an archive file, not stdin",
            ));
        }
        let mut archive = read_archive(path)?;
        let mut reports = Vec::with_capacity(sources.len());
        for member in self.pack_members(sources, stdin_name)? {
            let row =
                EntryReport::new(member.name(), member.header(), EntryStatus::Injected, true);
            let replaced = archive.insert(member, replace)?;
            reports.push(EntryReport {
                status: if replaced {
                    EntryStatus::Replaced
                } else {
                    EntryStatus::Injected
                },
                ..row
            });
        }
        write_archive(path, true, &archive)?;

        info!(
            archive = %path.display(),
            injected = reports.len(),
            members = archive.len(),
            "injected"
        );
        Ok(reports)
    }

    /// Extract members of the archive at `source` into `output`.
    ///
    /// `output` is a directory, created if needed, or `-` to concatenate the
    /// selected members on stdout. With `names` empty every member is
    /// extracted; otherwise only those named, and each name not found gets a
    /// [`EntryStatus::Missing`] row. A member whose checksum fails is skipped
    /// unless `force` is set, in which case its decoded bytes are written
    /// and reported as [`EntryStatus::Forced`]. Members that fail to decode
    /// are never written.
    pub fn unpack_archive<S: AsRef<str>>(
        &self,
        source: &Path,
        output: &Path,
        names: &[S],
        force: bool,
        overwrite: bool,
    ) -> Result<Vec<EntryReport>> {
        let archive = read_archive(source)?;
        let selected: Vec<&ArchiveMember> = archive
            .members()
            .iter()
            .filter(|m| names.is_empty() || names.iter().any(|n| n.as_ref() == m.name()))
            .collect();

        if !is_stdio(output) {
            fs::create_dir_all(output)?;
        }

        let decoded: Vec<(EntryReport, Option<Vec<u8>>)> = selected
            .par_iter()
            .map(|member| self.extract_member(member, force))
            .collect();

        let mut reports = Vec::with_capacity(decoded.len() + names.len());
        for (report, data) in decoded {
            let Some(data) = data else {
                reports.push(report);
                continue;
            };
            let destination = if is_stdio(output) {
                output.to_path_buf()
            } else {
                output.join(&report.name)
            };
            match write_output(&destination, overwrite, &data) {
                Ok(()) => reports.push(report),
                Err(e) => {
                    warn!(name = %report.name, error = %e, "could not write member");
                    reports.push(EntryReport {
                        status: EntryStatus::Failed,
                        error: Some(e.to_string()),
                        ..report
                    });
                }
            }
        }

        for name in names {
            let name = name.as_ref();
            if archive.find(name).is_none() && !reports.iter().any(|r| r.name == name) {
                warn!(name, archive = %source.display(), "member not found");
                reports.push(EntryReport::missing(name));
            }
        }

        info!(
            archive = %source.display(),
            output = %output.display(),
            members = reports.len(),
            failed = reports.iter().filter(|r| r.is_failure()).count(),
            "unpacked"
        );
        Ok(reports)
    }

    /// Decode and verify every member of the archive at `source`.
    pub fn check_archive(&self, source: &Path) -> Result<Vec<EntryReport>> {
        let archive = read_archive(source)?;
        Ok(archive
            .members()
            .par_iter()
            .map(|member| match self.check(member.container()) {
                Ok(header) => {
                    EntryReport::new(member.name(), &header, EntryStatus::Checked, true)
                }
                Err(e) => EntryReport::failed(member.name(), member.header(), &e),
            })
            .collect())
    }

    fn extract_member(
        &self,
        member: &ArchiveMember,
        force: bool,
    ) -> (EntryReport, Option<Vec<u8>>) {
        let name = member.name();
        let header = member.header();
        if !force {
            return match self.decompress(member.container()) {
                Ok(data) => (
                    EntryReport::new(name, header, EntryStatus::Unpacked, true),
                    Some(data),
                ),
                Err(e) => (EntryReport::failed(name, header, &e), None),
            };
        }

        match self.decompress_unverified(member.container()) {
            Ok((data, None)) => (
                EntryReport::new(name, header, EntryStatus::Unpacked, true),
                Some(data),
            ),
            Ok((data, Some(mismatch))) => {
                warn!(name, error = %mismatch, "forcing extraction");
                let report = EntryReport {
                    error: Some(mismatch.to_string()),
                    ..EntryReport::new(name, header, EntryStatus::Forced, false)
                };
                (report, Some(data))
            }
            Err(e) => (EntryReport::failed(name, header, &e), None),
        }
    }
}
