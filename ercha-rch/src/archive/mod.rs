//! Multi-entry RCH archives.
//!
//! An archive is a short header followed by named members, each a complete
//! RCH container:
//!
//! ```text
//! +------+---------+   +----------+------+---------------+
//! | ERCA | version |   | name_len | name | RCH container | ...
//! +------+---------+   +----------+------+---------------+
//!   4        1            2 (LE)    UTF-8   30 + payload
//! ```
//!
//! Members run to end of input; there is no index or trailer, so appending
//! a member is a plain concatenation. Member names are single file names.
//! Anything that could address a path outside the extraction directory is
//! rejected on read and on insert.

pub mod ops;

use crate::container::RchContainer;
use crate::header::{RchHeader, read_up_to};
use ercha_core::{ErchaError, Result};
use std::io::{Read, Write};
use tracing::{debug, warn};

/// Magic bytes at the start of every archive.
pub const ARCHIVE_MAGIC: [u8; 4] = *b"ERCA";

/// Archive layout version written by this crate.
pub const ARCHIVE_VERSION: u8 = 1;

/// Size of the archive header in bytes.
pub const ARCHIVE_HEADER_SIZE: usize = 5;

/// Longest member name, in bytes.
pub const MAX_ENTRY_NAME_LEN: usize = 255;

/// Why `name` cannot be a member name, if it cannot.
///
/// A member name must be a non-empty single path component of at most
/// 255 bytes, without separators, NUL, or `.`/`..`.
pub fn entry_name_problem(name: &str) -> Option<&'static str> {
    if name.is_empty() {
        Some("is empty")
    } else if name.len() > MAX_ENTRY_NAME_LEN {
        Some("is longer than 255 bytes")
    } else if name == "." || name == ".." {
        Some("refers to a directory")
    } else if name.contains(['/', '\\']) {
        Some("contains a path separator")
    } else if name.contains('\0') {
        Some("contains a NUL byte")
    } else {
        None
    }
}

/// A named container inside an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveMember {
    name: String,
    container: RchContainer,
}

impl ArchiveMember {
    /// Create a member, rejecting names that are not single file names.
    pub fn new(name: impl Into<String>, container: RchContainer) -> Result<Self> {
        let name = name.into();
        if let Some(problem) = entry_name_problem(&name) {
            return Err(ErchaError::invalid_config(format!(
                "member name {:?} {}",
                name, problem
            )));
        }
        Ok(Self { name, container })
    }

    /// Member name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The member's container.
    pub fn container(&self) -> &RchContainer {
        &self.container
    }

    /// Header of the member's container.
    pub fn header(&self) -> &RchHeader {
        self.container.header()
    }

    /// Serialized size in bytes, name prefix included.
    pub fn encoded_len(&self) -> usize {
        2 + self.name.len() + self.container.encoded_len()
    }

    fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        // Names are capped at 255 bytes, so the length always fits.
        writer.write_all(&(self.name.len() as u16).to_le_bytes())?;
        writer.write_all(self.name.as_bytes())?;
        self.container.write(writer)
    }
}

/// An in-memory archive: members in stored order, names unique.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RchArchive {
    members: Vec<ArchiveMember>,
}

impl RchArchive {
    /// Create an empty archive.
    pub fn new() -> Self {
        Self::default()
    }

    /// Members in stored order.
    pub fn members(&self) -> &[ArchiveMember] {
        &self.members
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Check whether the archive has no members.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Look up a member by name.
    pub fn find(&self, name: &str) -> Option<&ArchiveMember> {
        self.members.iter().find(|m| m.name == name)
    }

    /// Add a member at the end.
    ///
    /// A member with the same name is replaced in place when `replace` is
    /// set and refused otherwise. Returns whether a member was replaced.
    pub fn insert(&mut self, member: ArchiveMember, replace: bool) -> Result<bool> {
        match self.members.iter().position(|m| m.name == member.name) {
            Some(i) if replace => {
                debug!(name = %member.name, "replacing archive member");
                self.members[i] = member;
                Ok(true)
            }
            Some(_) => Err(ErchaError::DestinationExists {
                path: member.name.into(),
            }),
            None => {
                self.members.push(member);
                Ok(false)
            }
        }
    }

    /// Remove every member named in `names`.
    ///
    /// Returns the names that were removed and the names not present, each
    /// in request order.
    pub fn remove<S: AsRef<str>>(&mut self, names: &[S]) -> (Vec<String>, Vec<String>) {
        let mut removed = Vec::new();
        let mut missing = Vec::new();
        for name in names {
            let name = name.as_ref();
            let before = self.members.len();
            self.members.retain(|m| m.name != name);
            if self.members.len() < before {
                removed.push(name.to_string());
            } else if !removed.iter().any(|r| r == name) {
                missing.push(name.to_string());
            }
        }
        (removed, missing)
    }

    /// Serialized size in bytes.
    pub fn encoded_len(&self) -> usize {
        ARCHIVE_HEADER_SIZE + self.members.iter().map(ArchiveMember::encoded_len).sum::<usize>()
    }

    /// Write the archive header and every member.
    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&ARCHIVE_MAGIC)?;
        writer.write_all(&[ARCHIVE_VERSION])?;
        for member in &self.members {
            member.write(writer)?;
        }
        Ok(())
    }

    /// Serialize to a new buffer.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.encoded_len());
        buf.extend_from_slice(&ARCHIVE_MAGIC);
        buf.push(ARCHIVE_VERSION);
        for member in &self.members {
            buf.extend_from_slice(&(member.name.len() as u16).to_le_bytes());
            buf.extend_from_slice(member.name.as_bytes());
            buf.extend_from_slice(&member.container.to_bytes());
        }
        buf
    }

    /// Read an archive, consuming the reader to its end.
    ///
    /// Unsafe member names and repeated names are reported as corruption;
    /// nothing from such an archive is returned.
    pub fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let mut head = [0u8; ARCHIVE_HEADER_SIZE];
        let filled = read_up_to(reader, &mut head)?;
        let seen = filled.min(ARCHIVE_MAGIC.len());
        if head[..seen] != ARCHIVE_MAGIC[..seen] {
            return Err(ErchaError::invalid_magic(&ARCHIVE_MAGIC, &head[..seen]));
        }
        if filled < ARCHIVE_HEADER_SIZE {
            return Err(ErchaError::truncated(
                ARCHIVE_HEADER_SIZE as u64,
                filled as u64,
            ));
        }
        if head[4] != ARCHIVE_VERSION {
            return Err(ErchaError::unsupported(format!(
                "archive version {} (this reader supports {})",
                head[4], ARCHIVE_VERSION
            )));
        }

        let mut archive = Self::new();
        let mut offset = ARCHIVE_HEADER_SIZE as u64;
        loop {
            let mut len_buf = [0u8; 2];
            match read_up_to(reader, &mut len_buf)? {
                0 => break,
                2 => {}
                n => return Err(ErchaError::truncated(offset + 2, offset + n as u64)),
            }
            let name_len = u16::from_le_bytes(len_buf) as usize;
            let mut raw = vec![0u8; name_len];
            let got = read_up_to(reader, &mut raw)?;
            if got < name_len {
                return Err(ErchaError::truncated(
                    offset + 2 + name_len as u64,
                    offset + 2 + got as u64,
                ));
            }
            let name = String::from_utf8(raw).map_err(|_| {
                ErchaError::corrupt(format!("member name at offset {} is not UTF-8", offset))
            })?;
            if let Some(problem) = entry_name_problem(&name) {
                warn!(name = %name.escape_debug(), problem, "unsafe member name");
                return Err(ErchaError::corrupt(format!(
                    "member name {:?} at offset {} {}",
                    name, offset, problem
                )));
            }
            if archive.find(&name).is_some() {
                return Err(ErchaError::corrupt(format!(
                    "member {:?} appears twice",
                    name
                )));
            }

            let container = RchContainer::read(reader)?;
            offset += 2 + name_len as u64 + container.encoded_len() as u64;
            archive.members.push(ArchiveMember { name, container });
        }

        debug!(members = archive.len(), bytes = offset, "archive read");
        Ok(archive)
    }

    /// Parse an archive held in memory.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut cursor = data;
        Self::read(&mut cursor)
    }
}

/// Check whether `prefix` starts like an archive rather than a container.
pub fn is_archive(prefix: &[u8]) -> bool {
    prefix.starts_with(&ARCHIVE_MAGIC)
}
