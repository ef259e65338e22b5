//! List command implementation.

use crate::utils::{format_ratio, format_size};
use ercha_rch::ArchiveMember;
use ercha_rch::archive::ops::read_archive;
use serde::Serialize;
use std::path::Path;

/// JSON form of one archive member.
#[derive(Debug, Serialize)]
struct MemberJson<'a> {
    name: &'a str,
    size: u64,
    compressed_size: u64,
    ratio: f64,
    encoding: &'static str,
    description: String,
    checksum: u64,
}

impl<'a> MemberJson<'a> {
    fn from_member(member: &'a ArchiveMember) -> Self {
        let header = member.header();
        Self {
            name: member.name(),
            size: header.original_len,
            compressed_size: header.compressed_len,
            ratio: header.ratio(),
            encoding: header.encoding(),
            description: header.describe(),
            checksum: header.checksum,
        }
    }
}

#[derive(Debug, Serialize)]
struct ArchiveListJson<'a> {
    archive: &'a Path,
    members: Vec<MemberJson<'a>>,
}

pub fn cmd_list(archive: &Path, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let contents = read_archive(archive)?;

    if json {
        let listing = ArchiveListJson {
            archive,
            members: contents.members().iter().map(MemberJson::from_member).collect(),
        };
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }

    println!("Archive: {} ({} members)", archive.display(), contents.len());
    println!();
    println!("{:>10} {:>10} {:>6} {:>10}  Name", "Size", "Packed", "Ratio", "Encoding");
    println!("{}", "-".repeat(60));

    let mut total_size = 0u64;
    let mut total_packed = 0u64;
    for member in contents.members() {
        let header = member.header();
        println!(
            "{:>10} {:>10} {:>6} {:>10}  {}",
            header.original_len,
            header.compressed_len,
            format_ratio(header.original_len, header.compressed_len),
            header.encoding(),
            member.name()
        );
        total_size += header.original_len;
        total_packed += header.compressed_len;
    }

    println!("{}", "-".repeat(60));
    println!(
        "{:>10} {:>10} {:>6}              {} files ({})",
        total_size,
        total_packed,
        format_ratio(total_size, total_packed),
        contents.len(),
        format_size(total_size)
    );
    Ok(())
}
