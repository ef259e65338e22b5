//! Info command implementation.

use crate::utils::{format_ratio, format_size};
use ercha_rch::RchHeader;
use ercha_rch::fs::read_header;
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct InfoReport<'a> {
    file: &'a Path,
    description: String,
    flags: u8,
    container_len: u64,
    ratio: f64,
    #[serde(flatten)]
    header: &'a RchHeader,
}

pub fn cmd_info(input: &Path, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let header = read_header(input)?;

    if json {
        let report = InfoReport {
            file: input,
            description: header.describe(),
            flags: header.flags(),
            container_len: header.container_len(),
            ratio: header.ratio(),
            header: &header,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("RCH Container Information");
    println!("=========================");
    println!("File: {}", input.display());
    println!("Version: {}", header.version);
    println!("Encoding: {}", header.describe());
    println!("Flags: {:#04x}", header.flags());
    println!(
        "Original size: {} ({} bytes)",
        format_size(header.original_len),
        header.original_len
    );
    println!(
        "Compressed size: {} ({} bytes, {})",
        format_size(header.compressed_len),
        header.compressed_len,
        format_ratio(header.original_len, header.compressed_len)
    );
    println!("Checksum: {:#x} ({})", header.checksum, header.checksum_kind);
    println!("Container size: {} bytes", header.container_len());
    Ok(())
}
