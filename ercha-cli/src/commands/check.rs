//! Check command implementation.
//!
//! Inputs may be single containers or multi-entry archives; archives are
//! reported member by member.

use crate::config::ErchaConfig;
use crate::utils::{format_size, is_archive_file, with_workers};
use ercha_rch::{ArchivePipeline, EntryStatus};
use std::path::PathBuf;

pub fn cmd_check(
    inputs: &[PathBuf],
    config: &ErchaConfig,
    quiet: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let pipeline = ArchivePipeline::default();
    if !quiet {
        println!("Checking {} file(s)...", inputs.len());
    }

    let archive_flags: Vec<bool> = inputs.iter().map(|p| is_archive_file(p)).collect();
    let containers: Vec<PathBuf> = inputs
        .iter()
        .zip(&archive_flags)
        .filter(|(_, archive)| !**archive)
        .map(|(path, _)| path.clone())
        .collect();

    let (container_results, archive_results) = with_workers(config.runtime.jobs, || {
        let checked = pipeline.check_batch(&containers);
        let archives: Vec<_> = inputs
            .iter()
            .zip(&archive_flags)
            .filter(|(_, archive)| **archive)
            .map(|(path, _)| pipeline.check_archive(path))
            .collect();
        (checked, archives)
    })?;
    let mut container_results = container_results.into_iter();
    let mut archive_results = archive_results.into_iter();

    let mut total = 0usize;
    let mut ok_count = 0usize;
    let mut last_error: Option<Box<dyn std::error::Error>> = None;
    for (path, is_archive) in inputs.iter().zip(archive_flags) {
        if !is_archive {
            let Some(result) = container_results.next() else {
                break;
            };
            total += 1;
            match result {
                Ok(header) => {
                    ok_count += 1;
                    if !quiet {
                        println!(
                            "  OK: {} ({}, {})",
                            path.display(),
                            format_size(header.original_len),
                            header.describe()
                        );
                    }
                }
                Err(e) => {
                    println!("  FAILED: {} - {}", path.display(), e);
                    last_error = Some(e.into());
                }
            }
            continue;
        }

        let Some(result) = archive_results.next() else {
            break;
        };
        let reports = match result {
            Ok(reports) => reports,
            Err(e) => {
                total += 1;
                println!("  FAILED: {} - {}", path.display(), e);
                last_error = Some(e.into());
                continue;
            }
        };
        for report in reports {
            total += 1;
            if report.status == EntryStatus::Checked {
                ok_count += 1;
                if !quiet {
                    println!(
                        "  OK: {}:{} ({}, {})",
                        path.display(),
                        report.name,
                        format_size(report.original_len),
                        report.encoding
                    );
                }
            } else {
                let error = report.error.unwrap_or_default();
                println!("  FAILED: {}:{} - {}", path.display(), report.name, error);
                last_error = Some(error.into());
            }
        }
    }
    let failed = total - ok_count;

    if !quiet {
        println!();
        println!("Check results:");
        println!("  Total: {}", total);
        println!("  OK: {}", ok_count);
        println!("  Failed: {}", failed);
    }

    match last_error {
        Some(e) if total == 1 => Err(e),
        Some(_) => Err(format!("{} of {} entries failed verification", failed, total).into()),
        None => Ok(()),
    }
}
