//! Command implementations for the CLI.

pub mod check;
pub mod completions;
pub mod compress;
pub mod config;
pub mod decompress;
pub mod detract;
pub mod info;
pub mod inject;
pub mod list;
pub mod pack;
pub mod unpack;

use crate::utils::{
    create_progress_bar, format_ratio, format_size, with_workers, write_entry_table,
};
use ercha_core::Result;
use ercha_rch::fs::is_stdio;
use ercha_rch::{ArchivePipeline, BatchJob, EntryReport, FileReport};
use std::io;

/// Which way a file command runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Compress,
    Decompress,
}

impl Direction {
    fn run_one(
        self,
        pipeline: &ArchivePipeline,
        job: &BatchJob,
        overwrite: bool,
    ) -> Result<FileReport> {
        match self {
            Self::Compress => pipeline.compress_file(&job.source, &job.destination, overwrite),
            Self::Decompress => pipeline.decompress_file(&job.source, &job.destination, overwrite),
        }
    }

    fn verb(self) -> &'static str {
        match self {
            Self::Compress => "Compressed",
            Self::Decompress => "Restored",
        }
    }
}

fn print_report(direction: Direction, report: &FileReport) {
    match direction {
        Direction::Compress => println!(
            "  {}: {} -> {} ({} -> {}, {})",
            direction.verb(),
            report.source.display(),
            report.destination.display(),
            format_size(report.original_len),
            format_size(report.compressed_len),
            format_ratio(report.original_len, report.compressed_len),
        ),
        Direction::Decompress => println!(
            "  {}: {} -> {} ({})",
            direction.verb(),
            report.source.display(),
            report.destination.display(),
            format_size(report.original_len),
        ),
    }
}

/// Run every job, in parallel when there is more than one.
///
/// A single job's error is returned as is; with several jobs each failure
/// is listed and a summary error is returned.
pub fn run_jobs(
    pipeline: &ArchivePipeline,
    direction: Direction,
    jobs: &[BatchJob],
    overwrite: bool,
    workers: usize,
    verbose_output: bool,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    if let [job] = jobs {
        let report = direction.run_one(pipeline, job, overwrite)?;
        if verbose_output && !is_stdio(&report.destination) {
            print_report(direction, &report);
        }
        return Ok(());
    }

    let pb = create_progress_bar(jobs.len() as u64, verbose_output);
    let on_done = |job: &BatchJob, _: &Result<FileReport>| {
        pb.set_message(job.source.display().to_string());
        pb.inc(1);
    };
    let results = with_workers(workers, || match direction {
        Direction::Compress => pipeline.compress_batch(jobs, overwrite, on_done),
        Direction::Decompress => pipeline.decompress_batch(jobs, overwrite, on_done),
    })?;
    pb.finish_and_clear();

    let mut failed = 0usize;
    for (job, result) in jobs.iter().zip(&results) {
        match result {
            Ok(report) if verbose_output => print_report(direction, report),
            Ok(_) => {}
            Err(e) => {
                failed += 1;
                eprintln!("  FAILED: {} - {}", job.source.display(), e);
            }
        }
    }

    if failed > 0 {
        return Err(format!("{} of {} files failed", failed, jobs.len()).into());
    }
    Ok(())
}

/// Print archive results and fail if any member failed or was not found.
///
/// The table goes to stderr when member data is being written to stdout.
pub fn report_entries(
    reports: &[EntryReport],
    data_on_stdout: bool,
    quiet: bool,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    if !quiet {
        if data_on_stdout {
            write_entry_table(&mut io::stderr().lock(), reports)?;
        } else {
            write_entry_table(&mut io::stdout().lock(), reports)?;
        }
    }

    let failures: Vec<&EntryReport> = reports.iter().filter(|r| r.is_failure()).collect();
    for report in &failures {
        eprintln!(
            "  FAILED: {} - {}",
            report.name,
            report.error.as_deref().unwrap_or("not found in archive")
        );
    }
    if failures.is_empty() {
        Ok(())
    } else {
        Err(format!("{} of {} entries failed", failures.len(), reports.len()).into())
    }
}
