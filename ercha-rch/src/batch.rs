//! Parallel processing of independent containers.
//!
//! Each job runs on a rayon worker with its own encoder or decoder; the
//! pipeline itself is shared read-only. Results come back in job order.

use crate::fs::FileReport;
use crate::header::RchHeader;
use crate::pipeline::ArchivePipeline;
use ercha_core::Result;
use rayon::prelude::*;
use std::path::PathBuf;

/// One source/destination pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchJob {
    /// Input path.
    pub source: PathBuf,
    /// Output path.
    pub destination: PathBuf,
}

impl BatchJob {
    /// Create a job.
    pub fn new(source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
        }
    }
}

impl ArchivePipeline {
    /// Compress every job in parallel.
    ///
    /// `on_done` is called from worker threads as each job completes.
    pub fn compress_batch<F>(
        &self,
        jobs: &[BatchJob],
        overwrite: bool,
        on_done: F,
    ) -> Vec<Result<FileReport>>
    where
        F: Fn(&BatchJob, &Result<FileReport>) + Sync,
    {
        jobs.par_iter()
            .map(|job| {
                let result = self.compress_file(&job.source, &job.destination, overwrite);
                on_done(job, &result);
                result
            })
            .collect()
    }

    /// Decompress every job in parallel.
    pub fn decompress_batch<F>(
        &self,
        jobs: &[BatchJob],
        overwrite: bool,
        on_done: F,
    ) -> Vec<Result<FileReport>>
    where
        F: Fn(&BatchJob, &Result<FileReport>) + Sync,
    {
        jobs.par_iter()
            .map(|job| {
                let result = self.decompress_file(&job.source, &job.destination, overwrite);
                on_done(job, &result);
                result
            })
            .collect()
    }

    /// Verify every container in parallel.
    pub fn check_batch(&self, paths: &[PathBuf]) -> Vec<Result<RchHeader>> {
        paths.par_iter().map(|path| self.check_file(path)).collect()
    }
}
