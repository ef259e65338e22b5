//! Compress command implementation.

use super::{Direction, run_jobs};
use crate::config::ErchaConfig;
use crate::utils::check_inputs;
use ercha_rch::fs::{compressed_name, resolve_destination};
use ercha_rch::{ArchivePipeline, BatchJob};
use std::path::{Path, PathBuf};
use tracing::debug;

pub fn cmd_compress(
    inputs: &[PathBuf],
    output: Option<&Path>,
    config: &ErchaConfig,
    overwrite: bool,
    progress: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    check_inputs(inputs, output)?;
    let pipeline = ArchivePipeline::new(config.pipeline_options())?;
    debug!(options = ?pipeline.options(), "compress");

    let jobs: Vec<BatchJob> = inputs
        .iter()
        .map(|source| {
            let destination = resolve_destination(source, output, compressed_name(source));
            BatchJob::new(source, destination)
        })
        .collect();

    run_jobs(
        &pipeline,
        Direction::Compress,
        &jobs,
        overwrite,
        config.runtime.jobs,
        progress,
    )
}
