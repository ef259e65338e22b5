//! Decompress command implementation.

use super::{Direction, run_jobs};
use crate::config::ErchaConfig;
use crate::utils::check_inputs;
use ercha_rch::fs::{decompressed_name, resolve_destination};
use ercha_rch::{ArchivePipeline, BatchJob};
use std::path::{Path, PathBuf};

pub fn cmd_decompress(
    inputs: &[PathBuf],
    output: Option<&Path>,
    config: &ErchaConfig,
    overwrite: bool,
    progress: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    check_inputs(inputs, output)?;
    let pipeline = ArchivePipeline::new(config.pipeline_options())?;

    let jobs: Vec<BatchJob> = inputs
        .iter()
        .map(|source| {
            let destination = resolve_destination(source, output, decompressed_name(source));
            BatchJob::new(source, destination)
        })
        .collect();

    run_jobs(
        &pipeline,
        Direction::Decompress,
        &jobs,
        overwrite,
        config.runtime.jobs,
        progress,
    )
}
