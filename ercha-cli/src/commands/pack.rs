//! Pack command implementation.

use super::report_entries;
use crate::config::ErchaConfig;
use crate::utils::with_workers;
use ercha_rch::ArchivePipeline;
use ercha_rch::fs::is_stdio;
use std::path::{Path, PathBuf};
use tracing::debug;

pub fn cmd_pack(
    archive: &Path,
    inputs: &[PathBuf],
    stdin_name: &str,
    config: &ErchaConfig,
    overwrite: bool,
    quiet: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let pipeline = ArchivePipeline::new(config.pipeline_options())?;
    debug!(options = ?pipeline.options(), members = inputs.len(), "pack");

    let packed = with_workers(config.runtime.jobs, || {
        pipeline.pack_archive(inputs, archive, stdin_name, overwrite)
    })?;
    report_entries(&packed?, is_stdio(archive), quiet)
}
