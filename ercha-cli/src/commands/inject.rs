//! Inject command implementation.

use super::report_entries;
use crate::config::ErchaConfig;
use crate::utils::with_workers;
use ercha_rch::ArchivePipeline;
use std::path::{Path, PathBuf};

pub fn cmd_inject(
    archive: &Path,
    inputs: &[PathBuf],
    stdin_name: &str,
    replace: bool,
    config: &ErchaConfig,
    quiet: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let pipeline = ArchivePipeline::new(config.pipeline_options())?;

    let injected = with_workers(config.runtime.jobs, || {
        pipeline.inject_archive(archive, inputs, stdin_name, replace)
    })?;
    report_entries(&injected?, false, quiet)
}
