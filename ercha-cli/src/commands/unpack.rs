//! Unpack command implementation.

use super::report_entries;
use crate::config::ErchaConfig;
use crate::utils::with_workers;
use ercha_rch::ArchivePipeline;
use ercha_rch::fs::is_stdio;
use std::path::Path;

pub struct UnpackOptions<'a> {
    /// Only these members; all when empty.
    pub files: &'a [String],
    pub force: bool,
    pub overwrite: bool,
    pub quiet: bool,
}

pub fn cmd_unpack(
    archive: &Path,
    output_dir: &Path,
    options: &UnpackOptions,
    config: &ErchaConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    // Members carry their own codec settings.
    let pipeline = ArchivePipeline::default();

    let unpacked = with_workers(config.runtime.jobs, || {
        pipeline.unpack_archive(
            archive,
            output_dir,
            options.files,
            options.force,
            options.overwrite,
        )
    })?;
    report_entries(&unpacked?, is_stdio(output_dir), options.quiet)
}
