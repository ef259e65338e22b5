//! Detract command implementation.

use ercha_rch::archive::ops::detract_archive;
use std::path::Path;

pub fn cmd_detract(
    archive: &Path,
    names: &[String],
    output: Option<&Path>,
    overwrite: bool,
    quiet: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let report = detract_archive(archive, names, output, overwrite)?;
    let target = output.unwrap_or(archive);

    if !quiet && !report.removed.is_empty() {
        println!(
            "Removed from {}: {}",
            target.display(),
            report.removed.join(", ")
        );
    }
    if !report.missing.is_empty() {
        return Err(format!(
            "not found in {}: {}",
            archive.display(),
            report.missing.join(", ")
        )
        .into());
    }
    Ok(())
}
