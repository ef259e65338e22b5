//! Utility functions for the CLI.

use ercha_core::{ErchaError, Result};
use ercha_rch::EntryReport;
use ercha_rch::archive::is_archive;
use ercha_rch::fs::is_stdio;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

/// Create a progress bar with standard styling.
pub fn create_progress_bar(len: u64, enable: bool) -> ProgressBar {
    if !enable {
        return ProgressBar::hidden();
    }

    let style = ProgressStyle::default_bar()
        .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▓▒░ ");
    let pb = ProgressBar::new(len);
    pb.set_style(style);
    pb
}

/// Run `f` on a pool of `jobs` workers, or on rayon's global pool for 0.
pub fn with_workers<T, F>(jobs: usize, f: F) -> std::result::Result<T, Box<dyn std::error::Error>>
where
    T: Send,
    F: FnOnce() -> T + Send,
{
    if jobs == 0 {
        return Ok(f());
    }
    let pool = rayon::ThreadPoolBuilder::new().num_threads(jobs).build()?;
    Ok(pool.install(f))
}

/// Reject `-` mixed with other inputs, and a non-directory `-o` for several.
pub fn check_inputs(inputs: &[PathBuf], output: Option<&Path>) -> Result<()> {
    if inputs.len() < 2 {
        return Ok(());
    }
    if inputs.iter().any(|p| is_stdio(p)) {
        return Err(ErchaError::invalid_config(
            "'-' must be the only input when reading stdin",
        ));
    }
    match output {
        Some(out) if !out.is_dir() => Err(ErchaError::invalid_config(format!(
            "output {} must be an existing directory for several inputs",
            out.display()
        ))),
        _ => Ok(()),
    }
}

/// Format a byte count the way `ls -h` does.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

/// Compressed size as a percentage of the original, for display.
pub fn format_ratio(original: u64, compressed: u64) -> String {
    if original == 0 {
        return "-".to_string();
    }
    format!("{:.1}%", compressed as f64 / original as f64 * 100.0)
}

/// Check whether `path` names a multi-entry archive rather than a container.
///
/// Unreadable files and stdin count as containers; reading them later
/// reports the real problem.
pub fn is_archive_file(path: &Path) -> bool {
    if is_stdio(path) {
        return false;
    }
    let mut prefix = [0u8; 4];
    File::open(path)
        .and_then(|mut file| file.read_exact(&mut prefix))
        .map(|()| is_archive(&prefix))
        .unwrap_or(false)
}

/// Write archive results as a table.
pub fn write_entry_table<W: Write>(out: &mut W, reports: &[EntryReport]) -> io::Result<()> {
    writeln!(
        out,
        "{:<32} {:>10} {:>10} {:>18} {:>10} {:>6}  Status",
        "Name", "Size", "Packed", "Checksum", "Encoding", "Passed",
    )?;
    writeln!(out, "{}", "=".repeat(100))?;
    for report in reports {
        writeln!(
            out,
            "{:<32} {:>10} {:>10} {:>#18x} {:>10} {:>6}  {}",
            report.name,
            report.original_len,
            report.compressed_len,
            report.checksum,
            report.encoding,
            if report.checksum_passed { "Yes" } else { "No" },
            report.status,
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(1023), "1023 B");
        assert_eq!(format_size(1536), "1.5 KiB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.0 MiB");
    }

    #[test]
    fn test_format_ratio() {
        assert_eq!(format_ratio(0, 0), "-");
        assert_eq!(format_ratio(200, 50), "25.0%");
    }

    #[test]
    fn test_check_inputs() {
        let one = vec![PathBuf::from("-")];
        assert!(check_inputs(&one, Some(Path::new("out.rch"))).is_ok());

        let mixed = vec![PathBuf::from("-"), PathBuf::from("a.txt")];
        assert!(check_inputs(&mixed, None).is_err());

        let two = vec![PathBuf::from("a.txt"), PathBuf::from("b.txt")];
        assert!(check_inputs(&two, None).is_ok());
        assert!(check_inputs(&two, Some(Path::new("/nonexistent/dir"))).is_err());

        let dir = tempfile::tempdir().unwrap();
        assert!(check_inputs(&two, Some(dir.path())).is_ok());
    }

    #[test]
    fn test_is_archive_file() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("a.erca");
        let container = dir.path().join("a.rch");
        std::fs::write(&archive, b"ERCA\x01").unwrap();
        std::fs::write(&container, b"ERCH\x01").unwrap();

        assert!(is_archive_file(&archive));
        assert!(!is_archive_file(&container));
        assert!(!is_archive_file(&dir.path().join("missing")));
        assert!(!is_archive_file(Path::new("-")));
    }

    #[test]
    fn test_entry_table() {
        let pipeline = ercha_rch::ArchivePipeline::default();
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("table.txt");
        std::fs::write(&source, b"row row row").unwrap();
        let reports = pipeline
            .pack_archive(&[source], &dir.path().join("t.erca"), "stdin", false)
            .unwrap();

        let mut out = Vec::new();
        write_entry_table(&mut out, &reports).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Name"));
        assert!(lines[2].starts_with("table.txt"));
        assert!(lines[2].contains("Yes"));
        assert!(lines[2].ends_with("Packed"));
    }

    #[test]
    fn test_with_workers() {
        let n = with_workers(2, rayon::current_num_threads).unwrap();
        assert_eq!(n, 2);
        assert_eq!(with_workers(0, || 7).unwrap(), 7);
    }
}
