//! Config command implementation.

use crate::config::ErchaConfig;
use ercha_rch::fs::write_atomic;
use std::io::Write;
use std::path::Path;

pub fn cmd_init(path: &Path, force: bool) -> Result<(), Box<dyn std::error::Error>> {
    let text = ErchaConfig::default().to_toml()?;
    write_atomic(path, force, |file| {
        file.write_all(text.as_bytes())?;
        Ok(())
    })?;
    println!("Wrote default configuration to {}", path.display());
    Ok(())
}

pub fn cmd_show(
    config: &ErchaConfig,
    source: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    match source {
        Some(path) => println!("# loaded from {}", path.display()),
        None => println!("# built-in defaults"),
    }
    print!("{}", config.to_toml()?);
    Ok(())
}
