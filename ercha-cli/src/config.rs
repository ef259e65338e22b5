//! `ercha.toml` configuration.
//!
//! Lookup order: `--config <path>` (must exist), then `./ercha.toml`, then
//! built-in defaults. Command-line flags are applied on top by the caller.

use ercha_core::{ChecksumKind, ErchaError, Result};
use ercha_lzw::{DictionaryPolicy, LzwConfig, MAX_CODE_BITS, MIN_CODE_BITS};
use ercha_rch::PipelineOptions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default configuration file name, looked up in the working directory.
pub const CONFIG_FILE: &str = "ercha.toml";

/// Whole configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ErchaConfig {
    /// Codec settings.
    pub lzw: LzwSection,
    /// Container settings.
    pub container: ContainerSection,
    /// Worker settings.
    pub runtime: RuntimeSection,
}

/// `[lzw]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LzwSection {
    /// Maximum code width, 9-16.
    pub max_code_width: u8,
    /// `freeze`, `reset` or `strict`.
    pub policy: DictionaryPolicy,
    /// Emit every code at the maximum width.
    pub fixed_width: bool,
}

impl Default for LzwSection {
    fn default() -> Self {
        let lzw = LzwConfig::default();
        Self {
            max_code_width: lzw.max_bits,
            policy: lzw.policy,
            fixed_width: lzw.fixed_width,
        }
    }
}

/// `[container]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContainerSection {
    /// `crc32` or `crc64`.
    pub checksum: ChecksumKind,
    /// Apply the XOR-255 pre-transform.
    pub xor255: bool,
}

/// `[runtime]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeSection {
    /// Worker threads for multi-file commands; 0 lets rayon decide.
    pub jobs: usize,
}

impl ErchaConfig {
    /// Parse TOML text.
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)
            .map_err(|e| ErchaError::invalid_config(e.message().to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Render as TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| ErchaError::invalid_config(e.to_string()))
    }

    /// Load from `explicit`, or `./ercha.toml` if present, or defaults.
    pub fn load(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>)> {
        let path = match explicit {
            Some(path) => {
                if !path.is_file() {
                    return Err(ErchaError::invalid_config(format!(
                        "config file not found: {}",
                        path.display()
                    )));
                }
                path.to_path_buf()
            }
            None => {
                let local = PathBuf::from(CONFIG_FILE);
                if !local.is_file() {
                    debug!("no {} found, using defaults", CONFIG_FILE);
                    return Ok((Self::default(), None));
                }
                local
            }
        };

        let text = fs::read_to_string(&path)?;
        let config = Self::from_toml(&text).map_err(|e| match e {
            ErchaError::InvalidConfig { message } => {
                ErchaError::invalid_config(format!("{}: {}", path.display(), message))
            }
            other => other,
        })?;
        debug!(path = %path.display(), "configuration loaded");
        Ok((config, Some(path)))
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        let width = self.lzw.max_code_width;
        if !(MIN_CODE_BITS..=MAX_CODE_BITS).contains(&width) {
            return Err(ErchaError::invalid_config(format!(
                "lzw.max_code_width = {} (must be {}-{})",
                width, MIN_CODE_BITS, MAX_CODE_BITS
            )));
        }
        Ok(())
    }

    /// LZW settings as a codec configuration.
    pub fn lzw_config(&self) -> LzwConfig {
        LzwConfig::new(self.lzw.max_code_width)
            .with_policy(self.lzw.policy)
            .with_fixed_width(self.lzw.fixed_width)
    }

    /// Pipeline options for this configuration.
    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            lzw: self.lzw_config(),
            checksum: self.container.checksum,
            xor255: self.container.xor255,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_is_default() {
        let config = ErchaConfig::from_toml("").unwrap();
        assert_eq!(config, ErchaConfig::default());
        assert_eq!(config.lzw.max_code_width, 16);
        assert_eq!(config.lzw.policy, DictionaryPolicy::Freeze);
        assert_eq!(config.container.checksum, ChecksumKind::Crc32);
        assert_eq!(config.runtime.jobs, 0);
    }

    #[test]
    fn test_full_file() {
        let text = r#"
[lzw]
max_code_width = 12
policy = "reset"
fixed_width = true

[container]
checksum = "crc64"
xor255 = true

[runtime]
jobs = 4
"#;
        let config = ErchaConfig::from_toml(text).unwrap();
        let options = config.pipeline_options();
        assert_eq!(options.lzw.max_bits, 12);
        assert_eq!(options.lzw.policy, DictionaryPolicy::Reset);
        assert!(options.lzw.fixed_width);
        assert_eq!(options.checksum, ChecksumKind::Crc64);
        assert!(options.xor255);
        assert_eq!(config.runtime.jobs, 4);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = ErchaConfig::from_toml("[container]\nxor255 = true\n").unwrap();
        assert!(config.container.xor255);
        assert_eq!(config.lzw, LzwSection::default());
    }

    #[test]
    fn test_invalid_values() {
        let err = ErchaConfig::from_toml("[lzw]\nmax_code_width = 20\n").unwrap_err();
        assert!(matches!(err, ErchaError::InvalidConfig { .. }));

        let err = ErchaConfig::from_toml("[lzw]\npolicy = \"lru\"\n").unwrap_err();
        assert!(matches!(err, ErchaError::InvalidConfig { .. }));

        let err = ErchaConfig::from_toml("[lzw]\nwidth = 12\n").unwrap_err();
        assert!(matches!(err, ErchaError::InvalidConfig { .. }));
    }

    #[test]
    fn test_defaults_render_and_reparse() {
        let text = ErchaConfig::default().to_toml().unwrap();
        assert!(text.contains("max_code_width = 16"));
        assert!(text.contains("policy = \"freeze\""));
        assert!(text.contains("checksum = \"crc32\""));
        assert_eq!(
            ErchaConfig::from_toml(&text).unwrap(),
            ErchaConfig::default()
        );
    }

    #[test]
    fn test_load_explicit_missing() {
        let err = ErchaConfig::load(Some(Path::new("/nonexistent/ercha.toml"))).unwrap_err();
        assert!(matches!(err, ErchaError::InvalidConfig { .. }));
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        fs::write(&path, "[runtime]\njobs = 2\n").unwrap();
        let (config, used) = ErchaConfig::load(Some(&path)).unwrap();
        assert_eq!(config.runtime.jobs, 2);
        assert_eq!(used, Some(path));
    }
}
