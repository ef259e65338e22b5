//! LZW configuration: code width limits and full-dictionary policy.

use crate::error::{LzwError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Smallest allowed maximum code width.
pub const MIN_CODE_BITS: u8 = 9;

/// Largest allowed maximum code width.
pub const MAX_CODE_BITS: u8 = 16;

/// Number of single-byte root entries every dictionary starts with.
pub const ROOT_CODES: u32 = 256;

/// What happens once every code of the configured width is allocated.
///
/// The policy is part of the stream format: encoder and decoder must agree
/// on it, so it is recorded in the container header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DictionaryPolicy {
    /// Stop adding entries and keep matching against the frozen table.
    #[default]
    Freeze,
    /// Drop back to the 256 root entries as soon as the table fills.
    Reset,
    /// Treat a full table as an error.
    Strict,
}

impl DictionaryPolicy {
    /// Header flag value for this policy.
    pub fn id(self) -> u8 {
        match self {
            Self::Freeze => 0,
            Self::Reset => 1,
            Self::Strict => 2,
        }
    }

    /// Inverse of [`DictionaryPolicy::id`].
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            0 => Some(Self::Freeze),
            1 => Some(Self::Reset),
            2 => Some(Self::Strict),
            _ => None,
        }
    }

    /// Lowercase name, as used in configuration files.
    pub fn name(self) -> &'static str {
        match self {
            Self::Freeze => "freeze",
            Self::Reset => "reset",
            Self::Strict => "strict",
        }
    }
}

impl fmt::Display for DictionaryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// LZW configuration parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LzwConfig {
    /// Maximum code size in bits (9-16).
    pub max_bits: u8,
    /// Full-dictionary behaviour.
    pub policy: DictionaryPolicy,
    /// Emit every code at `max_bits` instead of growing the width.
    pub fixed_width: bool,
}

impl LzwConfig {
    /// Default configuration: 16-bit ceiling, growing widths, freeze when full.
    pub const DEFAULT: Self = Self {
        max_bits: 16,
        policy: DictionaryPolicy::Freeze,
        fixed_width: false,
    };

    /// Layout of the first-generation RCH tool: every code is a two-byte
    /// big-endian integer and the 65536-entry table freezes when full.
    pub const LEGACY: Self = Self {
        max_bits: 16,
        policy: DictionaryPolicy::Freeze,
        fixed_width: true,
    };

    /// Create a configuration with the given maximum width and default policy.
    pub fn new(max_bits: u8) -> Self {
        Self {
            max_bits,
            ..Self::DEFAULT
        }
    }

    /// Set the full-dictionary policy.
    pub fn with_policy(mut self, policy: DictionaryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set fixed-width code emission.
    pub fn with_fixed_width(mut self, fixed_width: bool) -> Self {
        self.fixed_width = fixed_width;
        self
    }

    /// Check that the width is within 9-16 bits.
    pub fn validate(&self) -> Result<()> {
        if !(MIN_CODE_BITS..=MAX_CODE_BITS).contains(&self.max_bits) {
            return Err(LzwError::InvalidBitWidth(self.max_bits));
        }
        Ok(())
    }

    /// Number of codes available at `max_bits`.
    pub fn capacity(&self) -> u32 {
        1u32 << self.max_bits
    }
}

impl Default for LzwConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}
