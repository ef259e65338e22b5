//! LZW dictionary (code table) management.
//!
//! Sequences are stored as an arena: each entry is its prefix code plus one
//! trailing byte, so a sequence is recovered by walking prefixes back to a
//! root. The encoder additionally keeps a `(prefix, byte) -> code` index.
//! Encoder and decoder each own a table and keep it in lock-step by applying
//! the same insertions in the same order.

use crate::config::{DictionaryPolicy, LzwConfig, ROOT_CODES};
use crate::error::{LzwError, Result};
use std::collections::HashMap;

/// Prefix value of the 256 root entries.
const NO_PREFIX: u16 = u16::MAX;

#[derive(Debug, Clone, Copy)]
struct Entry {
    prefix: u16,
    byte: u8,
    first: u8,
    len: u32,
}

/// Result of [`LzwDictionary::insert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insertion {
    /// The sequence was assigned this code.
    Added(u16),
    /// Table full under the freeze policy; nothing changed.
    Frozen,
    /// The insertion filled the table and it was reset to the root entries.
    Reset,
}

/// LZW dictionary for encoding and decoding.
#[derive(Debug)]
pub struct LzwDictionary {
    /// Code table, indexed by code.
    entries: Vec<Entry>,
    /// Reverse lookup for the encoder; left empty by the decoder.
    index: Option<HashMap<(u16, u8), u16>>,
    /// Configuration.
    config: LzwConfig,
}

impl LzwDictionary {
    /// Create a dictionary for encoding (with the reverse index).
    pub fn for_encoder(config: LzwConfig) -> Result<Self> {
        Self::build(config, true)
    }

    /// Create a dictionary for decoding.
    pub fn for_decoder(config: LzwConfig) -> Result<Self> {
        Self::build(config, false)
    }

    fn build(config: LzwConfig, with_index: bool) -> Result<Self> {
        config.validate()?;

        let mut dict = Self {
            entries: Vec::with_capacity(config.capacity() as usize),
            index: with_index.then(HashMap::new),
            config,
        };
        dict.reset();
        Ok(dict)
    }

    /// Reset the dictionary to the 256 single-byte entries.
    pub fn reset(&mut self) {
        self.entries.clear();
        if let Some(index) = self.index.as_mut() {
            index.clear();
        }
        self.entries.extend((0..ROOT_CODES).map(|b| Entry {
            prefix: NO_PREFIX,
            byte: b as u8,
            first: b as u8,
            len: 1,
        }));
    }

    /// Number of allocated codes; also the next code to be assigned.
    pub fn size(&self) -> u32 {
        self.entries.len() as u32
    }

    /// Check if every code of the maximum width is allocated.
    pub fn is_full(&self) -> bool {
        self.size() >= self.config.capacity()
    }

    /// Check if `code` is currently allocated.
    pub fn contains(&self, code: u16) -> bool {
        (code as u32) < self.size()
    }

    /// Encoder lookup: the code for `prefix` followed by `byte`.
    pub fn find(&self, prefix: u16, byte: u8) -> Option<u16> {
        self.index.as_ref()?.get(&(prefix, byte)).copied()
    }

    /// Add `prefix + byte` according to the configured policy.
    pub fn insert(&mut self, prefix: u16, byte: u8) -> Result<Insertion> {
        if self.is_full() {
            return match self.config.policy {
                DictionaryPolicy::Strict => Err(LzwError::DictionaryOverflow {
                    capacity: self.config.capacity(),
                }),
                // A reset table is never observed full; treat it like freeze.
                DictionaryPolicy::Freeze | DictionaryPolicy::Reset => Ok(Insertion::Frozen),
            };
        }

        let parent = self.entries[prefix as usize];
        let code = self.size() as u16;
        self.entries.push(Entry {
            prefix,
            byte,
            first: parent.first,
            len: parent.len + 1,
        });
        if let Some(index) = self.index.as_mut() {
            index.insert((prefix, byte), code);
        }

        if self.config.policy == DictionaryPolicy::Reset && self.is_full() {
            self.reset();
            return Ok(Insertion::Reset);
        }
        Ok(Insertion::Added(code))
    }

    /// First byte of the sequence for `code`. The code must be allocated.
    pub fn first_byte(&self, code: u16) -> u8 {
        self.entries[code as usize].first
    }

    /// Append the sequence for `code` to `out`.
    pub fn write_sequence(&self, code: u16, out: &mut Vec<u8>) -> Result<()> {
        let entry = self.entries.get(code as usize).ok_or(LzwError::InvalidCode {
            code,
            position: 0,
        })?;

        let start = out.len();
        out.resize(start + entry.len as usize, 0);

        let mut current = code;
        for slot in out[start..].iter_mut().rev() {
            let e = self.entries[current as usize];
            *slot = e.byte;
            current = e.prefix;
        }
        Ok(())
    }

    /// Width in bits of the next code on the wire.
    ///
    /// This is `ceil(log2(n))` where `n` is the encoder's table size when it
    /// emits the code. The decoder inserts one step behind the encoder, so it
    /// passes `pending = true` whenever it still owes an insertion, and the
    /// owed entry is counted here (including the reset it would trigger).
    pub fn code_width(&self, pending: bool) -> u8 {
        if self.config.fixed_width {
            return self.config.max_bits;
        }

        let capacity = self.config.capacity();
        let mut size = self.size();
        if pending && size < capacity {
            size += 1;
            if size == capacity && self.config.policy == DictionaryPolicy::Reset {
                size = ROOT_CODES;
            }
        }
        width_for(size)
    }
}

/// `ceil(log2(size))` for `size >= 2`.
fn width_for(size: u32) -> u8 {
    (u32::BITS - (size - 1).leading_zeros()) as u8
}
