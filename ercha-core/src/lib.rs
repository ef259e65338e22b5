//! # Ercha Core
//!
//! Shared building blocks for the Ercha archiver:
//!
//! - [`crc`]: CRC-32 and CRC-64 checksums
//! - [`checksum`]: checksum selection as stored in RCH headers
//! - [`error`]: the error taxonomy every layer reports through
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ L4: CLI                                                 │
//! │     ercha binary, configuration, logging                │
//! ├─────────────────────────────────────────────────────────┤
//! │ L3: Container + Pipeline                                │
//! │     RCH header/payload framing, compress/decompress     │
//! ├─────────────────────────────────────────────────────────┤
//! │ L2: Codec                                               │
//! │     Variable-width LZW                                  │
//! ├─────────────────────────────────────────────────────────┤
//! │ L1: Core (this crate)                                   │
//! │     CRC, checksum selection, errors                     │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use ercha_core::{ChecksumKind, Crc32};
//!
//! let crc = Crc32::compute(b"Hello, World!");
//! assert_eq!(crc, 0xEC4AC3D0);
//! assert_eq!(ChecksumKind::Crc32.compute(b"Hello, World!"), 0xEC4AC3D0);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![forbid(unsafe_code)]

pub mod checksum;
pub mod crc;
pub mod error;

pub use checksum::{Checksum, ChecksumKind};
pub use crc::{Crc32, Crc64};
pub use error::{ErchaError, ErrorKind, Result};
