//! # Ercha RCH
//!
//! The RCH container format and the archive pipeline built on it.
//!
//! - [`header`]: the fixed 30-byte header and its flags
//! - [`container`]: header + payload framing, read/write/verify
//! - [`stream`]: a seekable writer that compresses as data arrives
//! - [`pipeline`]: compress/decompress with checksum verification
//! - [`fs`]: atomic file output, stdin/stdout, output naming
//! - [`batch`]: many independent containers on a rayon pool
//! - [`archive`]: named containers in one file; pack, unpack, inject, detract
//!
//! ## Example
//!
//! ```rust
//! use ercha_rch::{ArchivePipeline, RchContainer};
//!
//! let pipeline = ArchivePipeline::default();
//! let container = pipeline.compress(b"AAAAAAAAAA").unwrap();
//! assert!(container.payload().len() < 10);
//!
//! let bytes = container.to_bytes();
//! let parsed = RchContainer::from_bytes(&bytes).unwrap();
//! assert_eq!(pipeline.decompress(&parsed).unwrap(), b"AAAAAAAAAA");
//! ```
//!
//! ## Format Detection
//!
//! Every container starts with the magic `ERCH` and every archive with
//! `ERCA`; use [`RchHeader::read`] to inspect a container without decoding
//! it and [`archive::is_archive`] to tell the two apart.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![forbid(unsafe_code)]

pub mod archive;
pub mod batch;
pub mod container;
pub mod fs;
pub mod header;
pub mod pipeline;
pub mod stream;
pub mod transform;

// Re-exports
pub use archive::ops::{DetractReport, EntryReport, EntryStatus};
pub use archive::{ArchiveMember, RchArchive};
pub use batch::BatchJob;
pub use container::RchContainer;
pub use fs::FileReport;
pub use header::{HEADER_SIZE, RCH_MAGIC, RCH_VERSION, RchHeader};
pub use pipeline::{ArchivePipeline, PipelineOptions, PipelineState};
pub use stream::RchStreamWriter;
