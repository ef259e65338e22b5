//! Archive pipeline: source bytes to RCH container and back.
//!
//! Decompression walks a fixed sequence of states:
//!
//! ```text
//! Start -> HeaderValidated -> PayloadDecoded -> ChecksumVerified -> Done
//!   \____________\_________________\__________________\_______-> Failed(kind)
//! ```
//!
//! Every transition is emitted as a `tracing` event. There are no retries
//! here; a failed run ends in `Failed` and the output is dropped.

use crate::container::RchContainer;
use crate::header::RchHeader;
use crate::transform::{xor255, xor255_in_place};
use ercha_core::{ChecksumKind, ErchaError, ErrorKind, Result};
use ercha_lzw::LzwConfig;
use std::fmt;
use tracing::{debug, warn};

/// Settings for containers produced by an [`ArchivePipeline`].
///
/// Decompression ignores these and follows the container header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PipelineOptions {
    /// LZW code width and policy.
    pub lzw: LzwConfig,
    /// Checksum recorded in the header.
    pub checksum: ChecksumKind,
    /// Apply the XOR-255 pre-transform.
    pub xor255: bool,
}

impl PipelineOptions {
    /// Options reproducing the first-generation tool's containers.
    pub fn legacy() -> Self {
        Self {
            lzw: LzwConfig::LEGACY,
            ..Self::default()
        }
    }
}

/// Progress of a single pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// Nothing checked yet.
    Start,
    /// Header fields are consistent and supported.
    HeaderValidated,
    /// Payload decoded to the declared length.
    PayloadDecoded,
    /// Decoded bytes match the stored checksum.
    ChecksumVerified,
    /// Output handed to the caller.
    Done,
    /// Terminal failure.
    Failed(ErrorKind),
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => f.write_str("start"),
            Self::HeaderValidated => f.write_str("header-validated"),
            Self::PayloadDecoded => f.write_str("payload-decoded"),
            Self::ChecksumVerified => f.write_str("checksum-verified"),
            Self::Done => f.write_str("done"),
            Self::Failed(kind) => write!(f, "failed({})", kind),
        }
    }
}

/// State tracker for one operation.
#[derive(Debug)]
struct Run {
    operation: &'static str,
    history: Vec<PipelineState>,
}

impl Run {
    fn new(operation: &'static str) -> Self {
        debug!(operation, state = %PipelineState::Start, "pipeline started");
        Self {
            operation,
            history: vec![PipelineState::Start],
        }
    }

    fn state(&self) -> PipelineState {
        self.history
            .last()
            .copied()
            .unwrap_or(PipelineState::Start)
    }

    fn advance(&mut self, next: PipelineState) {
        debug!(
            operation = self.operation,
            from = %self.state(),
            to = %next,
            "pipeline transition"
        );
        self.history.push(next);
    }

    fn fail(&mut self, err: &ErchaError) {
        let kind = err.kind();
        warn!(
            operation = self.operation,
            from = %self.state(),
            kind = %kind,
            error = %err,
            "pipeline failed"
        );
        self.history.push(PipelineState::Failed(kind));
    }

    fn finish<T>(mut self, result: Result<T>) -> (Result<T>, Vec<PipelineState>) {
        match &result {
            Ok(_) => self.advance(PipelineState::Done),
            Err(e) => self.fail(e),
        }
        (result, self.history)
    }
}

/// Compresses data into RCH containers and restores it.
///
/// Holds no per-run state, so one pipeline can serve many threads.
#[derive(Debug, Clone, Default)]
pub struct ArchivePipeline {
    options: PipelineOptions,
}

impl ArchivePipeline {
    /// Create a pipeline, rejecting an invalid LZW configuration.
    pub fn new(options: PipelineOptions) -> Result<Self> {
        options.lzw.validate()?;
        Ok(Self { options })
    }

    /// Get the options.
    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Checksum, encode, and frame `source`.
    pub fn compress(&self, source: &[u8]) -> Result<RchContainer> {
        let run = Run::new("compress");
        let (result, _) = run.finish(self.compress_inner(source));
        result
    }

    fn compress_inner(&self, source: &[u8]) -> Result<RchContainer> {
        let opts = &self.options;
        let mut header = RchHeader::new(opts.lzw, opts.checksum, opts.xor255);
        header.original_len = source.len() as u64;
        header.checksum = opts.checksum.compute(source);

        let payload = if opts.xor255 {
            ercha_lzw::compress(&xor255(source), opts.lzw)?
        } else {
            ercha_lzw::compress(source, opts.lzw)?
        };

        debug!(
            original = source.len(),
            compressed = payload.len(),
            "payload encoded"
        );
        Ok(RchContainer::new(header, payload))
    }

    /// Decode a container and verify its checksum.
    ///
    /// Errors are reported in pipeline order: header problems first, then
    /// anything the LZW decoder rejects, then the checksum. The checksum
    /// covers the uncompressed bytes, so damage to the payload that breaks
    /// the code stream (an impossible code, or a decoded length that
    /// disagrees with the header) surfaces as `CorruptStream` before any
    /// checksum is computed. `ChecksumMismatch` means the stream decoded
    /// cleanly to the declared length but to different bytes. On either
    /// failure the decoded bytes are discarded.
    pub fn decompress(&self, container: &RchContainer) -> Result<Vec<u8>> {
        self.decompress_traced(container).0
    }

    /// Like [`decompress`](Self::decompress), also returning every state visited.
    pub fn decompress_traced(
        &self,
        container: &RchContainer,
    ) -> (Result<Vec<u8>>, Vec<PipelineState>) {
        let mut run = Run::new("decompress");
        let result = decode(container, &mut run);
        run.finish(result)
    }

    /// Decode a container, reporting a checksum mismatch instead of failing.
    ///
    /// Header and stream errors still fail. Used for forced extraction,
    /// where the caller decides what to do with unverified bytes.
    pub fn decompress_unverified(
        &self,
        container: &RchContainer,
    ) -> Result<(Vec<u8>, Option<ErchaError>)> {
        let mut run = Run::new("decompress-unverified");
        let result = decode_payload(container, &mut run).map(|data| {
            match container.verify(&data) {
                Ok(()) => {
                    run.advance(PipelineState::ChecksumVerified);
                    (data, None)
                }
                Err(e) => {
                    warn!(error = %e, "keeping output despite checksum failure");
                    (data, Some(e))
                }
            }
        });
        run.finish(result).0
    }

    /// Fully decode and verify a container, returning its header.
    pub fn check(&self, container: &RchContainer) -> Result<RchHeader> {
        self.decompress(container)?;
        Ok(*container.header())
    }
}

fn decode(container: &RchContainer, run: &mut Run) -> Result<Vec<u8>> {
    let data = decode_payload(container, run)?;
    container.verify(&data)?;
    run.advance(PipelineState::ChecksumVerified);
    Ok(data)
}

fn decode_payload(container: &RchContainer, run: &mut Run) -> Result<Vec<u8>> {
    let header = container.header();

    let config = header.lzw_config();
    config.validate()?;
    if header.compressed_len != container.payload().len() as u64 {
        return Err(ErchaError::corrupt(format!(
            "header declares {} payload bytes, container holds {}",
            header.compressed_len,
            container.payload().len()
        )));
    }
    let expected = usize::try_from(header.original_len).map_err(|_| {
        ErchaError::unsupported(format!(
            "{} byte original exceeds addressable memory",
            header.original_len
        ))
    })?;
    run.advance(PipelineState::HeaderValidated);

    let mut data = ercha_lzw::decompress(container.payload(), expected, config)?;
    if header.xor255 {
        xor255_in_place(&mut data);
    }
    run.advance(PipelineState::PayloadDecoded);
    Ok(data)
}
