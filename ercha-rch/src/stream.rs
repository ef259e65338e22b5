//! Streaming RCH writer.
//!
//! Writes a placeholder header, streams LZW output as input arrives, then
//! seeks back on [`RchStreamWriter::finish`] to fill in lengths and checksum.

use crate::header::{HEADER_SIZE, RchHeader};
use crate::pipeline::PipelineOptions;
use crate::transform::xor255_in_place;
use ercha_core::{Checksum, ErchaError, Result};
use ercha_lzw::LzwEncoder;
use std::io::{self, Read, Seek, SeekFrom, Write};
use tracing::debug;

const COPY_BUF_SIZE: usize = 64 * 1024;

/// RCH writer that compresses as it goes.
pub struct RchStreamWriter<W: Write + Seek> {
    inner: W,
    /// Offset of the header within `inner`.
    start: u64,
    header: RchHeader,
    encoder: LzwEncoder,
    hasher: Checksum,
    scratch: Vec<u8>,
}

impl<W: Write + Seek> RchStreamWriter<W> {
    /// Start a container at the current position of `inner`.
    pub fn new(mut inner: W, options: &PipelineOptions) -> Result<Self> {
        let encoder = LzwEncoder::new(options.lzw)?;
        let start = inner.stream_position()?;
        inner.write_all(&[0u8; HEADER_SIZE])?;

        Ok(Self {
            inner,
            start,
            header: RchHeader::new(options.lzw, options.checksum, options.xor255),
            encoder,
            hasher: options.checksum.hasher(),
            scratch: Vec::new(),
        })
    }

    /// Uncompressed bytes accepted so far.
    pub fn bytes_in(&self) -> u64 {
        self.header.original_len
    }

    /// Compress everything `reader` yields, returning the byte count.
    ///
    /// Unlike going through [`io::copy`], codec failures keep their kind.
    pub fn copy_from<R: Read>(&mut self, reader: &mut R) -> Result<u64> {
        let mut buf = vec![0u8; COPY_BUF_SIZE];
        let mut total = 0u64;
        loop {
            let n = match reader.read(&mut buf) {
                Ok(0) => return Ok(total),
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            self.encode_chunk(&buf[..n])?;
            total += n as u64;
        }
    }

    fn encode_chunk(&mut self, buf: &[u8]) -> Result<()> {
        self.hasher.update(buf);

        if self.header.xor255 {
            self.scratch.clear();
            self.scratch.extend_from_slice(buf);
            xor255_in_place(&mut self.scratch);
            self.encoder.write(&self.scratch)?;
        } else {
            self.encoder.write(buf)?;
        }

        let out = self.encoder.take_output();
        self.inner.write_all(&out)?;
        self.header.compressed_len += out.len() as u64;
        self.header.original_len += buf.len() as u64;
        Ok(())
    }

    /// Flush the encoder, patch the header, and return the inner writer
    /// positioned after the payload.
    pub fn finish(mut self) -> Result<W> {
        let tail = self.encoder.finish()?;
        self.inner.write_all(&tail)?;
        self.header.compressed_len += tail.len() as u64;
        self.header.checksum = self.hasher.finalize();

        let end = self.inner.stream_position()?;
        self.inner.seek(SeekFrom::Start(self.start))?;
        self.header.write(&mut self.inner)?;
        self.inner.seek(SeekFrom::Start(end))?;
        self.inner.flush()?;

        debug!(
            original = self.header.original_len,
            compressed = self.header.compressed_len,
            "stream container finished"
        );
        Ok(self.inner)
    }
}

impl<W: Write + Seek> Write for RchStreamWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.encode_chunk(buf).map_err(|e| match e {
            ErchaError::Io(e) => e,
            other => io::Error::other(other),
        })?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
