//! Destinations for rendered PCM blocks.
//!
//! A block is signed 16-bit mono PCM in big-endian byte order, as produced
//! by [`RenderLoop`](crate::RenderLoop). Sinks may block in
//! [`write_block`](PcmSink::write_block); that back-pressure is what paces
//! the render loop against a real-time device.

use std::path::Path;

use crate::wav::WavRecorder;
use crate::{Error, Result};

/// Decode big-endian 16-bit PCM to float samples (`s / 32768`).
///
/// Returns the number of samples written to `out`. A trailing odd byte is
/// ignored.
pub fn decode_pcm16_be(bytes: &[u8], out: &mut [f32]) -> usize {
    let mut decoded = 0;
    for (pair, slot) in bytes.chunks_exact(2).zip(out.iter_mut()) {
        *slot = f32::from(i16::from_be_bytes([pair[0], pair[1]])) / 32768.0;
        decoded += 1;
    }
    decoded
}

/// Consumer of rendered PCM blocks.
pub trait PcmSink {
    /// Write one block of big-endian 16-bit mono PCM. May block.
    fn write_block(&mut self, pcm: &[u8]) -> Result<()>;

    /// Flush and release the underlying device or file.
    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<S: PcmSink + ?Sized> PcmSink for Box<S> {
    fn write_block(&mut self, pcm: &[u8]) -> Result<()> {
        (**self).write_block(pcm)
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}

/// Sink that discards audio and counts blocks.
#[derive(Debug, Default, Clone)]
pub struct NullSink {
    blocks: u64,
    bytes: u64,
}

impl NullSink {
    /// Create a new null sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Blocks written.
    pub fn blocks(&self) -> u64 {
        self.blocks
    }

    /// Bytes written.
    pub fn bytes(&self) -> u64 {
        self.bytes
    }
}

impl PcmSink for NullSink {
    fn write_block(&mut self, pcm: &[u8]) -> Result<()> {
        self.blocks += 1;
        self.bytes += pcm.len() as u64;
        Ok(())
    }
}

/// Sink that keeps every byte in memory, optionally failing after a
/// number of blocks.
#[derive(Debug, Default, Clone)]
pub struct VecSink {
    data: Vec<u8>,
    blocks: u64,
    fail_after: Option<u64>,
    closed: bool,
}

impl VecSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a sink whose writes fail with [`Error::SinkClosed`] once
    /// `blocks` blocks have been accepted.
    pub fn failing_after(blocks: u64) -> Self {
        Self {
            fail_after: Some(blocks),
            ..Self::default()
        }
    }

    /// Bytes received so far.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Received audio decoded back to floats.
    pub fn samples(&self) -> Vec<f32> {
        let mut out = vec![0.0; self.data.len() / 2];
        decode_pcm16_be(&self.data, &mut out);
        out
    }

    /// Blocks accepted.
    pub fn blocks(&self) -> u64 {
        self.blocks
    }

    /// Whether [`close`](PcmSink::close) was called.
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl PcmSink for VecSink {
    fn write_block(&mut self, pcm: &[u8]) -> Result<()> {
        if self.closed || self.fail_after.is_some_and(|n| self.blocks >= n) {
            return Err(Error::SinkClosed);
        }
        self.data.extend_from_slice(pcm);
        self.blocks += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}

/// Sink that records blocks to a 16-bit mono WAV file.
#[derive(Debug)]
pub struct WavSink {
    recorder: WavRecorder,
}

impl WavSink {
    /// Create (or truncate) a WAV file at `path`.
    pub fn create<P: AsRef<Path>>(path: P, sample_rate: u32) -> Result<Self> {
        Ok(Self {
            recorder: WavRecorder::create(path, sample_rate)?,
        })
    }

    /// Samples recorded so far.
    pub fn samples_written(&self) -> u64 {
        self.recorder.samples_written()
    }
}

impl PcmSink for WavSink {
    fn write_block(&mut self, pcm: &[u8]) -> Result<()> {
        if !self.recorder.is_open() {
            return Err(Error::SinkClosed);
        }
        self.recorder.write_i16(
            pcm.chunks_exact(2)
                .map(|pair| i16::from_be_bytes([pair[0], pair[1]])),
        )
    }

    fn close(&mut self) -> Result<()> {
        self.recorder.finalize()
    }
}
