//! Block render loop.
//!
//! The loop owns the [`Engine`] for its lifetime. Control events are drained
//! from the [`ControlQueue`] once per block, so the per-sample inner loop
//! touches no shared state. Shutdown is cooperative: clearing the `running`
//! flag lets the current block finish, then the sink is closed.

use std::sync::atomic::{AtomicBool, Ordering};

use timbral_core::encode_pcm16_be;
use timbral_synth::{ControlEvent, ControlQueue, Engine};

use crate::Result;
use crate::sink::PcmSink;

/// Reference block: 512 samples, 1024 bytes of 16-bit mono PCM.
pub const DEFAULT_BLOCK_SIZE: usize = 512;

/// Renders fixed-size blocks from an engine into a [`PcmSink`].
#[derive(Debug, Clone)]
pub struct RenderLoop {
    samples: Vec<f32>,
    bytes: Vec<u8>,
}

impl Default for RenderLoop {
    fn default() -> Self {
        Self::new(DEFAULT_BLOCK_SIZE)
    }
}

impl RenderLoop {
    /// Create a loop rendering `block_size` samples per block (at least 1).
    pub fn new(block_size: usize) -> Self {
        let block_size = block_size.max(1);
        Self {
            samples: vec![0.0; block_size],
            bytes: vec![0; block_size * 2],
        }
    }

    /// Samples per block.
    pub fn block_size(&self) -> usize {
        self.samples.len()
    }

    /// Render one block of PCM without writing it anywhere.
    pub fn render_block(&mut self, engine: &mut Engine) -> &[u8] {
        engine.render(&mut self.samples);
        encode_pcm16_be(&self.samples, &mut self.bytes);
        &self.bytes
    }

    /// Run until `running` is cleared or the sink fails.
    ///
    /// Returns the number of blocks written. The sink is closed on every
    /// exit path; a write error is logged once and returned without retry.
    pub fn run<S: PcmSink + ?Sized>(
        &mut self,
        engine: &mut Engine,
        queue: &ControlQueue,
        sink: &mut S,
        running: &AtomicBool,
    ) -> Result<u64> {
        tracing::info!(
            block_size = self.block_size(),
            sample_rate = engine.sample_rate(),
            "render loop started"
        );

        let mut blocks = 0u64;
        while running.load(Ordering::Acquire) {
            let applied = engine.apply_pending(queue);
            if applied > 0 {
                tracing::trace!(applied, block = blocks, "control events applied");
            }

            self.render_block(engine);
            if let Err(e) = sink.write_block(&self.bytes) {
                tracing::error!(error = %e, blocks, "audio sink failed, stopping render loop");
                if let Err(close_err) = sink.close() {
                    tracing::debug!(error = %close_err, "sink close after failure");
                }
                return Err(e);
            }
            blocks += 1;
        }

        sink.close()?;
        tracing::info!(blocks, "render loop stopped");
        Ok(blocks)
    }
}

/// Render `seconds` of audio, applying each event at its sample offset.
///
/// Events need not be sorted. Events at the same offset apply in the order
/// given.
pub fn render_offline(
    engine: &mut Engine,
    events: &[(u64, ControlEvent)],
    seconds: f32,
) -> Vec<f32> {
    let total = (seconds.max(0.0) * engine.sample_rate()).round() as usize;
    let mut out = vec![0.0; total];
    let schedule = sorted(events);
    let mut next = 0;

    for (n, sample) in out.iter_mut().enumerate() {
        while next < schedule.len() && schedule[next].0 <= n as u64 {
            engine.apply(schedule[next].1.clone());
            next += 1;
        }
        *sample = engine.next_sample();
    }
    out
}

/// Render `total_samples` of audio into `sink` as PCM blocks.
///
/// Events are applied at their exact sample offset. The final block may be
/// shorter than `block_size`. Returns the number of blocks written; the sink
/// is closed afterwards.
pub fn render_to_sink<S: PcmSink + ?Sized>(
    engine: &mut Engine,
    events: &[(u64, ControlEvent)],
    total_samples: u64,
    block_size: usize,
    sink: &mut S,
) -> Result<u64> {
    let block_size = block_size.max(1);
    let schedule = sorted(events);
    let mut next = 0;
    let mut samples = vec![0.0f32; block_size];
    let mut bytes = vec![0u8; block_size * 2];
    let mut position = 0u64;
    let mut blocks = 0u64;

    while position < total_samples {
        let len = (total_samples - position).min(block_size as u64) as usize;
        for sample in &mut samples[..len] {
            while next < schedule.len() && schedule[next].0 <= position {
                engine.apply(schedule[next].1.clone());
                next += 1;
            }
            *sample = engine.next_sample();
            position += 1;
        }
        let written = encode_pcm16_be(&samples[..len], &mut bytes);
        if let Err(e) = sink.write_block(&bytes[..written * 2]) {
            tracing::error!(error = %e, blocks, "audio sink failed during offline render");
            if let Err(close_err) = sink.close() {
                tracing::debug!(error = %close_err, "sink close after failure");
            }
            return Err(e);
        }
        blocks += 1;
    }

    sink.close()?;
    tracing::debug!(blocks, total_samples, "offline render finished");
    Ok(blocks)
}

fn sorted(events: &[(u64, ControlEvent)]) -> Vec<(u64, ControlEvent)> {
    let mut schedule = events.to_vec();
    schedule.sort_by_key(|(at, _)| *at);
    schedule
}
