//! Live audio through cpal.
//!
//! [`CpalSink`] feeds rendered blocks to an output stream through a bounded
//! channel. The device callback never blocks: when no block is ready it
//! plays silence, so a late render thread costs a glitch rather than a
//! stall. [`CpalSource`] goes the other way, mixing input to mono and
//! handing chunks to the capture thread.
//!
//! Mono audio is duplicated to every output channel.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, SendTimeoutError, Sender, bounded};
use cpal::traits::{DeviceTrait, StreamTrait};

use crate::device::{device_name, find_device};
use crate::sink::{PcmSink, decode_pcm16_be};
use crate::capture::CaptureSource;
use crate::{Error, Result};

/// Blocks buffered between the render thread and the output callback.
const OUTPUT_QUEUE_BLOCKS: usize = 4;

/// Input chunks buffered between the callback and the capture thread.
const INPUT_QUEUE_CHUNKS: usize = 64;

/// How long a blocked write may wait for the device before giving up.
const WRITE_TIMEOUT: Duration = Duration::from_secs(2);

/// How long a read may wait for input before giving up.
const READ_TIMEOUT: Duration = Duration::from_secs(2);

/// How long `close` waits for queued blocks to play out.
const DRAIN_TIMEOUT: Duration = Duration::from_millis(500);

fn stream_config(channels: u16, sample_rate: u32) -> cpal::StreamConfig {
    cpal::StreamConfig {
        channels,
        sample_rate,
        buffer_size: cpal::BufferSize::Default,
    }
}

/// Output-device sink for the render loop.
pub struct CpalSink {
    stream: Option<cpal::Stream>,
    blocks: Sender<Vec<f32>>,
    recycled: Receiver<Vec<f32>>,
    failed: Arc<AtomicBool>,
    underruns: Arc<AtomicU64>,
    device: String,
}

impl CpalSink {
    /// Open an output device and start its stream.
    ///
    /// `device` is a case-insensitive name fragment; `None` picks the
    /// default output.
    pub fn open(device: Option<&str>, sample_rate: u32) -> Result<Self> {
        let host = cpal::default_host();
        let device = find_device(&host, device, false)?;
        let name = device_name(&device).unwrap_or_else(|| "unknown".to_string());
        let channels = device
            .default_output_config()
            .map_err(|e| Error::Stream(e.to_string()))?
            .channels()
            .max(1);

        let (block_tx, block_rx) = bounded::<Vec<f32>>(OUTPUT_QUEUE_BLOCKS);
        let (recycle_tx, recycle_rx) = bounded::<Vec<f32>>(OUTPUT_QUEUE_BLOCKS + 2);
        let failed = Arc::new(AtomicBool::new(false));
        let underruns = Arc::new(AtomicU64::new(0));

        let mut current: Vec<f32> = Vec::new();
        let mut position = 0usize;
        let callback_underruns = Arc::clone(&underruns);
        let error_flag = Arc::clone(&failed);

        let stream = device
            .build_output_stream(
                &stream_config(channels, sample_rate),
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    for frame in data.chunks_mut(usize::from(channels)) {
                        if position >= current.len() {
                            match block_rx.try_recv() {
                                Ok(next) => {
                                    let used = std::mem::replace(&mut current, next);
                                    let _ = recycle_tx.try_send(used);
                                    position = 0;
                                }
                                Err(_) => {
                                    callback_underruns.fetch_add(1, Ordering::Relaxed);
                                    frame.fill(0.0);
                                    continue;
                                }
                            }
                        }
                        frame.fill(current[position]);
                        position += 1;
                    }
                },
                move |err| {
                    tracing::error!(error = %err, "output stream error");
                    error_flag.store(true, Ordering::Release);
                },
                None,
            )
            .map_err(|e| Error::Stream(e.to_string()))?;

        stream.play().map_err(|e| Error::Stream(e.to_string()))?;
        tracing::info!(device = %name, channels, sample_rate, "output stream started");

        Ok(Self {
            stream: Some(stream),
            blocks: block_tx,
            recycled: recycle_rx,
            failed,
            underruns,
            device: name,
        })
    }

    /// Name of the opened device.
    pub fn device_name(&self) -> &str {
        &self.device
    }

    /// Output frames filled with silence because no block was ready.
    pub fn underruns(&self) -> u64 {
        self.underruns.load(Ordering::Relaxed)
    }
}

impl PcmSink for CpalSink {
    fn write_block(&mut self, pcm: &[u8]) -> Result<()> {
        if self.stream.is_none() {
            return Err(Error::SinkClosed);
        }
        if self.failed.load(Ordering::Acquire) {
            return Err(Error::Stream("audio device unavailable".to_string()));
        }

        let mut block = self.recycled.try_recv().unwrap_or_default();
        block.resize(pcm.len() / 2, 0.0);
        decode_pcm16_be(pcm, &mut block);

        match self.blocks.send_timeout(block, WRITE_TIMEOUT) {
            Ok(()) => Ok(()),
            Err(SendTimeoutError::Timeout(_)) => Err(Error::Stream(
                "audio device stopped consuming blocks".to_string(),
            )),
            Err(SendTimeoutError::Disconnected(_)) => Err(Error::SinkClosed),
        }
    }

    fn close(&mut self) -> Result<()> {
        let Some(stream) = self.stream.take() else {
            return Ok(());
        };
        let started = Instant::now();
        while !self.blocks.is_empty()
            && !self.failed.load(Ordering::Acquire)
            && started.elapsed() < DRAIN_TIMEOUT
        {
            std::thread::sleep(Duration::from_millis(5));
        }
        if let Err(e) = stream.pause() {
            tracing::debug!(error = %e, "pausing output stream");
        }
        drop(stream);
        tracing::info!(
            device = %self.device,
            underruns = self.underruns(),
            "output stream closed"
        );
        Ok(())
    }
}

impl Drop for CpalSink {
    fn drop(&mut self) {
        if self.stream.is_some() {
            let _ = self.close();
        }
    }
}

impl std::fmt::Debug for CpalSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CpalSink")
            .field("device", &self.device)
            .field("open", &self.stream.is_some())
            .finish_non_exhaustive()
    }
}

/// Input-device source for the capture loop.
pub struct CpalSource {
    _stream: cpal::Stream,
    chunks: Receiver<Vec<f32>>,
    pending: Vec<f32>,
    position: usize,
    sample_rate: u32,
    failed: Arc<AtomicBool>,
    dropped: Arc<AtomicU64>,
    device: String,
}

impl CpalSource {
    /// Open an input device and start capturing.
    pub fn open(device: Option<&str>, sample_rate: u32) -> Result<Self> {
        let host = cpal::default_host();
        let device = find_device(&host, device, true)?;
        let name = device_name(&device).unwrap_or_else(|| "unknown".to_string());
        let channels = device
            .default_input_config()
            .map_err(|e| Error::Stream(e.to_string()))?
            .channels()
            .max(1);

        let (tx, rx) = bounded::<Vec<f32>>(INPUT_QUEUE_CHUNKS);
        let failed = Arc::new(AtomicBool::new(false));
        let dropped = Arc::new(AtomicU64::new(0));
        let callback_dropped = Arc::clone(&dropped);
        let error_flag = Arc::clone(&failed);
        let width = usize::from(channels);

        let stream = device
            .build_input_stream(
                &stream_config(channels, sample_rate),
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    let mono: Vec<f32> = data
                        .chunks(width)
                        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
                        .collect();
                    if tx.try_send(mono).is_err() {
                        callback_dropped.fetch_add(1, Ordering::Relaxed);
                    }
                },
                move |err| {
                    tracing::error!(error = %err, "input stream error");
                    error_flag.store(true, Ordering::Release);
                },
                None,
            )
            .map_err(|e| Error::Stream(e.to_string()))?;

        stream.play().map_err(|e| Error::Stream(e.to_string()))?;
        tracing::info!(device = %name, channels, sample_rate, "input stream started");

        Ok(Self {
            _stream: stream,
            chunks: rx,
            pending: Vec::new(),
            position: 0,
            sample_rate,
            failed,
            dropped,
            device: name,
        })
    }

    /// Name of the opened device.
    pub fn device_name(&self) -> &str {
        &self.device
    }

    /// Input chunks lost because the capture thread fell behind.
    pub fn dropped_chunks(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl CaptureSource for CpalSource {
    fn read_block(&mut self, frame: &mut [f32]) -> Result<usize> {
        let mut filled = 0;
        while filled < frame.len() {
            if self.position >= self.pending.len() {
                if self.failed.load(Ordering::Acquire) {
                    return Err(Error::Stream("audio device unavailable".to_string()));
                }
                self.pending = match self.chunks.recv_timeout(READ_TIMEOUT) {
                    Ok(chunk) => chunk,
                    Err(RecvTimeoutError::Timeout) => {
                        return Err(Error::Stream("no input received from device".to_string()));
                    }
                    Err(RecvTimeoutError::Disconnected) => return Err(Error::SinkClosed),
                };
                self.position = 0;
            }
            let n = (self.pending.len() - self.position).min(frame.len() - filled);
            frame[filled..filled + n]
                .copy_from_slice(&self.pending[self.position..self.position + n]);
            filled += n;
            self.position += n;
        }
        Ok(filled)
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

impl std::fmt::Debug for CpalSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CpalSource")
            .field("device", &self.device)
            .field("sample_rate", &self.sample_rate)
            .finish_non_exhaustive()
    }
}
