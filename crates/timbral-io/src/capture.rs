//! Capture and analysis loop.
//!
//! A [`CaptureSource`] delivers frames of mono samples; [`CaptureLoop`]
//! runs each frame through a [`SpectrumAnalyzer`] and publishes the result
//! as an immutable snapshot. Readers on other threads pick up the latest
//! snapshot whenever they refresh.

use std::io::{ErrorKind, Read};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use timbral_analysis::{SnapshotPublisher, SpectrumAnalyzer, SpectrumSnapshot};
use timbral_core::decode_pcm16_le;

use crate::Result;
use crate::wav::{WavRecorder, read_wav};

/// Producer of mono capture frames.
pub trait CaptureSource {
    /// Fill `frame` with the next samples.
    ///
    /// Returns how many samples are real input; the rest of `frame` is
    /// zero-filled. `Ok(0)` means the stream has ended.
    fn read_block(&mut self, frame: &mut [f32]) -> Result<usize>;

    /// Sample rate of the delivered audio.
    fn sample_rate(&self) -> u32;
}

impl<S: CaptureSource + ?Sized> CaptureSource for Box<S> {
    fn read_block(&mut self, frame: &mut [f32]) -> Result<usize> {
        (**self).read_block(frame)
    }

    fn sample_rate(&self) -> u32 {
        (**self).sample_rate()
    }
}

/// Signed 16-bit little-endian mono PCM read from any [`Read`].
#[derive(Debug)]
pub struct Pcm16LeSource<R> {
    reader: R,
    sample_rate: u32,
    bytes: Vec<u8>,
}

impl<R: Read> Pcm16LeSource<R> {
    /// Wrap a byte stream recorded at `sample_rate`.
    pub fn new(reader: R, sample_rate: u32) -> Self {
        Self {
            reader,
            sample_rate,
            bytes: Vec::new(),
        }
    }

    /// Consume the source, returning the reader.
    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: Read> CaptureSource for Pcm16LeSource<R> {
    fn read_block(&mut self, frame: &mut [f32]) -> Result<usize> {
        self.bytes.resize(frame.len() * 2, 0);
        let mut filled = 0;
        while filled < self.bytes.len() {
            match self.reader.read(&mut self.bytes[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }
        let decoded = decode_pcm16_le(&self.bytes[..filled], frame);
        frame[decoded..].fill(0.0);
        Ok(decoded)
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

/// A WAV file loaded into memory and served frame by frame.
#[derive(Debug, Clone)]
pub struct WavSource {
    samples: Vec<f32>,
    sample_rate: u32,
    position: usize,
}

impl WavSource {
    /// Load `path`, mixing multi-channel audio down to mono.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let (samples, sample_rate) = read_wav(path)?;
        Ok(Self::from_samples(samples, sample_rate))
    }

    /// Serve samples already in memory.
    pub fn from_samples(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
            position: 0,
        }
    }

    /// Samples not yet delivered.
    pub fn remaining(&self) -> usize {
        self.samples.len() - self.position
    }
}

impl CaptureSource for WavSource {
    fn read_block(&mut self, frame: &mut [f32]) -> Result<usize> {
        let n = self.remaining().min(frame.len());
        frame[..n].copy_from_slice(&self.samples[self.position..self.position + n]);
        frame[n..].fill(0.0);
        self.position += n;
        Ok(n)
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

/// Reads frames, analyzes them and publishes snapshots.
#[derive(Debug, Default)]
pub struct CaptureLoop {
    recorder: Option<WavRecorder>,
}

impl CaptureLoop {
    /// Create a capture loop without recording.
    pub fn new() -> Self {
        Self::default()
    }

    /// Tee every captured sample into `recorder`.
    #[must_use]
    pub fn with_recorder(mut self, recorder: WavRecorder) -> Self {
        self.recorder = Some(recorder);
        self
    }

    /// Run until the source ends or `running` is cleared.
    ///
    /// Returns the number of frames analyzed.
    pub fn run<S: CaptureSource + ?Sized>(
        &mut self,
        source: &mut S,
        analyzer: &mut SpectrumAnalyzer,
        publisher: &SnapshotPublisher,
        running: &AtomicBool,
    ) -> Result<u64> {
        self.run_with(source, analyzer, publisher, running, |_| {})
    }

    /// Like [`run`](Self::run), calling `on_frame` with each snapshot
    /// before it is published.
    pub fn run_with<S, F>(
        &mut self,
        source: &mut S,
        analyzer: &mut SpectrumAnalyzer,
        publisher: &SnapshotPublisher,
        running: &AtomicBool,
        mut on_frame: F,
    ) -> Result<u64>
    where
        S: CaptureSource + ?Sized,
        F: FnMut(&SpectrumSnapshot),
    {
        tracing::info!(
            fft_size = analyzer.fft_size(),
            sample_rate = source.sample_rate(),
            recording = self.recorder.is_some(),
            "capture loop started"
        );

        let mut frame = vec![0.0f32; analyzer.fft_size()];
        let mut frames = 0u64;
        let outcome = loop {
            if !running.load(Ordering::Acquire) {
                break Ok(());
            }
            let n = match source.read_block(&mut frame) {
                Ok(0) => break Ok(()),
                Ok(n) => n,
                Err(e) => break Err(e),
            };
            if let Some(recorder) = self.recorder.as_mut()
                && let Err(e) = recorder.write_samples(&frame[..n])
            {
                break Err(e);
            }

            let snapshot = analyzer.analyze(&frame);
            on_frame(&snapshot);
            publisher.publish(snapshot);
            frames += 1;
        };

        if let Some(recorder) = self.recorder.as_mut() {
            recorder.finalize()?;
        }
        match outcome {
            Ok(()) => {
                tracing::info!(frames, "capture loop stopped");
                Ok(frames)
            }
            Err(e) => {
                tracing::error!(error = %e, frames, "capture source failed");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_pcm_source_zero_pads_tail() {
        let bytes = [0x00, 0x40, 0x00, 0xC0, 0x00, 0x20];
        let mut source = Pcm16LeSource::new(Cursor::new(bytes), 8000);
        let mut frame = [9.0f32; 4];
        assert_eq!(source.read_block(&mut frame).unwrap(), 3);
        assert_eq!(frame, [0.5, -0.5, 0.25, 0.0]);
        assert_eq!(source.read_block(&mut frame).unwrap(), 0);
    }

    #[test]
    fn test_wav_source_serves_in_frames() {
        let mut source = WavSource::from_samples(vec![0.1; 10], 48000);
        let mut frame = [0.0f32; 4];
        assert_eq!(source.read_block(&mut frame).unwrap(), 4);
        assert_eq!(source.read_block(&mut frame).unwrap(), 4);
        assert_eq!(source.read_block(&mut frame).unwrap(), 2);
        assert_eq!(frame[2..], [0.0, 0.0]);
        assert_eq!(source.read_block(&mut frame).unwrap(), 0);
    }

    #[test]
    fn test_loop_publishes_every_frame() {
        let sr = 96000;
        let tone: Vec<f32> = (0..4096)
            .map(|i| (std::f32::consts::TAU * 4687.5 * i as f32 / sr as f32).sin())
            .collect();
        let mut source = WavSource::from_samples(tone, sr);
        let mut analyzer = SpectrumAnalyzer::new(1024, sr as f32).unwrap();
        let publisher = SnapshotPublisher::new(1024, sr as f32);
        let reader = publisher.reader();
        let running = AtomicBool::new(true);

        let mut peaks = Vec::new();
        let frames = CaptureLoop::new()
            .run_with(&mut source, &mut analyzer, &publisher, &running, |s| {
                peaks.push(s.peak_bin)
            })
            .unwrap();

        assert_eq!(frames, 4);
        assert_eq!(peaks, vec![50; 4]);
        assert_eq!(reader.latest().frame_index, 4);
    }

    #[test]
    fn test_cleared_flag_reads_nothing() {
        let mut source = WavSource::from_samples(vec![0.5; 4096], 48000);
        let mut analyzer = SpectrumAnalyzer::new(256, 48000.0).unwrap();
        let publisher = SnapshotPublisher::new(256, 48000.0);
        let running = AtomicBool::new(false);
        let frames = CaptureLoop::new()
            .run(&mut source, &mut analyzer, &publisher, &running)
            .unwrap();
        assert_eq!(frames, 0);
        assert_eq!(source.remaining(), 4096);
    }
}
