//! Frame-by-frame spectrum analysis.
//!
//! [`SpectrumAnalyzer`] turns one frame of N samples into:
//!
//! - the raw magnitude spectrum, N/2 bins,
//! - an exponentially smoothed copy for display,
//!   `smoothed[k] = s·smoothed[k] + (1−s)·raw[k]`,
//! - the peak bin `k*` over bins `2..N/2`, skipping DC and bin 1,
//! - the dominant frequency `k* · sample_rate / N`.

use timbral_core::decode_pcm16_le;

use crate::fft::Fft;
use crate::snapshot::SpectrumSnapshot;
use crate::{AnalysisError, Result};

/// Reference transform size.
pub const DEFAULT_FFT_SIZE: usize = 1024;

/// Weight of the previous smoothed value.
pub const DEFAULT_SMOOTHING: f64 = 0.8;

/// First bin considered by the peak search.
const FIRST_PEAK_BIN: usize = 2;

/// Smallest FFT size that leaves a bin to search.
const MIN_FFT_SIZE: usize = 8;

/// Analyzer state carried across frames.
#[derive(Debug, Clone)]
pub struct SpectrumAnalyzer {
    fft: Fft,
    sample_rate: f32,
    smoothing: f64,
    frame: Vec<f32>,
    raw: Vec<f64>,
    smoothed: Vec<f64>,
    peak_bin: usize,
    frames: u64,
}

impl SpectrumAnalyzer {
    /// Create an analyzer for frames of `fft_size` samples.
    pub fn new(fft_size: usize, sample_rate: f32) -> Result<Self> {
        let fft = Fft::new(fft_size)?;
        if fft_size < MIN_FFT_SIZE {
            return Err(AnalysisError::TooSmall {
                size: fft_size,
                min: MIN_FFT_SIZE,
            });
        }
        tracing::debug!(fft_size, sample_rate, "spectrum analyzer created");
        Ok(Self {
            fft,
            sample_rate,
            smoothing: DEFAULT_SMOOTHING,
            frame: vec![0.0; fft_size],
            raw: vec![0.0; fft_size / 2],
            smoothed: vec![0.0; fft_size / 2],
            peak_bin: FIRST_PEAK_BIN,
            frames: 0,
        })
    }

    /// Set the smoothing weight of the previous frame, clamped to [0, 1).
    #[must_use]
    pub fn with_smoothing(mut self, smoothing: f64) -> Self {
        self.set_smoothing(smoothing);
        self
    }

    /// Set the smoothing weight of the previous frame, clamped to [0, 1).
    pub fn set_smoothing(&mut self, smoothing: f64) {
        if smoothing.is_finite() {
            self.smoothing = smoothing.clamp(0.0, 0.999);
        }
    }

    /// Smoothing weight.
    pub fn smoothing(&self) -> f64 {
        self.smoothing
    }

    /// Frame length N.
    pub fn fft_size(&self) -> usize {
        self.fft.size()
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Width of one bin in Hz.
    pub fn bin_width(&self) -> f32 {
        self.sample_rate / self.fft.size() as f32
    }

    /// Center frequency of bin `k`.
    pub fn bin_frequency(&self, k: usize) -> f32 {
        k as f32 * self.bin_width()
    }

    /// Analyze one frame of samples in [−1, 1].
    ///
    /// Frames shorter than N are zero-padded; longer ones are truncated.
    /// Returns the raw magnitudes.
    pub fn process(&mut self, samples: &[f32]) -> &[f64] {
        let copied = samples.len().min(self.frame.len());
        self.frame[..copied].copy_from_slice(&samples[..copied]);
        self.frame[copied..].fill(0.0);
        self.run_frame()
    }

    /// Analyze one frame of signed 16-bit little-endian PCM.
    ///
    /// Samples are normalized as `s / 32768`. A trailing odd byte is
    /// ignored; a short frame is zero-padded.
    pub fn process_pcm16_le(&mut self, bytes: &[u8]) -> &[f64] {
        let decoded = decode_pcm16_le(bytes, &mut self.frame);
        self.frame[decoded..].fill(0.0);
        self.run_frame()
    }

    /// Analyze a frame and package the result as an immutable snapshot.
    pub fn analyze(&mut self, samples: &[f32]) -> SpectrumSnapshot {
        self.process(samples);
        self.snapshot()
    }

    /// Snapshot of the most recent frame.
    pub fn snapshot(&self) -> SpectrumSnapshot {
        SpectrumSnapshot {
            frame_index: self.frames,
            sample_rate: self.sample_rate,
            fft_size: self.fft.size(),
            samples: self.frame.clone(),
            magnitudes: self.raw.clone(),
            smoothed: self.smoothed.clone(),
            peak_bin: self.peak_bin,
            peak_magnitude: self.raw[self.peak_bin],
            dominant_frequency: self.dominant_frequency(),
        }
    }

    /// Raw magnitudes of the last frame.
    pub fn magnitudes(&self) -> &[f64] {
        &self.raw
    }

    /// Smoothed magnitudes.
    pub fn smoothed(&self) -> &[f64] {
        &self.smoothed
    }

    /// Peak bin of the last frame.
    pub fn peak_bin(&self) -> usize {
        self.peak_bin
    }

    /// Dominant frequency of the last frame in Hz.
    pub fn dominant_frequency(&self) -> f32 {
        self.bin_frequency(self.peak_bin)
    }

    /// Frames analyzed so far.
    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    /// Clear smoothing history and counters.
    pub fn reset(&mut self) {
        self.smoothed.fill(0.0);
        self.raw.fill(0.0);
        self.frame.fill(0.0);
        self.peak_bin = FIRST_PEAK_BIN;
        self.frames = 0;
    }

    fn run_frame(&mut self) -> &[f64] {
        self.fft.magnitudes(&self.frame, &mut self.raw);

        let s = self.smoothing;
        for (smooth, &raw) in self.smoothed.iter_mut().zip(&self.raw) {
            *smooth = s * *smooth + (1.0 - s) * raw;
        }

        self.peak_bin = peak_bin(&self.raw);
        self.frames += 1;
        &self.raw
    }
}

/// Index of the largest magnitude in `2..len`, first one on ties.
fn peak_bin(magnitudes: &[f64]) -> usize {
    let mut best = FIRST_PEAK_BIN;
    for k in FIRST_PEAK_BIN + 1..magnitudes.len() {
        if magnitudes[k] > magnitudes[best] {
            best = k;
        }
    }
    best
}
