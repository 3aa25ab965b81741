//! WAV file reading and writing.
//!
//! Everything the engine writes is 16-bit signed mono. Reading accepts any
//! integer or float WAV and mixes multi-channel files down to mono.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use hound::{SampleFormat, WavReader, WavWriter};
use timbral_core::sample_to_i16;

use crate::Result;

/// WAV metadata read without loading sample data.
#[derive(Debug, Clone)]
pub struct WavInfo {
    /// Number of audio channels.
    pub channels: u16,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Bit depth per sample.
    pub bits_per_sample: u16,
    /// Sample frames per channel.
    pub num_frames: u64,
    /// Duration in seconds.
    pub duration_secs: f64,
}

/// Read WAV metadata.
pub fn read_wav_info<P: AsRef<Path>>(path: P) -> Result<WavInfo> {
    let reader = WavReader::open(path)?;
    let spec = reader.spec();
    let num_frames = u64::from(reader.len()) / u64::from(spec.channels.max(1));
    Ok(WavInfo {
        channels: spec.channels,
        sample_rate: spec.sample_rate,
        bits_per_sample: spec.bits_per_sample,
        num_frames,
        duration_secs: num_frames as f64 / f64::from(spec.sample_rate),
    })
}

/// Read a WAV file as mono f32 samples plus its sample rate.
///
/// Integer samples are normalized by `2^(bits−1)`; channels are averaged.
pub fn read_wav<P: AsRef<Path>>(path: P) -> Result<(Vec<f32>, u32)> {
    let reader = WavReader::open(path)?;
    let spec = reader.spec();
    let channels = usize::from(spec.channels.max(1));

    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<std::result::Result<Vec<_>, _>>()?,
        SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<std::result::Result<Vec<_>, _>>()?
        }
    };

    let mono = if channels > 1 {
        interleaved
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect()
    } else {
        interleaved
    };

    tracing::debug!(
        samples = mono.len(),
        sample_rate = spec.sample_rate,
        channels,
        "WAV loaded"
    );
    Ok((mono, spec.sample_rate))
}

/// Write mono samples as a 16-bit WAV file.
pub fn write_wav<P: AsRef<Path>>(path: P, samples: &[f32], sample_rate: u32) -> Result<()> {
    let mut recorder = WavRecorder::create(path, sample_rate)?;
    recorder.write_samples(samples)?;
    recorder.finalize()
}

fn pcm16_mono(sample_rate: u32) -> hound::WavSpec {
    hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    }
}

/// Streaming 16-bit mono WAV writer.
///
/// Used for offline renders and for teeing live capture to disk. The
/// header is fixed up by [`finalize`](Self::finalize); after that, further
/// writes are ignored.
pub struct WavRecorder {
    writer: Option<WavWriter<BufWriter<File>>>,
    written: u64,
}

impl WavRecorder {
    /// Create (or truncate) `path` for recording.
    pub fn create<P: AsRef<Path>>(path: P, sample_rate: u32) -> Result<Self> {
        let writer = WavWriter::create(path.as_ref(), pcm16_mono(sample_rate))?;
        tracing::debug!(path = %path.as_ref().display(), sample_rate, "WAV recorder opened");
        Ok(Self {
            writer: Some(writer),
            written: 0,
        })
    }

    /// Append float samples, saturating outside [−1, 1].
    pub fn write_samples(&mut self, samples: &[f32]) -> Result<()> {
        if let Some(writer) = self.writer.as_mut() {
            for &sample in samples {
                writer.write_sample(sample_to_i16(sample))?;
            }
            self.written += samples.len() as u64;
        }
        Ok(())
    }

    /// Append already-quantized samples.
    pub fn write_i16(&mut self, samples: impl IntoIterator<Item = i16>) -> Result<()> {
        if let Some(writer) = self.writer.as_mut() {
            for sample in samples {
                writer.write_sample(sample)?;
                self.written += 1;
            }
        }
        Ok(())
    }

    /// Samples written so far.
    pub fn samples_written(&self) -> u64 {
        self.written
    }

    /// Whether [`finalize`](Self::finalize) has not run yet.
    pub fn is_open(&self) -> bool {
        self.writer.is_some()
    }

    /// Flush and fix up the WAV header. Safe to call more than once.
    pub fn finalize(&mut self) -> Result<()> {
        if let Some(writer) = self.writer.take() {
            writer.finalize()?;
            tracing::debug!(samples = self.written, "WAV recorder finalized");
        }
        Ok(())
    }
}

impl std::fmt::Debug for WavRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WavRecorder")
            .field("open", &self.is_open())
            .field("written", &self.written)
            .finish()
    }
}
