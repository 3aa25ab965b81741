//! Audio I/O layer for timbral.
//!
//! This crate connects the synthesis engine and the spectrum analyzer to the
//! outside world:
//!
//! - **Render path**: [`RenderLoop`] drains control events at block
//!   boundaries, renders the engine and writes 16-bit big-endian PCM blocks
//!   into a [`PcmSink`] ([`CpalSink`], [`WavSink`], [`NullSink`], [`VecSink`])
//! - **Capture path**: [`CaptureLoop`] reads frames from a [`CaptureSource`]
//!   ([`CpalSource`], [`WavSource`], [`Pcm16LeSource`]), analyzes them and
//!   publishes immutable spectrum snapshots
//! - **WAV files**: [`read_wav`], [`write_wav`] and the streaming
//!   [`WavRecorder`]
//! - **Devices**: [`list_devices`] and [`default_device`]
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::atomic::AtomicBool;
//! use timbral_io::{RenderLoop, WavSink};
//! use timbral_synth::{Engine, control_channel};
//!
//! let mut engine = Engine::new(48000.0);
//! let (controller, queue) = control_channel(64);
//! controller.note_on(1, 440.0);
//!
//! let mut sink = WavSink::create("tone.wav", 48000)?;
//! let running = AtomicBool::new(true);
//! // Runs until `running` is cleared by another thread.
//! RenderLoop::new(512).run(&mut engine, &queue, &mut sink, &running)?;
//! # Ok::<(), timbral_io::Error>(())
//! ```

mod capture;
mod cpal_backend;
mod device;
mod render;
mod sink;
mod wav;

pub use capture::{CaptureLoop, CaptureSource, Pcm16LeSource, WavSource};
pub use cpal_backend::{CpalSink, CpalSource};
pub use device::{AudioDevice, default_device, list_devices};
pub use render::{DEFAULT_BLOCK_SIZE, RenderLoop, render_offline, render_to_sink};
pub use sink::{NullSink, PcmSink, VecSink, WavSink, decode_pcm16_be};
pub use wav::{WavInfo, WavRecorder, read_wav, read_wav_info, write_wav};

/// Error types for audio I/O operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// WAV file read/write error.
    #[error("WAV file error: {0}")]
    Wav(#[from] hound::Error),

    /// Audio stream setup or runtime error.
    #[error("Audio stream error: {0}")]
    Stream(String),

    /// No audio device available on the system.
    #[error("No audio device available")]
    NoDevice,

    /// The requested audio device was not found.
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    /// The device does not accept the requested format.
    #[error("Unsupported sample format: {0}")]
    UnsupportedFormat(String),

    /// Standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The sink was closed or its consumer went away.
    #[error("Audio sink closed")]
    SinkClosed,
}

/// Convenience result type for audio I/O operations.
pub type Result<T> = std::result::Result<T, Error>;
