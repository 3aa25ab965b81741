//! Timbral Analysis - Spectral analysis for live and recorded audio
//!
//! - [`fft`] - In-place radix-2 Cooley-Tukey FFT and magnitude spectrum
//! - [`spectrum`] - Frame analyzer with exponential smoothing and peak search
//! - [`snapshot`] - Immutable spectrum snapshots published without locks
//!
//! ## Example
//!
//! ```rust
//! use timbral_analysis::{SnapshotPublisher, SpectrumAnalyzer};
//!
//! let mut analyzer = SpectrumAnalyzer::new(1024, 96000.0)?;
//! let publisher = SnapshotPublisher::new(1024, 96000.0);
//! let reader = publisher.reader();
//!
//! // Capture thread
//! let frame: Vec<f32> = (0..1024)
//!     .map(|n| (std::f32::consts::TAU * 4687.5 * n as f32 / 96000.0).sin())
//!     .collect();
//! publisher.publish(analyzer.analyze(&frame));
//!
//! // Display thread
//! let latest = reader.latest();
//! assert_eq!(latest.peak_bin, 50);
//! # Ok::<(), timbral_analysis::AnalysisError>(())
//! ```

pub mod fft;
pub mod snapshot;
pub mod spectrum;

pub use fft::Fft;
pub use snapshot::{SnapshotPublisher, SnapshotReader, SpectrumSnapshot};
pub use spectrum::{DEFAULT_FFT_SIZE, DEFAULT_SMOOTHING, SpectrumAnalyzer};

/// Error types for spectral analysis setup.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnalysisError {
    /// The transform size is not a power of two.
    #[error("FFT size must be a power of two, got {0}")]
    NotPowerOfTwo(usize),

    /// The transform size is below the minimum the caller needs.
    #[error("FFT size {size} is too small, minimum is {min}")]
    TooSmall {
        /// Requested size.
        size: usize,
        /// Smallest accepted size.
        min: usize,
    },
}

/// Convenience result type for analysis setup.
pub type Result<T> = std::result::Result<T, AnalysisError>;
