//! Naive waveform functions.
//!
//! The oscillator owns no state: the caller keeps a phase accumulator in
//! [0, 1), advances it by `frequency / sample_rate` per sample and wraps it.
//! Waveforms are evaluated exactly, without band-limiting, so aliasing is
//! part of the sound.

use core::f32::consts::{FRAC_2_PI, TAU};
use libm::{asinf, sinf};

/// Oscillator waveform types.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Waveform {
    /// `sin(2π·phase)`
    #[default]
    Sine,
    /// Sign of the sine, ±1 with a zero at the crossings.
    Square,
    /// `(2/π)·asin(sin(2π·phase))`, a linear triangle peaking at phase 0.25.
    Triangle,
    /// `2·phase − 1`, ramping from −1 up to 1 over one period.
    Sawtooth,
}

impl Waveform {
    /// Every waveform, in display order.
    pub const ALL: [Waveform; 4] = [
        Waveform::Sine,
        Waveform::Square,
        Waveform::Triangle,
        Waveform::Sawtooth,
    ];

    /// Evaluate the waveform at `phase` (expected in [0, 1)).
    ///
    /// # Example
    ///
    /// ```rust
    /// use timbral_synth::Waveform;
    ///
    /// assert_eq!(Waveform::Sawtooth.sample(0.0), -1.0);
    /// assert!((Waveform::Sine.sample(0.25) - 1.0).abs() < 1e-6);
    /// ```
    #[inline]
    pub fn sample(self, phase: f32) -> f32 {
        match self {
            Waveform::Sine => sinf(TAU * phase),
            Waveform::Square => sign(sinf(TAU * phase)),
            Waveform::Triangle => FRAC_2_PI * asinf(sinf(TAU * phase)),
            Waveform::Sawtooth => 2.0 * phase - 1.0,
        }
    }

    /// Lowercase name used in configs and control commands.
    pub fn name(self) -> &'static str {
        match self {
            Waveform::Sine => "sine",
            Waveform::Square => "square",
            Waveform::Triangle => "triangle",
            Waveform::Sawtooth => "sawtooth",
        }
    }

    /// Look up a waveform by name, case-insensitively.
    ///
    /// Accepts the full names plus the short forms `sin`, `sq`, `tri` and
    /// `saw`. Unknown names yield `None`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "sine" | "sin" => Some(Waveform::Sine),
            "square" | "sq" => Some(Waveform::Square),
            "triangle" | "tri" => Some(Waveform::Triangle),
            "sawtooth" | "saw" => Some(Waveform::Sawtooth),
            _ => None,
        }
    }
}

impl core::fmt::Display for Waveform {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// Sign function with `sign(0) = 0`.
///
/// `f32::signum` maps zero to one, which would put a DC step into square
/// waves at exact zero crossings.
#[inline]
pub fn sign(x: f32) -> f32 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}
