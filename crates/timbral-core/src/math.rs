//! Mathematical utility functions for the mix bus and pitch handling.
//!
//! All functions are allocation-free and suitable for `no_std`.
//!
//! # Waveshaping / Clipping
//!
//! | Function | Character | Use Case |
//! |----------|-----------|----------|
//! | [`soft_clip`] | Smooth, asymptotic | Synth bus saturation |
//! | [`hard_clip`] | Flat tops | Final output limiting |
//! | [`drive`] | Gain-normalized tanh | Guitar-style distortion |

use libm::{powf, tanhf};

/// Soft clip using hyperbolic tangent.
///
/// Smooth saturation that approaches ±1 asymptotically.
///
/// # Arguments
/// * `x` - Input sample (any range)
///
/// # Returns
/// Soft-clipped output in range (-1, 1)
#[inline]
pub fn soft_clip(x: f32) -> f32 {
    tanhf(x)
}

/// Hard clip to ±threshold range.
///
/// NaN input maps to 0 so a bad sample can never reach the PCM encoder.
///
/// # Arguments
/// * `x` - Input sample
/// * `threshold` - Clipping threshold
///
/// # Returns
/// Hard-clipped output in range [-threshold, threshold]
///
/// # Example
/// ```rust
/// use timbral_core::hard_clip;
///
/// assert_eq!(hard_clip(3.5, 1.0), 1.0);
/// assert_eq!(hard_clip(-0.25, 1.0), -0.25);
/// ```
#[inline]
pub fn hard_clip(x: f32, threshold: f32) -> f32 {
    if x.is_nan() {
        return 0.0;
    }
    x.clamp(-threshold, threshold)
}

/// Gain-normalized tanh distortion.
///
/// Computes `tanh(g·x) / tanh(g)` with `g = 1 + 5·level`, so a full-scale
/// input still maps to full scale while lower levels are pushed up into
/// saturation. A `level` of zero or below bypasses the stage entirely.
///
/// # Arguments
/// * `x` - Input sample
/// * `level` - Distortion amount, 0.0 to 1.0
///
/// # Example
/// ```rust
/// use timbral_core::drive;
///
/// assert_eq!(drive(0.3, 0.0), 0.3);
/// assert!((drive(1.0, 0.5) - 1.0).abs() < 1e-5);
/// assert!(drive(0.2, 1.0) > 0.2);
/// ```
#[inline]
pub fn drive(x: f32, level: f32) -> f32 {
    if level <= 0.0 {
        return x;
    }
    let gain = 1.0 + 5.0 * level;
    tanhf(x * gain) / tanhf(gain)
}

/// Convert a semitone offset to a frequency ratio.
///
/// 12 semitones = one octave = ratio 2.0.
#[inline]
pub fn semitones_to_ratio(semitones: f32) -> f32 {
    powf(2.0, semitones / 12.0)
}
