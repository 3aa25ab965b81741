//! Chamberlin state-variable filter.
//!
//! A two-integrator loop that yields lowpass, bandpass and highpass outputs
//! from the same update. The synth voice uses the lowpass tap for tone
//! shaping.
//!
//! # Topology
//!
//! Per sample, with frequency coefficient `f` and damping `q`:
//!
//! ```text
//! low  += f · band
//! high  = x − low − q · band
//! band += f · high
//! ```
//!
//! # Parameter Mapping
//!
//! Cutoff and resonance are normalized fractions in [0, 1]:
//!
//! ```text
//! cutoff_hz = 20000 · c³
//! f         = 2 · sin(π · min(0.25, cutoff_hz / (2 · sample_rate)))
//! q         = 1 − r
//! ```
//!
//! The cubic curve spends most of the control range in the lower octaves.
//! The 0.25 clamp caps `f` at √2 so the integrator loop gain stays bounded
//! when the cutoff approaches the sample rate. The loop is stable while
//! `f² + 2·f·q < 4`; at 48 kHz and above the whole cutoff range satisfies
//! that for every resonance setting.

use core::f32::consts::PI;
use libm::sinf;

/// Highest cutoff reachable at `c = 1.0`, in Hz.
pub const MAX_CUTOFF_HZ: f32 = 20_000.0;

/// Chamberlin state-variable filter with normalized controls.
///
/// ## Parameters
///
/// - `cutoff`: Normalized cutoff fraction (0.0 to 1.0, default 1.0)
/// - `resonance`: Normalized resonance fraction (0.0 to 1.0, default 0.0)
///
/// # Example
///
/// ```rust
/// use timbral_core::ChamberlinSvf;
///
/// let mut svf = ChamberlinSvf::new(96000.0);
/// svf.set_cutoff(0.5);
/// svf.set_resonance(0.2);
///
/// let y = svf.process(1.0);
/// assert!(y.is_finite());
/// ```
#[derive(Debug, Clone)]
pub struct ChamberlinSvf {
    low: f32,
    band: f32,
    high: f32,

    f: f32,
    q: f32,

    sample_rate: f32,
    cutoff: f32,
    resonance: f32,
}

impl Default for ChamberlinSvf {
    fn default() -> Self {
        Self::new(96000.0)
    }
}

impl ChamberlinSvf {
    /// Create a filter with the cutoff fully open and no resonance.
    pub fn new(sample_rate: f32) -> Self {
        let mut svf = Self {
            low: 0.0,
            band: 0.0,
            high: 0.0,
            f: 0.0,
            q: 1.0,
            sample_rate,
            cutoff: 1.0,
            resonance: 0.0,
        };
        svf.update_coefficients();
        svf
    }

    /// Set the normalized cutoff fraction. Values are clamped to [0, 1].
    pub fn set_cutoff(&mut self, cutoff: f32) {
        if cutoff.is_finite() {
            self.cutoff = cutoff.clamp(0.0, 1.0);
            self.update_coefficients();
        }
    }

    /// Normalized cutoff fraction.
    pub fn cutoff(&self) -> f32 {
        self.cutoff
    }

    /// Cutoff in Hz after the cubic mapping.
    pub fn cutoff_hz(&self) -> f32 {
        MAX_CUTOFF_HZ * self.cutoff * self.cutoff * self.cutoff
    }

    /// Set the normalized resonance fraction. Values are clamped to [0, 1].
    pub fn set_resonance(&mut self, resonance: f32) {
        if resonance.is_finite() {
            self.resonance = resonance.clamp(0.0, 1.0);
            self.q = 1.0 - self.resonance;
        }
    }

    /// Normalized resonance fraction.
    pub fn resonance(&self) -> f32 {
        self.resonance
    }

    /// Set the sample rate and recompute the frequency coefficient.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.update_coefficients();
    }

    /// Frequency coefficient `f` currently in use.
    pub fn coefficient(&self) -> f32 {
        self.f
    }

    /// Clear the integrator state.
    pub fn reset(&mut self) {
        self.low = 0.0;
        self.band = 0.0;
        self.high = 0.0;
    }

    /// Filter one sample and return the lowpass output.
    #[inline]
    pub fn process(&mut self, x: f32) -> f32 {
        self.low += self.f * self.band;
        self.high = x - self.low - self.q * self.band;
        self.band += self.f * self.high;
        self.low
    }

    /// Lowpass state after the last [`process`](Self::process) call.
    pub fn low(&self) -> f32 {
        self.low
    }

    /// Bandpass state after the last [`process`](Self::process) call.
    pub fn band(&self) -> f32 {
        self.band
    }

    /// Highpass output of the last [`process`](Self::process) call.
    pub fn high(&self) -> f32 {
        self.high
    }

    fn update_coefficients(&mut self) {
        let normalized = self.cutoff_hz() / (2.0 * self.sample_rate);
        self.f = 2.0 * sinf(PI * normalized.min(0.25));
    }
}
