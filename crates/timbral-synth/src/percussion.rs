//! Closed-form drum voices.
//!
//! Each strike creates a fresh [`DrumVoice`] with a fixed lifetime. Once the
//! elapsed time passes the kind's duration the voice reports inactive,
//! outputs silence and is dropped by the [`DrumKit`]. Voices are never
//! retriggered.
//!
//! | Kind | Duration | Envelope | Signal |
//! |------|----------|----------|--------|
//! | Kick | 150 ms | `(1−t/T)²` | sine swept at `150·e^(−35t)` Hz |
//! | Snare | 150 ms | `(1−t/T)³` | `0.4·sin(180 Hz) + 0.6·noise` |
//! | HiHat | 50 ms | `(1−t/T)²` | first difference of noise |
//! | Cymbal | 1.5 s | `(1−t/T)²` | mean of six inharmonic squares, ×0.5 |

use core::f32::consts::TAU;

use libm::{expf, sinf};
use timbral_core::NoiseSource;

use crate::oscillator::sign;

/// Partials of the cymbal, in Hz. The ratios are deliberately inharmonic.
pub const CYMBAL_PARTIALS: [f32; 6] = [220.5, 340.1, 410.3, 550.6, 680.8, 815.2];

/// Length of the noise burst behind snare and hi-hat, in seconds.
pub const NOISE_SECONDS: f32 = 0.2;

/// Drum sounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DrumKind {
    /// Bass drum.
    Kick,
    /// Snare drum.
    Snare,
    /// Closed hi-hat.
    HiHat,
    /// Crash cymbal.
    Cymbal,
}

impl DrumKind {
    /// Every drum kind.
    pub const ALL: [DrumKind; 4] = [
        DrumKind::Kick,
        DrumKind::Snare,
        DrumKind::HiHat,
        DrumKind::Cymbal,
    ];

    /// Lifetime of one strike in seconds.
    pub fn duration(self) -> f32 {
        match self {
            DrumKind::Kick | DrumKind::Snare => 0.15,
            DrumKind::HiHat => 0.05,
            DrumKind::Cymbal => 1.5,
        }
    }

    /// Lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            DrumKind::Kick => "kick",
            DrumKind::Snare => "snare",
            DrumKind::HiHat => "hihat",
            DrumKind::Cymbal => "cymbal",
        }
    }

    /// Parse a drum name, case-insensitively. `hat` and `crash` are accepted
    /// as aliases.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "kick" | "bass" => Some(DrumKind::Kick),
            "snare" => Some(DrumKind::Snare),
            "hihat" | "hi-hat" | "hat" => Some(DrumKind::HiHat),
            "cymbal" | "crash" => Some(DrumKind::Cymbal),
            _ => None,
        }
    }
}

/// A single drum strike.
#[derive(Debug, Clone)]
pub struct DrumVoice {
    kind: DrumKind,
    elapsed: u32,
    sample_rate: f32,
    active: bool,
    noise: Vec<f32>,
    partial_phases: [f32; 6],
}

impl DrumVoice {
    /// Strike a drum. Snare and hi-hat pre-render a noise burst from
    /// `noise`; the other kinds leave it untouched.
    pub fn new(kind: DrumKind, sample_rate: f32, noise: &mut NoiseSource) -> Self {
        let noise = match kind {
            DrumKind::Snare | DrumKind::HiHat => {
                let len = (sample_rate * NOISE_SECONDS) as usize;
                (0..len).map(|_| noise.next_bipolar()).collect()
            }
            DrumKind::Kick | DrumKind::Cymbal => Vec::new(),
        };

        Self {
            kind,
            elapsed: 0,
            sample_rate,
            active: true,
            noise,
            partial_phases: [0.0; 6],
        }
    }

    /// Kind of drum.
    pub fn kind(&self) -> DrumKind {
        self.kind
    }

    /// Whether the strike is still sounding.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Seconds since the strike.
    pub fn position(&self) -> f32 {
        self.elapsed as f32 / self.sample_rate
    }

    /// Produce one sample.
    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        if !self.active {
            return 0.0;
        }

        let t = self.position();
        let duration = self.kind.duration();
        if t > duration {
            self.active = false;
            return 0.0;
        }

        let fall = 1.0 - t / duration;
        let i = self.elapsed as usize;
        let (signal, envelope) = match self.kind {
            DrumKind::Kick => {
                let pitch = 150.0 * expf(-35.0 * t);
                (sinf(TAU * t * pitch), fall * fall)
            }
            DrumKind::Snare => {
                let tone = sinf(TAU * 180.0 * t);
                let noise = self.noise.get(i).copied().unwrap_or(0.0);
                (0.4 * tone + 0.6 * noise, fall * fall * fall)
            }
            DrumKind::HiHat => {
                let current = self.noise.get(i).copied().unwrap_or(0.0);
                let previous = i
                    .checked_sub(1)
                    .and_then(|p| self.noise.get(p).copied())
                    .unwrap_or(0.0);
                (current - previous, fall * fall)
            }
            DrumKind::Cymbal => {
                let mut sum = 0.0;
                for (phase, freq) in self.partial_phases.iter_mut().zip(CYMBAL_PARTIALS) {
                    sum += sign(sinf(TAU * *phase));
                    *phase += freq / self.sample_rate;
                    if *phase > 1.0 {
                        *phase -= 1.0;
                    }
                }
                (sum / CYMBAL_PARTIALS.len() as f32 * 0.5, fall * fall)
            }
        };

        self.elapsed += 1;
        signal * envelope
    }
}

/// The set of sounding drum strikes.
///
/// # Example
///
/// ```rust
/// use timbral_synth::{DrumKind, DrumKit};
///
/// let mut kit = DrumKit::new(96000.0);
/// kit.trigger(DrumKind::Kick);
/// kit.trigger(DrumKind::HiHat);
/// assert_eq!(kit.active_count(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct DrumKit {
    voices: Vec<DrumVoice>,
    noise: NoiseSource,
    sample_rate: f32,
}

impl DrumKit {
    /// Most strikes sounding at once. Reserved up front; a strike beyond
    /// it replaces the oldest one, so the kit never grows.
    pub const CAPACITY: usize = 32;

    /// Create an empty kit.
    pub fn new(sample_rate: f32) -> Self {
        Self::with_noise(sample_rate, NoiseSource::new(0x0d2d_1e55))
    }

    /// Create an empty kit drawing noise from `noise`.
    pub fn with_noise(sample_rate: f32, noise: NoiseSource) -> Self {
        Self {
            voices: Vec::with_capacity(Self::CAPACITY),
            noise,
            sample_rate,
        }
    }

    /// Start a new strike of `kind`, replacing the oldest strike when the
    /// kit is full.
    pub fn trigger(&mut self, kind: DrumKind) {
        if self.voices.len() >= Self::CAPACITY {
            self.voices.remove(0);
        }
        self.voices
            .push(DrumVoice::new(kind, self.sample_rate, &mut self.noise));
    }

    /// Number of sounding strikes.
    pub fn active_count(&self) -> usize {
        self.voices.len()
    }

    /// Stop every strike.
    pub fn reset(&mut self) {
        self.voices.clear();
    }

    /// Sum one sample from every strike and drop the ones that finished.
    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        let mut sum = 0.0;
        self.voices.retain_mut(|voice| {
            sum += voice.next_sample();
            voice.is_active()
        });
        sum
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 96000.0;

    fn strike(kind: DrumKind) -> DrumVoice {
        DrumVoice::new(kind, SR, &mut NoiseSource::new(42))
    }

    #[test]
    fn test_kit_strikes_capped() {
        let mut kit = DrumKit::new(SR);
        let reserved = kit.voices.capacity();
        for _ in 0..DrumKit::CAPACITY * 4 {
            kit.trigger(DrumKind::Cymbal);
            kit.next_sample();
        }
        assert_eq!(kit.active_count(), DrumKit::CAPACITY);
        assert_eq!(kit.voices.capacity(), reserved, "kit reallocated");

        // The survivors are the newest strikes
        let oldest = kit.voices[0].position();
        assert!(
            oldest < (DrumKit::CAPACITY as f32 + 1.0) / SR,
            "oldest strike is {} s old",
            oldest
        );
    }

    #[test]
    fn test_kick_silent_after_duration() {
        let mut kick = strike(DrumKind::Kick);
        let mut samples = 0usize;
        while kick.is_active() {
            let t = kick.position();
            let y = kick.next_sample();
            if t > 0.15 {
                assert_eq!(y, 0.0, "kick sounded at t = {}", t);
            }
            samples += 1;
        }
        // 0.15 s inclusive, then one sample to observe the end
        assert_eq!(samples, (0.15 * SR) as usize + 2);
        assert_eq!(kick.next_sample(), 0.0);
    }

    #[test]
    fn test_kick_starts_at_zero_crossing() {
        let mut kick = strike(DrumKind::Kick);
        assert_eq!(kick.next_sample(), 0.0);
        let peak = (0..2000).map(|_| kick.next_sample().abs()).fold(0.0, f32::max);
        assert!(peak > 0.5, "kick too quiet: {}", peak);
    }

    #[test]
    fn test_snare_mixes_tone_and_noise() {
        let mut noise = NoiseSource::new(42);
        let mut snare = DrumVoice::new(DrumKind::Snare, SR, &mut noise);
        let first_noise = snare.noise[0];
        // t = 0: tone is sin(0) and envelope is 1
        let y = snare.next_sample();
        assert!((y - 0.6 * first_noise).abs() < 1e-6);
        assert_eq!(snare.noise.len(), (0.2 * SR) as usize);
    }

    #[test]
    fn test_hihat_first_difference() {
        let mut hat = strike(DrumKind::HiHat);
        let n0 = hat.noise[0];
        let n1 = hat.noise[1];
        assert!((hat.next_sample() - n0).abs() < 1e-6);
        let fall = 1.0 - (1.0 / SR) / 0.05;
        let expected = (n1 - n0) * fall * fall;
        assert!((hat.next_sample() - expected).abs() < 1e-5);
    }

    #[test]
    fn test_cymbal_sustains_until_duration() {
        let mut cymbal = strike(DrumKind::Cymbal);
        let end = (1.5 * SR) as usize;
        let mut last_window_energy = 0.0;
        for n in 0..=end {
            assert!(cymbal.is_active(), "cymbal died early at sample {}", n);
            let y = cymbal.next_sample();
            assert!(y.abs() <= 0.5);
            if n > end - 9600 {
                last_window_energy += y.abs();
            }
        }
        assert!(last_window_energy > 0.0, "cymbal silent before 1.5 s");
        cymbal.next_sample();
        assert!(!cymbal.is_active());
    }

    #[test]
    fn test_kit_prunes_finished_voices() {
        let mut kit = DrumKit::new(SR);
        kit.trigger(DrumKind::HiHat);
        kit.trigger(DrumKind::Cymbal);
        for _ in 0..(0.06 * SR) as usize {
            kit.next_sample();
        }
        assert_eq!(kit.active_count(), 1, "hi-hat should be gone");
    }

    #[test]
    fn test_retrigger_creates_new_voice() {
        let mut kit = DrumKit::new(SR);
        kit.trigger(DrumKind::Snare);
        kit.trigger(DrumKind::Snare);
        assert_eq!(kit.active_count(), 2);
    }

    #[test]
    fn test_from_name() {
        for kind in DrumKind::ALL {
            assert_eq!(DrumKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(DrumKind::from_name("Crash"), Some(DrumKind::Cymbal));
        assert_eq!(DrumKind::from_name("tom"), None);
    }
}
