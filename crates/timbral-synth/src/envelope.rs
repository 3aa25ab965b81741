//! Linear ADSR envelope generator.
//!
//! Timing is counted in samples, so an envelope driven at a fixed sample
//! rate is fully deterministic. Every stage is a straight-line ramp:
//!
//! ```text
//!  1.0 ┤   /\
//!      │  /  \______ sustain
//!      │ /          \
//!  0.0 ┼/            \____
//!       A   D    S    R
//! ```

/// ADSR envelope states
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EnvelopeState {
    /// Envelope is inactive; output is zero.
    #[default]
    Inactive,
    /// Attack phase; output ramps from 0 to 1.
    Attack,
    /// Decay phase; output ramps from 1 down to the sustain level.
    Decay,
    /// Sustain phase; output holds at the sustain level while the key is held.
    Sustain,
    /// Release phase; output ramps from the release-start level to 0.
    Release,
}

/// Linear ADSR envelope.
///
/// ## Parameters
///
/// - `attack`: Attack time in seconds (≥ 0, default 0.01)
/// - `decay`: Decay time in seconds (≥ 0, default 0.1)
/// - `sustain`: Sustain level (0.0 to 1.0, default 0.7)
/// - `release`: Release time in seconds (≥ 0, default 0.3)
///
/// A stage time of zero skips the stage on the next
/// [`advance`](Self::advance).
///
/// # Example
///
/// ```rust
/// use timbral_synth::{AdsrEnvelope, EnvelopeState};
///
/// let mut env = AdsrEnvelope::new(96000.0);
/// env.set_attack(0.005);
/// env.press();
///
/// for _ in 0..1000 {
///     let level = env.advance();
///     assert!((0.0..=1.0).contains(&level));
/// }
///
/// env.release();
/// assert_eq!(env.state(), EnvelopeState::Release);
/// ```
#[derive(Debug, Clone)]
pub struct AdsrEnvelope {
    state: EnvelopeState,
    amplitude: f32,
    release_start: f32,
    samples_in_state: u32,
    sample_rate: f32,

    attack: f32,
    decay: f32,
    sustain: f32,
    release: f32,
}

impl Default for AdsrEnvelope {
    fn default() -> Self {
        Self::new(96000.0)
    }
}

impl AdsrEnvelope {
    /// Create an inactive envelope with default times.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            state: EnvelopeState::Inactive,
            amplitude: 0.0,
            release_start: 0.0,
            samples_in_state: 0,
            sample_rate,
            attack: 0.01,
            decay: 0.1,
            sustain: 0.7,
            release: 0.3,
        }
    }

    /// Set attack time in seconds. Negative values count as zero.
    pub fn set_attack(&mut self, seconds: f32) {
        if seconds.is_finite() {
            self.attack = seconds.max(0.0);
        }
    }

    /// Attack time in seconds.
    pub fn attack(&self) -> f32 {
        self.attack
    }

    /// Set decay time in seconds. Negative values count as zero.
    pub fn set_decay(&mut self, seconds: f32) {
        if seconds.is_finite() {
            self.decay = seconds.max(0.0);
        }
    }

    /// Decay time in seconds.
    pub fn decay(&self) -> f32 {
        self.decay
    }

    /// Set sustain level (0.0 to 1.0).
    pub fn set_sustain(&mut self, level: f32) {
        if level.is_finite() {
            self.sustain = level.clamp(0.0, 1.0);
        }
    }

    /// Sustain level.
    pub fn sustain(&self) -> f32 {
        self.sustain
    }

    /// Set release time in seconds. Negative values count as zero.
    pub fn set_release(&mut self, seconds: f32) {
        if seconds.is_finite() {
            self.release = seconds.max(0.0);
        }
    }

    /// Release time in seconds.
    pub fn release_time(&self) -> f32 {
        self.release
    }

    /// Set sample rate.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
    }

    /// Start (or restart) the envelope at the beginning of the attack.
    ///
    /// Pressing an envelope that is still sounding restarts the ramp from
    /// zero.
    pub fn press(&mut self) {
        self.state = EnvelopeState::Attack;
        self.amplitude = 0.0;
        self.samples_in_state = 0;
    }

    /// Enter the release stage from the current amplitude.
    ///
    /// Has no effect on an inactive envelope.
    pub fn release(&mut self) {
        if self.state != EnvelopeState::Inactive {
            self.release_start = self.amplitude;
            self.state = EnvelopeState::Release;
            self.samples_in_state = 0;
        }
    }

    /// Force the envelope to the inactive state.
    pub fn reset(&mut self) {
        self.state = EnvelopeState::Inactive;
        self.amplitude = 0.0;
        self.release_start = 0.0;
        self.samples_in_state = 0;
    }

    /// Current state.
    pub fn state(&self) -> EnvelopeState {
        self.state
    }

    /// Current amplitude without advancing.
    pub fn amplitude(&self) -> f32 {
        self.amplitude
    }

    /// Amplitude captured when the release stage began.
    pub fn release_start(&self) -> f32 {
        self.release_start
    }

    /// Seconds spent in the current state.
    pub fn time_in_state(&self) -> f32 {
        self.samples_in_state as f32 / self.sample_rate
    }

    /// Whether the envelope is producing output.
    pub fn is_active(&self) -> bool {
        self.state != EnvelopeState::Inactive
    }

    /// Advance by one sample and return the amplitude for this sample.
    #[inline]
    pub fn advance(&mut self) -> f32 {
        let t = self.time_in_state();

        match self.state {
            EnvelopeState::Inactive => {
                self.amplitude = 0.0;
                return 0.0;
            }

            EnvelopeState::Attack => {
                if self.attack <= 0.0 || t >= self.attack {
                    self.amplitude = 1.0;
                    self.enter(EnvelopeState::Decay);
                    return self.amplitude;
                }
                self.amplitude = t / self.attack;
            }

            EnvelopeState::Decay => {
                if self.decay <= 0.0 || t >= self.decay {
                    self.amplitude = self.sustain;
                    self.enter(EnvelopeState::Sustain);
                    return self.amplitude;
                }
                self.amplitude = 1.0 - (1.0 - self.sustain) * (t / self.decay);
            }

            EnvelopeState::Sustain => {
                self.amplitude = self.sustain;
            }

            EnvelopeState::Release => {
                if self.release <= 0.0 || t >= self.release {
                    self.amplitude = 0.0;
                    self.enter(EnvelopeState::Inactive);
                    return 0.0;
                }
                self.amplitude = self.release_start * (1.0 - t / self.release);
            }
        }

        self.samples_in_state = self.samples_in_state.saturating_add(1);
        self.amplitude
    }

    fn enter(&mut self, state: EnvelopeState) {
        self.state = state;
        self.samples_in_state = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 1000.0;

    fn envelope(attack: f32, decay: f32, sustain: f32, release: f32) -> AdsrEnvelope {
        let mut env = AdsrEnvelope::new(SR);
        env.set_attack(attack);
        env.set_decay(decay);
        env.set_sustain(sustain);
        env.set_release(release);
        env
    }

    #[test]
    fn test_envelope_inactive_state() {
        let mut env = AdsrEnvelope::new(SR);
        assert_eq!(env.state(), EnvelopeState::Inactive);
        for _ in 0..100 {
            assert_eq!(env.advance(), 0.0);
        }
    }

    #[test]
    fn test_envelope_attack_is_linear() {
        let mut env = envelope(0.1, 0.1, 0.5, 0.1);
        env.press();
        // 100 attack samples: amplitude n/100
        for n in 0..100 {
            let level = env.advance();
            assert!(
                (level - n as f32 / 100.0).abs() < 1e-5,
                "sample {} expected {}, got {}",
                n,
                n as f32 / 100.0,
                level
            );
        }
        assert_eq!(env.advance(), 1.0);
        assert_eq!(env.state(), EnvelopeState::Decay);
    }

    #[test]
    fn test_envelope_decay_to_sustain() {
        let mut env = envelope(0.0, 0.05, 0.4, 0.1);
        env.press();
        assert_eq!(env.advance(), 1.0, "zero attack jumps straight to peak");
        assert_eq!(env.state(), EnvelopeState::Decay);

        for _ in 0..50 {
            env.advance();
        }
        assert_eq!(env.advance(), 0.4);
        assert_eq!(env.state(), EnvelopeState::Sustain);

        for _ in 0..500 {
            assert_eq!(env.advance(), 0.4);
        }
    }

    #[test]
    fn test_envelope_release_from_current_level() {
        let mut env = envelope(0.1, 0.1, 0.5, 0.2);
        env.press();
        for _ in 0..50 {
            env.advance();
        }
        let level = env.amplitude();
        env.release();
        assert_eq!(env.state(), EnvelopeState::Release);
        assert_eq!(env.release_start(), level);

        let first = env.advance();
        assert!(
            (first - level).abs() < 1e-6,
            "release starts from {} without a jump, got {}",
            level,
            first
        );
    }

    #[test]
    fn test_envelope_release_reaches_inactive_on_time() {
        let mut env = envelope(0.01, 0.02, 0.7, 0.05);
        env.press();
        for _ in 0..200 {
            env.advance();
        }
        env.release();
        let mut samples = 0;
        while env.is_active() {
            env.advance();
            samples += 1;
            assert!(samples < 1000, "release never finished");
        }
        // 50 release samples plus the one that observes the deadline
        assert_eq!(samples, 51);
        assert_eq!(env.amplitude(), 0.0);
    }

    #[test]
    fn test_envelope_zero_release_stops_immediately() {
        let mut env = envelope(0.01, 0.01, 0.7, 0.0);
        env.press();
        env.advance();
        env.release();
        assert_eq!(env.advance(), 0.0);
        assert_eq!(env.state(), EnvelopeState::Inactive);
    }

    #[test]
    fn test_envelope_release_ignored_when_inactive() {
        let mut env = AdsrEnvelope::new(SR);
        env.release();
        assert_eq!(env.state(), EnvelopeState::Inactive);
    }

    #[test]
    fn test_envelope_press_restarts_attack() {
        let mut env = envelope(0.1, 0.1, 0.5, 0.5);
        env.press();
        for _ in 0..300 {
            env.advance();
        }
        assert_eq!(env.state(), EnvelopeState::Sustain);
        env.press();
        assert_eq!(env.state(), EnvelopeState::Attack);
        assert_eq!(env.advance(), 0.0);
    }

    #[test]
    fn test_envelope_invalid_times_ignored() {
        let mut env = envelope(0.1, 0.1, 0.5, 0.2);
        env.set_attack(f32::NAN);
        env.set_sustain(f32::INFINITY);
        env.set_release(-3.0);
        assert_eq!(env.attack(), 0.1);
        assert_eq!(env.sustain(), 0.5);
        assert_eq!(env.release_time(), 0.0);
    }
}
