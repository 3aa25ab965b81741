//! Synth voices and the fixed-size voice pool.
//!
//! A [`Voice`] is one waveform → filter → envelope chain. Voices live for the
//! whole process inside a [`VoicePool`]; whether a voice is free is read from
//! its envelope state rather than a separate flag.
//!
//! # Allocation
//!
//! On note-on the pool picks, in order:
//!
//! 1. the first voice whose envelope is inactive,
//! 2. otherwise the releasing voice with the oldest state change,
//! 3. otherwise nothing; the note is dropped.
//!
//! Held voices are never stolen.

use crate::envelope::{AdsrEnvelope, EnvelopeState};
use crate::oscillator::Waveform;
use timbral_core::{ChamberlinSvf, semitones_to_ratio};

/// Identifier of the external key (or score slot) driving a voice.
pub type KeyId = u32;

/// Number of voices in the engine's synth pool.
pub const POLYPHONY: usize = 8;

/// Largest pitch offset in semitones, either direction.
pub const MAX_PITCH_OFFSET: f32 = 12.0;

/// A single synthesizer voice.
///
/// Produces `lowpass(waveform(phase)) · envelope` per sample. The phase is
/// advanced after the waveform is evaluated and wrapped into [0, 1).
#[derive(Debug, Clone)]
pub struct Voice {
    frequency: f32,
    phase: f32,
    envelope: AdsrEnvelope,
    filter: ChamberlinSvf,
    key: Option<KeyId>,
    state_changed_at: u64,
    sample_rate: f32,
}

impl Default for Voice {
    fn default() -> Self {
        Self::new(96000.0)
    }
}

impl Voice {
    /// Create an idle voice.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            frequency: 0.0,
            phase: 0.0,
            envelope: AdsrEnvelope::new(sample_rate),
            filter: ChamberlinSvf::new(sample_rate),
            key: None,
            state_changed_at: 0,
            sample_rate,
        }
    }

    /// Set sample rate.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.envelope.set_sample_rate(sample_rate);
        self.filter.set_sample_rate(sample_rate);
    }

    /// Bind the voice to `key` and start a note.
    ///
    /// Resets phase and filter state; `now` is the pool clock used for the
    /// stealing tie-break.
    pub fn press(&mut self, key: KeyId, frequency: f32, now: u64) {
        self.key = Some(key);
        self.frequency = frequency;
        self.phase = 0.0;
        self.filter.reset();
        self.envelope.press();
        self.state_changed_at = now;
    }

    /// Move the voice into its release stage.
    pub fn release(&mut self, now: u64) {
        if self.envelope.is_active() {
            self.envelope.release();
            self.state_changed_at = now;
        }
    }

    /// Silence the voice immediately and clear its key binding.
    pub fn kill(&mut self) {
        self.envelope.reset();
        self.filter.reset();
        self.key = None;
    }

    /// Whether the voice is sounding.
    pub fn is_active(&self) -> bool {
        self.envelope.is_active()
    }

    /// Envelope state of this voice.
    pub fn state(&self) -> EnvelopeState {
        self.envelope.state()
    }

    /// Key the voice is bound to, if any.
    pub fn key(&self) -> Option<KeyId> {
        self.key
    }

    /// Oscillator frequency in Hz.
    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    /// Current phase in [0, 1).
    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// Pool clock value at the last envelope state change.
    pub fn state_changed_at(&self) -> u64 {
        self.state_changed_at
    }

    /// Current envelope amplitude.
    pub fn amplitude(&self) -> f32 {
        self.envelope.amplitude()
    }

    /// The amplitude envelope.
    pub fn envelope(&self) -> &AdsrEnvelope {
        &self.envelope
    }

    /// The tone filter.
    pub fn filter(&self) -> &ChamberlinSvf {
        &self.filter
    }

    /// Mutable access to the amplitude envelope.
    pub fn envelope_mut(&mut self) -> &mut AdsrEnvelope {
        &mut self.envelope
    }

    /// Mutable access to the tone filter.
    pub fn filter_mut(&mut self) -> &mut ChamberlinSvf {
        &mut self.filter
    }

    /// Render one sample.
    #[inline]
    pub fn process(&mut self, waveform: Waveform, now: u64) -> f32 {
        if !self.envelope.is_active() {
            return 0.0;
        }

        let before = self.envelope.state();
        let amplitude = self.envelope.advance();
        let after = self.envelope.state();
        if after != before {
            self.state_changed_at = now;
            if after == EnvelopeState::Inactive {
                self.key = None;
            }
        }

        let mut filtered = self.filter.process(waveform.sample(self.phase));
        if !filtered.is_finite() {
            // Below 48 kHz the top of the cutoff range can run the loop
            // unstable; restart it rather than feed inf/NaN to the bus.
            self.filter.reset();
            filtered = 0.0;
        }

        self.phase += self.frequency / self.sample_rate;
        if self.phase >= 1.0 {
            self.phase -= libm::floorf(self.phase);
        }

        filtered * amplitude
    }
}

/// Fixed-capacity polyphonic voice pool.
///
/// Waveform, envelope times and filter settings are shared: setters fan out
/// to every voice.
///
/// # Example
///
/// ```rust
/// use timbral_synth::VoicePool;
///
/// let mut pool: VoicePool<8> = VoicePool::new(96000.0);
///
/// pool.note_on(1, 261.63);
/// pool.note_on(2, 329.63);
///
/// let mut block = [0.0f32; 512];
/// for sample in block.iter_mut() {
///     *sample = pool.process();
/// }
///
/// pool.note_off(1);
/// ```
#[derive(Debug)]
pub struct VoicePool<const N: usize> {
    voices: [Voice; N],
    waveform: Waveform,
    pitch_offset: f32,
    sample_rate: f32,
    /// Samples rendered so far; orders state changes for stealing
    clock: u64,
}

impl<const N: usize> VoicePool<N> {
    /// Create a pool of `N` idle voices.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            voices: core::array::from_fn(|_| Voice::new(sample_rate)),
            waveform: Waveform::Sine,
            pitch_offset: 0.0,
            sample_rate,
            clock: 0,
        }
    }

    /// Set sample rate for all voices.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        for voice in &mut self.voices {
            voice.set_sample_rate(sample_rate);
        }
    }

    /// Get number of voices.
    pub fn voice_count(&self) -> usize {
        N
    }

    /// Get number of sounding voices.
    pub fn active_voice_count(&self) -> usize {
        self.voices.iter().filter(|v| v.is_active()).count()
    }

    /// Get read access to all voices.
    pub fn voices(&self) -> &[Voice; N] {
        &self.voices
    }

    /// Samples rendered since creation.
    pub fn clock(&self) -> u64 {
        self.clock
    }

    /// Start a note for `key`.
    ///
    /// The frequency is shifted by the pool's pitch offset. Returns the index
    /// of the voice that took the note, or `None` when the note was ignored:
    /// the frequency is not a positive finite number, the key is already
    /// held, or every voice is held (drop-note policy).
    ///
    /// A key whose previous voice is still releasing re-triggers that voice,
    /// so a key is never bound to two voices.
    pub fn note_on(&mut self, key: KeyId, frequency: f32) -> Option<usize> {
        if !(frequency.is_finite() && frequency > 0.0) {
            return None;
        }

        let bound = self.voices.iter().position(|v| v.key() == Some(key));
        let index = match bound {
            Some(i) if self.voices[i].state() == EnvelopeState::Release => i,
            Some(_) => return None,
            None => self.allocate()?,
        };

        let shifted = frequency * semitones_to_ratio(self.pitch_offset);
        self.voices[index].press(key, shifted, self.clock);
        Some(index)
    }

    /// Release every voice bound to `key`. Returns how many were released.
    pub fn note_off(&mut self, key: KeyId) -> usize {
        let now = self.clock;
        let mut released = 0;
        for voice in &mut self.voices {
            if voice.key() == Some(key) && voice.state() != EnvelopeState::Release {
                voice.release(now);
                released += 1;
            }
        }
        released
    }

    /// Release all sounding voices.
    pub fn all_notes_off(&mut self) {
        let now = self.clock;
        for voice in &mut self.voices {
            if voice.state() != EnvelopeState::Release {
                voice.release(now);
            }
        }
    }

    /// Silence every voice immediately.
    pub fn reset(&mut self) {
        for voice in &mut self.voices {
            voice.kill();
        }
    }

    /// Pick a voice for a new note, or `None` if all are held.
    pub fn allocate(&self) -> Option<usize> {
        if let Some(free) = self.voices.iter().position(|v| !v.is_active()) {
            return Some(free);
        }

        self.voices
            .iter()
            .enumerate()
            .filter(|(_, v)| v.state() == EnvelopeState::Release)
            .min_by_key(|(_, v)| v.state_changed_at())
            .map(|(i, _)| i)
    }

    /// Set the waveform shared by all voices.
    pub fn set_waveform(&mut self, waveform: Waveform) {
        self.waveform = waveform;
    }

    /// Shared waveform.
    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    /// Set the pitch offset in semitones (clamped to ±12). Applies to notes
    /// started afterwards.
    pub fn set_pitch_offset(&mut self, semitones: f32) {
        if semitones.is_finite() {
            self.pitch_offset = semitones.clamp(-MAX_PITCH_OFFSET, MAX_PITCH_OFFSET);
        }
    }

    /// Pitch offset in semitones.
    pub fn pitch_offset(&self) -> f32 {
        self.pitch_offset
    }

    /// Set attack time in seconds on every voice.
    pub fn set_attack(&mut self, seconds: f32) {
        for voice in &mut self.voices {
            voice.envelope_mut().set_attack(seconds);
        }
    }

    /// Set decay time in seconds on every voice.
    pub fn set_decay(&mut self, seconds: f32) {
        for voice in &mut self.voices {
            voice.envelope_mut().set_decay(seconds);
        }
    }

    /// Set sustain level on every voice.
    pub fn set_sustain(&mut self, level: f32) {
        for voice in &mut self.voices {
            voice.envelope_mut().set_sustain(level);
        }
    }

    /// Set release time in seconds on every voice.
    pub fn set_release(&mut self, seconds: f32) {
        for voice in &mut self.voices {
            voice.envelope_mut().set_release(seconds);
        }
    }

    /// Set normalized filter cutoff on every voice.
    pub fn set_cutoff(&mut self, cutoff: f32) {
        for voice in &mut self.voices {
            voice.filter_mut().set_cutoff(cutoff);
        }
    }

    /// Set normalized filter resonance on every voice.
    pub fn set_resonance(&mut self, resonance: f32) {
        for voice in &mut self.voices {
            voice.filter_mut().set_resonance(resonance);
        }
    }

    /// Process one mono sample from all voices.
    #[inline]
    pub fn process(&mut self) -> f32 {
        let now = self.clock;
        let waveform = self.waveform;
        let mut output = 0.0;
        for voice in &mut self.voices {
            output += voice.process(waveform, now);
        }
        self.clock += 1;
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 96000.0;

    fn pool<const N: usize>() -> VoicePool<N> {
        let mut pool = VoicePool::new(SR);
        pool.set_attack(0.001);
        pool.set_decay(0.001);
        pool.set_release(0.01);
        pool
    }

    fn render<const N: usize>(pool: &mut VoicePool<N>, samples: usize) -> f32 {
        let mut peak = 0.0f32;
        for _ in 0..samples {
            peak = peak.max(pool.process().abs());
        }
        peak
    }

    #[test]
    fn test_voice_phase_wraps() {
        let mut voice = Voice::new(1000.0);
        voice.press(0, 300.0, 0);
        for _ in 0..100 {
            voice.process(Waveform::Sine, 0);
            assert!(
                (0.0..1.0).contains(&voice.phase()),
                "phase out of range: {}",
                voice.phase()
            );
        }
    }

    #[test]
    fn test_voice_key_cleared_when_inactive() {
        let mut voice = Voice::new(SR);
        voice.envelope_mut().set_release(0.0);
        voice.press(7, 440.0, 0);
        voice.process(Waveform::Sine, 1);
        voice.release(2);
        assert_eq!(voice.key(), Some(7), "binding kept while releasing");
        voice.process(Waveform::Sine, 3);
        assert_eq!(voice.state(), EnvelopeState::Inactive);
        assert_eq!(voice.key(), None);
        assert_eq!(voice.state_changed_at(), 3);
    }

    #[test]
    fn test_unstable_filter_never_yields_non_finite() {
        // f ≈ 1.307 with q = 1 diverges at 44.1 kHz
        let mut voice = Voice::new(44100.0);
        voice.filter_mut().set_cutoff(1.0);
        voice.filter_mut().set_resonance(0.0);
        voice.press(1, 440.0, 0);
        for n in 0..44100 {
            let y = voice.process(Waveform::Sawtooth, n);
            assert!(y.is_finite(), "sample {} is {}", n, y);
        }
    }

    #[test]
    fn test_inactive_voice_is_silent() {
        let mut voice = Voice::new(SR);
        for _ in 0..64 {
            assert_eq!(voice.process(Waveform::Square, 0), 0.0);
        }
    }

    #[test]
    fn test_pool_fills_then_drops() {
        let mut pool: VoicePool<4> = pool();
        for key in 0..4 {
            assert!(pool.note_on(key, 220.0).is_some());
        }
        assert_eq!(pool.note_on(99, 220.0), None, "no releasing voice to steal");
        assert_eq!(pool.active_voice_count(), 4);
    }

    #[test]
    fn test_pool_steals_oldest_release() {
        let mut pool: VoicePool<3> = pool();
        pool.set_release(10.0);
        pool.note_on(0, 220.0);
        pool.note_on(1, 330.0);
        pool.note_on(2, 440.0);
        render(&mut pool, 10);

        pool.note_off(1);
        render(&mut pool, 10);
        pool.note_off(0);
        render(&mut pool, 10);

        let index = pool.note_on(5, 550.0);
        assert_eq!(index, Some(1), "key 1 entered release first");
        assert_eq!(pool.voices()[1].key(), Some(5));
    }

    #[test]
    fn test_pool_ignores_held_key() {
        let mut pool: VoicePool<4> = pool();
        assert_eq!(pool.note_on(3, 440.0), Some(0));
        assert_eq!(pool.note_on(3, 440.0), None);
        assert_eq!(pool.active_voice_count(), 1);
    }

    #[test]
    fn test_pool_retriggers_releasing_key() {
        let mut pool: VoicePool<4> = pool();
        pool.set_release(1.0);
        pool.note_on(3, 440.0);
        render(&mut pool, 100);
        pool.note_off(3);
        render(&mut pool, 10);

        assert_eq!(pool.note_on(3, 440.0), Some(0));
        let bound = pool.voices().iter().filter(|v| v.key() == Some(3)).count();
        assert_eq!(bound, 1);
        assert_eq!(pool.voices()[0].state(), EnvelopeState::Attack);
    }

    #[test]
    fn test_pool_pitch_offset_applies_on_note_on() {
        let mut pool: VoicePool<2> = pool();
        pool.set_pitch_offset(12.0);
        pool.note_on(0, 220.0);
        assert!((pool.voices()[0].frequency() - 440.0).abs() < 1e-3);

        pool.set_pitch_offset(-40.0);
        assert_eq!(pool.pitch_offset(), -12.0);
    }

    #[test]
    fn test_pool_rejects_bad_frequency() {
        let mut pool: VoicePool<2> = pool();
        assert_eq!(pool.note_on(0, f32::NAN), None);
        assert_eq!(pool.note_on(0, 0.0), None);
        assert_eq!(pool.note_on(0, -10.0), None);
        assert_eq!(pool.active_voice_count(), 0);
    }

    #[test]
    fn test_pool_release_frees_voices() {
        let mut pool: VoicePool<4> = pool();
        pool.note_on(0, 220.0);
        pool.note_on(1, 440.0);
        render(&mut pool, 1000);
        pool.all_notes_off();
        // 10 ms release at 96 kHz
        render(&mut pool, 961 + 1);
        assert_eq!(pool.active_voice_count(), 0);
        assert!(pool.voices().iter().all(|v| v.key().is_none()));
    }

    #[test]
    fn test_pool_output_nonzero_while_held() {
        let mut pool: VoicePool<2> = pool();
        pool.note_on(0, 440.0);
        let peak = render(&mut pool, 4800);
        assert!(peak > 0.3, "held note should be audible, peak {}", peak);
    }
}
