//! The engine: synth pool, guitar and drum kit mixed onto one master bus.
//!
//! ## Master bus
//!
//! ```text
//! synth = tanh(0.25 · Σ voices)
//! mix   = synth + Σ strings + Σ drums
//! mix   = drive(mix, distortion)        (skipped at distortion 0)
//! out   = clamp(mix · master_gain, −1, 1)
//! ```
//!
//! The engine is single-threaded. Other threads reach it through a
//! [`ControlQueue`] drained at block boundaries, so no lock is ever taken
//! per sample.

use timbral_core::{NoiseSource, drive, hard_clip, soft_clip};

use crate::control::ControlQueue;
use crate::event::{ControlEvent, Param};
use crate::guitar::Guitar;
use crate::oscillator::Waveform;
use crate::percussion::DrumKit;
use crate::voice::{POLYPHONY, VoicePool};

/// Reference output sample rate.
pub const DEFAULT_SAMPLE_RATE: f32 = 96000.0;

/// Headroom applied to the summed synth voices before soft clipping.
pub const SYNTH_HEADROOM: f32 = 0.25;

/// Default output gain.
pub const DEFAULT_MASTER_GAIN: f32 = 0.5;

/// Longest accepted envelope stage, in seconds.
pub const MAX_STAGE_SECONDS: f32 = 10.0;

/// Default filter resonance for synth voices.
pub const DEFAULT_RESONANCE: f32 = 0.2;

/// Complete sound engine.
///
/// # Example
///
/// ```rust
/// use timbral_synth::{ControlEvent, DrumKind, Engine};
///
/// let mut engine = Engine::new(96000.0);
/// engine.apply(ControlEvent::NoteOn { key: 1, frequency: 440.0 });
/// engine.apply(ControlEvent::TriggerDrum(DrumKind::Kick));
///
/// let mut block = [0.0f32; 512];
/// engine.render(&mut block);
/// assert!(block.iter().all(|s| (-1.0..=1.0).contains(s)));
/// ```
#[derive(Debug)]
pub struct Engine {
    synth: VoicePool<POLYPHONY>,
    guitar: Guitar,
    drums: DrumKit,
    distortion: f32,
    master_gain: f32,
    sample_rate: f32,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_RATE)
    }
}

impl Engine {
    /// Create an engine with default settings.
    pub fn new(sample_rate: f32) -> Self {
        Self::with_seed(sample_rate, 0x71b2_a1c3)
    }

    /// Create an engine whose noise (string excitation, drum bursts) is
    /// derived from `seed`. Equal seeds render identical output.
    pub fn with_seed(sample_rate: f32, seed: u32) -> Self {
        let mut synth = VoicePool::new(sample_rate);
        synth.set_resonance(DEFAULT_RESONANCE);

        Self {
            synth,
            guitar: Guitar::with_noise(sample_rate, NoiseSource::new(seed)),
            drums: DrumKit::with_noise(
                sample_rate,
                NoiseSource::new(seed.rotate_left(16) ^ 0x5bd1_e995),
            ),
            distortion: 0.0,
            master_gain: DEFAULT_MASTER_GAIN,
            sample_rate,
        }
    }

    /// Output sample rate.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Apply one control event. Invalid payloads are ignored.
    pub fn apply(&mut self, event: ControlEvent) {
        match event {
            ControlEvent::NoteOn { key, frequency } => {
                if self.synth.note_on(key, frequency).is_none() {
                    tracing::trace!(key, frequency, "note-on dropped");
                }
            }
            ControlEvent::NoteOff { key } => {
                self.synth.note_off(key);
            }
            ControlEvent::AllNotesOff => self.synth.all_notes_off(),
            ControlEvent::SetParam { param, value } => self.set_param(param, value),
            ControlEvent::SetWaveform(waveform) => self.synth.set_waveform(waveform),
            ControlEvent::PluckString { index, frequency } => self.guitar.pluck(index, frequency),
            ControlEvent::PluckFret { index, fret } => self.guitar.pluck_fret(index, fret),
            ControlEvent::Strum(chord) => self.guitar.strum(chord),
            ControlEvent::SetCapo(fret) => self.guitar.set_capo(fret),
            ControlEvent::SetTuning(frequencies) => self.guitar.set_tuning(frequencies),
            ControlEvent::TriggerDrum(kind) => self.drums.trigger(kind),
        }
    }

    /// Apply every event waiting in `queue`. Returns how many were applied.
    pub fn apply_pending(&mut self, queue: &ControlQueue) -> usize {
        let mut applied = 0;
        for event in queue.drain() {
            self.apply(event);
            applied += 1;
        }
        applied
    }

    /// Set a numeric parameter, clamped to its range. Non-finite values are
    /// ignored.
    pub fn set_param(&mut self, param: Param, value: f32) {
        if !value.is_finite() {
            return;
        }
        match param {
            Param::Attack => self.synth.set_attack(value.clamp(0.0, MAX_STAGE_SECONDS)),
            Param::Decay => self.synth.set_decay(value.clamp(0.0, MAX_STAGE_SECONDS)),
            Param::Sustain => self.synth.set_sustain(value),
            Param::Release => self.synth.set_release(value.clamp(0.0, MAX_STAGE_SECONDS)),
            Param::Cutoff => self.synth.set_cutoff(value),
            Param::Resonance => self.synth.set_resonance(value),
            Param::PitchOffset => self.synth.set_pitch_offset(value),
            Param::Distortion => self.distortion = value.clamp(0.0, 1.0),
            Param::MasterGain => self.master_gain = value.clamp(0.0, 1.0),
        }
    }

    /// Current value of a numeric parameter.
    pub fn param(&self, param: Param) -> f32 {
        let voice = &self.synth.voices()[0];
        match param {
            Param::Attack => voice.envelope().attack(),
            Param::Decay => voice.envelope().decay(),
            Param::Sustain => voice.envelope().sustain(),
            Param::Release => voice.envelope().release_time(),
            Param::Cutoff => voice.filter().cutoff(),
            Param::Resonance => voice.filter().resonance(),
            Param::PitchOffset => self.synth.pitch_offset(),
            Param::Distortion => self.distortion,
            Param::MasterGain => self.master_gain,
        }
    }

    /// Shared synth waveform.
    pub fn waveform(&self) -> Waveform {
        self.synth.waveform()
    }

    /// The synth voice pool.
    pub fn synth(&self) -> &VoicePool<POLYPHONY> {
        &self.synth
    }

    /// The guitar.
    pub fn guitar(&self) -> &Guitar {
        &self.guitar
    }

    /// Mutable access to the guitar, for setup outside the control path.
    pub fn guitar_mut(&mut self) -> &mut Guitar {
        &mut self.guitar
    }

    /// The drum kit.
    pub fn drums(&self) -> &DrumKit {
        &self.drums
    }

    /// Whether anything is still sounding.
    pub fn is_sounding(&self) -> bool {
        self.synth.active_voice_count() > 0
            || self.guitar.active_count() > 0
            || self.drums.active_count() > 0
    }

    /// Silence every source immediately.
    pub fn reset(&mut self) {
        self.synth.reset();
        self.guitar.reset();
        self.drums.reset();
    }

    /// Render one output sample in [−1, 1].
    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        let synth = soft_clip(SYNTH_HEADROOM * self.synth.process());
        let mut mix = synth + self.guitar.next_sample() + self.drums.next_sample();
        if self.distortion > 0.0 {
            mix = drive(mix, self.distortion);
        }
        hard_clip(mix * self.master_gain, 1.0)
    }

    /// Fill `out` with consecutive samples.
    pub fn render(&mut self, out: &mut [f32]) {
        for sample in out.iter_mut() {
            *sample = self.next_sample();
        }
    }
}
