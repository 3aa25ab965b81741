//! Timbral Synth - Sound sources and the block mixer for timbral
//!
//! Three families of sources share one master bus:
//!
//! ## Synth
//!
//! Subtractive voices: naive waveform, Chamberlin lowpass, linear ADSR.
//!
//! - [`Waveform`] - Sine, Square, Triangle, Sawtooth
//! - [`AdsrEnvelope`] / [`EnvelopeState`] - Sample-counted linear envelope
//! - [`Voice`] / [`VoicePool`] - Fixed pool with oldest-release stealing
//! - [`note_frequency`] - Note names (`C#4`, `Bb2`) to Hz
//!
//! ```rust
//! use timbral_synth::{VoicePool, Waveform, note_frequency};
//!
//! let mut pool: VoicePool<8> = VoicePool::new(96000.0);
//! pool.set_waveform(Waveform::Sawtooth);
//! pool.set_cutoff(0.6);
//!
//! let c4 = note_frequency("C4").unwrap();
//! pool.note_on(60, c4);
//! let sample = pool.process();
//! ```
//!
//! ## Guitar
//!
//! Karplus-Strong strings in a six-slot arena:
//!
//! - [`PluckedString`] - Noise-seeded delay line with one-pole loop filter
//! - [`Guitar`] - Capo, [`Tuning`] presets, [`Chord`] strums, sympathetic
//!   resonance
//!
//! ## Drums
//!
//! - [`DrumKind`] / [`DrumVoice`] - Closed-form kick, snare, hi-hat, cymbal
//! - [`DrumKit`] - Sounding strikes, pruned as they finish
//!
//! ## Engine and control
//!
//! - [`Engine`] - Everything above on one clipped master bus
//! - [`ControlEvent`] / [`Param`] - Intents from the control path
//! - [`control_channel`] - Bounded lock-free queue drained per block
//!
//! ```rust
//! use timbral_synth::{Chord, Engine, control_channel};
//!
//! let mut engine = Engine::new(96000.0);
//! let (controller, queue) = control_channel(256);
//!
//! // Any thread
//! controller.strum(Chord::GMajor);
//!
//! // Render thread, once per block
//! engine.apply_pending(&queue);
//! let mut block = vec![0.0f32; 512];
//! engine.render(&mut block);
//! ```

pub mod control;
pub mod engine;
pub mod envelope;
pub mod event;
pub mod guitar;
pub mod oscillator;
pub mod percussion;
pub mod pitch;
pub mod string;
pub mod voice;

pub use control::{ControlQueue, Controller, DEFAULT_QUEUE_CAPACITY, control_channel};
pub use engine::{DEFAULT_MASTER_GAIN, DEFAULT_SAMPLE_RATE, Engine};
pub use envelope::{AdsrEnvelope, EnvelopeState};
pub use event::{ControlEvent, Param};
pub use guitar::{Chord, Guitar, MAX_CAPO, STRING_COUNT, Tuning};
pub use oscillator::Waveform;
pub use percussion::{DrumKind, DrumKit, DrumVoice};
pub use pitch::{midi_to_freq, note_frequency, note_number};
pub use string::PluckedString;
pub use voice::{KeyId, POLYPHONY, Voice, VoicePool};

// Re-export the primitives the synth is built from
pub use timbral_core::{ChamberlinSvf, NoiseSource, semitones_to_ratio};
