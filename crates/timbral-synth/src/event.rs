//! Control events applied to the engine at block boundaries.

use crate::guitar::{Chord, STRING_COUNT};
use crate::oscillator::Waveform;
use crate::percussion::DrumKind;
use crate::voice::KeyId;

/// Numeric engine parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Param {
    /// Envelope attack time, seconds.
    Attack,
    /// Envelope decay time, seconds.
    Decay,
    /// Envelope sustain level, 0..1.
    Sustain,
    /// Envelope release time, seconds.
    Release,
    /// Normalized filter cutoff, 0..1.
    Cutoff,
    /// Normalized filter resonance, 0..1.
    Resonance,
    /// Synth transposition in semitones, −12..12.
    PitchOffset,
    /// Master-bus drive amount, 0..1.
    Distortion,
    /// Output headroom gain, 0..1.
    MasterGain,
}

impl Param {
    /// Every numeric parameter.
    pub const ALL: [Param; 9] = [
        Param::Attack,
        Param::Decay,
        Param::Sustain,
        Param::Release,
        Param::Cutoff,
        Param::Resonance,
        Param::PitchOffset,
        Param::Distortion,
        Param::MasterGain,
    ];

    /// Canonical parameter name.
    pub fn name(self) -> &'static str {
        match self {
            Param::Attack => "attack",
            Param::Decay => "decay",
            Param::Sustain => "sustain",
            Param::Release => "release",
            Param::Cutoff => "cutoff",
            Param::Resonance => "resonance",
            Param::PitchOffset => "pitch_offset",
            Param::Distortion => "distortion",
            Param::MasterGain => "master_gain",
        }
    }

    /// Look up a parameter by name. Case-insensitive; `-` and `_` are
    /// interchangeable, and `pitch` / `pitchOffset` name the pitch offset.
    pub fn from_name(name: &str) -> Option<Self> {
        let key: String = name
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match key.as_str() {
            "attack" => Some(Param::Attack),
            "decay" => Some(Param::Decay),
            "sustain" => Some(Param::Sustain),
            "release" => Some(Param::Release),
            "cutoff" => Some(Param::Cutoff),
            "resonance" => Some(Param::Resonance),
            "pitchoffset" | "pitch" => Some(Param::PitchOffset),
            "distortion" => Some(Param::Distortion),
            "mastergain" | "gain" => Some(Param::MasterGain),
            _ => None,
        }
    }
}

/// An intent from the control path.
///
/// Events are queued by a [`Controller`](crate::Controller) and applied by
/// [`Engine::apply`](crate::Engine::apply) on the render thread. Invalid
/// payloads (non-finite values, out-of-range indices) are dropped there.
#[derive(Clone, Debug, PartialEq)]
pub enum ControlEvent {
    /// Start a synth note.
    NoteOn {
        /// Key identity used to stop the note later.
        key: KeyId,
        /// Frequency in Hz before the pitch offset.
        frequency: f32,
    },
    /// Release the synth note bound to `key`.
    NoteOff {
        /// Key identity passed to the matching note-on.
        key: KeyId,
    },
    /// Release every synth voice.
    AllNotesOff,
    /// Set a numeric parameter.
    SetParam {
        /// Parameter to change.
        param: Param,
        /// New value, clamped to the parameter's range.
        value: f32,
    },
    /// Change the synth waveform.
    SetWaveform(Waveform),
    /// Pluck a guitar string at an explicit frequency.
    PluckString {
        /// String index, 0 (low E) to 5.
        index: usize,
        /// Frequency in Hz.
        frequency: f32,
    },
    /// Pluck a guitar string at a fret above the capo.
    PluckFret {
        /// String index, 0 (low E) to 5.
        index: usize,
        /// Fret number.
        fret: u8,
    },
    /// Strum a chord.
    Strum(Chord),
    /// Move the capo.
    SetCapo(u8),
    /// Retune the open strings.
    SetTuning([f32; STRING_COUNT]),
    /// Strike a drum.
    TriggerDrum(DrumKind),
}

impl ControlEvent {
    /// Build a parameter change from a name and a textual value.
    ///
    /// `waveform` takes a waveform name; every other parameter takes a
    /// number. Unknown names and unparsable values yield `None`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use timbral_synth::{ControlEvent, Param, Waveform};
    ///
    /// assert_eq!(
    ///     ControlEvent::parameter("cutoff", "0.5"),
    ///     Some(ControlEvent::SetParam { param: Param::Cutoff, value: 0.5 })
    /// );
    /// assert_eq!(
    ///     ControlEvent::parameter("waveform", "saw"),
    ///     Some(ControlEvent::SetWaveform(Waveform::Sawtooth))
    /// );
    /// assert_eq!(ControlEvent::parameter("wobble", "1"), None);
    /// ```
    pub fn parameter(name: &str, value: &str) -> Option<Self> {
        if name.trim().eq_ignore_ascii_case("waveform") {
            return Waveform::from_name(value).map(ControlEvent::SetWaveform);
        }
        let param = Param::from_name(name)?;
        let value: f32 = value.trim().parse().ok()?;
        value
            .is_finite()
            .then_some(ControlEvent::SetParam { param, value })
    }
}
