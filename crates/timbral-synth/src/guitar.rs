//! Six-string guitar built from [`PluckedString`]s.
//!
//! Strings live in a fixed arena of six optional slots indexed low E (0) to
//! high E (5). A new pluck overwrites its slot; the mixer clears a slot once
//! the string in it dies.
//!
//! Plucking one string lightly re-excites every other string that is silent
//! or nearly so, a rough model of the body coupling the strings together.

use timbral_core::{NoiseSource, semitones_to_ratio};

use crate::string::PluckedString;

/// Number of strings.
pub const STRING_COUNT: usize = 6;

/// Energy of a sympathetic re-excitation.
pub const SYMPATHETIC_ENERGY: f32 = 0.15;

/// Strings louder than this envelope level are not re-excited.
pub const SYMPATHETIC_THRESHOLD: f32 = 0.1;

/// Highest capo position.
pub const MAX_CAPO: u8 = 12;

/// Open-string tuning presets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Tuning {
    /// E2 A2 D3 G3 B3 E4
    #[default]
    Standard,
    /// D2 A2 D3 G3 B3 E4
    DropD,
    /// D2 G2 D3 G3 B3 D4
    OpenG,
}

impl Tuning {
    /// Every preset, in cycling order.
    pub const ALL: [Tuning; 3] = [Tuning::Standard, Tuning::DropD, Tuning::OpenG];

    /// Open-string frequencies, low to high.
    pub fn frequencies(self) -> [f32; STRING_COUNT] {
        match self {
            Tuning::Standard => [82.41, 110.00, 146.83, 196.00, 246.94, 329.63],
            Tuning::DropD => [73.42, 110.00, 146.83, 196.00, 246.94, 329.63],
            Tuning::OpenG => [73.42, 98.00, 146.83, 196.00, 246.94, 293.66],
        }
    }

    /// Config name of the preset.
    pub fn name(self) -> &'static str {
        match self {
            Tuning::Standard => "standard",
            Tuning::DropD => "drop_d",
            Tuning::OpenG => "open_g",
        }
    }

    /// Look up a preset by name. Case, spaces, `-` and `_` are ignored.
    pub fn from_name(name: &str) -> Option<Self> {
        let key: String = name
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match key.as_str() {
            "standard" | "std" => Some(Tuning::Standard),
            "dropd" => Some(Tuning::DropD),
            "openg" => Some(Tuning::OpenG),
            _ => None,
        }
    }

    /// The next preset, wrapping around.
    pub fn next(self) -> Self {
        match self {
            Tuning::Standard => Tuning::DropD,
            Tuning::DropD => Tuning::OpenG,
            Tuning::OpenG => Tuning::Standard,
        }
    }
}

/// Chord shapes available for strumming.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Chord {
    /// C major, x32010
    CMajor,
    /// G major, 320003
    GMajor,
    /// D major, xx0232
    DMajor,
    /// E minor, 022000
    EMinor,
}

impl Chord {
    /// Every chord.
    pub const ALL: [Chord; 4] = [Chord::CMajor, Chord::GMajor, Chord::DMajor, Chord::EMinor];

    /// Fret per string, low E first. `None` means the string is muted.
    pub fn shape(self) -> [Option<u8>; STRING_COUNT] {
        match self {
            Chord::CMajor => [None, Some(3), Some(2), Some(0), Some(1), Some(0)],
            Chord::GMajor => [Some(3), Some(2), Some(0), Some(0), Some(0), Some(3)],
            Chord::DMajor => [None, None, Some(0), Some(2), Some(3), Some(2)],
            Chord::EMinor => [Some(0), Some(2), Some(2), Some(0), Some(0), Some(0)],
        }
    }

    /// Chord symbol.
    pub fn name(self) -> &'static str {
        match self {
            Chord::CMajor => "C",
            Chord::GMajor => "G",
            Chord::DMajor => "D",
            Chord::EMinor => "Em",
        }
    }

    /// Parse a chord symbol (`C`, `G`, `D`, `Em`). Case-insensitive.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "c" | "cmaj" => Some(Chord::CMajor),
            "g" | "gmaj" => Some(Chord::GMajor),
            "d" | "dmaj" => Some(Chord::DMajor),
            "em" | "emin" => Some(Chord::EMinor),
            _ => None,
        }
    }
}

/// Six-string arena with capo, tuning and sympathetic resonance.
///
/// # Example
///
/// ```rust
/// use timbral_synth::{Chord, Guitar};
///
/// let mut guitar = Guitar::new(96000.0);
/// guitar.strum(Chord::EMinor);
/// assert_eq!(guitar.active_count(), 6);
///
/// let mut out = 0.0;
/// for _ in 0..1000 {
///     out += guitar.next_sample().abs();
/// }
/// assert!(out > 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct Guitar {
    strings: [Option<PluckedString>; STRING_COUNT],
    tuning: [f32; STRING_COUNT],
    capo: u8,
    noise: NoiseSource,
    sample_rate: f32,
}

impl Guitar {
    /// Create a guitar in standard tuning with no capo.
    pub fn new(sample_rate: f32) -> Self {
        Self::with_noise(sample_rate, NoiseSource::default())
    }

    /// Create a guitar drawing pluck noise from `noise`.
    pub fn with_noise(sample_rate: f32, noise: NoiseSource) -> Self {
        Self {
            strings: Default::default(),
            tuning: Tuning::Standard.frequencies(),
            capo: 0,
            noise,
            sample_rate,
        }
    }

    /// Pluck string `index` at `frequency` Hz with full energy.
    ///
    /// Every other string that is idle or below the sympathetic threshold
    /// is re-excited at its own open pitch (capo applied) with
    /// [`SYMPATHETIC_ENERGY`]. Out-of-range indices and invalid
    /// frequencies are ignored.
    pub fn pluck(&mut self, index: usize, frequency: f32) {
        if index >= STRING_COUNT || !(frequency.is_finite() && frequency > 0.0) {
            return;
        }
        self.strings[index] = Some(PluckedString::new(
            self.sample_rate,
            frequency,
            1.0,
            &mut self.noise,
        ));

        let capo = semitones_to_ratio(f32::from(self.capo));
        for j in (0..STRING_COUNT).filter(|&j| j != index) {
            let quiet = self.strings[j]
                .as_ref()
                .is_none_or(|s| s.envelope() < SYMPATHETIC_THRESHOLD);
            if quiet {
                self.strings[j] = Some(PluckedString::new(
                    self.sample_rate,
                    self.tuning[j] * capo,
                    SYMPATHETIC_ENERGY,
                    &mut self.noise,
                ));
            }
        }
    }

    /// Pluck string `index` at `fret` above the capo.
    pub fn pluck_fret(&mut self, index: usize, fret: u8) {
        if let Some(frequency) = self.fret_frequency(index, fret) {
            self.pluck(index, frequency);
        }
    }

    /// Strum a chord: every played string is plucked at full energy, muted
    /// strings are left alone.
    pub fn strum(&mut self, chord: Chord) {
        for (index, fret) in chord.shape().into_iter().enumerate() {
            let Some(fret) = fret else { continue };
            if let Some(frequency) = self.fret_frequency(index, fret) {
                self.strings[index] = Some(PluckedString::new(
                    self.sample_rate,
                    frequency,
                    1.0,
                    &mut self.noise,
                ));
            }
        }
    }

    /// Frequency of `fret` on string `index`, capo included.
    pub fn fret_frequency(&self, index: usize, fret: u8) -> Option<f32> {
        let open = *self.tuning.get(index)?;
        Some(open * semitones_to_ratio(f32::from(fret) + f32::from(self.capo)))
    }

    /// Set the capo fret, clamped to [`MAX_CAPO`].
    pub fn set_capo(&mut self, fret: u8) {
        self.capo = fret.min(MAX_CAPO);
    }

    /// Capo position.
    pub fn capo(&self) -> u8 {
        self.capo
    }

    /// Replace the open-string frequencies and silence ringing strings.
    ///
    /// Ignored if any frequency is not a positive finite number.
    pub fn set_tuning(&mut self, frequencies: [f32; STRING_COUNT]) {
        if frequencies.iter().all(|f| f.is_finite() && *f > 0.0) {
            self.tuning = frequencies;
            self.strings = Default::default();
        }
    }

    /// Switch to a tuning preset.
    pub fn set_tuning_preset(&mut self, tuning: Tuning) {
        self.set_tuning(tuning.frequencies());
    }

    /// Open-string frequencies.
    pub fn tuning(&self) -> [f32; STRING_COUNT] {
        self.tuning
    }

    /// Read access to the string slots.
    pub fn strings(&self) -> &[Option<PluckedString>; STRING_COUNT] {
        &self.strings
    }

    /// Number of ringing strings.
    pub fn active_count(&self) -> usize {
        self.strings.iter().flatten().filter(|s| s.is_active()).count()
    }

    /// Silence every string.
    pub fn reset(&mut self) {
        self.strings = Default::default();
    }

    /// Sum one sample from every string, then clear slots whose string
    /// has died.
    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        let mut sum = 0.0;
        for slot in &mut self.strings {
            if let Some(string) = slot {
                sum += string.next_sample();
                if !string.is_active() {
                    *slot = None;
                }
            }
        }
        sum
    }
}
