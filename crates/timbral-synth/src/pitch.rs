//! Note names and equal-tempered pitch.
//!
//! Names follow scientific pitch notation over the 88-key piano range,
//! `A0` (27.5 Hz) to `C8` (4186.01 Hz), tuned to A4 = 440 Hz. Accidentals
//! are `#` and `b`, limited to the five black keys of each octave: sharps on
//! C D F G A, flats on D E G A B.

/// Lowest MIDI note with a name (`A0`).
pub const LOWEST_NOTE: u8 = 21;
/// Highest MIDI note with a name (`C8`).
pub const HIGHEST_NOTE: u8 = 108;

/// Convert MIDI note number to frequency in Hz.
///
/// Uses standard tuning: A4 (note 69) = 440 Hz.
#[inline]
pub fn midi_to_freq(note: u8) -> f32 {
    440.0 * libm::powf(2.0, (f32::from(note) - 69.0) / 12.0)
}

/// Parse a note name such as `C4`, `F#3` or `Bb0` into a MIDI note number.
///
/// Returns `None` for malformed names, unsupported accidentals (`Cb`, `E#`)
/// and notes outside `A0..=C8`.
///
/// # Example
///
/// ```rust
/// use timbral_synth::note_number;
///
/// assert_eq!(note_number("A4"), Some(69));
/// assert_eq!(note_number("C#4"), Some(61));
/// assert_eq!(note_number("Db4"), Some(61));
/// assert_eq!(note_number("G9"), None);
/// ```
pub fn note_number(name: &str) -> Option<u8> {
    let name = name.trim();
    let mut chars = name.chars();
    let letter = chars.next()?.to_ascii_uppercase();
    let rest = chars.as_str();

    let natural: i32 = match letter {
        'C' => 0,
        'D' => 2,
        'E' => 4,
        'F' => 5,
        'G' => 7,
        'A' => 9,
        'B' => 11,
        _ => return None,
    };

    let (offset, octave_str) = if let Some(octave) = rest.strip_prefix('#') {
        if !matches!(letter, 'C' | 'D' | 'F' | 'G' | 'A') {
            return None;
        }
        (1, octave)
    } else if let Some(octave) = rest.strip_prefix('b') {
        if !matches!(letter, 'D' | 'E' | 'G' | 'A' | 'B') {
            return None;
        }
        (-1, octave)
    } else {
        (0, rest)
    };

    if octave_str.is_empty() || !octave_str.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let octave: i32 = octave_str.parse().ok()?;

    let midi = 12 * (octave + 1) + natural + offset;
    u8::try_from(midi)
        .ok()
        .filter(|n| (LOWEST_NOTE..=HIGHEST_NOTE).contains(n))
}

/// Frequency in Hz of a named note, or `None` if the name is invalid.
///
/// # Example
///
/// ```rust
/// use timbral_synth::note_frequency;
///
/// let a4 = note_frequency("A4").unwrap();
/// assert!((a4 - 440.0).abs() < 1e-3);
/// ```
pub fn note_frequency(name: &str) -> Option<f32> {
    note_number(name).map(midi_to_freq)
}
