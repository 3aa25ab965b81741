//! Score files: one note or rest per line.
//!
//! ```text
//! # Ode to Joy, opening
//! E4,400
//! E4,400
//! F4,400
//! G4,400
//! REST,200
//! ```
//!
//! Each line is `NOTE_NAME,durationMs` or `REST,durationMs`. Whitespace
//! around fields is ignored, blank lines and `#` comments are skipped, and
//! malformed lines are skipped individually. A duration longer than
//! [`MAX_DURATION_MS`] makes its line malformed.

use std::path::Path;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use timbral_synth::{ControlEvent, Controller, KeyId, note_frequency};

use crate::error::ConfigError;

/// Synth key reserved for score playback.
pub const SCORE_KEY: KeyId = 0xFFFF_0000;

/// Longest accepted event, one hour. Longer lines are malformed.
pub const MAX_DURATION_MS: u64 = 3_600_000;

/// Longest sleep between checks of the stop flag.
const STOP_POLL: Duration = Duration::from_millis(20);

/// One line of a score.
#[derive(Debug, Clone, PartialEq)]
pub enum ScoreEvent {
    /// Play a note for `duration_ms`.
    Note {
        /// Note name as written, e.g. `C#4`.
        name: String,
        /// Frequency in Hz.
        frequency: f32,
        /// Length in milliseconds.
        duration_ms: u64,
    },
    /// Stay silent for `duration_ms`.
    Rest {
        /// Length in milliseconds.
        duration_ms: u64,
    },
}

impl ScoreEvent {
    /// Length in milliseconds.
    pub fn duration_ms(&self) -> u64 {
        match self {
            ScoreEvent::Note { duration_ms, .. } | ScoreEvent::Rest { duration_ms } => {
                *duration_ms
            }
        }
    }
}

impl FromStr for ScoreEvent {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let (name, duration) = line
            .split_once(',')
            .ok_or_else(|| "expected NAME,durationMs".to_string())?;
        let name = name.trim();
        let duration_ms: u64 = duration
            .trim()
            .parse()
            .map_err(|_| format!("bad duration '{}'", duration.trim()))?;
        if duration_ms > MAX_DURATION_MS {
            return Err(format!(
                "duration {} ms is longer than {} ms",
                duration_ms, MAX_DURATION_MS
            ));
        }

        if name.eq_ignore_ascii_case("REST") {
            return Ok(ScoreEvent::Rest { duration_ms });
        }
        let frequency = note_frequency(name).ok_or_else(|| format!("unknown note '{}'", name))?;
        Ok(ScoreEvent::Note {
            name: name.to_string(),
            frequency,
            duration_ms,
        })
    }
}

/// A parsed score.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Score {
    events: Vec<ScoreEvent>,
    skipped: usize,
}

impl Score {
    /// Parse score text. Never fails; bad lines are counted in
    /// [`skipped`](Self::skipped).
    pub fn parse(text: &str) -> Self {
        let mut score = Score::default();
        for (number, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match line.parse::<ScoreEvent>() {
                Ok(event) => score.events.push(event),
                Err(reason) => {
                    tracing::debug!(line = number + 1, %reason, "skipping score line");
                    score.skipped += 1;
                }
            }
        }
        score
    }

    /// Read and parse a score file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        let score = Self::parse(&text);
        tracing::debug!(
            path = %path.display(),
            events = score.len(),
            skipped = score.skipped,
            "score loaded"
        );
        Ok(score)
    }

    /// Parsed events in order.
    pub fn events(&self) -> &[ScoreEvent] {
        &self.events
    }

    /// Number of malformed lines that were skipped.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Number of parsed events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the score has no events.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Total length in milliseconds.
    pub fn total_ms(&self) -> u64 {
        self.events
            .iter()
            .fold(0u64, |total, e| total.saturating_add(e.duration_ms()))
    }
}

/// Turns a [`Score`] into note-on/note-off control events.
///
/// All notes use [`SCORE_KEY`], so score playback never collides with keys
/// held by an interactive player.
#[derive(Debug, Clone)]
pub struct ScorePlayer<'a> {
    score: &'a Score,
}

impl<'a> ScorePlayer<'a> {
    /// Create a player for `score`.
    pub fn new(score: &'a Score) -> Self {
        Self { score }
    }

    /// Events at sample offsets, for offline rendering.
    ///
    /// Each note is switched on at its start and off at start + duration.
    pub fn timed_events(&self, sample_rate: f32) -> Vec<(u64, ControlEvent)> {
        let to_samples = |ms: u64| (ms as f64 * f64::from(sample_rate) / 1000.0).round() as u64;
        let mut events = Vec::with_capacity(self.score.len() * 2);
        let mut elapsed_ms = 0u64;
        for event in self.score.events() {
            if let ScoreEvent::Note {
                frequency,
                duration_ms,
                ..
            } = event
            {
                events.push((
                    to_samples(elapsed_ms),
                    ControlEvent::NoteOn {
                        key: SCORE_KEY,
                        frequency: *frequency,
                    },
                ));
                events.push((
                    to_samples(elapsed_ms.saturating_add(*duration_ms)),
                    ControlEvent::NoteOff { key: SCORE_KEY },
                ));
            }
            elapsed_ms = elapsed_ms.saturating_add(event.duration_ms());
        }
        events
    }

    /// Total length in samples.
    pub fn total_samples(&self, sample_rate: f32) -> u64 {
        (self.score.total_ms() as f64 * f64::from(sample_rate) / 1000.0).round() as u64
    }

    /// Play in real time through `controller`, sleeping between events.
    ///
    /// Returns the number of notes started. Clearing `running` stops
    /// playback within a few milliseconds and releases the current note.
    pub fn play(&self, controller: &Controller, running: &AtomicBool) -> usize {
        let mut played = 0;
        for event in self.score.events() {
            if !running.load(Ordering::Acquire) {
                break;
            }
            match event {
                ScoreEvent::Note {
                    name,
                    frequency,
                    duration_ms,
                } => {
                    tracing::debug!(note = %name, duration_ms, "score note");
                    controller.note_on(SCORE_KEY, *frequency);
                    played += 1;
                    wait(Duration::from_millis(*duration_ms), running);
                    controller.note_off(SCORE_KEY);
                }
                ScoreEvent::Rest { duration_ms } => {
                    wait(Duration::from_millis(*duration_ms), running);
                }
            }
        }
        played
    }
}

fn wait(duration: Duration, running: &AtomicBool) {
    let start = Instant::now();
    let deadline = start.checked_add(duration);
    while running.load(Ordering::Acquire) {
        let now = Instant::now();
        let remaining = match deadline {
            Some(deadline) if now >= deadline => break,
            Some(deadline) => deadline - now,
            None => STOP_POLL,
        };
        std::thread::sleep(remaining.min(STOP_POLL));
    }
}
