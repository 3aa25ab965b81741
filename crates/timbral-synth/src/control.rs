//! Lock-free hand-off of control events to the render thread.
//!
//! The control side holds a cloneable [`Controller`] and enqueues intents
//! without ever blocking; the render side owns the [`ControlQueue`] and
//! drains it once per block. A full queue drops the event and logs a
//! warning, so a stalled render thread cannot back-pressure the UI.

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};

use crate::event::{ControlEvent, Param};
use crate::guitar::{Chord, STRING_COUNT};
use crate::oscillator::Waveform;
use crate::percussion::DrumKind;
use crate::voice::KeyId;

/// Default queue depth, enough for a few blocks of dense input.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Create a bounded control channel.
///
/// # Example
///
/// ```rust
/// use timbral_synth::{control_channel, ControlEvent};
///
/// let (controller, queue) = control_channel(64);
/// controller.note_on(1, 440.0);
/// controller.note_off(1);
///
/// let events: Vec<ControlEvent> = queue.drain().collect();
/// assert_eq!(events.len(), 2);
/// ```
pub fn control_channel(capacity: usize) -> (Controller, ControlQueue) {
    let (tx, rx) = bounded(capacity.max(1));
    (Controller { tx }, ControlQueue { rx })
}

/// Sending half, used by the control path.
#[derive(Debug, Clone)]
pub struct Controller {
    tx: Sender<ControlEvent>,
}

impl Controller {
    /// Enqueue an event without blocking.
    ///
    /// Returns `false` if the event was dropped because the queue is full
    /// or the render side has gone away.
    pub fn send(&self, event: ControlEvent) -> bool {
        match self.tx.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(event)) => {
                tracing::warn!(?event, "control queue full, event dropped");
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }

    /// Start a synth note.
    pub fn note_on(&self, key: KeyId, frequency: f32) -> bool {
        self.send(ControlEvent::NoteOn { key, frequency })
    }

    /// Release a synth note.
    pub fn note_off(&self, key: KeyId) -> bool {
        self.send(ControlEvent::NoteOff { key })
    }

    /// Release every synth voice.
    pub fn all_notes_off(&self) -> bool {
        self.send(ControlEvent::AllNotesOff)
    }

    /// Set a numeric parameter.
    pub fn set_param(&self, param: Param, value: f32) -> bool {
        self.send(ControlEvent::SetParam { param, value })
    }

    /// Set a parameter by name. Unknown names and bad values are dropped
    /// here and report `false`.
    pub fn set_parameter(&self, name: &str, value: &str) -> bool {
        match ControlEvent::parameter(name, value) {
            Some(event) => self.send(event),
            None => {
                tracing::debug!(name, value, "ignoring invalid parameter");
                false
            }
        }
    }

    /// Change the synth waveform.
    pub fn set_waveform(&self, waveform: Waveform) -> bool {
        self.send(ControlEvent::SetWaveform(waveform))
    }

    /// Pluck a guitar string at a frequency.
    pub fn pluck_string(&self, index: usize, frequency: f32) -> bool {
        self.send(ControlEvent::PluckString { index, frequency })
    }

    /// Pluck a guitar string at a fret.
    pub fn pluck_fret(&self, index: usize, fret: u8) -> bool {
        self.send(ControlEvent::PluckFret { index, fret })
    }

    /// Strum a chord.
    pub fn strum(&self, chord: Chord) -> bool {
        self.send(ControlEvent::Strum(chord))
    }

    /// Move the capo.
    pub fn set_capo(&self, fret: u8) -> bool {
        self.send(ControlEvent::SetCapo(fret))
    }

    /// Retune the guitar.
    pub fn set_tuning(&self, frequencies: [f32; STRING_COUNT]) -> bool {
        self.send(ControlEvent::SetTuning(frequencies))
    }

    /// Strike a drum.
    pub fn trigger_drum(&self, kind: DrumKind) -> bool {
        self.send(ControlEvent::TriggerDrum(kind))
    }
}

/// Receiving half, owned by the render path.
#[derive(Debug)]
pub struct ControlQueue {
    rx: Receiver<ControlEvent>,
}

impl ControlQueue {
    /// Iterate over every event queued so far without blocking.
    pub fn drain(&self) -> impl Iterator<Item = ControlEvent> + '_ {
        self.rx.try_iter()
    }

    /// Number of events waiting.
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    /// Whether no events are waiting.
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}
