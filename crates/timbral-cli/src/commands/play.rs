//! Interactive play command.
//!
//! Reads one command per line from stdin and forwards it to the render
//! thread as control events:
//!
//! ```text
//! on A4            start a synth note      off A4        release it
//! set cutoff 0.4   change a parameter      set waveform saw
//! pluck 1 [fret]   pluck string 1-6        chord G       strum a chord
//! capo 2           move the capo           tuning drop_d retune
//! kick | snare | hihat | cymbal            quit
//! ```
//!
//! Each instrument mode also accepts a bare shorthand: a note name in
//! `synth` mode, a chord symbol in `guitar` mode.

use std::io::BufRead;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use clap::{Args, ValueEnum};
use timbral_io::{CpalSink, RenderLoop};
use timbral_synth::{
    Chord, ControlEvent, Controller, DEFAULT_QUEUE_CAPACITY, DrumKind, KeyId, STRING_COUNT,
    Tuning, control_channel, note_frequency, note_number,
};

use super::common::{GlobalOpts, load_config, stop_on_ctrlc};

/// How long to keep rendering after stdin closes, so the last notes ring out.
const TAIL: Duration = Duration::from_secs(2);

#[derive(Args)]
pub struct PlayArgs {
    /// Instrument whose shorthand commands are enabled
    #[arg(value_enum, default_value = "synth")]
    instrument: Instrument,

    /// Output device name (uses default if omitted)
    #[arg(long)]
    device: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Instrument {
    Synth,
    Guitar,
    Drums,
}

/// One parsed input line.
#[derive(Debug, PartialEq)]
pub enum LineCommand {
    Event(ControlEvent),
    Quit,
}

fn note_event(name: &str, on: bool) -> Option<ControlEvent> {
    let key = KeyId::from(note_number(name)?);
    Some(if on {
        ControlEvent::NoteOn {
            key,
            frequency: note_frequency(name)?,
        }
    } else {
        ControlEvent::NoteOff { key }
    })
}

/// Parse one input line. Returns `None` for blank or unrecognized lines.
pub fn parse_line(line: &str, instrument: Instrument) -> Option<LineCommand> {
    let mut words = line.split_whitespace();
    let command = words.next()?.to_ascii_lowercase();
    let args: Vec<&str> = words.collect();

    let event = match (command.as_str(), args.as_slice()) {
        ("quit" | "exit" | "q", []) => return Some(LineCommand::Quit),
        ("on", [note]) => note_event(note, true)?,
        ("off", [note]) => note_event(note, false)?,
        ("alloff" | "panic", []) => ControlEvent::AllNotesOff,
        ("set", [name, value]) => ControlEvent::parameter(name, value)?,
        ("pluck", [string, rest @ ..]) if rest.len() <= 1 => {
            let number: usize = string.parse().ok()?;
            if !(1..=STRING_COUNT).contains(&number) {
                return None;
            }
            let fret = match rest.first() {
                Some(f) => f.parse().ok()?,
                None => 0,
            };
            ControlEvent::PluckFret {
                index: number - 1,
                fret,
            }
        }
        ("chord" | "strum", [name]) => ControlEvent::Strum(Chord::from_name(name)?),
        ("capo", [fret]) => ControlEvent::SetCapo(fret.parse().ok()?),
        ("tuning", [name]) => ControlEvent::SetTuning(Tuning::from_name(name)?.frequencies()),
        (word, []) => {
            if let Some(kind) = DrumKind::from_name(word) {
                ControlEvent::TriggerDrum(kind)
            } else {
                match instrument {
                    Instrument::Synth => note_event(word, true)?,
                    Instrument::Guitar => ControlEvent::Strum(Chord::from_name(word)?),
                    Instrument::Drums => return None,
                }
            }
        }
        _ => return None,
    };
    Some(LineCommand::Event(event))
}

fn read_commands(controller: Controller, instrument: Instrument, running: Arc<AtomicBool>) {
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let Ok(line) = line else { break };
        if !running.load(Ordering::Acquire) {
            return;
        }
        if line.trim().is_empty() {
            continue;
        }
        match parse_line(&line, instrument) {
            Some(LineCommand::Quit) => {
                running.store(false, Ordering::Release);
                return;
            }
            Some(LineCommand::Event(event)) => {
                tracing::debug!(?event, "command");
                controller.send(event);
            }
            None => eprintln!("unrecognized command: {}", line.trim()),
        }
    }

    // stdin closed: let the sound ring out, then stop.
    thread::sleep(TAIL);
    running.store(false, Ordering::Release);
}

pub fn run(args: PlayArgs, global: &GlobalOpts) -> anyhow::Result<()> {
    let config = load_config(global)?;
    let mut engine = config.build_engine()?;
    let (controller, queue) = control_channel(DEFAULT_QUEUE_CAPACITY);
    let running = stop_on_ctrlc()?;

    let mut sink = CpalSink::open(args.device.as_deref(), config.sample_rate)?;
    println!(
        "Playing {:?} on {} at {} Hz. Type commands, 'quit' to stop.",
        args.instrument,
        sink.device_name(),
        config.sample_rate
    );

    {
        let running = Arc::clone(&running);
        let instrument = args.instrument;
        thread::spawn(move || read_commands(controller, instrument, running));
    }

    let blocks = RenderLoop::new(config.block_size).run(&mut engine, &queue, &mut sink, &running)?;
    tracing::info!(blocks, underruns = sink.underruns(), "playback finished");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use timbral_synth::{Param, Waveform, midi_to_freq};

    fn event(line: &str, instrument: Instrument) -> Option<ControlEvent> {
        match parse_line(line, instrument)? {
            LineCommand::Event(e) => Some(e),
            LineCommand::Quit => None,
        }
    }

    #[test]
    fn test_note_commands_use_midi_keys() {
        assert_eq!(
            event("on A4", Instrument::Drums),
            Some(ControlEvent::NoteOn {
                key: 69,
                frequency: midi_to_freq(69)
            })
        );
        assert_eq!(
            event("OFF a4", Instrument::Synth),
            Some(ControlEvent::NoteOff { key: 69 })
        );
    }

    #[test]
    fn test_set_commands() {
        assert_eq!(
            event("set cutoff 0.25", Instrument::Synth),
            Some(ControlEvent::SetParam {
                param: Param::Cutoff,
                value: 0.25
            })
        );
        assert_eq!(
            event("set waveform square", Instrument::Synth),
            Some(ControlEvent::SetWaveform(Waveform::Square))
        );
        assert_eq!(event("set wobble 1", Instrument::Synth), None);
    }

    #[test]
    fn test_guitar_commands() {
        assert_eq!(
            event("pluck 1", Instrument::Guitar),
            Some(ControlEvent::PluckFret { index: 0, fret: 0 })
        );
        assert_eq!(
            event("pluck 6 3", Instrument::Guitar),
            Some(ControlEvent::PluckFret { index: 5, fret: 3 })
        );
        assert_eq!(event("pluck 7", Instrument::Guitar), None);
        assert_eq!(event("pluck 0", Instrument::Guitar), None);
        assert_eq!(
            event("chord Em", Instrument::Synth),
            Some(ControlEvent::Strum(Chord::EMinor))
        );
        assert_eq!(
            event("tuning open_g", Instrument::Guitar),
            Some(ControlEvent::SetTuning(Tuning::OpenG.frequencies()))
        );
        assert_eq!(
            event("capo 4", Instrument::Guitar),
            Some(ControlEvent::SetCapo(4))
        );
    }

    #[test]
    fn test_shorthand_depends_on_instrument() {
        assert_eq!(
            event("D", Instrument::Guitar),
            Some(ControlEvent::Strum(Chord::DMajor))
        );
        assert!(matches!(
            event("D4", Instrument::Synth),
            Some(ControlEvent::NoteOn { key: 62, .. })
        ));
        assert_eq!(event("D4", Instrument::Drums), None);
        assert_eq!(
            event("snare", Instrument::Synth),
            Some(ControlEvent::TriggerDrum(DrumKind::Snare))
        );
    }

    #[test]
    fn test_quit_and_garbage() {
        assert_eq!(parse_line("quit", Instrument::Synth), Some(LineCommand::Quit));
        assert_eq!(parse_line("   ", Instrument::Synth), None);
        assert_eq!(parse_line("on", Instrument::Synth), None);
        assert_eq!(parse_line("fly away", Instrument::Synth), None);
    }
}
