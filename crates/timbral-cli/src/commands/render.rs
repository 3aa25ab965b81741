//! Offline rendering to WAV.

use std::path::PathBuf;

use clap::Args;
use timbral_config::{Score, ScorePlayer};
use timbral_io::{WavSink, render_to_sink};
use timbral_synth::{Chord, ControlEvent, DrumKind};

use super::common::{GlobalOpts, load_config};

#[derive(Args)]
pub struct RenderArgs {
    /// Output WAV file (16-bit mono)
    output: PathBuf,

    /// Score to render
    #[arg(long)]
    score: Option<PathBuf>,

    /// Length in seconds (default: score length plus one second, or 2s)
    #[arg(long)]
    seconds: Option<f32>,

    /// Strum a chord at the start (C, G, D, Em)
    #[arg(long)]
    chord: Option<String>,

    /// Hit a drum at the start (kick, snare, hihat, cymbal)
    #[arg(long)]
    drum: Option<String>,
}

/// Seconds rendered after a score ends.
const SCORE_TAIL_SECONDS: f32 = 1.0;

/// Length of a render with no score.
const DEFAULT_SECONDS: f32 = 2.0;

pub fn run(args: RenderArgs, global: &GlobalOpts) -> anyhow::Result<()> {
    let config = load_config(global)?;
    let sample_rate = config.sample_rate as f32;
    let mut engine = config.build_engine()?;

    let mut events = Vec::new();
    if let Some(name) = &args.chord {
        let chord = Chord::from_name(name)
            .ok_or_else(|| anyhow::anyhow!("unknown chord '{name}' (expected C, G, D or Em)"))?;
        events.push((0, ControlEvent::Strum(chord)));
    }
    if let Some(name) = &args.drum {
        let kind = DrumKind::from_name(name).ok_or_else(|| {
            anyhow::anyhow!("unknown drum '{name}' (expected kick, snare, hihat or cymbal)")
        })?;
        events.push((0, ControlEvent::TriggerDrum(kind)));
    }

    let mut score_samples = 0;
    if let Some(path) = &args.score {
        let score = Score::load(path)?;
        if score.skipped() > 0 {
            tracing::warn!(skipped = score.skipped(), "malformed score lines ignored");
        }
        let player = ScorePlayer::new(&score);
        events.extend(player.timed_events(sample_rate));
        score_samples = player.total_samples(sample_rate);
    }

    let seconds = match args.seconds {
        Some(s) if s.is_finite() && s > 0.0 => s,
        Some(s) => anyhow::bail!("--seconds must be positive, got {s}"),
        None if args.score.is_some() => score_samples as f32 / sample_rate + SCORE_TAIL_SECONDS,
        None => DEFAULT_SECONDS,
    };
    let total_samples = (seconds * sample_rate).round() as u64;

    tracing::info!(
        output = %args.output.display(),
        seconds,
        events = events.len(),
        "rendering"
    );
    let mut sink = WavSink::create(&args.output, config.sample_rate)?;
    let blocks = render_to_sink(
        &mut engine,
        &events,
        total_samples,
        config.block_size,
        &mut sink,
    )?;

    println!(
        "Wrote {} samples ({:.2}s, {} blocks) to {}",
        sink.samples_written(),
        seconds,
        blocks,
        args.output.display()
    );
    Ok(())
}
