//! Real-time score playback command.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::thread;
use std::time::Duration;

use clap::Args;
use timbral_config::{Score, ScorePlayer};
use timbral_io::{CpalSink, RenderLoop};
use timbral_synth::{DEFAULT_QUEUE_CAPACITY, control_channel};

use super::common::{GlobalOpts, load_config, stop_on_ctrlc};

#[derive(Args)]
pub struct ScoreArgs {
    /// Score file, one `NOTE,durationMs` or `REST,durationMs` per line
    file: PathBuf,

    /// Output device name (uses default if omitted)
    #[arg(long)]
    device: Option<String>,

    /// Milliseconds to keep rendering after the last event
    #[arg(long, default_value = "1000")]
    tail_ms: u64,
}

pub fn run(args: ScoreArgs, global: &GlobalOpts) -> anyhow::Result<()> {
    let config = load_config(global)?;
    let score = Score::load(&args.file)?;
    if score.skipped() > 0 {
        tracing::warn!(skipped = score.skipped(), "malformed score lines ignored");
    }
    if score.is_empty() {
        anyhow::bail!("{} contains no playable lines", args.file.display());
    }

    let mut engine = config.build_engine()?;
    let (controller, queue) = control_channel(DEFAULT_QUEUE_CAPACITY);
    let running = stop_on_ctrlc()?;
    let mut sink = CpalSink::open(args.device.as_deref(), config.sample_rate)?;

    println!(
        "Playing {} ({} events, {:.1}s) on {}",
        args.file.display(),
        score.len(),
        score.total_ms() as f64 / 1000.0,
        sink.device_name()
    );

    let tail = Duration::from_millis(args.tail_ms);
    let player = {
        let running = Arc::clone(&running);
        thread::spawn(move || {
            let played = ScorePlayer::new(&score).play(&controller, &running);
            if running.load(Ordering::Acquire) {
                thread::sleep(tail);
            }
            running.store(false, Ordering::Release);
            played
        })
    };

    let blocks = RenderLoop::new(config.block_size).run(&mut engine, &queue, &mut sink, &running);
    running.store(false, Ordering::Release);
    let played = player
        .join()
        .map_err(|_| anyhow::anyhow!("score player thread panicked"))?;
    let blocks = blocks?;

    tracing::info!(played, blocks, underruns = sink.underruns(), "score finished");
    println!("Played {played} notes.");
    Ok(())
}
