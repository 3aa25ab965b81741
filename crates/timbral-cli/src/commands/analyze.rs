//! Spectrum analysis command: live input, WAV files or raw PCM.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use clap::{Args, Subcommand};
use timbral_analysis::{SnapshotPublisher, SnapshotReader, SpectrumAnalyzer, SpectrumSnapshot};
use timbral_config::EngineConfig;
use timbral_io::{CaptureLoop, CaptureSource, CpalSource, Pcm16LeSource, WavRecorder, WavSource};

use super::common::{GlobalOpts, load_config, stop_on_ctrlc};

#[derive(Args)]
pub struct AnalyzeArgs {
    /// FFT size, a power of two (overrides the settings file)
    #[arg(long, global = true)]
    fft_size: Option<usize>,

    #[command(subcommand)]
    source: AnalyzeSource,
}

#[derive(Subcommand)]
enum AnalyzeSource {
    /// Analyze the default (or named) input device until Ctrl+C
    Live {
        /// Input device name
        #[arg(long)]
        device: Option<String>,

        /// Also record the captured audio to this WAV file
        #[arg(long)]
        record: Option<PathBuf>,
    },

    /// Analyze a WAV file frame by frame
    File {
        /// Input WAV file
        path: PathBuf,
    },

    /// Analyze raw signed 16-bit little-endian mono PCM ("-" for stdin)
    Raw {
        /// Input file
        path: PathBuf,

        /// Sample rate of the recording (defaults to the engine rate)
        #[arg(long)]
        rate: Option<u32>,
    },
}

/// Strongest frame seen while analyzing a recording.
#[derive(Debug, Default)]
struct Summary {
    frames: u64,
    loudest_frame: u64,
    loudest_magnitude: f64,
    loudest_frequency: f32,
}

impl Summary {
    fn observe(&mut self, snapshot: &SpectrumSnapshot) {
        self.frames += 1;
        if snapshot.peak_magnitude > self.loudest_magnitude {
            self.loudest_frame = snapshot.frame_index;
            self.loudest_magnitude = snapshot.peak_magnitude;
            self.loudest_frequency = snapshot.dominant_frequency;
        }
    }
}

/// One display line for a snapshot.
fn format_frame(snapshot: &SpectrumSnapshot) -> String {
    format!(
        "{:>6}  {:>9.1} Hz  {}",
        snapshot.frame_index,
        snapshot.dominant_frequency,
        snapshot.bar_graph()
    )
}

fn build_analyzer(
    config: &EngineConfig,
    fft_size: Option<usize>,
    sample_rate: u32,
) -> anyhow::Result<SpectrumAnalyzer> {
    let size = fft_size.unwrap_or(config.analyzer.fft_size);
    Ok(SpectrumAnalyzer::new(size, sample_rate as f32)?.with_smoothing(config.analyzer.smoothing))
}

/// Analyze a finite source, printing every frame.
fn analyze_recording<S: CaptureSource + ?Sized>(
    source: &mut S,
    mut analyzer: SpectrumAnalyzer,
) -> anyhow::Result<()> {
    let publisher = SnapshotPublisher::new(analyzer.fft_size(), analyzer.sample_rate());
    let running = AtomicBool::new(true);
    let mut summary = Summary::default();

    println!(
        "FFT size {} at {} Hz ({:.2} Hz per bin)",
        analyzer.fft_size(),
        source.sample_rate(),
        analyzer.bin_width()
    );
    println!("{:>6}  {:>12}", "frame", "dominant");

    CaptureLoop::new().run_with(source, &mut analyzer, &publisher, &running, |snapshot| {
        println!("{}", format_frame(snapshot));
        summary.observe(snapshot);
    })?;

    if summary.frames == 0 {
        println!("No audio to analyze.");
    } else {
        println!(
            "\n{} frames, strongest peak {:.1} Hz in frame {}",
            summary.frames, summary.loudest_frequency, summary.loudest_frame
        );
    }
    Ok(())
}

fn display(reader: SnapshotReader, refresh_hz: f32, running: Arc<AtomicBool>) {
    let period = Duration::from_secs_f32(1.0 / refresh_hz.max(1.0));
    let mut shown = 0;
    while running.load(Ordering::Acquire) {
        let latest = reader.latest();
        if !latest.is_empty() && latest.frame_index != shown {
            shown = latest.frame_index;
            println!("{}", format_frame(&latest));
        }
        thread::sleep(period);
    }
}

fn analyze_live(
    config: &EngineConfig,
    fft_size: Option<usize>,
    device: Option<&str>,
    record: Option<PathBuf>,
) -> anyhow::Result<()> {
    let running = stop_on_ctrlc()?;
    let mut source = CpalSource::open(device, config.sample_rate)?;
    let mut analyzer = build_analyzer(config, fft_size, config.sample_rate)?;
    let publisher = SnapshotPublisher::new(analyzer.fft_size(), analyzer.sample_rate());

    let mut capture = CaptureLoop::new();
    if let Some(path) = &record {
        capture = capture.with_recorder(WavRecorder::create(path, config.sample_rate)?);
        println!("Recording to {}", path.display());
    }

    println!(
        "Analyzing {} at {} Hz, FFT size {}. Press Ctrl+C to stop.",
        source.device_name(),
        config.sample_rate,
        analyzer.fft_size()
    );

    let display_thread = {
        let reader = publisher.reader();
        let running = Arc::clone(&running);
        let refresh_hz = config.analyzer.refresh_hz;
        thread::spawn(move || display(reader, refresh_hz, running))
    };

    let frames = capture.run(&mut source, &mut analyzer, &publisher, &running);
    running.store(false, Ordering::Release);
    display_thread
        .join()
        .map_err(|_| anyhow::anyhow!("display thread panicked"))?;
    let frames = frames?;

    tracing::info!(frames, dropped = source.dropped_chunks(), "capture finished");
    Ok(())
}

pub fn run(args: AnalyzeArgs, global: &GlobalOpts) -> anyhow::Result<()> {
    let config = load_config(global)?;
    match args.source {
        AnalyzeSource::Live { device, record } => {
            analyze_live(&config, args.fft_size, device.as_deref(), record)
        }
        AnalyzeSource::File { path } => {
            let mut source = WavSource::open(&path)?;
            let analyzer = build_analyzer(&config, args.fft_size, source.sample_rate())?;
            analyze_recording(&mut source, analyzer)
        }
        AnalyzeSource::Raw { path, rate } => {
            let rate = rate.unwrap_or(config.sample_rate);
            let reader: Box<dyn Read> = if path.as_os_str() == "-" {
                Box::new(std::io::stdin().lock())
            } else {
                Box::new(BufReader::new(File::open(&path)?))
            };
            let mut source = Pcm16LeSource::new(reader, rate);
            let analyzer = build_analyzer(&config, args.fft_size, rate)?;
            analyze_recording(&mut source, analyzer)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(frame_index: u64, peak_magnitude: f64, dominant_frequency: f32) -> SpectrumSnapshot {
        let mut s = SpectrumSnapshot::empty(8, 48000.0);
        s.frame_index = frame_index;
        s.peak_magnitude = peak_magnitude;
        s.dominant_frequency = dominant_frequency;
        s
    }

    #[test]
    fn test_summary_keeps_strongest_frame() {
        let mut summary = Summary::default();
        summary.observe(&snapshot(1, 2.0, 440.0));
        summary.observe(&snapshot(2, 9.0, 880.0));
        summary.observe(&snapshot(3, 4.0, 220.0));
        assert_eq!(summary.frames, 3);
        assert_eq!(summary.loudest_frame, 2);
        assert_eq!(summary.loudest_frequency, 880.0);
    }

    #[test]
    fn test_frame_line_has_frequency_and_bar() {
        let line = format_frame(&snapshot(7, 0.1, 4687.5));
        assert!(line.contains("4687.5 Hz"));
        assert!(line.ends_with("█████"));
    }

    #[test]
    fn test_fft_size_override() {
        let config = EngineConfig::default();
        let analyzer = build_analyzer(&config, Some(256), 48000).unwrap();
        assert_eq!(analyzer.fft_size(), 256);
        assert!(build_analyzer(&config, Some(300), 48000).is_err());
    }
}
