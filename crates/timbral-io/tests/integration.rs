//! Integration tests for timbral-io.
//!
//! Drives the render loop from a control thread, renders to WAV files and
//! feeds rendered audio back through the capture loop.

use std::io::Cursor;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use tempfile::NamedTempFile;
use timbral_analysis::{SnapshotPublisher, SpectrumAnalyzer};
use timbral_io::{
    CaptureLoop, NullSink, Pcm16LeSource, RenderLoop, VecSink, WavRecorder, WavSink, WavSource,
    read_wav, read_wav_info, render_offline, render_to_sink,
};
use timbral_synth::{ControlEvent, DrumKind, Engine, Param, Waveform, control_channel};

const SR: f32 = 96000.0;

fn sine_note_events(frequency: f32) -> Vec<(u64, ControlEvent)> {
    vec![
        (0, ControlEvent::SetWaveform(Waveform::Sine)),
        (0, ControlEvent::NoteOn { key: 1, frequency }),
    ]
}

// ---------------------------------------------------------------------------
// 1. Render loop under a live control thread
// ---------------------------------------------------------------------------

#[test]
fn render_loop_applies_events_from_control_thread() {
    let mut engine = Engine::new(SR);
    let (controller, queue) = control_channel(64);
    let running = Arc::new(AtomicBool::new(true));

    let control = {
        let running = Arc::clone(&running);
        thread::spawn(move || {
            controller.note_on(7, 440.0);
            controller.trigger_drum(DrumKind::Kick);
            thread::sleep(Duration::from_millis(30));
            running.store(false, Ordering::Release);
        })
    };

    let mut sink = VecSink::new();
    let blocks = RenderLoop::new(256)
        .run(&mut engine, &queue, &mut sink, &running)
        .unwrap();
    control.join().unwrap();

    assert!(blocks > 0);
    assert_eq!(sink.data().len() as u64, blocks * 512);
    assert!(sink.is_closed());
    // Both events were queued before the flag cleared, so the loop saw them.
    assert!(
        sink.samples().iter().any(|s| s.abs() > 0.01),
        "rendered audio is silent"
    );
}

#[test]
fn render_loop_counts_blocks_into_null_sink() {
    let mut engine = Engine::new(SR);
    let (_controller, queue) = control_channel(8);
    let running = Arc::new(AtomicBool::new(true));
    let stopper = {
        let running = Arc::clone(&running);
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(10));
            running.store(false, Ordering::Release);
        })
    };

    let mut sink = NullSink::new();
    let blocks = RenderLoop::default()
        .run(&mut engine, &queue, &mut sink, &running)
        .unwrap();
    stopper.join().unwrap();
    assert_eq!(sink.blocks(), blocks);
    assert_eq!(sink.bytes(), blocks * 1024, "512-sample blocks are 1024 bytes");
}

// ---------------------------------------------------------------------------
// 2. Offline rendering to WAV
// ---------------------------------------------------------------------------

#[test]
fn offline_render_to_wav_matches_float_render() {
    let events = vec![
        (0, ControlEvent::Strum(timbral_synth::Chord::GMajor)),
        (4800, ControlEvent::TriggerDrum(DrumKind::Snare)),
        (
            0,
            ControlEvent::SetParam {
                param: Param::MasterGain,
                value: 0.8,
            },
        ),
    ];

    let file = NamedTempFile::new().unwrap();
    let mut sink = WavSink::create(file.path(), SR as u32).unwrap();
    let mut engine = Engine::with_seed(SR, 11);
    render_to_sink(&mut engine, &events, 19200, 512, &mut sink).unwrap();
    assert_eq!(sink.samples_written(), 19200);

    let info = read_wav_info(file.path()).unwrap();
    assert_eq!(info.sample_rate, 96000);
    assert_eq!(info.bits_per_sample, 16);
    assert_eq!(info.num_frames, 19200);

    let (from_file, _) = read_wav(file.path()).unwrap();
    let floats = render_offline(&mut Engine::with_seed(SR, 11), &events, 0.2);
    assert_eq!(floats.len(), from_file.len());
    for (a, b) in floats.iter().zip(&from_file) {
        assert!((a - b).abs() <= 2.0 / 32768.0, "{} vs {}", a, b);
    }
}

// ---------------------------------------------------------------------------
// 3. Rendered audio back through the analyzer
// ---------------------------------------------------------------------------

#[test]
fn rendered_tone_analyzed_from_raw_pcm() {
    // 1500 Hz sits exactly on bin 16 at 96 kHz / 1024.
    let mut engine = Engine::new(SR);
    let mut sink = VecSink::new();
    render_to_sink(&mut engine, &sine_note_events(1500.0), 8192, 512, &mut sink).unwrap();

    // The render path writes big-endian; raw captures are little-endian.
    let le: Vec<u8> = sink
        .data()
        .chunks_exact(2)
        .flat_map(|pair| [pair[1], pair[0]])
        .collect();

    let mut source = Pcm16LeSource::new(Cursor::new(le), 96000);
    let mut analyzer = SpectrumAnalyzer::new(1024, SR).unwrap();
    let publisher = SnapshotPublisher::new(1024, SR);
    let running = AtomicBool::new(true);

    let mut peaks = Vec::new();
    let frames = CaptureLoop::new()
        .run_with(&mut source, &mut analyzer, &publisher, &running, |s| {
            peaks.push(s.peak_bin)
        })
        .unwrap();

    assert_eq!(frames, 8);
    // Skip the attack in the first frame.
    assert!(peaks[1..].iter().all(|&bin| bin == 16), "peaks {:?}", peaks);
    assert_eq!(publisher.reader().latest().dominant_frequency, 1500.0);
}

#[test]
fn capture_loop_tees_input_to_wav() {
    let tone: Vec<f32> = (0..3000)
        .map(|i| 0.5 * (std::f32::consts::TAU * 440.0 * i as f32 / 48000.0).sin())
        .collect();
    let mut source = WavSource::from_samples(tone.clone(), 48000);
    let mut analyzer = SpectrumAnalyzer::new(512, 48000.0).unwrap();
    let publisher = SnapshotPublisher::new(512, 48000.0);
    let running = AtomicBool::new(true);

    let file = NamedTempFile::new().unwrap();
    let recorder = WavRecorder::create(file.path(), 48000).unwrap();
    let frames = CaptureLoop::new()
        .with_recorder(recorder)
        .run(&mut source, &mut analyzer, &publisher, &running)
        .unwrap();
    assert_eq!(frames, 6, "3000 samples in 512-sample frames");

    // Only real input is recorded, not the zero padding of the last frame.
    let (recorded, sr) = read_wav(file.path()).unwrap();
    assert_eq!(sr, 48000);
    assert_eq!(recorded.len(), 3000);
    for (a, b) in tone.iter().zip(&recorded) {
        assert!((a - b).abs() < 1e-4);
    }
}

#[test]
fn wav_file_source_round_trip() {
    let file = NamedTempFile::new().unwrap();
    let mut engine = Engine::new(SR);
    let mut sink = WavSink::create(file.path(), SR as u32).unwrap();
    render_to_sink(&mut engine, &sine_note_events(4687.5), 4096, 1024, &mut sink).unwrap();

    let mut source = WavSource::open(file.path()).unwrap();
    let mut analyzer = SpectrumAnalyzer::new(1024, SR).unwrap();
    let publisher = SnapshotPublisher::new(1024, SR);
    let running = AtomicBool::new(true);
    let frames = CaptureLoop::new()
        .run(&mut source, &mut analyzer, &publisher, &running)
        .unwrap();

    assert_eq!(frames, 4);
    assert_eq!(publisher.reader().latest().peak_bin, 50);
}
