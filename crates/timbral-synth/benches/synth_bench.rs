//! Criterion benchmarks for timbral-synth components
//!
//! Run with: cargo bench -p timbral-synth

#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use timbral_synth::{Chord, DrumKind, DrumKit, Engine, Guitar, VoicePool, Waveform};

const SAMPLE_RATE: f32 = 96000.0;
const BLOCK_SIZES: &[usize] = &[64, 256, 512, 1024];

// ============================================================================
// Voice pool
// ============================================================================

fn bench_voice_pool(c: &mut Criterion) {
    let mut group = c.benchmark_group("VoicePool");

    for waveform in Waveform::ALL {
        for &block_size in BLOCK_SIZES {
            let mut pool: VoicePool<8> = VoicePool::new(SAMPLE_RATE);
            pool.set_waveform(waveform);
            pool.set_cutoff(0.7);
            pool.set_resonance(0.3);
            for key in 0..8u32 {
                pool.note_on(key, 110.0 * (1.0 + key as f32 * 0.5));
            }

            group.bench_with_input(
                BenchmarkId::new(waveform.name(), block_size),
                &block_size,
                |b, &size| {
                    b.iter(|| {
                        let mut sum = 0.0f32;
                        for _ in 0..size {
                            sum += pool.process();
                        }
                        black_box(sum)
                    })
                },
            );
        }
    }

    group.finish();
}

// ============================================================================
// Guitar and drums
// ============================================================================

fn bench_guitar(c: &mut Criterion) {
    let mut group = c.benchmark_group("Guitar");

    for &block_size in BLOCK_SIZES {
        group.bench_with_input(
            BenchmarkId::new("strum", block_size),
            &block_size,
            |b, &size| {
                let mut guitar = Guitar::new(SAMPLE_RATE);
                b.iter(|| {
                    guitar.strum(Chord::EMinor);
                    let mut sum = 0.0f32;
                    for _ in 0..size {
                        sum += guitar.next_sample();
                    }
                    black_box(sum)
                })
            },
        );
    }

    group.finish();
}

fn bench_drums(c: &mut Criterion) {
    let mut group = c.benchmark_group("DrumKit");

    for &block_size in BLOCK_SIZES {
        group.bench_with_input(
            BenchmarkId::new("full_kit", block_size),
            &block_size,
            |b, &size| {
                let mut kit = DrumKit::new(SAMPLE_RATE);
                b.iter(|| {
                    kit.reset();
                    for kind in DrumKind::ALL {
                        kit.trigger(kind);
                    }
                    let mut sum = 0.0f32;
                    for _ in 0..size {
                        sum += kit.next_sample();
                    }
                    black_box(sum)
                })
            },
        );
    }

    group.finish();
}

// ============================================================================
// Engine
// ============================================================================

fn bench_engine_block(c: &mut Criterion) {
    let mut group = c.benchmark_group("Engine");

    for &block_size in BLOCK_SIZES {
        let mut engine = Engine::new(SAMPLE_RATE);
        for key in 0..4u32 {
            engine.apply(timbral_synth::ControlEvent::NoteOn {
                key,
                frequency: 220.0 + key as f32 * 55.0,
            });
        }
        engine.apply(timbral_synth::ControlEvent::Strum(Chord::DMajor));
        engine.apply(timbral_synth::ControlEvent::TriggerDrum(DrumKind::Cymbal));
        let mut block = vec![0.0f32; block_size];

        group.bench_with_input(
            BenchmarkId::new("render", block_size),
            &block_size,
            |b, _| {
                b.iter(|| {
                    engine.render(&mut block);
                    black_box(block[0])
                })
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_voice_pool,
    bench_guitar,
    bench_drums,
    bench_engine_block
);
criterion_main!(benches);
