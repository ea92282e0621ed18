//! Criterion benchmarks for the enhancement stages
//!
//! Run with: cargo bench -p timbre-effects
#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use timbre_config::{FACTORY_PRESET_NAMES, get_factory_preset};
use timbre_core::{Effect, PcmBuffer};
use timbre_effects::{Compressor, EnhancementChain, HarmonicExciter, Limiter, NoiseReducer};

const SAMPLE_RATE: f32 = 48000.0;
const LENGTHS: &[usize] = &[4096, 48000];

fn generate_test_signal(size: usize) -> PcmBuffer {
    let tone: Vec<f32> = (0..size)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE;
            (2.0 * std::f32::consts::PI * 440.0 * t).sin() * 0.5
        })
        .collect();
    PcmBuffer::stereo(tone.clone(), tone, SAMPLE_RATE).unwrap()
}

fn bench_effect<E: Effect>(c: &mut Criterion, name: &str, mut effect: E) {
    let mut group = c.benchmark_group(name);
    for &len in LENGTHS {
        let input = generate_test_signal(len);
        group.bench_with_input(BenchmarkId::from_parameter(len), &len, |b, _| {
            b.iter(|| black_box(effect.process(black_box(&input)).unwrap()))
        });
    }
    group.finish();
}

fn bench_stages(c: &mut Criterion) {
    bench_effect(c, "NoiseReducer", NoiseReducer::new(0.5, 0.05).unwrap());
    bench_effect(c, "Compressor", Compressor::new(SAMPLE_RATE));
    bench_effect(c, "Limiter", Limiter::new(-1.0, 50.0, 5.0, SAMPLE_RATE));
    bench_effect(c, "HarmonicExciter", HarmonicExciter::new(0.5, 0.5, 0.5, SAMPLE_RATE));
}

fn bench_presets(c: &mut Criterion) {
    let mut group = c.benchmark_group("EnhancementChain");
    let input = generate_test_signal(48000);
    for name in FACTORY_PRESET_NAMES {
        let settings = get_factory_preset(name).unwrap();
        let mut chain = EnhancementChain::from_settings(&settings, SAMPLE_RATE).unwrap();
        group.bench_function(*name, |b| {
            b.iter(|| black_box(chain.process(black_box(&input)).unwrap()))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_stages, bench_presets);
criterion_main!(benches);
