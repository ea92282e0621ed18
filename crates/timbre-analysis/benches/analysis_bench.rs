//! Criterion benchmarks for timbre-analysis components
//!
//! Run with: cargo bench -p timbre-analysis
#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use std::f32::consts::PI;
use timbre_analysis::{
    Framer, HarmonicAnalyzer, PsychoacousticAnalyzer, SpatialAnalyzer, SpectralAnalyzer,
    analyze_dynamics,
};
use timbre_core::PcmBuffer;

const SAMPLE_RATE: f32 = 48000.0;

/// Generate a complex test signal with multiple harmonics
fn generate_complex_signal(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE;
            let f1 = (2.0 * PI * 440.0 * t).sin();
            let f2 = 0.5 * (2.0 * PI * 880.0 * t).sin();
            let f3 = 0.25 * (2.0 * PI * 1320.0 * t).sin();
            let f4 = 0.125 * (2.0 * PI * 1760.0 * t).sin();
            (f1 + f2 + f3 + f4) * 0.5
        })
        .collect()
}

fn bench_spectral(c: &mut Criterion) {
    let mut group = c.benchmark_group("Spectral");
    for &size in &[1024usize, 4096, 8192] {
        let framer = Framer::new(size).unwrap();
        let spectrum = framer
            .spectrum(&generate_complex_signal(size), SAMPLE_RATE)
            .unwrap();
        group.bench_with_input(BenchmarkId::new("descriptors", size), &size, |b, _| {
            let mut analyzer = SpectralAnalyzer::new();
            b.iter(|| black_box(analyzer.analyze(black_box(&spectrum))));
        });
        group.bench_with_input(BenchmarkId::new("harmonic", size), &size, |b, _| {
            let analyzer = HarmonicAnalyzer::new();
            b.iter(|| black_box(analyzer.analyze(black_box(&spectrum))));
        });
        group.bench_with_input(BenchmarkId::new("psychoacoustic", size), &size, |b, _| {
            let analyzer = PsychoacousticAnalyzer::new(SAMPLE_RATE, size).unwrap();
            b.iter(|| black_box(analyzer.analyze(black_box(&spectrum)).unwrap()));
        });
    }
    group.finish();
}

fn bench_buffer_level(c: &mut Criterion) {
    let mut group = c.benchmark_group("Buffer");
    group.sample_size(20);
    let left = generate_complex_signal(SAMPLE_RATE as usize * 5);
    let right: Vec<f32> = left.iter().map(|x| x * 0.8).collect();
    let buffer = PcmBuffer::stereo(left.clone(), right.clone(), SAMPLE_RATE).unwrap();

    group.bench_function("dynamics_5s_stereo", |b| {
        b.iter(|| black_box(analyze_dynamics(black_box(&buffer)).unwrap()));
    });
    group.bench_function("spatial_5s", |b| {
        let analyzer = SpatialAnalyzer::new(2048).unwrap();
        b.iter(|| black_box(analyzer.analyze(&left, &right, SAMPLE_RATE).unwrap()));
    });
    group.finish();
}

criterion_group!(benches, bench_spectral, bench_buffer_level);
criterion_main!(benches);
