//! Criterion benchmarks for timbre-core transforms
//!
//! Run with: cargo bench -p timbre-core
#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use timbre_core::{
    Biquad, BiquadCoefficients, CancelToken, Fft, OverlapAdd, WindowKind, apply_window,
    generate_window,
};

const SAMPLE_RATE: f32 = 44100.0;
const FFT_SIZES: &[usize] = &[512, 1024, 2048, 4096, 8192];

fn generate_test_signal(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE;
            (2.0 * std::f32::consts::PI * 440.0 * t).sin() * 0.5
        })
        .collect()
}

fn bench_fft(c: &mut Criterion) {
    let mut group = c.benchmark_group("Fft");

    for &size in FFT_SIZES {
        let fft = Fft::new(size).unwrap();
        let window = generate_window(WindowKind::Hann, size);
        let input = apply_window(&generate_test_signal(size), &window);

        group.bench_with_input(BenchmarkId::new("forward", size), &size, |b, _| {
            b.iter(|| black_box(fft.forward(black_box(&input), SAMPLE_RATE).unwrap()));
        });

        let spectrum = fft.forward(&input, SAMPLE_RATE).unwrap();
        group.bench_with_input(BenchmarkId::new("inverse", size), &size, |b, _| {
            b.iter(|| black_box(fft.inverse(black_box(&spectrum)).unwrap()));
        });
    }

    group.finish();
}

fn bench_overlap_add(c: &mut Criterion) {
    let mut group = c.benchmark_group("OverlapAdd");
    group.sample_size(20);

    let ola = OverlapAdd::hann_default().unwrap();
    let cancel = CancelToken::new();
    for seconds in [1usize, 5] {
        let input = generate_test_signal(seconds * SAMPLE_RATE as usize);
        group.bench_with_input(BenchmarkId::new("identity", seconds), &seconds, |b, _| {
            b.iter(|| {
                black_box(
                    ola.process(black_box(&input), SAMPLE_RATE, &cancel, |_, s| Ok(s))
                        .unwrap(),
                )
            });
        });
    }

    group.finish();
}

fn bench_biquad(c: &mut Criterion) {
    let input = generate_test_signal(1024);
    let coeffs = BiquadCoefficients::peaking(3000.0, 1.0, 4.0, SAMPLE_RATE);

    c.bench_function("Biquad/peaking_1024", |b| {
        let mut filter = Biquad::new(coeffs);
        b.iter(|| {
            for &sample in &input {
                black_box(filter.process(black_box(sample)));
            }
        });
    });
}

criterion_group!(benches, bench_fft, bench_overlap_add, bench_biquad);
criterion_main!(benches);
