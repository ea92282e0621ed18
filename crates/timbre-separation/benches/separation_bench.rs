//! Criterion benchmarks for the separator
//!
//! Run with: cargo bench -p timbre-separation
#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use timbre_config::{SeparationMode, SeparationSettings};
use timbre_core::{NoProgress, PcmBuffer, StemKind};
use timbre_separation::StemSeparator;

const SAMPLE_RATE: f32 = 44100.0;

fn generate_test_signal(seconds: f32) -> PcmBuffer {
    let len = (seconds * SAMPLE_RATE) as usize;
    let mix: Vec<f32> = (0..len)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE;
            0.4 * (2.0 * std::f32::consts::PI * 110.0 * t).sin()
                + 0.2 * (2.0 * std::f32::consts::PI * 1760.0 * t).sin()
        })
        .collect();
    PcmBuffer::stereo(mix.clone(), mix, SAMPLE_RATE).unwrap()
}

fn bench_modes(c: &mut Criterion) {
    let mut group = c.benchmark_group("separate");
    group.sample_size(10);
    let input = generate_test_signal(2.0);
    for mode in [SeparationMode::Coarse, SeparationMode::Fine] {
        let separator = StemSeparator::new(&SeparationSettings::for_mode(mode)).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(mode), &input, |b, input| {
            b.iter(|| black_box(separator.separate(black_box(input)).unwrap()))
        });
    }
    group.finish();
}

fn bench_single_stem(c: &mut Criterion) {
    let input = generate_test_signal(2.0);
    let separator =
        StemSeparator::new(&SeparationSettings::for_mode(SeparationMode::Fine)).unwrap();
    let profile = separator.analyze(&input).unwrap();
    c.bench_function("separate_stem/vocals", |b| {
        b.iter(|| {
            black_box(
                separator
                    .separate_stem(black_box(&input), StemKind::Vocals, &profile, &mut NoProgress)
                    .unwrap(),
            )
        })
    });
}

criterion_group!(benches, bench_modes, bench_single_stem);
criterion_main!(benches);
