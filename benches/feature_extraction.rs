use std::hint::black_box;

use audiogender::analysis::{
    ResampleMethod, SignalOptions, analyze_clip, extract_features, resample, transform,
};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use rand::SeedableRng;
use rand::rngs::StdRng;

const SOURCE_RATE: u32 = 48_000;

fn recording(len: usize) -> Vec<f32> {
    (0..len)
        .map(|i| {
            let t = i as f32 / SOURCE_RATE as f32;
            ((2.0 * std::f32::consts::PI * 180.0 * t).sin() * 4_000.0
                + (2.0 * std::f32::consts::PI * 1_250.0 * t).sin() * 900.0)
                .round()
        })
        .collect()
}

fn bench_resample(c: &mut Criterion) {
    let samples = recording(30_000);
    for method in [ResampleMethod::Fft, ResampleMethod::Linear] {
        c.bench_with_input(
            BenchmarkId::new("resample_48k_to_8k", format!("{method:?}")),
            &samples,
            |b, samples| b.iter(|| resample(black_box(samples), SOURCE_RATE, 8_000, method)),
        );
    }
}

fn bench_spectrum_features(c: &mut Criterion) {
    let frame = recording(8_000);
    c.bench_function("transform_and_describe_8000", |b| {
        b.iter(|| extract_features(&transform(black_box(&frame))))
    });
}

fn bench_analyze_clip(c: &mut Criterion) {
    let samples = recording(30_000);
    let options = SignalOptions::default();
    c.bench_function("analyze_clip_48k", |b| {
        let mut rng = StdRng::seed_from_u64(0);
        b.iter(|| analyze_clip(black_box(&samples), SOURCE_RATE, &options, &mut rng))
    });
}

criterion_group!(
    benches,
    bench_resample,
    bench_spectrum_features,
    bench_analyze_clip
);
criterion_main!(benches);
