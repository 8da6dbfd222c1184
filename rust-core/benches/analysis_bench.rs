//! Criterion benchmarks for filtering and noise analysis
//!
//! Run with: cargo bench -p nanotrace-core

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use nanotrace::filters::{design_lowpass, downsample, low_pass};
use nanotrace::spectrum::welch_psd;
use nanotrace::AssembledSignal;

const SAMPLE_RATE: f64 = 250_000.0;

/// Baseline current with xorshift noise (pA)
fn generate_trace(size: usize) -> Vec<f64> {
    let mut state = 0x12345678u32;
    (0..size)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            120.0 + 5.0 * (state as i32 as f64) / (i32::MAX as f64)
        })
        .collect()
}

fn bench_design(c: &mut Criterion) {
    let mut group = c.benchmark_group("Bessel_Design");

    for order in [2, 4, 8, 16] {
        group.bench_with_input(BenchmarkId::from_parameter(order), &order, |b, &order| {
            b.iter(|| black_box(design_lowpass(order, black_box(0.2)).unwrap()))
        });
    }

    group.finish();
}

fn bench_low_pass(c: &mut Criterion) {
    let mut group = c.benchmark_group("Low_Pass");
    group.sample_size(20);

    for &size in &[10_000usize, 100_000, 1_000_000] {
        let signal = AssembledSignal::new(generate_trace(size), SAMPLE_RATE);
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| black_box(low_pass(black_box(&signal), 10_000.0, 8).unwrap()))
        });
    }

    group.finish();
}

fn bench_downsample(c: &mut Criterion) {
    let signal = AssembledSignal::new(generate_trace(1_000_000), SAMPLE_RATE);
    c.bench_function("Downsample_1M_to_10k", |b| {
        b.iter(|| black_box(downsample(black_box(&signal), 10_000.0).unwrap()))
    });
}

fn bench_welch(c: &mut Criterion) {
    let mut group = c.benchmark_group("Welch_PSD");
    group.sample_size(20);

    let samples = generate_trace(1 << 20);
    for &seconds in &[0.01, 0.1, 1.0] {
        group.bench_with_input(
            BenchmarkId::from_parameter(seconds),
            &seconds,
            |b, &seconds| {
                b.iter(|| {
                    black_box(welch_psd(black_box(&samples), SAMPLE_RATE, Some(seconds)).unwrap())
                })
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_design, bench_low_pass, bench_downsample, bench_welch);
criterion_main!(benches);
