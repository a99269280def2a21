use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use introsort::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct HeavyRecord {
    key: u64,
    payload: [u64; 7],
}

fn bench_u64(c: &mut Criterion) {
    let mut group = c.benchmark_group("u64 Sort");
    group.sample_size(20);

    let mut rng = StdRng::seed_from_u64(1);
    for &size in &[100usize, 1_000, 10_000, 100_000] {
        let data: Vec<u64> = (0..size).map(|_| rng.random()).collect();

        group.bench_function(format!("introsort n={size}"), |b| {
            b.iter_batched(
                || data.clone(),
                |mut v| sort(black_box(&mut v)),
                BatchSize::LargeInput,
            )
        });

        group.bench_function(format!("slice::sort_unstable n={size}"), |b| {
            b.iter_batched(
                || data.clone(),
                |mut v| v.sort_unstable(),
                BatchSize::LargeInput,
            )
        });
    }

    group.finish();
}

fn bench_heavy_record(c: &mut Criterion) {
    let mut group = c.benchmark_group("Heavy Record Sort");
    group.sample_size(20);

    let mut rng = StdRng::seed_from_u64(2);
    let size = 50_000;
    let data: Vec<HeavyRecord> = (0..size)
        .map(|_| HeavyRecord {
            key: rng.random(),
            payload: [0; 7],
        })
        .collect();

    group.bench_function("introsort (56-byte record)", |b| {
        b.iter_batched(
            || data.clone(),
            |mut v| sort(black_box(&mut v)),
            BatchSize::LargeInput,
        )
    });

    group.bench_function("slice::sort_unstable (56-byte record)", |b| {
        b.iter_batched(
            || data.clone(),
            |mut v| v.sort_unstable(),
            BatchSize::LargeInput,
        )
    });

    group.finish();
}

criterion_group!(benches, bench_u64, bench_heavy_record);
criterion_main!(benches);
