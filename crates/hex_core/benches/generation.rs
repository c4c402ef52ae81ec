//! Benchmarks for hex_core.
//!
//! Run with: `cargo bench -p hex_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use hex_core::prelude::*;

/// Full level generation, with and without the grass pass.
pub fn generation_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate_level");
    for grass in [false, true] {
        let config = LevelConfig::default().with_grass(grass);
        let start = config.shape().center();
        group.bench_with_input(BenchmarkId::new("grass", grass), &config, |b, config| {
            b.iter(|| generate_level(black_box(config), black_box(42), start));
        });
    }
    group.finish();
}

/// Shadowcasting from the centre of a generated level.
pub fn shadowcast_benchmark(c: &mut Criterion) {
    let config = LevelConfig::default().with_grass(false);
    let Ok(level) = generate_level(&config, 42, config.shape().center()) else {
        return;
    };
    let tiles = level.tiles;
    let center = level.start;

    c.bench_function("shadowcast_center", |b| {
        b.iter(|| {
            let mut seen = 0u32;
            shadowcast(
                black_box(center),
                |pos| tiles.get(pos).is_some_and(|t| t.is_clear()),
                |_| seen += 1,
            );
            seen
        });
    });
}

/// Push/pop churn on a busy schedule.
pub fn schedule_benchmark(c: &mut Criterion) {
    c.bench_function("schedule_churn", |b| {
        b.iter(|| {
            let mut schedule = Schedule::new();
            for id in 0..64u64 {
                schedule.push(id, u32::try_from(id % 7).unwrap_or(0));
            }
            for _ in 0..1_000 {
                if let Some((_, id)) = schedule.pop() {
                    schedule.push(id, u32::try_from(id % 5 + 1).unwrap_or(1));
                }
            }
            black_box(schedule.time())
        });
    });
}

criterion_group!(
    benches,
    generation_benchmark,
    shadowcast_benchmark,
    schedule_benchmark
);
criterion_main!(benches);
