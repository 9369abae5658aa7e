//! Criterion micro-benchmarks for the band kernel and the local engine.

use std::hint::black_box;
use std::sync::Arc;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use gol_bench::{reference_world, soup};
use gol_core::{next_band, next_world, Band};
use gol_engine::LocalEngine;

fn bench_next_world(c: &mut Criterion) {
    let mut group = c.benchmark_group("next_world");
    for size in [64usize, 256, 512] {
        let world = soup(size, size, 30, 42);
        group.bench_with_input(BenchmarkId::from_parameter(size), &world, |b, w| {
            b.iter(|| black_box(next_world(black_box(w))));
        });
    }
    group.finish();
}

fn bench_seam_band(c: &mut Criterion) {
    // A band touching both wrapped edges exercises the neighbour wrap path.
    let world = reference_world(7);
    let band = Band::new(0, 8, 0, world.width());
    c.bench_function("next_band_seam_8_rows", |b| {
        b.iter(|| black_box(next_band(black_box(&world), band)));
    });
}

fn bench_local_engine(c: &mut Criterion) {
    let mut group = c.benchmark_group("local_engine_512");
    let world = Arc::new(reference_world(42));
    for threads in [1usize, 2, 4, 8, 16] {
        let engine = LocalEngine::new(threads).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(threads), &world, |b, w| {
            b.iter(|| black_box(engine.step(w).unwrap()));
        });
    }
    group.finish();
}

fn bench_flipped(c: &mut Criterion) {
    let world = reference_world(42);
    let next = next_world(&world);
    c.bench_function("flipped_512", |b| {
        b.iter(|| black_box(world.flipped(black_box(&next)).unwrap()));
    });
}

criterion_group!(
    benches,
    bench_next_world,
    bench_seam_band,
    bench_local_engine,
    bench_flipped
);
criterion_main!(benches);
