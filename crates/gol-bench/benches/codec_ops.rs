//! Criterion micro-benchmarks for wire message encode/decode.

use std::hint::black_box;
use std::sync::Arc;

use criterion::{criterion_group, criterion_main, Criterion};
use gol_bench::reference_world;
use gol_core::{next_band, Band};
use gol_rpc::{Request, Response};

fn bench_compute_band(c: &mut Criterion) {
    let world = Arc::new(reference_world(1));
    let req = Request::ComputeBand {
        world: Arc::clone(&world),
        band: Band::new(0, 128, 0, world.width()),
        threads: 4,
    };
    let encoded = req.encode().unwrap();

    c.bench_function("encode_compute_band_512", |b| {
        b.iter(|| black_box(req.encode().unwrap()));
    });
    c.bench_function("decode_compute_band_512", |b| {
        b.iter(|| black_box(Request::decode(black_box(&encoded)).unwrap()));
    });
}

fn bench_band_response(c: &mut Criterion) {
    let world = reference_world(2);
    let resp = Response::Band {
        cells: next_band(&world, Band::new(0, 128, 0, world.width())),
    };
    let encoded = resp.encode().unwrap();

    c.bench_function("encode_band_response_128_rows", |b| {
        b.iter(|| black_box(resp.encode().unwrap()));
    });
    c.bench_function("decode_band_response_128_rows", |b| {
        b.iter(|| black_box(Response::decode(black_box(&encoded)).unwrap()));
    });
}

criterion_group!(benches, bench_compute_band, bench_band_response);
criterion_main!(benches);
