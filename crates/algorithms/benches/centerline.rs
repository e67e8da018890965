//! Benchmarks for centerline extraction and width measurement

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rivwidth_algorithms::centerline::{distance_to_bank, DistanceFieldParams};
use rivwidth_algorithms::morphology::{skeletonize, SkeletonizeParams};
use rivwidth_algorithms::pipeline::{extract_centerline, river_width, RiverInputs, RiverWidthParams};
use rivwidth_core::{GeoTransform, Raster};

/// Meandering channel about a tenth of the grid wide
fn create_river_mask(size: usize) -> Raster<u8> {
    let mut m: Raster<u8> = Raster::new(size, size);
    m.set_transform(GeoTransform::north_up(0.0, size as f64 * 30.0, 30.0));
    let half_width = (size / 20).max(2) as f64;
    let amplitude = size as f64 / 6.0;
    for row in 0..size {
        let center = size as f64 / 2.0 + amplitude * (row as f64 / size as f64 * 6.0).sin();
        for col in 0..size {
            if (col as f64 - center).abs() <= half_width {
                m.set(row, col, 1).unwrap();
            }
        }
    }
    m
}

fn bench_distance(c: &mut Criterion) {
    let mut group = c.benchmark_group("centerline/distance");
    for size in [256, 512, 1024] {
        let mask = create_river_mask(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| distance_to_bank(black_box(&mask), DistanceFieldParams::default()).unwrap())
        });
    }
    group.finish();
}

fn bench_thinning(c: &mut Criterion) {
    let mut group = c.benchmark_group("morphology/thinning");
    for size in [256, 512, 1024] {
        let mask = create_river_mask(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| skeletonize(black_box(&mask), SkeletonizeParams::default()).unwrap())
        });
    }
    group.finish();
}

fn bench_extract(c: &mut Criterion) {
    let mut group = c.benchmark_group("centerline/extract");
    group.sample_size(10);
    let params = RiverWidthParams::standard();
    for size in [256, 512] {
        let mask = create_river_mask(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| extract_centerline(black_box(&mask), &params).unwrap())
        });
    }
    group.finish();
}

fn bench_river_width(c: &mut Criterion) {
    let mut group = c.benchmark_group("width/river_width");
    group.sample_size(10);
    for params in [RiverWidthParams::standard(), RiverWidthParams::cloud_aware()] {
        let inputs = RiverInputs::new(create_river_mask(512));
        let id = if params.segment_buffer.is_some() { "cloud_aware" } else { "standard" };
        group.bench_function(id, |b| b.iter(|| river_width(black_box(&inputs), &params).unwrap()));
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_distance,
    bench_thinning,
    bench_extract,
    bench_river_width
);
criterion_main!(benches);
