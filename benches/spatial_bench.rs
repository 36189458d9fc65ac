//! Benchmarks for index construction, radius queries and contact
//! accumulation.
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use glam::DVec3;
use livemap::matrix::{
    compute_contact_frequency, compute_ensemble_average_distances,
};
use livemap::spatial::SpatialIndex;
use livemap::trace::{Point3D, Trace};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_walk(rng: &mut StdRng, len: usize) -> Trace {
    let mut p = DVec3::ZERO;
    (0..len)
        .map(|_| {
            p += DVec3::new(
                rng.random_range(-1.0..1.0),
                rng.random_range(-1.0..1.0),
                rng.random_range(-1.0..1.0),
            );
            if rng.random_bool(0.05) {
                Point3D::missing()
            } else {
                Point3D::new(p.x, p.y, p.z)
            }
        })
        .collect()
}

fn build_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("index_build");
    let mut rng = StdRng::seed_from_u64(1);

    for len in [1_000, 10_000, 100_000] {
        let points: Vec<DVec3> = (0..len)
            .map(|_| {
                DVec3::new(
                    rng.random_range(0.0..100.0),
                    rng.random_range(0.0..100.0),
                    rng.random_range(0.0..100.0),
                )
            })
            .collect();
        group.bench_function(format!("{len}_points"), |b| {
            b.iter(|| {
                black_box(SpatialIndex::build(black_box(&points), None, 64))
            })
        });
    }
    group.finish();
}

fn within_benchmark(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(2);
    let trace = random_walk(&mut rng, 20_000);
    let Ok(index) = SpatialIndex::from_trace(&trace, 64) else {
        return;
    };
    let center = DVec3::new(0.0, 0.0, 0.0);

    c.bench_function("within_radius_4", |b| {
        b.iter(|| black_box(index.within(black_box(center), 4.0)))
    });
}

fn contact_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("ensemble");
    group.sample_size(20);
    let mut rng = StdRng::seed_from_u64(3);
    let traces: Vec<Trace> =
        (0..32).map(|_| random_walk(&mut rng, 2_000)).collect();

    group.bench_function("contact_32x2000", |b| {
        b.iter(|| {
            black_box(compute_contact_frequency(black_box(&traces), 2_000, 3.0))
        })
    });
    group.bench_function("distance_average_32x2000", |b| {
        b.iter(|| {
            black_box(compute_ensemble_average_distances(
                black_box(&traces),
                2_000,
            ))
        })
    });
    group.finish();
}

criterion_group!(benches, build_benchmark, within_benchmark, contact_benchmark);
criterion_main!(benches);
