//! Benchmarks for swap-round planning.
//!
//! Run with: cargo bench -p alsvid-route

use std::sync::Arc;

use alsvid_graph::Topology;
use alsvid_route::{Mapping, PathManager, QubitId};
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

/// Corner-to-corner and edge-to-edge requirements on a square grid.
fn grid_requirements(side: u32) -> Vec<(QubitId, QubitId)> {
    let n = side * side;
    (0..side)
        .map(|i| (QubitId(i), QubitId(n - 1 - i)))
        .collect()
}

/// Benchmark a full round on square grids of increasing size.
fn bench_resolve_grid(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve_grid");

    for side in &[4u32, 6, 8] {
        let topology = Arc::new(Topology::grid(*side, *side));
        let requirements = grid_requirements(*side);
        let mapping = Mapping::trivial(side * side);

        group.bench_with_input(BenchmarkId::new("batch", side), side, |b, _| {
            let mut manager = PathManager::new(topology.clone());
            b.iter(|| {
                manager
                    .resolve(black_box(&requirements), black_box(&mapping))
                    .unwrap()
            });
        });
    }

    group.finish();
}

/// Benchmark the effect of the per-interaction path cache on repeated
/// rounds with an unchanged mapping.
fn bench_resolve_caching(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve_caching");

    let topology = Arc::new(Topology::grid(6, 6));
    let requirements = grid_requirements(6);
    let mapping = Mapping::trivial(36);

    group.bench_function("cached", |b| {
        let mut manager = PathManager::new(topology.clone());
        // Warm the caches once.
        manager.resolve(&requirements, &mapping).unwrap();
        b.iter(|| manager.resolve(black_box(&requirements), &mapping).unwrap());
    });

    group.bench_function("uncached", |b| {
        let mut manager = PathManager::with_caching(topology.clone(), false);
        b.iter(|| manager.resolve(black_box(&requirements), &mapping).unwrap());
    });

    group.finish();
}

criterion_group!(benches, bench_resolve_grid, bench_resolve_caching);
criterion_main!(benches);
