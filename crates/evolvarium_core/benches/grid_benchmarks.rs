use criterion::{black_box, criterion_group, criterion_main, Criterion};
use evolvarium_core::spatial::SpatialGrid;

fn positions(count: u64) -> Vec<(u64, f64, f64)> {
    (0..count)
        .map(|i| {
            let x = (i % 100) as f64 * 10.0;
            let y = (i / 100) as f64 * 10.0;
            (i, x, y)
        })
        .collect()
}

fn bench_grid_rebuild(c: &mut Criterion) {
    let positions = positions(1000);
    c.bench_function("grid_rebuild_1000", |b| {
        let mut grid = SpatialGrid::new(1000.0, 1000.0, 100, 100);
        b.iter(|| {
            grid.rebuild(&positions);
            black_box(grid.count_nearby(500.0, 500.0, 5.0))
        })
    });
}

fn bench_grid_query(c: &mut Criterion) {
    let positions = positions(1000);
    let mut grid = SpatialGrid::new(1000.0, 1000.0, 100, 100);
    grid.rebuild(&positions);

    c.bench_function("grid_query_50_radius", |b| {
        let mut results = Vec::new();
        b.iter(|| {
            grid.query_into(500.0, 500.0, 50.0, &mut results);
            black_box(results.len())
        })
    });
}

fn bench_grid_query_small(c: &mut Criterion) {
    let positions = positions(1000);
    let mut grid = SpatialGrid::new(1000.0, 1000.0, 100, 100);
    grid.rebuild(&positions);

    c.bench_function("grid_query_2_radius", |b| {
        let mut results = Vec::new();
        b.iter(|| {
            grid.query_into(500.0, 500.0, 2.0, &mut results);
            black_box(results.len())
        })
    });
}

fn bench_grid_count_nearby(c: &mut Criterion) {
    let positions = positions(1000);
    let mut grid = SpatialGrid::new(1000.0, 1000.0, 100, 100);
    grid.rebuild(&positions);

    c.bench_function("grid_count_nearby_50", |b| {
        b.iter(|| black_box(grid.count_nearby(500.0, 500.0, 50.0)))
    });
}

criterion_group!(
    benches,
    bench_grid_rebuild,
    bench_grid_query,
    bench_grid_query_small,
    bench_grid_count_nearby
);
criterion_main!(benches);
