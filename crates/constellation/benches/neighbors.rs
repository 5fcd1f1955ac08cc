use ambient_constellation::{brute_force_pairs, NeighborGrid};
use ambient_core::Xorshift64;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use glam::DVec2;

const WIDTH: f64 = 1920.0;
const HEIGHT: f64 = 1080.0;
const RADIUS: f64 = 100.0;

fn scatter(n: usize) -> Vec<DVec2> {
    let mut rng = Xorshift64::new(0xBEEF);
    (0..n)
        .map(|_| DVec2::new(rng.next_range(0.0, WIDTH), rng.next_range(0.0, HEIGHT)))
        .collect()
}

fn bench_neighbors(c: &mut Criterion) {
    let counts: Vec<usize> = std::env::var("AMBIENT_BENCH_PARTICLES")
        .ok()
        .map(|s| {
            s.split(',')
                .filter_map(|t| t.trim().parse::<usize>().ok())
                .collect::<Vec<_>>()
        })
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| vec![600, 1500, 5000]);

    let mut group = c.benchmark_group("neighbor_pairs");
    for &n in &counts {
        let positions = scatter(n);

        group.bench_with_input(BenchmarkId::new("grid", n), &positions, |b, positions| {
            let mut grid = NeighborGrid::new(RADIUS).expect("valid radius");
            b.iter(|| {
                grid.rebuild(positions, WIDTH, HEIGHT);
                let mut links = 0_usize;
                grid.for_each_pair(positions, |_, _, _| links += 1);
                black_box(links)
            });
        });

        group.bench_with_input(BenchmarkId::new("brute_force", n), &positions, |b, positions| {
            b.iter(|| black_box(brute_force_pairs(positions, RADIUS).len()));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_neighbors);
criterion_main!(benches);
