use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use wfc_core::{BoundaryCondition, Solver, SolverConfig, TileId, Topology};
use wfc_rules::AdjacencyRules;

// Tiles 0..n may sit next to themselves or the tile one step up or down.
fn gradient_rules(num_tiles: usize, num_axes: usize) -> AdjacencyRules {
    let mut tuples = Vec::new();
    for axis in 0..num_axes {
        for a in 0..num_tiles {
            for b in a.saturating_sub(1)..=(a + 1).min(num_tiles - 1) {
                tuples.push((axis, TileId(a), TileId(b), 1));
            }
        }
    }
    AdjacencyRules::from_weighted_tuples(num_tiles, num_axes, tuples)
}

fn bench_solver(c: &mut Criterion) {
    let mut group = c.benchmark_group("WFC solver");

    for size in [(16, 16, 1), (32, 32, 1), (8, 8, 8)].iter() {
        let (width, height, depth) = *size;
        let num_axes = if depth == 1 { 4 } else { 6 };
        let rules = gradient_rules(5, num_axes);
        group.throughput(Throughput::Elements((width * height * depth) as u64));

        group.bench_with_input(
            BenchmarkId::new("gradient", format!("{width}x{height}x{depth}")),
            size,
            |b, _| {
                let mut seed = 0u64;
                b.iter(|| {
                    seed += 1;
                    let topology =
                        Topology::grid(width, height, depth, BoundaryCondition::Periodic).unwrap();
                    let config = SolverConfig::builder().seed(seed).build();
                    let mut solver = Solver::new(topology, &rules, Vec::new(), config).unwrap();
                    black_box(solver.run()).ok();
                });
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_solver);
criterion_main!(benches);
