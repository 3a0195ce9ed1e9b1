use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use quad_sieve::algs::wedges::map_wedges;
use quad_sieve::prelude::*;

// Synthetic Erdos-Renyi graph
fn random_graph(n: usize, p: f64, seed: u64) -> GraphSnapshot {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut edges = Vec::new();
    for u in 0..n as VertexId {
        for v in (u + 1)..n as VertexId {
            if rng.r#gen::<f64>() < p {
                edges.push((u, v));
            }
        }
    }
    GraphSnapshot::new(n, edges)
}

fn bench_map(c: &mut Criterion) {
    let mut group = c.benchmark_group("map_wedges");
    for &(n, p) in &[(1_000, 0.01), (2_000, 0.01)] {
        let adj = AdjacencyList::build(&random_graph(n, p, 42)).unwrap();
        group.bench_with_input(
            BenchmarkId::new(format!("n{}_p{}", n, p), ""),
            &adj,
            |b, adj| {
                b.iter(|| {
                    map_wedges(adj, 0, 1, &PartitionScheme::hashed())
                        .unwrap()
                        .total()
                });
            },
        );
    }
    group.finish();
}

fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("count_quadrilaterals");
    group.sample_size(10);
    let graph = random_graph(1_000, 0.01, 42);
    let cfg = PipelineConfig::default();
    for world in [1usize, 2, 4] {
        group.bench_with_input(BenchmarkId::new("workers", world), &world, |b, &w| {
            b.iter(|| run_local(w, &graph, &cfg).unwrap().global_count);
        });
    }
    group.finish();
}

criterion_group!(benches, bench_map, bench_pipeline);
criterion_main!(benches);
