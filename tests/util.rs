#![allow(dead_code)]
use quad_sieve::prelude::*;
use rand::{Rng, SeedableRng, rngs::SmallRng};

/// Reference count by enumerating every 4-vertex subset of a simple graph.
/// Returns the global count and the count for each vertex.
pub fn brute_force(graph: &GraphSnapshot) -> (i64, Vec<i64>) {
    let n = graph.vertex_count;
    let mut adj = vec![vec![false; n]; n];
    for &(u, v) in &graph.edges {
        let (u, v) = (u as usize, v as usize);
        adj[u][v] = true;
        adj[v][u] = true;
    }
    let ring = |a: usize, b: usize, c: usize, d: usize| {
        adj[a][b] && adj[b][c] && adj[c][d] && adj[d][a]
    };

    let mut global = 0i64;
    let mut per = vec![0i64; n];
    for a in 0..n {
        for b in a + 1..n {
            for c in b + 1..n {
                for d in c + 1..n {
                    // the three distinct cyclic orders of {a, b, c, d}
                    let found = [ring(a, b, c, d), ring(a, b, d, c), ring(a, c, b, d)]
                        .iter()
                        .filter(|&&x| x)
                        .count() as i64;
                    global += found;
                    for x in [a, b, c, d] {
                        per[x] += found;
                    }
                }
            }
        }
    }
    (global, per)
}

/// Non-zero entries of `per`, ordered by vertex id (the default report order).
pub fn expected_rows(per: &[i64]) -> Vec<(VertexId, i64)> {
    per.iter()
        .enumerate()
        .filter(|&(_, &c)| c != 0)
        .map(|(v, &c)| (v as VertexId, c))
        .collect()
}

/// Erdős–Rényi graph without loops or repeated edges.
pub fn random_simple_graph(n: usize, edge_prob: f64, seed: u64) -> GraphSnapshot {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut edges = Vec::new();
    for u in 0..n as VertexId {
        for v in u + 1..n as VertexId {
            if rng.gen_bool(edge_prob) {
                edges.push((u, v));
            }
        }
    }
    GraphSnapshot::new(n, edges)
}

pub fn complete_graph(n: usize) -> GraphSnapshot {
    let n32 = n as VertexId;
    let edges = (0..n32)
        .flat_map(|u| (u + 1..n32).map(move |v| (u, v)))
        .collect();
    GraphSnapshot::new(n, edges)
}

pub fn cycle_graph(n: usize) -> GraphSnapshot {
    let n32 = n as VertexId;
    let edges = (0..n32).map(|u| (u, (u + 1) % n32)).collect();
    GraphSnapshot::new(n, edges)
}

/// Complete bipartite graph `K(a, b)`; left ids `0..a`, right ids `a..a+b`.
pub fn complete_bipartite(a: usize, b: usize) -> GraphSnapshot {
    let mut edges = Vec::new();
    for u in 0..a as VertexId {
        for v in a as VertexId..(a + b) as VertexId {
            edges.push((u, v));
        }
    }
    GraphSnapshot::new(a + b, edges)
}

/// Run `f` once per rank of a fresh isolated group and collect results in
/// rank order.
pub fn on_ranks<T, F>(world: usize, f: F) -> Vec<T>
where
    T: Send,
    F: Fn(RayonComm) -> T + Sync,
{
    std::thread::scope(|s| {
        let f = &f;
        let handles: Vec<_> = RayonComm::world(world)
            .into_iter()
            .map(|comm| s.spawn(move || f(comm)))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    })
}
