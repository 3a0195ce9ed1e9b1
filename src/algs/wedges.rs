//! Wedge generation (map) and wedge grouping (reduce).
//!
//! A wedge is a length-2 path `v1 - center - v2`, keyed by the normalized
//! endpoint pair `(v1, v2)` with `v1 <= v2`. Two wedges with the same key and
//! different centers close a 4-cycle `v1 - c1 - v2 - c2`. Every 4-cycle is
//! found twice, once through each of its diagonals, so the totals produced
//! here are double the true values.
//!
//! # Complexity
//! A vertex of degree `d` emits `d * (d - 1) / 2` wedges. High-degree vertices
//! dominate both runtime and shuffle volume; this is the main scalability
//! limit of the pipeline and nothing here samples or caps it.

use itertools::Itertools;

use crate::algs::shuffle::PartitionBuckets;
use crate::algs::vertex_counts::PerVertexCounts;
use crate::algs::wire::WireWedge;
use crate::partitioning::{Partitioner, owned_vertices};
use crate::quad_error::QuadError;
use crate::topology::adjacency::{AdjacencyList, VertexId};

/// Endpoint pair `(v1, v2)` plus the center that joins them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Wedge {
    pub v1: VertexId,
    pub v2: VertexId,
    pub center: VertexId,
}

impl Wedge {
    /// Normalizing constructor: the smaller endpoint becomes `v1`.
    #[inline]
    pub fn new(a: VertexId, b: VertexId, center: VertexId) -> Self {
        Self {
            v1: a.min(b),
            v2: a.max(b),
            center,
        }
    }

    #[inline]
    pub fn key(&self) -> (VertexId, VertexId) {
        (self.v1, self.v2)
    }

    pub fn to_wire(self) -> WireWedge {
        WireWedge::new(self.v1, self.v2, self.center)
    }
}

/// Decode wedges received from rank `source`, rejecting anything that could
/// not have been produced by [`map_wedges`] for a graph of `vertex_count`
/// vertices.
pub fn decode_wedges(
    records: &[WireWedge],
    vertex_count: usize,
    source: usize,
) -> Result<Vec<Wedge>, QuadError> {
    records
        .iter()
        .map(|w| {
            let (v1, v2, center) = w.decode();
            if v1 > v2 {
                return Err(QuadError::corrupt(
                    source,
                    format!("wedge key ({v1}, {v2}) is not normalized"),
                ));
            }
            if let Some(&bad) = [v1, v2, center]
                .iter()
                .find(|&&x| x as usize >= vertex_count)
            {
                return Err(QuadError::foreign_vertex(source, bad, vertex_count));
            }
            Ok(Wedge { v1, v2, center })
        })
        .collect()
}

/// Emit every wedge centered at `center`, one per index pair `i < j` of its
/// neighbor list. Repeated neighbors yield repeated wedges.
fn emit_wedges<P: Partitioner + ?Sized>(
    adj: &AdjacencyList,
    center: VertexId,
    world: usize,
    partitioner: &P,
    out: &mut PartitionBuckets<WireWedge>,
) -> Result<(), QuadError> {
    let neighbors = adj.neighbors(center);
    if neighbors.len() < 2 {
        return Ok(());
    }
    for (&a, &b) in neighbors.iter().tuple_combinations() {
        let w = Wedge::new(a, b, center);
        out.try_push(partitioner.destination(w.v1, world), w.to_wire())?;
    }
    Ok(())
}

/// Map phase: wedges for every vertex owned by `rank` (round-robin), bucketed
/// by the destination of their smaller endpoint.
///
/// # Errors
/// [`QuadError::InvalidRank`] if `partitioner` names a rank outside `world`.
#[cfg(not(feature = "rayon"))]
pub fn map_wedges<P: Partitioner + ?Sized>(
    adj: &AdjacencyList,
    rank: usize,
    world: usize,
    partitioner: &P,
) -> Result<PartitionBuckets<WireWedge>, QuadError> {
    let mut out = PartitionBuckets::new(world);
    for v in owned_vertices(adj.vertex_count(), rank, world) {
        emit_wedges(adj, v, world, partitioner, &mut out)?;
    }
    Ok(out)
}

/// Map phase: wedges for every vertex owned by `rank` (round-robin), bucketed
/// by the destination of their smaller endpoint. Owned vertices are mapped in
/// parallel; bucket order is unspecified.
///
/// # Errors
/// [`QuadError::InvalidRank`] if `partitioner` names a rank outside `world`.
#[cfg(feature = "rayon")]
pub fn map_wedges<P: Partitioner + ?Sized>(
    adj: &AdjacencyList,
    rank: usize,
    world: usize,
    partitioner: &P,
) -> Result<PartitionBuckets<WireWedge>, QuadError> {
    use rayon::prelude::*;

    let owned: Vec<VertexId> = owned_vertices(adj.vertex_count(), rank, world).collect();
    owned
        .par_iter()
        .try_fold(
            || PartitionBuckets::new(world),
            |mut acc, &v| {
                emit_wedges(adj, v, world, partitioner, &mut acc)?;
                Ok::<_, QuadError>(acc)
            },
        )
        .try_reduce(
            || PartitionBuckets::new(world),
            |mut a, b| {
                a.append(b);
                Ok(a)
            },
        )
}

/// Reduce phase: group `wedges` by key and attribute cycles.
///
/// For a key `(v1, v2)` with `k >= 2` centers (a multiset; duplicates count):
/// - `k * (k - 1) / 2` is added to the returned total and to both `v1` and `v2`;
/// - every occurrence of a center `c` adds `k - 1` to `c`.
///
/// Returns this worker's (doubled) contribution to the global count.
pub fn reduce_wedges(mut wedges: Vec<Wedge>, counts: &mut PerVertexCounts) -> i64 {
    wedges.sort_unstable_by_key(Wedge::key);

    let mut cycles = 0i64;
    for group in wedges.chunk_by(|a, b| a.key() == b.key()) {
        let k = group.len() as i64;
        if k < 2 {
            continue;
        }
        let found = k * (k - 1) / 2;
        cycles += found;
        let (v1, v2) = group[0].key();
        counts.add(v1, found);
        counts.add(v2, found);
        for w in group {
            counts.add(w.center, k - 1);
        }
    }
    cycles
}
