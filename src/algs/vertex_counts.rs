//! Per-vertex partial counts and their merge shuffle.
//!
//! After the wedge reduce every worker holds partial (doubled) counts for
//! arbitrary vertices. [`shuffle_vertex_counts`] routes each partial to the
//! vertex's destination rank and sums colliding entries there, so each vertex
//! ends up with exactly one final owner.

use hashbrown::HashMap;

use crate::algs::communicator::{Communicator, ShuffleCommTags};
use crate::algs::shuffle::{PartitionBuckets, shuffle_by_source};
use crate::algs::wire::WireVertexCount;
use crate::partitioning::Partitioner;
use crate::quad_error::QuadError;
use crate::topology::adjacency::VertexId;

/// Sparse map `vertex -> count`. Vertices in no 4-cycle are simply absent.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PerVertexCounts {
    counts: HashMap<VertexId, i64>,
}

impl PerVertexCounts {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn add(&mut self, v: VertexId, delta: i64) {
        *self.counts.entry(v).or_insert(0) += delta;
    }

    /// Count for `v`, `0` when absent.
    pub fn get(&self, v: VertexId) -> i64 {
        self.counts.get(&v).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (VertexId, i64)> + '_ {
        self.counts.iter().map(|(&v, &c)| (v, c))
    }

    pub fn total(&self) -> i64 {
        self.counts.values().sum()
    }

    /// Add every entry of `other` into `self`.
    pub fn merge(&mut self, other: &PerVertexCounts) {
        for (v, c) in other.iter() {
            self.add(v, c);
        }
    }

    /// Entries ordered by vertex id.
    pub fn into_sorted_vec(self) -> Vec<(VertexId, i64)> {
        let mut out: Vec<_> = self.counts.into_iter().collect();
        out.sort_unstable_by_key(|&(v, _)| v);
        out
    }

    pub fn to_wire(&self) -> Vec<WireVertexCount> {
        let mut rows: Vec<_> = self.iter().collect();
        rows.sort_unstable_by_key(|&(v, _)| v);
        rows.into_iter()
            .map(|(v, c)| WireVertexCount::new(v, c))
            .collect()
    }
}

impl FromIterator<(VertexId, i64)> for PerVertexCounts {
    /// Sums repeated vertices.
    fn from_iter<I: IntoIterator<Item = (VertexId, i64)>>(iter: I) -> Self {
        let mut out = PerVertexCounts::default();
        for (v, c) in iter {
            out.add(v, c);
        }
        out
    }
}

/// Route every partial in `local` to its destination and sum what arrives.
///
/// Entries are sent in ascending vertex order. Received vertex ids are checked
/// against `vertex_count`.
///
/// # Errors
/// Anything [`shuffle_by_source`] returns, [`QuadError::InvalidRank`] if
/// `partitioner` names a rank outside the world, and
/// [`QuadError::CorruptPayload`] naming the sender of a vertex id outside the
/// graph.
pub fn shuffle_vertex_counts<C, P>(
    local: &PerVertexCounts,
    comm: &C,
    partitioner: &P,
    tags: ShuffleCommTags,
    vertex_count: usize,
) -> Result<PerVertexCounts, QuadError>
where
    C: Communicator,
    P: Partitioner + ?Sized,
{
    let world = comm.size();
    let mut buckets = PartitionBuckets::new(world);
    for rec in local.to_wire() {
        let (v, _) = rec.decode();
        buckets.try_push(partitioner.destination(v, world), rec)?;
    }

    let received = shuffle_by_source(buckets, comm, tags)?;
    let mut merged = PerVertexCounts::default();
    for (source, records) in received.iter().enumerate() {
        for rec in records {
            let (v, c) = rec.decode();
            if v as usize >= vertex_count {
                return Err(QuadError::foreign_vertex(source, v, vertex_count));
            }
            merged.add(v, c);
        }
    }
    Ok(merged)
}
