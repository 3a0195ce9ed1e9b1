//! Ownership and routing functions.
//!
//! Two partitioning functions are used by the pipeline and must not be
//! confused:
//! - **mapping ownership** ([`round_robin_owner`]): vertex `v` is mapped by
//!   worker `v mod W`. This only spreads wedge generation.
//! - **shuffle destination** ([`Partitioner::destination`]): a record keyed
//!   by vertex `k` goes to worker `hash(k) mod W`. Every record with the same
//!   key lands on the same worker, which is what makes local reduction correct.
//!
//! Destination routing does no load balancing; skewed degree distributions
//! create hot destination workers. A better-balanced scheme can be dropped in
//! behind [`Partitioner`] without touching the reduce or merge code, as long
//! as every rank computes the same destination for the same key.

use ahash::AHasher;
use serde::{Deserialize, Serialize};
use std::hash::Hasher;

use crate::topology::adjacency::VertexId;

/// Rank that maps wedges centered at `v`.
#[inline]
pub fn round_robin_owner(v: VertexId, world: usize) -> usize {
    debug_assert!(world > 0, "world size must be positive");
    v as usize % world
}

/// Vertices `rank, rank + W, rank + 2W, ...` below `vertex_count`.
pub fn owned_vertices(
    vertex_count: usize,
    rank: usize,
    world: usize,
) -> impl Iterator<Item = VertexId> + Clone {
    (rank..vertex_count)
        .step_by(world.max(1))
        .map(|v| v as VertexId)
}

/// Maps a record key to the rank that must receive it.
pub trait Partitioner: Send + Sync {
    /// Destination rank in `[0, world)` for `key`. With `world == 1` this is
    /// always `0`.
    fn destination(&self, key: VertexId, world: usize) -> usize;
}

/// `ahash` with fixed keys and a salt; identical on every rank of one build.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HashPartitioner {
    pub salt: u64,
}

impl HashPartitioner {
    pub fn with_salt(salt: u64) -> Self {
        Self { salt }
    }
}

impl Partitioner for HashPartitioner {
    #[inline]
    fn destination(&self, key: VertexId, world: usize) -> usize {
        debug_assert!(world > 0, "world size must be positive");
        if world == 1 {
            return 0;
        }
        let mut h = AHasher::default();
        h.write_u64(self.salt);
        h.write_u32(key);
        (h.finish() % world as u64) as usize
    }
}

/// Identity hash: `key mod W`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ModuloPartitioner;

impl Partitioner for ModuloPartitioner {
    #[inline]
    fn destination(&self, key: VertexId, world: usize) -> usize {
        debug_assert!(world > 0, "world size must be positive");
        key as usize % world
    }
}

/// Configurable choice of destination routing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PartitionScheme {
    /// [`HashPartitioner`] with the given salt.
    Hash { salt: u64 },
    /// [`ModuloPartitioner`].
    Modulo,
}

impl Default for PartitionScheme {
    fn default() -> Self {
        Self::hashed()
    }
}

impl PartitionScheme {
    pub fn hashed() -> Self {
        PartitionScheme::Hash { salt: 0 }
    }
}

impl Partitioner for PartitionScheme {
    #[inline]
    fn destination(&self, key: VertexId, world: usize) -> usize {
        match *self {
            PartitionScheme::Hash { salt } => HashPartitioner { salt }.destination(key, world),
            PartitionScheme::Modulo => ModuloPartitioner.destination(key, world),
        }
    }
}
