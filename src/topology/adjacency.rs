//! Undirected adjacency built redundantly on every worker.
//!
//! A [`GraphSnapshot`] is the id-mapped edge list every rank receives before
//! the pipeline starts. [`AdjacencyList`] turns it into a read-only CSR
//! structure. Neighbor lists keep edge-list order and keep repeats: a
//! multi-edge contributes its endpoint once per copy, and a self loop `(v, v)`
//! contributes `v` twice to its own list.

use serde::{Deserialize, Serialize};

use crate::quad_error::QuadError;

/// Vertex identifier in the opaque id space `[0, vertex_count)`.
pub type VertexId = u32;

/// Unordered vertex pair as supplied by the ingest layer.
pub type Edge = (VertexId, VertexId);

/// Largest `vertex_count` a [`VertexId`] can address.
pub const MAX_VERTEX_COUNT: u64 = VertexId::MAX as u64 + 1;

/// The globally-known input: vertex count and edge list.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub vertex_count: usize,
    pub edges: Vec<Edge>,
}

impl GraphSnapshot {
    pub fn new(vertex_count: usize, edges: Vec<Edge>) -> Self {
        Self {
            vertex_count,
            edges,
        }
    }

    /// Snapshot whose vertex count is one past the largest endpoint.
    pub fn from_edges(edges: Vec<Edge>) -> Self {
        let vertex_count = edges
            .iter()
            .map(|&(u, v)| u.max(v) as usize + 1)
            .max()
            .unwrap_or(0);
        Self {
            vertex_count,
            edges,
        }
    }

    /// Fail if the id space outgrows [`VertexId`], or on the first edge that
    /// leaves it.
    pub fn validate(&self) -> Result<(), QuadError> {
        if self.vertex_count as u64 > MAX_VERTEX_COUNT {
            return Err(QuadError::VertexCountTooLarge {
                vertex_count: self.vertex_count as u64,
                max: MAX_VERTEX_COUNT,
            });
        }
        for (i, &(u, v)) in self.edges.iter().enumerate() {
            for x in [u, v] {
                if x as usize >= self.vertex_count {
                    return Err(QuadError::VertexOutOfRange {
                        edge: i,
                        vertex: x as u64,
                        vertex_count: self.vertex_count,
                    });
                }
            }
        }
        Ok(())
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}

/// Immutable CSR adjacency: `neighbors[offsets[v]..offsets[v + 1]]`.
#[derive(Clone, Debug, Default)]
pub struct AdjacencyList {
    offsets: Vec<usize>,
    neighbors: Vec<VertexId>,
}

impl AdjacencyList {
    /// Build the undirected adjacency for `graph`.
    ///
    /// # Errors
    /// Returns [`QuadError::VertexOutOfRange`] if any edge endpoint is
    /// `>= graph.vertex_count`; nothing is silently dropped.
    /// [`QuadError::VertexCountTooLarge`] if `graph.vertex_count` exceeds
    /// [`MAX_VERTEX_COUNT`]; nothing is allocated in that case.
    pub fn build(graph: &GraphSnapshot) -> Result<Self, QuadError> {
        graph.validate()?;
        let n = graph.vertex_count;

        let mut degree = vec![0usize; n];
        for &(u, v) in &graph.edges {
            degree[u as usize] += 1;
            degree[v as usize] += 1;
        }

        let mut offsets = vec![0usize; n + 1];
        for i in 0..n {
            offsets[i + 1] = offsets[i] + degree[i];
        }

        let mut neighbors = vec![0 as VertexId; offsets[n]];
        let mut cursor = offsets.clone();
        for &(u, v) in &graph.edges {
            neighbors[cursor[u as usize]] = v;
            cursor[u as usize] += 1;
            neighbors[cursor[v as usize]] = u;
            cursor[v as usize] += 1;
        }

        Ok(Self { offsets, neighbors })
    }

    pub fn vertex_count(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    /// Neighbors of `v` in edge-list order; empty for ids outside the graph.
    #[inline]
    pub fn neighbors(&self, v: VertexId) -> &[VertexId] {
        let v = v as usize;
        if v >= self.vertex_count() {
            return &[];
        }
        &self.neighbors[self.offsets[v]..self.offsets[v + 1]]
    }

    #[inline]
    pub fn degree(&self, v: VertexId) -> usize {
        self.neighbors(v).len()
    }

    /// Number of wedges `v` produces as a center: `d * (d - 1) / 2`.
    pub fn wedge_count(&self, v: VertexId) -> u64 {
        let d = self.degree(v) as u64;
        d * d.saturating_sub(1) / 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neighbors_follow_edge_order() {
        let g = GraphSnapshot::new(4, vec![(0, 1), (2, 0), (0, 3), (1, 2)]);
        let adj = AdjacencyList::build(&g).unwrap();
        assert_eq!(adj.neighbors(0), &[1, 2, 3]);
        assert_eq!(adj.neighbors(1), &[0, 2]);
        assert_eq!(adj.neighbors(2), &[0, 1]);
        assert_eq!(adj.neighbors(3), &[0]);
        assert_eq!(adj.wedge_count(0), 3);
    }

    #[test]
    fn multi_edges_and_self_loops_are_kept() {
        let g = GraphSnapshot::new(2, vec![(0, 1), (0, 1), (1, 1)]);
        let adj = AdjacencyList::build(&g).unwrap();
        assert_eq!(adj.neighbors(0), &[1, 1]);
        assert_eq!(adj.neighbors(1), &[0, 0, 1, 1]);
    }

    #[test]
    fn out_of_range_edge_fails_fast() {
        let g = GraphSnapshot::new(3, vec![(0, 1), (1, 3)]);
        let err = AdjacencyList::build(&g).unwrap_err();
        match err {
            QuadError::VertexOutOfRange {
                edge,
                vertex,
                vertex_count,
            } => {
                assert_eq!((edge, vertex, vertex_count), (1, 3, 3));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn vertex_count_beyond_id_space_is_rejected() {
        let g = GraphSnapshot::new(MAX_VERTEX_COUNT as usize + 1, vec![]);
        assert!(matches!(
            AdjacencyList::build(&g),
            Err(QuadError::VertexCountTooLarge { max, .. }) if max == MAX_VERTEX_COUNT
        ));
        let edge = GraphSnapshot::new(usize::MAX, vec![(0, 1)]);
        assert!(matches!(
            edge.validate(),
            Err(QuadError::VertexCountTooLarge { .. })
        ));
    }

    #[test]
    fn empty_and_isolated_vertices() {
        let adj = AdjacencyList::build(&GraphSnapshot::new(3, vec![])).unwrap();
        assert_eq!(adj.vertex_count(), 3);
        assert!(adj.neighbors(2).is_empty());
        assert!(adj.neighbors(7).is_empty());
        assert_eq!(GraphSnapshot::from_edges(vec![]).vertex_count, 0);
        assert_eq!(GraphSnapshot::from_edges(vec![(4, 2)]).vertex_count, 5);
    }
}
