//! Graph topology shared by every worker.
//!
//! The edge list arrives once (see [`crate::algs::broadcast`]) and each rank
//! builds the same read-only [`AdjacencyList`] from it.

pub mod adjacency;

pub use adjacency::{AdjacencyList, Edge, GraphSnapshot, VertexId};
