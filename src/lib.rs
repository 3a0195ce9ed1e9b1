#![cfg_attr(docsrs, feature(doc_cfg))]
//! # quad-sieve
//!
//! quad-sieve counts quadrilaterals (4-cycles) in large undirected graphs with a
//! distributed map-reduce pipeline, and attributes to every vertex the number of
//! 4-cycles it belongs to. The same code runs serially, on threads, or on MPI
//! ranks; only the [`Communicator`](algs::communicator::Communicator) changes.
//!
//! ## Pipeline
//! - Each worker enumerates wedges (length-2 paths) around the vertices it owns.
//! - Wedges are shuffled so that all wedges with the same endpoint pair meet on
//!   one worker, which turns every pair of centers into a 4-cycle.
//! - Per-vertex partial counts are shuffled again to a single owner per vertex.
//! - The coordinator collects the global total and every per-vertex row.
//!
//! Every 4-cycle is found through both of its diagonals; totals are halved once,
//! when the final report is built.
//!
//! ## Determinism
//!
//! Destination routing uses `ahash` with fixed keys, so every rank of one build
//! computes the same destinations. Counts are independent of the number of
//! workers; report rows are sorted by vertex id unless configured otherwise.
//!
//! ## Usage
//!
//! ```toml
//! [dependencies]
//! quad-sieve = "0.3"
//! # Optional features:
//! # features = ["mpi-support","rayon"]
//! ```
//!
//! ```
//! use quad_sieve::prelude::*;
//!
//! let square = GraphSnapshot::new(4, vec![(0, 1), (1, 2), (2, 3), (3, 0)]);
//! let report = run_local(2, &square, &PipelineConfig::default()).unwrap();
//! assert_eq!(report.global_count, 1);
//! assert_eq!(report.per_vertex, vec![(0, 1), (1, 1), (2, 1), (3, 1)]);
//! ```

pub mod algs;
pub mod io;
pub mod partitioning;
pub mod quad_error;
pub mod topology;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    #[cfg(feature = "mpi-support")]
    pub use crate::algs::communicator::MpiComm;
    pub use crate::algs::communicator::{
        CommTag, Communicator, NoComm, PipelineCommTags, RayonComm, ShuffleCommTags, Wait,
    };
    pub use crate::algs::quadrilaterals::{
        FinalReport, PipelineConfig, WorkerState, broadcast_and_count, count_quadrilaterals,
        run_local,
    };
    pub use crate::algs::vertex_counts::PerVertexCounts;
    pub use crate::algs::wedges::Wedge;
    pub use crate::io::edge_list::{NamedGraph, read_edge_list};
    pub use crate::io::report::write_report;
    pub use crate::partitioning::{
        HashPartitioner, ModuloPartitioner, PartitionScheme, Partitioner,
    };
    pub use crate::quad_error::QuadError;
    pub use crate::topology::adjacency::{AdjacencyList, Edge, GraphSnapshot, VertexId};
}
