//! Re-export public algorithms.

pub mod aggregate;
pub mod broadcast;
pub mod communicator;
pub mod quadrilaterals;
pub mod shuffle;
pub mod vertex_counts;
pub mod wedges;
pub mod wire;

pub use quadrilaterals::{
    FinalReport, PipelineConfig, WorkerState, broadcast_and_count, count_quadrilaterals, run_local,
};
pub use shuffle::{PartitionBuckets, shuffle, shuffle_by_source};
