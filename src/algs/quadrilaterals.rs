//! Distributed 4-cycle counting with per-vertex attribution.
//!
//! Every rank runs the same phases against its own [`WorkerState`]:
//!
//! 1. **map**: enumerate wedges centered at the vertices this rank owns
//!    (`v mod W`) and bucket them by destination of their smaller endpoint;
//! 2. **shuffle #1**: exchange wedge buckets;
//! 3. **reduce**: group wedges by endpoint pair and attribute cycles;
//! 4. **shuffle #2**: route per-vertex partials to their final owner and sum;
//! 5. **aggregate**: sum-reduce the global counter and gather the per-vertex
//!    rows on the coordinator, which halves every total exactly once.
//!
//! Both shuffles are lock-step collectives; all ranks must call
//! [`count_quadrilaterals`] with the same graph and configuration.

use serde::{Deserialize, Serialize};

use crate::algs::aggregate::{gather_to_root, reduce_sum_to_root};
use crate::algs::broadcast::broadcast_graph;
use crate::algs::communicator::{Communicator, PipelineCommTags, RayonComm, ShuffleCommTags};
use crate::algs::shuffle::{PartitionBuckets, shuffle_by_source};
use crate::algs::vertex_counts::{PerVertexCounts, shuffle_vertex_counts};
use crate::algs::wedges::{Wedge, decode_wedges, map_wedges, reduce_wedges};
use crate::algs::wire::WireWedge;
use crate::partitioning::{PartitionScheme, Partitioner};
use crate::quad_error::QuadError;
use crate::topology::adjacency::{AdjacencyList, GraphSnapshot, VertexId};

/// Knobs shared by every rank of one run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Coordinator rank: receives the broadcast source and the final report.
    pub root: usize,
    /// Destination routing for both shuffles.
    pub partition: PartitionScheme,
    /// Sort report rows by vertex id; otherwise rows keep gather order.
    pub sort_report: bool,
    pub tags: PipelineCommTags,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            root: 0,
            partition: PartitionScheme::default(),
            sort_report: true,
            tags: PipelineCommTags::default(),
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self, world: usize) -> Result<(), QuadError> {
        if world == 0 {
            return Err(QuadError::InvalidWorldSize(world));
        }
        if self.root >= world {
            return Err(QuadError::RootOutOfRange {
                root: self.root,
                size: world,
            });
        }
        Ok(())
    }
}

/// Coordinator output: halved totals.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalReport {
    pub global_count: i64,
    pub per_vertex: Vec<(VertexId, i64)>,
}

impl FinalReport {
    /// Halve doubled totals into a report.
    ///
    /// Simple graphs always give even inputs. Multigraph or self-loop input
    /// can give odd ones; those are logged and truncated.
    pub fn from_doubled(global: i64, rows: Vec<(VertexId, i64)>, sort: bool) -> Self {
        if global % 2 != 0 {
            log::warn!("doubled 4-cycle total {global} is odd; input is not a simple graph");
        }
        let odd = rows.iter().filter(|&&(_, c)| c % 2 != 0).count();
        if odd > 0 {
            log::warn!("{odd} per-vertex totals are odd; input is not a simple graph");
        }
        let mut per_vertex: Vec<_> = rows.into_iter().map(|(v, c)| (v, c / 2)).collect();
        if sort {
            per_vertex.sort_unstable_by_key(|&(v, _)| v);
        }
        Self {
            global_count: global / 2,
            per_vertex,
        }
    }

    /// Count for `v`, `0` when `v` is in no 4-cycle.
    pub fn count_for(&self, v: VertexId) -> i64 {
        self.per_vertex
            .iter()
            .find(|&&(u, _)| u == v)
            .map_or(0, |&(_, c)| c)
    }

    /// Sum of per-vertex counts; `4 * global_count` for simple graphs.
    pub fn per_vertex_total(&self) -> i64 {
        self.per_vertex.iter().map(|&(_, c)| c).sum()
    }
}

/// Everything one rank accumulates between phases.
#[derive(Debug)]
pub struct WorkerState {
    pub rank: usize,
    pub world: usize,
    pub adjacency: AdjacencyList,
    pub wedge_buckets: PartitionBuckets<WireWedge>,
    /// Doubled cycles found by this rank's reduce.
    pub local_cycles: i64,
    /// Doubled partial counts from this rank's reduce.
    pub partials: PerVertexCounts,
}

impl WorkerState {
    /// Build the adjacency for `graph`.
    ///
    /// # Errors
    /// [`QuadError::InvalidRank`] for a rank outside the world,
    /// [`QuadError::VertexOutOfRange`] for an edge outside the id space.
    pub fn new(rank: usize, world: usize, graph: &GraphSnapshot) -> Result<Self, QuadError> {
        if world == 0 {
            return Err(QuadError::InvalidWorldSize(world));
        }
        if rank >= world {
            return Err(QuadError::InvalidRank { rank, size: world });
        }
        Ok(Self {
            rank,
            world,
            adjacency: AdjacencyList::build(graph)?,
            wedge_buckets: PartitionBuckets::new(world),
            local_cycles: 0,
            partials: PerVertexCounts::default(),
        })
    }

    pub fn vertex_count(&self) -> usize {
        self.adjacency.vertex_count()
    }

    pub fn map_phase<P: Partitioner + ?Sized>(
        &mut self,
        partitioner: &P,
    ) -> Result<(), QuadError> {
        self.wedge_buckets = map_wedges(&self.adjacency, self.rank, self.world, partitioner)?;
        log::debug!(
            "rank {}: mapped {} wedges",
            self.rank,
            self.wedge_buckets.total()
        );
        Ok(())
    }

    pub fn shuffle_wedges<C: Communicator>(
        &mut self,
        comm: &C,
        tags: ShuffleCommTags,
    ) -> Result<Vec<Wedge>, QuadError> {
        let buckets = std::mem::replace(&mut self.wedge_buckets, PartitionBuckets::new(self.world));
        let received = shuffle_by_source(buckets, comm, tags)?;
        let mut wedges = Vec::with_capacity(received.iter().map(Vec::len).sum());
        for (source, records) in received.iter().enumerate() {
            wedges.extend(decode_wedges(records, self.vertex_count(), source)?);
        }
        Ok(wedges)
    }

    pub fn reduce_phase(&mut self, wedges: Vec<Wedge>) {
        let n = wedges.len();
        self.local_cycles += reduce_wedges(wedges, &mut self.partials);
        log::debug!(
            "rank {}: reduced {n} wedges, {} doubled cycles, {} touched vertices",
            self.rank,
            self.local_cycles,
            self.partials.len()
        );
    }

    /// Route partials to their owners; returns this rank's final (doubled)
    /// per-vertex map.
    pub fn merge_phase<C, P>(
        &mut self,
        comm: &C,
        partitioner: &P,
        tags: ShuffleCommTags,
    ) -> Result<PerVertexCounts, QuadError>
    where
        C: Communicator,
        P: Partitioner + ?Sized,
    {
        let partials = std::mem::take(&mut self.partials);
        shuffle_vertex_counts(&partials, comm, partitioner, tags, self.vertex_count())
    }
}

/// Run every phase for the calling rank.
///
/// Returns `Some(report)` on `cfg.root` and `None` elsewhere.
///
/// # Errors
/// Configuration errors before any communication; data errors while building
/// the adjacency (identically on every rank); transport and corruption errors
/// from the shuffles and the final gather.
pub fn count_quadrilaterals<C: Communicator>(
    comm: &C,
    graph: &GraphSnapshot,
    cfg: &PipelineConfig,
) -> Result<Option<FinalReport>, QuadError> {
    let world = comm.size();
    cfg.validate(world)?;
    let mut state = WorkerState::new(comm.rank(), world, graph)?;

    state.map_phase(&cfg.partition)?;
    let wedges = state.shuffle_wedges(comm, cfg.tags.wedges)?;
    state.reduce_phase(wedges);
    let merged = state.merge_phase(comm, &cfg.partition, cfg.tags.vertex_counts)?;

    let global = reduce_sum_to_root(state.local_cycles, comm, cfg.root, cfg.tags.reduce)?;
    let rows = gather_to_root(merged.to_wire(), comm, cfg.root, cfg.tags.gather)?;

    match (global, rows) {
        (Some(global), Some(rows)) => {
            let rows = rows.iter().map(|r| r.decode()).collect();
            let report = FinalReport::from_doubled(global, rows, cfg.sort_report);
            log::info!(
                "{} 4-cycles across {} vertices ({world} workers)",
                report.global_count,
                report.per_vertex.len()
            );
            Ok(Some(report))
        }
        _ => Ok(None),
    }
}

/// Receive the graph from `cfg.root`, then run [`count_quadrilaterals`].
/// Only the root's `graph` is read.
pub fn broadcast_and_count<C: Communicator>(
    comm: &C,
    graph: Option<GraphSnapshot>,
    cfg: &PipelineConfig,
) -> Result<Option<FinalReport>, QuadError> {
    cfg.validate(comm.size())?;
    let graph = broadcast_graph(comm, cfg.root, graph, cfg.tags.broadcast)?;
    count_quadrilaterals(comm, &graph, cfg)
}

/// Run the pipeline on `world` threads sharing a private [`RayonComm`] group
/// and return the coordinator's report.
pub fn run_local(
    world: usize,
    graph: &GraphSnapshot,
    cfg: &PipelineConfig,
) -> Result<FinalReport, QuadError> {
    cfg.validate(world)?;

    let results: Vec<Result<Option<FinalReport>, QuadError>> = std::thread::scope(|s| {
        let handles: Vec<_> = RayonComm::world(world)
            .into_iter()
            .map(|comm| s.spawn(move || count_quadrilaterals(&comm, graph, cfg)))
            .collect();
        handles
            .into_iter()
            .enumerate()
            .map(|(rank, h)| {
                h.join()
                    .unwrap_or_else(|_| Err(QuadError::comm(rank, "worker thread panicked")))
            })
            .collect()
    });

    let mut report = None;
    for (rank, res) in results.into_iter().enumerate() {
        match res? {
            Some(r) if rank == cfg.root => report = Some(r),
            _ => {}
        }
    }
    report.ok_or_else(|| QuadError::comm(cfg.root, "coordinator produced no report"))
}
