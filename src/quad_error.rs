//! QuadError: unified error type for quad-sieve public APIs.
//!
//! Variants fall into four families: configuration (bad world size or rank),
//! transport (a collective exchange failed), data (an edge names a vertex
//! outside the id space, or the id space itself is too large) and corruption
//! (a shuffle buffer does not decode).
//! Transport and corruption errors are fatal for the whole worker group; the
//! library reports them and never retries.

use crate::topology::adjacency::VertexId;
use thiserror::Error;

/// Unified error type for quad-sieve operations.
#[derive(Debug, Error)]
pub enum QuadError {
    /// The worker group must contain at least one rank.
    #[error("invalid world size {0}: at least one worker is required")]
    InvalidWorldSize(usize),
    /// A communicator reported a rank outside `[0, size)`.
    #[error("rank {rank} is out of range for a world of size {size}")]
    InvalidRank { rank: usize, size: usize },
    /// The configured coordinator does not exist in this world.
    #[error("coordinator rank {root} is out of range for a world of size {size}")]
    RootOutOfRange { root: usize, size: usize },

    /// A send or receive with `neighbor` failed or returned nothing.
    #[error("communication error with rank {neighbor}: {source}")]
    CommError {
        neighbor: usize,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// A received buffer does not match the size announced in the size round.
    #[error("buffer size mismatch from rank {neighbor}: expected {expected} bytes, got {got}")]
    BufferSizeMismatch {
        neighbor: usize,
        expected: usize,
        got: usize,
    },

    /// Edge number `edge` references a vertex outside `[0, vertex_count)`.
    #[error("edge #{edge} references vertex {vertex}, but vertex_count is {vertex_count}")]
    VertexOutOfRange {
        edge: usize,
        vertex: u64,
        vertex_count: usize,
    },

    /// `vertex_count` is larger than the vertex id type can address.
    #[error("vertex_count {vertex_count} exceeds the id space of {max} vertices")]
    VertexCountTooLarge { vertex_count: u64, max: u64 },

    /// A payload received from `neighbor` could not be decoded.
    #[error("corrupt payload from rank {neighbor}: {reason}")]
    CorruptPayload { neighbor: usize, reason: String },

    /// Malformed line in an edge list.
    #[error("parse error on line {line}: {reason}")]
    Parse { line: usize, reason: String },
    /// Underlying I/O failure while reading input or writing a report.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl QuadError {
    /// Shorthand for a transport failure with a plain message.
    pub(crate) fn comm(neighbor: usize, msg: impl Into<String>) -> Self {
        QuadError::CommError {
            neighbor,
            source: msg.into().into(),
        }
    }

    /// Shorthand for a corrupt payload.
    pub(crate) fn corrupt(neighbor: usize, reason: impl Into<String>) -> Self {
        QuadError::CorruptPayload {
            neighbor,
            reason: reason.into(),
        }
    }

    /// Build a corruption error for a decoded id that falls outside the id space.
    pub(crate) fn foreign_vertex(neighbor: usize, vertex: VertexId, vertex_count: usize) -> Self {
        Self::corrupt(
            neighbor,
            format!("vertex {vertex} outside id space of {vertex_count} vertices"),
        )
    }
}
