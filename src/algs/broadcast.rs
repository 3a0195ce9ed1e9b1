//! Graph distribution: the root sends its snapshot to every other rank.
//!
//! The root sends a [`WireGraphHdr`] on `tags.sizes` followed by the edge list
//! on `tags.data`. Receivers check the header version, the announced vertex
//! count, the payload length and every edge's vertex range. The root does not validate what it sends; its
//! copy is checked when the adjacency is built, before any shuffle.

use crate::algs::communicator::{Communicator, ShuffleCommTags, Wait};
use crate::algs::wire::{
    WIRE_VERSION, WireEdge, WireGraphHdr, cast_slice, decode_records, expect_exact_len,
};
use crate::quad_error::QuadError;
use crate::topology::adjacency::{GraphSnapshot, MAX_VERTEX_COUNT};

/// Distribute `graph` from `root` to the whole group and return every rank's
/// copy. Only the root's `graph` is read; other ranks may pass `None`.
///
/// # Errors
/// - [`QuadError::RootOutOfRange`] if `root` is not a rank of `comm`.
/// - [`QuadError::CommError`] if the root has no graph or a receive fails.
/// - [`QuadError::CorruptPayload`] / [`QuadError::BufferSizeMismatch`] if the
///   received header or edge list does not decode, or the header announces
///   more vertices than a vertex id can address.
/// - [`QuadError::VertexOutOfRange`] if a received edge leaves the id space.
pub fn broadcast_graph<C: Communicator>(
    comm: &C,
    root: usize,
    graph: Option<GraphSnapshot>,
    tags: ShuffleCommTags,
) -> Result<GraphSnapshot, QuadError> {
    let me = comm.rank();
    let world = comm.size();
    if root >= world {
        return Err(QuadError::RootOutOfRange { root, size: world });
    }

    if me == root {
        let graph =
            graph.ok_or_else(|| QuadError::comm(root, "coordinator has no graph to send"))?;
        let hdr = [WireGraphHdr::new(graph.vertex_count, graph.edges.len())];
        let edges: Vec<WireEdge> = graph.edges.iter().copied().map(WireEdge::new).collect();
        let mut pending = Vec::with_capacity(2 * world.saturating_sub(1));
        for peer in (0..world).filter(|&p| p != root) {
            pending.push(comm.isend_result(peer, tags.sizes.as_u16(), cast_slice(&hdr))?);
            pending.push(comm.isend_result(peer, tags.data.as_u16(), cast_slice(&edges))?);
        }
        for h in pending {
            let _ = h.wait();
        }
        log::debug!(
            "rank {me}: sent {} vertices / {} edges to {} ranks",
            graph.vertex_count,
            graph.edges.len(),
            world - 1
        );
        return Ok(graph);
    }

    let hdr_len = std::mem::size_of::<WireGraphHdr>();
    let mut hdr_buf = vec![0u8; hdr_len];
    let raw = comm
        .irecv_result(root, tags.sizes.as_u16(), &mut hdr_buf)?
        .wait()
        .ok_or_else(|| QuadError::comm(root, "graph header not received"))?;
    expect_exact_len(root, hdr_len, raw.len())?;
    let hdr = bytemuck::pod_read_unaligned::<WireGraphHdr>(&raw);
    if hdr.version() != WIRE_VERSION {
        return Err(QuadError::corrupt(
            root,
            format!(
                "graph header version {} (expected {WIRE_VERSION})",
                hdr.version()
            ),
        ));
    }

    let vertex_count = hdr.vertex_count();
    if vertex_count > MAX_VERTEX_COUNT {
        return Err(QuadError::corrupt(
            root,
            format!("graph header announces {vertex_count} vertices (at most {MAX_VERTEX_COUNT})"),
        ));
    }
    let vertex_count = usize::try_from(vertex_count)
        .map_err(|_| QuadError::corrupt(root, "vertex count does not fit in usize"))?;

    let expected = usize::try_from(hdr.edge_count())
        .ok()
        .and_then(|n| n.checked_mul(std::mem::size_of::<WireEdge>()))
        .ok_or_else(|| QuadError::corrupt(root, "edge count overflows a buffer"))?;
    let mut edge_buf = vec![0u8; expected];
    let raw = comm
        .irecv_result(root, tags.data.as_u16(), &mut edge_buf)?
        .wait()
        .ok_or_else(|| QuadError::comm(root, "edge list not received"))?;
    expect_exact_len(root, expected, raw.len())?;
    let edges = decode_records::<WireEdge>(&raw, root)?
        .iter()
        .map(WireEdge::get)
        .collect();
    let graph = GraphSnapshot::new(vertex_count, edges);
    graph.validate()?;
    Ok(graph)
}
