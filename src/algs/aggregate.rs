//! Coordinator-side collectives: sum-reduce and gather.
//!
//! Both are point-to-point fan-ins to a single `root` rank. Non-root ranks
//! return `Ok(None)`; the root returns the combined value. Every rank of the
//! group must make the same call with the same `root` and tags.

use bytemuck::Pod;

use crate::algs::communicator::{CommTag, Communicator, ShuffleCommTags, Wait};
use crate::algs::wire::{WireCount, WireTotal, cast_slice, decode_records, expect_exact_len};
use crate::quad_error::QuadError;

fn check_root<C: Communicator>(comm: &C, root: usize) -> Result<(), QuadError> {
    let size = comm.size();
    if size == 0 {
        return Err(QuadError::InvalidWorldSize(size));
    }
    if comm.rank() >= size {
        return Err(QuadError::InvalidRank {
            rank: comm.rank(),
            size,
        });
    }
    if root >= size {
        return Err(QuadError::RootOutOfRange { root, size });
    }
    Ok(())
}

/// Receive exactly `len` bytes from `peer` on `tag`.
fn recv_exact<C: Communicator>(
    comm: &C,
    peer: usize,
    tag: CommTag,
    len: usize,
) -> Result<Vec<u8>, QuadError> {
    let mut buf = vec![0u8; len];
    let h = comm.irecv_result(peer, tag.as_u16(), &mut buf)?;
    let data = h.wait().ok_or_else(|| {
        QuadError::comm(
            peer,
            format!("no data received on tag {:#06x}", tag.as_u16()),
        )
    })?;
    expect_exact_len(peer, len, data.len())?;
    Ok(data)
}

/// Sum `value` across all ranks onto `root`.
pub fn reduce_sum_to_root<C: Communicator>(
    value: i64,
    comm: &C,
    root: usize,
    tag: CommTag,
) -> Result<Option<i64>, QuadError> {
    check_root(comm, root)?;
    let me = comm.rank();
    if me != root {
        let msg = [WireTotal::new(value)];
        let h = comm.isend_result(root, tag.as_u16(), cast_slice(&msg))?;
        let _ = h.wait();
        return Ok(None);
    }

    let mut total = value;
    for peer in (0..comm.size()).filter(|&p| p != root) {
        let raw = recv_exact(comm, peer, tag, std::mem::size_of::<WireTotal>())?;
        let got = bytemuck::pod_read_unaligned::<WireTotal>(&raw).get();
        total += got;
    }
    Ok(Some(total))
}

/// Collect every rank's `records` onto `root`, concatenated in rank order.
///
/// Each non-root rank first sends its record count on `tags.sizes`, then the
/// payload on `tags.data`. The root reads all counts before any payload.
pub fn gather_to_root<R, C>(
    records: Vec<R>,
    comm: &C,
    root: usize,
    tags: ShuffleCommTags,
) -> Result<Option<Vec<R>>, QuadError>
where
    R: Pod,
    C: Communicator,
{
    check_root(comm, root)?;
    let me = comm.rank();
    let world = comm.size();

    if me != root {
        if records.len() > u32::MAX as usize {
            return Err(QuadError::comm(
                me,
                format!("{} records exceed the u32 wire count", records.len()),
            ));
        }
        let count = [WireCount::new(records.len())];
        let h_size = comm.isend_result(root, tags.sizes.as_u16(), cast_slice(&count))?;
        let h_data = comm.isend_result(root, tags.data.as_u16(), cast_slice(&records))?;
        let _ = h_size.wait();
        let _ = h_data.wait();
        return Ok(None);
    }

    let mut counts = vec![0usize; world];
    counts[root] = records.len();
    for peer in (0..world).filter(|&p| p != root) {
        let raw = recv_exact(comm, peer, tags.sizes, std::mem::size_of::<WireCount>())?;
        counts[peer] = bytemuck::pod_read_unaligned::<WireCount>(&raw).get();
    }
    log::debug!(
        "rank {me}: gathering {} records from {world} ranks",
        counts.iter().sum::<usize>()
    );

    let mut own = records;
    let mut out = Vec::with_capacity(counts.iter().sum());
    for peer in 0..world {
        if peer == root {
            out.append(&mut own);
            continue;
        }
        let raw = recv_exact(
            comm,
            peer,
            tags.data,
            counts[peer] * std::mem::size_of::<R>(),
        )?;
        out.extend(decode_records::<R>(&raw, peer)?);
    }
    Ok(Some(out))
}
