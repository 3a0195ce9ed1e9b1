//! Round 2 of a shuffle: exchange the records themselves.

use bytemuck::Pod;

use crate::algs::communicator::{CommTag, Communicator, Wait};
use crate::algs::shuffle::PartitionBuckets;
use crate::algs::wire::{cast_slice, decode_records, expect_exact_len};
use crate::quad_error::QuadError;

/// Post a receive of `recv_counts[peer]` records from every peer, send each
/// peer its bucket, then wait and decode.
///
/// Entry `src` of the result holds what rank `src` sent us, in send order;
/// our own bucket is moved into place without touching the transport.
pub fn exchange_records<R, C>(
    mut buckets: PartitionBuckets<R>,
    recv_counts: &[usize],
    comm: &C,
    tag: CommTag,
) -> Result<Vec<Vec<R>>, QuadError>
where
    R: Pod,
    C: Communicator,
{
    let me = comm.rank();
    let world = comm.size();
    let width = std::mem::size_of::<R>();

    // 1) post all receives sized from round 1
    let mut recv_data = Vec::with_capacity(world.saturating_sub(1));
    for peer in (0..world).filter(|&p| p != me) {
        let expected = recv_counts[peer] * width;
        let mut buffer = vec![0u8; expected];
        let h = comm.irecv_result(peer, tag.as_u16(), &mut buffer)?;
        recv_data.push((peer, h, expected));
    }

    // 2) post all sends and keep buffers alive
    let mut pending_sends = Vec::with_capacity(world.saturating_sub(1));
    let mut keep_alive = Vec::with_capacity(world.saturating_sub(1));
    for peer in (0..world).filter(|&p| p != me) {
        let out = buckets.take(peer);
        pending_sends.push(comm.isend_result(peer, tag.as_u16(), cast_slice(&out))?);
        keep_alive.push(out);
    }

    // 3) wait for all receives (collect errors but do not early-return)
    let mut per_source: Vec<Vec<R>> = vec![Vec::new(); world];
    per_source[me] = buckets.take(me);
    let mut maybe_err = None;
    for (peer, h, expected) in recv_data {
        let raw = h.wait();
        if maybe_err.is_some() {
            continue;
        }
        let decoded = raw
            .ok_or_else(|| QuadError::comm(peer, "recv returned None"))
            .and_then(|raw| {
                expect_exact_len(peer, expected, raw.len())?;
                decode_records::<R>(&raw, peer)
            });
        match decoded {
            Ok(records) => per_source[peer] = records,
            Err(e) => maybe_err = Some(e),
        }
    }

    // 4) always drain sends
    for s in pending_sends {
        let _ = s.wait();
    }
    drop(keep_alive);

    match maybe_err {
        Some(e) => Err(e),
        None => Ok(per_source),
    }
}
