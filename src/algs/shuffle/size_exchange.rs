//! Round 1 of a shuffle: exchange record counts with every peer.
//!
//! Every rank sends exactly one [`WireCount`] to every other rank, zero
//! included, so receivers can size their buffers for round 2. All send and
//! receive handles are drained before returning, even if an error occurs.

use crate::algs::communicator::{CommTag, Communicator, Wait};
use crate::algs::wire::{WireCount, cast_slice, cast_slice_mut, expect_exact_len};
use crate::quad_error::QuadError;

/// Send `send_counts[peer]` to each peer and return the count each peer
/// announced for us. The entry for our own rank is copied from `send_counts`.
pub fn exchange_counts<C>(
    send_counts: &[usize],
    comm: &C,
    tag: CommTag,
) -> Result<Vec<usize>, QuadError>
where
    C: Communicator,
{
    let me = comm.rank();
    let world = comm.size();
    if send_counts.len() != world {
        return Err(QuadError::comm(
            me,
            format!(
                "count vector covers {} ranks, world has {world}",
                send_counts.len()
            ),
        ));
    }
    if let Some(peer) = (0..world).find(|&p| send_counts[p] > u32::MAX as usize) {
        return Err(QuadError::comm(
            peer,
            format!("{} records exceed the u32 wire count", send_counts[peer]),
        ));
    }

    // 1) post all receives
    let mut recv_size = Vec::with_capacity(world.saturating_sub(1));
    for peer in (0..world).filter(|&p| p != me) {
        let mut cnt = WireCount::new(0);
        let h = comm.irecv_result(
            peer,
            tag.as_u16(),
            cast_slice_mut(std::slice::from_mut(&mut cnt)),
        )?;
        recv_size.push((peer, h));
    }

    // 2) post all sends and keep buffers alive until completion
    let mut pending_sends = Vec::with_capacity(world.saturating_sub(1));
    let mut send_bufs = Vec::with_capacity(world.saturating_sub(1));
    for peer in (0..world).filter(|&p| p != me) {
        let count = WireCount::new(send_counts[peer]);
        pending_sends.push(comm.isend_result(
            peer,
            tag.as_u16(),
            cast_slice(std::slice::from_ref(&count)),
        )?);
        send_bufs.push(count);
    }

    // 3) wait for all recvs, collect counts (but do not early-return)
    let mut sizes_in = vec![0usize; world];
    sizes_in[me] = send_counts[me];
    let mut maybe_err = None;
    for (peer, h) in recv_size {
        let got = match h.wait() {
            Some(data) => expect_exact_len(peer, std::mem::size_of::<WireCount>(), data.len())
                .map(|()| bytemuck::pod_read_unaligned::<WireCount>(&data).get()),
            None => Err(QuadError::comm(
                peer,
                format!("failed to receive size from rank {peer}"),
            )),
        };
        // keep the first error; later handles are only drained
        match got {
            Ok(n) if maybe_err.is_none() => sizes_in[peer] = n,
            Err(e) if maybe_err.is_none() => maybe_err = Some(e),
            _ => {}
        }
    }

    // 4) always drain all send handles before returning
    for send in pending_sends {
        let _ = send.wait();
    }
    drop(send_bufs);

    match maybe_err {
        Some(err) => Err(err),
        None => Ok(sizes_in),
    }
}
