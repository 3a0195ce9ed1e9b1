//! Thin façade over intra-process (threads) or inter-process (MPI) message passing.
//!
//! Messages are *contiguous byte slices* (no zero-copy guarantees).
//! All handles are **waitable** but non-blocking: the exchange code posts
//! every receive and send first, then calls `.wait()` on each handle before
//! it trusts that a buffer is ready. There is no timeout; a peer that never
//! sends blocks the waiter forever.

use bytes::Bytes;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;

use crate::quad_error::QuadError;

/// Typed message tag.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommTag(pub u16);

impl CommTag {
    pub const fn new(raw: u16) -> Self {
        Self(raw)
    }
    pub const fn as_u16(self) -> u16 {
        self.0
    }
    pub const fn base(self) -> u16 {
        self.0
    }
    /// Tag `n` steps above this one (wrapping).
    pub const fn offset(self, n: u16) -> Self {
        Self(self.0.wrapping_add(n))
    }
}

/// Tag pair for one two-round exchange.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShuffleCommTags {
    pub sizes: CommTag,
    pub data: CommTag,
}

impl ShuffleCommTags {
    pub const fn from_base(base: CommTag) -> Self {
        Self {
            sizes: base,
            data: base.offset(1),
        }
    }
}

/// Every tag used by one pipeline run, carved out of a contiguous block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineCommTags {
    pub broadcast: ShuffleCommTags,
    pub wedges: ShuffleCommTags,
    pub vertex_counts: ShuffleCommTags,
    pub reduce: CommTag,
    pub gather: ShuffleCommTags,
}

impl PipelineCommTags {
    /// Number of consecutive tags reserved by [`PipelineCommTags::from_base`].
    pub const SPAN: u16 = 9;

    pub const fn from_base(base: CommTag) -> Self {
        Self {
            broadcast: ShuffleCommTags::from_base(base),
            wedges: ShuffleCommTags::from_base(base.offset(2)),
            vertex_counts: ShuffleCommTags::from_base(base.offset(4)),
            reduce: base.offset(6),
            gather: ShuffleCommTags::from_base(base.offset(7)),
        }
    }
}

impl Default for PipelineCommTags {
    fn default() -> Self {
        Self::from_base(CommTag::new(0x4C00))
    }
}

/// Non-blocking communication interface (minimal by design).
pub trait Communicator {
    /// Handle returned by `isend`.
    type SendHandle: Wait;
    /// Handle returned by `irecv`.
    type RecvHandle: Wait;

    fn isend(&self, peer: usize, tag: u16, buf: &[u8]) -> Self::SendHandle;
    /// Post a receive; `buf.len()` is the number of bytes expected.
    fn irecv(&self, peer: usize, tag: u16, buf: &mut [u8]) -> Self::RecvHandle;

    fn rank(&self) -> usize;
    fn size(&self) -> usize;

    /// `true` only for the serial [`NoComm`].
    fn is_no_comm(&self) -> bool {
        false
    }

    /// `isend` with a peer range check.
    fn isend_result(
        &self,
        peer: usize,
        tag: u16,
        buf: &[u8],
    ) -> Result<Self::SendHandle, QuadError> {
        check_peer(peer, self.size())?;
        Ok(self.isend(peer, tag, buf))
    }

    /// `irecv` with a peer range check.
    fn irecv_result(
        &self,
        peer: usize,
        tag: u16,
        buf: &mut [u8],
    ) -> Result<Self::RecvHandle, QuadError> {
        check_peer(peer, self.size())?;
        Ok(self.irecv(peer, tag, buf))
    }
}

fn check_peer(peer: usize, size: usize) -> Result<(), QuadError> {
    if peer < size {
        Ok(())
    } else {
        Err(QuadError::InvalidRank { rank: peer, size })
    }
}

/// Anything that can be waited on.
pub trait Wait {
    /// Wait for completion and return the received data (if any).
    fn wait(self) -> Option<Vec<u8>>;
}

impl Wait for () {
    fn wait(self) -> Option<Vec<u8>> {
        None
    }
}

/// Single-rank communicator for serial runs; every message is a no-op.
#[derive(Clone, Debug, Default)]
pub struct NoComm;

impl Communicator for NoComm {
    type SendHandle = ();
    type RecvHandle = ();

    fn isend(&self, _peer: usize, _tag: u16, _buf: &[u8]) {}
    fn irecv(&self, _peer: usize, _tag: u16, _buf: &mut [u8]) {}

    fn rank(&self) -> usize {
        0
    }
    fn size(&self) -> usize {
        1
    }
    fn is_no_comm(&self) -> bool {
        true
    }
}

// --- RayonComm: intra-process / multi-thread ---
type Key = (usize, usize, u16); // (src, dst, tag)
type Mailbox = DashMap<Key, VecDeque<Bytes>>;

static MAILBOX: Lazy<Arc<Mailbox>> = Lazy::new(|| Arc::new(DashMap::new()));

/// Receive handle for [`RayonComm`]; the mailbox is polled on `wait`.
pub struct LocalHandle {
    mailbox: Arc<Mailbox>,
    key: Key,
    len: usize,
}

impl Wait for LocalHandle {
    fn wait(self) -> Option<Vec<u8>> {
        loop {
            let popped = self.mailbox.get_mut(&self.key).and_then(|mut queue| {
                let bytes = queue.pop_front()?;
                Some((bytes, queue.is_empty()))
            });
            if let Some((bytes, drained)) = popped {
                // the shard guard is released above; a sender may have
                // refilled the queue since, so only an empty one is removed
                if drained {
                    self.mailbox.remove_if(&self.key, |_, q| q.is_empty());
                }
                let n = self.len.min(bytes.len());
                return Some(bytes[..n].to_vec());
            }
            std::thread::yield_now();
        }
    }
}

/// Threads-as-ranks communicator. Messages between the same `(src, dst, tag)`
/// are delivered in FIFO order; a receive longer than the message it matches
/// returns the shorter message, a shorter one truncates it.
#[derive(Clone, Debug)]
pub struct RayonComm {
    rank: usize,
    size: usize,
    mailbox: Arc<Mailbox>,
}

impl RayonComm {
    /// Rank in the process-global group. Concurrent users of the global group
    /// must not share tags.
    pub fn new(rank: usize, size: usize) -> Self {
        Self {
            rank,
            size,
            mailbox: Arc::clone(&MAILBOX),
        }
    }

    /// A fresh, isolated group of `size` ranks.
    pub fn world(size: usize) -> Vec<Self> {
        let mailbox: Arc<Mailbox> = Arc::new(DashMap::new());
        (0..size)
            .map(|rank| Self {
                rank,
                size,
                mailbox: Arc::clone(&mailbox),
            })
            .collect()
    }
}

impl Communicator for RayonComm {
    type SendHandle = ();
    type RecvHandle = LocalHandle;

    fn isend(&self, peer: usize, tag: u16, buf: &[u8]) -> Self::SendHandle {
        let key = (self.rank, peer, tag);
        self.mailbox
            .entry(key)
            .or_default()
            .push_back(Bytes::copy_from_slice(buf));
    }

    fn irecv(&self, peer: usize, tag: u16, buf: &mut [u8]) -> Self::RecvHandle {
        LocalHandle {
            mailbox: Arc::clone(&self.mailbox),
            key: (peer, self.rank, tag),
            len: buf.len(),
        }
    }

    fn rank(&self) -> usize {
        self.rank
    }
    fn size(&self) -> usize {
        self.size
    }
}

// --- MPI backend (feature = "mpi-support") ---
#[cfg(feature = "mpi-support")]
mod mpi_backend {
    use super::{Communicator, Wait};
    use mpi::environment::Universe;
    use mpi::request::{Request, StaticScope};
    use mpi::topology::SimpleCommunicator;
    use mpi::traits::*;

    /// MPI world communicator. Dropping it finalizes MPI.
    pub struct MpiComm {
        pub world: SimpleCommunicator,
        rank: usize,
        size: usize,
        _universe: Universe,
    }

    impl MpiComm {
        /// Initialize MPI; `None` if it was already initialized.
        pub fn new() -> Option<Self> {
            let universe = mpi::initialize()?;
            let world = universe.world();
            let rank = world.rank() as usize;
            let size = world.size() as usize;
            Some(Self {
                world,
                rank,
                size,
                _universe: universe,
            })
        }
    }

    /// In-flight request owning its buffer until completion.
    pub struct MpiHandle {
        req: Request<'static, [u8]>,
        buf: *mut [u8],
        returns_data: bool,
    }

    impl Wait for MpiHandle {
        fn wait(self) -> Option<Vec<u8>> {
            let MpiHandle {
                req,
                buf,
                returns_data,
            } = self;
            req.wait();
            // SAFETY: `buf` came from `Box::into_raw` in `isend`/`irecv`, and the
            // only borrow of it was held by `req`, which has now completed.
            let owned = unsafe { Box::from_raw(buf) };
            returns_data.then(|| owned.into_vec())
        }
    }

    impl Communicator for MpiComm {
        type SendHandle = MpiHandle;
        type RecvHandle = MpiHandle;

        fn isend(&self, peer: usize, tag: u16, buf: &[u8]) -> MpiHandle {
            let raw = Box::into_raw(buf.to_vec().into_boxed_slice());
            // SAFETY: the allocation is leaked until `MpiHandle::wait` reclaims it.
            let data: &'static [u8] = unsafe { &*raw };
            let req = self.world.process_at_rank(peer as i32).immediate_send_with_tag(
                StaticScope,
                data,
                tag as i32,
            );
            MpiHandle {
                req,
                buf: raw,
                returns_data: false,
            }
        }

        fn irecv(&self, peer: usize, tag: u16, buf: &mut [u8]) -> MpiHandle {
            let raw = Box::into_raw(vec![0u8; buf.len()].into_boxed_slice());
            // SAFETY: as in `isend`; nothing else touches the allocation until
            // the request completes.
            let data: &'static mut [u8] = unsafe { &mut *raw };
            let req = self
                .world
                .process_at_rank(peer as i32)
                .immediate_receive_into_with_tag(StaticScope, data, tag as i32);
            MpiHandle {
                req,
                buf: raw,
                returns_data: true,
            }
        }

        fn rank(&self) -> usize {
            self.rank
        }
        fn size(&self) -> usize {
            self.size
        }
    }
}

#[cfg(feature = "mpi-support")]
pub use mpi_backend::MpiComm;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rayon_roundtrip_two_ranks() {
        let comms = RayonComm::world(2);
        let (comm0, comm1) = (&comms[0], &comms[1]);

        let mut recv_buf = [0u8; 4];
        let recv_handle = comm1.irecv(0, 7, &mut recv_buf);
        let send_handle = comm0.isend(1, 7, &[1, 2, 3, 4]);
        send_handle.wait();

        let data = recv_handle
            .wait()
            .expect("Expected to receive data from rank 0");
        recv_buf.copy_from_slice(&data);
        assert_eq!(&recv_buf, &[1, 2, 3, 4]);
    }

    #[test]
    fn drained_queues_leave_the_mailbox() {
        let comms = RayonComm::world(2);
        comms[0].isend(1, 5, &[1]);
        comms[0].isend(1, 5, &[2]);
        let mut buf = [0u8; 1];
        assert_eq!(comms[1].irecv(0, 5, &mut buf).wait(), Some(vec![1]));
        assert_eq!(comms[1].mailbox.len(), 1);
        assert_eq!(comms[1].irecv(0, 5, &mut buf).wait(), Some(vec![2]));
        assert!(comms[0].mailbox.is_empty());
    }

    #[test]
    fn isolated_groups_do_not_share_messages() {
        let a = RayonComm::world(2);
        let b = RayonComm::world(2);
        a[0].isend(1, 3, &[0xAA]);
        b[0].isend(1, 3, &[0xBB]);
        let mut buf = [0u8; 1];
        assert_eq!(b[1].irecv(0, 3, &mut buf).wait(), Some(vec![0xBB]));
        assert_eq!(a[1].irecv(0, 3, &mut buf).wait(), Some(vec![0xAA]));
    }

    #[test]
    fn zero_length_messages_are_delivered() {
        let comms = RayonComm::world(2);
        comms[1].isend(0, 11, &[]);
        let got = comms[0].irecv(1, 11, &mut []).wait();
        assert_eq!(got, Some(Vec::new()));
    }

    #[test]
    fn peer_range_is_checked() {
        let comms = RayonComm::world(2);
        let err = comms[0].isend_result(2, 1, &[1]).unwrap_err();
        assert!(matches!(err, QuadError::InvalidRank { rank: 2, size: 2 }));
        assert!(comms[0].irecv_result(1, 1, &mut [0u8; 1]).is_ok());
    }

    #[cfg(feature = "mpi-support")]
    #[test]
    fn mpi_roundtrip() {
        let comm = MpiComm::new().expect("MPI already initialized");
        let size = comm.size();
        let nbr = (comm.rank() + 1) % size;
        let prev = (comm.rank() + size - 1) % size;
        let mut recv = [0u8; 2];
        let r = comm.irecv(prev, 9, &mut recv);
        let s = comm.isend(nbr, 9, &[42, comm.rank() as u8]);
        let got = r.wait().expect("MPI receive returns its buffer");
        assert!(s.wait().is_none());
        assert_eq!(got, vec![42, prev as u8]);
    }

    #[test]
    fn pipeline_tags_are_distinct() {
        let t = PipelineCommTags::from_base(CommTag::new(100));
        let all = [
            t.broadcast.sizes,
            t.broadcast.data,
            t.wedges.sizes,
            t.wedges.data,
            t.vertex_counts.sizes,
            t.vertex_counts.data,
            t.reduce,
            t.gather.sizes,
            t.gather.data,
        ];
        let mut raw: Vec<u16> = all.iter().map(|t| t.as_u16()).collect();
        raw.sort_unstable();
        raw.dedup();
        assert_eq!(raw.len(), PipelineCommTags::SPAN as usize);
        assert_eq!(raw, (100..100 + PipelineCommTags::SPAN).collect::<Vec<_>>());
    }
}
