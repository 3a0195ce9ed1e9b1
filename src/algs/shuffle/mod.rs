//! Collective all-to-all shuffle of fixed-layout records.
//!
//! Two-round "sizes then data" exchange:
//!
//! 1. Every rank tells every other rank how many records it will send
//!    ([`size_exchange::exchange_counts`], tag = `tags.sizes`).
//! 2. Receivers size their buffers and the payload bytes are exchanged
//!    ([`data_exchange::exchange_records`], tag = `tags.data`).
//!
//! The call is a lock-step synchronization point: it returns on no rank until
//! that rank has sent and received its full allotment. There is no
//! acknowledgment or retry; a missing participant stalls the whole group.

pub mod data_exchange;
pub mod size_exchange;

use bytemuck::Pod;

use crate::algs::communicator::{Communicator, ShuffleCommTags};
use crate::quad_error::QuadError;

/// Destination rank → ordered records, for one shuffle call.
#[derive(Clone, Debug)]
pub struct PartitionBuckets<R> {
    buckets: Vec<Vec<R>>,
}

impl<R> PartitionBuckets<R> {
    /// One empty bucket per rank.
    pub fn new(world: usize) -> Self {
        Self {
            buckets: (0..world).map(|_| Vec::new()).collect(),
        }
    }

    pub fn world(&self) -> usize {
        self.buckets.len()
    }

    /// Append `record` to the bucket for `dest`.
    ///
    /// # Panics
    /// Panics if `dest >= world`. Use [`PartitionBuckets::try_push`] when
    /// `dest` comes from a [`Partitioner`](crate::partitioning::Partitioner).
    #[inline]
    pub fn push(&mut self, dest: usize, record: R) {
        self.buckets[dest].push(record);
    }

    /// Append `record` to the bucket for `dest`, or fail with
    /// [`QuadError::InvalidRank`] if there is no such bucket.
    #[inline]
    pub fn try_push(&mut self, dest: usize, record: R) -> Result<(), QuadError> {
        let size = self.world();
        match self.buckets.get_mut(dest) {
            Some(bucket) => {
                bucket.push(record);
                Ok(())
            }
            None => Err(QuadError::InvalidRank { rank: dest, size }),
        }
    }

    pub fn bucket(&self, dest: usize) -> &[R] {
        self.buckets.get(dest).map_or(&[][..], |b| &b[..])
    }

    /// Record count per destination.
    pub fn counts(&self) -> Vec<usize> {
        self.buckets.iter().map(Vec::len).collect()
    }

    pub fn total(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }

    /// Take the bucket for `dest`, leaving it empty.
    pub fn take(&mut self, dest: usize) -> Vec<R> {
        self.buckets
            .get_mut(dest)
            .map(std::mem::take)
            .unwrap_or_default()
    }

    /// Move every record of `other` behind the records already here.
    pub fn append(&mut self, mut other: PartitionBuckets<R>) {
        if other.world() > self.world() {
            self.buckets.resize_with(other.world(), Vec::new);
        }
        for (dest, bucket) in other.buckets.iter_mut().enumerate() {
            self.buckets[dest].append(bucket);
        }
    }
}

/// Redistribute `buckets` across the group.
///
/// After the call every rank holds the concatenation of all records any rank
/// addressed to it, ordered by source rank; per-source order is preserved.
/// Zero-length buckets are exchanged like any other. With a single rank the
/// local bucket is returned as-is.
///
/// # Errors
/// As [`shuffle_by_source`].
pub fn shuffle<R, C>(
    buckets: PartitionBuckets<R>,
    comm: &C,
    tags: ShuffleCommTags,
) -> Result<Vec<R>, QuadError>
where
    R: Pod,
    C: Communicator,
{
    Ok(shuffle_by_source(buckets, comm, tags)?
        .into_iter()
        .flatten()
        .collect())
}

/// [`shuffle`], keeping what each rank sent apart: entry `src` of the result
/// holds the records rank `src` addressed to us.
///
/// # Errors
/// - [`QuadError::InvalidRank`] if the communicator's rank is out of range.
/// - [`QuadError::CommError`] if `buckets` was sized for a different world or
///   a peer failed to deliver.
/// - [`QuadError::BufferSizeMismatch`] / [`QuadError::CorruptPayload`] if a
///   received buffer does not match what was announced.
pub fn shuffle_by_source<R, C>(
    buckets: PartitionBuckets<R>,
    comm: &C,
    tags: ShuffleCommTags,
) -> Result<Vec<Vec<R>>, QuadError>
where
    R: Pod,
    C: Communicator,
{
    let me = comm.rank();
    let world = comm.size();
    if world == 0 {
        return Err(QuadError::InvalidWorldSize(world));
    }
    if me >= world {
        return Err(QuadError::InvalidRank {
            rank: me,
            size: world,
        });
    }
    if buckets.world() != world {
        return Err(QuadError::comm(
            me,
            format!(
                "buckets sized for {} ranks, communicator has {world}",
                buckets.world()
            ),
        ));
    }

    let mut buckets = buckets;
    if comm.is_no_comm() || world == 1 {
        return Ok(vec![buckets.take(0)]);
    }

    let send_counts = buckets.counts();
    let recv_counts = size_exchange::exchange_counts(&send_counts, comm, tags.sizes)?;
    log::debug!(
        "rank {me}: shuffle on tag {:#06x} sends {} records, receives {}",
        tags.data.as_u16(),
        send_counts.iter().sum::<usize>(),
        recv_counts.iter().sum::<usize>()
    );
    data_exchange::exchange_records(buckets, &recv_counts, comm, tags.data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algs::communicator::{CommTag, NoComm, RayonComm};
    use crate::algs::wire::WireVertexCount;

    #[test]
    fn single_rank_is_pass_through() {
        let mut b = PartitionBuckets::new(1);
        b.push(0, WireVertexCount::new(1, 5));
        b.push(0, WireVertexCount::new(2, 6));
        let tags = ShuffleCommTags::from_base(CommTag::new(1));
        let got = shuffle(b, &NoComm, tags).unwrap();
        let got: Vec<_> = got.iter().map(|r| r.decode()).collect();
        assert_eq!(got, vec![(1, 5), (2, 6)]);
    }

    #[test]
    fn mis_sized_buckets_are_rejected() {
        let b: PartitionBuckets<WireVertexCount> = PartitionBuckets::new(3);
        let tags = ShuffleCommTags::from_base(CommTag::new(1));
        assert!(matches!(
            shuffle(b, &NoComm, tags),
            Err(QuadError::CommError { .. })
        ));
    }

    #[test]
    fn three_ranks_preserve_per_source_order() {
        let world = 3;
        let tags = ShuffleCommTags::from_base(CommTag::new(0x20));
        let results: Vec<Vec<(u32, i64)>> = std::thread::scope(|s| {
            let handles: Vec<_> = RayonComm::world(world)
                .into_iter()
                .map(|comm| {
                    s.spawn(move || -> Vec<(u32, i64)> {
                        let me = comm.rank();
                        let mut b = PartitionBuckets::new(world);
                        for i in 0..4i64 {
                            for dest in 0..world {
                                b.push(dest, WireVertexCount::new(me as u32, i));
                            }
                        }
                        shuffle(b, &comm, tags)
                            .unwrap()
                            .iter()
                            .map(|r| r.decode())
                            .collect()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        for got in results {
            let expected: Vec<(u32, i64)> = (0..world as u32)
                .flat_map(|src| (0..4).map(move |i| (src, i)))
                .collect();
            assert_eq!(got, expected);
        }
    }

    #[test]
    fn by_source_keeps_senders_apart() {
        let world = 3;
        let tags = ShuffleCommTags::from_base(CommTag::new(0x28));
        let results: Vec<Vec<Vec<u32>>> = std::thread::scope(|s| {
            let handles: Vec<_> = RayonComm::world(world)
                .into_iter()
                .map(|comm| {
                    s.spawn(move || {
                        let me = comm.rank() as u32;
                        let mut b = PartitionBuckets::new(world);
                        // rank r sends r + 1 copies of its id to rank 0
                        for _ in 0..=me {
                            b.push(0, me);
                        }
                        shuffle_by_source(b, &comm, tags).unwrap()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(results[0], vec![vec![0], vec![1, 1], vec![2, 2, 2]]);
        for other in &results[1..] {
            assert!(other.iter().all(Vec::is_empty));
            assert_eq!(other.len(), world);
        }
    }

    #[test]
    fn try_push_rejects_missing_bucket() {
        let mut b = PartitionBuckets::new(2);
        assert!(b.try_push(1, 7u32).is_ok());
        assert!(matches!(
            b.try_push(2, 8u32),
            Err(QuadError::InvalidRank { rank: 2, size: 2 })
        ));
        assert_eq!(b.counts(), vec![0, 1]);
    }

    #[test]
    fn append_merges_buckets() {
        let mut a = PartitionBuckets::new(2);
        a.push(1, 10u32);
        let mut b = PartitionBuckets::new(2);
        b.push(1, 11u32);
        b.push(0, 12u32);
        a.append(b);
        assert_eq!(a.bucket(0), &[12]);
        assert_eq!(a.bucket(1), &[10, 11]);
        assert_eq!(a.total(), 3);
    }
}
