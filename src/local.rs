//! In-process multi-rank transport.
//!
//! [`LocalWorld::new`] produces one [`LocalRank`] endpoint per rank, all
//! sharing a sequence-numbered exchange. Each rank is meant to run on its
//! own thread in lockstep through the same sequence of collective calls,
//! matching the one-process-per-rank model of a real launcher. The root's
//! call publishes the payload and table for the collective's sequence
//! number; every other rank blocks until the matching post appears, copies
//! its `(count, displacement)` slice, and the last consumer retires the
//! post.

use std::any::Any;
use std::cell::Cell;
use std::collections::HashMap;
use std::sync::{Arc, Barrier, Condvar, Mutex};

use crate::element::Element;
use crate::error::{Error, Result};
use crate::transport::{PendingOp, Transport};

/// One published scatter: the root's flattened buffer plus its table.
struct ScatterPost<T> {
    data: Vec<T>,
    counts: Vec<i32>,
    displs: Vec<i32>,
}

#[derive(Clone)]
enum PostBody {
    Payload(Arc<dyn Any + Send + Sync>),
    /// The root's call failed before it could serve anyone; carries the
    /// error text so consumers fail instead of waiting forever.
    Aborted(String),
}

struct Post {
    body: PostBody,
    remaining: usize,
}

struct Shared {
    size: i32,
    posts: Mutex<HashMap<u64, Post>>,
    cond: Condvar,
    barrier: Barrier,
}

/// An in-process world: one [`LocalRank`] endpoint per rank.
///
/// Iterate the world to move each endpoint onto its own thread.
pub struct LocalWorld {
    ranks: Vec<LocalRank>,
}

impl LocalWorld {
    /// Create a world with `num_ranks` ranks.
    ///
    /// # Panics
    ///
    /// Panics when `num_ranks < 1`.
    pub fn new(num_ranks: i32) -> Self {
        assert!(num_ranks >= 1, "world needs at least one rank");
        let shared = Arc::new(Shared {
            size: num_ranks,
            posts: Mutex::new(HashMap::new()),
            cond: Condvar::new(),
            barrier: Barrier::new(num_ranks as usize),
        });
        let ranks = (0..num_ranks)
            .map(|rank| LocalRank {
                rank,
                seq: Cell::new(0),
                shared: Arc::clone(&shared),
            })
            .collect();
        LocalWorld { ranks }
    }

    /// Consume the world, yielding the endpoints in rank order.
    pub fn into_ranks(self) -> Vec<LocalRank> {
        self.ranks
    }
}

impl IntoIterator for LocalWorld {
    type Item = LocalRank;
    type IntoIter = std::vec::IntoIter<LocalRank>;

    fn into_iter(self) -> Self::IntoIter {
        self.ranks.into_iter()
    }
}

/// One rank's endpoint of a [`LocalWorld`].
pub struct LocalRank {
    rank: i32,
    /// Per-rank collective sequence number; lockstep execution keeps it in
    /// sync across ranks.
    seq: Cell<u64>,
    shared: Arc<Shared>,
}

impl LocalRank {
    fn next_seq(&self) -> u64 {
        let seq = self.seq.get();
        self.seq.set(seq + 1);
        seq
    }

    fn check_root(&self, root: i32) -> Result<()> {
        if root < 0 || root >= self.shared.size {
            return Err(Error::InvalidRoot(root));
        }
        Ok(())
    }

    /// Root side: validate the table shape, serve our own slice, publish the
    /// rest. A root-side failure is still published, as an abort marker, so
    /// the other ranks error out instead of blocking on a post that will
    /// never arrive.
    fn publish<T: Element>(
        &self,
        seq: u64,
        send: &[T],
        counts: &[i32],
        displs: &[i32],
        recv: &mut [T],
    ) -> Result<()> {
        let size = self.shared.size as usize;
        let outcome = self.serve_root(send, counts, displs, recv);

        if size > 1 {
            let body = match &outcome {
                Ok(()) => PostBody::Payload(Arc::new(ScatterPost {
                    data: send.to_vec(),
                    counts: counts.to_vec(),
                    displs: displs.to_vec(),
                })),
                Err(e) => PostBody::Aborted(e.to_string()),
            };
            let mut posts = lock(&self.shared.posts)?;
            posts.insert(
                seq,
                Post {
                    body,
                    remaining: size - 1,
                },
            );
            self.shared.cond.notify_all();
        }
        outcome
    }

    /// Validate the root's table against the send buffer and copy the root's
    /// own slice.
    fn serve_root<T: Element>(
        &self,
        send: &[T],
        counts: &[i32],
        displs: &[i32],
        recv: &mut [T],
    ) -> Result<()> {
        let size = self.shared.size as usize;
        if counts.len() != size || displs.len() != size {
            return Err(Error::shape(format!(
                "table length {}/{} does not match world size {}",
                counts.len(),
                displs.len(),
                size
            )));
        }
        for r in 0..size {
            let (count, displ) = (counts[r], displs[r]);
            if count < 0 || displ < 0 {
                return Err(Error::shape(format!(
                    "negative count or displacement for rank {r}: ({count}, {displ})"
                )));
            }
            let end = displ as usize + count as usize;
            if end > send.len() {
                return Err(Error::shape(format!(
                    "slice for rank {r} ends at {end}, past send buffer of {}",
                    send.len()
                )));
            }
        }

        let own = self.rank as usize;
        copy_slice(send, counts[own], displs[own], recv, self.rank)
    }

    /// Non-root side: block until the root's post for `seq` appears, then
    /// copy our slice.
    fn consume<T: Element>(&self, seq: u64, recv: &mut [T]) -> Result<()> {
        let body = {
            let mut posts = lock(&self.shared.posts)?;
            loop {
                if posts.contains_key(&seq) {
                    break;
                }
                posts = self
                    .shared
                    .cond
                    .wait(posts)
                    .map_err(|_| Error::Internal("exchange lock poisoned".into()))?;
            }
            let post = posts
                .get_mut(&seq)
                .ok_or_else(|| Error::Internal("post vanished".into()))?;
            post.remaining -= 1;
            let body = post.body.clone();
            if post.remaining == 0 {
                posts.remove(&seq);
            }
            body
        };

        let payload = match body {
            PostBody::Payload(payload) => payload,
            PostBody::Aborted(msg) => {
                return Err(Error::shape(format!("root aborted the collective: {msg}")))
            }
        };
        let post: Arc<ScatterPost<T>> = payload
            .downcast()
            .map_err(|_| Error::shape("element type does not match the root's post"))?;
        let own = self.rank as usize;
        copy_slice(&post.data, post.counts[own], post.displs[own], recv, self.rank)
    }
}

fn copy_slice<T: Element>(
    data: &[T],
    count: i32,
    displ: i32,
    recv: &mut [T],
    rank: i32,
) -> Result<()> {
    if recv.len() != count as usize {
        return Err(Error::shape(format!(
            "rank {rank} receive buffer holds {} elements, table assigns {count}",
            recv.len()
        )));
    }
    let start = displ as usize;
    recv.copy_from_slice(&data[start..start + count as usize]);
    Ok(())
}

fn lock<T>(m: &Mutex<T>) -> Result<std::sync::MutexGuard<'_, T>> {
    m.lock()
        .map_err(|_| Error::Internal("exchange lock poisoned".into()))
}

/// Completion handle for a local nonblocking scatter.
///
/// The local world delivers at issue time, which is a legal schedule under
/// the [`PendingOp`] contract: the transport may populate the receive buffer
/// at any point between issue and wait.
pub struct LocalPending;

impl PendingOp for LocalPending {
    fn wait(self) -> Result<()> {
        Ok(())
    }

    fn test(&mut self) -> Result<bool> {
        Ok(true)
    }
}

impl Transport for LocalRank {
    type Pending = LocalPending;

    fn rank(&self) -> i32 {
        self.rank
    }

    fn size(&self) -> i32 {
        self.shared.size
    }

    fn barrier(&self) -> Result<()> {
        self.shared.barrier.wait();
        Ok(())
    }

    fn scatterv<T: Element>(
        &self,
        send: &[T],
        counts: &[i32],
        displs: &[i32],
        recv: &mut [T],
        root: i32,
    ) -> Result<()> {
        self.check_root(root)?;
        let seq = self.next_seq();
        if self.rank == root {
            self.publish(seq, send, counts, displs, recv)
        } else {
            self.consume(seq, recv)
        }
    }

    fn iscatterv<T: Element>(
        &self,
        send: &[T],
        counts: &[i32],
        displs: &[i32],
        recv: &mut [T],
        root: i32,
    ) -> Result<Self::Pending> {
        self.scatterv(send, counts, displs, recv, root)?;
        Ok(LocalPending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_rank_serves_its_own_slice() {
        let ranks = LocalWorld::new(1).into_ranks();
        let rank = &ranks[0];
        let send = vec![-1i32, -1, 1, 1, 1];
        let mut recv = vec![0i32; 3];
        rank.scatterv(&send, &[3], &[2], &mut recv, 0).unwrap();
        assert_eq!(recv, vec![1, 1, 1]);
    }

    #[test]
    fn rejects_invalid_root() {
        let ranks = LocalWorld::new(1).into_ranks();
        let mut recv = vec![0i32; 1];
        let err = ranks[0]
            .scatterv(&[1i32], &[1], &[0], &mut recv, 5)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidRoot(5)));
    }

    #[test]
    fn rejects_mismatched_table_length() {
        let ranks = LocalWorld::new(1).into_ranks();
        let mut recv = vec![0i32; 1];
        let err = ranks[0]
            .scatterv(&[1i32], &[1, 1], &[0, 1], &mut recv, 0)
            .unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
    }

    #[test]
    fn rejects_out_of_range_slice() {
        let ranks = LocalWorld::new(1).into_ranks();
        let mut recv = vec![0i32; 4];
        let err = ranks[0]
            .scatterv(&[1i32, 1], &[4], &[0], &mut recv, 0)
            .unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
    }

    #[test]
    fn rejects_recv_length_mismatch() {
        let ranks = LocalWorld::new(1).into_ranks();
        let mut recv = vec![0i32; 2];
        let err = ranks[0]
            .scatterv(&[1i32, 1, 1], &[3], &[0], &mut recv, 0)
            .unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
    }

    #[test]
    fn two_ranks_exchange_on_threads() {
        let mut ranks = LocalWorld::new(2).into_ranks();
        let r1 = ranks.pop().unwrap();
        let r0 = ranks.pop().unwrap();

        let h0 = std::thread::spawn(move || {
            let send = vec![10i32, 20, 30];
            let mut recv = vec![0i32; 1];
            r0.scatterv(&send, &[1, 2], &[0, 1], &mut recv, 0).unwrap();
            recv
        });
        let h1 = std::thread::spawn(move || {
            let mut recv = vec![0i32; 2];
            r1.scatterv(&[], &[], &[], &mut recv, 0).unwrap();
            recv
        });

        assert_eq!(h0.join().unwrap(), vec![10]);
        assert_eq!(h1.join().unwrap(), vec![20, 30]);
    }

    #[test]
    fn root_shape_error_does_not_strand_other_ranks() {
        let mut ranks = LocalWorld::new(2).into_ranks();
        let r1 = ranks.pop().unwrap();
        let r0 = ranks.pop().unwrap();

        let h1 = std::thread::spawn(move || {
            let mut recv = vec![0i32; 1];
            r1.scatterv(&[], &[], &[], &mut recv, 0)
        });
        // Table too short for a two-rank world: the root must fail AND the
        // peer must come back with an error rather than block forever.
        let mut recv = vec![0i32; 1];
        let root_err = r0.scatterv(&[1i32], &[1], &[0], &mut recv, 0).unwrap_err();
        assert!(matches!(root_err, Error::Transport(_)));

        let peer_err = h1.join().unwrap().unwrap_err();
        assert!(matches!(peer_err, Error::Transport(_)));
    }

    #[test]
    fn pending_completes_immediately() {
        let ranks = LocalWorld::new(1).into_ranks();
        let mut recv = vec![0i32; 1];
        let mut pending = ranks[0]
            .iscatterv(&[5i32], &[1], &[0], &mut recv, 0)
            .unwrap();
        assert!(pending.test().unwrap());
        pending.wait().unwrap();
        assert_eq!(recv, vec![5]);
    }

    #[test]
    fn nonroot_may_arrive_before_the_root() {
        let mut ranks = LocalWorld::new(2).into_ranks();
        let r1 = ranks.pop().unwrap();
        let r0 = ranks.pop().unwrap();

        let h1 = std::thread::spawn(move || {
            let mut recv = vec![0i32; 1];
            r1.scatterv(&[], &[], &[], &mut recv, 0).unwrap();
            recv
        });
        // Give the consumer a head start so it blocks on the condvar.
        std::thread::sleep(std::time::Duration::from_millis(20));
        let mut recv = vec![0i32; 1];
        r0.scatterv(&[7i32, 8], &[1, 1], &[0, 1], &mut recv, 0)
            .unwrap();
        assert_eq!(recv, vec![7]);
        assert_eq!(h1.join().unwrap(), vec![8]);
    }
}
