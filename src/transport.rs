//! The distribution transport contract.
//!
//! The harness does not implement the root-to-many distribution primitive
//! itself; it supplies correctly shaped inputs and consumes outputs through
//! the [`Transport`] trait. The trait's surface mirrors the variable-count
//! scatter of an MPI communicator (`MPI_Scatterv` / `MPI_Iscatterv` +
//! `MPI_Wait` + `MPI_Barrier`): one `Transport` value per rank, all ranks
//! calling each collective in lockstep. The in-process implementation lives
//! in [`crate::local`].

use crate::element::Element;
use crate::error::Result;

/// A handle to an in-flight nonblocking distribution.
///
/// The receive buffer passed to [`Transport::iscatterv`] must not be read
/// until [`wait`](PendingOp::wait) returns; the transport may populate it at
/// any point in between. There is deliberately no timeout — a wait that
/// never returns is itself a test failure.
pub trait PendingOp {
    /// Block until the operation completes.
    fn wait(self) -> Result<()>;

    /// Poll for completion without blocking.
    ///
    /// If this returns `true`, the operation is complete and `wait()` need
    /// not be called.
    fn test(&mut self) -> Result<bool>;
}

/// One rank's endpoint of the distribution transport.
///
/// `send`, `counts` and `displs` are significant at the root only; other
/// ranks pass empty slices. `counts[r]` elements starting at element offset
/// `displs[r]` of `send` are delivered to rank `r`'s `recv`, whose length
/// must equal `counts[r]`. Delivery reflects exactly the table in effect at
/// call time; the transport neither retries nor reorders.
pub trait Transport {
    /// Completion handle type for nonblocking calls.
    type Pending: PendingOp;

    /// This rank's ordinal in `[0, size)`.
    fn rank(&self) -> i32;

    /// Number of cooperating ranks.
    fn size(&self) -> i32;

    /// Block until every rank has entered the barrier.
    fn barrier(&self) -> Result<()>;

    /// Blocking variable-count distribution from `root`.
    fn scatterv<T: Element>(
        &self,
        send: &[T],
        counts: &[i32],
        displs: &[i32],
        recv: &mut [T],
        root: i32,
    ) -> Result<()>;

    /// Nonblocking variable-count distribution from `root`.
    ///
    /// Returns a completion handle that must be waited on before `recv` is
    /// read.
    fn iscatterv<T: Element>(
        &self,
        send: &[T],
        counts: &[i32],
        displs: &[i32],
        recv: &mut [T],
        root: i32,
    ) -> Result<Self::Pending>;
}
