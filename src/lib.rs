//! # scattercheck
//!
//! Correctness harness for irregular, root-distributed collective data
//! movement: a root rank scatters a payload across a fixed set of ranks
//! with per-rank counts and displacements, and every rank verifies
//! bit-exact delivery.
//!
//! The harness:
//! - plans per-rank (count, displacement) tables under two layout modes,
//!   tightly packed or strided with sentinel-filled gaps
//! - generates a payload whose every element encodes its destination rank
//!   (`rank + 1`), with `-1` as the gap/uninitialized sentinel
//! - distributes through a pluggable [`Transport`] whose contract mirrors
//!   `MPI_Scatterv`/`MPI_Iscatterv`, blocking or nonblocking
//! - scans each rank's receive buffer and reports pass/fail with mismatch
//!   statistics
//!
//! ## Quick Start
//!
//! ```no_run
//! use scattercheck::{run_suite, HarnessConfig, LocalWorld};
//!
//! fn main() -> scattercheck::Result<()> {
//!     let mut handles = Vec::new();
//!     for endpoint in LocalWorld::new(4) {
//!         handles.push(std::thread::spawn(move || {
//!             use scattercheck::Transport;
//!             let cfg = HarnessConfig::from_env(endpoint.rank(), endpoint.size());
//!             run_suite(&endpoint, &cfg)
//!         }));
//!     }
//!     let mut failures = 0;
//!     for handle in handles {
//!         failures += handle.join().expect("rank panicked")?;
//!     }
//!     assert_eq!(failures, 0, "{failures} cases failed");
//!     Ok(())
//! }
//! ```
//!
//! ## Layout Modes
//!
//! | Mode | Displacements | Span |
//! |------|---------------|------|
//! | [`LayoutMode::Packed`] | `displs[0] = 0`, tight tiling | `total` |
//! | [`LayoutMode::Skip`]   | a `stride` gap before every slice, rank 0 included | `total + stride * n` |
//!
//! When the total does not divide evenly, the whole remainder goes to the
//! last rank in both modes.
//!
//! The real MPI transport is deliberately outside this crate; [`Transport`]
//! is the seam where one attaches, and [`LocalWorld`] provides an
//! in-process multi-rank implementation for running the harness standalone.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod bytes;
mod config;
mod count;
mod element;
mod error;
mod harness;
mod local;
mod payload;
mod plan;
mod transport;
mod verify;

pub use bytes::human_bytes;
pub use config::HarnessConfig;
pub use count::calc_uniform_count;
pub use element::Element;
pub use error::{Error, Result};
pub use harness::{run_case, run_suite, CaseOutcome, ROOT};
pub use local::{LocalPending, LocalRank, LocalWorld};
pub use payload::{fill_send_buffer, sentinel_recv_buffer};
pub use plan::{recv_count_for, DistributionTable};
pub use transport::{PendingOp, Transport};
pub use verify::{verify, Verification};

/// Layout strategy for the root's flattened send buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutMode {
    /// Slices tile the buffer tightly with no unused cells.
    Packed,
    /// A fixed-size sentinel-filled gap precedes every slice, including the
    /// first — rank 0's data starts at `stride`, never at 0.
    Skip,
}

impl LayoutMode {
    /// Label used in case headers.
    pub fn label(self) -> &'static str {
        match self {
            LayoutMode::Packed => "PACKED",
            LayoutMode::Skip => "SKIP",
        }
    }
}

/// Which form of the distribution primitive a case exercises.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Invocation {
    /// The call returns once the receive buffer is populated.
    Blocking,
    /// The call returns a completion handle; the buffer is valid after wait.
    Nonblocking,
}

impl Invocation {
    /// Operation name used in case headers.
    pub fn op_name(self) -> &'static str {
        match self {
            Invocation::Blocking => "scatterv",
            Invocation::Nonblocking => "iscatterv",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels() {
        assert_eq!(LayoutMode::Packed.label(), "PACKED");
        assert_eq!(LayoutMode::Skip.label(), "SKIP");
        assert_eq!(Invocation::Blocking.op_name(), "scatterv");
        assert_eq!(Invocation::Nonblocking.op_name(), "iscatterv");
    }
}
