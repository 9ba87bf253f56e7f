//! Distribution planning: per-rank counts and displacements.

use log::debug;

use crate::error::{Error, Result};
use crate::LayoutMode;

/// The (count, displacement) table governing one scatter operation.
///
/// Owned by the root rank. Counts and displacements are element-denominated
/// and guaranteed to fit in `i32`, as the wire contract requires; the
/// planner's own arithmetic is 64-bit so the guarantee is checked, not
/// assumed.
///
/// # Example
///
/// ```
/// use scattercheck::{DistributionTable, LayoutMode};
///
/// let table = DistributionTable::plan(9, 4, LayoutMode::Packed, 2).unwrap();
/// assert_eq!(table.counts(), &[2, 2, 2, 3]);
/// assert_eq!(table.displs(), &[0, 2, 4, 6]);
/// ```
#[derive(Debug, Clone)]
pub struct DistributionTable {
    counts: Vec<i32>,
    displs: Vec<i32>,
    /// Allocation length of the flattened send buffer, gap cells included.
    span: usize,
}

impl DistributionTable {
    /// Build the table for `num_ranks` ranks over `total_elements` data
    /// elements.
    ///
    /// Every rank receives `total_elements / num_ranks` elements; the whole
    /// remainder of the division goes to the last rank. Under
    /// [`LayoutMode::Packed`] the slices tile `[0, total_elements)` tightly.
    /// Under [`LayoutMode::Skip`] a gap of `stride` sentinel cells precedes
    /// every slice — the first slice included, so rank 0's data never starts
    /// at offset 0 — and the allocation span grows by `stride * num_ranks`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when `num_ranks < 1` or when any count
    /// or displacement would not fit in an `i32`.
    pub fn plan(
        total_elements: usize,
        num_ranks: i32,
        mode: LayoutMode,
        stride: usize,
    ) -> Result<Self> {
        if num_ranks < 1 {
            return Err(Error::InvalidWorldSize(num_ranks));
        }
        let n = num_ranks as u64;
        let total = total_elements as u64;
        let stride = match mode {
            LayoutMode::Packed => 0u64,
            LayoutMode::Skip => stride as u64,
        };

        let base = total / n;
        let rem = total % n;
        let span = total + stride * n;

        let mut counts = Vec::with_capacity(num_ranks as usize);
        let mut displs = Vec::with_capacity(num_ranks as usize);

        let mut last_count = base;
        let mut last_disp = stride;
        for d_idx in 0..n {
            if rem != 0 && d_idx == n - 1 {
                last_count += rem;
            }
            if last_count > i32::MAX as u64 {
                return Err(Error::CountOverflow(last_count));
            }
            if last_disp > i32::MAX as u64 {
                return Err(Error::DisplacementOverflow(last_disp));
            }
            counts.push(last_count as i32);
            displs.push(last_disp as i32);
            debug!(
                "d_idx {:3} / last_disp {:9} / last_count {:9} | total_count {:10}",
                d_idx, last_disp, last_count, span
            );
            // Shift past this slice; in skip mode also past the next gap.
            last_disp += last_count + stride;
        }

        Ok(DistributionTable {
            counts,
            displs,
            span: span as usize,
        })
    }

    /// Per-rank element counts.
    pub fn counts(&self) -> &[i32] {
        &self.counts
    }

    /// Per-rank element displacements into the flattened send buffer.
    pub fn displs(&self) -> &[i32] {
        &self.displs
    }

    /// Allocation length of the flattened send buffer, gap cells included.
    pub fn span(&self) -> usize {
        self.span
    }

    /// Number of ranks in the table.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// True only for an empty table (never produced by [`plan`](Self::plan)).
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Element count assigned to `rank`.
    pub fn count_for(&self, rank: i32) -> usize {
        self.counts[rank as usize] as usize
    }
}

/// The number of elements `rank` will receive from a scatter of
/// `total_elements` over `num_ranks` ranks.
///
/// Mirrors the planner's remainder policy so non-root ranks can size their
/// receive buffer without building the full table.
pub fn recv_count_for(total_elements: usize, num_ranks: i32, rank: i32) -> usize {
    let n = num_ranks as usize;
    let base = total_elements / n;
    let rem = total_elements % n;
    if rem != 0 && rank as usize == n - 1 {
        base + rem
    } else {
        base
    }
}
