//! Receive-side verification of delivered payloads.

use log::trace;

use crate::element::Element;

/// Outcome of scanning one rank's receive buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verification {
    /// Number of elements scanned.
    pub checked: usize,
    /// Number of elements that did not equal the expected tag.
    pub mismatches: usize,
}

impl Verification {
    /// True when every scanned element matched.
    pub fn passed(&self) -> bool {
        self.mismatches == 0
    }

    /// Mismatches as a percentage of the elements this rank checked.
    pub fn percent_wrong(&self) -> f64 {
        if self.checked == 0 {
            0.0
        } else {
            self.mismatches as f64 / self.checked as f64 * 100.0
        }
    }

    /// Print the per-rank result line.
    pub fn report(&self, rank: i32) {
        if self.passed() {
            println!("Rank {rank:2}: PASSED");
        } else {
            println!(
                "Rank {rank:2}: ERROR: DI in {:14} of {:14} slots ({:6.1} % wrong)",
                self.mismatches,
                self.checked,
                self.percent_wrong()
            );
        }
    }
}

/// Scan a receive buffer against the tag expected for `rank`.
///
/// The expected value is `rank + 1` regardless of layout mode: gap cells
/// exist only in the sender's flattened view and are never delivered. The
/// scan always runs to completion so the mismatch count is exact.
pub fn verify<T: Element>(recv: &[T], rank: i32) -> Verification {
    let expected = T::tag(rank);
    let mut mismatches = 0usize;
    for (i, &got) in recv.iter().enumerate() {
        trace!("{rank:2} CHECK: {i:2} : {got:?} vs {expected:?}");
        if !got.matches(expected) {
            mismatches += 1;
        }
    }
    Verification {
        checked: recv.len(),
        mismatches,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex64;

    #[test]
    fn clean_buffer_passes() {
        let recv = vec![4i32, 4, 4];
        let v = verify(&recv, 3);
        assert!(v.passed());
        assert_eq!(v.checked, 3);
        assert_eq!(v.percent_wrong(), 0.0);
    }

    #[test]
    fn injected_fault_is_counted_and_scaled() {
        // Rank 2 expects 3s; flip one element.
        let recv = vec![3i32, 7, 3];
        let v = verify(&recv, 2);
        assert!(!v.passed());
        assert_eq!(v.mismatches, 1);
        assert!((v.percent_wrong() - 100.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn scan_runs_to_completion() {
        let recv = vec![-1i32; 5];
        let v = verify(&recv, 0);
        assert_eq!(v.mismatches, 5);
        assert_eq!(v.checked, 5);
        assert_eq!(v.percent_wrong(), 100.0);
    }

    #[test]
    fn never_written_sentinel_cells_fail() {
        let mut recv = vec![Complex64::tag(1); 4];
        recv[2] = Complex64::sentinel();
        let v = verify(&recv, 1);
        assert_eq!(v.mismatches, 1);
    }

    #[test]
    fn empty_buffer_passes_with_zero_percent() {
        let recv: Vec<i32> = Vec::new();
        let v = verify(&recv, 0);
        assert!(v.passed());
        assert_eq!(v.percent_wrong(), 0.0);
    }
}
