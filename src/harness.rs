//! The per-case driver and the full suite.
//!
//! [`run_case`] walks one (datatype, mode, invocation) combination through
//! the plan → fill → distribute → verify pipeline on every rank;
//! [`run_suite`] sequences the combinations the way the harness is meant to
//! be run, accumulating one failure unit per failing case into the process
//! exit code.

use num_complex::Complex64;

use crate::bytes::human_bytes;
use crate::config::HarnessConfig;
use crate::count::calc_uniform_count;
use crate::element::Element;
use crate::error::Result;
use crate::payload::{fill_send_buffer, sentinel_recv_buffer};
use crate::plan::{recv_count_for, DistributionTable};
use crate::transport::{PendingOp, Transport};
use crate::verify::verify;
use crate::{Invocation, LayoutMode};

/// The designated root rank for every distribution.
pub const ROOT: i32 = 0;

/// Result of one case on one rank.
#[derive(Debug, Clone, Copy)]
pub struct CaseOutcome {
    /// This rank's verification statistics.
    pub verification: crate::verify::Verification,
}

impl CaseOutcome {
    /// True when this rank found no mismatches.
    pub fn passed(&self) -> bool {
        self.verification.passed()
    }
}

/// Run one case: distribute `total_elements` of `T` under `mode` and verify
/// delivery on this rank.
///
/// The root plans the table, generates the tagged payload and prints the
/// case header; every rank seeds its receive buffer with the sentinel,
/// participates in the collective, scans the result and prints its own
/// pass/fail line. A barrier closes the case so no rank tears its buffers
/// down while another's receive is still in flight.
pub fn run_case<T: Element, X: Transport>(
    world: &X,
    cfg: &HarnessConfig,
    mode: LayoutMode,
    total_elements: usize,
    invocation: Invocation,
) -> Result<CaseOutcome> {
    let rank = world.rank();
    let size = world.size();
    let recv_count = recv_count_for(total_elements, size, rank);

    let mut send: Vec<T> = Vec::new();
    let mut counts: Vec<i32> = Vec::new();
    let mut displs: Vec<i32> = Vec::new();

    if rank == ROOT {
        let table = DistributionTable::plan(total_elements, size, mode, cfg.disp_stride)?;
        send = fill_send_buffer(&table, mode);
        counts = table.counts().to_vec();
        displs = table.displs().to_vec();

        let payload_bytes = table.span() as u64 * T::size_of() as u64;
        println!("---------------------");
        println!(
            "Results from {}({} x {} = {} or {}): Mode: {}",
            invocation.op_name(),
            T::NAME,
            table.span(),
            payload_bytes,
            human_bytes(payload_bytes),
            mode.label()
        );
    }

    let mut recv = sentinel_recv_buffer::<T>(recv_count);
    match invocation {
        Invocation::Blocking => {
            world.scatterv(&send, &counts, &displs, &mut recv, ROOT)?;
        }
        Invocation::Nonblocking => {
            let pending = world.iscatterv(&send, &counts, &displs, &mut recv, ROOT)?;
            pending.wait()?;
        }
    }

    let verification = verify::<T>(&recv, rank);
    verification.report(rank);

    world.barrier()?;
    Ok(CaseOutcome { verification })
}

/// Run the full suite on this rank and return the number of failed cases.
///
/// For each datatype: a packed case at the configured total, then a skip
/// case at `total - disp_stride * world_size` so the inflated span matches
/// the packed allocation. The pair repeats with the nonblocking invocation
/// when the configuration allows it. With `uniform_count` set, totals come
/// from [`calc_uniform_count`] instead of the configured sizes.
pub fn run_suite<X: Transport>(world: &X, cfg: &HarnessConfig) -> Result<i32> {
    let n = world.size() as usize;
    let total_int = suite_total(cfg, n, cfg.total_int, <i32 as Element>::size_of());
    let total_complex = suite_total(cfg, n, cfg.total_complex, <Complex64 as Element>::size_of());

    let mut failures = 0;
    let mut invocations = vec![Invocation::Blocking];
    if cfg.allow_nonblocked {
        invocations.push(Invocation::Nonblocking);
    }

    for invocation in invocations {
        failures += run_pair::<i32, X>(world, cfg, total_int, invocation)?;
        failures += run_pair::<Complex64, X>(world, cfg, total_complex, invocation)?;
    }
    Ok(failures)
}

/// One packed case plus its skip companion.
fn run_pair<T: Element, X: Transport>(
    world: &X,
    cfg: &HarnessConfig,
    total: usize,
    invocation: Invocation,
) -> Result<i32> {
    let n = world.size() as usize;
    let mut failures = 0;

    if !run_case::<T, X>(world, cfg, LayoutMode::Packed, total, invocation)?.passed() {
        failures += 1;
    }
    // Shrink the data so the stride-inflated span stays within the packed
    // allocation budget.
    let skip_total = total.saturating_sub(cfg.disp_stride * n);
    if !run_case::<T, X>(world, cfg, LayoutMode::Skip, skip_total, invocation)?.passed() {
        failures += 1;
    }
    Ok(failures)
}

fn suite_total(cfg: &HarnessConfig, n: usize, configured: usize, element_size: usize) -> usize {
    match cfg.uniform_count {
        Some(target) => calc_uniform_count(element_size, target / n, n, 1) * n,
        None => configured,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suite_total_uses_configured_size_by_default() {
        let cfg = HarnessConfig::new(0, 4);
        assert_eq!(suite_total(&cfg, 4, 1000, 4), 1000);
    }

    #[test]
    fn suite_total_uniform_is_a_multiple_of_world_size() {
        let mut cfg = HarnessConfig::new(0, 4);
        cfg.uniform_count = Some(1001);
        let total = suite_total(&cfg, 4, 1000, 4);
        assert_eq!(total % 4, 0);
        assert_eq!(total, (1001 / 4) * 4);
    }
}
