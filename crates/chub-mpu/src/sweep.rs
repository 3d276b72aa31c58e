// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Splitter self-test
//!
//! Runs the splitter over a range of image sizes and records which sizes
//! could not be covered. Used on the bench to pick a slot budget for a new
//! image layout.

use core::fmt;

use heapless::Vec;

use crate::size_table::SizeTable;
use crate::split::decompose;

/// Failing sizes kept in a report
pub const MAX_RECORDED_FAILURES: usize = 50;

/// Outcome of a sweep
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Sizes tried
    pub tested: u32,
    /// Sizes split and verified
    pub succeeded: u32,
    /// Sizes that failed
    pub failures: u32,
    /// First failing sizes, in sweep order
    pub failed_sizes: Vec<u32, MAX_RECORDED_FAILURES>,
}

impl SweepReport {
    /// Check whether every size succeeded
    #[must_use]
    pub const fn all_passed(&self) -> bool {
        self.failures == 0
    }

    fn record(&mut self, size: u32, ok: bool) {
        self.tested += 1;
        if ok {
            self.succeeded += 1;
            return;
        }
        self.failures += 1;
        // Further failures are still counted
        let _ = self.failed_sizes.push(size);
    }
}

impl fmt::Display for SweepReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "tested {} succeeded {} failed {}",
            self.tested, self.succeeded, self.failures
        )?;
        for size in &self.failed_sizes {
            writeln!(f, "failed size: {size}")?;
        }
        Ok(())
    }
}

/// Split every size in `start..=end`, stepping by `step`
///
/// A size counts as a success only if the resulting plan also passes
/// [`SplitPlan::verify`](crate::split::SplitPlan::verify). A zero `step` is
/// treated as one.
#[must_use]
pub fn sweep(start: u32, end: u32, step: u32, max_slots: usize, table: &SizeTable) -> SweepReport {
    let mut report = SweepReport::default();
    for size in (start..=end).step_by(step.max(1) as usize) {
        let ok = decompose(size, max_slots, table)
            .map(|plan| plan.verify(size, table).is_ok())
            .unwrap_or(false);
        report.record(size, ok);
    }
    report
}
