// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Code region splitter
//!
//! Decomposes a code image of arbitrary size, starting at address zero, into
//! a short sequence of MPU regions. Each region must be a power of two from
//! the [`SizeTable`] and must be aligned to its own size. The last region may
//! leave some of its upper sub-regions disabled, which is how sizes that are
//! not a sum of aligned powers of two still get exact coverage.
//!
//! Each step first looks for a region that finishes the image exactly
//! (whole, or with only its lower sub-blocks enabled), scanning the table in
//! ascending order. Failing that, it takes the largest aligned size that
//! still fits. The scan order is part of the result: tables built on one
//! boot must match tables built on every other boot.

use core::cmp::Reverse;
use core::fmt;

use heapless::Vec;

use chub_common::constants::{CODE_BASE, MAX_MPU_REGIONS, MPU_SUBREGIONS};
use chub_common::{Error, Result};

use crate::size_table::SizeTable;

/// One code region chosen by the splitter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeSlot {
    /// Base address, aligned to `size`
    pub base: u32,
    /// Nominal region size in bytes
    pub size: u32,
    /// Enabled hardware sub-regions counted from the bottom (0 = whole region)
    pub enabled_sub_blocks: u8,
}

impl CodeSlot {
    /// Region used in full
    #[must_use]
    pub const fn whole(base: u32, size: u32) -> Self {
        Self {
            base,
            size,
            enabled_sub_blocks: 0,
        }
    }

    /// Region with only its lowest `sub_regions` eighths enabled
    #[must_use]
    pub const fn subdivided(base: u32, size: u32, sub_regions: u8) -> Self {
        Self {
            base,
            size,
            enabled_sub_blocks: sub_regions,
        }
    }

    /// Bytes actually covered by this slot
    #[must_use]
    pub const fn consumed_size(&self) -> u32 {
        if self.enabled_sub_blocks == 0 {
            self.size
        } else {
            (self.size / MPU_SUBREGIONS) * self.enabled_sub_blocks as u32
        }
    }

    /// One past the last covered byte
    #[must_use]
    pub const fn end(&self) -> u32 {
        self.base + self.consumed_size()
    }
}

/// Decomposition failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitError {
    /// The image cannot be covered within the slot budget
    BudgetExceeded {
        /// Bytes left uncovered
        remaining: u32,
        /// Slots used before giving up
        slots_used: usize,
    },
}

impl fmt::Display for SplitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BudgetExceeded {
                remaining,
                slots_used,
            } => write!(
                f,
                "region budget exceeded: {remaining} bytes uncovered after {slots_used} regions"
            ),
        }
    }
}

impl From<SplitError> for Error {
    fn from(e: SplitError) -> Self {
        match e {
            SplitError::BudgetExceeded { .. } => Self::RegionBudgetExceeded,
        }
    }
}

/// Ordered code slots covering `[0, total)`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SplitPlan {
    slots: Vec<CodeSlot, MAX_MPU_REGIONS>,
}

impl SplitPlan {
    /// Plan with no slots (zero-sized image)
    #[must_use]
    pub const fn empty() -> Self {
        Self { slots: Vec::new() }
    }

    /// Slots in address order
    #[must_use]
    pub fn slots(&self) -> &[CodeSlot] {
        &self.slots
    }

    /// Number of slots
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Check if the plan has no slots
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Total bytes covered
    #[must_use]
    pub fn covered_size(&self) -> u32 {
        self.slots.iter().map(CodeSlot::consumed_size).sum()
    }

    /// Check a plan against the rules the splitter guarantees
    ///
    /// # Errors
    /// - `InvalidRegionSize` if a size is not in the table or a sub-block
    ///   count is out of range
    /// - `InvalidAlignment` if a base is not aligned to its size
    /// - `RegionTableMismatch` if slots leave gaps or overlap, or do not add
    ///   up to `total`
    pub fn verify(&self, total: u32, table: &SizeTable) -> Result<()> {
        let mut expected_base = CODE_BASE;
        for slot in &self.slots {
            if !table.contains(slot.size) || u32::from(slot.enabled_sub_blocks) > MPU_SUBREGIONS {
                return Err(Error::InvalidRegionSize);
            }
            if slot.base % slot.size != 0 {
                return Err(Error::InvalidAlignment);
            }
            if slot.base != expected_base {
                return Err(Error::RegionTableMismatch);
            }
            expected_base = slot.end();
        }
        if expected_base - CODE_BASE != total {
            return Err(Error::RegionTableMismatch);
        }
        Ok(())
    }
}

/// Split `total` bytes starting at address zero into at most `max_slots`
/// regions
///
/// A zero-sized image yields an empty plan. `max_slots` beyond the
/// architectural maximum is clamped.
///
/// # Errors
/// Returns `BudgetExceeded` if the image cannot be covered exactly within
/// the slot budget, or if the next region would have to extend past the end
/// of the image.
pub fn decompose(
    total: u32,
    max_slots: usize,
    table: &SizeTable,
) -> core::result::Result<SplitPlan, SplitError> {
    let limit = max_slots.min(MAX_MPU_REGIONS);
    let mut plan = SplitPlan::empty();
    let mut remaining = total;
    let mut address = CODE_BASE;

    while remaining > 0 && plan.len() < limit {
        let Some(slot) =
            exact_fit(address, remaining, table).or_else(|| best_fit(address, remaining, table))
        else {
            break;
        };
        if plan.slots.push(slot).is_err() {
            break;
        }
        address += slot.consumed_size();
        remaining -= slot.consumed_size();
    }

    if remaining == 0 {
        Ok(plan)
    } else {
        Err(SplitError::BudgetExceeded {
            remaining,
            slots_used: plan.len(),
        })
    }
}

/// First aligned size that finishes the image, whole or subdivided
fn exact_fit(address: u32, remaining: u32, table: &SizeTable) -> Option<CodeSlot> {
    for size in table.aligned_at(address) {
        if size == remaining {
            return Some(CodeSlot::whole(address, size));
        }
        let block = table.sub_block_size(size);
        let blocks = remaining / block;
        if (1..=table.subdivisions()).contains(&blocks) && blocks * block == remaining {
            // Report in hardware sub-regions
            let sub_regions = blocks * table.sub_regions_per_block();
            return Some(CodeSlot::subdivided(address, size, sub_regions as u8));
        }
    }
    None
}

/// Largest aligned size, or the aligned size leaving the least uncovered
/// when the largest overshoots
fn best_fit(address: u32, remaining: u32, table: &SizeTable) -> Option<CodeSlot> {
    let largest = table.aligned_at(address).last()?;
    if largest <= remaining {
        return Some(CodeSlot::whole(address, largest));
    }
    table
        .aligned_at(address)
        .filter(|&size| size <= remaining)
        .max_by_key(|&size| Reverse(remaining - size))
        .map(|size| CodeSlot::whole(address, size))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chub_common::constants::KB;

    fn plan_of(plan: &SplitPlan) -> Vec<(u32, u32, u8), MAX_MPU_REGIONS> {
        plan.slots()
            .iter()
            .map(|s| (s.base / KB, s.size / KB, s.enabled_sub_blocks))
            .collect()
    }

    #[test]
    fn test_zero_size_is_empty_plan() {
        let plan = decompose(0, 6, &SizeTable::REFERENCE).unwrap();
        assert!(plan.is_empty());
        assert_eq!(plan.verify(0, &SizeTable::REFERENCE), Ok(()));
    }

    #[test]
    fn test_exact_table_size_is_one_slot() {
        let plan = decompose(64 * KB, 6, &SizeTable::REFERENCE).unwrap();
        assert_eq!(plan_of(&plan), [(0, 64, 0)]);
    }

    #[test]
    fn test_subdivided_tail() {
        // 96 KB = 128 KB region with 6 of 8 sub-regions
        let plan = decompose(96 * KB, 6, &SizeTable::REFERENCE).unwrap();
        assert_eq!(plan_of(&plan), [(0, 128, 6)]);
        assert_eq!(plan.covered_size(), 96 * KB);
    }

    #[test]
    fn test_zero_budget_fails() {
        let err = decompose(KB, 0, &SizeTable::REFERENCE).unwrap_err();
        assert_eq!(
            err,
            SplitError::BudgetExceeded {
                remaining: KB,
                slots_used: 0
            }
        );
    }

    #[test]
    fn test_below_smallest_size_fails_without_overshoot() {
        // 100 bytes is below the 1 KB table minimum
        let err = decompose(100, 6, &SizeTable::REFERENCE).unwrap_err();
        assert_eq!(
            err,
            SplitError::BudgetExceeded {
                remaining: 100,
                slots_used: 0
            }
        );
    }

    #[test]
    fn test_large_budget_clamped() {
        let plan = decompose(1023 * KB, usize::MAX, &SizeTable::REFERENCE);
        assert!(plan.is_ok());
    }

    #[test]
    fn test_small_remainder_uses_one_subdivided_slot() {
        // 3 KB = 4 KB region with 6 of 8 sub-regions
        let plan = decompose(3 * KB, 6, &SizeTable::REFERENCE).unwrap();
        assert_eq!(plan_of(&plan), [(0, 4, 6)]);
    }

    #[test]
    fn test_verify_rejects_broken_plans() {
        let table = SizeTable::REFERENCE;
        let mut plan = decompose(200 * KB, 6, &table).unwrap();
        assert_eq!(plan.verify(200 * KB, &table), Ok(()));
        assert_eq!(plan.verify(201 * KB, &table), Err(Error::RegionTableMismatch));

        plan.slots[1].base += KB;
        assert_eq!(plan.verify(200 * KB, &table), Err(Error::InvalidAlignment));

        plan.slots[1].base -= KB;
        plan.slots[2].size = 3 * KB;
        assert_eq!(plan.verify(200 * KB, &table), Err(Error::InvalidRegionSize));
    }

    #[test]
    fn test_split_error_converts() {
        let err = SplitError::BudgetExceeded {
            remaining: 1,
            slots_used: 6,
        };
        assert_eq!(Error::from(err), Error::RegionBudgetExceeded);
    }
}
