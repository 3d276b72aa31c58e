// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Protection region table
//!
//! Turns a [`SplitPlan`] into the complete set of regions programmed at boot:
//!
//! | Id        | Purpose            | Access          | Execute |
//! |-----------|--------------------|-----------------|---------|
//! | 0         | SRAM background    | Full RW         | No      |
//! | 1..=n     | Code               | RO (priv/unpriv)| Yes     |
//! | n + 1     | Guard after code   | None            | No      |
//!
//! Higher ids take priority where regions overlap, so code regions override
//! the background and the guard overrides everything.

use heapless::Vec;
use tock_registers::fields::FieldValue;

use chub_common::constants::{MAX_MPU_REGIONS, MPU_SUBREGIONS};
use chub_common::{Error, ProtectionConfig, RegionWindow, Result};
use chub_hal::regs::{base_for, AttributesValue, BaseValue, RegionAttributes};

use crate::dump::Listing;
use crate::size_table::RegionSize;
use crate::split::{CodeSlot, SplitPlan};

/// Access permissions for MPU regions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AccessPermission {
    /// No access
    NoAccess = 0b000,
    /// Privileged RW only
    PrivRw = 0b001,
    /// Privileged RW, Unprivileged RO
    PrivRwUnprivRo = 0b010,
    /// Full access (Priv RW, Unpriv RW)
    FullAccess = 0b011,
    /// Privileged RO only
    PrivRo = 0b101,
    /// Read-only (Priv RO, Unpriv RO)
    ReadOnly = 0b110,
}

impl AccessPermission {
    fn field(self) -> FieldValue<u32, RegionAttributes::Register> {
        RegionAttributes::AP.val(self as u32)
    }
}

/// Memory attributes for MPU regions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryAttributes {
    /// TEX field (type extension)
    pub tex: u8,
    /// Cacheable
    pub cacheable: bool,
    /// Bufferable
    pub bufferable: bool,
    /// Shareable
    pub shareable: bool,
}

impl MemoryAttributes {
    /// Strongly-ordered (no caching, no buffering, synchronous)
    pub const STRONGLY_ORDERED: Self = Self {
        tex: 0,
        cacheable: false,
        bufferable: false,
        shareable: true,
    };

    /// Normal memory, write-through, no write allocate, shareable
    pub const NORMAL_WT_SHARED: Self = Self {
        tex: 0,
        cacheable: true,
        bufferable: false,
        shareable: true,
    };

    fn field(self) -> FieldValue<u32, RegionAttributes::Register> {
        RegionAttributes::TEX.val(u32::from(self.tex))
            + RegionAttributes::C.val(u32::from(self.cacheable))
            + RegionAttributes::B.val(u32::from(self.bufferable))
            + RegionAttributes::S.val(u32::from(self.shareable))
    }
}

/// SRD mask leaving the lowest `enabled` sub-regions active
///
/// Zero means the whole region is used.
#[must_use]
pub const fn srd_mask(enabled: u8) -> u8 {
    if enabled == 0 || enabled as u32 >= MPU_SUBREGIONS {
        0
    } else {
        // Disable sub-regions enabled..8
        ((0xFF_u16 << enabled) & 0xFF) as u8
    }
}

/// One MPU region as it will be programmed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtectionSlot {
    /// Region number, which is also its priority
    pub id: u8,
    /// Base address, aligned to `size`
    pub base: u32,
    /// Nominal region size
    pub size: RegionSize,
    /// Enabled sub-regions counted from the bottom (0 = whole region)
    pub enabled_sub_blocks: u8,
    /// Access permissions
    pub access: AccessPermission,
    /// Instruction fetch allowed
    pub executable: bool,
    /// Memory attributes
    pub attributes: MemoryAttributes,
    /// Region enable
    pub enabled: bool,
}

impl ProtectionSlot {
    /// Bytes actually covered
    #[must_use]
    pub const fn consumed_size(&self) -> u32 {
        if self.enabled_sub_blocks == 0 {
            self.size.bytes()
        } else {
            (self.size.bytes() / MPU_SUBREGIONS) * self.enabled_sub_blocks as u32
        }
    }

    /// Sub-region disable mask
    #[must_use]
    pub const fn srd(&self) -> u8 {
        srd_mask(self.enabled_sub_blocks)
    }

    /// RBAR value
    #[must_use]
    pub fn base_value(&self) -> BaseValue {
        base_for(self.base)
    }

    /// RASR value
    #[must_use]
    pub fn attributes_value(&self) -> AttributesValue {
        let mut value = AttributesValue::new(0);
        value.write(
            self.access.field()
                + self.attributes.field()
                + RegionAttributes::XN.val(u32::from(!self.executable))
                + RegionAttributes::SRD.val(u32::from(self.srd()))
                + RegionAttributes::SIZE.val(u32::from(self.size.code()))
                + RegionAttributes::ENABLE.val(u32::from(self.enabled)),
        );
        value
    }

    fn code(id: u8, slot: &CodeSlot) -> Result<Self> {
        let size = RegionSize::from_bytes(slot.size).ok_or(Error::InvalidRegionSize)?;
        if slot.base % slot.size != 0 {
            return Err(Error::InvalidAlignment);
        }
        Ok(Self {
            id,
            base: slot.base,
            size,
            enabled_sub_blocks: slot.enabled_sub_blocks,
            access: AccessPermission::ReadOnly,
            executable: true,
            attributes: MemoryAttributes::NORMAL_WT_SHARED,
            enabled: true,
        })
    }

    fn background(window: RegionWindow, executable: bool) -> Result<Self> {
        if !window.is_well_formed() {
            return Err(Error::InvalidAlignment);
        }
        let size = RegionSize::from_bytes(window.size).ok_or(Error::InvalidRegionSize)?;
        Ok(Self {
            id: 0,
            base: window.base,
            size,
            enabled_sub_blocks: 0,
            access: AccessPermission::FullAccess,
            executable,
            attributes: MemoryAttributes::NORMAL_WT_SHARED,
            enabled: true,
        })
    }

    fn guard(id: u8, code_end: u32, guard_size: u32) -> Result<Self> {
        let size = RegionSize::from_bytes(guard_size).ok_or(Error::InvalidRegionSize)?;
        // First guard-aligned address at or after the end of code
        let base = code_end
            .checked_add(guard_size - 1)
            .ok_or(Error::InvalidParameter)?
            & !(guard_size - 1);
        Ok(Self {
            id,
            base,
            size,
            enabled_sub_blocks: 0,
            access: AccessPermission::NoAccess,
            executable: false,
            attributes: MemoryAttributes::STRONGLY_ORDERED,
            enabled: true,
        })
    }
}

/// Complete region set: background, code regions, guard
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionTable {
    background: ProtectionSlot,
    code: Vec<ProtectionSlot, MAX_MPU_REGIONS>,
    guard: ProtectionSlot,
    code_end: u32,
}

impl RegionTable {
    /// Build the table for a successful split
    ///
    /// # Errors
    /// - `TooManyRegions` if the plan plus background and guard exceeds
    ///   the architectural maximum
    /// - `InvalidAlignment`/`InvalidRegionSize` if a window from the plan or
    ///   the configuration cannot be encoded
    /// - `InvalidParameter` if the guard would start past the address space
    pub fn build(plan: &SplitPlan, code_end: u32, config: &ProtectionConfig) -> Result<Self> {
        Self::assemble(plan, code_end, config, false)
    }

    /// Build the degraded table used when the split failed
    ///
    /// Only the background and guard are present, and the background is
    /// executable so the unprotected image can still run.
    ///
    /// # Errors
    /// See [`RegionTable::build`].
    pub fn unprotected(code_end: u32, config: &ProtectionConfig) -> Result<Self> {
        Self::assemble(&SplitPlan::empty(), code_end, config, true)
    }

    fn assemble(
        plan: &SplitPlan,
        code_end: u32,
        config: &ProtectionConfig,
        executable_background: bool,
    ) -> Result<Self> {
        if ProtectionConfig::regions_needed(plan.len()) > MAX_MPU_REGIONS {
            return Err(Error::TooManyRegions);
        }

        let mut code = Vec::new();
        for (index, slot) in plan.slots().iter().enumerate() {
            // Bounded by MAX_MPU_REGIONS above
            let id = (index + 1) as u8;
            code.push(ProtectionSlot::code(id, slot)?)
                .map_err(|_| Error::TooManyRegions)?;
        }
        let guard_id = (plan.len() + 1) as u8;

        Ok(Self {
            background: ProtectionSlot::background(config.background, executable_background)?,
            code,
            guard: ProtectionSlot::guard(guard_id, code_end, config.guard_size)?,
            code_end,
        })
    }

    /// SRAM background region
    #[must_use]
    pub const fn background(&self) -> &ProtectionSlot {
        &self.background
    }

    /// Code regions in address order
    #[must_use]
    pub fn code_slots(&self) -> &[ProtectionSlot] {
        &self.code
    }

    /// No-access guard after the code image
    #[must_use]
    pub const fn guard(&self) -> &ProtectionSlot {
        &self.guard
    }

    /// End of the code image the table was built for
    #[must_use]
    pub const fn code_end(&self) -> u32 {
        self.code_end
    }

    /// Bytes covered by the code regions
    #[must_use]
    pub fn code_size(&self) -> u32 {
        self.code.iter().map(ProtectionSlot::consumed_size).sum()
    }

    /// Check whether this is the degraded background-and-guard table
    #[must_use]
    pub const fn is_unprotected(&self) -> bool {
        self.background.executable
    }

    /// Number of regions to program
    #[must_use]
    pub fn len(&self) -> usize {
        self.code.len() + 2
    }

    /// Always false; background and guard are always present
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Regions in programming order (ascending id)
    pub fn iter(&self) -> impl Iterator<Item = &ProtectionSlot> + '_ {
        core::iter::once(&self.background)
            .chain(self.code.iter())
            .chain(core::iter::once(&self.guard))
    }

    /// Human-readable listing of every region
    #[must_use]
    pub fn listing(&self) -> Listing<'_> {
        Listing::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::size_table::SizeTable;
    use crate::split::decompose;
    use chub_common::constants::KB;

    fn table_for(total: u32) -> RegionTable {
        let plan = decompose(total, 6, &SizeTable::REFERENCE).unwrap();
        RegionTable::build(&plan, total, &ProtectionConfig::for_code_size(total)).unwrap()
    }

    #[test]
    fn test_srd_masks() {
        let expected = [0x00, 0xFE, 0xFC, 0xF8, 0xF0, 0xE0, 0xC0, 0x80, 0x00];
        for (enabled, mask) in expected.iter().enumerate() {
            assert_eq!(srd_mask(enabled as u8), *mask, "enabled={enabled}");
        }
    }

    #[test]
    fn test_ids_follow_priority_order() {
        let table = table_for(200 * KB);
        let ids: Vec<u8, 16> = table.iter().map(|s| s.id).collect();
        assert_eq!(ids, [0, 1, 2, 3, 4]);
        assert_eq!(table.guard().id, 4);
        assert_eq!(table.len(), 5);
    }

    #[test]
    fn test_code_slot_attributes() {
        let table = table_for(200 * KB);
        let slot = table.code_slots()[0];
        assert_eq!(slot.access, AccessPermission::ReadOnly);
        assert!(slot.executable);
        // AP=110, TEX=0 S=1 C=1 B=0, SIZE=16 (128 KB), enabled
        assert_eq!(slot.attributes_value().get(), 0x0606_0021);
    }

    #[test]
    fn test_background_and_guard_attributes() {
        let table = table_for(200 * KB);
        // AP=011, XN, S C, SIZE=19 (1 MB)
        assert_eq!(table.background().attributes_value().get(), 0x1306_0027);
        assert_eq!(table.guard().base, 200 * KB);
        // AP=000, XN, S, SIZE=4 (32 B)
        assert_eq!(table.guard().attributes_value().get(), 0x1004_0009);
    }

    #[test]
    fn test_guard_starts_after_unaligned_code_end() {
        let config = ProtectionConfig::DEFAULT;
        let table = RegionTable::unprotected(0x1_0010, &config).unwrap();
        assert_eq!(table.guard().base, 0x1_0020);

        let table = RegionTable::unprotected(100, &config).unwrap();
        assert_eq!(table.guard().base, 128);
        assert!(table.guard().base >= table.code_end());
    }

    #[test]
    fn test_guard_at_aligned_code_end() {
        let table = RegionTable::unprotected(0x1_0000, &ProtectionConfig::DEFAULT).unwrap();
        assert_eq!(table.guard().base, 0x1_0000);
    }

    #[test]
    fn test_guard_past_address_space_rejected() {
        let result = RegionTable::unprotected(u32::MAX - 4, &ProtectionConfig::DEFAULT);
        assert_eq!(result.err(), Some(Error::InvalidParameter));
    }

    #[test]
    fn test_unprotected_background_is_executable() {
        let table = RegionTable::unprotected(100, &ProtectionConfig::DEFAULT).unwrap();
        assert!(table.is_unprotected());
        assert!(table.code_slots().is_empty());
        assert_eq!(table.guard().id, 1);
        assert_eq!(table.background().attributes_value().read(RegionAttributes::XN), 0);
    }

    #[test]
    fn test_subdivided_slot_sets_srd() {
        let table = table_for(96 * KB);
        let slot = table.code_slots()[0];
        assert_eq!(slot.srd(), 0xC0);
        assert_eq!(slot.consumed_size(), 96 * KB);
        assert_eq!(slot.attributes_value().read(RegionAttributes::SRD), 0xC0);
    }
}
