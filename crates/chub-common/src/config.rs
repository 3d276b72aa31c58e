// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Protection configuration for the sensor-hub firmware
//!
//! Boundaries that come from the linker (end of code, guard placement) are
//! injected here as plain values at startup. All configuration is fixed for
//! the lifetime of a boot; nothing here is changed at runtime.

use crate::constants::{
    CODE_MPU_REGIONS, GUARD_REGION_SIZE, MAX_MPU_REGIONS, MPU_MIN_REGION_SIZE, MPU_SUBREGIONS,
    REFERENCE_CODE_SIZE, RESERVED_MPU_REGIONS, SRAM_BASE, SRAM_SIZE, TOTAL_MPU_REGIONS,
};
use crate::errors::{Error, Result};

/// An address window covered by a single region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionWindow {
    /// Base address (must be aligned to `size`)
    pub base: u32,
    /// Size in bytes (power of two)
    pub size: u32,
}

impl RegionWindow {
    /// Check size and alignment rules
    #[must_use]
    pub const fn is_well_formed(&self) -> bool {
        self.size.is_power_of_two()
            && self.size >= MPU_MIN_REGION_SIZE
            && self.base % self.size == 0
    }
}

/// Code protection configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtectionConfig {
    /// Size of the linked code image in bytes (end of code, code starts at 0)
    pub code_size: u32,
    /// Regions available for the code area
    pub max_code_slots: u8,
    /// Regions implemented by the target's protection unit
    pub hardware_regions: u8,
    /// Sub-blocks per region the splitter may use (1 disables subdivision)
    pub subdivisions: u32,
    /// Read-write, no-execute window under the code regions
    pub background: RegionWindow,
    /// Size of the no-access guard after the code image
    pub guard_size: u32,
}

impl ProtectionConfig {
    /// Reference configuration (six code slots on an eight-region unit)
    pub const DEFAULT: Self = Self {
        code_size: REFERENCE_CODE_SIZE,
        max_code_slots: CODE_MPU_REGIONS,
        hardware_regions: TOTAL_MPU_REGIONS,
        subdivisions: MPU_SUBREGIONS,
        background: RegionWindow {
            base: SRAM_BASE,
            size: SRAM_SIZE,
        },
        guard_size: GUARD_REGION_SIZE,
    };

    /// Reference configuration for a given linked code size
    #[must_use]
    pub const fn for_code_size(code_size: u32) -> Self {
        Self {
            code_size,
            ..Self::DEFAULT
        }
    }

    /// Override the code slot budget
    #[must_use]
    pub const fn with_code_slots(mut self, slots: u8) -> Self {
        self.max_code_slots = slots;
        self
    }

    /// Override the subdivision count
    #[must_use]
    pub const fn with_subdivisions(mut self, subdivisions: u32) -> Self {
        self.subdivisions = subdivisions;
        self
    }

    /// Total regions the built table occupies for a given code slot count
    #[must_use]
    pub const fn regions_needed(code_slots: usize) -> usize {
        code_slots + RESERVED_MPU_REGIONS as usize
    }

    /// Validate the configuration against hardware limits
    ///
    /// # Errors
    /// - `InvalidParameter` if the hardware region count is out of range
    /// - `TooManyRegions` if code slots plus reserved slots exceed the hardware
    /// - `InvalidSizeTable` if the subdivision count is unsupported
    /// - `InvalidAlignment` if the background window is malformed
    /// - `InvalidRegionSize` if the guard is not a supported region size
    pub fn validate(&self) -> Result<()> {
        if self.hardware_regions == 0 || self.hardware_regions as usize > MAX_MPU_REGIONS {
            return Err(Error::InvalidParameter);
        }
        if Self::regions_needed(self.max_code_slots as usize) > self.hardware_regions as usize {
            return Err(Error::TooManyRegions);
        }
        if !matches!(self.subdivisions, 1 | 2 | 4 | 8) {
            return Err(Error::InvalidSizeTable);
        }
        if !self.background.is_well_formed() {
            return Err(Error::InvalidAlignment);
        }
        if !self.guard_size.is_power_of_two() || self.guard_size < MPU_MIN_REGION_SIZE {
            return Err(Error::InvalidRegionSize);
        }
        Ok(())
    }
}

impl Default for ProtectionConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}
