// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! System-wide constants for the sensor-hub firmware
//!
//! Hardware limits of the ARMv7-M protection unit on the hub core and the
//! reference memory map the firmware is linked against.

// =============================================================================
// Protection Unit Limits
// =============================================================================

/// Regions implemented by the hub's protection unit
pub const TOTAL_MPU_REGIONS: u8 = 8;

/// Architectural maximum of regions on PMSAv7
pub const MAX_MPU_REGIONS: usize = 16;

/// Slots reserved outside the code area (background and guard)
pub const RESERVED_MPU_REGIONS: u8 = 2;

/// Regions left for the code area in the reference configuration
pub const CODE_MPU_REGIONS: u8 = TOTAL_MPU_REGIONS - RESERVED_MPU_REGIONS;

/// Sub-regions per region (each independently enabled)
pub const MPU_SUBREGIONS: u32 = 8;

/// Smallest region the hardware accepts
pub const MPU_MIN_REGION_SIZE: u32 = 32;

/// Smallest region that honours the sub-region disable field
pub const MPU_MIN_SUBDIVIDED_SIZE: u32 = 256;

// =============================================================================
// Region Size Table
// =============================================================================

/// One kilobyte
pub const KB: u32 = 1024;

/// Region sizes the code splitter may use, ascending
pub const CODE_REGION_SIZES: [u32; 9] = [
    KB,
    2 * KB,
    4 * KB,
    8 * KB,
    16 * KB,
    32 * KB,
    64 * KB,
    128 * KB,
    256 * KB,
];

// =============================================================================
// Memory Map
// =============================================================================

/// Start of the code image (the splitter assumes zero)
pub const CODE_BASE: u32 = 0x0000_0000;

/// Start of the hub's internal SRAM background window
pub const SRAM_BASE: u32 = 0x0000_0000;

/// Size of the internal SRAM background window
pub const SRAM_SIZE: u32 = 1024 * KB;

/// Size of the no-access guard placed after the code image
pub const GUARD_REGION_SIZE: u32 = 32;

/// Code image size of the reference firmware build
pub const REFERENCE_CODE_SIZE: u32 = 144 * KB;
