// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! ARMv7-M MPU register layout
//!
//! Field definitions for the PMSAv7 register file at `0xE000_ED90`. Register
//! values are passed between the HAL and its callers as [`LocalRegisterCopy`]
//! so that every field access goes through the typed definitions below.
//!
//! | Offset | Register | Purpose                                   |
//! |--------|----------|-------------------------------------------|
//! | 0x00   | TYPE     | Number of implemented regions (DREGION)   |
//! | 0x04   | CTRL     | Global enable and default-map control     |
//! | 0x08   | RNR      | Selects the region for RBAR/RASR          |
//! | 0x0C   | RBAR     | Base address of the selected region       |
//! | 0x10   | RASR     | Attributes and size of the selected region|

use tock_registers::register_bitfields;
use tock_registers::LocalRegisterCopy;

/// Base address of the MPU register file
pub const MPU_BASE: usize = 0xE000_ED90;

/// Mask of the address bits held by RBAR
pub const RBAR_ADDR_MASK: u32 = 0xFFFF_FFE0;

register_bitfields![u32,
    /// MPU Type Register
    pub Type [
        /// Instruction regions (always zero on unified MPUs)
        IREGION OFFSET(16) NUMBITS(8) [],
        /// Data regions implemented; zero when no MPU is present
        DREGION OFFSET(8) NUMBITS(8) [],
        /// Separate instruction and data maps
        SEPARATE OFFSET(0) NUMBITS(1) []
    ],

    /// MPU Control Register
    pub Control [
        /// Default memory map as background for privileged accesses
        PRIVDEFENA OFFSET(2) NUMBITS(1) [],
        /// Keep the MPU enabled in HardFault, NMI and FAULTMASK handlers
        HFNMIENA OFFSET(1) NUMBITS(1) [],
        /// Global MPU enable
        ENABLE OFFSET(0) NUMBITS(1) []
    ],

    /// MPU Region Number Register
    pub RegionNumber [
        /// Region addressed by RBAR and RASR
        REGION OFFSET(0) NUMBITS(8) []
    ],

    /// MPU Region Base Address Register
    pub RegionBaseAddress [
        /// Base address bits 31:5
        ADDR OFFSET(5) NUMBITS(27) [],
        /// Take the region number from the REGION field instead of RNR
        VALID OFFSET(4) NUMBITS(1) [],
        /// Region number used when VALID is set
        REGION OFFSET(0) NUMBITS(4) []
    ],

    /// MPU Region Attribute and Size Register
    pub RegionAttributes [
        /// Instruction fetch disabled
        XN OFFSET(28) NUMBITS(1) [],
        /// Access permissions
        AP OFFSET(24) NUMBITS(3) [
            //                         Privileged  Unprivileged
            NoAccess = 0b000,       // --          --
            PrivilegedRw = 0b001,   // RW          --
            UnprivilegedRo = 0b010, // RW          R-
            FullAccess = 0b011,     // RW          RW
            Reserved = 0b100,       // --          --
            PrivilegedRo = 0b101,   // R-          --
            ReadOnly = 0b110,       // R-          R-
            ReadOnlyAlias = 0b111   // R-          R-
        ],
        /// Type extension
        TEX OFFSET(19) NUMBITS(3) [],
        /// Shareable
        S OFFSET(18) NUMBITS(1) [],
        /// Cacheable
        C OFFSET(17) NUMBITS(1) [],
        /// Bufferable
        B OFFSET(16) NUMBITS(1) [],
        /// Sub-region disable, one bit per eighth of the region
        SRD OFFSET(8) NUMBITS(8) [],
        /// Region size is 2^(SIZE + 1) bytes
        SIZE OFFSET(1) NUMBITS(5) [],
        /// Region enable
        ENABLE OFFSET(0) NUMBITS(1) []
    ]
];

/// Copy of the TYPE register
pub type TypeValue = LocalRegisterCopy<u32, Type::Register>;

/// Copy of the CTRL register
pub type ControlValue = LocalRegisterCopy<u32, Control::Register>;

/// Copy of an RBAR value
pub type BaseValue = LocalRegisterCopy<u32, RegionBaseAddress::Register>;

/// Copy of an RASR value
pub type AttributesValue = LocalRegisterCopy<u32, RegionAttributes::Register>;

/// Control value used while code protection is running
#[must_use]
pub fn control_running() -> ControlValue {
    let mut ctrl = ControlValue::new(0);
    ctrl.write(Control::ENABLE::SET + Control::HFNMIENA::SET + Control::PRIVDEFENA::SET);
    ctrl
}

/// Control value with the MPU switched off
#[must_use]
pub fn control_disabled() -> ControlValue {
    ControlValue::new(0)
}

/// Build an RBAR value that leaves region selection to RNR
#[must_use]
pub fn base_for(address: u32) -> BaseValue {
    BaseValue::new(address & RBAR_ADDR_MASK)
}

/// Byte size encoded in an RASR value
#[must_use]
pub fn attributes_size(attrs: AttributesValue) -> u64 {
    1u64 << (attrs.read(RegionAttributes::SIZE) + 1)
}
