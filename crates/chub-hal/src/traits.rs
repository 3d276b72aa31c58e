// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! HAL trait definitions
//!
//! This module defines the platform-agnostic interfaces the protection
//! subsystem drives. Register-level methods take `&self`: each call is a
//! single memory-mapped access, and the hardware (not a Rust borrow) is the
//! owner of the state behind it.

use crate::error::HalResult;
use crate::regs::{AttributesValue, BaseValue, Control, ControlValue, Type, TypeValue};

/// ARMv7-M MPU register file
pub trait MpuPort {
    /// Read the TYPE register
    fn mpu_type(&self) -> TypeValue;

    /// Read the CTRL register
    fn control(&self) -> ControlValue;

    /// Write the CTRL register
    fn set_control(&self, value: ControlValue);

    /// Write RNR, selecting the region addressed by RBAR and RASR
    fn select_region(&self, region: u8);

    /// Read RBAR of the selected region
    fn region_base(&self) -> BaseValue;

    /// Write RBAR of the selected region
    fn set_region_base(&self, value: BaseValue);

    /// Read RASR of the selected region
    fn region_attributes(&self) -> AttributesValue;

    /// Write RASR of the selected region
    fn set_region_attributes(&self, value: AttributesValue);

    /// Data memory barrier
    fn dmb(&self);

    /// Data synchronization barrier
    fn dsb(&self);

    /// Instruction synchronization barrier
    fn isb(&self);

    /// Number of implemented regions (zero if no MPU)
    fn region_count(&self) -> u8 {
        // DREGION is eight bits wide
        self.mpu_type().read(Type::DREGION) as u8
    }

    /// Check whether the MPU is globally enabled
    fn is_enabled(&self) -> bool {
        self.control().is_set(Control::ENABLE)
    }
}

/// Interrupt state saved by [`InterruptControl::mask`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IrqState(pub u32);

impl IrqState {
    /// Check whether interrupts were already masked when the state was saved
    #[must_use]
    pub const fn was_masked(&self) -> bool {
        self.0 & 1 != 0
    }
}

/// Global interrupt mask (PRIMASK on Cortex-M)
pub trait InterruptControl {
    /// Mask interrupts and return the previous state
    fn mask(&self) -> IrqState;

    /// Restore a state returned by [`InterruptControl::mask`]
    fn restore(&self, state: IrqState);
}

/// Byte-addressable code memory
pub trait CodeMemory {
    /// Read one byte
    ///
    /// # Errors
    /// Returns `InvalidAddress` if the address is not mapped.
    fn read_u8(&self, address: u32) -> HalResult<u8>;

    /// Store one byte
    ///
    /// # Errors
    /// Returns `AccessViolation` if the active protection map blocks the
    /// store, `InvalidAddress` if the address is not mapped.
    fn write_u8(&self, address: u32, value: u8) -> HalResult<()>;

    /// Store a slice byte by byte, stopping at the first failure
    ///
    /// # Errors
    /// Propagates the first error from [`CodeMemory::write_u8`].
    fn write_slice(&self, address: u32, data: &[u8]) -> HalResult<()> {
        let mut addr = address;
        for byte in data {
            self.write_u8(addr, *byte)?;
            addr = addr.wrapping_add(1);
        }
        Ok(())
    }
}

/// Everything the code protection subsystem needs from the platform
pub trait ProtectionHardware: MpuPort + InterruptControl + CodeMemory {}

impl<T: MpuPort + InterruptControl + CodeMemory + ?Sized> ProtectionHardware for T {}
