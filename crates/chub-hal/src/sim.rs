// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Host model of the hub core
//!
//! [`SimHardware`] implements the HAL traits on top of in-memory registers and
//! a byte array standing in for code memory. It resolves accesses the way a
//! PMSAv7 MPU does (highest enabled region wins, disabled sub-regions fall
//! through, PRIVDEFENA supplies the privileged default map) and records every
//! register write and barrier so tests can check programming sequences.

use std::cell::{Cell, RefCell};
use std::vec;
use std::vec::Vec;

use tock_registers::interfaces::{Readable, Writeable};
use tock_registers::registers::InMemoryRegister;

use chub_common::constants::{MAX_MPU_REGIONS, MPU_MIN_SUBDIVIDED_SIZE, MPU_SUBREGIONS};

use crate::error::{HalError, HalResult};
use crate::regs::{
    attributes_size, AttributesValue, BaseValue, Control, ControlValue, RegionAttributes,
    RegionBaseAddress, RegionNumber, Type, TypeValue, RBAR_ADDR_MASK,
};
use crate::traits::{CodeMemory, InterruptControl, IrqState, MpuPort};

/// Value of erased code memory
pub const ERASED: u8 = 0xFF;

/// One recorded hardware operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MpuOp {
    /// CTRL written
    SetControl(u32),
    /// RNR written
    SelectRegion(u8),
    /// RBAR written
    SetBase(u32),
    /// RASR written
    SetAttributes(u32),
    /// Data memory barrier
    Dmb,
    /// Data synchronization barrier
    Dsb,
    /// Instruction synchronization barrier
    Isb,
    /// Interrupts masked
    Mask,
    /// Interrupt state restored
    Restore,
    /// Byte stored to code memory
    Store(u32),
}

/// Resolved permissions for one address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Access {
    /// Loads allowed
    pub read: bool,
    /// Stores allowed
    pub write: bool,
    /// Instruction fetch allowed
    pub execute: bool,
}

impl Access {
    /// No access at all
    pub const NONE: Self = Self {
        read: false,
        write: false,
        execute: false,
    };

    /// Unrestricted access
    pub const ALL: Self = Self {
        read: true,
        write: true,
        execute: true,
    };
}

/// Simulated MPU, interrupt mask and code memory
pub struct SimHardware {
    mpu_type: InMemoryRegister<u32, Type::Register>,
    ctrl: InMemoryRegister<u32, Control::Register>,
    rnr: InMemoryRegister<u32, RegionNumber::Register>,
    rbar: [InMemoryRegister<u32, RegionBaseAddress::Register>; MAX_MPU_REGIONS],
    rasr: [InMemoryRegister<u32, RegionAttributes::Register>; MAX_MPU_REGIONS],
    primask: Cell<u32>,
    memory: RefCell<Vec<u8>>,
    ops: RefCell<Vec<MpuOp>>,
    faults: Cell<u32>,
    unmasked_stores: Cell<u32>,
}

impl SimHardware {
    /// Core with `regions` MPU regions and `memory_size` bytes of code memory
    /// at address zero
    #[must_use]
    pub fn new(regions: u8, memory_size: u32) -> Self {
        let mpu_type = InMemoryRegister::new(0);
        mpu_type.write(Type::DREGION.val(u32::from(regions)));
        Self {
            mpu_type,
            ctrl: InMemoryRegister::new(0),
            rnr: InMemoryRegister::new(0),
            rbar: core::array::from_fn(|_| InMemoryRegister::new(0)),
            rasr: core::array::from_fn(|_| InMemoryRegister::new(0)),
            primask: Cell::new(0),
            memory: RefCell::new(vec![ERASED; memory_size as usize]),
            ops: RefCell::new(Vec::new()),
            faults: Cell::new(0),
            unmasked_stores: Cell::new(0),
        }
    }

    /// Core without an MPU (TYPE.DREGION reads zero)
    #[must_use]
    pub fn without_mpu(memory_size: u32) -> Self {
        Self::new(0, memory_size)
    }

    /// Recorded operations, oldest first
    #[must_use]
    pub fn ops(&self) -> Vec<MpuOp> {
        self.ops.borrow().clone()
    }

    /// Forget recorded operations
    pub fn clear_ops(&self) {
        self.ops.borrow_mut().clear();
    }

    /// Stores blocked by the protection map
    #[must_use]
    pub fn faults(&self) -> u32 {
        self.faults.get()
    }

    /// Stores performed while interrupts were unmasked
    #[must_use]
    pub fn unmasked_stores(&self) -> u32 {
        self.unmasked_stores.get()
    }

    /// Check whether interrupts are currently masked
    #[must_use]
    pub fn interrupts_masked(&self) -> bool {
        self.primask.get() & 1 != 0
    }

    /// Overwrite CTRL without recording an operation
    pub fn force_control(&self, value: u32) {
        self.ctrl.set(value);
    }

    /// Raw RBAR and RASR of a region, bypassing RNR
    #[must_use]
    pub fn region_raw(&self, region: u8) -> Option<(BaseValue, AttributesValue)> {
        let index = usize::from(region);
        if region >= self.region_count() {
            return None;
        }
        Some((self.rbar[index].extract(), self.rasr[index].extract()))
    }

    /// Copy of code memory
    #[must_use]
    pub fn memory(&self, address: u32, len: usize) -> Vec<u8> {
        let memory = self.memory.borrow();
        let start = (address as usize).min(memory.len());
        let end = start.saturating_add(len).min(memory.len());
        memory[start..end].to_vec()
    }

    /// Highest-numbered enabled region whose enabled sub-regions cover `address`
    #[must_use]
    pub fn matching_region(&self, address: u32) -> Option<u8> {
        let addr = u64::from(address);
        for region in (0..self.region_count()).rev() {
            let attrs = self.rasr[usize::from(region)].extract();
            if !attrs.is_set(RegionAttributes::ENABLE) {
                continue;
            }
            let size = attributes_size(attrs);
            let base = u64::from(self.rbar[usize::from(region)].get() & RBAR_ADDR_MASK) & !(size - 1);
            if addr < base || addr >= base + size {
                continue;
            }
            if size >= u64::from(MPU_MIN_SUBDIVIDED_SIZE) {
                let sub = (addr - base) / (size / u64::from(MPU_SUBREGIONS));
                if attrs.read(RegionAttributes::SRD) & (1 << sub) != 0 {
                    continue;
                }
            }
            return Some(region);
        }
        None
    }

    /// Permissions the MPU grants for `address`
    #[must_use]
    pub fn access(&self, address: u32, privileged: bool) -> Access {
        let ctrl = self.ctrl.extract();
        if !ctrl.is_set(Control::ENABLE) {
            return Access::ALL;
        }

        let Some(region) = self.matching_region(address) else {
            return if privileged && ctrl.is_set(Control::PRIVDEFENA) {
                Access::ALL
            } else {
                Access::NONE
            };
        };

        let attrs = self.rasr[usize::from(region)].extract();
        let (read, write) = decode_ap(attrs.read(RegionAttributes::AP), privileged);
        Access {
            read,
            write,
            execute: read && !attrs.is_set(RegionAttributes::XN),
        }
    }

    fn record(&self, op: MpuOp) {
        self.ops.borrow_mut().push(op);
    }

    fn selected(&self) -> Option<usize> {
        let region = self.rnr.read(RegionNumber::REGION);
        (region < u32::from(self.region_count())).then_some(region as usize)
    }

    fn check_address(&self, address: u32) -> HalResult<usize> {
        let index = address as usize;
        if index >= self.memory.borrow().len() {
            return Err(HalError::InvalidAddress);
        }
        Ok(index)
    }
}

/// (read, write) for an AP encoding
fn decode_ap(ap: u32, privileged: bool) -> (bool, bool) {
    match (ap, privileged) {
        (0b001 | 0b010 | 0b011, true) => (true, true),
        (0b010, false) => (true, false),
        (0b011, false) => (true, true),
        (0b101, true) | (0b110 | 0b111, _) => (true, false),
        _ => (false, false),
    }
}

impl MpuPort for SimHardware {
    fn mpu_type(&self) -> TypeValue {
        self.mpu_type.extract()
    }

    fn control(&self) -> ControlValue {
        self.ctrl.extract()
    }

    fn set_control(&self, value: ControlValue) {
        self.record(MpuOp::SetControl(value.get()));
        self.ctrl.set(value.get());
    }

    fn select_region(&self, region: u8) {
        self.record(MpuOp::SelectRegion(region));
        self.rnr.write(RegionNumber::REGION.val(u32::from(region)));
    }

    fn region_base(&self) -> BaseValue {
        self.selected()
            .map_or(BaseValue::new(0), |index| self.rbar[index].extract())
    }

    fn set_region_base(&self, value: BaseValue) {
        self.record(MpuOp::SetBase(value.get()));
        // Unimplemented regions ignore writes
        if let Some(index) = self.selected() {
            self.rbar[index].set(value.get() & RBAR_ADDR_MASK);
        }
    }

    fn region_attributes(&self) -> AttributesValue {
        self.selected()
            .map_or(AttributesValue::new(0), |index| self.rasr[index].extract())
    }

    fn set_region_attributes(&self, value: AttributesValue) {
        self.record(MpuOp::SetAttributes(value.get()));
        if let Some(index) = self.selected() {
            self.rasr[index].set(value.get());
        }
    }

    fn dmb(&self) {
        self.record(MpuOp::Dmb);
    }

    fn dsb(&self) {
        self.record(MpuOp::Dsb);
    }

    fn isb(&self) {
        self.record(MpuOp::Isb);
    }
}

impl InterruptControl for SimHardware {
    fn mask(&self) -> IrqState {
        self.record(MpuOp::Mask);
        let previous = self.primask.replace(1);
        IrqState(previous)
    }

    fn restore(&self, state: IrqState) {
        self.record(MpuOp::Restore);
        self.primask.set(state.0);
    }
}

impl CodeMemory for SimHardware {
    fn read_u8(&self, address: u32) -> HalResult<u8> {
        let index = self.check_address(address)?;
        if !self.access(address, true).read {
            return Err(HalError::AccessViolation);
        }
        Ok(self.memory.borrow()[index])
    }

    fn write_u8(&self, address: u32, value: u8) -> HalResult<()> {
        let index = self.check_address(address)?;
        if !self.access(address, true).write {
            self.faults.set(self.faults.get() + 1);
            return Err(HalError::AccessViolation);
        }
        if !self.interrupts_masked() {
            self.unmasked_stores.set(self.unmasked_stores.get() + 1);
        }
        self.record(MpuOp::Store(address));
        self.memory.borrow_mut()[index] = value;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regs::{base_for, control_running};

    fn region(attrs: tock_registers::fields::FieldValue<u32, RegionAttributes::Register>) -> AttributesValue {
        let mut value = AttributesValue::new(0);
        value.write(attrs + RegionAttributes::ENABLE::SET);
        value
    }

    fn program(sim: &SimHardware, id: u8, base: u32, attrs: AttributesValue) {
        sim.select_region(id);
        sim.set_region_base(base_for(base));
        sim.set_region_attributes(attrs);
    }

    #[test]
    fn test_disabled_mpu_allows_everything() {
        let sim = SimHardware::new(8, 1024);
        assert_eq!(sim.access(0, false), Access::ALL);
        assert_eq!(sim.region_count(), 8);
    }

    #[test]
    fn test_higher_region_wins() {
        let sim = SimHardware::new(8, 4096);
        program(&sim, 0, 0, region(RegionAttributes::AP::FullAccess + RegionAttributes::SIZE.val(11)));
        program(&sim, 1, 0x400, region(RegionAttributes::AP::ReadOnly + RegionAttributes::SIZE.val(9)));
        sim.set_control(control_running());

        assert_eq!(sim.matching_region(0x000), Some(0));
        assert_eq!(sim.matching_region(0x400), Some(1));
        assert!(!sim.access(0x400, true).write);
        assert!(sim.access(0x400, true).execute);
        assert!(sim.access(0x000, true).write);
    }

    #[test]
    fn test_disabled_subregion_falls_through() {
        let sim = SimHardware::new(8, 0);
        // 2 KB region with the upper half disabled
        program(
            &sim,
            2,
            0,
            region(RegionAttributes::AP::ReadOnly + RegionAttributes::SIZE.val(10) + RegionAttributes::SRD.val(0xF0)),
        );
        assert_eq!(sim.matching_region(0x3FF), Some(2));
        assert_eq!(sim.matching_region(0x400), None);
    }

    #[test]
    fn test_unmapped_address_uses_default_map() {
        let sim = SimHardware::new(8, 0);
        sim.set_control(control_running());
        assert_eq!(sim.access(0x2000_0000, true), Access::ALL);
        assert_eq!(sim.access(0x2000_0000, false), Access::NONE);
    }

    #[test]
    fn test_store_blocked_by_read_only_region() {
        let sim = SimHardware::new(8, 1024);
        program(&sim, 0, 0, region(RegionAttributes::AP::ReadOnly + RegionAttributes::SIZE.val(9)));
        sim.set_control(control_running());

        assert_eq!(sim.write_u8(4, 0xAA), Err(HalError::AccessViolation));
        assert_eq!(sim.faults(), 1);
        assert_eq!(sim.read_u8(4), Ok(ERASED));
        assert_eq!(sim.write_u8(4096, 0), Err(HalError::InvalidAddress));
    }

    #[test]
    fn test_mask_restore_nests() {
        let sim = SimHardware::new(8, 0);
        let outer = sim.mask();
        let inner = sim.mask();
        sim.restore(inner);
        assert!(sim.interrupts_masked());
        sim.restore(outer);
        assert!(!sim.interrupts_masked());
    }
}
