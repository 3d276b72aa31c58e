// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! ARMv7-M implementation of the HAL traits
//!
//! Drives the system MPU at `0xE000_ED90`, PRIMASK and the code memory of the
//! hub core. Built for any target so the register paths stay type-checked on
//! the host, but instructions are only emitted for `target_arch = "arm"`.

use tock_registers::interfaces::{Readable, Writeable};
use tock_registers::register_structs;
use tock_registers::registers::{ReadOnly, ReadWrite};

use crate::error::HalResult;
use crate::regs::{
    AttributesValue, BaseValue, Control, ControlValue, RegionAttributes, RegionBaseAddress,
    RegionNumber, Type, TypeValue, MPU_BASE,
};
use crate::traits::{CodeMemory, InterruptControl, IrqState, MpuPort};

register_structs! {
    /// PMSAv7 MPU register block
    MpuRegisters {
        (0x00 => mpu_type: ReadOnly<u32, Type::Register>),
        (0x04 => ctrl: ReadWrite<u32, Control::Register>),
        (0x08 => rnr: ReadWrite<u32, RegionNumber::Register>),
        (0x0C => rbar: ReadWrite<u32, RegionBaseAddress::Register>),
        (0x10 => rasr: ReadWrite<u32, RegionAttributes::Register>),
        (0x14 => @END),
    }
}

cfg_if::cfg_if! {
    if #[cfg(target_arch = "arm")] {
        use core::arch::asm;

        #[inline]
        fn primask_save_disable() -> u32 {
            let primask: u32;
            // SAFETY: MRS reads PRIMASK, then CPSID I masks interrupts. Both are
            // valid in privileged thread and handler mode.
            unsafe {
                asm!(
                    "mrs {}, PRIMASK",
                    "cpsid i",
                    out(reg) primask,
                    options(nomem, nostack)
                );
            }
            primask
        }

        #[inline]
        fn primask_restore(primask: u32) {
            // SAFETY: MSR writes back a value saved by primask_save_disable().
            unsafe {
                asm!("msr PRIMASK, {}", in(reg) primask, options(nomem, nostack));
            }
        }

        #[inline]
        fn barrier_dmb() {
            // SAFETY: DMB SY has no side effects beyond ordering memory accesses.
            unsafe { asm!("dmb sy", options(nostack, preserves_flags)) }
        }

        #[inline]
        fn barrier_dsb() {
            // SAFETY: DSB SY waits for outstanding memory transactions.
            unsafe { asm!("dsb sy", options(nostack, preserves_flags)) }
        }

        #[inline]
        fn barrier_isb() {
            // SAFETY: ISB SY flushes the pipeline so new MPU settings apply.
            unsafe { asm!("isb sy", options(nostack, preserves_flags)) }
        }

        // Code starts at address zero on the hub core. Byte accesses go through
        // LDRB/STRB so that address is never dereferenced as a Rust pointer.
        #[inline]
        fn load_byte(address: u32) -> HalResult<u8> {
            let value: u32;
            // SAFETY: the caller bounds-checks `address` against the code window.
            unsafe {
                asm!("ldrb {v}, [{a}]", a = in(reg) address, v = out(reg) value, options(nostack, readonly));
            }
            Ok((value & 0xFF) as u8)
        }

        #[inline]
        fn store_byte(address: u32, value: u8) -> HalResult<()> {
            // SAFETY: the caller bounds-checks `address` against the code window
            // and has opened an unlock window for the store.
            unsafe {
                asm!("strb {v}, [{a}]", a = in(reg) address, v = in(reg) u32::from(value), options(nostack));
            }
            Ok(())
        }
    } else {
        use core::sync::atomic::{compiler_fence, Ordering};
        use crate::error::HalError;

        fn primask_save_disable() -> u32 {
            compiler_fence(Ordering::SeqCst);
            0
        }

        fn primask_restore(_primask: u32) {
            compiler_fence(Ordering::SeqCst);
        }

        fn barrier_dmb() {
            compiler_fence(Ordering::SeqCst);
        }

        fn barrier_dsb() {
            compiler_fence(Ordering::SeqCst);
        }

        fn barrier_isb() {
            compiler_fence(Ordering::SeqCst);
        }

        fn load_byte(_address: u32) -> HalResult<u8> {
            Err(HalError::NotSupported)
        }

        fn store_byte(_address: u32, _value: u8) -> HalResult<()> {
            Err(HalError::NotSupported)
        }
    }
}

/// Hub core peripherals used by code protection
pub struct CortexM {
    mpu: &'static MpuRegisters,
}

impl CortexM {
    /// Take the MPU register block
    ///
    /// # Safety
    /// Must run privileged on an ARMv7-M core, and only one instance may be
    /// used at a time.
    #[must_use]
    pub unsafe fn new() -> Self {
        // SAFETY: MPU_BASE is the architecturally defined address of the MPU
        // register block, which is always mapped on ARMv7-M.
        let mpu = unsafe { &*(MPU_BASE as *const MpuRegisters) };
        Self { mpu }
    }
}

impl MpuPort for CortexM {
    fn mpu_type(&self) -> TypeValue {
        self.mpu.mpu_type.extract()
    }

    fn control(&self) -> ControlValue {
        self.mpu.ctrl.extract()
    }

    fn set_control(&self, value: ControlValue) {
        self.mpu.ctrl.set(value.get());
    }

    fn select_region(&self, region: u8) {
        self.mpu.rnr.write(RegionNumber::REGION.val(u32::from(region)));
    }

    fn region_base(&self) -> BaseValue {
        self.mpu.rbar.extract()
    }

    fn set_region_base(&self, value: BaseValue) {
        self.mpu.rbar.set(value.get());
    }

    fn region_attributes(&self) -> AttributesValue {
        self.mpu.rasr.extract()
    }

    fn set_region_attributes(&self, value: AttributesValue) {
        self.mpu.rasr.set(value.get());
    }

    fn dmb(&self) {
        barrier_dmb();
    }

    fn dsb(&self) {
        barrier_dsb();
    }

    fn isb(&self) {
        barrier_isb();
    }
}

impl InterruptControl for CortexM {
    fn mask(&self) -> IrqState {
        IrqState(primask_save_disable())
    }

    fn restore(&self, state: IrqState) {
        primask_restore(state.0);
    }
}

impl CodeMemory for CortexM {
    fn read_u8(&self, address: u32) -> HalResult<u8> {
        load_byte(address)
    }

    fn write_u8(&self, address: u32, value: u8) -> HalResult<()> {
        store_byte(address, value)
    }
}
