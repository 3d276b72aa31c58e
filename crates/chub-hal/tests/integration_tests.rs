// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Integration tests for chub-hal
//!
//! Tests for platform detection, error handling and conversion, the trait
//! defaults, and the host model of the MPU. The real Cortex-M driver cannot
//! run on the host; the `sim` tests exercise the same trait surface.

mod platform_tests {
    use chub_hal::Platform;

    #[test]
    fn test_platform_detection_returns_valid_variant() {
        let platform = Platform::current();
        assert!(matches!(
            platform,
            Platform::CortexM | Platform::Sim | Platform::Unknown
        ));
    }

    #[test]
    fn test_platform_names() {
        assert_eq!(Platform::CortexM.name(), "cortex-m");
        assert_eq!(format!("{}", Platform::Sim), "sim");
    }
}

mod error_tests {
    use chub_hal::HalError;
    use std::collections::HashSet;

    const ALL: [HalError; 10] = [
        HalError::NotInitialized,
        HalError::InitFailed,
        HalError::MpuNotPresent,
        HalError::InvalidRegion,
        HalError::InvalidAlignment,
        HalError::AccessViolation,
        HalError::InvalidAddress,
        HalError::InvalidParameter,
        HalError::NotSupported,
        HalError::HardwareFault,
    ];

    #[test]
    fn test_all_error_codes_are_unique() {
        let codes: HashSet<u16> = ALL.iter().map(HalError::code).collect();
        assert_eq!(codes.len(), ALL.len());
    }

    #[test]
    fn test_all_errors_in_0x08xx_range() {
        for error in ALL {
            assert_eq!(error.code() & 0xFF00, 0x0800, "{error:?}");
        }
    }

    #[test]
    fn test_error_display_includes_code_and_description() {
        assert_eq!(
            format!("{}", HalError::MpuNotPresent),
            "[0x0810] MPU not present"
        );
    }
}

mod error_conversion_tests {
    use chub_common::Error;
    use chub_hal::HalError;

    #[test]
    fn test_mpu_errors_keep_their_meaning() {
        assert_eq!(Error::from(HalError::MpuNotPresent), Error::MpuNotPresent);
        assert_eq!(Error::from(HalError::InvalidAlignment), Error::InvalidAlignment);
        assert_eq!(Error::from(HalError::InvalidRegion), Error::TooManyRegions);
    }

    #[test]
    fn test_access_violation_is_security_error() {
        let error = Error::from(HalError::AccessViolation);
        assert_eq!(error, Error::MemoryAccessViolation);
        assert!(error.is_security_error());
    }

    #[test]
    fn test_generic_error_conversions() {
        assert_eq!(Error::from(HalError::InitFailed), Error::HardwareInitFailed);
        assert_eq!(Error::from(HalError::InvalidAddress), Error::InvalidParameter);
        assert_eq!(Error::from(HalError::NotSupported), Error::NotImplemented);
    }
}

mod trait_tests {
    //! Mock implementations of the HAL traits, checking the provided methods.

    use std::cell::{Cell, RefCell};

    use chub_hal::error::HalResult;
    use chub_hal::regs::{control_running, ControlValue, TypeValue};
    use chub_hal::{CodeMemory, HalError, InterruptControl, InterruptGuard, IrqState};

    struct MockIrq {
        primask: Cell<u32>,
        restores: Cell<u32>,
    }

    impl InterruptControl for MockIrq {
        fn mask(&self) -> IrqState {
            IrqState(self.primask.replace(1))
        }

        fn restore(&self, state: IrqState) {
            self.restores.set(self.restores.get() + 1);
            self.primask.set(state.0);
        }
    }

    struct MockMemory {
        bytes: RefCell<[u8; 8]>,
    }

    impl CodeMemory for MockMemory {
        fn read_u8(&self, address: u32) -> HalResult<u8> {
            self.bytes
                .borrow()
                .get(address as usize)
                .copied()
                .ok_or(HalError::InvalidAddress)
        }

        fn write_u8(&self, address: u32, value: u8) -> HalResult<()> {
            let mut bytes = self.bytes.borrow_mut();
            let slot = bytes.get_mut(address as usize).ok_or(HalError::InvalidAddress)?;
            *slot = value;
            Ok(())
        }
    }

    #[test]
    fn test_interrupt_guard_restores_on_drop() {
        let irq = MockIrq {
            primask: Cell::new(0),
            restores: Cell::new(0),
        };
        {
            let guard = InterruptGuard::new(&irq);
            assert!(!guard.saved().was_masked());
            assert_eq!(irq.primask.get(), 1);
        }
        assert_eq!(irq.primask.get(), 0);
        assert_eq!(irq.restores.get(), 1);
    }

    #[test]
    fn test_nested_guards_keep_outer_mask() {
        let irq = MockIrq {
            primask: Cell::new(0),
            restores: Cell::new(0),
        };
        let outer = InterruptGuard::new(&irq);
        {
            let inner = InterruptGuard::new(&irq);
            assert!(inner.saved().was_masked());
        }
        assert_eq!(irq.primask.get(), 1);
        drop(outer);
        assert_eq!(irq.primask.get(), 0);
    }

    #[test]
    fn test_write_slice_stops_at_first_error() {
        let memory = MockMemory {
            bytes: RefCell::new([0; 8]),
        };
        assert_eq!(memory.write_slice(6, &[1, 2, 3]), Err(HalError::InvalidAddress));
        assert_eq!(memory.read_u8(6), Ok(1));
        assert_eq!(memory.read_u8(7), Ok(2));
    }

    #[test]
    fn test_register_copies() {
        assert_eq!(TypeValue::new(0x0000_0800).get() >> 8, 8);
        let disabled = ControlValue::new(0);
        assert_ne!(disabled.get(), control_running().get());
    }
}

#[cfg(feature = "sim")]
mod sim_tests {
    use chub_hal::regs::{base_for, control_running, AttributesValue, RegionAttributes};
    use chub_hal::sim::{Access, MpuOp, SimHardware, ERASED};
    use chub_hal::{CodeMemory, HalError, InterruptControl, MpuPort};

    fn read_only(size_field: u32) -> AttributesValue {
        let mut attrs = AttributesValue::new(0);
        attrs.write(
            RegionAttributes::AP::ReadOnly
                + RegionAttributes::SIZE.val(size_field)
                + RegionAttributes::ENABLE::SET,
        );
        attrs
    }

    #[test]
    fn test_type_register_reports_regions() {
        assert_eq!(SimHardware::new(8, 0).region_count(), 8);
        assert_eq!(SimHardware::without_mpu(0).region_count(), 0);
    }

    #[test]
    fn test_register_writes_are_recorded_in_order() {
        let sim = SimHardware::new(8, 0);
        sim.select_region(3);
        sim.set_region_base(base_for(0x400));
        sim.set_region_attributes(read_only(9));
        sim.dsb();

        assert_eq!(
            sim.ops(),
            vec![
                MpuOp::SelectRegion(3),
                MpuOp::SetBase(0x400),
                MpuOp::SetAttributes(read_only(9).get()),
                MpuOp::Dsb,
            ]
        );
        sim.clear_ops();
        assert!(sim.ops().is_empty());
    }

    #[test]
    fn test_readback_uses_selected_region() {
        let sim = SimHardware::new(8, 0);
        sim.select_region(5);
        sim.set_region_base(base_for(0x8000));
        sim.select_region(1);
        assert_eq!(sim.region_base().get(), 0);
        sim.select_region(5);
        assert_eq!(sim.region_base().get(), 0x8000);
    }

    #[test]
    fn test_writes_beyond_implemented_regions_ignored() {
        let sim = SimHardware::new(4, 0);
        sim.select_region(6);
        sim.set_region_attributes(read_only(9));
        assert!(sim.region_raw(6).is_none());
        assert_eq!(sim.region_attributes().get(), 0);
    }

    #[test]
    fn test_store_lands_when_unprotected() {
        let sim = SimHardware::new(8, 64);
        assert_eq!(sim.write_u8(3, 0x5A), Ok(()));
        assert_eq!(sim.memory(2, 3), vec![ERASED, 0x5A, ERASED]);
        assert_eq!(sim.unmasked_stores(), 1);
    }

    #[test]
    fn test_protected_store_faults() {
        let sim = SimHardware::new(8, 2048);
        sim.select_region(1);
        sim.set_region_base(base_for(0));
        sim.set_region_attributes(read_only(10));
        sim.set_control(control_running());

        assert_eq!(sim.write_u8(0x10, 1), Err(HalError::AccessViolation));
        assert_eq!(sim.faults(), 1);
        assert_eq!(sim.access(0x10, false), Access { read: true, write: false, execute: true });
    }

    #[test]
    fn test_masked_store_not_counted_as_unmasked() {
        let sim = SimHardware::new(8, 16);
        let state = sim.mask();
        assert_eq!(sim.write_u8(0, 1), Ok(()));
        sim.restore(state);
        assert_eq!(sim.unmasked_stores(), 0);
        assert!(!sim.interrupts_masked());
    }
}
