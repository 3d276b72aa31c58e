// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Hardware region programming
//!
//! Writes a [`RegionTable`] to the MPU with interrupts masked for the whole
//! sequence. Each region is written disabled first, then its base, then its
//! enabled attributes, so a half-written region is never live.

use core::fmt;

use chub_common::Error;
use chub_hal::regs::{control_disabled, control_running, AttributesValue, RegionAttributes};
use chub_hal::{InterruptControl, InterruptGuard, MpuPort};

use crate::dump::{RegionRegisters, RegisterDump};
use crate::table::{ProtectionSlot, RegionTable};

/// Programming failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgramError {
    /// The core has no MPU
    NotPresent,
    /// The table needs more regions than the MPU implements
    TooManyRegions {
        /// Regions in the table
        needed: usize,
        /// Regions implemented
        available: u8,
    },
}

impl fmt::Display for ProgramError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotPresent => f.write_str("MPU not present"),
            Self::TooManyRegions { needed, available } => {
                write!(f, "table needs {needed} regions, MPU has {available}")
            }
        }
    }
}

impl From<ProgramError> for Error {
    fn from(e: ProgramError) -> Self {
        match e {
            ProgramError::NotPresent => Self::MpuNotPresent,
            ProgramError::TooManyRegions { .. } => Self::TooManyRegions,
        }
    }
}

/// Program every region of `table` and enable the MPU
///
/// Implemented regions beyond the table are disabled. Leaves the MPU enabled
/// with the default map as privileged background and protection active in
/// fault handlers.
///
/// # Errors
/// Returns `NotPresent` if TYPE.DREGION reads zero, `TooManyRegions` if the
/// table does not fit. No register is written in either case.
pub fn program<M, I>(table: &RegionTable, mpu: &M, irq: &I) -> Result<(), ProgramError>
where
    M: MpuPort + ?Sized,
    I: InterruptControl + ?Sized,
{
    let available = mpu.region_count();
    if available == 0 {
        return Err(ProgramError::NotPresent);
    }
    if table.len() > usize::from(available) {
        return Err(ProgramError::TooManyRegions {
            needed: table.len(),
            available,
        });
    }

    let _irq = InterruptGuard::new(irq);

    mpu.dmb();
    mpu.set_control(control_disabled());

    for slot in table.iter() {
        write_slot(mpu, slot);
    }
    // Leftovers from earlier boot stages would outrank the guard
    let used = table.len() as u8;
    for id in used..available {
        mpu.select_region(id);
        mpu.set_region_attributes(AttributesValue::new(0));
    }

    mpu.set_control(control_running());
    mpu.dsb();
    mpu.isb();
    Ok(())
}

fn write_slot<M: MpuPort + ?Sized>(mpu: &M, slot: &ProtectionSlot) {
    let attrs = slot.attributes_value();
    let mut disabled = attrs;
    disabled.modify(RegionAttributes::ENABLE::CLEAR);

    mpu.select_region(slot.id);
    mpu.set_region_attributes(disabled);
    mpu.set_region_base(slot.base_value());
    mpu.set_region_attributes(attrs);
}

/// Read CTRL and the first `count` regions back from hardware
///
/// `count` is clamped to the implemented regions.
pub fn read_back<M: MpuPort + ?Sized>(mpu: &M, count: u8) -> RegisterDump {
    let mut dump = RegisterDump::new(mpu.control());
    for id in 0..count.min(mpu.region_count()) {
        mpu.select_region(id);
        let region = RegionRegisters {
            id,
            base: mpu.region_base(),
            attributes: mpu.region_attributes(),
        };
        if !dump.push(region) {
            break;
        }
    }
    dump
}
