// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Diagnostic region listings
//!
//! One line per region, decoded from the raw RBAR/RASR pair so that a table
//! listing and a listing read back from hardware print identically:
//!
//! ```text
//! 1: E 00000000-0001ffff S: R-X U: R-X TEX: 0 SC  00
//! ```

use core::fmt;

use heapless::Vec;

use chub_common::constants::MAX_MPU_REGIONS;
use chub_hal::regs::{
    attributes_size, AttributesValue, BaseValue, Control, ControlValue, RegionAttributes,
    RBAR_ADDR_MASK,
};

use crate::table::RegionTable;

/// Privileged permission string (RWX, RW-, R-X, R--, ---)
fn privileged(ap: u32, xn: bool) -> &'static str {
    match (ap, xn) {
        (0, _) => "---",
        (1..=3, true) => "RW-",
        (1..=3, false) => "RWX",
        (5..=7, true) => "R--",
        (5..=7, false) => "R-X",
        _ => "???",
    }
}

/// Unprivileged permission string
fn unprivileged(ap: u32, xn: bool) -> &'static str {
    match (ap, xn) {
        (0 | 1 | 5, _) => "---",
        (3, true) => "RW-",
        (3, false) => "RWX",
        (2 | 6 | 7, true) => "R--",
        (2 | 6 | 7, false) => "R-X",
        _ => "???",
    }
}

fn flag(set: bool, c: char) -> char {
    if set {
        c
    } else {
        ' '
    }
}

fn write_region(
    f: &mut fmt::Formatter<'_>,
    id: u8,
    base: BaseValue,
    attrs: AttributesValue,
) -> fmt::Result {
    let start = base.get() & RBAR_ADDR_MASK;
    let last = u64::from(start) + attributes_size(attrs) - 1;
    let ap = attrs.read(RegionAttributes::AP);
    let xn = attrs.is_set(RegionAttributes::XN);
    writeln!(
        f,
        "{}: {} {:08x}-{:08x} S: {} U: {} TEX: {} {}{}{} {:02x}",
        id,
        if attrs.is_set(RegionAttributes::ENABLE) { 'E' } else { 'D' },
        start,
        last,
        privileged(ap, xn),
        unprivileged(ap, xn),
        attrs.read(RegionAttributes::TEX),
        flag(attrs.is_set(RegionAttributes::S), 'S'),
        flag(attrs.is_set(RegionAttributes::C), 'C'),
        flag(attrs.is_set(RegionAttributes::B), 'B'),
        attrs.read(RegionAttributes::SRD),
    )
}

/// Listing of a [`RegionTable`]
pub struct Listing<'a> {
    table: &'a RegionTable,
}

impl<'a> Listing<'a> {
    pub(crate) fn new(table: &'a RegionTable) -> Self {
        Self { table }
    }
}

impl fmt::Display for Listing<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for slot in self.table.iter() {
            write_region(f, slot.id, slot.base_value(), slot.attributes_value())?;
        }
        Ok(())
    }
}

/// Snapshot of the live MPU registers
#[derive(Debug, Clone, Copy)]
pub struct RegionRegisters {
    /// Region number
    pub id: u8,
    /// RBAR
    pub base: BaseValue,
    /// RASR
    pub attributes: AttributesValue,
}

/// Registers read back from hardware
#[derive(Debug, Clone)]
pub struct RegisterDump {
    control: ControlValue,
    regions: Vec<RegionRegisters, MAX_MPU_REGIONS>,
}

impl RegisterDump {
    pub(crate) fn new(control: ControlValue) -> Self {
        Self {
            control,
            regions: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, region: RegionRegisters) -> bool {
        self.regions.push(region).is_ok()
    }

    /// CTRL at the time of the read
    #[must_use]
    pub fn control(&self) -> ControlValue {
        self.control
    }

    /// Regions in ascending id order
    #[must_use]
    pub fn regions(&self) -> &[RegionRegisters] {
        &self.regions
    }

    /// Check that every region of `table` is programmed exactly as built
    #[must_use]
    pub fn matches(&self, table: &RegionTable) -> bool {
        table.iter().all(|slot| {
            self.regions.iter().any(|r| {
                r.id == slot.id
                    && r.base.get() == slot.base_value().get()
                    && r.attributes.get() == slot.attributes_value().get()
            })
        })
    }
}

impl fmt::Display for RegisterDump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "MPU: {} HFNMIENA: {} PRIVDEFENA: {}",
            self.control.read(Control::ENABLE),
            self.control.read(Control::HFNMIENA),
            self.control.read(Control::PRIVDEFENA),
        )?;
        for region in &self.regions {
            write_region(f, region.id, region.base, region.attributes)?;
        }
        Ok(())
    }
}
