// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Boot-time code protection
//!
//! [`initialize_protection`] runs once before the scheduler starts. It never
//! fails: when the image cannot be covered within the region budget the hub
//! boots with code unprotected (background and guard only), and when the
//! core has no MPU nothing is programmed at all. Either way the outcome is
//! logged and reported through [`CodeProtection::is_active`].

use chub_common::log::BOOT_TIMESTAMP;
use chub_common::{log_debug, log_error, log_info, log_warn};
use chub_common::{LogBuffer, ProtectionConfig, Result};
use chub_hal::{Platform, ProtectionHardware};

use crate::dump::{Listing, RegisterDump};
use crate::program::{program, read_back};
use crate::size_table::SizeTable;
use crate::split::decompose;
use crate::table::RegionTable;
use crate::writer::{GuardedCodeWriter, WriteError};

const MODULE: &str = "mpu";

/// Protection state established at boot
pub struct CodeProtection<'h, H: ProtectionHardware + ?Sized> {
    hw: &'h H,
    table: Option<RegionTable>,
    protected_size: u32,
    active: bool,
}

impl<'h, H: ProtectionHardware + ?Sized> CodeProtection<'h, H> {
    /// Check whether code regions are enforced
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Table programmed at boot, if any
    #[must_use]
    pub const fn table(&self) -> Option<&RegionTable> {
        self.table.as_ref()
    }

    /// Size of the code image, starting at address zero
    #[must_use]
    pub const fn protected_size(&self) -> u32 {
        self.protected_size
    }

    /// Guarded writer over the code image
    #[must_use]
    pub fn writer(&self) -> GuardedCodeWriter<'h, H> {
        GuardedCodeWriter::new(self.hw, self.protected_size, self.active)
    }

    /// Store one byte into protected code
    ///
    /// # Errors
    /// See [`GuardedCodeWriter::write_byte`].
    pub fn write_protected_byte(&self, address: u32, value: u8) -> core::result::Result<(), WriteError> {
        self.writer().write_byte(address, value)
    }

    /// Store a little-endian word into protected code
    ///
    /// # Errors
    /// See [`GuardedCodeWriter::write_word`].
    pub fn write_protected_word(&self, address: u32, value: u32) -> core::result::Result<(), WriteError> {
        self.writer().write_word(address, value)
    }

    /// Store bytes into protected code
    ///
    /// # Errors
    /// See [`GuardedCodeWriter::write_bytes`].
    pub fn write_protected_bytes(&self, address: u32, data: &[u8]) -> core::result::Result<(), WriteError> {
        self.writer().write_bytes(address, data)
    }

    /// Listing of the table built at boot
    #[must_use]
    pub fn dump_regions(&self) -> Option<Listing<'_>> {
        self.table.as_ref().map(RegionTable::listing)
    }

    /// Live register contents for every implemented region
    #[must_use]
    pub fn dump_hardware(&self) -> RegisterDump {
        read_back(self.hw, self.hw.region_count())
    }
}

/// Split, build and program the code protection table
///
/// Always returns; failures degrade protection and are logged to `log`.
pub fn initialize_protection<'h, H>(
    hw: &'h H,
    config: &ProtectionConfig,
    log: &mut LogBuffer,
) -> CodeProtection<'h, H>
where
    H: ProtectionHardware + ?Sized,
{
    log_debug!(log, BOOT_TIMESTAMP, MODULE, "platform {}", Platform::current());

    let (table, active) = match build_table(config, log) {
        Ok(built) => built,
        Err(e) => {
            log_error!(log, BOOT_TIMESTAMP, MODULE, "no protection table: {}", e);
            return CodeProtection {
                hw,
                table: None,
                protected_size: config.code_size,
                active: false,
            };
        }
    };

    let active = match program(&table, hw, hw) {
        Ok(()) => active,
        Err(e) => {
            log_error!(log, BOOT_TIMESTAMP, MODULE, "programming failed: {}", e);
            false
        }
    };

    if active {
        log_info!(
            log,
            BOOT_TIMESTAMP,
            MODULE,
            "code protected: {} bytes in {} regions",
            table.code_size(),
            table.code_slots().len()
        );
    }

    CodeProtection {
        hw,
        table: Some(table),
        protected_size: config.code_size,
        active,
    }
}

/// Table to program, and whether it enforces code protection
fn build_table(config: &ProtectionConfig, log: &mut LogBuffer) -> Result<(RegionTable, bool)> {
    config.validate()?;
    let sizes = SizeTable::REFERENCE.with_subdivisions(config.subdivisions)?;

    match decompose(config.code_size, usize::from(config.max_code_slots), &sizes) {
        Ok(plan) => {
            plan.verify(config.code_size, &sizes)?;
            for slot in plan.slots() {
                log_debug!(
                    log,
                    BOOT_TIMESTAMP,
                    MODULE,
                    "code {:#010x} size {:#x} sub {}",
                    slot.base,
                    slot.size,
                    slot.enabled_sub_blocks
                );
            }
            let table = RegionTable::build(&plan, config.code_size, config)?;
            Ok((table, true))
        }
        Err(e) => {
            log_warn!(log, BOOT_TIMESTAMP, MODULE, "split failed, code unprotected: {}", e);
            let table = RegionTable::unprotected(config.code_size, config)?;
            Ok((table, false))
        }
    }
}

impl<H: ProtectionHardware + ?Sized> core::fmt::Debug for CodeProtection<'_, H> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CodeProtection")
            .field("table", &self.table)
            .field("protected_size", &self.protected_size)
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}
