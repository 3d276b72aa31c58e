// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Guarded writes to protected code
//!
//! Code regions are read-only to everyone, so patching code means switching
//! the MPU off for a few stores. Each [`GuardedCodeWriter`] call opens an
//! unlock window with interrupts masked, performs one bounds-checked request
//! and puts everything back when the window is dropped, on every exit path.
//!
//! Only one window can be open at a time. A window that finds the MPU
//! already disabled refuses to open rather than re-enable protection under
//! an outer writer.

use core::fmt;

use chub_common::Error;
use chub_hal::regs::{control_disabled, Control, ControlValue};
use chub_hal::{HalError, InterruptGuard, ProtectionHardware};

/// Guarded write failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteError {
    /// Target range is not inside `[0, protected_size)`
    OutOfBounds {
        /// First byte of the request
        address: u32,
        /// Length of the request
        len: usize,
    },
    /// The MPU is already unlocked by an outer caller
    NestedUnlock,
    /// Protection is not active, so there is nothing to unlock
    Inactive,
    /// The store itself failed
    Fault(HalError),
}

impl fmt::Display for WriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfBounds { address, len } => {
                write!(f, "write of {len} bytes at {address:#010x} out of bounds")
            }
            Self::NestedUnlock => f.write_str("MPU already unlocked"),
            Self::Inactive => f.write_str("code protection inactive"),
            Self::Fault(e) => write!(f, "store failed: {e}"),
        }
    }
}

impl From<WriteError> for Error {
    fn from(e: WriteError) -> Self {
        match e {
            WriteError::OutOfBounds { .. } => Self::WriteOutOfBounds,
            WriteError::NestedUnlock => Self::NestedUnlock,
            WriteError::Inactive => Self::ProtectionInactive,
            WriteError::Fault(e) => e.into(),
        }
    }
}

/// Check `[address, address + len)` against `[0, limit)`
///
/// An empty range only needs a valid start address.
fn check_bounds(address: u32, len: usize, limit: u32) -> Result<(), WriteError> {
    let start = u64::from(address);
    let end = start + len as u64;
    if start >= u64::from(limit) || end > u64::from(limit) {
        return Err(WriteError::OutOfBounds { address, len });
    }
    Ok(())
}

/// MPU switched off with interrupts masked
///
/// Dropping the window restores the saved CTRL value, issues the barriers
/// that make it take effect, then restores the interrupt state.
pub(crate) struct UnlockWindow<'a, H: ProtectionHardware + ?Sized> {
    hw: &'a H,
    saved: ControlValue,
    limit: u32,
    // Dropped after `drop` has relocked the MPU
    _irq: InterruptGuard<'a, H>,
}

impl<'a, H: ProtectionHardware + ?Sized> UnlockWindow<'a, H> {
    /// Mask interrupts and disable the MPU
    ///
    /// Returns `NestedUnlock` if the MPU is already disabled; interrupts are
    /// restored before returning.
    fn open(hw: &'a H, limit: u32) -> Result<Self, WriteError> {
        let irq = InterruptGuard::new(hw);
        let saved = hw.control();
        if !saved.is_set(Control::ENABLE) {
            return Err(WriteError::NestedUnlock);
        }

        hw.dmb();
        hw.set_control(control_disabled());

        Ok(Self {
            hw,
            saved,
            limit,
            _irq: irq,
        })
    }

    /// Store a byte slice inside the protected window
    pub(crate) fn write_bytes(&self, address: u32, data: &[u8]) -> Result<(), WriteError> {
        check_bounds(address, data.len(), self.limit)?;
        self.hw.write_slice(address, data).map_err(WriteError::Fault)
    }
}

impl<H: ProtectionHardware + ?Sized> Drop for UnlockWindow<'_, H> {
    fn drop(&mut self) {
        self.hw.set_control(self.saved);
        self.hw.dsb();
        self.hw.isb();
    }
}

/// Write path into the protected code image
pub struct GuardedCodeWriter<'a, H: ProtectionHardware + ?Sized> {
    hw: &'a H,
    protected_size: u32,
    active: bool,
}

impl<'a, H: ProtectionHardware + ?Sized> GuardedCodeWriter<'a, H> {
    /// Writer for `[0, protected_size)`
    ///
    /// With `active` false the MPU is not guarding code and stores go
    /// straight to memory.
    pub fn new(hw: &'a H, protected_size: u32, active: bool) -> Self {
        Self {
            hw,
            protected_size,
            active,
        }
    }

    /// Size of the writable window
    #[must_use]
    pub const fn protected_size(&self) -> u32 {
        self.protected_size
    }

    /// Open an unlock window bounded to the protected size
    ///
    /// `Inactive` if protection is not active, `NestedUnlock` if another
    /// window is open.
    pub(crate) fn unlock(&self) -> Result<UnlockWindow<'a, H>, WriteError> {
        if !self.active {
            return Err(WriteError::Inactive);
        }
        UnlockWindow::open(self.hw, self.protected_size)
    }

    /// Store one byte
    ///
    /// # Errors
    /// `OutOfBounds` with nothing written, `NestedUnlock` when called inside
    /// another write, `Fault` if the store fails.
    pub fn write_byte(&self, address: u32, value: u8) -> Result<(), WriteError> {
        self.write_bytes(address, &[value])
    }

    /// Store a little-endian word
    ///
    /// # Errors
    /// See [`GuardedCodeWriter::write_byte`].
    pub fn write_word(&self, address: u32, value: u32) -> Result<(), WriteError> {
        self.write_bytes(address, &value.to_le_bytes())
    }

    /// Store a byte slice
    ///
    /// # Errors
    /// See [`GuardedCodeWriter::write_byte`].
    pub fn write_bytes(&self, address: u32, data: &[u8]) -> Result<(), WriteError> {
        check_bounds(address, data.len(), self.protected_size)?;
        if data.is_empty() {
            return Ok(());
        }
        if !self.active {
            return self.hw.write_slice(address, data).map_err(WriteError::Fault);
        }
        self.unlock()?.write_bytes(address, data)
    }
}
