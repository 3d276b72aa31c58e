// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Error types for the sensor-hub firmware
//!
//! This module defines the unified error type used throughout the firmware.
//! All errors are designed to be no_std compatible and provide detailed
//! error information without heap allocation.

use core::fmt;

/// Result type alias for sensor-hub operations
pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for the sensor-hub firmware
///
/// Subsystem-local error enums convert into this type with `From`, so
/// callers that only care about the category can propagate with `?`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    // =========================================================================
    // Memory Protection Errors (0x01xx)
    // =========================================================================
    /// Code size cannot be expressed within the region slot budget
    RegionBudgetExceeded,
    /// Region base address is not a multiple of its size
    InvalidAlignment,
    /// Region size is not a supported power of two
    InvalidRegionSize,
    /// Size table is empty, unsorted or contains unsupported sizes
    InvalidSizeTable,
    /// Region table does not match the requested protected size
    RegionTableMismatch,
    /// Table needs more regions than the hardware provides
    TooManyRegions,
    /// Write target lies outside the protected code window
    WriteOutOfBounds,
    /// Protection unit was already unlocked by an outer caller
    NestedUnlock,
    /// Code protection is not active
    ProtectionInactive,

    // =========================================================================
    // HAL Errors (0x08xx)
    // =========================================================================
    /// Hardware initialization failed
    HardwareInitFailed,
    /// Memory protection unit not implemented by this core
    MpuNotPresent,
    /// Invalid memory access reported by the hardware
    MemoryAccessViolation,

    // =========================================================================
    // General Errors (0xFFxx)
    // =========================================================================
    /// Invalid parameter provided
    InvalidParameter,
    /// Buffer is too small for operation
    BufferTooSmall,
    /// Invalid state for the operation
    InvalidState,
    /// Operation not permitted
    NotPermitted,
    /// Feature not implemented
    NotImplemented,
    /// Internal error (should not occur)
    InternalError,
}

impl Error {
    /// Get the error code for this error
    ///
    /// Error codes are organized by category:
    /// - 0x01xx: Memory protection errors
    /// - 0x08xx: HAL errors
    /// - 0xFFxx: General errors
    #[must_use]
    pub const fn code(&self) -> u16 {
        match self {
            // Memory protection errors (0x01xx)
            Self::RegionBudgetExceeded => 0x0101,
            Self::InvalidAlignment => 0x0102,
            Self::InvalidRegionSize => 0x0103,
            Self::InvalidSizeTable => 0x0104,
            Self::RegionTableMismatch => 0x0105,
            Self::TooManyRegions => 0x0106,
            Self::WriteOutOfBounds => 0x0107,
            Self::NestedUnlock => 0x0108,
            Self::ProtectionInactive => 0x0109,

            // HAL errors (0x08xx)
            Self::HardwareInitFailed => 0x0801,
            Self::MpuNotPresent => 0x0802,
            Self::MemoryAccessViolation => 0x0803,

            // General errors (0xFFxx)
            Self::InvalidParameter => 0xFF01,
            Self::BufferTooSmall => 0xFF02,
            Self::InvalidState => 0xFF03,
            Self::NotPermitted => 0xFF04,
            Self::NotImplemented => 0xFF05,
            Self::InternalError => 0xFFFF,
        }
    }

    /// Check if this is a security-critical error
    ///
    /// Security errors indicate that an attempt was made to modify protected
    /// code outside the sanctioned path.
    #[must_use]
    pub const fn is_security_error(&self) -> bool {
        matches!(
            self,
            Self::WriteOutOfBounds | Self::NestedUnlock | Self::MemoryAccessViolation
        )
    }

    /// Check if the system can continue booting after this error
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        !matches!(self, Self::InternalError | Self::MemoryAccessViolation)
    }

    /// Get a short description of the error
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::RegionBudgetExceeded => "region slot budget exceeded",
            Self::InvalidAlignment => "region base not aligned to its size",
            Self::InvalidRegionSize => "unsupported region size",
            Self::InvalidSizeTable => "invalid region size table",
            Self::RegionTableMismatch => "region table does not cover protected size",
            Self::TooManyRegions => "too many regions for hardware",
            Self::WriteOutOfBounds => "write outside protected window",
            Self::NestedUnlock => "protection unit already unlocked",
            Self::ProtectionInactive => "code protection inactive",
            Self::HardwareInitFailed => "hardware init failed",
            Self::MpuNotPresent => "MPU not present",
            Self::MemoryAccessViolation => "memory access violation",
            Self::InvalidParameter => "invalid parameter",
            Self::BufferTooSmall => "buffer too small",
            Self::InvalidState => "invalid state",
            Self::NotPermitted => "not permitted",
            Self::NotImplemented => "not implemented",
            Self::InternalError => "internal error",
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[0x{:04X}] {}", self.code(), self.description())
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Error {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "[0x{:04X}] {}", self.code(), self.description());
    }
}
