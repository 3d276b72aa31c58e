// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! HAL error types

use core::fmt;

/// HAL error type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HalError {
    /// Hardware not initialized
    NotInitialized,
    /// Hardware initialization failed
    InitFailed,
    /// MPU not implemented (TYPE.DREGION reads zero)
    MpuNotPresent,
    /// Region number beyond the implemented regions
    InvalidRegion,
    /// Region base not aligned to its size
    InvalidAlignment,
    /// Access blocked by the active protection map
    AccessViolation,
    /// Address outside the modelled or mapped memory
    InvalidAddress,
    /// Invalid parameter
    InvalidParameter,
    /// Operation not supported
    NotSupported,
    /// Hardware fault detected
    HardwareFault,
}

impl HalError {
    /// Get error code
    #[must_use]
    pub const fn code(&self) -> u16 {
        match self {
            Self::NotInitialized => 0x0801,
            Self::InitFailed => 0x0802,
            Self::MpuNotPresent => 0x0810,
            Self::InvalidRegion => 0x0811,
            Self::InvalidAlignment => 0x0812,
            Self::AccessViolation => 0x0820,
            Self::InvalidAddress => 0x0821,
            Self::InvalidParameter => 0x08F0,
            Self::NotSupported => 0x08FF,
            Self::HardwareFault => 0x08D0,
        }
    }

    /// Get error description
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::NotInitialized => "not initialized",
            Self::InitFailed => "initialization failed",
            Self::MpuNotPresent => "MPU not present",
            Self::InvalidRegion => "invalid region number",
            Self::InvalidAlignment => "region base not aligned to size",
            Self::AccessViolation => "access blocked by MPU",
            Self::InvalidAddress => "address not mapped",
            Self::InvalidParameter => "invalid parameter",
            Self::NotSupported => "not supported",
            Self::HardwareFault => "hardware fault detected",
        }
    }
}

impl fmt::Display for HalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[0x{:04X}] {}", self.code(), self.description())
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for HalError {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "[0x{:04X}] {}", self.code(), self.description());
    }
}

impl From<HalError> for chub_common::Error {
    fn from(e: HalError) -> Self {
        match e {
            HalError::NotInitialized | HalError::InitFailed | HalError::HardwareFault => {
                Self::HardwareInitFailed
            }
            HalError::MpuNotPresent => Self::MpuNotPresent,
            HalError::InvalidRegion => Self::TooManyRegions,
            HalError::InvalidAlignment => Self::InvalidAlignment,
            HalError::AccessViolation => Self::MemoryAccessViolation,
            HalError::InvalidAddress | HalError::InvalidParameter => Self::InvalidParameter,
            HalError::NotSupported => Self::NotImplemented,
        }
    }
}

/// HAL Result type
pub type HalResult<T> = Result<T, HalError>;
