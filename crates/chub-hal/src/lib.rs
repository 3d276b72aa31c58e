// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Hardware Abstraction Layer for the sensor-hub firmware
//!
//! This crate provides the hardware interfaces used by code protection on
//! the hub's ARMv7-M core:
//!
//! - **Cortex-M**: PMSAv7 MPU, PRIMASK and code memory (`cortex-m` feature)
//! - **Sim**: host model of the same hardware for tests (`sim` feature)
//!
//! # Architecture
//!
//! The HAL is structured in layers:
//!
//! 1. **Registers**: typed MPU field definitions (`regs` module)
//! 2. **Traits**: platform-agnostic interfaces (`traits` module)
//! 3. **Drivers**: platform-specific implementations

#![no_std]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

#[cfg(feature = "std")]
extern crate std;

pub mod error;
pub mod irq;
pub mod regs;
pub mod traits;

#[cfg(feature = "cortex-m")]
pub mod cortex_m;

#[cfg(feature = "sim")]
pub mod sim;

// Re-export main traits
pub use error::{HalError, HalResult};
pub use irq::InterruptGuard;
pub use traits::*;

/// Platform identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    /// ARMv7-M hub core
    CortexM,
    /// Host simulation
    Sim,
    /// Unknown platform
    Unknown,
}

impl Platform {
    /// Get the current platform
    #[must_use]
    pub const fn current() -> Self {
        cfg_if::cfg_if! {
            if #[cfg(feature = "cortex-m")] {
                Self::CortexM
            } else if #[cfg(feature = "sim")] {
                Self::Sim
            } else {
                Self::Unknown
            }
        }
    }

    /// Platform name
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::CortexM => "cortex-m",
            Self::Sim => "sim",
            Self::Unknown => "unknown",
        }
    }
}

impl core::fmt::Display for Platform {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}
