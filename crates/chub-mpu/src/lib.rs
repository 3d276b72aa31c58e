// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Sensor-hub code protection
//!
//! Marks the firmware image read-only and executable with the ARMv7-M MPU:
//!
//! - **Split**: Decompose the image into aligned power-of-two regions
//! - **Table**: Background, code and guard regions with their attributes
//! - **Program**: Write the table to hardware with interrupts masked
//! - **Writer**: Temporarily unlock the MPU to patch code
//! - **Dump**: Region listings from the table or from live registers
//!
//! # Usage
//!
//! ```rust,ignore
//! use chub_common::{LogBuffer, ProtectionConfig};
//! use chub_hal::cortex_m::CortexM;
//! use chub_mpu::initialize_protection;
//!
//! static mut LOG: LogBuffer = LogBuffer::new();
//!
//! let hw = unsafe { CortexM::new() };
//! let config = ProtectionConfig::for_code_size(code_end);
//! let protection = initialize_protection(&hw, &config, unsafe { &mut LOG });
//!
//! if protection.is_active() {
//!     protection.write_protected_word(patch_addr, 0xBF00_BF00)?;
//! }
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod dump;
pub mod program;
pub mod protection;
pub mod size_table;
pub mod split;
pub mod sweep;
pub mod table;
pub mod writer;

// Re-export commonly used types
pub use dump::{Listing, RegisterDump};
pub use program::{program, read_back, ProgramError};
pub use protection::{initialize_protection, CodeProtection};
pub use size_table::{RegionSize, SizeTable};
pub use split::{decompose, CodeSlot, SplitError, SplitPlan};
pub use sweep::{sweep, SweepReport};
pub use table::{AccessPermission, MemoryAttributes, ProtectionSlot, RegionTable};
pub use writer::{GuardedCodeWriter, WriteError};
