// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Integration tests for chub-common
//!
//! Tests for error codes, logging and protection configuration.

mod error_tests {
    use chub_common::Error;
    use std::collections::HashSet;

    const ALL: [Error; 18] = [
        Error::RegionBudgetExceeded,
        Error::InvalidAlignment,
        Error::InvalidRegionSize,
        Error::InvalidSizeTable,
        Error::RegionTableMismatch,
        Error::TooManyRegions,
        Error::WriteOutOfBounds,
        Error::NestedUnlock,
        Error::ProtectionInactive,
        Error::HardwareInitFailed,
        Error::MpuNotPresent,
        Error::MemoryAccessViolation,
        Error::InvalidParameter,
        Error::BufferTooSmall,
        Error::InvalidState,
        Error::NotPermitted,
        Error::NotImplemented,
        Error::InternalError,
    ];

    #[test]
    fn test_error_codes_unique() {
        let unique: HashSet<u16> = ALL.iter().map(Error::code).collect();
        assert_eq!(unique.len(), ALL.len());
    }

    #[test]
    fn test_error_code_categories() {
        assert_eq!(Error::RegionBudgetExceeded.code() >> 8, 0x01);
        assert_eq!(Error::NestedUnlock.code() >> 8, 0x01);
        assert_eq!(Error::MpuNotPresent.code() >> 8, 0x08);
        assert_eq!(Error::InvalidParameter.code() >> 8, 0xFF);
    }

    #[test]
    fn test_error_display_contains_code() {
        let text = format!("{}", Error::WriteOutOfBounds);
        assert!(text.starts_with("[0x0107]"));
        assert!(text.contains("outside protected window"));
    }

    #[test]
    fn test_security_classification() {
        assert!(Error::NestedUnlock.is_security_error());
        assert!(Error::WriteOutOfBounds.is_security_error());
        assert!(!Error::RegionBudgetExceeded.is_security_error());
    }

    #[test]
    fn test_budget_failure_is_recoverable() {
        assert!(Error::RegionBudgetExceeded.is_recoverable());
        assert!(Error::MpuNotPresent.is_recoverable());
        assert!(!Error::InternalError.is_recoverable());
    }

    #[test]
    fn test_descriptions_non_empty() {
        for error in ALL {
            assert!(!error.description().is_empty(), "{error:?}");
        }
    }
}

mod log_tests {
    use chub_common::log::{LogBuffer, LogEntry, LogLevel, LOG_BUFFER_SIZE};
    use chub_common::{log_debug, log_error, log_info, log_warn};

    #[test]
    fn test_macros_record_level_and_module() {
        let mut log = LogBuffer::new();
        log_error!(log, 5, "mpu", "programming failed: {}", 3);
        log_warn!(log, 6, "mpu", "split failed");

        let entries: Vec<&LogEntry> = log.iter().collect();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].level, LogLevel::Error);
        assert_eq!(entries[0].module, "mpu");
        assert_eq!(entries[0].message.as_str(), "programming failed: 3");
        assert_eq!(entries[1].level, LogLevel::Warn);
    }

    #[test]
    fn test_debug_filtered_by_default() {
        let mut log = LogBuffer::new();
        log_debug!(log, 0, "mpu", "slot {}", 1);
        assert!(log.is_empty());
        assert_eq!(log.min_level(), LogLevel::Info);
    }

    #[test]
    fn test_count_at_level() {
        let mut log = LogBuffer::new();
        log_info!(log, 0, "a", "one");
        log_info!(log, 0, "a", "two");
        log_warn!(log, 0, "a", "three");
        assert_eq!(log.count_at(LogLevel::Info), 2);
        assert_eq!(log.count_at(LogLevel::Warn), 1);
        assert_eq!(log.count_at(LogLevel::Error), 0);
    }

    #[test]
    fn test_iteration_is_oldest_first_after_wrap() {
        let mut log = LogBuffer::new();
        for i in 0..(LOG_BUFFER_SIZE as u32 * 2) {
            log_info!(log, i, "a", "{}", i);
        }
        let stamps: Vec<u32> = log.iter().map(|e| e.timestamp).collect();
        assert_eq!(stamps.len(), LOG_BUFFER_SIZE);
        assert!(stamps.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(stamps[0], LOG_BUFFER_SIZE as u32);
    }

    #[test]
    fn test_entry_display_format() {
        let mut log = LogBuffer::new();
        log_warn!(log, 0x10, "mpu", "hello");
        let entry = log.latest().expect("entry");
        assert_eq!(format!("{entry}"), "[00000010] W [mpu] hello");
    }
}

mod config_tests {
    use chub_common::constants::{CODE_REGION_SIZES, KB, REFERENCE_CODE_SIZE};
    use chub_common::{Error, ProtectionConfig, RegionWindow};

    #[test]
    fn test_reference_size_table_is_ascending_powers_of_two() {
        assert_eq!(CODE_REGION_SIZES.len(), 9);
        assert_eq!(CODE_REGION_SIZES[0], KB);
        assert_eq!(CODE_REGION_SIZES[8], 256 * KB);
        assert!(CODE_REGION_SIZES.iter().all(|s| s.is_power_of_two()));
        assert!(CODE_REGION_SIZES.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_for_code_size_keeps_defaults() {
        let config = ProtectionConfig::for_code_size(200 * KB);
        assert_eq!(config.code_size, 200 * KB);
        assert_eq!(config.max_code_slots, ProtectionConfig::DEFAULT.max_code_slots);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_default_code_size() {
        assert_eq!(ProtectionConfig::default().code_size, REFERENCE_CODE_SIZE);
    }

    #[test]
    fn test_region_window_rules() {
        assert!(RegionWindow { base: 0, size: 1024 * KB }.is_well_formed());
        assert!(!RegionWindow { base: 0, size: 3 * KB }.is_well_formed());
        assert!(!RegionWindow { base: 0, size: 16 }.is_well_formed());
        assert!(!RegionWindow { base: 0x100, size: 1024 }.is_well_formed());
    }

    #[test]
    fn test_guard_size_validated() {
        let mut config = ProtectionConfig::DEFAULT;
        config.guard_size = 48;
        assert_eq!(config.validate(), Err(Error::InvalidRegionSize));
    }

    #[test]
    fn test_hardware_region_count_validated() {
        let mut config = ProtectionConfig::DEFAULT;
        config.hardware_regions = 0;
        assert_eq!(config.validate(), Err(Error::InvalidParameter));

        config.hardware_regions = 16;
        config.max_code_slots = 14;
        assert_eq!(config.validate(), Ok(()));
    }
}
