// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Region sizes available to the code splitter
//!
//! The MPU encodes a region size as `2^(SIZE + 1)` bytes, so only powers of
//! two between 32 bytes and 2 GB are expressible. [`SizeTable`] narrows that
//! down to the sizes the splitter is allowed to try, in the order it tries
//! them.

use chub_common::constants::{
    CODE_REGION_SIZES, MAX_MPU_REGIONS, MPU_MIN_REGION_SIZE, MPU_MIN_SUBDIVIDED_SIZE,
    MPU_SUBREGIONS,
};
use chub_common::{Error, Result};

/// Maximum number of entries in a size table
pub const MAX_TABLE_ENTRIES: usize = MAX_MPU_REGIONS;

/// MPU region size (must be power of 2, minimum 32 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum RegionSize {
    /// 32 bytes
    Size32B = 4,
    /// 64 bytes
    Size64B = 5,
    /// 128 bytes
    Size128B = 6,
    /// 256 bytes
    Size256B = 7,
    /// 512 bytes
    Size512B = 8,
    /// 1 KB
    Size1KB = 9,
    /// 2 KB
    Size2KB = 10,
    /// 4 KB
    Size4KB = 11,
    /// 8 KB
    Size8KB = 12,
    /// 16 KB
    Size16KB = 13,
    /// 32 KB
    Size32KB = 14,
    /// 64 KB
    Size64KB = 15,
    /// 128 KB
    Size128KB = 16,
    /// 256 KB
    Size256KB = 17,
    /// 512 KB
    Size512KB = 18,
    /// 1 MB
    Size1MB = 19,
    /// 2 MB
    Size2MB = 20,
    /// 4 MB
    Size4MB = 21,
    /// 8 MB
    Size8MB = 22,
    /// 16 MB
    Size16MB = 23,
    /// 32 MB
    Size32MB = 24,
    /// 64 MB
    Size64MB = 25,
    /// 128 MB
    Size128MB = 26,
    /// 256 MB
    Size256MB = 27,
    /// 512 MB
    Size512MB = 28,
    /// 1 GB
    Size1GB = 29,
    /// 2 GB
    Size2GB = 30,
}

impl RegionSize {
    /// Get the size in bytes
    #[must_use]
    pub const fn bytes(&self) -> u32 {
        1 << ((*self as u32) + 1)
    }

    /// Value of the RASR SIZE field
    #[must_use]
    pub const fn code(&self) -> u8 {
        *self as u8
    }

    /// Convert a raw SIZE field value to the corresponding region size
    ///
    /// Returns `None` if the code is out of the valid range.
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            4 => Some(Self::Size32B),
            5 => Some(Self::Size64B),
            6 => Some(Self::Size128B),
            7 => Some(Self::Size256B),
            8 => Some(Self::Size512B),
            9 => Some(Self::Size1KB),
            10 => Some(Self::Size2KB),
            11 => Some(Self::Size4KB),
            12 => Some(Self::Size8KB),
            13 => Some(Self::Size16KB),
            14 => Some(Self::Size32KB),
            15 => Some(Self::Size64KB),
            16 => Some(Self::Size128KB),
            17 => Some(Self::Size256KB),
            18 => Some(Self::Size512KB),
            19 => Some(Self::Size1MB),
            20 => Some(Self::Size2MB),
            21 => Some(Self::Size4MB),
            22 => Some(Self::Size8MB),
            23 => Some(Self::Size16MB),
            24 => Some(Self::Size32MB),
            25 => Some(Self::Size64MB),
            26 => Some(Self::Size128MB),
            27 => Some(Self::Size256MB),
            28 => Some(Self::Size512MB),
            29 => Some(Self::Size1GB),
            30 => Some(Self::Size2GB),
            _ => None,
        }
    }

    /// Region size for an exact byte count
    ///
    /// Returns `None` unless `bytes` is a power of two the MPU can encode.
    #[must_use]
    pub const fn from_bytes(bytes: u32) -> Option<Self> {
        if !bytes.is_power_of_two() || bytes < MPU_MIN_REGION_SIZE {
            return None;
        }
        // bytes == 2^(code + 1)
        Self::from_code((bytes.trailing_zeros() - 1) as u8)
    }
}

/// Ordered list of region sizes the splitter may use
///
/// Entries are strictly ascending powers of two. The splitter scans them in
/// this order, so the order is part of the decomposition result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeTable {
    sizes: [u32; MAX_TABLE_ENTRIES],
    len: usize,
    subdivisions: u32,
}

impl SizeTable {
    /// Reference table: 1 KB to 256 KB, eight sub-blocks per region
    pub const REFERENCE: Self = Self::reference();

    const fn reference() -> Self {
        let mut sizes = [0u32; MAX_TABLE_ENTRIES];
        let mut i = 0;
        while i < CODE_REGION_SIZES.len() {
            sizes[i] = CODE_REGION_SIZES[i];
            i += 1;
        }
        Self {
            sizes,
            len: CODE_REGION_SIZES.len(),
            subdivisions: MPU_SUBREGIONS,
        }
    }

    /// Create a validated size table
    ///
    /// # Errors
    /// Returns `InvalidSizeTable` if the table is empty, too long, not
    /// strictly ascending, or if the subdivision count is not 1, 2, 4 or 8.
    /// Returns `InvalidRegionSize` if an entry is not an encodable region
    /// size, or too small to be subdivided.
    pub fn new(sizes: &[u32], subdivisions: u32) -> Result<Self> {
        if sizes.is_empty() || sizes.len() > MAX_TABLE_ENTRIES {
            return Err(Error::InvalidSizeTable);
        }
        if !matches!(subdivisions, 1 | 2 | 4 | 8) {
            return Err(Error::InvalidSizeTable);
        }

        let mut table = Self {
            sizes: [0; MAX_TABLE_ENTRIES],
            len: sizes.len(),
            subdivisions,
        };
        let mut previous = 0;
        for (slot, &size) in table.sizes.iter_mut().zip(sizes) {
            if RegionSize::from_bytes(size).is_none() {
                return Err(Error::InvalidRegionSize);
            }
            if subdivisions > 1 && size < MPU_MIN_SUBDIVIDED_SIZE {
                return Err(Error::InvalidRegionSize);
            }
            if size <= previous {
                return Err(Error::InvalidSizeTable);
            }
            previous = size;
            *slot = size;
        }
        Ok(table)
    }

    /// Same sizes with a different subdivision count
    ///
    /// # Errors
    /// See [`SizeTable::new`].
    pub fn with_subdivisions(&self, subdivisions: u32) -> Result<Self> {
        Self::new(self.sizes(), subdivisions)
    }

    /// Sizes in scan order
    #[must_use]
    pub fn sizes(&self) -> &[u32] {
        &self.sizes[..self.len]
    }

    /// Sub-blocks per region the splitter may use
    #[must_use]
    pub const fn subdivisions(&self) -> u32 {
        self.subdivisions
    }

    /// Size of one usable sub-block of a region
    #[must_use]
    pub const fn sub_block_size(&self, size: u32) -> u32 {
        size / self.subdivisions
    }

    /// Hardware sub-regions covered by one usable sub-block
    #[must_use]
    pub const fn sub_regions_per_block(&self) -> u32 {
        MPU_SUBREGIONS / self.subdivisions
    }

    /// Check whether a size is listed
    #[must_use]
    pub fn contains(&self, size: u32) -> bool {
        self.sizes().contains(&size)
    }

    /// Largest listed size
    #[must_use]
    pub fn largest(&self) -> u32 {
        self.sizes().last().copied().unwrap_or(0)
    }

    /// Listed sizes `address` is aligned to, ascending
    pub fn aligned_at(&self, address: u32) -> impl Iterator<Item = u32> + '_ {
        self.sizes().iter().copied().filter(move |size| address % size == 0)
    }
}

impl Default for SizeTable {
    fn default() -> Self {
        Self::REFERENCE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chub_common::constants::KB;

    #[test]
    fn test_region_size_bytes() {
        assert_eq!(RegionSize::Size32B.bytes(), 32);
        assert_eq!(RegionSize::Size1KB.bytes(), 1024);
        assert_eq!(RegionSize::Size1MB.bytes(), 1024 * 1024);
        assert_eq!(RegionSize::Size2GB.bytes(), 0x8000_0000);
    }

    #[test]
    fn test_region_size_from_bytes() {
        assert_eq!(RegionSize::from_bytes(32), Some(RegionSize::Size32B));
        assert_eq!(RegionSize::from_bytes(256 * KB), Some(RegionSize::Size256KB));
        assert_eq!(RegionSize::from_bytes(100), None);
        assert_eq!(RegionSize::from_bytes(16), None);
        assert_eq!(RegionSize::from_bytes(0), None);
    }

    #[test]
    fn test_reference_table() {
        let table = SizeTable::REFERENCE;
        assert_eq!(table.sizes(), &CODE_REGION_SIZES);
        assert_eq!(table.subdivisions(), 8);
        assert_eq!(table.sub_block_size(256 * KB), 32 * KB);
        assert_eq!(table.largest(), 256 * KB);
    }

    #[test]
    fn test_rejects_unsorted_and_bad_sizes() {
        assert_eq!(SizeTable::new(&[], 8), Err(Error::InvalidSizeTable));
        assert_eq!(SizeTable::new(&[2 * KB, KB], 8), Err(Error::InvalidSizeTable));
        assert_eq!(SizeTable::new(&[KB, KB], 8), Err(Error::InvalidSizeTable));
        assert_eq!(SizeTable::new(&[3 * KB], 8), Err(Error::InvalidRegionSize));
        assert_eq!(SizeTable::new(&[128], 8), Err(Error::InvalidRegionSize));
        assert!(SizeTable::new(&[128], 1).is_ok());
        assert_eq!(SizeTable::new(&[KB], 3), Err(Error::InvalidSizeTable));
    }

    #[test]
    fn test_aligned_sizes() {
        let table = SizeTable::REFERENCE;
        let aligned: heapless::Vec<u32, 16> = table.aligned_at(288 * KB).collect();
        assert_eq!(aligned.as_slice(), &[KB, 2 * KB, 4 * KB, 8 * KB, 16 * KB, 32 * KB]);
        assert_eq!(table.aligned_at(0).count(), 9);
    }

    #[test]
    fn test_sub_regions_per_block() {
        let table = SizeTable::REFERENCE.with_subdivisions(4).unwrap();
        assert_eq!(table.sub_regions_per_block(), 2);
        assert_eq!(table.sub_block_size(64 * KB), 16 * KB);
    }
}
