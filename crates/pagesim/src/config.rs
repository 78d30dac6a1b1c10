//! Memory geometry for a simulation run.

use crate::{AddressLayout, ConfigError, PageEntry};

/// Default page offset width (4 KiB pages).
pub const DEFAULT_OFFSET_BITS: u32 = 12;

/// Default virtual address width (1 MiB address space, 256 pages).
pub const DEFAULT_VIRTUAL_BITS: u32 = 20;

/// Default physical address width (64 KiB of memory, 16 frames).
pub const DEFAULT_PHYSICAL_BITS: u32 = 16;

const MAX_OFFSET_BITS: u32 = 16;
const MAX_VIRTUAL_BITS: u32 = 32;

/// Frame 0 holds the frame table; one page table and one data page need the rest.
const MIN_FRAMES: usize = 3;

/// Page table entries store the frame number in 16 bits.
const MAX_FRAMES: usize = 1 << 16;

/// Sizes of the simulated machine.
///
/// A configuration is plain data until it is handed to the simulator, which calls
/// [`MemoryConfig::validate`] before allocating anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryConfig {
    offset_bits: u32,
    virtual_bits: u32,
    physical_size: usize,
}

impl MemoryConfig {
    /// Creates a configuration from address widths in bits.
    pub const fn new(offset_bits: u32, virtual_bits: u32, physical_bits: u32) -> Self {
        let physical_size = match 1usize.checked_shl(physical_bits) {
            Some(size) => size,
            None => 0,
        };
        Self {
            offset_bits,
            virtual_bits,
            physical_size,
        }
    }

    /// Replaces the physical memory size with exactly `frames` page-sized frames.
    ///
    /// An out-of-range offset width yields an empty memory, which [`Self::validate`] rejects.
    pub const fn with_frame_count(self, frames: usize) -> Self {
        let physical_size = match 1usize.checked_shl(self.offset_bits) {
            Some(page_size) => frames.saturating_mul(page_size),
            None => 0,
        };
        Self {
            physical_size,
            ..self
        }
    }

    /// Returns the page offset width in bits.
    pub const fn offset_bits(&self) -> u32 {
        self.offset_bits
    }

    /// Returns the virtual address width in bits.
    pub const fn virtual_bits(&self) -> u32 {
        self.virtual_bits
    }

    /// Returns the physical memory size in bytes.
    pub const fn physical_size(&self) -> usize {
        self.physical_size
    }

    /// Returns the address layout shared by virtual and physical addresses.
    pub const fn layout(&self) -> AddressLayout {
        AddressLayout::new(self.offset_bits)
    }

    /// Returns the page (and frame) size in bytes.
    pub const fn page_size(&self) -> usize {
        self.layout().page_size()
    }

    /// Returns the number of physical frames.
    pub const fn frame_count(&self) -> usize {
        self.physical_size >> self.offset_bits
    }

    /// Returns the number of virtual pages per process, which is also the number of
    /// entries in each page table.
    pub const fn page_count(&self) -> usize {
        1 << self.virtual_bits.saturating_sub(self.offset_bits)
    }

    /// Returns the size of a process's virtual address space in bytes.
    pub const fn virtual_size(&self) -> u64 {
        1 << self.virtual_bits
    }

    /// Returns the number of bytes a page table occupies in its frame.
    pub const fn page_table_size(&self) -> usize {
        self.page_count() * PageEntry::SIZE
    }

    /// Checks that the geometry describes a machine the simulator can run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.offset_bits == 0 || self.offset_bits > MAX_OFFSET_BITS {
            return Err(ConfigError::InvalidOffsetBits(self.offset_bits));
        }

        if self.virtual_bits <= self.offset_bits || self.virtual_bits > MAX_VIRTUAL_BITS {
            return Err(ConfigError::InvalidVirtualBits {
                virtual_bits: self.virtual_bits,
                offset_bits: self.offset_bits,
            });
        }

        let page_size = self.page_size();
        if self.physical_size % page_size != 0 {
            return Err(ConfigError::UnalignedMemorySize {
                size: self.physical_size,
                page_size,
            });
        }

        let frames = self.frame_count();
        if frames < MIN_FRAMES {
            return Err(ConfigError::TooFewFrames(frames));
        }
        if frames > MAX_FRAMES {
            return Err(ConfigError::TooManyFrames(frames));
        }

        let table_size = self.page_table_size();
        if table_size > page_size {
            return Err(ConfigError::PageTableTooLarge {
                table_size,
                page_size,
            });
        }

        Ok(())
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self::new(
            DEFAULT_OFFSET_BITS,
            DEFAULT_VIRTUAL_BITS,
            DEFAULT_PHYSICAL_BITS,
        )
    }
}
