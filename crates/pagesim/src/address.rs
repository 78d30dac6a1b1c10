//! Address types and the address decomposer.
//!
//! Virtual and physical addresses are plain newtypes. How an address splits into a
//! page (or frame) number and an offset depends on the page size chosen when the
//! simulator is configured, so the split is performed by an [`AddressLayout`] rather than
//! by the address types themselves.

use core::fmt;
use core::ops::{Add, Sub};

use crate::{FrameNumber, PageNumber};

/// Macro to define common address type functionality.
///
/// This macro generates the basic structure and methods common to both physical
/// and virtual address types.
macro_rules! impl_address_common {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[repr(transparent)]
        pub struct $name(usize);

        impl $name {
            /// Creates a new address.
            #[inline]
            pub const fn new(addr: usize) -> Self {
                Self(addr)
            }

            /// Returns the raw address value.
            #[inline]
            pub const fn as_usize(self) -> usize {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({:#x})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{:#07x}", self.0)
            }
        }

        impl From<u32> for $name {
            #[inline]
            fn from(addr: u32) -> Self {
                Self(addr as usize)
            }
        }

        impl From<usize> for $name {
            #[inline]
            fn from(addr: usize) -> Self {
                Self(addr)
            }
        }

        impl Add<usize> for $name {
            type Output = Self;

            #[inline]
            fn add(self, rhs: usize) -> Self::Output {
                Self(self.0 + rhs)
            }
        }

        impl Sub<$name> for $name {
            type Output = usize;

            #[inline]
            fn sub(self, rhs: $name) -> Self::Output {
                self.0 - rhs.0
            }
        }
    };
}

impl_address_common!(
    PhysicalAddress,
    "A physical memory address.\n\n\
     Indexes directly into the simulated physical memory."
);

impl_address_common!(
    VirtualAddress,
    "A virtual memory address.\n\n\
     Only meaningful relative to the page table of the process that issued it."
);

/// Splits addresses into page/frame numbers and offsets.
///
/// Pages and frames have the same size, `1 << offset_bits` bytes, so a single layout
/// serves both the virtual and the physical side:
///
/// ```
/// use pagesim::{AddressLayout, FrameNumber, PageNumber, VirtualAddress};
///
/// let layout = AddressLayout::new(12);
/// let addr = VirtualAddress::new(0x12345);
/// assert_eq!(layout.page_number(addr), PageNumber::new(0x12));
/// assert_eq!(layout.page_offset(addr), 0x345);
///
/// let phys = layout.physical_address(FrameNumber::new(3), 0x10);
/// assert_eq!(phys.as_usize(), 0x3010);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressLayout {
    offset_bits: u32,
}

impl AddressLayout {
    /// Creates a layout with pages of `1 << offset_bits` bytes.
    pub const fn new(offset_bits: u32) -> Self {
        Self { offset_bits }
    }

    /// Returns the number of address bits used for the offset within a page.
    #[inline]
    pub const fn offset_bits(self) -> u32 {
        self.offset_bits
    }

    /// Returns the page (and frame) size in bytes.
    #[inline]
    pub const fn page_size(self) -> usize {
        1 << self.offset_bits
    }

    #[inline]
    const fn offset_mask(self) -> usize {
        self.page_size() - 1
    }

    /// Returns the virtual page number containing `addr`.
    #[inline]
    pub const fn page_number(self, addr: VirtualAddress) -> PageNumber {
        PageNumber::new(addr.as_usize() >> self.offset_bits)
    }

    /// Returns the offset of `addr` within its virtual page.
    #[inline]
    pub const fn page_offset(self, addr: VirtualAddress) -> usize {
        addr.as_usize() & self.offset_mask()
    }

    /// Returns the physical frame number containing `addr`.
    #[inline]
    pub const fn frame_number(self, addr: PhysicalAddress) -> FrameNumber {
        FrameNumber::new(addr.as_usize() >> self.offset_bits)
    }

    /// Returns the offset of `addr` within its physical frame.
    #[inline]
    pub const fn frame_offset(self, addr: PhysicalAddress) -> usize {
        addr.as_usize() & self.offset_mask()
    }

    /// Composes a physical address from a frame number and an offset within that frame.
    #[inline]
    pub const fn physical_address(self, frame: FrameNumber, offset: usize) -> PhysicalAddress {
        PhysicalAddress::new((frame.as_usize() << self.offset_bits) | (offset & self.offset_mask()))
    }

    /// Composes a virtual address from a page number and an offset within that page.
    #[inline]
    pub const fn virtual_address(self, page: PageNumber, offset: usize) -> VirtualAddress {
        VirtualAddress::new((page.as_usize() << self.offset_bits) | (offset & self.offset_mask()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_virtual_address() {
        let layout = AddressLayout::new(12);
        let addr = VirtualAddress::new(0xABCDE);

        assert_eq!(layout.page_number(addr), PageNumber::new(0xAB));
        assert_eq!(layout.page_offset(addr), 0xCDE);
    }

    #[test]
    fn splits_physical_address() {
        let layout = AddressLayout::new(4);
        let addr = PhysicalAddress::new(0x123);

        assert_eq!(layout.frame_number(addr), FrameNumber::new(0x12));
        assert_eq!(layout.frame_offset(addr), 0x3);
    }

    #[test]
    fn composes_addresses() {
        let layout = AddressLayout::new(12);

        let phys = layout.physical_address(FrameNumber::new(0xF), 0x7FF);
        assert_eq!(phys, PhysicalAddress::new(0xF7FF));
        assert_eq!(layout.frame_number(phys), FrameNumber::new(0xF));
        assert_eq!(layout.frame_offset(phys), 0x7FF);

        let virt = layout.virtual_address(PageNumber::new(2), 0x10);
        assert_eq!(virt, VirtualAddress::new(0x2010));
    }

    #[test]
    fn offset_is_masked_when_composing() {
        let layout = AddressLayout::new(4);
        let phys = layout.physical_address(FrameNumber::new(1), 0x1F);
        assert_eq!(phys, PhysicalAddress::new(0x1F));
    }

    #[test]
    fn page_size() {
        assert_eq!(AddressLayout::new(12).page_size(), 4096);
        assert_eq!(AddressLayout::new(4).page_size(), 16);
    }

    #[test]
    fn display_pads_to_five_digits() {
        assert_eq!(format!("{}", VirtualAddress::new(0xAB)), "0x000ab");
        assert_eq!(format!("{:?}", PhysicalAddress::new(0x10)), "PhysicalAddress(0x10)");
    }
}
