//! Page table entries.

use crate::{FrameNumber, PageFlags};

/// A single page table entry.
///
/// Entries are stored packed in the page table's frame, four bytes each, little endian:
/// - Bits 0-2: Flags (valid, dirty, referenced)
/// - Bits 3-15: Reserved (zero)
/// - Bits 16-31: Frame number
///
/// A zeroed entry is invalid, so clearing a frame yields an empty page table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[repr(transparent)]
pub struct PageEntry(u32);

impl PageEntry {
    /// Size of an entry in bytes.
    pub const SIZE: usize = 4;

    const FRAME_SHIFT: u32 = 16;

    /// Creates an entry pointing at `frame` with the given flags.
    ///
    /// # Panics
    /// Panics if the frame number does not fit in 16 bits.
    pub fn new(frame: FrameNumber, flags: PageFlags) -> Self {
        let frame = u16::try_from(frame.as_usize()).expect("frame number exceeds 16 bits");
        Self(((frame as u32) << Self::FRAME_SHIFT) | flags.to_raw())
    }

    /// Returns the mapped frame, or `None` if the entry is not valid.
    pub fn frame(self) -> Option<FrameNumber> {
        if self.is_valid() {
            Some(self.raw_frame())
        } else {
            None
        }
    }

    /// Returns the stored frame number regardless of the valid bit.
    pub fn raw_frame(self) -> FrameNumber {
        FrameNumber::new((self.0 >> Self::FRAME_SHIFT) as usize)
    }

    /// Returns the flags for this entry.
    pub fn flags(self) -> PageFlags {
        PageFlags::from_raw(self.0)
    }

    /// Sets the flags for this entry, preserving the frame number.
    pub fn set_flags(&mut self, flags: PageFlags) {
        self.0 = (self.0 & !PageFlags::MASK) | flags.to_raw();
    }

    pub fn is_valid(self) -> bool {
        self.flags().is_valid()
    }

    pub fn is_dirty(self) -> bool {
        self.flags().is_dirty()
    }

    pub fn is_referenced(self) -> bool {
        self.flags().is_referenced()
    }

    pub fn set_valid(&mut self, valid: bool) {
        let mut flags = self.flags();
        flags.set_valid(valid);
        self.set_flags(flags);
    }

    pub fn set_dirty(&mut self, dirty: bool) {
        let mut flags = self.flags();
        flags.set_dirty(dirty);
        self.set_flags(flags);
    }

    pub fn set_referenced(&mut self, referenced: bool) {
        let mut flags = self.flags();
        flags.set_referenced(referenced);
        self.set_flags(flags);
    }

    /// Returns the raw encoded value.
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// Creates an entry from a raw encoded value.
    pub const fn from_u32(value: u32) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zeroed_entry_is_invalid() {
        let entry = PageEntry::default();
        assert!(!entry.is_valid());
        assert_eq!(entry.frame(), None);
    }

    #[test]
    fn encodes_frame_and_flags() {
        let entry = PageEntry::new(FrameNumber::new(0xBEEF), PageFlags::valid());

        assert_eq!(entry.as_u32(), 0xBEEF_0001);
        assert_eq!(entry.frame(), Some(FrameNumber::new(0xBEEF)));
        assert!(!entry.is_dirty());
    }

    #[test]
    fn invalidating_keeps_frame_bits() {
        let mut entry = PageEntry::new(FrameNumber::new(5), PageFlags::valid());
        entry.set_dirty(true);
        entry.set_valid(false);

        assert_eq!(entry.frame(), None);
        assert_eq!(entry.raw_frame(), FrameNumber::new(5));
        assert!(entry.is_dirty());
    }

    #[test]
    fn flag_updates_preserve_frame() {
        let mut entry = PageEntry::new(FrameNumber::new(9), PageFlags::valid());
        entry.set_referenced(true);
        entry.set_dirty(true);

        assert_eq!(entry.frame(), Some(FrameNumber::new(9)));
        assert!(entry.is_referenced());
        assert!(entry.is_dirty());
        assert_eq!(PageEntry::from_u32(entry.as_u32()), entry);
    }

    #[test]
    #[should_panic(expected = "frame number exceeds 16 bits")]
    fn rejects_wide_frame_numbers() {
        PageEntry::new(FrameNumber::new(1 << 16), PageFlags::valid());
    }
}
