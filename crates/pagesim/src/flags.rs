//! Page table entry flags.

/// Page table entry flags.
///
/// Only the three bits the paging subsystem consults are modelled; there are no
/// permission bits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageFlags(u32);

impl PageFlags {
    /// Valid bit (bit 0): the entry maps a resident frame.
    const VALID: u32 = 1 << 0;

    /// Dirty bit (bit 1): the resident copy differs from swap.
    const DIRTY: u32 = 1 << 1;

    /// Referenced bit (bit 2): mirrors the frame table's reference bit.
    const REFERENCED: u32 = 1 << 2;

    /// Mask of all defined flag bits.
    pub(crate) const MASK: u32 = Self::VALID | Self::DIRTY | Self::REFERENCED;

    /// Creates empty flags (entry not valid).
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Creates flags for a freshly loaded page: valid, clean, unreferenced.
    pub const fn valid() -> Self {
        Self(Self::VALID)
    }

    /// Creates flags from a raw value, discarding undefined bits.
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw & Self::MASK)
    }

    /// Returns the raw value of these flags.
    pub const fn to_raw(self) -> u32 {
        self.0
    }

    pub fn is_valid(self) -> bool {
        (self.0 & Self::VALID) != 0
    }

    pub fn set_valid(&mut self, valid: bool) {
        self.assign(Self::VALID, valid);
    }

    pub fn is_dirty(self) -> bool {
        (self.0 & Self::DIRTY) != 0
    }

    pub fn set_dirty(&mut self, dirty: bool) {
        self.assign(Self::DIRTY, dirty);
    }

    pub fn is_referenced(self) -> bool {
        (self.0 & Self::REFERENCED) != 0
    }

    pub fn set_referenced(&mut self, referenced: bool) {
        self.assign(Self::REFERENCED, referenced);
    }

    fn assign(&mut self, bit: u32, on: bool) {
        if on {
            self.0 |= bit;
        } else {
            self.0 &= !bit;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bits_are_independent() {
        let mut flags = PageFlags::empty();
        flags.set_dirty(true);
        flags.set_referenced(true);

        assert!(!flags.is_valid());
        assert!(flags.is_dirty());
        assert!(flags.is_referenced());

        flags.set_dirty(false);
        assert!(!flags.is_dirty());
        assert!(flags.is_referenced());
    }

    #[test]
    fn from_raw_drops_unknown_bits() {
        assert_eq!(PageFlags::from_raw(0xFF).to_raw(), 0x7);
    }
}
