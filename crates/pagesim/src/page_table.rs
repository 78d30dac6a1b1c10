//! Per-process page tables.
//!
//! A page table is not a Rust object holding entries; it is a protected frame of
//! physical memory holding packed [`PageEntry`] values, exactly as the paging hardware
//! would see it. [`PageTable`] is a small handle (the base frame plus the entry count)
//! that knows how to find entries inside that frame.

use crate::{FrameNumber, PageEntry, PageNumber, PhysicalAddress, PhysicalMemory};

/// Handle to a page table resident in physical memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageTable {
    base: FrameNumber,
    entries: usize,
}

impl PageTable {
    /// Creates a handle to the page table stored in frame `base`, holding `entries` entries.
    pub const fn new(base: FrameNumber, entries: usize) -> Self {
        Self { base, entries }
    }

    /// Returns the frame holding this page table.
    pub const fn base(&self) -> FrameNumber {
        self.base
    }

    /// Returns the number of entries in this page table.
    pub const fn len(&self) -> usize {
        self.entries
    }

    fn entry_address(&self, memory: &PhysicalMemory, page: PageNumber) -> PhysicalAddress {
        assert!(
            page.as_usize() < self.entries,
            "page number out of page table bounds"
        );
        memory
            .layout()
            .physical_address(self.base, page.as_usize() * PageEntry::SIZE)
    }

    /// Returns the entry for `page`.
    ///
    /// # Panics
    /// Panics if `page` is outside the table.
    pub fn entry(&self, memory: &PhysicalMemory, page: PageNumber) -> PageEntry {
        PageEntry::from_u32(memory.read_u32(self.entry_address(memory, page)))
    }

    /// Overwrites the entry for `page`.
    ///
    /// # Panics
    /// Panics if `page` is outside the table.
    pub fn set_entry(&self, memory: &mut PhysicalMemory, page: PageNumber, entry: PageEntry) {
        let addr = self.entry_address(memory, page);
        memory.write_u32(addr, entry.as_u32());
    }

    /// Applies `f` to the entry for `page`, writes it back, and returns the new value.
    pub fn update(
        &self,
        memory: &mut PhysicalMemory,
        page: PageNumber,
        f: impl FnOnce(&mut PageEntry),
    ) -> PageEntry {
        let mut entry = self.entry(memory, page);
        f(&mut entry);
        self.set_entry(memory, page, entry);
        entry
    }

    /// Invalidates every entry by zeroing the table's frame.
    pub fn clear(&self, memory: &mut PhysicalMemory) {
        memory.zero_frame(self.base);
    }

    /// Iterates over the valid entries of the table, in page order.
    pub fn valid_entries(
        self,
        memory: &PhysicalMemory,
    ) -> impl Iterator<Item = (PageNumber, PageEntry)> + '_ {
        PageNumber::range(self.entries)
            .map(move |page| (page, self.entry(memory, page)))
            .filter(|(_, entry)| entry.is_valid())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AddressLayout, PageFlags};

    fn setup() -> (PhysicalMemory, PageTable) {
        // 64 byte frames hold 16 entries.
        let memory = PhysicalMemory::new(4 * 64, AddressLayout::new(6));
        let table = PageTable::new(FrameNumber::new(2), 16);
        (memory, table)
    }

    #[test]
    fn new_table_is_empty() {
        let (memory, table) = setup();
        assert_eq!(table.valid_entries(&memory).count(), 0);
        assert!(!table.entry(&memory, PageNumber::new(15)).is_valid());
    }

    #[test]
    fn entries_are_stored_in_the_base_frame() {
        let (mut memory, table) = setup();
        let entry = PageEntry::new(FrameNumber::new(3), PageFlags::valid());

        table.set_entry(&mut memory, PageNumber::new(1), entry);

        assert_eq!(table.entry(&memory, PageNumber::new(1)), entry);
        // Entry 1 sits four bytes into frame 2.
        assert_eq!(memory.frame(FrameNumber::new(2))[4], 0x01);
        assert_eq!(memory.frame(FrameNumber::new(2))[6], 0x03);
        assert!(memory.frame(FrameNumber::new(1)).iter().all(|&b| b == 0));
    }

    #[test]
    fn update_writes_back() {
        let (mut memory, table) = setup();
        table.set_entry(
            &mut memory,
            PageNumber::new(7),
            PageEntry::new(FrameNumber::new(1), PageFlags::valid()),
        );

        let updated = table.update(&mut memory, PageNumber::new(7), |entry| {
            entry.set_dirty(true)
        });

        assert!(updated.is_dirty());
        assert!(table.entry(&memory, PageNumber::new(7)).is_dirty());
    }

    #[test]
    fn valid_entries_skips_invalid() {
        let (mut memory, table) = setup();
        let mut stale = PageEntry::new(FrameNumber::new(1), PageFlags::valid());
        stale.set_valid(false);
        table.set_entry(&mut memory, PageNumber::new(2), stale);
        table.set_entry(
            &mut memory,
            PageNumber::new(9),
            PageEntry::new(FrameNumber::new(3), PageFlags::valid()),
        );

        let pages: Vec<_> = table
            .valid_entries(&memory)
            .map(|(page, _)| page)
            .collect();
        assert_eq!(pages, [PageNumber::new(9)]);
    }

    #[test]
    fn clear_invalidates_everything() {
        let (mut memory, table) = setup();
        for page in PageNumber::range(16) {
            table.set_entry(
                &mut memory,
                page,
                PageEntry::new(FrameNumber::new(1), PageFlags::valid()),
            );
        }

        table.clear(&mut memory);

        assert_eq!(table.valid_entries(&memory).count(), 0);
    }

    #[test]
    #[should_panic(expected = "page number out of page table bounds")]
    fn rejects_pages_past_the_end() {
        let (memory, table) = setup();
        table.entry(&memory, PageNumber::new(16));
    }
}
