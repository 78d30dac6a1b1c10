use crate::{FrameNumber, PageNumber, Pid};

/// State bits of a physical frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FrameFlag {
    /// Frame is in use, either by a page or by the paging subsystem.
    Mapped = 1 << 0,
    /// Frame belongs to the paging subsystem and must never be evicted.
    Protected = 1 << 1,
    /// Frame was accessed since the clock sweep last passed it.
    Referenced = 1 << 2,
}

/// Flags for a physical frame.
///
/// The simulator owns its frame table exclusively, so these are plain bits rather than
/// atomics; every mutation goes through `&mut`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameFlags(u8);

impl FrameFlags {
    /// Creates a new `FrameFlags` instance with all flags cleared.
    pub const fn new() -> Self {
        Self(0)
    }

    /// Sets the given flag.
    pub fn set(&mut self, flag: FrameFlag) {
        self.0 |= flag as u8;
    }

    /// Clears the given flag.
    pub fn clear(&mut self, flag: FrameFlag) {
        self.0 &= !(flag as u8);
    }

    /// Sets or clears the given flag.
    pub fn assign(&mut self, flag: FrameFlag, on: bool) {
        if on {
            self.set(flag);
        } else {
            self.clear(flag);
        }
    }

    /// Tests if the given flag is set.
    pub fn test(self, flag: FrameFlag) -> bool {
        (self.0 & flag as u8) != 0
    }
}

/// Metadata for a physical frame.
///
/// The owning process is a back-reference by pid, looked up in the process table when
/// needed. A frame never keeps a process alive.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameTableEntry {
    /// Flags identifying the state of this frame.
    pub flags: FrameFlags,
    process: Option<Pid>,
    page: PageNumber,
}

impl FrameTableEntry {
    pub fn is_mapped(&self) -> bool {
        self.flags.test(FrameFlag::Mapped)
    }

    pub fn is_protected(&self) -> bool {
        self.flags.test(FrameFlag::Protected)
    }

    pub fn is_referenced(&self) -> bool {
        self.flags.test(FrameFlag::Referenced)
    }

    /// Returns the process using this frame, whether for a page or for its page table.
    pub fn process(&self) -> Option<Pid> {
        self.process
    }

    /// Returns the (process, page) pair cached in this frame.
    ///
    /// Protected frames hold paging structures rather than pages and never have an owner
    /// in this sense.
    pub fn owner(&self) -> Option<(Pid, PageNumber)> {
        if self.is_mapped() && !self.is_protected() {
            self.process.map(|pid| (pid, self.page))
        } else {
            None
        }
    }
}

/// Fixed-size table of frame metadata, indexed by [`FrameNumber`].
///
/// The table only records state; choosing which frame to use is the replacement
/// engine's job.
pub struct FrameTable {
    entries: Box<[FrameTableEntry]>,
}

impl FrameTable {
    /// Creates a table of `count` free frames.
    pub fn new(count: usize) -> Self {
        Self {
            entries: vec![FrameTableEntry::default(); count].into_boxed_slice(),
        }
    }

    /// Returns the number of frames.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns the metadata for `frame`.
    pub fn entry(&self, frame: FrameNumber) -> &FrameTableEntry {
        &self.entries[frame.as_usize()]
    }

    fn entry_mut(&mut self, frame: FrameNumber) -> &mut FrameTableEntry {
        &mut self.entries[frame.as_usize()]
    }

    /// Iterates over all frames in index order.
    pub fn iter(&self) -> impl Iterator<Item = (FrameNumber, &FrameTableEntry)> {
        self.entries
            .iter()
            .enumerate()
            .map(|(index, entry)| (FrameNumber::new(index), entry))
    }

    /// Returns whether `frame` can be handed out without evicting anything.
    pub fn is_free(&self, frame: FrameNumber) -> bool {
        let entry = self.entry(frame);
        !entry.is_mapped() && !entry.is_protected()
    }

    pub fn is_protected(&self, frame: FrameNumber) -> bool {
        self.entry(frame).is_protected()
    }

    /// Records that `frame` caches `page` of process `pid`.
    pub fn mark(&mut self, frame: FrameNumber, pid: Pid, page: PageNumber) {
        let entry = self.entry_mut(frame);
        entry.flags.set(FrameFlag::Mapped);
        entry.process = Some(pid);
        entry.page = page;
    }

    /// Releases `frame` from the page it cached.
    pub fn unmark(&mut self, frame: FrameNumber) {
        let entry = self.entry_mut(frame);
        entry.flags.clear(FrameFlag::Mapped);
        entry.process = None;
    }

    pub fn set_referenced(&mut self, frame: FrameNumber, referenced: bool) {
        self.entry_mut(frame)
            .flags
            .assign(FrameFlag::Referenced, referenced);
    }

    /// Takes `frame` for the paging subsystem: mapped and protected from eviction.
    ///
    /// `process` names the process whose page table lives there, if any.
    pub fn reserve(&mut self, frame: FrameNumber, process: Option<Pid>) {
        let entry = self.entry_mut(frame);
        entry.flags.set(FrameFlag::Mapped);
        entry.flags.set(FrameFlag::Protected);
        entry.process = process;
        entry.page = PageNumber::default();
    }

    /// Returns a reserved frame to the pool of free frames.
    pub fn release(&mut self, frame: FrameNumber) {
        let entry = self.entry_mut(frame);
        entry.flags.clear(FrameFlag::Protected);
        entry.flags.clear(FrameFlag::Mapped);
        entry.process = None;
    }

    /// Returns the lowest-numbered free frame.
    pub fn first_free(&self) -> Option<FrameNumber> {
        FrameNumber::range(self.len()).find(|&frame| self.is_free(frame))
    }

    /// Returns the lowest-numbered frame that may be evicted.
    pub fn first_unprotected(&self) -> Option<FrameNumber> {
        FrameNumber::range(self.len()).find(|&frame| !self.is_protected(frame))
    }

    /// Returns the number of frames currently in use.
    pub fn mapped_count(&self) -> usize {
        self.entries.iter().filter(|entry| entry.is_mapped()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PID: Pid = Pid::new(1);

    #[test]
    fn new_table_is_free() {
        let table = FrameTable::new(4);
        assert_eq!(table.len(), 4);
        assert!(FrameNumber::range(4).all(|frame| table.is_free(frame)));
        assert_eq!(table.first_free(), Some(FrameNumber::new(0)));
        assert_eq!(table.mapped_count(), 0);
    }

    #[test]
    fn mark_and_unmark() {
        let mut table = FrameTable::new(4);
        let frame = FrameNumber::new(2);

        table.mark(frame, PID, PageNumber::new(7));
        assert!(!table.is_free(frame));
        assert_eq!(table.entry(frame).owner(), Some((PID, PageNumber::new(7))));

        table.unmark(frame);
        assert!(table.is_free(frame));
        assert_eq!(table.entry(frame).owner(), None);
    }

    #[test]
    fn reserved_frames_have_no_page_owner() {
        let mut table = FrameTable::new(4);
        let frame = FrameNumber::new(1);

        table.reserve(frame, Some(PID));

        assert!(table.is_protected(frame));
        assert!(!table.is_free(frame));
        assert_eq!(table.entry(frame).process(), Some(PID));
        assert_eq!(table.entry(frame).owner(), None);

        table.release(frame);
        assert!(table.is_free(frame));
        assert!(!table.is_protected(frame));
    }

    #[test]
    fn first_free_prefers_lowest_index() {
        let mut table = FrameTable::new(4);
        table.reserve(FrameNumber::new(0), None);
        table.mark(FrameNumber::new(1), PID, PageNumber::new(0));

        assert_eq!(table.first_free(), Some(FrameNumber::new(2)));
        assert_eq!(table.first_unprotected(), Some(FrameNumber::new(1)));
    }

    #[test]
    fn first_unprotected_none_when_all_protected() {
        let mut table = FrameTable::new(2);
        table.reserve(FrameNumber::new(0), None);
        table.reserve(FrameNumber::new(1), Some(PID));

        assert_eq!(table.first_free(), None);
        assert_eq!(table.first_unprotected(), None);
    }

    #[test]
    fn referenced_bit() {
        let mut table = FrameTable::new(2);
        let frame = FrameNumber::new(1);

        table.set_referenced(frame, true);
        assert!(table.entry(frame).is_referenced());
        table.set_referenced(frame, false);
        assert!(!table.entry(frame).is_referenced());
    }
}
