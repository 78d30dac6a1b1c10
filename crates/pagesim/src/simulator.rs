//! The simulator state and the access dispatcher.

use crate::{
    AccessKind, ConfigError, FrameNumber, FrameTable, MemoryConfig, MemorySwap, PageEntry,
    PageFlags, PageNumber, PageTable, PhysicalMemory, Pid, ProcessTable, Report, SimError,
    Statistics, SwapHandle, SwapStore, TraceEvent, VirtualAddress,
};

/// Frame holding the frame table itself, protected from the moment the system starts.
const FRAME_TABLE_FRAME: FrameNumber = FrameNumber::new(0);

/// A complete simulated machine: physical memory, frame table, processes, swap and
/// statistics.
///
/// The simulator is constructed once per run and driven one event at a time, either
/// through [`Simulator::apply`] or through the individual operations. Every operation
/// runs to completion before returning, so the frame table and page tables are never
/// observed half-updated.
pub struct Simulator<S = MemorySwap> {
    pub(crate) config: MemoryConfig,
    pub(crate) memory: PhysicalMemory,
    pub(crate) frames: FrameTable,
    pub(crate) processes: ProcessTable,
    pub(crate) current: Option<Pid>,
    /// Page table base register of the current process.
    pub(crate) ptbr: Option<FrameNumber>,
    pub(crate) swap: S,
    pub(crate) stats: Statistics,
}

impl Simulator<MemorySwap> {
    /// Creates a simulator backed by an in-memory swap store.
    pub fn new(config: MemoryConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Self::with_swap(config, MemorySwap::new(config.page_size()))
    }
}

impl<S: SwapStore> Simulator<S> {
    /// Creates a simulator backed by the given swap store.
    pub fn with_swap(config: MemoryConfig, swap: S) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut frames = FrameTable::new(config.frame_count());
        frames.reserve(FRAME_TABLE_FRAME, None);

        log::debug!(
            "{} frames of {} bytes, {} pages per process",
            config.frame_count(),
            config.page_size(),
            config.page_count()
        );

        Ok(Self {
            config,
            memory: PhysicalMemory::new(config.physical_size(), config.layout()),
            frames,
            processes: ProcessTable::new(),
            current: None,
            ptbr: None,
            swap,
            stats: Statistics::default(),
        })
    }

    pub fn config(&self) -> &MemoryConfig {
        &self.config
    }

    pub fn statistics(&self) -> &Statistics {
        &self.stats
    }

    /// Computes the report for the run so far.
    pub fn report(&self) -> Report {
        self.stats.compute()
    }

    pub fn frames(&self) -> &FrameTable {
        &self.frames
    }

    pub fn memory(&self) -> &PhysicalMemory {
        &self.memory
    }

    pub fn processes(&self) -> &ProcessTable {
        &self.processes
    }

    pub fn swap(&self) -> &S {
        &self.swap
    }

    pub fn current_process(&self) -> Option<Pid> {
        self.current
    }

    pub fn page_table_base_register(&self) -> Option<FrameNumber> {
        self.ptbr
    }

    /// Returns the page table entry `pid` uses to translate `address`.
    pub fn page_entry(&self, pid: Pid, address: VirtualAddress) -> Option<PageEntry> {
        let page = self.config.layout().page_number(address);
        if page.as_usize() >= self.config.page_count() {
            return None;
        }
        let table = self.page_table_of(pid)?;
        Some(table.entry(&self.memory, page))
    }

    pub(crate) fn page_table_at(&self, base: FrameNumber) -> PageTable {
        PageTable::new(base, self.config.page_count())
    }

    /// Finds the page table of a running process: the PTBR for the current process, the
    /// saved base for everyone else.
    pub(crate) fn page_table_of(&self, pid: Pid) -> Option<PageTable> {
        let base = if self.current == Some(pid) {
            self.ptbr?
        } else {
            self.processes.get(pid)?.saved_page_table_base()
        };
        Some(self.page_table_at(base))
    }

    /// Performs one memory access on behalf of `pid` and returns the byte read, or the
    /// byte written.
    ///
    /// Switches to `pid` first if another process is current. A miss takes a page fault:
    /// a frame is acquired (evicting if necessary) and filled from swap, or with zeroes
    /// if the page was never swapped out.
    pub fn access(
        &mut self,
        pid: Pid,
        kind: AccessKind,
        address: VirtualAddress,
        value: u8,
    ) -> Result<u8, SimError> {
        if !self.processes.contains(pid) {
            return Err(SimError::NotRunning(pid));
        }
        let limit = self.config.virtual_size();
        if address.as_usize() as u64 >= limit {
            return Err(SimError::AddressOutOfRange { address, limit });
        }

        self.context_switch(pid)?;

        let layout = self.config.layout();
        let page = layout.page_number(address);
        let table = self.page_table_of(pid).ok_or(SimError::NotRunning(pid))?;

        let (frame, faulted) = match table.entry(&self.memory, page).frame() {
            Some(frame) => (frame, false),
            None => (self.page_fault(pid, page)?, true),
        };

        table.update(&mut self.memory, page, |entry| {
            entry.set_referenced(true);
            if kind == AccessKind::Write {
                entry.set_dirty(true);
            }
        });
        self.frames.set_referenced(frame, true);

        let addr = layout.physical_address(frame, layout.page_offset(address));
        let result = match kind {
            AccessKind::Read => self.memory.read(addr),
            AccessKind::Write => {
                self.memory.write(addr, value);
                value
            }
        };

        self.stats.record_access(kind, faulted);
        Ok(result)
    }

    /// Brings `page` of `pid` into a frame and maps it.
    fn page_fault(&mut self, pid: Pid, page: PageNumber) -> Result<FrameNumber, SimError> {
        let frame = self.acquire_frame()?;

        let handle = SwapHandle::new(pid, page);
        if self.swap.contains(handle) {
            self.swap.read(handle, self.memory.frame_mut(frame))?;
        } else {
            self.memory.zero_frame(frame);
        }

        let table = self.page_table_of(pid).ok_or(SimError::NotRunning(pid))?;
        table.set_entry(
            &mut self.memory,
            page,
            PageEntry::new(frame, PageFlags::valid()),
        );
        self.frames.mark(frame, pid, page);

        log::trace!("page fault: pid {} page {} -> frame {}", pid, page, frame);
        Ok(frame)
    }

    /// Applies one trace event. Returns the byte observed by an access.
    pub fn apply(&mut self, event: TraceEvent) -> Result<Option<u8>, SimError> {
        match event {
            TraceEvent::Start(pid) => self.start_process(pid).map(|()| None),
            TraceEvent::Stop(pid) => self.stop_process(pid).map(|()| None),
            TraceEvent::Access {
                pid,
                kind,
                address,
                value,
            } => self.access(pid, kind, address, value).map(Some),
        }
    }

    /// Applies every event in order and returns the final report.
    pub fn run(&mut self, events: impl IntoIterator<Item = TraceEvent>) -> Result<Report, SimError> {
        for event in events {
            self.apply(event)?;
        }
        Ok(self.report())
    }

    /// Verifies that the frame table and the page tables agree on every mapping.
    ///
    /// Every unprotected mapped frame must be pointed at by the page table entry it names,
    /// and every valid page table entry must point at a frame that names it back.
    pub fn check_consistency(&self) -> Result<(), SimError> {
        for (frame, entry) in self.frames.iter() {
            if entry.is_protected() {
                continue;
            }
            if let Some((pid, page)) = entry.owner() {
                let table = self.page_table_of(pid).ok_or(SimError::CorruptMapping {
                    frame,
                    reason: "frame owned by a process that is not running",
                })?;
                if table.entry(&self.memory, page).frame() != Some(frame) {
                    return Err(SimError::CorruptMapping {
                        frame,
                        reason: "page table entry does not point back at the frame",
                    });
                }
            }
        }

        for pcb in self.processes.iter() {
            let pid = pcb.pid();
            let table = self
                .page_table_of(pid)
                .ok_or(SimError::NotRunning(pid))?;
            if !self.frames.is_protected(table.base()) {
                return Err(SimError::CorruptMapping {
                    frame: table.base(),
                    reason: "page table frame is not protected",
                });
            }
            for (page, entry) in table.valid_entries(&self.memory) {
                let frame = entry.raw_frame();
                if frame.as_usize() >= self.frames.len()
                    || self.frames.entry(frame).owner() != Some((pid, page))
                {
                    return Err(SimError::CorruptMapping {
                        frame,
                        reason: "frame does not name the page mapped to it",
                    });
                }
            }
        }

        Ok(())
    }
}
