//! Processes and the context manager.
//!
//! Each running process owns exactly one page table, stored in a protected frame. The
//! simulator keeps one page table base register (PTBR) pointing at the current process's
//! table; switching processes saves the register into the outgoing process's control
//! block and loads the incoming one's.

use core::fmt;
use std::collections::BTreeMap;

use crate::{FrameNumber, PageNumber, SimError, Simulator, SwapHandle, SwapStore};

/// A process identifier.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Pid(u32);

impl Pid {
    pub const fn new(pid: u32) -> Self {
        Self(pid)
    }

    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pid({})", self.0)
    }
}

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for Pid {
    fn from(pid: u32) -> Self {
        Self(pid)
    }
}

/// Per-process state kept by the context manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessControlBlock {
    pid: Pid,
    saved_page_table_base: FrameNumber,
}

impl ProcessControlBlock {
    pub(crate) const fn new(pid: Pid, page_table_base: FrameNumber) -> Self {
        Self {
            pid,
            saved_page_table_base: page_table_base,
        }
    }

    pub fn pid(&self) -> Pid {
        self.pid
    }

    /// Returns the frame holding this process's page table, as last saved.
    ///
    /// Page tables never move, so the saved value stays accurate while the process is
    /// current; the PTBR is still the authoritative copy at that time.
    pub fn saved_page_table_base(&self) -> FrameNumber {
        self.saved_page_table_base
    }
}

/// The set of running processes, keyed by pid.
#[derive(Debug, Default)]
pub struct ProcessTable {
    processes: BTreeMap<Pid, ProcessControlBlock>,
}

impl ProcessTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, pid: Pid) -> Option<&ProcessControlBlock> {
        self.processes.get(&pid)
    }

    pub(crate) fn get_mut(&mut self, pid: Pid) -> Option<&mut ProcessControlBlock> {
        self.processes.get_mut(&pid)
    }

    pub fn contains(&self, pid: Pid) -> bool {
        self.processes.contains_key(&pid)
    }

    pub(crate) fn insert(&mut self, pcb: ProcessControlBlock) {
        self.processes.insert(pcb.pid, pcb);
    }

    pub(crate) fn remove(&mut self, pid: Pid) -> Option<ProcessControlBlock> {
        self.processes.remove(&pid)
    }

    pub fn len(&self) -> usize {
        self.processes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }

    /// Iterates over running processes in pid order.
    pub fn iter(&self) -> impl Iterator<Item = &ProcessControlBlock> {
        self.processes.values()
    }
}

impl<S: SwapStore> Simulator<S> {
    /// Starts process `pid` with an empty page table.
    ///
    /// The page table takes a frame like any page would, which may evict another page.
    /// That frame is then protected for the lifetime of the process.
    pub fn start_process(&mut self, pid: Pid) -> Result<(), SimError> {
        if self.processes.contains(pid) {
            return Err(SimError::AlreadyRunning(pid));
        }

        let base = self.acquire_frame()?;
        self.frames.reserve(base, Some(pid));
        self.page_table_at(base).clear(&mut self.memory);
        self.processes.insert(ProcessControlBlock::new(pid, base));

        log::debug!("process {} started, page table in frame {}", pid, base);
        Ok(())
    }

    /// Makes `pid` the current process, loading its page table base into the PTBR.
    ///
    /// Does nothing if `pid` is already current.
    pub fn context_switch(&mut self, pid: Pid) -> Result<(), SimError> {
        if self.current == Some(pid) {
            return Ok(());
        }

        let incoming = self
            .processes
            .get(pid)
            .ok_or(SimError::NotRunning(pid))?
            .saved_page_table_base();

        if let (Some(outgoing), Some(ptbr)) = (self.current, self.ptbr) {
            if let Some(pcb) = self.processes.get_mut(outgoing) {
                pcb.saved_page_table_base = ptbr;
            }
        }

        log::trace!(
            "context switch {:?} -> {}, PTBR = frame {}",
            self.current,
            pid,
            incoming
        );
        self.ptbr = Some(incoming);
        self.current = Some(pid);
        Ok(())
    }

    /// Stops process `pid`, releasing its frames, swap slots and page table.
    ///
    /// Page contents are not preserved: a later process with the same pid starts from a
    /// zeroed address space.
    pub fn stop_process(&mut self, pid: Pid) -> Result<(), SimError> {
        let table = self.page_table_of(pid).ok_or(SimError::NotRunning(pid))?;

        for (_, entry) in table.valid_entries(&self.memory) {
            if let Some(frame) = entry.frame() {
                self.frames.unmark(frame);
            }
        }
        for page in PageNumber::range(table.len()) {
            self.swap.free(SwapHandle::new(pid, page));
        }

        table.clear(&mut self.memory);
        self.frames.release(table.base());
        self.processes.remove(pid);

        if self.current == Some(pid) {
            self.current = None;
            self.ptbr = None;
        }

        log::debug!("process {} stopped", pid);
        Ok(())
    }
}
