//! Swap storage for evicted pages.

use std::collections::HashMap;
use std::fmt;

use crate::{PageNumber, Pid, SwapError};

/// Identifies the swap slot of one page of one process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SwapHandle {
    pub pid: Pid,
    pub page: PageNumber,
}

impl SwapHandle {
    pub const fn new(pid: Pid, page: PageNumber) -> Self {
        Self { pid, page }
    }
}

impl fmt::Display for SwapHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pid {} page {}", self.pid, self.page)
    }
}

/// Backing store for page contents that no longer fit in physical memory.
///
/// Implement this trait to back the simulator with something other than host memory.
/// A slot exists from the first write of its handle until it is freed; reading a
/// missing slot is an error.
pub trait SwapStore {
    /// Returns whether a slot exists for `handle`.
    fn contains(&self, handle: SwapHandle) -> bool;

    /// Copies the slot for `handle` into `dst`, which is exactly one page long.
    fn read(&mut self, handle: SwapHandle, dst: &mut [u8]) -> Result<(), SwapError>;

    /// Stores one page from `src` into the slot for `handle`, creating it if needed.
    fn write(&mut self, handle: SwapHandle, src: &[u8]) -> Result<(), SwapError>;

    /// Discards the slot for `handle`. Freeing a missing slot does nothing.
    fn free(&mut self, handle: SwapHandle);
}

/// A swap store kept in host memory.
pub struct MemorySwap {
    page_size: usize,
    slots: HashMap<SwapHandle, Box<[u8]>>,
    reads: u64,
    writes: u64,
}

impl MemorySwap {
    /// Creates an empty store for pages of `page_size` bytes.
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size,
            slots: HashMap::new(),
            reads: 0,
            writes: 0,
        }
    }

    /// Returns the number of occupied slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Returns how many pages have been read back from swap.
    pub fn reads(&self) -> u64 {
        self.reads
    }

    /// Returns how many pages have been written to swap.
    pub fn writes(&self) -> u64 {
        self.writes
    }

    fn check_size(&self, len: usize) -> Result<(), SwapError> {
        if len == self.page_size {
            Ok(())
        } else {
            Err(SwapError::SizeMismatch {
                expected: self.page_size,
                actual: len,
            })
        }
    }
}

impl SwapStore for MemorySwap {
    fn contains(&self, handle: SwapHandle) -> bool {
        self.slots.contains_key(&handle)
    }

    fn read(&mut self, handle: SwapHandle, dst: &mut [u8]) -> Result<(), SwapError> {
        self.check_size(dst.len())?;
        let slot = self
            .slots
            .get(&handle)
            .ok_or(SwapError::MissingSlot(handle))?;
        dst.copy_from_slice(slot);
        self.reads += 1;
        Ok(())
    }

    fn write(&mut self, handle: SwapHandle, src: &[u8]) -> Result<(), SwapError> {
        self.check_size(src.len())?;
        self.slots.insert(handle, src.into());
        self.writes += 1;
        Ok(())
    }

    fn free(&mut self, handle: SwapHandle) {
        self.slots.remove(&handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle(pid: u32, page: usize) -> SwapHandle {
        SwapHandle::new(Pid::new(pid), PageNumber::new(page))
    }

    #[test]
    fn write_then_read() {
        let mut swap = MemorySwap::new(4);
        swap.write(handle(1, 2), &[1, 2, 3, 4]).unwrap();

        let mut page = [0u8; 4];
        swap.read(handle(1, 2), &mut page).unwrap();

        assert_eq!(page, [1, 2, 3, 4]);
        assert_eq!(swap.reads(), 1);
        assert_eq!(swap.writes(), 1);
    }

    #[test]
    fn slots_are_per_process() {
        let mut swap = MemorySwap::new(4);
        swap.write(handle(1, 0), &[1; 4]).unwrap();

        assert!(swap.contains(handle(1, 0)));
        assert!(!swap.contains(handle(2, 0)));
    }

    #[test]
    fn read_missing_slot() {
        let mut swap = MemorySwap::new(4);
        let mut page = [0u8; 4];

        assert_eq!(
            swap.read(handle(1, 0), &mut page),
            Err(SwapError::MissingSlot(handle(1, 0)))
        );
    }

    #[test]
    fn rewrite_replaces_slot() {
        let mut swap = MemorySwap::new(2);
        swap.write(handle(1, 0), &[1, 1]).unwrap();
        swap.write(handle(1, 0), &[2, 2]).unwrap();

        let mut page = [0u8; 2];
        swap.read(handle(1, 0), &mut page).unwrap();
        assert_eq!(page, [2, 2]);
        assert_eq!(swap.len(), 1);
    }

    #[test]
    fn free_discards_slot() {
        let mut swap = MemorySwap::new(2);
        swap.write(handle(1, 0), &[1, 1]).unwrap();

        swap.free(handle(1, 0));
        swap.free(handle(1, 0));

        assert!(!swap.contains(handle(1, 0)));
        assert!(swap.is_empty());
    }

    #[test]
    fn rejects_wrong_page_size() {
        let mut swap = MemorySwap::new(4);
        assert_eq!(
            swap.write(handle(1, 0), &[0; 3]),
            Err(SwapError::SizeMismatch {
                expected: 4,
                actual: 3
            })
        );
    }
}
