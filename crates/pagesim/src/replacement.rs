//! Frame replacement.
//!
//! Frames are handed out in three steps, always preferring the lowest frame number:
//!
//! 1. The first frame that is neither mapped nor protected.
//! 2. A clock sweep from frame 0: a referenced frame has its bit cleared and is skipped;
//!    the first unreferenced frame is the victim.
//! 3. If the sweep cleared every bit without finding a victim, the first unprotected
//!    frame. The second pass does not clear bits again.
//!
//! The sweep has no persistent hand, so identical frame tables always yield the same
//! victim. Protected frames (the frame table and page tables) are never considered.

use crate::{FrameNumber, SimError, Simulator, SwapHandle, SwapStore};

impl<S: SwapStore> Simulator<S> {
    /// Chooses the frame to use next, without evicting it.
    ///
    /// Clears the referenced bit of every frame the sweep passes over.
    pub fn select_victim_frame(&mut self) -> Result<FrameNumber, SimError> {
        if let Some(frame) = self.frames.first_free() {
            return Ok(frame);
        }

        for frame in FrameNumber::range(self.frames.len()) {
            let entry = self.frames.entry(frame);
            if entry.is_protected() {
                continue;
            }
            if !entry.is_referenced() {
                return Ok(frame);
            }
            self.clear_reference(frame);
        }

        // Every unprotected frame was referenced and has just been cleared.
        self.frames.first_unprotected().ok_or_else(|| {
            log::error!("no evictable frame: all {} frames are protected", self.frames.len());
            SimError::OutOfMemory
        })
    }

    /// Returns a frame that is ready to be mapped, evicting its current page if needed.
    pub fn acquire_frame(&mut self) -> Result<FrameNumber, SimError> {
        let frame = self.select_victim_frame()?;
        if self.frames.entry(frame).is_mapped() {
            self.evict(frame)?;
        }
        Ok(frame)
    }

    /// Clears the referenced bit of `frame` and of the page table entry mirroring it.
    fn clear_reference(&mut self, frame: FrameNumber) {
        self.frames.set_referenced(frame, false);

        let Some((pid, page)) = self.frames.entry(frame).owner() else {
            return;
        };
        if let Some(table) = self.page_table_of(pid) {
            table.update(&mut self.memory, page, |entry| entry.set_referenced(false));
        }
    }

    /// Takes `frame` away from the page cached in it.
    ///
    /// A dirty page is written to its swap slot first. The page table entry is
    /// invalidated before the frame is unmarked.
    fn evict(&mut self, frame: FrameNumber) -> Result<(), SimError> {
        let (pid, page) = self
            .frames
            .entry(frame)
            .owner()
            .ok_or(SimError::CorruptMapping {
                frame,
                reason: "evicting a frame with no owning page",
            })?;
        let table = self.page_table_of(pid).ok_or(SimError::CorruptMapping {
            frame,
            reason: "frame owned by a process that is not running",
        })?;

        let entry = table.entry(&self.memory, page);
        if entry.frame() != Some(frame) {
            return Err(SimError::CorruptMapping {
                frame,
                reason: "page table entry does not point back at the frame",
            });
        }

        if entry.is_dirty() {
            self.swap
                .write(SwapHandle::new(pid, page), self.memory.frame(frame))?;
            self.stats.record_writeback();
            log::trace!("writeback: pid {} page {} from frame {}", pid, page, frame);
        }

        table.update(&mut self.memory, page, |entry| entry.set_valid(false));
        self.frames.unmark(frame);

        log::trace!("evicted pid {} page {} from frame {}", pid, page, frame);
        Ok(())
    }
}
