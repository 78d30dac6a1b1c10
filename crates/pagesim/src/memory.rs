//! Simulated physical memory.

use crate::{AddressLayout, FrameNumber, PhysicalAddress};

/// A flat byte array standing in for the machine's physical memory.
///
/// Memory is addressed either byte-wise by [`PhysicalAddress`] or a whole frame at a time.
/// Page tables live here too, so entries are read and written through the 32-bit
/// accessors.
pub struct PhysicalMemory {
    bytes: Box<[u8]>,
    layout: AddressLayout,
}

impl PhysicalMemory {
    /// Creates zero-filled memory of `size` bytes, split into frames by `layout`.
    pub fn new(size: usize, layout: AddressLayout) -> Self {
        Self {
            bytes: vec![0u8; size].into_boxed_slice(),
            layout,
        }
    }

    /// Returns the size of memory in bytes.
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Returns the layout used to split addresses into frames.
    pub fn layout(&self) -> AddressLayout {
        self.layout
    }

    /// Returns the number of whole frames.
    pub fn frame_count(&self) -> usize {
        self.bytes.len() / self.layout.page_size()
    }

    /// Returns the contents of a frame.
    ///
    /// # Panics
    /// Panics if the frame lies outside memory.
    pub fn frame(&self, frame: FrameNumber) -> &[u8] {
        let start = self.layout.physical_address(frame, 0).as_usize();
        &self.bytes[start..start + self.layout.page_size()]
    }

    /// Returns the contents of a frame for writing.
    ///
    /// # Panics
    /// Panics if the frame lies outside memory.
    pub fn frame_mut(&mut self, frame: FrameNumber) -> &mut [u8] {
        let start = self.layout.physical_address(frame, 0).as_usize();
        &mut self.bytes[start..start + self.layout.page_size()]
    }

    /// Fills a frame with zeroes.
    pub fn zero_frame(&mut self, frame: FrameNumber) {
        self.frame_mut(frame).fill(0);
    }

    /// Reads the byte at `addr`.
    pub fn read(&self, addr: PhysicalAddress) -> u8 {
        self.bytes[addr.as_usize()]
    }

    /// Writes `value` at `addr`.
    pub fn write(&mut self, addr: PhysicalAddress, value: u8) {
        self.bytes[addr.as_usize()] = value;
    }

    /// Reads a little-endian 32-bit word at `addr`.
    pub(crate) fn read_u32(&self, addr: PhysicalAddress) -> u32 {
        let start = addr.as_usize();
        let mut word = [0u8; 4];
        word.copy_from_slice(&self.bytes[start..start + 4]);
        u32::from_le_bytes(word)
    }

    /// Writes a little-endian 32-bit word at `addr`.
    pub(crate) fn write_u32(&mut self, addr: PhysicalAddress, value: u32) {
        let start = addr.as_usize();
        self.bytes[start..start + 4].copy_from_slice(&value.to_le_bytes());
    }
}
