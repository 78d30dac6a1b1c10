//! Error types for the simulator.

use thiserror::Error;

use crate::{FrameNumber, Pid, SwapHandle, VirtualAddress};

/// Rejected memory configurations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("page offset width must be between 1 and 16 bits, got {0}")]
    InvalidOffsetBits(u32),

    #[error(
        "virtual address width must exceed the page offset width ({offset_bits}) and be at most 32 bits, got {virtual_bits}"
    )]
    InvalidVirtualBits { virtual_bits: u32, offset_bits: u32 },

    #[error("physical memory size {size:#x} is not a multiple of the {page_size} byte page size")]
    UnalignedMemorySize { size: usize, page_size: usize },

    #[error("physical memory holds {0} frames, at least 3 are required")]
    TooFewFrames(usize),

    #[error("physical memory holds {0} frames, frame numbers are limited to 16 bits")]
    TooManyFrames(usize),

    #[error("a page table needs {table_size} bytes but a frame only holds {page_size}")]
    PageTableTooLarge { table_size: usize, page_size: usize },
}

/// Failures reported by a swap store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SwapError {
    #[error("no swap slot for {0}")]
    MissingSlot(SwapHandle),

    #[error("page buffer of {actual} bytes does not match the {expected} byte page size")]
    SizeMismatch { expected: usize, actual: usize },
}

/// Errors raised while replaying events through the simulator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SimError {
    /// Every frame is protected, so nothing can be evicted.
    #[error("System ran out of memory")]
    OutOfMemory,

    #[error("process {0} is already running")]
    AlreadyRunning(Pid),

    #[error("process {0} is not running")]
    NotRunning(Pid),

    #[error("virtual address {address} is outside the {limit:#x} byte address space")]
    AddressOutOfRange { address: VirtualAddress, limit: u64 },

    /// The frame table and a page table disagree about who owns a frame.
    #[error("inconsistent mapping for frame {frame}: {reason}")]
    CorruptMapping {
        frame: FrameNumber,
        reason: &'static str,
    },

    #[error("swap failure: {0}")]
    Swap(#[from] SwapError),
}

/// A trace line that could not be decoded.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    #[error("Invalid START command encountered")]
    InvalidStart,

    #[error("Invalid STOP command encountered")]
    InvalidStop,

    #[error("Invalid memory access command encountered")]
    InvalidAccess,

    #[error("line is not valid UTF-8")]
    InvalidEncoding,
}

/// Errors raised while reading a trace.
#[derive(Error, Debug)]
pub enum TraceError {
    #[error("line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: ParseError,
    },

    #[error("failed to read trace: {0}")]
    Io(#[from] std::io::Error),
}
