//! # Page Simulator
//!
//! A demand-paging virtual memory simulator. It models a small machine with:
//!
//! - Physical memory split into fixed-size frames, with a frame table in frame 0.
//! - One single-level page table per process, stored in a protected frame.
//! - A page table base register that follows the current process.
//! - A swap store holding evicted dirty pages.
//! - Clock (second chance) replacement over unprotected frames.
//! - Access statistics and an average access time estimate.
//!
//! The simulator is driven by [`TraceEvent`]s, usually read from a trace file with
//! [`TraceReader`].

mod address;
mod config;
mod entry;
mod error;
mod flags;
mod frame;
mod memory;
mod numbers;
mod page_table;
mod process;
mod replacement;
mod simulator;
mod stats;
mod swap;
mod trace;

pub use address::{AddressLayout, PhysicalAddress, VirtualAddress};
pub use config::{DEFAULT_OFFSET_BITS, DEFAULT_PHYSICAL_BITS, DEFAULT_VIRTUAL_BITS, MemoryConfig};
pub use entry::PageEntry;
pub use error::{ConfigError, ParseError, SimError, SwapError, TraceError};
pub use flags::PageFlags;
pub use frame::{FrameFlag, FrameFlags, FrameTable, FrameTableEntry};
pub use memory::PhysicalMemory;
pub use numbers::{FrameNumber, PageNumber};
pub use page_table::PageTable;
pub use process::{Pid, ProcessControlBlock, ProcessTable};
pub use simulator::Simulator;
pub use stats::{DISK_ACCESS_TIME, MEMORY_ACCESS_TIME, Report, Statistics};
pub use swap::{MemorySwap, SwapHandle, SwapStore};
pub use trace::{AccessKind, TraceEvent, TraceReader};
