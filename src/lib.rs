//! Fixed-arena buddy allocator
//!
//! This crate implements a buddy system over a simulated byte arena of
//! `2^MAX_ORDER` bytes, featuring:
//! - Power-of-two blocks from `2^MIN_ORDER` up to the whole arena
//! - Split-on-demand allocation that always hands out the lowest address
//! - Iterative buddy coalescing on free
//! - Index-linked ordered free lists, one per order

#![no_std]

extern crate alloc;

// Logging support - conditionally import log crate
#[cfg(feature = "log")]
extern crate log;

// Stub macros when log is disabled - these become no-ops
#[cfg(not(feature = "log"))]
macro_rules! error {
    ($($arg:tt)*) => {};
}
#[cfg(not(feature = "log"))]
macro_rules! warn {
    ($($arg:tt)*) => {};
}
#[cfg(not(feature = "log"))]
macro_rules! info {
    ($($arg:tt)*) => {};
}
#[cfg(not(feature = "log"))]
macro_rules! debug {
    ($($arg:tt)*) => {};
}
#[cfg(not(feature = "log"))]
#[allow(unused_macros)]
macro_rules! trace {
    ($($arg:tt)*) => {};
}

/// Default log2 of the page (minimum block) size: 4 KiB pages
pub const DEFAULT_MIN_ORDER: usize = 12;

/// Default log2 of the arena size: 1 MiB arena
pub const DEFAULT_MAX_ORDER: usize = 20;

/// The error type used for allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AllocError {
    /// The requested size is larger than the whole arena.
    #[error("requested size exceeds the arena")]
    OutOfRange,
    /// No free block of the required order or larger is left.
    #[error("no free block large enough for the request")]
    OutOfMemory,
}

/// A [`Result`] type with [`AllocError`] as the error type.
pub type AllocResult<T = ()> = Result<T, AllocError>;

/// Block-granularity allocator over a fixed arena.
///
/// Addresses are byte offsets from the arena base.
pub trait BlockAllocator {
    /// The size of the smallest block.
    const MIN_BLOCK_SIZE: usize;

    /// Allocate a block of at least `size` bytes.
    fn alloc_block(&mut self, size: usize) -> AllocResult<usize>;

    /// Return a block previously handed out by [`alloc_block`](Self::alloc_block).
    fn dealloc_block(&mut self, addr: usize);

    /// Returns total memory size in bytes.
    fn total_bytes(&self) -> usize;

    /// Returns allocated memory size in bytes.
    fn used_bytes(&self) -> usize;

    /// Returns available memory size in bytes.
    fn available_bytes(&self) -> usize;
}

/// Checks whether the address has the demanded alignment.
///
/// Equivalent to `addr % align == 0`, but the alignment must be a power of two.
#[inline]
const fn is_aligned(base_addr: usize, align: usize) -> bool {
    base_addr & (align - 1) == 0
}

pub mod buddy;
#[cfg(feature = "tracking")]
pub use buddy::BuddyStats;
pub use buddy::{BuddyAllocator, BuddyConfig, FreeAreaReport, OrderSummary, TopBlockPolicy};

pub mod node_pool;
pub use node_pool::NodePool;

pub mod ordered_list;
pub use ordered_list::OrderedList;
