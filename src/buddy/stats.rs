//! Statistics and reporting for the buddy allocator
//!
//! [`FreeAreaReport`] is the read-only per-order dump; [`BuddyStats`] adds
//! operation counters when the `tracking` feature is enabled.

use core::fmt;

use alloc::vec::Vec;

/// Free blocks of one order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderSummary {
    pub order: usize,
    pub free_blocks: usize,
    pub block_size: usize,
}

impl OrderSummary {
    /// Bytes held by the free blocks of this order
    pub const fn free_bytes(&self) -> usize {
        self.free_blocks * self.block_size
    }
}

/// Snapshot of the free-area table, lowest order first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FreeAreaReport {
    pub orders: Vec<OrderSummary>,
}

impl FreeAreaReport {
    pub fn free_bytes(&self) -> usize {
        self.orders.iter().map(OrderSummary::free_bytes).sum()
    }

    pub fn free_blocks(&self) -> usize {
        self.orders.iter().map(|summary| summary.free_blocks).sum()
    }

    /// Summary for a single order
    pub fn order(&self, order: usize) -> Option<&OrderSummary> {
        self.orders.iter().find(|summary| summary.order == order)
    }
}

/// Renders `count:sizeK` per order, e.g. `1:4K 0:8K ... 0:1024K`
impl fmt::Display for FreeAreaReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, summary) in self.orders.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}:{}K", summary.free_blocks, summary.block_size / 1024)?;
        }
        Ok(())
    }
}

/// Buddy system statistics
#[cfg(feature = "tracking")]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BuddyStats {
    pub total_pages: usize,
    pub free_pages: usize,
    pub used_pages: usize,
    /// Successful allocations
    pub allocations: usize,
    /// Allocations refused with `OutOfRange` or `OutOfMemory`
    pub failed_allocations: usize,
    /// Frees that reached the free lists
    pub frees: usize,
    pub splits: usize,
    pub merges: usize,
}

#[cfg(feature = "tracking")]
impl BuddyStats {
    pub const fn new() -> Self {
        Self {
            total_pages: 0,
            free_pages: 0,
            used_pages: 0,
            allocations: 0,
            failed_allocations: 0,
            frees: 0,
            splits: 0,
            merges: 0,
        }
    }
}
