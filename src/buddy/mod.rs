//! Buddy allocator module
//!
//! This module provides the fixed-arena buddy system:
//! - Page table recording the block order of every page
//! - Sorted per-order free lists for deterministic, left-biased selection
//! - Free-area reports and optional statistics

pub mod buddy_allocator;
pub mod config;
pub mod free_area;
pub mod page;
pub mod stats;

pub use buddy_allocator::BuddyAllocator;
pub use config::{BuddyConfig, TopBlockPolicy};
pub use free_area::FreeAreaTable;
pub use page::{PageDescriptor, PageTable};
#[cfg(feature = "tracking")]
pub use stats::BuddyStats;
pub use stats::{FreeAreaReport, OrderSummary};
