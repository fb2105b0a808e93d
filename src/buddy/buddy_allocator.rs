//! Fixed-arena buddy allocator
//!
//! Owns the arena buffer, the page table and the free-area table. Allocation
//! splits the lowest-indexed free block of the first non-empty order down to
//! the requested order; deallocation walks up the orders merging with free
//! buddies.

use alloc::{boxed::Box, vec, vec::Vec};

use crate::{AllocError, AllocResult, BlockAllocator, DEFAULT_MAX_ORDER, DEFAULT_MIN_ORDER};

#[cfg(feature = "log")]
use log::{debug, error, info, trace, warn};

use super::{
    config::{BuddyConfig, TopBlockPolicy},
    free_area::FreeAreaTable,
    page::PageTable,
    stats::{FreeAreaReport, OrderSummary},
};

#[cfg(feature = "tracking")]
use super::stats::BuddyStats;

/// Buddy allocator over an arena of `2^MAX_ORDER` bytes split into
/// `2^MIN_ORDER`-byte pages
///
/// Addresses handed out and taken back are byte offsets from the arena base.
pub struct BuddyAllocator<
    const MIN_ORDER: usize = DEFAULT_MIN_ORDER,
    const MAX_ORDER: usize = DEFAULT_MAX_ORDER,
> {
    arena: Box<[u8]>,
    pages: PageTable,
    free_area: FreeAreaTable,
    config: BuddyConfig,
    #[cfg(feature = "tracking")]
    stats: BuddyStats,
}

impl<const MIN_ORDER: usize, const MAX_ORDER: usize> BuddyAllocator<MIN_ORDER, MAX_ORDER> {
    /// Size of a page, the smallest block
    pub const PAGE_SIZE: usize = 1 << MIN_ORDER;
    /// Size of the whole arena, the largest block
    pub const ARENA_SIZE: usize = 1 << MAX_ORDER;
    /// Number of page descriptors
    pub const NUM_PAGES: usize = 1 << (MAX_ORDER - MIN_ORDER);

    const GEOMETRY_CHECK: () = assert!(
        MIN_ORDER <= MAX_ORDER && MAX_ORDER < usize::BITS as usize,
        "buddy geometry requires MIN_ORDER <= MAX_ORDER < usize::BITS"
    );

    /// Create an allocator with the default configuration
    pub fn new() -> Self {
        Self::with_config(BuddyConfig::default())
    }

    pub fn with_config(config: BuddyConfig) -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::GEOMETRY_CHECK;

        let mut allocator = Self {
            arena: vec![0u8; Self::ARENA_SIZE].into_boxed_slice(),
            pages: PageTable::new(Self::NUM_PAGES, MIN_ORDER, MAX_ORDER),
            free_area: FreeAreaTable::new(MIN_ORDER, MAX_ORDER),
            config,
            #[cfg(feature = "tracking")]
            stats: BuddyStats::new(),
        };
        allocator.init();
        allocator
    }

    /// Reset the arena to a single free block of `MAX_ORDER`
    ///
    /// Every outstanding address becomes invalid.
    pub fn init(&mut self) {
        self.arena.fill(0);
        self.pages.reset(MAX_ORDER);
        self.free_area.clear();
        self.free_area.insert(MAX_ORDER, 0);

        #[cfg(feature = "tracking")]
        {
            self.stats = BuddyStats::new();
            self.update_stats();
        }

        debug!(
            "buddy allocator: arena {:#x} bytes, {} pages of {:#x} bytes",
            Self::ARENA_SIZE,
            Self::NUM_PAGES,
            Self::PAGE_SIZE
        );
    }

    pub const fn config(&self) -> &BuddyConfig {
        &self.config
    }

    /// Smallest order whose block holds `size` bytes
    pub const fn order_for_size(size: usize) -> AllocResult<usize> {
        if size > Self::ARENA_SIZE {
            return Err(AllocError::OutOfRange);
        }
        if size <= Self::PAGE_SIZE {
            return Ok(MIN_ORDER);
        }
        Ok(size.next_power_of_two().trailing_zeros() as usize)
    }

    /// Address of the buddy of the order-`order` block at `addr`
    pub const fn buddy_of(addr: usize, order: usize) -> usize {
        addr ^ (1 << order)
    }

    /// Allocate a block of at least `size` bytes and return its address
    pub fn alloc(&mut self, size: usize) -> AllocResult<usize> {
        let result = self.alloc_inner(size);

        #[cfg(feature = "tracking")]
        {
            match result {
                Ok(_) => self.stats.allocations += 1,
                Err(_) => self.stats.failed_allocations += 1,
            }
            self.update_stats();
        }

        result
    }

    fn alloc_inner(&mut self, size: usize) -> AllocResult<usize> {
        let required_order = match Self::order_for_size(size) {
            Ok(order) => order,
            Err(err) => {
                warn!(
                    "buddy allocator: request of {:#x} bytes exceeds arena of {:#x} bytes",
                    size,
                    Self::ARENA_SIZE
                );
                return Err(err);
            }
        };

        let Some(available_order) = self.free_area.first_available(required_order) else {
            warn!(
                "buddy allocator: out of memory for {:#x} bytes (order {})",
                size, required_order
            );
            return Err(AllocError::OutOfMemory);
        };

        // Split down to the required order, always carrying the lower half
        for order in (required_order + 1..=available_order).rev() {
            let Some(page) = self.free_area.pop_front(order) else {
                error!("buddy allocator: free list of order {} emptied mid-split", order);
                return Err(AllocError::OutOfMemory);
            };

            let half = order - 1;
            let buddy = self.pages.buddy_of(page, half);
            self.pages.set_block_order(page, half);
            self.pages.set_block_order(buddy, half);
            self.free_area.insert(half, page);
            self.free_area.insert(half, buddy);

            trace!(
                "buddy allocator: split order {} block at page {} into pages {} and {}",
                order,
                page,
                page,
                buddy
            );
            #[cfg(feature = "tracking")]
            {
                self.stats.splits += 1;
            }
        }

        let page = self
            .free_area
            .pop_front(required_order)
            .ok_or(AllocError::OutOfMemory)?;
        let addr = self.pages.page_to_addr(page);

        debug!(
            "buddy allocator: alloc {:#x} bytes -> order {} at {:#x}",
            size, required_order, addr
        );
        Ok(addr)
    }

    /// Return the block at `addr` and merge it with free buddies
    ///
    /// `addr` must come from [`alloc`](Self::alloc) and not have been freed
    /// since. Addresses that do not start a block are logged and ignored.
    pub fn dealloc(&mut self, addr: usize) {
        if addr >= Self::ARENA_SIZE || !crate::is_aligned(addr, Self::PAGE_SIZE) {
            error!(
                "buddy allocator: free of {:#x} outside the arena or off a page boundary",
                addr
            );
            return;
        }

        let page = self.pages.addr_to_page(addr);
        let Some(order) = self.pages.order_of(page) else {
            return;
        };

        if !crate::is_aligned(page, self.pages.span(order)) {
            error!(
                "buddy allocator: {:#x} is inside an order {} block, not at its start",
                addr, order
            );
            return;
        }

        if self.free_area.contains(order, page) {
            warn!(
                "buddy allocator: double free at {:#x} (order {})",
                addr, order
            );
            return;
        }

        if self.free_block(page) {
            #[cfg(feature = "tracking")]
            {
                self.stats.frees += 1;
            }
            debug!("buddy allocator: freed {:#x} (order {})", addr, order);
        }

        #[cfg(feature = "tracking")]
        self.update_stats();
    }

    /// Coalesce upward from `page`; true if a block was registered
    fn free_block(&mut self, mut page: usize) -> bool {
        loop {
            let Some(order) = self.pages.order_of(page) else {
                return false;
            };

            if order == MAX_ORDER {
                let register = match self.config.top_block_policy {
                    TopBlockPolicy::WhenExhausted => self.free_area.total_blocks() == 0,
                    TopBlockPolicy::Always => !self.free_area.contains(MAX_ORDER, page),
                };
                if register {
                    self.free_area.insert(MAX_ORDER, page);
                } else {
                    warn!(
                        "buddy allocator: top-order block at page {} not registered",
                        page
                    );
                }
                return register;
            }

            let buddy = self.pages.buddy_of(page, order);
            if !self.free_area.remove(order, buddy) {
                self.free_area.insert(order, page);
                return true;
            }

            let merged = page.min(buddy);
            self.pages.set_block_order(merged, order + 1);
            trace!(
                "buddy allocator: merged pages {} and {} into order {}",
                page,
                buddy,
                order + 1
            );
            #[cfg(feature = "tracking")]
            {
                self.stats.merges += 1;
            }
            page = merged;
        }
    }

    /// Per-order free-block counts and sizes
    pub fn dump(&self) -> FreeAreaReport {
        let orders = (MIN_ORDER..=MAX_ORDER)
            .map(|order| OrderSummary {
                order,
                free_blocks: self.free_area.count(order),
                block_size: 1 << order,
            })
            .collect();
        FreeAreaReport { orders }
    }

    /// Emit the free-area report through the logger
    pub fn log_free_areas(&self) {
        let _report = self.dump();
        info!("========== Buddy Allocator Free Areas ==========");
        info!(
            "Arena: {:#x} bytes, page size {:#x}",
            Self::ARENA_SIZE,
            Self::PAGE_SIZE
        );
        for _summary in _report.orders.iter().filter(|s| s.free_blocks > 0) {
            info!(
                "  Order {}: {} blocks ({} KB each, {} KB total)",
                _summary.order,
                _summary.free_blocks,
                _summary.block_size / 1024,
                _summary.free_bytes() / 1024
            );
        }
        info!("  {}", _report);
        info!("================================================");
    }

    /// Order of the block containing `addr`
    pub fn block_order(&self, addr: usize) -> Option<usize> {
        if addr >= Self::ARENA_SIZE {
            return None;
        }
        self.pages.order_of(self.pages.addr_to_page(addr))
    }

    /// Addresses of the free blocks of `order`, lowest first
    pub fn free_blocks(&self, order: usize) -> impl Iterator<Item = usize> + '_ {
        self.free_area
            .pages(order)
            .into_iter()
            .flatten()
            .map(move |&page| self.pages.page_to_addr(page))
    }

    pub fn free_block_count(&self, order: usize) -> usize {
        self.free_area.count(order)
    }

    pub fn total_free_blocks(&self) -> usize {
        self.free_area.total_blocks()
    }

    /// Bytes held by free blocks
    pub fn free_bytes(&self) -> usize {
        (MIN_ORDER..=MAX_ORDER)
            .map(|order| self.free_area.count(order) << order)
            .sum()
    }

    /// Base pointer of the arena
    pub fn as_ptr(&self) -> *const u8 {
        self.arena.as_ptr()
    }

    /// Bytes of the block starting at `addr`
    pub fn block(&self, addr: usize) -> Option<&[u8]> {
        let len = self.block_len(addr)?;
        self.arena.get(addr..addr + len)
    }

    /// Mutable bytes of the block starting at `addr`
    pub fn block_mut(&mut self, addr: usize) -> Option<&mut [u8]> {
        let len = self.block_len(addr)?;
        self.arena.get_mut(addr..addr + len)
    }

    fn block_len(&self, addr: usize) -> Option<usize> {
        let order = self.block_order(addr)?;
        crate::is_aligned(addr, 1 << order).then_some(1 << order)
    }

    /// Verify the page table and free lists against each other
    ///
    /// Checks that blocks tile the arena at aligned offsets, that every free
    /// list entry starts a block of its order exactly once, and that no two
    /// free buddies were left unmerged. Violations are logged.
    pub fn check_consistency(&self) -> bool {
        let num_pages = self.pages.len();

        let mut page = 0;
        while page < num_pages {
            let Some(order) = self.pages.order_of(page) else {
                return false;
            };
            let span = self.pages.span(order);
            if !crate::is_aligned(page, span) || page + span > num_pages {
                error!(
                    "buddy allocator: order {} block at page {} is misaligned",
                    order, page
                );
                return false;
            }
            if (page..page + span).any(|p| self.pages.order_of(p) != Some(order)) {
                error!(
                    "buddy allocator: order {} block at page {} has mixed page orders",
                    order, page
                );
                return false;
            }
            page += span;
        }

        let mut is_free: Vec<bool> = vec![false; num_pages];
        for order in MIN_ORDER..=MAX_ORDER {
            for &page in self.free_area.pages(order).into_iter().flatten() {
                if self.pages.order_of(page) != Some(order)
                    || !crate::is_aligned(page, self.pages.span(order))
                {
                    error!(
                        "buddy allocator: free list {} holds page {} which is not an order {} block",
                        order, page, order
                    );
                    return false;
                }
                if is_free[page] {
                    error!(
                        "buddy allocator: page {} is registered as free twice",
                        page
                    );
                    return false;
                }
                is_free[page] = true;

                if order < MAX_ORDER {
                    let buddy = self.pages.buddy_of(page, order);
                    if page < buddy && self.free_area.contains(order, buddy) {
                        error!(
                            "buddy allocator: free buddies {} and {} left unmerged at order {}",
                            page, buddy, order
                        );
                        return false;
                    }
                }
            }
        }

        true
    }

    #[cfg(feature = "tracking")]
    pub fn stats(&self) -> BuddyStats {
        self.stats
    }

    #[cfg(feature = "tracking")]
    fn update_stats(&mut self) {
        let free_pages = (MIN_ORDER..=MAX_ORDER)
            .map(|order| self.free_area.count(order) * self.pages.span(order))
            .sum();
        self.stats.total_pages = Self::NUM_PAGES;
        self.stats.free_pages = free_pages;
        self.stats.used_pages = Self::NUM_PAGES - free_pages;
    }
}

impl<const MIN_ORDER: usize, const MAX_ORDER: usize> Default
    for BuddyAllocator<MIN_ORDER, MAX_ORDER>
{
    fn default() -> Self {
        Self::new()
    }
}

impl<const MIN_ORDER: usize, const MAX_ORDER: usize> BlockAllocator
    for BuddyAllocator<MIN_ORDER, MAX_ORDER>
{
    const MIN_BLOCK_SIZE: usize = 1 << MIN_ORDER;

    fn alloc_block(&mut self, size: usize) -> AllocResult<usize> {
        self.alloc(size)
    }

    fn dealloc_block(&mut self, addr: usize) {
        self.dealloc(addr);
    }

    fn total_bytes(&self) -> usize {
        Self::ARENA_SIZE
    }

    fn used_bytes(&self) -> usize {
        Self::ARENA_SIZE - self.free_bytes()
    }

    fn available_bytes(&self) -> usize {
        self.free_bytes()
    }
}
