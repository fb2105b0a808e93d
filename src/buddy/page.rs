//! Page descriptors
//!
//! One descriptor per minimum-order page. A descriptor records the order of
//! the block the page currently belongs to; every page of a block carries the
//! same order.

use alloc::vec::Vec;

/// Metadata for one minimum-order page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageDescriptor {
    /// Page index, fixed at construction
    pub index: usize,
    /// Order of the block this page is part of
    pub order: usize,
}

/// Fixed table of page descriptors covering the whole arena
///
/// Descriptors are never created or dropped after construction; splits and
/// merges only rewrite their `order`.
pub struct PageTable {
    pages: Vec<PageDescriptor>,
    min_order: usize,
}

impl PageTable {
    /// Build a table of `num_pages` descriptors, all at `initial_order`
    pub fn new(num_pages: usize, min_order: usize, initial_order: usize) -> Self {
        let pages = (0..num_pages)
            .map(|index| PageDescriptor {
                index,
                order: initial_order,
            })
            .collect();
        Self { pages, min_order }
    }

    /// Reset every descriptor to `order`
    pub fn reset(&mut self, order: usize) {
        for page in &mut self.pages {
            page.order = order;
        }
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn get(&self, index: usize) -> Option<&PageDescriptor> {
        self.pages.get(index)
    }

    /// Current block order of page `index`
    pub fn order_of(&self, index: usize) -> Option<usize> {
        self.pages.get(index).map(|page| page.order)
    }

    /// Number of pages spanned by a block of `order`
    pub const fn span(&self, order: usize) -> usize {
        1 << (order - self.min_order)
    }

    /// Byte offset of page `index` from the arena base
    pub const fn page_to_addr(&self, index: usize) -> usize {
        index << self.min_order
    }

    /// Page index holding byte offset `addr`
    pub const fn addr_to_page(&self, addr: usize) -> usize {
        addr >> self.min_order
    }

    /// Page index of the buddy of the order-`order` block starting at `index`
    pub const fn buddy_of(&self, index: usize, order: usize) -> usize {
        self.addr_to_page(self.page_to_addr(index) ^ (1 << order))
    }

    /// Stamp `order` on every page of the order-`order` block starting at `first`
    pub fn set_block_order(&mut self, first: usize, order: usize) {
        let end = (first + self.span(order)).min(self.pages.len());
        for page in &mut self.pages[first..end] {
            page.order = order;
        }
    }

    pub fn iter(&self) -> core::slice::Iter<'_, PageDescriptor> {
        self.pages.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_table() {
        let table = PageTable::new(8, 12, 15);

        assert_eq!(table.len(), 8);
        assert!(table.iter().all(|page| page.order == 15));
        assert_eq!(table.get(5).map(|page| page.index), Some(5));
        assert!(table.get(8).is_none());
    }

    #[test]
    fn test_address_conversion() {
        let table = PageTable::new(256, 12, 20);

        assert_eq!(table.page_to_addr(3), 0x3000);
        assert_eq!(table.addr_to_page(0x3000), 3);
        assert_eq!(table.span(12), 1);
        assert_eq!(table.span(14), 4);
        assert_eq!(table.span(20), 256);
    }

    #[test]
    fn test_buddy_of() {
        let table = PageTable::new(256, 12, 20);

        assert_eq!(table.buddy_of(0, 12), 1);
        assert_eq!(table.buddy_of(1, 12), 0);
        assert_eq!(table.buddy_of(0, 13), 2);
        assert_eq!(table.buddy_of(4, 14), 0);
        assert_eq!(table.buddy_of(128, 19), 0);

        // Buddy of the buddy is the block itself
        for index in (0..256).step_by(8) {
            let buddy = table.buddy_of(index, 15);
            assert_eq!(table.buddy_of(buddy, 15), index);
        }
    }

    #[test]
    fn test_set_block_order() {
        let mut table = PageTable::new(16, 12, 16);

        table.set_block_order(8, 15);
        assert!((0..8).all(|i| table.order_of(i) == Some(16)));
        assert!((8..16).all(|i| table.order_of(i) == Some(15)));

        table.set_block_order(8, 13);
        assert_eq!(table.order_of(9), Some(13));
        assert_eq!(table.order_of(10), Some(15));

        table.reset(16);
        assert!(table.iter().all(|page| page.order == 16));
    }
}
