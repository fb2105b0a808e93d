//! Per-order free lists
//!
//! Each order in `min_order..=max_order` has an [`OrderedList`] of the
//! representative page indices of its free blocks, ascending by index.

use core::cmp::Ordering;

use alloc::vec::Vec;

#[cfg(feature = "log")]
use log::error;

use crate::ordered_list::{Iter, OrderedList};

fn by_page_index(a: &usize, b: &usize) -> Ordering {
    a.cmp(b)
}

/// Free-area table: one sorted list of free blocks per order
pub struct FreeAreaTable {
    min_order: usize,
    max_order: usize,
    lists: Vec<OrderedList<usize>>,
}

impl FreeAreaTable {
    /// Create empty lists for every order in `min_order..=max_order`
    pub fn new(min_order: usize, max_order: usize) -> Self {
        let lists = (min_order..=max_order)
            .map(|_| OrderedList::new(by_page_index as fn(&usize, &usize) -> Ordering))
            .collect();
        Self {
            min_order,
            max_order,
            lists,
        }
    }

    fn list(&self, order: usize) -> Option<&OrderedList<usize>> {
        order
            .checked_sub(self.min_order)
            .and_then(|slot| self.lists.get(slot))
    }

    fn list_mut(&mut self, order: usize) -> Option<&mut OrderedList<usize>> {
        order
            .checked_sub(self.min_order)
            .and_then(|slot| self.lists.get_mut(slot))
    }

    /// Register the block represented by `page` as free at `order`
    pub fn insert(&mut self, order: usize, page: usize) -> bool {
        match self.list_mut(order) {
            Some(list) => {
                list.insert(page);
                true
            }
            None => {
                error!("free area: order {} out of range for page {}", order, page);
                false
            }
        }
    }

    /// Take the lowest-indexed free block of `order`
    pub fn pop_front(&mut self, order: usize) -> Option<usize> {
        self.list_mut(order)?.pop_front()
    }

    /// Unlink `page` from the list of `order`; false if it was not there
    pub fn remove(&mut self, order: usize, page: usize) -> bool {
        let Some(list) = self.list_mut(order) else {
            return false;
        };
        match list.position(|&p| p == page) {
            Some(position) => list.remove_at(position).is_some(),
            None => false,
        }
    }

    pub fn contains(&self, order: usize, page: usize) -> bool {
        self.list(order)
            .is_some_and(|list| list.iter().any(|&p| p == page))
    }

    /// Number of free blocks of `order`
    pub fn count(&self, order: usize) -> usize {
        self.list(order).map_or(0, OrderedList::len)
    }

    /// Number of free blocks across all orders
    pub fn total_blocks(&self) -> usize {
        self.lists.iter().map(OrderedList::len).sum()
    }

    /// First order at or above `order` with a free block
    pub fn first_available(&self, order: usize) -> Option<usize> {
        (order.max(self.min_order)..=self.max_order).find(|&o| self.count(o) > 0)
    }

    /// Free block representatives of `order`, lowest index first
    pub fn pages(&self, order: usize) -> Option<Iter<'_, usize>> {
        self.list(order).map(OrderedList::iter)
    }

    /// Empty every list
    pub fn clear(&mut self) {
        for list in &mut self.lists {
            list.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    #[test]
    fn test_insert_keeps_page_order() {
        let mut table = FreeAreaTable::new(12, 16);

        assert!(table.insert(13, 6));
        assert!(table.insert(13, 2));
        assert!(table.insert(13, 4));

        let pages: Vec<usize> = table.pages(13).unwrap().copied().collect();
        assert_eq!(pages, [2, 4, 6]);
        assert_eq!(table.count(13), 3);
        assert_eq!(table.total_blocks(), 3);
    }

    #[test]
    fn test_out_of_range_orders() {
        let mut table = FreeAreaTable::new(12, 16);

        assert!(!table.insert(11, 0));
        assert!(!table.insert(17, 0));
        assert_eq!(table.count(11), 0);
        assert_eq!(table.pop_front(17), None);
        assert!(table.pages(3).is_none());
    }

    #[test]
    fn test_remove_and_contains() {
        let mut table = FreeAreaTable::new(12, 16);
        table.insert(12, 1);
        table.insert(12, 5);

        assert!(table.contains(12, 5));
        assert!(table.remove(12, 5));
        assert!(!table.contains(12, 5));
        assert!(!table.remove(12, 5));
        assert!(!table.remove(14, 1));
        assert_eq!(table.count(12), 1);
    }

    #[test]
    fn test_first_available() {
        let mut table = FreeAreaTable::new(12, 16);
        assert_eq!(table.first_available(12), None);

        table.insert(15, 8);
        assert_eq!(table.first_available(12), Some(15));
        assert_eq!(table.first_available(15), Some(15));
        assert_eq!(table.first_available(16), None);

        table.insert(12, 3);
        assert_eq!(table.first_available(12), Some(12));
        assert_eq!(table.first_available(13), Some(15));
    }

    #[test]
    fn test_clear() {
        let mut table = FreeAreaTable::new(12, 14);
        table.insert(12, 0);
        table.insert(14, 0);
        table.clear();

        assert_eq!(table.total_blocks(), 0);
    }
}
