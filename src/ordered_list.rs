//! Sorted doubly linked list over a node pool
//!
//! Elements are kept in the order defined by an injected comparer. Each
//! per-order free list of the buddy allocator is one of these, which is what
//! makes block selection deterministic: the front is always the lowest page
//! index of that order.

use core::cmp::Ordering;

use crate::node_pool::NodePool;

/// Comparer used by the buddy free lists
pub type Comparer<T> = fn(&T, &T) -> Ordering;

/// Sorted sequence keyed by a comparer
///
/// The list keeps only head/tail/len; all nodes live in the owned
/// [`NodePool`] and are linked by slot index.
pub struct OrderedList<T, C = Comparer<T>> {
    pool: NodePool<T>,
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
    comparer: C,
}

impl<T, C> OrderedList<T, C>
where
    C: Fn(&T, &T) -> Ordering,
{
    /// Create an empty list ordered by `comparer`
    pub const fn new(comparer: C) -> Self {
        Self {
            pool: NodePool::new(),
            head: None,
            tail: None,
            len: 0,
            comparer,
        }
    }

    /// Insert `item` in sorted position and return the index it landed at
    ///
    /// The item goes right before the first element it compares `Less`
    /// against, so it lands after every existing element that is equal or
    /// smaller.
    pub fn insert(&mut self, item: T) -> usize {
        let mut position = 0;
        let mut current_idx = self.head;

        while let Some(idx) = current_idx {
            let Some(node) = self.pool.get_node(idx) else {
                break;
            };
            if (self.comparer)(&item, &node.data) == Ordering::Less {
                break;
            }
            current_idx = node.next;
            position += 1;
        }

        let new_idx = self.pool.alloc_node(item);
        let prev_idx = match current_idx {
            Some(next) => self.pool.get_node(next).and_then(|n| n.prev),
            None => self.tail,
        };

        if let Some(node) = self.pool.get_node_mut(new_idx) {
            node.prev = prev_idx;
            node.next = current_idx;
        }

        match prev_idx {
            Some(prev) => {
                if let Some(prev_node) = self.pool.get_node_mut(prev) {
                    prev_node.next = Some(new_idx);
                }
            }
            None => self.head = Some(new_idx),
        }

        match current_idx {
            Some(next) => {
                if let Some(next_node) = self.pool.get_node_mut(next) {
                    next_node.prev = Some(new_idx);
                }
            }
            None => self.tail = Some(new_idx),
        }

        self.len += 1;
        position
    }

    /// Remove every element equal to `item`, returning how many went
    ///
    /// Equality is `PartialEq`, never the comparer.
    pub fn remove_all_equal(&mut self, item: &T) -> usize
    where
        T: PartialEq,
    {
        let mut removed = 0;
        let mut current_idx = self.head;

        while let Some(idx) = current_idx {
            let Some(node) = self.pool.get_node(idx) else {
                break;
            };
            current_idx = node.next;
            if node.data == *item {
                self.unlink(idx);
                removed += 1;
            }
        }

        removed
    }
}

impl<T, C> OrderedList<T, C> {
    /// Return the first element without removing it
    pub fn peek_front(&self) -> Option<&T> {
        self.head
            .and_then(|idx| self.pool.get_node(idx))
            .map(|node| &node.data)
    }

    /// Remove and return the first element
    pub fn pop_front(&mut self) -> Option<T> {
        let head_idx = self.head?;
        self.unlink(head_idx)
    }

    /// Element at `index`, or `None` past the end
    pub fn at(&self, index: usize) -> Option<&T> {
        self.node_at(index)
            .and_then(|idx| self.pool.get_node(idx))
            .map(|node| &node.data)
    }

    /// Remove and return the element at `index`, or `None` past the end
    pub fn remove_at(&mut self, index: usize) -> Option<T> {
        let idx = self.node_at(index)?;
        self.unlink(idx)
    }

    /// Index of the first element matching `pred`
    pub fn position<P>(&self, mut pred: P) -> Option<usize>
    where
        P: FnMut(&T) -> bool,
    {
        self.iter().position(|item| pred(item))
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Iterate front to back
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            pool: &self.pool,
            current: self.head,
        }
    }

    /// Drop every element and release all nodes
    pub fn clear(&mut self) {
        self.pool.clear();
        self.head = None;
        self.tail = None;
        self.len = 0;
    }

    fn node_at(&self, index: usize) -> Option<usize> {
        if index >= self.len {
            return None;
        }

        let mut current_idx = self.head;
        for _ in 0..index {
            current_idx = current_idx
                .and_then(|idx| self.pool.get_node(idx))
                .and_then(|node| node.next);
        }
        current_idx
    }

    /// Detach a node from its neighbours and return its payload
    fn unlink(&mut self, idx: usize) -> Option<T> {
        let (prev_idx, next_idx) = {
            let node = self.pool.get_node(idx)?;
            (node.prev, node.next)
        };

        match prev_idx {
            Some(prev) => {
                if let Some(prev_node) = self.pool.get_node_mut(prev) {
                    prev_node.next = next_idx;
                }
            }
            None => self.head = next_idx,
        }

        match next_idx {
            Some(next) => {
                if let Some(next_node) = self.pool.get_node_mut(next) {
                    next_node.prev = prev_idx;
                }
            }
            None => self.tail = prev_idx,
        }

        self.len -= 1;
        self.pool.dealloc_node(idx)
    }
}

/// Front-to-back iterator over an [`OrderedList`]
pub struct Iter<'a, T> {
    pool: &'a NodePool<T>,
    current: Option<usize>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.pool.get_node(self.current?)?;
        self.current = node.next;
        Some(&node.data)
    }
}

impl<'a, T, C> IntoIterator for &'a OrderedList<T, C> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    fn ascending(a: &usize, b: &usize) -> Ordering {
        a.cmp(b)
    }

    fn list_of(items: &[usize]) -> OrderedList<usize> {
        let mut list: OrderedList<usize> = OrderedList::new(ascending);
        for &item in items {
            list.insert(item);
        }
        list
    }

    fn contents(list: &OrderedList<usize>) -> Vec<usize> {
        list.iter().copied().collect()
    }

    #[test]
    fn test_insert_sorted() {
        let mut list: OrderedList<usize> = OrderedList::new(ascending);

        assert_eq!(list.insert(5), 0);
        assert_eq!(list.insert(3), 0);
        assert_eq!(list.insert(7), 2);
        assert_eq!(list.insert(1), 0);
        assert_eq!(list.insert(4), 2);

        assert_eq!(contents(&list), [1, 3, 4, 5, 7]);
        assert_eq!(list.len(), 5);
    }

    #[test]
    fn test_equal_keys_land_after_existing() {
        // Order by key only so equal keys with different tags can be told apart
        fn by_key(a: &(u32, char), b: &(u32, char)) -> Ordering {
            a.0.cmp(&b.0)
        }
        let mut list: OrderedList<(u32, char)> = OrderedList::new(by_key);

        list.insert((2, 'a'));
        list.insert((1, 'b'));
        assert_eq!(list.insert((2, 'c')), 2);
        assert_eq!(list.insert((1, 'd')), 1);

        let tags: Vec<char> = list.iter().map(|item| item.1).collect();
        assert_eq!(tags, ['b', 'd', 'a', 'c']);
    }

    #[test]
    fn test_peek_and_pop_front() {
        let mut list = list_of(&[0x3000, 0x1000, 0x2000]);

        assert_eq!(list.peek_front(), Some(&0x1000));
        assert_eq!(list.pop_front(), Some(0x1000));
        assert_eq!(list.pop_front(), Some(0x2000));
        assert_eq!(list.peek_front(), Some(&0x3000));
        assert_eq!(list.len(), 1);

        assert_eq!(list.pop_front(), Some(0x3000));
        assert!(list.is_empty());
        assert_eq!(list.peek_front(), None);
        assert_eq!(list.pop_front(), None);
    }

    #[test]
    fn test_at_out_of_range() {
        let list = list_of(&[10, 20, 30]);

        assert_eq!(list.at(0), Some(&10));
        assert_eq!(list.at(2), Some(&30));
        assert_eq!(list.at(3), None);
        assert_eq!(list.at(usize::MAX), None);
    }

    #[test]
    fn test_remove_at() {
        let mut list = list_of(&[10, 20, 30, 40]);

        assert_eq!(list.remove_at(1), Some(20));
        assert_eq!(contents(&list), [10, 30, 40]);

        assert_eq!(list.remove_at(2), Some(40));
        assert_eq!(contents(&list), [10, 30]);

        assert_eq!(list.remove_at(5), None);
        assert_eq!(list.remove_at(0), Some(10));
        assert_eq!(contents(&list), [30]);

        // The tail must still be right after removing the old tail
        list.insert(50);
        assert_eq!(contents(&list), [30, 50]);
    }

    #[test]
    fn test_remove_all_equal() {
        let mut list = list_of(&[1, 2, 2, 3, 2]);

        assert_eq!(list.remove_all_equal(&2), 3);
        assert_eq!(contents(&list), [1, 3]);
        assert_eq!(list.remove_all_equal(&9), 0);
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_position() {
        let list = list_of(&[4, 8, 15, 16]);

        assert_eq!(list.position(|&x| x == 15), Some(2));
        assert_eq!(list.position(|&x| x > 100), None);
    }

    #[test]
    fn test_nodes_reused_after_removal() {
        let mut list = list_of(&[1, 2, 3]);
        list.pop_front();
        list.remove_at(0);
        list.insert(9);
        list.insert(0);

        assert_eq!(contents(&list), [0, 3, 9]);
        assert_eq!(list.pool.capacity(), 3);
    }

    #[test]
    fn test_clear() {
        let mut list = list_of(&[3, 1, 2]);
        list.clear();

        assert!(list.is_empty());
        assert_eq!(list.iter().count(), 0);

        list.insert(5);
        assert_eq!(contents(&list), [5]);
    }
}
