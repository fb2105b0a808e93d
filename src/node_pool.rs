//! Index-addressed node pool
//!
//! Backing storage for the nodes of an [`OrderedList`](crate::OrderedList).
//! Nodes are slots in a growable vector and are referred to by their slot
//! index; released slots are chained into a free list and reused before the
//! vector grows again.

use alloc::vec::Vec;

/// Doubly linked list node stored in a [`NodePool`]
#[derive(Debug, Clone)]
pub struct ListNode<T> {
    pub data: T,
    pub prev: Option<usize>,
    pub next: Option<usize>,
}

#[derive(Debug)]
enum Slot<T> {
    Occupied(ListNode<T>),
    Vacant { next_free: Option<usize> },
}

/// Pool of list nodes addressed by slot index
pub struct NodePool<T> {
    slots: Vec<Slot<T>>,
    /// First vacant slot, if any
    free_head: Option<usize>,
    /// Current number of occupied slots
    live_nodes: usize,
    total_allocations: usize,
    total_deallocations: usize,
}

impl<T> NodePool<T> {
    /// Create an empty pool
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_head: None,
            live_nodes: 0,
            total_allocations: 0,
            total_deallocations: 0,
        }
    }

    /// Store `data` in a fresh node and return its slot index
    ///
    /// Vacant slots are reused before the pool grows.
    pub fn alloc_node(&mut self, data: T) -> usize {
        let node = ListNode {
            data,
            prev: None,
            next: None,
        };

        let idx = match self.free_head {
            Some(idx) => {
                self.free_head = match self.slots[idx] {
                    Slot::Vacant { next_free } => next_free,
                    Slot::Occupied(_) => None,
                };
                self.slots[idx] = Slot::Occupied(node);
                idx
            }
            None => {
                self.slots.push(Slot::Occupied(node));
                self.slots.len() - 1
            }
        };

        self.live_nodes += 1;
        self.total_allocations += 1;
        idx
    }

    /// Release a node and hand its payload back
    ///
    /// Returns `None` if `idx` does not name a live node.
    pub fn dealloc_node(&mut self, idx: usize) -> Option<T> {
        if !matches!(self.slots.get(idx), Some(Slot::Occupied(_))) {
            return None;
        }

        let vacant = Slot::Vacant {
            next_free: self.free_head,
        };
        let Slot::Occupied(node) = core::mem::replace(&mut self.slots[idx], vacant) else {
            return None;
        };

        self.free_head = Some(idx);
        self.live_nodes -= 1;
        self.total_deallocations += 1;
        Some(node.data)
    }

    /// Get a reference to a live node
    pub fn get_node(&self, idx: usize) -> Option<&ListNode<T>> {
        match self.slots.get(idx) {
            Some(Slot::Occupied(node)) => Some(node),
            _ => None,
        }
    }

    /// Get a mutable reference to a live node
    pub fn get_node_mut(&mut self, idx: usize) -> Option<&mut ListNode<T>> {
        match self.slots.get_mut(idx) {
            Some(Slot::Occupied(node)) => Some(node),
            _ => None,
        }
    }

    /// Number of live nodes
    pub fn live_node_count(&self) -> usize {
        self.live_nodes
    }

    /// Number of slots ever created (live or vacant)
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Drop every node and forget all slots
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free_head = None;
        self.live_nodes = 0;
    }

    /// Get pool statistics
    pub fn get_stats(&self) -> NodePoolStats {
        NodePoolStats {
            capacity: self.slots.len(),
            live_nodes: self.live_nodes,
            total_allocations: self.total_allocations,
            total_deallocations: self.total_deallocations,
        }
    }
}

impl<T> Default for NodePool<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Node pool statistics
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct NodePoolStats {
    pub capacity: usize,
    pub live_nodes: usize,
    pub total_allocations: usize,
    pub total_deallocations: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alloc_dealloc() {
        let mut pool: NodePool<u32> = NodePool::new();

        let idx1 = pool.alloc_node(10);
        let idx2 = pool.alloc_node(20);
        assert_ne!(idx1, idx2);
        assert_eq!(pool.live_node_count(), 2);

        assert_eq!(pool.dealloc_node(idx1), Some(10));
        assert_eq!(pool.live_node_count(), 1);
        assert!(pool.get_node(idx1).is_none());
        assert_eq!(pool.get_node(idx2).map(|n| n.data), Some(20));
    }

    #[test]
    fn test_vacant_slots_are_reused() {
        let mut pool: NodePool<u32> = NodePool::new();

        let a = pool.alloc_node(1);
        let b = pool.alloc_node(2);
        pool.dealloc_node(a);
        pool.dealloc_node(b);

        // LIFO reuse: the most recently released slot comes back first
        assert_eq!(pool.alloc_node(3), b);
        assert_eq!(pool.alloc_node(4), a);
        assert_eq!(pool.capacity(), 2);
    }

    #[test]
    fn test_double_dealloc_is_rejected() {
        let mut pool: NodePool<u32> = NodePool::new();

        let idx = pool.alloc_node(7);
        assert_eq!(pool.dealloc_node(idx), Some(7));
        assert_eq!(pool.dealloc_node(idx), None);
        assert_eq!(pool.dealloc_node(99), None);
        assert_eq!(pool.live_node_count(), 0);
    }

    #[test]
    fn test_node_access() {
        let mut pool: NodePool<u32> = NodePool::new();
        let idx = pool.alloc_node(0);

        if let Some(node) = pool.get_node_mut(idx) {
            node.data = 0x1000;
            node.next = Some(5);
        }

        let node = pool.get_node(idx).unwrap();
        assert_eq!(node.data, 0x1000);
        assert_eq!(node.next, Some(5));
        assert_eq!(node.prev, None);
    }

    #[test]
    fn test_stats() {
        let mut pool: NodePool<u32> = NodePool::new();

        let idx1 = pool.alloc_node(1);
        let _idx2 = pool.alloc_node(2);

        let stats = pool.get_stats();
        assert_eq!(stats.capacity, 2);
        assert_eq!(stats.live_nodes, 2);
        assert_eq!(stats.total_allocations, 2);
        assert_eq!(stats.total_deallocations, 0);

        pool.dealloc_node(idx1);
        let stats2 = pool.get_stats();
        assert_eq!(stats2.live_nodes, 1);
        assert_eq!(stats2.total_deallocations, 1);

        pool.clear();
        assert_eq!(pool.get_stats().capacity, 0);
    }
}
