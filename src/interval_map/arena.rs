use crate::interval_map::node::{Node, NodeId, NIL};

/// A slab-style node pool with constant-time allocation and release.
///
/// Freed slots are chained through an index free list so node indices stay
/// stable for the lifetime of the node. An optional limit caps the number
/// of live nodes, which makes allocation failure observable to callers.
#[derive(Debug, Clone)]
pub(crate) struct NodeArena<T> {
    slots: Vec<Slot<T>>,
    /// The index of the most recently freed slot, or `NIL` if no slot is
    /// free.
    first_free: NodeId,
    live: usize,
    limit: Option<usize>,
}

#[derive(Debug, Clone)]
enum Slot<T> {
    Occupied(Node<T>),
    /// Points to the next free slot, or `NIL` if no other slot is free.
    Free(NodeId),
}

impl<T> NodeArena<T> {
    pub(crate) fn new() -> Self {
        Self::with_limit(None)
    }

    pub(crate) fn with_limit(limit: Option<usize>) -> Self {
        Self {
            slots: Vec::new(),
            first_free: NIL,
            live: 0,
            limit,
        }
    }

    /// Places a node into the pool and returns its index, or `None` when
    /// the pool is exhausted.
    pub(crate) fn alloc(&mut self, node: Node<T>) -> Option<NodeId> {
        if let Some(limit) = self.limit {
            if self.live >= limit {
                return None;
            }
        }
        let id = if self.first_free != NIL {
            let id = self.first_free;
            self.first_free = match self.slots[id as usize] {
                Slot::Free(next) => next,
                Slot::Occupied(_) => unreachable!("free list points at a live node"),
            };
            self.slots[id as usize] = Slot::Occupied(node);
            id
        } else {
            // The all-ones index is reserved as the NIL sentinel.
            if self.slots.len() >= NIL as usize {
                return None;
            }
            self.slots.push(Slot::Occupied(node));
            (self.slots.len() - 1) as NodeId
        };
        self.live += 1;
        Some(id)
    }

    /// Releases the node at `id` back to the pool and returns it.
    pub(crate) fn free(&mut self, id: NodeId) -> Node<T> {
        let slot = std::mem::replace(&mut self.slots[id as usize], Slot::Free(self.first_free));
        match slot {
            Slot::Occupied(node) => {
                self.first_free = id;
                self.live -= 1;
                node
            }
            Slot::Free(_) => unreachable!("released a node twice"),
        }
    }

    pub(crate) fn get(&self, id: NodeId) -> &Node<T> {
        match &self.slots[id as usize] {
            Slot::Occupied(node) => node,
            Slot::Free(_) => unreachable!("accessed a released node"),
        }
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> &mut Node<T> {
        match &mut self.slots[id as usize] {
            Slot::Occupied(node) => node,
            Slot::Free(_) => unreachable!("accessed a released node"),
        }
    }

    /// The number of live nodes in the pool.
    pub(crate) fn len(&self) -> usize {
        self.live
    }

    /// Drops every node and resets the free list.
    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.first_free = NIL;
        self.live = 0;
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::interval_map::Interval;

    fn node(start: u64, end: u64) -> Node<i32> {
        Node::new(Interval::new(start, end), 0)
    }

    #[test]
    fn after_construction_has_no_first_free() {
        let arena = NodeArena::<i32>::new();
        assert_eq!(arena.first_free, NIL);
        assert_eq!(arena.len(), 0);
    }

    #[test]
    fn after_allocation_has_no_first_free() {
        let mut arena = NodeArena::new();
        assert_eq!(arena.alloc(node(0, 1)), Some(0));
        assert_eq!(arena.first_free, NIL);
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn after_release_has_a_first_free() {
        let mut arena = NodeArena::new();
        arena.alloc(node(0, 1)).unwrap();
        arena.free(0);
        assert_eq!(arena.first_free, 0);
        assert_eq!(arena.len(), 0);
    }

    #[test]
    fn allocation_reuses_released_slots() {
        let mut arena = NodeArena::new();
        arena.alloc(node(0, 1)).unwrap();
        arena.alloc(node(1, 2)).unwrap();
        arena.free(0);
        assert_eq!(arena.alloc(node(2, 3)), Some(0));
        assert_eq!(arena.first_free, NIL);
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn first_free_points_to_last_released_slot() {
        let mut arena = NodeArena::new();
        for i in 0..4 {
            arena.alloc(node(i, i + 1)).unwrap();
        }
        arena.free(0);
        arena.free(3);
        arena.free(1);
        arena.free(2);
        assert_eq!(arena.first_free, 2);
        assert_eq!(arena.len(), 0);
    }

    #[test]
    fn released_nodes_come_back_by_value() {
        let mut arena = NodeArena::new();
        let id = arena.alloc(node(7, 9)).unwrap();
        let released = arena.free(id);
        assert_eq!(released.interval, Interval::new(7, 9));
    }

    #[test]
    fn limit_caps_live_nodes() {
        let mut arena = NodeArena::with_limit(Some(2));
        assert!(arena.alloc(node(0, 1)).is_some());
        assert!(arena.alloc(node(1, 2)).is_some());
        assert_eq!(arena.alloc(node(2, 3)), None);

        // Releasing a node makes room again.
        arena.free(0);
        assert_eq!(arena.alloc(node(2, 3)), Some(0));
    }

    #[test]
    fn clear_resets_the_pool() {
        let mut arena = NodeArena::new();
        for i in 0..4 {
            arena.alloc(node(i, i + 1)).unwrap();
        }
        arena.free(1);
        arena.clear();
        assert_eq!(arena.first_free, NIL);
        assert_eq!(arena.len(), 0);
        assert_eq!(arena.alloc(node(0, 1)), Some(0));
    }
}
