use crate::interval_map::arena::NodeArena;
use crate::interval_map::node::{Color, Node, NodeId, NIL};
use crate::interval_map::Interval;

/// An augmented red-black tree over arena-allocated interval nodes.
///
/// Nodes are keyed on the interval start. Every node caches the maximum
/// interval end of its subtree; insertion, erasure and rotations keep that
/// cache correct, which is what makes `lowest_overlap` logarithmic.
///
/// The tree orders nodes but does not interpret them: overlap resolution
/// and coalescing live a layer above.
#[derive(Debug, Clone)]
pub(crate) struct Tree<T> {
    arena: NodeArena<T>,
    root: NodeId,
}

impl<T> Tree<T> {
    pub(crate) fn new() -> Self {
        Self {
            arena: NodeArena::new(),
            root: NIL,
        }
    }

    pub(crate) fn with_node_limit(limit: usize) -> Self {
        Self {
            arena: NodeArena::with_limit(Some(limit)),
            root: NIL,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.arena.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.root == NIL
    }

    pub(crate) fn node(&self, id: NodeId) -> &Node<T> {
        self.arena.get(id)
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node<T> {
        self.arena.get_mut(id)
    }

    /// Allocates a detached node, or `None` when the pool is exhausted.
    pub(crate) fn alloc(&mut self, interval: Interval, value: T) -> Option<NodeId> {
        self.arena.alloc(Node::new(interval, value))
    }

    /// Returns a node to the pool. The node must already be unlinked.
    pub(crate) fn release(&mut self, id: NodeId) -> Node<T> {
        self.arena.free(id)
    }

    pub(crate) fn clear(&mut self) {
        self.arena.clear();
        self.root = NIL;
    }

    fn color_of(&self, id: NodeId) -> Color {
        if id == NIL {
            Color::Black
        } else {
            self.node(id).color
        }
    }

    fn parent_of(&self, id: NodeId) -> NodeId {
        if id == NIL {
            NIL
        } else {
            self.node(id).parent
        }
    }

    fn left_of(&self, id: NodeId) -> NodeId {
        if id == NIL {
            NIL
        } else {
            self.node(id).left
        }
    }

    fn right_of(&self, id: NodeId) -> NodeId {
        if id == NIL {
            NIL
        } else {
            self.node(id).right
        }
    }

    fn subtree_max_end(&self, id: NodeId) -> u64 {
        if id == NIL {
            0
        } else {
            self.node(id).subtree_max_end
        }
    }

    /// Recomputes `subtree_max_end` for a node from itself and its children.
    fn update_max(&mut self, id: NodeId) {
        let node = self.node(id);
        let mut max_end = node.interval.end;
        let left_max = self.subtree_max_end(node.left);
        if left_max > max_end {
            max_end = left_max;
        }
        let right_max = self.subtree_max_end(node.right);
        if right_max > max_end {
            max_end = right_max;
        }
        self.node_mut(id).subtree_max_end = max_end;
    }

    /// Recomputes `subtree_max_end` from `id` up to the root.
    fn propagate_max(&mut self, mut id: NodeId) {
        while id != NIL {
            self.update_max(id);
            id = self.node(id).parent;
        }
    }

    /// Grows the end of a linked node, refreshing the cached maxima along
    /// its ancestor path.
    pub(crate) fn extend_end(&mut self, id: NodeId, end: u64) {
        self.node_mut(id).interval.end = end;
        self.propagate_max(id);
    }

    fn minimum(&self, mut id: NodeId) -> NodeId {
        while self.node(id).left != NIL {
            id = self.node(id).left;
        }
        id
    }

    fn maximum(&self, mut id: NodeId) -> NodeId {
        while self.node(id).right != NIL {
            id = self.node(id).right;
        }
        id
    }

    /// The node with the smallest start, or `NIL` in an empty tree.
    pub(crate) fn first(&self) -> NodeId {
        if self.root == NIL {
            NIL
        } else {
            self.minimum(self.root)
        }
    }

    /// In-order successor of `id`, or `NIL`.
    pub(crate) fn next(&self, id: NodeId) -> NodeId {
        let right = self.node(id).right;
        if right != NIL {
            return self.minimum(right);
        }
        let mut child = id;
        let mut parent = self.node(id).parent;
        while parent != NIL && child == self.node(parent).right {
            child = parent;
            parent = self.node(parent).parent;
        }
        parent
    }

    /// In-order predecessor of `id`, or `NIL`.
    pub(crate) fn prev(&self, id: NodeId) -> NodeId {
        let left = self.node(id).left;
        if left != NIL {
            return self.maximum(left);
        }
        let mut child = id;
        let mut parent = self.node(id).parent;
        while parent != NIL && child == self.node(parent).left {
            child = parent;
            parent = self.node(parent).parent;
        }
        parent
    }

    /// Finds the stored interval with the smallest start that overlaps the
    /// query range, or `NIL` if there is none.
    ///
    /// Descends from the root without a stack: whenever the left subtree
    /// reaches past the query start it must hold the leftmost overlap if
    /// any exists, so the search commits to it.
    pub(crate) fn lowest_overlap(&self, query: Interval) -> NodeId {
        let mut cursor = self.root;
        while cursor != NIL {
            let node = self.node(cursor);
            if self.subtree_max_end(node.left) > query.start {
                cursor = node.left;
            } else if node.interval.overlaps_with(&query) {
                return cursor;
            } else if query.start >= node.interval.start {
                cursor = node.right;
            } else {
                break;
            }
        }
        NIL
    }

    /// Links a detached node into the tree and rebalances.
    ///
    /// The node's linkage is reset here, so a node erased and shrunk by the
    /// layer above can be handed straight back.
    pub(crate) fn insert(&mut self, id: NodeId) {
        let start = {
            let node = self.node_mut(id);
            node.parent = NIL;
            node.left = NIL;
            node.right = NIL;
            node.color = Color::Red;
            node.subtree_max_end = node.interval.end;
            node.interval.start
        };

        let mut parent = NIL;
        let mut cursor = self.root;
        let mut went_left = false;
        while cursor != NIL {
            parent = cursor;
            went_left = start <= self.node(cursor).interval.start;
            cursor = if went_left {
                self.node(cursor).left
            } else {
                self.node(cursor).right
            };
        }

        self.node_mut(id).parent = parent;
        if parent == NIL {
            self.root = id;
        } else if went_left {
            self.node_mut(parent).left = id;
        } else {
            self.node_mut(parent).right = id;
        }

        self.propagate_max(parent);
        self.insert_fixup(id);
    }

    fn insert_fixup(&mut self, mut id: NodeId) {
        while self.color_of(self.parent_of(id)) == Color::Red {
            let parent = self.parent_of(id);
            let grand = self.parent_of(parent);
            if parent == self.left_of(grand) {
                let uncle = self.right_of(grand);
                if self.color_of(uncle) == Color::Red {
                    self.node_mut(parent).color = Color::Black;
                    self.node_mut(uncle).color = Color::Black;
                    self.node_mut(grand).color = Color::Red;
                    id = grand;
                } else {
                    if id == self.right_of(parent) {
                        id = parent;
                        self.rotate_left(id);
                    }
                    let parent = self.parent_of(id);
                    let grand = self.parent_of(parent);
                    self.node_mut(parent).color = Color::Black;
                    self.node_mut(grand).color = Color::Red;
                    self.rotate_right(grand);
                }
            } else {
                let uncle = self.left_of(grand);
                if self.color_of(uncle) == Color::Red {
                    self.node_mut(parent).color = Color::Black;
                    self.node_mut(uncle).color = Color::Black;
                    self.node_mut(grand).color = Color::Red;
                    id = grand;
                } else {
                    if id == self.left_of(parent) {
                        id = parent;
                        self.rotate_right(id);
                    }
                    let parent = self.parent_of(id);
                    let grand = self.parent_of(parent);
                    self.node_mut(parent).color = Color::Black;
                    self.node_mut(grand).color = Color::Red;
                    self.rotate_left(grand);
                }
            }
        }
        let root = self.root;
        self.node_mut(root).color = Color::Black;
    }

    /// Unlinks a node from the tree and rebalances. The node itself stays
    /// allocated; the caller either releases it or reinserts it.
    pub(crate) fn erase(&mut self, id: NodeId) {
        let left = self.node(id).left;
        let right = self.node(id).right;
        let mut removed_color = self.node(id).color;
        let fix_child;
        let fix_parent;

        if left == NIL {
            fix_child = right;
            fix_parent = self.node(id).parent;
            self.transplant(id, right);
        } else if right == NIL {
            fix_child = left;
            fix_parent = self.node(id).parent;
            self.transplant(id, left);
        } else {
            // Two children: the in-order successor takes this node's place
            // in both the ordering and the colouring.
            let succ = self.minimum(right);
            removed_color = self.node(succ).color;
            fix_child = self.node(succ).right;
            if self.node(succ).parent == id {
                fix_parent = succ;
            } else {
                fix_parent = self.node(succ).parent;
                self.transplant(succ, fix_child);
                let id_right = self.node(id).right;
                self.node_mut(succ).right = id_right;
                self.node_mut(id_right).parent = succ;
            }
            self.transplant(id, succ);
            let id_left = self.node(id).left;
            self.node_mut(succ).left = id_left;
            self.node_mut(id_left).parent = succ;
            let id_color = self.node(id).color;
            self.node_mut(succ).color = id_color;
        }

        if fix_parent != NIL {
            self.propagate_max(fix_parent);
        }
        if removed_color == Color::Black {
            self.erase_fixup(fix_child, fix_parent);
        }

        let node = self.node_mut(id);
        node.parent = NIL;
        node.left = NIL;
        node.right = NIL;
    }

    /// Replaces the subtree rooted at `from` with the one rooted at `to`.
    fn transplant(&mut self, from: NodeId, to: NodeId) {
        let parent = self.node(from).parent;
        if parent == NIL {
            self.root = to;
        } else if self.node(parent).left == from {
            self.node_mut(parent).left = to;
        } else {
            self.node_mut(parent).right = to;
        }
        if to != NIL {
            self.node_mut(to).parent = parent;
        }
    }

    fn erase_fixup(&mut self, mut id: NodeId, mut parent: NodeId) {
        while id != self.root && self.color_of(id) == Color::Black {
            if id == self.left_of(parent) {
                let mut sibling = self.right_of(parent);
                if self.color_of(sibling) == Color::Red {
                    self.node_mut(sibling).color = Color::Black;
                    self.node_mut(parent).color = Color::Red;
                    self.rotate_left(parent);
                    sibling = self.right_of(parent);
                }
                if self.color_of(self.left_of(sibling)) == Color::Black
                    && self.color_of(self.right_of(sibling)) == Color::Black
                {
                    if sibling != NIL {
                        self.node_mut(sibling).color = Color::Red;
                    }
                    id = parent;
                    parent = self.parent_of(id);
                } else {
                    if self.color_of(self.right_of(sibling)) == Color::Black {
                        let nephew = self.left_of(sibling);
                        self.node_mut(nephew).color = Color::Black;
                        self.node_mut(sibling).color = Color::Red;
                        self.rotate_right(sibling);
                        sibling = self.right_of(parent);
                    }
                    let parent_color = self.color_of(parent);
                    self.node_mut(sibling).color = parent_color;
                    self.node_mut(parent).color = Color::Black;
                    let nephew = self.right_of(sibling);
                    self.node_mut(nephew).color = Color::Black;
                    self.rotate_left(parent);
                    id = self.root;
                    parent = NIL;
                }
            } else {
                let mut sibling = self.left_of(parent);
                if self.color_of(sibling) == Color::Red {
                    self.node_mut(sibling).color = Color::Black;
                    self.node_mut(parent).color = Color::Red;
                    self.rotate_right(parent);
                    sibling = self.left_of(parent);
                }
                if self.color_of(self.left_of(sibling)) == Color::Black
                    && self.color_of(self.right_of(sibling)) == Color::Black
                {
                    if sibling != NIL {
                        self.node_mut(sibling).color = Color::Red;
                    }
                    id = parent;
                    parent = self.parent_of(id);
                } else {
                    if self.color_of(self.left_of(sibling)) == Color::Black {
                        let nephew = self.right_of(sibling);
                        self.node_mut(nephew).color = Color::Black;
                        self.node_mut(sibling).color = Color::Red;
                        self.rotate_left(sibling);
                        sibling = self.left_of(parent);
                    }
                    let parent_color = self.color_of(parent);
                    self.node_mut(sibling).color = parent_color;
                    self.node_mut(parent).color = Color::Black;
                    let nephew = self.left_of(sibling);
                    self.node_mut(nephew).color = Color::Black;
                    self.rotate_right(parent);
                    id = self.root;
                    parent = NIL;
                }
            }
        }
        if id != NIL {
            self.node_mut(id).color = Color::Black;
        }
    }

    fn rotate_left(&mut self, id: NodeId) {
        let pivot = self.node(id).right;
        let pivot_left = self.node(pivot).left;
        self.node_mut(id).right = pivot_left;
        if pivot_left != NIL {
            self.node_mut(pivot_left).parent = id;
        }
        let parent = self.node(id).parent;
        self.node_mut(pivot).parent = parent;
        if parent == NIL {
            self.root = pivot;
        } else if self.node(parent).left == id {
            self.node_mut(parent).left = pivot;
        } else {
            self.node_mut(parent).right = pivot;
        }
        self.node_mut(pivot).left = id;
        self.node_mut(id).parent = pivot;

        // The rotated-down node first, its subtree feeds the rotated-up one.
        self.update_max(id);
        self.update_max(pivot);
    }

    fn rotate_right(&mut self, id: NodeId) {
        let pivot = self.node(id).left;
        let pivot_right = self.node(pivot).right;
        self.node_mut(id).left = pivot_right;
        if pivot_right != NIL {
            self.node_mut(pivot_right).parent = id;
        }
        let parent = self.node(id).parent;
        self.node_mut(pivot).parent = parent;
        if parent == NIL {
            self.root = pivot;
        } else if self.node(parent).left == id {
            self.node_mut(parent).left = pivot;
        } else {
            self.node_mut(parent).right = pivot;
        }
        self.node_mut(pivot).right = id;
        self.node_mut(id).parent = pivot;

        self.update_max(id);
        self.update_max(pivot);
    }
}

#[cfg(test)]
impl<T> Tree<T> {
    /// Checks the red-black shape, the start ordering and the cached
    /// subtree maxima of the whole tree.
    pub(crate) fn assert_invariants(&self) {
        if self.root == NIL {
            assert_eq!(self.len(), 0);
            return;
        }
        assert_eq!(self.node(self.root).parent, NIL);
        assert_eq!(self.node(self.root).color, Color::Black, "root must be black");
        let (black_height, count) = self.check_subtree(self.root);
        assert!(black_height >= 1);
        assert_eq!(count, self.len());
    }

    /// Returns the black height of the subtree and the number of nodes in it.
    fn check_subtree(&self, id: NodeId) -> (usize, usize) {
        let node = self.node(id);
        assert!(
            node.interval.start < node.interval.end,
            "malformed interval {:?}",
            node.interval
        );

        let mut max_end = node.interval.end;
        if node.left != NIL {
            let left = self.node(node.left);
            assert_eq!(left.parent, id);
            assert!(left.interval.start <= node.interval.start);
            max_end = max_end.max(left.subtree_max_end);
        }
        if node.right != NIL {
            let right = self.node(node.right);
            assert_eq!(right.parent, id);
            assert!(right.interval.start > node.interval.start);
            max_end = max_end.max(right.subtree_max_end);
        }
        assert_eq!(
            node.subtree_max_end, max_end,
            "stale subtree max at {:?}",
            node.interval
        );

        if node.color == Color::Red {
            assert_eq!(self.color_of(node.left), Color::Black, "red-red edge");
            assert_eq!(self.color_of(node.right), Color::Black, "red-red edge");
        }

        let (left_height, left_count) = if node.left != NIL {
            self.check_subtree(node.left)
        } else {
            (1, 0)
        };
        let (right_height, right_count) = if node.right != NIL {
            self.check_subtree(node.right)
        } else {
            (1, 0)
        };
        assert_eq!(left_height, right_height, "black height mismatch");

        let own = if node.color == Color::Black { 1 } else { 0 };
        (left_height + own, left_count + right_count + 1)
    }
}
