//! A coalescing interval map: half-open `[start, end)` ranges of `u64`
//! addresses, each tagged with an attribute, kept pairwise disjoint in an
//! augmented red-black tree. Inserting over existing ranges overwrites
//! them (completely or in part, shrinking or splitting the old ranges as
//! needed), and touching ranges with an equal attribute are merged into
//! one.

mod arena;
mod error;
mod inorder_iterator;
mod interval;
mod node;
mod tree;

pub use error::Error;
pub use inorder_iterator::InorderIterator;
pub use interval::Interval;

use node::{NodeId, NIL};
use std::fmt::{Debug, Formatter};
use tree::Tree;

/// A map from half-open `u64` ranges to attributes of type `T`.
///
/// Each address carries at most one attribute. `add` assigns an attribute
/// to a range, `delete` removes whatever is stored on a range, and the
/// lookups report the attribute of the lowest overlapping range. All
/// operations are logarithmic in the number of stored ranges.
///
/// The map does not lock; callers that share one across threads serialize
/// access themselves.
///
/// # Example
/// ```rust
/// use interval_map::IntervalMap;
///
/// let mut map = IntervalMap::new();
/// map.add(10, 20, "reserved").unwrap();
/// map.add(20, 30, "reserved").unwrap();
///
/// // Touching ranges with an equal attribute become one.
/// assert_eq!(map.len(), 1);
/// assert_eq!(map.lookup_point(25), Ok(&"reserved"));
///
/// map.delete(14, 16).unwrap();
/// assert!(map.lookup_point(15).is_err());
/// ```
#[derive(Clone)]
pub struct IntervalMap<T> {
    tree: Tree<T>,
}

impl<T> IntervalMap<T> {
    /// Creates an empty map with an unbounded node pool.
    pub fn new() -> Self {
        Self { tree: Tree::new() }
    }

    /// Creates an empty map whose pool holds at most `limit` live nodes.
    ///
    /// Operations that need a node beyond the limit fail with
    /// [`Error::OutOfMemory`] and leave the stored ranges consistent.
    pub fn with_node_limit(limit: usize) -> Self {
        Self {
            tree: Tree::with_node_limit(limit),
        }
    }

    /// The number of stored ranges.
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Removes every stored range.
    pub fn clear(&mut self) {
        self.tree.clear();
    }

    /// Visits the stored ranges in order of their start address.
    pub fn iter(&self) -> InorderIterator<'_, T> {
        InorderIterator::new(&self.tree)
    }

    /// Returns the attribute of the lowest stored range that overlaps
    /// `[start, end)`. If the range overlaps several stored ranges only
    /// the first one is reported.
    pub fn lookup_range(&self, start: u64, end: u64) -> Result<&T, Error> {
        if end <= start {
            return Err(Error::InvalidRange);
        }
        let hit = self.tree.lowest_overlap(Interval::new(start, end));
        if hit == NIL {
            Err(Error::NotFound)
        } else {
            Ok(&self.tree.node(hit).value)
        }
    }

    /// Returns the attribute stored at a single address.
    pub fn lookup_point(&self, addr: u64) -> Result<&T, Error> {
        let end = addr.checked_add(1).ok_or(Error::NotFound)?;
        self.lookup_range(addr, end)
    }
}

impl<T: Clone + Eq> IntervalMap<T> {
    /// Assigns `value` to every address in `[start, end)`, overwriting any
    /// attribute previously stored there. Stored ranges that reach past
    /// the boundaries are shrunk or split; the result is coalesced with
    /// equal-valued neighbours.
    pub fn add(&mut self, start: u64, end: u64, value: T) -> Result<(), Error> {
        if end <= start {
            return Err(Error::InvalidRange);
        }
        let new = self
            .tree
            .alloc(Interval::new(start, end), value)
            .ok_or(Error::OutOfMemory)?;
        self.splice_in(new)
    }

    /// Removes any stored attribute from `[start, end)`. Ranges reaching
    /// past the boundaries keep their attribute outside of it.
    pub fn delete(&mut self, start: u64, end: u64) -> Result<(), Error> {
        if end <= start {
            return Err(Error::InvalidRange);
        }
        self.carve_out(Interval::new(start, end))
    }

    /// Places a detached node, resolving every stored range it overlaps.
    ///
    /// Walks in order from the lowest overlap, classifying how each stored
    /// range relates to the new one. The successor is taken before the
    /// current node is touched; shrunk ranges keep their start ordering, so
    /// the saved successor stays valid across the reinsertion.
    fn splice_in(&mut self, new: NodeId) -> Result<(), Error> {
        let range = self.tree.node(new).interval;
        let mut cursor = self.tree.lowest_overlap(range);

        while cursor != NIL {
            let succ = self.tree.next(cursor);
            let old = self.tree.node(cursor).interval;

            if old.start >= range.end {
                break;
            }

            if range == old {
                // Exact match, only the attribute changes:
                //
                // old
                // |___________________|
                // new
                // |___________________|
                //
                // The new attribute may match a touching neighbour, so the
                // overwritten range still goes through the merge step.
                let value = self.tree.release(new).value;
                self.tree.node_mut(cursor).value = value;
                self.coalesce_neighbours(cursor);
                return Ok(());
            } else if range.start <= old.start && range.end >= old.end {
                // The new range completely covers the old one, which goes
                // away:
                //
                //      old
                //      |________|
                // new
                // |___________________|
                self.tree.erase(cursor);
                self.tree.release(cursor);
            } else if range.start <= old.start {
                // The new range covers the head of the old one, whose
                // start moves up:
                //
                //       old                        new         old
                //       |_____________|    =>      |___________|_______|
                // new
                // |___________|
                self.tree.erase(cursor);
                self.tree.node_mut(cursor).interval.start = range.end;
                self.insert_coalesced(cursor);
                break;
            } else if range.end >= old.end {
                // The new range covers the tail of the old one, whose end
                // moves down:
                //
                // old                              old      new
                // |_____________|          =>      |________|__________|
                //          new
                //          |___________|
                self.tree.erase(cursor);
                self.tree.node_mut(cursor).interval.end = range.start;
                self.insert_coalesced(cursor);
            } else {
                // The new range sits strictly inside the old one.
                if self.tree.node(cursor).value == self.tree.node(new).value {
                    // Equal attribute, the old range already covers it.
                    self.tree.release(new);
                    return Ok(());
                }
                // The old range splits around the new one:
                //
                // old
                // |___________________|    =>      head  new     old
                //       new                        |_____|_______|_____|
                //       |_______|
                //
                // The head fragment is allocated before anything is
                // unlinked, so running out of nodes leaves the map as it
                // was.
                let head_value = self.tree.node(cursor).value.clone();
                let head_range = Interval::new(old.start, range.start);
                let head = match self.tree.alloc(head_range, head_value) {
                    Some(id) => id,
                    None => {
                        self.tree.release(new);
                        return Err(Error::OutOfMemory);
                    }
                };
                self.tree.erase(cursor);
                self.tree.node_mut(cursor).interval.start = range.end;
                self.insert_coalesced(cursor);
                self.insert_coalesced(new);
                self.insert_coalesced(head);
                return Ok(());
            }

            cursor = succ;
        }

        self.insert_coalesced(new);
        Ok(())
    }

    /// Clears a range, truncating or splitting the stored ranges around it.
    /// The mirror of `splice_in` without a node to place: clearing only
    /// removes coverage, so no new coalescing opportunities can appear.
    fn carve_out(&mut self, range: Interval) -> Result<(), Error> {
        let mut cursor = self.tree.lowest_overlap(range);

        while cursor != NIL {
            let succ = self.tree.next(cursor);
            let old = self.tree.node(cursor).interval;

            if old.start >= range.end {
                break;
            }

            if range.start <= old.start && range.end >= old.end {
                // Completely erase the old range:
                //
                //      old
                //      |________|
                // clear
                // |___________________|
                self.tree.erase(cursor);
                self.tree.release(cursor);
            } else if range.start <= old.start {
                // Trim the beginning of the old range:
                //
                //       old
                //       |_____________|    =>                  old
                // clear                                        |_______|
                // |___________|
                self.tree.erase(cursor);
                self.tree.node_mut(cursor).interval.start = range.end;
                self.insert_coalesced(cursor);
                break;
            } else if range.end >= old.end {
                // Trim the end of the old range:
                //
                // old
                // |_____________|          =>      old
                //          clear                   |________|
                //          |___________|
                self.tree.erase(cursor);
                self.tree.node_mut(cursor).interval.end = range.start;
                self.insert_coalesced(cursor);
            } else {
                // Punch a hole through the middle of the old range:
                //
                // old
                // |___________________|    =>      head          old
                //       clear                      |_____|       |_____|
                //       |_______|
                let head_value = self.tree.node(cursor).value.clone();
                let head_range = Interval::new(old.start, range.start);
                let head = self
                    .tree
                    .alloc(head_range, head_value)
                    .ok_or(Error::OutOfMemory)?;
                self.tree.erase(cursor);
                self.tree.node_mut(cursor).interval.start = range.end;
                self.insert_coalesced(cursor);
                self.insert_coalesced(head);
                break;
            }

            cursor = succ;
        }

        Ok(())
    }

    /// Links a detached node, then merges it with any touching neighbour
    /// that carries the same attribute.
    fn insert_coalesced(&mut self, id: NodeId) {
        self.tree.insert(id);
        self.coalesce_neighbours(id);
    }

    /// Merges a linked node with its touching equal-attribute neighbours.
    /// The successor side goes first; the node may be absorbed into its
    /// predecessor and freed, so its id must not be used afterwards.
    fn coalesce_neighbours(&mut self, id: NodeId) {
        let succ = self.tree.next(id);
        let pred = self.tree.prev(id);
        if succ != NIL {
            self.merge_adjacent(id, succ);
        }
        if pred != NIL {
            self.merge_adjacent(pred, id);
        }
    }

    /// Absorbs `later` into `earlier` when the two touch and carry the
    /// same attribute. `later` is freed in that case.
    fn merge_adjacent(&mut self, earlier: NodeId, later: NodeId) {
        let earlier_node = self.tree.node(earlier);
        let later_node = self.tree.node(later);
        if !earlier_node.interval.touches(&later_node.interval)
            || earlier_node.value != later_node.value
        {
            return;
        }
        let end = later_node.interval.end;
        self.tree.extend_end(earlier, end);
        self.tree.erase(later);
        self.tree.release(later);
    }
}

impl<T> Default for IntervalMap<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Debug> Debug for IntervalMap<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<'a, T> IntoIterator for &'a IntervalMap<T> {
    type Item = (Interval, &'a T);
    type IntoIter = InorderIterator<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
