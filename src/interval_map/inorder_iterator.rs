use crate::interval_map::node::{NodeId, NIL};
use crate::interval_map::tree::Tree;
use crate::interval_map::Interval;

/// Iterates the stored intervals in order, i.e. earlier-starting ranges
/// first. Entries are borrowed views; holding the iterator keeps the map
/// borrowed and therefore unchanged.
#[derive(Debug)]
pub struct InorderIterator<'a, T> {
    tree: &'a Tree<T>,
    cursor: NodeId,
}

impl<'a, T> InorderIterator<'a, T> {
    pub(crate) fn new(tree: &'a Tree<T>) -> Self {
        Self {
            tree,
            cursor: tree.first(),
        }
    }
}

impl<'a, T> Iterator for InorderIterator<'a, T> {
    type Item = (Interval, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor == NIL {
            return None;
        }
        let node = self.tree.node(self.cursor);
        self.cursor = self.tree.next(self.cursor);
        Some((node.interval, &node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.cursor == NIL {
            (0, Some(0))
        } else {
            (1, Some(self.tree.len()))
        }
    }
}

#[cfg(test)]
mod test {
    use crate::interval_map::IntervalMap;

    #[test]
    fn iteration_is_ordered_by_start() {
        let mut map = IntervalMap::new();
        map.add(30, 40, 'c').unwrap();
        map.add(10, 20, 'a').unwrap();
        map.add(22, 28, 'b').unwrap();

        let entries: Vec<_> = map.iter().map(|(iv, v)| (iv.start, iv.end, *v)).collect();
        assert_eq!(
            entries,
            vec![(10, 20, 'a'), (22, 28, 'b'), (30, 40, 'c')]
        );
    }

    #[test]
    fn size_hint_bounds_the_walk() {
        let mut map = IntervalMap::new();
        for i in 0..6u64 {
            map.add(i * 10, i * 10 + 5, i).unwrap();
        }
        let (min, max) = map.iter().size_hint();
        assert_eq!(min, 1);
        assert_eq!(max, Some(6));
        assert_eq!(map.iter().count(), 6);

        let map = IntervalMap::<u64>::new();
        assert_eq!(map.iter().size_hint(), (0, Some(0)));
    }
}
