//! Open list kept as a perpetually sorted sequence.
//!
//! Elements are sorted by ascending priority, so the element to extract next
//! always sits at the tail and `dequeue` is O(1). `enqueue` binary-searches
//! its slot (O(log n)) and shifts the tail (O(n)).
//!
//! A new element is placed after every element of equal priority, which
//! makes extraction LIFO among ties. Search results depend on this.

use std::cmp::Ordering;

use crate::sequence::Sequence;

/// `Greater` when the first argument must be extracted before the second.
pub type PriorityFn<T> = fn(&T, &T) -> Ordering;

pub struct Frontier<T> {
    items: Sequence<T>,
    priority: PriorityFn<T>,
}

impl<T> Frontier<T> {
    pub fn new(capacity: usize, priority: PriorityFn<T>) -> Self {
        Frontier {
            items: Sequence::with_capacity(capacity),
            priority,
        }
    }

    pub fn enqueue(&mut self, value: T) {
        let priority = self.priority;
        let slot = self
            .items
            .partition_point(|item| priority(item, &value) != Ordering::Greater);
        self.items.insert(slot, value);
    }

    /// Remove the element with the highest priority.
    pub fn dequeue(&mut self) -> Option<T> {
        self.items.pop()
    }

    pub fn peek(&self) -> Option<&T> {
        self.items.last()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // (priority, tag): higher priority value leaves first.
    fn by_first(a: &(u32, char), b: &(u32, char)) -> Ordering {
        a.0.cmp(&b.0)
    }

    #[test]
    fn test_dequeue_highest_first() {
        let mut frontier = Frontier::<(u32, char)>::new(1, by_first);
        for p in [3, 9, 1, 5, 7] {
            frontier.enqueue((p, 'x'));
        }
        let order: Vec<u32> = std::iter::from_fn(|| frontier.dequeue().map(|(p, _)| p)).collect();
        assert_eq!(order, vec![9, 7, 5, 3, 1]);
        assert!(frontier.dequeue().is_none());
    }

    #[test]
    fn test_ties_leave_in_lifo_order() {
        let mut frontier = Frontier::<(u32, char)>::new(4, by_first);
        frontier.enqueue((2, 'a'));
        frontier.enqueue((1, 'z'));
        frontier.enqueue((2, 'b'));
        frontier.enqueue((2, 'c'));

        assert_eq!(frontier.peek(), Some(&(2, 'c')));
        assert_eq!(frontier.dequeue(), Some((2, 'c')));
        assert_eq!(frontier.dequeue(), Some((2, 'b')));
        assert_eq!(frontier.dequeue(), Some((2, 'a')));
        assert_eq!(frontier.dequeue(), Some((1, 'z')));
        assert!(frontier.is_empty());
    }
}
