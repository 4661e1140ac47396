//! Growable contiguous sequence with explicit doubling, linear or binary
//! search and an optional release hook.
//!
//! This is the storage used by the bucket set and by the frontier.

use std::cmp::Ordering;
use std::fmt;

const DEFAULT_CAPACITY: usize = 10;

/// Called on every element the sequence disposes of itself, on `clear` and
/// on drop. Elements handed back by `remove` and `pop` belong to the caller
/// and are not passed to it.
pub type ReleaseFn<T> = fn(&mut T);

pub struct Sequence<T> {
    items: Vec<T>,
    release: Option<ReleaseFn<T>>,
}

impl<T> Sequence<T> {
    /// A capacity of zero falls back to the default.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = if capacity == 0 {
            DEFAULT_CAPACITY
        } else {
            capacity
        };
        Sequence {
            items: Vec::with_capacity(capacity),
            release: None,
        }
    }

    pub fn with_release(capacity: usize, release: ReleaseFn<T>) -> Self {
        let mut sequence = Self::with_capacity(capacity);
        sequence.release = Some(release);
        sequence
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.items.capacity()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.items.get_mut(index)
    }

    pub fn last(&self) -> Option<&T> {
        self.items.last()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.items.iter_mut()
    }

    pub fn append(&mut self, value: T) {
        self.grow_if_full();
        self.items.push(value);
    }

    /// Insert at `index`, shifting the tail right.
    ///
    /// # Panics
    ///
    /// Panics if `index > len`.
    pub fn insert(&mut self, index: usize, value: T) {
        assert!(
            index <= self.items.len(),
            "insert index {index} out of range for length {}",
            self.items.len()
        );
        self.grow_if_full();
        self.items.insert(index, value);
    }

    /// Remove the element at `index`, shifting the tail left.
    pub fn remove(&mut self, index: usize) -> T {
        self.items.remove(index)
    }

    /// Remove the last element without shifting anything.
    pub fn pop(&mut self) -> Option<T> {
        self.items.pop()
    }

    /// Empty the sequence, keeping its storage.
    pub fn clear(&mut self) {
        self.run_release();
        self.items.clear();
    }

    /// Find the index of an element for which `probe` returns `Equal`.
    ///
    /// With `sorted` the sequence must be ordered consistently with `probe`
    /// and a binary search is used, otherwise elements are scanned in order.
    pub fn search<F>(&self, mut probe: F, sorted: bool) -> Option<usize>
    where
        F: FnMut(&T) -> Ordering,
    {
        if sorted {
            self.items.binary_search_by(probe).ok()
        } else {
            self.items
                .iter()
                .position(|item| probe(item) == Ordering::Equal)
        }
    }

    /// First index whose element does not satisfy `pred`, for a sequence
    /// partitioned by `pred`.
    pub fn partition_point<P>(&self, pred: P) -> usize
    where
        P: FnMut(&T) -> bool,
    {
        self.items.partition_point(pred)
    }

    pub fn sort_by<F>(&mut self, cmp: F)
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        self.items.sort_by(cmp);
    }

    fn grow_if_full(&mut self) {
        if self.items.len() == self.items.capacity() {
            let additional = self.items.capacity().max(1);
            self.items.reserve_exact(additional);
        }
    }

    fn run_release(&mut self) {
        if let Some(release) = self.release {
            self.items.iter_mut().for_each(release);
        }
    }
}

impl<T> Default for Sequence<T> {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl<T> Drop for Sequence<T> {
    fn drop(&mut self) {
        self.run_release();
    }
}

impl<T: fmt::Debug> fmt::Debug for Sequence<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.items.iter()).finish()
    }
}

impl<'a, T> IntoIterator for &'a Sequence<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
