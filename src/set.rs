//! Open-hashing set with a fixed number of buckets.
//!
//! Each bucket is an independent [`Sequence`]. The bucket count is chosen
//! once at creation and never changes; collisions degrade to a linear scan of
//! the bucket. `clear` keeps every bucket's storage so a set can be reused
//! for many fill/clear cycles during one search.

use crate::sequence::Sequence;

const BUCKET_CAPACITY: usize = 10;
const MIN_BUCKETS: usize = 17;

/// Hash and equality used by [`BucketSet`].
pub trait Bucketed {
    /// Bucket index in `0..buckets`.
    fn bucket(&self, buckets: usize) -> usize;

    fn same(&self, other: &Self) -> bool;
}

/// Smallest prime `>= expected`, never below a small floor.
pub fn bucket_count_for(expected: usize) -> usize {
    let mut candidate = expected.max(MIN_BUCKETS);
    while !is_prime(candidate) {
        candidate += 1;
    }
    candidate
}

fn is_prime(n: usize) -> bool {
    if n < 2 {
        return false;
    }
    if n % 2 == 0 {
        return n == 2;
    }
    let mut d = 3;
    while d * d <= n {
        if n % d == 0 {
            return false;
        }
        d += 2;
    }
    true
}

#[derive(Debug)]
pub struct BucketSet<T> {
    buckets: Vec<Sequence<T>>,
}

impl<T: Bucketed> BucketSet<T> {
    pub fn new(bucket_count: usize) -> Self {
        assert!(bucket_count > 0, "bucket set needs at least one bucket");
        BucketSet {
            buckets: (0..bucket_count)
                .map(|_| Sequence::with_capacity(BUCKET_CAPACITY))
                .collect(),
        }
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    pub fn len(&self) -> usize {
        self.buckets.iter().map(Sequence::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.iter().all(Sequence::is_empty)
    }

    /// Store `value` unless an equal element is present.
    ///
    /// Returns the stored copy so the caller can keep editing it, or `None`
    /// for a duplicate.
    pub fn add(&mut self, value: T) -> Option<&mut T> {
        let index = self.bucket_of(&value);
        let bucket = &mut self.buckets[index];
        if Self::position_in(bucket, &value).is_some() {
            return None;
        }
        bucket.append(value);
        bucket.iter_mut().last()
    }

    pub fn search(&self, key: &T) -> Option<&T> {
        let bucket = &self.buckets[self.bucket_of(key)];
        Self::position_in(bucket, key).and_then(|i| bucket.get(i))
    }

    pub fn search_mut(&mut self, key: &T) -> Option<&mut T> {
        let index = self.bucket_of(key);
        let bucket = &mut self.buckets[index];
        Self::position_in(bucket, key).and_then(move |i| bucket.get_mut(i))
    }

    pub fn contains(&self, key: &T) -> bool {
        self.search(key).is_some()
    }

    pub fn remove(&mut self, key: &T) -> bool {
        let index = self.bucket_of(key);
        let bucket = &mut self.buckets[index];
        match Self::position_in(bucket, key) {
            Some(i) => {
                bucket.remove(i);
                true
            }
            None => false,
        }
    }

    /// Visit every element, bucket by bucket.
    pub fn for_each<F>(&self, visitor: F)
    where
        F: FnMut(&T),
    {
        self.iter().for_each(visitor);
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.buckets.iter().flat_map(Sequence::iter)
    }

    /// Remove every element without giving back bucket storage.
    pub fn clear(&mut self) {
        self.buckets.iter_mut().for_each(Sequence::clear);
    }

    fn bucket_of(&self, value: &T) -> usize {
        let index = value.bucket(self.buckets.len());
        assert!(
            index < self.buckets.len(),
            "bucket index {index} out of range for {} buckets",
            self.buckets.len()
        );
        index
    }

    fn position_in(bucket: &Sequence<T>, key: &T) -> Option<usize> {
        bucket.iter().position(|item| item.same(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Entry {
        key: usize,
        payload: usize,
    }

    impl Bucketed for Entry {
        fn bucket(&self, buckets: usize) -> usize {
            self.key % buckets
        }

        fn same(&self, other: &Self) -> bool {
            self.key == other.key
        }
    }

    fn entry(key: usize) -> Entry {
        Entry { key, payload: 0 }
    }

    #[test]
    fn test_bucket_count_is_prime() {
        assert_eq!(bucket_count_for(0), 17);
        assert_eq!(bucket_count_for(100), 101);
        assert_eq!(bucket_count_for(1337), 1361);
    }

    #[test]
    fn test_add_rejects_duplicates() {
        let mut set = BucketSet::new(3);
        assert!(set.add(entry(1)).is_some());
        assert!(set.add(entry(4)).is_some());
        assert!(set.add(entry(1)).is_none());
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_add_returns_stored_copy() {
        let mut set = BucketSet::new(5);
        let stored = set.add(entry(7)).unwrap();
        stored.payload = 99;
        assert_eq!(set.search(&entry(7)).unwrap().payload, 99);

        set.search_mut(&entry(7)).unwrap().payload = 100;
        assert_eq!(set.search(&entry(7)).unwrap().payload, 100);
    }

    #[test]
    fn test_remove_and_clear() {
        let mut set = BucketSet::new(2);
        for k in 0..10 {
            set.add(entry(k));
        }
        assert!(set.remove(&entry(3)));
        assert!(!set.remove(&entry(3)));
        assert!(!set.contains(&entry(3)));
        assert_eq!(set.len(), 9);

        let mut seen = Vec::new();
        set.for_each(|e| seen.push(e.key));
        seen.sort();
        assert_eq!(seen, vec![0, 1, 2, 4, 5, 6, 7, 8, 9]);

        set.clear();
        assert!(set.is_empty());
        assert!(set.add(entry(3)).is_some());
    }

    #[test]
    #[should_panic]
    fn test_out_of_range_bucket_panics() {
        struct Bad;
        impl Bucketed for Bad {
            fn bucket(&self, buckets: usize) -> usize {
                buckets
            }
            fn same(&self, _: &Self) -> bool {
                true
            }
        }
        let mut set = BucketSet::new(4);
        set.add(Bad);
    }
}
