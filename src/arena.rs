//! Chunked bump arena for search records.
//!
//! Records are appended into fixed-length chunks. A chunk is never
//! reallocated once created, so a [`NodeId`] handed out by [`Arena::alloc`]
//! stays valid until the arena is reset or dropped. There is no per-record
//! release: everything goes away in bulk.

use std::ops::{Index, IndexMut};

/// Default number of records per chunk.
pub const DEFAULT_CHUNK_LEN: usize = 1024;

/// Stable handle to a record owned by an [`Arena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    /// Never returned by [`Arena::alloc`]; marks lookup-only entries.
    pub(crate) const DANGLING: NodeId = NodeId(u32::MAX);

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug)]
pub struct Arena<T> {
    chunks: Vec<Vec<T>>,
    chunk_len: usize,
    len: usize,
}

impl<T> Arena<T> {
    /// Create an arena with `chunk_len` records per chunk and a chunk
    /// directory pre-sized for `expected_records` records.
    pub fn new(chunk_len: usize, expected_records: usize) -> Self {
        assert!(chunk_len > 0, "arena chunk length must be non-zero");
        let expected_chunks = expected_records.div_ceil(chunk_len).max(1);
        let mut chunks = Vec::with_capacity(expected_chunks);
        chunks.push(Vec::with_capacity(chunk_len));
        Arena {
            chunks,
            chunk_len,
            len: 0,
        }
    }

    /// Move `record` into the arena and return its handle.
    pub fn alloc(&mut self, record: T) -> NodeId {
        let id = u32::try_from(self.len)
            .ok()
            .filter(|&id| id != u32::MAX)
            .expect("arena exhausted the NodeId space");

        match self.chunks.last_mut() {
            Some(chunk) if chunk.len() < self.chunk_len => chunk.push(record),
            _ => {
                let mut chunk = Vec::with_capacity(self.chunk_len);
                chunk.push(record);
                self.push_chunk(chunk);
            }
        }
        self.len += 1;

        NodeId(id)
    }

    pub fn get(&self, id: NodeId) -> Option<&T> {
        let (chunk, offset) = self.locate(id);
        self.chunks.get(chunk).and_then(|c| c.get(offset))
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut T> {
        let (chunk, offset) = self.locate(id);
        self.chunks.get_mut(chunk).and_then(|c| c.get_mut(offset))
    }

    /// Number of records allocated so far.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Drop every record at once. The first chunk keeps its storage.
    pub fn reset(&mut self) {
        self.chunks.truncate(1);
        if let Some(first) = self.chunks.first_mut() {
            first.clear();
        }
        self.len = 0;
    }

    fn push_chunk(&mut self, chunk: Vec<T>) {
        // The directory doubles when full.
        if self.chunks.len() == self.chunks.capacity() {
            self.chunks.reserve_exact(self.chunks.capacity().max(1));
        }
        self.chunks.push(chunk);
    }

    fn locate(&self, id: NodeId) -> (usize, usize) {
        (id.index() / self.chunk_len, id.index() % self.chunk_len)
    }
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Arena::new(DEFAULT_CHUNK_LEN, DEFAULT_CHUNK_LEN)
    }
}

impl<T> Index<NodeId> for Arena<T> {
    type Output = T;

    fn index(&self, id: NodeId) -> &T {
        self.get(id).expect("NodeId does not belong to this arena")
    }
}

impl<T> IndexMut<NodeId> for Arena<T> {
    fn index_mut(&mut self, id: NodeId) -> &mut T {
        self.get_mut(id).expect("NodeId does not belong to this arena")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alloc_across_chunks() {
        let mut arena = Arena::new(4, 4);
        let ids: Vec<NodeId> = (0..10).map(|i| arena.alloc(i * 10)).collect();

        assert_eq!(arena.len(), 10);
        assert_eq!(arena.chunk_count(), 3);
        for (i, id) in ids.iter().enumerate() {
            assert_eq!(arena[*id], i * 10);
        }
    }

    #[test]
    fn test_records_stay_put_when_directory_grows() {
        let mut arena = Arena::new(2, 0);
        let first = arena.alloc(String::from("first"));
        let ptr = arena.get(first).unwrap() as *const String;
        for i in 0..64 {
            arena.alloc(i.to_string());
        }
        assert_eq!(ptr, arena.get(first).unwrap() as *const String);
        assert_eq!(arena[first], "first");
    }

    #[test]
    fn test_get_mut_and_reset() {
        let mut arena = Arena::new(8, 16);
        let id = arena.alloc(1);
        arena[id] += 41;
        assert_eq!(arena.get(id), Some(&42));

        arena.reset();
        assert!(arena.is_empty());
        assert_eq!(arena.chunk_count(), 1);
        assert_eq!(arena.get(id), None);
    }
}
