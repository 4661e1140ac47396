use crate::arena::NodeId;
use crate::error::SearchError;
use crate::set::Bucketed;

use super::Point;

use arrayvec::ArrayVec;

/// Up, down, left, right and wait.
pub(crate) const MAX_PARENTS: usize = 5;

/// Identity of a time-expanded state. The same cell at two different times
/// is two different states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct StateKey {
    pub(crate) g: usize,
    pub(crate) position: Point,
}

fn cantor(a: u64, b: u64) -> u64 {
    (a.wrapping_add(b)
        .wrapping_add(1)
        .wrapping_mul(a.wrapping_add(b))
        / 2)
        .wrapping_add(b)
}

impl StateKey {
    pub(crate) fn hash_into(&self, buckets: usize) -> usize {
        let (x, y, t) = (self.position.x as u64, self.position.y as u64, self.g as u64);
        (cantor(x, cantor(y, t)) % buckets as u64) as usize
    }
}

/// Closed-list and layer entry: an arena record plus its key, so the set
/// never has to look into the arena to hash or compare.
#[derive(Debug, Clone, Copy)]
pub(crate) struct StateRef {
    pub(crate) key: StateKey,
    pub(crate) id: NodeId,
}

impl StateRef {
    /// Probe value for lookups by key alone.
    pub(crate) fn probe(key: StateKey) -> Self {
        StateRef {
            key,
            id: NodeId::DANGLING,
        }
    }
}

impl Bucketed for StateRef {
    fn bucket(&self, buckets: usize) -> usize {
        self.key.hash_into(buckets)
    }

    fn same(&self, other: &Self) -> bool {
        self.key.g == other.key.g && self.key.position == other.key.position
    }
}

/// What the generic search loop needs from a record type.
pub(crate) trait SearchRecord: Clone {
    fn start(position: Point, h: usize) -> Self;

    fn successor(position: Point, g: usize, f: usize, parent: NodeId) -> Self;

    fn position(&self) -> Point;

    fn g(&self) -> usize;

    fn f(&self) -> usize;

    fn key(&self) -> StateKey {
        StateKey {
            g: self.g(),
            position: self.position(),
        }
    }
}

/// State of the single-path search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Node {
    pub(crate) position: Point,
    pub(crate) g: usize,
    pub(crate) f: usize,
    pub(crate) parent: Option<NodeId>,
}

impl SearchRecord for Node {
    fn start(position: Point, h: usize) -> Self {
        Node {
            position,
            g: 0,
            f: h,
            parent: None,
        }
    }

    fn successor(position: Point, g: usize, f: usize, parent: NodeId) -> Self {
        Node {
            position,
            g,
            f,
            parent: Some(parent),
        }
    }

    fn position(&self) -> Point {
        self.position
    }

    fn g(&self) -> usize {
        self.g
    }

    fn f(&self) -> usize {
        self.f
    }
}

/// State of the all-paths search. Parents are kept in the order they were
/// recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MddNode {
    pub(crate) position: Point,
    pub(crate) g: usize,
    pub(crate) f: usize,
    parents: ArrayVec<NodeId, MAX_PARENTS>,
}

impl MddNode {
    pub(crate) fn parents(&self) -> &[NodeId] {
        &self.parents
    }

    pub(crate) fn add_parent(&mut self, parent: NodeId) -> Result<(), SearchError> {
        debug_assert!(
            !self.parents.is_full(),
            "{} at time {} gained a sixth parent",
            self.position,
            self.g
        );
        self.parents
            .try_push(parent)
            .map_err(|_| SearchError::ParentOverflow {
                position: self.position,
                time: self.g,
            })
    }
}

impl SearchRecord for MddNode {
    fn start(position: Point, h: usize) -> Self {
        MddNode {
            position,
            g: 0,
            f: h,
            parents: ArrayVec::new(),
        }
    }

    fn successor(position: Point, g: usize, f: usize, parent: NodeId) -> Self {
        let mut parents = ArrayVec::new();
        parents.push(parent);
        MddNode {
            position,
            g,
            f,
            parents,
        }
    }

    fn position(&self) -> Point {
        self.position
    }

    fn g(&self) -> usize {
        self.g
    }

    fn f(&self) -> usize {
        self.f
    }
}
