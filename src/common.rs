mod lowlevel;

pub(crate) use lowlevel::{MddNode, Node, SearchRecord, StateKey, StateRef, MAX_PARENTS};

use crate::map::Map;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Grid coordinate: `x` is the column, `y` the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "[usize; 2]", into = "[usize; 2]")]
pub struct Point {
    pub x: usize,
    pub y: usize,
}

impl Point {
    pub const fn new(x: usize, y: usize) -> Self {
        Point { x, y }
    }

    /// Checked offset, `None` when it would leave the non-negative quadrant.
    pub(crate) fn offset(self, dx: isize, dy: isize) -> Option<Point> {
        Some(Point {
            x: self.x.checked_add_signed(dx)?,
            y: self.y.checked_add_signed(dy)?,
        })
    }
}

impl From<[usize; 2]> for Point {
    fn from([x, y]: [usize; 2]) -> Self {
        Point { x, y }
    }
}

impl From<Point> for [usize; 2] {
    fn from(p: Point) -> Self {
        [p.x, p.y]
    }
}

impl From<(usize, usize)> for Point {
    fn from((x, y): (usize, usize)) -> Self {
        Point { x, y }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

pub fn manhattan(a: Point, b: Point) -> usize {
    a.x.abs_diff(b.x) + a.y.abs_diff(b.y)
}

/// Forbids being at `position` at `time`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VertexConstraint {
    pub time: usize,
    pub position: Point,
}

impl VertexConstraint {
    pub fn is_violated(&self, position: Point, time: usize) -> bool {
        self.time == time && self.position == position
    }
}

/// Forbids moving between `from` and `to`, in either direction, when
/// departing at `time`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeConstraint {
    pub time: usize,
    pub from: Point,
    pub to: Point,
}

impl EdgeConstraint {
    pub fn is_violated(&self, from: Point, to: Point, departure: usize) -> bool {
        self.time == departure
            && ((self.from == from && self.to == to) || (self.from == to && self.to == from))
    }

    /// Endpoints in a canonical order, so both directions share one key.
    pub(crate) fn undirected(&self) -> (usize, Point, Point) {
        if self.from <= self.to {
            (self.time, self.from, self.to)
        } else {
            (self.time, self.to, self.from)
        }
    }

    pub fn touches(&self, position: Point) -> bool {
        self.from == position || self.to == position
    }
}

/// Positions from start to goal, one per time step.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Path(pub Vec<Point>);

impl Path {
    /// Number of moves, i.e. the arrival time at the goal.
    pub fn cost(&self) -> usize {
        self.0.len().saturating_sub(1)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn positions(&self) -> &[Point] {
        &self.0
    }

    /// Position at `time`; the agent stays on its last cell after arriving.
    pub fn position_at(&self, time: usize) -> Option<Point> {
        self.0.get(time).or_else(|| self.0.last()).copied()
    }

    /// Check the path is a legal constrained walk on `map` from `start` to
    /// `goal` that may remain at the goal forever afterwards.
    pub fn verify(&self, map: &Map, start: Point, goal: Point) -> bool {
        let (Some(&first), Some(&last)) = (self.0.first(), self.0.last()) else {
            return false;
        };
        if first != start || last != goal {
            return false;
        }

        for (time, &position) in self.0.iter().enumerate() {
            if !map.is_passable(position) || map.is_vertex_constrained(position, time) {
                return false;
            }
        }

        for (time, pair) in self.0.windows(2).enumerate() {
            let (from, to) = (pair[0], pair[1]);
            if manhattan(from, to) > 1 || map.is_edge_constrained(from, to, time) {
                return false;
            }
        }

        map.goal_horizon(goal)
            .is_none_or(|horizon| self.cost() > horizon)
    }
}

impl From<Vec<Point>> for Path {
    fn from(positions: Vec<Point>) -> Self {
        Path(positions)
    }
}

/// Layered decision diagram of every optimal constrained path.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Mdd {
    /// `counts[2 * d]` is the number of nodes at depth `d`,
    /// `counts[2 * d - 1]` the number of edges between depth `d - 1` and `d`.
    pub counts: Option<Vec<usize>>,
    /// Distinct positions at each depth, start layer first.
    pub layers: Option<Vec<Vec<Point>>>,
}

impl Mdd {
    /// Number of nodes at `depth`.
    pub fn width(&self, depth: usize) -> Option<usize> {
        if let Some(counts) = &self.counts {
            return counts.get(2 * depth).copied();
        }
        self.layers
            .as_ref()
            .and_then(|layers| layers.get(depth))
            .map(Vec::len)
    }

    /// Whether every optimal path passes through `position` at `depth`.
    ///
    /// A diagram built with counts only cannot name the position, so there
    /// `position` is taken to be on some optimal path (the caller's own path)
    /// and only the width of the layer is checked.
    pub fn is_singleton_at_position(&self, depth: usize, position: Point) -> bool {
        match &self.layers {
            Some(layers) => layers
                .get(depth)
                .is_some_and(|layer| layer.len() == 1 && layer[0] == position),
            None => self.width(depth) == Some(1),
        }
    }

    pub fn edge_count(&self) -> Option<usize> {
        self.counts
            .as_ref()
            .map(|counts| counts.iter().skip(1).step_by(2).sum())
    }
}
