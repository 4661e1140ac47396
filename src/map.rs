use anyhow::{anyhow, Context};
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::fs;
use std::str::FromStr;

use crate::common::{EdgeConstraint, Point, VertexConstraint};
use crate::error::SearchError;

// Up, down, left, right, stay.
const DIRECTIONS: [(isize, isize); 5] = [(0, -1), (0, 1), (-1, 0), (1, 0), (0, 0)];

#[derive(Debug, Clone)]
pub struct Tile {
    passable: bool,
    pub neighbors: Vec<Point>, // Accessible cells, including the tile itself for waiting
}

impl Tile {
    pub fn is_passable(&self) -> bool {
        self.passable
    }
}

/// Static occupancy grid plus the time-indexed constraints of one agent.
#[derive(Debug, Clone)]
pub struct Map {
    pub height: usize,
    pub width: usize,
    grid: Vec<Vec<Tile>>,
    vertex_constraints: HashSet<VertexConstraint>,
    edge_constraints: HashSet<(usize, Point, Point)>,
    // Latest constraint time touching each cell.
    horizons: HashMap<Point, usize>,
    // Latest vertex constraint time per cell.
    last_forbidden: HashMap<Point, usize>,
}

impl Map {
    /// Build from row-major occupancy bytes: 0 is free, anything else blocked.
    pub fn from_bytes(width: usize, height: usize, cells: &[u8]) -> Result<Self, SearchError> {
        let expected = width * height;
        if cells.len() != expected {
            return Err(SearchError::GridShape {
                width,
                height,
                expected,
                actual: cells.len(),
            });
        }

        let grid = cells
            .chunks(width.max(1))
            .take(height)
            .map(|row| {
                row.iter()
                    .map(|&cell| Tile {
                        passable: cell == 0,
                        neighbors: Vec::new(),
                    })
                    .collect()
            })
            .collect();

        Ok(Self::from_grid(width, height, grid))
    }

    /// Load a MovingAI `.map` file.
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content =
            fs::read_to_string(path).with_context(|| format!("cannot read map file {path}"))?;
        content
            .parse()
            .with_context(|| format!("malformed map file {path}"))
    }

    fn from_grid(width: usize, height: usize, grid: Vec<Vec<Tile>>) -> Self {
        let mut map = Map {
            height,
            width,
            grid,
            vertex_constraints: HashSet::new(),
            edge_constraints: HashSet::new(),
            horizons: HashMap::new(),
            last_forbidden: HashMap::new(),
        };
        map.initialize_neighbors();
        map
    }

    /// Replace the constraints attached to this map.
    pub fn with_constraints(
        mut self,
        vertex: impl IntoIterator<Item = VertexConstraint>,
        edge: impl IntoIterator<Item = EdgeConstraint>,
    ) -> Self {
        self.vertex_constraints.clear();
        self.edge_constraints.clear();
        self.horizons.clear();
        self.last_forbidden.clear();

        for constraint in vertex {
            self.bump_horizon(constraint.position, constraint.time);
            let last = self
                .last_forbidden
                .entry(constraint.position)
                .or_insert(constraint.time);
            *last = (*last).max(constraint.time);
            self.vertex_constraints.insert(constraint);
        }
        for constraint in edge {
            self.bump_horizon(constraint.from, constraint.time);
            self.bump_horizon(constraint.to, constraint.time);
            self.edge_constraints.insert(constraint.undirected());
        }
        self
    }

    fn bump_horizon(&mut self, position: Point, time: usize) {
        let horizon = self.horizons.entry(position).or_insert(time);
        *horizon = (*horizon).max(time);
    }

    fn initialize_neighbors(&mut self) {
        for y in 0..self.height {
            for x in 0..self.width {
                if self.grid[y][x].passable {
                    self.grid[y][x].neighbors = self.static_neighbors(Point::new(x, y));
                }
            }
        }
    }

    fn static_neighbors(&self, position: Point) -> Vec<Point> {
        DIRECTIONS
            .iter()
            .filter_map(|&(dx, dy)| position.offset(dx, dy))
            .filter(|&next| self.is_passable(next))
            .collect()
    }

    pub fn in_bounds(&self, position: Point) -> bool {
        position.x < self.width && position.y < self.height
    }

    /// Out-of-bounds cells count as blocked.
    pub fn is_passable(&self, position: Point) -> bool {
        self.tile(position).is_some_and(Tile::is_passable)
    }

    fn tile(&self, position: Point) -> Option<&Tile> {
        self.grid.get(position.y).and_then(|row| row.get(position.x))
    }

    pub fn is_vertex_constrained(&self, position: Point, time: usize) -> bool {
        self.vertex_constraints
            .contains(&VertexConstraint { time, position })
    }

    pub fn is_edge_constrained(&self, from: Point, to: Point, departure: usize) -> bool {
        let constraint = EdgeConstraint {
            time: departure,
            from,
            to,
        };
        self.edge_constraints.contains(&constraint.undirected())
    }

    pub fn vertex_constraints(&self) -> impl Iterator<Item = &VertexConstraint> {
        self.vertex_constraints.iter()
    }

    pub fn constraint_count(&self) -> usize {
        self.vertex_constraints.len() + self.edge_constraints.len()
    }

    /// Moves allowed from `position` departing at `time`, in the order up,
    /// down, left, right, wait.
    ///
    /// At the goal, waiting is dropped while a vertex constraint on the goal
    /// lies later than `time`: the agent has to step off and come back.
    pub fn neighbors(&self, time: usize, position: Point, at_goal: bool) -> Vec<Point> {
        let Some(tile) = self.tile(position) else {
            return Vec::new();
        };
        let last_forbidden = if at_goal {
            self.last_vertex_constraint(position)
        } else {
            None
        };

        tile.neighbors
            .iter()
            .copied()
            .filter(|&next| !self.is_vertex_constrained(next, time + 1))
            .filter(|&next| !self.is_edge_constrained(position, next, time))
            .filter(|&next| next != position || last_forbidden.is_none_or(|last| last <= time))
            .collect()
    }

    /// Latest time at which `position` is forbidden by a vertex constraint.
    pub fn last_vertex_constraint(&self, position: Point) -> Option<usize> {
        self.last_forbidden.get(&position).copied()
    }

    /// Latest time referenced by a constraint on `goal`, if any. An arrival
    /// at time `g` is final only when `g` is strictly later.
    pub fn goal_horizon(&self, goal: Point) -> Option<usize> {
        self.horizons.get(&goal).copied()
    }

    /// Whether `goal` can be reached from `start` on the static grid.
    pub fn is_reachable(&self, start: Point, goal: Point) -> bool {
        self.is_passable(start)
            && self.is_passable(goal)
            && self.distances_from(goal)[start.y][start.x] != usize::MAX
    }

    /// Unconstrained shortest distance from every cell to `goal`.
    pub fn distances_from(&self, goal: Point) -> Vec<Vec<usize>> {
        let mut distance = vec![vec![usize::MAX; self.width]; self.height];
        if !self.is_passable(goal) {
            return distance;
        }
        let mut heap = BinaryHeap::new();

        distance[goal.y][goal.x] = 0;
        heap.push((Reverse(0), goal));

        while let Some((Reverse(cost), current)) = heap.pop() {
            if cost > distance[current.y][current.x] {
                continue;
            }

            for &next in &self.grid[current.y][current.x].neighbors {
                let next_cost = cost + 1;
                if next_cost < distance[next.y][next.x] {
                    heap.push((Reverse(next_cost), next));
                    distance[next.y][next.x] = next_cost;
                }
            }
        }

        distance
    }
}

impl FromStr for Map {
    type Err = anyhow::Error;

    fn from_str(content: &str) -> anyhow::Result<Self> {
        let mut lines = content.lines();

        let _type = lines.next().ok_or_else(|| anyhow!("missing type line"))?;
        let mut header = |name: &str| -> anyhow::Result<usize> {
            let line = lines
                .next()
                .ok_or_else(|| anyhow!("missing {name} line"))?;
            let value = line
                .split_whitespace()
                .last()
                .ok_or_else(|| anyhow!("empty {name} line"))?;
            value
                .parse::<usize>()
                .with_context(|| format!("bad {name} value {value:?}"))
        };
        let height = header("height")?;
        let width = header("width")?;
        let _map = lines.next().ok_or_else(|| anyhow!("missing map line"))?;

        let mut grid = Vec::with_capacity(height);
        for line in lines.take(height) {
            let row: Vec<Tile> = line
                .chars()
                .take(width)
                .map(|ch| Tile {
                    passable: ch == '.',
                    neighbors: Vec::new(),
                })
                .collect();
            if row.len() != width {
                return Err(anyhow!("row {} has {} cells, expected {width}", grid.len(), row.len()));
            }
            grid.push(row);
        }
        if grid.len() != height {
            return Err(anyhow!("found {} rows, expected {height}", grid.len()));
        }

        Ok(Self::from_grid(width, height, grid))
    }
}
