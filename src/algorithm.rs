mod astar;
mod mdd;

pub use astar::a_star_search;
pub use mdd::{mdd_search, MddOptions};

use crate::arena::{Arena, NodeId};
use crate::common::{
    manhattan, EdgeConstraint, Mdd, Path, Point, SearchRecord, StateKey, StateRef,
    VertexConstraint,
};
use crate::error::SearchError;
use crate::frontier::{Frontier, PriorityFn};
use crate::map::Map;
use crate::set::{bucket_count_for, BucketSet};
use crate::stat::Stats;

use serde::Serialize;
use std::cmp::Ordering;
use std::time::Instant;
use tracing::{debug, trace};

const ARENA_CHUNK_LEN: usize = 256;

/// Caller-imposed bound on a search. The time axis is unbounded, so a goal
/// that is statically reachable but blocked by constraints for a long time
/// may need many expansions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchLimits {
    pub max_expansions: Option<usize>,
}

/// Order among frontier entries with equal `f`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TieBreak {
    /// Higher `g` first; reaches the goal with fewer expansions.
    PreferDeeper,
    /// Lower `g` first; every state of a given `f` is expanded in depth
    /// order, so all predecessors of a state are merged before it matters.
    PreferShallower,
}

impl TieBreak {
    fn priority<R: SearchRecord>(self) -> PriorityFn<R> {
        match self {
            TieBreak::PreferDeeper => prefer_deeper::<R>,
            TieBreak::PreferShallower => prefer_shallower::<R>,
        }
    }
}

fn prefer_deeper<R: SearchRecord>(a: &R, b: &R) -> Ordering {
    b.f().cmp(&a.f()).then_with(|| a.g().cmp(&b.g()))
}

fn prefer_shallower<R: SearchRecord>(a: &R, b: &R) -> Ordering {
    b.f().cmp(&a.f()).then_with(|| b.g().cmp(&a.g()))
}

/// What to do when a popped state is already closed.
pub(crate) enum DuplicatePolicy<R> {
    Discard,
    /// Fold the popped record into the stored one.
    Merge(fn(&mut R, &R) -> Result<(), SearchError>),
}

pub(crate) struct Strategy<R> {
    pub(crate) tie_break: TieBreak,
    pub(crate) duplicates: DuplicatePolicy<R>,
}

/// Time-expanded A* shared by both searches. Returns the arena id of the
/// accepted goal record.
pub(crate) fn explore<R: SearchRecord>(
    map: &Map,
    start: Point,
    goal: Point,
    arena: &mut Arena<R>,
    strategy: &Strategy<R>,
    limits: SearchLimits,
    stats: &mut Stats,
) -> Result<Option<NodeId>, SearchError> {
    if !map.is_reachable(start, goal) {
        debug!("goal {goal} is not reachable from {start} on the static grid");
        return Ok(None);
    }
    if map.is_vertex_constrained(start, 0) {
        debug!("start {start} is forbidden at time 0");
        return Ok(None);
    }

    let horizon = map.goal_horizon(goal);
    debug!("goal horizon: {horizon:?}");

    let cells = map.width * map.height;
    let mut closed = BucketSet::new(bucket_count_for(cells));
    let mut open = Frontier::new(cells / 2 + 1, strategy.tie_break.priority::<R>());

    open.enqueue(R::start(start, manhattan(start, goal)));

    while let Some(current) = open.dequeue() {
        let at_goal = current.position() == goal;
        let key = current.key();
        if at_goal && horizon.is_none_or(|h| current.g() > h) {
            let goal_id = arena.alloc(current);
            if let DuplicatePolicy::Merge(merge) = strategy.duplicates {
                // Alternative optimal arrivals still waiting in the frontier.
                while open.peek().is_some_and(|next| next.key() == key) {
                    if let Some(next) = open.dequeue() {
                        merge(&mut arena[goal_id], &next)?;
                        stats.merged_parents += 1;
                    }
                }
            }
            stats.arena_records += arena.len();
            return Ok(Some(goal_id));
        }

        if let Some(existing) = closed.search(&StateRef::probe(key)).map(|entry| entry.id) {
            match strategy.duplicates {
                DuplicatePolicy::Discard => stats.duplicate_nodes += 1,
                DuplicatePolicy::Merge(merge) => {
                    merge(&mut arena[existing], &current)?;
                    stats.merged_parents += 1;
                }
            }
            continue;
        }

        if let Some(limit) = limits.max_expansions {
            if stats.expanded_nodes >= limit {
                return Err(SearchError::ExpansionLimit(limit));
            }
        }

        trace!("expand node: {:?} g {} f {}", current.position(), current.g(), current.f());
        stats.expanded_nodes += 1;

        let (g, position) = (current.g(), current.position());
        let id = arena.alloc(current);
        closed.add(StateRef { key, id });

        // Uniform cost, so g is also the time step.
        let next_g = g + 1;
        for next in map.neighbors(g, position, at_goal) {
            let next_key = StateKey {
                g: next_g,
                position: next,
            };
            if closed.contains(&StateRef::probe(next_key)) {
                continue;
            }
            open.enqueue(R::successor(next, next_g, next_g + manhattan(next, goal), id));
            stats.generated_nodes += 1;
        }
    }

    debug!("cannot find solution");
    stats.arena_records += arena.len();
    Ok(None)
}

pub(crate) fn new_arena<R>(map: &Map) -> Arena<R> {
    Arena::new(ARENA_CHUNK_LEN, map.width * map.height)
}

/// Flattened input in the shape used by foreign callers: vertex constraints
/// as `[time, x, y]`, edge constraints as `[time, x1, y1, x2, y2]`.
#[derive(Debug, Clone)]
pub struct PathRequest<'a> {
    pub map: &'a Map,
    pub start: Point,
    pub goal: Point,
    pub vertex_constraints: &'a [[i64; 3]],
    pub edge_constraints: &'a [[i64; 5]],
    /// Per-layer node and edge counts.
    pub lite_mdd: bool,
    /// Per-layer position lists.
    pub full_mdd: bool,
    pub limits: SearchLimits,
}

impl PathRequest<'_> {
    /// Copy of the grid with the request's constraint rows attached.
    pub fn constrained_map(&self) -> Result<Map, SearchError> {
        let vertex = self
            .vertex_constraints
            .iter()
            .map(|row| parse_vertex_row(self.map, row))
            .collect::<Result<Vec<_>, _>>()?;
        let edge = self
            .edge_constraints
            .iter()
            .map(|row| parse_edge_row(self.map, row))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self.map.clone().with_constraints(vertex, edge))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathResponse {
    pub path: Path,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mdd: Option<Mdd>,
}

/// Solve one request. `Ok(None)` means no constrained path exists.
pub fn find_path(
    request: &PathRequest<'_>,
    stats: &mut Stats,
) -> Result<Option<PathResponse>, SearchError> {
    let started = Instant::now();

    for endpoint in [request.start, request.goal] {
        if !request.map.in_bounds(endpoint) {
            return Err(SearchError::OutOfBounds {
                position: endpoint,
                width: request.map.width,
                height: request.map.height,
            });
        }
    }

    let map = request.constrained_map()?;

    let response = if !request.lite_mdd && !request.full_mdd {
        a_star_search(&map, request.start, request.goal, request.limits, stats)?
            .map(|path| PathResponse { path, mdd: None })
    } else {
        let options = MddOptions {
            counts: request.lite_mdd,
            layers: request.full_mdd,
        };
        mdd_search(&map, request.start, request.goal, options, request.limits, stats)?
            .map(|(path, mdd)| PathResponse {
                path,
                mdd: Some(mdd),
            })
    };

    if let Some(response) = &response {
        stats.costs += response.path.cost();
    }
    stats.time_us += started.elapsed().as_micros() as usize;
    Ok(response)
}

fn coordinate(map: &Map, row: &[i64], x: i64, y: i64) -> Result<Point, SearchError> {
    let invalid = |reason| SearchError::InvalidConstraint {
        row: row.to_vec(),
        reason,
    };
    let x = usize::try_from(x).map_err(|_| invalid("negative coordinate"))?;
    let y = usize::try_from(y).map_err(|_| invalid("negative coordinate"))?;
    let point = Point::new(x, y);
    if !map.in_bounds(point) {
        return Err(invalid("coordinate outside the grid"));
    }
    Ok(point)
}

fn time(row: &[i64], t: i64) -> Result<usize, SearchError> {
    usize::try_from(t).map_err(|_| SearchError::InvalidConstraint {
        row: row.to_vec(),
        reason: "negative time",
    })
}

fn parse_vertex_row(map: &Map, row: &[i64; 3]) -> Result<VertexConstraint, SearchError> {
    let [t, x, y] = *row;
    Ok(VertexConstraint {
        time: time(row, t)?,
        position: coordinate(map, row, x, y)?,
    })
}

fn parse_edge_row(map: &Map, row: &[i64; 5]) -> Result<EdgeConstraint, SearchError> {
    let [t, x1, y1, x2, y2] = *row;
    let from = coordinate(map, row, x1, y1)?;
    let to = coordinate(map, row, x2, y2)?;
    if manhattan(from, to) > 1 {
        return Err(SearchError::InvalidConstraint {
            row: row.to_vec(),
            reason: "endpoints are not adjacent",
        });
    }
    Ok(EdgeConstraint {
        time: time(row, t)?,
        from,
        to,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use tracing_subscriber;

    // Helper function to setup tracing
    pub(crate) fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("debug")
            .with_test_writer()
            .try_init();
    }

    pub(crate) fn detour_map() -> Map {
        Map::from_file("map_file/test/detour.map").unwrap()
    }

    fn request<'a>(
        map: &'a Map,
        vertex: &'a [[i64; 3]],
        edge: &'a [[i64; 5]],
        lite_mdd: bool,
        full_mdd: bool,
    ) -> PathRequest<'a> {
        PathRequest {
            map,
            start: Point::new(1, 0),
            goal: Point::new(1, 1),
            vertex_constraints: vertex,
            edge_constraints: edge,
            lite_mdd,
            full_mdd,
            limits: SearchLimits::default(),
        }
    }

    #[test]
    fn test_detour_example() {
        init_tracing();
        let map = detour_map();
        let vertex = [[1, 1, 0], [2, 3, 1]];
        let edge = [[0, 1, 0, 1, 1]];
        let stats = &mut Stats::default();

        let response = find_path(&request(&map, &vertex, &edge, false, false), stats)
            .unwrap()
            .unwrap();
        debug!("{:?}", response.path);

        let constrained = map.clone().with_constraints(
            [
                VertexConstraint { time: 1, position: Point::new(1, 0) },
                VertexConstraint { time: 2, position: Point::new(3, 1) },
            ],
            [EdgeConstraint { time: 0, from: Point::new(1, 0), to: Point::new(1, 1) }],
        );
        assert!(response.mdd.is_none());
        assert!(response.path.cost() > 1);
        assert_eq!(response.path.cost(), 3);
        assert!(response.path.verify(&constrained, Point::new(1, 0), Point::new(1, 1)));
        assert_eq!(stats.costs, 3);
    }

    #[test]
    fn test_detour_example_with_both_mdds() {
        init_tracing();
        let map = detour_map();
        let vertex = [[1, 1, 0], [2, 3, 1]];
        let edge = [[0, 1, 0, 1, 1]];
        let stats = &mut Stats::default();

        let response = find_path(&request(&map, &vertex, &edge, true, true), stats)
            .unwrap()
            .unwrap();
        let mdd = response.mdd.unwrap();
        let counts = mdd.counts.unwrap();
        let layers = mdd.layers.unwrap();

        assert_eq!(response.path.cost(), 3);
        assert_eq!(counts.len(), 7);
        assert_eq!(layers.len(), 4);
        for (depth, layer) in layers.iter().enumerate() {
            assert_eq!(counts[2 * depth], layer.len());
        }
        assert_eq!(layers[0], vec![Point::new(1, 0)]);
        assert_eq!(layers[1], vec![Point::new(2, 0)]);
        assert_eq!(layers[3], vec![Point::new(1, 1)]);
        let mut middle = layers[2].clone();
        middle.sort();
        assert_eq!(middle, vec![Point::new(1, 0), Point::new(2, 1)]);
        assert_eq!(counts, vec![1, 1, 1, 2, 2, 2, 1]);
    }

    #[test]
    fn test_rejects_bad_rows() {
        let map = detour_map();
        let stats = &mut Stats::default();

        let negative = [[-1, 1, 0]];
        let err = find_path(&request(&map, &negative, &[], false, false), stats).unwrap_err();
        assert!(matches!(err, SearchError::InvalidConstraint { reason: "negative time", .. }));

        let far = [[0, 1, 0, 3, 0]];
        let err = find_path(&request(&map, &[], &far, false, false), stats).unwrap_err();
        assert!(matches!(err, SearchError::InvalidConstraint { .. }));

        let outside = [[0, 9, 9]];
        let err = find_path(&request(&map, &outside, &[], false, false), stats).unwrap_err();
        assert!(matches!(err, SearchError::InvalidConstraint { .. }));
    }

    #[test]
    fn test_out_of_bounds_endpoint() {
        let map = detour_map();
        let stats = &mut Stats::default();
        let mut req = request(&map, &[], &[], false, false);
        req.goal = Point::new(7, 0);
        assert!(matches!(
            find_path(&req, stats),
            Err(SearchError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn test_expansion_limit() {
        let map = Map::from_bytes(5, 5, &[0; 25]).unwrap();
        let stats = &mut Stats::default();
        // The goal is forbidden until time 40, forcing a long wait.
        let vertex = [[40, 4, 4]];
        let mut req = request(&map, &vertex, &[], false, false);
        req.start = Point::new(0, 0);
        req.goal = Point::new(4, 4);
        req.limits.max_expansions = Some(10);
        assert_eq!(
            find_path(&req, stats),
            Err(SearchError::ExpansionLimit(10))
        );
    }

    #[test]
    fn test_tie_break_orders() {
        use crate::common::Node;
        let shallow = Node::start(Point::new(0, 0), 4);
        let deep = Node { g: 2, f: 4, ..shallow };
        let worse = Node { g: 0, f: 5, ..shallow };

        assert_eq!(prefer_deeper(&deep, &shallow), Ordering::Greater);
        assert_eq!(prefer_shallower(&deep, &shallow), Ordering::Less);
        assert_eq!(prefer_deeper(&worse, &deep), Ordering::Less);
        assert_eq!(prefer_shallower(&worse, &shallow), Ordering::Less);
    }
}
