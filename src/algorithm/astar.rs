use super::{explore, new_arena, DuplicatePolicy, SearchLimits, Strategy, TieBreak};
use crate::arena::{Arena, NodeId};
use crate::common::{Node, Path, Point};
use crate::error::SearchError;
use crate::map::Map;
use crate::stat::Stats;

use tracing::{debug, instrument};

/// Shortest constrained path from `start` to `goal`, or `None` when no path
/// exists. Ties on `f` go to the deeper state.
#[instrument(skip_all, name = "a_star", fields(start = format!("{start}"), goal = format!("{goal}")), level = "debug")]
pub fn a_star_search(
    map: &Map,
    start: Point,
    goal: Point,
    limits: SearchLimits,
    stats: &mut Stats,
) -> Result<Option<Path>, SearchError> {
    debug!("constraints: {}", map.constraint_count());

    let strategy = Strategy {
        tie_break: TieBreak::PreferDeeper,
        duplicates: DuplicatePolicy::Discard,
    };
    let mut arena = new_arena(map);
    let path = explore(map, start, goal, &mut arena, &strategy, limits, stats)?
        .map(|goal_id| construct_path(&arena, goal_id));

    debug!("path: {path:?}");
    Ok(path)
}

fn construct_path(arena: &Arena<Node>, goal_id: NodeId) -> Path {
    let mut path = Vec::with_capacity(arena[goal_id].g + 1);
    let mut current = Some(goal_id);
    while let Some(id) = current {
        let node = &arena[id];
        path.push(node.position);
        current = node.parent;
    }
    path.reverse();
    Path(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::tests::{detour_map, init_tracing};
    use crate::common::{manhattan, EdgeConstraint, VertexConstraint};

    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn test_map() -> Map {
        Map::from_file("map_file/test/test.map").unwrap()
    }

    fn search(map: &Map, start: Point, goal: Point) -> Option<Path> {
        let stats = &mut Stats::default();
        a_star_search(map, start, goal, SearchLimits::default(), stats).unwrap()
    }

    fn vertex(time: usize, x: usize, y: usize) -> VertexConstraint {
        VertexConstraint {
            time,
            position: Point::new(x, y),
        }
    }

    fn edge(time: usize, from: (usize, usize), to: (usize, usize)) -> EdgeConstraint {
        EdgeConstraint {
            time,
            from: from.into(),
            to: to.into(),
        }
    }

    // Ideal Path
    // [(2, 2), (1, 2), (0, 2), (0, 1), (0, 0)]
    // or
    // [(2, 2), (2, 1), (2, 0), (1, 0), (0, 0)]
    #[test]
    fn test_a_star_no_constraint() {
        init_tracing();
        let map = test_map();
        let path = search(&map, Point::new(2, 2), Point::new(0, 0)).unwrap();
        debug!("{path:?}");
        assert_eq!(path.len(), 5);
        assert!(path.verify(&map, Point::new(2, 2), Point::new(0, 0)));
    }

    #[test]
    fn test_a_star_open_grid_matches_manhattan() {
        let map = Map::from_bytes(8, 6, &[0; 48]).unwrap();
        let start = Point::new(0, 0);
        for goal in [Point::new(7, 5), Point::new(3, 0), Point::new(0, 4), start] {
            let path = search(&map, start, goal).unwrap();
            assert_eq!(path.cost(), manhattan(start, goal));
        }
    }

    #[test]
    fn test_a_star_in_path_vertex_constraint_alternative_path() {
        init_tracing();
        let map = test_map().with_constraints([vertex(2, 0, 2)], []);
        let path = search(&map, Point::new(2, 2), Point::new(0, 0)).unwrap();
        debug!("{path:?}");
        assert_eq!(path.len(), 5);
        assert_ne!(path.position_at(2), Some(Point::new(0, 2)));
    }

    #[test]
    fn test_a_star_in_path_vertex_constraint() {
        init_tracing();
        let map = test_map().with_constraints([vertex(2, 0, 2), vertex(2, 2, 0)], []);
        let path = search(&map, Point::new(2, 2), Point::new(0, 0)).unwrap();
        debug!("{path:?}");
        assert_eq!(path.len(), 6);
        assert!(path.verify(&map, Point::new(2, 2), Point::new(0, 0)));
    }

    #[test]
    fn test_a_star_goal_constraint_forces_longer_path() {
        init_tracing();
        let map = test_map().with_constraints([vertex(4, 0, 0)], []);
        let path = search(&map, Point::new(2, 2), Point::new(0, 0)).unwrap();
        debug!("{path:?}");
        assert_eq!(path.len(), 6);
        assert!(path.cost() > map.goal_horizon(Point::new(0, 0)).unwrap());
    }

    #[test]
    fn test_a_star_late_goal_constraint_after_arrival() {
        // The agent could arrive at 4 but has to make room at 7.
        let map = test_map().with_constraints([vertex(7, 0, 0)], []);
        let path = search(&map, Point::new(2, 2), Point::new(0, 0)).unwrap();
        assert_eq!(path.cost(), 8);
        assert!(path.verify(&map, Point::new(2, 2), Point::new(0, 0)));
    }

    #[test]
    fn test_a_star_edge_constraint_alternative_path() {
        init_tracing();
        let map = test_map().with_constraints([], [edge(1, (0, 2), (1, 2))]);
        let path = search(&map, Point::new(2, 2), Point::new(0, 0)).unwrap();
        debug!("{path:?}");
        assert_eq!(path.len(), 5);
        assert!(path.verify(&map, Point::new(2, 2), Point::new(0, 0)));
    }

    #[test]
    fn test_a_star_edge_constraint() {
        init_tracing();
        let map = test_map().with_constraints(
            [],
            [edge(1, (1, 2), (0, 2)), edge(2, (2, 0), (1, 0))],
        );
        let path = search(&map, Point::new(2, 2), Point::new(0, 0)).unwrap();
        debug!("{path:?}");
        assert_eq!(path.len(), 6);
        assert!(path.verify(&map, Point::new(2, 2), Point::new(0, 0)));
    }

    #[test]
    fn test_a_star_detour() {
        init_tracing();
        let map = detour_map().with_constraints(
            [vertex(1, 1, 0), vertex(2, 3, 1)],
            [edge(0, (1, 0), (1, 1))],
        );
        let path = search(&map, Point::new(1, 0), Point::new(1, 1)).unwrap();
        debug!("{path:?}");
        assert_eq!(path.cost(), 3);
        assert_eq!(path.position_at(1), Some(Point::new(2, 0)));
        assert!(path.verify(&map, Point::new(1, 0), Point::new(1, 1)));
    }

    #[test]
    fn test_a_star_enclosed_goal() {
        #[rustfmt::skip]
        let cells = [
            0, 0, 0, 0,
            0, 1, 1, 1,
            0, 1, 0, 1,
            0, 1, 1, 1,
        ];
        let map = Map::from_bytes(4, 4, &cells).unwrap();
        assert_eq!(search(&map, Point::new(0, 0), Point::new(2, 2)), None);
    }

    #[test]
    fn test_a_star_trapped_start() {
        // Every move out of the corner, including waiting, is forbidden at 1.
        let map = Map::from_bytes(3, 3, &[0; 9])
            .unwrap()
            .with_constraints([vertex(1, 0, 0), vertex(1, 1, 0), vertex(1, 0, 1)], []);
        assert_eq!(search(&map, Point::new(0, 0), Point::new(2, 2)), None);
    }

    #[test]
    fn test_a_star_start_is_goal() {
        let map = test_map();
        let path = search(&map, Point::new(0, 0), Point::new(0, 0)).unwrap();
        assert_eq!(path.positions(), &[Point::new(0, 0)]);

        let map = test_map().with_constraints([vertex(2, 0, 0)], []);
        let path = search(&map, Point::new(0, 0), Point::new(0, 0)).unwrap();
        assert_eq!(path.cost(), 3);
        assert!(path.verify(&map, Point::new(0, 0), Point::new(0, 0)));
    }

    #[test]
    fn test_a_star_random_constraints_are_respected() {
        let mut rng = StdRng::seed_from_u64(7);
        let map = Map::from_bytes(6, 6, &[0; 36]).unwrap();
        for _ in 0..30 {
            let start = Point::new(rng.gen_range(0..6), rng.gen_range(0..6));
            let goal = Point::new(rng.gen_range(0..6), rng.gen_range(0..6));
            let vertices: Vec<_> = (0..12)
                .map(|_| vertex(rng.gen_range(1..10), rng.gen_range(0..6), rng.gen_range(0..6)))
                .collect();
            let constrained = map.clone().with_constraints(vertices, []);

            let first = search(&constrained, start, goal);
            let second = search(&constrained, start, goal);
            assert_eq!(first, second);
            if let Some(path) = first {
                assert!(path.verify(&constrained, start, goal));
                assert!(path.cost() >= manhattan(start, goal));
            }
        }
    }
}
