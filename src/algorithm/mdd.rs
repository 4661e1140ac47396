use super::{explore, new_arena, DuplicatePolicy, SearchLimits, Strategy, TieBreak};
use crate::arena::{Arena, NodeId};
use crate::common::{Mdd, MddNode, Path, Point, SearchRecord, StateRef};
use crate::error::SearchError;
use crate::map::Map;
use crate::set::{bucket_count_for, BucketSet};
use crate::stat::Stats;

use tracing::{debug, instrument};

/// Which parts of the diagram to build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MddOptions {
    /// Node and edge counts per depth.
    pub counts: bool,
    /// Distinct positions per depth.
    pub layers: bool,
}

/// One optimal constrained path together with the diagram of all optimal
/// paths of the same cost.
#[instrument(skip_all, name = "mdd", fields(start = format!("{start}"), goal = format!("{goal}")), level = "debug")]
pub fn mdd_search(
    map: &Map,
    start: Point,
    goal: Point,
    options: MddOptions,
    limits: SearchLimits,
    stats: &mut Stats,
) -> Result<Option<(Path, Mdd)>, SearchError> {
    debug!("constraints: {}", map.constraint_count());

    let strategy = Strategy {
        tie_break: TieBreak::PreferShallower,
        duplicates: DuplicatePolicy::Merge(merge_parents),
    };
    let mut arena = new_arena(map);
    let Some(goal_id) = explore(map, start, goal, &mut arena, &strategy, limits, stats)? else {
        return Ok(None);
    };

    let path = construct_path(&arena, goal_id);
    let mdd = construct_mdd(map, &arena, goal_id, options);
    debug!("path: {path:?}");
    debug!("mdd: {mdd:?}");

    Ok(Some((path, mdd)))
}

fn merge_parents(existing: &mut MddNode, incoming: &MddNode) -> Result<(), SearchError> {
    for &parent in incoming.parents() {
        existing.add_parent(parent)?;
    }
    Ok(())
}

// Follows the first recorded parent of every state.
fn construct_path(arena: &Arena<MddNode>, goal_id: NodeId) -> Path {
    let mut path = Vec::with_capacity(arena[goal_id].g + 1);
    let mut current = goal_id;
    loop {
        let node = &arena[current];
        path.push(node.position);
        match node.parents().first() {
            Some(&parent) => current = parent,
            None => break,
        }
    }
    path.reverse();
    Path(path)
}

/// Walk the parent links back from the goal one depth at a time.
fn construct_mdd(map: &Map, arena: &Arena<MddNode>, goal_id: NodeId, options: MddOptions) -> Mdd {
    let depth_max = arena[goal_id].g;
    let buckets = bucket_count_for(map.width * map.height / 8);
    let mut current = BucketSet::new(buckets);
    let mut previous = BucketSet::new(buckets);

    let mut counts = vec![0; 2 * depth_max + 1];
    let mut layers = Vec::with_capacity(depth_max + 1);

    current.add(StateRef {
        key: arena[goal_id].key(),
        id: goal_id,
    });

    for depth in (0..=depth_max).rev() {
        counts[2 * depth] = current.len();
        if options.layers {
            layers.push(current.iter().map(|entry| entry.key.position).collect::<Vec<_>>());
        }

        let mut edges = 0;
        for entry in current.iter() {
            for &parent in arena[entry.id].parents() {
                previous.add(StateRef {
                    key: arena[parent].key(),
                    id: parent,
                });
                edges += 1;
            }
        }
        if depth > 0 {
            counts[2 * depth - 1] = edges;
        }

        std::mem::swap(&mut current, &mut previous);
        previous.clear();
    }

    layers.reverse();
    Mdd {
        counts: options.counts.then_some(counts),
        layers: options.layers.then_some(layers),
    }
}
