use anyhow::{anyhow, Context, Result};
use rand::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufReader, Write};
use tracing::info;

use crate::algorithm::{PathRequest, SearchLimits};
use crate::common::Point;
use crate::map::Map;

const MAX_ATTEMPTS_PER_TASK: usize = 100;

/// One single-agent query with its constraints in row form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub start: Point,
    pub goal: Point,
    /// `[time, x, y]`
    #[serde(default)]
    pub vertex_constraints: Vec<[i64; 3]>,
    /// `[time, x1, y1, x2, y2]`
    #[serde(default)]
    pub edge_constraints: Vec<[i64; 5]>,
}

impl Task {
    pub fn load_from_yaml(path: &str) -> Result<Task> {
        let file = File::open(path).with_context(|| format!("cannot open task file {path}"))?;
        let reader = BufReader::new(file);
        let task = serde_yaml::from_reader(reader)
            .with_context(|| format!("malformed task file {path}"))?;
        Ok(task)
    }

    pub fn write_to_yaml(&self, path: &str) -> Result<()> {
        let file = File::create(path).with_context(|| format!("cannot create task file {path}"))?;
        let mut writer = io::BufWriter::new(file);
        let yaml_data = serde_yaml::to_string(self)?;
        writer.write_all(yaml_data.as_bytes())?;

        Ok(())
    }

    pub fn request<'a>(
        &'a self,
        map: &'a Map,
        lite_mdd: bool,
        full_mdd: bool,
        limits: SearchLimits,
    ) -> PathRequest<'a> {
        PathRequest {
            map,
            start: self.start,
            goal: self.goal,
            vertex_constraints: &self.vertex_constraints,
            edge_constraints: &self.edge_constraints,
            lite_mdd,
            full_mdd,
            limits,
        }
    }

    /// Random tasks on `map`: distinct free start and goal cells connected on
    /// the static grid, plus `constraints` vertex constraints at times
    /// `1..=max_time`.
    pub fn generate_randomly<R: Rng + ?Sized>(
        map: &Map,
        count: usize,
        constraints: usize,
        max_time: usize,
        rng: &mut R,
    ) -> Result<Vec<Task>> {
        let free: Vec<Point> = (0..map.height)
            .flat_map(|y| (0..map.width).map(move |x| Point::new(x, y)))
            .filter(|&p| map.is_passable(p))
            .collect();
        if free.len() < 2 {
            return Err(anyhow!("Map needs at least two free cells, found {}", free.len()));
        }

        let mut tasks = Vec::with_capacity(count);
        let mut attempts = 0;
        while tasks.len() < count {
            attempts += 1;
            if attempts > MAX_ATTEMPTS_PER_TASK * count {
                return Err(anyhow!(
                    "Found only {} connected start/goal pairs in {} attempts",
                    tasks.len(),
                    attempts - 1
                ));
            }

            let (Some(&start), Some(&goal)) = (free.choose(rng), free.choose(rng)) else {
                continue;
            };
            if start == goal || !map.is_reachable(start, goal) {
                continue;
            }

            let vertex_constraints = (0..constraints)
                .filter_map(|_| {
                    let position = free.choose(rng)?;
                    let time = rng.gen_range(1..=max_time.max(1));
                    Some([time as i64, position.x as i64, position.y as i64])
                })
                .collect();

            tasks.push(Task {
                start,
                goal,
                vertex_constraints,
                edge_constraints: Vec::new(),
            });
        }

        info!("Generate tasks: {}", tasks.len());
        Ok(tasks)
    }
}
