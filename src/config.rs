use anyhow::{anyhow, Context};
use clap::Parser;
use serde::Deserialize;

use crate::algorithm::SearchLimits;

#[derive(Parser, Debug)]
#[command(
    name = "MAPF low-level",
    about = "Constrained single-agent A* and MDD construction on 4-connected grids.",
    version = "0.1"
)]
pub struct Cli {
    #[arg(long, help = "Path to a YAML config file")]
    pub config: Option<String>,

    #[arg(long, help = "Path to the map file")]
    pub map_path: Option<String>,

    #[arg(long, help = "Path to the YAML task (start, goal and constraints)")]
    pub task_path: Option<String>,

    #[arg(long, help = "Path to the JSON output file, stdout when absent")]
    pub output_path: Option<String>,

    #[arg(long, help = "Report node and edge counts per MDD layer", default_value_t = false)]
    pub lite_mdd: bool,

    #[arg(long, help = "Report the positions of every MDD layer", default_value_t = false)]
    pub full_mdd: bool,

    #[arg(long, help = "Give up a search after this many expansions")]
    pub max_expansions: Option<usize>,

    #[arg(long, help = "Solve this many random tasks instead of the task file")]
    pub random_tasks: Option<usize>,

    #[arg(long, help = "Vertex constraints per random task")]
    pub constraints_per_task: Option<usize>,

    #[arg(long, help = "Seed for the random number generator")]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub map_path: String,
    pub task_path: Option<String>,
    pub output_path: Option<String>,
    pub lite_mdd: bool,
    pub full_mdd: bool,
    pub max_expansions: Option<usize>,
    pub random_tasks: usize,
    pub constraints_per_task: usize,
    /// Random constraints are drawn from `1..=max_constraint_time`.
    pub max_constraint_time: usize,
    pub seed: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            map_path: "map_file/test/detour.map".to_string(),
            task_path: Some("map_file/test/detour.yaml".to_string()),
            output_path: None,
            lite_mdd: false,
            full_mdd: false,
            max_expansions: None,
            random_tasks: 0,
            constraints_per_task: 4,
            max_constraint_time: 16,
            seed: 0,
        }
    }
}

impl Config {
    pub fn from_yaml_str(content: &str) -> anyhow::Result<Self> {
        serde_yaml::from_str(content).context("cannot parse config")
    }

    /// Command-line values win over the config file.
    pub fn override_from_command_line(mut self, cli: &Cli) -> anyhow::Result<Self> {
        if let Some(map_path) = &cli.map_path {
            self.map_path = map_path.clone();
        }
        if let Some(task_path) = &cli.task_path {
            self.task_path = Some(task_path.clone());
        }
        if let Some(output_path) = &cli.output_path {
            self.output_path = Some(output_path.clone());
        }
        self.lite_mdd |= cli.lite_mdd;
        self.full_mdd |= cli.full_mdd;
        if cli.max_expansions.is_some() {
            self.max_expansions = cli.max_expansions;
        }
        if let Some(random_tasks) = cli.random_tasks {
            self.random_tasks = random_tasks;
        }
        if let Some(constraints) = cli.constraints_per_task {
            self.constraints_per_task = constraints;
        }
        if let Some(seed) = cli.seed {
            self.seed = seed;
        }

        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.map_path.is_empty() {
            return Err(anyhow!("Map path must not be empty"));
        }
        if self.random_tasks == 0 && self.task_path.is_none() {
            return Err(anyhow!(
                "Either a task file or a positive number of random tasks is required"
            ));
        }
        if self.max_expansions == Some(0) {
            return Err(anyhow!("Expansion limit must be positive, got 0"));
        }
        if self.constraints_per_task > 0 && self.max_constraint_time == 0 {
            return Err(anyhow!(
                "Random constraints need a positive max_constraint_time"
            ));
        }
        Ok(())
    }

    pub fn limits(&self) -> SearchLimits {
        SearchLimits {
            max_expansions: self.max_expansions,
        }
    }
}
