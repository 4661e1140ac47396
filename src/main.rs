use mapf_lowlevel::algorithm::{find_path, PathResponse};
use mapf_lowlevel::common::Point;
use mapf_lowlevel::config::{Cli, Config};
use mapf_lowlevel::map::Map;
use mapf_lowlevel::scenario::Task;
use mapf_lowlevel::stat::Stats;

use anyhow::{ensure, Context};
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Serialize)]
struct TaskResult {
    task: usize,
    start: Point,
    goal: Point,
    #[serde(flatten)]
    response: Option<PathResponse>,
    stats: Stats,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    let config = if let Some(config_file) = cli.config.as_ref() {
        let config_str = std::fs::read_to_string(config_file)
            .with_context(|| format!("cannot read config file: {config_file}"))?;
        Config::from_yaml_str(&config_str)
            .with_context(|| format!("error with config file: {config_file}"))?
    } else {
        info!("No config file specified, using default config");
        Config::default()
    }
    .override_from_command_line(&cli)?;

    let map = Map::from_file(&config.map_path)?;
    let tasks = if config.random_tasks > 0 {
        let mut rng = StdRng::seed_from_u64(config.seed);
        Task::generate_randomly(
            &map,
            config.random_tasks,
            config.constraints_per_task,
            config.max_constraint_time,
            &mut rng,
        )?
    } else {
        let task_path = config
            .task_path
            .as_deref()
            .context("no task file configured")?;
        vec![Task::load_from_yaml(task_path)?]
    };

    let mut total = Stats::default();
    let mut results = Vec::with_capacity(tasks.len());
    for (index, task) in tasks.iter().enumerate() {
        let request = task.request(&map, config.lite_mdd, config.full_mdd, config.limits());
        let mut stats = Stats::default();
        let response = find_path(&request, &mut stats)
            .with_context(|| format!("task {index} from {} to {} failed", task.start, task.goal))?;

        match &response {
            Some(response) => {
                let constrained = request.constrained_map()?;
                ensure!(
                    response.path.verify(&constrained, task.start, task.goal),
                    "task {index}: returned path violates its constraints"
                );
            }
            None => warn!("task {index}: no path from {} to {}", task.start, task.goal),
        }

        stats.print();
        total.absorb(&stats);
        results.push(TaskResult {
            task: index,
            start: task.start,
            goal: task.goal,
            response,
            stats,
        });
    }
    if results.len() > 1 {
        total.print();
    }

    let json = serde_json::to_string_pretty(&results)?;
    match &config.output_path {
        Some(path) => std::fs::write(path, json)
            .with_context(|| format!("cannot write output file: {path}"))?,
        None => println!("{json}"),
    }

    Ok(())
}
