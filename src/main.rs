use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::path::PathBuf;

use traffic_flow::segments;
use traffic_flow::simulation::{
    simulate, Dynamics, SimConfig, DEFAULT_CAPACITY, DEFAULT_LOAD, DEFAULT_STEPS,
    DEFAULT_TRANSPORT_CAPACITY,
};
use traffic_flow::stats::RunSummary;

#[derive(Parser)]
#[command(name = "traffic_flow")]
#[command(about = "Capacity-constrained traffic flow on a street network")]
struct Cli {
    /// Segment file (`x1 y1 x2 y2 [length]` per line); a grid is used if omitted
    #[arg(long)]
    file: Option<PathBuf>,

    /// Grid width in junctions when no file is given
    #[arg(long, default_value_t = 10)]
    grid_width: usize,

    /// Grid height in junctions when no file is given
    #[arg(long, default_value_t = 10)]
    grid_height: usize,

    /// Maximum number of cars allowed in a junction
    #[arg(long, default_value_t = DEFAULT_CAPACITY)]
    n_max: u32,

    /// Maximum number of cars a junction can move in one step
    #[arg(long, default_value_t = DEFAULT_TRANSPORT_CAPACITY)]
    tc: u32,

    /// Number of simulation steps
    #[arg(long, default_value_t = DEFAULT_STEPS)]
    n_steps: usize,

    /// Average number of cars per junction
    #[arg(long, default_value_t = DEFAULT_LOAD)]
    load: f64,

    /// Update rule: sequential (asy) or synchronous (sy)
    #[arg(long, value_enum, default_value_t = Dynamics::Sequential)]
    dynamics: Dynamics,

    /// Seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = SimConfig {
        capacity: cli.n_max,
        transport_capacity: cli.tc,
        steps: cli.n_steps,
        load: cli.load,
        dynamics: cli.dynamics,
        seed: cli.seed,
    };
    config.validate()?;

    let network = match &cli.file {
        Some(path) => segments::load_network(path, config.capacity)?,
        None => {
            info!(
                "No segment file given, using a {}x{} grid",
                cli.grid_width, cli.grid_height
            );
            segments::grid(cli.grid_width, cli.grid_height, 1.0, config.capacity)?
        }
    };

    let (network, history) = simulate(network, &config).context("Simulation failed")?;

    RunSummary::new(&network, &history, config.dynamics).log();
    Ok(())
}
