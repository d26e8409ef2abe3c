use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod progress;

use commands::{batch::BatchArgs, map::MapArgs, scaling::ScalingArgs};

#[derive(Parser)]
#[command(name = "poolbench")]
#[command(about = "Worker pool demos and a serial-vs-parallel scaling benchmark")]
#[command(version)]
struct Cli {
    /// Defaults to `scaling` with its default parameters
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Time a CPU-bound workload serially and on 1..=N workers, then chart the result
    Scaling(ScalingArgs),

    /// Map a trivial task over a pool, printing when each task runs
    Map(MapArgs),

    /// Run a batch of simulated wind-tunnel tests with a progress bar
    Batch(BatchArgs),
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    match cli.command.unwrap_or_else(|| Commands::Scaling(ScalingArgs::default())) {
        Commands::Scaling(args) => commands::scaling::run(args),
        Commands::Map(args) => commands::map::run(args),
        Commands::Batch(args) => commands::batch::run(args),
    }
}
