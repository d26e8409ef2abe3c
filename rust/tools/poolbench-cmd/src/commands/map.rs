use anyhow::{Context, Result};
use chrono::Local;
use clap::Args;

use poolbench_workflow::{ThreadPool, data_parallel, thread_pool::available_parallelism};

#[derive(Args, Debug)]
pub struct MapArgs {
    /// Number of tasks to map over the pool
    #[arg(short, long, default_value_t = 10)]
    pub count: usize,
}

pub fn run(args: MapArgs) -> Result<()> {
    println!("Number of processors: {}", available_parallelism());

    let pool = ThreadPool::with_default_threads();
    let results = data_parallel::map(&pool, 0..args.count, worker).context("Map failed")?;
    pool.shutdown()?;

    log::info!("{} of {} tasks returned true", results.iter().filter(|r| **r).count(), args.count);
    Ok(())
}

fn worker(_: usize) -> bool {
    println!("Worker called! {}", Local::now().format("%H:%M:%S"));
    true
}
