use anyhow::{Context, Result, ensure};
use clap::Args;
use std::time::Duration;

use poolbench::{
    jobs::{self, JobOutcome},
    stopwatch::Stopwatch,
};
use poolbench_workflow::{
    ThreadPool, progress::ObserveExt, thread_pool::available_parallelism,
    unordered::map_unordered,
};

use crate::progress::BarObserver;

const SAMPLE_RESULTS: usize = 3;

#[derive(Args, Debug)]
pub struct BatchArgs {
    /// Number of wind-tunnel tests in the batch
    #[arg(short, long, default_value_t = 20)]
    pub count: u32,

    /// Worker threads [default: number of processors]
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Shortest simulated setup delay, in seconds
    #[arg(long, default_value_t = 0.5)]
    pub min_delay: f64,

    /// Longest simulated setup delay, in seconds
    #[arg(long, default_value_t = 1.5)]
    pub max_delay: f64,
}

pub fn run(args: BatchArgs) -> Result<()> {
    run_with_observer(args, BarObserver::new()).map(|_| ())
}

fn run_with_observer(args: BatchArgs, observer: BarObserver) -> Result<Vec<JobOutcome>> {
    ensure!(
        args.min_delay >= 0.0 && args.min_delay <= args.max_delay,
        "Invalid delay range: {}..{}",
        args.min_delay,
        args.max_delay
    );
    let workers = args.workers.unwrap_or_else(available_parallelism);
    ensure!(workers > 0, "Worker count must be at least 1");

    println!("--- Preparing Batch Simulation ---");
    let delay =
        Duration::try_from_secs_f64(args.min_delay)?..Duration::try_from_secs_f64(args.max_delay)?;
    let tests = jobs::wind_tunnel_batch(args.count, delay);
    println!("Created {} unique test cases.", tests.len());

    println!("\n--- Starting Workers ---");
    let stopwatch = Stopwatch::start_new();
    let pool = ThreadPool::with_thread_name(workers, |i| format!("batch-w{i}"));
    let results = map_unordered(&pool, tests, jobs::run_job)
        .observe(observer)
        .collect::<poolbench_common::Result<Vec<_>>>()
        .context("Batch job failed")?;
    pool.shutdown()?;

    println!("\nDone! Total time: {:.2}s", stopwatch.elapsed_secs());
    println!("\nSample Results:");
    for outcome in results.iter().take(SAMPLE_RESULTS) {
        println!("{}", outcome.summary);
    }
    Ok(results)
}
