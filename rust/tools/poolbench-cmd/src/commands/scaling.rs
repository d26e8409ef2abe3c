use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use poolbench::{
    ExperimentConfig, RepeatedRuns, Summary, experiment::ConsoleObserver, run_repeated,
    summarize_and_render, workload::KernelKind,
};

use crate::commands::write_json;

const DEFAULT_OUTPUT: &str = "scaling.svg";

/// Overrides for the experiment defaults. Unset flags keep the default value.
#[derive(Args, Debug, Default)]
pub struct ScalingArgs {
    /// Number of inputs in the domain [default: 5000000]
    #[arg(long)]
    pub domain_size: Option<u64>,

    /// Exponent applied by the kernel [default: 2]
    #[arg(long)]
    pub exponent: Option<i32>,

    /// Trigonometric iterations per input [default: 50]
    #[arg(long)]
    pub iterations: Option<u32>,

    /// Number of experiment repetitions [default: 2]
    #[arg(short, long)]
    pub repeats: Option<usize>,

    /// Workload kernel: trig or power [default: trig]
    #[arg(long)]
    pub kernel: Option<KernelKind>,

    /// Largest worker count to measure [default: number of processors]
    #[arg(long)]
    pub max_workers: Option<usize>,

    /// Path of the SVG chart [default: scaling.svg]
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Also write the raw timings and the summary as JSON
    #[arg(long)]
    pub json: Option<PathBuf>,
}

impl ScalingArgs {
    pub fn to_config(&self) -> ExperimentConfig {
        let defaults = ExperimentConfig::default();
        ExperimentConfig {
            domain_size: self.domain_size.unwrap_or(defaults.domain_size),
            exponent: self.exponent.unwrap_or(defaults.exponent),
            iterations: self.iterations.unwrap_or(defaults.iterations),
            kernel: self.kernel.unwrap_or(defaults.kernel),
            repeats: self.repeats.unwrap_or(defaults.repeats),
            max_workers: self.max_workers.or(defaults.max_workers),
        }
    }

    pub fn output_path(&self) -> &Path {
        self.output
            .as_deref()
            .unwrap_or_else(|| Path::new(DEFAULT_OUTPUT))
    }
}

#[derive(Serialize)]
struct ScalingReport<'a> {
    config: &'a ExperimentConfig,
    runs: &'a RepeatedRuns,
    summary: &'a Summary,
}

pub fn run(args: ScalingArgs) -> Result<()> {
    let config = args.to_config();
    config.validate().context("Invalid experiment parameters")?;
    log::info!("experiment config: {config:?}");

    let workload = Arc::new(config.workload());
    let mut observer = ConsoleObserver::stdout();
    let runs = run_repeated(&config, workload, &mut observer).context("Experiment failed")?;

    let output = args.output_path();
    let summary = summarize_and_render(&runs, output)
        .with_context(|| format!("Failed to render chart to {}", output.display()))?;

    print_summary(&summary);
    println!("\nChart written to {}", output.display());

    if let Some(json) = &args.json {
        let report = ScalingReport {
            config: &config,
            runs: &runs,
            summary: &summary,
        };
        write_json(json, &report)?;
        println!("Timings written to {}", json.display());
    }
    Ok(())
}

fn print_summary(summary: &Summary) {
    println!(
        "\nSerial: {:.3}s ± {:.3}s",
        summary.serial.mean, summary.serial.std
    );
    println!("{:>8} {:>10} {:>10} {:>8}", "workers", "mean [s]", "std [s]", "speedup");
    for ((workers, stats), speedup) in summary
        .worker_counts
        .iter()
        .zip(&summary.parallel)
        .zip(summary.speedup())
    {
        println!(
            "{workers:>8} {:>10.3} {:>10.3} {speedup:>7.2}x",
            stats.mean, stats.std
        );
    }
}
