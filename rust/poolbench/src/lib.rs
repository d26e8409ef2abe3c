//! Serial-vs-parallel scaling benchmark built on `poolbench-workflow`.
//!
//! The pipeline is strictly linear:
//!
//! 1. [`experiment::run_repeated`] times a [`workload::Workload`] once serially and then
//!    once per worker count `1..=N`, each on a freshly created pool that is torn down
//!    before the next count, and repeats the whole experiment.
//! 2. [`summary::summarize`] reduces the repeated runs to mean and standard deviation.
//! 3. [`render::render_svg`] draws the serial baseline against the scaling curve.
//!
//! [`jobs`] holds the batch work items used by the unordered-results demo.

pub mod config;
pub mod experiment;
pub mod jobs;
pub mod render;
pub mod stopwatch;
pub mod summary;
pub mod workload;

pub use config::ExperimentConfig;
pub use experiment::{ExperimentRun, RepeatedRuns, run_one_experiment, run_repeated};
pub use render::{render_svg, summarize_and_render, write_svg};
pub use summary::{MeanStd, Summary, summarize};
