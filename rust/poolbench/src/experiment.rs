//! The scaling benchmark harness.
//!
//! One experiment run measures the workload once on the calling thread and then
//! once per worker count `1..=N`. Every worker count gets a pool of its own:
//! the pool is created, the domain is distributed with an eager parallel map,
//! and the pool is shut down (all workers joined) before the next count starts.
//! Pool creation and teardown are part of the measured time.

use crate::{
    config::ExperimentConfig,
    stopwatch::{Stopwatch, time},
    workload::{Workload, evaluate_serial},
};
use chrono::Local;
use poolbench_common::{Result, error::Error};
use poolbench_workflow::{ThreadPool, data_parallel};
use serde::{Deserialize, Serialize};
use std::{
    hint::black_box,
    io::{self, Write},
    ops::Range,
    panic::{self, AssertUnwindSafe},
    sync::Arc,
};

/// Returns the worker counts measured for a host with `max` processors: `1..=max`.
pub fn worker_counts(max: usize) -> Vec<usize> {
    (1..=max).collect()
}

/// Timing of one parallel configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParallelTiming {
    pub workers: usize,
    pub secs: f64,
    /// Worker threads of this configuration's pool still alive after teardown.
    pub lingering_workers: usize,
}

/// One complete pass: the serial baseline plus one timing per worker count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentRun {
    pub serial_secs: f64,
    /// Ordered by worker count, starting at 1.
    pub parallel: Vec<ParallelTiming>,
}

/// Durations collected over all repetitions, ready for [`crate::summary::summarize`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepeatedRuns {
    pub worker_counts: Vec<usize>,
    /// One entry per repetition.
    pub serial_secs: Vec<f64>,
    /// Repetition × worker-count matrix.
    pub parallel_secs: Vec<Vec<f64>>,
}

impl RepeatedRuns {
    pub fn new(worker_counts: Vec<usize>) -> RepeatedRuns {
        RepeatedRuns {
            worker_counts,
            serial_secs: Vec::new(),
            parallel_secs: Vec::new(),
        }
    }

    pub fn push(&mut self, run: &ExperimentRun) {
        self.serial_secs.push(run.serial_secs);
        self.parallel_secs
            .push(run.parallel.iter().map(|t| t.secs).collect());
    }

    /// Number of repetitions recorded.
    pub fn len(&self) -> usize {
        self.serial_secs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.serial_secs.is_empty()
    }
}

/// Receives progress notifications from the harness.
///
/// All methods default to doing nothing.
pub trait ExperimentObserver {
    fn on_begin(&mut self, _repeats: usize) {}
    fn on_run_start(&mut self, _run: usize, _repeats: usize) {}
    fn on_serial_start(&mut self) {}
    fn on_serial_done(&mut self, _secs: f64) {}
    fn on_parallel_start(&mut self, _worker_counts: &[usize]) {}
    fn on_configuration_done(&mut self, _timing: &ParallelTiming) {}
    fn on_run_done(&mut self, _run: usize, _result: &ExperimentRun) {}
}

/// Observer that reports nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentObserver;

impl ExperimentObserver for SilentObserver {}

/// Prints human-readable progress: one line per phase, one dot per worker count,
/// and a completion timestamp per run.
pub struct ConsoleObserver<W: Write> {
    out: W,
}

impl ConsoleObserver<io::Stdout> {
    pub fn stdout() -> Self {
        ConsoleObserver { out: io::stdout() }
    }
}

impl<W: Write> ConsoleObserver<W> {
    pub fn new(out: W) -> Self {
        ConsoleObserver { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ExperimentObserver for ConsoleObserver<W> {
    fn on_begin(&mut self, repeats: usize) {
        writeln!(self.out, "Starting {repeats} experiment runs...").ok();
    }

    fn on_run_start(&mut self, run: usize, repeats: usize) {
        writeln!(self.out, "\nRun {run}/{repeats}:").ok();
    }

    fn on_serial_start(&mut self) {
        write!(self.out, "Running Serial...").ok();
        self.out.flush().ok();
    }

    fn on_serial_done(&mut self, secs: f64) {
        writeln!(self.out, " Done ({secs:.2}s)").ok();
    }

    fn on_parallel_start(&mut self, _worker_counts: &[usize]) {
        write!(self.out, "Running Parallel scaling...").ok();
        self.out.flush().ok();
    }

    fn on_configuration_done(&mut self, _timing: &ParallelTiming) {
        write!(self.out, ".").ok();
        self.out.flush().ok();
    }

    fn on_run_done(&mut self, _run: usize, _result: &ExperimentRun) {
        writeln!(
            self.out,
            " Done. (finished at {})",
            Local::now().format("%H:%M:%S")
        )
        .ok();
    }
}

/// Runs one complete experiment: the serial pass, then one fresh pool per worker count.
///
/// # Errors
///
/// A panic inside the workload, in the serial pass or on a worker, aborts the run
/// with `TaskPanicked`. No timing is returned for the failing configuration, and
/// its pool is still torn down.
pub fn run_one_experiment<W: Workload>(
    config: &ExperimentConfig,
    workload: &Arc<W>,
    observer: &mut dyn ExperimentObserver,
) -> Result<ExperimentRun> {
    config.validate()?;
    let domain = config.domain();

    observer.on_serial_start();
    let (serial, elapsed) = time(|| {
        panic::catch_unwind(AssertUnwindSafe(|| {
            evaluate_serial(workload.as_ref(), domain.clone())
        }))
    });
    drop(black_box(serial.map_err(Error::from_panic)?));
    let serial_secs = elapsed.as_secs_f64();
    observer.on_serial_done(serial_secs);
    log::debug!("serial pass over {} inputs: {serial_secs:.3}s", config.domain_size);

    let counts = worker_counts(config.worker_limit());
    observer.on_parallel_start(&counts);
    let mut parallel = Vec::with_capacity(counts.len());
    for workers in counts {
        let timing = time_configuration(workers, domain.clone(), workload)?;
        observer.on_configuration_done(&timing);
        parallel.push(timing);
    }

    Ok(ExperimentRun {
        serial_secs,
        parallel,
    })
}

/// Runs `config.repeats` experiments sequentially.
pub fn run_repeated<W: Workload>(
    config: &ExperimentConfig,
    workload: Arc<W>,
    observer: &mut dyn ExperimentObserver,
) -> Result<RepeatedRuns> {
    config.validate()?;
    let mut runs = RepeatedRuns::new(worker_counts(config.worker_limit()));

    observer.on_begin(config.repeats);
    for run in 1..=config.repeats {
        observer.on_run_start(run, config.repeats);
        let result = run_one_experiment(config, &workload, observer)?;
        log::info!(
            "run {run}/{}: serial {:.3}s, {} parallel configurations",
            config.repeats,
            result.serial_secs,
            result.parallel.len()
        );
        observer.on_run_done(run, &result);
        runs.push(&result);
    }
    Ok(runs)
}

fn time_configuration<W: Workload>(
    workers: usize,
    domain: Range<u64>,
    workload: &Arc<W>,
) -> Result<ParallelTiming> {
    let mut stopwatch = Stopwatch::start_new();
    let pool = ThreadPool::with_thread_name(workers, |i| format!("bench-w{i}"));
    let monitor = pool.monitor();
    let workload = workload.clone();
    let results = match data_parallel::map_range(&pool, domain, move |x| workload.apply(x)) {
        Ok(results) => results,
        Err(e) => {
            log::warn!("{workers} workers: run aborted: {e}");
            // Queued chunks are discarded rather than drained.
            pool.terminate()?;
            return Err(e);
        }
    };
    pool.shutdown()?;
    stopwatch.stop();
    drop(black_box(results));

    let timing = ParallelTiming {
        workers,
        secs: stopwatch.elapsed_secs(),
        lingering_workers: monitor.live_workers(),
    };
    log::debug!("{workers} workers: {:.3}s", timing.secs);
    Ok(timing)
}
