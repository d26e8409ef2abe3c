use std::sync::Arc;

use poolbench::{
    ExperimentConfig, RepeatedRuns,
    experiment::{ExperimentObserver, ParallelTiming, SilentObserver},
    jobs::{self, JobOutcome, WorkItem},
    run_one_experiment, run_repeated, summarize, summarize_and_render,
    workload::{Kernel, KernelKind, Workload},
};
use poolbench_workflow::{
    ThreadPool,
    progress::{CountingObserver, ObserveExt},
    unordered::map_unordered,
};

fn small_config(max_workers: usize, repeats: usize) -> ExperimentConfig {
    ExperimentConfig {
        domain_size: 100,
        exponent: 2,
        iterations: 10,
        repeats,
        max_workers: Some(max_workers),
        ..Default::default()
    }
}

#[derive(Default)]
struct RecordingObserver {
    configurations: Vec<ParallelTiming>,
    runs_done: usize,
}

impl ExperimentObserver for RecordingObserver {
    fn on_configuration_done(&mut self, timing: &ParallelTiming) {
        self.configurations.push(timing.clone());
    }

    fn on_run_done(&mut self, _run: usize, _result: &poolbench::ExperimentRun) {
        self.runs_done += 1;
    }
}

#[test]
fn test_scaling_scenario_four_workers() {
    let config = small_config(4, 1);
    let mut observer = RecordingObserver::default();
    let runs = run_repeated(&config, Arc::new(config.workload()), &mut observer).unwrap();

    assert_eq!(runs.worker_counts, vec![1, 2, 3, 4]);
    assert_eq!(runs.len(), 1);
    assert_eq!(runs.parallel_secs[0].len(), 4);
    assert!(runs.parallel_secs[0].iter().all(|&secs| secs >= 0.0));

    assert_eq!(observer.runs_done, 1);
    assert_eq!(observer.configurations.len(), 4);
    assert!(observer.configurations.iter().all(|t| t.lingering_workers == 0));
}

#[test]
fn test_repeats_shape() {
    let config = small_config(3, 3);
    let runs = run_repeated(&config, Arc::new(config.workload()), &mut SilentObserver).unwrap();

    assert_eq!(runs.serial_secs.len(), 3);
    assert_eq!(runs.parallel_secs.len(), 3);
    assert!(runs.parallel_secs.iter().all(|row| row.len() == 3));

    let summary = summarize(&runs.serial_secs, &runs.parallel_secs).unwrap();
    assert_eq!(summary.worker_counts, runs.worker_counts);
    assert_eq!(summary.parallel.len(), 3);
}

#[test]
fn test_power_kernel_runs() {
    let config = ExperimentConfig {
        kernel: KernelKind::Power,
        ..small_config(2, 1)
    };
    let run = run_one_experiment(&config, &Arc::new(config.workload()), &mut SilentObserver)
        .unwrap();
    assert_eq!(run.parallel.len(), 2);
}

#[test]
fn test_panicking_workload_is_reported() {
    let config = small_config(2, 2);
    let failing = |x: u64| {
        if x == 42 {
            panic!("bad input {x}");
        }
        x as f64
    };
    let mut observer = RecordingObserver::default();
    let err = run_repeated(&config, Arc::new(failing), &mut observer).unwrap_err();

    assert!(err.is_task_panic());
    assert!(err.to_string().contains("bad input 42"));
    assert_eq!(observer.runs_done, 0);
    assert!(observer.configurations.is_empty());
}

#[test]
fn test_worker_panic_is_reported() {
    let config = small_config(3, 1);
    let failing_on_pool = |x: u64| {
        let on_worker = std::thread::current()
            .name()
            .is_some_and(|name| name.starts_with("bench-w"));
        if on_worker && x == 7 {
            panic!("worker failed at {x}");
        }
        x as f64
    };
    let mut observer = RecordingObserver::default();
    let err = run_repeated(&config, Arc::new(failing_on_pool), &mut observer).unwrap_err();

    assert!(err.is_task_panic());
    assert!(err.to_string().contains("worker failed at 7"));
    // The very first configuration fails, so no timing is recorded.
    assert!(observer.configurations.is_empty());
    assert_eq!(observer.runs_done, 0);
}

#[test]
fn test_invalid_config_rejected_before_running() {
    let config = ExperimentConfig {
        repeats: 0,
        ..small_config(2, 1)
    };
    let never_called = |_: u64| -> f64 { unreachable!() };
    assert!(run_repeated(&config, Arc::new(never_called), &mut SilentObserver).is_err());
}

#[test]
fn test_summarize_and_render_writes_chart() {
    let config = small_config(2, 2);
    let runs = run_repeated(&config, Arc::new(config.workload()), &mut SilentObserver).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scaling.svg");
    let summary = summarize_and_render(&runs, &path).unwrap();

    let svg = std::fs::read_to_string(&path).unwrap();
    assert!(svg.contains("Scaling Performance: Serial vs Parallel"));
    assert_eq!(svg.matches("class=\"marker\"").count(), 2);
    assert!(svg.contains(&format!("Serial Avg ({:.2}s)", summary.serial.mean)));
}

#[test]
fn test_runs_serialize_to_json() {
    let config = small_config(2, 1);
    let runs = run_repeated(&config, Arc::new(config.workload()), &mut SilentObserver).unwrap();

    let json = serde_json::to_string(&runs).unwrap();
    let parsed: RepeatedRuns = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, runs);

    let config_json = serde_json::to_value(&config).unwrap();
    assert_eq!(config_json["kernel"], "trig");
    let partial: ExperimentConfig = serde_json::from_str(r#"{"repeats": 5}"#).unwrap();
    assert_eq!(partial.repeats, 5);
    assert_eq!(partial.domain_size, ExperimentConfig::default().domain_size);
}

#[test]
fn test_batch_jobs_stream_unordered() {
    let mut rng = fastrand::Rng::with_seed(11);
    let delay = std::time::Duration::ZERO..std::time::Duration::from_millis(5);
    let mut items = jobs::wind_tunnel_batch_with_rng(12, delay, &mut rng);
    items.push(WorkItem::Kernel {
        id: 12,
        x: 3,
        kernel: Kernel::power(3),
    });

    let pool = ThreadPool::new(4);
    let mut counter = CountingObserver::default();
    let mut outcomes: Vec<JobOutcome> = map_unordered(&pool, items, jobs::run_job)
        .observe(&mut counter)
        .collect::<poolbench_common::Result<_>>()
        .unwrap();
    pool.shutdown().unwrap();

    assert_eq!(counter.total, Some(13));
    assert_eq!(counter.arrived, 13);
    assert!(counter.finished);

    outcomes.sort_by_key(|o| o.id);
    assert_eq!(
        outcomes.iter().map(|o| o.id).collect::<Vec<_>>(),
        (0..13).collect::<Vec<_>>()
    );
    assert_eq!(outcomes[2].summary, "Test 02: V=12m/s, Alpha=1.0deg -> Drag=8.91N");
    assert_eq!(outcomes[12].value, Kernel::power(3).apply(3));
}
