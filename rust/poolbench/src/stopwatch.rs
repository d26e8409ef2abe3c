use std::time::{Duration, Instant};

/// A wall-clock stopwatch.
///
/// The stopwatch accumulates elapsed time across start/stop cycles. Reading
/// [`elapsed`](Self::elapsed) while it is running includes the current interval.
///
/// # Example
///
/// ```
/// use poolbench::stopwatch::Stopwatch;
///
/// let mut stopwatch = Stopwatch::start_new();
/// // ... do some work ...
/// stopwatch.stop();
/// println!("took {:.3}s", stopwatch.elapsed_secs());
/// ```
#[derive(Default, Clone, Debug)]
pub struct Stopwatch {
    started_at: Option<Instant>,
    elapsed: Duration,
}

impl Stopwatch {
    /// Creates a new stopwatch in the stopped state with zero elapsed time.
    pub fn new() -> Stopwatch {
        Stopwatch::default()
    }

    /// Creates a new stopwatch and starts it immediately.
    pub fn start_new() -> Stopwatch {
        let mut stopwatch = Stopwatch::new();
        stopwatch.start();
        stopwatch
    }

    /// Starts the stopwatch. No-op if it is already running.
    pub fn start(&mut self) {
        if self.started_at.is_none() {
            self.started_at = Some(Instant::now());
        }
    }

    /// Stops the stopwatch, adding the current interval to the elapsed time.
    /// No-op if it is already stopped.
    pub fn stop(&mut self) {
        if let Some(started_at) = self.started_at.take() {
            self.elapsed += started_at.elapsed();
        }
    }

    /// Stops the stopwatch and clears the elapsed time.
    pub fn reset(&mut self) {
        self.started_at = None;
        self.elapsed = Duration::ZERO;
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn elapsed(&self) -> Duration {
        match self.started_at {
            Some(started_at) => self.elapsed + started_at.elapsed(),
            None => self.elapsed,
        }
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed().as_secs_f64()
    }
}

/// Runs `f` and returns its result together with the wall-clock time it took.
pub fn time<R>(f: impl FnOnce() -> R) -> (R, Duration) {
    let stopwatch = Stopwatch::start_new();
    let result = f();
    (result, stopwatch.elapsed())
}
