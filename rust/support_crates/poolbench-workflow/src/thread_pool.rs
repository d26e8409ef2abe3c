//! Thread pool implementation for concurrent task execution.
//!
//! This module provides a fixed-size thread pool that allows spawning functions
//! on worker threads. Work items can be submitted for execution and either waited
//! on for completion (using [`JoinHandle`]) or executed in a fire-and-forget manner.
//!
//! Unlike a process-wide shared pool, a [`ThreadPool`] owns its workers: shutting
//! it down (explicitly or by dropping it) closes the task queue and joins every
//! worker thread before returning.

use crate::join_handle::JoinHandle;
use crossbeam::channel::{self, Receiver, Sender};
use poolbench_common::{Result, error::Error};
use std::{
    panic::{self, AssertUnwindSafe},
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    thread,
};

/// A fixed-size thread pool for executing concurrent tasks.
///
/// `ThreadPool` manages a set of worker threads that execute tasks (functions)
/// submitted through the [`spawn`](Self::spawn) and [`spawn_detached`](Self::spawn_detached)
/// methods. The implementation uses an internal multi-producer, multi-consumer channel
/// to distribute tasks among worker threads.
///
/// ## Lifetime
///
/// The pool is not `Clone`: exactly one owner decides when it is torn down.
/// [`shutdown`](Self::shutdown) and `Drop` both close the queue and join all
/// workers. Tasks already queued are still executed before the workers exit.
///
/// ## Panics in tasks
///
/// Every task runs under `catch_unwind`, so a panicking task never takes a
/// worker thread down with it. For tasks started with [`spawn`](Self::spawn)
/// the panic is delivered to the [`JoinHandle`] as an error.
pub struct ThreadPool {
    tx: Option<Sender<TaskFn>>,
    /// Kept to discard queued tasks on termination.
    queue: Receiver<TaskFn>,
    workers: Vec<thread::JoinHandle<()>>,
    live: Arc<AtomicUsize>,
}

/// A boxed function that can be executed by a worker thread.
///
/// The task must be `Send + 'static` to ensure it can be safely transferred
/// between threads and doesn't contain any references with limited lifetimes.
pub(crate) type TaskFn = Box<dyn FnOnce() + Send + 'static>;

impl ThreadPool {
    /// Creates a new `ThreadPool` with the specified number of worker threads.
    ///
    /// # Arguments
    ///
    /// * `num_threads` - The number of worker threads to spawn. Must be greater than 0.
    ///
    /// # Panics
    ///
    /// Panics if `num_threads` is 0.
    pub fn new(num_threads: usize) -> Self {
        Self::with_thread_name(num_threads, |_| String::new())
    }

    /// Creates a new `ThreadPool` with the specified number of worker threads and custom
    /// thread names.
    ///
    /// The provided `thread_name` function is called for each thread with its index
    /// to generate a name. If it returns an empty string for a given index, that
    /// thread will not have a custom name set.
    ///
    /// # Arguments
    ///
    /// * `num_threads` - The number of worker threads to spawn. Must be greater than 0.
    /// * `thread_name` - A function that takes a thread index (0-based) and returns
    ///   the name for that thread.
    ///
    /// # Panics
    ///
    /// Panics if `num_threads` is 0, or if the OS refuses to spawn a thread.
    pub fn with_thread_name(num_threads: usize, thread_name: impl Fn(usize) -> String) -> Self {
        assert_ne!(num_threads, 0);

        let (tx, rx) = channel::unbounded::<TaskFn>();
        let live = Arc::new(AtomicUsize::new(0));
        let mut workers = Vec::with_capacity(num_threads);
        for i in 0..num_threads {
            let rx = rx.clone();
            let guard = LiveGuard::enter(live.clone());
            let mut builder = thread::Builder::new();
            let name = thread_name(i);
            if !name.is_empty() {
                builder = builder.name(name);
            }
            let handle = builder
                .spawn(move || Self::thread_fn(rx, guard))
                .expect("spawn thread");
            workers.push(handle);
        }
        log::debug!("thread pool started with {num_threads} workers");

        ThreadPool {
            tx: Some(tx),
            queue: rx,
            workers,
            live,
        }
    }

    /// Creates a new `ThreadPool` with one worker per available processor.
    pub fn with_default_threads() -> Self {
        Self::new(available_parallelism())
    }

    /// Returns the number of worker threads owned by this pool.
    pub fn num_threads(&self) -> usize {
        self.workers.len()
    }

    /// Returns a monitor that observes how many of this pool's worker threads
    /// are still alive. The monitor stays valid after the pool is gone.
    pub fn monitor(&self) -> WorkerMonitor {
        WorkerMonitor(self.live.clone())
    }

    /// Spawns a task on the thread pool and returns a handle to wait for the result.
    ///
    /// # Arguments
    ///
    /// * `f` - The function to execute on a worker thread.
    ///
    /// # Returns
    ///
    /// A [`JoinHandle<R>`] that can be used to wait for completion and retrieve the result.
    /// If `f` panics, [`JoinHandle::join`] returns a `TaskPanicked` error.
    pub fn spawn<F, R>(&self, f: F) -> JoinHandle<R>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        let (tx_result, rx_result) = channel::bounded::<thread::Result<R>>(1);
        // A rejected task drops `tx_result`, which the handle reports as a lost worker.
        self.submit(Box::new(move || {
            let result = panic::catch_unwind(AssertUnwindSafe(f));
            let _ = tx_result.send(result); // Ignore send errors if receiver is dropped
        }));
        JoinHandle::new(rx_result)
    }

    /// Spawns a task on the thread pool without waiting for the result.
    ///
    /// Use this for fire-and-forget tasks where you don't need to wait for the
    /// result or know when the task completes.
    pub fn spawn_detached<F>(&self, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        if !self.submit(Box::new(f)) {
            log::warn!("detached task rejected: no listening worker threads");
        }
    }

    /// Shuts the pool down: closes the task queue, lets the workers drain what
    /// is already queued, and joins every worker thread.
    ///
    /// Returns an error if a worker thread terminated abnormally.
    pub fn shutdown(mut self) -> Result<()> {
        self.close_and_join()
    }

    /// Terminates the pool: discards every task still waiting in the queue,
    /// then closes the queue and joins the workers.
    ///
    /// Tasks already running are not interrupted. Handles of discarded tasks
    /// report `WorkerLost`.
    pub fn terminate(mut self) -> Result<()> {
        let discarded = self.discard_pending();
        if discarded > 0 {
            log::debug!("thread pool terminated, {discarded} queued tasks discarded");
        }
        self.close_and_join()
    }

    /// Removes all queued tasks without running them and returns how many were
    /// removed. Running tasks are unaffected, and the pool stays usable.
    pub fn discard_pending(&self) -> usize {
        let mut discarded = 0;
        while self.queue.try_recv().is_ok() {
            discarded += 1;
        }
        discarded
    }

    /// Enqueues a boxed task, returning `false` if no worker can receive it.
    pub(crate) fn submit(&self, task: TaskFn) -> bool {
        match &self.tx {
            Some(tx) => tx.send(task).is_ok(),
            None => false,
        }
    }

    fn close_and_join(&mut self) -> Result<()> {
        // Dropping the only sender disconnects the queue once it is drained.
        self.tx.take();
        let num_workers = self.workers.len();
        let mut failed = 0;
        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                failed += 1;
            }
        }
        if num_workers > 0 {
            log::debug!("thread pool with {num_workers} workers shut down");
        }
        if failed > 0 {
            return Err(Error::worker_lost());
        }
        Ok(())
    }
}

impl ThreadPool {
    /// Worker thread function that processes tasks from the queue until the
    /// queue is closed and empty.
    fn thread_fn(rx: Receiver<TaskFn>, _guard: LiveGuard) {
        while let Ok(task) = rx.recv() {
            if panic::catch_unwind(AssertUnwindSafe(task)).is_err() {
                log::error!("detached task panicked on worker thread");
            }
        }
    }
}

impl Default for ThreadPool {
    /// Equivalent to [`with_default_threads()`](Self::with_default_threads).
    fn default() -> Self {
        Self::with_default_threads()
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        let _ = self.close_and_join();
    }
}

/// Observes the number of live worker threads of a [`ThreadPool`].
#[derive(Clone, Debug)]
pub struct WorkerMonitor(Arc<AtomicUsize>);

impl WorkerMonitor {
    /// Number of worker threads that have not exited yet.
    pub fn live_workers(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// Counts a worker as live from before its thread is spawned until its
/// thread function returns.
struct LiveGuard(Arc<AtomicUsize>);

impl LiveGuard {
    fn enter(live: Arc<AtomicUsize>) -> LiveGuard {
        live.fetch_add(1, Ordering::SeqCst);
        LiveGuard(live)
    }
}

impl Drop for LiveGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Returns the number of processors available to this process, or 1 if it
/// cannot be determined.
pub fn available_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        sync::Mutex,
        time::{Duration, Instant},
    };

    #[test]
    fn test_new_thread_pool() {
        let pool = ThreadPool::new(2);
        assert_eq!(pool.num_threads(), 2);
        drop(pool);
    }

    #[test]
    #[should_panic]
    fn test_new_thread_pool_zero_threads() {
        ThreadPool::new(0);
    }

    #[test]
    fn test_with_default_threads() {
        let pool = ThreadPool::with_default_threads();
        assert_eq!(pool.num_threads(), available_parallelism());
    }

    #[test]
    fn test_spawn_simple_task() {
        let pool = ThreadPool::new(2);
        let handle = pool.spawn(|| 42);
        assert_eq!(handle.join().unwrap(), 42);
    }

    #[test]
    fn test_spawn_multiple_tasks() {
        let pool = ThreadPool::new(2);
        let handles: Vec<_> = (0..10).map(|i| pool.spawn(move || i * 2)).collect();

        let results = JoinHandle::join_all(handles).unwrap();
        for (i, result) in results.into_iter().enumerate() {
            assert_eq!(result, i * 2);
        }
    }

    #[test]
    fn test_spawn_detached_runs_before_shutdown_returns() {
        let pool = ThreadPool::new(2);
        let counter = Arc::new(Mutex::new(0));

        let num_tasks = 10;
        for _ in 0..num_tasks {
            let counter = counter.clone();
            pool.spawn_detached(move || {
                *counter.lock().unwrap() += 1;
            });
        }

        // Shutdown drains the queue before joining.
        pool.shutdown().unwrap();
        assert_eq!(*counter.lock().unwrap(), num_tasks);
    }

    #[test]
    fn test_concurrent_task_execution() {
        let pool = ThreadPool::new(4);
        let start_time = Instant::now();
        let sleep_duration = Duration::from_millis(50);

        let handles: Vec<_> = (0..4)
            .map(|_| {
                pool.spawn(move || {
                    std::thread::sleep(sleep_duration);
                    42
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), 42);
        }

        // 4 threads running 4 sleeping tasks should take roughly one sleep.
        assert!(start_time.elapsed() < sleep_duration * 3);
    }

    #[test]
    fn test_panicking_task_reports_error() {
        let pool = ThreadPool::new(1);
        let handle = pool.spawn(|| -> u32 { panic!("workload failed on input 7") });
        let err = handle.join().unwrap_err();
        assert!(err.is_task_panic());
        assert!(err.to_string().contains("workload failed on input 7"));

        // The single worker survived the panic and keeps serving tasks.
        assert_eq!(pool.spawn(|| 5).join().unwrap(), 5);
        assert_eq!(pool.monitor().live_workers(), 1);
    }

    #[test]
    fn test_panicking_detached_task_keeps_worker() {
        let pool = ThreadPool::new(1);
        pool.spawn_detached(|| panic!("detached failure"));
        assert_eq!(pool.spawn(|| "still alive").join().unwrap(), "still alive");
    }

    #[test]
    fn test_shutdown_leaves_no_live_workers() {
        let pool = ThreadPool::new(4);
        let monitor = pool.monitor();
        assert_eq!(monitor.live_workers(), 4);

        let handles: Vec<_> = (0..16u64).map(|i| pool.spawn(move || i * i)).collect();
        assert_eq!(JoinHandle::join_all(handles).unwrap().len(), 16);

        pool.shutdown().unwrap();
        assert_eq!(monitor.live_workers(), 0);
    }

    #[test]
    fn test_drop_joins_workers() {
        let pool = ThreadPool::new(3);
        let monitor = pool.monitor();
        pool.spawn_detached(|| std::thread::sleep(Duration::from_millis(20)));
        drop(pool);
        assert_eq!(monitor.live_workers(), 0);
    }

    #[test]
    fn test_discard_pending_skips_queued_tasks() {
        let pool = ThreadPool::new(1);
        let (started_tx, started_rx) = channel::bounded::<()>(1);
        let (gate_tx, gate_rx) = channel::bounded::<()>(0);
        let blocked = pool.spawn(move || {
            started_tx.send(()).ok();
            gate_rx.recv().is_ok()
        });
        started_rx.recv().unwrap();

        let counter = Arc::new(AtomicUsize::new(0));
        let queued: Vec<_> = (0..10)
            .map(|_| {
                let counter = counter.clone();
                pool.spawn(move || counter.fetch_add(1, Ordering::SeqCst))
            })
            .collect();

        assert_eq!(pool.discard_pending(), 10);
        gate_tx.send(()).unwrap();
        assert!(blocked.join().unwrap());

        for handle in queued {
            assert!(matches!(
                handle.join().unwrap_err().kind(),
                poolbench_common::error::ErrorKind::WorkerLost
            ));
        }
        pool.shutdown().unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_terminate_joins_workers() {
        let pool = ThreadPool::new(2);
        let monitor = pool.monitor();
        for _ in 0..50 {
            pool.spawn_detached(|| std::thread::sleep(Duration::from_millis(1)));
        }
        pool.terminate().unwrap();
        assert_eq!(monitor.live_workers(), 0);
    }

    #[test]
    fn test_named_threads() {
        let pool = ThreadPool::with_thread_name(2, |i| format!("bench-worker-{i}"));
        let name = pool
            .spawn(|| std::thread::current().name().map(str::to_string))
            .join()
            .unwrap();
        assert!(name.unwrap().starts_with("bench-worker-"));
    }

    #[test]
    fn test_many_small_tasks() {
        let pool = ThreadPool::new(4);
        let handles: Vec<_> = (0..1000).map(|i| pool.spawn(move || i)).collect();

        for (expected, handle) in handles.into_iter().enumerate() {
            assert_eq!(handle.join().unwrap(), expected);
        }
    }

    #[test]
    fn test_task_returning_different_types() {
        let pool = ThreadPool::new(2);

        let handle_int = pool.spawn(|| 42i32);
        let handle_string = pool.spawn(|| "hello".to_string());
        let handle_vec = pool.spawn(|| vec![1, 2, 3]);

        assert_eq!(handle_int.join().unwrap(), 42);
        assert_eq!(handle_string.join().unwrap(), "hello");
        assert_eq!(handle_vec.join().unwrap(), vec![1, 2, 3]);
    }
}
