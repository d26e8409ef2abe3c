//! Join handle for thread pool task results.
//!
//! A [`JoinHandle`] is returned by [`ThreadPool::spawn`](crate::ThreadPool::spawn)
//! and allows waiting for and retrieving the result of the task. Task panics are
//! captured on the worker and surface here as errors.

use crossbeam::channel::{self, Receiver};
use poolbench_common::{Result, error::Error};
use std::thread;

/// A handle for waiting on the result of a task with `'static` lifetime.
///
/// ## Lifecycle
///
/// 1. **Created**: When a task is spawned, a `JoinHandle` is returned
/// 2. **Pending**: The task is running or queued for execution
/// 3. **Ready**: The task has completed (or panicked) and the outcome is available
/// 4. **Consumed**: The outcome has been retrieved via [`join()`](Self::join)
pub struct JoinHandle<R>(Receiver<thread::Result<R>>);

impl<R> JoinHandle<R> {
    pub(crate) fn new(rx: Receiver<thread::Result<R>>) -> JoinHandle<R> {
        JoinHandle(rx)
    }

    /// Creates a `JoinHandle` that is immediately ready with the given result.
    pub fn ready(res: R) -> Self {
        let (tx, rx) = channel::bounded(1);
        // The receiver is alive and the channel has capacity, so this cannot fail.
        let _ = tx.send(Ok(res));
        Self(rx)
    }

    /// Checks if the task outcome is ready without blocking.
    pub fn is_ready(&self) -> bool {
        !self.0.is_empty()
    }

    /// Waits for the task to complete and returns its result.
    ///
    /// # Errors
    ///
    /// * `TaskPanicked` if the task panicked; the panic message is preserved.
    /// * `WorkerLost` if the task was dropped without running.
    pub fn join(self) -> Result<R> {
        match self.0.recv() {
            Ok(Ok(res)) => Ok(res),
            Ok(Err(payload)) => Err(Error::from_panic(payload)),
            Err(_) => Err(Error::worker_lost()),
        }
    }

    /// Waits for all handles in order and collects their results.
    ///
    /// Returns the first error encountered in handle order. Handles after the
    /// failing one are dropped; their tasks still run to completion on the pool.
    pub fn join_all(handles: impl IntoIterator<Item = JoinHandle<R>>) -> Result<Vec<R>> {
        handles.into_iter().map(|h| h.join()).collect()
    }
}
