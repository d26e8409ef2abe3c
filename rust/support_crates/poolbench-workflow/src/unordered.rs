//! Lazy, unordered result streaming over a [`ThreadPool`].
//!
//! [`map_unordered`] returns an [`Unordered`] iterator. Input items are pulled from
//! the source iterator only as capacity frees up, so at most `max_in_flight` tasks
//! are submitted but not yet consumed at any time. Each call to `next()` yields
//! whichever result completes first.
//!
//! Progress reporting is not built in; wrap the iterator with
//! [`ObserveExt::observe`](crate::progress::ObserveExt::observe) to attach an observer.

use crate::thread_pool::ThreadPool;
use crossbeam::channel::{self, Receiver, Sender};
use poolbench_common::{Result, error::Error};
use std::{
    panic::{self, AssertUnwindSafe},
    sync::Arc,
    thread,
};

/// Maps `f` over `items` on `pool`, yielding results in completion order.
///
/// The number of tasks in flight defaults to the pool size; see
/// [`Unordered::with_max_in_flight`].
pub fn map_unordered<I, T, R, F>(
    pool: &ThreadPool,
    items: I,
    f: F,
) -> Unordered<'_, I::IntoIter, F, R>
where
    I: IntoIterator<Item = T>,
    T: Send + 'static,
    R: Send + 'static,
    F: Fn(T) -> R + Send + Sync + 'static,
{
    let (tx, rx) = channel::unbounded();
    Unordered {
        pool,
        items: items.into_iter(),
        f: Arc::new(f),
        tx,
        rx,
        in_flight: 0,
        rejected: 0,
        max_in_flight: pool.num_threads(),
    }
}

/// Iterator over task results in the order the tasks complete.
///
/// Yields `Ok(value)` for each completed task and `Err(TaskPanicked)` for each
/// task that panicked; iteration continues past failures.
pub struct Unordered<'pool, I, F, R> {
    pool: &'pool ThreadPool,
    items: I,
    f: Arc<F>,
    tx: Sender<thread::Result<R>>,
    rx: Receiver<thread::Result<R>>,
    in_flight: usize,
    rejected: usize,
    max_in_flight: usize,
}

impl<I, T, F, R> Unordered<'_, I, F, R>
where
    I: Iterator<Item = T>,
    T: Send + 'static,
    R: Send + 'static,
    F: Fn(T) -> R + Send + Sync + 'static,
{
    /// Sets the maximum number of submitted but unconsumed tasks. Values below 1
    /// are clamped to 1.
    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = max_in_flight.max(1);
        self
    }

    /// Number of tasks currently submitted to the pool and not yet yielded.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    fn fill(&mut self) {
        while self.in_flight < self.max_in_flight {
            let Some(item) = self.items.next() else {
                break;
            };
            let f = self.f.clone();
            let tx = self.tx.clone();
            let accepted = self.pool.submit(Box::new(move || {
                let result = panic::catch_unwind(AssertUnwindSafe(|| f(item)));
                let _ = tx.send(result);
            }));
            if accepted {
                self.in_flight += 1;
            } else {
                self.rejected += 1;
            }
        }
    }
}

impl<I, T, F, R> Iterator for Unordered<'_, I, F, R>
where
    I: Iterator<Item = T>,
    T: Send + 'static,
    R: Send + 'static,
    F: Fn(T) -> R + Send + Sync + 'static,
{
    type Item = Result<R>;

    fn next(&mut self) -> Option<Result<R>> {
        self.fill();
        if self.rejected > 0 {
            self.rejected -= 1;
            return Some(Err(Error::worker_lost()));
        }
        if self.in_flight == 0 {
            return None;
        }
        // `self.tx` keeps the channel connected, so `recv` only returns once a task reports.
        let received = self.rx.recv();
        self.in_flight -= 1;
        Some(match received {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(payload)) => Err(Error::from_panic(payload)),
            Err(_) => Err(Error::worker_lost()),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let pending = self.in_flight + self.rejected;
        let (lower, upper) = self.items.size_hint();
        (
            lower.saturating_add(pending),
            upper.and_then(|upper| upper.checked_add(pending)),
        )
    }
}
