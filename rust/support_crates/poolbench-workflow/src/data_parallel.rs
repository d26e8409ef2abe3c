//! Eager parallel data processing over a [`ThreadPool`].
//!
//! The functions in this module split their input into disjoint contiguous chunks,
//! submit one task per chunk, and block until every chunk has completed. Results
//! are returned in input order.
//!
//! - [`map`] - Transform each item of a collection
//! - [`map_range`] - Transform each value of a numeric range without materializing it
//!
//! Once any chunk panics, the remaining chunks stop at their next input, so a
//! failure is reported without evaluating the rest of the input.
//!
//! Chunking follows the usual process-pool heuristic: roughly
//! [`CHUNKS_PER_WORKER`] chunks per worker, which keeps per-task overhead low while
//! still letting faster workers pick up extra chunks.

use crate::{join_handle::JoinHandle, thread_pool::ThreadPool};
use poolbench_common::Result;
use std::{
    ops::Range,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
};

/// Target number of chunks handed to each worker.
pub const CHUNKS_PER_WORKER: usize = 4;

/// Maps a function over a collection on the given pool, returning results in input order.
///
/// # Arguments
///
/// * `pool` - The pool whose workers execute the chunks
/// * `items` - The items to process
/// * `f` - The function to apply to each item, transforming `T` to `R`
///
/// # Errors
///
/// If `f` panics for some item, the error of the first failing chunk (in input order)
/// is returned and no results are produced. Chunks still running stop early.
pub fn map<T, R, F>(pool: &ThreadPool, items: impl IntoIterator<Item = T>, f: F) -> Result<Vec<R>>
where
    T: Send + 'static,
    R: Send + 'static,
    F: Fn(T) -> R + Send + Sync + 'static,
{
    let items: Vec<T> = items.into_iter().collect();
    let len = items.len();
    if len == 0 {
        return Ok(Vec::new());
    }

    let chunk_size = chunk_size(len, pool.num_threads());
    let f = Arc::new(f);
    let failed = Arc::new(AtomicBool::new(false));
    let mut items = items.into_iter();
    let mut handles = Vec::with_capacity(len.div_ceil(chunk_size));
    loop {
        let chunk: Vec<T> = items.by_ref().take(chunk_size).collect();
        if chunk.is_empty() {
            break;
        }
        let f = f.clone();
        let failed = failed.clone();
        handles.push(pool.spawn(move || run_chunk(&failed, chunk, f.as_ref())));
    }

    collect_chunks(handles, len)
}

/// Maps a function over every value of `range` on the given pool, returning results in
/// ascending order of the input value.
///
/// Each task receives a disjoint sub-range, so no input values are allocated.
pub fn map_range<R, F>(pool: &ThreadPool, range: Range<u64>, f: F) -> Result<Vec<R>>
where
    R: Send + 'static,
    F: Fn(u64) -> R + Send + Sync + 'static,
{
    let len = range.end.saturating_sub(range.start) as usize;
    if len == 0 {
        return Ok(Vec::new());
    }

    let f = Arc::new(f);
    let failed = Arc::new(AtomicBool::new(false));
    let handles = split_range(range, chunk_size(len, pool.num_threads()))
        .map(|chunk| {
            let f = f.clone();
            let failed = failed.clone();
            pool.spawn(move || run_chunk(&failed, chunk, f.as_ref()))
        })
        .collect::<Vec<_>>();

    collect_chunks(handles, len)
}

/// Computes the chunk length for `len` items over `num_workers` workers.
///
/// Equivalent to `ceil(len / (num_workers * CHUNKS_PER_WORKER))`, never less than 1.
pub fn chunk_size(len: usize, num_workers: usize) -> usize {
    let num_chunks = num_workers.max(1) * CHUNKS_PER_WORKER;
    len.div_ceil(num_chunks).max(1)
}

/// Splits `range` into consecutive, disjoint sub-ranges of at most `chunk_size` values.
pub fn split_range(range: Range<u64>, chunk_size: usize) -> impl Iterator<Item = Range<u64>> {
    let step = chunk_size.max(1) as u64;
    let end = range.end;
    (range.start..end)
        .step_by(chunk_size.max(1))
        .map(move |start| start..start.saturating_add(step).min(end))
}

/// Applies `f` to each input until the shared `failed` flag is raised.
///
/// A panic in `f` raises the flag while unwinding, before the pool records the failure.
fn run_chunk<T, R>(
    failed: &AtomicBool,
    inputs: impl IntoIterator<Item = T>,
    f: impl Fn(T) -> R,
) -> Vec<R> {
    let _guard = RaiseOnPanic(failed);
    let inputs = inputs.into_iter();
    let mut out = Vec::with_capacity(inputs.size_hint().0);
    for input in inputs {
        if failed.load(Ordering::Relaxed) {
            break;
        }
        out.push(f(input));
    }
    out
}

struct RaiseOnPanic<'a>(&'a AtomicBool);

impl Drop for RaiseOnPanic<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            self.0.store(true, Ordering::Relaxed);
        }
    }
}

fn collect_chunks<R>(handles: Vec<JoinHandle<Vec<R>>>, len: usize) -> Result<Vec<R>> {
    let mut results = Vec::with_capacity(len);
    for handle in handles {
        results.extend(handle.join()?);
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_size() {
        assert_eq!(chunk_size(100, 4), 7);
        assert_eq!(chunk_size(16, 4), 1);
        assert_eq!(chunk_size(3, 8), 1);
        assert_eq!(chunk_size(1000, 1), 250);
        assert_eq!(chunk_size(10, 0), 3);
    }

    #[test]
    fn test_split_range_is_disjoint_and_complete() {
        let chunks: Vec<_> = split_range(5..27, 7).collect();
        assert_eq!(chunks, vec![5..12, 12..19, 19..26, 26..27]);

        let covered: Vec<u64> = chunks.into_iter().flatten().collect();
        assert_eq!(covered, (5..27).collect::<Vec<_>>());
    }

    #[test]
    fn test_split_empty_range() {
        assert_eq!(split_range(10..10, 4).count(), 0);
    }

    #[test]
    fn test_map_preserves_order() {
        let pool = ThreadPool::new(3);
        let results = map(&pool, 0..50u32, |x| x * 10).unwrap();
        assert_eq!(results, (0..50u32).map(|x| x * 10).collect::<Vec<_>>());
    }

    #[test]
    fn test_map_empty() {
        let pool = ThreadPool::new(2);
        let results: Vec<u8> = map(&pool, Vec::<u8>::new(), |x| x).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_map_owned_items() {
        let pool = ThreadPool::new(2);
        let words = vec!["alpha".to_string(), "beta".to_string(), "gamma".to_string()];
        let lengths = map(&pool, words, |w| w.len()).unwrap();
        assert_eq!(lengths, vec![5, 4, 5]);
    }

    #[test]
    fn test_map_range_matches_sequential() {
        let pool = ThreadPool::new(4);
        let f = |x: u64| (x as f64).sqrt();
        let parallel = map_range(&pool, 0..1_000, f).unwrap();
        let sequential: Vec<f64> = (0..1_000).map(f).collect();
        assert_eq!(parallel, sequential);
    }

    #[test]
    fn test_map_range_single_worker() {
        let pool = ThreadPool::new(1);
        let results = map_range(&pool, 3..8, |x| x + 1).unwrap();
        assert_eq!(results, vec![4, 5, 6, 7, 8]);
    }

    #[test]
    fn test_map_range_propagates_panic() {
        let pool = ThreadPool::new(2);
        let monitor = pool.monitor();
        let err = map_range(&pool, 0..100, |x| {
            if x == 42 {
                panic!("cannot evaluate input {x}");
            }
            x
        })
        .unwrap_err();
        assert!(err.is_task_panic());
        assert!(err.to_string().contains("cannot evaluate input 42"));

        drop(pool);
        assert_eq!(monitor.live_workers(), 0);
    }

    #[test]
    fn test_failure_stops_remaining_chunks() {
        use std::sync::atomic::AtomicUsize;

        let pool = ThreadPool::new(1);
        let evaluated = Arc::new(AtomicUsize::new(0));
        let counter = evaluated.clone();
        let err = map_range(&pool, 0..400, move |x| {
            if x == 0 {
                panic!("fail at {x}");
            }
            counter.fetch_add(1, Ordering::SeqCst);
            x
        })
        .unwrap_err();
        assert!(err.is_task_panic());

        pool.shutdown().unwrap();
        assert_eq!(evaluated.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_map_failure_stops_remaining_chunks() {
        use std::sync::atomic::AtomicUsize;

        let pool = ThreadPool::new(1);
        let evaluated = Arc::new(AtomicUsize::new(0));
        let counter = evaluated.clone();
        let items: Vec<u32> = (0..64).collect();
        assert!(map(&pool, items, move |x| {
            if x == 3 {
                panic!("fail at {x}");
            }
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .is_err());

        pool.shutdown().unwrap();
        // Only the inputs before the failing one in the first chunk ran.
        assert_eq!(evaluated.load(Ordering::SeqCst), 3);
    }
}
