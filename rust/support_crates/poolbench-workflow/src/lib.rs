//! Worker pool utilities for parallel and concurrent processing.
//!
//! This crate provides a fixed-size worker pool and the distribution strategies
//! built on top of it.
//!
//! # Key Components
//!
//! ## Worker Pool
//!
//! - [`thread_pool::ThreadPool`] - A fixed-size pool that owns its worker threads
//!   and joins all of them on shutdown or drop
//!
//! ## Distribution Strategies
//!
//! - [`data_parallel`] - Eager, order-preserving `map` over items or numeric ranges,
//!   split into disjoint chunks
//! - [`unordered`] - Lazy iterator yielding results in completion order, with a
//!   bounded number of tasks in flight
//!
//! ## Task Management
//!
//! - [`join_handle`] - Handles for waiting on task results; a panicking task is
//!   reported as an error instead of tearing down the worker
//! - [`progress`] - Observer trait and iterator adapter for progress display,
//!   kept separate from result consumption
//!
//! # Teardown
//!
//! A pool's lifetime is meant to be scoped to one unit of work: create it, submit,
//! collect, shut it down. Dropping a pool closes its queue and joins every worker,
//! so no worker thread outlives the pool on any exit path.

pub mod data_parallel;
pub mod join_handle;
pub mod progress;
pub mod thread_pool;
pub mod unordered;

pub use join_handle::JoinHandle;
pub use thread_pool::{ThreadPool, WorkerMonitor};
