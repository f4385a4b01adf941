//! # Keyed Task Queue
//!
//! Admits named, timed units of work under a fixed concurrency limit.
//!
//! Every submitted task either starts immediately or is parked in a pending
//! queue. A task is parked when all running slots are taken, or when another
//! task with the same key is already running. Whenever a running task
//! finishes, the first pending task whose key is not running is promoted
//! into the freed slot.
//!
//! ## Guarantees
//!
//! - **Capacity bound**: never more than `max_concurrency` tasks run at once.
//! - **Per-key exclusivity**: two tasks with the same key never run at the
//!   same time.
//! - **Conservation**: a task is pending, running, or finished; never two of
//!   those at once.
//! - **First eligible promotion**: promotion follows arrival order but skips
//!   tasks whose key is still running, so one busy key does not block the
//!   rest of the queue.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::num::NonZeroUsize;
//! use std::time::Duration;
//!
//! use keyed_task_queue::core::{Scheduler, SleepExecutor};
//! use keyed_task_queue::runtime::TokioSpawner;
//!
//! let scheduler = Scheduler::new(
//!     NonZeroUsize::new(2).unwrap(),
//!     SleepExecutor,
//!     TokioSpawner::current(),
//! );
//! scheduler.submit("a", Duration::from_millis(50));
//! scheduler.submit("b", Duration::from_millis(50));
//! scheduler.submit("c", Duration::from_millis(50)); // parked: at capacity
//!
//! let status = scheduler.status();
//! assert_eq!(status.running.len(), 2);
//! assert_eq!(status.pending.len(), 1);
//! ```
//!
//! The [`gateway`] module exposes the same operations over HTTP.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core scheduling abstractions: tasks, admission and promotion.
pub mod core;
/// Configuration models for the scheduler and server.
pub mod config;
/// Builders to construct scheduler components from configuration.
pub mod builders;
/// Infrastructure adapters for scheduler storage.
pub mod infra;
/// Runtime adapters used to run admitted tasks.
pub mod runtime;
/// HTTP front end.
pub mod gateway;
/// Shared utilities.
pub mod util;
