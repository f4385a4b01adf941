//! Error types for scheduler operations.
//!
//! Queueing is never an error: a task that cannot start is parked in the
//! pending queue. These variants cover the boundaries around the scheduler.

use thiserror::Error;

/// Errors produced at the scheduler's boundaries.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Configuration failed validation.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    /// A submission payload could not be parsed.
    #[error("malformed batch: {0}")]
    MalformedBatch(String),
    /// A task duration was rejected at the boundary.
    #[error("invalid duration for task `{key}`: {reason}")]
    InvalidDuration {
        /// Key of the offending task.
        key: String,
        /// Why the duration was rejected.
        reason: String,
    },
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
