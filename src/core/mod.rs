//! Core scheduling abstractions: tasks, admission and promotion.

pub mod audit;
pub mod error;
pub mod executor;
pub mod scheduler;
pub mod task;

pub use audit::{build_audit_event, AuditAction, AuditEvent, AuditSink, InMemoryAuditSink};
pub use error::{AppResult, SchedulerError};
pub use executor::{SleepExecutor, TaskExecutor};
pub use scheduler::{
    Admission, Completion, QueueReason, Scheduler, SchedulerState, StatusSnapshot, SubmitOutcome,
    SubmitReceipt,
};
pub use task::{Task, TaskId, TaskKey, TaskView};
