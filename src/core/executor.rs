//! Task execution trait and the delay-based placeholder executor.

use async_trait::async_trait;

use super::Task;

/// Abstraction for the work behind a task.
///
/// The scheduler only needs to know when the work is done; it never sees a
/// result. Completion is signalled by `execute` returning.
///
/// # Example
///
/// ```rust,ignore
/// use async_trait::async_trait;
/// use keyed_task_queue::core::{Task, TaskExecutor};
///
/// #[derive(Clone)]
/// struct ShellExecutor;
///
/// #[async_trait]
/// impl TaskExecutor for ShellExecutor {
///     async fn execute(&self, task: &Task) {
///         run_job(task.key().as_str()).await;
///     }
/// }
/// ```
#[async_trait]
pub trait TaskExecutor: Send + Sync + Clone + 'static {
    /// Perform the task's work. Returning signals completion.
    async fn execute(&self, task: &Task);
}

/// Executor that simulates work by sleeping for the task's duration.
#[derive(Debug, Clone, Copy, Default)]
pub struct SleepExecutor;

#[async_trait]
impl TaskExecutor for SleepExecutor {
    async fn execute(&self, task: &Task) {
        tokio::time::sleep(task.duration()).await;
    }
}
