//! Builds a scheduler from validated configuration.

use std::num::NonZeroUsize;

use crate::config::SchedulerConfig;
use crate::core::{AuditSink, Scheduler, SchedulerError, TaskExecutor};
use crate::runtime::Spawn;

/// Build a scheduler from configuration, optionally recording decisions to
/// an audit sink.
///
/// # Errors
///
/// Returns [`SchedulerError::InvalidConfig`] when the configuration does not
/// validate.
pub fn build_scheduler<E, S>(
    cfg: &SchedulerConfig,
    executor: E,
    spawner: S,
    audit: Option<Box<dyn AuditSink>>,
) -> Result<Scheduler<E, S>, SchedulerError>
where
    E: TaskExecutor,
    S: Spawn + Clone + Send + Sync + 'static,
{
    cfg.validate().map_err(SchedulerError::InvalidConfig)?;
    let max = NonZeroUsize::new(cfg.max_concurrency).ok_or_else(|| {
        SchedulerError::InvalidConfig("max_concurrency must be greater than 0".into())
    })?;

    Ok(match audit {
        Some(sink) => Scheduler::with_audit(max, executor, spawner, sink),
        None => Scheduler::new(max, executor, spawner),
    })
}
