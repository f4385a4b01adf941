//! Task identity and its one-shot execution trigger.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::TaskExecutor;
use crate::runtime::Spawn;

/// Identifier of a single submitted task instance.
///
/// Keys label work and may repeat over time; ids never do.
pub type TaskId = u64;

/// Opaque label of a unit of work. Any string is accepted, including empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskKey(String);

impl TaskKey {
    /// Create a key from anything string-like.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Borrow the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for TaskKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl From<&str> for TaskKey {
    fn from(key: &str) -> Self {
        Self(key.to_owned())
    }
}

/// A named, timed unit of work.
///
/// Never mutated after construction, except that the scheduler stamps an
/// instance id on it at submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    id: TaskId,
    key: TaskKey,
    duration: Duration,
}

impl Task {
    /// Build a task. Pure; the id is assigned when the task is submitted.
    pub fn new(key: impl Into<TaskKey>, duration: Duration) -> Self {
        Self {
            id: 0,
            key: key.into(),
            duration,
        }
    }

    pub(crate) fn with_id(mut self, id: TaskId) -> Self {
        self.id = id;
        self
    }

    /// Instance id (0 until submitted).
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// The task's key.
    #[must_use]
    pub const fn key(&self) -> &TaskKey {
        &self.key
    }

    /// Nominal execution time.
    #[must_use]
    pub const fn duration(&self) -> Duration {
        self.duration
    }

    /// Start the task's work on `spawner` and call `on_done` exactly once
    /// when it returns. Does not block the caller.
    pub fn run<E, S, F>(&self, executor: &E, spawner: &S, on_done: F)
    where
        E: TaskExecutor,
        S: Spawn,
        F: FnOnce() + Send + 'static,
    {
        tracing::info!(
            task_id = self.id,
            key = %self.key,
            duration_ms = self.duration.as_millis(),
            "task started"
        );
        let task = self.clone();
        let executor = executor.clone();
        spawner.spawn(async move {
            executor.execute(&task).await;
            tracing::info!(
                task_id = task.id,
                key = %task.key,
                duration_ms = task.duration.as_millis(),
                "task finished"
            );
            on_done();
        });
    }

    /// Serializable view of this task.
    #[must_use]
    pub fn view(&self) -> TaskView {
        TaskView::from(self)
    }
}

/// Status entry for a task: its key and nominal duration.
///
/// On the wire `duration` is milliseconds: an integer when the duration is
/// a whole number of milliseconds, a float otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskView {
    /// Task key.
    pub key: TaskKey,
    /// Nominal duration.
    #[serde(with = "millis")]
    pub duration: Duration,
}

impl From<&Task> for TaskView {
    fn from(task: &Task) -> Self {
        Self {
            key: task.key.clone(),
            duration: task.duration,
        }
    }
}

/// Durations as non-negative milliseconds, with nanosecond resolution.
pub(crate) mod millis {
    use std::time::Duration;

    use serde::de::{self, Deserialize, Deserializer};
    use serde::Serializer;

    const NANOS_PER_MILLI: u128 = 1_000_000;

    /// Convert a millisecond count into a `Duration`, rounding to the
    /// nearest nanosecond.
    pub(crate) fn from_f64(ms: f64) -> Result<Duration, &'static str> {
        if !ms.is_finite() {
            return Err("must be finite");
        }
        if ms < 0.0 {
            return Err("must be non-negative");
        }
        let nanos = (ms * 1e6).round();
        if nanos >= 18_446_744_073_709_551_616.0 {
            return Err("is too large");
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let nanos = nanos as u64;
        Ok(Duration::from_nanos(nanos))
    }

    pub(crate) fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let nanos = duration.as_nanos();
        if nanos % NANOS_PER_MILLI == 0 {
            let whole = u64::try_from(nanos / NANOS_PER_MILLI).unwrap_or(u64::MAX);
            return serializer.serialize_u64(whole);
        }
        #[allow(clippy::cast_precision_loss)]
        let ms = nanos as f64 / 1e6;
        serializer.serialize_f64(ms)
    }

    pub(crate) fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let ms = f64::deserialize(deserializer)?;
        from_f64(ms).map_err(|reason| de::Error::custom(format!("duration {reason}")))
    }
}
