//! Submission payloads, validated before any task is built.

use std::fmt;
use std::time::Duration;

use serde::de::{Deserializer, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::task::millis;
use crate::core::{SchedulerError, Task};

/// One validated `(key, duration)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRequest {
    /// Task key; any string, including empty.
    pub key: String,
    /// Nominal duration; milliseconds on the wire.
    #[serde(with = "millis")]
    pub duration: Duration,
}

impl TaskRequest {
    /// Build the task this request describes.
    #[must_use]
    pub fn to_task(&self) -> Task {
        Task::new(self.key.as_str(), self.duration)
    }
}

/// Ordered, validated batch of submissions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskBatch(Vec<TaskRequest>);

impl TaskBatch {
    /// Parse and validate a request body.
    ///
    /// Accepts a JSON object mapping key to duration (member order and
    /// repeated keys are kept) or an array of `{"key", "duration"}` objects.
    ///
    /// # Errors
    ///
    /// [`SchedulerError::MalformedBatch`] when the body is not one of the two
    /// shapes; [`SchedulerError::InvalidDuration`] when a duration is not a
    /// finite non-negative number of milliseconds.
    pub fn parse(body: &[u8]) -> Result<Self, SchedulerError> {
        let RawBatch(entries) = serde_json::from_slice(body)
            .map_err(|e| SchedulerError::MalformedBatch(e.to_string()))?;
        entries
            .into_iter()
            .map(|(key, value)| {
                let duration = duration_ms(&key, &value)?;
                Ok(TaskRequest { key, duration })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }

    /// Validated requests, in submission order.
    #[must_use]
    pub fn requests(&self) -> &[TaskRequest] {
        &self.0
    }

    /// Number of requests.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the batch is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Build tasks in submission order.
    #[must_use]
    pub fn into_tasks(self) -> Vec<Task> {
        self.0.iter().map(TaskRequest::to_task).collect()
    }
}

fn duration_ms(key: &str, value: &Value) -> Result<Duration, SchedulerError> {
    let invalid = |reason: &str| SchedulerError::InvalidDuration {
        key: key.to_owned(),
        reason: reason.to_owned(),
    };
    let Value::Number(n) = value else {
        return Err(invalid("must be a number"));
    };
    let ms = n.as_f64().ok_or_else(|| invalid("must be finite"))?;
    millis::from_f64(ms).map_err(invalid)
}

/// Body as `(key, raw duration)` pairs in document order.
struct RawBatch(Vec<(String, Value)>);

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawEntry {
    key: String,
    duration: Value,
}

impl<'de> Deserialize<'de> for RawBatch {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(RawBatchVisitor)
    }
}

struct RawBatchVisitor;

impl<'de> Visitor<'de> for RawBatchVisitor {
    type Value = RawBatch;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an object of key to duration or an array of {key, duration}")
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
        while let Some((key, value)) = map.next_entry::<String, Value>()? {
            entries.push((key, value));
        }
        Ok(RawBatch(entries))
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut entries = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(RawEntry { key, duration }) = seq.next_element()? {
            entries.push((key, duration));
        }
        Ok(RawBatch(entries))
    }
}
