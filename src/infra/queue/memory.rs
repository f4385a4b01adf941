//! In-memory pending queue with first-eligible removal.

use std::collections::VecDeque;

use crate::core::Task;

/// Ordered queue of tasks waiting for admission.
///
/// Arrival order is kept. Removal is "first eligible by position": the
/// oldest task matching a predicate leaves, the rest keep their order.
#[derive(Debug, Default, Clone)]
pub struct PendingQueue {
    tasks: VecDeque<Task>,
}

impl PendingQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a task at the tail.
    pub fn push_back(&mut self, task: Task) {
        self.tasks.push_back(task);
    }

    /// Remove and return the first task for which `eligible` holds.
    pub fn take_first_eligible<F>(&mut self, mut eligible: F) -> Option<Task>
    where
        F: FnMut(&Task) -> bool,
    {
        let index = self.tasks.iter().position(|task| eligible(task))?;
        self.tasks.remove(index)
    }

    /// Iterate oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter()
    }

    /// Number of queued tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether the queue is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
