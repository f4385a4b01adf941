//! Keyed admission and dispatch.
//!
//! [`SchedulerState`] is the synchronous state machine: it decides whether a
//! task starts now or waits, and which pending task takes a freed slot.
//! [`Scheduler`] wraps it behind a single mutex, runs admitted tasks on a
//! [`Spawn`] runtime, and feeds completions back through a dispatcher task so
//! that removal and promotion happen as one atomic step.

use std::num::NonZeroUsize;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use super::audit::{build_audit_event, AuditAction, AuditSink};
use super::{Task, TaskExecutor, TaskId, TaskKey, TaskView};
use crate::infra::queue::PendingQueue;
use crate::runtime::Spawn;

/// Why a task was parked instead of started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueReason {
    /// Every running slot was taken.
    AtCapacity,
    /// A task with the same key was already running.
    KeyRunning,
}

/// Result of evaluating a task for admission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// Added to running; the caller must start it.
    Started(Task),
    /// Appended to the tail of pending.
    Queued {
        /// Instance id of the parked task.
        task_id: TaskId,
        /// Rule that blocked admission.
        reason: QueueReason,
    },
}

impl Admission {
    /// Id of the evaluated task.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        match self {
            Self::Started(task) => task.id(),
            Self::Queued { task_id, .. } => *task_id,
        }
    }

    /// Caller-facing summary.
    #[must_use]
    pub const fn outcome(&self) -> SubmitOutcome {
        match self {
            Self::Started(_) => SubmitOutcome::Started,
            Self::Queued { reason, .. } => SubmitOutcome::Queued(*reason),
        }
    }
}

/// Where a submitted task ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitOutcome {
    /// Running now.
    Started,
    /// Waiting in pending.
    Queued(QueueReason),
}

/// Acknowledgement returned for each submitted task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitReceipt {
    /// Assigned instance id.
    pub task_id: TaskId,
    /// Task key.
    pub key: TaskKey,
    /// Admission decision.
    pub outcome: SubmitOutcome,
}

/// Result of processing a completion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Completion {
    /// The task that left running, if the id was known.
    pub finished: Option<Task>,
    /// The pending task promoted into the freed slot; the caller must start it.
    pub promoted: Option<Task>,
}

/// Copy of both collections, safe to hand out and serialize.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    /// Pending tasks, oldest first.
    pub pending: Vec<TaskView>,
    /// Running tasks, in admission order.
    pub running: Vec<TaskView>,
}

/// The admission state machine. Pure and synchronous; callers serialize
/// access to it.
#[derive(Debug, Clone)]
pub struct SchedulerState {
    max_concurrency: NonZeroUsize,
    pending: PendingQueue,
    running: Vec<Task>,
    next_id: TaskId,
}

impl SchedulerState {
    /// Create an empty state with a fixed concurrency bound.
    #[must_use]
    pub fn new(max_concurrency: NonZeroUsize) -> Self {
        Self {
            max_concurrency,
            pending: PendingQueue::new(),
            running: Vec::with_capacity(max_concurrency.get().min(1024)),
            next_id: 1,
        }
    }

    /// Assign an instance id and evaluate the task for admission.
    pub fn submit(&mut self, task: Task) -> Admission {
        let id = self.next_id;
        self.next_id += 1;
        self.admit(task.with_id(id))
    }

    /// Remove a finished task from running and promote at most one pending
    /// task into the freed slot.
    pub fn complete(&mut self, id: TaskId) -> Completion {
        let index = self.running.iter().position(|t| t.id() == id);
        debug_assert!(index.is_some(), "completion for unknown task {id}");
        let Some(index) = index else {
            tracing::error!(task_id = id, "completion for a task that is not running");
            return Completion::default();
        };
        let finished = self.running.remove(index);
        let promoted = self.promote();
        Completion {
            finished: Some(finished),
            promoted,
        }
    }

    /// Move the first pending task whose key is not running back through
    /// admission. Returns it if it started.
    pub fn promote(&mut self) -> Option<Task> {
        let running = &self.running;
        let Some(candidate) = self
            .pending
            .take_first_eligible(|task| !running.iter().any(|r| r.key() == task.key()))
        else {
            if self.pending.is_empty() {
                tracing::debug!("no pending tasks");
            } else {
                tracing::debug!(pending = self.pending.len(), "no viable pending task");
            }
            return None;
        };
        match self.admit(candidate) {
            Admission::Started(task) => Some(task),
            Admission::Queued { .. } => None,
        }
    }

    fn admit(&mut self, task: Task) -> Admission {
        let reason = if self.running.len() >= self.max_concurrency.get() {
            Some(QueueReason::AtCapacity)
        } else if self.running.iter().any(|r| r.key() == task.key()) {
            Some(QueueReason::KeyRunning)
        } else {
            None
        };

        let admission = if let Some(reason) = reason {
            tracing::info!(task_id = task.id(), key = %task.key(), ?reason, "task queued");
            let task_id = task.id();
            self.pending.push_back(task);
            Admission::Queued { task_id, reason }
        } else {
            self.running.push(task.clone());
            Admission::Started(task)
        };
        self.debug_check();
        admission
    }

    /// Copy both collections.
    #[must_use]
    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            pending: self.pending.iter().map(TaskView::from).collect(),
            running: self.running.iter().map(TaskView::from).collect(),
        }
    }

    /// Concurrency bound.
    #[must_use]
    pub const fn max_concurrency(&self) -> NonZeroUsize {
        self.max_concurrency
    }

    /// Number of pending tasks.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Number of running tasks.
    #[must_use]
    pub fn running_len(&self) -> usize {
        self.running.len()
    }

    /// Pending tasks, oldest first.
    pub fn pending(&self) -> impl Iterator<Item = &Task> {
        self.pending.iter()
    }

    /// Running tasks, in admission order.
    pub fn running(&self) -> impl Iterator<Item = &Task> {
        self.running.iter()
    }

    fn debug_check(&self) {
        debug_assert!(self.running.len() <= self.max_concurrency.get());
        debug_assert!(self
            .running
            .iter()
            .enumerate()
            .all(|(i, a)| self.running[i + 1..].iter().all(|b| a.key() != b.key())));
        debug_assert!(self
            .pending
            .iter()
            .all(|p| self.running.iter().all(|r| r.id() != p.id())));
    }
}

/// Message delivered to the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SchedulerEvent {
    Completed(TaskId),
}

struct Shared<E, S> {
    state: Mutex<SchedulerState>,
    audit: Option<Mutex<Box<dyn AuditSink>>>,
    events: mpsc::UnboundedSender<SchedulerEvent>,
    executor: E,
    spawner: S,
}

/// Shared scheduler handle.
///
/// Cloning is cheap and every clone drives the same state. Submissions,
/// completions and snapshots all take one lock, so no observer ever sees a
/// task in both collections.
pub struct Scheduler<E, S> {
    shared: Arc<Shared<E, S>>,
}

impl<E, S> Clone for Scheduler<E, S> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<E, S> Scheduler<E, S>
where
    E: TaskExecutor,
    S: Spawn + Clone + Send + Sync + 'static,
{
    /// Create a scheduler and start its dispatcher on `spawner`.
    pub fn new(max_concurrency: NonZeroUsize, executor: E, spawner: S) -> Self {
        Self::build(max_concurrency, executor, spawner, None)
    }

    /// Like [`Scheduler::new`], recording every decision to `audit`.
    pub fn with_audit(
        max_concurrency: NonZeroUsize,
        executor: E,
        spawner: S,
        audit: Box<dyn AuditSink>,
    ) -> Self {
        Self::build(max_concurrency, executor, spawner, Some(audit))
    }

    fn build(
        max_concurrency: NonZeroUsize,
        executor: E,
        spawner: S,
        audit: Option<Box<dyn AuditSink>>,
    ) -> Self {
        let (events, rx) = mpsc::unbounded_channel();
        let shared = Arc::new(Shared {
            state: Mutex::new(SchedulerState::new(max_concurrency)),
            audit: audit.map(Mutex::new),
            events,
            executor,
            spawner,
        });
        shared
            .spawner
            .spawn(run_dispatcher(Arc::downgrade(&shared), rx));
        tracing::info!(max_concurrency = max_concurrency.get(), "scheduler ready");
        Self { shared }
    }

    /// Submit one task. Starts it now or parks it in pending; never blocks.
    pub fn submit(&self, key: impl Into<TaskKey>, duration: Duration) -> SubmitReceipt {
        self.submit_task(Task::new(key, duration))
    }

    /// Submit an already constructed task.
    pub fn submit_task(&self, task: Task) -> SubmitReceipt {
        let (receipt, started) = self.shared.admit(&mut self.shared.state.lock(), task);
        if let Some(task) = started {
            self.shared.dispatch(&task);
        }
        receipt
    }

    /// Submit tasks in order. Earlier tasks get first claim on slots.
    pub fn append_batch(&self, tasks: Vec<Task>) -> Vec<SubmitReceipt> {
        tracing::info!(count = tasks.len(), "appending tasks");
        let mut receipts = Vec::with_capacity(tasks.len());
        let mut to_start = Vec::new();
        {
            let mut state = self.shared.state.lock();
            for task in tasks {
                let (receipt, started) = self.shared.admit(&mut state, task);
                receipts.push(receipt);
                to_start.extend(started);
            }
        }
        for task in &to_start {
            self.shared.dispatch(task);
        }
        receipts
    }

    /// Copy of pending and running, taken under the scheduler lock.
    #[must_use]
    pub fn status(&self) -> StatusSnapshot {
        self.shared.state.lock().snapshot()
    }

    /// Concurrency bound.
    #[must_use]
    pub fn max_concurrency(&self) -> NonZeroUsize {
        self.shared.state.lock().max_concurrency()
    }
}

impl<E, S> Shared<E, S>
where
    E: TaskExecutor,
    S: Spawn + Clone + Send + Sync + 'static,
{
    /// Admit one task under the caller's lock. A started task is returned
    /// so the caller can dispatch it after releasing the lock.
    fn admit(&self, state: &mut SchedulerState, task: Task) -> (SubmitReceipt, Option<Task>) {
        let key = task.key().clone();
        let admission = state.submit(task);
        let task_id = admission.task_id();
        let outcome = admission.outcome();
        let started = match admission {
            Admission::Started(task) => {
                self.record(task_id, &key, AuditAction::Started);
                Some(task)
            }
            Admission::Queued { .. } => {
                self.record(task_id, &key, AuditAction::Queued);
                None
            }
        };
        (SubmitReceipt { task_id, key, outcome }, started)
    }

    fn dispatch(&self, task: &Task) {
        let events = self.events.clone();
        let id = task.id();
        task.run(&self.executor, &self.spawner, move || {
            if events.send(SchedulerEvent::Completed(id)).is_err() {
                tracing::warn!(task_id = id, "dispatcher stopped; completion dropped");
            }
        });
    }

    fn handle(&self, event: SchedulerEvent) {
        match event {
            SchedulerEvent::Completed(id) => {
                let promoted = {
                    let mut state = self.state.lock();
                    let completion = state.complete(id);
                    if let Some(task) = &completion.finished {
                        self.record(task.id(), task.key(), AuditAction::Completed);
                    }
                    if let Some(task) = &completion.promoted {
                        self.record(task.id(), task.key(), AuditAction::Promoted);
                    }
                    completion.promoted
                };
                if let Some(task) = promoted {
                    tracing::info!(task_id = task.id(), key = %task.key(), "promoted pending task");
                    self.dispatch(&task);
                }
            }
        }
    }
}

impl<E, S> Shared<E, S> {
    fn record(&self, task_id: TaskId, key: &TaskKey, action: AuditAction) {
        if let Some(audit) = &self.audit {
            audit.lock().record(build_audit_event(task_id, key, action));
        }
    }
}

/// Apply completion events one at a time until every scheduler handle and
/// in-flight task is gone.
async fn run_dispatcher<E, S>(
    shared: Weak<Shared<E, S>>,
    mut rx: mpsc::UnboundedReceiver<SchedulerEvent>,
) where
    E: TaskExecutor,
    S: Spawn + Clone + Send + Sync + 'static,
{
    while let Some(event) = rx.recv().await {
        let Some(shared) = shared.upgrade() else {
            break;
        };
        shared.handle(event);
    }
    tracing::debug!("scheduler dispatcher stopped");
}
