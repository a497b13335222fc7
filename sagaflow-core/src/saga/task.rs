//! Task identity and handles.
//!
//! Every driver run (root, watcher-spawned or nested opaque invocation) gets
//! a `TaskId`. Root and spawned tasks also get a [`TaskHandle`] through which
//! the caller can observe how the run ended.

use std::cell::OnceCell;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::Value;

use super::watch::WatchId;
use crate::effect::Settled;
use crate::error::SagaError;

/// Unique identifier for a driven computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

impl TaskId {
    /// Generate a new unique task ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task#{}", self.0)
    }
}

/// Why a task was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOrigin {
    /// Started through [`Scheduler::run`](super::Scheduler::run).
    Root,
    /// Spawned by a watch registration for a matching event.
    Watch(WatchId),
}

/// Observes the outcome of a root or spawned task.
///
/// The outcome is filled in exactly once, when the task's driver finishes.
#[derive(Debug, Clone)]
pub struct TaskHandle {
    id: TaskId,
    origin: TaskOrigin,
    outcome: Rc<OnceCell<Settled>>,
}

impl TaskHandle {
    pub(crate) fn new(id: TaskId, origin: TaskOrigin) -> Self {
        Self {
            id,
            origin,
            outcome: Rc::new(OnceCell::new()),
        }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn origin(&self) -> TaskOrigin {
        self.origin
    }

    pub fn is_finished(&self) -> bool {
        self.outcome.get().is_some()
    }

    /// How the task ended, or `None` while it is still live.
    pub fn outcome(&self) -> Option<&Settled> {
        self.outcome.get()
    }

    /// The task's return value, if it finished successfully.
    pub fn value(&self) -> Option<&Value> {
        self.outcome().and_then(|settled| settled.as_ref().ok())
    }

    /// The error that ended the task, if it failed.
    pub fn error(&self) -> Option<&SagaError> {
        self.outcome().and_then(|settled| settled.as_ref().err())
    }

    pub(crate) fn complete(&self, settled: Settled) {
        let _ = self.outcome.set(settled);
    }
}

/// An unrecovered error that ended a root or spawned task.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskFailure {
    pub task: TaskId,
    pub origin: TaskOrigin,
    pub error: SagaError,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_ids_are_unique() {
        let id1 = TaskId::new();
        let id2 = TaskId::new();
        let id3 = TaskId::new();

        assert_ne!(id1, id2);
        assert_ne!(id2, id3);
        assert_ne!(id1, id3);
        assert!(id1 < id2);
    }

    #[test]
    fn handle_completes_once() {
        let handle = TaskHandle::new(TaskId::new(), TaskOrigin::Root);
        assert!(!handle.is_finished());

        handle.complete(Ok(Value::from(1)));
        handle.complete(Err(SagaError::raised("late")));

        assert_eq!(handle.value(), Some(&Value::from(1)));
        assert!(handle.error().is_none());
        assert!(handle.clone().is_finished());
    }
}
