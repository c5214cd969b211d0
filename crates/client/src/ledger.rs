//! In-memory ledger of client-visible async operations.
//!
//! Every UI-triggered action registers a [`Task`] here on dispatch and
//! drives it to a terminal status. Entries accumulate for the lifetime
//! of the session as a history; nothing is ever deleted. The ledger has
//! no side effects of its own -- notifications are the caller's job.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use spriteforge_core::task::{Task, TaskId, TaskPatch};

/// Append/merge-only task store, safe for interleaved async writers.
#[derive(Default)]
pub struct TaskLedger {
    tasks: Mutex<Vec<Task>>,
    next_id: AtomicU64,
}

impl TaskLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new running task and return its id.
    ///
    /// Ids come from a monotonic counter, so rapid calls within the same
    /// instant still get distinct ids.
    pub fn add(&self, label: impl Into<String>) -> TaskId {
        let id = TaskId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let task = Task::new(id, label);
        self.tasks
            .lock()
            .expect("task ledger lock poisoned")
            .push(task);
        id
    }

    /// Merge a partial update into the matching task.
    ///
    /// Silently does nothing for an unknown id -- callers must tolerate
    /// a task having been pruned.
    pub fn update(&self, id: TaskId, patch: TaskPatch) {
        let mut tasks = self.tasks.lock().expect("task ledger lock poisoned");
        if let Some(task) = tasks.iter_mut().find(|t| t.id == id) {
            task.apply(patch);
        }
    }

    /// Mark a task done with full progress.
    pub fn complete(&self, id: TaskId) {
        self.update(id, TaskPatch::completed());
    }

    /// Mark a task failed with an error message.
    pub fn fail(&self, id: TaskId, error: impl Into<String>) {
        self.update(id, TaskPatch::failed(error));
    }

    /// Snapshot of a single task.
    pub fn get(&self, id: TaskId) -> Option<Task> {
        self.tasks
            .lock()
            .expect("task ledger lock poisoned")
            .iter()
            .find(|t| t.id == id)
            .cloned()
    }

    /// Snapshot of all tasks in creation order.
    pub fn snapshot(&self) -> Vec<Task> {
        self.tasks
            .lock()
            .expect("task ledger lock poisoned")
            .clone()
    }
}
