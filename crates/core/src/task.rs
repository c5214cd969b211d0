//! Client-local bookkeeping for async UI-triggered actions.
//!
//! A [`Task`] records one in-flight operation (label, status, progress,
//! timestamps) independently of any server-side batch or run state.
//! Tasks accumulate for the lifetime of a session and are never deleted.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Process-unique identifier for a [`Task`].
///
/// Allocated from a monotonic counter by the ledger, so two tasks created
/// within the same instant can never collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TaskId(pub u64);

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "task-{}", self.0)
    }
}

/// Lifecycle state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Running,
    Done,
    Error,
}

impl TaskStatus {
    /// Whether no further transition can occur from this status.
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Done | TaskStatus::Error)
    }
}

/// One async operation tracked in the task ledger.
#[derive(Debug, Clone, Serialize)]
pub struct Task {
    pub id: TaskId,
    pub label: String,
    pub status: TaskStatus,
    /// Completion percentage, `0..=100`. Non-decreasing while running.
    pub progress: u8,
    pub started: DateTime<Utc>,
    /// Set exactly when the task reaches a terminal status.
    pub finished: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl Task {
    /// Create a fresh running task.
    pub fn new(id: TaskId, label: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
            status: TaskStatus::Running,
            progress: 0,
            started: Utc::now(),
            finished: None,
            error: None,
        }
    }

    /// Merge a partial update into this task.
    ///
    /// Progress can only move forward while the task is running; a stale
    /// lower value is ignored rather than rejected.
    pub fn apply(&mut self, patch: TaskPatch) {
        if let Some(progress) = patch.progress {
            let progress = progress.min(100);
            if progress > self.progress {
                self.progress = progress;
            }
        }
        if let Some(status) = patch.status {
            self.status = status;
            if status.is_terminal() && self.finished.is_none() {
                self.finished = Some(Utc::now());
            }
        }
        if let Some(error) = patch.error {
            self.error = Some(error);
        }
    }
}

/// Partial update applied to a [`Task`] via [`Task::apply`].
#[derive(Debug, Default, Clone)]
pub struct TaskPatch {
    pub status: Option<TaskStatus>,
    pub progress: Option<u8>,
    pub error: Option<String>,
}

impl TaskPatch {
    /// Patch that only advances progress.
    pub fn progress(progress: u8) -> Self {
        Self {
            progress: Some(progress),
            ..Default::default()
        }
    }

    /// Patch that marks the task done with full progress.
    pub fn completed() -> Self {
        Self {
            status: Some(TaskStatus::Done),
            progress: Some(100),
            ..Default::default()
        }
    }

    /// Patch that marks the task failed with an error message.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            status: Some(TaskStatus::Error),
            error: Some(error.into()),
            ..Default::default()
        }
    }
}
