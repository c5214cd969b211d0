//! Server-owned batch job projection.
//!
//! A batch is a unit of sprite-generation work tracked by the server.
//! The client only ever holds the read-only snapshot returned by the
//! status endpoint; all transitions happen server-side.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Number of animation frames produced per batch.
pub const FRAMES_PER_BATCH: usize = 8;

/// Server-side lifecycle of a batch.
///
/// `created -> running` happens via an explicit run call; `running ->
/// completed` is computed by the server from elapsed work. There are no
/// backward transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus {
    Created,
    Running,
    Completed,
}

impl BatchStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, BatchStatus::Completed)
    }
}

/// Output payload attached once the batch completes. Stable across
/// repeated status queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResult {
    /// Path of the assembled sprite sheet.
    pub sheet: String,
    /// Ordered frame paths, `frame_0001.png` through `frame_0008.png`.
    pub frames: Vec<String>,
}

/// Snapshot of a batch as reported by `GET /api/batch/status/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Batch {
    pub id: String,
    pub status: BatchStatus,
    /// Percentage `0..=100`; monotonically non-decreasing, saturating.
    pub progress: u8,
    pub character: String,
    pub preset: String,
    pub result: Option<BatchResult>,
    pub updated: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_completed_is_terminal() {
        assert!(!BatchStatus::Created.is_terminal());
        assert!(!BatchStatus::Running.is_terminal());
        assert!(BatchStatus::Completed.is_terminal());
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&BatchStatus::Completed).unwrap(),
            "\"completed\""
        );
    }

    #[test]
    fn batch_snapshot_round_trips() {
        let json = serde_json::json!({
            "id": "batch_00042",
            "status": "running",
            "progress": 37,
            "character": "goblin",
            "preset": "goblin_sneak",
            "result": null,
            "updated": "2026-01-28T23:00:00Z",
        });
        let batch: Batch = serde_json::from_value(json).unwrap();
        assert_eq!(batch.status, BatchStatus::Running);
        assert_eq!(batch.progress, 37);
        assert!(batch.result.is_none());
    }
}
