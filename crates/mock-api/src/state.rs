//! In-memory mock state: batch table, project registry, pipeline runs.
//!
//! Everything here is owned by the server; clients only ever see the
//! snapshots produced by the status endpoints. State is ephemeral and
//! resets whenever the mock restarts.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use tokio::time::Instant;

use spriteforge_core::batch::{Batch, BatchResult, BatchStatus};
use spriteforge_core::error::CoreError;
use spriteforge_core::stage::{initial_stage_map, MeshType, StageMap, STAGE_ORDER};

use crate::simulator::{self, MockTiming};

/// Shared handler state. Cheap to clone into axum routes.
#[derive(Clone)]
pub struct AppState {
    pub mock: Arc<MockState>,
}

impl AppState {
    pub fn new(mock: MockState) -> Self {
        Self {
            mock: Arc::new(mock),
        }
    }
}

/// Server-side record of one batch job.
struct BatchRecord {
    id: String,
    character: String,
    preset: String,
    status: BatchStatus,
    /// Highest progress ever reported; never allowed to move backwards.
    progress: u8,
    /// Baseline for progress computation. (Re)set by the run call, not
    /// the create call.
    started_at: Option<Instant>,
    /// Attached once on completion, stable forever after.
    result: Option<BatchResult>,
    updated: DateTime<Utc>,
}

impl BatchRecord {
    fn snapshot(&self) -> Batch {
        Batch {
            id: self.id.clone(),
            status: self.status,
            progress: self.progress,
            character: self.character.clone(),
            preset: self.preset.clone(),
            result: self.result.clone(),
            updated: self.updated,
        }
    }
}

/// One registered project and its (at most one) pipeline run.
struct ProjectRecord {
    name: String,
    mesh: MeshType,
    run: Option<RunRecord>,
}

struct RunRecord {
    job_id: String,
    started_at: Instant,
}

/// The whole mock world behind one lock. Handlers never hold it across
/// an await point.
pub struct MockState {
    timing: MockTiming,
    batches: Mutex<HashMap<String, BatchRecord>>,
    projects: Mutex<HashMap<String, ProjectRecord>>,
}

impl MockState {
    /// Create the mock world with the standard project fixtures.
    pub fn new(timing: MockTiming) -> Self {
        let state = Self {
            timing,
            batches: Mutex::new(HashMap::new()),
            projects: Mutex::new(HashMap::new()),
        };
        state.register_project("wizard_dance_loop", MeshType::Skeletal);
        state.register_project("goblin_sneak_cycle", MeshType::Skeletal);
        // Static mesh: rigging, animation, and sprites are not required.
        state.register_project("dragon_hatch_idle", MeshType::Static);
        state
    }

    /// Add a project to the registry.
    pub fn register_project(&self, name: &str, mesh: MeshType) {
        self.projects.lock().expect("mock state lock poisoned").insert(
            name.to_string(),
            ProjectRecord {
                name: name.to_string(),
                mesh,
                run: None,
            },
        );
    }

    // ---- batches ----

    /// Allocate a new batch in `created` state and return its id.
    pub fn create_batch(&self, character: &str, preset: &str) -> String {
        let mut batches = self.batches.lock().expect("mock state lock poisoned");

        // Random ids can collide across a long session; re-roll until free.
        let mut id = simulator::make_batch_id();
        while batches.contains_key(&id) {
            id = simulator::make_batch_id();
        }

        batches.insert(
            id.clone(),
            BatchRecord {
                id: id.clone(),
                character: character.to_string(),
                preset: preset.to_string(),
                status: BatchStatus::Created,
                progress: 0,
                started_at: None,
                result: None,
                updated: Utc::now(),
            },
        );

        tracing::info!(batch_id = %id, character, preset, "Batch created");
        id
    }

    /// Transition a batch to `running` and reset its progress baseline
    /// to now.
    pub fn run_batch(&self, id: &str) -> Result<(), CoreError> {
        let mut batches = self.batches.lock().expect("mock state lock poisoned");
        let batch = batches.get_mut(id).ok_or(CoreError::NotFound {
            entity: "Batch",
            id: id.to_string(),
        })?;

        batch.status = BatchStatus::Running;
        batch.started_at = Some(Instant::now());
        batch.updated = Utc::now();

        tracing::info!(batch_id = %id, "Batch running");
        Ok(())
    }

    /// Current status snapshot, advancing simulated progress first.
    pub fn batch_status(&self, id: &str) -> Result<Batch, CoreError> {
        let mut batches = self.batches.lock().expect("mock state lock poisoned");
        let batch = batches.get_mut(id).ok_or(CoreError::NotFound {
            entity: "Batch",
            id: id.to_string(),
        })?;

        if batch.status == BatchStatus::Running {
            if let Some(started_at) = batch.started_at {
                let pct = simulator::batch_progress(started_at.elapsed(), self.timing.per_percent);
                batch.progress = batch.progress.max(pct);
                batch.updated = Utc::now();

                if batch.progress >= 100 {
                    batch.status = BatchStatus::Completed;
                    // Computed exactly once; later queries reuse it.
                    batch.result =
                        Some(simulator::batch_result(&batch.character, &batch.preset));
                    tracing::info!(batch_id = %id, "Batch completed");
                }
            }
        }

        Ok(batch.snapshot())
    }

    // ---- pipeline runs ----

    /// Start (or restart) the pipeline run for a project.
    ///
    /// The server does not reject overlapping runs; preventing a double
    /// submit is the client's responsibility.
    pub fn run_pipeline(&self, project: &str) -> Result<String, CoreError> {
        let mut projects = self.projects.lock().expect("mock state lock poisoned");
        let record = projects.get_mut(project).ok_or(CoreError::NotFound {
            entity: "Project",
            id: project.to_string(),
        })?;

        let job_id = uuid::Uuid::new_v4().to_string();
        record.run = Some(RunRecord {
            job_id: job_id.clone(),
            started_at: Instant::now(),
        });

        tracing::info!(project, job_id = %job_id, "Pipeline run started");
        Ok(job_id)
    }

    /// Stage map for a project, with simulated completion applied.
    pub fn pipeline_stages(&self, project: &str) -> Result<StageMap, CoreError> {
        let projects = self.projects.lock().expect("mock state lock poisoned");
        let record = projects.get(project).ok_or(CoreError::NotFound {
            entity: "Project",
            id: project.to_string(),
        })?;

        let mut stages = initial_stage_map(record.mesh);

        if let Some(run) = &record.run {
            let required: Vec<&str> = STAGE_ORDER
                .iter()
                .copied()
                .filter(|&name| record.mesh.requires(name))
                .collect();
            let done = simulator::stages_completed(
                run.started_at.elapsed(),
                self.timing.stage_duration,
                required.len(),
            );
            for &name in required.iter().take(done) {
                stages[name].completed = true;
            }
        }

        Ok(stages)
    }

    /// Tail of the simulated pipeline log.
    ///
    /// Derived deterministically from elapsed run time, so repeated
    /// queries at the same instant return the same text.
    pub fn pipeline_log(&self, project: &str, max_lines: usize) -> Result<String, CoreError> {
        let stages = self.pipeline_stages(project)?;

        let projects = self.projects.lock().expect("mock state lock poisoned");
        // pipeline_stages already proved the project exists.
        let record = &projects[project];

        let mut lines = Vec::new();

        if let Some(run) = &record.run {
            let mesh = match record.mesh {
                MeshType::Skeletal => "skeletal",
                MeshType::Static => "static",
            };
            lines.push(format!(
                "Starting pipeline for {} ({} mesh, job {})",
                record.name, mesh, run.job_id
            ));

            for stage in stages.values() {
                if !stage.required {
                    lines.push(format!(
                        "Skipping {} (not required for {} mesh)",
                        stage.name, mesh
                    ));
                } else if stage.completed {
                    lines.push(format!("{} completed successfully", stage.name));
                } else {
                    lines.push(format!("{} in progress...", stage.name));
                    break;
                }
            }

            if spriteforge_core::stage::is_complete(&stages) {
                lines.push("Pipeline completed successfully!".to_string());
            }
        }

        let skip = lines.len().saturating_sub(max_lines);
        Ok(lines[skip..].join("\n"))
    }
}

impl Default for MockState {
    fn default() -> Self {
        Self::new(MockTiming::default())
    }
}
