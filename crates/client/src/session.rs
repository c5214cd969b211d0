//! Session context owning all orchestration state.
//!
//! The original control panel kept the current project, cached results,
//! and timer handles in module-level variables, which made lifecycle
//! invisible and timers easy to orphan across navigation. A [`Session`]
//! makes that state explicit: it owns the job client, task ledger,
//! notifier, and every poller handle, so start/stop is a method call and
//! teardown is [`Session::shutdown`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use spriteforge_core::batch::{Batch, BatchResult};
use spriteforge_core::stage::{is_complete, StageMap};
use spriteforge_core::task::{TaskId, TaskPatch};

use crate::api::{JobClient, JobClientError};
use crate::ledger::TaskLedger;
use crate::notify::Notifier;
use crate::poller::{PollTarget, Poller, PollerHandle, DEFAULT_POLL_INTERVAL};

/// How many log lines to fetch once a pipeline run finishes.
const LOG_TAIL_LINES: usize = 200;

/// Errors surfaced to the UI layer by session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// A pipeline run is already outstanding. The server does not
    /// guarantee idempotency, so the session refuses to double-submit.
    #[error("a pipeline run is already in progress")]
    PipelineBusy,

    #[error(transparent)]
    Client(#[from] JobClientError),
}

/// Shared handle to one user session. Cheap to clone.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    client: JobClient,
    ledger: TaskLedger,
    notifier: Notifier,
    poll_interval: Duration,
    batch_poller: Mutex<Option<PollerHandle>>,
    pipeline_poller: Mutex<Option<PollerHandle>>,
    /// Double-submit guard for pipeline runs. Set before the run call
    /// is issued, cleared when the run reaches a terminal state.
    pipeline_running: AtomicBool,
    latest_batch: RwLock<Option<BatchResult>>,
    pipeline_log: RwLock<Option<String>>,
}

impl Session {
    /// Create a session against the server at `base_url`, polling at
    /// the standard 3-second interval.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_poll_interval(base_url, DEFAULT_POLL_INTERVAL)
    }

    /// Create a session with a custom polling interval (tests use a
    /// short one).
    pub fn with_poll_interval(base_url: impl Into<String>, poll_interval: Duration) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                client: JobClient::new(base_url),
                ledger: TaskLedger::new(),
                notifier: Notifier::new(),
                poll_interval,
                batch_poller: Mutex::new(None),
                pipeline_poller: Mutex::new(None),
                pipeline_running: AtomicBool::new(false),
                latest_batch: RwLock::new(None),
                pipeline_log: RwLock::new(None),
            }),
        }
    }

    /// Task ledger of this session.
    pub fn ledger(&self) -> &TaskLedger {
        &self.inner.ledger
    }

    /// Notification queue of this session.
    pub fn notifier(&self) -> &Notifier {
        &self.inner.notifier
    }

    /// Result of the most recently completed batch, if any.
    pub fn latest_batch_result(&self) -> Option<BatchResult> {
        self.inner
            .latest_batch
            .read()
            .expect("session lock poisoned")
            .clone()
    }

    /// Log text fetched after the last pipeline run completed.
    pub fn pipeline_log(&self) -> Option<String> {
        self.inner
            .pipeline_log
            .read()
            .expect("session lock poisoned")
            .clone()
    }

    /// Whether a pipeline run is currently outstanding.
    pub fn pipeline_run_active(&self) -> bool {
        self.inner.pipeline_running.load(Ordering::SeqCst)
    }

    /// Kick off a sprite batch: create, run, then monitor to completion.
    ///
    /// The returned task id tracks the whole flow in the ledger. Create
    /// and run failures are terminal: the task is failed, one error
    /// notification is pushed, and the error propagates.
    pub async fn generate_batch(
        &self,
        character: &str,
        motion: &str,
    ) -> Result<TaskId, SessionError> {
        let task_id = self
            .inner
            .ledger
            .add(format!("Generate {character} batch ({motion})"));

        let ack = match self.inner.client.create_batch(character, motion).await {
            Ok(ack) => ack,
            Err(error) => return Err(self.fail_one_shot(task_id, error)),
        };

        if let Err(error) = self.inner.client.run_batch(&ack.batch_id).await {
            return Err(self.fail_one_shot(task_id, error));
        }

        tracing::info!(batch_id = %ack.batch_id, character, motion, "Batch started");

        let watch = BatchWatch {
            session: Arc::clone(&self.inner),
            batch_id: ack.batch_id,
            task_id,
        };
        let handle = Poller::start(watch, self.inner.poll_interval);
        replace_poller(&self.inner.batch_poller, handle);

        Ok(task_id)
    }

    /// Start a multi-stage pipeline run for a project and monitor its
    /// stages until every required one completes.
    ///
    /// Rejects with [`SessionError::PipelineBusy`] while a previous run
    /// is still outstanding -- the server may start overlapping runs if
    /// asked twice, so the client must not ask twice.
    pub async fn run_pipeline(&self, project: &str) -> Result<TaskId, SessionError> {
        if self.inner.pipeline_running.swap(true, Ordering::SeqCst) {
            self.inner
                .notifier
                .warn("A pipeline run is already in progress");
            return Err(SessionError::PipelineBusy);
        }

        let task_id = self.inner.ledger.add(format!("Run pipeline: {project}"));

        let ack = match self.inner.client.run_pipeline(project).await {
            Ok(ack) => ack,
            Err(error) => {
                self.inner.pipeline_running.store(false, Ordering::SeqCst);
                return Err(self.fail_one_shot(task_id, error));
            }
        };

        tracing::info!(project, job_id = %ack.job_id, "Pipeline run started");

        let watch = PipelineWatch {
            session: Arc::clone(&self.inner),
            project: project.to_string(),
            task_id,
        };
        let handle = Poller::start(watch, self.inner.poll_interval);
        replace_poller(&self.inner.pipeline_poller, handle);

        Ok(task_id)
    }

    /// Stop all monitoring. Idempotent; wire component teardown here so
    /// no timer outlives the session's UI surface.
    pub fn shutdown(&self) {
        if let Some(handle) = self
            .inner
            .batch_poller
            .lock()
            .expect("session lock poisoned")
            .take()
        {
            handle.stop();
        }
        if let Some(handle) = self
            .inner
            .pipeline_poller
            .lock()
            .expect("session lock poisoned")
            .take()
        {
            handle.stop();
        }
    }

    /// Fail a one-shot action: mark the task, push exactly one error
    /// notification, and hand the error back to the caller.
    fn fail_one_shot(&self, task_id: TaskId, error: JobClientError) -> SessionError {
        self.inner.ledger.fail(task_id, error.to_string());
        self.inner.notifier.error(error.to_string());
        SessionError::Client(error)
    }
}

/// Install a new poller handle, cancelling any previous one first so a
/// UI surface never has two concurrent monitors.
fn replace_poller(slot: &Mutex<Option<PollerHandle>>, handle: PollerHandle) {
    let mut guard = slot.lock().expect("session lock poisoned");
    if let Some(previous) = guard.take() {
        previous.stop();
    }
    *guard = Some(handle);
}

// ---------------------------------------------------------------------------
// Poll targets
// ---------------------------------------------------------------------------

/// Monitors one batch until the server reports it completed.
struct BatchWatch {
    session: Arc<SessionInner>,
    batch_id: String,
    task_id: TaskId,
}

#[async_trait::async_trait]
impl PollTarget for BatchWatch {
    type Snapshot = Batch;

    async fn fetch(&self) -> Result<Batch, JobClientError> {
        self.session.client.batch_status(&self.batch_id).await
    }

    fn is_terminal(&self, snapshot: &Batch) -> bool {
        snapshot.status.is_terminal()
    }

    fn on_snapshot(&self, snapshot: &Batch) {
        self.session
            .ledger
            .update(self.task_id, TaskPatch::progress(snapshot.progress));
    }

    async fn on_terminal(&self, snapshot: Batch) {
        if let Some(result) = snapshot.result {
            *self
                .session
                .latest_batch
                .write()
                .expect("session lock poisoned") = Some(result);
        }
        self.session.ledger.complete(self.task_id);
        self.session
            .notifier
            .success(format!("Batch {} completed", self.batch_id));
    }

    fn on_transient_error(&self, error: &JobClientError) {
        // Keep polling; the task stays running and the user sees one
        // warning per blip.
        self.session
            .notifier
            .warn(format!("Batch status check failed: {error}"));
    }

    async fn on_abort(&self, error: JobClientError) {
        self.session.ledger.fail(self.task_id, error.to_string());
        self.session.notifier.error(error.to_string());
    }
}

/// Monitors a pipeline run until every required stage is completed,
/// then fetches the log exactly once.
struct PipelineWatch {
    session: Arc<SessionInner>,
    project: String,
    task_id: TaskId,
}

#[async_trait::async_trait]
impl PollTarget for PipelineWatch {
    type Snapshot = StageMap;

    async fn fetch(&self) -> Result<StageMap, JobClientError> {
        self.session.client.pipeline_status(&self.project).await
    }

    fn is_terminal(&self, snapshot: &StageMap) -> bool {
        is_complete(snapshot)
    }

    async fn on_terminal(&self, _snapshot: StageMap) {
        match self
            .session
            .client
            .pipeline_log(&self.project, LOG_TAIL_LINES)
            .await
        {
            Ok(log) => {
                *self
                    .session
                    .pipeline_log
                    .write()
                    .expect("session lock poisoned") = Some(log);
            }
            Err(error) => {
                tracing::warn!(project = %self.project, error = %error, "Log fetch failed");
                self.session
                    .notifier
                    .warn(format!("Could not fetch pipeline log: {error}"));
            }
        }

        self.session.ledger.complete(self.task_id);
        self.session
            .notifier
            .success(format!("Pipeline for {} completed", self.project));
        self.session
            .pipeline_running
            .store(false, Ordering::SeqCst);
    }

    fn on_transient_error(&self, error: &JobClientError) {
        self.session
            .notifier
            .warn(format!("Pipeline status check failed: {error}"));
    }

    async fn on_abort(&self, error: JobClientError) {
        self.session.ledger.fail(self.task_id, error.to_string());
        self.session.notifier.error(error.to_string());
        self.session
            .pipeline_running
            .store(false, Ordering::SeqCst);
    }
}
