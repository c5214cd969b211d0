//! Generic poll-until-terminal loop.
//!
//! The original control panel grew a separate ad hoc interval callback
//! per feature (health check, batch polling, pipeline polling). This
//! module replaces all of them with one utility: a [`PollTarget`]
//! describes what to fetch and when the watched job is finished, and
//! [`Poller::start`] drives it on a fixed interval until the terminal
//! state is reached or the loop is cancelled.
//!
//! State machine: `Idle -> Polling -> Terminal`. The first fetch fires
//! immediately on start so the UI reflects current state without waiting
//! a full interval. Transient fetch failures (network blips, 5xx) are
//! reported and retried on the next tick; validation/not-found failures
//! abort the loop, since the watched id no longer makes sense.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::api::JobClientError;

/// Fixed polling period used for pipeline and batch monitoring.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(3000);

/// One pollable job: how to fetch a snapshot, how to recognize the
/// terminal state, and what to do along the way.
#[async_trait::async_trait]
pub trait PollTarget: Send + Sync + 'static {
    /// Status snapshot returned by one fetch.
    type Snapshot: Send + 'static;

    /// Fetch the current status from the server.
    async fn fetch(&self) -> Result<Self::Snapshot, JobClientError>;

    /// Whether this snapshot is a terminal state for the watched job.
    fn is_terminal(&self, snapshot: &Self::Snapshot) -> bool;

    /// Observe every snapshot (terminal included) before the terminal
    /// check. Used to push progress into the task ledger.
    fn on_snapshot(&self, _snapshot: &Self::Snapshot) {}

    /// Runs exactly once, on the transition to the terminal state.
    async fn on_terminal(&self, _snapshot: Self::Snapshot) {}

    /// A transient fetch failure; polling continues at the next tick.
    fn on_transient_error(&self, _error: &JobClientError) {}

    /// A non-transient failure; the loop stops after this call.
    async fn on_abort(&self, _error: JobClientError) {}
}

/// Handle to a running poll loop.
///
/// Owns the timer lifecycle explicitly: dropping the handle does NOT
/// stop the loop, callers must wire teardown to [`stop`](Self::stop).
pub struct PollerHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl PollerHandle {
    /// Cancel the poll loop. Safe to call at any time, any number of
    /// times; a second call is a no-op.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Whether the loop has exited (terminal state reached, aborted,
    /// or cancelled).
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the loop to exit. Used by tests and graceful shutdown.
    pub async fn join(self) {
        let _ = self.task.await;
    }
}

/// Entry point for starting poll loops.
pub struct Poller;

impl Poller {
    /// Spawn a poll loop for `target`, fetching immediately and then on
    /// every `interval` tick until terminal.
    pub fn start<T: PollTarget>(target: T, interval: Duration) -> PollerHandle {
        let cancel = CancellationToken::new();
        let loop_cancel = cancel.clone();

        let task = tokio::spawn(async move {
            run_loop(target, interval, loop_cancel).await;
        });

        PollerHandle { cancel, task }
    }
}

async fn run_loop<T: PollTarget>(target: T, interval: Duration, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval(interval);
    // Late ticks reschedule from now instead of bursting to catch up.
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!("poll loop cancelled");
                return;
            }
            _ = ticker.tick() => {}
        }

        let result = tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!("poll loop cancelled mid-fetch");
                return;
            }
            result = target.fetch() => result,
        };

        match result {
            Ok(snapshot) => {
                target.on_snapshot(&snapshot);
                if target.is_terminal(&snapshot) {
                    target.on_terminal(snapshot).await;
                    return;
                }
            }
            Err(error) if error.is_transient() => {
                tracing::warn!(error = %error, "status fetch failed, retrying next tick");
                target.on_transient_error(&error);
            }
            Err(error) => {
                tracing::error!(error = %error, "status fetch failed fatally, stopping poll");
                target.on_abort(error).await;
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use spriteforge_core::stage::{is_complete, Stage, StageMap};

    /// Test target that replays a scripted sequence of fetch results.
    /// A snapshot of 100 is considered terminal.
    #[derive(Default)]
    struct Scripted {
        responses: Mutex<VecDeque<Result<u8, JobClientError>>>,
        fetches: AtomicUsize,
        snapshots: AtomicUsize,
        terminals: AtomicUsize,
        transients: AtomicUsize,
        aborts: AtomicUsize,
    }

    impl Scripted {
        fn with(responses: Vec<Result<u8, JobClientError>>) -> std::sync::Arc<Self> {
            std::sync::Arc::new(Self {
                responses: Mutex::new(responses.into()),
                ..Default::default()
            })
        }
    }

    #[async_trait::async_trait]
    impl PollTarget for std::sync::Arc<Scripted> {
        type Snapshot = u8;

        async fn fetch(&self) -> Result<u8, JobClientError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .expect("scripted target ran out of responses")
        }

        fn is_terminal(&self, snapshot: &u8) -> bool {
            *snapshot >= 100
        }

        fn on_snapshot(&self, _snapshot: &u8) {
            self.snapshots.fetch_add(1, Ordering::SeqCst);
        }

        async fn on_terminal(&self, _snapshot: u8) {
            self.terminals.fetch_add(1, Ordering::SeqCst);
        }

        fn on_transient_error(&self, _error: &JobClientError) {
            self.transients.fetch_add(1, Ordering::SeqCst);
        }

        async fn on_abort(&self, _error: JobClientError) {
            self.aborts.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn server_error() -> JobClientError {
        JobClientError::Server {
            status: 500,
            message: "simulated fault".into(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn first_fetch_fires_immediately() {
        let target = Scripted::with(vec![Ok(100)]);
        let handle = Poller::start(std::sync::Arc::clone(&target), DEFAULT_POLL_INTERVAL);

        // Well under one interval.
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(target.fetches.load(Ordering::SeqCst), 1);
        assert_eq!(target.terminals.load(Ordering::SeqCst), 1);
        assert!(handle.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn polls_until_terminal_then_stops() {
        let target = Scripted::with(vec![Ok(20), Ok(60), Ok(100)]);
        let handle = Poller::start(std::sync::Arc::clone(&target), DEFAULT_POLL_INTERVAL);

        // Ticks at 0ms, 3000ms, 6000ms.
        tokio::time::sleep(Duration::from_millis(6500)).await;
        assert_eq!(target.fetches.load(Ordering::SeqCst), 3);
        assert_eq!(target.terminals.load(Ordering::SeqCst), 1);
        assert!(handle.is_finished());

        // No further ticks after terminal.
        tokio::time::sleep(Duration::from_millis(10_000)).await;
        assert_eq!(target.fetches.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn transient_error_does_not_stop_polling() {
        // Tick 2 of 5 fails; the server recovers and terminal detection
        // still happens on tick 5.
        let target = Scripted::with(vec![
            Ok(10),
            Err(server_error()),
            Ok(40),
            Ok(70),
            Ok(100),
        ]);
        let handle = Poller::start(std::sync::Arc::clone(&target), DEFAULT_POLL_INTERVAL);

        tokio::time::sleep(Duration::from_millis(12_500)).await;
        assert_eq!(target.fetches.load(Ordering::SeqCst), 5);
        assert_eq!(target.transients.load(Ordering::SeqCst), 1);
        assert_eq!(target.terminals.load(Ordering::SeqCst), 1);
        assert_eq!(target.aborts.load(Ordering::SeqCst), 0);
        assert!(handle.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn not_found_aborts_the_loop() {
        let target = Scripted::with(vec![
            Ok(10),
            Err(JobClientError::NotFound("batch gone".into())),
        ]);
        let handle = Poller::start(std::sync::Arc::clone(&target), DEFAULT_POLL_INTERVAL);

        tokio::time::sleep(Duration::from_millis(3500)).await;
        assert_eq!(target.fetches.load(Ordering::SeqCst), 2);
        assert_eq!(target.aborts.load(Ordering::SeqCst), 1);
        assert_eq!(target.terminals.load(Ordering::SeqCst), 0);
        assert!(handle.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn stop_is_idempotent_and_cancels_the_timer() {
        let target = Scripted::with(vec![Ok(10), Ok(20), Ok(30), Ok(40)]);
        let handle = Poller::start(std::sync::Arc::clone(&target), DEFAULT_POLL_INTERVAL);

        tokio::time::sleep(Duration::from_millis(3500)).await;
        assert_eq!(target.fetches.load(Ordering::SeqCst), 2);

        handle.stop();
        handle.stop(); // calling stop twice is safe
        tokio::time::sleep(Duration::from_millis(10_000)).await;

        assert_eq!(target.fetches.load(Ordering::SeqCst), 2);
        assert!(handle.is_finished());
    }

    /// Pipeline-shaped target: terminal as soon as every required stage
    /// reports completed.
    struct StagePoll {
        stages: StageMap,
        terminals: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl PollTarget for std::sync::Arc<StagePoll> {
        type Snapshot = StageMap;

        async fn fetch(&self) -> Result<StageMap, JobClientError> {
            Ok(self.stages.clone())
        }

        fn is_terminal(&self, snapshot: &StageMap) -> bool {
            is_complete(snapshot)
        }

        async fn on_terminal(&self, _snapshot: StageMap) {
            self.terminals.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn required_complete_optional_incomplete_is_terminal() {
        let stages: StageMap = [
            ("textures", true, true),
            ("rigging", false, false),
            ("animation", false, false),
            ("export", true, true),
            ("sprites", false, false),
        ]
        .into_iter()
        .map(|(name, required, completed)| {
            (
                name.to_string(),
                Stage {
                    name: name.to_string(),
                    required,
                    completed,
                },
            )
        })
        .collect();

        let target = std::sync::Arc::new(StagePoll {
            stages,
            terminals: AtomicUsize::new(0),
        });
        let handle = Poller::start(std::sync::Arc::clone(&target), DEFAULT_POLL_INTERVAL);

        tokio::time::sleep(Duration::from_millis(10_000)).await;
        // Terminal on the very first snapshot, exactly once.
        assert_eq!(target.terminals.load(Ordering::SeqCst), 1);
        assert!(handle.is_finished());
    }
}
