//! Ephemeral notification queue with per-entry auto-expiry.
//!
//! Each pushed notification schedules its own removal on a tokio timer.
//! Removal is by exact id, so entries pushed in the same instant expire
//! independently. Must be used inside a tokio runtime.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use spriteforge_core::notification::{Notification, NotificationKind};

/// Upper bound on queued notifications. If expiry timers are ever
/// disabled or starved, the oldest entry is dropped instead of letting
/// the queue grow without bound.
const MAX_QUEUE_LEN: usize = 256;

/// Shared handle to the notification queue. Cheap to clone.
#[derive(Clone, Default)]
pub struct Notifier {
    inner: Arc<NotifierInner>,
}

#[derive(Default)]
struct NotifierInner {
    toasts: Mutex<Vec<Notification>>,
    next_id: AtomicU64,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a notification with an explicit lifetime and schedule its
    /// removal. Returns the queue-unique id.
    pub fn push_with_timeout(
        &self,
        kind: NotificationKind,
        message: impl Into<String>,
        timeout: Duration,
    ) -> u64 {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let message = message.into();

        {
            let mut toasts = self.inner.toasts.lock().expect("notifier lock poisoned");
            toasts.push(Notification { id, kind, message });
            if toasts.len() > MAX_QUEUE_LEN {
                toasts.remove(0);
            }
        }

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            inner
                .toasts
                .lock()
                .expect("notifier lock poisoned")
                .retain(|t| t.id != id);
        });

        id
    }

    /// Push with the default lifetime for the kind.
    pub fn push(&self, kind: NotificationKind, message: impl Into<String>) -> u64 {
        self.push_with_timeout(kind, message, kind.default_timeout())
    }

    pub fn success(&self, message: impl Into<String>) -> u64 {
        self.push(NotificationKind::Success, message)
    }

    pub fn error(&self, message: impl Into<String>) -> u64 {
        self.push(NotificationKind::Error, message)
    }

    pub fn warn(&self, message: impl Into<String>) -> u64 {
        self.push(NotificationKind::Warn, message)
    }

    pub fn info(&self, message: impl Into<String>) -> u64 {
        self.push(NotificationKind::Info, message)
    }

    /// Remove a notification early (e.g. user dismissed it). Exact-id
    /// match; removing an already-expired id is a no-op.
    pub fn dismiss(&self, id: u64) {
        self.inner
            .toasts
            .lock()
            .expect("notifier lock poisoned")
            .retain(|t| t.id != id);
    }

    /// Snapshot of the queue in push order.
    pub fn snapshot(&self) -> Vec<Notification> {
        self.inner
            .toasts
            .lock()
            .expect("notifier lock poisoned")
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(notifier: &Notifier) -> Vec<u64> {
        notifier.snapshot().iter().map(|t| t.id).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn notification_expires_after_its_timeout() {
        let notifier = Notifier::new();
        notifier.info("saved");
        assert_eq!(notifier.snapshot().len(), 1);

        tokio::time::sleep(Duration::from_millis(3001)).await;
        assert!(notifier.snapshot().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn error_outlives_success_pushed_at_the_same_instant() {
        let notifier = Notifier::new();
        let success = notifier.success("done");
        let error = notifier.error("failed");

        // Past the success lifetime, before the error lifetime.
        tokio::time::sleep(Duration::from_millis(3500)).await;
        let remaining = ids(&notifier);
        assert!(!remaining.contains(&success));
        assert!(remaining.contains(&error));

        tokio::time::sleep(Duration::from_millis(2000)).await;
        assert!(notifier.snapshot().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn same_instant_pushes_are_independently_removable() {
        let notifier = Notifier::new();
        let a = notifier.push_with_timeout(
            NotificationKind::Info,
            "first",
            Duration::from_millis(1000),
        );
        let b = notifier.push_with_timeout(
            NotificationKind::Info,
            "second",
            Duration::from_millis(1000),
        );
        assert_ne!(a, b);

        // Dismissing one must not take the other with it.
        notifier.dismiss(a);
        assert_eq!(ids(&notifier), vec![b]);

        tokio::time::sleep(Duration::from_millis(1001)).await;
        assert!(notifier.snapshot().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn queue_is_capped_when_timers_cannot_keep_up() {
        let notifier = Notifier::new();
        for i in 0..(MAX_QUEUE_LEN + 10) {
            notifier.push_with_timeout(
                NotificationKind::Info,
                format!("n{i}"),
                Duration::from_secs(3600),
            );
        }
        assert_eq!(notifier.snapshot().len(), MAX_QUEUE_LEN);
        // The oldest entries were dropped, not the newest.
        assert_eq!(notifier.snapshot()[0].message, "n10");
    }
}
