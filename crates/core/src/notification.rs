//! Ephemeral user-facing notifications (toasts).

use std::time::Duration;

use serde::Serialize;

/// Severity of a notification, which also determines how long it stays
/// visible. Errors persist longest so the user has time to read them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Error,
    Warn,
    Info,
}

impl NotificationKind {
    /// Default on-screen lifetime for this kind.
    pub fn default_timeout(self) -> Duration {
        match self {
            NotificationKind::Success | NotificationKind::Info => Duration::from_millis(3000),
            NotificationKind::Warn => Duration::from_millis(4000),
            NotificationKind::Error => Duration::from_millis(5000),
        }
    }
}

/// One queued notification. Immutable after creation; it is removed from
/// the queue (by exact id) when its timeout elapses.
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    /// Queue-unique id. Allocated from a monotonic counter so two
    /// notifications pushed in the same instant never collide.
    pub id: u64,
    pub kind: NotificationKind,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_lifetime_is_longest() {
        let error = NotificationKind::Error.default_timeout();
        assert!(error >= NotificationKind::Success.default_timeout());
        assert!(error >= NotificationKind::Warn.default_timeout());
        assert!(error >= NotificationKind::Info.default_timeout());
    }

    #[test]
    fn warn_outlives_success() {
        assert!(
            NotificationKind::Warn.default_timeout()
                > NotificationKind::Success.default_timeout()
        );
    }
}
