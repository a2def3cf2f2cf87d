//! User-facing feedback, decoupled from how it is displayed.
//!
//! Controllers emit through the [`Notifier`] port and never wait on or branch
//! over delivery.

use serde::Serialize;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Info,
    Success,
    Warning,
    Error,
}

impl NoticeKind {
    /// Errors stay up longest since they usually need the user's attention.
    pub fn default_duration(self) -> Duration {
        match self {
            NoticeKind::Info | NoticeKind::Success => Duration::from_millis(3000),
            NoticeKind::Warning => Duration::from_millis(3500),
            NoticeKind::Error => Duration::from_millis(4000),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NoticeKind::Info => "info",
            NoticeKind::Success => "success",
            NoticeKind::Warning => "warning",
            NoticeKind::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub id: Uuid,
    pub kind: NoticeKind,
    pub message: String,
    pub duration: Duration,
}

impl Notice {
    pub fn new(kind: NoticeKind, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            message: message.into(),
            duration: kind.default_duration(),
        }
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Display time in milliseconds, as rendered in the page.
    pub fn duration_ms(&self) -> u128 {
        self.duration.as_millis()
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);

    fn info(&self, message: &str) {
        self.notify(Notice::new(NoticeKind::Info, message));
    }

    fn success(&self, message: &str) {
        self.notify(Notice::new(NoticeKind::Success, message));
    }

    fn warning(&self, message: &str) {
        self.notify(Notice::new(NoticeKind::Warning, message));
    }

    fn error(&self, message: &str) {
        self.notify(Notice::new(NoticeKind::Error, message));
    }
}

fn log_notice(notice: &Notice) {
    match notice.kind {
        NoticeKind::Error => tracing::warn!(text = %notice.message, "Error notice emitted"),
        NoticeKind::Warning => tracing::info!(text = %notice.message, "Warning notice emitted"),
        NoticeKind::Info | NoticeKind::Success => {
            tracing::debug!(kind = notice.kind.as_str(), text = %notice.message, "Notice emitted")
        }
    }
}

/// Holds the notices of one browser until they expire or are dismissed.
///
/// Each notice keeps its own lifetime; any number may be visible at once.
#[derive(Default)]
pub struct NoticeBoard {
    notices: Mutex<Vec<(Notice, Instant)>>,
}

impl NoticeBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Notices that have not yet expired, oldest first.
    pub fn active(&self) -> Vec<Notice> {
        let now = Instant::now();
        let mut notices = self.notices.lock().unwrap_or_else(PoisonError::into_inner);
        notices.retain(|(notice, posted)| now.duration_since(*posted) < notice.duration);
        notices.iter().map(|(notice, _)| notice.clone()).collect()
    }

    pub fn dismiss(&self, id: Uuid) -> bool {
        let mut notices = self.notices.lock().unwrap_or_else(PoisonError::into_inner);
        let before = notices.len();
        notices.retain(|(notice, _)| notice.id != id);
        notices.len() != before
    }
}

impl Notifier for NoticeBoard {
    fn notify(&self, notice: Notice) {
        log_notice(&notice);
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((notice, Instant::now()));
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub mod testing {
    use super::*;

    /// Keeps every notice it receives so tests can assert on exact arguments.
    #[derive(Default)]
    pub struct RecordingNotifier {
        notices: Mutex<Vec<Notice>>,
    }

    impl RecordingNotifier {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn notices(&self) -> Vec<Notice> {
            self.notices
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
        }

        pub fn messages(&self, kind: NoticeKind) -> Vec<String> {
            self.notices()
                .into_iter()
                .filter(|n| n.kind == kind)
                .map(|n| n.message)
                .collect()
        }

        pub fn count(&self, kind: NoticeKind) -> usize {
            self.messages(kind).len()
        }
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, notice: Notice) {
            log_notice(&notice);
            self.notices
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(notice);
        }
    }
}
