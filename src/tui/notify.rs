//! Transient status messages with timed auto-dismiss.

use std::time::{Duration, Instant};

use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
    pub kind: NoticeKind,
    expires_at: Instant,
}

/// Queue of visible notices. Each one expires on its own clock.
#[derive(Debug)]
pub struct Notifications {
    entries: Vec<Notice>,
    lifetime: Duration,
}

impl Notifications {
    pub fn new(lifetime: Duration) -> Self {
        Self { entries: Vec::new(), lifetime }
    }

    /// Show `message` now.
    pub fn notify(&mut self, message: impl Into<String>, kind: NoticeKind) {
        self.notify_at(message, kind, Instant::now());
    }

    /// Show `message` as if posted at `at`.
    pub fn notify_at(&mut self, message: impl Into<String>, kind: NoticeKind, at: Instant) {
        let message = message.into();
        match kind {
            NoticeKind::Error => warn!(%message, "notice"),
            _ => info!(%message, "notice"),
        }
        self.entries.push(Notice {
            message,
            kind,
            expires_at: at + self.lifetime,
        });
    }

    /// Drop every notice whose lifetime has run out by `now`.
    pub fn expire(&mut self, now: Instant) {
        self.entries.retain(|n| n.expires_at > now);
    }

    /// Visible notices, oldest first.
    pub fn visible(&self) -> &[Notice] {
        &self.entries
    }

    pub fn latest(&self) -> Option<&Notice> {
        self.entries.last()
    }
}
