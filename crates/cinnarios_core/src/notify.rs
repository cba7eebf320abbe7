//! crates/cinnarios_core/src/notify.rs
//!
//! Ephemeral UI feedback. At most one notification is visible at a time and
//! each one disappears on its own after [`TOAST_TIMEOUT_SECS`] seconds.

use crate::error::CoreError;
use crate::ports::{Clock, NotificationSink};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::debug;

/// How long a notification stays visible unless dismissed earlier.
pub const TOAST_TIMEOUT_SECS: i64 = 5;

pub type NotificationId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

impl Severity {
    pub fn label(self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Success => "success",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: NotificationId,
    pub message: String,
    pub severity: Severity,
    pub shown_at: DateTime<Utc>,
}

impl Notification {
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.shown_at + Duration::seconds(TOAST_TIMEOUT_SECS)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at()
    }
}

/// Holds the single visible notification and forwards show/dismiss calls to the sink.
pub struct Notifier {
    sink: Arc<dyn NotificationSink>,
    clock: Arc<dyn Clock>,
    current: Option<Notification>,
    next_id: NotificationId,
}

impl Notifier {
    pub fn new(sink: Arc<dyn NotificationSink>, clock: Arc<dyn Clock>) -> Self {
        Self {
            sink,
            clock,
            current: None,
            next_id: 0,
        }
    }

    /// Shows `message`, discarding whatever notification was visible before.
    pub fn notify(&mut self, message: impl Into<String>, severity: Severity) -> NotificationId {
        if let Some(previous) = self.current.take() {
            self.sink.dismiss(previous.id);
        }

        self.next_id += 1;
        let notification = Notification {
            id: self.next_id,
            message: message.into(),
            severity,
            shown_at: self.clock.now(),
        };
        debug!(id = notification.id, severity = severity.label(), "Showing notification");
        self.sink.show(&notification);
        self.current = Some(notification);
        self.next_id
    }

    pub fn info(&mut self, message: impl Into<String>) -> NotificationId {
        self.notify(message, Severity::Info)
    }

    pub fn success(&mut self, message: impl Into<String>) -> NotificationId {
        self.notify(message, Severity::Success)
    }

    pub fn warning(&mut self, message: impl Into<String>) -> NotificationId {
        self.notify(message, Severity::Warning)
    }

    /// Surfaces a failed operation.
    pub fn error(&mut self, error: &CoreError) -> NotificationId {
        self.notify(error.to_string(), Severity::Error)
    }

    /// Explicit dismissal by the user. Returns false if `id` is no longer visible.
    pub fn dismiss(&mut self, id: NotificationId) -> bool {
        match &self.current {
            Some(current) if current.id == id => {
                self.current = None;
                self.sink.dismiss(id);
                true
            }
            _ => false,
        }
    }

    /// The notification on screen at `now`, if any.
    pub fn visible(&self, now: DateTime<Utc>) -> Option<&Notification> {
        self.current.as_ref().filter(|n| !n.is_expired(now))
    }

    /// Drops the current notification once its timeout has elapsed.
    pub fn expire(&mut self, now: DateTime<Utc>) -> bool {
        match &self.current {
            Some(current) if current.is_expired(now) => {
                let id = current.id;
                self.current = None;
                self.sink.dismiss(id);
                true
            }
            _ => false,
        }
    }
}
