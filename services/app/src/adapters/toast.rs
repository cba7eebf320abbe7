//! services/app/src/adapters/toast.rs
//!
//! Prints notifications to the terminal and runs one auto-dismiss timer per
//! toast. Replacing or dismissing a toast cancels its timer; a timer that runs
//! out reports the toast's id on the channel handed back by the constructor,
//! so the shell can take it off screen without waiting for the next command.

use cinnarios_core::notify::{Notification, NotificationId, TOAST_TIMEOUT_SECS};
use cinnarios_core::ports::NotificationSink;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

type Timers = Arc<Mutex<HashMap<NotificationId, CancellationToken>>>;

pub struct TerminalToastSink {
    timeout: Duration,
    timers: Timers,
    timed_out: mpsc::UnboundedSender<NotificationId>,
}

impl TerminalToastSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<NotificationId>) {
        Self::with_timeout(Duration::from_secs(TOAST_TIMEOUT_SECS as u64))
    }

    pub fn with_timeout(timeout: Duration) -> (Self, mpsc::UnboundedReceiver<NotificationId>) {
        let (timed_out, rx) = mpsc::unbounded_channel();
        let sink = Self {
            timeout,
            timers: Arc::new(Mutex::new(HashMap::new())),
            timed_out,
        };
        (sink, rx)
    }

    /// Number of toasts whose timer is still running.
    pub fn pending_timers(&self) -> usize {
        self.timers.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl NotificationSink for TerminalToastSink {
    fn show(&self, notification: &Notification) {
        println!(
            "[{}] {}",
            notification.severity.label(),
            notification.message
        );

        // Outside a runtime there is nothing to drive the timer.
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            return;
        };
        let token = CancellationToken::new();
        self.timers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(notification.id, token.clone());

        let id = notification.id;
        let timeout = self.timeout;
        let timers = Arc::clone(&self.timers);
        let timed_out = self.timed_out.clone();
        handle.spawn(async move {
            tokio::select! {
                _ = token.cancelled() => debug!(id, "Toast timer cancelled"),
                _ = tokio::time::sleep(timeout) => {
                    timers.lock().unwrap_or_else(|e| e.into_inner()).remove(&id);
                    debug!(id, "Toast timed out");
                    // The receiver is gone once the shell has exited.
                    let _ = timed_out.send(id);
                }
            }
        });
    }

    fn dismiss(&self, id: NotificationId) {
        let token = self
            .timers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&id);
        if let Some(token) = token {
            token.cancel();
        }
    }
}
