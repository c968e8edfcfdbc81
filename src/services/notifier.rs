//! Toast queue. Components push notifications; the host drains and shows them.

use std::collections::VecDeque;

use tracing::{error, info};

use crate::types::toast::{Toast, ToastKind};

pub struct Notifier {
    queue: VecDeque<Toast>,
    duration_ms: u64,
}

impl Notifier {
    pub fn new(duration_ms: u64) -> Self {
        Self {
            queue: VecDeque::new(),
            duration_ms,
        }
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.push(ToastKind::Success, message.into());
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(ToastKind::Error, message.into());
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(ToastKind::Info, message.into());
    }

    /// Like [`Notifier::info`] but stays on screen for `duration_ms`.
    pub fn info_for(&mut self, message: impl Into<String>, duration_ms: u64) {
        let message = message.into();
        info!(toast = %message, "notification");
        self.queue.push_back(Toast {
            kind: ToastKind::Info,
            message,
            duration_ms,
        });
    }

    /// Removes and returns every queued toast, oldest first.
    pub fn drain(&mut self) -> Vec<Toast> {
        self.queue.drain(..).collect()
    }

    pub fn pending(&self) -> impl Iterator<Item = &Toast> {
        self.queue.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    fn push(&mut self, kind: ToastKind, message: String) {
        match kind {
            ToastKind::Error => error!(toast = %message, "notification"),
            _ => info!(toast = %message, kind = ?kind, "notification"),
        }
        self.queue.push_back(Toast {
            kind,
            message,
            duration_ms: self.duration_ms,
        });
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(3000)
    }
}
