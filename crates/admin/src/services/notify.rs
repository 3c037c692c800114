//! Toast notification contract.
//!
//! Notifications are fire-and-forget: nothing is returned and nothing the
//! sink does can fail the calling operation.

use std::sync::Mutex;

/// Toast severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
}

/// A notification as handed to the sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub kind: ToastKind,
    pub title: String,
    pub message: String,
}

/// Notification sink.
pub trait Notifier: Send + Sync {
    /// Announce a completed action.
    fn success(&self, title: &str, message: &str);

    /// Announce a failed action.
    fn error(&self, title: &str, message: &str);
}

/// Notifier that only emits tracing events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn success(&self, title: &str, message: &str) {
        tracing::info!(title, message, "toast");
    }

    fn error(&self, title: &str, message: &str) {
        tracing::warn!(title, message, "toast");
    }
}

/// Notifier that keeps every toast in memory.
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    toasts: Mutex<Vec<Toast>>,
}

impl MemoryNotifier {
    /// Create an empty notifier.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every toast received so far, oldest first.
    #[must_use]
    pub fn toasts(&self) -> Vec<Toast> {
        self.lock().clone()
    }

    /// Remove and return every toast received so far.
    pub fn drain(&self) -> Vec<Toast> {
        std::mem::take(&mut *self.lock())
    }

    fn push(&self, kind: ToastKind, title: &str, message: &str) {
        self.lock().push(Toast {
            kind,
            title: title.to_string(),
            message: message.to_string(),
        });
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Toast>> {
        self.toasts
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Notifier for MemoryNotifier {
    fn success(&self, title: &str, message: &str) {
        self.push(ToastKind::Success, title, message);
    }

    fn error(&self, title: &str, message: &str) {
        self.push(ToastKind::Error, title, message);
    }
}
