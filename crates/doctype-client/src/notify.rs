//! User notifications
//!
//! Success and failure of remote calls are reported through a [`Notifier`]
//! instead of toasts.

use parking_lot::Mutex;

/// One notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Operation completed
    Success(String),
    /// Operation failed; form state is left as it was
    Error(String),
}

impl Notice {
    /// Notification text
    #[inline]
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Success(m) | Self::Error(m) => m,
        }
    }

    /// Whether this reports a failure
    #[inline]
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

/// Receives notifications
pub trait Notifier: Send + Sync {
    /// Deliver one notification
    fn notify(&self, notice: Notice);

    /// Report success
    fn success(&self, message: &str) {
        self.notify(Notice::Success(message.to_string()));
    }

    /// Report failure
    fn error(&self, message: &str) {
        self.notify(Notice::Error(message.to_string()));
    }
}

/// Logs notifications through `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        match notice {
            Notice::Success(message) => tracing::info!("{}", message),
            Notice::Error(message) => tracing::error!("{}", message),
        }
    }
}

/// Keeps every notification in memory
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    /// Create empty recorder
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Notifications so far
    #[must_use]
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().clone()
    }

    /// Most recent notification
    #[must_use]
    pub fn last(&self) -> Option<Notice> {
        self.notices.lock().last().cloned()
    }

    /// Error notifications so far
    #[must_use]
    pub fn errors(&self) -> Vec<String> {
        self.notices
            .lock()
            .iter()
            .filter(|n| n.is_error())
            .map(|n| n.message().to_string())
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices.lock().push(notice);
    }
}

impl<T: Notifier + ?Sized> Notifier for std::sync::Arc<T> {
    fn notify(&self, notice: Notice) {
        (**self).notify(notice);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recorder_keeps_order() {
        let recorder = RecordingNotifier::new();
        recorder.success("Saved");
        recorder.error("Duplicate plot");
        assert_eq!(
            recorder.notices(),
            vec![Notice::Success("Saved".into()), Notice::Error("Duplicate plot".into())]
        );
        assert_eq!(recorder.errors(), vec!["Duplicate plot".to_string()]);
        assert!(recorder.last().is_some_and(|n| n.is_error()));
    }
}
