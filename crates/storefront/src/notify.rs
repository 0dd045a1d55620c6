//! User-facing notifications.
//!
//! The presentation layer drains [`Notifications`] and shows each entry as a
//! short toast. The engine never renders anything itself.

use tokio::sync::mpsc;

/// Severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Error,
}

/// A short, human-readable message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub severity: Severity,
    pub message: String,
}

/// Sending half, held by the engine.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: mpsc::UnboundedSender<Notification>,
}

/// Receiving half, held by the presentation layer.
#[derive(Debug)]
pub struct Notifications {
    rx: mpsc::UnboundedReceiver<Notification>,
}

/// Create a connected notifier/receiver pair.
#[must_use]
pub fn channel() -> (Notifier, Notifications) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Notifier { tx }, Notifications { rx })
}

impl Notifier {
    /// Queue an error notification.
    pub fn error(&self, message: impl Into<String>) {
        self.push(Severity::Error, message.into());
    }

    /// Queue a success notification.
    pub fn success(&self, message: impl Into<String>) {
        self.push(Severity::Success, message.into());
    }

    fn push(&self, severity: Severity, message: String) {
        // Nobody listening is not an error; the message is dropped.
        if self.tx.send(Notification { severity, message }).is_err() {
            tracing::debug!("Notification receiver dropped");
        }
    }
}

impl Notifications {
    /// Take every notification queued so far without waiting.
    pub fn drain(&mut self) -> Vec<Notification> {
        let mut out = Vec::new();
        while let Ok(n) = self.rx.try_recv() {
            out.push(n);
        }
        out
    }
}
