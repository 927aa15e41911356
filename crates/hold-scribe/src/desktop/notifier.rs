use hold_scribe_core::Notifier;

use notify_rust::Notification;
use tracing::{info, warn};

/// Desktop notifications through `notify-rust`.
pub struct DesktopNotifier {
    summary: String,
}

impl DesktopNotifier {
    /// Notifier titling every message with `summary`.
    pub fn new<S: Into<String>>(summary: S) -> Self {
        Self {
            summary: summary.into(),
        }
    }
}

impl Notifier for DesktopNotifier {
    fn notify(&self, message: &str) {
        info!(message, "Notifying user");

        let summary = self.summary.clone();
        let body = message.to_string();

        // Showing can block on the notification daemon.
        std::thread::spawn(move || {
            if let Err(e) = Notification::new().summary(&summary).body(&body).show() {
                warn!(error = %e, "Failed to show notification");
            }
        });
    }
}
