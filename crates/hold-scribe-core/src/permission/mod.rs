//! OS permission gate for microphone capture and synthetic input.
//!
//! Failures are reported as `false` / [`MicrophoneTrust::Denied`], never as
//! errors: the caller decides whether to notify the user or retry.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};

/// Smallest poll interval accepted by [`PermissionGate::poll_input_injection_trust`].
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Microphone authorization as reported by the OS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MicrophoneTrust {
    /// Capture is allowed.
    Granted,
    /// The user (or policy) refused capture.
    Denied,
    /// The user has not been asked yet.
    Undetermined,
}

/// Queries and requests the two OS grants the dictation cycle needs.
///
/// Implementations must not cache results: every call reflects the current
/// OS state.
#[async_trait]
pub trait PermissionGate: Send + Sync {
    /// Current microphone authorization. Must not block.
    fn microphone_trust(&self) -> MicrophoneTrust;

    /// Ask the OS for microphone access, suspending until the user answers or
    /// the system resolves the request. Returns whether access is now granted.
    async fn request_microphone(&self) -> bool;

    /// Whether synthetic keyboard input is currently trusted. Must not block.
    fn is_input_injection_trusted(&self) -> bool;

    /// Trigger the one-time system prompt if not already trusted and return the
    /// (possibly unchanged) trust.
    fn request_input_injection_prompt(&self) -> bool;

    /// Poll input-injection trust every `interval` until it is granted or
    /// `timeout` elapses. Returns `false` on timeout.
    async fn poll_input_injection_trust(&self, timeout: Duration, interval: Duration) -> bool {
        let interval = interval.max(MIN_POLL_INTERVAL);

        let poll = async {
            loop {
                if self.is_input_injection_trusted() {
                    return true;
                }
                tokio::time::sleep(interval).await;
            }
        };

        match tokio::time::timeout(timeout, poll).await {
            Ok(trusted) => {
                info!("Input injection trust granted");
                trusted
            }
            Err(_) => {
                debug!(
                    timeout_ms = timeout.as_millis(),
                    "Gave up waiting for input injection trust"
                );
                false
            }
        }
    }
}
