//! Desktop permission gate.
//!
//! Microphone access is reported as granted: desktop hosts other than macOS
//! have no authorization API, and on macOS the OS prompt is raised by the
//! first capture. A request checks the configured input device instead.
//!
//! Paste injection needs the Accessibility grant on macOS and is trusted
//! everywhere else.

use hold_scribe_core::{MicrophoneTrust, PermissionGate, input_device_ready};

use async_trait::async_trait;
use tracing::{debug, warn};

/// Permission gate backed by the running OS.
pub struct SystemPermissionGate {
    device_name: Option<String>,
}

impl SystemPermissionGate {
    /// Gate whose microphone requests check `device_name`, or the default input.
    pub fn new(device_name: Option<String>) -> Self {
        Self { device_name }
    }
}

#[async_trait]
impl PermissionGate for SystemPermissionGate {
    fn microphone_trust(&self) -> MicrophoneTrust {
        MicrophoneTrust::Granted
    }

    async fn request_microphone(&self) -> bool {
        let device_name = self.device_name.clone();

        match tokio::task::spawn_blocking(move || input_device_ready(device_name.as_deref())).await
        {
            Ok(available) => {
                debug!(available, "Input device checked");
                available
            }
            Err(e) => {
                warn!(error = ?e, "Input device check panicked");
                false
            }
        }
    }

    fn is_input_injection_trusted(&self) -> bool {
        accessibility::is_trusted()
    }

    fn request_input_injection_prompt(&self) -> bool {
        accessibility::prompt()
    }
}

#[cfg(target_os = "macos")]
mod accessibility {
    use core_foundation::{
        base::TCFType,
        boolean::CFBoolean,
        dictionary::{CFDictionary, CFDictionaryRef},
        string::{CFString, CFStringRef},
    };

    #[link(name = "ApplicationServices", kind = "framework")]
    unsafe extern "C" {
        static kAXTrustedCheckOptionPrompt: CFStringRef;
        fn AXIsProcessTrusted() -> bool;
        fn AXIsProcessTrustedWithOptions(options: CFDictionaryRef) -> bool;
    }

    pub(super) fn is_trusted() -> bool {
        // SAFETY: no arguments, reads process state only.
        unsafe { AXIsProcessTrusted() }
    }

    /// Shows the system Accessibility prompt unless already trusted.
    pub(super) fn prompt() -> bool {
        // SAFETY: the key is a framework constant that lives for the process.
        let key = unsafe { CFString::wrap_under_get_rule(kAXTrustedCheckOptionPrompt) };
        let options = CFDictionary::from_CFType_pairs(&[(
            key.as_CFType(),
            CFBoolean::true_value().as_CFType(),
        )]);

        // SAFETY: `options` is a valid dictionary kept alive across the call.
        unsafe { AXIsProcessTrustedWithOptions(options.as_concrete_TypeRef()) }
    }
}

#[cfg(not(target_os = "macos"))]
mod accessibility {
    pub(super) fn is_trusted() -> bool {
        true
    }

    pub(super) fn prompt() -> bool {
        true
    }
}
