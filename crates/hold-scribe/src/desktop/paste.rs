use crate::PasteKeyGuard;

use hold_scribe_core::{InputSynthesizer, InsertionError, InsertionResult, PermissionGate};

use std::{panic::Location, sync::Arc, time::Duration};

use async_trait::async_trait;
use enigo::Key;
use error_location::ErrorLocation;
use tracing::{debug, instrument};

/// Gap between key events. Some applications and input methods drop
/// events that arrive closer together.
const KEY_EVENT_DELAY: Duration = Duration::from_millis(10);

/// Posts Cmd+V / Ctrl+V through `enigo`.
pub struct EnigoSynthesizer {
    gate: Arc<dyn PermissionGate>,
}

impl EnigoSynthesizer {
    /// Synthesizer that refuses to post while `gate` reports injection untrusted.
    pub fn new(gate: Arc<dyn PermissionGate>) -> Self {
        Self { gate }
    }
}

#[async_trait]
impl InputSynthesizer for EnigoSynthesizer {
    #[instrument(skip(self))]
    async fn post_paste_chord(&self) -> InsertionResult<()> {
        if !self.gate.is_input_injection_trusted() {
            return Err(InsertionError::PermissionDenied {
                location: ErrorLocation::from(Location::caller()),
            });
        }

        // Enigo is not Send, so it is created inside the blocking task. The
        // guard releases the modifier even if the click fails.
        tokio::task::spawn_blocking(|| {
            let mut guard = PasteKeyGuard::press()?;
            std::thread::sleep(KEY_EVENT_DELAY);
            guard.click(Key::Unicode('v'))?;
            std::thread::sleep(KEY_EVENT_DELAY);
            Ok::<(), InsertionError>(())
        })
        .await
        .map_err(|e| InsertionError::InjectionBlocked {
            reason: format!("Paste task panicked: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })??;

        debug!("Paste chord posted");

        Ok(())
    }
}
