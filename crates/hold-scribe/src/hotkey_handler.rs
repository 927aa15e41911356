//! Global push-to-talk hotkey.
//!
//! Registers the configured chord and forwards its press and release edges
//! to the application. The controller owns the recording state machine; this
//! module only turns raw OS events into one press per hold.

use crate::{AppCommand, AppError, AppResult};

use std::{panic::Location, str::FromStr, time::Duration};

use error_location::ErrorLocation;
use global_hotkey::{GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState, hotkey::HotKey};
use hold_scribe_core::HotkeyEvent;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, instrument, warn};

/// Parse a chord such as `ctrl+shift+Space`.
#[track_caller]
pub(crate) fn parse_chord(chord: &str) -> AppResult<HotKey> {
    HotKey::from_str(chord).map_err(|e| AppError::HotkeyRegistrationFailed {
        reason: format!("Invalid hotkey '{}': {}", chord, e),
        location: ErrorLocation::from(Location::caller()),
    })
}

/// Collapses OS key events into one press and one release per hold.
///
/// Auto-repeat delivers repeated presses while the chord is held, and a
/// release can arrive for a press that happened before registration.
#[derive(Debug, Default)]
pub(crate) struct HeldKeyFilter {
    held: bool,
}

impl HeldKeyFilter {
    /// Map a raw key state to a controller event, or `None` to drop it.
    pub(crate) fn accept(&mut self, state: HotKeyState) -> Option<HotkeyEvent> {
        match state {
            HotKeyState::Pressed if !self.held => {
                self.held = true;
                Some(HotkeyEvent::Pressed)
            }
            HotKeyState::Released if self.held => {
                self.held = false;
                Some(HotkeyEvent::Released)
            }
            _ => None,
        }
    }
}

/// Forwards global hotkey events to the application.
pub struct HotkeyHandler {
    hotkey_id: u32,
    filter: HeldKeyFilter,
    command_tx: mpsc::Sender<AppCommand>,
}

impl HotkeyHandler {
    /// Register `chord` as the global hotkey.
    ///
    /// Must be called on a thread with a message pump (e.g. the main thread
    /// running a `tao` event loop) so that `WM_HOTKEY` messages are
    /// dispatched on Windows. The returned [`GlobalHotKeyManager`] must be
    /// kept alive on that thread for the hotkey to remain registered.
    #[track_caller]
    #[instrument]
    pub fn register_hotkey(chord: &str) -> AppResult<(GlobalHotKeyManager, u32)> {
        let hotkey = parse_chord(chord)?;

        let manager =
            GlobalHotKeyManager::new().map_err(|e| AppError::HotkeyRegistrationFailed {
                reason: format!("Failed to create manager: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        manager
            .register(hotkey)
            .map_err(|e| AppError::HotkeyRegistrationFailed {
                reason: format!("Failed to register {}: {}", chord, e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        info!(hotkey = chord, "Global hotkey registered");

        Ok((manager, hotkey.id()))
    }

    /// Create a handler for a previously registered hotkey.
    ///
    /// The `hotkey_id` should come from [`HotkeyHandler::register_hotkey`].
    /// This struct is `Send` and can live on any thread; it only listens on
    /// the global [`GlobalHotKeyEvent`] channel.
    pub fn new(hotkey_id: u32, command_tx: mpsc::Sender<AppCommand>) -> Self {
        Self {
            hotkey_id,
            filter: HeldKeyFilter::default(),
            command_tx,
        }
    }

    /// Run the hotkey forwarding loop until a shutdown signal is received.
    #[instrument(skip(self))]
    pub async fn run(mut self, mut shutdown_rx: watch::Receiver<bool>) -> AppResult<()> {
        let receiver = GlobalHotKeyEvent::receiver().clone();
        let (event_tx, mut event_rx) = mpsc::channel(32);

        // GlobalHotKeyEvent::receiver() is a crossbeam receiver with a blocking
        // recv(). The task ends on the first send after event_rx is dropped.
        let handle = tokio::task::spawn_blocking(move || {
            while let Ok(event) = receiver.recv() {
                if event_tx.blocking_send(event).is_err() {
                    break;
                }
            }
        });

        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    info!("Hotkey handler shutting down");
                    break;
                }
                Some(event) = event_rx.recv() => {
                    if event.id == self.hotkey_id {
                        self.forward(event.state).await?;
                    }
                }
            }
        }

        drop(event_rx);

        // The blocking task may stay parked in recv() until the next key event.
        match tokio::time::timeout(Duration::from_secs(1), handle).await {
            Ok(Ok(())) => debug!("Hotkey event forwarder stopped cleanly"),
            Ok(Err(e)) => warn!(error = ?e, "Hotkey event forwarder task panicked"),
            Err(_) => debug!(
                "Hotkey event forwarder did not stop within timeout, \
                   will be cleaned up on exit"
            ),
        }

        Ok(())
    }

    /// Pass one key edge through the filter and on to the application.
    pub(crate) async fn forward(&mut self, state: HotKeyState) -> AppResult<()> {
        let Some(event) = self.filter.accept(state) else {
            debug!(?state, "Repeated hotkey edge dropped");
            return Ok(());
        };

        self.command_tx
            .send(AppCommand::Hotkey(event))
            .await
            .map_err(|e| AppError::ChannelSendFailed {
                message: format!("Failed to send {:?}: {}", event, e),
                location: ErrorLocation::from(Location::caller()),
            })
    }
}
