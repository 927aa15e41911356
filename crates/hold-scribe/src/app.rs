use crate::{
    AppCommand, AppResult, ArboardClipboard, DesktopNotifier, EnigoSynthesizer, SystemEarcons,
    SystemPermissionGate, TrayCommand, TrayIconState, config::Config,
};

use std::{fs, sync::Arc, time::Duration};

use hold_scribe_core::{
    AudioSession, ClipboardInserter, Collaborators, CpalCapture, PermissionGate, PttController,
    RecordingState, TranscriptionGateway,
};
use tao::event_loop::EventLoopProxy;
use tokio::sync::{broadcast, mpsc, watch};
use tracing::{debug, error, info, instrument, warn};
use tray_icon::menu::{MenuEvent, MenuId};

/// How long to wait for the user to grant paste injection after the prompt.
const INJECTION_TRUST_TIMEOUT: Duration = Duration::from_secs(60);

/// How often injection trust is re-checked while waiting.
const INJECTION_TRUST_POLL: Duration = Duration::from_millis(500);

/// How long shutdown waits for each background task.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

/// Summary line of every desktop notification.
const NOTIFICATION_SUMMARY: &str = "Hold-Scribe";

/// Wire the desktop adapters into a controller.
///
/// Runs on the main thread before the async runtime exists; nothing here
/// touches the microphone or the speech model yet.
#[track_caller]
#[instrument(skip(config))]
pub(crate) fn build_controller(config: &Config) -> AppResult<Arc<PttController>> {
    let scratch_dir = config.scratch_dir();
    fs::create_dir_all(&scratch_dir)?;
    debug!(scratch_dir = ?scratch_dir, "Scratch directory ready");

    let device = config.audio.selected_device.clone();
    let gate: Arc<dyn PermissionGate> = Arc::new(SystemPermissionGate::new(device.clone()));

    let audio = AudioSession::new(Box::new(CpalCapture::new(device.as_deref())), scratch_dir);
    let gateway = TranscriptionGateway::new(config.whisper_loader());
    let inserter = ClipboardInserter::new(
        Box::new(ArboardClipboard::new()?),
        Arc::new(EnigoSynthesizer::new(Arc::clone(&gate))),
        config.insertion_options(),
    );

    Ok(PttController::new(
        Collaborators {
            gate,
            audio,
            gateway,
            inserter,
            notifier: Arc::new(DesktopNotifier::new(NOTIFICATION_SUMMARY)),
            earcons: Some(Arc::new(SystemEarcons)),
        },
        config.controller_options(),
    ))
}

/// Main application state.
///
/// Runs on the async runtime thread. Communicates tray icon updates
/// back to the main thread via `tray_proxy` because `TrayIcon` is `!Send`
/// and must remain on the UI thread.
pub struct App {
    pub(crate) controller: Arc<PttController>,
    pub(crate) tray_proxy: EventLoopProxy<TrayCommand>,
    pub(crate) command_tx: mpsc::Sender<AppCommand>,
    pub(crate) command_rx: mpsc::Receiver<AppCommand>,
    pub(crate) shutdown_tx: watch::Sender<bool>,
    pub(crate) config_menu_id: MenuId,
    pub(crate) exit_menu_id: MenuId,
}

impl App {
    /// Run the main application event loop.
    #[instrument(skip(self))]
    pub(crate) async fn run(mut self) -> AppResult<()> {
        info!("Hold-Scribe starting");

        // MenuEvent::receiver() is a crossbeam receiver with a blocking recv().
        // The task ends on the first send after tray_event_rx is dropped.
        let (tray_event_tx, mut tray_event_rx) = mpsc::channel(32);
        let tray_handle = tokio::task::spawn_blocking(move || {
            let receiver = MenuEvent::receiver();
            while let Ok(event) = receiver.recv() {
                if tray_event_tx.blocking_send(event).is_err() {
                    break;
                }
            }
        });

        // Subscribe before warm-up so the loading state reaches the tray.
        let mut changes = self.controller.subscribe();
        let _ = self.controller.warm_up();

        let (hotkey_tx, hotkey_rx) = mpsc::channel(32);
        let controller_handle = tokio::spawn(Arc::clone(&self.controller).run(hotkey_rx));

        let controller = Arc::clone(&self.controller);
        let injection = tokio::spawn(async move {
            controller
                .prepare_input_injection(INJECTION_TRUST_TIMEOUT, INJECTION_TRUST_POLL)
                .await
        });

        loop {
            tokio::select! {
                Some(event) = tray_event_rx.recv() => {
                    if let Err(e) = self.handle_tray_event(event).await {
                        error!(error = ?e, "Failed to handle tray event");
                    }
                }

                Some(cmd) = self.command_rx.recv() => {
                    match cmd {
                        AppCommand::Hotkey(event) => {
                            if let Err(e) = hotkey_tx.send(event).await {
                                error!(error = ?e, "Controller loop stopped, shutting down");
                                break;
                            }
                        }
                        AppCommand::Shutdown => {
                            info!("Shutdown requested");
                            break;
                        }
                    }
                }

                change = changes.recv() => {
                    match change {
                        Ok(change) => self.show_state(&change.to),
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!(skipped, "Tray fell behind controller state");
                            self.show_state(&self.controller.state());
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            info!("Controller state channel closed, shutting down");
                            break;
                        }
                    }
                }

                else => {
                    info!("All channels closed, shutting down");
                    break;
                }
            }
        }

        injection.abort();
        drop(hotkey_tx);
        drop(tray_event_rx);

        // An in-flight transcription is not worth holding up exit for.
        match tokio::time::timeout(SHUTDOWN_GRACE, controller_handle).await {
            Ok(Ok(())) => info!("Controller stopped cleanly"),
            Ok(Err(e)) => error!(error = ?e, "Controller task panicked"),
            Err(_) => info!("Controller still busy, abandoning in-flight cycle"),
        }

        match tokio::time::timeout(SHUTDOWN_GRACE, tray_handle).await {
            Ok(Ok(())) => info!("Tray event forwarder stopped cleanly"),
            Ok(Err(e)) => error!(error = ?e, "Tray event forwarder task panicked"),
            Err(_) => info!(
                "Tray event forwarder did not stop within timeout, \
                     will be cleaned up on exit"
            ),
        }

        let _ = self.shutdown_tx.send(true);
        info!("Hold-Scribe shut down successfully");

        Ok(())
    }

    fn show_state(&self, state: &RecordingState) {
        let icon_state = TrayIconState::from(state);
        if self
            .tray_proxy
            .send_event(TrayCommand::SetState(icon_state))
            .is_err()
        {
            debug!(?icon_state, "Event loop closed, tray update dropped");
        }
    }

    /// Handle tray menu events.
    #[instrument(skip(self))]
    async fn handle_tray_event(&mut self, event: MenuEvent) -> AppResult<()> {
        let event_id = &event.id;

        if *event_id == self.config_menu_id {
            let path = Config::config_path()?;
            open::that(&path)?;
            info!(config_path = ?path, "Opened config file");
        } else if *event_id == self.exit_menu_id {
            info!("Exit requested from tray menu");
            let _ = self.tray_proxy.send_event(TrayCommand::Shutdown);
            if let Err(e) = self.command_tx.send(AppCommand::Shutdown).await {
                error!(error = ?e, "Failed to send shutdown command");
            }
        }

        Ok(())
    }
}
