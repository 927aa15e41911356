use crate::{
    AudioError, AudioSession, ClipboardInserter, MicrophoneTrust, PermissionGate, RecordedAudio,
    SessionHandle, TranscriptionGateway,
    controller::{
        Earcons, Notifier, RecordingState, StateChange, notice,
        state::{ControllerState, Session},
    },
};

use std::{
    panic::Location,
    sync::{
        Arc, Mutex, MutexGuard,
        atomic::{AtomicBool, Ordering},
    },
    time::{Duration, Instant},
};

use error_location::ErrorLocation;
use tokio::{
    sync::{broadcast, mpsc},
    task::JoinHandle,
};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// Buffered state changes per subscriber before it starts lagging.
const STATE_CHANNEL_CAPACITY: usize = 64;

/// A press or release of the configured chord.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HotkeyEvent {
    /// The chord went down.
    Pressed,
    /// The chord came up.
    Released,
}

/// What a hotkey press led to.
#[derive(Debug)]
pub enum PressOutcome {
    /// Recording started for the given session.
    Started(Uuid),
    /// A cycle is already in flight; rejected with a busy notification.
    Busy,
    /// Microphone access is denied; nothing started.
    PermissionDenied,
    /// Microphone access was requested. The user has to press again once granted.
    PermissionRequested(JoinHandle<()>),
    /// An earlier microphone request is still waiting for the user.
    PermissionPending,
    /// Capture could not start.
    Failed,
}

/// Controller switches taken from the application configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerOptions {
    /// Play earcons when recording starts and stops.
    pub earcons: bool,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self { earcons: true }
    }
}

/// Everything the controller drives, handed over once at construction.
pub struct Collaborators {
    /// OS permission queries.
    pub gate: Arc<dyn PermissionGate>,
    /// Recording lifecycle.
    pub audio: AudioSession,
    /// Speech engine access.
    pub gateway: TranscriptionGateway,
    /// Clipboard insertion.
    pub inserter: ClipboardInserter,
    /// User-visible messages.
    pub notifier: Arc<dyn Notifier>,
    /// Optional audio cues.
    pub earcons: Option<Arc<dyn Earcons>>,
}

/// Push-to-talk controller.
///
/// Serializes dictation cycles: a press is only accepted in `Idle`, so there
/// is never more than one recording, transcription or insertion in flight.
/// Every failure maps to one notification and a return to `Idle`.
pub struct PttController {
    gate: Arc<dyn PermissionGate>,
    audio: Mutex<AudioSession>,
    gateway: TranscriptionGateway,
    inserter: tokio::sync::Mutex<ClipboardInserter>,
    notifier: Arc<dyn Notifier>,
    earcons: Option<Arc<dyn Earcons>>,
    options: ControllerOptions,
    state: Mutex<ControllerState>,
    changes: broadcast::Sender<StateChange>,
    microphone_request_pending: AtomicBool,
}

impl PttController {
    /// Build a controller in `Idle`.
    pub fn new(parts: Collaborators, options: ControllerOptions) -> Arc<Self> {
        let (changes, _) = broadcast::channel(STATE_CHANNEL_CAPACITY);

        Arc::new(Self {
            gate: parts.gate,
            audio: Mutex::new(parts.audio),
            gateway: parts.gateway,
            inserter: tokio::sync::Mutex::new(parts.inserter),
            notifier: parts.notifier,
            earcons: parts.earcons,
            options,
            state: Mutex::new(ControllerState::default()),
            changes,
            microphone_request_pending: AtomicBool::new(false),
        })
    }

    /// Receive every state transition from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.changes.subscribe()
    }

    /// Current state.
    pub fn state(&self) -> RecordingState {
        self.lock_state().current.clone()
    }

    /// Id of the cycle in flight, if any.
    pub fn active_session(&self) -> Option<Uuid> {
        self.lock_state().session.as_ref().map(|session| session.id)
    }

    /// Consume hotkey events until every sender is dropped.
    ///
    /// Returns once the last accepted cycle has finished.
    #[instrument(skip_all)]
    pub async fn run(self: Arc<Self>, mut events: mpsc::Receiver<HotkeyEvent>) {
        let mut in_flight: Option<JoinHandle<()>> = None;

        while let Some(event) = events.recv().await {
            if let Some(cycle) = self.handle(event) {
                in_flight = Some(cycle);
            }
        }

        debug!("Hotkey channel closed");

        if let Some(cycle) = in_flight {
            if let Err(e) = cycle.await {
                error!(error = ?e, "Dictation cycle task failed");
            }
        }
    }

    /// Dispatch one hotkey event, returning the cycle task a release spawned.
    pub fn handle(self: &Arc<Self>, event: HotkeyEvent) -> Option<JoinHandle<()>> {
        match event {
            HotkeyEvent::Pressed => {
                let outcome = self.pressed();
                debug!(?outcome, "Hotkey press handled");
                None
            }
            HotkeyEvent::Released => self.released(),
        }
    }

    /// Handle the chord going down.
    ///
    /// Microphone trust is re-checked on every press. When it is undetermined
    /// the OS is asked, but capture never starts from this press: the user
    /// presses again once access is granted.
    #[instrument(skip(self))]
    pub fn pressed(self: &Arc<Self>) -> PressOutcome {
        let mut state = self.lock_state();

        if !state.current.is_idle() {
            debug!(state = state.current.label(), "Press rejected, cycle in flight");
            drop(state);
            self.notifier.notify(notice::BUSY);
            return PressOutcome::Busy;
        }

        match self.gate.microphone_trust() {
            MicrophoneTrust::Granted => {}
            MicrophoneTrust::Denied => {
                drop(state);
                warn!("Microphone access denied");
                self.notifier.notify(notice::MICROPHONE_DENIED);
                return PressOutcome::PermissionDenied;
            }
            MicrophoneTrust::Undetermined => {
                drop(state);
                return self.request_microphone();
            }
        }

        let started = self.lock_audio().start();
        match started {
            Ok(capture) => {
                let session_id = capture.id();
                state.session = Some(Session::recording(capture));
                self.transition(&mut state, RecordingState::Recording);
                drop(state);
                self.play(|earcons| earcons.recording_started());
                PressOutcome::Started(session_id)
            }
            Err(e) => {
                error!(error = ?e, "Failed to start recording");
                self.fail(&mut state, notice::audio_failure(&e));
                PressOutcome::Failed
            }
        }
    }

    /// Handle the chord coming up.
    ///
    /// Outside `Recording` this is a no-op. Otherwise the state moves to
    /// `Transcribing` and the returned task stops capture, writes the
    /// recording on the blocking pool, then transcribes and inserts it.
    #[instrument(skip(self))]
    pub fn released(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        let mut state = self.lock_state();

        if state.current != RecordingState::Recording {
            debug!(state = state.current.label(), "Release ignored");
            return None;
        }

        let Some(capture) = state.session.as_mut().and_then(|s| s.capture.take()) else {
            error!("Recording state without a capture handle");
            let e = AudioError::NoActiveSession {
                location: ErrorLocation::from(Location::caller()),
            };
            self.fail(&mut state, notice::audio_failure(&e));
            return None;
        };

        self.transition(&mut state, RecordingState::Transcribing);
        drop(state);
        self.play(|earcons| earcons.recording_stopped());

        let this = Arc::clone(self);
        Some(tokio::spawn(async move { this.finish_cycle(capture).await }))
    }

    /// Load the speech engine in the background.
    ///
    /// Passes through `LoadingEngine` back to `Idle` whatever the outcome; a
    /// failed load is retried by the next transcription.
    pub fn warm_up(self: &Arc<Self>) -> JoinHandle<()> {
        let entered = {
            let mut state = self.lock_state();
            if state.current.is_idle() {
                self.transition(&mut state, RecordingState::LoadingEngine);
                true
            } else {
                false
            }
        };

        let this = Arc::clone(self);
        tokio::spawn(async move {
            match this.gateway.ensure_loaded().await {
                Ok(()) => info!("Engine warm-up complete"),
                Err(e) => warn!(error = %e, "Engine warm-up failed, will retry on next dictation"),
            }

            if entered {
                let mut state = this.lock_state();
                if state.current == RecordingState::LoadingEngine {
                    this.transition(&mut state, RecordingState::Idle);
                }
            }
        })
    }

    /// Make sure paste injection is trusted, prompting and then polling for up
    /// to `timeout` while the user visits the system settings.
    ///
    /// Notifies once if trust is still missing at the end.
    #[instrument(skip(self))]
    pub async fn prepare_input_injection(&self, timeout: Duration, interval: Duration) -> bool {
        if self.gate.is_input_injection_trusted() {
            return true;
        }

        if self.gate.request_input_injection_prompt() {
            info!("Input injection trusted after prompt");
            return true;
        }

        let trusted = self
            .gate
            .poll_input_injection_trust(timeout, interval)
            .await;

        if !trusted {
            warn!("Input injection still untrusted, pasting will fail");
            self.notifier.notify(notice::INJECTION_UNTRUSTED);
        }

        trusted
    }

    fn request_microphone(self: &Arc<Self>) -> PressOutcome {
        if self.microphone_request_pending.swap(true, Ordering::AcqRel) {
            debug!("Microphone request already pending");
            return PressOutcome::PermissionPending;
        }

        info!("Requesting microphone access");

        let this = Arc::clone(self);
        PressOutcome::PermissionRequested(tokio::spawn(async move {
            let granted = this.gate.request_microphone().await;
            this.microphone_request_pending
                .store(false, Ordering::Release);

            if granted {
                info!("Microphone access granted");
                this.notifier.notify(notice::MICROPHONE_GRANTED);
            } else {
                warn!("Microphone access refused");
                this.notifier.notify(notice::MICROPHONE_DENIED);
            }
        }))
    }

    async fn finish_cycle(self: Arc<Self>, capture: SessionHandle) {
        let Some(recording) = self.stop_capture(capture).await else {
            return;
        };

        let result = self.gateway.transcribe(recording.path()).await;
        self.lock_audio().discard(recording);

        let failure = match result {
            Ok(text) => {
                let text = text.trim();
                if text.is_empty() {
                    info!("Empty transcript, nothing to insert");
                    None
                } else {
                    let mut inserter = self.inserter.lock().await;
                    match inserter.insert(text).await {
                        Ok(outcome) => {
                            debug!(?outcome, "Transcript inserted");
                            None
                        }
                        Err(e) => {
                            error!(error = ?e, "Failed to insert transcript");
                            Some(notice::insertion_failure(&e))
                        }
                    }
                }
            }
            Err(e) => {
                error!(error = ?e, network = e.is_network(), "Transcription failed");
                Some(notice::engine_failure(&e))
            }
        };

        let mut state = self.lock_state();
        match failure {
            Some(message) => self.fail(&mut state, message),
            None => self.finish(&mut state),
        }
    }

    /// Stop the device, resample and write the WAV file off the async workers.
    ///
    /// On failure the cycle is ended through `Error` and `None` is returned.
    async fn stop_capture(self: &Arc<Self>, capture: SessionHandle) -> Option<RecordedAudio> {
        let this = Arc::clone(self);
        let stopped = tokio::task::spawn_blocking(move || this.lock_audio().stop(&capture))
            .await
            .unwrap_or_else(|e| {
                Err(AudioError::DeviceUnavailable {
                    reason: format!("Capture stop task failed: {}", e),
                    location: ErrorLocation::from(Location::caller()),
                })
            });

        match stopped {
            Ok(recording) => {
                if let Some(session) = self.lock_state().session.as_mut() {
                    session.audio_path = Some(recording.path().to_path_buf());
                }
                Some(recording)
            }
            Err(e) => {
                error!(error = ?e, "Failed to stop recording");
                let mut state = self.lock_state();
                self.fail(&mut state, notice::audio_failure(&e));
                None
            }
        }
    }

    /// Surface `message` through a transient `Error` state and return to `Idle`.
    fn fail(&self, state: &mut ControllerState, message: String) {
        self.transition(state, RecordingState::Error(message.clone()));
        self.notifier.notify(&message);
        self.finish(state);
    }

    fn finish(&self, state: &mut ControllerState) {
        self.transition(state, RecordingState::Idle);
        state.session = None;
    }

    fn transition(&self, state: &mut ControllerState, to: RecordingState) {
        let from = std::mem::replace(&mut state.current, to.clone());
        let dwell = state.entered_at.elapsed();
        state.entered_at = Instant::now();
        let session_id = state.session.as_ref().map(|session| session.id);

        info!(
            session_id = ?session_id,
            from = from.label(),
            to = to.label(),
            dwell_ms = dwell.as_millis(),
            "State transition"
        );

        // No subscribers is fine.
        let _ = self.changes.send(StateChange {
            session_id,
            from,
            to,
        });
    }

    fn play(&self, cue: impl FnOnce(&dyn Earcons)) {
        if self.options.earcons {
            if let Some(earcons) = &self.earcons {
                cue(earcons.as_ref());
            }
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, ControllerState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_audio(&self) -> MutexGuard<'_, AudioSession> {
        self.audio.lock().unwrap_or_else(|e| e.into_inner())
    }
}
