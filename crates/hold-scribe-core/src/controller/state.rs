use std::{fmt, path::PathBuf, time::Instant};

use uuid::Uuid;

use crate::SessionHandle;

/// Observable controller state.
///
/// One tagged value instead of independent flags, so combinations such as
/// "recording while transcribing" cannot be represented.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordingState {
    /// Waiting for the hotkey. Initial state and the end of every cycle.
    Idle,
    /// Capturing audio while the hotkey is held.
    Recording,
    /// Waiting for the speech engine and inserting the result.
    Transcribing,
    /// Loading the speech engine at startup.
    LoadingEngine,
    /// A cycle failed; transient, immediately followed by `Idle`.
    Error(String),
}

impl RecordingState {
    /// Whether a new cycle may start.
    pub fn is_idle(&self) -> bool {
        matches!(self, RecordingState::Idle)
    }

    /// Short name for logs.
    pub fn label(&self) -> &'static str {
        match self {
            RecordingState::Idle => "idle",
            RecordingState::Recording => "recording",
            RecordingState::Transcribing => "transcribing",
            RecordingState::LoadingEngine => "loading_engine",
            RecordingState::Error(_) => "error",
        }
    }
}

impl fmt::Display for RecordingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordingState::Error(message) => write!(f, "error: {}", message),
            other => f.write_str(other.label()),
        }
    }
}

/// A state transition, published to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateChange {
    /// Session the transition belongs to, `None` outside a press/release cycle.
    pub session_id: Option<Uuid>,
    /// State before the transition.
    pub from: RecordingState,
    /// State after the transition.
    pub to: RecordingState,
}

/// The in-flight unit of work for one press/release cycle.
#[derive(Debug)]
pub(crate) struct Session {
    pub(crate) id: Uuid,
    /// Running capture, present while recording.
    pub(crate) capture: Option<SessionHandle>,
    /// Recording file, present once capture stopped.
    pub(crate) audio_path: Option<PathBuf>,
}

impl Session {
    pub(crate) fn recording(capture: SessionHandle) -> Self {
        Self {
            id: capture.id(),
            audio_path: None,
            capture: Some(capture),
        }
    }
}

/// Everything guarded by the controller's state lock.
#[derive(Debug)]
pub(crate) struct ControllerState {
    pub(crate) current: RecordingState,
    pub(crate) entered_at: Instant,
    pub(crate) session: Option<Session>,
}

impl Default for ControllerState {
    fn default() -> Self {
        Self {
            current: RecordingState::Idle,
            entered_at: Instant::now(),
            session: None,
        }
    }
}
