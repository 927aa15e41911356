use hold_scribe_core::RecordingState;

/// Tray icon states corresponding to the controller's states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrayIconState {
    /// Ready to start recording.
    Idle,
    /// Currently recording audio.
    Recording,
    /// Transcribing and inserting.
    Processing,
    /// Loading the speech engine.
    Loading,
    /// The last cycle failed.
    Error,
}

impl TrayIconState {
    /// Fill colour of the tray glyph, RGB.
    pub(crate) fn color(self) -> [u8; 3] {
        match self {
            TrayIconState::Idle => [0x8a, 0x8f, 0x98],
            TrayIconState::Recording => [0xe0, 0x3c, 0x31],
            TrayIconState::Processing => [0xf2, 0xa9, 0x00],
            TrayIconState::Loading => [0x3b, 0x82, 0xf6],
            TrayIconState::Error => [0x7c, 0x1d, 0x1d],
        }
    }

    /// Tooltip and status line text.
    pub(crate) fn tooltip(self) -> &'static str {
        match self {
            TrayIconState::Idle => "Hold-Scribe - Ready",
            TrayIconState::Recording => "Hold-Scribe - Recording...",
            TrayIconState::Processing => "Hold-Scribe - Transcribing...",
            TrayIconState::Loading => "Hold-Scribe - Loading speech model...",
            TrayIconState::Error => "Hold-Scribe - Something went wrong",
        }
    }
}

impl From<&RecordingState> for TrayIconState {
    fn from(state: &RecordingState) -> Self {
        match state {
            RecordingState::Idle => TrayIconState::Idle,
            RecordingState::Recording => TrayIconState::Recording,
            RecordingState::Transcribing => TrayIconState::Processing,
            RecordingState::LoadingEngine => TrayIconState::Loading,
            RecordingState::Error(_) => TrayIconState::Error,
        }
    }
}
