use crate::{AudioError, EngineError, InsertionError};

/// Fire-and-forget channel for user-visible messages.
pub trait Notifier: Send + Sync {
    /// Show `message` to the user. Must not block.
    fn notify(&self, message: &str);
}

/// Short audio cues around a recording.
pub trait Earcons: Send + Sync {
    /// Capture just began.
    fn recording_started(&self);
    /// Capture just ended.
    fn recording_stopped(&self);
}

pub(crate) const BUSY: &str = "Still working on the previous dictation. Try again in a moment.";

pub(crate) const MICROPHONE_DENIED: &str =
    "Microphone access is denied. Allow it in your system privacy settings, then try again.";

pub(crate) const MICROPHONE_GRANTED: &str =
    "Microphone access granted. Hold the hotkey again to dictate.";

pub(crate) const INJECTION_UNTRUSTED: &str = "Accessibility access is needed to paste \
     transcripts. Allow it in your system privacy settings.";

pub(crate) fn audio_failure(error: &AudioError) -> String {
    match error {
        AudioError::DeviceUnavailable { reason, .. } => {
            format!("Microphone unavailable: {}", reason)
        }
        AudioError::PermissionDenied { .. } => MICROPHONE_DENIED.to_string(),
        AudioError::RecordingWriteFailed { reason, .. } => {
            format!("Could not save the recording: {}", reason)
        }
        AudioError::ResamplingError { .. } => "Could not process the recording.".to_string(),
        AudioError::NoActiveSession { .. } | AudioError::SessionActive { .. } => {
            "Recording got out of step. Please try again.".to_string()
        }
    }
}

pub(crate) fn engine_failure(error: &EngineError) -> String {
    match error {
        EngineError::NetworkUnreachable { .. } => "Network unavailable: the speech model \
             could not be downloaded. Check your connection and try again."
            .to_string(),
        EngineError::ModelNotFound { path, .. } => {
            format!("Speech model not found at {}.", path.display())
        }
        EngineError::EngineUnavailable { .. } => {
            "The speech engine could not be started. Please try again.".to_string()
        }
        EngineError::InvalidRecording { .. } | EngineError::TranscriptionFailed { .. } => {
            "Transcription failed. Please try again.".to_string()
        }
    }
}

pub(crate) fn insertion_failure(error: &InsertionError) -> String {
    match error {
        InsertionError::PermissionDenied { .. } => format!(
            "{} The transcript is on your clipboard.",
            INJECTION_UNTRUSTED
        ),
        InsertionError::InjectionBlocked { .. } => {
            "Could not paste the transcript here. It is on your clipboard.".to_string()
        }
        InsertionError::ClipboardError { .. } => {
            "Could not use the clipboard to insert the transcript.".to_string()
        }
    }
}
