use std::path::PathBuf;

use error_location::ErrorLocation;
use thiserror::Error;

/// Audio capture and recording-file errors with source location tracking.
#[derive(Error, Debug)]
pub enum AudioError {
    /// The capture device could not be opened, or failed while recording.
    #[error("Audio device unavailable: {reason} {location}")]
    DeviceUnavailable {
        /// Description of the device failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The OS refused microphone access.
    #[error("Microphone permission denied {location}")]
    PermissionDenied {
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// `stop` was called without a matching successful `start`.
    #[error("No active recording session {location}")]
    NoActiveSession {
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// `start` was called while another recording is still running.
    #[error("A recording session is already active {location}")]
    SessionActive {
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The recording could not be written to the scratch directory.
    #[error("Failed to write recording {path:?}: {reason} {location}")]
    RecordingWriteFailed {
        /// Path of the recording file.
        path: PathBuf,
        /// Description of the write failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Audio resampling failed.
    #[error("Resampling error: {reason} {location}")]
    ResamplingError {
        /// Description of the resampling error.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },
}

/// Speech engine load and inference errors.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The engine needed a remote resource and the network could not be reached.
    #[error("Network unreachable: {reason} {location}")]
    NetworkUnreachable {
        /// Description of the connection failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Whisper model file not found and no download source configured.
    #[error("Model not found at path: {path:?} {location}")]
    ModelNotFound {
        /// Path to the missing model file.
        path: PathBuf,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The engine could not be initialized.
    #[error("Engine unavailable: {reason} {location}")]
    EngineUnavailable {
        /// Description of the load failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The recording handed to the engine is unreadable or in the wrong format.
    #[error("Invalid recording {path:?}: {reason} {location}")]
    InvalidRecording {
        /// Path to the recording.
        path: PathBuf,
        /// Description of the problem.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Inference failed.
    #[error("Transcription failed: {source} {location}")]
    TranscriptionFailed {
        /// Underlying error from the engine.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
        /// Source location where error occurred.
        location: ErrorLocation,
    },
}

impl EngineError {
    /// Whether this failure was caused by missing network connectivity.
    pub fn is_network(&self) -> bool {
        matches!(self, EngineError::NetworkUnreachable { .. })
    }
}

/// Clipboard and paste-synthesis errors.
#[derive(Error, Debug)]
pub enum InsertionError {
    /// The OS refused the synthetic paste (trust revoked, secure input field, ...).
    #[error("Paste injection blocked: {reason} {location}")]
    InjectionBlocked {
        /// Description of the refusal.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Input injection is not trusted by the OS.
    #[error("Input injection permission denied {location}")]
    PermissionDenied {
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Reading or writing the system clipboard failed.
    #[error("Clipboard error: {reason} {location}")]
    ClipboardError {
        /// Description of the clipboard failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },
}

/// Result type alias using [`AudioError`].
pub type AudioResult<T> = std::result::Result<T, AudioError>;

/// Result type alias using [`EngineError`].
pub type EngineResult<T> = std::result::Result<T, EngineError>;

/// Result type alias using [`InsertionError`].
pub type InsertionResult<T> = std::result::Result<T, InsertionError>;
