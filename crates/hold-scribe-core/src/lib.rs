//! Hold-Scribe Core Library
//!
//! Push-to-talk dictation core: a controller that sequences permission
//! checks, audio capture, transcription and clipboard-based text insertion.
//! Every OS-facing collaborator sits behind a trait so the state machine can
//! be driven without hardware.
//!
//! # Example
//!
//! ```no_run
//! use hold_scribe_core::{
//!     AudioSession, ClipboardInserter, Collaborators, ControllerOptions, CpalCapture,
//!     HotkeyEvent, PttController, TranscriptionGateway, WhisperLoader,
//! };
//! # use hold_scribe_core::{ClipboardBackend, InputSynthesizer, Notifier, PermissionGate};
//! # use std::sync::Arc;
//! # async fn run(
//! #     gate: Arc<dyn PermissionGate>,
//! #     clipboard: Box<dyn ClipboardBackend>,
//! #     synthesizer: Arc<dyn InputSynthesizer>,
//! #     notifier: Arc<dyn Notifier>,
//! # ) {
//! let audio = AudioSession::new(Box::new(CpalCapture::new(None)), std::env::temp_dir());
//! let gateway = TranscriptionGateway::new(WhisperLoader::new("models/ggml-base.en.bin"));
//! let inserter = ClipboardInserter::new(clipboard, synthesizer, Default::default());
//!
//! let controller = PttController::new(
//!     Collaborators { gate, audio, gateway, inserter, notifier, earcons: None },
//!     ControllerOptions::default(),
//! );
//!
//! let _ = controller.warm_up();
//!
//! let (events_tx, events_rx) = tokio::sync::mpsc::channel(32);
//! let running = tokio::spawn(controller.run(events_rx));
//!
//! let _ = events_tx.send(HotkeyEvent::Pressed).await;
//! let _ = events_tx.send(HotkeyEvent::Released).await;
//! drop(events_tx);
//! let _ = running.await;
//! # }
//! ```

mod audio;
mod controller;
mod error;
mod insertion;
mod permission;
mod transcription;

pub use {
    audio::{
        AudioSession, CaptureDevice, CpalCapture, RecordedAudio, SessionHandle,
        TARGET_SAMPLE_RATE, input_device_ready,
    },
    controller::{
        Collaborators, ControllerOptions, Earcons, HotkeyEvent, Notifier, PressOutcome,
        PttController, RecordingState, StateChange,
    },
    error::{
        AudioError, AudioResult, EngineError, EngineResult, InsertionError, InsertionResult,
    },
    insertion::{
        ClipboardBackend, ClipboardEntry, ClipboardInserter, ClipboardSnapshot, EntryFormat,
        InputSynthesizer, InsertOutcome, InsertionOptions,
    },
    permission::{MicrophoneTrust, PermissionGate},
    transcription::{EngineLoader, SpeechEngine, TranscriptionGateway, WhisperLoader},
};

#[cfg(test)]
mod tests;
