mod gateway;
mod whisper;

#[cfg(test)]
pub(crate) use whisper::{ensure_model, read_recording};

pub use {
    gateway::{EngineLoader, SpeechEngine, TranscriptionGateway},
    whisper::WhisperLoader,
};
