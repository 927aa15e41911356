use crate::config::{default_language, default_use_gpu};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Whisper model configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhisperConfig {
    /// Path to the Whisper model file (e.g., ggml-base.en.bin).
    pub model_path: PathBuf,

    /// Where to download the model from when `model_path` does not exist.
    #[serde(default)]
    pub model_url: Option<String>,

    /// Use GPU for inference if a GPU backend was compiled in (Metal/Vulkan).
    #[serde(default = "default_use_gpu")]
    pub use_gpu: bool,

    /// Spoken language code, or `auto` to detect.
    #[serde(default = "default_language")]
    pub language: String,
}
