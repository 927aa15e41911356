use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Audio device configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Selected input device name (None = default device).
    #[serde(default)]
    pub selected_device: Option<String>,

    /// Directory for in-flight recordings (None = OS temp dir).
    #[serde(default)]
    pub scratch_dir: Option<PathBuf>,
}
