use crate::config::default_chord;

use serde::{Deserialize, Serialize};

/// Push-to-talk chord configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HotkeyConfig {
    /// Chord in `global-hotkey` syntax, e.g. `ctrl+shift+Space` or `alt+F9`.
    #[serde(default = "default_chord")]
    pub chord: String,
}

impl Default for HotkeyConfig {
    fn default() -> Self {
        Self {
            chord: default_chord(),
        }
    }
}
