use crate::config::{
    default_auto_paste, default_earcons, default_restore_clipboard, default_restore_delay_ms,
};

use serde::{Deserialize, Serialize};

/// Application behavior configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BehaviourConfig {
    /// Whether to paste the transcript at the cursor. When off it is only copied.
    #[serde(default = "default_auto_paste")]
    pub auto_paste: bool,

    /// Whether to put the previous clipboard contents back after pasting.
    #[serde(default = "default_restore_clipboard")]
    pub restore_clipboard: bool,

    /// Delay before the clipboard is restored, in milliseconds.
    #[serde(default = "default_restore_delay_ms")]
    pub restore_delay_ms: u64,

    /// Play a short sound when recording starts and stops.
    #[serde(default = "default_earcons")]
    pub earcons: bool,
}

impl Default for BehaviourConfig {
    fn default() -> Self {
        Self {
            auto_paste: default_auto_paste(),
            restore_clipboard: default_restore_clipboard(),
            restore_delay_ms: default_restore_delay_ms(),
            earcons: default_earcons(),
        }
    }
}
