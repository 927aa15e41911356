mod audio_config;
mod behaviour_config;
#[allow(clippy::module_inception)]
mod config;
mod hotkey_config;
mod whisper_config;

pub(crate) use {
    audio_config::AudioConfig, behaviour_config::BehaviourConfig, config::Config,
    config::project_dirs, hotkey_config::HotkeyConfig, whisper_config::WhisperConfig,
};

pub(crate) const DEFAULT_AUTO_PASTE: bool = true;
pub(crate) const DEFAULT_RESTORE_CLIPBOARD: bool = true;
pub(crate) const DEFAULT_RESTORE_DELAY_MS: u64 = 500;
pub(crate) const DEFAULT_EARCONS: bool = true;
pub(crate) const DEFAULT_CHORD: &str = "ctrl+shift+Space";
pub(crate) const DEFAULT_LANGUAGE: &str = "en";
pub(crate) const DEFAULT_MODEL_FILE: &str = "ggml-base.en.bin";
pub(crate) const DEFAULT_MODEL_URL: &str =
    "https://huggingface.co/ggerganov/whisper.cpp/resolve/main/ggml-base.en.bin";

pub(crate) fn default_auto_paste() -> bool {
    DEFAULT_AUTO_PASTE
}

pub(crate) fn default_restore_clipboard() -> bool {
    DEFAULT_RESTORE_CLIPBOARD
}

pub(crate) fn default_restore_delay_ms() -> u64 {
    DEFAULT_RESTORE_DELAY_MS
}

pub(crate) fn default_earcons() -> bool {
    DEFAULT_EARCONS
}

pub(crate) fn default_chord() -> String {
    DEFAULT_CHORD.to_string()
}

pub(crate) fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

pub(crate) fn default_use_gpu() -> bool {
    true
}
