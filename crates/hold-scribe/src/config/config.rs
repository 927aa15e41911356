//! Configuration management for hold-scribe.
//!
//! Handles loading and saving TOML configuration files with cross-platform
//! paths, lazy validation, and atomic write operations.

use crate::{
    AppError, AppResult,
    config::{
        AudioConfig, BehaviourConfig, DEFAULT_MODEL_FILE, DEFAULT_MODEL_URL, HotkeyConfig,
        WhisperConfig, default_language, default_use_gpu,
    },
};

use std::{
    fs,
    io::Write,
    panic::Location,
    path::{Path, PathBuf},
    time::Duration,
};

use directories::ProjectDirs;
use error_location::ErrorLocation;
use hold_scribe_core::{ControllerOptions, InsertionOptions, WhisperLoader};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

/// Main configuration struct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Whisper model configuration.
    pub whisper: WhisperConfig,
    /// Audio device configuration.
    #[serde(default)]
    pub audio: AudioConfig,
    /// Application behavior settings.
    #[serde(default)]
    pub behavior: BehaviourConfig,
    /// Push-to-talk chord.
    #[serde(default)]
    pub hotkey: HotkeyConfig,
}

impl Config {
    /// Load configuration from disk, creating default if not found.
    ///
    /// The model path is not validated here. A missing model is downloaded
    /// or reported when the engine first loads, so the tray can come up
    /// without one.
    #[track_caller]
    #[instrument]
    pub fn load() -> AppResult<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            info!("No config found, creating default");
            Self::create_default(&config_path)
        }
    }

    /// Load configuration from an explicit path.
    #[track_caller]
    #[instrument]
    pub(crate) fn load_from(config_path: &Path) -> AppResult<Self> {
        let contents = fs::read_to_string(config_path).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to read config: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        let config: Config = toml::from_str(&contents).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to parse config: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        info!(config_path = ?config_path, "Configuration loaded");

        Ok(config)
    }

    /// Save configuration using atomic write pattern.
    ///
    /// Writes to a temporary file first, then renames to prevent corruption
    /// if the process crashes during the write.
    #[track_caller]
    #[instrument(skip(self))]
    pub(crate) fn save_to(&self, config_path: &Path) -> AppResult<()> {
        let contents = toml::to_string_pretty(self).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to serialize config: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        let temp_path = config_path.with_extension("toml.tmp");

        let mut temp_file = fs::File::create(&temp_path).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to create temp config file: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        temp_file
            .write_all(contents.as_bytes())
            .map_err(|e| AppError::ConfigError {
                reason: format!("Failed to write temp config file: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        temp_file.sync_all().map_err(|e| AppError::ConfigError {
            reason: format!("Failed to sync temp config file: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        fs::rename(&temp_path, config_path).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to rename temp config to final: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        info!(config_path = ?config_path, "Configuration saved (atomic write)");

        Ok(())
    }

    /// Defaults with the model stored under `data_dir`.
    pub(crate) fn with_data_dir(data_dir: &Path) -> Self {
        Self {
            whisper: WhisperConfig {
                model_path: data_dir.join("models").join(DEFAULT_MODEL_FILE),
                model_url: Some(DEFAULT_MODEL_URL.to_string()),
                use_gpu: default_use_gpu(),
                language: default_language(),
            },
            audio: AudioConfig::default(),
            behavior: BehaviourConfig::default(),
            hotkey: HotkeyConfig::default(),
        }
    }

    /// Path of `config.toml` in the platform config directory, created if missing.
    #[track_caller]
    pub(crate) fn config_path() -> AppResult<PathBuf> {
        let proj_dirs = project_dirs()?;
        let config_dir = proj_dirs.config_dir();

        if !config_dir.exists() {
            fs::create_dir_all(config_dir)?;
            debug!(config_dir = ?config_dir, "Created config directory");
        }

        Ok(config_dir.join("config.toml"))
    }

    /// Directory for in-flight recordings.
    pub(crate) fn scratch_dir(&self) -> PathBuf {
        self.audio
            .scratch_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("hold-scribe"))
    }

    /// Clipboard insertion behaviour.
    pub(crate) fn insertion_options(&self) -> InsertionOptions {
        InsertionOptions {
            auto_paste: self.behavior.auto_paste,
            restore_clipboard: self.behavior.restore_clipboard,
            restore_delay: Duration::from_millis(self.behavior.restore_delay_ms),
            ..InsertionOptions::default()
        }
    }

    /// Controller switches.
    pub(crate) fn controller_options(&self) -> ControllerOptions {
        ControllerOptions {
            earcons: self.behavior.earcons,
        }
    }

    /// Engine loader for the configured model.
    pub(crate) fn whisper_loader(&self) -> WhisperLoader {
        WhisperLoader::new(&self.whisper.model_path)
            .with_model_url(self.whisper.model_url.clone())
            .with_gpu(self.whisper.use_gpu)
            .with_language(self.whisper.language.clone())
    }

    #[track_caller]
    fn create_default(config_path: &Path) -> AppResult<Self> {
        let proj_dirs = project_dirs()?;
        let config = Self::with_data_dir(proj_dirs.data_dir());

        config.save_to(config_path)?;

        warn!(
            model_path = ?config.whisper.model_path,
            "Default config created. The Whisper model is downloaded on first use."
        );

        Ok(config)
    }
}

/// Platform directories for hold-scribe.
#[track_caller]
pub(crate) fn project_dirs() -> AppResult<ProjectDirs> {
    ProjectDirs::from("com", "hold-scribe", "Hold-Scribe").ok_or_else(|| AppError::ConfigError {
        reason: "Failed to get project directories".to_string(),
        location: ErrorLocation::from(Location::caller()),
    })
}
