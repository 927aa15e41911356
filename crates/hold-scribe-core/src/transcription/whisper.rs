use crate::{
    EngineError, EngineResult, TARGET_SAMPLE_RATE,
    transcription::{EngineLoader, SpeechEngine},
};

use std::{
    fs,
    io::Write,
    panic::Location,
    path::{Path, PathBuf},
    sync::Arc,
};

use async_trait::async_trait;
use error_location::ErrorLocation;
use tracing::{debug, info, instrument};
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

/// Markers whisper emits for silence instead of an empty transcript.
const BLANK_MARKERS: &[&str] = &["[BLANK_AUDIO]", "[ Silence ]", "(silence)"];

/// Loads a whisper.cpp model from disk, downloading it first when missing.
#[derive(Debug, Clone)]
pub struct WhisperLoader {
    model_path: PathBuf,
    model_url: Option<String>,
    use_gpu: bool,
    language: String,
}

impl WhisperLoader {
    /// Loader for the model at `model_path`, English, GPU enabled, no download source.
    pub fn new<P: Into<PathBuf>>(model_path: P) -> Self {
        Self {
            model_path: model_path.into(),
            model_url: None,
            use_gpu: true,
            language: "en".to_string(),
        }
    }

    /// URL to fetch the model from when the file does not exist.
    pub fn with_model_url(mut self, url: Option<String>) -> Self {
        self.model_url = url;
        self
    }

    /// Use a GPU backend if one was compiled in.
    pub fn with_gpu(mut self, use_gpu: bool) -> Self {
        self.use_gpu = use_gpu;
        self
    }

    /// Spoken language hint passed to whisper (`"auto"` to detect).
    pub fn with_language<S: Into<String>>(mut self, language: S) -> Self {
        self.language = language.into();
        self
    }
}

#[async_trait]
impl EngineLoader for WhisperLoader {
    #[instrument(skip(self), fields(model_path = ?self.model_path))]
    async fn load(&self) -> EngineResult<Arc<dyn SpeechEngine>> {
        let loader = self.clone();

        tokio::task::spawn_blocking(move || {
            ensure_model(&loader.model_path, loader.model_url.as_deref())?;
            let engine = WhisperEngine::new(&loader.model_path, loader.use_gpu, loader.language)?;
            Ok(Arc::new(engine) as Arc<dyn SpeechEngine>)
        })
        .await
        .map_err(|e| EngineError::EngineUnavailable {
            reason: format!("Model load task failed: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?
    }
}

struct WhisperEngine {
    ctx: WhisperContext,
    language: String,
}

impl WhisperEngine {
    #[track_caller]
    fn new(path: &Path, use_gpu: bool, language: String) -> EngineResult<Self> {
        let path_str = path.to_str().ok_or_else(|| EngineError::ModelNotFound {
            path: path.to_path_buf(),
            location: ErrorLocation::from(Location::caller()),
        })?;

        let mut params = WhisperContextParameters::default();
        params.use_gpu(use_gpu);

        let ctx = WhisperContext::new_with_params(path_str, params).map_err(|e| {
            EngineError::EngineUnavailable {
                reason: format!("Failed to load whisper model: {}", e),
                location: ErrorLocation::from(Location::caller()),
            }
        })?;

        info!(model_path = ?path, use_gpu, "Whisper model loaded");

        Ok(Self { ctx, language })
    }
}

impl SpeechEngine for WhisperEngine {
    #[instrument(skip(self))]
    fn transcribe(&self, recording: &Path) -> EngineResult<String> {
        let samples = read_recording(recording)?;
        if samples.is_empty() {
            debug!("Empty recording, nothing to transcribe");
            return Ok(String::new());
        }

        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
        let language = (self.language != "auto").then_some(self.language.as_str());
        params.set_language(language);
        params.set_print_progress(false);
        params.set_print_special(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);
        params.set_suppress_blank(true);
        params.set_suppress_nst(true);

        let mut state = self
            .ctx
            .create_state()
            .map_err(|e| EngineError::TranscriptionFailed {
                source: Box::new(e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        state
            .full(params, &samples)
            .map_err(|e| EngineError::TranscriptionFailed {
                source: Box::new(e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        let segment_count = state.full_n_segments();
        let mut text = String::new();

        for i in 0..segment_count {
            let segment = state
                .get_segment(i)
                .ok_or_else(|| EngineError::TranscriptionFailed {
                    source: format!("Failed to get segment {}", i).into(),
                    location: ErrorLocation::from(Location::caller()),
                })?;

            let segment = segment.to_string();
            let segment = segment.trim();
            if BLANK_MARKERS.contains(&segment) {
                continue;
            }
            if !text.is_empty() {
                text.push(' ');
            }
            text.push_str(segment);
        }

        debug!(
            sample_count = samples.len(),
            segment_count = segment_count,
            text_len = text.len(),
            "Inference finished"
        );

        Ok(text)
    }
}

/// Read a 16kHz mono 16-bit WAV recording into normalized `f32` samples.
#[track_caller]
pub(crate) fn read_recording(path: &Path) -> EngineResult<Vec<f32>> {
    let invalid = |reason: String| EngineError::InvalidRecording {
        path: path.to_path_buf(),
        reason,
        location: ErrorLocation::from(Location::caller()),
    };

    let reader = hound::WavReader::open(path).map_err(|e| invalid(e.to_string()))?;
    let spec = reader.spec();

    if spec.channels != 1 || spec.sample_rate != TARGET_SAMPLE_RATE || spec.bits_per_sample != 16
    {
        return Err(invalid(format!(
            "Expected {}Hz mono 16-bit PCM, got {}Hz {} channel(s) {}-bit",
            TARGET_SAMPLE_RATE, spec.sample_rate, spec.channels, spec.bits_per_sample
        )));
    }

    reader
        .into_samples::<i16>()
        .map(|sample| {
            sample
                .map(|s| f32::from(s) / 32_768.0)
                .map_err(|e| invalid(e.to_string()))
        })
        .collect()
}

/// Make sure the model file exists, downloading it from `url` if it does not.
///
/// Returns `true` when a download happened. Connection failures are reported
/// as [`EngineError::NetworkUnreachable`].
#[track_caller]
#[instrument]
pub(crate) fn ensure_model(model_path: &Path, url: Option<&str>) -> EngineResult<bool> {
    if model_path.exists() {
        debug!("Model already present");
        return Ok(false);
    }

    let Some(url) = url else {
        return Err(EngineError::ModelNotFound {
            path: model_path.to_path_buf(),
            location: ErrorLocation::from(Location::caller()),
        });
    };

    let unavailable = |reason: String| EngineError::EngineUnavailable {
        reason,
        location: ErrorLocation::from(Location::caller()),
    };

    if let Some(parent) = model_path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| unavailable(format!("Failed to create model directory: {}", e)))?;
    }

    info!(url, "Downloading speech model");

    let response = reqwest::blocking::get(url).map_err(|e| {
        if e.is_connect() || e.is_timeout() {
            EngineError::NetworkUnreachable {
                reason: format!("Could not reach {}: {}", url, e),
                location: ErrorLocation::from(Location::caller()),
            }
        } else {
            unavailable(format!("Model download failed: {}", e))
        }
    })?;

    if !response.status().is_success() {
        return Err(unavailable(format!(
            "Model download returned status {}",
            response.status()
        )));
    }

    let bytes = response.bytes().map_err(|e| EngineError::NetworkUnreachable {
        reason: format!("Connection dropped while downloading model: {}", e),
        location: ErrorLocation::from(Location::caller()),
    })?;

    // Write next to the target and rename, so a partial download never looks
    // like a model.
    let partial = model_path.with_extension("part");
    let write = || -> std::io::Result<()> {
        let mut file = fs::File::create(&partial)?;
        file.write_all(&bytes)?;
        file.sync_all()?;
        fs::rename(&partial, model_path)
    };
    if let Err(e) = write() {
        let _ = fs::remove_file(&partial);
        return Err(unavailable(format!("Failed to save model: {}", e)));
    }

    info!(size = bytes.len(), "Speech model downloaded");

    Ok(true)
}
