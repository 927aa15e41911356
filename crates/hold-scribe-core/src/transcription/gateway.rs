use crate::{EngineError, EngineResult};

use std::{
    panic::Location,
    path::Path,
    sync::Arc,
    time::Instant,
};

use async_trait::async_trait;
use error_location::ErrorLocation;
use tokio::sync::OnceCell;
use tracing::{info, instrument, warn};

/// A loaded speech-to-text engine.
///
/// `transcribe` blocks for the duration of inference; the gateway always
/// calls it from a blocking worker thread.
pub trait SpeechEngine: Send + Sync {
    /// Transcribe a finite 16kHz mono recording. An empty recording yields an
    /// empty string.
    fn transcribe(&self, recording: &Path) -> EngineResult<String>;
}

/// Produces a [`SpeechEngine`], possibly fetching remote resources first.
#[async_trait]
pub trait EngineLoader: Send + Sync {
    /// Load the engine. May suspend for seconds on first use.
    async fn load(&self) -> EngineResult<Arc<dyn SpeechEngine>>;
}

/// Lazily-loaded, exclusively-owned handle to the speech engine.
///
/// A failed load leaves the gateway unloaded, so the next call retries.
pub struct TranscriptionGateway {
    loader: Box<dyn EngineLoader>,
    engine: OnceCell<Arc<dyn SpeechEngine>>,
}

impl TranscriptionGateway {
    /// Create an unloaded gateway around `loader`.
    pub fn new<L: EngineLoader + 'static>(loader: L) -> Self {
        Self {
            loader: Box::new(loader),
            engine: OnceCell::new(),
        }
    }

    /// Whether the engine has been loaded successfully.
    pub fn is_loaded(&self) -> bool {
        self.engine.initialized()
    }

    /// Load the engine if it is not loaded yet. Idempotent.
    #[instrument(skip(self))]
    pub async fn ensure_loaded(&self) -> EngineResult<()> {
        self.engine().await.map(|_| ())
    }

    /// Transcribe the recording at `recording`, loading the engine first if needed.
    #[instrument(skip(self))]
    pub async fn transcribe(&self, recording: &Path) -> EngineResult<String> {
        let engine = self.engine().await?;
        let path = recording.to_path_buf();

        let start = Instant::now();
        let text = tokio::task::spawn_blocking(move || engine.transcribe(&path))
            .await
            .map_err(|e| EngineError::TranscriptionFailed {
                source: Box::new(e),
                location: ErrorLocation::from(Location::caller()),
            })??;

        info!(
            duration_ms = start.elapsed().as_millis(),
            text_len = text.len(),
            "Transcription complete"
        );

        Ok(text)
    }

    async fn engine(&self) -> EngineResult<Arc<dyn SpeechEngine>> {
        let engine = self
            .engine
            .get_or_try_init(|| async {
                let start = Instant::now();
                match self.loader.load().await {
                    Ok(engine) => {
                        info!(duration_ms = start.elapsed().as_millis(), "Speech engine loaded");
                        Ok(engine)
                    }
                    Err(e) => {
                        warn!(error = %e, "Speech engine load failed");
                        Err(e)
                    }
                }
            })
            .await?;

        Ok(Arc::clone(engine))
    }
}
