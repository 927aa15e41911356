use crate::{
    AudioError, AudioResult,
    audio::{CaptureDevice, Resampler},
};

use std::{
    fs,
    panic::Location,
    path::{Path, PathBuf},
    time::Instant,
};

use error_location::ErrorLocation;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Sample rate of every recording handed to the transcription engine.
pub const TARGET_SAMPLE_RATE: u32 = 16_000;

/// Identifies one started recording.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionHandle {
    id: Uuid,
    path: PathBuf,
    started_at: Instant,
}

impl SessionHandle {
    /// Unique id of this recording, also used in the file name.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Path the recording will be written to on `stop`.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// When capture began.
    pub fn started_at(&self) -> Instant {
        self.started_at
    }
}

/// A finished recording on disk.
///
/// Owning this value means owning the file. [`AudioSession::discard`]
/// consumes it; if it is dropped instead, the file is still removed.
#[derive(Debug)]
pub struct RecordedAudio {
    path: PathBuf,
    sample_count: usize,
    removed: bool,
}

impl RecordedAudio {
    /// Location of the WAV file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of mono samples at [`TARGET_SAMPLE_RATE`].
    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    /// Whether no frames were captured.
    pub fn is_empty(&self) -> bool {
        self.sample_count == 0
    }

    fn remove(&mut self) -> std::io::Result<()> {
        self.removed = true;
        match fs::remove_file(&self.path) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

impl Drop for RecordedAudio {
    fn drop(&mut self) {
        if !self.removed {
            if let Err(e) = self.remove() {
                warn!(path = ?self.path, error = %e, "Failed to remove recording on drop");
            }
        }
    }
}

/// Lifecycle of one recording: start, stop into a temp WAV file, discard.
pub struct AudioSession {
    device: Box<dyn CaptureDevice>,
    scratch_dir: PathBuf,
    active: Option<SessionHandle>,
}

impl AudioSession {
    /// Create a session that records from `device` into files under `scratch_dir`.
    pub fn new<P: Into<PathBuf>>(device: Box<dyn CaptureDevice>, scratch_dir: P) -> Self {
        Self {
            device,
            scratch_dir: scratch_dir.into(),
            active: None,
        }
    }

    /// Whether a recording is currently running.
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Allocate a fresh recording path and begin capture.
    ///
    /// # Errors
    ///
    /// Returns `SessionActive` if a recording is already running, or the
    /// device error if capture cannot begin.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn start(&mut self) -> AudioResult<SessionHandle> {
        if self.active.is_some() {
            return Err(AudioError::SessionActive {
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let id = Uuid::new_v4();
        let handle = SessionHandle {
            id,
            path: self.scratch_dir.join(format!("recording-{}.wav", id)),
            started_at: Instant::now(),
        };

        self.device.start()?;
        self.active = Some(handle.clone());

        info!(session_id = %id, path = ?handle.path, "Recording started");

        Ok(handle)
    }

    /// Halt capture and write the recording as 16kHz mono PCM.
    ///
    /// Calling this without a matching `start` returns `NoActiveSession` and
    /// leaves the device untouched. On any other failure no file is left behind.
    #[track_caller]
    #[instrument(skip(self), fields(session_id = %handle.id))]
    pub fn stop(&mut self, handle: &SessionHandle) -> AudioResult<RecordedAudio> {
        match &self.active {
            Some(active) if active.id == handle.id => {}
            _ => {
                return Err(AudioError::NoActiveSession {
                    location: ErrorLocation::from(Location::caller()),
                });
            }
        }
        self.active = None;

        let captured = self.device.stop()?;
        let device_rate = self.device.sample_rate();

        let samples = if device_rate == TARGET_SAMPLE_RATE || captured.is_empty() {
            captured
        } else {
            Resampler::new(device_rate, TARGET_SAMPLE_RATE)?.process(&captured)?
        };

        let mut recording = RecordedAudio {
            path: handle.path.clone(),
            sample_count: samples.len(),
            removed: false,
        };

        if let Err(reason) = write_wav(&recording.path, &samples) {
            let _ = recording.remove();
            return Err(AudioError::RecordingWriteFailed {
                path: handle.path.clone(),
                reason,
                location: ErrorLocation::from(Location::caller()),
            });
        }

        info!(
            duration_ms = handle.started_at.elapsed().as_millis(),
            sample_count = recording.sample_count,
            "Recording stopped"
        );

        Ok(recording)
    }

    /// Delete a finished recording.
    #[instrument(skip(self, recording), fields(path = ?recording.path))]
    pub fn discard(&self, mut recording: RecordedAudio) {
        match recording.remove() {
            Ok(()) => debug!("Recording discarded"),
            Err(e) => warn!(error = %e, "Failed to delete recording"),
        }
    }
}

fn write_wav(path: &Path, samples: &[f32]) -> Result<(), String> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: TARGET_SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec).map_err(|e| e.to_string())?;
    for &sample in samples {
        let pcm = (sample.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16;
        writer.write_sample(pcm).map_err(|e| e.to_string())?;
    }
    writer.finalize().map_err(|e| e.to_string())
}
