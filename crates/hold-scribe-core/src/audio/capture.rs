use crate::{AudioError, AudioResult};

use std::{
    collections::VecDeque,
    panic::Location,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use cpal::{
    Device, Stream, StreamConfig,
    traits::{DeviceTrait, HostTrait, StreamTrait},
};
use error_location::ErrorLocation;
use tracing::{debug, error, info, instrument, warn};

/// Maximum mono samples to buffer (5 minutes at 48kHz).
///
/// Older samples are dropped once the limit is reached, which bounds memory
/// at roughly 58MB for a single recording.
pub(crate) const MAX_BUFFER_SAMPLES: usize = 48_000 * 60 * 5;

/// Time given to an in-flight callback to observe the shutdown flag after the
/// stream is dropped.
const CALLBACK_DRAIN: Duration = Duration::from_millis(5);

/// Lowercase fragments hosts use when the OS refuses microphone access.
const ACCESS_REFUSED_MARKERS: [&str; 4] =
    ["permission", "access denied", "not authorized", "not permitted"];

/// An audio input that produces mono `f32` samples for one recording at a time.
pub trait CaptureDevice: Send {
    /// Open the input and begin capturing.
    fn start(&mut self) -> AudioResult<()>;

    /// Halt capture and return every mono sample captured since `start`.
    ///
    /// Must report [`AudioError::DeviceUnavailable`] if the device failed
    /// while recording.
    fn stop(&mut self) -> AudioResult<Vec<f32>>;

    /// Sample rate of the samples returned by `stop`.
    fn sample_rate(&self) -> u32;
}

/// Capture device backed by CPAL.
///
/// The input device is resolved on every `start`, so a microphone plugged in
/// after launch is picked up and a missing one surfaces as
/// [`AudioError::DeviceUnavailable`] for that cycle only.
pub struct CpalCapture {
    device_name: Option<String>,
    stream: Option<Stream>,
    sample_rate: u32,
    samples: Arc<Mutex<VecDeque<f32>>>,
    /// Set before the stream is dropped so no late callback writes samples.
    shutdown: Arc<AtomicBool>,
    /// Set by the stream error callback (device unplugged, driver reset, ...).
    stream_failed: Arc<AtomicBool>,
}

impl CpalCapture {
    /// Create a capture device for the named input, or the host default when `None`.
    pub fn new(device_name: Option<&str>) -> Self {
        Self {
            device_name: device_name.map(str::to_owned),
            stream: None,
            sample_rate: crate::TARGET_SAMPLE_RATE,
            samples: Arc::new(Mutex::new(VecDeque::new())),
            shutdown: Arc::new(AtomicBool::new(false)),
            stream_failed: Arc::new(AtomicBool::new(false)),
        }
    }

    #[track_caller]
    fn open_device(&self) -> AudioResult<(Device, StreamConfig)> {
        let device = find_input_device(self.device_name.as_deref()).ok_or_else(|| {
            AudioError::DeviceUnavailable {
                reason: match &self.device_name {
                    Some(name) => format!("Input device '{}' not found", name),
                    None => "No default input device".to_string(),
                },
                location: ErrorLocation::from(Location::caller()),
            }
        })?;

        let config = device
            .default_input_config()
            .map_err(|e| device_error("Failed to get input config", e))?;

        Ok((device, config.into()))
    }
}

impl CaptureDevice for CpalCapture {
    #[track_caller]
    #[instrument(skip(self))]
    fn start(&mut self) -> AudioResult<()> {
        let (device, config) = self.open_device()?;
        let channels = usize::from(config.channels.max(1));

        self.shutdown.store(false, Ordering::Release);
        self.stream_failed.store(false, Ordering::Release);
        self.samples
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();

        let samples = Arc::clone(&self.samples);
        let shutdown = Arc::clone(&self.shutdown);
        let stream_failed = Arc::clone(&self.stream_failed);

        let stream = device
            .build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if shutdown.load(Ordering::Acquire) {
                        return;
                    }
                    let mut buf = samples.lock().unwrap_or_else(|e| {
                        error!("Sample buffer lock poisoned, recovering: {}", e);
                        e.into_inner()
                    });
                    // Downmix interleaved frames to mono.
                    buf.extend(
                        data.chunks(channels)
                            .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32),
                    );
                    while buf.len() > MAX_BUFFER_SAMPLES {
                        buf.pop_front();
                    }
                },
                move |err| {
                    error!("Audio stream error: {}", err);
                    stream_failed.store(true, Ordering::Release);
                },
                None,
            )
            .map_err(|e| device_error("Failed to build input stream", e))?;

        stream
            .play()
            .map_err(|e| device_error("Failed to start input stream", e))?;

        self.sample_rate = config.sample_rate;
        self.stream = Some(stream);

        info!(
            sample_rate = self.sample_rate,
            channels = channels,
            "Audio capture started"
        );

        Ok(())
    }

    #[track_caller]
    #[instrument(skip(self))]
    fn stop(&mut self) -> AudioResult<Vec<f32>> {
        self.shutdown.store(true, Ordering::Release);

        let Some(stream) = self.stream.take() else {
            return Err(AudioError::DeviceUnavailable {
                reason: "Capture stream was not running".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        };
        drop(stream);
        std::thread::sleep(CALLBACK_DRAIN);

        let samples: Vec<f32> = self
            .samples
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .drain(..)
            .collect();

        if self.stream_failed.load(Ordering::Acquire) {
            warn!(
                sample_count = samples.len(),
                "Input device failed during recording"
            );
            return Err(AudioError::DeviceUnavailable {
                reason: "Input device disconnected during recording".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        debug!(sample_count = samples.len(), "Audio capture stopped");

        Ok(samples)
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

/// Map a backend failure to `PermissionDenied` when the OS refused access,
/// `DeviceUnavailable` otherwise.
#[track_caller]
pub(crate) fn device_error(context: &str, error: impl std::fmt::Display) -> AudioError {
    let reason = format!("{}: {}", context, error);
    let lowered = reason.to_lowercase();

    if ACCESS_REFUSED_MARKERS
        .iter()
        .any(|marker| lowered.contains(marker))
    {
        warn!(%reason, "Input device access refused");
        AudioError::PermissionDenied {
            location: ErrorLocation::from(Location::caller()),
        }
    } else {
        AudioError::DeviceUnavailable {
            reason,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

/// Whether the named (or default) input device exists and exposes an input
/// configuration. Opening the configuration is enough to trigger the OS
/// microphone prompt on platforms that gate capture behind one.
#[instrument]
pub fn input_device_ready(device_name: Option<&str>) -> bool {
    match find_input_device(device_name) {
        Some(device) => match device.default_input_config() {
            Ok(_) => true,
            Err(e) => {
                debug!(error = %e, "Input device check failed");
                false
            }
        },
        None => false,
    }
}

#[allow(deprecated)]
fn find_input_device(device_name: Option<&str>) -> Option<Device> {
    let host = cpal::default_host();

    match device_name {
        None => host.default_input_device(),
        Some(wanted) => host
            .input_devices()
            .ok()?
            .find(|device| device.name().is_ok_and(|name| name == wanted)),
    }
}
