pub(crate) mod capture;
pub(crate) mod resampler;
mod session;

pub(crate) use resampler::Resampler;

pub use {
    capture::{CaptureDevice, CpalCapture, input_device_ready},
    session::{AudioSession, RecordedAudio, SessionHandle, TARGET_SAMPLE_RATE},
};
