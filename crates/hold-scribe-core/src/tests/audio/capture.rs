use crate::{
    AudioError, CaptureDevice, CpalCapture, TARGET_SAMPLE_RATE,
    audio::capture::{MAX_BUFFER_SAMPLES, device_error},
    input_device_ready,
};

use std::collections::VecDeque;

/// WHAT: Stopping a capture that never started reports the device as unavailable
/// WHY: A stray release must not hand back an empty buffer as if it were a recording
#[test]
fn given_unstarted_capture_when_stopping_then_device_unavailable() {
    // Given: A fresh CPAL capture (no stream opened)
    let mut capture = CpalCapture::new(None);

    // When: Stopping it
    let result = capture.stop();

    // Then: DeviceUnavailable, and the reported rate is still the engine rate
    assert!(matches!(result, Err(AudioError::DeviceUnavailable { .. })));
    assert_eq!(capture.sample_rate(), TARGET_SAMPLE_RATE);
}

/// WHAT: An input device that does not exist is reported as missing
/// WHY: Config can name a microphone that was unplugged since
#[test]
fn given_unknown_device_name_when_checking_then_false() {
    // Given/When: Checking a name no host will ever report
    let found = input_device_ready(Some("hold-scribe test device that does not exist"));

    // Then: Not found
    assert!(!found);
}

/// WHAT: Starting a named device that does not exist fails with DeviceUnavailable
/// WHY: The failure must surface for the current cycle, not at construction
#[test]
fn given_unknown_device_name_when_starting_then_device_unavailable() {
    // Given: Capture bound to a non-existent device
    let mut capture = CpalCapture::new(Some("hold-scribe test device that does not exist"));

    // When: Starting capture
    let result = capture.start();

    // Then: DeviceUnavailable
    assert!(matches!(result, Err(AudioError::DeviceUnavailable { .. })));
}

/// WHAT: A backend error that reports refused access maps to PermissionDenied
/// WHY: The user needs the privacy-settings notice, not a generic device failure
#[test]
fn given_access_refused_backend_error_when_classifying_then_permission_denied() {
    // Given: Backend messages phrased the way hosts report refused access
    let messages = [
        "A backend-specific error has occurred: Permission denied (os error 13)",
        "The operation is not permitted",
        "Client is not authorized to access the microphone",
    ];

    // When/Then: Each becomes PermissionDenied
    for message in messages {
        let error = device_error("Failed to build input stream", message);
        assert!(
            matches!(error, AudioError::PermissionDenied { .. }),
            "{} should map to PermissionDenied",
            message
        );
    }
}

/// WHAT: Any other backend error stays DeviceUnavailable with its context
/// WHY: Unplugged or busy devices are not a privacy problem
#[test]
fn given_device_gone_backend_error_when_classifying_then_device_unavailable() {
    // Given: A disconnect message
    let message = "The requested device is no longer available";

    // When: Classifying it
    let error = device_error("Failed to start input stream", message);

    // Then: DeviceUnavailable carrying context and message
    let AudioError::DeviceUnavailable { reason, .. } = error else {
        unreachable!("disconnects should stay DeviceUnavailable");
    };
    assert_eq!(
        reason,
        "Failed to start input stream: The requested device is no longer available"
    );
}

/// WHAT: Buffer respects MAX_BUFFER_SAMPLES limit
/// WHY: Prevents unbounded memory growth when the hotkey is held for minutes
#[test]
fn given_buffer_at_max_capacity_when_adding_samples_then_oldest_discarded() {
    // Given: A buffer at max capacity filled with 0.0
    let mut buf = VecDeque::with_capacity(MAX_BUFFER_SAMPLES);
    buf.extend(std::iter::repeat_n(0.0f32, MAX_BUFFER_SAMPLES));

    // When: Adding 1024 new samples beyond the limit, trimmed as the callback does
    buf.extend(std::iter::repeat_n(1.0f32, 1024));
    while buf.len() > MAX_BUFFER_SAMPLES {
        buf.pop_front();
    }

    // Then: Length is capped and the newest samples survive
    assert_eq!(buf.len(), MAX_BUFFER_SAMPLES);
    assert!((buf[MAX_BUFFER_SAMPLES - 1] - 1.0).abs() < f32::EPSILON);
    assert!((buf[MAX_BUFFER_SAMPLES - 1024] - 1.0).abs() < f32::EPSILON);
}

/// WHAT: Real microphone capture round trip
/// WHY: Verifies the CPAL stream delivers samples on actual hardware
#[test]
#[allow(clippy::unwrap_used)]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn given_default_microphone_when_capturing_briefly_then_samples_returned() {
    // Given: The default input device
    let mut capture = CpalCapture::new(None);

    // When: Capturing for half a second
    capture.start().unwrap();
    std::thread::sleep(std::time::Duration::from_millis(500));
    let samples = capture.stop().unwrap();

    // Then: Some finite samples arrived at the device rate
    assert!(!samples.is_empty());
    assert!(samples.iter().all(|s| s.is_finite()));
    assert!(capture.sample_rate() > 0);
}
