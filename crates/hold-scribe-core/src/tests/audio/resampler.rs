use crate::audio::Resampler;

const INPUT_SAMPLE_RATE: u32 = 48_000;
const OUTPUT_SAMPLE_RATE: u32 = 16_000;
const ONE_SECOND_INPUT_SAMPLES: usize = INPUT_SAMPLE_RATE as usize;
const ONE_SECOND_OUTPUT_SAMPLES: usize = OUTPUT_SAMPLE_RATE as usize;
const TEST_SIGNAL_AMPLITUDE: f32 = 0.5;
const MAX_AMPLITUDE: f32 = 1.5;
/// Output can fall short of the exact ratio by the resampler's delay.
const LENGTH_TOLERANCE: usize = 400;

/// WHAT: Resampler converts 48kHz to about one second at 16kHz
/// WHY: The engine expects 16kHz and recording length is derived from sample count
#[test]
#[allow(clippy::unwrap_used)]
fn given_48khz_audio_when_resampling_to_16khz_then_output_length_approximately_correct() {
    // Given: Resampler configured for 48kHz -> 16kHz
    let mut resampler = Resampler::new(INPUT_SAMPLE_RATE, OUTPUT_SAMPLE_RATE).unwrap();
    let input = vec![TEST_SIGNAL_AMPLITUDE; ONE_SECOND_INPUT_SAMPLES];

    // When: Resampling one second
    let output = resampler.process(&input).unwrap();

    // Then: About one second of output, never more, with finite values
    assert!(output.len() <= ONE_SECOND_OUTPUT_SAMPLES);
    assert!(
        output.len() + LENGTH_TOLERANCE >= ONE_SECOND_OUTPUT_SAMPLES,
        "Expected ~{} samples, got {}",
        ONE_SECOND_OUTPUT_SAMPLES,
        output.len()
    );
    assert!(output.iter().all(|&s| s.is_finite()));
}

/// WHAT: Empty samples return empty output
/// WHY: A zero-length recording must still produce a valid (empty) file
#[test]
#[allow(clippy::unwrap_used)]
fn given_empty_samples_when_resampling_then_empty_output() {
    // Given: A resampler and no input
    let mut resampler = Resampler::new(INPUT_SAMPLE_RATE, OUTPUT_SAMPLE_RATE).unwrap();

    // When: Resampling nothing
    let output = resampler.process(&[]).unwrap();

    // Then: Nothing comes out
    assert!(output.is_empty());
}

/// WHAT: Input shorter than one chunk is padded without overshooting
/// WHY: Very short taps on the hotkey produce less than a chunk of audio
#[test]
#[allow(clippy::unwrap_used)]
fn given_partial_chunk_when_resampling_then_output_bounded_by_ratio() {
    // Given: 300 samples at 48kHz
    let mut resampler = Resampler::new(INPUT_SAMPLE_RATE, OUTPUT_SAMPLE_RATE).unwrap();
    let input: Vec<f32> = (0..300).map(|i| (i as f32 * 0.1).sin() * 0.5).collect();

    // When: Resampling
    let output = resampler.process(&input).unwrap();

    // Then: Padding never adds length and amplitude stays bounded
    assert_eq!(resampler.expected_len(input.len()), 100);
    assert!(output.len() <= 100);
    assert!(output.iter().all(|&s| s.abs() < MAX_AMPLITUDE));
}

/// WHAT: 44.1kHz devices are supported
/// WHY: Many consumer microphones default to 44.1kHz
#[test]
#[allow(clippy::unwrap_used)]
fn given_44100hz_input_when_resampling_then_ratio_respected() {
    // Given: A 44.1kHz resampler and two seconds of input
    let mut resampler = Resampler::new(44_100, OUTPUT_SAMPLE_RATE).unwrap();
    let input = vec![0.1f32; 88_200];

    // When: Resampling
    let output = resampler.process(&input).unwrap();

    // Then: About two seconds at 16kHz
    assert!(output.len() <= 32_000);
    assert!(output.len() + LENGTH_TOLERANCE >= 32_000);
}
