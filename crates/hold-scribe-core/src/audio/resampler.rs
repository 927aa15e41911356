use crate::{AudioError, AudioResult};

use std::panic::Location;

use audioadapter_buffers::direct::InterleavedSlice;
use error_location::ErrorLocation;
use rubato::{Fft, FixedSync, Resampler as RubatoResampler};
use tracing::{debug, instrument};

/// Frames fed to the FFT resampler per call.
const CHUNK_FRAMES: usize = 1024;

/// Mono FFT resampler converting device-rate capture to the engine rate.
pub(crate) struct Resampler {
    inner: Fft<f32>,
    from_rate: u32,
    to_rate: u32,
}

impl Resampler {
    #[track_caller]
    #[instrument]
    pub(crate) fn new(from_rate: u32, to_rate: u32) -> AudioResult<Self> {
        let inner = Fft::<f32>::new(
            from_rate as usize,
            to_rate as usize,
            CHUNK_FRAMES,
            2,
            1,
            FixedSync::Input,
        )
        .map_err(|e| AudioError::ResamplingError {
            reason: format!("Failed to create resampler {}Hz -> {}Hz: {}", from_rate, to_rate, e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        Ok(Self {
            inner,
            from_rate,
            to_rate,
        })
    }

    /// Number of output samples expected for `input_len` input samples.
    pub(crate) fn expected_len(&self, input_len: usize) -> usize {
        (input_len as u64 * u64::from(self.to_rate) / u64::from(self.from_rate)) as usize
    }

    /// Resample a whole recording. The final partial chunk is zero-padded and
    /// the output is trimmed back to the expected length.
    #[track_caller]
    #[instrument(skip(self, samples))]
    pub(crate) fn process(&mut self, samples: &[f32]) -> AudioResult<Vec<f32>> {
        if samples.is_empty() {
            return Ok(Vec::new());
        }

        let expected = self.expected_len(samples.len());
        let mut output = Vec::with_capacity(expected + CHUNK_FRAMES);
        let mut scratch_in = vec![0.0f32; CHUNK_FRAMES];
        let mut scratch_out = vec![0.0f32; self.inner.output_frames_max()];

        for chunk in samples.chunks(CHUNK_FRAMES) {
            scratch_in[..chunk.len()].copy_from_slice(chunk);
            scratch_in[chunk.len()..].fill(0.0);

            let input = InterleavedSlice::new(&scratch_in, 1, CHUNK_FRAMES).map_err(|e| {
                AudioError::ResamplingError {
                    reason: format!("Invalid input buffer: {}", e),
                    location: ErrorLocation::from(Location::caller()),
                }
            })?;

            let out_frames = scratch_out.len();
            let mut out = InterleavedSlice::new_mut(&mut scratch_out, 1, out_frames).map_err(
                |e| AudioError::ResamplingError {
                    reason: format!("Invalid output buffer: {}", e),
                    location: ErrorLocation::from(Location::caller()),
                },
            )?;

            let (_, written) = self
                .inner
                .process_into_buffer(&input, &mut out, None)
                .map_err(|e| AudioError::ResamplingError {
                    reason: format!("Resampling failed: {}", e),
                    location: ErrorLocation::from(Location::caller()),
                })?;

            output.extend_from_slice(&scratch_out[..written]);
        }

        output.truncate(expected);

        debug!(
            input_len = samples.len(),
            output_len = output.len(),
            from_rate = self.from_rate,
            to_rate = self.to_rate,
            "Resampled recording"
        );

        Ok(output)
    }
}
