//! Linear-interpolation resampler

use async_trait::async_trait;

use crate::engine::PcmBuffer;
use crate::error::{Result, WavconvError};
use crate::services::Resampler;

/// Resamples each channel independently by linear interpolation
///
/// Output length is `ceil(len * target / source)`. Buffers already at the
/// target rate are returned as-is.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearResampler;

#[async_trait]
impl Resampler for LinearResampler {
    async fn resample(&self, buffer: PcmBuffer, target_rate: u32) -> Result<PcmBuffer> {
        if target_rate == 0 {
            return Err(WavconvError::ResampleFailed {
                reason: "target sample rate must be positive".to_string(),
            });
        }

        if buffer.sample_rate() == target_rate {
            return Ok(buffer);
        }

        let ratio = target_rate as f64 / buffer.sample_rate() as f64;
        let channels = buffer
            .channels()
            .iter()
            .map(|channel| resample_linear(channel, ratio))
            .collect();

        Ok(PcmBuffer::from_parts(channels, target_rate))
    }
}

fn resample_linear(samples: &[f32], ratio: f64) -> Vec<f32> {
    if samples.is_empty() {
        return Vec::new();
    }

    let source_len = samples.len();
    let target_len = ((source_len as f64) * ratio).ceil() as usize;
    let mut output = Vec::with_capacity(target_len);

    for i in 0..target_len {
        let src_pos = i as f64 / ratio;
        let src_idx = src_pos.floor() as usize;
        let frac = (src_pos - src_idx as f64) as f32;

        let sample = if src_idx + 1 < source_len {
            samples[src_idx] * (1.0 - frac) + samples[src_idx + 1] * frac
        } else if src_idx < source_len {
            samples[src_idx]
        } else {
            0.0
        };

        output.push(sample);
    }

    output
}
