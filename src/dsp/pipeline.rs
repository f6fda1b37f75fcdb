//! Transcoding pipeline
//!
//! Resample → channel reduction → peak normalization, then quantization
//! and WAV encoding. The order is fixed: normalization sees the final
//! channel layout.

use log::debug;

use crate::dsp::channels::reduce_channels;
use crate::dsp::normalize::{normalize, NormalizeOutcome};
use crate::dsp::quantize::quantize_buffer;
use crate::engine::{encode_wav, ConversionConfig, PcmBuffer};
use crate::error::Result;
use crate::services::Resampler;

/// Produce a ready-to-encode buffer from a decoded one
///
/// Resampling failures are returned unchanged.
pub async fn transcode(
    raw: PcmBuffer,
    config: &ConversionConfig,
    resampler: &dyn Resampler,
) -> Result<PcmBuffer> {
    let resampled = resampler.resample(raw, config.sample_rate).await?;
    let reduced = reduce_channels(resampled, config.channel_mode);
    let (normalized, outcome) = normalize(reduced);

    match outcome {
        NormalizeOutcome::Scaled { gain } => debug!("Normalized with gain {:.3}", gain),
        NormalizeOutcome::AlreadyFullScale { peak } => {
            debug!("Peak {:.3} already at full scale", peak)
        }
        NormalizeOutcome::SilentBufferNoOp => {}
    }

    Ok(normalized)
}

/// Quantize a transcoded buffer and wrap it in a WAV container
pub fn render_wav(buffer: &PcmBuffer, bytes_per_sample: u16) -> Result<Vec<u8>> {
    let data = quantize_buffer(buffer, bytes_per_sample)?;
    Ok(encode_wav(
        &data,
        buffer.num_channels() as u16,
        buffer.sample_rate(),
        bytes_per_sample,
    ))
}

/// Full conversion of a decoded buffer into WAV file bytes
///
/// The configuration is validated before any work is done.
pub async fn convert(
    raw: PcmBuffer,
    config: &ConversionConfig,
    resampler: &dyn Resampler,
) -> Result<Vec<u8>> {
    config.validate()?;
    let transcoded = transcode(raw, config, resampler).await?;
    render_wav(&transcoded, config.bytes_per_sample)
}
