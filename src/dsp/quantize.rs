//! Sample quantization
//!
//! Float samples become interleaved fixed-width PCM bytes:
//! - 2 bytes: signed 16-bit little-endian, `sample * 32767` truncated
//! - 1 byte: unsigned 8-bit, `(sample + 1) * 127` truncated
//!
//! Samples are hard-clamped to [-1, 1] first.

use crate::engine::buffer::MAX_CHANNELS;
use crate::engine::PcmBuffer;
use crate::error::{Result, WavconvError};

/// Full-scale value for 16-bit output
const I16_SCALE: f32 = 32767.0;

/// Full-scale value for 8-bit output (zero maps to this code)
const U8_SCALE: f32 = 127.0;

/// Quantize one or two equal-length channels into interleaved PCM bytes
///
/// # Arguments
/// * `channels` - Per-channel samples; only the first two are used
/// * `bytes_per_sample` - 1 (8-bit unsigned) or 2 (16-bit signed LE)
/// * `mix_to_mono` - Average two channels into one instead of interleaving
///
/// # Returns
/// `frames * output_channels * bytes_per_sample` bytes
///
/// # Errors
/// * `UnsupportedSampleWidth` - if `bytes_per_sample` is not 1 or 2
pub fn quantize(channels: &[Vec<f32>], bytes_per_sample: u16, mix_to_mono: bool) -> Result<Vec<u8>> {
    if !matches!(bytes_per_sample, 1 | 2) {
        return Err(WavconvError::UnsupportedSampleWidth { bytes_per_sample });
    }

    let source = &channels[..channels.len().min(MAX_CHANNELS)];
    let frames = source.iter().map(|ch| ch.len()).min().unwrap_or(0);
    let mix = mix_to_mono && source.len() > 1;
    let out_channels = if mix { 1 } else { source.len() };

    let mut out = Vec::with_capacity(frames * out_channels * bytes_per_sample as usize);

    for i in 0..frames {
        if mix {
            let sum: f32 = source.iter().map(|ch| ch[i]).sum();
            push_sample(&mut out, sum / source.len() as f32, bytes_per_sample);
        } else {
            for channel in source {
                push_sample(&mut out, channel[i], bytes_per_sample);
            }
        }
    }

    Ok(out)
}

/// Quantize every channel of a buffer, interleaved in source order
pub fn quantize_buffer(buffer: &PcmBuffer, bytes_per_sample: u16) -> Result<Vec<u8>> {
    quantize(buffer.channels(), bytes_per_sample, false)
}

#[inline]
fn push_sample(out: &mut Vec<u8>, sample: f32, bytes_per_sample: u16) {
    let clipped = sample.clamp(-1.0, 1.0);
    if bytes_per_sample == 2 {
        let value = (clipped * I16_SCALE) as i16;
        out.extend_from_slice(&value.to_le_bytes());
    } else {
        out.push(((clipped + 1.0) * U8_SCALE) as u8);
    }
}
