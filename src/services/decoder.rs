//! WAV decoding via hound
//!
//! Accepts RIFF/WAVE input with 8/16/24/32-bit integer or 32-bit float
//! samples, mono or stereo. Decoding runs on the blocking thread pool.

use std::io::Cursor;

use async_trait::async_trait;
use hound::{SampleFormat, WavReader};

use crate::engine::{ChannelLayout, PcmBuffer};
use crate::error::{Result, WavconvError};
use crate::services::Decoder;

/// Decoder for RIFF/WAVE files
#[derive(Debug, Clone, Copy, Default)]
pub struct WavDecoder;

#[async_trait]
impl Decoder for WavDecoder {
    async fn decode(&self, name: &str, bytes: Vec<u8>) -> Result<PcmBuffer> {
        let owned_name = name.to_string();
        tokio::task::spawn_blocking(move || decode_wav(&owned_name, &bytes))
            .await
            .map_err(|e| WavconvError::DecodeFailed {
                name: name.to_string(),
                reason: format!("decoder task failed: {}", e),
            })?
    }
}

/// Decode an in-memory WAV file
pub fn decode_wav(name: &str, bytes: &[u8]) -> Result<PcmBuffer> {
    let failed = |reason: String| WavconvError::DecodeFailed {
        name: name.to_string(),
        reason,
    };

    let reader = WavReader::new(Cursor::new(bytes))
        .map_err(|e| failed(format!("not a WAV file: {}", e)))?;

    let spec = reader.spec();
    let layout = ChannelLayout::from_count(spec.channels as usize).ok_or_else(|| {
        failed(format!(
            "{}-channel audio (only mono/stereo supported)",
            spec.channels
        ))
    })?;

    let samples = read_samples_as_f32(reader, spec.bits_per_sample, spec.sample_format)
        .map_err(failed)?;

    PcmBuffer::from_interleaved(&samples, layout, spec.sample_rate)
        .map_err(|e| failed(e.to_string()))
}

fn read_samples_as_f32<R: std::io::Read>(
    mut reader: WavReader<R>,
    bits_per_sample: u16,
    sample_format: SampleFormat,
) -> std::result::Result<Vec<f32>, String> {
    let collected: std::result::Result<Vec<f32>, hound::Error> = match (sample_format, bits_per_sample) {
        (SampleFormat::Float, 32) => reader.samples::<f32>().collect(),
        // hound shifts unsigned 8-bit data to signed
        (SampleFormat::Int, 8) => reader
            .samples::<i8>()
            .map(|s| s.map(|v| v as f32 / 128.0))
            .collect(),
        (SampleFormat::Int, 16) => reader
            .samples::<i16>()
            .map(|s| s.map(|v| v as f32 / 32768.0))
            .collect(),
        (SampleFormat::Int, 24) => reader
            .samples::<i32>()
            .map(|s| s.map(|v| v as f32 / 8388608.0))
            .collect(),
        (SampleFormat::Int, 32) => reader
            .samples::<i32>()
            .map(|s| s.map(|v| v as f32 / 2147483648.0))
            .collect(),
        (format, bits) => return Err(format!("unsupported {:?} sample width {}", format, bits)),
    };

    collected.map_err(|e| format!("failed to read samples: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use hound::{WavSpec, WavWriter};

    fn wav_bytes(channels: u16, bits: u16, samples: &[i32]) -> Vec<u8> {
        let spec = WavSpec {
            channels,
            sample_rate: 8000,
            bits_per_sample: bits,
            sample_format: SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = WavWriter::new(&mut cursor, spec).unwrap();
            for &s in samples {
                writer.write_sample(s).unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn test_decode_mono_16bit() {
        let bytes = wav_bytes(1, 16, &[0, 16384, -32768]);
        let buffer = decode_wav("tone.wav", &bytes).unwrap();

        assert_eq!(buffer.num_channels(), 1);
        assert_eq!(buffer.sample_rate(), 8000);
        let ch = buffer.channel(0).unwrap();
        assert_relative_eq!(ch[1], 0.5);
        assert_relative_eq!(ch[2], -1.0);
    }

    #[test]
    fn test_decode_stereo_deinterleaves() {
        let bytes = wav_bytes(2, 16, &[100, -100, 200, -200]);
        let buffer = decode_wav("st.wav", &bytes).unwrap();

        assert_eq!(buffer.num_channels(), 2);
        assert_eq!(buffer.len(), 2);
        assert!(buffer.channel(0).unwrap().iter().all(|&s| s > 0.0));
        assert!(buffer.channel(1).unwrap().iter().all(|&s| s < 0.0));
    }

    #[test]
    fn test_decode_8bit() {
        let bytes = wav_bytes(1, 8, &[0, 64, -128]);
        let buffer = decode_wav("lofi.wav", &bytes).unwrap();
        assert_relative_eq!(buffer.channel(0).unwrap()[1], 0.5);
    }

    #[test]
    fn test_decode_garbage_fails() {
        let result = decode_wav("song.mp3", b"ID3\x04\x00not a riff file");
        match result {
            Err(WavconvError::DecodeFailed { name, .. }) => assert_eq!(name, "song.mp3"),
            other => panic!("Expected DecodeFailed, got: {:?}", other),
        }
    }

    #[test]
    fn test_decode_rejects_multichannel() {
        let bytes = wav_bytes(3, 16, &[0, 0, 0]);
        assert!(matches!(
            decode_wav("surround.wav", &bytes),
            Err(WavconvError::DecodeFailed { .. })
        ));
    }

    #[tokio::test]
    async fn test_async_decode() {
        let bytes = wav_bytes(1, 16, &[0; 80]);
        let buffer = WavDecoder.decode("a.wav", bytes).await.unwrap();
        assert_eq!(buffer.len(), 80);
    }
}
