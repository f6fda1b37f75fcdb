//! General audio decoding via symphonia
//!
//! RIFF/WAVE input takes the hound path in [`decode_wav`]. Everything else
//! (MP3, AAC/M4A, FLAC, Ogg Vorbis, AIFF) is probed by symphonia, using the
//! file name's extension as a hint.

use std::io::Cursor;
use std::path::Path;

use async_trait::async_trait;
use log::debug;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::default::{get_codecs, get_probe};

use crate::engine::{ChannelLayout, PcmBuffer};
use crate::error::{Result, WavconvError};
use crate::services::decoder::decode_wav;
use crate::services::Decoder;

/// Decoder for any container/codec pair symphonia supports
#[derive(Debug, Clone, Copy, Default)]
pub struct AudioDecoder;

#[async_trait]
impl Decoder for AudioDecoder {
    async fn decode(&self, name: &str, bytes: Vec<u8>) -> Result<PcmBuffer> {
        let owned_name = name.to_string();
        tokio::task::spawn_blocking(move || decode_audio(&owned_name, bytes))
            .await
            .map_err(|e| WavconvError::DecodeFailed {
                name: name.to_string(),
                reason: format!("decoder task failed: {}", e),
            })?
    }
}

/// Check for a RIFF/WAVE header
fn is_riff_wave(bytes: &[u8]) -> bool {
    bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WAVE"
}

/// Decode an in-memory audio file of any supported format
pub fn decode_audio(name: &str, bytes: Vec<u8>) -> Result<PcmBuffer> {
    if is_riff_wave(&bytes) {
        return decode_wav(name, &bytes);
    }
    decode_with_symphonia(name, bytes)
}

/// Decode the first audio track of `bytes` with symphonia
pub fn decode_with_symphonia(name: &str, bytes: Vec<u8>) -> Result<PcmBuffer> {
    let failed = |reason: String| WavconvError::DecodeFailed {
        name: name.to_string(),
        reason,
    };

    let mut hint = Hint::new();
    if let Some(ext) = Path::new(name).extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes)), Default::default());
    let probed = get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| failed(format!("unrecognized format: {}", e)))?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| failed("no supported audio tracks".to_string()))?;
    let track_id = track.id;
    let params = track.codec_params.clone();

    let mut decoder = get_codecs()
        .make(&params, &DecoderOptions::default())
        .map_err(|e| failed(format!("unsupported codec: {}", e)))?;

    let mut sample_rate = params.sample_rate;
    let mut channel_count = params.channels.map(|c| c.count());
    let mut samples: Vec<f32> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(failed(e.to_string())),
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = *decoded.spec();
                sample_rate = Some(spec.rate);
                channel_count = Some(spec.channels.count());

                let mut buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
                buf.copy_interleaved_ref(decoded);
                samples.extend_from_slice(buf.samples());
            }
            Err(SymphoniaError::DecodeError(e)) => {
                debug!("Skipping corrupt packet in {}: {}", name, e);
            }
            Err(SymphoniaError::IoError(_)) => break,
            Err(e) => return Err(failed(e.to_string())),
        }
    }

    let sample_rate = sample_rate.ok_or_else(|| failed("unknown sample rate".to_string()))?;
    let count = channel_count.ok_or_else(|| failed("unknown channel count".to_string()))?;
    let layout = ChannelLayout::from_count(count)
        .ok_or_else(|| failed(format!("{}-channel audio (only mono/stereo supported)", count)))?;

    PcmBuffer::from_interleaved(&samples, layout, sample_rate).map_err(|e| failed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use hound::{SampleFormat, WavSpec, WavWriter};

    fn stereo_wav(frames: usize) -> Vec<u8> {
        let spec = WavSpec {
            channels: 2,
            sample_rate: 22050,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = WavWriter::new(&mut cursor, spec).unwrap();
            for _ in 0..frames {
                writer.write_sample(16384i16).unwrap();
                writer.write_sample(-8192i16).unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn test_riff_detection() {
        assert!(is_riff_wave(&stereo_wav(1)));
        assert!(!is_riff_wave(b"ID3\x04\x00\x00"));
        assert!(!is_riff_wave(b"RIFF"));
    }

    #[test]
    fn test_symphonia_decodes_wav_container() {
        let buffer = decode_with_symphonia("clip.wav", stereo_wav(300)).unwrap();

        assert_eq!(buffer.num_channels(), 2);
        assert_eq!(buffer.sample_rate(), 22050);
        assert_eq!(buffer.len(), 300);
        assert_relative_eq!(buffer.channel(0).unwrap()[10], 0.5);
        assert_relative_eq!(buffer.channel(1).unwrap()[10], -0.25);
    }

    #[test]
    fn test_probe_without_extension() {
        let buffer = decode_with_symphonia("clip", stereo_wav(64)).unwrap();
        assert_eq!(buffer.len(), 64);
    }

    #[test]
    fn test_both_paths_agree() {
        let via_hound = decode_audio("clip.wav", stereo_wav(50)).unwrap();
        let via_symphonia = decode_with_symphonia("clip.wav", stereo_wav(50)).unwrap();
        assert_eq!(via_hound, via_symphonia);
    }

    #[test]
    fn test_unrecognized_bytes_fail() {
        let result = decode_audio("Track.mp3", b"definitely not audio data".to_vec());
        match result {
            Err(WavconvError::DecodeFailed { name, .. }) => assert_eq!(name, "Track.mp3"),
            other => panic!("Expected DecodeFailed, got: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_async_decode() {
        let buffer = AudioDecoder.decode("a.wav", stereo_wav(80)).await.unwrap();
        assert_eq!(buffer.len(), 80);
    }
}
