//! RIFF/WAVE container encoding
//!
//! Writes the canonical 44-byte PCM header followed by already quantized
//! sample bytes. All multi-byte fields are little-endian.

/// Size of the canonical PCM WAV header
pub const WAV_HEADER_LEN: usize = 44;

/// `AudioFormat` value for uncompressed PCM
const FORMAT_PCM: u16 = 1;

/// Size of the `fmt ` chunk body for PCM
const FMT_CHUNK_LEN: u32 = 16;

/// Wrap quantized PCM bytes in a WAV container
///
/// The caller supplies field values that are already valid (1 or 2
/// channels, 1 or 2 bytes per sample); no checks are made here.
///
/// # Arguments
/// * `data` - Interleaved PCM bytes as produced by the quantizer
/// * `channels` - Channel count written to the header
/// * `sample_rate` - Sample rate in Hz
/// * `bytes_per_sample` - Width of one sample of one channel
///
/// # Returns
/// A complete WAV file: header plus `data`
pub fn encode_wav(data: &[u8], channels: u16, sample_rate: u32, bytes_per_sample: u16) -> Vec<u8> {
    let data_len = data.len() as u32;
    let block_align = bytes_per_sample * channels;
    let byte_rate = sample_rate * block_align as u32;

    let mut wav = Vec::with_capacity(WAV_HEADER_LEN + data.len());

    // RIFF chunk descriptor
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&(36 + data_len).to_le_bytes());
    wav.extend_from_slice(b"WAVE");

    // fmt sub-chunk
    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&FMT_CHUNK_LEN.to_le_bytes());
    wav.extend_from_slice(&FORMAT_PCM.to_le_bytes());
    wav.extend_from_slice(&channels.to_le_bytes());
    wav.extend_from_slice(&sample_rate.to_le_bytes());
    wav.extend_from_slice(&byte_rate.to_le_bytes());
    wav.extend_from_slice(&block_align.to_le_bytes());
    wav.extend_from_slice(&(bytes_per_sample * 8).to_le_bytes());

    // data sub-chunk
    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&data_len.to_le_bytes());
    wav.extend_from_slice(data);

    wav
}

/// Replace a trailing alphanumeric extension with `.wav`
///
/// Names without an extension get `.wav` appended.
///
/// # Example
/// ```
/// use wavconv::engine::output_file_name;
///
/// assert_eq!(output_file_name("Track 01.MP3"), "Track 01.wav");
/// assert_eq!(output_file_name("jingle"), "jingle.wav");
/// ```
pub fn output_file_name(source_name: &str) -> String {
    match source_name.rfind('.') {
        Some(dot)
            if dot + 1 < source_name.len()
                && source_name[dot + 1..]
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric()) =>
        {
            format!("{}.wav", &source_name[..dot])
        }
        _ => format!("{}.wav", source_name),
    }
}
