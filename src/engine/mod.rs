//! Audio Engine Module
//!
//! Core types shared by the pipeline and the session:
//! - PCM buffers
//! - Conversion configuration
//! - WAV container encoding
//! - Playback state machine

pub mod buffer;
pub mod config;
pub mod transport;
pub mod wav;

pub use buffer::{generate_stereo_test_tone, generate_test_tone, ChannelLayout, PcmBuffer};
pub use config::{ChannelMode, ConversionConfig, MAX_SAMPLE_RATE, MIN_SAMPLE_RATE};
pub use transport::{PlaybackManager, PlaybackState};
pub use wav::{encode_wav, output_file_name, WAV_HEADER_LEN};
