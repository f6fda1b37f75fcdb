//! Wavconv - Audio to PCM WAV Conversion
//!
//! Wavconv decodes arbitrary audio files and re-encodes them as canonical
//! RIFF/WAVE PCM at a chosen sample rate, bit depth and channel layout.
//!
//! # Architecture
//!
//! - `engine`: PCM buffers, conversion config, WAV container, playback state
//! - `dsp`: quantizer, channel reducer, normalizer and the conversion pipeline
//! - `services`: decoding, resampling, playback and persistence backends
//! - `session`: asset registry and the session facade over all of the above

pub mod cli;
pub mod dsp;
pub mod engine;
pub mod error;
pub mod services;
pub mod session;

pub use dsp::{convert, normalize, quantize, reduce_channels, NormalizeOutcome};
pub use engine::{ChannelMode, ConversionConfig, PcmBuffer, PlaybackState};
pub use error::{Result, WavconvError};
pub use session::{AssetRegistry, Services, Session, SourceFile};
