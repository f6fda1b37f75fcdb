//! External collaborators
//!
//! Decoding, resampling, playback and persistence are consumed through the
//! traits below. Each long-running operation is an async method so the
//! session can suspend on it and resume with a value or an error.

pub mod codec;
pub mod decoder;
pub mod playback;
pub mod resampler;
pub mod storage;

use async_trait::async_trait;
use tokio::sync::oneshot;

use crate::engine::PcmBuffer;
use crate::error::Result;

pub use codec::AudioDecoder;
pub use decoder::WavDecoder;
pub use playback::TimedPlaybackSink;
pub use resampler::LinearResampler;
pub use storage::{DirectorySink, MemorySink};

/// Turns raw file bytes into PCM
#[async_trait]
pub trait Decoder: Send + Sync {
    /// Decode `bytes` read from the file called `name`
    ///
    /// Fails with `DecodeFailed` for malformed or unsupported input.
    async fn decode(&self, name: &str, bytes: Vec<u8>) -> Result<PcmBuffer>;
}

/// Converts a buffer to another sample rate, keeping its channel count
#[async_trait]
pub trait Resampler: Send + Sync {
    async fn resample(&self, buffer: PcmBuffer, target_rate: u32) -> Result<PcmBuffer>;
}

/// A playback in progress
pub trait Playback: Send {
    /// Halt rendering immediately
    fn stop(&mut self);
}

/// Renders buffers to an output device
#[async_trait]
pub trait PlaybackSink: Send + Sync {
    /// Start rendering `buffer`
    ///
    /// The sink sends on `done` once rendering finishes on its own. A
    /// stopped playback never sends.
    async fn start(&self, buffer: PcmBuffer, done: oneshot::Sender<()>) -> Result<Box<dyn Playback>>;
}

/// Makes a named byte blob available to the user
#[async_trait]
pub trait PersistenceSink: Send + Sync {
    async fn persist(&self, name: &str, bytes: Vec<u8>) -> Result<()>;
}
