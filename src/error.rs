//! Error handling for Wavconv
//!
//! Per-file failures are reported inside batch reports tagged with their
//! error code. Configuration errors abort the conversion they apply to.

use thiserror::Error;

/// Result type alias for Wavconv operations
pub type Result<T> = std::result::Result<T, WavconvError>;

/// Main error type for Wavconv operations
#[derive(Error, Debug)]
pub enum WavconvError {
    // Input Errors
    #[error("Failed to decode '{name}': {reason}")]
    DecodeFailed { name: String, reason: String },

    #[error("Invalid PCM buffer: {reason}")]
    InvalidBuffer { reason: String },

    // Configuration Errors
    #[error("Unsupported sample width: {bytes_per_sample} bytes (only 1 or 2 supported)")]
    UnsupportedSampleWidth { bytes_per_sample: u16 },

    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    // Collaborator Errors
    #[error("Resampling failed: {reason}")]
    ResampleFailed { reason: String },

    #[error("Playback failed: {reason}")]
    PlaybackFailed { reason: String },

    #[error("Failed to save '{name}': {reason}")]
    PersistFailed { name: String, reason: String },

    // Session Errors
    #[error("Asset index {index} out of range (registry holds {len})")]
    IndexOutOfRange { index: usize, len: usize },

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl WavconvError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            WavconvError::DecodeFailed { .. } => "DECODE_FAILED",
            WavconvError::InvalidBuffer { .. } => "INVALID_BUFFER",
            WavconvError::UnsupportedSampleWidth { .. } => "UNSUPPORTED_SAMPLE_WIDTH",
            WavconvError::InvalidConfig { .. } => "INVALID_CONFIG",
            WavconvError::ResampleFailed { .. } => "RESAMPLE_FAILED",
            WavconvError::PlaybackFailed { .. } => "PLAYBACK_FAILED",
            WavconvError::PersistFailed { .. } => "PERSIST_FAILED",
            WavconvError::IndexOutOfRange { .. } => "INDEX_OUT_OF_RANGE",
            WavconvError::Io(_) => "IO_ERROR",
            WavconvError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }
}
