//! PCM Buffer
//!
//! Decoded audio held as non-interleaved 32-bit float channels. A buffer is
//! a value: every stage of the pipeline consumes one and produces another.

use crate::error::{Result, WavconvError};

/// Maximum number of channels a buffer can carry
pub const MAX_CHANNELS: usize = 2;

// ============================================================================
// Channel Layout
// ============================================================================

/// Audio channel configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ChannelLayout {
    /// Single channel (mono)
    Mono,
    /// Two channels (stereo: left, right)
    #[default]
    Stereo,
}

impl ChannelLayout {
    /// Returns the number of channels for this layout
    pub fn num_channels(&self) -> usize {
        match self {
            ChannelLayout::Mono => 1,
            ChannelLayout::Stereo => 2,
        }
    }

    /// Create a ChannelLayout from a channel count
    pub fn from_count(count: usize) -> Option<Self> {
        match count {
            1 => Some(ChannelLayout::Mono),
            2 => Some(ChannelLayout::Stereo),
            _ => None,
        }
    }
}

// ============================================================================
// PCM Buffer
// ============================================================================

/// Decoded audio: one sample array per channel plus a sample rate
///
/// All channels always hold the same number of samples and the sample rate
/// is always positive; both are checked on construction.
///
/// # Example
/// ```
/// use wavconv::engine::PcmBuffer;
///
/// let buffer = PcmBuffer::stereo(vec![0.5, -0.5], vec![0.25, 0.0], 8000).unwrap();
/// assert_eq!(buffer.num_channels(), 2);
/// assert_eq!(buffer.len(), 2);
/// assert_eq!(buffer.peak(), 0.5);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct PcmBuffer {
    channels: Vec<Vec<f32>>,
    sample_rate: u32,
}

impl PcmBuffer {
    /// Create a buffer from per-channel sample arrays
    ///
    /// # Errors
    /// * `InvalidBuffer` - if there are no channels, more than two, the
    ///   channel lengths differ, or the sample rate is zero
    pub fn new(channels: Vec<Vec<f32>>, sample_rate: u32) -> Result<Self> {
        if channels.is_empty() || channels.len() > MAX_CHANNELS {
            return Err(WavconvError::InvalidBuffer {
                reason: format!(
                    "{} channels (only mono/stereo supported)",
                    channels.len()
                ),
            });
        }

        let len = channels[0].len();
        if channels.iter().any(|ch| ch.len() != len) {
            return Err(WavconvError::InvalidBuffer {
                reason: "channel lengths differ".to_string(),
            });
        }

        if sample_rate == 0 {
            return Err(WavconvError::InvalidBuffer {
                reason: "sample rate must be positive".to_string(),
            });
        }

        Ok(Self {
            channels,
            sample_rate,
        })
    }

    /// Create a single-channel buffer
    pub fn mono(samples: Vec<f32>, sample_rate: u32) -> Result<Self> {
        Self::new(vec![samples], sample_rate)
    }

    /// Create a two-channel buffer
    pub fn stereo(left: Vec<f32>, right: Vec<f32>, sample_rate: u32) -> Result<Self> {
        Self::new(vec![left, right], sample_rate)
    }

    /// Create a buffer from interleaved sample data
    ///
    /// # Arguments
    /// * `interleaved` - Interleaved sample data (L, R, L, R, ... for stereo)
    /// * `layout` - Channel configuration
    /// * `sample_rate` - Sample rate in Hz
    pub fn from_interleaved(
        interleaved: &[f32],
        layout: ChannelLayout,
        sample_rate: u32,
    ) -> Result<Self> {
        let num_channels = layout.num_channels();

        if interleaved.len() % num_channels != 0 {
            return Err(WavconvError::InvalidBuffer {
                reason: format!(
                    "Interleaved data length {} is not divisible by channel count {}",
                    interleaved.len(),
                    num_channels
                ),
            });
        }

        let num_samples = interleaved.len() / num_channels;
        let mut channels = vec![Vec::with_capacity(num_samples); num_channels];

        for frame in interleaved.chunks_exact(num_channels) {
            for (ch, &sample) in frame.iter().enumerate() {
                channels[ch].push(sample);
            }
        }

        Self::new(channels, sample_rate)
    }

    /// Get the number of channels
    #[inline]
    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    /// Get the number of samples per channel
    #[inline]
    pub fn len(&self) -> usize {
        self.channels.first().map(|ch| ch.len()).unwrap_or(0)
    }

    /// Check if the buffer is empty (no samples)
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sample rate in Hz
    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Get the duration in seconds
    #[inline]
    pub fn duration_secs(&self) -> f64 {
        self.len() as f64 / self.sample_rate as f64
    }

    /// Get a channel's samples, or None if the channel does not exist
    #[inline]
    pub fn channel(&self, index: usize) -> Option<&[f32]> {
        self.channels.get(index).map(|ch| ch.as_slice())
    }

    /// All channels in source order
    #[inline]
    pub fn channels(&self) -> &[Vec<f32>] {
        &self.channels
    }

    /// Consume the buffer, returning its channel data
    pub fn into_channels(self) -> Vec<Vec<f32>> {
        self.channels
    }

    /// Largest absolute sample value over all channels (0.0 when empty)
    pub fn peak(&self) -> f32 {
        self.channels
            .iter()
            .flat_map(|channel| channel.iter())
            .map(|&s| s.abs())
            .fold(0.0_f32, f32::max)
    }

    /// Check if all samples are finite (not NaN or Infinity)
    pub fn is_finite(&self) -> bool {
        self.channels
            .iter()
            .flat_map(|ch| ch.iter())
            .all(|s| s.is_finite())
    }

    /// Build a buffer whose shape is already known to be valid
    pub(crate) fn from_parts(channels: Vec<Vec<f32>>, sample_rate: u32) -> Self {
        debug_assert!(!channels.is_empty() && channels.len() <= MAX_CHANNELS);
        debug_assert!(channels.iter().all(|ch| ch.len() == channels[0].len()));
        debug_assert!(sample_rate > 0);
        Self {
            channels,
            sample_rate,
        }
    }

    /// Multiply every sample by `gain`, keeping the buffer's shape
    pub(crate) fn scaled(mut self, gain: f32) -> Self {
        for channel in &mut self.channels {
            for sample in channel.iter_mut() {
                *sample *= gain;
            }
        }
        self
    }
}

// ============================================================================
// Test Signals
// ============================================================================

/// Generate a mono sine wave with peak amplitude `amplitude`
///
/// # Arguments
/// * `frequency` - Frequency of the sine wave in Hz
/// * `amplitude` - Peak amplitude (1.0 = full scale)
/// * `duration_secs` - Duration of the tone in seconds
/// * `sample_rate` - Sample rate in Hz (must be positive)
pub fn generate_test_tone(
    frequency: f32,
    amplitude: f32,
    duration_secs: f32,
    sample_rate: u32,
) -> Result<PcmBuffer> {
    let num_samples = (duration_secs * sample_rate as f32) as usize;
    let angular_freq = 2.0 * std::f32::consts::PI * frequency / sample_rate as f32;

    let samples = (0..num_samples)
        .map(|i| amplitude * (angular_freq * i as f32).sin())
        .collect();

    PcmBuffer::mono(samples, sample_rate)
}

/// Generate a stereo tone with a different frequency per channel
pub fn generate_stereo_test_tone(
    freq_left: f32,
    freq_right: f32,
    amplitude: f32,
    duration_secs: f32,
    sample_rate: u32,
) -> Result<PcmBuffer> {
    let left = generate_test_tone(freq_left, amplitude, duration_secs, sample_rate)?;
    let right = generate_test_tone(freq_right, amplitude, duration_secs, sample_rate)?;

    let mut channels = left.into_channels();
    channels.extend(right.into_channels());
    PcmBuffer::new(channels, sample_rate)
}

// ============================================================================
// Tests
// ============================================================================
