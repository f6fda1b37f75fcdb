//! Conversion configuration
//!
//! Target sample rate, sample width and channel mode shared by every
//! conversion and preview in a session.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, WavconvError};

/// Lowest accepted target sample rate in Hz
pub const MIN_SAMPLE_RATE: u32 = 8000;

/// Highest accepted target sample rate in Hz
pub const MAX_SAMPLE_RATE: u32 = 64000;

/// How a stereo source is reduced before encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelMode {
    /// Keep every channel
    #[default]
    Both,
    /// Keep channel 0 only
    Left,
    /// Keep channel 1 only
    Right,
    /// Average channels 0 and 1
    Mix,
}

impl ChannelMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelMode::Both => "both",
            ChannelMode::Left => "left",
            ChannelMode::Right => "right",
            ChannelMode::Mix => "mix",
        }
    }

    /// Number of output channels for a source with `source_channels` channels
    pub fn output_channels(&self, source_channels: usize) -> usize {
        match self {
            ChannelMode::Both => source_channels,
            _ => source_channels.min(1),
        }
    }
}

impl fmt::Display for ChannelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChannelMode {
    type Err = WavconvError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "both" => Ok(ChannelMode::Both),
            "left" => Ok(ChannelMode::Left),
            "right" => Ok(ChannelMode::Right),
            "mix" => Ok(ChannelMode::Mix),
            other => Err(WavconvError::InvalidConfig {
                reason: format!("unknown channel mode '{}' (expected both, left, right or mix)", other),
            }),
        }
    }
}

/// Target format for conversion and preview
///
/// # Example
/// ```
/// use wavconv::engine::{ChannelMode, ConversionConfig};
///
/// let mut config = ConversionConfig::default();
/// config.apply_hash_fragment("#8&mix&32000");
/// assert_eq!(config.bytes_per_sample, 1);
/// assert_eq!(config.channel_mode, ChannelMode::Mix);
/// assert_eq!(config.sample_rate, 32000);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionConfig {
    /// Target sample rate in Hz
    pub sample_rate: u32,
    /// 1 for 8-bit unsigned, 2 for 16-bit signed little-endian
    pub bytes_per_sample: u16,
    /// Channel reduction policy
    pub channel_mode: ChannelMode,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            bytes_per_sample: 2,
            channel_mode: ChannelMode::Both,
        }
    }
}

impl ConversionConfig {
    pub fn new(sample_rate: u32, bytes_per_sample: u16, channel_mode: ChannelMode) -> Self {
        Self {
            sample_rate,
            bytes_per_sample,
            channel_mode,
        }
    }

    /// Check every field against its accepted range
    ///
    /// # Errors
    /// * `UnsupportedSampleWidth` - if `bytes_per_sample` is not 1 or 2
    /// * `InvalidConfig` - if the sample rate is outside 8000..=64000 Hz
    pub fn validate(&self) -> Result<()> {
        if !matches!(self.bytes_per_sample, 1 | 2) {
            return Err(WavconvError::UnsupportedSampleWidth {
                bytes_per_sample: self.bytes_per_sample,
            });
        }

        if !(MIN_SAMPLE_RATE..=MAX_SAMPLE_RATE).contains(&self.sample_rate) {
            return Err(WavconvError::InvalidConfig {
                reason: format!(
                    "sample rate {} Hz outside {}..={} Hz",
                    self.sample_rate, MIN_SAMPLE_RATE, MAX_SAMPLE_RATE
                ),
            });
        }

        Ok(())
    }

    /// Bits per sample written to the container
    pub fn bit_depth(&self) -> u16 {
        self.bytes_per_sample * 8
    }

    /// Apply a `bitDepth&channelMode&sampleRate` fragment such as `8&mix&32000`
    ///
    /// Each field is applied on its own; fields that are missing, malformed
    /// or out of range leave the current value in place.
    pub fn apply_hash_fragment(&mut self, fragment: &str) {
        let fragment = fragment.strip_prefix('#').unwrap_or(fragment);
        let mut fields = fragment.split('&');

        match fields.next().and_then(|f| f.trim().parse::<u16>().ok()) {
            Some(8) => self.bytes_per_sample = 1,
            Some(16) => self.bytes_per_sample = 2,
            _ => {}
        }

        if let Some(mode) = fields.next().and_then(|f| f.trim().parse::<ChannelMode>().ok()) {
            self.channel_mode = mode;
        }

        if let Some(rate) = fields.next().and_then(|f| f.trim().parse::<u32>().ok()) {
            if (MIN_SAMPLE_RATE..=MAX_SAMPLE_RATE).contains(&rate) {
                self.sample_rate = rate;
            } else {
                log::debug!("Ignoring out-of-range sample rate {} in fragment", rate);
            }
        }
    }

    /// Defaults overridden by a hash fragment
    pub fn from_hash_fragment(fragment: &str) -> Self {
        let mut config = Self::default();
        config.apply_hash_fragment(fragment);
        config
    }

    /// Load a configuration from a JSON file and validate it
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Write the configuration as pretty-printed JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }
}
