//! CLI Module
//!
//! Command-line interface for batch conversion and inspection.

pub mod commands;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::engine::{ChannelMode, ConversionConfig};
use crate::error::{Result, WavconvError};

/// Wavconv - convert audio files to canonical PCM WAV
#[derive(Parser, Debug)]
#[command(name = "wavconv")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Convert audio files and write .wav files to the output directory
    Convert {
        /// Input files or directories (searched recursively)
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        #[command(flatten)]
        format: FormatArgs,
    },

    /// Show duration and size estimates without writing anything
    Inspect {
        /// Input files or directories (searched recursively)
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        #[command(flatten)]
        format: FormatArgs,
    },
}

/// Target format options, applied in order: config file, preset, flags
#[derive(Args, Debug, Clone, Default)]
pub struct FormatArgs {
    /// JSON configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Preset in the form bitDepth&channelMode&sampleRate, e.g. 8&mix&32000
    #[arg(long)]
    pub preset: Option<String>,

    /// Target sample rate in Hz (8000-64000)
    #[arg(short = 'r', long)]
    pub sample_rate: Option<u32>,

    /// Bits per sample (8 or 16)
    #[arg(short, long)]
    pub bits: Option<u16>,

    /// Channel mode: both, left, right or mix
    #[arg(short, long)]
    pub channels: Option<ChannelMode>,
}

impl FormatArgs {
    /// Build and validate the configuration these options describe
    pub fn resolve(&self) -> Result<ConversionConfig> {
        let mut config = match &self.config {
            Some(path) => ConversionConfig::load(path)?,
            None => ConversionConfig::default(),
        };

        if let Some(preset) = &self.preset {
            config.apply_hash_fragment(preset);
        }
        if let Some(rate) = self.sample_rate {
            config.sample_rate = rate;
        }
        if let Some(bits) = self.bits {
            if bits % 8 != 0 {
                return Err(WavconvError::InvalidConfig {
                    reason: format!("{} bits per sample is not a whole number of bytes", bits),
                });
            }
            config.bytes_per_sample = bits / 8;
        }
        if let Some(mode) = self.channels {
            config.channel_mode = mode;
        }

        config.validate()?;
        Ok(config)
    }
}

/// Expand directories into the files beneath them, sorted by path
pub fn collect_inputs(inputs: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for input in inputs {
        if input.is_dir() {
            let mut found: Vec<PathBuf> = walkdir::WalkDir::new(input)
                .into_iter()
                .filter_map(|entry| match entry {
                    Ok(entry) => Some(entry),
                    Err(e) => {
                        log::warn!("Skipping unreadable entry: {}", e);
                        None
                    }
                })
                .filter(|entry| entry.file_type().is_file())
                .map(|entry| entry.into_path())
                .collect();
            found.sort();
            files.extend(found);
        } else {
            files.push(input.to_path_buf());
        }
    }

    files
}

/// Format seconds as m:ss
pub fn format_duration(secs: f64) -> String {
    let total = secs.round() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

/// Format a byte count in megabytes with one decimal
pub fn format_megabytes(bytes: u64) -> String {
    format!("{:.1}MB", bytes as f64 / 1024.0 / 1024.0)
}
