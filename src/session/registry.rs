//! Asset registry
//!
//! Loaded assets, unique by source name and kept sorted by name. All
//! mutation goes through [`AssetRegistry::add`], [`AssetRegistry::remove`]
//! and [`AssetRegistry::clear`].

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use log::{debug, warn};

use crate::engine::{ConversionConfig, PcmBuffer};
use crate::error::{Result, WavconvError};
use crate::services::Decoder;

// ============================================================================
// Source Files
// ============================================================================

/// Raw input file: a display name, its MIME type and its contents
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Read a file from disk, naming it by its file name and typing it by
    /// its extension
    pub async fn load(path: &Path) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(name, mime_type_for_path(path), bytes))
    }

    /// Only `audio/*` files may enter the registry
    pub fn is_audio(&self) -> bool {
        self.mime_type.starts_with("audio/")
    }
}

/// Guess a MIME type from a file extension
pub fn mime_type_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "wav" | "wave" => "audio/wav",
        "mp3" => "audio/mpeg",
        "ogg" | "oga" => "audio/ogg",
        "flac" => "audio/flac",
        "aif" | "aiff" => "audio/aiff",
        "m4a" | "mp4" => "audio/mp4",
        "aac" => "audio/aac",
        _ => "application/octet-stream",
    }
}

// ============================================================================
// Assets
// ============================================================================

/// A decoded file owned by the registry
#[derive(Debug, Clone)]
pub struct Asset {
    name: String,
    decoded: Arc<PcmBuffer>,
    source_byte_size: usize,
}

impl Asset {
    pub fn new(name: impl Into<String>, decoded: PcmBuffer, source_byte_size: usize) -> Self {
        Self {
            name: name.into(),
            decoded: Arc::new(decoded),
            source_byte_size,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The decoded audio, shared with in-flight conversions
    pub fn buffer(&self) -> &Arc<PcmBuffer> {
        &self.decoded
    }

    pub fn source_byte_size(&self) -> usize {
        self.source_byte_size
    }

    pub fn duration_secs(&self) -> f64 {
        self.decoded.duration_secs()
    }

    /// Expected size in bytes of the PCM data produced under `config`
    pub fn estimated_output_size(&self, config: &ConversionConfig) -> u64 {
        let channels = config
            .channel_mode
            .output_channels(self.decoded.num_channels());
        let bytes = self.duration_secs()
            * config.sample_rate as f64
            * config.bytes_per_sample as f64
            * channels as f64;
        bytes.round() as u64
    }
}

// ============================================================================
// Add Reports
// ============================================================================

/// Why an input file was not decoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// An asset (or an earlier file in the batch) already has this name
    DuplicateName,
    /// The file's MIME type is not `audio/*`
    NotAudio { mime_type: String },
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::DuplicateName => write!(f, "duplicate name"),
            SkipReason::NotAudio { mime_type } => write!(f, "not audio ({})", mime_type),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    pub name: String,
    pub reason: SkipReason,
}

/// A file that could not be processed, with the error
#[derive(Debug)]
pub struct FailedFile {
    pub name: String,
    pub error: WavconvError,
}

/// Outcome of one [`AssetRegistry::add`] batch
#[derive(Debug, Default)]
pub struct AddReport {
    /// Names accepted into the registry, in batch order
    pub added: Vec<String>,
    pub skipped: Vec<SkippedFile>,
    pub failed: Vec<FailedFile>,
}

impl AddReport {
    /// True when every file that was attempted decoded successfully
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

// ============================================================================
// Registry
// ============================================================================

/// Ordered, name-unique collection of assets
#[derive(Debug, Default)]
pub struct AssetRegistry {
    assets: Vec<Asset>,
}

impl AssetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Asset> {
        self.assets.get(index)
    }

    /// Look up an asset, failing with `IndexOutOfRange`
    pub fn require(&self, index: usize) -> Result<&Asset> {
        self.assets.get(index).ok_or(WavconvError::IndexOutOfRange {
            index,
            len: self.assets.len(),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Asset> {
        self.assets.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.assets.iter().map(|a| a.name()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.assets.iter().any(|a| a.name == name)
    }

    /// Decode and add a batch of files
    ///
    /// Non-audio files and duplicate names are skipped before decoding.
    /// All remaining files are decoded concurrently; a failure drops only
    /// that file. Accepted assets are appended and the registry re-sorted
    /// by name.
    pub async fn add(&mut self, files: Vec<SourceFile>, decoder: Arc<dyn Decoder>) -> AddReport {
        let mut report = AddReport::default();
        let mut seen: HashSet<String> = self.assets.iter().map(|a| a.name.clone()).collect();
        let mut pending = Vec::new();

        for file in files {
            if !file.is_audio() {
                debug!("Skipping non-audio file {} ({})", file.name, file.mime_type);
                report.skipped.push(SkippedFile {
                    name: file.name,
                    reason: SkipReason::NotAudio {
                        mime_type: file.mime_type,
                    },
                });
                continue;
            }

            if !seen.insert(file.name.clone()) {
                debug!("Skipping duplicate {}", file.name);
                report.skipped.push(SkippedFile {
                    name: file.name,
                    reason: SkipReason::DuplicateName,
                });
                continue;
            }

            let decoder = Arc::clone(&decoder);
            let SourceFile { name, bytes, .. } = file;
            let size = bytes.len();
            let task_name = name.clone();
            let handle = tokio::spawn(async move { decoder.decode(&task_name, bytes).await });
            pending.push((name, size, handle));
        }

        for (name, size, handle) in pending {
            let decoded = match handle.await {
                Ok(result) => result,
                Err(e) => Err(WavconvError::DecodeFailed {
                    name: name.clone(),
                    reason: format!("decoder task failed: {}", e),
                }),
            };

            match decoded {
                Ok(buffer) => {
                    report.added.push(name.clone());
                    self.assets.push(Asset::new(name, buffer, size));
                }
                Err(error) => {
                    warn!("Dropping {}: {}", name, error);
                    report.failed.push(FailedFile { name, error });
                }
            }
        }

        if !report.added.is_empty() {
            self.assets.sort_by(|a, b| a.name.cmp(&b.name));
        }

        report
    }

    /// Remove the asset at `index`; later entries shift down by one
    pub fn remove(&mut self, index: usize) -> Result<Asset> {
        self.require(index)?;
        Ok(self.assets.remove(index))
    }

    pub fn clear(&mut self) {
        self.assets.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ChannelMode;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;

    /// Decodes any bytes into a mono buffer of that many samples, except
    /// files whose contents start with "bad"
    struct StubDecoder;

    #[async_trait]
    impl Decoder for StubDecoder {
        async fn decode(&self, name: &str, bytes: Vec<u8>) -> Result<PcmBuffer> {
            if bytes.starts_with(b"bad") {
                return Err(WavconvError::DecodeFailed {
                    name: name.to_string(),
                    reason: "corrupt".to_string(),
                });
            }
            PcmBuffer::mono(vec![0.5; bytes.len()], 8000)
        }
    }

    fn decoder() -> Arc<dyn Decoder> {
        Arc::new(StubDecoder)
    }

    fn audio(name: &str) -> SourceFile {
        SourceFile::new(name, "audio/wav", vec![0; 8])
    }

    #[tokio::test]
    async fn test_same_name_in_batch_added_once() {
        let mut registry = AssetRegistry::new();
        let report = registry.add(vec![audio("a.wav"), audio("a.wav")], decoder()).await;

        assert_eq!(registry.names(), vec!["a.wav"]);
        assert_eq!(report.added, vec!["a.wav"]);
        assert_eq!(
            report.skipped,
            vec![SkippedFile {
                name: "a.wav".to_string(),
                reason: SkipReason::DuplicateName
            }]
        );
    }

    #[tokio::test]
    async fn test_existing_name_skipped() {
        let mut registry = AssetRegistry::new();
        registry.add(vec![audio("a.wav")], decoder()).await;
        let report = registry.add(vec![audio("a.wav")], decoder()).await;

        assert_eq!(registry.len(), 1);
        assert!(report.added.is_empty());
        assert_eq!(report.skipped[0].reason, SkipReason::DuplicateName);
    }

    #[tokio::test]
    async fn test_sorted_after_each_batch() {
        let mut registry = AssetRegistry::new();
        registry.add(vec![audio("b.wav")], decoder()).await;
        registry.add(vec![audio("a.wav")], decoder()).await;
        assert_eq!(registry.names(), vec!["a.wav", "b.wav"]);

        registry.add(vec![audio("d.wav"), audio("c.wav")], decoder()).await;
        assert_eq!(registry.names(), vec!["a.wav", "b.wav", "c.wav", "d.wav"]);
    }

    #[tokio::test]
    async fn test_decode_failure_does_not_abort_batch() {
        let mut registry = AssetRegistry::new();
        let files = vec![
            audio("good1.wav"),
            SourceFile::new("broken.wav", "audio/wav", b"bad data".to_vec()),
            audio("good2.wav"),
        ];
        let report = registry.add(files, decoder()).await;

        assert_eq!(registry.names(), vec!["good1.wav", "good2.wav"]);
        assert!(!report.is_complete());
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].name, "broken.wav");
        assert_eq!(report.failed[0].error.error_code(), "DECODE_FAILED");
    }

    #[tokio::test]
    async fn test_non_audio_rejected_before_decode() {
        let mut registry = AssetRegistry::new();
        let files = vec![
            SourceFile::new("notes.txt", "text/plain", b"bad".to_vec()),
            audio("a.wav"),
        ];
        let report = registry.add(files, decoder()).await;

        assert_eq!(registry.names(), vec!["a.wav"]);
        assert!(report.failed.is_empty());
        assert_eq!(
            report.skipped[0].reason,
            SkipReason::NotAudio {
                mime_type: "text/plain".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_remove_shifts_indices() {
        let mut registry = AssetRegistry::new();
        registry
            .add(vec![audio("a.wav"), audio("b.wav"), audio("c.wav")], decoder())
            .await;

        let removed = registry.remove(1).unwrap();
        assert_eq!(removed.name(), "b.wav");
        assert_eq!(registry.get(1).unwrap().name(), "c.wav");

        assert!(matches!(
            registry.remove(5),
            Err(WavconvError::IndexOutOfRange { index: 5, len: 2 })
        ));
    }

    #[tokio::test]
    async fn test_clear() {
        let mut registry = AssetRegistry::new();
        registry.add(vec![audio("a.wav")], decoder()).await;
        registry.clear();
        assert!(registry.is_empty());
        assert!(!registry.contains("a.wav"));
    }

    #[test]
    fn test_estimated_output_size() {
        let buffer = PcmBuffer::stereo(vec![0.0; 44100], vec![0.0; 44100], 44100).unwrap();
        let asset = Asset::new("one-second.wav", buffer, 1234);

        let both = ConversionConfig::new(8000, 2, ChannelMode::Both);
        assert_eq!(asset.estimated_output_size(&both), 32000);

        let mixed = ConversionConfig::new(8000, 1, ChannelMode::Mix);
        assert_eq!(asset.estimated_output_size(&mixed), 8000);
        assert_eq!(asset.source_byte_size(), 1234);
    }

    #[test]
    fn test_mime_type_for_path() {
        assert_eq!(mime_type_for_path(Path::new("a/b/Song.WAV")), "audio/wav");
        assert_eq!(mime_type_for_path(Path::new("clip.mp3")), "audio/mpeg");
        assert_eq!(mime_type_for_path(Path::new("README")), "application/octet-stream");
        assert_eq!(mime_type_for_path(Path::new("memo.m4a")), "audio/mp4");
        // No decoder handles Opus, so it never passes the audio filter.
        assert_eq!(mime_type_for_path(Path::new("voice.opus")), "application/octet-stream");
    }
}
