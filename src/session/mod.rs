//! Conversion session
//!
//! [`Session`] owns the asset registry, the playback state and the active
//! configuration, and runs batch conversion and single-asset preview
//! against the external services.

pub mod registry;

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use log::{info, warn};

use crate::dsp::{convert, transcode};
use crate::engine::{output_file_name, ConversionConfig, PcmBuffer, PlaybackManager, PlaybackState};
use crate::error::{Result, WavconvError};
use crate::services::{
    AudioDecoder, Decoder, DirectorySink, LinearResampler, PersistenceSink, PlaybackSink,
    Resampler, TimedPlaybackSink,
};

pub use registry::{
    mime_type_for_path, AddReport, Asset, AssetRegistry, FailedFile, SkipReason, SkippedFile,
    SourceFile,
};

/// The collaborators a session works against
#[derive(Clone)]
pub struct Services {
    pub decoder: Arc<dyn Decoder>,
    pub resampler: Arc<dyn Resampler>,
    pub playback: Arc<dyn PlaybackSink>,
    pub persistence: Arc<dyn PersistenceSink>,
}

impl Services {
    pub fn new(
        decoder: Arc<dyn Decoder>,
        resampler: Arc<dyn Resampler>,
        playback: Arc<dyn PlaybackSink>,
        persistence: Arc<dyn PersistenceSink>,
    ) -> Self {
        Self {
            decoder,
            resampler,
            playback,
            persistence,
        }
    }

    /// Multi-format decoding, linear resampling, timed playback and files
    /// written to `output_dir`
    pub fn local(output_dir: &Path) -> Self {
        Self::new(
            Arc::new(AudioDecoder),
            Arc::new(LinearResampler),
            Arc::new(TimedPlaybackSink),
            Arc::new(DirectorySink::new(output_dir)),
        )
    }
}

/// One row of the asset listing
#[derive(Debug, Clone, PartialEq)]
pub struct AssetSummary {
    pub index: usize,
    pub name: String,
    pub duration_secs: f64,
    pub source_byte_size: usize,
    pub estimated_output_size: u64,
    pub playing: bool,
}

/// Outcome of [`Session::save_all`]
#[derive(Debug, Default)]
pub struct SaveReport {
    /// Output file names, in registry order
    pub saved: Vec<String>,
    pub failed: Vec<FailedFile>,
}

impl SaveReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Registry, playback and configuration behind one facade
pub struct Session {
    registry: AssetRegistry,
    playback: PlaybackManager,
    config: ConversionConfig,
    services: Services,
}

impl Session {
    /// Create an empty session
    ///
    /// # Errors
    /// Fails if `config` does not validate.
    pub fn new(services: Services, config: ConversionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            registry: AssetRegistry::new(),
            playback: PlaybackManager::new(),
            config,
            services,
        })
    }

    // ========================================================================
    // Configuration
    // ========================================================================

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    /// Replace the configuration; any preview stops since it is now stale
    pub fn set_config(&mut self, config: ConversionConfig) -> Result<()> {
        config.validate()?;
        self.playback.stop();
        self.config = config;
        Ok(())
    }

    // ========================================================================
    // Registry
    // ========================================================================

    pub fn registry(&self) -> &AssetRegistry {
        &self.registry
    }

    /// Decode and add a batch of files (see [`AssetRegistry::add`])
    ///
    /// Playback stops if any file was added, since indices may have moved.
    pub async fn add(&mut self, files: Vec<SourceFile>) -> AddReport {
        let report = self
            .registry
            .add(files, Arc::clone(&self.services.decoder))
            .await;

        if !report.added.is_empty() {
            self.playback.stop();
        }

        info!(
            "Added {} file(s), skipped {}, failed {}",
            report.added.len(),
            report.skipped.len(),
            report.failed.len()
        );
        report
    }

    /// Remove one asset, stopping playback first
    pub fn remove(&mut self, index: usize) -> Result<Asset> {
        self.registry.require(index)?;
        self.playback.stop();
        self.registry.remove(index)
    }

    /// Stop playback and empty the registry
    pub fn clear(&mut self) {
        self.playback.stop();
        self.registry.clear();
    }

    /// One summary per asset under the current configuration
    pub fn summaries(&self) -> Vec<AssetSummary> {
        let playing = self.playback.state().playing_index();
        self.registry
            .iter()
            .enumerate()
            .map(|(index, asset)| AssetSummary {
                index,
                name: asset.name().to_string(),
                duration_secs: asset.duration_secs(),
                source_byte_size: asset.source_byte_size(),
                estimated_output_size: asset.estimated_output_size(&self.config),
                playing: playing == Some(index),
            })
            .collect()
    }

    // ========================================================================
    // Playback
    // ========================================================================

    pub fn playback_state(&self) -> PlaybackState {
        self.playback.state()
    }

    /// Toggle preview of the asset at `index`
    ///
    /// If that asset is playing it stops. Otherwise any other playback
    /// stops, the asset is transcoded under the current configuration and
    /// playback starts.
    pub async fn play_pause(&mut self, index: usize) -> Result<PlaybackState> {
        let buffer = PcmBuffer::clone(self.registry.require(index)?.buffer());

        self.playback.poll();
        if self.playback.is_playing(index) {
            self.playback.stop();
            return Ok(self.playback.state());
        }

        self.playback.stop();
        let preview = transcode(buffer, &self.config, self.services.resampler.as_ref()).await?;
        self.playback
            .start(index, preview, self.services.playback.as_ref())
            .await?;
        Ok(self.playback.state())
    }

    /// Stop any preview
    pub fn stop_playback(&mut self) -> Option<usize> {
        self.playback.stop()
    }

    /// Observe natural completion without waiting
    pub fn poll_playback(&mut self) -> PlaybackState {
        self.playback.poll()
    }

    /// Suspend until the current preview finishes on its own
    pub async fn wait_playback_end(&mut self) -> Option<usize> {
        self.playback.wait_for_end().await
    }

    // ========================================================================
    // Conversion
    // ========================================================================

    /// Convert one asset to WAV bytes under the current configuration
    pub async fn convert(&self, index: usize) -> Result<Vec<u8>> {
        let buffer = PcmBuffer::clone(self.registry.require(index)?.buffer());
        convert(buffer, &self.config, self.services.resampler.as_ref()).await
    }

    /// Convert one asset and hand it to the persistence sink
    ///
    /// # Returns
    /// The output file name
    pub async fn save(&self, index: usize) -> Result<String> {
        let asset = self.registry.require(index)?;
        let file_name = output_file_name(asset.name());
        let wav = self.convert(index).await?;
        self.services.persistence.persist(&file_name, wav).await?;
        Ok(file_name)
    }

    /// Convert and save every asset concurrently
    ///
    /// Each asset is converted independently; failures are reported per
    /// asset and do not stop the others. An asset whose output name was
    /// already claimed by an earlier asset (`a.mp3` and `a.ogg` both map to
    /// `a.wav`) is not saved and fails with `PersistFailed`.
    pub async fn save_all(&self) -> SaveReport {
        let mut report = SaveReport::default();
        let mut pending = Vec::with_capacity(self.registry.len());
        let mut claimed: HashMap<String, &str> = HashMap::new();

        for asset in self.registry.iter() {
            let file_name = output_file_name(asset.name());
            if let Some(owner) = claimed.get(&file_name) {
                let collision = WavconvError::PersistFailed {
                    name: asset.name().to_string(),
                    reason: format!("output name {} is already used by {}", file_name, owner),
                };
                pending.push((asset.name().to_string(), Err(collision)));
                continue;
            }
            claimed.insert(file_name.clone(), asset.name());

            let name = asset.name().to_string();
            let buffer = Arc::clone(asset.buffer());
            let config = self.config;
            let resampler = Arc::clone(&self.services.resampler);
            let persistence = Arc::clone(&self.services.persistence);

            let handle = tokio::spawn(async move {
                let wav = convert(PcmBuffer::clone(&buffer), &config, resampler.as_ref()).await?;
                persistence.persist(&file_name, wav).await?;
                Ok::<_, WavconvError>(file_name)
            });
            pending.push((name, Ok(handle)));
        }

        for (name, task) in pending {
            let result = match task {
                Ok(handle) => match handle.await {
                    Ok(result) => result,
                    Err(e) => Err(WavconvError::PersistFailed {
                        name: name.clone(),
                        reason: format!("conversion task failed: {}", e),
                    }),
                },
                Err(collision) => Err(collision),
            };

            match result {
                Ok(file_name) => report.saved.push(file_name),
                Err(error) => {
                    warn!("Failed to convert {}: {}", name, error);
                    report.failed.push(FailedFile { name, error });
                }
            }
        }

        info!(
            "Saved {} file(s), {} failed",
            report.saved.len(),
            report.failed.len()
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ChannelMode;
    use crate::services::{MemorySink, Playback};
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;
    use tokio::sync::oneshot;

    /// Decodes "<samples>" text into a stereo buffer of quiet samples
    struct TextDecoder;

    #[async_trait]
    impl Decoder for TextDecoder {
        async fn decode(&self, name: &str, bytes: Vec<u8>) -> Result<PcmBuffer> {
            let len: usize = String::from_utf8_lossy(&bytes).trim().parse().map_err(|_| {
                WavconvError::DecodeFailed {
                    name: name.to_string(),
                    reason: "not a length".to_string(),
                }
            })?;
            PcmBuffer::stereo(vec![0.25; len], vec![-0.25; len], 8000)
        }
    }

    #[derive(Default)]
    struct LoggingSink {
        events: Arc<Mutex<Vec<String>>>,
        senders: Mutex<Vec<oneshot::Sender<()>>>,
    }

    struct LoggingPlayback {
        channels: usize,
        events: Arc<Mutex<Vec<String>>>,
    }

    impl Playback for LoggingPlayback {
        fn stop(&mut self) {
            self.events.lock().unwrap().push(format!("stop {}ch", self.channels));
        }
    }

    #[async_trait]
    impl PlaybackSink for LoggingSink {
        async fn start(
            &self,
            buffer: PcmBuffer,
            done: oneshot::Sender<()>,
        ) -> Result<Box<dyn Playback>> {
            let channels = buffer.num_channels();
            self.events.lock().unwrap().push(format!("start {}ch", channels));
            self.senders.lock().unwrap().push(done);
            Ok(Box::new(LoggingPlayback {
                channels,
                events: Arc::clone(&self.events),
            }))
        }
    }

    struct Fixture {
        session: Session,
        sink: Arc<LoggingSink>,
        saved: Arc<MemorySink>,
    }

    async fn fixture(names: &[&str]) -> Fixture {
        let sink = Arc::new(LoggingSink::default());
        let saved = Arc::new(MemorySink::new());
        let services = Services::new(
            Arc::new(TextDecoder),
            Arc::new(LinearResampler),
            sink.clone(),
            saved.clone(),
        );
        let mut session =
            Session::new(services, ConversionConfig::new(8000, 2, ChannelMode::Both)).unwrap();
        let files = names
            .iter()
            .map(|n| SourceFile::new(*n, "audio/wav", b"16".to_vec()))
            .collect();
        session.add(files).await;
        Fixture {
            session,
            sink,
            saved,
        }
    }

    fn events(sink: &LoggingSink) -> Vec<String> {
        sink.events.lock().unwrap().clone()
    }

    #[tokio::test]
    async fn test_play_pause_toggles() {
        let mut f = fixture(&["a.wav"]).await;

        assert_eq!(f.session.play_pause(0).await.unwrap(), PlaybackState::Playing(0));
        assert_eq!(f.session.play_pause(0).await.unwrap(), PlaybackState::Idle);
        assert_eq!(events(&f.sink), vec!["start 2ch", "stop 2ch"]);
    }

    #[tokio::test]
    async fn test_switching_assets_stops_first() {
        let mut f = fixture(&["a.wav", "b.wav"]).await;

        f.session.play_pause(0).await.unwrap();
        assert_eq!(f.session.play_pause(1).await.unwrap(), PlaybackState::Playing(1));
        assert_eq!(events(&f.sink), vec!["start 2ch", "stop 2ch", "start 2ch"]);
    }

    #[tokio::test]
    async fn test_preview_uses_current_config() {
        let mut f = fixture(&["a.wav"]).await;
        f.session
            .set_config(ConversionConfig::new(8000, 1, ChannelMode::Mix))
            .unwrap();

        f.session.play_pause(0).await.unwrap();
        assert_eq!(events(&f.sink), vec!["start 1ch"]);
    }

    #[tokio::test]
    async fn test_mutations_stop_playback() {
        let mut f = fixture(&["a.wav", "b.wav"]).await;

        f.session.play_pause(1).await.unwrap();
        f.session.set_config(ConversionConfig::default()).unwrap();
        assert_eq!(f.session.playback_state(), PlaybackState::Idle);

        f.session.play_pause(1).await.unwrap();
        f.session.remove(0).unwrap();
        assert_eq!(f.session.playback_state(), PlaybackState::Idle);

        f.session.play_pause(0).await.unwrap();
        f.session
            .add(vec![SourceFile::new("0.wav", "audio/wav", b"4".to_vec())])
            .await;
        assert_eq!(f.session.playback_state(), PlaybackState::Idle);

        f.session.play_pause(0).await.unwrap();
        f.session.clear();
        assert_eq!(f.session.playback_state(), PlaybackState::Idle);
        assert!(f.session.registry().is_empty());
    }

    #[tokio::test]
    async fn test_natural_end_returns_to_idle() {
        let mut f = fixture(&["a.wav"]).await;

        f.session.play_pause(0).await.unwrap();
        f.sink.senders.lock().unwrap().remove(0).send(()).unwrap();

        assert_eq!(f.session.poll_playback(), PlaybackState::Idle);
        // Pressing play again restarts rather than toggling off.
        assert_eq!(f.session.play_pause(0).await.unwrap(), PlaybackState::Playing(0));
    }

    #[tokio::test]
    async fn test_invalid_config_rejected() {
        let mut f = fixture(&["a.wav"]).await;
        let result = f.session.set_config(ConversionConfig::new(8000, 3, ChannelMode::Both));

        assert!(matches!(result, Err(WavconvError::UnsupportedSampleWidth { .. })));
        assert_eq!(f.session.config().bytes_per_sample, 2);
    }

    #[tokio::test]
    async fn test_save_all_names_and_order() {
        let f = fixture(&["b.mp3", "a.ogg"]).await;
        let report = f.session.save_all().await;

        assert!(report.is_complete());
        assert_eq!(report.saved, vec!["a.wav", "b.wav"]);

        let mut names: Vec<String> = f.saved.blobs().into_iter().map(|(n, _)| n).collect();
        names.sort();
        assert_eq!(names, vec!["a.wav", "b.wav"]);
    }

    #[tokio::test]
    async fn test_save_all_rejects_colliding_output_names() {
        let f = fixture(&["a.ogg", "a.mp3", "b.flac"]).await;
        let report = f.session.save_all().await;

        assert_eq!(report.saved, vec!["a.wav", "b.wav"]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].name, "a.ogg");
        assert!(matches!(
            report.failed[0].error,
            WavconvError::PersistFailed { .. }
        ));
        assert!(report.failed[0].error.to_string().contains("a.mp3"));

        // Only one blob per output name reaches the sink.
        assert_eq!(f.saved.blobs().len(), 2);
    }

    #[tokio::test]
    async fn test_save_single_asset() {
        let f = fixture(&["voice.flac"]).await;
        let name = f.session.save(0).await.unwrap();

        assert_eq!(name, "voice.wav");
        let wav = f.saved.get("voice.wav").unwrap();
        // 16 stereo frames at 16 bits
        assert_eq!(wav.len(), 44 + 16 * 2 * 2);
    }

    #[tokio::test]
    async fn test_convert_out_of_range() {
        let f = fixture(&["a.wav"]).await;
        assert!(matches!(
            f.session.convert(4).await,
            Err(WavconvError::IndexOutOfRange { index: 4, len: 1 })
        ));
    }

    #[tokio::test]
    async fn test_summaries() {
        let mut f = fixture(&["a.wav", "b.wav"]).await;
        f.session.play_pause(1).await.unwrap();

        let summaries = f.session.summaries();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[1].name, "b.wav");
        assert!(summaries[1].playing);
        assert!(!summaries[0].playing);
        assert_eq!(summaries[0].source_byte_size, 2);
        assert_eq!(summaries[0].estimated_output_size, 16 * 2 * 2);
    }
}
