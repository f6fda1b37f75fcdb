//! Persistence sinks for converted files

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{Result, WavconvError};
use crate::services::PersistenceSink;

/// Writes each blob to `<dir>/<name>`, creating the directory on demand
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Get the output directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl PersistenceSink for DirectorySink {
    async fn persist(&self, name: &str, bytes: Vec<u8>) -> Result<()> {
        let failed = |e: std::io::Error| WavconvError::PersistFailed {
            name: name.to_string(),
            reason: e.to_string(),
        };

        // Only the final path component is used so names cannot escape `dir`.
        let file_name = Path::new(name).file_name().ok_or_else(|| WavconvError::PersistFailed {
            name: name.to_string(),
            reason: "not a file name".to_string(),
        })?;

        tokio::fs::create_dir_all(&self.dir).await.map_err(failed)?;
        let path = self.dir.join(file_name);
        tokio::fs::write(&path, bytes).await.map_err(failed)?;

        log::debug!("Wrote {}", path.display());
        Ok(())
    }
}

/// Keeps blobs in memory in the order they were persisted
#[derive(Debug, Default)]
pub struct MemorySink {
    blobs: Mutex<Vec<(String, Vec<u8>)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every persisted `(name, bytes)` pair
    pub fn blobs(&self) -> Vec<(String, Vec<u8>)> {
        self.blobs
            .lock()
            .map(|blobs| blobs.clone())
            .unwrap_or_default()
    }

    /// Bytes most recently persisted under `name`
    pub fn get(&self, name: &str) -> Option<Vec<u8>> {
        self.blobs().into_iter().rev().find(|(n, _)| n == name).map(|(_, b)| b)
    }
}

#[async_trait]
impl PersistenceSink for MemorySink {
    async fn persist(&self, name: &str, bytes: Vec<u8>) -> Result<()> {
        let mut blobs = self.blobs.lock().map_err(|_| WavconvError::PersistFailed {
            name: name.to_string(),
            reason: "memory sink poisoned".to_string(),
        })?;
        blobs.push((name.to_string(), bytes));
        Ok(())
    }
}
