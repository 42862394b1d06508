//! Bounded collection of completed recordings.
//!
//! The whole collection lives as one JSON document under a fixed key, newest
//! first. Writers are serialized and every change is a single backend write,
//! so readers see either the old or the new collection.

pub mod memory;
pub mod sqlite;

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::RecordingConfig;
use crate::recording::Recording;

pub use memory::MemoryKvStore;
pub use sqlite::SqliteKvStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage backend error: {0}")]
    Backend(#[from] anyhow::Error),
    #[error("failed to serialize recordings: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("stored recordings are corrupt: {0}")]
    Corrupt(String),
    #[error("refusing to save a recording with no frames")]
    EmptyRecording,
    #[error("storage task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// String key-value persistence the recordings collection is kept in.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    async fn set(&self, key: &str, value: String) -> Result<(), StoreError>;
}

pub struct RecordingStore {
    backend: Arc<dyn KeyValueStore>,
    key: String,
    max_recordings: usize,
    write_lock: Mutex<()>,
}

impl RecordingStore {
    pub fn new(
        backend: Arc<dyn KeyValueStore>,
        key: impl Into<String>,
        max_recordings: usize,
    ) -> Self {
        Self {
            backend,
            key: key.into(),
            max_recordings: max_recordings.max(1),
            write_lock: Mutex::new(()),
        }
    }

    pub fn from_config(backend: Arc<dyn KeyValueStore>, config: &RecordingConfig) -> Self {
        Self::new(backend, config.storage_key.clone(), config.max_recordings)
    }

    /// Prepend `recording`, evicting the oldest entries beyond the cap.
    pub async fn save(&self, recording: Recording) -> Result<(), StoreError> {
        if recording.frames.is_empty() {
            return Err(StoreError::EmptyRecording);
        }

        let _guard = self.write_lock.lock().await;

        let raw = self.backend.get(&self.key).await?;
        let mut recordings = match parse(raw.as_deref()) {
            Ok(recordings) => recordings,
            Err(StoreError::Corrupt(e)) => {
                // Copied aside before anything overwrites it.
                let backup_key = backup_key(&self.key);
                self.backend
                    .set(&backup_key, raw.unwrap_or_default())
                    .await?;
                warn!(
                    "Recordings collection is unreadable ({}); kept it as {} and started anew",
                    e, backup_key
                );
                Vec::new()
            }
            Err(e) => return Err(e),
        };

        let id = recording.id.clone();
        recordings.insert(0, recording);

        if recordings.len() > self.max_recordings {
            let evicted = recordings.len() - self.max_recordings;
            recordings.truncate(self.max_recordings);
            debug!("Evicted {} oldest recording(s)", evicted);
        }

        self.write(&recordings).await?;
        info!("Saved recording {} ({} stored)", id, recordings.len());
        Ok(())
    }

    /// All recordings, newest first.
    pub async fn list(&self) -> Result<Vec<Recording>, StoreError> {
        self.load().await
    }

    pub async fn get(&self, id: &str) -> Result<Option<Recording>, StoreError> {
        Ok(self.load().await?.into_iter().find(|r| r.id == id))
    }

    /// Remove the recording with `id`. Returns false when there was none.
    pub async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let _guard = self.write_lock.lock().await;

        let mut recordings = self.load().await?;
        let before = recordings.len();
        recordings.retain(|r| r.id != id);

        if recordings.len() == before {
            debug!("Delete of unknown recording {} ignored", id);
            return Ok(false);
        }

        self.write(&recordings).await?;
        info!("Deleted recording {}", id);
        Ok(true)
    }

    pub fn max_recordings(&self) -> usize {
        self.max_recordings
    }

    async fn load(&self) -> Result<Vec<Recording>, StoreError> {
        parse(self.backend.get(&self.key).await?.as_deref())
    }

    async fn write(&self, recordings: &[Recording]) -> Result<(), StoreError> {
        let json = serde_json::to_string(recordings)?;
        self.backend.set(&self.key, json).await
    }
}

fn backup_key(key: &str) -> String {
    format!("{}.corrupt-{}", key, Utc::now().timestamp_millis())
}

fn parse(raw: Option<&str>) -> Result<Vec<Recording>, StoreError> {
    match raw {
        Some(json) => serde_json::from_str(json).map_err(|e| StoreError::Corrupt(e.to_string())),
        None => Ok(Vec::new()),
    }
}
