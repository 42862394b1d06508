//! Recording history operations.
//!
//! Service layer over the recording store, shared by the CLI and the REST API.

use crate::playback::wav;
use crate::recording::Recording;
use crate::store::RecordingStore;
use anyhow::{anyhow, Context, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Parameters for listing saved recordings.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct ListParams {
    /// Only recordings whose alert type contains this text
    pub alert_type: Option<String>,
    /// Only recordings from the feed with this name
    pub feed: Option<String>,
    /// Maximum number of results
    pub limit: usize,
}

impl ListParams {
    pub fn new() -> Self {
        Self {
            limit: 20,
            ..Default::default()
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_alert_type(mut self, alert_type: impl Into<String>) -> Self {
        self.alert_type = Some(alert_type.into());
        self
    }

    pub fn with_feed(mut self, feed: impl Into<String>) -> Self {
        self.feed = Some(feed.into());
        self
    }

    fn matches(&self, recording: &Recording) -> bool {
        let alert_matches = match &self.alert_type {
            Some(filter) => recording.alert_type.contains(filter.as_str()),
            None => true,
        };
        let feed_matches = match &self.feed {
            Some(feed) => recording.feed.as_deref() == Some(feed.as_str()),
            None => true,
        };
        alert_matches && feed_matches
    }
}

/// A recording without its frame payloads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingSummary {
    pub id: String,
    pub timestamp: i64,
    pub alert_type: String,
    pub feed: Option<String>,
    pub frame_count: usize,
    pub duration_secs: f64,
    pub has_audio: bool,
    pub created_at: String,
}

impl From<&Recording> for RecordingSummary {
    fn from(recording: &Recording) -> Self {
        Self {
            id: recording.id.clone(),
            timestamp: recording.timestamp,
            alert_type: recording.alert_type.clone(),
            feed: recording.feed.clone(),
            frame_count: recording.frame_count(),
            duration_secs: recording.duration_secs(),
            has_audio: recording.frames.iter().any(|f| f.has_audio()),
            created_at: format_timestamp(recording.timestamp),
        }
    }
}

/// Local wall-clock rendering of an epoch-millisecond timestamp.
pub fn format_timestamp(millis: i64) -> String {
    DateTime::from_timestamp_millis(millis)
        .map(|dt| {
            dt.with_timezone(&Local)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string()
        })
        .unwrap_or_else(|| "Unknown".to_string())
}

/// List recordings, newest first.
pub async fn list(store: &RecordingStore, params: &ListParams) -> Result<Vec<RecordingSummary>> {
    let recordings = store.list().await?;
    Ok(recordings
        .iter()
        .filter(|r| params.matches(r))
        .take(params.limit)
        .map(RecordingSummary::from)
        .collect())
}

/// Get a single recording by ID.
pub async fn get_by_id(store: &RecordingStore, id: &str) -> Result<Option<Recording>> {
    Ok(store.get(id).await?)
}

/// Like [`get_by_id`], but a missing recording is an error.
pub async fn require(store: &RecordingStore, id: &str) -> Result<Recording> {
    get_by_id(store, id)
        .await?
        .ok_or_else(|| anyhow!("Recording with ID {} not found", id))
}

/// Remove a recording. Returns false when no recording had that ID.
pub async fn delete(store: &RecordingStore, id: &str) -> Result<bool> {
    Ok(store.delete(id).await?)
}

/// Decoded JPEG bytes for one frame.
pub fn frame_video(recording: &Recording, index: usize) -> Result<Vec<u8>> {
    let frame = recording
        .frames
        .get(index)
        .ok_or_else(|| anyhow!("Frame {} out of range", index))?;
    BASE64
        .decode(frame.video.trim().as_bytes())
        .with_context(|| format!("Frame {} video is not valid base64", index))
}

/// One frame's audio as WAV, or None when the frame carried no audio.
pub fn frame_audio_wav(recording: &Recording, index: usize) -> Result<Option<Vec<u8>>> {
    let frame = recording
        .frames
        .get(index)
        .ok_or_else(|| anyhow!("Frame {} out of range", index))?;
    match frame.audio.as_deref().filter(|a| !a.is_empty()) {
        Some(encoded) => Ok(Some(wav::encoded_pcm_to_wav(encoded)?)),
        None => Ok(None),
    }
}

/// All of a recording's audio joined into a single WAV.
pub fn recording_audio_wav(recording: &Recording) -> Result<Option<Vec<u8>>> {
    let mut pcm = Vec::new();
    for (index, frame) in recording.frames.iter().enumerate() {
        if let Some(encoded) = frame.audio.as_deref().filter(|a| !a.is_empty()) {
            let mut bytes = wav::decode_audio(encoded)
                .with_context(|| format!("Frame {} audio is not valid base64", index))?;
            // Keep sample alignment across chunk boundaries.
            if bytes.len() % 2 == 1 {
                bytes.pop();
            }
            pcm.extend_from_slice(&bytes);
        }
    }

    if pcm.is_empty() {
        return Ok(None);
    }
    Ok(Some(wav::pcm16_to_wav(&pcm)?))
}

/// Files written by [`export`].
#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub dir: PathBuf,
    pub frames_written: usize,
    pub audio_file: Option<PathBuf>,
    pub metadata_file: PathBuf,
}

/// Write a recording to `dir` as numbered JPEGs, one WAV and a JSON summary.
pub fn export(recording: &Recording, dir: &Path) -> Result<ExportSummary> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create export directory {}", dir.display()))?;

    for index in 0..recording.frames.len() {
        let jpeg = frame_video(recording, index)?;
        let path = dir.join(format!("frame-{:04}.jpg", index));
        std::fs::write(&path, jpeg)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }

    let audio_file = match recording_audio_wav(recording)? {
        Some(wav) => {
            let path = dir.join("audio.wav");
            std::fs::write(&path, wav)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            Some(path)
        }
        None => None,
    };

    let metadata_file = dir.join("recording.json");
    let metadata = serde_json::to_string_pretty(&RecordingSummary::from(recording))?;
    std::fs::write(&metadata_file, metadata)
        .with_context(|| format!("Failed to write {}", metadata_file.display()))?;

    info!(
        "Exported recording {} ({} frames) to {}",
        recording.id,
        recording.frame_count(),
        dir.display()
    );

    Ok(ExportSummary {
        dir: dir.to_path_buf(),
        frames_written: recording.frames.len(),
        audio_file,
        metadata_file,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::Frame;
    use crate::store::MemoryKvStore;
    use std::sync::Arc;

    fn recording(id: &str, alert_type: &str, frames: Vec<Frame>) -> Recording {
        Recording {
            id: id.to_string(),
            timestamp: 1_700_000_000_000,
            alert_type: alert_type.to_string(),
            frames,
            feed: None,
        }
    }

    fn jpeg_frame(byte: u8, audio: Option<&[u8]>) -> Frame {
        Frame::new(BASE64.encode([0xff, 0xd8, byte]), audio.map(|a| BASE64.encode(a)))
    }

    fn store() -> RecordingStore {
        RecordingStore::new(Arc::new(MemoryKvStore::new()), "test", 20)
    }

    #[test]
    fn test_list_params_builder() {
        let params = ListParams::new();
        assert_eq!(params.limit, 20);
        assert!(params.alert_type.is_none());

        let params = ListParams::new().with_limit(5).with_alert_type("CRY");
        assert_eq!(params.limit, 5);
        assert_eq!(params.alert_type, Some("CRY".to_string()));
    }

    #[test]
    fn test_summary_from_recording() {
        let rec = recording(
            "a",
            "CRYING_ALERT",
            vec![jpeg_frame(1, None), jpeg_frame(2, Some(&[1, 0][..]))],
        );
        let summary = RecordingSummary::from(&rec);

        assert_eq!(summary.id, "a");
        assert_eq!(summary.frame_count, 2);
        assert!(summary.has_audio);
        assert!((summary.duration_secs - 2.0 / 30.0).abs() < 1e-9);
        assert_ne!(summary.created_at, "Unknown");
    }

    #[tokio::test]
    async fn test_list_filters_and_limits() {
        let store = store();
        store
            .save(recording("a", "CRYING_ALERT", vec![jpeg_frame(1, None)]))
            .await
            .unwrap();
        store
            .save(recording("b", "ERROR: camera", vec![jpeg_frame(1, None)]))
            .await
            .unwrap();
        store
            .save(recording("c", "CRYING_ALERT", vec![jpeg_frame(1, None)]))
            .await
            .unwrap();

        let all = list(&store, &ListParams::new()).await.unwrap();
        let ids: Vec<_> = all.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "b", "a"]);

        let crying = list(&store, &ListParams::new().with_alert_type("CRYING"))
            .await
            .unwrap();
        assert_eq!(crying.len(), 2);

        let one = list(&store, &ListParams::new().with_limit(1)).await.unwrap();
        assert_eq!(one[0].id, "c");
    }

    #[tokio::test]
    async fn test_list_by_feed() {
        let store = store();
        for (id, feed) in [("a", Some("baby")), ("b", Some("room")), ("c", None)] {
            let mut rec = recording(id, "ALERT", vec![jpeg_frame(1, None)]);
            rec.feed = feed.map(str::to_string);
            store.save(rec).await.unwrap();
        }

        let room = list(&store, &ListParams::new().with_feed("room")).await.unwrap();
        assert_eq!(room.len(), 1);
        assert_eq!(room[0].id, "b");
        assert_eq!(room[0].feed.as_deref(), Some("room"));

        let all = list(&store, &ListParams::new()).await.unwrap();
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn test_require_and_delete() {
        let store = store();
        store
            .save(recording("a", "ALERT", vec![jpeg_frame(1, None)]))
            .await
            .unwrap();

        assert_eq!(require(&store, "a").await.unwrap().id, "a");
        assert!(require(&store, "missing").await.is_err());

        assert!(delete(&store, "a").await.unwrap());
        assert!(!delete(&store, "a").await.unwrap());
        assert!(get_by_id(&store, "a").await.unwrap().is_none());
    }

    #[test]
    fn test_frame_payloads() {
        let rec = recording(
            "a",
            "ALERT",
            vec![jpeg_frame(7, Some(&[1, 0, 2, 0][..])), jpeg_frame(8, None)],
        );

        assert_eq!(frame_video(&rec, 0).unwrap(), vec![0xff, 0xd8, 7]);
        assert!(frame_video(&rec, 5).is_err());

        let wav = frame_audio_wav(&rec, 0).unwrap().unwrap();
        assert_eq!(wav.len(), 44 + 4);
        assert!(frame_audio_wav(&rec, 1).unwrap().is_none());
    }

    #[test]
    fn test_recording_audio_joins_frames() {
        let rec = recording(
            "a",
            "ALERT",
            vec![
                jpeg_frame(1, Some(&[1, 0, 9][..])),
                jpeg_frame(2, None),
                jpeg_frame(3, Some(&[2, 0][..])),
            ],
        );
        let wav = recording_audio_wav(&rec).unwrap().unwrap();
        assert_eq!(wav.len(), 44 + 4);

        let silent = recording("b", "ALERT", vec![jpeg_frame(1, None)]);
        assert!(recording_audio_wav(&silent).unwrap().is_none());
    }

    #[test]
    fn test_export_writes_files() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("export");
        let rec = recording(
            "abc",
            "CRYING_ALERT",
            vec![jpeg_frame(1, Some(&[1, 0][..])), jpeg_frame(2, None)],
        );

        let summary = export(&rec, &target).unwrap();

        assert_eq!(summary.frames_written, 2);
        assert_eq!(
            std::fs::read(target.join("frame-0001.jpg")).unwrap(),
            vec![0xff, 0xd8, 2]
        );
        assert!(target.join("audio.wav").exists());

        let metadata: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&summary.metadata_file).unwrap())
                .unwrap();
        assert_eq!(metadata["id"], "abc");
        assert_eq!(metadata["frame_count"], 2);
    }

    #[test]
    fn test_export_without_audio() {
        let dir = tempfile::tempdir().unwrap();
        let rec = recording("abc", "ALERT", vec![jpeg_frame(1, None)]);
        let summary = export(&rec, dir.path()).unwrap();
        assert!(summary.audio_file.is_none());
        assert!(!dir.path().join("audio.wav").exists());
    }
}
