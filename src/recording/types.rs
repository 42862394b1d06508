//! Frames and recordings, in the shape they are persisted.

use serde::{Deserialize, Serialize};

/// Fixed playback rate of the live feed, used to express recording length in seconds.
pub const FRAME_RATE: u32 = 30;

/// One unit of live data: an encoded image plus the audio received alongside it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    /// Base64 JPEG payload as sent by the backend.
    pub video: String,
    /// Base64 16 kHz mono 16-bit little-endian PCM.
    #[serde(default)]
    pub audio: Option<String>,
}

impl Frame {
    pub fn new(video: impl Into<String>, audio: Option<String>) -> Self {
        Self {
            video: video.into(),
            audio,
        }
    }

    pub fn has_audio(&self) -> bool {
        self.audio.as_deref().is_some_and(|a| !a.is_empty())
    }
}

/// A completed alert episode: pre-alert context followed by the in-alert frames.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recording {
    pub id: String,
    /// Epoch milliseconds at finalization.
    pub timestamp: i64,
    /// Status that started the episode.
    pub alert_type: String,
    pub frames: Vec<Frame>,
    /// Name of the camera feed the episode came from. Absent in collections
    /// written before feeds were named.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feed: Option<String>,
}

impl Recording {
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn duration_secs(&self) -> f64 {
        self.frames.len() as f64 / FRAME_RATE as f64
    }
}
