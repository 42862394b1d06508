//! Recording playback: frame stepping at a fixed rate with per-frame audio.

pub mod controller;
pub mod wav;

use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

use crate::recording::Frame;

pub use controller::{PlaybackController, PlaybackState};

/// Displays one frame of a recording.
pub trait FrameRenderer: Send {
    fn render(&mut self, index: usize, total: usize, frame: &Frame);
}

/// Output for per-frame audio. `stop` is always called before the next `play`.
#[async_trait]
pub trait AudioSink: Send {
    async fn play(&mut self, wav: Vec<u8>) -> Result<()>;
    async fn stop(&mut self) -> Result<()>;
}

/// Sink for hosts without an audio device. Counts what would have played.
#[derive(Debug, Default)]
pub struct NullAudioSink {
    played: usize,
    bytes: usize,
}

impl NullAudioSink {
    pub fn played(&self) -> usize {
        self.played
    }

    pub fn bytes(&self) -> usize {
        self.bytes
    }
}

#[async_trait]
impl AudioSink for NullAudioSink {
    async fn play(&mut self, wav: Vec<u8>) -> Result<()> {
        debug!("Discarding {} bytes of frame audio", wav.len());
        self.played += 1;
        self.bytes += wav.len();
        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        Ok(())
    }
}
