use serde::Serialize;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::wav;
use super::{AudioSink, FrameRenderer};
use crate::recording::{Recording, FRAME_RATE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    Stopped,
    Playing,
    Paused,
}

/// Replays a recording at a fixed frame rate, one audio render per frame.
pub struct PlaybackController<R, A> {
    recording: Recording,
    renderer: R,
    audio: A,
    frame_rate: u32,
    current_frame: usize,
    state: PlaybackState,
    audio_active: bool,
}

impl<R: FrameRenderer, A: AudioSink> PlaybackController<R, A> {
    pub fn new(recording: Recording, renderer: R, audio: A) -> Self {
        Self {
            recording,
            renderer,
            audio,
            frame_rate: FRAME_RATE,
            current_frame: 0,
            state: PlaybackState::Stopped,
            audio_active: false,
        }
    }

    pub fn with_frame_rate(mut self, frame_rate: u32) -> Self {
        self.frame_rate = frame_rate.max(1);
        self
    }

    /// Start from the first frame.
    pub async fn play(&mut self) {
        if self.recording.frames.is_empty() {
            return;
        }
        self.stop_audio().await;
        self.state = PlaybackState::Playing;
        self.current_frame = 0;
        self.show(0).await;
    }

    /// Advance one frame. Past the last frame playback stops and rewinds.
    pub async fn tick(&mut self) -> PlaybackState {
        if self.state != PlaybackState::Playing {
            return self.state;
        }

        let next = self.current_frame + 1;
        if next >= self.recording.frames.len() {
            debug!("Playback of {} finished", self.recording.id);
            self.stop().await;
        } else {
            self.current_frame = next;
            self.show(next).await;
        }
        self.state
    }

    pub async fn pause(&mut self) {
        if self.state == PlaybackState::Playing {
            self.state = PlaybackState::Paused;
            self.stop_audio().await;
        }
    }

    pub fn resume(&mut self) {
        if self.state == PlaybackState::Paused {
            self.state = PlaybackState::Playing;
        }
    }

    pub async fn stop(&mut self) {
        self.state = PlaybackState::Stopped;
        self.current_frame = 0;
        self.stop_audio().await;
    }

    /// Drive playback from a timer until it finishes or `cancel` fires.
    ///
    /// A paused controller returns at once; call [`resume`](Self::resume) first.
    pub async fn run(&mut self, cancel: &CancellationToken) {
        match self.state {
            PlaybackState::Stopped => self.play().await,
            PlaybackState::Paused => return,
            PlaybackState::Playing => {}
        }
        if self.state != PlaybackState::Playing {
            return;
        }

        let mut interval = tokio::time::interval(self.frame_interval());
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; frame 0 is already showing.
        interval.tick().await;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    self.stop().await;
                    break;
                }
                _ = interval.tick() => {
                    if self.tick().await == PlaybackState::Stopped {
                        break;
                    }
                }
            }
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn current_frame(&self) -> usize {
        self.current_frame
    }

    pub fn frame_count(&self) -> usize {
        self.recording.frames.len()
    }

    pub fn position_secs(&self) -> f64 {
        self.current_frame as f64 / self.frame_rate as f64
    }

    pub fn duration_secs(&self) -> f64 {
        self.recording.frames.len() as f64 / self.frame_rate as f64
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.frame_rate as f64)
    }

    pub fn recording(&self) -> &Recording {
        &self.recording
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn audio_sink(&self) -> &A {
        &self.audio
    }

    async fn show(&mut self, index: usize) {
        let total = self.recording.frames.len();
        let Some(frame) = self.recording.frames.get(index) else {
            return;
        };
        self.renderer.render(index, total, frame);

        // Frames without audio leave the previous render playing.
        let wav = match frame.audio.as_deref().filter(|a| !a.is_empty()) {
            Some(encoded) => match wav::encoded_pcm_to_wav(encoded) {
                Ok(wav) => wav,
                Err(e) => {
                    warn!("Skipping audio for frame {}: {:#}", index, e);
                    return;
                }
            },
            None => return,
        };

        self.stop_audio().await;
        match self.audio.play(wav).await {
            Ok(()) => self.audio_active = true,
            Err(e) => warn!("Audio playback failed for frame {}: {:#}", index, e),
        }
    }

    async fn stop_audio(&mut self) {
        if !self.audio_active {
            return;
        }
        self.audio_active = false;
        if let Err(e) = self.audio.stop().await {
            warn!("Failed to stop audio: {:#}", e);
        }
    }
}
