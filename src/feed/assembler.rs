use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use tracing::debug;

use super::message::InboundMessage;
use super::FeedEvent;
use crate::recording::Frame;

/// Most audio held while waiting for a frame: five seconds of 16 kHz mono
/// 16-bit PCM. Older bytes are dropped first.
pub const MAX_PENDING_AUDIO_BYTES: usize = 16_000 * 2 * 5;

/// Turns parsed messages into feed events, carrying separately-sent audio
/// over to the next frame.
#[derive(Debug, Default)]
pub struct FrameAssembler {
    pending_audio: Vec<u8>,
}

impl FrameAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accept(&mut self, message: InboundMessage) -> Vec<FeedEvent> {
        let mut events = Vec::new();

        match message {
            InboundMessage::Frame {
                video,
                audio,
                status,
                vitals,
            } => {
                let audio = match audio {
                    Some(audio) => {
                        self.pending_audio.clear();
                        Some(audio)
                    }
                    None => self.take_pending_audio(),
                };

                if !vitals.is_empty() {
                    events.push(FeedEvent::Vitals(vitals));
                }
                events.push(FeedEvent::Frame {
                    frame: Frame::new(video, audio),
                    status,
                });
            }
            InboundMessage::Audio { audio } => match BASE64.decode(audio.as_bytes()) {
                Ok(pcm) => self.buffer_audio(&pcm),
                Err(e) => debug!("Dropping undecodable audio chunk: {}", e),
            },
            InboundMessage::Status { status, vitals } => {
                if !vitals.is_empty() {
                    events.push(FeedEvent::Vitals(vitals));
                }
                if let Some(status) = status {
                    events.push(FeedEvent::Status(status));
                }
            }
            InboundMessage::Empty => {}
        }

        events
    }

    /// Forget buffered audio, e.g. after the connection dropped.
    pub fn reset(&mut self) {
        self.pending_audio.clear();
    }

    fn buffer_audio(&mut self, pcm: &[u8]) {
        self.pending_audio.extend_from_slice(pcm);
        let len = self.pending_audio.len();
        if len > MAX_PENDING_AUDIO_BYTES {
            // Whole samples only.
            let excess = (len - MAX_PENDING_AUDIO_BYTES).next_multiple_of(2);
            self.pending_audio.drain(..excess);
            debug!("Pending audio over cap, dropped {} oldest bytes", excess);
        }
    }

    fn take_pending_audio(&mut self) -> Option<String> {
        if self.pending_audio.is_empty() {
            return None;
        }
        let encoded = BASE64.encode(&self.pending_audio);
        self.pending_audio.clear();
        Some(encoded)
    }
}
