use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::classifier::{StatusClassifier, UNKNOWN_STATUS};
use super::ring_buffer::PreAlertBuffer;
use super::types::{Frame, Recording};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordingPhase {
    Idle,
    Active,
}

impl RecordingPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordingPhase::Idle => "idle",
            RecordingPhase::Active => "active",
        }
    }
}

/// What a single `ingest` call did to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Not recording, frame only went to the pre-alert buffer.
    Idle,
    /// An alert edge opened a new session.
    Started,
    /// Frame appended to the running session.
    Continued,
    /// The alert cleared; the session is complete and already reset.
    Finished(Recording),
}

/// Edge-triggered recorder: opens a session when the status turns into an alert,
/// closes it when the status returns to normal.
pub struct RecordingMachine {
    classifier: StatusClassifier,
    pre_alert: PreAlertBuffer,
    phase: RecordingPhase,
    alert_type: Option<String>,
    frames: Vec<Frame>,
    previous_status: String,
}

impl RecordingMachine {
    pub fn new(classifier: StatusClassifier, pre_alert_frames: usize) -> Self {
        Self {
            classifier,
            pre_alert: PreAlertBuffer::new(pre_alert_frames),
            phase: RecordingPhase::Idle,
            alert_type: None,
            frames: Vec::new(),
            previous_status: UNKNOWN_STATUS.to_string(),
        }
    }

    pub fn ingest(&mut self, frame: Frame, status: Option<&str>) -> Transition {
        let status = match status {
            Some(s) if !s.is_empty() => s,
            _ => UNKNOWN_STATUS,
        };
        let is_alert = self.classifier.is_alert(Some(status));
        let was_alert = self.classifier.is_alert(Some(&self.previous_status));

        let mut transition = Transition::Idle;

        if is_alert && self.phase == RecordingPhase::Idle {
            // Context is the frames before this one; the trigger is appended below.
            self.frames = self.pre_alert.snapshot();
            self.alert_type = Some(status.to_string());
            self.phase = RecordingPhase::Active;
            info!(
                "Alert '{}' started, recording with {} pre-alert frames",
                status,
                self.frames.len()
            );
            transition = Transition::Started;
        }

        if self.phase == RecordingPhase::Active {
            self.frames.push(frame.clone());
            if transition == Transition::Idle {
                transition = Transition::Continued;
            }
        }

        if self.phase == RecordingPhase::Active && was_alert && !is_alert {
            transition = Transition::Finished(self.finalize());
        }

        self.pre_alert.push(frame);
        self.previous_status = status.to_string();

        transition
    }

    /// Drop an unfinished session without persisting it. Returns the number of frames lost.
    pub fn discard(&mut self) -> usize {
        let dropped = self.frames.len();
        if self.phase == RecordingPhase::Active {
            warn!(
                "Discarding unfinished '{}' recording ({} frames)",
                self.alert_type.as_deref().unwrap_or(UNKNOWN_STATUS),
                dropped
            );
        }

        self.phase = RecordingPhase::Idle;
        self.alert_type = None;
        self.frames.clear();
        self.pre_alert.clear();
        self.previous_status = UNKNOWN_STATUS.to_string();
        dropped
    }

    pub fn phase(&self) -> RecordingPhase {
        self.phase
    }

    pub fn alert_type(&self) -> Option<&str> {
        self.alert_type.as_deref()
    }

    pub fn active_frame_count(&self) -> usize {
        self.frames.len()
    }

    fn finalize(&mut self) -> Recording {
        let recording = Recording {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now().timestamp_millis(),
            alert_type: self
                .alert_type
                .take()
                .unwrap_or_else(|| UNKNOWN_STATUS.to_string()),
            frames: std::mem::take(&mut self.frames),
            feed: None,
        };
        self.phase = RecordingPhase::Idle;

        debug!(
            "Recording {} finalized: {} frames",
            recording.id,
            recording.frames.len()
        );
        recording
    }
}
