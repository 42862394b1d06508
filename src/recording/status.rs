//! Monitor status types and shared state handle.

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::recording_machine::RecordingPhase;
use crate::feed::{ConnectionState, Vitals};

/// Snapshot of the live monitor, readable by API handlers.
#[derive(Debug, Clone, Serialize)]
pub struct MonitorState {
    /// Name of the camera feed this state belongs to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feed: Option<String>,
    pub connection: ConnectionState,
    /// Latest status label from the backend.
    pub backend_status: String,
    pub phase: RecordingPhase,
    pub alert_type: Option<String>,
    pub active_frames: usize,
    pub vitals: Vitals,
    pub frames_received: u64,
    pub last_recording_id: Option<String>,
    pub last_error: Option<String>,
}

impl Default for MonitorState {
    fn default() -> Self {
        Self {
            feed: None,
            connection: ConnectionState::Disconnected,
            backend_status: "CONNECTING...".to_string(),
            phase: RecordingPhase::Idle,
            alert_type: None,
            active_frames: 0,
            vitals: Vitals::default(),
            frames_received: 0,
            last_recording_id: None,
            last_error: None,
        }
    }
}

/// Thread-safe handle for sharing monitor state between the recorder and API handlers.
#[derive(Clone, Default)]
pub struct MonitorStatusHandle {
    inner: Arc<Mutex<MonitorState>>,
}

impl MonitorStatusHandle {
    /// Handle for a named feed.
    pub fn for_feed(name: impl Into<String>) -> Self {
        let state = MonitorState {
            feed: Some(name.into()),
            ..MonitorState::default()
        };
        Self {
            inner: Arc::new(Mutex::new(state)),
        }
    }

    pub async fn feed(&self) -> Option<String> {
        self.inner.lock().await.feed.clone()
    }

    pub async fn get(&self) -> MonitorState {
        self.inner.lock().await.clone()
    }

    pub async fn set_connection(&self, connection: ConnectionState) {
        let mut state = self.inner.lock().await;
        state.connection = connection;
        if connection == ConnectionState::Connecting {
            state.backend_status = "CONNECTING...".to_string();
        }
    }

    pub async fn set_backend_status(&self, status: &str) {
        let mut state = self.inner.lock().await;
        state.backend_status = status.to_string();
    }

    pub async fn set_vitals(&self, vitals: Vitals) {
        let mut state = self.inner.lock().await;
        // Partial updates keep the previous readings.
        if vitals.bpm.is_some() {
            state.vitals.bpm = vitals.bpm;
        }
        if vitals.rpm.is_some() {
            state.vitals.rpm = vitals.rpm;
        }
        if vitals.faces_detected.is_some() {
            state.vitals.faces_detected = vitals.faces_detected;
        }
        if vitals.hr_wave.is_some() {
            state.vitals.hr_wave = vitals.hr_wave;
        }
        if vitals.rr_wave.is_some() {
            state.vitals.rr_wave = vitals.rr_wave;
        }
    }

    pub async fn record_frame(
        &self,
        status: &str,
        phase: RecordingPhase,
        alert_type: Option<&str>,
        active_frames: usize,
    ) {
        let mut state = self.inner.lock().await;
        state.frames_received += 1;
        state.backend_status = status.to_string();
        state.phase = phase;
        state.alert_type = alert_type.map(str::to_string);
        state.active_frames = active_frames;
    }

    pub async fn recording_saved(&self, id: &str) {
        let mut state = self.inner.lock().await;
        state.last_recording_id = Some(id.to_string());
        state.last_error = None;
    }

    pub async fn set_error(&self, error: String) {
        let mut state = self.inner.lock().await;
        state.last_error = Some(error);
    }

    pub async fn reset_session(&self) {
        let mut state = self.inner.lock().await;
        state.phase = RecordingPhase::Idle;
        state.alert_type = None;
        state.active_frames = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monitor_state_default() {
        let state = MonitorState::default();
        assert_eq!(state.connection, ConnectionState::Disconnected);
        assert_eq!(state.phase, RecordingPhase::Idle);
        assert_eq!(state.frames_received, 0);
        assert!(state.last_recording_id.is_none());
        assert!(state.last_error.is_none());
    }

    #[test]
    fn test_monitor_state_serialization() {
        let json = serde_json::to_value(MonitorState::default()).unwrap();
        assert_eq!(json["connection"], "DISCONNECTED");
        assert_eq!(json["phase"], "idle");
    }

    #[tokio::test]
    async fn test_named_feed() {
        let handle = MonitorStatusHandle::for_feed("room");
        assert_eq!(handle.feed().await.as_deref(), Some("room"));

        let json = serde_json::to_value(handle.get().await).unwrap();
        assert_eq!(json["feed"], "room");
        assert_eq!(json["backend_status"], "CONNECTING...");

        let json = serde_json::to_value(MonitorState::default()).unwrap();
        assert!(json.get("feed").is_none());
    }

    #[tokio::test]
    async fn test_record_frame() {
        let handle = MonitorStatusHandle::default();
        handle
            .record_frame("CRYING_ALERT", RecordingPhase::Active, Some("CRYING_ALERT"), 6)
            .await;

        let state = handle.get().await;
        assert_eq!(state.frames_received, 1);
        assert_eq!(state.backend_status, "CRYING_ALERT");
        assert_eq!(state.phase, RecordingPhase::Active);
        assert_eq!(state.active_frames, 6);
    }

    #[tokio::test]
    async fn test_vitals_merge() {
        let handle = MonitorStatusHandle::default();
        handle
            .set_vitals(Vitals {
                bpm: Some(88.0),
                rpm: Some(30.0),
                rr_wave: Some(vec![0.1, 0.2]),
                ..Vitals::default()
            })
            .await;
        handle
            .set_vitals(Vitals {
                faces_detected: Some(1),
                hr_wave: Some(vec![88.0]),
                ..Vitals::default()
            })
            .await;

        let vitals = handle.get().await.vitals;
        assert_eq!(vitals.bpm, Some(88.0));
        assert_eq!(vitals.rpm, Some(30.0));
        assert_eq!(vitals.faces_detected, Some(1));
        assert_eq!(vitals.hr_wave, Some(vec![88.0]));
        assert_eq!(vitals.rr_wave, Some(vec![0.1, 0.2]));
    }

    #[tokio::test]
    async fn test_connecting_resets_backend_status() {
        let handle = MonitorStatusHandle::default();
        handle.set_backend_status("SAFE").await;
        handle.set_connection(ConnectionState::Connecting).await;

        let state = handle.get().await;
        assert_eq!(state.connection, ConnectionState::Connecting);
        assert_eq!(state.backend_status, "CONNECTING...");
    }

    #[tokio::test]
    async fn test_saved_clears_error() {
        let handle = MonitorStatusHandle::default();
        handle.set_error("disk full".to_string()).await;
        handle.recording_saved("abc").await;

        let state = handle.get().await;
        assert_eq!(state.last_recording_id, Some("abc".to_string()));
        assert!(state.last_error.is_none());
    }
}
