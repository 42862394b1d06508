use std::sync::Arc;
use tracing::{error, info};

use super::classifier::{StatusClassifier, UNKNOWN_STATUS};
use super::recording_machine::{RecordingMachine, RecordingPhase, Transition};
use super::status::MonitorStatusHandle;
use crate::config::RecordingConfig;
use crate::feed::FeedEvent;
use crate::store::RecordingStore;

/// Per-feed controller: owns the session state machine, persists finished
/// recordings and mirrors progress into the shared status handle.
pub struct AlertRecorder {
    machine: RecordingMachine,
    store: Arc<RecordingStore>,
    status: MonitorStatusHandle,
    feed: Option<String>,
}

impl AlertRecorder {
    pub fn new(
        machine: RecordingMachine,
        store: Arc<RecordingStore>,
        status: MonitorStatusHandle,
    ) -> Self {
        Self {
            machine,
            store,
            status,
            feed: None,
        }
    }

    /// Tag every saved recording with the feed it came from.
    pub fn with_feed(mut self, name: impl Into<String>) -> Self {
        self.feed = Some(name.into());
        self
    }

    pub fn from_config(
        config: &RecordingConfig,
        store: Arc<RecordingStore>,
        status: MonitorStatusHandle,
    ) -> Self {
        let classifier = StatusClassifier::new(config.alert_markers.iter().cloned());
        let machine = RecordingMachine::new(classifier, config.pre_alert_frames);
        Self::new(machine, store, status)
    }

    /// Apply one feed event. Returns the id of a recording persisted as a result.
    pub async fn handle_event(&mut self, event: FeedEvent) -> Option<String> {
        match event {
            FeedEvent::Connection(connection) => {
                self.status.set_connection(connection).await;
                if connection.is_down() {
                    self.machine.discard();
                    self.status.reset_session().await;
                }
                None
            }
            FeedEvent::Frame { frame, status } => {
                let label = status.as_deref().unwrap_or(UNKNOWN_STATUS).to_string();
                let transition = self.machine.ingest(frame, status.as_deref());

                self.status
                    .record_frame(
                        &label,
                        self.machine.phase(),
                        self.machine.alert_type(),
                        self.machine.active_frame_count(),
                    )
                    .await;

                match transition {
                    Transition::Finished(mut recording) => {
                        recording.feed = self.feed.clone();
                        let id = recording.id.clone();
                        let frames = recording.frame_count();
                        let alert_type = recording.alert_type.clone();

                        // Session is already reset; persistence is best effort.
                        match self.store.save(recording).await {
                            Ok(()) => {
                                info!(
                                    "Alert '{}' cleared on {}, saved recording {} ({} frames)",
                                    alert_type,
                                    self.feed.as_deref().unwrap_or("feed"),
                                    id,
                                    frames
                                );
                                self.status.recording_saved(&id).await;
                                Some(id)
                            }
                            Err(e) => {
                                error!("Failed to save recording {}: {}", id, e);
                                self.status
                                    .set_error(format!("Failed to save recording: {e}"))
                                    .await;
                                None
                            }
                        }
                    }
                    _ => None,
                }
            }
            FeedEvent::Status(status) => {
                self.status.set_backend_status(&status).await;
                None
            }
            FeedEvent::Vitals(vitals) => {
                self.status.set_vitals(vitals).await;
                None
            }
        }
    }

    /// Teardown: an unfinished session is dropped, never persisted.
    pub async fn shutdown(&mut self) {
        let dropped = self.machine.discard();
        if dropped > 0 {
            info!("Monitor stopped mid-alert, {} frames not saved", dropped);
        }
        self.status.reset_session().await;
    }

    pub fn phase(&self) -> RecordingPhase {
        self.machine.phase()
    }
}
