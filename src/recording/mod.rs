//! Alert-triggered recording pipeline.
//!
//! Every frame from the live feed passes through a short pre-alert buffer.
//! When the backend status turns into an alert, a session opens with that
//! buffer as context; when it returns to normal, the session becomes a
//! [`Recording`] and is handed to the store.

pub mod classifier;
pub mod recorder;
pub mod recording_machine;
pub mod ring_buffer;
pub mod status;
pub mod types;

pub use classifier::{StatusClassifier, UNKNOWN_STATUS};
pub use recorder::AlertRecorder;
pub use recording_machine::{RecordingMachine, RecordingPhase, Transition};
pub use ring_buffer::PreAlertBuffer;
pub use status::{MonitorState, MonitorStatusHandle};
pub use types::{Frame, Recording, FRAME_RATE};
