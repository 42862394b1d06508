//! API route modules.

pub mod recordings;
pub mod status;

use crate::recording::MonitorStatusHandle;
use crate::store::RecordingStore;
use std::sync::Arc;

/// Shared state for all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RecordingStore>,
    /// One handle per watched feed, in configuration order.
    pub monitors: Vec<MonitorStatusHandle>,
}
