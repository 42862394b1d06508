//! Live monitor status endpoints.

use super::AppState;
use crate::api::error::{ApiError, ApiResult};
use crate::recording::MonitorState;
use axum::{
    extract::{Path, State},
    response::Json,
    routing::get,
    Router,
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub feeds: Vec<MonitorState>,
}

/// Creates the status router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/status", get(monitor_status))
        .route("/status/:feed", get(feed_status))
        .with_state(state)
}

/// GET /status - Connection, backend status, vitals and recording progress of every feed.
async fn monitor_status(State(state): State<AppState>) -> Json<StatusResponse> {
    let mut feeds = Vec::with_capacity(state.monitors.len());
    for monitor in &state.monitors {
        feeds.push(monitor.get().await);
    }
    Json(StatusResponse { feeds })
}

/// GET /status/:feed - One feed's status.
async fn feed_status(
    State(state): State<AppState>,
    Path(feed): Path<String>,
) -> ApiResult<Json<MonitorState>> {
    for monitor in &state.monitors {
        let current = monitor.get().await;
        if current.feed.as_deref() == Some(feed.as_str()) {
            return Ok(Json(current));
        }
    }
    Err(ApiError::not_found(format!("Feed {} not found", feed)))
}
