//! Saved recording endpoints.

use super::AppState;
use crate::api::error::{ApiError, ApiResult};
use crate::history::{self, ListParams, RecordingSummary};
use crate::recording::Recording;
use axum::{
    extract::{Path, Query, State},
    http::header,
    response::Json,
    routing::get,
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

/// Query parameters for listing recordings.
#[derive(Debug, Deserialize, Default)]
pub struct RecordingQueryParams {
    /// Filter by alert type substring
    pub alert_type: Option<String>,
    /// Filter by feed name
    pub feed: Option<String>,
    /// Maximum results (default 20)
    pub limit: Option<usize>,
}

type Binary = ([(header::HeaderName, &'static str); 1], Vec<u8>);

/// Create the recordings router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(list_recordings))
        .route("/:id", get(get_recording).delete(delete_recording))
        .route("/:id/audio.wav", get(recording_audio))
        .route("/:id/frames/:index/audio.wav", get(frame_audio))
        .route("/:id/frames/:index/video.jpg", get(frame_video))
        .with_state(state)
}

/// GET /recordings - List recordings, newest first.
async fn list_recordings(
    State(state): State<AppState>,
    Query(params): Query<RecordingQueryParams>,
) -> ApiResult<Json<Vec<RecordingSummary>>> {
    let list_params = ListParams {
        alert_type: params.alert_type,
        feed: params.feed,
        limit: params.limit.unwrap_or(20),
    };

    let summaries = history::list(&state.store, &list_params).await?;
    Ok(Json(summaries))
}

/// GET /recordings/:id - Full recording including frame payloads.
async fn get_recording(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Recording>> {
    Ok(Json(find(&state, &id).await?))
}

/// DELETE /recordings/:id
async fn delete_recording(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let deleted = history::delete(&state.store, &id).await?;
    Ok(Json(json!({ "deleted": deleted })))
}

/// GET /recordings/:id/audio.wav - All audio of a recording as one WAV.
async fn recording_audio(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Binary> {
    let recording = find(&state, &id).await?;
    let wav = history::recording_audio_wav(&recording)?
        .ok_or_else(|| ApiError::not_found(format!("Recording {} has no audio", id)))?;
    Ok(([(header::CONTENT_TYPE, "audio/wav")], wav))
}

/// GET /recordings/:id/frames/:index/audio.wav
async fn frame_audio(
    State(state): State<AppState>,
    Path((id, index)): Path<(String, usize)>,
) -> ApiResult<Binary> {
    let recording = find_frame(&state, &id, index).await?;
    let wav = history::frame_audio_wav(&recording, index)?
        .ok_or_else(|| ApiError::not_found(format!("Frame {} has no audio", index)))?;
    Ok(([(header::CONTENT_TYPE, "audio/wav")], wav))
}

/// GET /recordings/:id/frames/:index/video.jpg
async fn frame_video(
    State(state): State<AppState>,
    Path((id, index)): Path<(String, usize)>,
) -> ApiResult<Binary> {
    let recording = find_frame(&state, &id, index).await?;
    let jpeg = history::frame_video(&recording, index)?;
    Ok(([(header::CONTENT_TYPE, "image/jpeg")], jpeg))
}

async fn find(state: &AppState, id: &str) -> ApiResult<Recording> {
    history::get_by_id(&state.store, id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Recording {} not found", id)))
}

async fn find_frame(state: &AppState, id: &str, index: usize) -> ApiResult<Recording> {
    let recording = find(state, id).await?;
    if index >= recording.frames.len() {
        return Err(ApiError::not_found(format!(
            "Recording {} has no frame {}",
            id, index
        )));
    }
    Ok(recording)
}
