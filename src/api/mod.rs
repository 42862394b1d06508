//! REST API server for mamabear.
//!
//! Provides HTTP endpoints for:
//! - Live monitor status per camera feed
//! - Browsing, fetching and deleting saved recordings
//! - Per-frame audio (WAV) and video (JPEG) of a recording

pub mod error;
pub mod routes;

use crate::config::ApiConfig;
use crate::recording::MonitorStatusHandle;
use crate::store::RecordingStore;
use anyhow::{Context, Result};
use axum::{response::Json, routing::get, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

pub use routes::AppState;

pub struct ApiServer {
    port: u16,
    state: AppState,
}

impl ApiServer {
    pub fn new(
        store: Arc<RecordingStore>,
        monitors: Vec<MonitorStatusHandle>,
        config: &ApiConfig,
    ) -> Self {
        Self {
            port: config.port,
            state: AppState { store, monitors },
        }
    }

    pub fn router(&self) -> Router {
        Router::new()
            // Root and version endpoints
            .route("/", get(service_info))
            .route("/version", get(version))
            .merge(routes::status::router(self.state.clone()))
            .nest("/recordings", routes::recordings::router(self.state.clone()))
    }

    pub async fn start(self) -> Result<()> {
        let app = self.router();

        let listener = tokio::net::TcpListener::bind(&format!("127.0.0.1:{}", self.port))
            .await
            .with_context(|| format!("Failed to bind API port {}", self.port))?;

        info!("API server listening on http://127.0.0.1:{}", self.port);
        info!("Endpoints:");
        info!("  GET    /                                   - Service info");
        info!("  GET    /version                            - Get version info");
        info!("  GET    /status                             - Live status of all feeds");
        info!("  GET    /status/:feed                       - Live status of one feed");
        info!("  GET    /recordings                         - List recordings");
        info!("  GET    /recordings/:id                     - Get single recording");
        info!("  DELETE /recordings/:id                     - Delete recording");
        info!("  GET    /recordings/:id/audio.wav           - Recording audio");
        info!("  GET    /recordings/:id/frames/:n/audio.wav - Frame audio");
        info!("  GET    /recordings/:id/frames/:n/video.jpg - Frame image");

        axum::serve(listener, app).await?;

        Ok(())
    }
}

async fn service_info() -> Json<Value> {
    Json(json!({
        "service": "mamabear",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running"
    }))
}

async fn version() -> Json<Value> {
    Json(json!({
        "version": env!("CARGO_PKG_VERSION"),
        "name": "mamabear"
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::Vitals;
    use crate::recording::{Frame, Recording};
    use crate::store::MemoryKvStore;
    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
    use tower::ServiceExt;

    async fn server_with(recordings: Vec<Recording>) -> ApiServer {
        let store = Arc::new(RecordingStore::new(
            Arc::new(MemoryKvStore::new()),
            "test",
            20,
        ));
        for recording in recordings {
            store.save(recording).await.unwrap();
        }
        let monitors = vec![
            MonitorStatusHandle::for_feed("baby"),
            MonitorStatusHandle::for_feed("room"),
        ];
        ApiServer::new(store, monitors, &ApiConfig::default())
    }

    fn sample(id: &str) -> Recording {
        Recording {
            id: id.to_string(),
            timestamp: 1_700_000_000_000,
            alert_type: "CRYING_ALERT".to_string(),
            frames: vec![
                Frame::new(
                    BASE64.encode([0xffu8, 0xd8, 1]),
                    Some(BASE64.encode([1u8, 0, 2, 0])),
                ),
                Frame::new(BASE64.encode([0xffu8, 0xd8, 2]), None),
            ],
            feed: Some("baby".to_string()),
        }
    }

    async fn send(server: &ApiServer, method: Method, uri: &str) -> (StatusCode, Vec<u8>) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let response = server.router().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, body.to_vec())
    }

    async fn send_json(server: &ApiServer, method: Method, uri: &str) -> (StatusCode, Value) {
        let (status, body) = send(server, method, uri).await;
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_service_info() {
        let server = server_with(vec![]).await;
        let (status, body) = send_json(&server, Method::GET, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["service"], "mamabear");
    }

    #[tokio::test]
    async fn test_status_endpoint() {
        let server = server_with(vec![]).await;
        server.state.monitors[0]
            .set_vitals(Vitals {
                bpm: Some(118.0),
                rr_wave: Some(vec![0.5, 0.75]),
                ..Vitals::default()
            })
            .await;

        let (status, body) = send_json(&server, Method::GET, "/status").await;
        assert_eq!(status, StatusCode::OK);
        let feeds = body["feeds"].as_array().unwrap();
        assert_eq!(feeds.len(), 2);
        assert_eq!(feeds[0]["feed"], "baby");
        assert_eq!(feeds[0]["connection"], "DISCONNECTED");
        assert_eq!(feeds[0]["phase"], "idle");
        assert_eq!(feeds[0]["vitals"]["rr_wave"], json!([0.5, 0.75]));
        assert_eq!(feeds[1]["feed"], "room");
    }

    #[tokio::test]
    async fn test_single_feed_status() {
        let server = server_with(vec![]).await;

        let (status, body) = send_json(&server, Method::GET, "/status/room").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["feed"], "room");

        let (status, body) = send_json(&server, Method::GET, "/status/garage").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], true);
    }

    #[tokio::test]
    async fn test_list_and_get_recordings() {
        let server = server_with(vec![sample("a"), sample("b")]).await;

        let (status, body) = send_json(&server, Method::GET, "/recordings?limit=1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["id"], "b");
        assert_eq!(body[0]["frame_count"], 2);

        let (_, body) = send_json(&server, Method::GET, "/recordings?feed=room").await;
        assert!(body.as_array().unwrap().is_empty());

        let (status, body) = send_json(&server, Method::GET, "/recordings/a").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["alertType"], "CRYING_ALERT");
        assert_eq!(body["feed"], "baby");
    }

    #[tokio::test]
    async fn test_missing_recording_is_json_404() {
        let server = server_with(vec![]).await;
        let (status, body) = send_json(&server, Method::GET, "/recordings/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], true);
    }

    #[tokio::test]
    async fn test_delete_recording() {
        let server = server_with(vec![sample("a")]).await;

        let (_, body) = send_json(&server, Method::DELETE, "/recordings/a").await;
        assert_eq!(body["deleted"], true);

        let (_, body) = send_json(&server, Method::DELETE, "/recordings/a").await;
        assert_eq!(body["deleted"], false);
    }

    #[tokio::test]
    async fn test_frame_media() {
        let server = server_with(vec![sample("a")]).await;

        let (status, body) = send(&server, Method::GET, "/recordings/a/frames/1/video.jpg").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, vec![0xff, 0xd8, 2]);

        let (status, body) = send(&server, Method::GET, "/recordings/a/frames/0/audio.wav").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(&body[0..4], b"RIFF");

        let (status, _) = send(&server, Method::GET, "/recordings/a/frames/1/audio.wav").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&server, Method::GET, "/recordings/a/frames/9/video.jpg").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_audio_content_type() {
        let server = server_with(vec![sample("a")]).await;
        let request = Request::builder()
            .uri("/recordings/a/audio.wav")
            .body(Body::empty())
            .unwrap();
        let response = server.router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "audio/wav");
    }
}
