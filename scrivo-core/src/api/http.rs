//! reqwest-backed implementation of [`TranscriptionService`].
//!
//! ## Endpoints (single configured base address)
//!
//! | Call | Request |
//! |------|---------|
//! | `submit_transcription` | `POST /transcribe/` — multipart `file` part, `language`/`model_size` query |
//! | `list_history` | `GET /history/` — optional `limit` query |
//! | `check_health` | `GET /health/` |
//!
//! ## Failure mapping
//!
//! Transport errors become [`ApiError::Network`], 4xx replies
//! [`ApiError::Validation`], 5xx replies [`ApiError::Service`], and
//! undecodable or invariant-violating bodies [`ApiError::InvalidResponse`].
//! Error bodies are FastAPI-style `{"detail": "..."}`; the detail string is
//! preferred over the raw body when present.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{multipart, Client, StatusCode};
use tracing::debug;

use crate::api::types::{HistoryEntry, ServiceHealth, Transcription};
use crate::api::{AudioUpload, SubmitParams, TranscriptionService};
use crate::error::{ApiError, Result};

/// Configuration for [`HttpTranscriptionService`].
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Base address of the transcription service.
    pub base_url: String,
    /// Optional whole-request timeout. `None` (the default) lets a hung
    /// service keep a request in flight indefinitely.
    pub timeout: Option<Duration>,
    /// Optional `limit` forwarded to the history endpoint. The service
    /// accepts 1..=100 and applies its own default when the parameter is
    /// omitted.
    pub history_limit: Option<usize>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".into(),
            timeout: None,
            history_limit: None,
        }
    }
}

/// Production client for the remote transcription service.
pub struct HttpTranscriptionService {
    client: Client,
    base_url: String,
    history_limit: Option<usize>,
}

impl HttpTranscriptionService {
    /// Build a service client.
    ///
    /// # Errors
    /// Fails only if the underlying HTTP client cannot be constructed
    /// (e.g. TLS backend initialization).
    pub fn new(config: ServiceConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(into_network_error)?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            history_limit: config.history_limit,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

#[async_trait]
impl TranscriptionService for HttpTranscriptionService {
    async fn submit_transcription(
        &self,
        upload: AudioUpload,
        params: SubmitParams,
    ) -> Result<Transcription> {
        let mut query: Vec<(&str, String)> = Vec::with_capacity(2);
        if let Some(language) = params.language.as_ref() {
            query.push(("language", language.clone()));
        }
        query.push(("model_size", params.model_size.to_string()));

        debug!(
            filename = %upload.filename,
            bytes = upload.bytes.len(),
            model_size = %params.model_size,
            "uploading audio for transcription"
        );

        let mime = audio_mime_for(&upload.filename);
        let part = multipart::Part::bytes(upload.bytes)
            .file_name(upload.filename.clone())
            .mime_str(mime)
            .map_err(|e| ApiError::Network(format!("building multipart part: {e}")))?;
        let form = multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(self.endpoint("transcribe/"))
            .query(&query)
            .multipart(form)
            .send()
            .await
            .map_err(into_network_error)?;

        let transcription: Transcription = decode_success(response).await?;
        transcription.validate().map_err(ApiError::InvalidResponse)?;
        Ok(transcription)
    }

    async fn list_history(&self) -> Result<Vec<HistoryEntry>> {
        let mut request = self.client.get(self.endpoint("history/"));
        if let Some(limit) = self.history_limit {
            request = request.query(&[("limit", limit)]);
        }
        let response = request.send().await.map_err(into_network_error)?;
        decode_success(response).await
    }

    async fn check_health(&self) -> Result<ServiceHealth> {
        let response = self
            .client
            .get(self.endpoint("health/"))
            .send()
            .await
            .map_err(into_network_error)?;
        decode_success(response).await
    }
}

async fn decode_success<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        return Err(error_for_status(status, response.text().await.ok()));
    }
    let body = response.text().await.map_err(into_network_error)?;
    serde_json::from_str(&body)
        .map_err(|e| ApiError::InvalidResponse(format!("decoding response: {e}")))
}

fn error_for_status(status: StatusCode, body: Option<String>) -> ApiError {
    let message = body
        .as_deref()
        .map(extract_detail)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| format!("HTTP {status}"));
    if status.is_client_error() {
        ApiError::Validation(message)
    } else {
        ApiError::Service {
            status: status.as_u16(),
            message,
        }
    }
}

/// Pull the FastAPI `{"detail": "..."}` message out of an error body,
/// falling back to the raw body text.
fn extract_detail(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

fn into_network_error(e: reqwest::Error) -> ApiError {
    ApiError::Network(e.to_string())
}

/// Best-effort MIME guess from the filename extension.
///
/// The service only checks for an `audio/` prefix; unknown extensions fall
/// through to `application/octet-stream` and the rejection comes back as a
/// [`ApiError::Validation`].
fn audio_mime_for(filename: &str) -> &'static str {
    let extension = std::path::Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match extension.as_deref() {
        Some("wav") => "audio/wav",
        Some("mp3") => "audio/mpeg",
        Some("m4a") => "audio/mp4",
        Some("ogg" | "oga") => "audio/ogg",
        Some("flac") => "audio/flac",
        Some("webm") => "audio/webm",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use axum::extract::{Query, State};
    use axum::http::{header, HeaderMap, StatusCode};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use parking_lot::Mutex;
    use serde_json::{json, Value};

    use super::*;
    use crate::api::types::ModelSize;

    /// Request metadata captured by the test server.
    #[derive(Default)]
    struct Captured {
        query: Mutex<Option<HashMap<String, String>>>,
        content_type: Mutex<Option<String>>,
    }

    async fn spawn_server(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("serve");
        });
        format!("http://{addr}")
    }

    fn service_for(base_url: String) -> HttpTranscriptionService {
        HttpTranscriptionService::new(ServiceConfig {
            base_url,
            ..ServiceConfig::default()
        })
        .expect("build client")
    }

    fn transcription_json() -> Value {
        json!({
            "id": "t1",
            "filename": "clip.mp3",
            "transcription": "hello world",
            "language": "en",
            "model_size": "base",
            "segments": [
                {"id": 1, "start": 0.0, "end": 1.2, "text": "hello"},
                {"id": 2, "start": 1.2, "end": 2.0, "text": "world"}
            ]
        })
    }

    async fn capture_transcribe(
        State(captured): State<Arc<Captured>>,
        Query(query): Query<HashMap<String, String>>,
        headers: HeaderMap,
    ) -> Json<Value> {
        *captured.query.lock() = Some(query);
        *captured.content_type.lock() = headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        Json(transcription_json())
    }

    fn upload(filename: &str) -> AudioUpload {
        AudioUpload {
            filename: filename.into(),
            bytes: vec![0u8; 16],
        }
    }

    #[tokio::test]
    async fn submit_sends_params_as_query_and_file_as_multipart() {
        let captured = Arc::new(Captured::default());
        let router = Router::new()
            .route("/transcribe/", post(capture_transcribe))
            .with_state(Arc::clone(&captured));
        let service = service_for(spawn_server(router).await);

        let result = service
            .submit_transcription(upload("clip.mp3"), SubmitParams::default())
            .await
            .expect("submit succeeds");
        assert_eq!(result.text, "hello world");
        assert_eq!(result.segments.len(), 2);

        let query = captured.query.lock().clone().expect("query captured");
        assert_eq!(query.get("model_size").map(String::as_str), Some("base"));
        assert!(!query.contains_key("language"));

        let content_type = captured.content_type.lock().clone().expect("content type");
        assert!(
            content_type.starts_with("multipart/form-data"),
            "unexpected content type: {content_type}"
        );
    }

    #[tokio::test]
    async fn submit_passes_the_language_hint_through_unvalidated() {
        let captured = Arc::new(Captured::default());
        let router = Router::new()
            .route("/transcribe/", post(capture_transcribe))
            .with_state(Arc::clone(&captured));
        let service = service_for(spawn_server(router).await);

        service
            .submit_transcription(
                upload("clip.wav"),
                SubmitParams {
                    language: Some("hi".into()),
                    model_size: ModelSize::Small,
                },
            )
            .await
            .expect("submit succeeds");

        let query = captured.query.lock().clone().expect("query captured");
        assert_eq!(query.get("language").map(String::as_str), Some("hi"));
        assert_eq!(query.get("model_size").map(String::as_str), Some("small"));
    }

    #[tokio::test]
    async fn client_rejection_maps_to_validation_with_the_detail_message() {
        let router = Router::new().route(
            "/transcribe/",
            post(|| async {
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({"detail": "Only audio files are allowed"})),
                )
            }),
        );
        let service = service_for(spawn_server(router).await);

        let err = service
            .submit_transcription(upload("notes.txt"), SubmitParams::default())
            .await
            .expect_err("submit fails");
        assert_eq!(
            err,
            ApiError::Validation("Only audio files are allowed".into())
        );
    }

    #[tokio::test]
    async fn server_failure_maps_to_service_with_its_status() {
        let router = Router::new().route(
            "/transcribe/",
            post(|| async {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({"detail": "Transcription failed: boom"})),
                )
            }),
        );
        let service = service_for(spawn_server(router).await);

        let err = service
            .submit_transcription(upload("clip.mp3"), SubmitParams::default())
            .await
            .expect_err("submit fails");
        assert_eq!(
            err,
            ApiError::Service {
                status: 500,
                message: "Transcription failed: boom".into(),
            }
        );
    }

    #[tokio::test]
    async fn undecodable_body_maps_to_invalid_response() {
        let router = Router::new().route("/transcribe/", post(|| async { "{not json" }));
        let service = service_for(spawn_server(router).await);

        let err = service
            .submit_transcription(upload("clip.mp3"), SubmitParams::default())
            .await
            .expect_err("submit fails");
        assert!(matches!(err, ApiError::InvalidResponse(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn out_of_order_segments_are_rejected_as_invalid() {
        let mut body = transcription_json();
        body["segments"] = json!([
            {"id": 1, "start": 1.2, "end": 2.0, "text": "world"},
            {"id": 2, "start": 0.0, "end": 1.2, "text": "hello"}
        ]);
        let router = Router::new().route("/transcribe/", post(move || async move { Json(body) }));
        let service = service_for(spawn_server(router).await);

        let err = service
            .submit_transcription(upload("clip.mp3"), SubmitParams::default())
            .await
            .expect_err("submit fails");
        assert!(matches!(err, ApiError::InvalidResponse(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn history_preserves_the_service_order() {
        let router = Router::new().route(
            "/history/",
            get(|| async {
                Json(json!([
                    {"id": "h1", "filename": "a.wav", "timestamp": "2024-01-01T00:00:00Z",
                     "language": "en", "text": "first", "model_size": "tiny"},
                    {"id": "h2", "filename": "b.wav", "timestamp": "2024-01-02T00:00:00Z",
                     "language": "en", "text": "second", "model_size": "base"}
                ]))
            }),
        );
        let service = service_for(spawn_server(router).await);

        let history = service.list_history().await.expect("history fetch");
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].id, "h1");
        assert_eq!(history[1].id, "h2");
    }

    #[tokio::test]
    async fn history_limit_knob_is_forwarded_as_a_query_parameter() {
        let captured = Arc::new(Captured::default());
        let router = Router::new()
            .route(
                "/history/",
                get(
                    |State(captured): State<Arc<Captured>>,
                     Query(query): Query<HashMap<String, String>>| async move {
                        *captured.query.lock() = Some(query);
                        Json(json!([]))
                    },
                ),
            )
            .with_state(Arc::clone(&captured));
        let base_url = spawn_server(router).await;
        let service = HttpTranscriptionService::new(ServiceConfig {
            base_url,
            history_limit: Some(25),
            ..ServiceConfig::default()
        })
        .expect("build client");

        let history = service.list_history().await.expect("history fetch");
        assert!(history.is_empty());
        let query = captured.query.lock().clone().expect("query captured");
        assert_eq!(query.get("limit").map(String::as_str), Some("25"));
    }

    #[tokio::test]
    async fn health_probe_decodes_the_reply() {
        let router = Router::new().route(
            "/health/",
            get(|| async {
                Json(json!({"status": "healthy", "timestamp": "2024-01-01T00:00:00Z"}))
            }),
        );
        let service = service_for(spawn_server(router).await);

        let health = service.check_health().await.expect("health probe");
        assert_eq!(health.status, "healthy");
    }

    #[tokio::test]
    async fn unreachable_service_maps_to_network() {
        // Bind to grab a free port, then drop the listener so nothing answers.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("local addr");
        drop(listener);

        let service = service_for(format!("http://{addr}"));
        let err = service.list_history().await.expect_err("fetch fails");
        assert!(matches!(err, ApiError::Network(_)), "got {err:?}");
    }
}
