//! HTTP shell: multipart upload endpoint and health check.
//!
//! ```text
//! POST /api/process   multipart { mode, file (PDF) | text } → { "response": … }
//!                     json      { mode, text }              → { "response": … }
//! GET  /api/health                                          → { "status": "ok" }
//! ```
//!
//! The handler only parses the upload and maps errors to status codes;
//! everything else is [`StudyAssistant`]. Errors are returned as
//! `{ "error": <message>, "kind": <code> }`, including body parse failures.

use crate::assistant::{CompletionRequest, StudyAssistant};
use crate::config::ServerConfig;
use crate::error::{Stage, StudyError};
use crate::mode::Mode;
use crate::pipeline::extract::PdfTextExtractor;
use axum::extract::multipart::MultipartError;
use axum::extract::{DefaultBodyLimit, FromRequest, Multipart, Request, State};
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

/// Room for the multipart framing and the text fields around the file.
const BODY_OVERHEAD_BYTES: usize = 1024 * 1024;

/// Shared, read-only state handed to every request.
#[derive(Clone)]
pub struct AppState {
    assistant: Arc<StudyAssistant>,
    extractor: PdfTextExtractor,
    max_upload_bytes: usize,
}

impl AppState {
    pub fn new(
        assistant: Arc<StudyAssistant>,
        extractor: PdfTextExtractor,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            assistant,
            extractor,
            max_upload_bytes,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProcessResponse {
    pub response: String,
}

/// Error wrapper that renders as a JSON body with a mapped status.
#[derive(Debug)]
pub struct ApiError(pub StudyError);

impl From<StudyError> for ApiError {
    fn from(e: StudyError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            error!("Request failed ({}): {}", status, self.0);
        } else {
            warn!("Request rejected ({}): {}", status, self.0);
        }
        let body = Json(json!({
            "error": self.0.to_string(),
            "kind": self.0.kind(),
        }));
        (status, body).into_response()
    }
}

/// HTTP status for each error kind.
pub fn status_for(err: &StudyError) -> StatusCode {
    match err {
        e if e.is_client_error() => StatusCode::BAD_REQUEST,
        StudyError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
        StudyError::ProviderError { .. }
        | StudyError::EmptyCompletion
        | StudyError::TransportFailure { .. } => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Build the application router.
pub fn router(state: AppState, allowed_origins: &[String]) -> Router {
    let body_limit = state.max_upload_bytes + BODY_OVERHEAD_BYTES;
    Router::new()
        .route("/api/process", post(process))
        .route("/api/health", get(health))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors_layer(allowed_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(v) => Some(v),
            Err(_) => {
                warn!("Ignoring invalid CORS origin '{}'", o);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

/// Bind and serve until the process is stopped.
pub async fn serve(config: &ServerConfig, state: AppState) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let app = router(state, &config.allowed_origins);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server is running on port {}", config.port);
    axum::serve(listener, app).await
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// JSON form of a text-only request.
#[derive(Debug, Deserialize)]
struct TextPayload {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    mode: Option<String>,
}

async fn process(
    State(state): State<AppState>,
    request: Request,
) -> Result<Json<ProcessResponse>, ApiError> {
    let is_json = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/json"));

    let request = if is_json {
        read_json(request, &state).await?
    } else {
        read_multipart(request, &state).await?
    };

    let result = state.assistant.process(&request).await?;
    Ok(Json(ProcessResponse {
        response: result.cleaned_text,
    }))
}

async fn read_json(request: Request, state: &AppState) -> Result<CompletionRequest, ApiError> {
    let Json(payload) = Json::<TextPayload>::from_request(request, state)
        .await
        .map_err(|e| malformed(e.status(), e.body_text(), state.max_upload_bytes))?;

    match payload.text {
        Some(text) => Ok(CompletionRequest::new(text, &payload.mode.unwrap_or_default())?),
        None => Err(StudyError::MissingInput.into()),
    }
}

async fn read_multipart(request: Request, state: &AppState) -> Result<CompletionRequest, ApiError> {
    let limit = state.max_upload_bytes;
    let mut multipart = Multipart::from_request(request, state)
        .await
        .map_err(|e| malformed(e.status(), e.body_text(), limit))?;

    let mut mode: Option<String> = None;
    let mut text: Option<String> = None;
    let mut file: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| upload_error(e, limit))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "mode" => mode = Some(field.text().await.map_err(|e| upload_error(e, limit))?),
            "text" => text = Some(field.text().await.map_err(|e| upload_error(e, limit))?),
            "file" => {
                if field.content_type() != Some("application/pdf") {
                    return Err(StudyError::NotAPdf.into());
                }
                let bytes = field.bytes().await.map_err(|e| upload_error(e, limit))?;
                if bytes.len() > limit {
                    return Err(StudyError::FileTooLarge { limit_bytes: limit }.into());
                }
                file = Some(bytes.to_vec());
            }
            other => debug!("Ignoring multipart field '{}'", other),
        }
    }

    let mode = mode.unwrap_or_default();
    match (file, text) {
        (Some(bytes), _) => {
            // Resolve the mode before paying for extraction.
            let mode: Mode = mode.parse()?;
            info!("Received PDF upload ({} bytes)", bytes.len());
            let extracted = state.extractor.extract(bytes).await?;
            Ok(CompletionRequest::with_mode(extracted, mode)?)
        }
        (None, Some(text)) => Ok(CompletionRequest::new(text, &mode)?),
        (None, None) => Err(StudyError::MissingInput.into()),
    }
}

fn upload_error(e: MultipartError, limit: usize) -> ApiError {
    malformed(e.status(), e.body_text(), limit)
}

/// Map a body extraction failure: 413 is the size limit, other 4xx are the
/// caller's malformed request, anything else is ours.
fn malformed(status: StatusCode, detail: String, limit: usize) -> ApiError {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        StudyError::FileTooLarge { limit_bytes: limit }.into()
    } else if status.is_client_error() {
        StudyError::MalformedUpload { detail }.into()
    } else {
        StudyError::internal(Stage::Upload, detail).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(status_for(&StudyError::EmptyInput), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_for(&StudyError::InvalidMode { mode: "x".into() }),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&StudyError::RateLimited { message: "x".into() }),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(status_for(&StudyError::EmptyCompletion), StatusCode::BAD_GATEWAY);
        assert_eq!(
            status_for(&StudyError::MalformedUpload { detail: "x".into() }),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&StudyError::Unauthorized { reason: "x".into() }),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_for(&StudyError::internal(Stage::Completion, "x")),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn body_failures_keep_client_status() {
        let err = malformed(StatusCode::BAD_REQUEST, "incomplete field".into(), 16);
        assert!(matches!(err.0, StudyError::MalformedUpload { .. }));
        let err = malformed(StatusCode::PAYLOAD_TOO_LARGE, "too big".into(), 16);
        assert!(matches!(err.0, StudyError::FileTooLarge { limit_bytes: 16 }));
        let err = malformed(StatusCode::INTERNAL_SERVER_ERROR, "io".into(), 16);
        assert!(matches!(err.0, StudyError::Internal { stage: Stage::Upload, .. }));
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let Json(body) = health().await;
        assert_eq!(body["status"], "ok");
    }
}
