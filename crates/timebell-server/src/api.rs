//! API handlers for the Timebell server.

use crate::AppState;
use axum::{
    body::Bytes,
    extract::Extension,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::sync::Arc;
use thiserror::Error;
use timebell_store::StoreError;
use timebell_types::{Config, PlayRequest};

/// API error type mapping to HTTP status codes.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid input: {0}")]
    BadRequest(String),
    #[error("upstream failure: {0}")]
    BadGateway(String),
    #[error("internal server error: {0}")]
    InternalServerError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, msg),
            ApiError::InternalServerError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(json!({
            "status": "error",
            "message": message
        }));

        (status, body).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Invalid(e) => ApiError::BadRequest(e.to_string()),
            other => {
                tracing::error!(error = %other, "failed to save config");
                ApiError::InternalServerError("failed to save config".to_string())
            }
        }
    }
}

/// Decodes a JSON body, mapping every failure to 400.
fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| ApiError::BadRequest(format!("invalid JSON: {}", e)))
}

/// Handler for `POST /api/save`.
pub async fn save_config_handler(
    Extension(state): Extension<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let config: Config = parse_body(&body)?;
    state.store.set(config).await?;
    Ok(Json(json!({ "status": "success" })))
}

/// Handler for `GET /api/config`.
pub async fn get_config_handler(Extension(state): Extension<Arc<AppState>>) -> Json<Config> {
    Json(state.store.get())
}

/// Handler for `POST /api/play`.
///
/// Responds as soon as the announcement is dispatched; its outcome is only
/// logged.
pub async fn play_handler(
    Extension(state): Extension<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let request: PlayRequest = parse_body(&body)?;
    request
        .validate()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    tracing::info!(hour = request.hour, speaker = %request.speaker, "manual announcement requested");
    state.announcer.dispatch(request);

    Ok(Json(json!({ "status": "playing" })))
}

/// Handler for `POST /api/announce`.
///
/// Announces the current hour with the configured speaker, whether or not
/// the hour is a trigger hour.
pub async fn announce_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<Value>, ApiError> {
    let config = state.store.get();
    if config.speaker.trim().is_empty() {
        return Err(ApiError::BadRequest("no speaker configured".to_string()));
    }

    let hour = state.clock.now().hour;
    tracing::info!(hour, speaker = %config.speaker, "announce-now requested");
    state.announcer.dispatch(PlayRequest::new(config.speaker, hour));

    Ok(Json(json!({ "status": "playing", "hour": hour })))
}

/// Handler for `GET /api/speakers`. Relays the TTS engine's catalogue.
pub async fn speakers_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Response, ApiError> {
    let body = state.tts.speakers().await.map_err(|e| {
        tracing::warn!(error = %e, "failed to fetch speakers from TTS engine");
        ApiError::BadGateway("failed to fetch speakers from TTS engine".to_string())
    })?;

    Ok(([(header::CONTENT_TYPE, "application/json")], body).into_response())
}
