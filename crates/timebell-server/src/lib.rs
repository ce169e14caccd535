//! Timebell server library logic.

pub mod api;
pub mod config;
pub mod scheduler;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Extension, Json, Router,
};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use timebell_store::ConfigStore;
use timebell_voice::{Announcer, TtsClient};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

pub use scheduler::{Clock, Scheduler, SystemClock, WallTime, TICK_PERIOD};

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// The announcement configuration.
    pub store: ConfigStore,
    /// Dispatches announcements without waiting for them.
    pub announcer: Arc<dyn Announcer>,
    /// TTS engine client, used for the speaker catalogue.
    pub tts: TtsClient,
    /// Wall clock for announce-now.
    pub clock: Arc<dyn Clock>,
    /// Directory holding the static frontend, if any.
    pub frontend_dir: Option<PathBuf>,
}

/// Maximum request body size (64 KiB). Config and play bodies are tiny.
const MAX_REQUEST_BODY_BYTES: usize = 64 * 1024;

/// Health check handler.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    let router = Router::new()
        .route("/health", get(health))
        .route("/api/save", post(api::save_config_handler))
        .route("/api/config", get(api::get_config_handler))
        .route("/api/play", post(api::play_handler))
        .route("/api/announce", post(api::announce_handler))
        .route("/api/speakers", get(api::speakers_handler));

    let router = match &state.frontend_dir {
        Some(dir) if dir.join("index.html").exists() => {
            tracing::info!(path = %dir.display(), "serving frontend static files");
            router.fallback_service(
                ServeDir::new(dir).fallback(ServeFile::new(dir.join("index.html"))),
            )
        }
        Some(dir) => {
            tracing::info!(path = %dir.display(), "frontend directory not found, skipping static file serving");
            router
        }
        None => router,
    };

    router
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(Extension(Arc::new(state)))
}
