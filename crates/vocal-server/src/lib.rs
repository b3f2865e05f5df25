//! Vocal server library logic.

pub mod api;
pub mod api_audio;
pub mod audio;
pub mod config;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Extension, Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use vocal_db::DbPool;
use vocal_voice::audio::MAX_AUDIO_INPUT_BYTES;
use vocal_voice::{ObjectStorage, ResponderService, SttService, TtsService};

/// Built-in system instructions for the response model.
pub const DEFAULT_SYSTEM_PROMPT: &str = include_str!("../assets/system_prompt.txt");

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: DbPool,
    /// Speech-to-text client.
    pub stt: SttService,
    /// Response generation client.
    pub responder: ResponderService,
    /// Speech synthesis over both providers.
    pub tts: TtsService,
    /// Bucket holding synthesized audio.
    pub storage: ObjectStorage,
    /// Instructions sent with every response request.
    pub system_prompt: Arc<str>,
}

impl AppState {
    /// Builds every remote client from configuration, sharing one HTTP client.
    pub fn new(pool: DbPool, config: &config::Config, system_prompt: Arc<str>) -> Self {
        let http = reqwest::Client::new();
        Self {
            pool,
            stt: SttService::new(http.clone(), config.openai.clone()),
            responder: ResponderService::new(http.clone(), config.openai.clone()),
            tts: TtsService::new(
                http.clone(),
                config.elevenlabs.clone(),
                config.playht.clone(),
            ),
            storage: ObjectStorage::new(http, config.storage.clone()),
            system_prompt,
        }
    }
}

/// Reads the system instructions, preferring the configured override file.
///
/// # Errors
///
/// Returns the I/O error if an override path is configured but unreadable.
pub fn load_system_prompt(config: &config::PromptConfig) -> std::io::Result<Arc<str>> {
    match &config.path {
        Some(path) => {
            let text = std::fs::read_to_string(path)?;
            tracing::info!(path = %path, "loaded system prompt override");
            Ok(Arc::from(text.trim_end()))
        }
        None => Ok(Arc::from(DEFAULT_SYSTEM_PROMPT.trim_end())),
    }
}

/// Maximum request body size (2 MiB) outside the audio routes.
const MAX_REQUEST_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Maximum body size on routes carrying base64 audio: the encoded size of
/// the largest accepted recording plus room for the JSON envelope.
const MAX_AUDIO_BODY_BYTES: usize = MAX_AUDIO_INPUT_BYTES.div_ceil(3) * 4 + 64 * 1024;

/// Health check handler.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    // Base64 recordings run well past the default limit.
    let audio_routes = Router::new()
        .route("/generate", post(api_audio::generate_handler))
        .route(
            "/api/audio/transcript",
            post(api_audio::transcript_handler),
        )
        .layer(DefaultBodyLimit::max(MAX_AUDIO_BODY_BYTES));

    let router = Router::new()
        .route("/health", get(health))
        .route("/ip", get(api::ip_handler))
        .route("/api/audio/response", post(api_audio::response_handler))
        .route("/api/audio/speech", post(api_audio::speech_handler))
        .route(
            "/api/audio/{responseId}/refresh",
            post(api_audio::refresh_handler),
        )
        .route(
            "/api/sessions/{sessionId}/entries",
            get(api::list_session_entries_handler),
        )
        .route("/api/flags", get(api::list_flags_handler))
        .route("/api/flags/{key}", put(api::set_flag_handler))
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .merge(audio_routes);

    router
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(Extension(Arc::new(state)))
}
