//! Handlers for the recording-turn operations and the one-shot `/generate` route.

use crate::api::{json_body, path_param, ApiError, Caller};
use crate::{audio, AppState};
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Extension, Json, Path,
    },
    http::HeaderMap,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;
use vocal_types::{ConversationContext, ConversationEntry, ResponseRef, SignedAudio, TranscriptRef};

/// Request body for `POST /api/audio/transcript`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptRequest {
    /// Recording, base64 with or without a data-URI header.
    pub base64_audio: String,
    pub session: Uuid,
}

/// Request body for `POST /api/audio/response`.
#[derive(Debug, Deserialize)]
pub struct ResponseRequest {
    pub transcript: TranscriptRef,
    /// Prior turns of the session, oldest first.
    #[serde(default)]
    pub context: ConversationContext,
    /// Replaces the configured system prompt.
    #[serde(default)]
    pub instructions: Option<String>,
    pub session: Uuid,
}

/// Request body for `POST /api/audio/speech`.
#[derive(Debug, Deserialize)]
pub struct SpeechRequest {
    pub response: ResponseRef,
}

/// Request body for `POST /generate`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub base64_audio: String,
    #[serde(default)]
    pub session: Option<Uuid>,
}

/// Response body for `POST /generate`.
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub url: String,
}

/// Handler for `POST /api/audio/transcript`.
pub async fn transcript_handler(
    Extension(state): Extension<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<TranscriptRequest>, JsonRejection>,
) -> Result<Json<ConversationEntry>, ApiError> {
    let payload = json_body(payload)?;
    let caller = Caller::from_headers(&headers);

    let entry =
        audio::transcript_audio(&state, caller, &payload.base64_audio, payload.session).await?;
    Ok(Json(entry))
}

/// Handler for `POST /api/audio/response`.
pub async fn response_handler(
    Extension(state): Extension<Arc<AppState>>,
    payload: Result<Json<ResponseRequest>, JsonRejection>,
) -> Result<Json<ResponseRef>, ApiError> {
    let payload = json_body(payload)?;

    let response = audio::generate_response(
        &state,
        payload.transcript,
        payload.context,
        payload.instructions,
        payload.session,
    )
    .await?;
    Ok(Json(response))
}

/// Handler for `POST /api/audio/speech`.
pub async fn speech_handler(
    Extension(state): Extension<Arc<AppState>>,
    payload: Result<Json<SpeechRequest>, JsonRejection>,
) -> Result<Json<SignedAudio>, ApiError> {
    let payload = json_body(payload)?;
    let signed = audio::generate_audio(&state, payload.response).await?;
    Ok(Json(signed))
}

/// Handler for `POST /api/audio/{responseId}/refresh`.
pub async fn refresh_handler(
    Extension(state): Extension<Arc<AppState>>,
    response_id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<SignedAudio>, ApiError> {
    let response_id = path_param(response_id)?;
    let signed = audio::refresh_audio(&state, response_id).await?;
    Ok(Json(signed))
}

/// Handler for `POST /generate`.
pub async fn generate_handler(
    Extension(state): Extension<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Json<GenerateResponse>, ApiError> {
    let payload = json_body(payload)?;
    let caller = Caller::from_headers(&headers);

    let signed =
        audio::run_generate(&state, caller, &payload.base64_audio, payload.session).await?;
    Ok(Json(GenerateResponse { url: signed.url }))
}
