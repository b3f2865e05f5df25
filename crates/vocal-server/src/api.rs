//! API error type, caller identity extraction, and the non-audio handlers.

use crate::AppState;
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Extension, Json, Path,
    },
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;
use vocal_conversations::ConversationError;
use vocal_flags::{Flag, FlagError, FlagKey};
use vocal_identity::IdentityError;
use vocal_types::ConversationEntry;
use vocal_voice::VoiceError;

/// API error type mapping to HTTP status codes.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid input: {0}")]
    BadRequest(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("internal server error: {0}")]
    InternalServerError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::InternalServerError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(serde_json::json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

impl From<VoiceError> for ApiError {
    fn from(e: VoiceError) -> Self {
        match e {
            VoiceError::VoiceNotFound => ApiError::NotFound(e.to_string()),
            VoiceError::EmptyAudio
            | VoiceError::AudioTooLarge { .. }
            | VoiceError::TextTooLarge { .. } => ApiError::BadRequest(e.to_string()),
            _ => ApiError::InternalServerError(e.to_string()),
        }
    }
}

impl From<IdentityError> for ApiError {
    fn from(e: IdentityError) -> Self {
        tracing::warn!("identity resolution failed: {}", e);
        ApiError::InternalServerError(
            "could not process your request at this time, please try again later".to_string(),
        )
    }
}

impl From<ConversationError> for ApiError {
    fn from(e: ConversationError) -> Self {
        match e {
            ConversationError::NotFound(_) => ApiError::NotFound(e.to_string()),
            ConversationError::NotAResponse(_) => ApiError::BadRequest(e.to_string()),
            ConversationError::Database(_) => ApiError::InternalServerError(e.to_string()),
        }
    }
}

impl From<FlagError> for ApiError {
    fn from(e: FlagError) -> Self {
        ApiError::InternalServerError(e.to_string())
    }
}

/// Unwraps a JSON body, turning extractor rejections into `400` with the
/// standard error body.
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}

pub(crate) fn path_param<T>(param: Result<Path<T>, PathRejection>) -> Result<T, ApiError> {
    param
        .map(|Path(value)| value)
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}

/// Runs blocking database work on the blocking pool with a pooled connection.
pub(crate) async fn with_conn<T, F>(state: &Arc<AppState>, f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&rusqlite::Connection) -> Result<T, ApiError> + Send + 'static,
{
    let pool = state.pool.clone();
    tokio::task::spawn_blocking(move || {
        let conn = pool
            .get()
            .map_err(|e| ApiError::InternalServerError(format!("db connection failed: {}", e)))?;
        f(&conn)
    })
    .await
    .map_err(|e| ApiError::InternalServerError(format!("task join error: {}", e)))?
}

/// The caller as seen through request headers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Caller {
    /// First address of `x-forwarded-for`.
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

impl Caller {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            ip: forwarded_ip(headers),
            user_agent: headers
                .get(axum::http::header::USER_AGENT)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
        }
    }
}

/// Returns the originating client address from `x-forwarded-for`.
///
/// Proxies append to the header, so the first comma-separated entry is the
/// client. Blank entries count as absent.
pub fn forwarded_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(str::to_string)
}

/// Response body for `GET /ip`.
#[derive(Debug, Serialize, Deserialize)]
pub struct IpResponse {
    pub ip: Option<String>,
}

/// Handler for `GET /ip`.
pub async fn ip_handler(headers: HeaderMap) -> Json<IpResponse> {
    Json(IpResponse {
        ip: forwarded_ip(&headers),
    })
}

/// Handler for `GET /api/sessions/{sessionId}/entries`.
pub async fn list_session_entries_handler(
    Extension(state): Extension<Arc<AppState>>,
    session_id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Vec<ConversationEntry>>, ApiError> {
    let session_id = path_param(session_id)?;

    let entries = with_conn(&state, move |conn| {
        Ok(vocal_conversations::list_session_entries(conn, session_id)?)
    })
    .await?;

    Ok(Json(entries))
}

/// Handler for `GET /api/flags`.
pub async fn list_flags_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<Vec<Flag>>, ApiError> {
    let flags = with_conn(&state, |conn| Ok(vocal_flags::list_flags(conn)?)).await?;
    Ok(Json(flags))
}

/// Request body for `PUT /api/flags/{key}`.
#[derive(Debug, Deserialize)]
pub struct SetFlagRequest {
    pub enabled: bool,
}

/// Handler for `PUT /api/flags/{key}`.
///
/// Only seeded flags can be toggled; a missing row is `404`.
pub async fn set_flag_handler(
    Extension(state): Extension<Arc<AppState>>,
    key: Result<Path<String>, PathRejection>,
    payload: Result<Json<SetFlagRequest>, JsonRejection>,
) -> Result<Json<Flag>, ApiError> {
    let key = path_param(key)?;
    let key: FlagKey = key
        .parse()
        .map_err(|e: vocal_types::ParseError| ApiError::BadRequest(e.to_string()))?;
    let payload = json_body(payload)?;

    let flag = with_conn(&state, move |conn| {
        vocal_flags::set_flag(conn, key, payload.enabled).map_err(|e| match e {
            FlagError::Missing(_) => ApiError::NotFound(e.to_string()),
            _ => ApiError::InternalServerError(e.to_string()),
        })
    })
    .await?;

    Ok(Json(flag))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn forwarded_ip_takes_first_entry() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static(" 203.0.113.7 , 10.0.0.1, 10.0.0.2"),
        );
        assert_eq!(forwarded_ip(&headers).as_deref(), Some("203.0.113.7"));
    }

    #[test]
    fn forwarded_ip_absent_or_blank_is_none() {
        let mut headers = HeaderMap::new();
        assert_eq!(forwarded_ip(&headers), None);
        headers.insert("x-forwarded-for", HeaderValue::from_static("  "));
        assert_eq!(forwarded_ip(&headers), None);
    }

    #[test]
    fn voice_errors_map_to_taxonomy() {
        assert!(matches!(
            ApiError::from(VoiceError::VoiceNotFound),
            ApiError::NotFound(_)
        ));
        assert!(matches!(
            ApiError::from(VoiceError::EmptyAudio),
            ApiError::BadRequest(_)
        ));
        assert!(matches!(
            ApiError::from(VoiceError::Upstream {
                service: "transcription",
                status: 500,
                body: String::new(),
            }),
            ApiError::InternalServerError(_)
        ));
    }

    #[test]
    fn missing_identity_headers_are_internal() {
        assert!(matches!(
            ApiError::from(IdentityError::MissingAddress),
            ApiError::InternalServerError(_)
        ));
    }
}
