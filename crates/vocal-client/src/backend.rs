//! The remote-procedure operations a recording turn consumes.

use crate::error::ClientError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use vocal_types::{ConversationContext, ConversationEntry, ResponseRef, SignedAudio, TranscriptRef};

/// Server operations used by the orchestrator.
#[async_trait]
pub trait VoiceBackend: Send + Sync {
    async fn transcript_audio(
        &self,
        base64_audio: &str,
        session: Uuid,
    ) -> Result<ConversationEntry, ClientError>;

    /// `context` already ends with the transcript's own line.
    async fn generate_response(
        &self,
        transcript: &TranscriptRef,
        context: &ConversationContext,
        session: Uuid,
    ) -> Result<ResponseRef, ClientError>;

    async fn generate_audio(&self, response: &ResponseRef) -> Result<SignedAudio, ClientError>;

    /// Stored entries of a session, oldest first.
    async fn session_entries(&self, session: Uuid) -> Result<Vec<ConversationEntry>, ClientError>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TranscriptBody<'a> {
    base64_audio: &'a str,
    session: Uuid,
}

#[derive(Serialize)]
struct ResponseBody<'a> {
    transcript: &'a TranscriptRef,
    context: &'a ConversationContext,
    session: Uuid,
}

#[derive(Serialize)]
struct SpeechBody<'a> {
    response: &'a ResponseRef,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// [`VoiceBackend`] over the server's JSON API.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let text = response.text().await?;
        let message = serde_json::from_str::<ErrorBody>(&text)
            .map(|body| body.error)
            .unwrap_or(text);
        Err(ClientError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl VoiceBackend for HttpBackend {
    async fn transcript_audio(
        &self,
        base64_audio: &str,
        session: Uuid,
    ) -> Result<ConversationEntry, ClientError> {
        let response = self
            .client
            .post(self.url("/api/audio/transcript"))
            .json(&TranscriptBody {
                base64_audio,
                session,
            })
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn generate_response(
        &self,
        transcript: &TranscriptRef,
        context: &ConversationContext,
        session: Uuid,
    ) -> Result<ResponseRef, ClientError> {
        let response = self
            .client
            .post(self.url("/api/audio/response"))
            .json(&ResponseBody {
                transcript,
                context,
                session,
            })
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn generate_audio(&self, response: &ResponseRef) -> Result<SignedAudio, ClientError> {
        let http_response = self
            .client
            .post(self.url("/api/audio/speech"))
            .json(&SpeechBody { response })
            .send()
            .await?;
        Self::decode(http_response).await
    }

    async fn session_entries(&self, session: Uuid) -> Result<Vec<ConversationEntry>, ClientError> {
        let response = self
            .client
            .get(self.url(&format!("/api/sessions/{session}/entries")))
            .send()
            .await?;
        Self::decode(response).await
    }
}
