use crate::audio::{AudioBlob, SPEECH_CONTENT_TYPE};
use crate::config::{ElevenLabsConfig, PlayHtConfig};
use crate::error::{check_status, VoiceError};
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum text input size for TTS (64 KiB). Prevents resource exhaustion from
/// oversized synthesis requests.
const MAX_TTS_INPUT_BYTES: usize = 64 * 1024;

const ELEVENLABS: &str = "elevenlabs";
const PLAYHT: &str = "playht";

/// The speech synthesis backend used for one request.
///
/// Chosen per request from the `usePlayHT` feature flag and handed to
/// [`TtsService::synthesize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoiceProvider {
    /// Primary: first voice of the account catalog, streamed synthesis.
    ElevenLabs,
    /// Alternate: one streaming request against a fixed voice.
    PlayHt,
}

impl VoiceProvider {
    /// Maps the alternate-provider flag to a provider.
    pub fn from_flag(use_alternate: bool) -> Self {
        if use_alternate {
            Self::PlayHt
        } else {
            Self::ElevenLabs
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ElevenLabs => ELEVENLABS,
            Self::PlayHt => PLAYHT,
        }
    }
}

impl fmt::Display for VoiceProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Deserialize)]
struct VoiceCatalog {
    #[serde(default)]
    voices: Vec<CatalogVoice>,
}

#[derive(Debug, Deserialize)]
struct CatalogVoice {
    voice_id: String,
}

#[derive(Debug, Serialize)]
struct ElevenLabsRequest<'a> {
    text: &'a str,
    model_id: &'a str,
}

#[derive(Debug, Clone)]
pub struct ElevenLabsClient {
    client: reqwest::Client,
    config: ElevenLabsConfig,
}

impl ElevenLabsClient {
    pub fn new(client: reqwest::Client, config: ElevenLabsConfig) -> Self {
        Self { client, config }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Returns the ID of the first voice in the account catalog.
    ///
    /// The catalog order is the provider's; the lowest index wins.
    pub async fn first_voice(&self) -> Result<String, VoiceError> {
        let response = self
            .client
            .get(self.endpoint("/v1/voices"))
            .header("xi-api-key", &self.config.api_key)
            .send()
            .await?;
        let catalog: VoiceCatalog = check_status(ELEVENLABS, response).await?.json().await?;

        catalog
            .voices
            .into_iter()
            .next()
            .map(|voice| voice.voice_id)
            .ok_or(VoiceError::VoiceNotFound)
    }

    /// Streams synthesized speech and concatenates the chunks into one blob.
    pub async fn synthesize(&self, text: &str) -> Result<AudioBlob, VoiceError> {
        let voice_id = self.first_voice().await?;
        let response = self
            .client
            .post(self.endpoint(&format!("/v1/text-to-speech/{voice_id}/stream")))
            .header("xi-api-key", &self.config.api_key)
            .json(&ElevenLabsRequest {
                text,
                model_id: &self.config.model_id,
            })
            .send()
            .await?;
        let response = check_status(ELEVENLABS, response).await?;

        let mut bytes = Vec::new();
        let mut chunks = 0usize;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            bytes.extend_from_slice(&chunk?);
            chunks += 1;
        }

        tracing::debug!(voice_id = %voice_id, chunks, bytes = bytes.len(), "elevenlabs stream complete");
        Ok(AudioBlob::new(bytes, SPEECH_CONTENT_TYPE))
    }
}

#[derive(Debug, Serialize)]
struct PlayHtRequest<'a> {
    model: &'a str,
    text: &'a str,
    voice: &'a str,
    output_format: &'a str,
}

#[derive(Debug, Clone)]
pub struct PlayHtClient {
    client: reqwest::Client,
    config: PlayHtConfig,
}

impl PlayHtClient {
    pub fn new(client: reqwest::Client, config: PlayHtConfig) -> Self {
        Self { client, config }
    }

    pub async fn synthesize(&self, text: &str) -> Result<AudioBlob, VoiceError> {
        let url = format!(
            "{}/api/v1/tts/stream",
            self.config.base_url.trim_end_matches('/')
        );
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.config.api_key)
            .header("X-USER-ID", &self.config.user_id)
            .json(&PlayHtRequest {
                model: &self.config.model,
                text,
                voice: &self.config.voice,
                output_format: "mp3",
            })
            .send()
            .await?;
        let bytes = check_status(PLAYHT, response).await?.bytes().await?;

        Ok(AudioBlob::new(bytes.to_vec(), SPEECH_CONTENT_TYPE))
    }
}

/// Text-to-speech over the two interchangeable providers.
///
/// Both clients are built once at startup; which one serves a request is
/// decided by the caller through [`VoiceProvider`].
#[derive(Debug, Clone)]
pub struct TtsService {
    elevenlabs: ElevenLabsClient,
    playht: PlayHtClient,
}

impl TtsService {
    pub fn new(
        client: reqwest::Client,
        elevenlabs: ElevenLabsConfig,
        playht: PlayHtConfig,
    ) -> Self {
        Self {
            elevenlabs: ElevenLabsClient::new(client.clone(), elevenlabs),
            playht: PlayHtClient::new(client, playht),
        }
    }

    /// Synthesizes `text` with the given provider.
    pub async fn synthesize(
        &self,
        provider: VoiceProvider,
        text: &str,
    ) -> Result<AudioBlob, VoiceError> {
        if text.len() > MAX_TTS_INPUT_BYTES {
            return Err(VoiceError::TextTooLarge {
                size: text.len(),
                limit: MAX_TTS_INPUT_BYTES,
            });
        }

        tracing::info!(provider = %provider, chars = text.chars().count(), "synthesizing speech");
        let blob = match provider {
            VoiceProvider::ElevenLabs => self.elevenlabs.synthesize(text).await?,
            VoiceProvider::PlayHt => self.playht.synthesize(text).await?,
        };

        if blob.is_empty() {
            return Err(VoiceError::MalformedResponse {
                service: provider.as_str(),
                reason: "empty audio".to_string(),
            });
        }
        Ok(blob)
    }
}
