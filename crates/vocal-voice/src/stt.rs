use crate::audio::{AudioBlob, MAX_AUDIO_INPUT_BYTES};
use crate::config::OpenAiConfig;
use crate::error::{check_status, VoiceError};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

const SERVICE: &str = "transcription";

#[derive(Debug, Deserialize)]
struct TranscriptionBody {
    text: String,
}

/// Speech-to-text over the OpenAI audio transcription endpoint.
#[derive(Debug, Clone)]
pub struct SttService {
    client: reqwest::Client,
    config: OpenAiConfig,
}

impl SttService {
    pub fn new(client: reqwest::Client, config: OpenAiConfig) -> Self {
        Self { client, config }
    }

    /// Uploads a recording as `audio.webm` and returns the transcript text.
    pub async fn transcribe(&self, audio: &AudioBlob) -> Result<String, VoiceError> {
        if audio.len() > MAX_AUDIO_INPUT_BYTES {
            return Err(VoiceError::AudioTooLarge {
                size: audio.len(),
                limit: MAX_AUDIO_INPUT_BYTES,
            });
        }

        let file = Part::bytes(audio.bytes.clone())
            .file_name("audio.webm")
            .mime_str(audio.content_type)?;
        let form = Form::new()
            .part("file", file)
            .text("model", self.config.transcription_model.clone());

        let url = format!(
            "{}/v1/audio/transcriptions",
            self.config.base_url.trim_end_matches('/')
        );
        tracing::debug!(bytes = audio.len(), model = %self.config.transcription_model, "requesting transcription");

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.config.api_key)
            .multipart(form)
            .send()
            .await?;
        let body: TranscriptionBody = check_status(SERVICE, response).await?.json().await?;

        Ok(body.text.trim().to_string())
    }
}
