use serde::{Deserialize, Serialize};
use std::fmt;

fn default_openai_base_url() -> String {
    "https://api.openai.com".to_string()
}

fn default_transcription_model() -> String {
    "gpt-4o-transcribe".to_string()
}

fn default_response_model() -> String {
    "o4-mini".to_string()
}

fn default_elevenlabs_base_url() -> String {
    "https://api.elevenlabs.io".to_string()
}

fn default_elevenlabs_model() -> String {
    "eleven_multilingual_v2".to_string()
}

fn default_playht_base_url() -> String {
    "https://api.play.ai".to_string()
}

fn default_playht_model() -> String {
    "PlayDialog".to_string()
}

fn default_playht_voice() -> String {
    "s3://voice-cloning-zero-shot/0b29eab5-834f-4463-b3ad-4e6177d2b145/flynnsaad/manifest.json"
        .to_string()
}

fn default_bucket() -> String {
    "audio".to_string()
}

fn default_signed_url_ttl_seconds() -> u64 {
    vocal_types::SIGNED_URL_TTL_SECONDS
}

/// Credentials and models for the OpenAI transcription and response APIs.
#[derive(Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    #[serde(default, skip_serializing)]
    pub api_key: String,
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,
    #[serde(default = "default_transcription_model")]
    pub transcription_model: String,
    #[serde(default = "default_response_model")]
    pub response_model: String,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_openai_base_url(),
            transcription_model: default_transcription_model(),
            response_model: default_response_model(),
        }
    }
}

impl fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("transcription_model", &self.transcription_model)
            .field("response_model", &self.response_model)
            .finish()
    }
}

/// Primary speech provider (ElevenLabs).
#[derive(Clone, Serialize, Deserialize)]
pub struct ElevenLabsConfig {
    #[serde(default, skip_serializing)]
    pub api_key: String,
    #[serde(default = "default_elevenlabs_base_url")]
    pub base_url: String,
    #[serde(default = "default_elevenlabs_model")]
    pub model_id: String,
}

impl Default for ElevenLabsConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_elevenlabs_base_url(),
            model_id: default_elevenlabs_model(),
        }
    }
}

impl fmt::Debug for ElevenLabsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElevenLabsConfig")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("model_id", &self.model_id)
            .finish()
    }
}

/// Alternate speech provider (PlayHT), always speaking with one fixed voice.
#[derive(Clone, Serialize, Deserialize)]
pub struct PlayHtConfig {
    #[serde(default, skip_serializing)]
    pub api_key: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default = "default_playht_base_url")]
    pub base_url: String,
    #[serde(default = "default_playht_model")]
    pub model: String,
    #[serde(default = "default_playht_voice")]
    pub voice: String,
}

impl Default for PlayHtConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            user_id: String::new(),
            base_url: default_playht_base_url(),
            model: default_playht_model(),
            voice: default_playht_voice(),
        }
    }
}

impl fmt::Debug for PlayHtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlayHtConfig")
            .field("api_key", &"[REDACTED]")
            .field("user_id", &self.user_id)
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("voice", &self.voice)
            .finish()
    }
}

/// Object storage (Supabase Storage) bucket holding synthesized audio.
#[derive(Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub project_url: String,
    #[serde(default, skip_serializing)]
    pub api_key: String,
    #[serde(default = "default_bucket")]
    pub bucket: String,
    /// Validity of signed download URLs. Default: 600 (10 minutes).
    #[serde(default = "default_signed_url_ttl_seconds")]
    pub signed_url_ttl_seconds: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            project_url: String::new(),
            api_key: String::new(),
            bucket: default_bucket(),
            signed_url_ttl_seconds: default_signed_url_ttl_seconds(),
        }
    }
}

impl fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageConfig")
            .field("project_url", &self.project_url)
            .field("api_key", &"[REDACTED]")
            .field("bucket", &self.bucket)
            .field("signed_url_ttl_seconds", &self.signed_url_ttl_seconds)
            .finish()
    }
}
