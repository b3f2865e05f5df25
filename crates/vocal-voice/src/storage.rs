//! Object storage for synthesized audio.
//!
//! Talks to a Supabase Storage bucket: blobs are uploaded under a fresh UUID
//! key and handed out only as time-limited signed download URLs.

use crate::audio::AudioBlob;
use crate::config::StorageConfig;
use crate::error::{check_status, VoiceError};
use chrono::{Duration, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const SERVICE: &str = "object storage";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SignRequest {
    expires_in: u64,
}

#[derive(Debug, Deserialize)]
struct SignBody {
    #[serde(rename = "signedURL")]
    signed_url: String,
}

/// A signed download URL and its expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedUrl {
    pub url: String,
    /// Expiry timestamp (RFC 3339).
    pub expires_at: String,
}

/// An uploaded blob together with its first signed URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAudio {
    pub object_key: String,
    pub signed: SignedUrl,
}

#[derive(Debug, Clone)]
pub struct ObjectStorage {
    client: reqwest::Client,
    config: StorageConfig,
}

impl ObjectStorage {
    pub fn new(client: reqwest::Client, config: StorageConfig) -> Self {
        Self { client, config }
    }

    fn storage_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1{}",
            self.config.project_url.trim_end_matches('/'),
            path
        )
    }

    /// Uploads a blob under `key`.
    pub async fn upload(&self, key: &str, blob: &AudioBlob) -> Result<(), VoiceError> {
        let url = self.storage_url(&format!("/object/{}/{}", self.config.bucket, key));
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.config.api_key)
            .header("apikey", &self.config.api_key)
            .header(reqwest::header::CONTENT_TYPE, blob.content_type)
            .body(blob.bytes.clone())
            .send()
            .await?;
        check_status(SERVICE, response).await?;

        tracing::debug!(bucket = %self.config.bucket, key, bytes = blob.len(), "uploaded audio object");
        Ok(())
    }

    /// Mints a download URL for `key` valid for the configured TTL.
    pub async fn create_signed_url(&self, key: &str) -> Result<SignedUrl, VoiceError> {
        let ttl = self.config.signed_url_ttl_seconds;
        let url = self.storage_url(&format!("/object/sign/{}/{}", self.config.bucket, key));
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.config.api_key)
            .header("apikey", &self.config.api_key)
            .json(&SignRequest { expires_in: ttl })
            .send()
            .await?;
        let body: SignBody = check_status(SERVICE, response).await?.json().await?;

        let url = if body.signed_url.starts_with("http://") || body.signed_url.starts_with("https://")
        {
            body.signed_url
        } else {
            self.storage_url(&body.signed_url)
        };
        let expires_at = (Utc::now() + Duration::seconds(ttl as i64))
            .to_rfc3339_opts(SecondsFormat::Secs, true);

        Ok(SignedUrl { url, expires_at })
    }

    /// Uploads a blob under a new UUID key and signs it.
    ///
    /// If signing fails after a successful upload the object stays in the
    /// bucket unreferenced; its key is logged.
    pub async fn store(&self, blob: &AudioBlob) -> Result<StoredAudio, VoiceError> {
        let object_key = Uuid::new_v4().to_string();
        self.upload(&object_key, blob).await?;

        match self.create_signed_url(&object_key).await {
            Ok(signed) => Ok(StoredAudio { object_key, signed }),
            Err(e) => {
                tracing::warn!(
                    bucket = %self.config.bucket,
                    key = %object_key,
                    "signing failed after upload, object left orphaned: {}",
                    e
                );
                Err(e)
            }
        }
    }
}
