use thiserror::Error;

#[derive(Error, Debug)]
pub enum VoiceError {
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// A remote service answered with a non-success status.
    #[error("{service} returned {status}: {body}")]
    Upstream {
        service: &'static str,
        status: u16,
        body: String,
    },

    /// A remote service answered successfully but without the expected payload.
    #[error("{service} returned an unusable response: {reason}")]
    MalformedResponse {
        service: &'static str,
        reason: String,
    },

    #[error("audio payload could not be decoded: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("audio payload is empty")]
    EmptyAudio,

    #[error("audio payload too large: {size} bytes (limit: {limit} bytes)")]
    AudioTooLarge { size: usize, limit: usize },

    #[error("text too large for synthesis: {size} bytes (limit: {limit} bytes)")]
    TextTooLarge { size: usize, limit: usize },

    /// The primary provider's voice catalog is empty.
    #[error("no voice available to generate audio")]
    VoiceNotFound,
}

impl VoiceError {
    /// Reads the body of a failed response into an `Upstream` error.
    pub(crate) async fn upstream(service: &'static str, response: reqwest::Response) -> Self {
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .unwrap_or_else(|e| format!("<unreadable body: {e}>"));
        Self::Upstream {
            service,
            status,
            body,
        }
    }
}

/// Passes successful responses through and turns the rest into `VoiceError::Upstream`.
pub(crate) async fn check_status(
    service: &'static str,
    response: reqwest::Response,
) -> Result<reqwest::Response, VoiceError> {
    if response.status().is_success() {
        Ok(response)
    } else {
        Err(VoiceError::upstream(service, response).await)
    }
}
