use crate::pipeline::{PipelineState, Stage};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with an error body.
    #[error("server returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("microphone error: {0}")]
    Capture(String),

    #[error("playback error: {0}")]
    Playback(String),

    /// The recording produced no audio.
    #[error("recording is empty")]
    EmptyRecording,

    #[error("cannot {action} while {state}")]
    InvalidState {
        state: PipelineState,
        action: &'static str,
    },

    /// A turn stopped at `stage`; the conversation context was left unchanged.
    #[error("turn failed while generating the {stage}: {source}")]
    TurnFailed {
        stage: Stage,
        #[source]
        source: Box<ClientError>,
    },
}

impl ClientError {
    /// True for a server-reported `404`.
    pub fn is_not_found(&self) -> bool {
        match self {
            ClientError::Api { status, .. } => *status == 404,
            ClientError::TurnFailed { source, .. } => source.is_not_found(),
            _ => false,
        }
    }
}
