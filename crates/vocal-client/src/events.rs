//! Pipeline events and the sinks that receive them.

use crate::pipeline::{PipelineState, Stage};

/// Events emitted by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineEvent {
    /// Pipeline state changed
    StateChanged { state: PipelineState },
    /// Microphone opened
    RecordingStarted,
    /// Microphone released with this many bytes of audio
    RecordingStopped { bytes: usize },
    /// Previous reply cut off by a new recording
    PlaybackInterrupted,
    /// Transcript stored for the turn
    Transcript { text: String },
    /// Reply generated for the turn
    Response { text: String },
    /// Reply audio started playing
    Playing { url: String },
    /// Turn aborted; `message` is meant for the person recording
    TurnFailed { stage: Stage, message: String },
}

/// Trait for receiving pipeline events
pub trait PipelineEventSink: Send + Sync {
    fn on_event(&self, event: PipelineEvent);
}

/// No-op event sink (silent operation)
pub struct NoopEventSink;

impl PipelineEventSink for NoopEventSink {
    fn on_event(&self, _event: PipelineEvent) {}
}

/// Event sink writing to `tracing`
pub struct LogEventSink;

impl PipelineEventSink for LogEventSink {
    fn on_event(&self, event: PipelineEvent) {
        match &event {
            PipelineEvent::StateChanged { state } => tracing::debug!(%state, "pipeline state"),
            PipelineEvent::RecordingStarted => tracing::info!("recording started"),
            PipelineEvent::RecordingStopped { bytes } => {
                tracing::info!(bytes, "recording stopped")
            }
            PipelineEvent::PlaybackInterrupted => tracing::info!("playback interrupted"),
            PipelineEvent::Transcript { text } => tracing::info!(text = %text, "transcript"),
            PipelineEvent::Response { text } => tracing::info!(text = %text, "response"),
            PipelineEvent::Playing { url } => tracing::info!(url = %url, "playing reply"),
            PipelineEvent::TurnFailed { stage, message } => {
                tracing::error!(%stage, "{}", message)
            }
        }
    }
}
