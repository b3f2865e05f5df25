//! Client side of the vocal front end.
//!
//! The [`Orchestrator`] owns one session: its microphone and player, its
//! conversation memory, and the sequence of remote calls for each recording.
//! Remote calls go through a [`VoiceBackend`]; [`HttpBackend`] talks to the
//! vocal server.

pub mod backend;
pub mod devices;
pub mod error;
pub mod events;
pub mod pipeline;

pub use backend::{HttpBackend, VoiceBackend};
pub use devices::{AudioCapture, AudioPlayback, LogPlayback, QueuedCapture};
pub use error::ClientError;
pub use events::{LogEventSink, NoopEventSink, PipelineEvent, PipelineEventSink};
pub use pipeline::{Orchestrator, PipelineState, Stage, TurnOutcome};
