//! Per-session recording pipeline.
//!
//! One turn walks `Idle → Recording → Transcribing → Responding →
//! Synthesizing → Playing → Idle`. The three remote calls of a turn run
//! strictly one after another; a failure at any of them ends the turn, emits
//! a [`PipelineEvent::TurnFailed`] naming the stage, and returns to `Idle`.
//!
//! The session's [`ConversationContext`] only changes when a turn reaches
//! `Playing`. Until then the user and agent lines live in a staged copy that
//! is dropped on failure.

use crate::backend::VoiceBackend;
use crate::devices::{AudioCapture, AudioPlayback};
use crate::error::ClientError;
use crate::events::{PipelineEvent, PipelineEventSink};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;
use vocal_types::{ConversationContext, ConversationEntry, ResponseRef, Role, SignedAudio};

/// Pipeline state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Recording,
    Transcribing,
    Responding,
    Synthesizing,
    Playing,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Recording => "recording",
            Self::Transcribing => "transcribing",
            Self::Responding => "responding",
            Self::Synthesizing => "synthesizing",
            Self::Playing => "playing",
        };
        f.write_str(name)
    }
}

/// The remote stage a turn failed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Transcript,
    Response,
    Audio,
}

impl Stage {
    /// Notification shown when the turn fails at this stage.
    pub fn notification(self) -> &'static str {
        match self {
            Self::Transcript => "There was an error while generating the transcript.",
            Self::Response => "There was an error while generating the response.",
            Self::Audio => "There was an error while generating the audio.",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Transcript => "transcript",
            Self::Response => "response",
            Self::Audio => "audio",
        };
        f.write_str(name)
    }
}

/// Everything a completed turn produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    pub transcript: ConversationEntry,
    pub response: ResponseRef,
    pub audio: SignedAudio,
}

/// Drives recording turns for one session.
pub struct Orchestrator {
    backend: Arc<dyn VoiceBackend>,
    capture: Box<dyn AudioCapture>,
    playback: Box<dyn AudioPlayback>,
    event_sink: Arc<dyn PipelineEventSink>,
    session: Uuid,
    context: ConversationContext,
    state: PipelineState,
}

impl Orchestrator {
    /// Creates an orchestrator with a fresh session.
    pub fn new(
        backend: Arc<dyn VoiceBackend>,
        capture: Box<dyn AudioCapture>,
        playback: Box<dyn AudioPlayback>,
        event_sink: Arc<dyn PipelineEventSink>,
    ) -> Self {
        Self {
            backend,
            capture,
            playback,
            event_sink,
            session: Uuid::new_v4(),
            context: ConversationContext::new(),
            state: PipelineState::Idle,
        }
    }

    pub fn session(&self) -> Uuid {
        self.session
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Conversation memory committed so far.
    pub fn context(&self) -> &ConversationContext {
        &self.context
    }

    fn set_state(&mut self, state: PipelineState) {
        self.state = state;
        self.event_sink
            .on_event(PipelineEvent::StateChanged { state });
    }

    fn expect_state(
        &self,
        allowed: &[PipelineState],
        action: &'static str,
    ) -> Result<(), ClientError> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(ClientError::InvalidState {
                state: self.state,
                action,
            })
        }
    }

    /// Switches to a stored session and rebuilds its context.
    pub async fn resume(&mut self, session: Uuid) -> Result<(), ClientError> {
        self.expect_state(&[PipelineState::Idle], "resume a session")?;

        let entries = self.backend.session_entries(session).await?;
        self.context = ConversationContext::from_entries(&entries);
        self.session = session;

        tracing::info!(session = %session, turns = self.context.len(), "session resumed");
        Ok(())
    }

    /// Opens the microphone, cutting off any reply still playing.
    pub fn start_recording(&mut self) -> Result<(), ClientError> {
        self.expect_state(
            &[PipelineState::Idle, PipelineState::Playing],
            "start recording",
        )?;

        if self.playback.is_playing() {
            self.playback.stop();
            self.event_sink.on_event(PipelineEvent::PlaybackInterrupted);
        }

        if let Err(e) = self.capture.start() {
            self.set_state(PipelineState::Idle);
            return Err(e);
        }
        self.event_sink.on_event(PipelineEvent::RecordingStarted);
        self.set_state(PipelineState::Recording);
        Ok(())
    }

    /// Marks the current reply as played to the end.
    pub fn playback_finished(&mut self) {
        if self.state == PipelineState::Playing {
            self.playback.stop();
            self.set_state(PipelineState::Idle);
        }
    }

    fn fail(&mut self, stage: Stage, source: ClientError) -> ClientError {
        tracing::warn!(session = %self.session, %stage, "turn failed: {}", source);
        self.event_sink.on_event(PipelineEvent::TurnFailed {
            stage,
            message: stage.notification().to_string(),
        });
        self.set_state(PipelineState::Idle);
        ClientError::TurnFailed {
            stage,
            source: Box::new(source),
        }
    }

    /// Releases the microphone and runs the recorded turn to playback.
    pub async fn stop_recording(&mut self) -> Result<TurnOutcome, ClientError> {
        self.expect_state(&[PipelineState::Recording], "stop recording")?;

        let recording = match self.capture.stop() {
            Ok(bytes) => bytes,
            Err(e) => {
                self.set_state(PipelineState::Idle);
                return Err(e);
            }
        };
        self.event_sink.on_event(PipelineEvent::RecordingStopped {
            bytes: recording.len(),
        });
        if recording.is_empty() {
            self.set_state(PipelineState::Idle);
            return Err(ClientError::EmptyRecording);
        }

        self.set_state(PipelineState::Transcribing);
        let base64_audio = STANDARD.encode(&recording);
        let transcript = match self
            .backend
            .transcript_audio(&base64_audio, self.session)
            .await
        {
            Ok(entry) => entry,
            Err(e) => return Err(self.fail(Stage::Transcript, e)),
        };
        self.event_sink.on_event(PipelineEvent::Transcript {
            text: transcript.text.clone(),
        });

        self.set_state(PipelineState::Responding);
        let staged = self.context.with_turn(Role::User, transcript.text.clone());
        let response = match self
            .backend
            .generate_response(&transcript.as_transcript(), &staged, self.session)
            .await
        {
            Ok(response) => response,
            Err(e) => return Err(self.fail(Stage::Response, e)),
        };
        self.event_sink.on_event(PipelineEvent::Response {
            text: response.text.clone(),
        });

        self.set_state(PipelineState::Synthesizing);
        let staged = staged.with_turn(Role::Agent, response.text.clone());
        let audio = match self.backend.generate_audio(&response).await {
            Ok(audio) => audio,
            Err(e) => return Err(self.fail(Stage::Audio, e)),
        };

        if self.playback.is_playing() {
            self.playback.stop();
        }
        if let Err(e) = self.playback.play(&audio.url) {
            return Err(self.fail(Stage::Audio, e));
        }

        self.context = staged;
        self.event_sink.on_event(PipelineEvent::Playing {
            url: audio.url.clone(),
        });
        self.set_state(PipelineState::Playing);

        Ok(TurnOutcome {
            transcript,
            response,
            audio,
        })
    }
}
