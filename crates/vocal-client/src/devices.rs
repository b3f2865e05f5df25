//! Local audio resources: the microphone and the reply player.
//!
//! Both are exclusive. The orchestrator never records and plays at the
//! same time.

use crate::error::ClientError;
use std::collections::VecDeque;

/// A microphone capture resource.
pub trait AudioCapture: Send {
    /// Acquires the device and starts buffering audio.
    fn start(&mut self) -> Result<(), ClientError>;

    /// Releases the device and returns the buffered recording.
    fn stop(&mut self) -> Result<Vec<u8>, ClientError>;
}

/// Plays reply audio from a URL.
pub trait AudioPlayback: Send {
    fn play(&mut self, url: &str) -> Result<(), ClientError>;

    /// Pauses and discards whatever is loaded.
    fn stop(&mut self);

    fn is_playing(&self) -> bool;
}

/// Capture that hands out prerecorded clips, one per recording.
#[derive(Debug, Default)]
pub struct QueuedCapture {
    clips: VecDeque<Vec<u8>>,
    active: bool,
}

impl QueuedCapture {
    pub fn new(clips: impl IntoIterator<Item = Vec<u8>>) -> Self {
        Self {
            clips: clips.into_iter().collect(),
            active: false,
        }
    }

    pub fn remaining(&self) -> usize {
        self.clips.len()
    }
}

impl AudioCapture for QueuedCapture {
    fn start(&mut self) -> Result<(), ClientError> {
        if self.clips.is_empty() {
            return Err(ClientError::Capture("no recording left".to_string()));
        }
        self.active = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<Vec<u8>, ClientError> {
        if !self.active {
            return Err(ClientError::Capture("not recording".to_string()));
        }
        self.active = false;
        self.clips
            .pop_front()
            .ok_or_else(|| ClientError::Capture("no recording left".to_string()))
    }
}

/// Playback that only remembers and logs the current URL.
#[derive(Debug, Default)]
pub struct LogPlayback {
    current: Option<String>,
}

impl LogPlayback {
    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }
}

impl AudioPlayback for LogPlayback {
    fn play(&mut self, url: &str) -> Result<(), ClientError> {
        tracing::info!(url, "playback started");
        self.current = Some(url.to_string());
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(url) = self.current.take() {
            tracing::debug!(url = %url, "playback stopped");
        }
    }

    fn is_playing(&self) -> bool {
        self.current.is_some()
    }
}
