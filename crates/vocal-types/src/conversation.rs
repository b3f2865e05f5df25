//! Conversation turns, session memory, and the persisted turn record.

use crate::Role;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// One line of conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub text: String,
}

impl Turn {
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
        }
    }

    /// Renders the turn as a context line, `"<role>: <text>\n"`.
    pub fn line(&self) -> String {
        format!("{}: {}\n", self.role, self.text)
    }
}

/// Append-only conversational memory for one session.
///
/// Turns are kept in chronological order and can only be added. The server
/// never holds this: the client passes it by value with every response
/// request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationContext {
    turns: Vec<Turn>,
}

impl ConversationContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a context from persisted entries of a single session.
    ///
    /// Entries are expected in chronological order, as returned by the
    /// session history listing. Only completed turns are kept: an agent
    /// entry whose audio was produced, and the transcript it answers.
    /// Entries left behind by a turn that failed partway are skipped, so a
    /// reloaded context matches what the live session had committed.
    pub fn from_entries(entries: &[ConversationEntry]) -> Self {
        let answered: HashSet<Uuid> = entries
            .iter()
            .filter(|entry| entry.is_completed_reply())
            .filter_map(|entry| entry.source_id)
            .collect();

        Self {
            turns: entries
                .iter()
                .filter(|entry| match entry.role {
                    Role::User => answered.contains(&entry.id),
                    Role::Agent => entry.is_completed_reply() && entry.source_id.is_some(),
                })
                .map(|entry| Turn::new(entry.role, entry.text.clone()))
                .collect(),
        }
    }

    pub fn push(&mut self, role: Role, text: impl Into<String>) {
        self.turns.push(Turn::new(role, text));
    }

    /// Returns a copy of this context with one more turn appended.
    pub fn with_turn(&self, role: Role, text: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.push(role, text);
        next
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Concatenation of every turn's line in order.
    pub fn lines(&self) -> String {
        self.turns.iter().map(Turn::line).collect()
    }

    /// Builds the instruction string for the completion model.
    ///
    /// With no turns the system prompt is returned as is; otherwise the
    /// prompt is followed by a newline and the accumulated lines.
    pub fn render(&self, system_prompt: &str) -> String {
        if self.turns.is_empty() {
            system_prompt.to_string()
        } else {
            format!("{}\n{}", system_prompt, self.lines())
        }
    }
}

impl From<Vec<Turn>> for ConversationContext {
    fn from(turns: Vec<Turn>) -> Self {
        Self { turns }
    }
}

/// A persisted conversation entry.
///
/// User entries are transcripts; agent entries are model replies and link
/// back to the transcript they answer through `source_id`. An agent entry
/// gains an audio URL once speech synthesis has completed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationEntry {
    pub id: Uuid,
    pub session_id: Uuid,
    pub role: Role,
    pub text: String,
    /// Creation timestamp (RFC 3339, millisecond precision).
    pub created_at: String,
    /// Address of the caller that produced a transcript.
    pub user_ip: Option<String>,
    /// For agent entries, the transcript this reply was generated from.
    pub source_id: Option<Uuid>,
    /// Last signed URL minted for this entry's audio.
    pub audio_url: Option<String>,
    pub audio_url_expires_at: Option<String>,
}

impl ConversationEntry {
    /// An agent reply that reached speech synthesis.
    pub fn is_completed_reply(&self) -> bool {
        self.role == Role::Agent && self.audio_url.is_some()
    }

    pub fn as_transcript(&self) -> TranscriptRef {
        TranscriptRef {
            id: self.id,
            text: self.text.clone(),
            created_at: self.created_at.clone(),
        }
    }

    pub fn as_response(&self) -> ResponseRef {
        ResponseRef {
            id: self.id,
            text: self.text.clone(),
        }
    }
}

/// Transcript reference passed to the response operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptRef {
    pub id: Uuid,
    pub text: String,
    pub created_at: String,
}

/// Response reference passed to the speech operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseRef {
    pub id: Uuid,
    pub text: String,
}

/// A time-limited download link for synthesized audio.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedAudio {
    pub url: String,
    /// Expiry timestamp (RFC 3339).
    pub expires_at: String,
}
