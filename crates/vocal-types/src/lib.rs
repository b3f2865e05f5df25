//! Shared types and constants for the vocal voice front end.
//!
//! This crate holds the domain vocabulary used by every other crate in the
//! workspace: conversation roles, persisted turn records, the wire shapes of
//! the three remote-procedure operations, caller identities, and feature
//! flag keys.
//!
//! Nothing here touches the network or the database. Server and client both
//! depend on it so the request and response bodies they exchange cannot
//! drift apart.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

mod conversation;
pub use conversation::{
    ConversationContext, ConversationEntry, ResponseRef, SignedAudio, TranscriptRef, Turn,
};

/// Validity of a freshly minted signed audio URL, in seconds.
pub const SIGNED_URL_TTL_SECONDS: u64 = 600;

/// Errors produced when parsing textual representations of shared types.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    /// The role label is neither `user` nor `agent`.
    #[error("unknown conversation role: {0}")]
    UnknownRole(String),
    /// The flag key is not one of the seeded flags.
    #[error("unknown feature flag: {0}")]
    UnknownFlag(String),
}

/// Which side of the conversation produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Speech recorded from the person using the widget.
    User,
    /// Text generated by the language model.
    Agent,
}

impl Role {
    /// Returns the label stored in the database and rendered into context lines.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Agent => "agent",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "agent" => Ok(Self::Agent),
            other => Err(ParseError::UnknownRole(other.to_string())),
        }
    }
}

/// Keys of the boolean feature flags.
///
/// Flags are seeded by migration; a missing row is an operational error,
/// never an implicit `false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FlagKey {
    /// Routes speech synthesis to the alternate (PlayHT) provider.
    #[serde(rename = "usePlayHT")]
    UsePlayHt,
}

impl FlagKey {
    /// All known flag keys.
    pub const ALL: [FlagKey; 1] = [FlagKey::UsePlayHt];

    /// Returns the key as stored in the `flags` table.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UsePlayHt => "usePlayHT",
        }
    }
}

impl fmt::Display for FlagKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FlagKey {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "usePlayHT" => Ok(Self::UsePlayHt),
            other => Err(ParseError::UnknownFlag(other.to_string())),
        }
    }
}

/// A caller identified by network address.
///
/// The address is the deduplication key; the user agent is whatever was seen
/// on first contact and is never updated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Network address taken from the forwarded-for header.
    pub ip: String,
    /// User agent string seen on first contact.
    pub user_agent: String,
    /// Creation timestamp (RFC 3339).
    pub created_at: String,
}

/// A feature flag row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flag {
    pub id: FlagKey,
    pub enabled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_labels_parse_back() {
        for role in [Role::User, Role::Agent] {
            assert_eq!(role.as_str().parse::<Role>(), Ok(role));
        }
        assert_eq!(
            "assistant".parse::<Role>(),
            Err(ParseError::UnknownRole("assistant".to_string()))
        );
    }

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Agent).unwrap(), "\"agent\"");
    }

    #[test]
    fn flag_key_uses_table_spelling() {
        assert_eq!(FlagKey::UsePlayHt.as_str(), "usePlayHT");
        assert_eq!(
            serde_json::to_string(&FlagKey::UsePlayHt).unwrap(),
            "\"usePlayHT\""
        );
        assert!("usePlayHt".parse::<FlagKey>().is_err());
    }
}
