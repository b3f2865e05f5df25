//! Session-scoped conversation storage.
//!
//! Every turn of every session lives in the unified `conversations` table,
//! tagged `user` (a transcript) or `agent` (a model reply). Agent entries
//! reference the transcript they answer and, once speech synthesis has run,
//! carry the object key and the latest signed URL of their audio.
//!
//! Ordering follows insertion: session listings are returned in the order
//! turns were written, which is the order the conversation happened.

use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use thiserror::Error;
use uuid::Uuid;
use vocal_types::{ConversationEntry, Role};

/// Errors that can occur during conversation operations.
#[derive(Debug, Error)]
pub enum ConversationError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("conversation entry not found: {0}")]
    NotFound(Uuid),
    /// Audio can only be attached to agent entries.
    #[error("conversation entry {0} is not an agent response")]
    NotAResponse(Uuid),
}

/// Parameters for recording a new turn.
#[derive(Debug, Clone)]
pub struct NewEntry<'a> {
    pub session_id: Uuid,
    pub role: Role,
    pub text: &'a str,
    /// Caller address for transcripts; `None` for agent replies.
    pub user_ip: Option<&'a str>,
    /// Transcript this entry answers; `None` for transcripts.
    pub source_id: Option<Uuid>,
}

/// Storage location and signed URL of a response's synthesized audio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioLink<'a> {
    pub object_key: &'a str,
    pub url: &'a str,
    pub expires_at: &'a str,
}

const ENTRY_COLUMNS: &str = "id, session_id, role, text, created_at, user_ip, source_id, \
     audio_url, audio_url_expires_at";

fn uuid_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let raw: String = row.get(idx)?;
    Uuid::parse_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn optional_uuid_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<Uuid>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| {
        Uuid::parse_str(&s)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
    })
    .transpose()
}

fn map_row_to_entry(row: &Row<'_>) -> rusqlite::Result<ConversationEntry> {
    let role: String = row.get(2)?;
    let role = role
        .parse::<Role>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e)))?;

    Ok(ConversationEntry {
        id: uuid_column(row, 0)?,
        session_id: uuid_column(row, 1)?,
        role,
        text: row.get(3)?,
        created_at: row.get(4)?,
        user_ip: row.get(5)?,
        source_id: optional_uuid_column(row, 6)?,
        audio_url: row.get(7)?,
        audio_url_expires_at: row.get(8)?,
    })
}

/// Records a new turn and returns the stored entry.
///
/// # Errors
///
/// Returns `ConversationError::Database` on SQL failure, including a
/// `user_ip` or `source_id` that violates its foreign key.
pub fn create_entry(
    conn: &Connection,
    entry: &NewEntry<'_>,
) -> Result<ConversationEntry, ConversationError> {
    let id = Uuid::new_v4();
    let sql = format!(
        "INSERT INTO conversations (id, session_id, role, text, user_ip, source_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         RETURNING {ENTRY_COLUMNS}"
    );

    let created = conn.query_row(
        &sql,
        params![
            id.to_string(),
            entry.session_id.to_string(),
            entry.role.as_str(),
            entry.text,
            entry.user_ip,
            entry.source_id.map(|s| s.to_string()),
        ],
        map_row_to_entry,
    )?;

    tracing::debug!(
        id = %created.id,
        session = %created.session_id,
        role = %created.role,
        "recorded conversation entry"
    );

    Ok(created)
}

/// Retrieves an entry by ID, or `None` if it does not exist.
pub fn find_entry(
    conn: &Connection,
    id: Uuid,
) -> Result<Option<ConversationEntry>, ConversationError> {
    let sql = format!("SELECT {ENTRY_COLUMNS} FROM conversations WHERE id = ?1");
    Ok(conn
        .query_row(&sql, [id.to_string()], map_row_to_entry)
        .optional()?)
}

/// Retrieves an entry by ID.
///
/// # Errors
///
/// Returns `ConversationError::NotFound` if no entry has this ID.
pub fn get_entry(conn: &Connection, id: Uuid) -> Result<ConversationEntry, ConversationError> {
    find_entry(conn, id)?.ok_or(ConversationError::NotFound(id))
}

/// Lists every entry of a session in chronological order.
pub fn list_session_entries(
    conn: &Connection,
    session_id: Uuid,
) -> Result<Vec<ConversationEntry>, ConversationError> {
    let sql = format!(
        "SELECT {ENTRY_COLUMNS} FROM conversations WHERE session_id = ?1 ORDER BY seq ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([session_id.to_string()], map_row_to_entry)?;

    let mut entries = Vec::new();
    for row in rows {
        entries.push(row?);
    }
    Ok(entries)
}

/// Attaches synthesized audio to an existing agent entry.
///
/// The text of the entry is never touched; calling this again replaces the
/// previous link, which is how an expired URL is refreshed.
///
/// # Errors
///
/// Returns `ConversationError::NotFound` if the entry does not exist and
/// `ConversationError::NotAResponse` if it is a transcript.
pub fn attach_audio(
    conn: &Connection,
    id: Uuid,
    link: &AudioLink<'_>,
) -> Result<ConversationEntry, ConversationError> {
    let sql = format!(
        "UPDATE conversations
         SET audio_object_key = ?2, audio_url = ?3, audio_url_expires_at = ?4
         WHERE id = ?1 AND role = 'agent'
         RETURNING {ENTRY_COLUMNS}"
    );

    let updated = conn
        .query_row(
            &sql,
            params![id.to_string(), link.object_key, link.url, link.expires_at],
            map_row_to_entry,
        )
        .optional()?;

    match updated {
        Some(entry) => Ok(entry),
        None => match find_entry(conn, id)? {
            Some(_) => Err(ConversationError::NotAResponse(id)),
            None => Err(ConversationError::NotFound(id)),
        },
    }
}

/// Returns the storage key of an entry's audio, if any has been attached.
///
/// # Errors
///
/// Returns `ConversationError::NotFound` if the entry does not exist.
pub fn audio_object_key(conn: &Connection, id: Uuid) -> Result<Option<String>, ConversationError> {
    conn.query_row(
        "SELECT audio_object_key FROM conversations WHERE id = ?1",
        [id.to_string()],
        |row| row.get::<_, Option<String>>(0),
    )
    .optional()?
    .ok_or(ConversationError::NotFound(id))
}
