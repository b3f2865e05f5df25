//! Caller identity resolution.
//!
//! Maps a caller's network address and user agent to a persisted [`User`],
//! creating the record on first contact. The address is the deduplication
//! key: a later call from the same address with a different user agent gets
//! the original record back unchanged.

use rusqlite::{params, Connection, OptionalExtension, Row};
use thiserror::Error;
pub use vocal_types::User;

/// Errors produced by identity resolution.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// No network address was supplied for the caller.
    #[error("caller network address is missing")]
    MissingAddress,
    /// No user agent was supplied for the caller.
    #[error("caller user agent is missing")]
    MissingUserAgent,
    /// The insert was a no-op but the existing row could not be read back.
    ///
    /// Only reachable if the row disappears between the two statements; the
    /// caller should retry.
    #[error("user record for {0} vanished during resolution")]
    Vanished(String),
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

fn map_row_to_user(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        ip: row.get(0)?,
        user_agent: row.get(1)?,
        created_at: row.get(2)?,
    })
}

/// Returns the user for `ip`, creating it with `user_agent` if unknown.
///
/// Performs one conflict-tolerant insert, and a lookup only when that insert
/// did not create a row.
///
/// # Errors
///
/// Returns [`IdentityError::MissingAddress`] or
/// [`IdentityError::MissingUserAgent`] when either input is absent or blank,
/// [`IdentityError::Vanished`] when the existing row cannot be found after a
/// no-op insert, and [`IdentityError::Database`] on SQL failure.
pub fn resolve_user(
    conn: &Connection,
    ip: Option<&str>,
    user_agent: Option<&str>,
) -> Result<User, IdentityError> {
    let ip = ip
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(IdentityError::MissingAddress)?;
    let user_agent = user_agent
        .filter(|s| !s.trim().is_empty())
        .ok_or(IdentityError::MissingUserAgent)?;

    let inserted = conn
        .query_row(
            "INSERT INTO users (ip, user_agent) VALUES (?1, ?2)
             ON CONFLICT(ip) DO NOTHING
             RETURNING ip, user_agent, created_at",
            params![ip, user_agent],
            map_row_to_user,
        )
        .optional()?;

    if let Some(user) = inserted {
        tracing::info!(ip = %user.ip, "registered new caller");
        return Ok(user);
    }

    get_user(conn, ip)?.ok_or_else(|| IdentityError::Vanished(ip.to_string()))
}

/// Looks up a user by network address.
///
/// # Errors
///
/// Returns [`IdentityError::Database`] if the query fails.
pub fn get_user(conn: &Connection, ip: &str) -> Result<Option<User>, IdentityError> {
    let user = conn
        .query_row(
            "SELECT ip, user_agent, created_at FROM users WHERE ip = ?1",
            [ip],
            map_row_to_user,
        )
        .optional()?;
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE users (
                ip TEXT PRIMARY KEY NOT NULL,
                user_agent TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
            );",
        )
        .unwrap();
        conn
    }

    #[test]
    fn missing_address_is_rejected() {
        let conn = users_db();
        let err = resolve_user(&conn, None, Some("curl/8")).unwrap_err();
        assert!(matches!(err, IdentityError::MissingAddress));

        let err = resolve_user(&conn, Some("  "), Some("curl/8")).unwrap_err();
        assert!(matches!(err, IdentityError::MissingAddress));
    }

    #[test]
    fn missing_user_agent_is_rejected() {
        let conn = users_db();
        let err = resolve_user(&conn, Some("10.0.0.1"), None).unwrap_err();
        assert!(matches!(err, IdentityError::MissingUserAgent));
    }

    #[test]
    fn first_contact_creates_user() {
        let conn = users_db();
        let user = resolve_user(&conn, Some("10.0.0.1"), Some("curl/8")).unwrap();
        assert_eq!(user.ip, "10.0.0.1");
        assert_eq!(user.user_agent, "curl/8");
        assert!(!user.created_at.is_empty());
    }
}
