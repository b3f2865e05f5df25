//! Persistence operations for feature flags.

use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};
use vocal_types::{Flag, FlagKey};

use crate::error::FlagError;

/// Reads the current value of a flag.
///
/// # Errors
///
/// Returns `FlagError::Missing` if the row does not exist; callers must not
/// treat an absent flag as disabled.
pub fn get_flag(conn: &Connection, key: FlagKey) -> Result<bool, FlagError> {
    conn.query_row(
        "SELECT enabled FROM flags WHERE id = ?1",
        [key.as_str()],
        |row| row.get::<_, bool>(0),
    )
    .optional()?
    .ok_or(FlagError::Missing(key))
}

/// Lists every flag row, ordered by key.
pub fn list_flags(conn: &Connection) -> Result<Vec<Flag>, FlagError> {
    let mut stmt = conn.prepare("SELECT id, enabled FROM flags ORDER BY id")?;
    let rows = stmt.query_map([], |row| {
        let id: String = row.get(0)?;
        let id = id
            .parse::<FlagKey>()
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e)))?;
        Ok(Flag {
            id,
            enabled: row.get(1)?,
        })
    })?;

    let mut flags = Vec::new();
    for row in rows {
        flags.push(row?);
    }
    Ok(flags)
}

/// Sets the value of an existing flag.
///
/// # Errors
///
/// Returns `FlagError::Missing` if the row has not been seeded.
pub fn set_flag(conn: &Connection, key: FlagKey, enabled: bool) -> Result<Flag, FlagError> {
    let changed = conn.execute(
        "UPDATE flags SET enabled = ?2 WHERE id = ?1",
        params![key.as_str(), enabled],
    )?;
    if changed == 0 {
        return Err(FlagError::Missing(key));
    }

    tracing::info!(flag = %key, enabled, "feature flag updated");
    Ok(Flag { id: key, enabled })
}
