//! Error types for the flag store.

use vocal_types::FlagKey;

/// Errors that can occur during flag operations.
#[derive(Debug, thiserror::Error)]
pub enum FlagError {
    /// The flag row has not been seeded.
    #[error("feature flag is not configured: {0}")]
    Missing(FlagKey),

    #[error("flag database error: {0}")]
    Database(#[from] rusqlite::Error),
}
