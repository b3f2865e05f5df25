//! Database layer for the vocal server.
//!
//! Provides SQLite connection pooling (via `r2d2`), WAL-mode initialization,
//! and embedded SQL migrations. Every table (users, conversations, flags) is
//! created through versioned migrations managed by this crate; the flags
//! migration also seeds the known flag rows.

mod migrations;
mod pool;

pub use migrations::{run_migrations, MigrationError};
pub use pool::{create_pool, DbPool, DbRuntimeSettings, PoolError};
