//! Feature flag store.
//!
//! Flags are single boolean rows keyed by [`FlagKey`]. They are seeded by
//! migration and read fresh on every request; nothing here caches a value,
//! so toggling a flag takes effect on the very next read.

mod error;
mod store;


pub use error::FlagError;
pub use store::{get_flag, list_flags, set_flag};
pub use vocal_types::{Flag, FlagKey};
