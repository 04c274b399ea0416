//! SQLite storage bootstrap and schema migrations for the on-device
//! key-value table.
//!
//! # Responsibility
//! - Open file or in-memory connections ready for the layout store.
//! - Apply schema migrations in order.
//!
//! # Invariants
//! - Schema version lives in `PRAGMA user_version`.
//! - Nothing reads or writes `kv_store` before migrations succeed.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// The file was written by a newer build.
    UnsupportedSchemaVersion { found: u32, supported: u32 },
    /// `kv_store` is missing on a connection handed to the store.
    MissingSchema,
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "sqlite error: {err}"),
            Self::UnsupportedSchemaVersion { found, supported } => write!(
                f,
                "schema version {found} is newer than the supported version {supported}"
            ),
            Self::MissingSchema => write!(f, "kv_store table is missing; run migrations first"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } | Self::MissingSchema => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
