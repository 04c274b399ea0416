//! Key-value store contract and its SQLite implementation.
//!
//! # Responsibility
//! - Read and write one string blob per key in `kv_store`.
//! - Load and save a `Layout` as JSON under a key.
//!
//! # Invariants
//! - Writes replace the whole blob; there are no partial updates.
//! - `load_layout` classifies unreadable JSON as `LoadOutcome::Corrupt`.

use crate::db::DbError;
use crate::model::layout::Layout;
use log::{debug, warn};
use rusqlite::{params, Connection, OptionalExtension};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    Serialize(serde_json::Error),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Serialize(err) => write!(f, "layout serialization failed: {err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Serialize(err) => Some(err),
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialize(value)
    }
}

/// On-device get/set of string blobs.
pub trait LayoutStore {
    fn get_blob(&self, key: &str) -> StoreResult<Option<String>>;
    fn set_blob(&self, key: &str, value: &str, updated_at: i64) -> StoreResult<()>;
    fn remove_blob(&self, key: &str) -> StoreResult<()>;
}

/// `LayoutStore` over the `kv_store` table. Owns its connection.
pub struct SqliteLayoutStore {
    conn: Connection,
}

impl SqliteLayoutStore {
    /// Wraps a connection returned by `open_db`/`open_db_in_memory`.
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// Like `new`, but rejects connections whose schema was never migrated.
    pub fn try_new(conn: Connection) -> Result<Self, DbError> {
        let exists = conn
            .query_row(
                "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'kv_store';",
                [],
                |_| Ok(()),
            )
            .optional()?
            .is_some();
        if !exists {
            return Err(DbError::MissingSchema);
        }
        Ok(Self::new(conn))
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl LayoutStore for SqliteLayoutStore {
    fn get_blob(&self, key: &str) -> StoreResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1;",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set_blob(&self, key: &str, value: &str, updated_at: i64) -> StoreResult<()> {
        self.conn.execute(
            "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at;",
            params![key, value, updated_at],
        )?;
        Ok(())
    }

    fn remove_blob(&self, key: &str) -> StoreResult<()> {
        self.conn
            .execute("DELETE FROM kv_store WHERE key = ?1;", params![key])?;
        Ok(())
    }
}

/// Result of reading the persisted layout.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    Stored(Layout),
    Missing,
    /// The blob exists but does not decode; `reason` is the decoder message.
    Corrupt { reason: String },
}

impl LoadOutcome {
    /// The stored layout, or `None` when missing or corrupt.
    pub fn into_layout(self) -> Option<Layout> {
        match self {
            Self::Stored(layout) => Some(layout),
            Self::Missing | Self::Corrupt { .. } => None,
        }
    }
}

/// Reads and decodes the layout stored under `key`.
pub fn load_layout(store: &dyn LayoutStore, key: &str) -> StoreResult<LoadOutcome> {
    let Some(blob) = store.get_blob(key)? else {
        debug!("event=layout_load module=repo status=skip key={key} reason=missing");
        return Ok(LoadOutcome::Missing);
    };
    match serde_json::from_str::<Layout>(&blob) {
        Ok(layout) => {
            debug!(
                "event=layout_load module=repo status=ok key={key} last_modified={}",
                layout.last_modified
            );
            Ok(LoadOutcome::Stored(layout))
        }
        Err(err) => {
            warn!("event=layout_load module=repo status=error key={key} error_code=layout_corrupt error={err}");
            Ok(LoadOutcome::Corrupt {
                reason: err.to_string(),
            })
        }
    }
}

/// Encodes `layout` and replaces the blob under `key`.
pub fn save_layout(store: &dyn LayoutStore, key: &str, layout: &Layout) -> StoreResult<()> {
    let blob = serde_json::to_string(layout)?;
    store.set_blob(key, &blob, layout.last_modified)?;
    debug!(
        "event=layout_save module=repo status=ok key={key} last_modified={} synced={}",
        layout.last_modified, layout.synced_with_server
    );
    Ok(())
}
