//! Snapshot storage contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide the `SnapshotStorage` trait consumed by `TaskStore`.
//! - Keep SQL inside the core persistence boundary.
//!
//! # Invariants
//! - `set_item` fully replaces the previous value for a key.
//! - Log lines carry key and byte length only, never stored values.

use crate::db::{open_db, open_db_in_memory, DbError};
use log::debug;
use rusqlite::{params, Connection, OptionalExtension};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

pub type StorageResult<T> = Result<T, StorageError>;

/// Storage backend failure.
#[derive(Debug)]
pub enum StorageError {
    Db(DbError),
    /// Failure reported by a non-SQLite backend.
    Backend(String),
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Backend(message) => write!(f, "storage backend failure: {message}"),
        }
    }
}

impl Error for StorageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Backend(_) => None,
        }
    }
}

impl From<DbError> for StorageError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Opaque key-value storage used to persist store snapshots.
pub trait SnapshotStorage {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>>;
    fn set_item(&self, key: &str, value: &str) -> StorageResult<()>;
    fn remove_item(&self, key: &str) -> StorageResult<()>;
}

impl<T: SnapshotStorage + ?Sized> SnapshotStorage for &T {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        (**self).set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> StorageResult<()> {
        (**self).remove_item(key)
    }
}

/// SQLite-backed snapshot storage over the `kv_entries` table.
pub struct SqliteSnapshotStorage {
    conn: Connection,
}

impl SqliteSnapshotStorage {
    /// Wraps an already migrated connection.
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// Opens the database file at `path`, applying migrations.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        Ok(Self::new(open_db(path)?))
    }

    pub fn open_in_memory() -> StorageResult<Self> {
        Ok(Self::new(open_db_in_memory()?))
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl SnapshotStorage for SqliteSnapshotStorage {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_entries WHERE key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        debug!(
            "event=storage_get module=repo status=ok key={key} found={} bytes={}",
            value.is_some(),
            value.as_ref().map_or(0, String::len)
        );
        Ok(value)
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        self.conn.execute(
            "INSERT INTO kv_entries (key, value, updated_at)
             VALUES (?1, ?2, (strftime('%s', 'now') * 1000))
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at;",
            params![key, value],
        )?;
        debug!(
            "event=storage_set module=repo status=ok key={key} bytes={}",
            value.len()
        );
        Ok(())
    }

    fn remove_item(&self, key: &str) -> StorageResult<()> {
        let removed = self
            .conn
            .execute("DELETE FROM kv_entries WHERE key = ?1;", [key])?;
        debug!("event=storage_remove module=repo status=ok key={key} removed={removed}");
        Ok(())
    }
}
