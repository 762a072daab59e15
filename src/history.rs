//! Persistent rename history.
//!
//! Every committed rename is appended to a SQLite table so it can be
//! reversed later. The log is append-only: records are never updated or
//! removed. Each call opens its own connection and drops it before
//! returning, so no handle outlives a single operation.

use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Identifier assigned to a record by the store.
pub type RecordId = i64;

/// Default database file, relative to the working directory.
pub const DEFAULT_DATABASE: &str = "log.db";

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS file_log (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    original_name TEXT,
    renamed_name TEXT
)";

/// One immutable ledger entry for a single rename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenameRecord {
    /// Monotonically increasing id, never reused.
    pub id: RecordId,
    /// Base name before the rename.
    pub original_name: String,
    /// Base name right after the rename.
    pub renamed_name: String,
}

impl RenameRecord {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            original_name: row.get(1)?,
            renamed_name: row.get(2)?,
        })
    }
}

/// Errors raised by the history store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The database could not be opened, read or written.
    #[error("History store {} unavailable: {source}", path.display())]
    Unavailable {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },
}

/// Result type for history store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Append-only rename log backed by a SQLite file.
///
/// The store only remembers where the database lives; connections are
/// opened per call.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    db_path: PathBuf,
}

impl HistoryStore {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }

    /// Location of the backing database file.
    pub fn path(&self) -> &Path {
        &self.db_path
    }

    fn unavailable(&self, source: rusqlite::Error) -> StoreError {
        StoreError::Unavailable {
            path: self.db_path.clone(),
            source,
        }
    }

    /// Runs `op` against a freshly opened connection.
    ///
    /// The connection is dropped when this returns, on success and on error.
    fn with_connection<T>(
        &self,
        op: impl FnOnce(&Connection) -> rusqlite::Result<T>,
    ) -> StoreResult<T> {
        let conn = Connection::open(&self.db_path).map_err(|e| self.unavailable(e))?;
        op(&conn).map_err(|e| self.unavailable(e))
    }

    /// Ensures the history table exists.
    ///
    /// Idempotent and non-destructive; safe to call on every start.
    pub fn initialize(&self) -> StoreResult<()> {
        self.with_connection(|conn| conn.execute_batch(CREATE_TABLE))?;
        debug!(db = %self.db_path.display(), "history store initialized");
        Ok(())
    }

    /// Appends a record and returns its id.
    ///
    /// Duplicate content is accepted; only storage failures are errors.
    pub fn append(&self, original_name: &str, renamed_name: &str) -> StoreResult<RecordId> {
        let id = self.with_connection(|conn| {
            conn.execute(
                "INSERT INTO file_log (original_name, renamed_name) VALUES (?1, ?2)",
                params![original_name, renamed_name],
            )?;
            Ok(conn.last_insert_rowid())
        })?;
        debug!(id, original_name, renamed_name, "appended rename record");
        Ok(id)
    }

    /// Finds the most recent record whose `renamed_name` matches.
    ///
    /// When several records share the name, the highest id wins.
    pub fn find_latest_by_renamed_name(
        &self,
        renamed_name: &str,
    ) -> StoreResult<Option<RenameRecord>> {
        let record = self.with_connection(|conn| {
            conn.query_row(
                "SELECT id, original_name, renamed_name FROM file_log
                 WHERE renamed_name = ?1
                 ORDER BY id DESC
                 LIMIT 1",
                params![renamed_name],
                RenameRecord::from_row,
            )
            .optional()
        })?;
        debug!(renamed_name, found = record.is_some(), "history lookup");
        Ok(record)
    }

    /// Returns every record, oldest first.
    pub fn list_all(&self) -> StoreResult<Vec<RenameRecord>> {
        self.with_connection(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, original_name, renamed_name FROM file_log ORDER BY id ASC",
            )?;
            let records = stmt
                .query_map([], RenameRecord::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(records)
        })
    }
}
