//! Persistence store contracts and implementations for tree snapshots.
//!
//! # Responsibility
//! - Load the persisted top-level list once at startup.
//! - Replace the whole persisted list after every committed mutation.
//!
//! # Invariants
//! - A save fully replaces the previous snapshot for the same tree key.
//! - Loading a key that was never saved yields an empty list.
//! - Different tree keys never observe each other's snapshots.

use crate::codec::{from_json, to_json, CodecError, PersistData};
use crate::db::migrations::latest_version;
use crate::db::{schema_version, DbError};
use log::debug;
use rusqlite::{params, Connection, OptionalExtension};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Result type used by tree store operations.
pub type TreeStoreResult<T> = Result<T, TreeStoreError>;

/// Errors from tree store operations.
#[derive(Debug)]
pub enum TreeStoreError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Snapshot payload could not be encoded or decoded.
    Serialization(CodecError),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Tree key is blank.
    InvalidKey,
}

impl Display for TreeStoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Serialization(err) => write!(f, "{err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "tree store requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "tree store requires table `{table}`")
            }
            Self::InvalidKey => write!(f, "tree key must not be blank"),
        }
    }
}

impl Error for TreeStoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Serialization(err) => Some(err),
            Self::UninitializedConnection { .. }
            | Self::MissingRequiredTable(_)
            | Self::InvalidKey => None,
        }
    }
}

impl From<DbError> for TreeStoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for TreeStoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<CodecError> for TreeStoreError {
    fn from(value: CodecError) -> Self {
        Self::Serialization(value)
    }
}

/// Key-value collaborator holding one tree's top-level records.
pub trait TreeStore {
    /// Loads the persisted top-level list.
    fn load_top_level_nodes(&self) -> TreeStoreResult<Vec<PersistData>>;
    /// Replaces the persisted top-level list.
    fn save_top_level_nodes(&mut self, records: &[PersistData]) -> TreeStoreResult<()>;
    /// Deletes the persisted snapshot.
    fn clear_persisted(&mut self) -> TreeStoreResult<()>;
}

/// Volatile store, useful for previews and tests.
#[derive(Debug, Default, Clone)]
pub struct InMemoryTreeStore {
    records: Vec<PersistData>,
    saves: usize,
}

impl InMemoryTreeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded as if `records` had been saved earlier.
    pub fn with_records(records: Vec<PersistData>) -> Self {
        Self { records, saves: 0 }
    }

    pub fn records(&self) -> &[PersistData] {
        &self.records
    }

    /// Number of completed saves.
    pub fn save_count(&self) -> usize {
        self.saves
    }
}

impl TreeStore for InMemoryTreeStore {
    fn load_top_level_nodes(&self) -> TreeStoreResult<Vec<PersistData>> {
        Ok(self.records.clone())
    }

    fn save_top_level_nodes(&mut self, records: &[PersistData]) -> TreeStoreResult<()> {
        self.records = records.to_vec();
        self.saves += 1;
        Ok(())
    }

    fn clear_persisted(&mut self) -> TreeStoreResult<()> {
        self.records.clear();
        Ok(())
    }
}

/// SQLite-backed store keeping one JSON snapshot row per tree key.
pub struct SqliteTreeStore<'conn> {
    conn: &'conn Connection,
    tree_key: String,
}

impl<'conn> SqliteTreeStore<'conn> {
    /// Creates a store from a migrated connection.
    ///
    /// # Errors
    /// - `InvalidKey` for a blank key.
    /// - `UninitializedConnection`/`MissingRequiredTable` for unmigrated
    ///   connections.
    pub fn try_new(conn: &'conn Connection, tree_key: impl Into<String>) -> TreeStoreResult<Self> {
        let tree_key = tree_key.into();
        if tree_key.trim().is_empty() {
            return Err(TreeStoreError::InvalidKey);
        }
        ensure_store_connection_ready(conn)?;
        Ok(Self { conn, tree_key })
    }

    pub fn tree_key(&self) -> &str {
        &self.tree_key
    }
}

impl TreeStore for SqliteTreeStore<'_> {
    fn load_top_level_nodes(&self) -> TreeStoreResult<Vec<PersistData>> {
        let payload: Option<String> = self
            .conn
            .query_row(
                "SELECT payload FROM tree_snapshots WHERE tree_key = ?1;",
                [self.tree_key.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        match payload {
            Some(payload) => Ok(from_json(&payload)?),
            None => Ok(Vec::new()),
        }
    }

    fn save_top_level_nodes(&mut self, records: &[PersistData]) -> TreeStoreResult<()> {
        let payload = to_json(records)?;
        self.conn.execute(
            "INSERT INTO tree_snapshots (tree_key, payload, updated_at)
             VALUES (?1, ?2, strftime('%s', 'now') * 1000)
             ON CONFLICT(tree_key) DO UPDATE SET
                payload = excluded.payload,
                updated_at = excluded.updated_at;",
            params![self.tree_key, payload],
        )?;
        debug!(
            "event=snapshot_save module=repo status=ok top_level={} bytes={}",
            records.len(),
            payload.len()
        );
        Ok(())
    }

    fn clear_persisted(&mut self) -> TreeStoreResult<()> {
        self.conn.execute(
            "DELETE FROM tree_snapshots WHERE tree_key = ?1;",
            [self.tree_key.as_str()],
        )?;
        Ok(())
    }
}

fn ensure_store_connection_ready(conn: &Connection) -> TreeStoreResult<()> {
    let expected_version = latest_version();
    let actual_version = schema_version(conn)?;
    if actual_version != expected_version {
        return Err(TreeStoreError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'tree_snapshots'
        );",
        [],
        |row| row.get(0),
    )?;
    if exists != 1 {
        return Err(TreeStoreError::MissingRequiredTable("tree_snapshots"));
    }
    Ok(())
}
