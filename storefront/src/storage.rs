//! redb-based per-user record storage
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `records` | `(user_id, kind)` | JSON | Orders, profile, cart, favorites |
//!
//! Each save is its own write transaction; last write wins per key.

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Table for per-user records: key = (user_id, kind), value = JSON bytes
const RECORDS_TABLE: TableDefinition<(&str, &str), &[u8]> = TableDefinition::new("records");

/// Record kinds stored per user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Orders,
    Profile,
    Cart,
    Favorites,
}

impl RecordKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RecordKind::Orders => "orders",
            RecordKind::Profile => "profile",
            RecordKind::Cart => "cart",
            RecordKind::Favorites => "favorites",
        }
    }
}

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Record storage backed by redb
#[derive(Clone)]
pub struct RecordStorage {
    db: Arc<Database>,
}

impl std::fmt::Debug for RecordStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordStorage").finish_non_exhaustive()
    }
}

impl RecordStorage {
    /// Open or create the database at the given path
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        if let Some(parent) = path.as_ref().parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::create(path)?;
        Self::init(db)
    }

    /// Open an in-memory database (tests, ephemeral sessions)
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init(db)
    }

    fn init(db: Database) -> StorageResult<Self> {
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(RECORDS_TABLE)?;
        }
        write_txn.commit()?;
        Ok(Self { db: Arc::new(db) })
    }

    /// Load a record; `None` when nothing was stored yet
    pub fn load<T: DeserializeOwned>(
        &self,
        user_id: &str,
        kind: RecordKind,
    ) -> StorageResult<Option<T>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(RECORDS_TABLE)?;
        match table.get((user_id, kind.as_str()))? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Replace a record
    pub fn save<T: Serialize + ?Sized>(
        &self,
        user_id: &str,
        kind: RecordKind,
        value: &T,
    ) -> StorageResult<()> {
        let bytes = serde_json::to_vec(value)?;
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(RECORDS_TABLE)?;
            table.insert((user_id, kind.as_str()), bytes.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }

    /// Delete a record; returns whether it existed
    pub fn remove(&self, user_id: &str, kind: RecordKind) -> StorageResult<bool> {
        let txn = self.db.begin_write()?;
        let existed = {
            let mut table = txn.open_table(RECORDS_TABLE)?;
            table.remove((user_id, kind.as_str()))?.is_some()
        };
        txn.commit()?;
        Ok(existed)
    }
}
