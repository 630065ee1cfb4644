// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Storage Module
//!
//! Embedded ACID store backed by redb (pure Rust). One database file holds
//! principals, the course catalogue and the login activity log.
//!
//! ## Table Layout
//!
//! - `principals`: principal id → JSON [`Principal`](crate::models::Principal)
//! - `principal_email`: email → principal id (uniqueness index)
//! - `courses`, `modules`, `enrollments`, `wishlist`, `discussions`:
//!   id → JSON record
//! - `enrollment_index`, `wishlist_index`: (user id, course id) → record id
//! - `activity`: (principal id, `YYYY-MM-DD`) → login count
//! - `sequences`: sequence name → last issued id
//!
//! ## Transactions
//!
//! All access goes through [`Store::read`] or [`Store::write`]. A write
//! closure runs inside a single redb write transaction that commits when the
//! closure returns `Ok` and aborts otherwise. redb serializes writers, so an
//! authorization check performed inside the closure still holds when the
//! mutation commits.

pub mod catalogue;
pub mod ownership;
pub mod principals;

use std::path::Path;
use std::sync::Arc;

use redb::{
    Database, ReadTransaction, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction,
};
use serde::{de::DeserializeOwned, Serialize};

pub use catalogue::CatalogueRead;
pub use ownership::{EnrollmentLookup, OrNotFound, Owned};
pub use principals::{ActivityRecorder, PrincipalStore};

/// Database file name under the data directory.
pub const DB_FILE_NAME: &str = "studysync.redb";

// =============================================================================
// Table Definitions
// =============================================================================

type RecordTable = TableDefinition<'static, u64, &'static [u8]>;
type PairIndex = TableDefinition<'static, (u64, u64), u64>;

pub(crate) const PRINCIPALS: RecordTable = TableDefinition::new("principals");
pub(crate) const PRINCIPAL_EMAIL: TableDefinition<&str, u64> =
    TableDefinition::new("principal_email");

pub(crate) const COURSES: RecordTable = TableDefinition::new("courses");
pub(crate) const MODULES: RecordTable = TableDefinition::new("modules");
pub(crate) const ENROLLMENTS: RecordTable = TableDefinition::new("enrollments");
pub(crate) const WISHLIST: RecordTable = TableDefinition::new("wishlist");
pub(crate) const DISCUSSIONS: RecordTable = TableDefinition::new("discussions");

/// (user id, course id) → enrollment id.
pub(crate) const ENROLLMENT_INDEX: PairIndex = TableDefinition::new("enrollment_index");
/// (user id, course id) → wishlist item id.
pub(crate) const WISHLIST_INDEX: PairIndex = TableDefinition::new("wishlist_index");

/// (principal id, day) → number of logins that day.
pub(crate) const ACTIVITY: TableDefinition<(u64, &str), u64> = TableDefinition::new("activity");

const SEQUENCES: TableDefinition<&str, u64> = TableDefinition::new("sequences");

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// A uniqueness constraint rejected the write.
    #[error("{0}")]
    UniqueViolation(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// Store
// =============================================================================

/// Handle to the embedded database. Cheap to clone.
#[derive(Clone)]
pub struct Store {
    db: Arc<Database>,
}

impl Store {
    /// Open (or create) the database at `path`.
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(PRINCIPALS)?;
            let _ = write_txn.open_table(PRINCIPAL_EMAIL)?;
            let _ = write_txn.open_table(COURSES)?;
            let _ = write_txn.open_table(MODULES)?;
            let _ = write_txn.open_table(ENROLLMENTS)?;
            let _ = write_txn.open_table(WISHLIST)?;
            let _ = write_txn.open_table(DISCUSSIONS)?;
            let _ = write_txn.open_table(ENROLLMENT_INDEX)?;
            let _ = write_txn.open_table(WISHLIST_INDEX)?;
            let _ = write_txn.open_table(ACTIVITY)?;
            let _ = write_txn.open_table(SEQUENCES)?;
        }
        write_txn.commit()?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Open (or create) the database file inside `data_dir`.
    pub fn open_in(data_dir: &Path) -> StoreResult<Self> {
        Self::open(&data_dir.join(DB_FILE_NAME))
    }

    /// Run `f` against a consistent snapshot.
    pub fn read<T, E>(&self, f: impl FnOnce(&ReadScope) -> Result<T, E>) -> Result<T, E>
    where
        E: From<StoreError>,
    {
        let txn = self.db.begin_read().map_err(StoreError::from)?;
        f(&ReadScope { txn })
    }

    /// Run `f` inside one write transaction.
    ///
    /// Commits when `f` returns `Ok`; aborts and discards every write made by
    /// `f` when it returns `Err`.
    pub fn write<T, E>(&self, f: impl FnOnce(&WriteScope) -> Result<T, E>) -> Result<T, E>
    where
        E: From<StoreError>,
    {
        let txn = self.db.begin_write().map_err(StoreError::from)?;
        let scope = WriteScope { txn };
        match f(&scope) {
            Ok(value) => {
                scope.txn.commit().map_err(StoreError::from)?;
                Ok(value)
            }
            Err(e) => {
                if let Err(abort_err) = scope.txn.abort() {
                    tracing::warn!(error = %abort_err, "Failed to abort write transaction");
                }
                Err(e)
            }
        }
    }

    /// Check that the database answers a read transaction.
    pub fn ping(&self) -> StoreResult<()> {
        let txn = self.db.begin_read()?;
        let _ = txn.open_table(SEQUENCES)?;
        Ok(())
    }
}

// =============================================================================
// Scopes
// =============================================================================

/// Read-only view over one snapshot.
pub struct ReadScope {
    txn: ReadTransaction,
}

/// Read-write view over one write transaction.
pub struct WriteScope {
    txn: WriteTransaction,
}

/// Raw reads shared by both scopes. Typed accessors build on it.
pub trait Lookup {
    fn get_record(&self, table: RecordTable, id: u64) -> StoreResult<Option<Vec<u8>>>;

    fn get_indexed(&self, table: PairIndex, key: (u64, u64)) -> StoreResult<Option<u64>>;

    fn scan_records(&self, table: RecordTable) -> StoreResult<Vec<Vec<u8>>>;

    fn get_decoded<T: DeserializeOwned>(&self, table: RecordTable, id: u64) -> StoreResult<Option<T>>
    where
        Self: Sized,
    {
        match self.get_record(table, id)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn scan_decoded<T: DeserializeOwned>(&self, table: RecordTable) -> StoreResult<Vec<T>>
    where
        Self: Sized,
    {
        self.scan_records(table)?
            .iter()
            .map(|bytes| serde_json::from_slice(bytes).map_err(StoreError::from))
            .collect()
    }
}

impl Lookup for ReadScope {
    fn get_record(&self, table: RecordTable, id: u64) -> StoreResult<Option<Vec<u8>>> {
        record_in(&self.txn.open_table(table)?, id)
    }

    fn get_indexed(&self, table: PairIndex, key: (u64, u64)) -> StoreResult<Option<u64>> {
        index_in(&self.txn.open_table(table)?, key)
    }

    fn scan_records(&self, table: RecordTable) -> StoreResult<Vec<Vec<u8>>> {
        records_in(&self.txn.open_table(table)?)
    }
}

impl Lookup for WriteScope {
    fn get_record(&self, table: RecordTable, id: u64) -> StoreResult<Option<Vec<u8>>> {
        record_in(&self.txn.open_table(table)?, id)
    }

    fn get_indexed(&self, table: PairIndex, key: (u64, u64)) -> StoreResult<Option<u64>> {
        index_in(&self.txn.open_table(table)?, key)
    }

    fn scan_records(&self, table: RecordTable) -> StoreResult<Vec<Vec<u8>>> {
        records_in(&self.txn.open_table(table)?)
    }
}

// Read-only and write transactions open different table types; both are
// `ReadableTable`, so the lookups themselves live here once.

fn record_in<T>(table: &T, id: u64) -> StoreResult<Option<Vec<u8>>>
where
    T: ReadableTable<u64, &'static [u8]>,
{
    Ok(table.get(id)?.map(|v| v.value().to_vec()))
}

fn index_in<T>(table: &T, key: (u64, u64)) -> StoreResult<Option<u64>>
where
    T: ReadableTable<(u64, u64), u64>,
{
    Ok(table.get(key)?.map(|v| v.value()))
}

fn records_in<T>(table: &T) -> StoreResult<Vec<Vec<u8>>>
where
    T: ReadableTable<u64, &'static [u8]>,
{
    let mut out = Vec::new();
    for entry in table.iter()? {
        let (_, value) = entry?;
        out.push(value.value().to_vec());
    }
    Ok(out)
}

impl WriteScope {
    /// Next id of the named sequence, starting at 1.
    pub fn next_id(&self, sequence: &str) -> StoreResult<u64> {
        let mut table = self.txn.open_table(SEQUENCES)?;
        let next = table.get(sequence)?.map(|v| v.value()).unwrap_or(0) + 1;
        table.insert(sequence, next)?;
        Ok(next)
    }

    pub(crate) fn put_record<T: Serialize>(
        &self,
        table: RecordTable,
        id: u64,
        record: &T,
    ) -> StoreResult<()> {
        let json = serde_json::to_vec(record)?;
        let mut table = self.txn.open_table(table)?;
        table.insert(id, json.as_slice())?;
        Ok(())
    }

    pub(crate) fn remove_record(&self, table: RecordTable, id: u64) -> StoreResult<()> {
        let mut table = self.txn.open_table(table)?;
        table.remove(id)?;
        Ok(())
    }

    /// Insert `key → id` into a pair index, failing if the key is taken.
    pub(crate) fn claim_index(
        &self,
        table: PairIndex,
        key: (u64, u64),
        id: u64,
        conflict: &str,
    ) -> StoreResult<()> {
        let mut table = self.txn.open_table(table)?;
        if table.get(key)?.is_some() {
            return Err(StoreError::UniqueViolation(conflict.to_string()));
        }
        table.insert(key, id)?;
        Ok(())
    }

    pub(crate) fn release_index(&self, table: PairIndex, key: (u64, u64)) -> StoreResult<()> {
        let mut table = self.txn.open_table(table)?;
        table.remove(key)?;
        Ok(())
    }

    pub(crate) fn txn(&self) -> &WriteTransaction {
        &self.txn
    }
}

impl ReadScope {
    pub(crate) fn txn(&self) -> &ReadTransaction {
        &self.txn
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use tempfile::TempDir;

    /// Fresh store in a temp dir. Keep the `TempDir` alive for the test.
    pub(crate) fn temp_store() -> (Store, TempDir) {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let store = Store::open_in(dir.path()).expect("Failed to open store");
        (store, dir)
    }

    #[test]
    fn sequences_start_at_one_and_increase() {
        let (store, _dir) = temp_store();
        let ids: StoreResult<(u64, u64, u64)> = store.write(|scope| {
            Ok((
                scope.next_id("courses")?,
                scope.next_id("courses")?,
                scope.next_id("modules")?,
            ))
        });
        assert_eq!(ids.unwrap(), (1, 2, 1));
    }

    #[test]
    fn failed_write_is_rolled_back() {
        let (store, _dir) = temp_store();

        let result: StoreResult<()> = store.write(|scope| {
            scope.put_record(COURSES, 1, &"draft")?;
            Err(StoreError::UniqueViolation("stop".into()))
        });
        assert!(result.is_err());

        let stored: StoreResult<Option<String>> = store.read(|scope| scope.get_decoded(COURSES, 1));
        assert_eq!(stored.unwrap(), None);
    }

    #[test]
    fn committed_write_is_visible() {
        let (store, _dir) = temp_store();

        store
            .write(|scope| scope.put_record(COURSES, 4, &"kept"))
            .unwrap();

        let stored: StoreResult<Option<String>> = store.read(|scope| scope.get_decoded(COURSES, 4));
        assert_eq!(stored.unwrap(), Some("kept".to_string()));
    }

    #[test]
    fn claim_index_rejects_taken_key() {
        let (store, _dir) = temp_store();

        store
            .write(|scope| scope.claim_index(ENROLLMENT_INDEX, (1, 2), 10, "taken"))
            .unwrap();
        let second = store.write(|scope| scope.claim_index(ENROLLMENT_INDEX, (1, 2), 11, "taken"));
        assert!(matches!(second, Err(StoreError::UniqueViolation(ref m)) if m == "taken"));

        let stored: StoreResult<Option<u64>> =
            store.read(|scope| scope.get_indexed(ENROLLMENT_INDEX, (1, 2)));
        assert_eq!(stored.unwrap(), Some(10));
    }

    #[test]
    fn write_scope_reads_its_own_writes_like_a_read_scope() {
        let (store, _dir) = temp_store();

        let seen: StoreResult<_> = store.write(|scope| {
            scope.put_record(COURSES, 1, &"a")?;
            scope.put_record(COURSES, 2, &"b")?;
            scope.claim_index(WISHLIST_INDEX, (3, 1), 7, "taken")?;
            Ok((
                scope.get_decoded::<String>(COURSES, 2)?,
                scope.get_indexed(WISHLIST_INDEX, (3, 1))?,
                scope.scan_decoded::<String>(COURSES)?,
            ))
        });
        let in_txn = seen.unwrap();

        let after: StoreResult<_> = store.read(|scope| {
            Ok((
                scope.get_decoded::<String>(COURSES, 2)?,
                scope.get_indexed(WISHLIST_INDEX, (3, 1))?,
                scope.scan_decoded::<String>(COURSES)?,
            ))
        });
        let committed = after.unwrap();

        assert_eq!(in_txn, committed);
        assert_eq!(committed.0.as_deref(), Some("b"));
        assert_eq!(committed.1, Some(7));
        assert_eq!(committed.2, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn reopen_keeps_data() {
        let dir = TempDir::new().unwrap();
        {
            let store = Store::open_in(dir.path()).unwrap();
            store
                .write(|scope| scope.put_record(COURSES, 1, &"persisted"))
                .unwrap();
        }
        let store = Store::open_in(dir.path()).unwrap();
        let stored: StoreResult<Option<String>> = store.read(|scope| scope.get_decoded(COURSES, 1));
        assert_eq!(stored.unwrap(), Some("persisted".to_string()));
        assert!(store.ping().is_ok());
    }
}
