//! # redb-backed Snapshot Store
//!
//! Keeps the encoded snapshot record in a single-row redb table, giving
//! crash-safe replacement of the durable payload.

use crate::formats::{SnapshotRecord, record_from_bytes, record_to_bytes};
use crate::storage::SnapshotStore;
use crate::GearError;
use redb::{Database, ReadableDatabase, TableDefinition};
use std::path::{Path, PathBuf};

/// Table for snapshots: key -> encoded record bytes
const SNAPSHOTS: TableDefinition<&str, &[u8]> = TableDefinition::new("snapshots");

/// Row holding the item catalog payload.
const ITEMS_KEY: &str = "items";

/// A durable snapshot store backed by a redb file.
pub struct RedbSnapshotStore {
    db: Database,
    path: PathBuf,
}

impl std::fmt::Debug for RedbSnapshotStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbSnapshotStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl RedbSnapshotStore {
    /// Open or create the store at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, GearError> {
        let path = path.as_ref().to_path_buf();
        let db = Database::create(&path).map_err(|e| GearError::Io(e.to_string()))?;

        let write_txn = db.begin_write().map_err(|e| GearError::Io(e.to_string()))?;
        let _ = write_txn
            .open_table(SNAPSHOTS)
            .map_err(|e| GearError::Io(e.to_string()))?;
        write_txn.commit().map_err(|e| GearError::Io(e.to_string()))?;

        tracing::debug!(path = %path.display(), "Snapshot store opened");
        Ok(Self { db, path })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotStore for RedbSnapshotStore {
    fn read(&self) -> Result<Option<SnapshotRecord>, GearError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| GearError::Io(e.to_string()))?;
        let table = read_txn
            .open_table(SNAPSHOTS)
            .map_err(|e| GearError::Io(e.to_string()))?;
        let Some(guard) = table
            .get(ITEMS_KEY)
            .map_err(|e| GearError::Io(e.to_string()))?
        else {
            return Ok(None);
        };
        record_from_bytes(guard.value()).map(Some)
    }

    fn write(&self, record: &SnapshotRecord) -> Result<(), GearError> {
        let bytes = record_to_bytes(record)?;
        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| GearError::Io(e.to_string()))?;
        {
            let mut table = write_txn
                .open_table(SNAPSHOTS)
                .map_err(|e| GearError::Io(e.to_string()))?;
            table
                .insert(ITEMS_KEY, bytes.as_slice())
                .map_err(|e| GearError::Io(e.to_string()))?;
        }
        write_txn.commit().map_err(|e| GearError::Io(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persists_across_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("snapshot.redb");
        let record = SnapshotRecord::new(7, br#"{"items":[]}"#.to_vec());

        {
            let store = RedbSnapshotStore::open(&path).expect("open");
            assert!(store.read().expect("read empty").is_none());
            store.write(&record).expect("write");
        }

        let store = RedbSnapshotStore::open(&path).expect("reopen");
        assert_eq!(store.read().expect("read"), Some(record));
    }

    #[test]
    fn overwrite_replaces() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = RedbSnapshotStore::open(dir.path().join("s.redb")).expect("open");
        store.write(&SnapshotRecord::new(1, b"a".to_vec())).expect("write");
        store.write(&SnapshotRecord::new(2, b"b".to_vec())).expect("write");
        let read = store.read().expect("read").expect("present");
        assert_eq!(read.saved_at_ms, 2);
    }
}
