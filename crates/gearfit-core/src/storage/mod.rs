//! # Snapshot Storage
//!
//! Durable homes for the raw catalog payload. Every store holds at most one
//! record, encoded with [`crate::formats::persistence`].

pub mod redb_store;

pub use redb_store::RedbSnapshotStore;

use crate::formats::{SnapshotRecord, record_from_bytes, record_to_bytes};
use crate::GearError;
use std::sync::{Mutex, MutexGuard};

/// Durable key-value slot for the last good catalog payload.
pub trait SnapshotStore: Send + Sync {
    /// The stored record, or `None` if nothing has been saved yet.
    fn read(&self) -> Result<Option<SnapshotRecord>, GearError>;

    /// Replace the stored record.
    fn write(&self, record: &SnapshotRecord) -> Result<(), GearError>;
}

/// Process-local store. Holds the encoded bytes so reads exercise the same
/// decoding path as the durable store.
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    bytes: Mutex<Option<Vec<u8>>>,
}

impl MemorySnapshotStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-seeded with `record`.
    pub fn with_record(record: &SnapshotRecord) -> Result<Self, GearError> {
        let store = Self::new();
        store.write(record)?;
        Ok(store)
    }

    fn lock(&self) -> MutexGuard<'_, Option<Vec<u8>>> {
        match self.bytes.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn read(&self) -> Result<Option<SnapshotRecord>, GearError> {
        self.lock().as_deref().map(record_from_bytes).transpose()
    }

    fn write(&self, record: &SnapshotRecord) -> Result<(), GearError> {
        let bytes = record_to_bytes(record)?;
        *self.lock() = Some(bytes);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_roundtrip() {
        let store = MemorySnapshotStore::new();
        assert!(store.read().expect("read").is_none());

        let record = SnapshotRecord::new(42, b"[]".to_vec());
        store.write(&record).expect("write");
        assert_eq!(store.read().expect("read"), Some(record));
    }
}
