//! # Formats
//!
//! Byte-level encodings for durable data. Pure transformations only; the
//! stores in `storage` decide where the bytes live.

pub mod persistence;

pub use persistence::{
    record_from_bytes, record_to_bytes, PersistenceHeader, SnapshotRecord,
    MAX_PERSISTENCE_PAYLOAD_SIZE,
};
