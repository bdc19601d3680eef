//! # Persistence Format
//!
//! Binary encoding for durable catalog snapshots.
//!
//! Format: Header (5 bytes) + postcard-serialized [`SnapshotRecord`].
//! - 4 bytes: Magic ("GFIT")
//! - 1 byte: Version
//!
//! Size and header are validated before any payload decoding, so a corrupt
//! or hostile record fails fast without large allocations.

use crate::{GearError, primitives};
use serde::{Deserialize, Serialize};

// =============================================================================
// LIMITS
// =============================================================================

/// Maximum accepted size of an encoded record.
pub const MAX_PERSISTENCE_PAYLOAD_SIZE: usize = 256 * 1024 * 1024; // 256 MB

const HEADER_SIZE: usize = 5;

// =============================================================================
// HEADER
// =============================================================================

/// The header that precedes every stored record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersistenceHeader {
    pub magic: [u8; 4],
    pub version: u8,
}

impl PersistenceHeader {
    /// Header for the current format version.
    #[must_use]
    pub fn new() -> Self {
        Self {
            magic: *primitives::MAGIC_BYTES,
            version: primitives::FORMAT_VERSION,
        }
    }

    pub fn validate(&self) -> Result<(), GearError> {
        if &self.magic != primitives::MAGIC_BYTES {
            return Err(GearError::Serialization("Invalid magic bytes".to_string()));
        }
        if self.version != primitives::FORMAT_VERSION {
            return Err(GearError::Serialization(format!(
                "Unsupported version: {} (expected {})",
                self.version,
                primitives::FORMAT_VERSION
            )));
        }
        Ok(())
    }

    #[must_use]
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut bytes = [0u8; HEADER_SIZE];
        bytes[0..4].copy_from_slice(&self.magic);
        bytes[4] = self.version;
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, GearError> {
        let Some(head) = bytes.get(..HEADER_SIZE) else {
            return Err(GearError::Serialization("Header too short".to_string()));
        };
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&head[0..4]);
        Ok(Self {
            magic,
            version: head[4],
        })
    }
}

impl Default for PersistenceHeader {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// RECORD
// =============================================================================

/// A raw catalog payload together with the time it was saved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotRecord {
    /// Milliseconds since the Unix epoch.
    pub saved_at_ms: u64,
    /// The raw item payload exactly as fetched.
    pub payload: Vec<u8>,
}

impl SnapshotRecord {
    #[must_use]
    pub fn new(saved_at_ms: u64, payload: Vec<u8>) -> Self {
        Self {
            saved_at_ms,
            payload,
        }
    }

    /// Age in whole minutes at `now_ms`. Clock skew into the future counts as zero.
    #[must_use]
    pub fn age_minutes(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.saved_at_ms) / 60_000
    }
}

/// Encode a record as header + postcard bytes.
pub fn record_to_bytes(record: &SnapshotRecord) -> Result<Vec<u8>, GearError> {
    let body =
        postcard::to_stdvec(record).map_err(|e| GearError::Serialization(e.to_string()))?;

    let mut out = Vec::with_capacity(HEADER_SIZE + body.len());
    out.extend_from_slice(&PersistenceHeader::new().to_bytes());
    out.extend_from_slice(&body);
    Ok(out)
}

/// Decode a record, validating size and header first.
pub fn record_from_bytes(bytes: &[u8]) -> Result<SnapshotRecord, GearError> {
    if bytes.len() < HEADER_SIZE {
        return Err(GearError::Serialization(format!(
            "Data too short: minimum {} bytes required",
            HEADER_SIZE
        )));
    }
    if bytes.len() > MAX_PERSISTENCE_PAYLOAD_SIZE {
        return Err(GearError::Serialization(format!(
            "Data size {} bytes exceeds maximum allowed {} bytes",
            bytes.len(),
            MAX_PERSISTENCE_PAYLOAD_SIZE
        )));
    }

    let header = PersistenceHeader::from_bytes(bytes)?;
    header.validate()?;

    postcard::from_bytes(&bytes[HEADER_SIZE..])
        .map_err(|e| GearError::Serialization(format!("Failed to decode snapshot record: {}", e)))
}

// =============================================================================
// TESTS
// =============================================================================
