//! # Response Cache
//!
//! Bounded LRU memo of computed responses, keyed by a canonical request
//! [`Fingerprint`].
//!
//! `get` and `set` both refresh recency. Inserting past capacity evicts the
//! least recently used entry. The owning engine clears the cache whenever the
//! catalog is reloaded, since every cached value embeds catalog-derived data.

use crate::primitives::{MAX_FINGERPRINT_DEPTH, RESPONSE_CACHE_CAPACITY};
use crate::GearError;
use lru::LruCache;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard};

// =============================================================================
// FINGERPRINT
// =============================================================================

/// Canonical hash of a request's semantic inputs.
///
/// Object keys are sorted before hashing, so field order never changes the
/// fingerprint. Nesting past `MAX_FINGERPRINT_DEPTH` is replaced by a marker.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Fingerprint any serializable request.
    pub fn of<T: Serialize>(request: &T) -> Result<Self, GearError> {
        let value =
            serde_json::to_value(request).map_err(|e| GearError::Serialization(e.to_string()))?;
        Ok(Self::of_value(&value))
    }

    /// Fingerprint an already-built JSON value.
    #[must_use]
    pub fn of_value(value: &Value) -> Self {
        let canonical = canonical_json(value);
        Self(blake3::hash(canonical.as_bytes()).to_hex().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Compact JSON text with object keys in sorted order.
#[must_use]
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, 0, &mut out);
    out
}

fn write_canonical(value: &Value, depth: usize, out: &mut String) {
    if depth > MAX_FINGERPRINT_DEPTH {
        out.push_str("\"[depth-limit]\"");
        return;
    }
    match value {
        Value::Array(values) => {
            out.push('[');
            for (i, v) in values.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(v, depth + 1, out);
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            out.push('{');
            for (i, (key, v)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(v, depth + 1, out);
            }
            out.push('}');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

// =============================================================================
// LRU CACHE
// =============================================================================

/// Thread-safe LRU of responses keyed by [`Fingerprint`].
///
/// Locking is per operation; a poisoned lock is recovered since entries are
/// immutable once written.
pub struct ResponseCache<V> {
    capacity: NonZeroUsize,
    entries: Mutex<LruCache<Fingerprint, V>>,
}

impl<V: Clone> ResponseCache<V> {
    /// Create a cache holding at most `capacity` entries (minimum 1).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            capacity,
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Look up `key`, marking it most recently used.
    pub fn get(&self, key: &Fingerprint) -> Option<V> {
        self.lock().get(key).cloned()
    }

    /// Store `value`, marking it most recently used and evicting if full.
    pub fn set(&self, key: Fingerprint, value: V) {
        let evicted = self.lock().push(key.clone(), value);
        if let Some((old, _)) = evicted {
            if old != key {
                tracing::trace!(evicted = %old, "Response cache eviction");
            }
        }
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.lock().clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }

    /// Whether `key` is present, without touching recency.
    #[must_use]
    pub fn contains(&self, key: &Fingerprint) -> bool {
        self.lock().contains(key)
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<Fingerprint, V>> {
        match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl<V: Clone> Default for ResponseCache<V> {
    fn default() -> Self {
        Self::new(RESPONSE_CACHE_CAPACITY)
    }
}

impl<V> fmt::Debug for ResponseCache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseCache")
            .field("capacity", &self.capacity)
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================
