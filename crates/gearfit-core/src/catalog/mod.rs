//! # Item Catalog
//!
//! An immutable, fully indexed snapshot of every equippable item, together
//! with a [`DataState`] describing how trustworthy the snapshot is.
//!
//! Snapshots are built whole and never mutated. A reload builds a new
//! snapshot and the owner swaps it in; readers never see a partial index.

pub mod loader;
pub mod normalize;

pub use loader::{CatalogLoader, ItemSource};
pub use normalize::{normalize_payload, Normalized};

use crate::{GearError, Item, Slot};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

// =============================================================================
// DATA STATE
// =============================================================================

/// Where a catalog snapshot came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataSource {
    /// Fetched from the item source during this load.
    #[serde(rename = "live")]
    Live,
    /// Reused from the durable snapshot while still within the TTL.
    #[serde(rename = "cache:fresh")]
    CacheFresh,
    /// Live fetch failed; an older durable snapshot is being served.
    #[serde(rename = "cache:stale-fallback")]
    CacheStaleFallback,
}

impl DataSource {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            DataSource::Live => "live",
            DataSource::CacheFresh => "cache:fresh",
            DataSource::CacheStaleFallback => "cache:stale-fallback",
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a snapshot was obtained. Degraded data is still served, but callers
/// should surface `warning` to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataState {
    pub degraded: bool,
    pub warning: Option<String>,
    pub source: DataSource,
}

impl DataState {
    #[must_use]
    pub fn live() -> Self {
        Self {
            degraded: false,
            warning: None,
            source: DataSource::Live,
        }
    }

    #[must_use]
    pub fn fresh_cache() -> Self {
        Self {
            degraded: false,
            warning: None,
            source: DataSource::CacheFresh,
        }
    }

    #[must_use]
    pub fn degraded(source: DataSource, warning: impl Into<String>) -> Self {
        Self {
            degraded: true,
            warning: Some(warning.into()),
            source,
        }
    }
}

// =============================================================================
// CATALOG
// =============================================================================

/// Point-in-time item catalog with name, slot and rarity indexes.
#[derive(Debug, Clone)]
pub struct Catalog {
    items: Vec<Item>,
    by_name: BTreeMap<String, usize>,
    by_slot: BTreeMap<Slot, Vec<usize>>,
    /// Keyed by lowercased rarity.
    by_rarity: BTreeMap<String, Vec<usize>>,
    rarities: BTreeSet<String>,
    set_names: BTreeSet<String>,
    dropped: usize,
    data_state: DataState,
}

impl Catalog {
    /// Index `items`. Later duplicates of a name are dropped and counted.
    #[must_use]
    pub fn from_items(items: Vec<Item>, data_state: DataState) -> Self {
        let mut catalog = Self {
            items: Vec::with_capacity(items.len()),
            by_name: BTreeMap::new(),
            by_slot: BTreeMap::new(),
            by_rarity: BTreeMap::new(),
            rarities: BTreeSet::new(),
            set_names: BTreeSet::new(),
            dropped: 0,
            data_state,
        };

        for item in items {
            if catalog.by_name.contains_key(&item.name) {
                catalog.dropped += 1;
                continue;
            }
            let index = catalog.items.len();
            catalog.by_name.insert(item.name.clone(), index);
            catalog.by_slot.entry(item.slot).or_default().push(index);
            let bucket = catalog
                .by_rarity
                .entry(item.rarity.to_ascii_lowercase())
                .or_default();
            if bucket.is_empty() {
                catalog.rarities.insert(item.rarity.clone());
            }
            bucket.push(index);
            if let Some(set_name) = &item.set_name {
                catalog.set_names.insert(set_name.clone());
            }
            catalog.items.push(item);
        }
        catalog
    }

    /// Normalize a raw payload and index the result.
    pub fn from_payload(bytes: &[u8], data_state: DataState) -> Result<Self, GearError> {
        let normalized = normalize_payload(bytes)?;
        let mut catalog = Self::from_items(normalized.items, data_state);
        catalog.dropped += normalized.dropped;
        Ok(catalog)
    }

    /// The same snapshot under a different data state.
    #[must_use]
    pub fn with_data_state(mut self, data_state: DataState) -> Self {
        self.data_state = data_state;
        self
    }

    /// All items in payload order.
    #[must_use]
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Item> {
        self.by_name.get(name).and_then(|i| self.items.get(*i))
    }

    /// Look up `name`, failing with `UnknownItem`.
    pub fn require(&self, name: &str) -> Result<&Item, GearError> {
        self.get(name)
            .ok_or_else(|| GearError::UnknownItem(name.to_string()))
    }

    /// Items of one slot, in payload order.
    pub fn by_slot(&self, slot: Slot) -> impl Iterator<Item = &Item> + '_ {
        self.indexed(self.by_slot.get(&slot))
    }

    /// Items of one rarity (case-insensitive), in payload order.
    pub fn by_rarity(&self, rarity: &str) -> impl Iterator<Item = &Item> + '_ {
        self.indexed(self.by_rarity.get(&rarity.to_ascii_lowercase()))
    }

    fn indexed<'s>(
        &'s self,
        indexes: Option<&'s Vec<usize>>,
    ) -> impl Iterator<Item = &'s Item> + 's {
        indexes
            .into_iter()
            .flatten()
            .filter_map(|i| self.items.get(*i))
    }

    /// Distinct rarities, compared case-insensitively, spelled as first seen.
    #[must_use]
    pub fn rarities(&self) -> &BTreeSet<String> {
        &self.rarities
    }

    #[must_use]
    pub fn set_names(&self) -> &BTreeSet<String> {
        &self.set_names
    }

    /// Entries skipped during normalization or indexing.
    #[must_use]
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    #[must_use]
    pub fn data_state(&self) -> &DataState {
        &self.data_state
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Per-slot item counts.
    #[must_use]
    pub fn slot_counts(&self) -> BTreeMap<Slot, usize> {
        self.by_slot.iter().map(|(s, v)| (*s, v.len())).collect()
    }
}
