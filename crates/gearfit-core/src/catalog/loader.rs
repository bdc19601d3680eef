//! # Catalog Loader
//!
//! Load policy for the item catalog:
//!
//! 1. Unless forced, a durable snapshot younger than the TTL is reused
//!    (`cache:fresh`).
//! 2. Otherwise the item source is fetched. A successful fetch is persisted;
//!    if persisting fails the live data is still served, marked degraded.
//! 3. If the fetch fails (or returns an unusable payload) the last durable
//!    snapshot is served as `cache:stale-fallback`, marked degraded.
//! 4. With no usable snapshot either, the load fails with `DataUnavailable`.

use crate::catalog::{Catalog, DataSource, DataState};
use crate::formats::SnapshotRecord;
use crate::primitives::CATALOG_TTL_MINUTES;
use crate::storage::SnapshotStore;
use crate::GearError;

/// Pluggable "fetch current item data" operation.
pub trait ItemSource: Send + Sync {
    /// Raw payload bytes from the upstream source.
    fn fetch(&self) -> Result<Vec<u8>, GearError>;

    /// Short human-readable description for logs.
    fn describe(&self) -> String {
        "item source".to_string()
    }
}

/// Applies the TTL, persistence and fallback policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogLoader {
    ttl_minutes: u64,
}

impl Default for CatalogLoader {
    fn default() -> Self {
        Self::new(CATALOG_TTL_MINUTES)
    }
}

impl CatalogLoader {
    #[must_use]
    pub fn new(ttl_minutes: u64) -> Self {
        Self { ttl_minutes }
    }

    #[must_use]
    pub fn ttl_minutes(&self) -> u64 {
        self.ttl_minutes
    }

    fn is_fresh(&self, record: &SnapshotRecord, now_ms: u64) -> bool {
        let age_ms = now_ms.saturating_sub(record.saved_at_ms);
        age_ms < self.ttl_minutes.saturating_mul(60_000)
    }

    /// Produce a catalog snapshot at wall-clock time `now_ms`.
    pub fn load(
        &self,
        force: bool,
        source: &dyn ItemSource,
        store: &dyn SnapshotStore,
        now_ms: u64,
    ) -> Result<Catalog, GearError> {
        let stored = match store.read() {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(error = %e, "Durable catalog snapshot unreadable; ignoring it");
                None
            }
        };

        if !force {
            if let Some(record) = stored.as_ref().filter(|r| self.is_fresh(r, now_ms)) {
                match Catalog::from_payload(&record.payload, DataState::fresh_cache()) {
                    Ok(catalog) => {
                        tracing::info!(
                            items = catalog.len(),
                            age_minutes = record.age_minutes(now_ms),
                            "Catalog loaded from fresh snapshot"
                        );
                        return Ok(catalog);
                    }
                    Err(e) => {
                        tracing::warn!(
                            error = %e,
                            "Fresh snapshot could not be parsed; fetching live"
                        );
                    }
                }
            }
        }

        let failure = match self.fetch_live(source, store, now_ms) {
            Ok(catalog) => return Ok(catalog),
            Err(e) => e,
        };

        let Some(record) = stored else {
            tracing::error!(
                error = %failure,
                "Catalog unavailable: live fetch failed and no snapshot exists"
            );
            return Err(GearError::DataUnavailable(format!(
                "live fetch failed ({}) and no durable snapshot exists",
                failure
            )));
        };

        let age = record.age_minutes(now_ms);
        let warning = format!(
            "live item data unavailable ({}); serving cached data {} minutes old",
            failure, age
        );
        match Catalog::from_payload(
            &record.payload,
            DataState::degraded(DataSource::CacheStaleFallback, warning),
        ) {
            Ok(catalog) => {
                tracing::warn!(
                    error = %failure,
                    age_minutes = age,
                    items = catalog.len(),
                    "Serving stale catalog snapshot"
                );
                Ok(catalog)
            }
            Err(e) => {
                tracing::error!(fetch_error = %failure, snapshot_error = %e, "Catalog unavailable");
                Err(GearError::DataUnavailable(format!(
                    "live fetch failed ({}) and the durable snapshot is unusable ({})",
                    failure, e
                )))
            }
        }
    }

    fn fetch_live(
        &self,
        source: &dyn ItemSource,
        store: &dyn SnapshotStore,
        now_ms: u64,
    ) -> Result<Catalog, GearError> {
        tracing::info!(source = %source.describe(), "Fetching live item data");
        let payload = source.fetch()?;
        let mut catalog = Catalog::from_payload(&payload, DataState::live())?;

        let record = SnapshotRecord::new(now_ms, payload);
        if let Err(e) = store.write(&record) {
            tracing::warn!(error = %e, "Catalog snapshot write failed; serving live data");
            catalog = catalog.with_data_state(DataState::degraded(
                DataSource::Live,
                format!("item data could not be cached: {}", e),
            ));
        }

        tracing::info!(items = catalog.len(), dropped = catalog.dropped(), "Catalog loaded live");
        Ok(catalog)
    }
}
