//! # Engine Service
//!
//! The long-lived object a process constructs once and shares with every
//! request path. It owns the item source, the durable snapshot store, the
//! current catalog snapshot and the response cache.
//!
//! ## Concurrency
//!
//! The catalog lives behind `RwLock<Arc<..>>`. A request clones the `Arc`
//! once and works against that snapshot to completion; a reload builds the
//! new snapshot outside the lock and swaps the pointer. Each swap bumps a
//! generation number that is folded into every cache key, so a request that
//! started before a reload can never publish a stale entry after the clear.

use crate::budget::{BuildStats, build_stats};
use crate::cache::{Fingerprint, ResponseCache};
use crate::catalog::{Catalog, CatalogLoader, DataState, ItemSource};
use crate::filter::FilterOptions;
use crate::primitives::{CATALOG_TTL_MINUTES, PER_SKILL_CAP, RESPONSE_CACHE_CAPACITY};
use crate::recommend::{Explanation, RecommendReport, SortOrder, explain, recommend};
use crate::solver::{Loadout, SolveOutcome, SolverLimits, build_pools, solve};
use crate::storage::SnapshotStore;
use crate::{EquipSlot, GearError, Item};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{SystemTime, UNIX_EPOCH};

// =============================================================================
// REQUESTS
// =============================================================================

/// Selected items by position plus tomes, named by catalog name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildRequest {
    pub options: FilterOptions,
    pub selections: BTreeMap<EquipSlot, String>,
    pub tomes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendRequest {
    pub build: BuildRequest,
    pub slot: EquipSlot,
    #[serde(default)]
    pub sort: SortOrder,
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplainRequest {
    pub options: FilterOptions,
    pub names: Vec<String>,
}

// =============================================================================
// RESPONSES
// =============================================================================

/// Everything the cache can hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "result", rename_all = "snake_case")]
pub enum Response {
    Check(BuildStats),
    Explain(Explanation),
    Recommend(RecommendReport),
    Solve(SolveOutcome),
}

/// A result tagged with the data state of the catalog it was computed from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tagged<T> {
    pub data_state: DataState,
    /// True when served from the response cache.
    pub cached: bool,
    pub result: T,
}

#[derive(Serialize)]
struct CacheKey<'r, T> {
    op: &'static str,
    generation: u64,
    limits: &'r SolverLimits,
    request: &'r T,
}

// =============================================================================
// CONFIGURATION
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    pub ttl_minutes: u64,
    pub cache_capacity: usize,
    pub limits: SolverLimits,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ttl_minutes: CATALOG_TTL_MINUTES,
            cache_capacity: RESPONSE_CACHE_CAPACITY,
            limits: SolverLimits::default(),
        }
    }
}

// =============================================================================
// ENGINE
// =============================================================================

struct Loaded {
    generation: u64,
    catalog: Option<Arc<Catalog>>,
}

pub struct Engine {
    source: Box<dyn ItemSource>,
    store: Box<dyn SnapshotStore>,
    loader: CatalogLoader,
    limits: SolverLimits,
    current: RwLock<Loaded>,
    cache: ResponseCache<Response>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("source", &self.source.describe())
            .field("limits", &self.limits)
            .field("cache_entries", &self.cache.len())
            .finish_non_exhaustive()
    }
}

/// Milliseconds since the Unix epoch (zero if the clock is before it).
#[must_use]
pub fn unix_now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

impl Engine {
    /// Create an engine with no catalog loaded yet.
    #[must_use]
    pub fn new(
        source: Box<dyn ItemSource>,
        store: Box<dyn SnapshotStore>,
        config: EngineConfig,
    ) -> Self {
        Self {
            source,
            store,
            loader: CatalogLoader::new(config.ttl_minutes),
            limits: config.limits,
            current: RwLock::new(Loaded {
                generation: 0,
                catalog: None,
            }),
            cache: ResponseCache::new(config.cache_capacity),
        }
    }

    #[must_use]
    pub fn limits(&self) -> &SolverLimits {
        &self.limits
    }

    #[must_use]
    pub fn cache(&self) -> &ResponseCache<Response> {
        &self.cache
    }

    fn read(&self) -> RwLockReadGuard<'_, Loaded> {
        match self.current.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, Loaded> {
        match self.current.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Load a catalog, swap it in, then clear the response cache.
    pub fn reload(&self, force: bool) -> Result<Arc<Catalog>, GearError> {
        self.reload_at(force, unix_now_ms())
    }

    /// [`Engine::reload`] at an explicit wall-clock time.
    pub fn reload_at(&self, force: bool, now_ms: u64) -> Result<Arc<Catalog>, GearError> {
        let catalog = Arc::new(self.loader.load(
            force,
            self.source.as_ref(),
            self.store.as_ref(),
            now_ms,
        )?);
        {
            let mut current = self.write();
            current.generation += 1;
            current.catalog = Some(Arc::clone(&catalog));
        }
        self.cache.clear();
        tracing::info!(
            items = catalog.len(),
            source = %catalog.data_state().source,
            degraded = catalog.data_state().degraded,
            "Catalog swapped in; response cache cleared"
        );
        Ok(catalog)
    }

    /// The current snapshot.
    pub fn catalog(&self) -> Result<Arc<Catalog>, GearError> {
        self.snapshot().map(|(_, catalog)| catalog)
    }

    fn snapshot(&self) -> Result<(u64, Arc<Catalog>), GearError> {
        let current = self.read();
        current
            .catalog
            .as_ref()
            .map(|c| (current.generation, Arc::clone(c)))
            .ok_or_else(|| GearError::DataUnavailable("catalog not loaded".to_string()))
    }

    /// Consult the cache for `request`, computing and storing on a miss.
    fn cached<R, T>(
        &self,
        op: &'static str,
        request: &R,
        extract: fn(Response) -> Option<T>,
        wrap: fn(T) -> Response,
        compute: impl FnOnce(&Catalog) -> Result<T, GearError>,
    ) -> Result<Tagged<T>, GearError>
    where
        R: Serialize,
        T: Clone,
    {
        let (generation, catalog) = self.snapshot()?;
        let key = Fingerprint::of(&CacheKey {
            op,
            generation,
            limits: &self.limits,
            request,
        })?;
        let data_state = catalog.data_state().clone();

        if let Some(result) = self.cache.get(&key).and_then(extract) {
            tracing::debug!(op, key = %key, "Response cache hit");
            return Ok(Tagged {
                data_state,
                cached: true,
                result,
            });
        }

        let result = compute(catalog.as_ref())?;
        self.cache.set(key, wrap(result.clone()));
        Ok(Tagged {
            data_state,
            cached: false,
            result,
        })
    }

    /// Stats for the selected items as they stand.
    pub fn check(&self, request: &BuildRequest) -> Result<Tagged<BuildStats>, GearError> {
        self.cached(
            "check",
            request,
            |r| match r {
                Response::Check(v) => Some(v),
                _ => None,
            },
            Response::Check,
            |catalog| {
                let loadout = resolve(catalog, request)?;
                Ok(build_stats(&loadout.items(), request.options.budget(), PER_SKILL_CAP))
            },
        )
    }

    /// Filter verdicts for named items plus stats for the named set.
    pub fn explain(&self, request: &ExplainRequest) -> Result<Tagged<Explanation>, GearError> {
        self.cached(
            "explain",
            request,
            |r| match r {
                Response::Explain(v) => Some(v),
                _ => None,
            },
            Response::Explain,
            |catalog| {
                let items = request
                    .names
                    .iter()
                    .map(|name| catalog.require(name))
                    .collect::<Result<Vec<&Item>, GearError>>()?;
                Ok(explain(&items, &request.options))
            },
        )
    }

    /// Ranked candidates for one slot.
    pub fn recommend(
        &self,
        request: &RecommendRequest,
    ) -> Result<Tagged<RecommendReport>, GearError> {
        self.cached(
            "recommend",
            request,
            |r| match r {
                Response::Recommend(v) => Some(v),
                _ => None,
            },
            Response::Recommend,
            |catalog| {
                let selections = resolve(catalog, &request.build)?;
                Ok(recommend(
                    catalog.items(),
                    &request.build.options,
                    &selections,
                    request.slot,
                    request.sort,
                    request.limit,
                ))
            },
        )
    }

    /// Best build filling every slot the request leaves open.
    pub fn solve(&self, request: &BuildRequest) -> Result<Tagged<SolveOutcome>, GearError> {
        let limits = self.limits;
        self.cached(
            "solve",
            request,
            |r| match r {
                Response::Solve(v) => Some(v),
                _ => None,
            },
            Response::Solve,
            |catalog| {
                let locked = resolve(catalog, request)?;
                let pools = build_pools(catalog.items(), &request.options, &locked, &limits);
                tracing::debug!(pools = ?pools.sizes(), "Candidate pools prepared");
                Ok(solve(&request.options, &locked, &pools, limits.node_budget))
            },
        )
    }
}

/// Resolve selection names against `catalog` into a placed loadout.
pub fn resolve(catalog: &Catalog, request: &BuildRequest) -> Result<Loadout, GearError> {
    let mut loadout = Loadout::new();
    for (slot, name) in &request.selections {
        let item = catalog.require(name)?;
        loadout.insert(*slot, item.clone())?;
    }
    if let (Some(a), Some(b)) = (
        loadout.slots.get(&EquipSlot::Ring1),
        loadout.slots.get(&EquipSlot::Ring2),
    ) {
        if a.name == b.name {
            return Err(GearError::InvalidRequest(format!(
                "'{}' cannot fill both ring slots",
                a.name
            )));
        }
    }
    for name in &request.tomes {
        loadout.add_tome(catalog.require(name)?.clone())?;
    }
    Ok(loadout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::SnapshotRecord;
    use crate::storage::MemorySnapshotStore;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const PAYLOAD: &[u8] = br#"[
        {"name": "Cap", "type": "helmet", "requirements": {"strength": 10}},
        {"name": "Band", "type": "ring", "identifications": {"rawStrength": 4}},
        {"name": "Loop", "type": "ring"}
    ]"#;

    struct Counting {
        calls: Arc<AtomicUsize>,
    }

    impl ItemSource for Counting {
        fn fetch(&self) -> Result<Vec<u8>, GearError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(PAYLOAD.to_vec())
        }
    }

    fn engine() -> (Engine, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let engine = Engine::new(
            Box::new(Counting {
                calls: Arc::clone(&calls),
            }),
            Box::new(MemorySnapshotStore::new()),
            EngineConfig::default(),
        );
        (engine, calls)
    }

    #[test]
    fn requests_before_load_are_unavailable() {
        let (engine, _) = engine();
        assert!(matches!(
            engine.check(&BuildRequest::default()),
            Err(GearError::DataUnavailable(_))
        ));
    }

    #[test]
    fn second_identical_request_hits_cache() {
        let (engine, _) = engine();
        engine.reload(true).expect("reload");
        let mut request = BuildRequest::default();
        request.selections.insert(EquipSlot::Helmet, "Cap".to_string());

        let first = engine.check(&request).expect("check");
        let second = engine.check(&request).expect("check");
        assert!(!first.cached);
        assert!(second.cached);
        assert_eq!(first.result, second.result);
        assert_eq!(first.result.final_spend, 10);
    }

    #[test]
    fn reload_clears_cache() {
        let (engine, calls) = engine();
        engine.reload(true).expect("reload");
        engine.check(&BuildRequest::default()).expect("check");
        assert_eq!(engine.cache().len(), 1);

        engine.reload(true).expect("reload");
        assert!(engine.cache().is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(!engine.check(&BuildRequest::default()).expect("check").cached);
    }

    #[test]
    fn unknown_selection_is_an_error() {
        let (engine, _) = engine();
        engine.reload(true).expect("reload");
        let mut request = BuildRequest::default();
        request.selections.insert(EquipSlot::Helmet, "Nope".to_string());
        assert!(matches!(engine.check(&request), Err(GearError::UnknownItem(_))));
    }

    #[test]
    fn solve_fills_open_slots() {
        let (engine, _) = engine();
        engine.reload(true).expect("reload");
        let outcome = engine.solve(&BuildRequest::default()).expect("solve").result;
        let best = outcome.best.expect("build");
        assert_eq!(best.slots.len(), 3);
        assert_eq!(best.stats.final_spend, 6);
    }

    #[test]
    fn fresh_snapshot_avoids_fetch() {
        let calls = Arc::new(AtomicUsize::new(0));
        let record = SnapshotRecord::new(unix_now_ms(), PAYLOAD.to_vec());
        let store = MemorySnapshotStore::with_record(&record).expect("seed");
        let engine = Engine::new(
            Box::new(Counting {
                calls: Arc::clone(&calls),
            }),
            Box::new(store),
            EngineConfig::default(),
        );
        let catalog = engine.reload(false).expect("reload");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(catalog.len(), 3);
    }

    #[test]
    fn duplicate_ring_rejected() {
        let (engine, _) = engine();
        let catalog = engine.reload(true).expect("reload");
        let mut request = BuildRequest::default();
        request.selections.insert(EquipSlot::Ring1, "Band".to_string());
        request.selections.insert(EquipSlot::Ring2, "Band".to_string());
        assert!(matches!(
            resolve(&catalog, &request),
            Err(GearError::InvalidRequest(_))
        ));
    }
}
