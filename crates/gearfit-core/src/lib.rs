//! # gearfit-core
//!
//! The deterministic build engine for gearfit.
//!
//! This crate decides whether a set of equippable items can be worn under a
//! character's skill-point budget, searches for the build that leaves the
//! most points unspent, and keeps an indexed item catalog with a durable
//! fallback when the live source is unreachable.
//!
//! ## Layout
//!
//! - `types` / `primitives`: skill vectors, items, slots, classes, constants
//! - `budget`: spend, equip-order feasibility, allocation presets
//! - `filter`: per-item eligibility predicates
//! - `solver`: pool preparation and the bounded backtracking search
//! - `recommend`: single-slot ranking and explanations
//! - `cache`: request fingerprints and the LRU response cache
//! - `catalog`, `formats`, `storage`: catalog snapshots and their persistence
//! - `engine`: the long-lived service tying the pieces together
//!
//! ## Architectural Constraints
//!
//! - No async, no network dependencies (pure Rust)
//! - Integer arithmetic only; `BTreeMap`/`BTreeSet` wherever order is observable
//! - I/O only through the `ItemSource` and `SnapshotStore` traits

// =============================================================================
// MODULES
// =============================================================================

pub mod budget;
pub mod cache;
pub mod catalog;
pub mod engine;
pub mod filter;
pub mod formats;
pub mod primitives;
pub mod recommend;
pub mod solver;
pub mod storage;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{CharacterClass, EquipSlot, GearError, Item, Skill, SkillVector, Slot};

// =============================================================================
// RE-EXPORTS: Engine
// =============================================================================

pub use budget::{
    AllocationPreset, BuildStats, EquipPlan, allocation_presets, build_stats, equip_order_feasible,
    equip_plan, minimum_spend, skill_budget_from_level, total_budget,
};
pub use cache::{Fingerprint, ResponseCache};
pub use catalog::{Catalog, CatalogLoader, DataSource, DataState, ItemSource};
pub use engine::{
    BuildRequest, Engine, EngineConfig, ExplainRequest, RecommendRequest, Response, Tagged,
};
pub use filter::{FilterOptions, Rejection, filter_candidates, is_eligible, rejection};
pub use recommend::{Explanation, ItemVerdict, RecommendReport, Recommendation, SortOrder};
pub use solver::{Build, CandidatePools, Loadout, SolveOutcome, SolverLimits, build_pools, solve};

// =============================================================================
// RE-EXPORTS: Persistence
// =============================================================================

pub use formats::{PersistenceHeader, SnapshotRecord, record_from_bytes, record_to_bytes};
pub use storage::{MemorySnapshotStore, RedbSnapshotStore, SnapshotStore};
