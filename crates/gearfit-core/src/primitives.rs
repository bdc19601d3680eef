//! # Engine Primitives
//!
//! Fixed constants for the gearfit engine.
//!
//! These values are compiled into the binary. Runtime configuration may
//! override the pool caps and node budget per request, but never the
//! arithmetic constants (skill arity, per-skill cap, level saturation).

/// Number of skills in a skill vector. The arity never varies.
pub const SKILL_COUNT: usize = 5;

/// Maximum points that may be allocated into a single skill.
pub const PER_SKILL_CAP: i32 = 100;

/// Level at which the skill-point budget stops growing.
pub const MAX_BUDGET_LEVEL: u32 = 101;

/// Skill points granted per level above 1.
pub const POINTS_PER_LEVEL: i32 = 2;

/// Magic bytes for the durable catalog snapshot header.
pub const MAGIC_BYTES: &[u8; 4] = b"GFIT";

/// Current snapshot format version.
///
/// Increment this when making breaking changes to the snapshot record.
pub const FORMAT_VERSION: u8 = 1;

/// Age after which a durable snapshot is no longer reused without a live fetch.
pub const CATALOG_TTL_MINUTES: u64 = 55;

/// Default capacity of the response cache.
pub const RESPONSE_CACHE_CAPACITY: usize = 250;

/// Default per-slot candidate pool cap.
pub const DEFAULT_POOL_CAP: usize = 80;

/// Default ring pool cap. Rings need a larger pool since two are chosen.
pub const DEFAULT_RING_POOL_CAP: usize = 140;

/// Default number of search nodes the solver may visit.
pub const DEFAULT_NODE_BUDGET: u64 = 250_000;

/// Largest item set the equip-order subset search accepts (2^20 states).
pub const MAX_EQUIP_ORDER_ITEMS: usize = 20;

/// Nesting depth past which fingerprint canonicalization stops descending.
pub const MAX_FINGERPRINT_DEPTH: usize = 64;
