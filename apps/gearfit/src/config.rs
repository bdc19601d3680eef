//! # Configuration
//!
//! Layered settings: built-in defaults, then a toml file, then `GEARFIT_*`
//! environment variables, then CLI flags (applied by the caller).
//!
//! ```toml
//! [catalog]
//! source_url = "https://example.invalid/items.json"
//! snapshot_path = "gearfit-snapshot.redb"
//! ttl_minutes = 55
//!
//! [cache]
//! capacity = 250
//!
//! [solver]
//! node_budget = 250000
//! pool_cap = 80
//! ring_pool_cap = 140
//! ```

use gearfit_core::primitives::{
    CATALOG_TTL_MINUTES, DEFAULT_NODE_BUDGET, DEFAULT_POOL_CAP, DEFAULT_RING_POOL_CAP,
    RESPONSE_CACHE_CAPACITY,
};
use gearfit_core::{EngineConfig, GearError, SolverLimits};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Config file read when `--config` is not given, if it exists.
pub const DEFAULT_CONFIG_FILE: &str = "gearfit.toml";

/// Default location of the durable catalog snapshot.
pub const DEFAULT_SNAPSHOT_PATH: &str = "gearfit-snapshot.redb";

pub const ENV_SOURCE_URL: &str = "GEARFIT_SOURCE_URL";
pub const ENV_SOURCE_FILE: &str = "GEARFIT_SOURCE_FILE";
pub const ENV_SNAPSHOT: &str = "GEARFIT_SNAPSHOT";
pub const ENV_CACHE_CAPACITY: &str = "GEARFIT_CACHE_CAPACITY";
pub const ENV_NODE_BUDGET: &str = "GEARFIT_NODE_BUDGET";

// =============================================================================
// SECTIONS
// =============================================================================

/// `[catalog]`: where item data comes from and where it is persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// HTTP(S) endpoint serving the raw item payload (default none).
    pub source_url: Option<String>,
    /// Local file holding the raw item payload (default none). Takes
    /// precedence over `source_url` when both are set in the same layer.
    pub source_file: Option<PathBuf>,
    /// redb file for the durable snapshot (default `gearfit-snapshot.redb`).
    pub snapshot_path: PathBuf,
    /// Minutes a durable snapshot is reused without a live fetch (default 55).
    pub ttl_minutes: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            source_url: None,
            source_file: None,
            snapshot_path: PathBuf::from(DEFAULT_SNAPSHOT_PATH),
            ttl_minutes: CATALOG_TTL_MINUTES,
        }
    }
}

/// `[cache]`: response cache sizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum cached responses (default 250).
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: RESPONSE_CACHE_CAPACITY,
        }
    }
}

/// `[solver]`: search limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Search nodes per solve (default 250000).
    pub node_budget: u64,
    /// Candidates kept per slot (default 80).
    pub pool_cap: usize,
    /// Candidates kept for rings (default 140).
    pub ring_pool_cap: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            node_budget: DEFAULT_NODE_BUDGET,
            pool_cap: DEFAULT_POOL_CAP,
            ring_pool_cap: DEFAULT_RING_POOL_CAP,
        }
    }
}

// =============================================================================
// CONFIG
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub catalog: CatalogConfig,
    pub cache: CacheConfig,
    pub solver: SolverConfig,
}

impl Config {
    /// Parse a toml document. Missing keys keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, GearError> {
        toml::from_str(text).map_err(|e| GearError::Serialization(format!("Invalid config: {}", e)))
    }

    /// Read `path`, or `gearfit.toml` if it exists when no path is given.
    ///
    /// An explicitly named file must exist; the implicit one is optional.
    pub fn load(path: Option<&Path>) -> Result<Self, GearError> {
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };
        if !required && !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(&path).map_err(|e| {
            GearError::Io(format!("Cannot read config '{}': {}", path.display(), e))
        })?;
        tracing::debug!(path = %path.display(), "Config file loaded");
        Self::from_toml_str(&text)
    }

    /// Apply `GEARFIT_*` overrides looked up through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), GearError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_SOURCE_URL) {
            self.set_source_url(url);
        }
        if let Some(file) = lookup(ENV_SOURCE_FILE) {
            self.set_source_file(PathBuf::from(file));
        }
        if let Some(path) = lookup(ENV_SNAPSHOT) {
            self.catalog.snapshot_path = PathBuf::from(path);
        }
        if let Some(raw) = lookup(ENV_CACHE_CAPACITY) {
            self.cache.capacity = parse_env(ENV_CACHE_CAPACITY, &raw)?;
        }
        if let Some(raw) = lookup(ENV_NODE_BUDGET) {
            self.solver.node_budget = parse_env(ENV_NODE_BUDGET, &raw)?;
        }
        Ok(())
    }

    /// Apply overrides from the process environment.
    pub fn apply_process_env(&mut self) -> Result<(), GearError> {
        self.apply_env(|key| std::env::var(key).ok())
    }

    /// Use `url` as the item source, replacing any file source.
    pub fn set_source_url(&mut self, url: String) {
        self.catalog.source_url = Some(url);
        self.catalog.source_file = None;
    }

    /// Use `path` as the item source, replacing any URL source.
    pub fn set_source_file(&mut self, path: PathBuf) {
        self.catalog.source_file = Some(path);
        self.catalog.source_url = None;
    }

    #[must_use]
    pub fn limits(&self) -> SolverLimits {
        SolverLimits {
            node_budget: self.solver.node_budget,
            pool_cap: self.solver.pool_cap,
            ring_pool_cap: self.solver.ring_pool_cap,
        }
    }

    #[must_use]
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            ttl_minutes: self.catalog.ttl_minutes,
            cache_capacity: self.cache.capacity,
            limits: self.limits(),
        }
    }
}

fn parse_env<T: FromStr>(key: &str, raw: &str) -> Result<T, GearError> {
    raw.trim()
        .parse()
        .map_err(|_| {
            GearError::InvalidRequest(format!(
                "{} must be a non-negative integer, got '{}'",
                key, raw
            ))
        })
}
