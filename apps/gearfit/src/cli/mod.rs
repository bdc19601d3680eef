//! # gearfit CLI Module
//!
//! This module implements the CLI interface for gearfit.
//!
//! ## Available Commands
//!
//! - `catalog` - Load (or reload) the item catalog and summarize it
//! - `check` - Stats for a set of selected items
//! - `explain` - Why named items are or are not eligible
//! - `recommend` - Rank candidates for one slot
//! - `solve` - Search for the best build filling every open slot

mod commands;

use crate::config::Config;
use crate::source;
use clap::{Args, Parser, Subcommand};
use gearfit_core::storage::RedbSnapshotStore;
use gearfit_core::{
    BuildRequest, CharacterClass, Engine, EquipSlot, ExplainRequest, FilterOptions, GearError,
    RecommendRequest, Skill, SortOrder,
};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// gearfit - skill-point aware gear build finder
///
/// Checks, explains and searches equipment builds under a character's
/// skill-point budget, respecting the order items must be put on.
#[derive(Parser, Debug)]
#[command(name = "gearfit")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to a toml config file (default: gearfit.toml if present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the durable catalog snapshot
    #[arg(long, global = true)]
    pub snapshot: Option<PathBuf>,

    /// URL serving the raw item payload
    #[arg(long, global = true, conflicts_with = "source_file")]
    pub source_url: Option<String>,

    /// Local file holding the raw item payload
    #[arg(long, global = true)]
    pub source_file: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load the item catalog and show a summary
    Catalog {
        /// Fetch live data even if the stored snapshot is fresh
        #[arg(short, long)]
        force: bool,
    },

    /// Show budget, spend and equip order for selected items
    Check {
        #[command(flatten)]
        build: BuildArgs,
    },

    /// Explain whether named items pass the filters
    Explain {
        /// Item names
        #[arg(required = true)]
        names: Vec<String>,

        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Rank candidates for one slot given the other selections
    Recommend {
        /// Target slot (helmet, chestplate, leggings, boots, ring1, ring2,
        /// bracelet, necklace, weapon)
        #[arg(short, long)]
        slot: EquipSlot,

        /// Sort order (remaining_sp, level, name)
        #[arg(long, default_value = "remaining_sp")]
        sort: SortOrder,

        /// Maximum candidates to list
        #[arg(short, long)]
        limit: Option<usize>,

        #[command(flatten)]
        build: BuildArgs,
    },

    /// Find the best build for every slot not given with --item
    Solve {
        #[command(flatten)]
        build: BuildArgs,
    },
}

/// Character context and filter toggles shared by every command.
#[derive(Args, Debug, Clone)]
pub struct FilterArgs {
    /// Character level
    #[arg(long, default_value_t = gearfit_core::primitives::MAX_BUDGET_LEVEL)]
    pub level: u32,

    /// Character class (warrior, mage, archer, assassin, shaman)
    #[arg(long)]
    pub class: Option<CharacterClass>,

    /// Skill points on top of the level budget
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    pub extra_points: i32,

    /// Skip items below this level requirement
    #[arg(long)]
    pub min_item_level: Option<u32>,

    /// Allowed rarities (repeatable or comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub rarity: Vec<String>,

    /// Exclude mythic items
    #[arg(long)]
    pub no_mythic: bool,

    /// Exclude crafted or unidentified items
    #[arg(long)]
    pub no_crafted: bool,

    /// Exclude items with any negative skill bonus
    #[arg(long)]
    pub no_negative_item_bonus: bool,

    /// Reject builds whose summed bonus is negative in any skill
    #[arg(long)]
    pub no_negative_net_bonus: bool,

    /// Only consider items that grant this skill
    #[arg(long)]
    pub must_give: Option<Skill>,

    /// Minimum remaining-SP gain for recommendations
    #[arg(long, allow_hyphen_values = true)]
    pub min_improvement: Option<i32>,

    /// Weapons must match the class weapon type
    #[arg(long)]
    pub strict_weapon_class: bool,
}

impl FilterArgs {
    #[must_use]
    pub fn to_options(&self) -> FilterOptions {
        let allowed_rarities = (!self.rarity.is_empty()).then(|| {
            self.rarity
                .iter()
                .map(|r| r.trim().to_string())
                .filter(|r| !r.is_empty())
                .collect::<BTreeSet<String>>()
        });
        FilterOptions {
            level: self.level,
            class: self.class,
            extra_points: self.extra_points,
            min_item_level: self.min_item_level,
            allowed_rarities,
            no_mythic: self.no_mythic,
            no_crafted: self.no_crafted,
            no_negative_item_bonus: self.no_negative_item_bonus,
            no_negative_net_bonus: self.no_negative_net_bonus,
            must_give: self.must_give,
            min_improvement: self.min_improvement,
            strict_weapon_class: self.strict_weapon_class,
        }
    }
}

/// Filters plus current selections.
#[derive(Args, Debug, Clone)]
pub struct BuildArgs {
    #[command(flatten)]
    pub filters: FilterArgs,

    /// Selected item as SLOT=NAME (repeatable)
    #[arg(short, long = "item", value_parser = parse_selection)]
    pub items: Vec<(EquipSlot, String)>,

    /// Tome name (repeatable)
    #[arg(long = "tome")]
    pub tomes: Vec<String>,
}

impl BuildArgs {
    pub fn to_request(&self) -> Result<BuildRequest, GearError> {
        let mut selections = BTreeMap::new();
        for (slot, name) in &self.items {
            if selections.insert(*slot, name.clone()).is_some() {
                return Err(GearError::InvalidRequest(format!(
                    "slot {} selected more than once",
                    slot
                )));
            }
        }
        Ok(BuildRequest {
            options: self.filters.to_options(),
            selections,
            tomes: self.tomes.clone(),
        })
    }
}

/// Parse `SLOT=NAME`.
pub fn parse_selection(raw: &str) -> Result<(EquipSlot, String), GearError> {
    let (slot, name) = raw
        .split_once('=')
        .ok_or_else(|| GearError::InvalidRequest(format!("expected SLOT=NAME, got '{}'", raw)))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(GearError::InvalidRequest(format!("empty item name in '{}'", raw)));
    }
    Ok((slot.parse()?, name.to_string()))
}

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Resolve configuration: file, then environment, then CLI flags.
pub fn resolve_config(cli: &Cli) -> Result<Config, GearError> {
    let mut config = Config::load(cli.config.as_deref())?;
    config.apply_process_env()?;
    if let Some(url) = &cli.source_url {
        config.set_source_url(url.clone());
    }
    if let Some(file) = &cli.source_file {
        config.set_source_file(file.clone());
    }
    if let Some(path) = &cli.snapshot {
        config.catalog.snapshot_path = path.clone();
    }
    Ok(config)
}

/// Construct the engine described by `config`. Blocking.
pub fn build_engine(config: &Config) -> Result<Engine, GearError> {
    let source = source::from_config(config)?;
    let store = RedbSnapshotStore::open(&config.catalog.snapshot_path)?;
    Ok(Engine::new(source, Box::new(store), config.engine_config()))
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
///
/// Engine work is blocking (file, redb and HTTP I/O plus CPU-bound search),
/// so it runs on the blocking pool. Ctrl+C abandons the command.
pub async fn execute(cli: Cli) -> Result<(), GearError> {
    let config = resolve_config(&cli)?;
    let json_mode = cli.json_mode;
    let command = cli.command;

    let work = tokio::task::spawn_blocking(move || {
        let engine = build_engine(&config)?;
        run(&engine, command, json_mode)
    });

    tokio::select! {
        joined = work => joined.map_err(|e| GearError::Io(format!("command task failed: {}", e)))?,
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("Interrupted");
            Err(GearError::Io("interrupted".to_string()))
        }
    }
}

/// Dispatch one command against `engine`.
pub fn run(engine: &Engine, command: Option<Commands>, json_mode: bool) -> Result<(), GearError> {
    match command {
        Some(Commands::Catalog { force }) => cmd_catalog(engine, json_mode, force),
        Some(Commands::Check { build }) => cmd_check(engine, json_mode, &build.to_request()?),
        Some(Commands::Explain { names, filters }) => {
            let request = ExplainRequest {
                options: filters.to_options(),
                names,
            };
            cmd_explain(engine, json_mode, &request)
        }
        Some(Commands::Recommend {
            slot,
            sort,
            limit,
            build,
        }) => {
            let request = RecommendRequest {
                build: build.to_request()?,
                slot,
                sort,
                limit,
            };
            cmd_recommend(engine, json_mode, &request)
        }
        Some(Commands::Solve { build }) => cmd_solve(engine, json_mode, &build.to_request()?),
        None => {
            // No subcommand - show the catalog summary by default
            cmd_catalog(engine, json_mode, false)
        }
    }
}
