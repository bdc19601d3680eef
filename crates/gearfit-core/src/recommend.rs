//! # Recommendations and Explanations
//!
//! Single-slot upgrade ranking and per-item diagnostics on top of the
//! filter and budget engine.

use crate::budget::{BuildStats, build_stats};
use crate::filter::{FilterOptions, Rejection, rejection};
use crate::primitives::PER_SKILL_CAP;
use crate::solver::Loadout;
use crate::{EquipSlot, GearError, Item};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::fmt;
use std::str::FromStr;

// =============================================================================
// SORT ORDER
// =============================================================================

/// How recommendation lists are ordered. Name breaks every tie.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Most remaining skill points first.
    #[default]
    RemainingSp,
    /// Highest level requirement first.
    Level,
    Name,
}

impl SortOrder {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            SortOrder::RemainingSp => "remaining_sp",
            SortOrder::Level => "level",
            SortOrder::Name => "name",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SortOrder {
    type Err = GearError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "remaining_sp" | "sp" => Ok(SortOrder::RemainingSp),
            "level" => Ok(SortOrder::Level),
            "name" => Ok(SortOrder::Name),
            other => Err(GearError::InvalidRequest(format!("unknown sort order '{}'", other))),
        }
    }
}

// =============================================================================
// RECOMMEND
// =============================================================================

/// One ranked candidate for the target slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub item: Item,
    pub stats: BuildStats,
    /// `stats.remaining_sp - baseline.remaining_sp`.
    pub improvement: i32,
}

/// Ranked candidates plus the baseline they are measured against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendReport {
    pub slot: EquipSlot,
    /// Stats of the current selections with the target slot emptied.
    pub baseline: BuildStats,
    pub candidates: Vec<Recommendation>,
    /// Eligible candidates before the limit was applied.
    pub considered: usize,
}

/// Rank every eligible item for `slot` given the other current selections.
///
/// Whatever currently occupies `slot` is set aside. Candidates that leave the
/// build over budget or without a feasible equip order are dropped, as are
/// ones already worn elsewhere. `limit` of `None` keeps every survivor.
pub fn recommend<'a, I>(
    items: I,
    options: &FilterOptions,
    selections: &Loadout,
    slot: EquipSlot,
    sort: SortOrder,
    limit: Option<usize>,
) -> RecommendReport
where
    I: IntoIterator<Item = &'a Item>,
{
    let budget = options.budget();
    let mut others = selections.clone();
    others.slots.remove(&slot);
    let base_items = others.items();
    let baseline = build_stats(&base_items, budget, PER_SKILL_CAP);
    let worn = others.names();

    let mut candidates: Vec<Recommendation> = items
        .into_iter()
        .filter(|item| item.slot == slot.item_slot())
        .filter(|item| !worn.contains(item.name.as_str()))
        .filter(|item| rejection(item, options).is_none())
        .filter_map(|item| {
            let mut set = base_items.clone();
            set.push(item);
            let stats = build_stats(&set, budget, PER_SKILL_CAP);
            if stats.remaining_sp < 0 || !stats.equip_order_ok {
                return None;
            }
            if options.no_negative_net_bonus && stats.net_effective_bonus.has_negative() {
                return None;
            }
            let improvement = stats.remaining_sp.saturating_sub(baseline.remaining_sp);
            if options.min_improvement.is_some_and(|min| improvement < min) {
                return None;
            }
            Some(Recommendation {
                item: item.clone(),
                stats,
                improvement,
            })
        })
        .collect();

    match sort {
        SortOrder::RemainingSp => candidates.sort_by(|a, b| {
            (Reverse(a.stats.remaining_sp), &a.item.name)
                .cmp(&(Reverse(b.stats.remaining_sp), &b.item.name))
        }),
        SortOrder::Level => candidates.sort_by(|a, b| {
            (Reverse(a.item.level_req), &a.item.name)
                .cmp(&(Reverse(b.item.level_req), &b.item.name))
        }),
        SortOrder::Name => candidates.sort_by(|a, b| a.item.name.cmp(&b.item.name)),
    }

    let considered = candidates.len();
    if let Some(limit) = limit {
        candidates.truncate(limit);
    }

    tracing::debug!(slot = %slot, considered, kept = candidates.len(), "Recommendations ranked");

    RecommendReport {
        slot,
        baseline,
        candidates,
        considered,
    }
}

// =============================================================================
// EXPLAIN
// =============================================================================

/// Filter verdict for one named item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemVerdict {
    pub name: String,
    pub slot: crate::Slot,
    pub eligible: bool,
    pub rejection: Option<Rejection>,
}

/// Per-item verdicts plus the stats of the whole named set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Explanation {
    pub verdicts: Vec<ItemVerdict>,
    pub stats: BuildStats,
}

/// Explain why each of `items` would or would not be considered.
#[must_use]
pub fn explain(items: &[&Item], options: &FilterOptions) -> Explanation {
    let verdicts = items
        .iter()
        .map(|item| {
            let rejection = rejection(item, options);
            ItemVerdict {
                name: item.name.clone(),
                slot: item.slot,
                eligible: rejection.is_none(),
                rejection,
            }
        })
        .collect();

    Explanation {
        verdicts,
        stats: build_stats(items, options.budget(), PER_SKILL_CAP),
    }
}
