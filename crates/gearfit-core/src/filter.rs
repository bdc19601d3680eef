//! # Candidate Filter
//!
//! Decides whether an item is eligible for a request, independent of the
//! other items in the build.
//!
//! Predicates run in a fixed order, cheapest and most discriminating first.
//! The first failing predicate is reported as the [`Rejection`], which the
//! explain path surfaces as a diagnostic. A rejection is data, never an error.

use crate::budget::total_budget;
use crate::primitives::MAX_BUDGET_LEVEL;
use crate::{CharacterClass, Item, Skill};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

// =============================================================================
// FILTER OPTIONS
// =============================================================================

/// Per-request budget context and filter toggles.
///
/// Every recognised option is a field here. `Default` describes a max-level
/// character with no class and every toggle off.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterOptions {
    /// Character level (default 101). Values below 1 count as 1.
    pub level: u32,
    /// Character class (default none: class requirements are not checked).
    pub class: Option<CharacterClass>,
    /// Skill points granted on top of the level budget (default 0).
    pub extra_points: i32,
    /// Reject items whose level requirement is below this (default none).
    pub min_item_level: Option<u32>,
    /// Only these rarities, compared case-insensitively (default: all).
    pub allowed_rarities: Option<BTreeSet<String>>,
    /// Reject mythic items (default false).
    pub no_mythic: bool,
    /// Reject crafted or unidentified items (default false).
    pub no_crafted: bool,
    /// Reject items with any negative displayed bonus (default false).
    pub no_negative_item_bonus: bool,
    /// Reject builds whose summed effective bonus has a negative skill (default false).
    pub no_negative_net_bonus: bool,
    /// Only items that grant this skill (default none).
    pub must_give: Option<Skill>,
    /// Minimum remaining-SP gain for a recommendation to be listed (default none).
    pub min_improvement: Option<i32>,
    /// Weapons must match the class's canonical weapon type (default false).
    pub strict_weapon_class: bool,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            level: MAX_BUDGET_LEVEL,
            class: None,
            extra_points: 0,
            min_item_level: None,
            allowed_rarities: None,
            no_mythic: false,
            no_crafted: false,
            no_negative_item_bonus: false,
            no_negative_net_bonus: false,
            must_give: None,
            min_improvement: None,
            strict_weapon_class: false,
        }
    }
}

impl FilterOptions {
    /// Options for a character at `level`, everything else default.
    #[must_use]
    pub fn for_level(level: u32) -> Self {
        Self {
            level,
            ..Self::default()
        }
    }

    /// Total skill-point budget for this context.
    #[must_use]
    pub fn budget(&self) -> i32 {
        total_budget(self.level, self.extra_points)
    }
}

// =============================================================================
// REJECTIONS
// =============================================================================

/// Why an item was not eligible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rejection {
    LevelTooHigh,
    BelowMinimumLevel,
    ClassMismatch,
    WeaponTypeMismatch,
    RarityNotAllowed,
    MythicExcluded,
    NotIdentified,
    NegativeItemBonus,
    MissingRequiredStat,
}

impl Rejection {
    #[must_use]
    pub const fn reason(self) -> &'static str {
        match self {
            Rejection::LevelTooHigh => "level requirement above character level",
            Rejection::BelowMinimumLevel => "level requirement below minimum item level",
            Rejection::ClassMismatch => "class requirement does not match",
            Rejection::WeaponTypeMismatch => "weapon type does not match class",
            Rejection::RarityNotAllowed => "rarity not allowed",
            Rejection::MythicExcluded => "mythic items excluded",
            Rejection::NotIdentified => "crafted or unidentified",
            Rejection::NegativeItemBonus => "has a negative skill bonus",
            Rejection::MissingRequiredStat => "does not grant the required skill",
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.reason())
    }
}

// =============================================================================
// PREDICATE CHAIN
// =============================================================================

/// First failing predicate for `item` under `options`, or `None` if eligible.
#[must_use]
pub fn rejection(item: &Item, options: &FilterOptions) -> Option<Rejection> {
    if item.level_req > options.level.max(1) {
        return Some(Rejection::LevelTooHigh);
    }

    if let Some(min_level) = options.min_item_level {
        if item.level_req < min_level {
            return Some(Rejection::BelowMinimumLevel);
        }
    }

    if let (Some(required), Some(class)) = (item.class_req, options.class) {
        if required != class {
            return Some(Rejection::ClassMismatch);
        }
    }

    if options.strict_weapon_class && item.is_weapon() {
        if let Some(class) = options.class {
            let matches = item
                .weapon_type
                .as_deref()
                .is_some_and(|wt| wt.eq_ignore_ascii_case(class.weapon_type()));
            if !matches {
                return Some(Rejection::WeaponTypeMismatch);
            }
        }
    }

    if let Some(allowed) = &options.allowed_rarities {
        if !allowed.iter().any(|r| r.eq_ignore_ascii_case(&item.rarity)) {
            return Some(Rejection::RarityNotAllowed);
        }
    }
    if options.no_mythic && item.is_mythic() {
        return Some(Rejection::MythicExcluded);
    }

    if options.no_crafted && !item.identified {
        return Some(Rejection::NotIdentified);
    }

    if options.no_negative_item_bonus && item.display_bonus.has_negative() {
        return Some(Rejection::NegativeItemBonus);
    }

    if let Some(skill) = options.must_give {
        let bonus = if item.is_weapon() {
            item.display_bonus
        } else {
            item.effective_bonus()
        };
        if bonus.get(skill) <= 0 {
            return Some(Rejection::MissingRequiredStat);
        }
    }

    None
}

/// Whether `item` passes every predicate.
#[must_use]
pub fn is_eligible(item: &Item, options: &FilterOptions) -> bool {
    rejection(item, options).is_none()
}

/// Keep the eligible items of `pool`, preserving pool order.
pub fn filter_candidates<'a, I>(pool: I, options: &FilterOptions) -> Vec<&'a Item>
where
    I: IntoIterator<Item = &'a Item>,
{
    pool.into_iter()
        .filter(|item| is_eligible(item, options))
        .collect()
}

// =============================================================================
// TESTS
// =============================================================================
