//! # Budget Engine
//!
//! Pure functions over skill vectors and item sets:
//! - Skill-point budget from character level
//! - Minimum spend to meet every requirement at once
//! - Equip-order feasibility (subset search)
//! - Allocation presets for leftover points
//! - Aggregated build stats
//!
//! Nothing here performs I/O or holds state.
//!
//! ## Equip order
//!
//! Bonuses only apply once an item is worn, so the order in which items are
//! put on changes how many points each step needs. Equipping item `j` on top
//! of a worn set `S` costs `sum_s max(0, req_j[s] - bonus(S)[s])` points, and a
//! single skill may never need more than the per-skill cap in one step. The
//! set is feasible when some order keeps the cumulative cost within budget.
//! The search runs over all `2^n` subsets with an explicit bit-to-item table.

use crate::primitives::{MAX_BUDGET_LEVEL, MAX_EQUIP_ORDER_ITEMS, POINTS_PER_LEVEL};
use crate::{Item, Skill, SkillVector};
use serde::{Deserialize, Serialize};

// =============================================================================
// BUDGET
// =============================================================================

/// Skill points available at `level`: `2 * (min(level, 101) - 1)`.
///
/// Levels below 1 are treated as 1, so the result lies in `0..=200`.
#[must_use]
pub fn skill_budget_from_level(level: u32) -> i32 {
    let effective = level.clamp(1, MAX_BUDGET_LEVEL);
    POINTS_PER_LEVEL * (effective as i32 - 1)
}

/// Level budget plus bonus points granted from outside the level curve.
#[must_use]
pub fn total_budget(level: u32, extra_points: i32) -> i32 {
    skill_budget_from_level(level).saturating_add(extra_points)
}

// =============================================================================
// SPEND
// =============================================================================

/// Componentwise maximum requirement across `items`.
#[must_use]
pub fn max_requirement(items: &[&Item]) -> SkillVector {
    items
        .iter()
        .fold(SkillVector::ZERO, |acc, item| acc.componentwise_max(&item.requirement))
}

/// Sum of effective bonuses across `items`.
#[must_use]
pub fn net_effective_bonus(items: &[&Item]) -> SkillVector {
    items.iter().map(|item| item.effective_bonus()).sum()
}

/// Total magnitude of negative displayed bonuses across `items`.
#[must_use]
pub fn negative_tradeoff(items: &[&Item]) -> i32 {
    items
        .iter()
        .fold(0i32, |acc, item| acc.saturating_add(item.display_bonus.negative_sum()))
}

/// Per-skill allocation needed once every bonus is applied (uncapped).
#[must_use]
pub fn required_allocation(items: &[&Item]) -> SkillVector {
    max_requirement(items).shortfall(&net_effective_bonus(items))
}

/// Minimum points needed to meet every requirement simultaneously.
///
/// For each skill, `max(0, max requirement - sum of effective bonuses)`,
/// summed over the five skills. Order independent: it assumes every bonus
/// is already in effect, so it is a lower bound on any real equip sequence.
#[must_use]
pub fn minimum_spend(items: &[&Item]) -> i32 {
    required_allocation(items).total()
}

// =============================================================================
// EQUIP ORDER
// =============================================================================

/// A witness ordering for an equip-order feasible item set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquipPlan {
    /// Item names in the order they should be put on.
    pub order: Vec<String>,
    /// Cumulative points spent across all equip steps.
    pub cost: i32,
}

/// Necessary condition: no requirement may exceed the cap even with every
/// positive bonus from the other items already applied.
fn within_cap_bound(items: &[&Item], per_skill_cap: i32) -> bool {
    let positive: Vec<SkillVector> = items
        .iter()
        .map(|item| item.effective_bonus().positive_part())
        .collect();
    let all_positive: SkillVector = positive.iter().copied().sum();

    items.iter().zip(&positive).all(|(item, own)| {
        Skill::ALL.iter().all(|skill| {
            let others = all_positive.get(*skill).saturating_sub(own.get(*skill));
            item.requirement.get(*skill).saturating_sub(others) <= per_skill_cap
        })
    })
}

/// Find the cheapest equip order for `items`, if one fits in `budget`.
///
/// Returns `None` when no order exists whose cumulative step cost stays within
/// `budget` with no single-skill step above `per_skill_cap`. Sets larger than
/// `MAX_EQUIP_ORDER_ITEMS` are rejected.
#[must_use]
pub fn equip_plan(items: &[&Item], budget: i32, per_skill_cap: i32) -> Option<EquipPlan> {
    let n = items.len();
    if n == 0 {
        return Some(EquipPlan {
            order: Vec::new(),
            cost: 0,
        });
    }
    if n > MAX_EQUIP_ORDER_ITEMS {
        tracing::warn!(
            items = n,
            max = MAX_EQUIP_ORDER_ITEMS,
            "Equip-order search refused: item set too large"
        );
        return None;
    }
    if budget < 0 || !within_cap_bound(items, per_skill_cap) {
        return None;
    }

    // Bit i of a mask is items[i].
    let requirements: Vec<SkillVector> = items.iter().map(|item| item.requirement).collect();
    let bonuses: Vec<SkillVector> = items.iter().map(|item| item.effective_bonus()).collect();

    let states = 1usize << n;
    let full = states - 1;
    let mut cost: Vec<Option<i32>> = vec![None; states];
    let mut parent: Vec<u8> = vec![0; states];
    let mut worn_bonus: Vec<SkillVector> = vec![SkillVector::ZERO; states];
    cost[0] = Some(0);

    for mask in 0..states {
        if mask != 0 {
            let low = mask.trailing_zeros() as usize;
            worn_bonus[mask] = worn_bonus[mask & (mask - 1)] + bonuses[low];
        }
        let Some(spent) = cost[mask] else {
            continue;
        };
        if mask == full {
            break;
        }
        let bonus = worn_bonus[mask];

        for (j, requirement) in requirements.iter().enumerate() {
            let bit = 1usize << j;
            if mask & bit != 0 {
                continue;
            }
            let step = requirement.shortfall(&bonus);
            if step.0.iter().any(|v| *v > per_skill_cap) {
                continue;
            }
            let next_cost = spent.saturating_add(step.total());
            if next_cost > budget {
                continue;
            }
            let next = mask | bit;
            if cost[next].is_none_or(|existing| next_cost < existing) {
                cost[next] = Some(next_cost);
                parent[next] = j as u8;
            }
        }
    }

    let total = cost[full]?;
    let mut order = Vec::with_capacity(n);
    let mut mask = full;
    while mask != 0 {
        let j = parent[mask] as usize;
        order.push(items[j].name.clone());
        mask &= !(1usize << j);
    }
    order.reverse();

    Some(EquipPlan { order, cost: total })
}

/// Whether some equip order for `items` fits in `budget`.
#[must_use]
pub fn equip_order_feasible(items: &[&Item], budget: i32, per_skill_cap: i32) -> bool {
    equip_plan(items, budget, per_skill_cap).is_some()
}

// =============================================================================
// ALLOCATION PRESETS
// =============================================================================

/// A named way of spending the points left after the minimum allocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationPreset {
    pub name: String,
    pub allocation: SkillVector,
    pub points_used: i32,
}

/// Round-robin one point at a time across all skills below the cap.
fn round_robin(allocation: &mut SkillVector, remaining: &mut i32, per_skill_cap: i32) {
    while *remaining > 0 {
        let mut progressed = false;
        for skill in Skill::ALL {
            if *remaining == 0 {
                break;
            }
            let current = allocation.get(skill);
            if current < per_skill_cap {
                allocation.set(skill, current + 1);
                *remaining -= 1;
                progressed = true;
            }
        }
        if !progressed {
            break;
        }
    }
}

/// Presets distributing the leftover budget on top of the minimum allocation.
///
/// Returns `"balanced"` followed by one `"prioritize_<skill>"` per skill.
/// Empty when the minimum allocation already exceeds `budget`.
#[must_use]
pub fn allocation_presets(
    items: &[&Item],
    budget: i32,
    per_skill_cap: i32,
) -> Vec<AllocationPreset> {
    let base = required_allocation(items).capped(per_skill_cap);
    let leftover = budget.saturating_sub(base.total());
    if leftover < 0 {
        return Vec::new();
    }

    let finish = |name: String, allocation: SkillVector| AllocationPreset {
        name,
        points_used: allocation.total(),
        allocation,
    };

    let mut presets = Vec::with_capacity(Skill::ALL.len() + 1);

    let mut balanced = base;
    let mut remaining = leftover;
    round_robin(&mut balanced, &mut remaining, per_skill_cap);
    presets.push(finish("balanced".to_string(), balanced));

    for skill in Skill::ALL {
        let mut allocation = base;
        let mut remaining = leftover;
        let room = per_skill_cap.saturating_sub(allocation.get(skill)).max(0);
        let fill = room.min(remaining);
        allocation.set(skill, allocation.get(skill) + fill);
        remaining -= fill;
        round_robin(&mut allocation, &mut remaining, per_skill_cap);
        presets.push(finish(format!("prioritize_{}", skill.name()), allocation));
    }

    presets
}

// =============================================================================
// BUILD STATS
// =============================================================================

/// Aggregate feasibility and spend figures for a set of worn items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildStats {
    pub budget: i32,
    /// Minimum points needed across all worn items.
    pub final_spend: i32,
    /// `budget - final_spend`; negative when over budget.
    pub remaining_sp: i32,
    pub equip_order_ok: bool,
    /// Cheapest equip order, when one exists.
    pub equip_plan: Option<EquipPlan>,
    /// Present only when `remaining_sp >= 0`.
    pub allocation_presets: Option<Vec<AllocationPreset>>,
    pub required_allocation: SkillVector,
    /// Sum of effective bonuses; feeds the no-negative-net-bonus filter.
    pub net_effective_bonus: SkillVector,
    /// Total magnitude of negative displayed bonuses.
    pub negative_tradeoff: i32,
}

/// Compute [`BuildStats`] for `items` under `budget`.
#[must_use]
pub fn build_stats(items: &[&Item], budget: i32, per_skill_cap: i32) -> BuildStats {
    let final_spend = minimum_spend(items);
    let remaining_sp = budget.saturating_sub(final_spend);
    let equip_plan = equip_plan(items, budget, per_skill_cap);
    let allocation_presets =
        (remaining_sp >= 0).then(|| allocation_presets(items, budget, per_skill_cap));

    BuildStats {
        budget,
        final_spend,
        remaining_sp,
        equip_order_ok: equip_plan.is_some(),
        equip_plan,
        allocation_presets,
        required_allocation: required_allocation(items),
        net_effective_bonus: net_effective_bonus(items),
        negative_tradeoff: negative_tradeoff(items),
    }
}

// =============================================================================
// TESTS
// =============================================================================
