//! # Build Solver
//!
//! Bounded depth-first search that fills the unlocked slots of a build from
//! per-slot candidate pools.
//!
//! ## Objective
//!
//! Among complete builds with `remaining_sp >= 0` and a feasible equip order,
//! the solver keeps the one that maximizes remaining SP, then minimizes the
//! total negative bonus tradeoff, then minimizes final spend. The first build
//! found wins exact ties, so results are deterministic for a given pool order.
//!
//! ## Bounds
//!
//! - Pools are pre-filtered, ranked and capped before the search (see
//!   [`build_pools`]). The cap is a latency tradeoff and may exclude a true
//!   optimum.
//! - Slot groups are visited smallest pool first.
//! - Every partial assignment is checked against an admissible lower bound on
//!   final spend (remaining groups contribute their best positive bonus).
//! - A node budget bounds total work. Running out sets `truncated` on the
//!   outcome: the best build so far is returned and may be suboptimal.

use crate::budget::{BuildStats, build_stats, equip_order_feasible};
use crate::filter::{FilterOptions, is_eligible};
use crate::primitives::{
    DEFAULT_NODE_BUDGET, DEFAULT_POOL_CAP, DEFAULT_RING_POOL_CAP, PER_SKILL_CAP,
};
use crate::{EquipSlot, GearError, Item, Skill, SkillVector, Slot};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};

// =============================================================================
// LIMITS
// =============================================================================

/// Performance knobs for pool preparation and search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverLimits {
    /// Maximum search nodes (candidate placements) per solve.
    pub node_budget: u64,
    /// Candidates kept per slot after ranking.
    pub pool_cap: usize,
    /// Candidates kept for the shared ring pool.
    pub ring_pool_cap: usize,
}

impl Default for SolverLimits {
    fn default() -> Self {
        Self {
            node_budget: DEFAULT_NODE_BUDGET,
            pool_cap: DEFAULT_POOL_CAP,
            ring_pool_cap: DEFAULT_RING_POOL_CAP,
        }
    }
}

impl SolverLimits {
    #[must_use]
    pub fn cap_for(&self, slot: Slot) -> usize {
        if slot == Slot::Ring {
            self.ring_pool_cap
        } else {
            self.pool_cap
        }
    }
}

// =============================================================================
// LOADOUT
// =============================================================================

/// Items fixed in place before solving: locked slots plus tomes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loadout {
    pub slots: BTreeMap<EquipSlot, Item>,
    pub tomes: Vec<Item>,
}

impl Loadout {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Place `item` in `slot`, rejecting items of the wrong kind.
    pub fn insert(&mut self, slot: EquipSlot, item: Item) -> Result<(), GearError> {
        if item.slot != slot.item_slot() {
            return Err(GearError::InvalidRequest(format!(
                "'{}' is a {} and cannot occupy {}",
                item.name, item.slot, slot
            )));
        }
        self.slots.insert(slot, item);
        Ok(())
    }

    /// Place `item` in the first free position its slot allows.
    pub fn place(&mut self, item: Item) -> Result<EquipSlot, GearError> {
        if item.slot == Slot::Tome {
            return Err(GearError::InvalidRequest(format!(
                "'{}' is a tome; add it with add_tome",
                item.name
            )));
        }
        let slot = EquipSlot::ALL
            .into_iter()
            .find(|s| s.item_slot() == item.slot && !self.slots.contains_key(s))
            .ok_or_else(|| {
                GearError::InvalidRequest(format!("no free {} slot for '{}'", item.slot, item.name))
            })?;
        self.slots.insert(slot, item);
        Ok(slot)
    }

    pub fn add_tome(&mut self, item: Item) -> Result<(), GearError> {
        if item.slot != Slot::Tome {
            return Err(GearError::InvalidRequest(format!(
                "'{}' is a {}, not a tome",
                item.name, item.slot
            )));
        }
        self.tomes.push(item);
        Ok(())
    }

    /// Every fixed item: slots in slot order, then tomes.
    #[must_use]
    pub fn items(&self) -> Vec<&Item> {
        self.slots.values().chain(self.tomes.iter()).collect()
    }

    #[must_use]
    pub fn names(&self) -> BTreeSet<&str> {
        self.items().into_iter().map(|i| i.name.as_str()).collect()
    }

    /// Slots not occupied by a locked item.
    #[must_use]
    pub fn free_slots(&self) -> Vec<EquipSlot> {
        EquipSlot::ALL
            .into_iter()
            .filter(|s| !self.slots.contains_key(s))
            .collect()
    }
}

// =============================================================================
// CANDIDATE POOLS
// =============================================================================

/// Ranked candidate lists keyed by item slot. Rings share one pool.
#[derive(Debug, Clone, Default)]
pub struct CandidatePools<'a> {
    pools: BTreeMap<Slot, Vec<&'a Item>>,
}

impl<'a> CandidatePools<'a> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the pool for `slot`, keeping the given order.
    pub fn insert(&mut self, slot: Slot, pool: Vec<&'a Item>) {
        self.pools.insert(slot, pool);
    }

    #[must_use]
    pub fn get(&self, slot: Slot) -> &[&'a Item] {
        self.pools.get(&slot).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Pool sizes per slot, for diagnostics.
    #[must_use]
    pub fn sizes(&self) -> BTreeMap<Slot, usize> {
        self.pools.iter().map(|(s, p)| (*s, p.len())).collect()
    }
}

/// Rank candidates so cheap, generous items come first.
///
/// Order: own spend ascending, total positive bonus descending, name.
pub fn rank_candidates(pool: &mut [&Item]) {
    pool.sort_by_cached_key(|item| {
        (
            item.own_spend(),
            Reverse(item.effective_bonus().positive_part().total()),
            Reverse(item.display_bonus.positive_part().total()),
            item.name.clone(),
        )
    });
}

/// Build filtered, ranked, capped pools for every slot `locked` leaves free.
///
/// Items already locked are excluded. Filtering happens before capping, so the
/// cap only ever trims eligible items, lowest ranked first.
pub fn build_pools<'a, I>(
    items: I,
    options: &FilterOptions,
    locked: &Loadout,
    limits: &SolverLimits,
) -> CandidatePools<'a>
where
    I: IntoIterator<Item = &'a Item>,
{
    let wanted: BTreeSet<Slot> = locked
        .free_slots()
        .into_iter()
        .map(EquipSlot::item_slot)
        .collect();
    let taken = locked.names();

    let mut grouped: BTreeMap<Slot, Vec<&'a Item>> = BTreeMap::new();
    for item in items {
        if !wanted.contains(&item.slot) || taken.contains(item.name.as_str()) {
            continue;
        }
        if is_eligible(item, options) {
            grouped.entry(item.slot).or_default().push(item);
        }
    }

    let mut pools = CandidatePools::new();
    for (slot, mut pool) in grouped {
        rank_candidates(&mut pool);
        pool.truncate(limits.cap_for(slot));
        pools.insert(slot, pool);
    }
    pools
}

// =============================================================================
// OUTCOME
// =============================================================================

/// A complete build with its stats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Build {
    pub slots: BTreeMap<EquipSlot, Item>,
    pub tomes: Vec<Item>,
    pub stats: BuildStats,
}

impl Build {
    #[must_use]
    pub fn item_names(&self) -> BTreeMap<EquipSlot, &str> {
        self.slots.iter().map(|(s, i)| (*s, i.name.as_str())).collect()
    }
}

/// Result of a solve.
///
/// `best == None` with `truncated == false` means no feasible build exists
/// in the given pools. With `truncated == true` the search was cut short.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolveOutcome {
    pub best: Option<Build>,
    pub truncated: bool,
    pub nodes_visited: u64,
}

// =============================================================================
// SEARCH
// =============================================================================

#[derive(Debug, Clone, Copy)]
enum GroupKind {
    Single(EquipSlot),
    /// Choose `count` distinct rings for the free ring positions.
    Rings { first: EquipSlot, count: usize },
}

#[derive(Debug)]
struct Group<'p, 'a> {
    kind: GroupKind,
    pool: &'p [&'a Item],
}

/// Running aggregates for the items placed so far.
#[derive(Debug, Clone, Copy)]
struct Partial {
    max_req: SkillVector,
    bonus: SkillVector,
    negative: i32,
}

impl Partial {
    fn with(self, item: &Item) -> Partial {
        Partial {
            max_req: self.max_req.componentwise_max(&item.requirement),
            bonus: self.bonus + item.effective_bonus(),
            negative: self.negative.saturating_add(item.display_bonus.negative_sum()),
        }
    }

    fn final_spend(&self) -> i32 {
        self.max_req.shortfall(&self.bonus).total()
    }

    fn lower_bound(&self, optimistic: &SkillVector) -> i32 {
        self.max_req.shortfall(&(self.bonus + *optimistic)).total()
    }
}

/// Lexicographic score: remaining SP, then less negative tradeoff, then less spend.
type ScoreKey = (i32, i32, i32);

/// Mutable search state threaded through the recursion.
struct SearchState<'a> {
    chosen: Vec<(EquipSlot, &'a Item)>,
    used: BTreeSet<&'a str>,
    nodes_visited: u64,
    truncated: bool,
    best: Option<(ScoreKey, Vec<(EquipSlot, &'a Item)>)>,
}

struct Search<'p, 'a> {
    groups: Vec<Group<'p, 'a>>,
    /// `optimistic[i]`: best positive bonus still obtainable from groups `i..`.
    optimistic: Vec<SkillVector>,
    fixed: Vec<&'a Item>,
    budget: i32,
    no_negative_net_bonus: bool,
    node_budget: u64,
}

/// Per-skill sum of the `count` largest positive effective bonuses in `pool`.
fn optimistic_bonus(pool: &[&Item], count: usize) -> SkillVector {
    let mut out = SkillVector::ZERO;
    for skill in Skill::ALL {
        let mut values: Vec<i32> = pool
            .iter()
            .map(|item| item.effective_bonus().get(skill).max(0))
            .collect();
        values.sort_unstable_by(|a, b| b.cmp(a));
        let best = values
            .iter()
            .take(count)
            .fold(0i32, |acc, v| acc.saturating_add(*v));
        out.set(skill, best);
    }
    out
}

impl<'p, 'a> Search<'p, 'a> {
    fn prunable(
        &self,
        partial: &Partial,
        optimistic: &SkillVector,
        state: &SearchState<'a>,
    ) -> bool {
        let bound = partial.lower_bound(optimistic);
        if bound > self.budget {
            return true;
        }
        // Parity rule: a negative net component is assumed unrecoverable by
        // later picks. This can discard builds a later item would repair.
        if self.no_negative_net_bonus && partial.bonus.has_negative() {
            return true;
        }
        match &state.best {
            Some((key, _)) => self.budget.saturating_sub(bound) < key.0,
            None => false,
        }
    }

    /// Try to place `item`; on success the caller must `leave` afterwards.
    fn enter(
        &self,
        state: &mut SearchState<'a>,
        slot: EquipSlot,
        item: &'a Item,
        partial: Partial,
        optimistic: &SkillVector,
    ) -> Option<Partial> {
        if state.used.contains(item.name.as_str()) {
            return None;
        }
        if state.nodes_visited >= self.node_budget {
            state.truncated = true;
            return None;
        }
        state.nodes_visited += 1;

        let next = partial.with(item);
        if self.prunable(&next, optimistic, state) {
            return None;
        }
        state.chosen.push((slot, item));
        state.used.insert(item.name.as_str());
        Some(next)
    }

    fn leave(&self, state: &mut SearchState<'a>) {
        if let Some((_, item)) = state.chosen.pop() {
            state.used.remove(item.name.as_str());
        }
    }

    fn descend(&self, state: &mut SearchState<'a>, index: usize, partial: Partial) {
        if state.truncated {
            return;
        }
        let Some(group) = self.groups.get(index) else {
            self.complete(state, partial);
            return;
        };

        match group.kind {
            GroupKind::Single(slot) => {
                let optimistic = self.optimistic[index + 1];
                for item in group.pool {
                    if state.truncated {
                        return;
                    }
                    if let Some(next) = self.enter(state, slot, item, partial, &optimistic) {
                        self.descend(state, index + 1, next);
                        self.leave(state);
                    }
                }
            }
            GroupKind::Rings { first, count } => {
                self.descend_rings(state, index, group.pool, first, count, 0, partial);
            }
        }
    }

    /// Choose rings as index-increasing combinations so each pair is seen once.
    fn descend_rings(
        &self,
        state: &mut SearchState<'a>,
        index: usize,
        pool: &'p [&'a Item],
        slot: EquipSlot,
        left: usize,
        start: usize,
        partial: Partial,
    ) {
        if left == 0 {
            self.descend(state, index + 1, partial);
            return;
        }
        // Mid-group the current group's optimistic bonus still applies.
        let optimistic = if left == 1 {
            self.optimistic[index + 1]
        } else {
            self.optimistic[index]
        };
        for position in start..pool.len() {
            if state.truncated {
                return;
            }
            if pool.len() - position < left {
                break;
            }
            let item = pool[position];
            if let Some(next) = self.enter(state, slot, item, partial, &optimistic) {
                let ring2 = EquipSlot::Ring2;
                self.descend_rings(state, index, pool, ring2, left - 1, position + 1, next);
                self.leave(state);
            }
        }
    }

    fn complete(&self, state: &mut SearchState<'a>, partial: Partial) {
        let final_spend = partial.final_spend();
        let remaining = self.budget.saturating_sub(final_spend);
        if remaining < 0 {
            return;
        }
        if self.no_negative_net_bonus && partial.bonus.has_negative() {
            return;
        }
        let key = (remaining, -partial.negative, -final_spend);
        if state.best.as_ref().is_some_and(|(best, _)| key <= *best) {
            return;
        }

        let items: Vec<&Item> = self
            .fixed
            .iter()
            .copied()
            .chain(state.chosen.iter().map(|(_, item)| *item))
            .collect();
        if !equip_order_feasible(&items, self.budget, PER_SKILL_CAP) {
            return;
        }
        state.best = Some((key, state.chosen.clone()));
    }
}

/// Search the free slots of `locked` for the best feasible build.
///
/// Pools come from [`build_pools`] or any caller-ranked source; their order is
/// the exploration order. Free slots whose pool is empty stay empty. When both
/// ring slots are free, two distinct rings are chosen from the ring pool.
#[must_use]
pub fn solve(
    options: &FilterOptions,
    locked: &Loadout,
    pools: &CandidatePools<'_>,
    node_budget: u64,
) -> SolveOutcome {
    let budget = options.budget();
    let free = locked.free_slots();

    let mut groups: Vec<Group<'_, '_>> = Vec::new();
    let free_rings: Vec<EquipSlot> = free.iter().copied().filter(|s| s.is_ring()).collect();
    for slot in free.iter().copied().filter(|s| !s.is_ring()) {
        let pool = pools.get(slot.item_slot());
        if !pool.is_empty() {
            groups.push(Group {
                kind: GroupKind::Single(slot),
                pool,
            });
        }
    }
    if let Some(first) = free_rings.first().copied() {
        let pool = pools.get(Slot::Ring);
        let count = free_rings.len().min(pool.len());
        if count > 0 {
            groups.push(Group {
                kind: GroupKind::Rings { first, count },
                pool,
            });
        }
    }
    groups.sort_by_key(|g| {
        let first = match g.kind {
            GroupKind::Single(slot) | GroupKind::Rings { first: slot, .. } => slot,
        };
        (g.pool.len(), first)
    });

    let mut optimistic = vec![SkillVector::ZERO; groups.len() + 1];
    for (i, group) in groups.iter().enumerate().rev() {
        let count = match group.kind {
            GroupKind::Single(_) => 1,
            GroupKind::Rings { count, .. } => count,
        };
        optimistic[i] = optimistic[i + 1] + optimistic_bonus(group.pool, count);
    }

    let fixed = locked.items();
    let search = Search {
        groups,
        optimistic,
        fixed,
        budget,
        no_negative_net_bonus: options.no_negative_net_bonus,
        node_budget,
    };

    let mut state = SearchState {
        chosen: Vec::new(),
        used: search.fixed.iter().map(|i| i.name.as_str()).collect(),
        nodes_visited: 0,
        truncated: false,
        best: None,
    };

    let root = search
        .fixed
        .iter()
        .fold(
            Partial {
                max_req: SkillVector::ZERO,
                bonus: SkillVector::ZERO,
                negative: 0,
            },
            |acc, item| acc.with(item),
        );
    if !search.prunable(&root, &search.optimistic[0], &state) {
        search.descend(&mut state, 0, root);
    }

    if state.truncated {
        tracing::warn!(
            nodes = state.nodes_visited,
            node_budget,
            found = state.best.is_some(),
            "Solver node budget exhausted; result may be suboptimal"
        );
    } else {
        tracing::debug!(
            nodes = state.nodes_visited,
            found = state.best.is_some(),
            "Solver finished"
        );
    }

    let best = state.best.map(|(_, picks)| {
        let mut slots = locked.slots.clone();
        for (slot, item) in picks {
            slots.insert(slot, item.clone());
        }
        let all: Vec<&Item> = slots.values().chain(locked.tomes.iter()).collect();
        let stats = build_stats(&all, budget, PER_SKILL_CAP);
        Build {
            slots,
            tomes: locked.tomes.clone(),
            stats,
        }
    });

    SolveOutcome {
        best,
        truncated: state.truncated,
        nodes_visited: state.nodes_visited,
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str, slot: Slot, req: [i32; 5], bonus: [i32; 5]) -> Item {
        Item::new(name, slot, "Rare")
            .with_requirement(SkillVector::new(req))
            .with_bonus(SkillVector::new(bonus))
    }

    fn pools_of<'a>(entries: &[(Slot, &'a [Item])]) -> CandidatePools<'a> {
        let mut pools = CandidatePools::new();
        for (slot, items) in entries {
            pools.insert(*slot, items.iter().collect());
        }
        pools
    }

    #[test]
    fn picks_cheapest_helmet() {
        let helmets = vec![
            item("heavy", Slot::Helmet, [60, 0, 0, 0, 0], [0; 5]),
            item("light", Slot::Helmet, [10, 0, 0, 0, 0], [0; 5]),
        ];
        let pools = pools_of(&[(Slot::Helmet, &helmets)]);
        let outcome = solve(&FilterOptions::for_level(101), &Loadout::new(), &pools, 1_000);

        let best = outcome.best.expect("build");
        assert_eq!(best.item_names().get(&EquipSlot::Helmet), Some(&"light"));
        assert_eq!(best.stats.remaining_sp, 190);
        assert!(!outcome.truncated);
    }

    #[test]
    fn bonus_item_pays_for_requirement() {
        let chest = vec![item("plate", Slot::Chestplate, [0, 0, 0, 50, 0], [0; 5])];
        let necks = vec![
            item("plain", Slot::Necklace, [0; 5], [0; 5]),
            item("warden", Slot::Necklace, [0; 5], [0, 0, 0, 30, 0]),
        ];
        let pools = pools_of(&[(Slot::Chestplate, &chest), (Slot::Necklace, &necks)]);
        let outcome = solve(&FilterOptions::for_level(101), &Loadout::new(), &pools, 1_000);

        let best = outcome.best.expect("build");
        assert_eq!(best.item_names().get(&EquipSlot::Necklace), Some(&"warden"));
        assert_eq!(best.stats.final_spend, 20);
    }

    #[test]
    fn rings_are_distinct() {
        let rings = vec![
            item("r1", Slot::Ring, [0; 5], [5, 0, 0, 0, 0]),
            item("r2", Slot::Ring, [0; 5], [0; 5]),
        ];
        let pools = pools_of(&[(Slot::Ring, &rings)]);
        let outcome = solve(&FilterOptions::for_level(101), &Loadout::new(), &pools, 1_000);

        let best = outcome.best.expect("build");
        let names = best.item_names();
        assert_eq!(names.len(), 2);
        assert_ne!(names.get(&EquipSlot::Ring1), names.get(&EquipSlot::Ring2));
    }

    #[test]
    fn one_locked_ring_chooses_one_more() {
        let rings = vec![
            item("locked", Slot::Ring, [0; 5], [0; 5]),
            item("other", Slot::Ring, [0; 5], [0; 5]),
        ];
        let mut locked = Loadout::new();
        locked
            .insert(EquipSlot::Ring1, rings[0].clone())
            .expect("lock ring");
        let pools = pools_of(&[(Slot::Ring, &rings)]);
        let outcome = solve(&FilterOptions::for_level(101), &locked, &pools, 1_000);

        let best = outcome.best.expect("build");
        assert_eq!(best.item_names().get(&EquipSlot::Ring1), Some(&"locked"));
        assert_eq!(best.item_names().get(&EquipSlot::Ring2), Some(&"other"));
    }

    #[test]
    fn infeasible_is_none_not_truncated() {
        let helmets = vec![item("big", Slot::Helmet, [90, 0, 0, 0, 0], [0; 5])];
        let pools = pools_of(&[(Slot::Helmet, &helmets)]);
        let outcome = solve(&FilterOptions::for_level(20), &Loadout::new(), &pools, 1_000);
        assert!(outcome.best.is_none());
        assert!(!outcome.truncated);
    }

    #[test]
    fn node_budget_truncates() {
        let helmets: Vec<Item> = (0..10)
            .map(|i| item(&format!("h{i}"), Slot::Helmet, [0; 5], [0; 5]))
            .collect();
        let boots: Vec<Item> = (0..10)
            .map(|i| item(&format!("b{i}"), Slot::Boots, [0; 5], [0; 5]))
            .collect();
        let pools = pools_of(&[(Slot::Helmet, &helmets), (Slot::Boots, &boots)]);
        let outcome = solve(&FilterOptions::for_level(101), &Loadout::new(), &pools, 3);
        assert!(outcome.truncated);
        assert_eq!(outcome.nodes_visited, 3);
        assert!(outcome.best.is_some());
    }

    #[test]
    fn negative_tradeoff_breaks_remaining_ties() {
        let helmets = vec![
            item("cursed", Slot::Helmet, [0; 5], [0, -5, 0, 0, 0]),
            item("clean", Slot::Helmet, [0; 5], [0; 5]),
        ];
        let pools = pools_of(&[(Slot::Helmet, &helmets)]);
        let outcome = solve(&FilterOptions::for_level(101), &Loadout::new(), &pools, 1_000);
        let best = outcome.best.expect("build");
        assert_eq!(best.item_names().get(&EquipSlot::Helmet), Some(&"clean"));
    }

    #[test]
    fn net_negative_completion_rejected_when_requested() {
        let chest = vec![item("plate", Slot::Chestplate, [20, 0, 0, 0, 0], [0; 5])];
        let helmets = vec![
            item("brute", Slot::Helmet, [0; 5], [20, -3, 0, 0, 0]),
            item("plain", Slot::Helmet, [0; 5], [0; 5]),
        ];
        let pools = pools_of(&[(Slot::Chestplate, &chest), (Slot::Helmet, &helmets)]);

        let outcome = solve(&FilterOptions::for_level(101), &Loadout::new(), &pools, 1_000);
        let best = outcome.best.expect("build");
        assert_eq!(best.item_names().get(&EquipSlot::Helmet), Some(&"brute"));
        assert_eq!(best.stats.remaining_sp, 197);

        let options = FilterOptions {
            no_negative_net_bonus: true,
            ..FilterOptions::for_level(101)
        };
        let outcome = solve(&options, &Loadout::new(), &pools, 1_000);
        let best = outcome.best.expect("build");
        assert_eq!(best.item_names().get(&EquipSlot::Helmet), Some(&"plain"));
        assert_eq!(best.stats.remaining_sp, 180);
        assert!(!best.stats.net_effective_bonus.has_negative());
    }

    #[test]
    fn negative_partial_pruned_even_if_rings_repay_it() {
        let helmets = vec![item("cursed", Slot::Helmet, [0; 5], [0, -5, 0, 0, 0])];
        let rings = vec![
            item("mender", Slot::Ring, [0; 5], [0, 5, 0, 0, 0]),
            item("band", Slot::Ring, [0; 5], [0; 5]),
        ];
        let pools = pools_of(&[(Slot::Helmet, &helmets), (Slot::Ring, &rings)]);

        // Without the toggle the full build nets dex 0.
        let outcome = solve(&FilterOptions::for_level(101), &Loadout::new(), &pools, 1_000);
        let best = outcome.best.expect("build");
        assert_eq!(best.stats.net_effective_bonus.get(Skill::Dexterity), 0);

        // The helmet group is searched first and its negative partial is cut.
        let options = FilterOptions {
            no_negative_net_bonus: true,
            ..FilterOptions::for_level(101)
        };
        let outcome = solve(&options, &Loadout::new(), &pools, 1_000);
        assert!(outcome.best.is_none());
        assert!(!outcome.truncated);
    }

    #[test]
    fn locked_item_of_wrong_kind_rejected() {
        let mut locked = Loadout::new();
        let boots = item("b", Slot::Boots, [0; 5], [0; 5]);
        assert!(locked.insert(EquipSlot::Helmet, boots.clone()).is_err());
        assert_eq!(locked.place(boots).ok(), Some(EquipSlot::Boots));
    }

    #[test]
    fn build_pools_ranks_before_capping() {
        let mut items: Vec<Item> = (0..5)
            .map(|i| item(&format!("decoy{i}"), Slot::Helmet, [10, 0, 0, 0, 0], [0; 5]))
            .collect();
        items.push(item("gem", Slot::Helmet, [0; 5], [15, 0, 0, 0, 0]));
        let limits = SolverLimits {
            pool_cap: 2,
            ..SolverLimits::default()
        };
        let pools = build_pools(&items, &FilterOptions::default(), &Loadout::new(), &limits);
        let helmets = pools.get(Slot::Helmet);
        assert_eq!(helmets.len(), 2);
        assert_eq!(helmets[0].name, "gem");
    }
}
