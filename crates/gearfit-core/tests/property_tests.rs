//! # Property-Based Tests
//!
//! Invariants of the budget algebra, the solver and request fingerprints,
//! checked with proptest.

use gearfit_core::primitives::PER_SKILL_CAP;
use gearfit_core::{
    CandidatePools, FilterOptions, Fingerprint, Item, Loadout, SkillVector, Slot, build_stats,
    equip_order_feasible, minimum_spend, skill_budget_from_level, solve,
};
use proptest::collection::vec;
use proptest::prelude::*;
use serde_json::{Map, Value};

// =============================================================================
// STRATEGIES
// =============================================================================

fn skill_vector(range: std::ops::Range<i32>) -> impl Strategy<Value = SkillVector> {
    proptest::array::uniform5(range).prop_map(SkillVector::new)
}

fn armour_slot() -> impl Strategy<Value = Slot> {
    prop_oneof![
        Just(Slot::Helmet),
        Just(Slot::Chestplate),
        Just(Slot::Leggings),
        Just(Slot::Boots),
        Just(Slot::Necklace),
        Just(Slot::Bracelet),
    ]
}

fn item(index: usize) -> impl Strategy<Value = Item> {
    (armour_slot(), skill_vector(0..80), skill_vector(-10..20)).prop_map(
        move |(slot, requirement, bonus)| {
            Item::new(format!("item{index}"), slot, "Rare")
                .with_requirement(requirement)
                .with_bonus(bonus)
        },
    )
}

fn items(max: usize) -> impl Strategy<Value = Vec<Item>> {
    (0..=max).prop_flat_map(|n| (0..n).map(item).collect::<Vec<_>>())
}

// =============================================================================
// PROPERTY TESTS
// =============================================================================

proptest! {
    /// Budget never decreases with level and saturates at 200.
    #[test]
    fn budget_monotonic_and_saturating(level in 0u32..500) {
        let here = skill_budget_from_level(level);
        let next = skill_budget_from_level(level + 1);
        prop_assert!(next >= here);
        prop_assert!((0..=200).contains(&here));
        if level >= 101 {
            prop_assert_eq!(here, 200);
        }
    }

    /// Spend is bounded by the summed requirements and is never negative.
    #[test]
    fn spend_bounded_by_requirements(set in items(6)) {
        let refs: Vec<&Item> = set.iter().collect();
        let spend = minimum_spend(&refs);
        let ceiling: i32 = set.iter().map(|i| i.requirement.total()).sum();
        prop_assert!(spend >= 0);
        let penalties: i32 = set.iter().map(|i| i.display_bonus.negative_sum()).sum();
        prop_assert!(spend <= ceiling.max(0) + penalties);
    }

    /// Adding a bonus-free item never lowers the spend.
    #[test]
    fn spend_monotonic_for_bonus_free_items(set in items(5), extra in skill_vector(0..80)) {
        let extra_item = Item::new("extra", Slot::Ring, "Rare").with_requirement(extra);
        let mut refs: Vec<&Item> = set.iter().collect();
        let before = minimum_spend(&refs);
        refs.push(&extra_item);
        prop_assert!(minimum_spend(&refs) >= before);
    }

    /// An equip-order feasible set always fits the order-free lower bound.
    #[test]
    fn feasible_sets_respect_minimum_spend(set in items(6), budget in 0i32..250) {
        let refs: Vec<&Item> = set.iter().collect();
        if equip_order_feasible(&refs, budget, PER_SKILL_CAP) {
            prop_assert!(minimum_spend(&refs) <= budget);
        }
    }

    /// Empty-set stats are the identity.
    #[test]
    fn empty_stats_identity(budget in 0i32..=200) {
        let stats = build_stats(&[], budget, PER_SKILL_CAP);
        prop_assert_eq!(stats.final_spend, 0);
        prop_assert_eq!(stats.remaining_sp, budget);
        prop_assert!(stats.equip_order_ok);
    }

    /// Identical inputs give identical solver outcomes.
    #[test]
    fn solver_idempotent(set in items(12), level in 1u32..=101, node_budget in 1u64..400) {
        let mut grouped: std::collections::BTreeMap<Slot, Vec<&Item>> = Default::default();
        for it in &set {
            grouped.entry(it.slot).or_default().push(it);
        }
        let mut pools = CandidatePools::new();
        for (slot, pool) in grouped {
            pools.insert(slot, pool);
        }
        let options = FilterOptions::for_level(level);
        let locked = Loadout::new();

        let first = solve(&options, &locked, &pools, node_budget);
        let second = solve(&options, &locked, &pools, node_budget);
        prop_assert_eq!(&first, &second);
        prop_assert!(first.nodes_visited <= node_budget);
        if let Some(best) = &first.best {
            prop_assert!(best.stats.remaining_sp >= 0);
            prop_assert!(best.stats.equip_order_ok);
        }
    }

    /// Object key order never changes a fingerprint.
    #[test]
    fn fingerprint_ignores_key_order(entries in vec(("[a-z]{1,6}", 0i64..1000), 1..12)) {
        let mut forward = Map::new();
        for (k, v) in &entries {
            forward.insert(k.clone(), Value::from(*v));
        }
        let mut backward = Map::new();
        for (k, v) in forward.iter().rev() {
            backward.insert(k.clone(), v.clone());
        }
        prop_assert_eq!(
            Fingerprint::of_value(&Value::Object(forward)),
            Fingerprint::of_value(&Value::Object(backward))
        );
    }
}
