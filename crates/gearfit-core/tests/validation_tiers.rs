//! # Validation Tier Tests (T0-T4)
//!
//! If ANY tier fails, the engine is INVALID.
//!
//! ## Tiers
//! - T0: Budget Algebra
//! - T1: Equip Order
//! - T2: Solver Scenarios
//! - T3: Response Cache
//! - T4: Catalog Degraded Mode

use gearfit_core::primitives::PER_SKILL_CAP;
use gearfit_core::{
    EquipSlot, FilterOptions, GearError, Item, Loadout, Skill, SkillVector, Slot, SolverLimits,
    build_pools, build_stats, equip_order_feasible, minimum_spend, skill_budget_from_level, solve,
};

fn item(name: &str, slot: Slot, req: [i32; 5], bonus: [i32; 5]) -> Item {
    Item::new(name, slot, "Rare")
        .with_requirement(SkillVector::new(req))
        .with_bonus(SkillVector::new(bonus))
}

// =============================================================================
// TIER T0: BUDGET ALGEBRA
// =============================================================================

mod t0_budget_algebra {
    use super::*;

    /// T0.1: Level budget anchors.
    #[test]
    fn level_budget_anchors() {
        assert_eq!(skill_budget_from_level(1), 0);
        assert_eq!(skill_budget_from_level(101), 200);
        assert_eq!(skill_budget_from_level(200), 200);
    }

    /// T0.2: Empty set is free and feasible.
    #[test]
    fn empty_set_round_trip() {
        let stats = build_stats(&[], 150, PER_SKILL_CAP);
        assert_eq!(stats.final_spend, 0);
        assert_eq!(stats.remaining_sp, 150);
        assert!(stats.equip_order_ok);
    }

    /// T0.3: Weapons never pay for other items.
    #[test]
    fn weapon_bonus_ignored_in_spend() {
        let spear = item("spear", Slot::Weapon, [0; 5], [0, 0, 0, 0, 50]);
        let boots = item("boots", Slot::Boots, [0, 0, 0, 0, 50], [0; 5]);
        assert_eq!(minimum_spend(&[&spear, &boots]), 50);
    }
}

// =============================================================================
// TIER T1: EQUIP ORDER
// =============================================================================

mod t1_equip_order {
    use super::*;

    /// T1.1: One item within budget is wearable.
    #[test]
    fn single_item_within_budget() {
        let a = item("a", Slot::Helmet, [60, 0, 0, 0, 0], [0; 5]);
        assert!(equip_order_feasible(&[&a], 60, PER_SKILL_CAP));
    }

    /// T1.2: Two 100-strength items under 150 points are not.
    #[test]
    fn two_heavy_items_infeasible() {
        let a = item("a", Slot::Helmet, [100, 0, 0, 0, 0], [0; 5]);
        let b = item("b", Slot::Chestplate, [100, 0, 0, 0, 0], [0; 5]);
        assert!(!equip_order_feasible(&[&a, &b], 150, PER_SKILL_CAP));
    }

    /// T1.3: A requirement above the per-skill cap with no help is infeasible.
    #[test]
    fn requirement_above_cap() {
        let a = item("a", Slot::Helmet, [101, 0, 0, 0, 0], [0; 5]);
        assert!(!equip_order_feasible(&[&a], 200, PER_SKILL_CAP));
    }

    /// T1.4: Wearing the bonus item first makes the set feasible.
    #[test]
    fn bonus_first_order_found() {
        let giver = item("giver", Slot::Ring, [0; 5], [0, 30, 0, 0, 0]);
        let taker = item("taker", Slot::Boots, [0, 30, 0, 0, 0], [0; 5]);
        let stats = build_stats(&[&taker, &giver], 0, PER_SKILL_CAP);
        assert!(stats.equip_order_ok);
        let plan = stats.equip_plan.expect("plan");
        assert_eq!(plan.order, vec!["giver", "taker"]);
    }
}

// =============================================================================
// TIER T2: SOLVER SCENARIOS
// =============================================================================

mod t2_solver_scenarios {
    use super::*;

    fn decoys(level: u32) -> Vec<Item> {
        (0..100)
            .map(|i| {
                Item::new(format!("decoy{i:03}"), Slot::Helmet, "Common")
                    .with_level(level)
                    .with_bonus(SkillVector::single(Skill::Dexterity, -2))
            })
            .collect()
    }

    fn prize() -> Item {
        Item::new("prize", Slot::Helmet, "Rare")
            .with_level(1)
            .with_bonus(SkillVector::single(Skill::Strength, 40))
    }

    /// T2.1: The useful item past the pool cap is still chosen.
    #[test]
    fn decoy_regression() {
        let mut catalog = decoys(100);
        catalog.push(prize());
        let options = FilterOptions {
            must_give: Some(Skill::Strength),
            no_negative_net_bonus: true,
            ..FilterOptions::for_level(1)
        };
        assert_eq!(options.budget(), 0);

        let locked = Loadout::new();
        let pools = build_pools(&catalog, &options, &locked, &SolverLimits::default());
        let outcome = solve(&options, &locked, &pools, SolverLimits::default().node_budget);

        let best = outcome.best.expect("build");
        assert_eq!(best.item_names().get(&EquipSlot::Helmet), Some(&"prize"));
        assert!(!outcome.truncated);
    }

    /// T2.2: Eligible decoys are ranked below the prize before capping.
    #[test]
    fn ranking_survives_cap_with_eligible_decoys() {
        let mut catalog = decoys(1);
        catalog.push(prize());
        let options = FilterOptions::for_level(1);
        let locked = Loadout::new();
        let pools = build_pools(&catalog, &options, &locked, &SolverLimits::default());

        assert_eq!(pools.get(Slot::Helmet).len(), 80);
        assert_eq!(pools.get(Slot::Helmet)[0].name, "prize");

        let outcome = solve(&options, &locked, &pools, 10_000);
        let best = outcome.best.expect("build");
        assert_eq!(best.item_names().get(&EquipSlot::Helmet), Some(&"prize"));
    }

    /// T2.3: Locked items stay put and are not offered again.
    #[test]
    fn locked_items_respected() {
        let catalog = vec![
            item("ring_a", Slot::Ring, [0; 5], [2, 0, 0, 0, 0]),
            item("ring_b", Slot::Ring, [0; 5], [1, 0, 0, 0, 0]),
            item("ring_c", Slot::Ring, [0; 5], [0; 5]),
        ];
        let mut locked = Loadout::new();
        locked
            .insert(EquipSlot::Ring2, catalog[0].clone())
            .expect("lock");
        let options = FilterOptions::default();
        let pools = build_pools(&catalog, &options, &locked, &SolverLimits::default());
        assert_eq!(pools.get(Slot::Ring).len(), 2);

        let best = solve(&options, &locked, &pools, 1_000).best.expect("build");
        let names = best.item_names();
        assert_eq!(names.get(&EquipSlot::Ring2), Some(&"ring_a"));
        assert_eq!(names.get(&EquipSlot::Ring1), Some(&"ring_b"));
    }

    /// T2.4: An exhausted node budget is reported, never hidden.
    #[test]
    fn truncation_flagged() {
        let catalog: Vec<Item> = [Slot::Helmet, Slot::Chestplate, Slot::Boots]
            .into_iter()
            .flat_map(|slot| {
                (0..6).map(move |i| item(&format!("{slot}{i}"), slot, [i, 0, 0, 0, 0], [0; 5]))
            })
            .collect();
        let options = FilterOptions::default();
        let locked = Loadout::new();
        let pools = build_pools(&catalog, &options, &locked, &SolverLimits::default());
        let outcome = solve(&options, &locked, &pools, 2);
        assert!(outcome.truncated);
        assert_eq!(outcome.nodes_visited, 2);
    }

    /// T2.5: No feasible build is a plain negative result.
    #[test]
    fn infeasible_is_not_error() {
        let catalog = vec![item("heavy", Slot::Helmet, [50, 0, 0, 0, 0], [0; 5])];
        let options = FilterOptions::for_level(10);
        let locked = Loadout::new();
        let pools = build_pools(&catalog, &options, &locked, &SolverLimits::default());
        let outcome = solve(&options, &locked, &pools, 1_000);
        assert!(outcome.best.is_none());
        assert!(!outcome.truncated);
    }
}

// =============================================================================
// TIER T3: RESPONSE CACHE
// =============================================================================

mod t3_response_cache {
    use gearfit_core::{Fingerprint, ResponseCache};
    use serde_json::json;

    fn key(n: u32) -> Fingerprint {
        Fingerprint::of_value(&json!({ "request": n }))
    }

    /// T3.1: Overflow evicts the least recently used entry.
    #[test]
    fn evicts_lru_first() {
        let cache = ResponseCache::new(3);
        for n in 0..4 {
            cache.set(key(n), n);
        }
        assert!(!cache.contains(&key(0)));
        assert_eq!(cache.len(), 3);
    }

    /// T3.2: Reading refreshes recency.
    #[test]
    fn read_refreshes_recency() {
        let cache = ResponseCache::new(2);
        cache.set(key(1), 1);
        cache.set(key(2), 2);
        assert_eq!(cache.get(&key(1)), Some(1));
        cache.set(key(3), 3);
        assert_eq!(cache.get(&key(1)), Some(1));
        assert_eq!(cache.get(&key(2)), None);
    }

    /// T3.3: Re-setting refreshes recency too.
    #[test]
    fn set_refreshes_recency() {
        let cache = ResponseCache::new(2);
        cache.set(key(1), 1);
        cache.set(key(2), 2);
        cache.set(key(1), 10);
        cache.set(key(3), 3);
        assert_eq!(cache.get(&key(1)), Some(10));
        assert!(!cache.contains(&key(2)));
    }
}

// =============================================================================
// TIER T4: CATALOG DEGRADED MODE
// =============================================================================

mod t4_catalog_degraded_mode {
    use super::*;
    use gearfit_core::{
        CatalogLoader, DataSource, ItemSource, RedbSnapshotStore, SnapshotRecord, SnapshotStore,
    };

    const PAYLOAD: &[u8] = br#"{"items": [
        {"name": "Cap", "type": "armour", "armourType": "helmet", "tier": "Rare"},
        {"name": "Band", "type": "accessory", "accessoryType": "ring", "tier": "Set", "set": "Leaf"}
    ]}"#;

    struct Offline;

    impl ItemSource for Offline {
        fn fetch(&self) -> Result<Vec<u8>, GearError> {
            Err(GearError::Io("connection refused".to_string()))
        }
    }

    /// T4.1: Fetch failure with a durable snapshot serves stale data.
    #[test]
    fn stale_fallback_from_redb() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = RedbSnapshotStore::open(dir.path().join("catalog.redb")).expect("open");
        store
            .write(&SnapshotRecord::new(0, PAYLOAD.to_vec()))
            .expect("seed");

        let catalog = CatalogLoader::default()
            .load(false, &Offline, &store, 24 * 60 * 60_000)
            .expect("load");
        let state = catalog.data_state();
        assert!(state.degraded);
        assert_eq!(state.source, DataSource::CacheStaleFallback);
        assert!(state.warning.is_some());
        assert_eq!(catalog.len(), 2);
        assert!(catalog.set_names().contains("Leaf"));
    }

    /// T4.2: Fetch failure with no snapshot is DataUnavailable.
    #[test]
    fn no_snapshot_is_unavailable() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = RedbSnapshotStore::open(dir.path().join("empty.redb")).expect("open");
        let result = CatalogLoader::default().load(false, &Offline, &store, 0);
        assert!(matches!(result, Err(GearError::DataUnavailable(_))));
    }

    /// T4.3: Forced reload still falls back when the source is down.
    #[test]
    fn forced_reload_falls_back() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = RedbSnapshotStore::open(dir.path().join("catalog.redb")).expect("open");
        store
            .write(&SnapshotRecord::new(1_000, PAYLOAD.to_vec()))
            .expect("seed");
        let catalog = CatalogLoader::default()
            .load(true, &Offline, &store, 2_000)
            .expect("load");
        assert_eq!(catalog.data_state().source, DataSource::CacheStaleFallback);
    }
}
