//! # Solver Benchmarks
//!
//! Performance benchmarks for the equip-order search and the build solver.
//!
//! Run with: `cargo bench -p gearfit-core`

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use gearfit_core::primitives::PER_SKILL_CAP;
use gearfit_core::{
    EquipSlot, FilterOptions, Item, Loadout, SkillVector, Slot, SolverLimits, build_pools,
    equip_plan, solve,
};
use std::hint::black_box;

const SLOTS: [Slot; 8] = [
    Slot::Helmet,
    Slot::Chestplate,
    Slot::Leggings,
    Slot::Boots,
    Slot::Necklace,
    Slot::Bracelet,
    Slot::Ring,
    Slot::Weapon,
];

/// Deterministic pseudo-random catalog with `per_slot` items in every slot.
fn synthetic_catalog(per_slot: usize) -> Vec<Item> {
    let mut seed: u32 = 0x9e37_79b9;
    let mut next = move |m: u32| {
        seed ^= seed << 13;
        seed ^= seed >> 17;
        seed ^= seed << 5;
        (seed % m) as i32
    };

    let mut items = Vec::new();
    for slot in SLOTS {
        for i in 0..per_slot {
            let requirement = SkillVector::new([next(60), next(60), next(40), next(40), next(30)]);
            let bonus = SkillVector::new([
                next(12) - 3,
                next(12) - 3,
                next(10) - 3,
                next(10) - 3,
                next(8) - 2,
            ]);
            items.push(
                Item::new(format!("{slot}-{i}"), slot, "Rare")
                    .with_level(next(100) as u32 + 1)
                    .with_requirement(requirement)
                    .with_bonus(bonus),
            );
        }
    }
    items
}

// =============================================================================
// BENCHMARKS
// =============================================================================

fn bench_equip_plan(c: &mut Criterion) {
    let mut group = c.benchmark_group("equip_plan");
    let catalog = synthetic_catalog(2);

    for size in [4usize, 8, 12].iter() {
        let items: Vec<&Item> = catalog.iter().take(*size).collect();
        group.bench_with_input(BenchmarkId::from_parameter(size), &items, |b, items| {
            b.iter(|| black_box(equip_plan(items, 200, PER_SKILL_CAP)));
        });
    }

    group.finish();
}

fn bench_solve(c: &mut Criterion) {
    let mut group = c.benchmark_group("solve");
    group.sample_size(20);

    for per_slot in [10usize, 40, 120].iter() {
        let catalog = synthetic_catalog(*per_slot);
        let options = FilterOptions::default();
        let locked = Loadout::new();
        let limits = SolverLimits::default();
        let pools = build_pools(&catalog, &options, &locked, &limits);

        group.bench_with_input(BenchmarkId::from_parameter(per_slot), &pools, |b, pools| {
            b.iter(|| black_box(solve(&options, &locked, pools, limits.node_budget)));
        });
    }

    group.finish();
}

fn bench_solve_locked(c: &mut Criterion) {
    let catalog = synthetic_catalog(60);
    let options = FilterOptions::default();
    let mut locked = Loadout::new();
    for slot in [EquipSlot::Helmet, EquipSlot::Chestplate, EquipSlot::Weapon] {
        if let Some(item) = catalog.iter().find(|i| i.slot == slot.item_slot()) {
            let _ = locked.insert(slot, item.clone());
        }
    }
    let limits = SolverLimits::default();
    let pools = build_pools(&catalog, &options, &locked, &limits);

    c.bench_function("solve_three_locked", |b| {
        b.iter(|| black_box(solve(&options, &locked, &pools, limits.node_budget)));
    });
}

criterion_group!(benches, bench_equip_plan, bench_solve, bench_solve_locked);
criterion_main!(benches);
