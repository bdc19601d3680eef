//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.
//!
//! Every command loads the catalog through the engine first (reusing a fresh
//! snapshot when there is one) and prints either a text report or, in JSON
//! mode, the tagged engine response.

use gearfit_core::{
    BuildRequest, BuildStats, DataState, Engine, ExplainRequest, GearError, RecommendRequest,
    SkillVector,
};

// =============================================================================
// SHARED OUTPUT
// =============================================================================

fn print_json<T: serde::Serialize>(value: &T) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

fn print_data_state(state: &DataState, cached: bool) {
    if let Some(warning) = &state.warning {
        println!("WARNING: {}", warning);
    }
    if cached {
        println!("Source:   {} (cached response)", state.source);
    } else {
        println!("Source:   {}", state.source);
    }
}

fn format_vector(v: &SkillVector) -> String {
    v.iter()
        .map(|(skill, value)| format!("{}={}", skill.name(), value))
        .collect::<Vec<_>>()
        .join(" ")
}

fn print_stats(stats: &BuildStats) {
    println!("Budget:       {}", stats.budget);
    println!("Final spend:  {}", stats.final_spend);
    println!("Remaining SP: {}", stats.remaining_sp);
    println!(
        "Equip order:  {}",
        if stats.equip_order_ok { "ok" } else { "infeasible" }
    );
    if let Some(plan) = &stats.equip_plan
        && !plan.order.is_empty()
    {
        println!("  Order: {}", plan.order.join(" -> "));
    }
    println!("Required:     {}", format_vector(&stats.required_allocation));
    println!("Net bonus:    {}", format_vector(&stats.net_effective_bonus));
    if stats.negative_tradeoff > 0 {
        println!("Tradeoff:     {}", stats.negative_tradeoff);
    }
    if let Some(presets) = &stats.allocation_presets {
        println!();
        println!("Allocation presets:");
        for preset in presets {
            println!(
                "  {:<24} {}",
                preset.name,
                format_vector(&preset.allocation)
            );
        }
    }
}

// =============================================================================
// CATALOG COMMAND
// =============================================================================

/// Load the catalog and summarize it.
pub fn cmd_catalog(engine: &Engine, json_mode: bool, force: bool) -> Result<(), GearError> {
    let catalog = engine.reload(force)?;

    if json_mode {
        let slot_counts: std::collections::BTreeMap<String, usize> = catalog
            .slot_counts()
            .into_iter()
            .map(|(slot, count)| (slot.to_string(), count))
            .collect();
        let output = serde_json::json!({
            "item_count": catalog.len(),
            "dropped": catalog.dropped(),
            "slots": slot_counts,
            "rarities": catalog.rarities(),
            "set_names": catalog.set_names(),
            "data_state": catalog.data_state(),
        });
        print_json(&output);
        return Ok(());
    }

    println!("gearfit Catalog");
    println!("===============");
    print_data_state(catalog.data_state(), false);
    println!();
    println!("Items:    {}", catalog.len());
    if catalog.dropped() > 0 {
        println!("Dropped:  {} (malformed or duplicate)", catalog.dropped());
    }
    println!();
    for (slot, count) in catalog.slot_counts() {
        println!("  {:<12} {}", slot.name(), count);
    }
    if !catalog.rarities().is_empty() {
        println!();
        println!(
            "Rarities: {}",
            catalog
                .rarities()
                .iter()
                .cloned()
                .collect::<Vec<_>>()
                .join(", ")
        );
    }
    if !catalog.set_names().is_empty() {
        println!("Sets:     {}", catalog.set_names().len());
    }

    Ok(())
}

// =============================================================================
// CHECK COMMAND
// =============================================================================

/// Stats for the selected items.
pub fn cmd_check(
    engine: &Engine,
    json_mode: bool,
    request: &BuildRequest,
) -> Result<(), GearError> {
    engine.reload(false)?;
    let tagged = engine.check(request)?;

    if json_mode {
        print_json(&tagged);
        return Ok(());
    }

    println!("Build Check");
    println!("===========");
    print_data_state(&tagged.data_state, tagged.cached);
    println!();
    for (slot, name) in &request.selections {
        println!("  {:<12} {}", slot.name(), name);
    }
    for tome in &request.tomes {
        println!("  {:<12} {}", "tome", tome);
    }
    println!();
    print_stats(&tagged.result);

    Ok(())
}

// =============================================================================
// EXPLAIN COMMAND
// =============================================================================

/// Per-item filter verdicts.
pub fn cmd_explain(
    engine: &Engine,
    json_mode: bool,
    request: &ExplainRequest,
) -> Result<(), GearError> {
    engine.reload(false)?;
    let tagged = engine.explain(request)?;

    if json_mode {
        print_json(&tagged);
        return Ok(());
    }

    println!("Explain");
    println!("=======");
    print_data_state(&tagged.data_state, tagged.cached);
    println!();
    for verdict in &tagged.result.verdicts {
        match &verdict.rejection {
            None => println!("  [ok]  {} ({})", verdict.name, verdict.slot),
            Some(reason) => println!("  [no]  {} ({}): {}", verdict.name, verdict.slot, reason),
        }
    }
    println!();
    print_stats(&tagged.result.stats);

    Ok(())
}

// =============================================================================
// RECOMMEND COMMAND
// =============================================================================

/// Ranked candidates for one slot.
pub fn cmd_recommend(
    engine: &Engine,
    json_mode: bool,
    request: &RecommendRequest,
) -> Result<(), GearError> {
    engine.reload(false)?;
    let tagged = engine.recommend(request)?;

    if json_mode {
        print_json(&tagged);
        return Ok(());
    }

    let report = &tagged.result;
    println!("Recommendations for {}", report.slot);
    println!("====================");
    print_data_state(&tagged.data_state, tagged.cached);
    println!(
        "Baseline remaining SP: {} ({} candidates considered)",
        report.baseline.remaining_sp, report.considered
    );
    println!();

    if report.candidates.is_empty() {
        println!("No candidate fits the current build.");
        return Ok(());
    }

    println!("  {:<32} {:>5} {:>9} {:>7}", "Item", "Level", "Remaining", "Gain");
    for rec in &report.candidates {
        println!(
            "  {:<32} {:>5} {:>9} {:>+7}",
            rec.item.name, rec.item.level_req, rec.stats.remaining_sp, rec.improvement
        );
    }

    Ok(())
}

// =============================================================================
// SOLVE COMMAND
// =============================================================================

/// Search for the best build.
pub fn cmd_solve(
    engine: &Engine,
    json_mode: bool,
    request: &BuildRequest,
) -> Result<(), GearError> {
    engine.reload(false)?;
    let tagged = engine.solve(request)?;

    if json_mode {
        print_json(&tagged);
        return Ok(());
    }

    let outcome = &tagged.result;
    println!("Solve");
    println!("=====");
    print_data_state(&tagged.data_state, tagged.cached);
    println!("Nodes visited: {}", outcome.nodes_visited);
    if outcome.truncated {
        println!("NOTE: node budget exhausted; the result may not be optimal");
    }
    println!();

    let Some(best) = &outcome.best else {
        println!("No feasible build found.");
        return Ok(());
    };

    for (slot, item) in &best.slots {
        let locked = request.selections.contains_key(slot);
        println!(
            "  {:<12} {}{}",
            slot.name(),
            item.name,
            if locked { " (locked)" } else { "" }
        );
    }
    for tome in &best.tomes {
        println!("  {:<12} {}", "tome", tome.name);
    }
    println!();
    print_stats(&best.stats);

    Ok(())
}
