//! # Payload Normalization
//!
//! Turns a raw JSON catalog payload into [`Item`] values.
//!
//! Accepted shapes:
//! - `{"items": [...]}`
//! - a top-level array of item bodies
//! - an object mapping item name to item body
//!
//! Fields are read tolerantly. Items whose slot cannot be derived, or that
//! carry an unknown class requirement, are dropped and counted.

use crate::{CharacterClass, GearError, Item, Skill, SkillVector, Slot};
use serde_json::{Map, Value};

/// Items parsed from a payload plus the number of entries dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Normalized {
    pub items: Vec<Item>,
    pub dropped: usize,
}

/// Parse and normalize a raw payload.
pub fn normalize_payload(bytes: &[u8]) -> Result<Normalized, GearError> {
    let root: Value =
        serde_json::from_slice(bytes).map_err(|e| GearError::InvalidPayload(e.to_string()))?;

    let entries: Vec<(Option<&str>, &Value)> = match &root {
        Value::Array(items) => items.iter().map(|v| (None, v)).collect(),
        Value::Object(map) => match map.get("items") {
            Some(Value::Array(items)) => items.iter().map(|v| (None, v)).collect(),
            Some(Value::Object(named)) => {
                named.iter().map(|(k, v)| (Some(k.as_str()), v)).collect()
            }
            _ => map.iter().map(|(k, v)| (Some(k.as_str()), v)).collect(),
        },
        _ => {
            return Err(GearError::InvalidPayload(
                "expected an array or object of items".to_string(),
            ));
        }
    };

    let mut out = Normalized::default();
    for (key, body) in entries {
        match body.as_object().and_then(|obj| normalize_item(key, obj)) {
            Some(item) => out.items.push(item),
            None => out.dropped += 1,
        }
    }
    Ok(out)
}

// =============================================================================
// FIELD ACCESS
// =============================================================================

fn text<'v>(obj: &'v Map<String, Value>, keys: &[&str]) -> Option<&'v str> {
    keys.iter()
        .find_map(|k| obj.get(*k).and_then(Value::as_str))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Integer value, accepting `{min, max, raw}` identification objects.
fn number(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::Object(obj) => obj.get("raw").and_then(number),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn int(obj: &Map<String, Value>, keys: &[&str]) -> Option<i32> {
    keys.iter()
        .find_map(|k| obj.get(*k).and_then(number))
        .map(|n| n.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32)
}

fn skill_keys(skill: Skill) -> &'static [&'static str] {
    match skill {
        Skill::Strength => &["strength", "str"],
        Skill::Dexterity => &["dexterity", "dex"],
        Skill::Intelligence => &["intelligence", "int"],
        Skill::Defence => &["defence", "defense", "def"],
        Skill::Agility => &["agility", "agi"],
    }
}

fn bonus_keys(skill: Skill) -> &'static [&'static str] {
    match skill {
        Skill::Strength => &["rawStrength", "strengthPoints"],
        Skill::Dexterity => &["rawDexterity", "dexterityPoints"],
        Skill::Intelligence => &["rawIntelligence", "intelligencePoints"],
        Skill::Defence => &["rawDefence", "rawDefense", "defencePoints", "defensePoints"],
        Skill::Agility => &["rawAgility", "agilityPoints"],
    }
}

fn vector(
    obj: Option<&Map<String, Value>>,
    keys: fn(Skill) -> &'static [&'static str],
) -> SkillVector {
    let mut out = SkillVector::ZERO;
    if let Some(obj) = obj {
        for skill in Skill::ALL {
            out.set(skill, int(obj, keys(skill)).unwrap_or(0));
        }
    }
    out
}

// =============================================================================
// SLOT DERIVATION
// =============================================================================

fn slot_named(name: &str) -> Option<Slot> {
    match name.to_ascii_lowercase().as_str() {
        "helmet" | "hat" => Some(Slot::Helmet),
        "chestplate" | "chest" => Some(Slot::Chestplate),
        "leggings" | "legs" => Some(Slot::Leggings),
        "boots" => Some(Slot::Boots),
        "necklace" => Some(Slot::Necklace),
        "bracelet" => Some(Slot::Bracelet),
        "ring" => Some(Slot::Ring),
        "weapon" => Some(Slot::Weapon),
        "tome" => Some(Slot::Tome),
        _ => None,
    }
}

/// Explicit tags first, then a substring match for tomes.
fn derive_slot(obj: &Map<String, Value>) -> Option<Slot> {
    if let Some(slot) = text(obj, &["armourType", "armorType"]).and_then(slot_named) {
        return Some(slot);
    }
    if let Some(slot) = text(obj, &["accessoryType"]).and_then(slot_named) {
        return Some(slot);
    }
    if text(obj, &["weaponType"]).is_some() {
        return Some(Slot::Weapon);
    }
    if let Some(slot) = text(obj, &["type", "slot"]).and_then(slot_named) {
        return Some(slot);
    }
    let tagged_tome = ["type", "subType", "subtype", "tomeType"]
        .iter()
        .filter_map(|k| obj.get(*k).and_then(Value::as_str))
        .any(|s| s.to_ascii_lowercase().contains("tome"));
    tagged_tome.then_some(Slot::Tome)
}

// =============================================================================
// ITEM
// =============================================================================

fn normalize_item(key: Option<&str>, obj: &Map<String, Value>) -> Option<Item> {
    let name = text(obj, &["name", "displayName", "internalName"]).or(key)?;
    let slot = derive_slot(obj)?;
    let rarity = text(obj, &["rarity", "tier"]).unwrap_or("common");

    let requirements = obj.get("requirements").and_then(Value::as_object);
    let level = requirements
        .and_then(|r| int(r, &["level"]))
        .or_else(|| int(obj, &["level", "lvl"]))
        .unwrap_or(0)
        .max(0) as u32;

    let class_text = requirements
        .and_then(|r| text(r, &["classRequirement", "class"]))
        .or_else(|| text(obj, &["classRequirement", "classReq"]));
    let class_req = match class_text {
        Some(raw) => Some(raw.parse::<CharacterClass>().ok()?),
        None => None,
    };

    let identifications = obj.get("identifications").and_then(Value::as_object);
    let identified = obj
        .get("identified")
        .and_then(Value::as_bool)
        .unwrap_or(true)
        && !obj.get("crafted").and_then(Value::as_bool).unwrap_or(false);

    let mut item = Item::new(name, slot, rarity)
        .with_level(level)
        .with_requirement(vector(requirements, skill_keys))
        .with_bonus(vector(identifications, bonus_keys))
        .with_identified(identified);
    if let Some(class) = class_req {
        item = item.with_class(class);
    }
    if slot == Slot::Weapon {
        if let Some(weapon_type) = text(obj, &["weaponType", "subType", "subtype"]) {
            item = item.with_weapon_type(weapon_type);
        }
    }
    if let Some(set_name) = text(obj, &["setName", "set"]) {
        item = item.with_set(set_name);
    }
    Some(item)
}
