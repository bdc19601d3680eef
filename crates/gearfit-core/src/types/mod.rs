//! # Core Type Definitions
//!
//! This module contains all core types for the gearfit engine:
//! - Skill algebra (`Skill`, `SkillVector`)
//! - Equipment placement (`Slot`, `EquipSlot`)
//! - Character classes (`CharacterClass`)
//! - Catalog items (`Item`)
//! - Error types (`GearError`)
//!
//! ## Determinism Guarantees
//!
//! All types in this module:
//! - Use integer arithmetic only (no floating-point)
//! - Implement `Ord` where they key a `BTreeMap`/`BTreeSet`
//! - Use saturating arithmetic for sums so hostile catalog values cannot overflow

use crate::primitives::SKILL_COUNT;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// =============================================================================
// SKILLS
// =============================================================================

/// One of the five allocatable skills, in vector order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Skill {
    Strength,
    Dexterity,
    Intelligence,
    Defence,
    Agility,
}

impl Skill {
    /// All skills in vector order.
    pub const ALL: [Skill; SKILL_COUNT] = [
        Skill::Strength,
        Skill::Dexterity,
        Skill::Intelligence,
        Skill::Defence,
        Skill::Agility,
    ];

    /// Position of this skill in a `SkillVector`.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Skill::Strength => 0,
            Skill::Dexterity => 1,
            Skill::Intelligence => 2,
            Skill::Defence => 3,
            Skill::Agility => 4,
        }
    }

    /// Lowercase skill name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Skill::Strength => "strength",
            Skill::Dexterity => "dexterity",
            Skill::Intelligence => "intelligence",
            Skill::Defence => "defence",
            Skill::Agility => "agility",
        }
    }
}

impl fmt::Display for Skill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Skill {
    type Err = GearError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "str" | "strength" => Ok(Skill::Strength),
            "dex" | "dexterity" => Ok(Skill::Dexterity),
            "int" | "intelligence" => Ok(Skill::Intelligence),
            "def" | "defence" | "defense" => Ok(Skill::Defence),
            "agi" | "agility" => Ok(Skill::Agility),
            other => Err(GearError::InvalidRequest(format!("unknown skill '{}'", other))),
        }
    }
}

/// A fixed-arity vector over the five skills.
///
/// The array length is part of the type, so the arity cannot drift.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct SkillVector(pub [i32; SKILL_COUNT]);

impl SkillVector {
    /// The zero vector.
    pub const ZERO: SkillVector = SkillVector([0; SKILL_COUNT]);

    #[must_use]
    pub const fn new(values: [i32; SKILL_COUNT]) -> Self {
        Self(values)
    }

    /// A vector with `value` in one skill and zero elsewhere.
    #[must_use]
    pub fn single(skill: Skill, value: i32) -> Self {
        let mut v = Self::ZERO;
        v.0[skill.index()] = value;
        v
    }

    #[must_use]
    pub const fn get(&self, skill: Skill) -> i32 {
        self.0[skill.index()]
    }

    pub fn set(&mut self, skill: Skill, value: i32) {
        self.0[skill.index()] = value;
    }

    /// Componentwise saturating sum.
    #[must_use]
    pub fn plus(&self, other: &SkillVector) -> SkillVector {
        let mut out = *self;
        for (a, b) in out.0.iter_mut().zip(other.0) {
            *a = a.saturating_add(b);
        }
        out
    }

    /// Componentwise maximum.
    #[must_use]
    pub fn componentwise_max(&self, other: &SkillVector) -> SkillVector {
        let mut out = *self;
        for (a, b) in out.0.iter_mut().zip(other.0) {
            *a = (*a).max(b);
        }
        out
    }

    /// Componentwise `max(0, self - other)`.
    #[must_use]
    pub fn shortfall(&self, other: &SkillVector) -> SkillVector {
        let mut out = *self;
        for (a, b) in out.0.iter_mut().zip(other.0) {
            *a = a.saturating_sub(b).max(0);
        }
        out
    }

    /// Componentwise `min(self, cap)`.
    #[must_use]
    pub fn capped(&self, cap: i32) -> SkillVector {
        let mut out = *self;
        for a in &mut out.0 {
            *a = (*a).min(cap);
        }
        out
    }

    /// Componentwise `max(0, self)`.
    #[must_use]
    pub fn positive_part(&self) -> SkillVector {
        let mut out = *self;
        for a in &mut out.0 {
            *a = (*a).max(0);
        }
        out
    }

    /// Sum of all components.
    #[must_use]
    pub fn total(&self) -> i32 {
        self.0.iter().fold(0i32, |acc, v| acc.saturating_add(*v))
    }

    /// Magnitude of the negative components, summed.
    #[must_use]
    pub fn negative_sum(&self) -> i32 {
        self.0
            .iter()
            .filter(|v| **v < 0)
            .fold(0i32, |acc, v| acc.saturating_add(v.saturating_neg()))
    }

    #[must_use]
    pub fn has_negative(&self) -> bool {
        self.0.iter().any(|v| *v < 0)
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|v| *v == 0)
    }

    /// Iterate `(skill, value)` pairs in vector order.
    pub fn iter(&self) -> impl Iterator<Item = (Skill, i32)> + '_ {
        Skill::ALL.iter().map(move |s| (*s, self.get(*s)))
    }
}

impl std::ops::Add for SkillVector {
    type Output = SkillVector;

    fn add(self, rhs: SkillVector) -> SkillVector {
        self.plus(&rhs)
    }
}

impl std::iter::Sum for SkillVector {
    fn sum<I: Iterator<Item = SkillVector>>(iter: I) -> SkillVector {
        iter.fold(SkillVector::ZERO, |acc, v| acc + v)
    }
}

// =============================================================================
// SLOTS
// =============================================================================

/// The kind of equipment an item is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Slot {
    Helmet,
    Chestplate,
    Leggings,
    Boots,
    Necklace,
    Bracelet,
    Ring,
    Weapon,
    Tome,
}

impl Slot {
    pub const ALL: [Slot; 9] = [
        Slot::Helmet,
        Slot::Chestplate,
        Slot::Leggings,
        Slot::Boots,
        Slot::Necklace,
        Slot::Bracelet,
        Slot::Ring,
        Slot::Weapon,
        Slot::Tome,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Slot::Helmet => "helmet",
            Slot::Chestplate => "chestplate",
            Slot::Leggings => "leggings",
            Slot::Boots => "boots",
            Slot::Necklace => "necklace",
            Slot::Bracelet => "bracelet",
            Slot::Ring => "ring",
            Slot::Weapon => "weapon",
            Slot::Tome => "tome",
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Slot {
    type Err = GearError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Slot::ALL
            .into_iter()
            .find(|slot| slot.name() == lower)
            .ok_or_else(|| GearError::InvalidRequest(format!("unknown slot '{}'", s)))
    }
}

/// A position in a build. Rings occupy two positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EquipSlot {
    Helmet,
    Chestplate,
    Leggings,
    Boots,
    Ring1,
    Ring2,
    Bracelet,
    Necklace,
    Weapon,
}

impl EquipSlot {
    pub const ALL: [EquipSlot; 9] = [
        EquipSlot::Helmet,
        EquipSlot::Chestplate,
        EquipSlot::Leggings,
        EquipSlot::Boots,
        EquipSlot::Ring1,
        EquipSlot::Ring2,
        EquipSlot::Bracelet,
        EquipSlot::Necklace,
        EquipSlot::Weapon,
    ];

    /// The item slot that may occupy this position.
    #[must_use]
    pub const fn item_slot(self) -> Slot {
        match self {
            EquipSlot::Helmet => Slot::Helmet,
            EquipSlot::Chestplate => Slot::Chestplate,
            EquipSlot::Leggings => Slot::Leggings,
            EquipSlot::Boots => Slot::Boots,
            EquipSlot::Ring1 | EquipSlot::Ring2 => Slot::Ring,
            EquipSlot::Bracelet => Slot::Bracelet,
            EquipSlot::Necklace => Slot::Necklace,
            EquipSlot::Weapon => Slot::Weapon,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            EquipSlot::Helmet => "helmet",
            EquipSlot::Chestplate => "chestplate",
            EquipSlot::Leggings => "leggings",
            EquipSlot::Boots => "boots",
            EquipSlot::Ring1 => "ring1",
            EquipSlot::Ring2 => "ring2",
            EquipSlot::Bracelet => "bracelet",
            EquipSlot::Necklace => "necklace",
            EquipSlot::Weapon => "weapon",
        }
    }

    #[must_use]
    pub const fn is_ring(self) -> bool {
        matches!(self, EquipSlot::Ring1 | EquipSlot::Ring2)
    }
}

impl fmt::Display for EquipSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EquipSlot {
    type Err = GearError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        if lower == "ring" {
            return Ok(EquipSlot::Ring1);
        }
        EquipSlot::ALL
            .into_iter()
            .find(|slot| slot.name() == lower)
            .ok_or_else(|| GearError::InvalidRequest(format!("unknown equip slot '{}'", s)))
    }
}

// =============================================================================
// CLASSES
// =============================================================================

/// Playable character class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CharacterClass {
    Warrior,
    Mage,
    Archer,
    Assassin,
    Shaman,
}

impl CharacterClass {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            CharacterClass::Warrior => "warrior",
            CharacterClass::Mage => "mage",
            CharacterClass::Archer => "archer",
            CharacterClass::Assassin => "assassin",
            CharacterClass::Shaman => "shaman",
        }
    }

    /// The canonical weapon type wielded by this class.
    #[must_use]
    pub const fn weapon_type(self) -> &'static str {
        match self {
            CharacterClass::Warrior => "spear",
            CharacterClass::Mage => "wand",
            CharacterClass::Archer => "bow",
            CharacterClass::Assassin => "dagger",
            CharacterClass::Shaman => "relik",
        }
    }

    /// Class that wields the given weapon type, if any.
    #[must_use]
    pub fn for_weapon_type(weapon_type: &str) -> Option<CharacterClass> {
        let lower = weapon_type.trim().to_ascii_lowercase();
        [
            CharacterClass::Warrior,
            CharacterClass::Mage,
            CharacterClass::Archer,
            CharacterClass::Assassin,
            CharacterClass::Shaman,
        ]
        .into_iter()
        .find(|c| c.weapon_type() == lower)
    }
}

impl fmt::Display for CharacterClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CharacterClass {
    type Err = GearError;

    /// Accepts the base class names and their reskin aliases.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "warrior" | "knight" => Ok(CharacterClass::Warrior),
            "mage" | "darkwizard" | "dark wizard" => Ok(CharacterClass::Mage),
            "archer" | "hunter" => Ok(CharacterClass::Archer),
            "assassin" | "ninja" => Ok(CharacterClass::Assassin),
            "shaman" | "skyseer" => Ok(CharacterClass::Shaman),
            other => Err(GearError::InvalidRequest(format!("unknown class '{}'", other))),
        }
    }
}

// =============================================================================
// ITEM
// =============================================================================

/// An equippable item from the catalog.
///
/// Items are immutable values identified by `name`. Construct them with
/// [`Item::new`] and the `with_*` builders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Unique identity key.
    pub name: String,
    pub slot: Slot,
    /// Rarity as published by the catalog (open set).
    pub rarity: String,
    pub level_req: u32,
    /// Minimum skill values needed to wear the item.
    pub requirement: SkillVector,
    /// Skill bonus as shown to the user. May be negative.
    pub display_bonus: SkillVector,
    pub class_req: Option<CharacterClass>,
    /// Lowercase weapon type; only meaningful for weapons.
    pub weapon_type: Option<String>,
    /// False for crafted or unidentified items.
    pub identified: bool,
    pub set_name: Option<String>,
}

impl Item {
    /// Create an identified item with no requirements or bonuses.
    #[must_use]
    pub fn new(name: impl Into<String>, slot: Slot, rarity: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slot,
            rarity: rarity.into(),
            level_req: 0,
            requirement: SkillVector::ZERO,
            display_bonus: SkillVector::ZERO,
            class_req: None,
            weapon_type: None,
            identified: true,
            set_name: None,
        }
    }

    #[must_use]
    pub fn with_level(mut self, level: u32) -> Self {
        self.level_req = level;
        self
    }

    #[must_use]
    pub fn with_requirement(mut self, requirement: SkillVector) -> Self {
        self.requirement = requirement;
        self
    }

    #[must_use]
    pub fn with_bonus(mut self, bonus: SkillVector) -> Self {
        self.display_bonus = bonus;
        self
    }

    #[must_use]
    pub fn with_class(mut self, class: CharacterClass) -> Self {
        self.class_req = Some(class);
        self
    }

    #[must_use]
    pub fn with_weapon_type(mut self, weapon_type: impl Into<String>) -> Self {
        self.weapon_type = Some(weapon_type.into().to_ascii_lowercase());
        self
    }

    #[must_use]
    pub fn with_identified(mut self, identified: bool) -> Self {
        self.identified = identified;
        self
    }

    #[must_use]
    pub fn with_set(mut self, set_name: impl Into<String>) -> Self {
        self.set_name = Some(set_name.into());
        self
    }

    /// Bonus used in every feasibility and spend computation.
    ///
    /// Weapon skill bonuses never help wear other items, so weapons
    /// contribute the zero vector regardless of their displayed bonus.
    #[must_use]
    pub fn effective_bonus(&self) -> SkillVector {
        if self.slot == Slot::Weapon {
            SkillVector::ZERO
        } else {
            self.display_bonus
        }
    }

    #[must_use]
    pub fn is_weapon(&self) -> bool {
        self.slot == Slot::Weapon
    }

    #[must_use]
    pub fn is_mythic(&self) -> bool {
        self.rarity.eq_ignore_ascii_case("mythic")
    }

    #[must_use]
    pub fn is_set(&self) -> bool {
        self.rarity.eq_ignore_ascii_case("set")
    }

    /// Points this item costs on its own once its own bonus is applied.
    #[must_use]
    pub fn own_spend(&self) -> i32 {
        self.requirement
            .shortfall(&self.effective_bonus().positive_part())
            .total()
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the gearfit engine.
///
/// Rejections and infeasibility are data, not errors. This enum covers
/// only conditions a caller must handle out of band.
#[derive(Debug, Error)]
pub enum GearError {
    /// No catalog data could be obtained: the live fetch failed and no
    /// durable snapshot exists.
    #[error("Catalog data unavailable: {0}")]
    DataUnavailable(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(String),

    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The raw catalog payload could not be interpreted.
    #[error("Invalid catalog payload: {0}")]
    InvalidPayload(String),

    /// A named item does not exist in the catalog.
    #[error("Unknown item: {0}")]
    UnknownItem(String),

    /// A request was malformed (bad slot, bad class, misplaced lock).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

// =============================================================================
// TESTS
// =============================================================================
