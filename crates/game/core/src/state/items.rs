//! Owned items and active effects.
//!
//! Feats, talents and force powers are materialized as items too so that the
//! derived action catalog can be a pure projection of what the actor owns.

use super::{ItemId, normalize_key};
use crate::stats::ModifierSpec;

/// Category of an owned item.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, strum::Display, strum::EnumString,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ItemType {
    Weapon,
    Armor,
    Equipment,
    Feat,
    Talent,
    ForcePower,
}

impl ItemType {
    /// Physical gear: contributes weight and, when equipped, modifiers.
    pub const fn is_gear(self) -> bool {
        matches!(self, ItemType::Weapon | ItemType::Armor | ItemType::Equipment)
    }
}

/// Action economy slot used to group the action catalog.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, strum::Display, strum::EnumString,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ActionCost {
    Standard,
    Move,
    Swift,
    FullRound,
    Reaction,
    Free,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case")]
pub enum WeaponRange {
    #[default]
    Melee,
    Ranged,
}

/// Attack data carried by weapon items.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct WeaponProfile {
    pub range: WeaponRange,
    /// Damage dice expression, e.g. `"3d6"`.
    pub damage: String,
    pub attack_bonus: i32,
    pub damage_bonus: i32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OwnedItem {
    pub id: ItemId,
    pub item_type: ItemType,
    pub name: String,
    /// Normalized name, used for type+name deduplication.
    pub key: String,
    /// Grouping label: feat type, talent tree or power descriptor.
    #[cfg_attr(feature = "serde", serde(default))]
    pub group: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub equipped: bool,
    /// Weight of a single unit in kilograms.
    #[cfg_attr(feature = "serde", serde(default))]
    pub weight: u32,
    #[cfg_attr(feature = "serde", serde(default = "default_quantity"))]
    pub quantity: u32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub weapon: Option<WeaponProfile>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub action: Option<ActionCost>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub modifiers: Vec<ModifierSpec>,
}

#[cfg(feature = "serde")]
fn default_quantity() -> u32 {
    1
}

impl OwnedItem {
    /// A bare record: type and name only. The id is assigned on insertion.
    pub fn bare(item_type: ItemType, name: &str) -> Self {
        Self {
            id: ItemId(0),
            item_type,
            name: name.trim().to_string(),
            key: normalize_key(name),
            group: None,
            equipped: false,
            weight: 0,
            quantity: 1,
            weapon: None,
            action: None,
            modifiers: Vec::new(),
        }
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn with_action(mut self, action: ActionCost) -> Self {
        self.action = Some(action);
        self
    }

    pub fn with_weight(mut self, weight: u32) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_weapon(mut self, weapon: WeaponProfile) -> Self {
        self.weapon = Some(weapon);
        self
    }

    pub fn with_modifiers(mut self, modifiers: Vec<ModifierSpec>) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn equipped(mut self) -> Self {
        self.equipped = true;
        self
    }

    pub fn total_weight(&self) -> u32 {
        self.weight.saturating_mul(self.quantity)
    }

    pub fn matches(&self, item_type: ItemType, name: &str) -> bool {
        self.item_type == item_type && self.key == normalize_key(name)
    }
}

/// A temporary effect (stim, force buff, environmental penalty).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ActiveEffect {
    pub label: String,
    /// Item the effect was granted by; the effect lapses once the item is gone.
    pub origin: Option<ItemId>,
    pub disabled: bool,
    pub modifiers: Vec<ModifierSpec>,
}
