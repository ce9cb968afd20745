use std::collections::BTreeMap;

use crate::state::{Ability, ActionCost, Size};
use crate::stats::ModifierSpec;

/// Read-only rule tables: species, backgrounds, classes, feats, talents and
/// skills.
///
/// Every lookup accepts either the table id or the display name, compared
/// through [`crate::state::normalize_key`]. Implementations are injected into
/// the engine and never mutated by it.
pub trait RuleTables: Send + Sync {
    fn species(&self, id: &str) -> Option<&SpeciesDef>;
    fn background(&self, id: &str) -> Option<&BackgroundDef>;
    fn class(&self, id: &str) -> Option<&ClassDef>;
    fn feat(&self, name: &str) -> Option<&FeatDef>;
    fn talent(&self, name: &str) -> Option<&TalentDef>;
    fn skill(&self, key: &str) -> Option<&SkillDef>;

    /// Every skill, in display order.
    fn skills(&self) -> &[SkillDef];

    /// Feat lookup that falls back to the base name of a parameterized feat,
    /// so `"Skill Focus (Pilot)"` resolves to `"Skill Focus"`.
    fn feat_or_base(&self, name: &str) -> Option<&FeatDef> {
        self.feat(name).or_else(|| match split_argument(name) {
            (base, Some(_)) => self.feat(base),
            (_, None) => None,
        })
    }
}

/// Splits a parameterized name: `"Skill Training (Stealth)"` becomes
/// `("Skill Training", Some("Stealth"))`.
pub fn split_argument(name: &str) -> (&str, Option<&str>) {
    let name = name.trim();
    if let Some((base, argument)) = name
        .strip_suffix(')')
        .and_then(|inner| inner.rsplit_once('('))
    {
        let argument = argument.trim();
        if !argument.is_empty() && !base.trim().is_empty() {
            return (base.trim(), Some(argument));
        }
    }
    (name, None)
}

/// Per-level attack-bonus category of a class.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum BabProgression {
    High,
    #[default]
    Medium,
    Low,
}

impl BabProgression {
    /// Attack bonus granted by `levels` levels of a class in this category.
    pub const fn bab_for(self, levels: u32) -> i32 {
        let levels = levels as i32;
        match self {
            BabProgression::High => levels,
            BabProgression::Medium => levels * 3 / 4,
            BabProgression::Low => levels / 2,
        }
    }
}

/// The three defenses.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Defense {
    #[strum(to_string = "fortitude", serialize = "fort")]
    Fortitude,
    #[strum(to_string = "reflex", serialize = "ref")]
    Reflex,
    Will,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case")]
pub enum DefenseCategory {
    #[default]
    Low,
    Medium,
    High,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ClassDefenses {
    pub fortitude: DefenseCategory,
    pub reflex: DefenseCategory,
    pub will: DefenseCategory,
}

impl ClassDefenses {
    pub const fn category(&self, defense: Defense) -> DefenseCategory {
        match defense {
            Defense::Fortitude => self.fortitude,
            Defense::Reflex => self.reflex,
            Defense::Will => self.will,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SpeciesDef {
    pub id: String,
    pub name: String,
    pub size: Size,
    pub speed: u32,
    pub ability_mods: BTreeMap<Ability, i32>,
    /// Bonus applied to one ability of the player's choice, if the species
    /// offers one.
    pub free_ability_bonus: Option<i32>,
    /// Extra feat picks at character creation.
    pub bonus_feats: u32,
    pub trained_skills: Vec<String>,
    pub automatic_feats: Vec<String>,
    pub modifiers: Vec<ModifierSpec>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BackgroundDef {
    pub id: String,
    pub name: String,
    pub trained_skills: Vec<String>,
    /// Feats granted outright.
    pub feats: Vec<String>,
    /// Extra feat picks at character creation.
    pub bonus_feats: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ClassDef {
    pub id: String,
    pub name: String,
    pub hit_die: u32,
    pub bab: BabProgression,
    pub defenses: ClassDefenses,
    /// Skill points per level before the INT modifier.
    pub skill_points: i32,
    pub class_skills: Vec<String>,
    /// Automatic feats for a character whose first class this is.
    pub starting_feats: Vec<String>,
    /// Feats a multiclassing character may pick one of.
    pub multiclass_feats: Vec<String>,
    pub talent_trees: Vec<String>,
    /// Class levels at which a talent is gained.
    pub talent_levels: Vec<u32>,
    /// Class levels at which a bonus feat is gained.
    pub bonus_feat_levels: Vec<u32>,
    pub force_sensitive: bool,
    /// Prerequisite expression; prestige classes only.
    pub prerequisites: Option<String>,
}

impl ClassDef {
    pub fn is_class_skill(&self, key: &str) -> bool {
        let key = crate::state::normalize_key(key);
        self.class_skills
            .iter()
            .any(|skill| crate::state::normalize_key(skill) == key)
    }

    pub fn has_talent_tree(&self, tree: &str) -> bool {
        let tree = crate::state::normalize_key(tree);
        self.talent_trees
            .iter()
            .any(|own| crate::state::normalize_key(own) == tree)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FeatDef {
    pub id: String,
    pub name: String,
    pub feat_type: String,
    pub prerequisites: Option<String>,
    pub repeatable: bool,
    pub modifiers: Vec<ModifierSpec>,
    pub action: Option<ActionCost>,
    /// Force powers materialized alongside the feat.
    pub grants_powers: Vec<String>,
}

impl Default for FeatDef {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            feat_type: "General".to_string(),
            prerequisites: None,
            repeatable: false,
            modifiers: Vec::new(),
            action: None,
            grants_powers: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TalentDef {
    pub id: String,
    pub name: String,
    pub tree: String,
    /// Comma-separated talent names.
    pub prerequisites: Option<String>,
    pub modifiers: Vec<ModifierSpec>,
    pub action: Option<ActionCost>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SkillDef {
    pub key: String,
    pub label: String,
    pub ability: Ability,
    /// Subject to encumbrance penalties.
    #[cfg_attr(feature = "serde", serde(default))]
    pub armor_check: bool,
}
