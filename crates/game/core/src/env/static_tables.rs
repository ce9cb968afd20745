//! In-memory rule tables.
//!
//! [`RuleTablesData`] is the plain, serde-loadable shape; [`StaticRuleTables`]
//! wraps it with normalized-key indexes and implements both [`RuleTables`] and
//! [`ItemCatalog`].

use std::collections::BTreeMap;

use super::{
    BackgroundDef, ClassDef, FeatDef, ItemCatalog, RuleTables, SkillDef, SpeciesDef, TalentDef,
};
use crate::state::{ActionCost, ItemType, OwnedItem, WeaponProfile, normalize_key};
use crate::stats::ModifierSpec;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PowerDef {
    pub id: String,
    pub name: String,
    pub descriptor: Option<String>,
    pub action: Option<ActionCost>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GearDef {
    #[cfg_attr(feature = "serde", serde(default))]
    pub id: String,
    pub name: String,
    pub item_type: ItemType,
    #[cfg_attr(feature = "serde", serde(default))]
    pub weight: u32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub weapon: Option<WeaponProfile>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub action: Option<ActionCost>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub modifiers: Vec<ModifierSpec>,
}

/// Raw table contents.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RuleTablesData {
    pub species: Vec<SpeciesDef>,
    pub backgrounds: Vec<BackgroundDef>,
    pub classes: Vec<ClassDef>,
    pub feats: Vec<FeatDef>,
    pub talents: Vec<TalentDef>,
    pub skills: Vec<SkillDef>,
    pub powers: Vec<PowerDef>,
    pub gear: Vec<GearDef>,
}

type Index = BTreeMap<String, usize>;

fn build_index<'a, T: 'a>(
    entries: &'a [T],
    keys: impl Fn(&'a T) -> [&'a str; 2],
) -> Index {
    let mut index = Index::new();
    for (position, entry) in entries.iter().enumerate() {
        for raw in keys(entry) {
            let key = normalize_key(raw);
            if !key.is_empty() {
                index.entry(key).or_insert(position);
            }
        }
    }
    index
}

fn lookup<'a, T>(entries: &'a [T], index: &Index, raw: &str) -> Option<&'a T> {
    index
        .get(&normalize_key(raw))
        .and_then(|&position| entries.get(position))
}

/// Indexed rule tables keyed by normalized id and display name.
#[derive(Clone, Debug, Default)]
pub struct StaticRuleTables {
    data: RuleTablesData,
    species: Index,
    backgrounds: Index,
    classes: Index,
    feats: Index,
    talents: Index,
    skills: Index,
    powers: Index,
    gear: Index,
}

impl StaticRuleTables {
    pub fn new(data: RuleTablesData) -> Self {
        Self {
            species: build_index(&data.species, |d| [d.id.as_str(), d.name.as_str()]),
            backgrounds: build_index(&data.backgrounds, |d| [d.id.as_str(), d.name.as_str()]),
            classes: build_index(&data.classes, |d| [d.id.as_str(), d.name.as_str()]),
            feats: build_index(&data.feats, |d| [d.id.as_str(), d.name.as_str()]),
            talents: build_index(&data.talents, |d| [d.id.as_str(), d.name.as_str()]),
            skills: build_index(&data.skills, |d| [d.key.as_str(), d.label.as_str()]),
            powers: build_index(&data.powers, |d| [d.id.as_str(), d.name.as_str()]),
            gear: build_index(&data.gear, |d| [d.id.as_str(), d.name.as_str()]),
            data,
        }
    }

    pub fn data(&self) -> &RuleTablesData {
        &self.data
    }

    pub fn power(&self, name: &str) -> Option<&PowerDef> {
        lookup(&self.data.powers, &self.powers, name)
    }

    pub fn gear(&self, name: &str) -> Option<&GearDef> {
        lookup(&self.data.gear, &self.gear, name)
    }
}

impl From<RuleTablesData> for StaticRuleTables {
    fn from(data: RuleTablesData) -> Self {
        Self::new(data)
    }
}

impl RuleTables for StaticRuleTables {
    fn species(&self, id: &str) -> Option<&SpeciesDef> {
        lookup(&self.data.species, &self.species, id)
    }

    fn background(&self, id: &str) -> Option<&BackgroundDef> {
        lookup(&self.data.backgrounds, &self.backgrounds, id)
    }

    fn class(&self, id: &str) -> Option<&ClassDef> {
        lookup(&self.data.classes, &self.classes, id)
    }

    fn feat(&self, name: &str) -> Option<&FeatDef> {
        lookup(&self.data.feats, &self.feats, name)
    }

    fn talent(&self, name: &str) -> Option<&TalentDef> {
        lookup(&self.data.talents, &self.talents, name)
    }

    fn skill(&self, key: &str) -> Option<&SkillDef> {
        lookup(&self.data.skills, &self.skills, key)
    }

    fn skills(&self) -> &[SkillDef] {
        &self.data.skills
    }
}

impl ItemCatalog for StaticRuleTables {
    fn resolve(&self, item_type: ItemType, name: &str) -> Option<OwnedItem> {
        match item_type {
            ItemType::Feat => self.feat_or_base(name).map(|def| {
                // A parameterized feat keeps its argument in the item name.
                let display = match self.feat(name) {
                    Some(_) => def.name.as_str(),
                    None => name,
                };
                let mut item =
                    OwnedItem::bare(ItemType::Feat, display).with_group(def.feat_type.clone());
                item.action = def.action;
                item
            }),
            ItemType::Talent => self.talent(name).map(|def| {
                let mut item =
                    OwnedItem::bare(ItemType::Talent, &def.name).with_group(def.tree.clone());
                item.action = def.action;
                item
            }),
            ItemType::ForcePower => self.power(name).map(|def| {
                let mut item = OwnedItem::bare(ItemType::ForcePower, &def.name);
                item.group = def.descriptor.clone();
                item.action = def.action;
                item
            }),
            ItemType::Weapon | ItemType::Armor | ItemType::Equipment => self
                .gear(name)
                .filter(|def| def.item_type == item_type)
                .map(|def| {
                    let mut item = OwnedItem::bare(def.item_type, &def.name)
                        .with_weight(def.weight)
                        .with_modifiers(def.modifiers.clone());
                    item.weapon = def.weapon.clone();
                    item.action = def.action;
                    item
                }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_tables;

    #[test]
    fn lookups_accept_ids_and_display_names() {
        let tables = sample_tables();
        assert!(tables.feat("Point-Blank Shot").is_some());
        assert!(tables.feat("point_blank_shot").is_some());
        assert!(tables.class("SOLDIER").is_some());
        assert!(tables.skill("Use the Force").is_some());
        assert!(tables.species("Gungan").is_none());
    }

    #[test]
    fn catalog_resolves_feats_with_group() {
        let tables = sample_tables();
        let item = tables
            .resolve(ItemType::Feat, "power attack")
            .expect("power attack is in the tables");
        assert_eq!(item.name, "Power Attack");
        assert_eq!(item.group.as_deref(), Some("Combat"));
        assert!(tables.resolve(ItemType::Talent, "Power Attack").is_none());
    }

    #[test]
    fn catalog_keeps_feat_arguments() {
        let tables = sample_tables();
        let item = tables
            .resolve(ItemType::Feat, "Skill Focus (Pilot)")
            .expect("base feat resolves");
        assert_eq!(item.name, "Skill Focus (Pilot)");
        assert_eq!(item.key, "skill_focus_pilot");
    }

    #[test]
    fn catalog_resolves_gear_of_matching_type_only() {
        let tables = sample_tables();
        let pistol = tables
            .resolve(ItemType::Weapon, "Blaster Pistol")
            .expect("pistol");
        assert!(pistol.weapon.is_some());
        assert!(tables.resolve(ItemType::Armor, "Blaster Pistol").is_none());
    }
}
