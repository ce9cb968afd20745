use std::collections::BTreeMap;

use strum::IntoEnumIterator;

use super::hp::push_missing_class;
use super::{AttackEntry, DefenseScore, Defenses};
use crate::config::DefenseCategoryBonuses;
use crate::env::{Defense, DefenseCategory, RulesEnv};
use crate::state::{Ability, PrimaryState, WeaponRange, normalize_key};
use crate::stats::{DerivationWarning, KindStrategy};

/// Levels held per class, keyed by normalized class id, preserving the id as
/// first written.
fn levels_by_class(primary: &PrimaryState) -> BTreeMap<String, (&str, u32)> {
    let mut levels: BTreeMap<String, (&str, u32)> = BTreeMap::new();
    for entry in &primary.class_levels {
        levels
            .entry(normalize_key(&entry.class_id))
            .or_insert((entry.class_id.as_str(), 0))
            .1 += 1;
    }
    levels
}

/// Base attack bonus: per-class contribution by category, summed across
/// classes without re-flooring the total.
pub fn base_attack_bonus(
    primary: &PrimaryState,
    env: &RulesEnv<'_>,
    warnings: &mut Vec<DerivationWarning>,
) -> i32 {
    levels_by_class(primary)
        .values()
        .map(|&(class_id, levels)| {
            let progression = match env.tables().class(class_id) {
                Some(def) => def.bab,
                None => {
                    push_missing_class(class_id, warnings);
                    env.config().default_bab
                }
            };
            progression.bab_for(levels)
        })
        .sum()
}

fn category_bonus(category: DefenseCategory, bonuses: &DefenseCategoryBonuses) -> i32 {
    match category {
        DefenseCategory::Low => bonuses.low,
        DefenseCategory::Medium => bonuses.medium,
        DefenseCategory::High => bonuses.high,
    }
}

pub(super) fn defense_ability(defense: Defense, strategy: KindStrategy) -> Ability {
    match defense {
        Defense::Fortitude => strategy.fortitude_ability,
        Defense::Reflex => Ability::Dex,
        Defense::Will => Ability::Wis,
    }
}

/// `10 + class bonus + ability mod`, where the class bonus is the best across
/// held classes for that defense.
pub fn defenses(primary: &PrimaryState, strategy: KindStrategy, env: &RulesEnv<'_>) -> Defenses {
    let held: Vec<_> = levels_by_class(primary)
        .values()
        .filter_map(|&(class_id, _)| env.tables().class(class_id))
        .collect();

    let score = |defense: Defense| {
        let class_bonus = held
            .iter()
            .map(|def| category_bonus(def.defenses.category(defense), &env.config().defense_bonuses))
            .max()
            .unwrap_or(0);
        let ability_mod = primary
            .abilities
            .modifier(defense_ability(defense, strategy));
        DefenseScore::new(class_bonus, ability_mod)
    };

    let mut out = Defenses::default();
    for defense in Defense::iter() {
        *out.get_mut(defense) = score(defense);
    }
    out
}

/// Attack entries for equipped weapons.
pub fn attacks(primary: &PrimaryState, bab: i32) -> Vec<AttackEntry> {
    let half_level = primary.character_level() as i32 / 2;
    let str_mod = primary.abilities.modifier(Ability::Str);
    let dex_mod = primary.abilities.modifier(Ability::Dex);

    primary
        .items
        .iter()
        .filter(|item| item.equipped)
        .filter_map(|item| item.weapon.as_ref().map(|weapon| (item, weapon)))
        .map(|(item, weapon)| {
            let (ability, ability_mod) = match weapon.range {
                WeaponRange::Melee => (Ability::Str, str_mod),
                WeaponRange::Ranged => (Ability::Dex, dex_mod),
            };
            let strength_damage = match weapon.range {
                WeaponRange::Melee => str_mod,
                WeaponRange::Ranged => 0,
            };
            AttackEntry {
                item: item.id,
                name: item.name.clone(),
                range: weapon.range,
                ability,
                attack_bonus: bab + ability_mod + weapon.attack_bonus,
                damage_dice: weapon.damage.clone(),
                damage_bonus: half_level + strength_damage + weapon.damage_bonus,
            }
        })
        .collect()
}
