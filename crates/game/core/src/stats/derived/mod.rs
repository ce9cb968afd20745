//! Derived block - everything recomputed from primary state.
//!
//! Never stored as a source of truth and never hand-edited. Computation is
//! split in two so a caller can publish safe values early:
//!
//! 1. [`compute_base`]: identity, HP, BAB, defenses, skills, attacks,
//!    projections and encumbrance straight from primary state.
//! 2. [`apply_modifiers`]: folds an [`Aggregation`] into the base values.
//!
//! [`compute_all`] runs both. Derivation is best-effort: missing table entries
//! fall back to configured defaults and are reported as warnings.
mod combat;
mod encumbrance;
mod hp;
mod projections;
mod skills;

use std::collections::BTreeMap;

pub use combat::{attacks, base_attack_bonus, defenses};
pub use encumbrance::{LoadState, capacity, classify, encumbrance};
pub use hp::max_hp;
pub use projections::refresh_projections;
pub use skills::skill_entries;

use super::modifiers::{Aggregation, TargetPath};
use super::{DerivationWarning, KindStrategy};
use crate::env::{Defense, RulesEnv};
use crate::state::{Ability, ActionCost, Actor, ItemId, ItemType, Size, WeaponRange};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClassSummary {
    pub class_id: String,
    pub name: String,
    pub levels: u32,
}

/// Read-only mirror of who the actor is.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Identity {
    pub name: String,
    pub kind_label: String,
    pub species: Option<String>,
    pub size: Size,
    pub level: u32,
    pub classes: Vec<ClassSummary>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DerivedHp {
    pub max: i32,
    pub temp: i32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DefenseScore {
    pub total: i32,
    pub class_bonus: i32,
    pub ability_mod: i32,
    pub misc: i32,
}

impl DefenseScore {
    pub const BASE: i32 = 10;

    pub const fn new(class_bonus: i32, ability_mod: i32) -> Self {
        Self {
            total: Self::BASE + class_bonus + ability_mod,
            class_bonus,
            ability_mod,
            misc: 0,
        }
    }

    pub fn add_misc(&mut self, misc: i32) {
        self.misc += misc;
        self.total += misc;
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Defenses {
    pub fortitude: DefenseScore,
    pub reflex: DefenseScore,
    pub will: DefenseScore,
}

impl Defenses {
    pub fn get(&self, defense: Defense) -> &DefenseScore {
        match defense {
            Defense::Fortitude => &self.fortitude,
            Defense::Reflex => &self.reflex,
            Defense::Will => &self.will,
        }
    }

    pub fn get_mut(&mut self, defense: Defense) -> &mut DefenseScore {
        match defense {
            Defense::Fortitude => &mut self.fortitude,
            Defense::Reflex => &mut self.reflex,
            Defense::Will => &mut self.will,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SkillEntry {
    pub key: String,
    pub label: String,
    pub total: i32,
    pub trained: bool,
    pub focused: bool,
    pub ability: Ability,
    /// Portion of `total` contributed by modifiers.
    pub misc: i32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttackEntry {
    pub item: ItemId,
    pub name: String,
    pub range: WeaponRange,
    pub ability: Ability,
    pub attack_bonus: i32,
    pub damage_dice: String,
    pub damage_bonus: i32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActionEntry {
    pub item: ItemId,
    pub name: String,
    pub item_type: ItemType,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Encumbrance {
    pub weight: u32,
    pub capacity: u32,
    pub load: LoadState,
    pub skill_penalty: i32,
    /// Speed after load penalties and speed modifiers, in squares.
    pub speed: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConditionSummary {
    pub step: u8,
    pub label: String,
    pub penalty: i32,
    pub persistent: bool,
    pub helpless: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DerivedBlock {
    pub identity: Identity,
    pub hp: DerivedHp,
    pub bab: i32,
    pub defenses: Defenses,
    pub skills: Vec<SkillEntry>,
    pub attacks: Vec<AttackEntry>,
    /// Feat names grouped by feat type.
    pub feats: BTreeMap<String, Vec<String>>,
    /// Talent names grouped by talent tree.
    pub talents: BTreeMap<String, Vec<String>>,
    pub powers: Vec<String>,
    pub actions: BTreeMap<ActionCost, Vec<ActionEntry>>,
    pub encumbrance: Encumbrance,
    pub condition: ConditionSummary,
    pub warnings: Vec<DerivationWarning>,
    /// Actor revision this block was computed from.
    pub revision: u64,
    pub modifiers_applied: bool,
}

/// First half of a recompute: everything that does not need modifiers.
pub fn compute_base(actor: &Actor, env: &RulesEnv<'_>) -> DerivedBlock {
    let primary = actor.primary();
    let strategy = KindStrategy::for_kind(actor.kind);
    let config = env.config();
    let mut warnings = Vec::new();

    let species = primary.species.as_deref().map(|id| {
        env.tables()
            .species(id)
            .map_or_else(|| id.to_string(), |def| def.name.clone())
    });
    let classes = primary
        .classes()
        .into_iter()
        .map(|class_id| ClassSummary {
            class_id: class_id.to_string(),
            name: env
                .tables()
                .class(class_id)
                .map_or_else(|| class_id.to_string(), |def| def.name.clone()),
            levels: primary.class_level(class_id),
        })
        .collect();

    let hp_max = max_hp(primary, strategy, env, &mut warnings);
    let bab = base_attack_bonus(primary, env, &mut warnings);
    let load = encumbrance(primary, &config.encumbrance);
    let skills = if strategy.lists_skills {
        skill_entries(primary, load.skill_penalty, env, &mut warnings)
    } else {
        Vec::new()
    };
    let track = primary.condition_track;

    let mut block = DerivedBlock {
        identity: Identity {
            name: actor.name.clone(),
            kind_label: strategy.identity_label.to_string(),
            species,
            size: primary.size,
            level: primary.character_level(),
            classes,
        },
        hp: DerivedHp {
            max: hp_max,
            temp: primary.hp.temp,
        },
        bab,
        defenses: defenses(primary, strategy, env),
        skills,
        attacks: attacks(primary, bab),
        encumbrance: load,
        condition: ConditionSummary {
            step: track.current(),
            label: track.label().to_string(),
            penalty: track.penalty(&config.condition_penalties),
            persistent: track.persistent,
            helpless: track.is_helpless(),
        },
        warnings,
        revision: actor.revision(),
        modifiers_applied: false,
        ..DerivedBlock::default()
    };
    refresh_projections(&mut block, primary);
    block
}

/// Second half of a recompute: folds resolved modifiers into the base values.
///
/// Additive results land in the `misc` columns. An override sets the total
/// outright and `misc` absorbs the difference.
pub fn apply_modifiers(block: &mut DerivedBlock, aggregation: &Aggregation) {
    let map = &aggregation.map;

    block.hp.max = map.apply(&[TargetPath::HpMax], block.hp.max).max(1);

    let bab = map.apply(&[TargetPath::Bab], block.bab);
    let bab_delta = bab - block.bab;
    block.bab = bab;

    for defense in [Defense::Fortitude, Defense::Reflex, Defense::Will] {
        let score = block.defenses.get_mut(defense);
        score.add_misc(map.defense(defense, score.total) - score.total);
    }

    for skill in &mut block.skills {
        let total = map.skill(&skill.key, skill.total);
        skill.misc += total - skill.total;
        skill.total = total;
    }

    for attack in &mut block.attacks {
        attack.attack_bonus = map.attack(
            attack.range == WeaponRange::Ranged,
            attack.attack_bonus + bab_delta,
        );
        attack.damage_bonus = map.apply(&[TargetPath::Damage], attack.damage_bonus);
    }

    let speed = map.apply(&[TargetPath::Speed], block.encumbrance.speed as i32);
    block.encumbrance.speed = speed.max(0) as u32;

    block.warnings.extend(aggregation.warnings.iter().cloned());
    block.modifiers_applied = true;
}

/// Full, synchronous recompute.
pub fn compute_all(actor: &Actor, env: &RulesEnv<'_>) -> DerivedBlock {
    let mut block = compute_base(actor, env);
    let aggregation = super::aggregate(actor.primary(), env);
    apply_modifiers(&mut block, &aggregation);
    block
}
