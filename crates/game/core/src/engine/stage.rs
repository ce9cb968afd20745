//! Pending selections → primary-state writes.
//!
//! Confirming a step only records a pending value. This module turns the whole
//! pending set into one [`ActorUpdateTransaction`]; the same batch serves
//! prerequisite evaluation (applied to a copy) and finalize (committed).

use strum::IntoEnumIterator;

use crate::env::{ClassDef, RuleTables, RulesEnv, split_argument};
use crate::state::{
    Ability, AbilityScores, ActorUpdateTransaction, ClassLevel, FieldWrite, GrantOrigin, PendingSelections,
    PrimaryState, SkillState, normalize_key,
};

const DEFAULT_SPEED: u32 = 6;
const SKILL_TRAINING: &str = "Skill Training";
const SKILL_FOCUS: &str = "Skill Focus";

/// Canonical skill key for a skill name or key.
pub(super) fn skill_key(tables: &dyn RuleTables, name: &str) -> String {
    tables
        .skill(name)
        .map_or_else(|| normalize_key(name), |def| normalize_key(&def.key))
}

fn trained_skill(key: String) -> FieldWrite {
    FieldWrite::MergeSkill {
        key,
        state: SkillState {
            trained: true,
            ..SkillState::default()
        },
    }
}

/// Queues a feat grant plus the skill flag a `Skill Training (X)` or
/// `Skill Focus (X)` feat carries.
fn grant_feat(
    tx: &mut ActorUpdateTransaction,
    tables: &dyn RuleTables,
    name: &str,
    origin: GrantOrigin,
) {
    let repeatable = tables.feat_or_base(name).is_some_and(|def| def.repeatable);
    tx.push(FieldWrite::GrantFeat {
        name: name.trim().to_string(),
        origin,
        repeatable,
    });

    let (base, argument) = split_argument(name);
    let Some(skill) = argument else {
        return;
    };
    let key = skill_key(tables, skill);
    if base.eq_ignore_ascii_case(SKILL_TRAINING) {
        tx.push(trained_skill(key));
    } else if base.eq_ignore_ascii_case(SKILL_FOCUS) {
        tx.push(FieldWrite::MergeSkill {
            key,
            state: SkillState {
                focused: true,
                ..SkillState::default()
            },
        });
    }
}

/// Ability scores after the pending species, purchase and increases.
fn staged_abilities(
    primary: &PrimaryState,
    pending: &PendingSelections,
    env: &RulesEnv<'_>,
) -> Option<AbilityScores> {
    if pending.species.is_none() && pending.abilities.is_none() && pending.ability_increases.is_empty()
    {
        return None;
    }
    let mut scores = primary.abilities.clone();

    if let Some(species) = &pending.species {
        if let Some(def) = env.tables().species(&species.species_id) {
            for ability in Ability::iter() {
                scores.get_mut(ability).racial = 0;
            }
            for (ability, modifier) in &def.ability_mods {
                scores.get_mut(*ability).racial += modifier;
            }
            if let (Some(ability), Some(bonus)) = (species.free_ability, def.free_ability_bonus) {
                scores.get_mut(ability).racial += bonus;
            }
        }
    }
    if let Some(bases) = &pending.abilities {
        for (ability, base) in bases {
            scores.get_mut(*ability).base = *base;
        }
    }
    for ability in &pending.ability_increases {
        scores.get_mut(*ability).advancement += 1;
    }
    Some(scores)
}

/// Builds the writes that land every pending selection on `primary`.
///
/// Unknown ids are skipped here; each step already rejected them on confirm.
pub fn stage_selections(
    primary: &PrimaryState,
    pending: &PendingSelections,
    env: &RulesEnv<'_>,
) -> ActorUpdateTransaction {
    let tables = env.tables();
    let mut tx = ActorUpdateTransaction::new();

    if let Some(species) = &pending.species {
        if let Some(def) = tables.species(&species.species_id) {
            tx.push(FieldWrite::Species {
                id: def.id.clone(),
                size: def.size,
                speed: if def.speed == 0 { DEFAULT_SPEED } else { def.speed },
            });
            for skill in &def.trained_skills {
                tx.push(trained_skill(skill_key(tables, skill)));
            }
            for feat in &def.automatic_feats {
                grant_feat(&mut tx, tables, feat, GrantOrigin::Species);
            }
        }
    }

    if let Some(background) = &pending.background {
        if let Some(def) = tables.background(background) {
            tx.push(FieldWrite::Background(def.id.clone()));
            for skill in &def.trained_skills {
                tx.push(trained_skill(skill_key(tables, skill)));
            }
            for feat in &def.feats {
                grant_feat(&mut tx, tables, feat, GrantOrigin::Background);
            }
        }
    }

    if let Some(scores) = staged_abilities(primary, pending, env) {
        tx.push(FieldWrite::Abilities(scores));
    }

    if let Some(class) = &pending.class {
        tx.push(FieldWrite::PushClassLevel(ClassLevel {
            class_id: class.class_id.clone(),
            level: primary.class_level(&class.class_id) + 1,
            skill_points_budget: class.skill_points_budget,
        }));
        for feat in &class.starting_feats {
            grant_feat(&mut tx, tables, feat, GrantOrigin::Starting);
        }
        if let Some(feat) = &class.multiclass_feat {
            grant_feat(&mut tx, tables, feat, GrantOrigin::Multiclass);
        }
    }

    for skill in &pending.skills {
        tx.push(FieldWrite::MergeSkill {
            key: skill.key.clone(),
            state: SkillState {
                ranks: skill.ranks,
                trained: true,
                ..SkillState::default()
            },
        });
    }

    for feat in &pending.feats {
        grant_feat(&mut tx, tables, feat, GrantOrigin::Chosen);
    }

    for talent in &pending.talents {
        tx.push(FieldWrite::GrantTalent {
            name: talent.trim().to_string(),
            origin: GrantOrigin::Chosen,
        });
    }

    tx
}

/// Choice budgets for the level being gained.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Budgets {
    pub skill_points: u32,
    pub feats: u32,
    pub talents: u32,
    pub ability_increases: u32,
}

/// Skill points for one class level: `max(1, rate + INT mod)`, times four
/// for the character's very first class level.
pub fn skill_point_budget(rate: i32, int_modifier: i32, first_level: bool) -> u32 {
    let per_level = (rate + int_modifier).max(1) as u32;
    if first_level { per_level * 4 } else { per_level }
}

/// Budgets granted by confirming `class` on top of committed `primary`, with
/// the pending species, background and scores counted in.
pub fn budgets(
    primary: &PrimaryState,
    pending: &PendingSelections,
    class: &ClassDef,
    env: &RulesEnv<'_>,
) -> Budgets {
    let config = env.config();
    let tables = env.tables();
    let chargen = primary.class_levels.is_empty();
    let new_level = primary.character_level() + 1;
    let class_level = primary.class_level(&class.id) + 1;

    let int_modifier = staged_abilities(primary, pending, env)
        .unwrap_or_else(|| primary.abilities.clone())
        .modifier(config.skill_point_ability());

    let mut feats = u32::from(class.bonus_feat_levels.contains(&class_level));
    if chargen {
        feats += 1;
        feats += pending
            .species
            .as_ref()
            .and_then(|species| tables.species(&species.species_id))
            .map_or(0, |def| def.bonus_feats);
        feats += pending
            .background
            .as_deref()
            .and_then(|background| tables.background(background))
            .map_or(0, |def| def.bonus_feats);
    } else if config.feat_interval > 0 && new_level % config.feat_interval == 0 {
        feats += 1;
    }

    let ability_increases = if !chargen
        && config.ability_increase_interval > 0
        && new_level % config.ability_increase_interval == 0
    {
        config.ability_increase_count
    } else {
        0
    };

    Budgets {
        skill_points: skill_point_budget(class.skill_points, int_modifier, chargen),
        feats,
        talents: u32::from(class.talent_levels.contains(&class_level)),
        ability_increases,
    }
}
