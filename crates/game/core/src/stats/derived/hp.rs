use crate::config::FirstLevelHp;
use crate::env::RulesEnv;
use crate::state::{Ability, PrimaryState};
use crate::stats::{DerivationWarning, KindStrategy};

/// Hit die for a class, falling back to the configured default.
pub(super) fn hit_die(
    class_id: &str,
    env: &RulesEnv<'_>,
    warnings: &mut Vec<DerivationWarning>,
) -> u32 {
    match env.tables().class(class_id) {
        Some(def) if def.hit_die > 0 => def.hit_die,
        _ => {
            push_missing_class(class_id, warnings);
            env.config().default_hit_die
        }
    }
}

pub(super) fn push_missing_class(class_id: &str, warnings: &mut Vec<DerivationWarning>) {
    let warning = DerivationWarning::MissingClass {
        class_id: class_id.to_string(),
    };
    if !warnings.contains(&warning) {
        warnings.push(warning);
    }
}

/// Maximum hit points before modifiers.
///
/// The very first class level grants the full hit die (tripled for heroic
/// actors under [`FirstLevelHp::TripleHitDie`]); every later level grants
/// `hit_die / 2 + 1`. CON is added per level where the kind allows it. Only
/// the total is floored, at 1.
pub fn max_hp(
    primary: &PrimaryState,
    strategy: KindStrategy,
    env: &RulesEnv<'_>,
    warnings: &mut Vec<DerivationWarning>,
) -> i32 {
    let con = if strategy.con_adds_hp {
        primary.abilities.modifier(Ability::Con)
    } else {
        0
    };

    let mut total = 0i32;
    for (index, entry) in primary.class_levels.iter().enumerate() {
        let die = hit_die(&entry.class_id, env, warnings) as i32;
        let gained = if index == 0 {
            let first = match env.config().first_level_hp {
                FirstLevelHp::TripleHitDie if strategy.heroic_hp => die * 3,
                FirstLevelHp::TripleHitDie | FirstLevelHp::HitDie => die,
            };
            first + con
        } else {
            die / 2 + 1 + con
        };
        total += gained;
    }

    (total + primary.hp.bonus).max(1)
}
