use super::Clause;
use crate::env::RulesEnv;
use crate::state::{PrimaryState, normalize_key};
use crate::stats::derived::base_attack_bonus;

const FORCE_SENSITIVITY: &str = "Force Sensitivity";

/// Checks one clause against staged state. `Err` carries the human-readable
/// missing requirement.
pub(super) fn evaluate(
    clause: &Clause,
    staged: &PrimaryState,
    env: &RulesEnv<'_>,
) -> Result<(), String> {
    let tables = env.tables();
    match clause {
        Clause::Ability { ability, min } => {
            let current = staged.abilities.total(*ability);
            if current >= *min {
                Ok(())
            } else {
                Err(format!("{ability} {min} (current: {current})"))
            }
        }
        Clause::Bab(min) => {
            let current = base_attack_bonus(staged, env, &mut Vec::new());
            if current >= *min {
                Ok(())
            } else {
                Err(format!("BAB {min:+} (current: {current:+})"))
            }
        }
        Clause::CharacterLevel(min) => {
            let current = staged.character_level();
            if current >= *min {
                Ok(())
            } else {
                Err(format!("Character level {min} (current: {current})"))
            }
        }
        Clause::ClassLevel { class, min } => {
            let def = tables.class(class);
            let id = def.map_or(class.as_str(), |def| def.id.as_str());
            let label = def.map_or(class.as_str(), |def| def.name.as_str());
            let current = staged.class_level(id);
            if current >= *min {
                Ok(())
            } else {
                Err(format!("{label} level {min} (current: {current})"))
            }
        }
        Clause::TrainedSkill(skill) => {
            let def = tables.skill(skill);
            let key = def.map_or(skill.as_str(), |def| def.key.as_str());
            if staged.is_trained(key) {
                Ok(())
            } else {
                let label = def.map_or(skill.as_str(), |def| def.label.as_str());
                Err(format!("Trained in {label}"))
            }
        }
        Clause::ForceSensitive => {
            let by_class = staged
                .classes()
                .into_iter()
                .any(|class| tables.class(class).is_some_and(|def| def.force_sensitive));
            if by_class || staged.feats.contains(FORCE_SENSITIVITY) {
                Ok(())
            } else {
                Err("Force Sensitive".to_string())
            }
        }
        Clause::TalentCount { min, tree } => {
            let current = match tree {
                None => staged.talents.len() as u32,
                Some(tree) => {
                    let wanted = normalize_key(tree);
                    staged
                        .talents
                        .iter()
                        .filter(|(key, _)| {
                            tables
                                .talent(key)
                                .is_some_and(|def| normalize_key(&def.tree) == wanted)
                        })
                        .count() as u32
                }
            };
            if current >= *min {
                return Ok(());
            }
            let noun = if *min == 1 { "talent" } else { "talents" };
            Err(match tree {
                None => format!("{min} {noun} (current: {current})"),
                Some(tree) => format!("{min} {noun} from {tree} tree (current: {current})"),
            })
        }
        Clause::Species(species) => {
            let wanted = tables
                .species(species)
                .map_or_else(|| normalize_key(species), |def| normalize_key(&def.id));
            let held = staged.species.as_deref().map(|id| {
                tables
                    .species(id)
                    .map_or_else(|| normalize_key(id), |def| normalize_key(&def.id))
            });
            if held.as_deref() == Some(wanted.as_str()) {
                Ok(())
            } else {
                Err(format!("Species: {species}"))
            }
        }
        Clause::Feat(name) => {
            if staged.feats.contains(name) {
                Ok(())
            } else {
                Err(format!("Feat: {name}"))
            }
        }
        Clause::Talent(name) => {
            if staged.talents.contains(name) {
                Ok(())
            } else {
                Err(format!("Talent: {name}"))
            }
        }
        Clause::AnyOf(alternatives) => {
            let mut missing = Vec::with_capacity(alternatives.len());
            for alternative in alternatives {
                match evaluate(alternative, staged, env) {
                    Ok(()) => return Ok(()),
                    Err(message) => missing.push(message),
                }
            }
            Err(missing.join(" or "))
        }
    }
}
