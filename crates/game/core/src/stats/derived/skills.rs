use super::SkillEntry;
use crate::env::RulesEnv;
use crate::state::PrimaryState;
use crate::stats::DerivationWarning;

/// Skill totals before modifiers: `ability mod + half level (trained) +
/// trained bonus + focus bonus + load penalty (armor-check skills)`.
pub fn skill_entries(
    primary: &PrimaryState,
    load_penalty: i32,
    env: &RulesEnv<'_>,
    warnings: &mut Vec<DerivationWarning>,
) -> Vec<SkillEntry> {
    let config = env.config();
    let half_level = primary.character_level() as i32 / 2;

    for key in primary.skills.keys() {
        if env.tables().skill(key).is_none() {
            warnings.push(DerivationWarning::MissingSkill { key: key.clone() });
        }
    }

    env.tables()
        .skills()
        .iter()
        .map(|def| {
            let state = primary.skill(&def.key).cloned().unwrap_or_default();
            let ability = state.selected_ability.unwrap_or(def.ability);
            let trained = state.is_trained();

            let mut total = primary.abilities.modifier(ability);
            if trained {
                total += half_level + config.trained_skill_bonus;
            }
            if state.focused {
                total += config.skill_focus_bonus;
            }
            if def.armor_check {
                total += load_penalty;
            }

            SkillEntry {
                key: crate::state::normalize_key(&def.key),
                label: def.label.clone(),
                total,
                trained,
                focused: state.focused,
                ability,
                misc: 0,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Ability, AbilityScores, ClassLevel, SkillState};
    use crate::testing::{sample_config, sample_tables};

    #[test]
    fn trained_and_focused_skills_stack_bonuses() {
        let tables = sample_tables();
        let config = sample_config();
        let env = RulesEnv::from_static(&tables, &config);
        let mut warnings = Vec::new();

        let mut primary = PrimaryState {
            abilities: AbilityScores::from_bases(10, 14, 10, 10, 10, 10),
            ..PrimaryState::default()
        };
        for level in 1..=4 {
            primary.class_levels.push(ClassLevel {
                class_id: "scoundrel".into(),
                level,
                skill_points_budget: 0,
            });
        }
        *primary.skill_entry("pilot") = SkillState {
            ranks: 1,
            focused: true,
            ..SkillState::default()
        };

        let entries = skill_entries(&primary, 0, &env, &mut warnings);
        let pilot = entries.iter().find(|e| e.key == "pilot").expect("pilot");
        // DEX +2, half level 2, trained 5, focus 5
        assert_eq!(pilot.total, 14);
        assert!(pilot.trained && pilot.focused);

        let stealth = entries.iter().find(|e| e.key == "stealth").expect("stealth");
        assert_eq!(stealth.total, 2);
        assert!(!stealth.trained);
    }

    #[test]
    fn selected_ability_overrides_default() {
        let tables = sample_tables();
        let config = sample_config();
        let env = RulesEnv::from_static(&tables, &config);
        let mut warnings = Vec::new();

        let mut primary = PrimaryState {
            abilities: AbilityScores::from_bases(18, 10, 10, 10, 10, 10),
            ..PrimaryState::default()
        };
        primary.skill_entry("pilot").selected_ability = Some(Ability::Str);
        let entries = skill_entries(&primary, 0, &env, &mut warnings);
        let pilot = entries.iter().find(|e| e.key == "pilot").expect("pilot");
        assert_eq!(pilot.ability, Ability::Str);
        assert_eq!(pilot.total, 4);
    }

    #[test]
    fn load_penalty_hits_armor_check_skills_only() {
        let tables = sample_tables();
        let config = sample_config();
        let env = RulesEnv::from_static(&tables, &config);
        let mut warnings = Vec::new();
        let entries = skill_entries(&PrimaryState::default(), -5, &env, &mut warnings);
        let climb = entries.iter().find(|e| e.key == "climb").expect("climb");
        let perception = entries.iter().find(|e| e.key == "perception").expect("perception");
        assert_eq!(climb.total, -5);
        assert_eq!(perception.total, 0);
    }

    #[test]
    fn unknown_skill_keys_warn() {
        let tables = sample_tables();
        let config = sample_config();
        let env = RulesEnv::from_static(&tables, &config);
        let mut warnings = Vec::new();
        let mut primary = PrimaryState::default();
        primary.skill_entry("basket weaving").trained = true;
        skill_entries(&primary, 0, &env, &mut warnings);
        assert_eq!(
            warnings,
            vec![DerivationWarning::MissingSkill {
                key: "basket_weaving".into()
            }]
        );
    }
}
