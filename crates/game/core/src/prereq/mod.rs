//! Prerequisite validation.
//!
//! Expressions from the rule tables are parsed into [`Clause`]s and evaluated
//! against a *staged* view of the actor: committed primary state with every
//! pending selection of the open progression applied. A feat picked earlier in
//! the same level-up therefore satisfies a later pick's prerequisite without a
//! second round trip.

mod evaluate;
mod parse;

pub use parse::{Clause, parse};

use crate::env::RulesEnv;
use crate::state::{PendingSelections, PrimaryState};

/// What kind of expression is being checked. Talent expressions are plain
/// name lists; feat and class expressions use the full clause grammar.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case")]
pub enum PrereqKind {
    Feat,
    Talent,
    Class,
}

/// Result of a prerequisite check.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PrereqOutcome {
    pub valid: bool,
    /// One human-readable entry per unmet clause, in expression order.
    pub missing: Vec<String>,
}

impl PrereqOutcome {
    pub fn satisfied() -> Self {
        Self {
            valid: true,
            missing: Vec::new(),
        }
    }
}

/// Checks `expression` against `primary` with `pending` selections staged on
/// top of it.
pub fn check(
    kind: PrereqKind,
    expression: &str,
    primary: &PrimaryState,
    pending: &PendingSelections,
    env: &RulesEnv<'_>,
) -> PrereqOutcome {
    let staged = crate::engine::stage_selections(primary, pending, env).staged(primary);
    check_staged(kind, expression, &staged, env)
}

/// Checks `expression` against an already staged primary state.
pub fn check_staged(
    kind: PrereqKind,
    expression: &str,
    staged: &PrimaryState,
    env: &RulesEnv<'_>,
) -> PrereqOutcome {
    let missing: Vec<String> = parse(kind, expression, env.tables())
        .iter()
        .filter_map(|clause| evaluate::evaluate(clause, staged, env).err())
        .collect();
    PrereqOutcome {
        valid: missing.is_empty(),
        missing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{AbilityScores, ClassLevel, GrantOrigin, PendingClass};
    use crate::testing::{sample_config, sample_tables, soldier_level_one};

    fn soldier_levels(count: u32) -> PrimaryState {
        let mut primary = soldier_level_one().primary().clone();
        for level in 2..=count {
            primary.class_levels.push(ClassLevel {
                class_id: "soldier".into(),
                level,
                skill_points_budget: 5,
            });
        }
        primary
    }

    #[test]
    fn bab_threshold_reports_current_value() {
        let tables = sample_tables();
        let config = sample_config();
        let env = RulesEnv::from_static(&tables, &config);

        let outcome = check_staged(PrereqKind::Class, "BAB +7", &soldier_levels(4), &env);
        assert!(!outcome.valid);
        assert_eq!(outcome.missing, vec!["BAB +7 (current: +4)"]);

        let outcome = check_staged(PrereqKind::Class, "BAB +7", &soldier_levels(7), &env);
        assert_eq!(outcome, PrereqOutcome::satisfied());
    }

    #[test]
    fn ability_and_level_messages() {
        let tables = sample_tables();
        let config = sample_config();
        let env = RulesEnv::from_static(&tables, &config);
        let primary = PrimaryState {
            abilities: AbilityScores::from_bases(10, 10, 10, 10, 10, 10),
            ..soldier_levels(3)
        };

        let outcome = check_staged(
            PrereqKind::Class,
            "DEX 13, Character Level 7, Jedi level 3, Trained in Pilot",
            &primary,
            &env,
        );
        assert_eq!(
            outcome.missing,
            vec![
                "DEX 13 (current: 10)",
                "Character level 7 (current: 3)",
                "Jedi level 3 (current: 0)",
                "Trained in Pilot",
            ]
        );
    }

    #[test]
    fn force_sensitive_from_feat_or_class() {
        let tables = sample_tables();
        let config = sample_config();
        let env = RulesEnv::from_static(&tables, &config);

        let mut primary = soldier_levels(1);
        assert_eq!(
            check_staged(PrereqKind::Feat, "Force Sensitive", &primary, &env).missing,
            vec!["Force Sensitive"]
        );
        primary
            .feats
            .grant("Force Sensitivity", GrantOrigin::Multiclass, false);
        assert!(check_staged(PrereqKind::Feat, "Force Sensitive", &primary, &env).valid);

        let mut jedi = PrimaryState::default();
        jedi.class_levels.push(ClassLevel {
            class_id: "jedi".into(),
            level: 1,
            skill_points_budget: 8,
        });
        assert!(check_staged(PrereqKind::Feat, "Force Sensitive", &jedi, &env).valid);
    }

    #[test]
    fn any_of_passes_when_one_alternative_holds() {
        let tables = sample_tables();
        let config = sample_config();
        let env = RulesEnv::from_static(&tables, &config);

        let soldier = soldier_levels(1);
        let expression = "Weapon Proficiency (Lightsabers) or Weapon Proficiency (Rifles)";
        assert!(check_staged(PrereqKind::Feat, expression, &soldier, &env).valid);

        let outcome = check_staged(
            PrereqKind::Feat,
            expression,
            &PrimaryState::default(),
            &env,
        );
        assert_eq!(
            outcome.missing,
            vec!["Feat: Weapon Proficiency (Lightsabers) or Feat: Weapon Proficiency (Rifles)"]
        );
    }

    #[test]
    fn talent_counts_by_tree() {
        let tables = sample_tables();
        let config = sample_config();
        let env = RulesEnv::from_static(&tables, &config);

        let mut primary = PrimaryState::default();
        primary.talents.grant("Block", GrantOrigin::Chosen, false);
        primary.talents.grant("Knack", GrantOrigin::Chosen, false);

        let expression = "2 talents from the Jedi Guardian talent tree";
        assert_eq!(
            check_staged(PrereqKind::Class, expression, &primary, &env).missing,
            vec!["2 talents from Jedi Guardian tree (current: 1)"]
        );
        assert!(check_staged(PrereqKind::Class, "any 2 talents", &primary, &env).valid);

        primary.talents.grant("Deflect", GrantOrigin::Chosen, false);
        assert!(check_staged(PrereqKind::Class, expression, &primary, &env).valid);
    }

    #[test]
    fn talent_expressions_name_talents() {
        let tables = sample_tables();
        let config = sample_config();
        let env = RulesEnv::from_static(&tables, &config);
        let outcome = check_staged(PrereqKind::Talent, "Block", &PrimaryState::default(), &env);
        assert_eq!(outcome.missing, vec!["Talent: Block"]);
    }

    #[test]
    fn pending_selections_count_toward_prerequisites() {
        let tables = sample_tables();
        let config = sample_config();
        let env = RulesEnv::from_static(&tables, &config);

        let primary = soldier_levels(1);
        let mut pending = PendingSelections::default();
        assert!(!check(PrereqKind::Feat, "Power Attack", &primary, &pending, &env).valid);

        pending.class = Some(PendingClass {
            class_id: "soldier".into(),
            skill_points_budget: 5,
            starting_feats: Vec::new(),
            multiclass_feat: None,
        });
        pending.feats.push("Power Attack".into());
        let outcome = check(PrereqKind::Feat, "Power Attack, BAB +2", &primary, &pending, &env);
        assert_eq!(outcome, PrereqOutcome::satisfied());
    }

    #[test]
    fn empty_expression_is_satisfied() {
        let tables = sample_tables();
        let config = sample_config();
        let env = RulesEnv::from_static(&tables, &config);
        assert!(check_staged(PrereqKind::Class, "", &PrimaryState::default(), &env).valid);
    }
}
