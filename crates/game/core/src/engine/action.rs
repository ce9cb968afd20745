//! Progression actions.
//!
//! Each confirm step is its own payload type; [`ProgressionAction`] is the
//! closed set the engine dispatches on. With the `serde` feature the enum uses
//! an `{ "action": ..., "payload": ... }` envelope so external callers can keep
//! addressing steps by name.

use std::collections::BTreeMap;

use crate::state::{Ability, Step};

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConfirmSpecies {
    pub species_id: String,
    /// Required when the species grants a free ability bonus.
    #[cfg_attr(feature = "serde", serde(default))]
    pub free_ability: Option<Ability>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConfirmBackground {
    pub background_id: String,
}

/// Point-buy purchase. Every ability must be present.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConfirmAbilities {
    pub scores: BTreeMap<Ability, i32>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConfirmClass {
    pub class_id: String,
    /// Feat picked from the class's multiclass list when taking a new class
    /// after the first.
    #[cfg_attr(feature = "serde", serde(default))]
    pub multiclass_feat: Option<String>,
}

/// One skill entry as callers send it: a bare name (one rank) or an explicit
/// `{key, ranks}` pair.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum SkillInput {
    Name(String),
    Ranks { key: String, ranks: u32 },
}

impl SkillInput {
    pub fn key(&self) -> &str {
        match self {
            SkillInput::Name(key) | SkillInput::Ranks { key, .. } => key,
        }
    }

    pub fn ranks(&self) -> u32 {
        match self {
            SkillInput::Name(_) => 1,
            SkillInput::Ranks { ranks, .. } => *ranks,
        }
    }
}

impl From<&str> for SkillInput {
    fn from(name: &str) -> Self {
        SkillInput::Name(name.to_string())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConfirmSkills {
    pub entries: Vec<SkillInput>,
}

/// Chosen feats, in pick order. A feat may rely on one listed before it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConfirmFeats {
    pub feats: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConfirmTalents {
    pub talents: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConfirmAbilityIncreases {
    pub abilities: Vec<Ability>,
}

/// A step confirmation routed through [`crate::ProgressionEngine::do_action`].
#[derive(Clone, Debug, PartialEq, Eq, strum::IntoStaticStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(tag = "action", content = "payload", rename_all = "snake_case")
)]
#[strum(serialize_all = "snake_case")]
pub enum ProgressionAction {
    ConfirmSpecies(ConfirmSpecies),
    ConfirmBackground(ConfirmBackground),
    ConfirmAbilities(ConfirmAbilities),
    ConfirmClass(ConfirmClass),
    ConfirmSkills(ConfirmSkills),
    ConfirmFeats(ConfirmFeats),
    ConfirmTalents(ConfirmTalents),
    ConfirmAbilityIncreases(ConfirmAbilityIncreases),
}

impl ProgressionAction {
    pub fn step(&self) -> Step {
        match self {
            ProgressionAction::ConfirmSpecies(_) => Step::Species,
            ProgressionAction::ConfirmBackground(_) => Step::Background,
            ProgressionAction::ConfirmAbilities(_) => Step::Abilities,
            ProgressionAction::ConfirmClass(_) => Step::Class,
            ProgressionAction::ConfirmSkills(_) => Step::Skills,
            ProgressionAction::ConfirmFeats(_) => Step::Feats,
            ProgressionAction::ConfirmTalents(_) => Step::Talents,
            ProgressionAction::ConfirmAbilityIncreases(_) => Step::AbilityIncreases,
        }
    }

    /// Action name as external callers spell it (`confirm_species`, ...).
    pub fn name(&self) -> &'static str {
        self.into()
    }

    pub fn species(species_id: &str, free_ability: Option<Ability>) -> Self {
        ProgressionAction::ConfirmSpecies(ConfirmSpecies {
            species_id: species_id.to_string(),
            free_ability,
        })
    }

    pub fn background(background_id: &str) -> Self {
        ProgressionAction::ConfirmBackground(ConfirmBackground {
            background_id: background_id.to_string(),
        })
    }

    pub fn abilities(scores: impl IntoIterator<Item = (Ability, i32)>) -> Self {
        ProgressionAction::ConfirmAbilities(ConfirmAbilities {
            scores: scores.into_iter().collect(),
        })
    }

    pub fn class(class_id: &str, multiclass_feat: Option<&str>) -> Self {
        ProgressionAction::ConfirmClass(ConfirmClass {
            class_id: class_id.to_string(),
            multiclass_feat: multiclass_feat.map(str::to_string),
        })
    }

    pub fn skills(entries: impl IntoIterator<Item = SkillInput>) -> Self {
        ProgressionAction::ConfirmSkills(ConfirmSkills {
            entries: entries.into_iter().collect(),
        })
    }

    pub fn feats<S: Into<String>>(feats: impl IntoIterator<Item = S>) -> Self {
        ProgressionAction::ConfirmFeats(ConfirmFeats {
            feats: feats.into_iter().map(Into::into).collect(),
        })
    }

    pub fn talents<S: Into<String>>(talents: impl IntoIterator<Item = S>) -> Self {
        ProgressionAction::ConfirmTalents(ConfirmTalents {
            talents: talents.into_iter().map(Into::into).collect(),
        })
    }

    pub fn ability_increases(abilities: impl IntoIterator<Item = Ability>) -> Self {
        ProgressionAction::ConfirmAbilityIncreases(ConfirmAbilityIncreases {
            abilities: abilities.into_iter().collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actions_name_their_step() {
        let action = ProgressionAction::feats(["Toughness"]);
        assert_eq!(action.step(), Step::Feats);
        assert_eq!(action.name(), "confirm_feats");
        assert_eq!(
            ProgressionAction::ability_increases([Ability::Str]).name(),
            "confirm_ability_increases"
        );
    }

    #[test]
    fn bare_skill_names_count_one_rank() {
        let name = SkillInput::from("Pilot");
        assert_eq!((name.key(), name.ranks()), ("Pilot", 1));
        let ranks = SkillInput::Ranks {
            key: "stealth".into(),
            ranks: 3,
        };
        assert_eq!((ranks.key(), ranks.ranks()), ("stealth", 3));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn envelope_accepts_mixed_skill_shapes() {
        let json = r#"{"action":"confirm_skills","payload":{"entries":["Pilot",{"key":"stealth","ranks":2}]}}"#;
        let action: ProgressionAction = serde_json::from_str(json).expect("parse");
        assert_eq!(
            action,
            ProgressionAction::skills([
                SkillInput::from("Pilot"),
                SkillInput::Ranks {
                    key: "stealth".into(),
                    ranks: 2
                },
            ])
        );
    }
}
