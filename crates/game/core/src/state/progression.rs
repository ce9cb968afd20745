//! Progression bookkeeping: which steps are done and what has been chosen but
//! not yet finalized.
//!
//! Steps form a DAG `species → background → abilities → class → (skills |
//! feats | talents | ability increases)`. Level-up enters at `class`.
//! Re-confirming a step replaces its pending value and invalidates every step
//! downstream of it.

use std::collections::BTreeMap;

use bitflags::bitflags;
use strum::IntoEnumIterator;

use super::Ability;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "lowercase")]
pub enum ProgressionMode {
    #[default]
    Chargen,
    LevelUp,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case")]
pub enum ProgressionStatus {
    /// No progression has been started on this actor.
    #[default]
    Idle,
    InProgress,
    /// Terminal. A new progression must be started to make further changes.
    Finalized,
}

bitflags! {
    /// Steps confirmed in the current progression.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct CompletedSteps: u8 {
        const SPECIES           = 1 << 0;
        const BACKGROUND        = 1 << 1;
        const ABILITIES         = 1 << 2;
        const CLASS             = 1 << 3;
        const SKILLS            = 1 << 4;
        const FEATS             = 1 << 5;
        const TALENTS           = 1 << 6;
        const ABILITY_INCREASES = 1 << 7;
    }
}

/// A progression step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumIter)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case")]
pub enum Step {
    Species,
    Background,
    Abilities,
    Class,
    Skills,
    Feats,
    Talents,
    AbilityIncreases,
}

impl Step {
    pub const fn flag(self) -> CompletedSteps {
        match self {
            Step::Species => CompletedSteps::SPECIES,
            Step::Background => CompletedSteps::BACKGROUND,
            Step::Abilities => CompletedSteps::ABILITIES,
            Step::Class => CompletedSteps::CLASS,
            Step::Skills => CompletedSteps::SKILLS,
            Step::Feats => CompletedSteps::FEATS,
            Step::Talents => CompletedSteps::TALENTS,
            Step::AbilityIncreases => CompletedSteps::ABILITY_INCREASES,
        }
    }

    /// Whether the step may be confirmed at all in `mode`.
    pub const fn allowed_in(self, mode: ProgressionMode) -> bool {
        match mode {
            ProgressionMode::Chargen => !matches!(self, Step::AbilityIncreases),
            ProgressionMode::LevelUp => !matches!(
                self,
                Step::Species | Step::Background | Step::Abilities
            ),
        }
    }

    /// The step that must be complete before this one can be confirmed.
    pub const fn requires(self, mode: ProgressionMode) -> Option<Step> {
        match self {
            Step::Species => None,
            Step::Background => Some(Step::Species),
            Step::Abilities => Some(Step::Background),
            Step::Class => match mode {
                ProgressionMode::Chargen => Some(Step::Abilities),
                ProgressionMode::LevelUp => None,
            },
            Step::Skills | Step::Feats | Step::Talents | Step::AbilityIncreases => {
                Some(Step::Class)
            }
        }
    }

    /// Every step invalidated when this one is re-confirmed.
    pub fn downstream(self) -> CompletedSteps {
        let choices = CompletedSteps::SKILLS
            | CompletedSteps::FEATS
            | CompletedSteps::TALENTS
            | CompletedSteps::ABILITY_INCREASES;
        match self {
            Step::Species => {
                CompletedSteps::BACKGROUND
                    | CompletedSteps::ABILITIES
                    | CompletedSteps::CLASS
                    | choices
            }
            Step::Background => CompletedSteps::ABILITIES | CompletedSteps::CLASS | choices,
            Step::Abilities => CompletedSteps::CLASS | choices,
            Step::Class => choices,
            Step::Skills | Step::Feats | Step::Talents | Step::AbilityIncreases => {
                CompletedSteps::empty()
            }
        }
    }

    /// Steps that must be complete before `finalize` is accepted.
    pub fn required_for(mode: ProgressionMode) -> CompletedSteps {
        match mode {
            ProgressionMode::Chargen => {
                CompletedSteps::SPECIES
                    | CompletedSteps::BACKGROUND
                    | CompletedSteps::ABILITIES
                    | CompletedSteps::CLASS
            }
            ProgressionMode::LevelUp => CompletedSteps::CLASS,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PendingSpecies {
    pub species_id: String,
    pub free_ability: Option<Ability>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PendingClass {
    pub class_id: String,
    pub skill_points_budget: u32,
    /// Starting feats granted with this level (first class ever only).
    pub starting_feats: Vec<String>,
    pub multiclass_feat: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PendingSkill {
    pub key: String,
    pub ranks: u32,
}

/// Choices confirmed in the current progression but not yet finalized.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PendingSelections {
    pub species: Option<PendingSpecies>,
    pub background: Option<String>,
    /// Purchased base scores.
    pub abilities: Option<BTreeMap<Ability, i32>>,
    pub class: Option<PendingClass>,
    pub skills: Vec<PendingSkill>,
    pub feats: Vec<String>,
    pub talents: Vec<String>,
    pub ability_increases: Vec<Ability>,
}

impl PendingSelections {
    /// Drops the pending value owned by each step in `steps`.
    pub fn clear(&mut self, steps: CompletedSteps) {
        if steps.contains(CompletedSteps::SPECIES) {
            self.species = None;
        }
        if steps.contains(CompletedSteps::BACKGROUND) {
            self.background = None;
        }
        if steps.contains(CompletedSteps::ABILITIES) {
            self.abilities = None;
        }
        if steps.contains(CompletedSteps::CLASS) {
            self.class = None;
        }
        if steps.contains(CompletedSteps::SKILLS) {
            self.skills.clear();
        }
        if steps.contains(CompletedSteps::FEATS) {
            self.feats.clear();
        }
        if steps.contains(CompletedSteps::TALENTS) {
            self.talents.clear();
        }
        if steps.contains(CompletedSteps::ABILITY_INCREASES) {
            self.ability_increases.clear();
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ProgressionState {
    pub mode: ProgressionMode,
    pub status: ProgressionStatus,
    pub completed: CompletedSteps,
    /// Most recently confirmed step.
    pub current_step: Option<Step>,
    pub pending: PendingSelections,
}

impl ProgressionState {
    pub fn started(mode: ProgressionMode) -> Self {
        Self {
            mode,
            status: ProgressionStatus::InProgress,
            ..Self::default()
        }
    }

    pub fn is_complete(&self, step: Step) -> bool {
        self.completed.contains(step.flag())
    }

    /// Marks `step` complete and invalidates everything downstream of it.
    pub fn mark_confirmed(&mut self, step: Step) {
        let downstream = step.downstream();
        self.completed.remove(downstream);
        self.pending.clear(downstream);
        self.completed.insert(step.flag());
        self.current_step = Some(step);
    }

    /// Required steps still missing before finalize.
    pub fn missing_required(&self) -> Vec<Step> {
        let required = Step::required_for(self.mode);
        Step::iter()
            .filter(|step| required.contains(step.flag()) && !self.is_complete(*step))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_up_enters_at_class() {
        assert!(!Step::Species.allowed_in(ProgressionMode::LevelUp));
        assert!(Step::Class.allowed_in(ProgressionMode::LevelUp));
        assert_eq!(Step::Class.requires(ProgressionMode::LevelUp), None);
        assert_eq!(
            Step::Class.requires(ProgressionMode::Chargen),
            Some(Step::Abilities)
        );
        assert!(!Step::AbilityIncreases.allowed_in(ProgressionMode::Chargen));
    }

    #[test]
    fn reconfirming_invalidates_downstream() {
        let mut state = ProgressionState::started(ProgressionMode::Chargen);
        for step in [Step::Species, Step::Background, Step::Abilities, Step::Class] {
            state.mark_confirmed(step);
        }
        state.pending.feats.push("Toughness".into());
        state.mark_confirmed(Step::Feats);

        state.mark_confirmed(Step::Abilities);
        assert!(state.is_complete(Step::Species));
        assert!(state.is_complete(Step::Abilities));
        assert!(!state.is_complete(Step::Class));
        assert!(!state.is_complete(Step::Feats));
        assert!(state.pending.feats.is_empty());
    }

    #[test]
    fn missing_required_lists_spine_steps() {
        let mut state = ProgressionState::started(ProgressionMode::Chargen);
        state.mark_confirmed(Step::Species);
        assert_eq!(
            state.missing_required(),
            vec![Step::Background, Step::Abilities, Step::Class]
        );
    }
}
