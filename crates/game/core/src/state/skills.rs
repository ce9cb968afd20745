use super::Ability;

/// Per-skill primary state, keyed by normalized skill key in [`super::PrimaryState`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SkillState {
    pub ranks: u32,
    /// Trained without spending ranks (background, species, Skill Training).
    pub trained: bool,
    pub focused: bool,
    /// Overrides the skill's default key ability.
    pub selected_ability: Option<Ability>,
}

impl SkillState {
    pub fn is_trained(&self) -> bool {
        self.trained || self.ranks > 0
    }
}
