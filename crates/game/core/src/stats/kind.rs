//! Per-kind overrides of the shared derivation.
//!
//! Characters, NPCs, droids and vehicles share one computation; the strategy
//! only swaps out the handful of inputs that differ.

use crate::state::{Ability, ActorKind};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KindStrategy {
    pub identity_label: &'static str,
    /// Ability feeding the Fortitude defense.
    pub fortitude_ability: Ability,
    /// Whether the CON modifier contributes hit points per level.
    pub con_adds_hp: bool,
    pub lists_skills: bool,
    /// Eligible for the triple-hit-die first level policy.
    pub heroic_hp: bool,
}

impl KindStrategy {
    pub const fn for_kind(kind: ActorKind) -> Self {
        match kind {
            ActorKind::Character => Self {
                identity_label: "Heroic Character",
                fortitude_ability: Ability::Con,
                con_adds_hp: true,
                lists_skills: true,
                heroic_hp: true,
            },
            ActorKind::Npc => Self {
                identity_label: "Nonheroic Character",
                fortitude_ability: Ability::Con,
                con_adds_hp: true,
                lists_skills: true,
                heroic_hp: false,
            },
            ActorKind::Droid => Self {
                identity_label: "Droid",
                fortitude_ability: Ability::Str,
                con_adds_hp: false,
                lists_skills: true,
                heroic_hp: false,
            },
            ActorKind::Vehicle => Self {
                identity_label: "Vehicle",
                fortitude_ability: Ability::Str,
                con_adds_hp: false,
                lists_skills: false,
                heroic_hp: false,
            },
        }
    }
}

impl From<ActorKind> for KindStrategy {
    fn from(kind: ActorKind) -> Self {
        Self::for_kind(kind)
    }
}
