use core::fmt;

use crate::state::ItemType;

/// Recoverable problem met while deriving stats.
///
/// Warnings are logged and collected into the derived block; they never
/// abort a recompute. Each one records the safe default that was used.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum DerivationWarning {
    /// Class missing from the tables; the default hit die and BAB were used.
    MissingClass { class_id: String },
    MissingSpecies { species_id: String },
    MissingFeat { name: String },
    MissingTalent { name: String },
    MissingSkill { key: String },
    /// Modifier with an unparseable target path; ignored.
    MalformedModifier { source: String, target: String },
    /// Name the item catalog could not resolve; a bare record was created.
    UnresolvedItem { item_type: ItemType, name: String },
}

impl DerivationWarning {
    /// Emits the warning through `tracing`.
    pub fn log(&self) {
        tracing::warn!(warning = %self, "derivation warning");
    }
}

impl fmt::Display for DerivationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DerivationWarning::MissingClass { class_id } => {
                write!(f, "class '{class_id}' not found in rule tables; using defaults")
            }
            DerivationWarning::MissingSpecies { species_id } => {
                write!(f, "species '{species_id}' not found in rule tables")
            }
            DerivationWarning::MissingFeat { name } => {
                write!(f, "feat '{name}' not found in rule tables")
            }
            DerivationWarning::MissingTalent { name } => {
                write!(f, "talent '{name}' not found in rule tables")
            }
            DerivationWarning::MissingSkill { key } => {
                write!(f, "skill '{key}' not found in rule tables")
            }
            DerivationWarning::MalformedModifier { source, target } => {
                write!(f, "modifier from {source} has malformed target '{target}'")
            }
            DerivationWarning::UnresolvedItem { item_type, name } => {
                write!(f, "{item_type} '{name}' could not be resolved; created a bare record")
            }
        }
    }
}
