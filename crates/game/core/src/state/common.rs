use core::fmt;

/// Unique identifier for a character (or any other actor) managed by the core.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActorId(pub u32);

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "actor#{}", self.0)
    }
}

/// Identifier of an item owned by a single actor. Allocated sequentially.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ItemId(pub u32);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "item#{}", self.0)
    }
}

/// Creature size category.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, strum::Display, strum::EnumString,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(ascii_case_insensitive)]
pub enum Size {
    Fine,
    Diminutive,
    Tiny,
    Small,
    #[default]
    Medium,
    Large,
    Huge,
    Gargantuan,
    Colossal,
}

impl Size {
    /// Carrying-capacity multiplier as a percentage of a Medium creature.
    pub const fn carry_percent(self) -> u32 {
        match self {
            Size::Fine => 12,
            Size::Diminutive => 25,
            Size::Tiny => 50,
            Size::Small => 75,
            Size::Medium => 100,
            Size::Large => 200,
            Size::Huge => 400,
            Size::Gargantuan => 800,
            Size::Colossal => 1600,
        }
    }
}

/// Canonical lookup key for rule-table ids and display names.
///
/// Lowercases and collapses every run of non-alphanumeric characters into a
/// single `_`, so `"Point-Blank Shot"`, `"point blank shot"` and
/// `"point_blank_shot"` all map to the same key.
pub fn normalize_key(raw: &str) -> String {
    let mut key = String::with_capacity(raw.len());
    let mut separator = false;
    for ch in raw.trim().chars() {
        if ch.is_alphanumeric() {
            if separator && !key.is_empty() {
                key.push('_');
            }
            separator = false;
            key.extend(ch.to_lowercase());
        } else {
            separator = true;
        }
    }
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_key_collapses_punctuation() {
        assert_eq!(normalize_key("Point-Blank Shot"), "point_blank_shot");
        assert_eq!(normalize_key("  point blank   shot "), "point_blank_shot");
        assert_eq!(normalize_key("Skill Focus (Pilot)"), "skill_focus_pilot");
        assert_eq!(normalize_key("Twi'lek"), "twi_lek");
        assert_eq!(normalize_key(""), "");
    }

    #[test]
    fn size_parses_case_insensitively() {
        assert_eq!("large".parse::<Size>().ok(), Some(Size::Large));
        assert_eq!(Size::Large.carry_percent(), 200);
    }
}
