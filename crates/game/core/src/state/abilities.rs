//! Ability scores.
//!
//! Each ability keeps its components separately; `total` and `modifier` are
//! always computed and never stored as an independent source of truth.

use strum::IntoEnumIterator;

/// The six abilities.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::IntoStaticStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "UPPERCASE"))]
#[strum(ascii_case_insensitive)]
pub enum Ability {
    #[strum(to_string = "STR", serialize = "Strength")]
    Str,
    #[strum(to_string = "DEX", serialize = "Dexterity")]
    Dex,
    #[strum(to_string = "CON", serialize = "Constitution")]
    Con,
    #[strum(to_string = "INT", serialize = "Intelligence")]
    Int,
    #[strum(to_string = "WIS", serialize = "Wisdom")]
    Wis,
    #[strum(to_string = "CHA", serialize = "Charisma")]
    Cha,
}

/// Ability modifier for a score: `floor((score - 10) / 2)`.
pub const fn ability_modifier(score: i32) -> i32 {
    (score - 10).div_euclid(2)
}

/// Components of a single ability score.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AbilityScore {
    /// Purchased score. Written only by the abilities step.
    pub base: i32,
    /// Species adjustment (including a free ability choice).
    pub racial: i32,
    /// Level-milestone increases.
    pub advancement: i32,
    /// Enhancement and miscellaneous bonuses.
    pub misc: i32,
    /// Temporary adjustments.
    pub temp: i32,
}

impl AbilityScore {
    pub const fn new(base: i32) -> Self {
        Self {
            base,
            racial: 0,
            advancement: 0,
            misc: 0,
            temp: 0,
        }
    }

    pub const fn total(&self) -> i32 {
        self.base + self.racial + self.advancement + self.misc + self.temp
    }

    pub const fn modifier(&self) -> i32 {
        ability_modifier(self.total())
    }
}

impl Default for AbilityScore {
    fn default() -> Self {
        Self::new(10)
    }
}

/// All six ability scores.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AbilityScores {
    pub str: AbilityScore,
    pub dex: AbilityScore,
    pub con: AbilityScore,
    pub int: AbilityScore,
    pub wis: AbilityScore,
    pub cha: AbilityScore,
}

impl AbilityScores {
    /// Builds scores from base values in STR, DEX, CON, INT, WIS, CHA order.
    pub fn from_bases(str: i32, dex: i32, con: i32, int: i32, wis: i32, cha: i32) -> Self {
        Self {
            str: AbilityScore::new(str),
            dex: AbilityScore::new(dex),
            con: AbilityScore::new(con),
            int: AbilityScore::new(int),
            wis: AbilityScore::new(wis),
            cha: AbilityScore::new(cha),
        }
    }

    pub fn get(&self, ability: Ability) -> &AbilityScore {
        match ability {
            Ability::Str => &self.str,
            Ability::Dex => &self.dex,
            Ability::Con => &self.con,
            Ability::Int => &self.int,
            Ability::Wis => &self.wis,
            Ability::Cha => &self.cha,
        }
    }

    pub fn get_mut(&mut self, ability: Ability) -> &mut AbilityScore {
        match ability {
            Ability::Str => &mut self.str,
            Ability::Dex => &mut self.dex,
            Ability::Con => &mut self.con,
            Ability::Int => &mut self.int,
            Ability::Wis => &mut self.wis,
            Ability::Cha => &mut self.cha,
        }
    }

    pub fn total(&self, ability: Ability) -> i32 {
        self.get(ability).total()
    }

    pub fn modifier(&self, ability: Ability) -> i32 {
        self.get(ability).modifier()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Ability, &AbilityScore)> {
        Ability::iter().map(move |ability| (ability, self.get(ability)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modifier_floors_below_ten() {
        assert_eq!(ability_modifier(10), 0);
        assert_eq!(ability_modifier(11), 0);
        assert_eq!(ability_modifier(12), 1);
        assert_eq!(ability_modifier(9), -1);
        assert_eq!(ability_modifier(8), -1);
        assert_eq!(ability_modifier(7), -2);
        assert_eq!(ability_modifier(18), 4);
    }

    #[test]
    fn total_sums_components() {
        let mut score = AbilityScore::new(14);
        score.racial = 2;
        score.advancement = 1;
        score.temp = -2;
        assert_eq!(score.total(), 15);
        assert_eq!(score.modifier(), 2);
    }

    #[test]
    fn ability_parses_short_and_long_names() {
        assert_eq!("DEX".parse::<Ability>().ok(), Some(Ability::Dex));
        assert_eq!("dex".parse::<Ability>().ok(), Some(Ability::Dex));
        assert_eq!("Strength".parse::<Ability>().ok(), Some(Ability::Str));
        assert_eq!(Ability::Wis.to_string(), "WIS");
        assert!("Luck".parse::<Ability>().is_err());
    }
}
