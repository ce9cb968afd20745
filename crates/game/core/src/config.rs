//! Rule-set tunables.
//!
//! Everything that differs between printings, house rules or campaigns lives
//! here instead of being hard-coded in the calculators. The struct is injected
//! into the engine together with the rule tables and never mutated.

use crate::env::BabProgression;
use crate::state::Ability;
use crate::stats::LoadState;

/// How hit points are granted for the very first class level a character takes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case")]
pub enum FirstLevelHp {
    /// `hit die + CON mod`.
    #[default]
    HitDie,
    /// `3 × hit die + CON mod` (heroic house rule, character level 1 only).
    TripleHitDie,
}

/// Point-buy parameters for the abilities step.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PointBuyRules {
    pub budget: u32,
    pub min_score: i32,
    pub max_score: i32,
    /// Cumulative cost to raise a score from `min_score` to the indexed value.
    /// `costs[0]` is the cost of `min_score` itself.
    pub costs: Vec<u32>,
}

impl PointBuyRules {
    /// Cost of a single score, or `None` if it lies outside the purchasable range.
    pub fn cost_of(&self, score: i32) -> Option<u32> {
        if score < self.min_score || score > self.max_score {
            return None;
        }
        self.costs.get((score - self.min_score) as usize).copied()
    }
}

impl Default for PointBuyRules {
    fn default() -> Self {
        Self {
            budget: 25,
            min_score: 8,
            max_score: 18,
            costs: vec![0, 1, 2, 3, 4, 5, 6, 8, 10, 13, 16],
        }
    }
}

/// Penalties attached to a load state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LoadPenalty {
    /// Added to every skill flagged `armor_check`.
    pub skill: i32,
    /// Percentage of base speed kept (100 = unchanged).
    pub speed_percent: u32,
}

/// Carrying-capacity thresholds, expressed as a percentage of `STR² × size factor`.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EncumbranceRules {
    pub light_percent: u32,
    pub medium_percent: u32,
    pub heavy_percent: u32,
    pub light: LoadPenalty,
    pub medium: LoadPenalty,
    pub heavy: LoadPenalty,
    pub overload: LoadPenalty,
}

impl EncumbranceRules {
    pub fn penalty(&self, load: LoadState) -> LoadPenalty {
        match load {
            LoadState::Light => self.light,
            LoadState::Medium => self.medium,
            LoadState::Heavy => self.heavy,
            LoadState::Overloaded => self.overload,
        }
    }
}

impl Default for EncumbranceRules {
    fn default() -> Self {
        Self {
            light_percent: 50,
            medium_percent: 75,
            heavy_percent: 100,
            light: LoadPenalty {
                skill: 0,
                speed_percent: 100,
            },
            medium: LoadPenalty {
                skill: -2,
                speed_percent: 75,
            },
            heavy: LoadPenalty {
                skill: -5,
                speed_percent: 75,
            },
            overload: LoadPenalty {
                skill: -10,
                speed_percent: 0,
            },
        }
    }
}

/// Defense bonus granted by each class defense category.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DefenseCategoryBonuses {
    pub low: i32,
    pub medium: i32,
    pub high: i32,
}

impl Default for DefenseCategoryBonuses {
    fn default() -> Self {
        Self {
            low: 0,
            medium: 1,
            high: 2,
        }
    }
}

/// Complete rule-set configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RulesConfig {
    pub point_buy: PointBuyRules,
    pub first_level_hp: FirstLevelHp,
    /// Hit die assumed when a class is missing from the tables.
    pub default_hit_die: u32,
    /// BAB progression assumed when a class is missing from the tables.
    pub default_bab: BabProgression,
    pub trained_skill_bonus: i32,
    pub skill_focus_bonus: i32,
    pub defense_bonuses: DefenseCategoryBonuses,
    /// A general feat is gained at every multiple of this character level.
    pub feat_interval: u32,
    /// Ability increases are gained at every multiple of this character level.
    pub ability_increase_interval: u32,
    /// Number of distinct abilities raised by +1 at each increase milestone.
    pub ability_increase_count: u32,
    /// Penalty per condition-track step, indexed by step (0 = Normal … 5 = Helpless).
    pub condition_penalties: [i32; 6],
    pub encumbrance: EncumbranceRules,
}

impl RulesConfig {
    pub const DEFAULT_HIT_DIE: u32 = 6;
    pub const CONDITION_PENALTIES: [i32; 6] = [0, -1, -2, -5, -10, 0];

    pub fn new() -> Self {
        Self {
            point_buy: PointBuyRules::default(),
            first_level_hp: FirstLevelHp::HitDie,
            default_hit_die: Self::DEFAULT_HIT_DIE,
            default_bab: BabProgression::Medium,
            trained_skill_bonus: 5,
            skill_focus_bonus: 5,
            defense_bonuses: DefenseCategoryBonuses::default(),
            feat_interval: 3,
            ability_increase_interval: 4,
            ability_increase_count: 2,
            condition_penalties: Self::CONDITION_PENALTIES,
            encumbrance: EncumbranceRules::default(),
        }
    }

    pub fn with_first_level_hp(mut self, policy: FirstLevelHp) -> Self {
        self.first_level_hp = policy;
        self
    }

    /// Ability that drives the skill-point budget.
    pub const fn skill_point_ability(&self) -> Ability {
        Ability::Int
    }
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_buy_costs_follow_table() {
        let rules = PointBuyRules::default();
        assert_eq!(rules.cost_of(8), Some(0));
        assert_eq!(rules.cost_of(13), Some(5));
        assert_eq!(rules.cost_of(16), Some(10));
        assert_eq!(rules.cost_of(18), Some(16));
        assert_eq!(rules.cost_of(7), None);
        assert_eq!(rules.cost_of(19), None);
    }

    #[test]
    fn encumbrance_penalty_lookup() {
        let rules = EncumbranceRules::default();
        assert_eq!(rules.penalty(LoadState::Light).skill, 0);
        assert_eq!(rules.penalty(LoadState::Heavy).skill, -5);
        assert_eq!(rules.penalty(LoadState::Overloaded).speed_percent, 0);
    }
}
