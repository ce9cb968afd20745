use super::Encumbrance;
use crate::config::EncumbranceRules;
use crate::state::{Ability, PrimaryState};

/// Load category for carried weight.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, strum::Display,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case")]
pub enum LoadState {
    #[default]
    Light,
    Medium,
    Heavy,
    Overloaded,
}

/// Carrying capacity in kilograms: `STR² × size factor`.
pub fn capacity(primary: &PrimaryState) -> u32 {
    let strength = primary.abilities.total(Ability::Str).max(0) as u32;
    strength * strength * primary.size.carry_percent() / 100
}

pub fn classify(weight: u32, capacity: u32, rules: &EncumbranceRules) -> LoadState {
    let threshold = |percent: u32| capacity.saturating_mul(percent) / 100;
    if weight <= threshold(rules.light_percent) {
        LoadState::Light
    } else if weight <= threshold(rules.medium_percent) {
        LoadState::Medium
    } else if weight <= threshold(rules.heavy_percent) {
        LoadState::Heavy
    } else {
        LoadState::Overloaded
    }
}

/// Encumbrance from carried gear (equipped or not).
pub fn encumbrance(primary: &PrimaryState, rules: &EncumbranceRules) -> Encumbrance {
    let weight = primary
        .items
        .iter()
        .filter(|item| item.item_type.is_gear())
        .map(|item| item.total_weight())
        .sum();
    let capacity = capacity(primary);
    let load = classify(weight, capacity, rules);
    let penalty = rules.penalty(load);
    Encumbrance {
        weight,
        capacity,
        load,
        skill_penalty: penalty.skill,
        speed: primary.speed * penalty.speed_percent / 100,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{AbilityScores, ItemType, OwnedItem, Size};

    #[test]
    fn thresholds_split_capacity() {
        let rules = EncumbranceRules::default();
        assert_eq!(classify(50, 100, &rules), LoadState::Light);
        assert_eq!(classify(51, 100, &rules), LoadState::Medium);
        assert_eq!(classify(75, 100, &rules), LoadState::Medium);
        assert_eq!(classify(100, 100, &rules), LoadState::Heavy);
        assert_eq!(classify(101, 100, &rules), LoadState::Overloaded);
    }

    #[test]
    fn capacity_scales_with_size() {
        let mut primary = PrimaryState {
            abilities: AbilityScores::from_bases(10, 10, 10, 10, 10, 10),
            ..PrimaryState::default()
        };
        assert_eq!(capacity(&primary), 100);
        primary.size = Size::Large;
        assert_eq!(capacity(&primary), 200);
        primary.size = Size::Small;
        assert_eq!(capacity(&primary), 75);
    }

    #[test]
    fn heavy_load_slows_and_penalizes() {
        let mut primary = PrimaryState {
            abilities: AbilityScores::from_bases(10, 10, 10, 10, 10, 10),
            ..PrimaryState::default()
        };
        let mut crate_item = OwnedItem::bare(ItemType::Equipment, "Cargo Crate").with_weight(45);
        crate_item.quantity = 2;
        primary.insert_item(crate_item);
        primary.insert_item(OwnedItem::bare(ItemType::Feat, "Toughness").with_weight(500));

        let load = encumbrance(&primary, &EncumbranceRules::default());
        assert_eq!(load.weight, 90);
        assert_eq!(load.load, LoadState::Heavy);
        assert_eq!(load.skill_penalty, -5);
        assert_eq!(load.speed, 4);
    }
}
