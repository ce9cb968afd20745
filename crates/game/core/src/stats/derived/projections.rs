use std::collections::BTreeMap;

use super::{ActionEntry, DerivedBlock};
use crate::state::{ItemType, PrimaryState};

const UNGROUPED: &str = "General";

fn group_names(primary: &PrimaryState, item_type: ItemType) -> BTreeMap<String, Vec<String>> {
    let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for item in primary.items.iter().filter(|item| item.item_type == item_type) {
        let group = item.group.clone().unwrap_or_else(|| UNGROUPED.to_string());
        groups.entry(group).or_default().push(item.name.clone());
    }
    for names in groups.values_mut() {
        names.sort();
    }
    groups
}

/// Rebuilds the item-derived lists: feats by type, talents by tree, powers
/// and the action catalog grouped by action cost.
pub fn refresh_projections(block: &mut DerivedBlock, primary: &PrimaryState) {
    block.feats = group_names(primary, ItemType::Feat);
    block.talents = group_names(primary, ItemType::Talent);

    let mut powers: Vec<String> = primary
        .items
        .iter()
        .filter(|item| item.item_type == ItemType::ForcePower)
        .map(|item| item.name.clone())
        .collect();
    powers.sort();
    block.powers = powers;

    block.actions.clear();
    for item in &primary.items {
        // Gear only offers its action while equipped.
        if item.item_type.is_gear() && !item.equipped {
            continue;
        }
        if let Some(cost) = item.action {
            block.actions.entry(cost).or_default().push(ActionEntry {
                item: item.id,
                name: item.name.clone(),
                item_type: item.item_type,
            });
        }
    }
    for entries in block.actions.values_mut() {
        entries.sort_by(|a, b| a.name.cmp(&b.name));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{ActionCost, OwnedItem};

    #[test]
    fn projections_group_owned_items() {
        let mut primary = PrimaryState::default();
        primary.insert_item(OwnedItem::bare(ItemType::Feat, "Toughness"));
        primary.insert_item(OwnedItem::bare(ItemType::Feat, "Power Attack").with_group("Combat"));
        primary.insert_item(
            OwnedItem::bare(ItemType::Talent, "Block")
                .with_group("Jedi Guardian")
                .with_action(ActionCost::Reaction),
        );
        primary.insert_item(
            OwnedItem::bare(ItemType::ForcePower, "Move Object").with_action(ActionCost::Standard),
        );
        primary.insert_item(
            OwnedItem::bare(ItemType::Equipment, "Medpac").with_action(ActionCost::FullRound),
        );

        let mut block = DerivedBlock::default();
        refresh_projections(&mut block, &primary);

        assert_eq!(block.feats["General"], vec!["Toughness"]);
        assert_eq!(block.feats["Combat"], vec!["Power Attack"]);
        assert_eq!(block.talents["Jedi Guardian"], vec!["Block"]);
        assert_eq!(block.powers, vec!["Move Object"]);
        assert_eq!(block.actions[&ActionCost::Reaction][0].name, "Block");
        assert_eq!(block.actions[&ActionCost::Standard][0].name, "Move Object");
        // Unequipped gear contributes no action.
        assert!(!block.actions.contains_key(&ActionCost::FullRound));
    }
}
