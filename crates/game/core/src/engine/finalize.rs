//! Finalize helpers: hit point sync and item materialization.

use std::collections::BTreeSet;

use crate::env::RulesEnv;
use crate::state::{
    Actor, FieldWrite, HitPoints, ItemType, OwnedItem, PrimaryState, ProgressionMode,
    normalize_key,
};
use crate::stats::{DerivationWarning, compute_all};

/// Name of an item created by finalize.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MaterializedItem {
    pub item_type: ItemType,
    pub name: String,
    /// The item catalog had no record; a bare item was created instead.
    pub unresolved: bool,
}

fn max_hp_of(actor: &Actor, primary: &PrimaryState, env: &RulesEnv<'_>) -> i32 {
    let scratch = Actor::from_primary(actor.id, actor.name.clone(), actor.kind, primary.clone());
    compute_all(&scratch, env).hp.max
}

/// Hit points after the level lands. Chargen starts at full health; a
/// level-up adds the gain in maximum to the current value.
pub(super) fn synced_hit_points(
    actor: &Actor,
    staged: &PrimaryState,
    mode: ProgressionMode,
    env: &RulesEnv<'_>,
) -> HitPoints {
    let max = max_hp_of(actor, staged, env);
    let current = staged.hp;
    let value = match mode {
        ProgressionMode::Chargen => max,
        ProgressionMode::LevelUp => {
            let previous = max_hp_of(actor, actor.primary(), env);
            (current.value + (max - previous)).clamp(0, max)
        }
    };
    HitPoints {
        value,
        max,
        ..current
    }
}

/// Feat, talent and force power names the staged character should own as
/// items, in grant order.
fn wanted_items(staged: &PrimaryState, env: &RulesEnv<'_>) -> Vec<(ItemType, String)> {
    let tables = env.tables();
    let mut wanted = Vec::new();
    for (_, grant) in staged.feats.iter() {
        wanted.push((ItemType::Feat, grant.name.clone()));
        if let Some(def) = tables.feat_or_base(&grant.name) {
            for power in &def.grants_powers {
                wanted.push((ItemType::ForcePower, power.clone()));
            }
        }
    }
    for (_, grant) in staged.talents.iter() {
        wanted.push((ItemType::Talent, grant.name.clone()));
    }
    wanted
}

/// Queues an `AddItem` write for every wanted name not already owned.
/// Deduplicates by type plus normalized name, both against owned items and
/// within the batch.
pub(super) fn materialize(
    staged: &PrimaryState,
    env: &RulesEnv<'_>,
    writes: &mut Vec<FieldWrite>,
) -> (Vec<MaterializedItem>, Vec<DerivationWarning>) {
    let mut seen = BTreeSet::new();
    let mut created = Vec::new();
    let mut warnings = Vec::new();

    for (item_type, name) in wanted_items(staged, env) {
        if staged.owns_item(item_type, &name) || !seen.insert((item_type, normalize_key(&name))) {
            continue;
        }
        let (item, unresolved) = match env.items().resolve(item_type, &name) {
            Some(item) => (item, false),
            None => {
                let warning = DerivationWarning::UnresolvedItem {
                    item_type,
                    name: name.clone(),
                };
                warning.log();
                warnings.push(warning);
                (OwnedItem::bare(item_type, &name), true)
            }
        };
        created.push(MaterializedItem {
            item_type,
            name: item.name.clone(),
            unresolved,
        });
        writes.push(FieldWrite::AddItem(item));
    }
    (created, warnings)
}
