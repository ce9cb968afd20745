//! The actor aggregate: primary state, derived block and recompute bookkeeping.

use std::collections::BTreeMap;

use super::{
    AbilityScores, ActorId, Grants, ItemId, ItemType, OwnedItem, ActiveEffect, ProgressionState,
    Size, SkillState, normalize_key,
};
use crate::stats::{ConditionTrack, DerivedBlock, RecalcGuard};

/// What kind of actor this is. Selects the per-kind derivation strategy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ActorKind {
    #[default]
    Character,
    Npc,
    Droid,
    Vehicle,
}

/// One gained level. `classLevels` holds one entry per level, in order.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClassLevel {
    pub class_id: String,
    /// Level reached in this class with this entry (1 for the first).
    pub level: u32,
    pub skill_points_budget: u32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct HitPoints {
    pub value: i32,
    pub max: i32,
    pub temp: i32,
    /// Flat hand-authored bonus to maximum hit points.
    pub bonus: i32,
}

/// Hand-authored and progression-written state. Everything else is derived.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PrimaryState {
    pub species: Option<String>,
    pub background: Option<String>,
    pub size: Size,
    /// Base speed in squares.
    pub speed: u32,
    pub abilities: AbilityScores,
    pub class_levels: Vec<ClassLevel>,
    pub skills: BTreeMap<String, SkillState>,
    pub feats: Grants,
    pub talents: Grants,
    pub hp: HitPoints,
    pub condition_track: ConditionTrack,
    pub items: Vec<OwnedItem>,
    pub effects: Vec<ActiveEffect>,
    pub next_item_id: u32,
    pub progression: ProgressionState,
}

impl Default for PrimaryState {
    fn default() -> Self {
        Self {
            species: None,
            background: None,
            size: Size::Medium,
            speed: 6,
            abilities: AbilityScores::default(),
            class_levels: Vec::new(),
            skills: BTreeMap::new(),
            feats: Grants::new(),
            talents: Grants::new(),
            hp: HitPoints::default(),
            condition_track: ConditionTrack::default(),
            items: Vec::new(),
            effects: Vec::new(),
            next_item_id: 1,
            progression: ProgressionState::default(),
        }
    }
}

impl PrimaryState {
    pub fn character_level(&self) -> u32 {
        self.class_levels.len() as u32
    }

    /// Levels held in one class.
    pub fn class_level(&self, class_id: &str) -> u32 {
        let key = normalize_key(class_id);
        self.class_levels
            .iter()
            .filter(|entry| normalize_key(&entry.class_id) == key)
            .count() as u32
    }

    pub fn has_class(&self, class_id: &str) -> bool {
        self.class_level(class_id) > 0
    }

    /// Distinct class ids in the order they were first taken.
    pub fn classes(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for entry in &self.class_levels {
            if !seen
                .iter()
                .any(|known| normalize_key(known) == normalize_key(&entry.class_id))
            {
                seen.push(&entry.class_id);
            }
        }
        seen
    }

    pub fn skill(&self, key: &str) -> Option<&SkillState> {
        self.skills.get(&normalize_key(key))
    }

    pub fn skill_entry(&mut self, key: &str) -> &mut SkillState {
        self.skills.entry(normalize_key(key)).or_default()
    }

    pub fn is_trained(&self, key: &str) -> bool {
        self.skill(key).is_some_and(SkillState::is_trained)
    }

    pub fn item(&self, id: ItemId) -> Option<&OwnedItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn owns_item(&self, item_type: ItemType, name: &str) -> bool {
        self.items.iter().any(|item| item.matches(item_type, name))
    }

    /// Inserts an item with a freshly allocated id.
    pub fn insert_item(&mut self, mut item: OwnedItem) -> ItemId {
        let id = ItemId(self.next_item_id);
        self.next_item_id += 1;
        item.id = id;
        self.items.push(item);
        id
    }
}

/// A character (or NPC, droid, vehicle).
///
/// Primary state is read-only from outside the crate; it changes only through
/// [`crate::ActorUpdateTransaction`] commits and the progression engine. The
/// derived block is never persisted and is rebuilt by the recalculator.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Actor {
    pub id: ActorId,
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub kind: ActorKind,
    primary: PrimaryState,
    #[cfg_attr(feature = "serde", serde(skip))]
    derived: DerivedBlock,
    #[cfg_attr(feature = "serde", serde(skip))]
    recalc: RecalcGuard,
    #[cfg_attr(feature = "serde", serde(default))]
    revision: u64,
}

impl Actor {
    pub fn new(id: ActorId, name: impl Into<String>, kind: ActorKind) -> Self {
        Self::from_primary(id, name, kind, PrimaryState::default())
    }

    /// Rehydrates an actor from stored primary state. The derived block starts
    /// empty and dirty.
    pub fn from_primary(
        id: ActorId,
        name: impl Into<String>,
        kind: ActorKind,
        primary: PrimaryState,
    ) -> Self {
        let mut recalc = RecalcGuard::default();
        recalc.mark_dirty();
        Self {
            id,
            name: name.into(),
            kind,
            primary,
            derived: DerivedBlock::default(),
            recalc,
            revision: 0,
        }
    }

    /// Restores the revision counter of a rehydrated actor.
    pub fn with_revision(mut self, revision: u64) -> Self {
        self.revision = revision;
        self
    }

    pub fn primary(&self) -> &PrimaryState {
        &self.primary
    }

    pub fn derived(&self) -> &DerivedBlock {
        &self.derived
    }

    /// Bumped on every committed transaction.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn recalc(&self) -> &RecalcGuard {
        &self.recalc
    }

    /// Enters a mutation context; recomputes requested inside it are deferred.
    pub fn begin_mutation(&mut self) {
        self.recalc.suppress();
    }

    /// Leaves a mutation context. Returns true when this closed the outermost
    /// context and a deferred recompute is owed.
    pub fn end_mutation(&mut self) -> bool {
        self.recalc.release()
    }

    pub fn in_mutation(&self) -> bool {
        self.recalc.is_suppressed()
    }

    pub(crate) fn primary_mut(&mut self) -> &mut PrimaryState {
        &mut self.primary
    }

    pub(crate) fn replace_primary(&mut self, primary: PrimaryState) {
        self.primary = primary;
        self.revision += 1;
    }

    pub(crate) fn derived_mut(&mut self) -> &mut DerivedBlock {
        &mut self.derived
    }

    pub(crate) fn recalc_mut(&mut self) -> &mut RecalcGuard {
        &mut self.recalc
    }
}
