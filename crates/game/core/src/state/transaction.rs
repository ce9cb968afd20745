//! Atomic primary-state updates.
//!
//! Writes are queued on an [`ActorUpdateTransaction`] and committed together:
//! the batch is applied to a copy, the copy is handed to the [`ActorStore`],
//! and only once the store accepts it does the actor see the new state. A
//! failed write leaves the actor exactly as it was.

use super::{
    AbilityScores, Actor, ActorId, ActiveEffect, ClassLevel, GrantOrigin, HitPoints, ItemId,
    OwnedItem, PrimaryState, ProgressionState, Size, SkillState, normalize_key,
};
use crate::error::{ErrorSeverity, GameError};
use crate::stats::ConditionTrack;

/// Error reported by a persistence backend.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct StoreError {
    pub message: String,
}

impl StoreError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Persistence port for committed primary state.
pub trait ActorStore: Send {
    fn write(&mut self, actor: ActorId, primary: &PrimaryState) -> Result<(), StoreError>;
}

/// Store that accepts every write. Useful when persistence lives elsewhere.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullStore;

impl ActorStore for NullStore {
    fn write(&mut self, _actor: ActorId, _primary: &PrimaryState) -> Result<(), StoreError> {
        Ok(())
    }
}

/// The store rejected a commit. No queued write landed.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("transaction on {actor} failed ({writes} queued writes discarded): {source}")]
pub struct TransactionFailure {
    pub actor: ActorId,
    pub writes: usize,
    #[source]
    pub source: StoreError,
}

impl GameError for TransactionFailure {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Fatal
    }

    fn error_code(&self) -> &'static str {
        "TRANSACTION_FAILED"
    }
}

/// A single typed write to primary state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldWrite {
    Progression(ProgressionState),
    Species {
        id: String,
        size: Size,
        speed: u32,
    },
    Background(String),
    Abilities(AbilityScores),
    PushClassLevel(ClassLevel),
    /// Adds ranks and ORs the flags into an existing skill entry.
    MergeSkill {
        key: String,
        state: SkillState,
    },
    GrantFeat {
        name: String,
        origin: GrantOrigin,
        repeatable: bool,
    },
    GrantTalent {
        name: String,
        origin: GrantOrigin,
    },
    HitPoints(HitPoints),
    ConditionTrack(ConditionTrack),
    AddItem(OwnedItem),
    RemoveItem(ItemId),
    Equip {
        item: ItemId,
        equipped: bool,
    },
    AddEffect(ActiveEffect),
    RemoveEffect(String),
}

impl FieldWrite {
    pub fn apply(&self, primary: &mut PrimaryState) {
        match self {
            FieldWrite::Progression(progression) => primary.progression = progression.clone(),
            FieldWrite::Species { id, size, speed } => {
                primary.species = Some(id.clone());
                primary.size = *size;
                primary.speed = *speed;
            }
            FieldWrite::Background(id) => primary.background = Some(id.clone()),
            FieldWrite::Abilities(scores) => primary.abilities = scores.clone(),
            FieldWrite::PushClassLevel(entry) => primary.class_levels.push(entry.clone()),
            FieldWrite::MergeSkill { key, state } => {
                let entry = primary.skill_entry(key);
                entry.ranks += state.ranks;
                entry.trained |= state.trained;
                entry.focused |= state.focused;
                if state.selected_ability.is_some() {
                    entry.selected_ability = state.selected_ability;
                }
            }
            FieldWrite::GrantFeat {
                name,
                origin,
                repeatable,
            } => {
                primary.feats.grant(name, *origin, *repeatable);
            }
            FieldWrite::GrantTalent { name, origin } => {
                primary.talents.grant(name, *origin, false);
            }
            FieldWrite::HitPoints(hp) => primary.hp = *hp,
            FieldWrite::ConditionTrack(track) => primary.condition_track = *track,
            FieldWrite::AddItem(item) => {
                primary.insert_item(item.clone());
            }
            FieldWrite::RemoveItem(id) => primary.items.retain(|item| item.id != *id),
            FieldWrite::Equip { item, equipped } => {
                if let Some(owned) = primary.items.iter_mut().find(|owned| owned.id == *item) {
                    owned.equipped = *equipped;
                }
            }
            FieldWrite::AddEffect(effect) => primary.effects.push(effect.clone()),
            FieldWrite::RemoveEffect(label) => {
                let key = normalize_key(label);
                primary
                    .effects
                    .retain(|effect| normalize_key(&effect.label) != key);
            }
        }
    }

    /// Whether the write can change anything in the derived block.
    pub fn affects_derived(&self) -> bool {
        !matches!(self, FieldWrite::Progression(_))
    }
}

/// Result of a successful commit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CommitOutcome {
    pub revision: u64,
    /// A derived recompute is owed.
    pub derived_dirty: bool,
}

/// Batch of primary-state writes committed all-or-nothing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ActorUpdateTransaction {
    writes: Vec<FieldWrite>,
}

impl ActorUpdateTransaction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, write: FieldWrite) {
        self.writes.push(write);
    }

    pub fn with(mut self, write: FieldWrite) -> Self {
        self.push(write);
        self
    }

    pub fn extend(&mut self, other: ActorUpdateTransaction) {
        self.writes.extend(other.writes);
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    pub fn writes(&self) -> &[FieldWrite] {
        &self.writes
    }

    pub fn affects_derived(&self) -> bool {
        self.writes.iter().any(FieldWrite::affects_derived)
    }

    /// Applies every write, in order, to `primary`.
    pub fn apply_to(&self, primary: &mut PrimaryState) {
        for write in &self.writes {
            write.apply(primary);
        }
    }

    /// Returns a copy of `primary` with the batch applied.
    pub fn staged(&self, primary: &PrimaryState) -> PrimaryState {
        let mut staged = primary.clone();
        self.apply_to(&mut staged);
        staged
    }

    /// Commits the batch to `actor`, persisting through `store` first.
    pub fn commit(
        self,
        actor: &mut Actor,
        store: &mut dyn ActorStore,
    ) -> Result<CommitOutcome, TransactionFailure> {
        let staged = self.staged(actor.primary());
        store
            .write(actor.id, &staged)
            .map_err(|source| TransactionFailure {
                actor: actor.id,
                writes: self.writes.len(),
                source,
            })?;

        let derived_dirty = self.affects_derived();
        actor.replace_primary(staged);
        if derived_dirty {
            actor.recalc_mut().mark_dirty();
        }
        tracing::debug!(
            actor = %actor.id,
            writes = self.writes.len(),
            revision = actor.revision(),
            "committed actor update"
        );
        Ok(CommitOutcome {
            revision: actor.revision(),
            derived_dirty,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{ActorKind, ItemType};

    struct FailingStore;

    impl ActorStore for FailingStore {
        fn write(&mut self, _actor: ActorId, _primary: &PrimaryState) -> Result<(), StoreError> {
            Err(StoreError::new("disk full"))
        }
    }

    #[test]
    fn commit_applies_every_write() {
        let mut actor = Actor::new(ActorId(7), "Kira", ActorKind::Character);
        let tx = ActorUpdateTransaction::new()
            .with(FieldWrite::Background("Spacer".into()))
            .with(FieldWrite::GrantFeat {
                name: "Toughness".into(),
                origin: GrantOrigin::Chosen,
                repeatable: false,
            })
            .with(FieldWrite::AddItem(OwnedItem::bare(ItemType::Feat, "Toughness")));

        let outcome = tx.commit(&mut actor, &mut NullStore).expect("commit");
        assert_eq!(outcome.revision, 1);
        assert!(outcome.derived_dirty);
        assert_eq!(actor.primary().background.as_deref(), Some("Spacer"));
        assert!(actor.primary().feats.contains("toughness"));
        assert_eq!(actor.primary().items.len(), 1);
    }

    #[test]
    fn failed_store_write_leaves_state_untouched() {
        let mut actor = Actor::new(ActorId(7), "Kira", ActorKind::Character);
        let before = actor.primary().clone();
        let tx = ActorUpdateTransaction::new()
            .with(FieldWrite::Background("Spacer".into()))
            .with(FieldWrite::HitPoints(HitPoints {
                value: 5,
                max: 5,
                ..HitPoints::default()
            }));

        let err = tx.commit(&mut actor, &mut FailingStore).unwrap_err();
        assert_eq!(err.writes, 2);
        assert_eq!(actor.primary(), &before);
        assert_eq!(actor.revision(), 0);
    }

    #[test]
    fn merge_skill_accumulates_ranks() {
        let mut primary = PrimaryState::default();
        let tx = ActorUpdateTransaction::new()
            .with(FieldWrite::MergeSkill {
                key: "Pilot".into(),
                state: SkillState {
                    trained: true,
                    ..SkillState::default()
                },
            })
            .with(FieldWrite::MergeSkill {
                key: "pilot".into(),
                state: SkillState {
                    ranks: 3,
                    ..SkillState::default()
                },
            });
        tx.apply_to(&mut primary);
        let pilot = primary.skill("Pilot").expect("pilot");
        assert_eq!(pilot.ranks, 3);
        assert!(pilot.trained);
    }

    #[test]
    fn progression_only_writes_do_not_dirty_derived() {
        let tx = ActorUpdateTransaction::new()
            .with(FieldWrite::Progression(ProgressionState::default()));
        assert!(!tx.affects_derived());
    }

    #[test]
    fn gear_and_effect_writes_apply_in_order() {
        let mut primary = PrimaryState::default();
        let vest = ItemId(primary.next_item_id);
        ActorUpdateTransaction::new()
            .with(FieldWrite::AddItem(OwnedItem::bare(ItemType::Armor, "Blast Vest")))
            .with(FieldWrite::Equip {
                item: vest,
                equipped: true,
            })
            .with(FieldWrite::AddEffect(ActiveEffect {
                label: "Stimmed".into(),
                ..ActiveEffect::default()
            }))
            .with(FieldWrite::ConditionTrack(ConditionTrack::new(2, true)))
            .apply_to(&mut primary);
        assert!(primary.item(vest).is_some_and(|item| item.equipped));
        assert_eq!(primary.effects.len(), 1);
        assert_eq!(primary.condition_track.current(), 2);

        ActorUpdateTransaction::new()
            .with(FieldWrite::RemoveEffect("STIMMED".into()))
            .with(FieldWrite::RemoveItem(vest))
            .apply_to(&mut primary);
        assert!(primary.effects.is_empty());
        assert!(primary.item(vest).is_none());
    }
}
