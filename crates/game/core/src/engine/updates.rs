//! Updates outside a progression: condition track, gear and active effects.
//!
//! Each call queues its writes on one [`ActorUpdateTransaction`], commits it
//! inside a mutation context and then runs a single recompute, the same
//! discipline finalize follows.

use super::UpdateError;
use crate::env::RulesEnv;
use crate::state::{
    ActiveEffect, Actor, ActorStore, ActorUpdateTransaction, FieldWrite, ItemId, OwnedItem,
    normalize_key,
};
use crate::stats::{ConditionTrack, DerivedHook, RecalcStatus, Recalculator};

/// Result of one [`ActorUpdates`] call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UpdateOutcome {
    /// False when the request was refused or already held; nothing was written.
    pub changed: bool,
    pub revision: u64,
    /// `None` when nothing was committed or an outer mutation context owns the
    /// recompute.
    pub recalc: Option<RecalcStatus>,
}

/// Writes primary state of one actor between progressions.
pub struct ActorUpdates<'a> {
    actor: &'a mut Actor,
    env: RulesEnv<'a>,
    store: &'a mut dyn ActorStore,
    hooks: &'a [Box<dyn DerivedHook>],
}

impl<'a> ActorUpdates<'a> {
    pub fn new(actor: &'a mut Actor, env: RulesEnv<'a>, store: &'a mut dyn ActorStore) -> Self {
        Self {
            actor,
            env,
            store,
            hooks: &[],
        }
    }

    pub fn with_hooks(mut self, hooks: &'a [Box<dyn DerivedHook>]) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn actor(&self) -> &Actor {
        self.actor
    }

    fn unchanged(&self) -> UpdateOutcome {
        UpdateOutcome {
            changed: false,
            revision: self.actor.revision(),
            recalc: None,
        }
    }

    /// Commits `tx` as one batch, then recomputes once.
    pub fn commit(&mut self, tx: ActorUpdateTransaction) -> Result<UpdateOutcome, UpdateError> {
        if tx.is_empty() {
            return Ok(self.unchanged());
        }

        self.actor.begin_mutation();
        let committed = tx.commit(&mut *self.actor, &mut *self.store);
        let owed = self.actor.end_mutation();
        committed?;

        let recalc = owed
            .then(|| Recalculator::with_hooks(self.env, self.hooks).recompute(self.actor));
        Ok(UpdateOutcome {
            changed: true,
            revision: self.actor.revision(),
            recalc,
        })
    }

    fn update_track(
        &mut self,
        change: impl FnOnce(&mut ConditionTrack) -> bool,
    ) -> Result<UpdateOutcome, UpdateError> {
        let current = self.actor.primary().condition_track;
        let mut track = current;
        if !change(&mut track) || track == current {
            return Ok(self.unchanged());
        }
        tracing::debug!(
            actor = %self.actor.id,
            from = current.current(),
            to = track.current(),
            "condition track moved"
        );
        self.commit(ActorUpdateTransaction::new().with(FieldWrite::ConditionTrack(track)))
    }

    /// Moves down the track. Never blocked by persistence.
    pub fn worsen_condition(&mut self, steps: u8) -> Result<UpdateOutcome, UpdateError> {
        self.update_track(|track| {
            track.worsen(steps);
            true
        })
    }

    /// Moves up the track. A persistent condition needs `force`; without it
    /// the outcome reports `changed = false`.
    pub fn improve_condition(&mut self, steps: u8, force: bool) -> Result<UpdateOutcome, UpdateError> {
        self.update_track(|track| track.improve(steps, force))
    }

    pub fn set_condition_step(&mut self, step: i32, force: bool) -> Result<UpdateOutcome, UpdateError> {
        self.update_track(|track| track.set_step(step, force))
    }

    pub fn set_condition_persistent(&mut self, persistent: bool) -> Result<UpdateOutcome, UpdateError> {
        self.update_track(|track| {
            track.persistent = persistent;
            true
        })
    }

    /// Adds an item and returns the id it will be stored under.
    pub fn add_item(&mut self, item: OwnedItem) -> Result<(ItemId, UpdateOutcome), UpdateError> {
        let id = ItemId(self.actor.primary().next_item_id);
        let outcome = self.commit(ActorUpdateTransaction::new().with(FieldWrite::AddItem(item)))?;
        Ok((id, outcome))
    }

    fn owned(&self, item: ItemId) -> Result<&OwnedItem, UpdateError> {
        self.actor
            .primary()
            .item(item)
            .ok_or(UpdateError::UnknownItem {
                actor: self.actor.id,
                item,
            })
    }

    pub fn set_equipped(&mut self, item: ItemId, equipped: bool) -> Result<UpdateOutcome, UpdateError> {
        if self.owned(item)?.equipped == equipped {
            return Ok(self.unchanged());
        }
        self.commit(ActorUpdateTransaction::new().with(FieldWrite::Equip { item, equipped }))
    }

    /// Removes an item. Effects it granted stop applying with it.
    pub fn remove_item(&mut self, item: ItemId) -> Result<UpdateOutcome, UpdateError> {
        self.owned(item)?;
        self.commit(ActorUpdateTransaction::new().with(FieldWrite::RemoveItem(item)))
    }

    pub fn add_effect(&mut self, effect: ActiveEffect) -> Result<UpdateOutcome, UpdateError> {
        self.commit(ActorUpdateTransaction::new().with(FieldWrite::AddEffect(effect)))
    }

    /// Removes every effect whose label matches `label`, ignoring case.
    pub fn remove_effect(&mut self, label: &str) -> Result<UpdateOutcome, UpdateError> {
        let key = normalize_key(label);
        let present = self
            .actor
            .primary()
            .effects
            .iter()
            .any(|effect| normalize_key(&effect.label) == key);
        if !present {
            return Ok(self.unchanged());
        }
        self.commit(ActorUpdateTransaction::new().with(FieldWrite::RemoveEffect(label.to_string())))
    }
}
