//! Cloneable façade for issuing commands to one character worker.
//!
//! [`CharacterHandle`] hides channel plumbing and offers async helpers for
//! driving a progression or streaming events from specific topics.

use tokio::sync::{broadcast, mpsc, oneshot};

use saga_core::{
    ActiveEffect, Actor, ActorId, Budgets, FinalizeOutcome, ItemId, OwnedItem, ProgressionAction,
    ProgressionMode, Step, UpdateOutcome,
};

use super::errors::{Result, RuntimeError};
use crate::events::{Event, EventBus, Topic};
use crate::workers::{Command, UpdateRequest};

/// Client-facing handle to one character
#[derive(Clone)]
pub struct CharacterHandle {
    actor: ActorId,
    command_tx: mpsc::Sender<Command>,
    event_bus: EventBus,
}

impl CharacterHandle {
    pub(crate) fn new(actor: ActorId, command_tx: mpsc::Sender<Command>, event_bus: EventBus) -> Self {
        Self {
            actor,
            command_tx,
            event_bus,
        }
    }

    pub fn actor_id(&self) -> ActorId {
        self.actor
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(command(reply_tx))
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)?;

        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)
    }

    /// Open a chargen or level-up progression.
    pub async fn begin(&self, mode: ProgressionMode) -> Result<()> {
        self.request(|reply| Command::Begin { mode, reply }).await?
    }

    /// Validate and record one step. State is unchanged on error.
    pub async fn do_action(&self, action: ProgressionAction) -> Result<Step> {
        self.request(|reply| Command::DoAction { action, reply })
            .await?
    }

    /// Land the pending selections. The completion event is published
    /// before this returns; the modifier pass may still be running.
    pub async fn finalize(&self) -> Result<FinalizeOutcome> {
        self.request(|reply| Command::Finalize { reply }).await?
    }

    pub async fn cancel(&self) -> Result<()> {
        self.request(|reply| Command::Cancel { reply }).await?
    }

    /// Budgets for the class pending in the open progression.
    pub async fn budgets(&self) -> Result<Option<Budgets>> {
        self.request(|reply| Command::Budgets { reply }).await
    }

    async fn update(&self, request: UpdateRequest) -> Result<UpdateOutcome> {
        self.request(|reply| Command::Update { request, reply })
            .await?
    }

    /// Move down the condition track. Persistence never blocks this.
    pub async fn worsen_condition(&self, steps: u8) -> Result<UpdateOutcome> {
        self.update(UpdateRequest::WorsenCondition(steps)).await
    }

    /// Move up the condition track. Refused (`changed = false`) on a
    /// persistent condition unless `force` is set.
    pub async fn improve_condition(&self, steps: u8, force: bool) -> Result<UpdateOutcome> {
        self.update(UpdateRequest::ImproveCondition { steps, force })
            .await
    }

    pub async fn set_condition_step(&self, step: i32, force: bool) -> Result<UpdateOutcome> {
        self.update(UpdateRequest::SetConditionStep { step, force })
            .await
    }

    pub async fn set_condition_persistent(&self, persistent: bool) -> Result<UpdateOutcome> {
        self.update(UpdateRequest::SetConditionPersistent(persistent))
            .await
    }

    pub async fn add_item(&self, item: OwnedItem) -> Result<(ItemId, UpdateOutcome)> {
        self.request(|reply| Command::AddItem { item, reply }).await?
    }

    pub async fn set_equipped(&self, item: ItemId, equipped: bool) -> Result<UpdateOutcome> {
        self.update(UpdateRequest::Equip { item, equipped }).await
    }

    pub async fn remove_item(&self, item: ItemId) -> Result<UpdateOutcome> {
        self.update(UpdateRequest::RemoveItem(item)).await
    }

    pub async fn add_effect(&self, effect: ActiveEffect) -> Result<UpdateOutcome> {
        self.update(UpdateRequest::AddEffect(effect)).await
    }

    pub async fn remove_effect(&self, label: impl Into<String>) -> Result<UpdateOutcome> {
        self.update(UpdateRequest::RemoveEffect(label.into()))
            .await
    }

    /// Read-only copy of the character, derived block included.
    pub async fn snapshot(&self) -> Result<Actor> {
        self.request(|reply| Command::Snapshot { reply }).await
    }

    /// Subscribe to events from a specific topic
    ///
    /// # Topics
    ///
    /// - `Topic::Progression` - Step confirmations, rejections, completion
    /// - `Topic::Derived` - Recomputes and deferred modifier passes
    ///
    /// Events from every character share the bus; filter on the actor id.
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.event_bus.subscribe(topic)
    }

    /// Get a reference to the event bus for advanced usage
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }
}
