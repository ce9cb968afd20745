//! Character worker that owns one authoritative [`saga_core::Actor`].
//!
//! Receives commands from [`crate::CharacterHandle`], runs them through
//! [`saga_core::ProgressionEngine`], and publishes events to the EventBus.
//! Finalize runs the base recompute pass inline and schedules the modifier
//! pass as a follow-up command, so the caller gets its reply first. Condition,
//! gear and effect updates go through [`saga_core::ActorUpdates`] and
//! recompute in full before replying.

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use saga_core::{
    ActiveEffect, Actor, ActorUpdates, Budgets, DerivedHook, FinalizeOutcome, ItemId, OwnedItem,
    ProgressionAction, ProgressionEngine, ProgressionError, ProgressionMode, Recalculator, Step,
    UpdateError, UpdateOutcome,
};

use crate::api::{Result, RuntimeError};
use crate::events::{DerivedEvent, EventBus, ProgressionEvent};
use crate::oracle::OracleBundle;
use crate::repository::RepositoryStore;

/// Primary-state change outside a progression.
#[derive(Clone, Debug)]
pub enum UpdateRequest {
    WorsenCondition(u8),
    ImproveCondition { steps: u8, force: bool },
    SetConditionStep { step: i32, force: bool },
    SetConditionPersistent(bool),
    Equip { item: ItemId, equipped: bool },
    RemoveItem(ItemId),
    AddEffect(ActiveEffect),
    RemoveEffect(String),
}

impl UpdateRequest {
    fn name(&self) -> &'static str {
        match self {
            UpdateRequest::WorsenCondition(_) => "worsen_condition",
            UpdateRequest::ImproveCondition { .. } => "improve_condition",
            UpdateRequest::SetConditionStep { .. } => "set_condition_step",
            UpdateRequest::SetConditionPersistent(_) => "set_condition_persistent",
            UpdateRequest::Equip { .. } => "equip",
            UpdateRequest::RemoveItem(_) => "remove_item",
            UpdateRequest::AddEffect(_) => "add_effect",
            UpdateRequest::RemoveEffect(_) => "remove_effect",
        }
    }

    fn apply(self, updates: &mut ActorUpdates<'_>) -> std::result::Result<UpdateOutcome, UpdateError> {
        match self {
            UpdateRequest::WorsenCondition(steps) => updates.worsen_condition(steps),
            UpdateRequest::ImproveCondition { steps, force } => {
                updates.improve_condition(steps, force)
            }
            UpdateRequest::SetConditionStep { step, force } => {
                updates.set_condition_step(step, force)
            }
            UpdateRequest::SetConditionPersistent(persistent) => {
                updates.set_condition_persistent(persistent)
            }
            UpdateRequest::Equip { item, equipped } => updates.set_equipped(item, equipped),
            UpdateRequest::RemoveItem(item) => updates.remove_item(item),
            UpdateRequest::AddEffect(effect) => updates.add_effect(effect),
            UpdateRequest::RemoveEffect(label) => updates.remove_effect(&label),
        }
    }
}

/// Commands that can be sent to a character worker
pub enum Command {
    Begin {
        mode: ProgressionMode,
        reply: oneshot::Sender<Result<()>>,
    },
    DoAction {
        action: ProgressionAction,
        reply: oneshot::Sender<Result<Step>>,
    },
    Finalize {
        reply: oneshot::Sender<Result<FinalizeOutcome>>,
    },
    Cancel {
        reply: oneshot::Sender<Result<()>>,
    },
    Budgets {
        reply: oneshot::Sender<Option<Budgets>>,
    },
    Snapshot {
        reply: oneshot::Sender<Actor>,
    },
    Update {
        request: UpdateRequest,
        reply: oneshot::Sender<Result<UpdateOutcome>>,
    },
    AddItem {
        item: OwnedItem,
        reply: oneshot::Sender<Result<(ItemId, UpdateOutcome)>>,
    },
    /// Deferred half of the finalize recompute. Sent by the worker to itself.
    ApplyModifiers,
}

/// Background task that processes one character's commands.
pub struct CharacterWorker {
    actor: Actor,
    oracles: OracleBundle,
    store: RepositoryStore,
    hooks: Vec<Box<dyn DerivedHook>>,
    command_rx: mpsc::Receiver<Command>,
    self_tx: mpsc::WeakSender<Command>,
    event_bus: EventBus,
}

impl CharacterWorker {
    pub fn new(
        actor: Actor,
        oracles: OracleBundle,
        store: RepositoryStore,
        hooks: Vec<Box<dyn DerivedHook>>,
        command_rx: mpsc::Receiver<Command>,
        self_tx: mpsc::WeakSender<Command>,
        event_bus: EventBus,
    ) -> Self {
        Self {
            actor,
            oracles,
            store,
            hooks,
            command_rx,
            self_tx,
            event_bus,
        }
    }

    /// Main worker loop. Ends once every handle is dropped.
    pub async fn run(mut self) {
        let status =
            Recalculator::with_hooks(self.oracles.env(), &self.hooks).recompute(&mut self.actor);
        debug!(actor = %self.actor.id, %status, "character worker started");

        while let Some(cmd) = self.command_rx.recv().await {
            self.handle_command(cmd);
        }
        debug!(actor = %self.actor.id, "character worker stopped");
    }

    fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::Begin { mode, reply } => {
                let result = self.handle_begin(mode);
                if reply.send(result).is_err() {
                    debug!("Begin reply channel closed (caller dropped)");
                }
            }
            Command::DoAction { action, reply } => {
                let result = self.handle_action(&action);
                if reply.send(result).is_err() {
                    debug!("DoAction reply channel closed (caller dropped)");
                }
            }
            Command::Finalize { reply } => {
                let result = self.handle_finalize();
                if reply.send(result).is_err() {
                    debug!("Finalize reply channel closed (caller dropped)");
                }
            }
            Command::Cancel { reply } => {
                let result = self.handle_cancel();
                if reply.send(result).is_err() {
                    debug!("Cancel reply channel closed (caller dropped)");
                }
            }
            Command::Budgets { reply } => {
                let budgets = self.engine().budgets();
                if reply.send(budgets).is_err() {
                    debug!("Budgets reply channel closed (caller dropped)");
                }
            }
            Command::Snapshot { reply } => {
                if reply.send(self.actor.clone()).is_err() {
                    debug!("Snapshot reply channel closed (caller dropped)");
                }
            }
            Command::Update { request, reply } => {
                let result = self.handle_update(request);
                if reply.send(result).is_err() {
                    debug!("Update reply channel closed (caller dropped)");
                }
            }
            Command::AddItem { item, reply } => {
                let result = self.handle_add_item(item);
                if reply.send(result).is_err() {
                    debug!("AddItem reply channel closed (caller dropped)");
                }
            }
            Command::ApplyModifiers => self.apply_modifiers(),
        }
    }

    fn engine(&mut self) -> ProgressionEngine<'_> {
        ProgressionEngine::new(&mut self.actor, self.oracles.env(), &mut self.store)
            .with_hooks(&self.hooks)
    }

    fn updates(&mut self) -> ActorUpdates<'_> {
        ActorUpdates::new(&mut self.actor, self.oracles.env(), &mut self.store)
            .with_hooks(&self.hooks)
    }

    fn rejected(&self, action: &str, error: ProgressionError) -> RuntimeError {
        self.event_bus.publish(ProgressionEvent::Rejected {
            actor: self.actor.id,
            action: action.to_string(),
            report: error.report(),
        });
        RuntimeError::Progression(error)
    }

    fn handle_begin(&mut self, mode: ProgressionMode) -> Result<()> {
        let result = self.engine().begin(mode);
        match result {
            Ok(()) => {
                self.event_bus.publish(ProgressionEvent::Started {
                    actor: self.actor.id,
                    mode,
                });
                Ok(())
            }
            Err(error) => Err(self.rejected("begin", error)),
        }
    }

    fn handle_action(&mut self, action: &ProgressionAction) -> Result<Step> {
        let result = self.engine().do_action(action);
        match result {
            Ok(step) => {
                self.event_bus.publish(ProgressionEvent::StepConfirmed {
                    actor: self.actor.id,
                    step,
                });
                Ok(step)
            }
            Err(error) => Err(self.rejected(action.name(), error)),
        }
    }

    fn handle_cancel(&mut self) -> Result<()> {
        let result = self.engine().cancel();
        match result {
            Ok(()) => {
                self.event_bus.publish(ProgressionEvent::Cancelled {
                    actor: self.actor.id,
                });
                Ok(())
            }
            Err(error) => Err(self.rejected("cancel", error)),
        }
    }

    fn handle_finalize(&mut self) -> Result<FinalizeOutcome> {
        let result = self.engine().with_deferred_modifiers().finalize();
        let outcome = match result {
            Ok(outcome) => outcome,
            Err(error) => return Err(self.rejected("finalize", error)),
        };

        if let Some(status) = outcome.recalc {
            self.event_bus.publish(DerivedEvent::Recomputed {
                actor: self.actor.id,
                revision: self.actor.revision(),
                status,
                warnings: self.actor.derived().warnings.clone(),
            });
        }
        if outcome.modifiers_pending {
            self.schedule_modifier_pass();
        }
        if let Some(completed) = &outcome.completion {
            self.event_bus
                .publish(ProgressionEvent::Completed(completed.clone()));
        }
        Ok(outcome)
    }

    fn handle_update(&mut self, request: UpdateRequest) -> Result<UpdateOutcome> {
        let name = request.name();
        let result = request.apply(&mut self.updates());
        let outcome = result.inspect_err(|error| {
            debug!(actor = %self.actor.id, update = name, %error, "update refused");
        })?;
        self.publish_recompute(&outcome);
        Ok(outcome)
    }

    fn handle_add_item(&mut self, item: OwnedItem) -> Result<(ItemId, UpdateOutcome)> {
        let (id, outcome) = self.updates().add_item(item)?;
        self.publish_recompute(&outcome);
        Ok((id, outcome))
    }

    fn publish_recompute(&self, outcome: &UpdateOutcome) {
        if let Some(status) = outcome.recalc {
            self.event_bus.publish(DerivedEvent::Recomputed {
                actor: self.actor.id,
                revision: outcome.revision,
                status,
                warnings: self.actor.derived().warnings.clone(),
            });
        }
    }

    /// Queues the modifier pass behind whatever is already in the channel.
    /// Never awaited by the finalize caller.
    fn schedule_modifier_pass(&self) {
        let Some(tx) = self.self_tx.upgrade() else {
            return;
        };
        tokio::spawn(async move {
            if tx.send(Command::ApplyModifiers).await.is_err() {
                debug!("worker stopped before the modifier pass ran");
            }
        });
    }

    fn apply_modifiers(&mut self) {
        let result = Recalculator::with_hooks(self.oracles.env(), &self.hooks)
            .modifier_pass(&mut self.actor);
        match result {
            Ok(applied) => {
                debug!(actor = %self.actor.id, applied, "modifier pass applied");
                self.event_bus.publish(DerivedEvent::ModifiersApplied {
                    actor: self.actor.id,
                    applied,
                });
            }
            Err(error) => {
                warn!(actor = %self.actor.id, %error, "modifier pass failed");
                self.event_bus.publish(DerivedEvent::ModifierPassFailed {
                    actor: self.actor.id,
                    error: error.to_string(),
                });
            }
        }
    }
}
