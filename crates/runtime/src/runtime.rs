//! High-level runtime orchestrator.
//!
//! The runtime owns one worker per character, wires up command/event
//! channels, and exposes a builder-based API for clients to drive
//! progressions.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use saga_core::{Actor, ActorId, DerivedHook, RulesConfig};

use crate::api::{CharacterHandle, Result, RuntimeError};
use crate::events::{Event, EventBus, Topic};
use crate::hooks::DerivedEventHook;
use crate::oracle::OracleBundle;
use crate::repository::{ActorRepository, InMemoryActorRepository, RepositoryStore};
use crate::workers::{CharacterWorker, Command};

/// Runtime configuration shared across the orchestrator and workers.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Used when the builder is given tables without a configuration.
    pub rules: RulesConfig,
    pub event_buffer_size: usize,
    pub command_buffer_size: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            rules: RulesConfig::default(),
            event_buffer_size: 100,
            command_buffer_size: 32,
        }
    }
}

/// Factory for per-character derived hooks. Each worker gets its own set.
pub type HookFactory = Arc<dyn Fn(&EventBus) -> Vec<Box<dyn DerivedHook>> + Send + Sync>;

/// Main runtime that hosts character workers.
pub struct Runtime {
    config: RuntimeConfig,
    oracles: OracleBundle,
    repository: Arc<dyn ActorRepository>,
    event_bus: EventBus,
    hooks: Option<HookFactory>,
    workers: Vec<(ActorId, JoinHandle<()>)>,
}

impl Runtime {
    /// Create a new runtime builder
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    pub fn oracles(&self) -> &OracleBundle {
        &self.oracles
    }

    pub fn repository(&self) -> &Arc<dyn ActorRepository> {
        &self.repository
    }

    /// Subscribe to events from every character on one topic
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.event_bus.subscribe(topic)
    }

    /// Store a new character and start its worker.
    pub fn spawn_character(&mut self, actor: Actor) -> Result<CharacterHandle> {
        self.repository.create(&actor)?;
        Ok(self.start_worker(actor))
    }

    /// Start a worker for a character already in the repository. Derived
    /// values are rebuilt before the first command is served.
    pub fn open_character(&mut self, id: ActorId) -> Result<CharacterHandle> {
        let actor = self
            .repository
            .load(id)?
            .ok_or(RuntimeError::UnknownActor(id))?;
        Ok(self.start_worker(actor))
    }

    fn start_worker(&mut self, actor: Actor) -> CharacterHandle {
        let id = actor.id;
        let (command_tx, command_rx) = mpsc::channel::<Command>(self.config.command_buffer_size);

        let mut hooks: Vec<Box<dyn DerivedHook>> =
            vec![Box::new(DerivedEventHook::new(self.event_bus.clone()))];
        if let Some(factory) = &self.hooks {
            hooks.extend((**factory)(&self.event_bus));
        }

        let worker = CharacterWorker::new(
            actor,
            self.oracles.clone(),
            RepositoryStore::new(Arc::clone(&self.repository)),
            hooks,
            command_rx,
            command_tx.downgrade(),
            self.event_bus.clone(),
        );
        let handle = tokio::spawn(async move {
            worker.run().await;
        });
        self.workers.push((id, handle));
        tracing::info!(actor = %id, "character worker spawned");

        CharacterHandle::new(id, command_tx, self.event_bus.clone())
    }

    /// Wait for every worker to stop. Workers stop once all handles to
    /// their character are dropped.
    pub async fn shutdown(self) -> Result<()> {
        for (id, handle) in self.workers {
            handle.await.map_err(RuntimeError::WorkerJoin)?;
            tracing::debug!(actor = %id, "character worker joined");
        }
        Ok(())
    }
}

/// Builder for [`Runtime`] with flexible configuration.
pub struct RuntimeBuilder {
    config: RuntimeConfig,
    oracles: Option<OracleBundle>,
    repository: Option<Arc<dyn ActorRepository>>,
    hooks: Option<HookFactory>,
}

impl RuntimeBuilder {
    fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            oracles: None,
            repository: None,
            hooks: None,
        }
    }

    /// Override runtime configuration
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Set required rule content
    pub fn oracles(mut self, oracles: OracleBundle) -> Self {
        self.oracles = Some(oracles);
        self
    }

    /// Rule tables paired with the configured [`RuntimeConfig::rules`].
    pub fn tables(mut self, tables: saga_core::StaticRuleTables) -> Self {
        self.oracles = Some(OracleBundle::new(tables, self.config.rules.clone()));
        self
    }

    /// Set the character repository. Defaults to [`InMemoryActorRepository`].
    pub fn repository(mut self, repository: Arc<dyn ActorRepository>) -> Self {
        self.repository = Some(repository);
        self
    }

    /// Extra derived hooks installed on every character worker, after the
    /// built-in event hook.
    pub fn with_hooks(
        mut self,
        factory: impl Fn(&EventBus) -> Vec<Box<dyn DerivedHook>> + Send + Sync + 'static,
    ) -> Self {
        self.hooks = Some(Arc::new(factory));
        self
    }

    /// Build the runtime
    pub fn build(self) -> Result<Runtime> {
        let oracles = self.oracles.ok_or(RuntimeError::MissingOracles)?;
        let repository = self
            .repository
            .unwrap_or_else(|| Arc::new(InMemoryActorRepository::new()));
        let event_bus = EventBus::with_capacity(self.config.event_buffer_size);

        Ok(Runtime {
            config: self.config,
            oracles,
            repository,
            event_bus,
            hooks: self.hooks,
            workers: Vec::new(),
        })
    }
}
