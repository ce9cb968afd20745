//! Async runtime for character progression.
//!
//! This crate wires the rules core to rule content, a character repository
//! and worker tasks. Consumers embed [`Runtime`] to host characters and drive
//! them through [`CharacterHandle`].
//!
//! Modules are organized by responsibility:
//! - [`runtime`] hosts the orchestrator and builder
//! - [`api`] exposes the types downstream clients interact with
//! - [`events`] provides the topic-based event bus
//! - [`hooks`] holds derived hooks installed on every worker
//! - [`oracle`] and [`repository`] provide data adapters
//! - [`logging`] installs the tracing subscriber
pub mod api;
pub mod events;
pub mod hooks;
pub mod logging;
pub mod oracle;
pub mod repository;
pub mod runtime;

mod workers;

pub use api::{CharacterHandle, Result, RuntimeError};
pub use events::{DerivedEvent, Event, EventBus, ProgressionEvent, Topic};
pub use hooks::DerivedEventHook;
pub use oracle::OracleBundle;
pub use repository::{
    ActorRepository, InMemoryActorRepository, RepositoryError, RepositoryStore,
};
pub use runtime::{HookFactory, Runtime, RuntimeBuilder, RuntimeConfig};
