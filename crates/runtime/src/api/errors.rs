//! Unified error types surfaced by the runtime API.
//!
//! Wraps failures from worker coordination, repositories, content loading and
//! the progression engine so clients can bubble them up with consistent
//! context.

use saga_core::{ActorId, ErrorReport, ProgressionError, UpdateError};
use thiserror::Error;
use tokio::sync::oneshot;

pub use crate::repository::RepositoryError;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("character worker command channel closed")]
    CommandChannelClosed,

    #[error("character worker reply channel closed")]
    ReplyChannelClosed(#[source] oneshot::error::RecvError),

    #[error("character worker join failed")]
    WorkerJoin(#[source] tokio::task::JoinError),

    #[error(transparent)]
    Progression(#[from] ProgressionError),

    #[error(transparent)]
    Update(#[from] UpdateError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Content(#[from] anyhow::Error),

    #[error("runtime requires oracles to be configured before building")]
    MissingOracles,

    #[error("{0} is not stored in the repository")]
    UnknownActor(ActorId),
}

impl RuntimeError {
    /// The `{kind, message, details}` shape for rules failures.
    pub fn report(&self) -> Option<ErrorReport> {
        match self {
            RuntimeError::Progression(error) => Some(error.report()),
            RuntimeError::Update(error) => Some(error.report()),
            _ => None,
        }
    }
}
