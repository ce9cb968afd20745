//! Error types raised by repository implementations.

use saga_core::ActorId;
use thiserror::Error;

/// Errors surfaced by repository implementations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("actor repository lock was poisoned")]
    LockPoisoned,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0} is not stored")]
    NotFound(ActorId),

    #[error("{0} is already stored")]
    AlreadyExists(ActorId),
}

pub type Result<T> = std::result::Result<T, RepositoryError>;
