//! Adapter from the core persistence port to a repository.

use std::sync::Arc;

use saga_core::{ActorId, ActorStore, PrimaryState, StoreError};

use super::ActorRepository;

/// [`ActorStore`] that writes committed primary state through to an
/// [`ActorRepository`].
#[derive(Clone)]
pub struct RepositoryStore {
    repository: Arc<dyn ActorRepository>,
}

impl RepositoryStore {
    pub fn new(repository: Arc<dyn ActorRepository>) -> Self {
        Self { repository }
    }
}

impl ActorStore for RepositoryStore {
    fn write(&mut self, actor: ActorId, primary: &PrimaryState) -> Result<(), StoreError> {
        self.repository
            .write_primary(actor, primary)
            .map_err(|error| StoreError::new(error.to_string()))
    }
}
