//! Repository contract for saving and loading characters.

use saga_core::{Actor, ActorId, PrimaryState};

use super::Result;

/// Persistence for character records.
///
/// Implementations keep the identity and primary state of each actor. The
/// derived block is skipped on write and must be recomputed after `load`.
pub trait ActorRepository: Send + Sync {
    /// Store a new character.
    fn create(&self, actor: &Actor) -> Result<()>;

    /// Replace the primary state of a stored character.
    fn write_primary(&self, id: ActorId, primary: &PrimaryState) -> Result<()>;

    /// Load a character. Its derived block is empty until recomputed.
    fn load(&self, id: ActorId) -> Result<Option<Actor>>;

    fn exists(&self, id: ActorId) -> bool;

    fn delete(&self, id: ActorId) -> Result<()>;

    fn list_ids(&self) -> Result<Vec<ActorId>> {
        Ok(vec![])
    }
}
