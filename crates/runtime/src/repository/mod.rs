//! Repository layer for character records.
//!
//! Repositories hold data that changes during play: each character's primary
//! state. Derived values are never stored; they are rebuilt after loading.
//! Static rule content is served by oracles, not repositories.

mod error;
mod memory;
mod store;
mod traits;

pub use error::{RepositoryError, Result};
pub use memory::InMemoryActorRepository;
pub use store::RepositoryStore;
pub use traits::ActorRepository;
