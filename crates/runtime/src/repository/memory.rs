//! In-memory ActorRepository implementation for tests and local runs.

use std::collections::HashMap;
use std::sync::RwLock;

use saga_core::{Actor, ActorId, PrimaryState};

use super::{ActorRepository, RepositoryError, Result};

/// In-memory implementation of ActorRepository.
///
/// Records are kept as JSON so a round trip exercises the same serialized
/// layout a durable store would see.
#[derive(Default)]
pub struct InMemoryActorRepository {
    records: RwLock<HashMap<ActorId, String>>,
}

impl InMemoryActorRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw stored record, for inspection.
    pub fn record(&self, id: ActorId) -> Result<Option<String>> {
        let records = self
            .records
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(records.get(&id).cloned())
    }
}

impl ActorRepository for InMemoryActorRepository {
    fn create(&self, actor: &Actor) -> Result<()> {
        let json = serde_json::to_string(actor)?;
        let mut records = self
            .records
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        if records.contains_key(&actor.id) {
            return Err(RepositoryError::AlreadyExists(actor.id));
        }
        records.insert(actor.id, json);
        Ok(())
    }

    fn write_primary(&self, id: ActorId, primary: &PrimaryState) -> Result<()> {
        let mut records = self
            .records
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        let record = records.get_mut(&id).ok_or(RepositoryError::NotFound(id))?;
        let stored: Actor = serde_json::from_str(record)?;
        // Written ahead of the commit that bumps the live actor's revision.
        let revision = stored.revision() + 1;
        let updated = Actor::from_primary(stored.id, stored.name, stored.kind, primary.clone())
            .with_revision(revision);
        *record = serde_json::to_string(&updated)?;
        Ok(())
    }

    fn load(&self, id: ActorId) -> Result<Option<Actor>> {
        let records = self
            .records
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        records
            .get(&id)
            .map(|json| serde_json::from_str(json).map_err(RepositoryError::from))
            .transpose()
    }

    fn exists(&self, id: ActorId) -> bool {
        self.records
            .read()
            .map(|records| records.contains_key(&id))
            .unwrap_or(false)
    }

    fn delete(&self, id: ActorId) -> Result<()> {
        let mut records = self
            .records
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        records.remove(&id);
        Ok(())
    }

    fn list_ids(&self) -> Result<Vec<ActorId>> {
        let records = self
            .records
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        let mut ids: Vec<ActorId> = records.keys().copied().collect();
        ids.sort_unstable();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use saga_core::testing::soldier_level_one;

    use super::*;

    #[test]
    fn records_skip_derived_values() {
        let repo = InMemoryActorRepository::new();
        let actor = soldier_level_one();
        repo.create(&actor).expect("create");

        let json = repo.record(actor.id).expect("read").expect("stored");
        assert!(json.contains("\"primary\""));
        assert!(!json.contains("\"derived\""));

        let loaded = repo.load(actor.id).expect("load").expect("stored");
        assert_eq!(loaded.primary(), actor.primary());
        assert_eq!(loaded.name, actor.name);
    }

    #[test]
    fn write_primary_requires_a_record() {
        let repo = InMemoryActorRepository::new();
        let actor = soldier_level_one();
        assert!(matches!(
            repo.write_primary(actor.id, actor.primary()),
            Err(RepositoryError::NotFound(_))
        ));

        repo.create(&actor).expect("create");
        assert!(matches!(
            repo.create(&actor),
            Err(RepositoryError::AlreadyExists(_))
        ));

        let mut primary = actor.primary().clone();
        primary.background = Some("spacer".into());
        repo.write_primary(actor.id, &primary).expect("write");
        let loaded = repo.load(actor.id).expect("load").expect("stored");
        assert_eq!(loaded.primary().background.as_deref(), Some("spacer"));
        assert_eq!(loaded.revision(), 1);
        assert_eq!(repo.list_ids().expect("ids"), vec![actor.id]);

        repo.delete(actor.id).expect("delete");
        assert!(!repo.exists(actor.id));
    }
}
