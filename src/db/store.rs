//! GenerationStore: the persistent-record collaborator (§3, §4.1, §6.3).
//! The real database is out of scope (§1); this is the trait boundary plus
//! an in-memory default, shaped like the teacher's `FirestoreClient`
//! get/save pair but generalized to the `Generation` record this crate
//! owns.

use crate::domain::Generation;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

#[async_trait]
pub trait GenerationStore: Send + Sync {
    async fn save(&self, generation: &Generation) -> anyhow::Result<()>;
    async fn get(&self, id: Uuid) -> anyhow::Result<Option<Generation>>;
}

/// Default in-process store. Stands in for the out-of-scope database so the
/// pipeline is fully runnable without an external dependency.
#[derive(Clone, Default)]
pub struct InMemoryGenerationStore {
    records: Arc<Mutex<HashMap<Uuid, Generation>>>,
}

impl InMemoryGenerationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GenerationStore for InMemoryGenerationStore {
    async fn save(&self, generation: &Generation) -> anyhow::Result<()> {
        let mut records = self.records.lock().await;
        records.insert(generation.id, generation.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> anyhow::Result<Option<Generation>> {
        let records = self.records.lock().await;
        Ok(records.get(&id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Submission;

    #[tokio::test]
    async fn save_then_get_round_trips() {
        let store = InMemoryGenerationStore::new();
        let id = Uuid::new_v4();
        let generation = Generation::new(id, &Submission::default());
        store.save(&generation).await.unwrap();

        let fetched = store.get(id).await.unwrap().expect("present");
        assert_eq!(fetched.id, id);
    }

    #[tokio::test]
    async fn unknown_id_returns_none() {
        let store = InMemoryGenerationStore::new();
        assert!(store.get(Uuid::new_v4()).await.unwrap().is_none());
    }
}
