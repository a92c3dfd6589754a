//! Conversation Recorder (§4.4): an append-only in-memory log of every
//! agent interaction, keyed by generation ID, flushed to persistent storage
//! on terminal transition.

use crate::domain::AgentInteraction;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Clone)]
pub struct ConversationRecorder {
    log: Arc<Mutex<HashMap<Uuid, Vec<AgentInteraction>>>>,
}

impl ConversationRecorder {
    pub fn new() -> Self {
        Self {
            log: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub async fn append(&self, generation_id: Uuid, interaction: AgentInteraction) {
        let mut log = self.log.lock().await;
        log.entry(generation_id).or_default().push(interaction);
    }

    pub async fn get(&self, generation_id: Uuid) -> Vec<AgentInteraction> {
        let log = self.log.lock().await;
        log.get(&generation_id).cloned().unwrap_or_default()
    }

    /// Removes and returns the in-memory log for a generation, as done on
    /// terminal transition before flushing to the persistent store.
    pub async fn clear(&self, generation_id: Uuid) -> Vec<AgentInteraction> {
        let mut log = self.log.lock().await;
        log.remove(&generation_id).unwrap_or_default()
    }
}

impl Default for ConversationRecorder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AgentRole, InteractionMetadata, InteractionType};

    #[tokio::test]
    async fn conversation_integrity_preserves_append_order() {
        let recorder = ConversationRecorder::new();
        let id = Uuid::new_v4();
        for i in 0..5 {
            recorder
                .append(
                    id,
                    AgentInteraction::new(
                        AgentRole::StoryDirector,
                        InteractionType::Response,
                        format!("draft {i}"),
                        InteractionMetadata::default(),
                    ),
                )
                .await;
        }
        let all = recorder.get(id).await;
        assert_eq!(all.len(), 5);
        for (i, interaction) in all.iter().enumerate() {
            assert_eq!(interaction.content, format!("draft {i}"));
        }

        let flushed = recorder.clear(id).await;
        assert_eq!(flushed.len(), 5);
        assert!(recorder.get(id).await.is_empty());
    }
}
