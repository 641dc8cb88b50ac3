//! In-memory repository

use super::types::{ConversationRecord, ConversationSummary, check_identifier};
use super::ConversationRepository;
use crate::conversation::Conversation;
use crate::error::ConduitResult;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct MemoryState {
    records: HashMap<String, ConversationRecord>,
    last: Option<String>,
}

impl MemoryState {
    fn newest(&self) -> Option<&ConversationRecord> {
        self.records
            .values()
            .max_by(|a, b| (a.updated_at, &a.conversation_id).cmp(&(b.updated_at, &b.conversation_id)))
    }
}

/// Repository that lives for the duration of the process (for testing or
/// throwaway sessions)
#[derive(Debug, Clone)]
pub struct MemoryRepository {
    project: String,
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryRepository {
    pub fn new(project: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            state: Arc::new(RwLock::new(MemoryState::default())),
        }
    }
}

impl Default for MemoryRepository {
    fn default() -> Self {
        Self::new("default")
    }
}

#[async_trait]
impl ConversationRepository for MemoryRepository {
    fn project(&self) -> &str {
        &self.project
    }

    async fn load(
        &self,
        conversation_id: &str,
        name: Option<&str>,
    ) -> ConduitResult<Option<Conversation>> {
        let mut state = self.state.write().await;
        let record = state.records.get(conversation_id).cloned();
        match record {
            Some(record) => {
                let conversation = record.restore()?;
                state.last = Some(conversation_id.to_string());
                Ok(Some(conversation))
            }
            None => {
                drop(state);
                match name {
                    Some(name) => self.load_by_name(name).await,
                    None => Ok(None),
                }
            }
        }
    }

    async fn load_by_name(&self, name: &str) -> ConduitResult<Option<Conversation>> {
        let mut state = self.state.write().await;
        let record = state
            .records
            .values()
            .filter(|r| r.name.as_deref() == Some(name))
            .max_by_key(|r| r.updated_at)
            .cloned();
        match record {
            Some(record) => {
                let conversation = record.clone().restore()?;
                state.last = Some(record.conversation_id);
                Ok(Some(conversation))
            }
            None => Ok(None),
        }
    }

    async fn save(&self, conversation: &Conversation, name: Option<&str>) -> ConduitResult<()> {
        check_identifier(conversation.id())?;
        let mut state = self.state.write().await;
        let previous = state.records.get(conversation.id());
        let record = ConversationRecord::capture(conversation, &self.project, name, previous);
        state.last = Some(record.conversation_id.clone());
        state.records.insert(record.conversation_id.clone(), record);
        Ok(())
    }

    async fn list(&self, limit: Option<usize>) -> ConduitResult<Vec<ConversationSummary>> {
        let state = self.state.read().await;
        let mut summaries: Vec<ConversationSummary> =
            state.records.values().map(ConversationRecord::summary).collect();
        summaries.sort_by(|a, b| {
            (b.updated_at, &b.conversation_id).cmp(&(a.updated_at, &a.conversation_id))
        });
        if let Some(limit) = limit {
            summaries.truncate(limit);
        }
        Ok(summaries)
    }

    async fn load_all(&self) -> ConduitResult<Vec<Conversation>> {
        let records: Vec<ConversationRecord> =
            self.state.read().await.records.values().cloned().collect();
        records.into_iter().map(ConversationRecord::restore).collect()
    }

    async fn remove(&self, conversation_id: &str) -> ConduitResult<bool> {
        let mut state = self.state.write().await;
        if state.last.as_deref() == Some(conversation_id) {
            state.last = None;
        }
        Ok(state.records.remove(conversation_id).is_some())
    }

    async fn wipe(&self) -> ConduitResult<usize> {
        let mut state = self.state.write().await;
        let removed = state.records.len();
        state.records.clear();
        state.last = None;
        Ok(removed)
    }

    async fn last(&self) -> ConduitResult<Option<Conversation>> {
        let record = {
            let state = self.state.read().await;
            state
                .last
                .as_ref()
                .and_then(|id| state.records.get(id))
                .or_else(|| state.newest())
                .cloned()
        };
        record.map(ConversationRecord::restore).transpose()
    }
}
