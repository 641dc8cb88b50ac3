//! Conversation persistence
//!
//! A [`ConversationRepository`] maps conversation identifiers (and optional
//! human-readable names) to complete message graphs, scoped to one project.
//! Saving is an idempotent upsert; loading returns `None` when nothing is
//! stored. [`ConversationRepository::last`] supports "resume most recent".

mod file;
mod memory;
mod types;

pub use file::FileRepository;
pub use memory::MemoryRepository;
pub use types::{ConversationRecord, ConversationSummary, PersistenceMode};

use crate::config::ConduitConfig;
use crate::conversation::Conversation;
use crate::error::ConduitResult;
use async_trait::async_trait;
use std::sync::Arc;

/// Persistent store of conversations for one project
#[async_trait]
pub trait ConversationRepository: Send + Sync {
    /// Project namespace this repository reads and writes
    fn project(&self) -> &str;

    /// Load by identifier, falling back to `name` when the identifier is unknown
    async fn load(
        &self,
        conversation_id: &str,
        name: Option<&str>,
    ) -> ConduitResult<Option<Conversation>>;

    /// Load the most recently updated conversation carrying `name`
    async fn load_by_name(&self, name: &str) -> ConduitResult<Option<Conversation>>;

    /// Upsert the full graph and leaf; an absent `name` keeps the stored one
    async fn save(&self, conversation: &Conversation, name: Option<&str>) -> ConduitResult<()>;

    /// Summaries, most recently updated first
    async fn list(&self, limit: Option<usize>) -> ConduitResult<Vec<ConversationSummary>>;

    /// Load every conversation of the project
    async fn load_all(&self) -> ConduitResult<Vec<Conversation>>;

    /// Delete one conversation; returns whether it existed
    async fn remove(&self, conversation_id: &str) -> ConduitResult<bool>;

    /// Delete every conversation of the project; returns how many were removed
    async fn wipe(&self) -> ConduitResult<usize>;

    /// Keep the `keep` most recently updated conversations and drop the rest
    async fn prune(&self, keep: usize) -> ConduitResult<usize> {
        let mut removed = 0;
        for summary in self.list(None).await?.into_iter().skip(keep) {
            if self.remove(&summary.conversation_id).await? {
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// The most recently saved or loaded conversation
    async fn last(&self) -> ConduitResult<Option<Conversation>>;
}

/// Repository selected by configuration: in memory, or files under the data
/// directory
pub fn open_repository(config: &ConduitConfig) -> ConduitResult<Arc<dyn ConversationRepository>> {
    if config.repository.in_memory {
        return Ok(Arc::new(MemoryRepository::new(config.project_name.clone())));
    }
    Ok(Arc::new(FileRepository::new(
        config.repository.resolved_data_dir(),
        config.project_name.clone(),
    )?))
}

#[cfg(test)]
mod tests;
