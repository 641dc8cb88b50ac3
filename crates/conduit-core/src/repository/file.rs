//! File-based repository
//!
//! Layout: `<base_dir>/<project>/<conversation_id>.json`, one document per
//! conversation holding the whole message graph. A `.last` file in the
//! project directory names the most recently saved or loaded conversation.

use super::types::{ConversationRecord, ConversationSummary, check_identifier};
use super::ConversationRepository;
use crate::conversation::Conversation;
use crate::error::{ConduitError, ConduitResult};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

const LAST_POINTER: &str = ".last";

/// File-based conversation repository
#[derive(Debug)]
pub struct FileRepository {
    project: String,
    project_dir: PathBuf,
    write_lock: Mutex<()>,
}

impl FileRepository {
    /// Repository for `project` under `base_dir`
    pub fn new(base_dir: impl AsRef<Path>, project: impl Into<String>) -> ConduitResult<Self> {
        let project = project.into();
        check_identifier(&project).map_err(|_| {
            ConduitError::invalid_field(
                "project_name",
                format!("project name '{}' must be alphanumeric, '-' or '_'", project),
            )
        })?;
        Ok(Self {
            project_dir: base_dir.as_ref().join(&project),
            project,
            write_lock: Mutex::new(()),
        })
    }

    /// Repository under the default data directory (~/.conduit/conversations)
    pub fn default_path(project: impl Into<String>) -> ConduitResult<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| ConduitError::config("Could not determine home directory"))?;
        Self::new(home.join(".conduit").join("conversations"), project)
    }

    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    fn record_path(&self, conversation_id: &str) -> PathBuf {
        self.project_dir.join(format!("{}.json", conversation_id))
    }

    async fn ensure_dir(&self) -> ConduitResult<()> {
        fs::create_dir_all(&self.project_dir).await.map_err(|e| {
            ConduitError::persistence_with_context(
                format!("Failed to create conversation directory: {}", e),
                self.project_dir.display().to_string(),
            )
        })
    }

    async fn read_record(&self, path: &Path) -> ConduitResult<Option<ConversationRecord>> {
        let json = match fs::read_to_string(path).await {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(ConduitError::persistence_with_context(
                    format!("Failed to read conversation file: {}", e),
                    path.display().to_string(),
                ));
            }
        };
        let record = serde_json::from_str(&json).map_err(|e| {
            ConduitError::persistence_with_context(
                format!("Failed to deserialize conversation: {}", e),
                path.display().to_string(),
            )
        })?;
        Ok(Some(record))
    }

    async fn load_record(&self, conversation_id: &str) -> ConduitResult<Option<ConversationRecord>> {
        if check_identifier(conversation_id).is_err() {
            return Ok(None);
        }
        self.read_record(&self.record_path(conversation_id)).await
    }

    /// Every readable record; unreadable files are skipped with a warning
    async fn all_records(&self) -> ConduitResult<Vec<ConversationRecord>> {
        let mut entries = match fs::read_dir(&self.project_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(ConduitError::persistence(format!(
                    "Failed to read conversation directory: {}",
                    e
                )));
            }
        };

        let mut records = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| {
            ConduitError::persistence(format!("Failed to read directory entry: {}", e))
        })? {
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }
            match self.read_record(&path).await {
                Ok(Some(record)) => records.push(record),
                Ok(None) => {}
                Err(e) => warn!("Skipping unreadable conversation {:?}: {}", path, e),
            }
        }
        Ok(records)
    }

    async fn write_atomic(&self, path: &Path, content: &str) -> ConduitResult<()> {
        let tmp = self
            .project_dir
            .join(format!(".{}.tmp", Uuid::new_v4()));
        fs::write(&tmp, content).await.map_err(|e| {
            ConduitError::persistence(format!("Failed to write conversation file: {}", e))
        })?;
        if let Err(e) = fs::rename(&tmp, path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(ConduitError::persistence(format!(
                "Failed to move conversation file into place: {}",
                e
            )));
        }
        Ok(())
    }

    async fn mark_last(&self, conversation_id: &str) {
        if let Err(e) = self.ensure_dir().await {
            warn!("Could not record last conversation: {}", e);
            return;
        }
        let path = self.project_dir.join(LAST_POINTER);
        if let Err(e) = self.write_atomic(&path, conversation_id).await {
            warn!("Could not record last conversation: {}", e);
        }
    }

    async fn last_pointer(&self) -> Option<String> {
        let content = fs::read_to_string(self.project_dir.join(LAST_POINTER))
            .await
            .ok()?;
        let id = content.trim();
        (!id.is_empty()).then(|| id.to_string())
    }
}

#[async_trait]
impl ConversationRepository for FileRepository {
    fn project(&self) -> &str {
        &self.project
    }

    async fn load(
        &self,
        conversation_id: &str,
        name: Option<&str>,
    ) -> ConduitResult<Option<Conversation>> {
        if let Some(record) = self.load_record(conversation_id).await? {
            let conversation = record.restore()?;
            self.mark_last(conversation_id).await;
            debug!("Loaded conversation {} from {:?}", conversation_id, self.project_dir);
            return Ok(Some(conversation));
        }
        match name {
            Some(name) => self.load_by_name(name).await,
            None => Ok(None),
        }
    }

    async fn load_by_name(&self, name: &str) -> ConduitResult<Option<Conversation>> {
        let found = self
            .all_records()
            .await?
            .into_iter()
            .filter(|r| r.name.as_deref() == Some(name))
            .max_by_key(|r| r.updated_at);
        match found {
            Some(record) => {
                let conversation_id = record.conversation_id.clone();
                let conversation = record.restore()?;
                self.mark_last(&conversation_id).await;
                Ok(Some(conversation))
            }
            None => Ok(None),
        }
    }

    async fn save(&self, conversation: &Conversation, name: Option<&str>) -> ConduitResult<()> {
        check_identifier(conversation.id())?;
        let _guard = self.write_lock.lock().await;
        self.ensure_dir().await?;

        let path = self.record_path(conversation.id());
        let previous = self.read_record(&path).await.unwrap_or_else(|e| {
            warn!("Overwriting unreadable conversation {:?}: {}", path, e);
            None
        });
        let record =
            ConversationRecord::capture(conversation, &self.project, name, previous.as_ref());
        let json = serde_json::to_string_pretty(&record)
            .map_err(|e| ConduitError::json(format!("Failed to serialize conversation: {}", e)))?;

        self.write_atomic(&path, &json).await?;
        self.mark_last(conversation.id()).await;
        debug!("Saved conversation {} to {:?}", conversation.id(), path);
        Ok(())
    }

    async fn list(&self, limit: Option<usize>) -> ConduitResult<Vec<ConversationSummary>> {
        let mut summaries: Vec<ConversationSummary> = self
            .all_records()
            .await?
            .iter()
            .map(ConversationRecord::summary)
            .collect();
        summaries.sort_by(|a, b| {
            (b.updated_at, &b.conversation_id).cmp(&(a.updated_at, &a.conversation_id))
        });
        if let Some(limit) = limit {
            summaries.truncate(limit);
        }
        Ok(summaries)
    }

    async fn load_all(&self) -> ConduitResult<Vec<Conversation>> {
        self.all_records()
            .await?
            .into_iter()
            .map(ConversationRecord::restore)
            .collect()
    }

    async fn remove(&self, conversation_id: &str) -> ConduitResult<bool> {
        if check_identifier(conversation_id).is_err() {
            return Ok(false);
        }
        let _guard = self.write_lock.lock().await;
        let path = self.record_path(conversation_id);
        match fs::remove_file(&path).await {
            Ok(()) => {
                info!("Deleted conversation {} from {:?}", conversation_id, path);
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(ConduitError::persistence(format!(
                "Failed to delete conversation file: {}",
                e
            ))),
        }
    }

    async fn wipe(&self) -> ConduitResult<usize> {
        let ids: Vec<String> = self
            .all_records()
            .await?
            .into_iter()
            .map(|r| r.conversation_id)
            .collect();
        let mut removed = 0;
        for id in ids {
            if self.remove(&id).await? {
                removed += 1;
            }
        }
        let _ = fs::remove_file(self.project_dir.join(LAST_POINTER)).await;
        info!("Wiped {} conversations from project {}", removed, self.project);
        Ok(removed)
    }

    async fn last(&self) -> ConduitResult<Option<Conversation>> {
        if let Some(id) = self.last_pointer().await {
            if let Some(record) = self.load_record(&id).await? {
                return record.restore().map(Some);
            }
        }
        let newest = self
            .all_records()
            .await?
            .into_iter()
            .max_by(|a, b| {
                (a.updated_at, &a.conversation_id).cmp(&(b.updated_at, &b.conversation_id))
            });
        newest.map(ConversationRecord::restore).transpose()
    }
}
