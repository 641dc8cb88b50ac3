//! Persisted conversation records

use crate::conversation::Conversation;
use crate::error::{ConduitError, ConduitResult};
use crate::message::Message;
use crate::session::Session;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Stored form of a conversation: the whole message graph plus its leaf
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationRecord {
    pub conversation_id: String,
    pub project: String,
    /// Human-readable handle
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub leaf: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub messages: Vec<Message>,
}

impl ConversationRecord {
    /// Snapshot a conversation for storage.
    ///
    /// When `previous` is the stored version, its name is kept unless a new
    /// one is supplied.
    pub fn capture(
        conversation: &Conversation,
        project: &str,
        name: Option<&str>,
        previous: Option<&ConversationRecord>,
    ) -> Self {
        let session = conversation.session();
        let mut messages: Vec<Message> = session.messages().cloned().collect();
        messages.sort_by(|a, b| (a.created_at(), a.id()).cmp(&(b.created_at(), b.id())));

        Self {
            conversation_id: conversation.id().to_string(),
            project: project.to_string(),
            name: name
                .map(str::to_string)
                .or_else(|| previous.and_then(|p| p.name.clone())),
            title: conversation.title().map(str::to_string),
            leaf: session.leaf().map(str::to_string),
            created_at: session.created_at(),
            updated_at: Utc::now(),
            messages,
        }
    }

    /// Rebuild the conversation, positioned at the stored leaf
    pub fn restore(self) -> ConduitResult<Conversation> {
        let session = Session::hydrate(
            self.conversation_id,
            self.messages,
            self.leaf,
            self.created_at,
        )
        .map_err(ConduitError::from)?;
        Ok(Conversation::from_session(session, self.title))
    }

    pub fn summary(&self) -> ConversationSummary {
        ConversationSummary {
            conversation_id: self.conversation_id.clone(),
            name: self.name.clone(),
            title: self.title.clone(),
            message_count: self.messages.len(),
            updated_at: self.updated_at,
        }
    }
}

/// Listing metadata without the message graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub conversation_id: String,
    pub name: Option<String>,
    pub title: Option<String>,
    pub message_count: usize,
    pub updated_at: DateTime<Utc>,
}

/// How an orchestrator combines loading and saving
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersistenceMode {
    /// Discard any stored conversation and start fresh
    Overwrite,
    /// Continue the stored conversation, or start one
    #[default]
    Resume,
    /// Resume and generate a title when missing
    Chat,
}

impl fmt::Display for PersistenceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Overwrite => "overwrite",
            Self::Resume => "resume",
            Self::Chat => "chat",
        };
        f.write_str(s)
    }
}

impl FromStr for PersistenceMode {
    type Err = ConduitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "overwrite" => Ok(Self::Overwrite),
            "resume" => Ok(Self::Resume),
            "chat" => Ok(Self::Chat),
            other => Err(ConduitError::invalid_field(
                "persistence_mode",
                format!("unknown persistence mode '{}'", other),
            )),
        }
    }
}

/// Reject identifiers that could escape a storage directory
pub(crate) fn check_identifier(id: &str) -> ConduitResult<()> {
    let valid = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(ConduitError::invalid_field(
            "conversation_id",
            format!("invalid conversation identifier '{}'", id),
        ))
    }
}
