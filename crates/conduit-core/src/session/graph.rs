//! Append-only message graph with a leaf pointer

use crate::conversation::{ConversationView, resolve_chain};
use crate::error::GraphIntegrityError;
use crate::message::Message;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use tracing::debug;
use uuid::Uuid;

/// All messages of one conversational context.
///
/// Registration validates referential integrity at insert time: a message
/// whose predecessor is not yet registered is rejected. Graphs rebuilt from
/// storage go through [`Session::hydrate`] instead, and any corruption they
/// carry is reported when a chain is resolved.
#[derive(Debug, Clone)]
pub struct Session {
    session_id: String,
    messages: HashMap<String, Message>,
    leaf: Option<String>,
    created_at: DateTime<Utc>,
}

impl Session {
    /// Create an empty session with a fresh identifier
    pub fn new() -> Self {
        Self::with_id(Uuid::new_v4().to_string())
    }

    /// Create an empty session with a known identifier
    pub fn with_id(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            messages: HashMap::new(),
            leaf: None,
            created_at: Utc::now(),
        }
    }

    /// Rebuild a session from persisted messages.
    ///
    /// Predecessor links are not checked here. The leaf must name a stored
    /// message, and messages stamped with another session are rejected.
    pub fn hydrate(
        session_id: impl Into<String>,
        messages: impl IntoIterator<Item = Message>,
        leaf: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, GraphIntegrityError> {
        let mut session = Self {
            created_at,
            ..Self::with_id(session_id)
        };

        for mut message in messages {
            session.check_owner(&message)?;
            if let Some(existing) = session.messages.get(message.id()) {
                if !existing.same_payload(&message) {
                    return Err(GraphIntegrityError::ContentConflict {
                        message_id: message.id().to_string(),
                    });
                }
                continue;
            }
            message.assign_session(&session.session_id);
            session.messages.insert(message.id().to_string(), message);
        }

        if let Some(leaf) = &leaf {
            if !session.messages.contains_key(leaf) {
                return Err(GraphIntegrityError::UnknownMessage {
                    message_id: leaf.clone(),
                });
            }
        }
        session.leaf = leaf;

        Ok(session)
    }

    fn check_owner(&self, message: &Message) -> Result<(), GraphIntegrityError> {
        match message.session_id() {
            Some(found) if found != self.session_id => Err(GraphIntegrityError::ForeignSession {
                message_id: message.id().to_string(),
                expected: self.session_id.clone(),
                found: found.to_string(),
            }),
            _ => Ok(()),
        }
    }

    /// Register a message and move the leaf to it.
    ///
    /// Re-registering an identical message leaves the graph untouched but
    /// still moves the leaf. A different payload under a known identifier,
    /// a missing predecessor, or a message owned by another session is
    /// rejected without mutating anything.
    pub fn register(&mut self, mut message: Message) -> Result<(), GraphIntegrityError> {
        self.check_owner(&message)?;

        if let Some(existing) = self.messages.get(message.id()) {
            if !existing.same_payload(&message) {
                return Err(GraphIntegrityError::ContentConflict {
                    message_id: message.id().to_string(),
                });
            }
            self.leaf = Some(message.id().to_string());
            return Ok(());
        }

        if let Some(predecessor) = message.predecessor_id() {
            if !self.messages.contains_key(predecessor) {
                return Err(GraphIntegrityError::DanglingReference {
                    message_id: message.id().to_string(),
                    missing_id: predecessor.to_string(),
                });
            }
        }

        message.assign_session(&self.session_id);
        let id = message.id().to_string();
        debug!(
            "Registered {} message {} in session {}",
            message.role(),
            id,
            self.session_id
        );
        self.messages.insert(id.clone(), message);
        self.leaf = Some(id);

        Ok(())
    }

    pub fn id(&self) -> &str {
        &self.session_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Identifier of the current tip, `None` for an empty session
    pub fn leaf(&self) -> Option<&str> {
        self.leaf.as_deref()
    }

    pub fn leaf_message(&self) -> Option<&Message> {
        self.leaf.as_ref().and_then(|id| self.messages.get(id))
    }

    pub fn get(&self, message_id: &str) -> Option<&Message> {
        self.messages.get(message_id)
    }

    pub fn contains(&self, message_id: &str) -> bool {
        self.messages.contains_key(message_id)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// All registered messages in no particular order
    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.messages.values()
    }

    /// Resolve the chain ending at the current leaf, root first
    pub fn resolve(&self) -> Result<Vec<&Message>, GraphIntegrityError> {
        match &self.leaf {
            Some(leaf) => resolve_chain(&self.messages, leaf),
            None => Ok(Vec::new()),
        }
    }

    /// Resolve the chain ending at `message_id`, root first
    pub fn resolve_from(&self, message_id: &str) -> Result<Vec<&Message>, GraphIntegrityError> {
        resolve_chain(&self.messages, message_id)
    }

    /// Conversation view positioned at the current leaf
    pub fn view(&self) -> Result<ConversationView<'_>, GraphIntegrityError> {
        Ok(ConversationView::new(self.resolve()?))
    }

    /// Conversation view ending at `message_id`
    pub fn view_at(&self, message_id: &str) -> Result<ConversationView<'_>, GraphIntegrityError> {
        Ok(ConversationView::new(self.resolve_from(message_id)?))
    }

    /// Direct replies to `message_id`, oldest first
    pub fn children_of(&self, message_id: &str) -> Vec<&Message> {
        let mut children: Vec<&Message> = self
            .messages
            .values()
            .filter(|m| m.predecessor_id() == Some(message_id))
            .collect();
        children.sort_by(|a, b| (a.created_at(), a.id()).cmp(&(b.created_at(), b.id())));
        children
    }

    /// Messages nothing replies to, oldest first
    pub fn leaves(&self) -> Vec<&Message> {
        let referenced: HashSet<&str> = self
            .messages
            .values()
            .filter_map(Message::predecessor_id)
            .collect();
        let mut leaves: Vec<&Message> = self
            .messages
            .values()
            .filter(|m| !referenced.contains(m.id()))
            .collect();
        leaves.sort_by(|a, b| (a.created_at(), a.id()).cmp(&(b.created_at(), b.id())));
        leaves
    }

    /// One conversation per leaf of the graph
    pub fn conversations(&self) -> Result<Vec<ConversationView<'_>>, GraphIntegrityError> {
        self.leaves()
            .into_iter()
            .map(|leaf| self.view_at(leaf.id()))
            .collect()
    }

    /// Conversation ending at an interior message, as a starting point for
    /// an alternative continuation
    pub fn branch(&self, from_message_id: &str) -> Result<ConversationView<'_>, GraphIntegrityError> {
        let message =
            self.messages
                .get(from_message_id)
                .ok_or_else(|| GraphIntegrityError::UnknownMessage {
                    message_id: from_message_id.to_string(),
                })?;

        match message.predecessor_id() {
            None => Err(GraphIntegrityError::InvalidBranch {
                message_id: from_message_id.to_string(),
                reason: "message is a root".to_string(),
            }),
            Some(predecessor) if !self.messages.contains_key(predecessor) => {
                Err(GraphIntegrityError::DanglingReference {
                    message_id: from_message_id.to_string(),
                    missing_id: predecessor.to_string(),
                })
            }
            Some(_) => self.view_at(from_message_id),
        }
    }

    /// Move the leaf pointer to an existing message
    pub fn checkout(&mut self, message_id: &str) -> Result<(), GraphIntegrityError> {
        if !self.messages.contains_key(message_id) {
            return Err(GraphIntegrityError::UnknownMessage {
                message_id: message_id.to_string(),
            });
        }
        self.leaf = Some(message_id.to_string());
        Ok(())
    }

    /// Drop every message that is not on the current leaf's chain.
    ///
    /// Returns the number of messages removed.
    pub fn prune(&mut self) -> Result<usize, GraphIntegrityError> {
        let keep: HashSet<String> = self
            .resolve()?
            .into_iter()
            .map(|m| m.id().to_string())
            .collect();
        let before = self.messages.len();
        self.messages.retain(|id, _| keep.contains(id));
        let removed = before - self.messages.len();
        if removed > 0 {
            debug!("Pruned {} messages from session {}", removed, self.session_id);
        }
        Ok(removed)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
