//! The immutable message record

use super::types::{MessageContent, Role, ToolCall};
use crate::error::{ConduitError, ConduitResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single node of the conversation graph.
///
/// Fields are private: once a message exists its identifier and payload
/// never change. The only mutation is the session assignment performed by
/// [`crate::session::Session::register`] on a message that has none yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    message_id: String,
    role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content: Option<MessageContent>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<ToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    reasoning: Option<String>,
    #[serde(default)]
    predecessor_id: Option<String>,
    #[serde(default)]
    session_id: Option<String>,
    created_at: DateTime<Utc>,
}

impl Message {
    fn build(role: Role, content: Option<MessageContent>) -> Self {
        Self {
            message_id: Uuid::new_v4().to_string(),
            role,
            content,
            tool_calls: Vec::new(),
            tool_call_id: None,
            name: None,
            reasoning: None,
            predecessor_id: None,
            session_id: None,
            created_at: Utc::now(),
        }
    }

    /// Create a system message
    pub fn system(content: impl Into<MessageContent>) -> Self {
        Self::build(Role::System, Some(content.into()))
    }

    /// Create a user message
    pub fn user(content: impl Into<MessageContent>) -> Self {
        Self::build(Role::User, Some(content.into()))
    }

    /// Create an assistant message with text content
    pub fn assistant(content: impl Into<MessageContent>) -> Self {
        Self::build(Role::Assistant, Some(content.into()))
    }

    /// Create an assistant message that requests tool calls.
    ///
    /// Fails when there is neither content nor a tool call.
    pub fn assistant_with_tool_calls(
        content: Option<MessageContent>,
        tool_calls: Vec<ToolCall>,
    ) -> ConduitResult<Self> {
        let content = content.filter(|c| !c.is_empty());
        if content.is_none() && tool_calls.is_empty() {
            return Err(ConduitError::invalid_field(
                "content",
                "assistant message needs content or tool calls",
            ));
        }
        let mut message = Self::build(Role::Assistant, content);
        message.tool_calls = tool_calls;
        Ok(message)
    }

    /// Create a tool result answering `tool_call_id`
    pub fn tool_result(
        tool_call_id: impl Into<String>,
        name: Option<String>,
        content: impl Into<MessageContent>,
    ) -> Self {
        let mut message = Self::build(Role::Tool, Some(content.into()));
        message.tool_call_id = Some(tool_call_id.into());
        message.name = name;
        message
    }

    /// Attach model reasoning text
    pub fn with_reasoning(mut self, reasoning: impl Into<String>) -> Self {
        self.reasoning = Some(reasoning.into());
        self
    }

    /// Link this message after `parent`, inheriting its session
    pub fn reply_to(mut self, parent: &Message) -> Self {
        self.predecessor_id = Some(parent.message_id.clone());
        self.session_id = parent.session_id.clone();
        self
    }

    /// Link this message after the message with `predecessor_id`
    pub fn with_predecessor(mut self, predecessor_id: impl Into<String>) -> Self {
        self.predecessor_id = Some(predecessor_id.into());
        self
    }

    /// A new message with different content but the same position in the graph
    pub fn revise(&self, content: impl Into<MessageContent>) -> Self {
        Self {
            message_id: Uuid::new_v4().to_string(),
            content: Some(content.into()),
            created_at: Utc::now(),
            ..self.clone()
        }
    }

    /// The same payload under a fresh identifier, detached from any session.
    ///
    /// Used when replaying a stored message into another conversation.
    pub fn replay(&self, predecessor_id: Option<String>) -> Self {
        Self {
            message_id: Uuid::new_v4().to_string(),
            predecessor_id,
            session_id: None,
            created_at: Utc::now(),
            ..self.clone()
        }
    }

    pub(crate) fn assign_session(&mut self, session_id: &str) {
        self.session_id = Some(session_id.to_string());
    }

    /// Whether two messages carry the same payload and graph position,
    /// ignoring session assignment and timestamps
    pub fn same_payload(&self, other: &Message) -> bool {
        self.role == other.role
            && self.content == other.content
            && self.tool_calls == other.tool_calls
            && self.tool_call_id == other.tool_call_id
            && self.name == other.name
            && self.reasoning == other.reasoning
            && self.predecessor_id == other.predecessor_id
    }

    pub fn id(&self) -> &str {
        &self.message_id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> Option<&MessageContent> {
        self.content.as_ref()
    }

    /// Plain-text rendering of the content, empty when there is none
    pub fn text(&self) -> String {
        self.content
            .as_ref()
            .map(MessageContent::as_text)
            .unwrap_or_default()
    }

    pub fn tool_calls(&self) -> &[ToolCall] {
        &self.tool_calls
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }

    pub fn tool_call_id(&self) -> Option<&str> {
        self.tool_call_id.as_deref()
    }

    pub fn tool_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn reasoning(&self) -> Option<&str> {
        self.reasoning.as_deref()
    }

    pub fn predecessor_id(&self) -> Option<&str> {
        self.predecessor_id.as_deref()
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn is_root(&self) -> bool {
        self.predecessor_id.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors_assign_unique_ids() {
        let a = Message::user("hello");
        let b = Message::user("hello");
        assert_ne!(a.id(), b.id());
        assert!(a.same_payload(&b));
        assert!(a.is_root());
        assert_eq!(a.session_id(), None);
    }

    #[test]
    fn test_reply_to_links_parent() {
        let mut root = Message::user("hi");
        root.assign_session("s-1");
        let reply = Message::assistant("hello").reply_to(&root);
        assert_eq!(reply.predecessor_id(), Some(root.id()));
        assert_eq!(reply.session_id(), Some("s-1"));
    }

    #[test]
    fn test_revise_mints_new_id() {
        let root = Message::user("first");
        let reply = Message::assistant("draft").reply_to(&root);
        let revised = reply.revise("final");

        assert_ne!(revised.id(), reply.id());
        assert_eq!(revised.predecessor_id(), reply.predecessor_id());
        assert_eq!(reply.text(), "draft");
        assert_eq!(revised.text(), "final");
    }

    #[test]
    fn test_replay_detaches_session() {
        let mut original = Message::assistant("cached answer");
        original.assign_session("old");
        let replayed = original.replay(Some("parent".to_string()));

        assert_ne!(replayed.id(), original.id());
        assert_eq!(replayed.session_id(), None);
        assert_eq!(replayed.predecessor_id(), Some("parent"));
        assert_eq!(replayed.text(), "cached answer");
    }

    #[test]
    fn test_assistant_requires_content_or_calls() {
        assert!(Message::assistant_with_tool_calls(None, vec![]).is_err());
        assert!(
            Message::assistant_with_tool_calls(Some("".into()), vec![]).is_err()
        );

        let call = ToolCall::new("call_1", "lookup", serde_json::json!({"q": "rust"}));
        let message = Message::assistant_with_tool_calls(None, vec![call]).unwrap();
        assert!(message.has_tool_calls());
        assert_eq!(message.text(), "");
    }

    #[test]
    fn test_serde_round_trip_preserves_identity() {
        let root = Message::system("be brief");
        let tool = Message::tool_result("call_9", Some("clock".into()), "12:00").reply_to(&root);
        let json = serde_json::to_string(&tool).unwrap();
        let back: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tool);
        assert_eq!(back.tool_call_id(), Some("call_9"));
        assert_eq!(back.tool_name(), Some("clock"));
    }
}
