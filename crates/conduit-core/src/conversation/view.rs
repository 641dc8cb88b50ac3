//! Borrowed root-to-leaf view

use crate::error::{ConduitError, ConduitResult};
use crate::message::{Message, Role};
use serde::{Deserialize, Serialize};

/// What the conversation needs next, derived from its last message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationState {
    /// Last message is from the user or a tool: ask the model
    Generate,
    /// Assistant requested tool calls: run them
    Execute,
    /// Assistant answered: the turn is over
    Terminate,
    /// Nothing to act on yet
    Incomplete,
}

/// A user prompt and the assistant message that closed it
#[derive(Debug, Clone, Copy)]
pub struct Turn<'a> {
    pub prompt: &'a Message,
    pub reply: Option<&'a Message>,
}

/// A linear chain of messages borrowed from a session
#[derive(Debug, Clone)]
pub struct ConversationView<'a> {
    messages: Vec<&'a Message>,
}

impl<'a> ConversationView<'a> {
    pub(crate) fn new(messages: Vec<&'a Message>) -> Self {
        Self { messages }
    }

    pub fn messages(&self) -> &[&'a Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Concatenated role codes, e.g. `"SUA"`
    pub fn roles(&self) -> String {
        self.messages.iter().map(|m| m.role().code()).collect()
    }

    /// Fail unless the role pattern is exactly `expected`
    pub fn require_roles(&self, expected: &str) -> ConduitResult<()> {
        let actual = self.roles();
        if actual != expected {
            return Err(ConduitError::conversation_with_context(
                format!("expected role pattern '{}', found '{}'", expected, actual),
                self.leaf_id().unwrap_or("<empty>").to_string(),
            ));
        }
        Ok(())
    }

    /// The system message, which can only be first
    pub fn system(&self) -> Option<&'a Message> {
        self.messages
            .first()
            .copied()
            .filter(|m| m.role() == Role::System)
    }

    pub fn first(&self) -> Option<&'a Message> {
        self.messages.first().copied()
    }

    pub fn last(&self) -> Option<&'a Message> {
        self.messages.last().copied()
    }

    pub fn leaf_id(&self) -> Option<&'a str> {
        self.last().map(Message::id)
    }

    /// Text of the last message, empty for an empty conversation
    pub fn content(&self) -> String {
        self.last().map(Message::text).unwrap_or_default()
    }

    /// First user message in the chain
    pub fn first_user(&self) -> Option<&'a Message> {
        self.messages
            .iter()
            .copied()
            .find(|m| m.role() == Role::User)
    }

    /// User prompts paired with the last assistant message before the next prompt
    pub fn turns(&self) -> Vec<Turn<'a>> {
        let mut turns: Vec<Turn<'a>> = Vec::new();
        for message in self.messages.iter().copied() {
            match message.role() {
                Role::User => turns.push(Turn {
                    prompt: message,
                    reply: None,
                }),
                Role::Assistant => {
                    if let Some(turn) = turns.last_mut() {
                        turn.reply = Some(message);
                    }
                }
                Role::System | Role::Tool => {}
            }
        }
        turns
    }

    pub fn state(&self) -> ConversationState {
        match self.last() {
            None => ConversationState::Incomplete,
            Some(last) => match last.role() {
                Role::User | Role::Tool => ConversationState::Generate,
                Role::Assistant if last.has_tool_calls() => ConversationState::Execute,
                Role::Assistant => ConversationState::Terminate,
                Role::System => ConversationState::Incomplete,
            },
        }
    }

    /// Check system placement and role alternation
    pub fn validate(&self) -> ConduitResult<()> {
        validate_sequence(&self.messages)
    }

    /// Owned copies of the chain
    pub fn to_messages(&self) -> Vec<Message> {
        self.messages.iter().map(|m| (*m).clone()).collect()
    }
}

/// Validate a message sequence as a conversation.
///
/// At most one system message, and only in first position. Two adjacent
/// messages may share a role only when both are tool results.
pub fn validate_sequence(messages: &[&Message]) -> ConduitResult<()> {
    for (index, message) in messages.iter().enumerate() {
        if message.role() == Role::System && index > 0 {
            return Err(ConduitError::conversation_with_context(
                "system message must be the first message",
                message.id().to_string(),
            ));
        }
        if index > 0 {
            let previous = messages[index - 1];
            if message.role() != Role::Tool && message.role() == previous.role() {
                return Err(ConduitError::conversation_with_context(
                    format!("two consecutive {} messages", message.role()),
                    message.id().to_string(),
                ));
            }
        }
    }
    Ok(())
}
