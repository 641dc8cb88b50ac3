//! Conversation messages
//!
//! A [`Message`] is immutable once built: the identifier, role and payload
//! are fixed at construction and only exposed through getters. Editing is
//! modelled as [`Message::revise`], which mints a new message.

mod model;
mod types;

pub use model::Message;
pub use types::{ContentPart, ImageDetail, MessageContent, Role, ToolCall};
