//! Linear conversation views over a session graph
//!
//! [`resolve_chain`] walks predecessor links from a leaf back to a root.
//! [`ConversationView`] borrows the resolved chain and exposes the usual
//! accessors. [`Conversation`] is the owned aggregate that pairs a session
//! with its title and is what the repository persists.

mod aggregate;
mod chain;
mod view;

pub use aggregate::Conversation;
pub use chain::resolve_chain;
pub use view::{ConversationState, ConversationView, Turn, validate_sequence};
