//! Turn orchestration
//!
//! [`Conduit`] ties the pieces together for one turn: it builds a request from
//! the conversation, consults the cache, dispatches to the provider with
//! retry, registers the reply, answers tool calls and persists the result.
//! Turns on the same conversation id are serialized.

mod conduit;
mod options;
mod title;

pub use conduit::{Conduit, TurnOutcome};
pub use options::{ConduitOptions, DEFAULT_MAX_TOOL_ROUNDS};

#[cfg(test)]
mod tests;
