//! Interactive command dispatch
//!
//! Commands are registered explicitly into a [`CommandRegistry`] keyed by
//! name and alias; [`builtin_commands`] provides the chat defaults.

mod builtin;
mod registry;

pub use builtin::builtin_commands;
pub use registry::{CommandOutcome, CommandRegistry, CommandSpec};
