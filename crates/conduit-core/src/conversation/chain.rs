//! Chain resolution

use crate::error::GraphIntegrityError;
use crate::message::Message;
use std::collections::{HashMap, HashSet};

/// Resolve the chain ending at `leaf_id`, returned root first.
///
/// Fails on an unknown leaf, on a predecessor link to a missing message,
/// and on any revisited message. The visited set never grows beyond the
/// number of messages in `messages`, so resolution always terminates.
pub fn resolve_chain<'a>(
    messages: &'a HashMap<String, Message>,
    leaf_id: &str,
) -> Result<Vec<&'a Message>, GraphIntegrityError> {
    let mut current = messages
        .get(leaf_id)
        .ok_or_else(|| GraphIntegrityError::UnknownMessage {
            message_id: leaf_id.to_string(),
        })?;

    let mut visited: HashSet<&str> = HashSet::with_capacity(messages.len().min(64));
    let mut chain = Vec::new();

    loop {
        if !visited.insert(current.id()) {
            return Err(GraphIntegrityError::CycleDetected {
                message_id: current.id().to_string(),
            });
        }
        chain.push(current);

        let Some(predecessor) = current.predecessor_id() else {
            break;
        };
        current = messages
            .get(predecessor)
            .ok_or_else(|| GraphIntegrityError::DanglingReference {
                message_id: current.id().to_string(),
                missing_id: predecessor.to_string(),
            })?;
    }

    chain.reverse();
    Ok(chain)
}
