//! Session message graph
//!
//! A [`Session`] owns every message produced in one conversational context,
//! keyed by identifier, plus the leaf pointer naming the current tip.

mod graph;

pub use graph::Session;
