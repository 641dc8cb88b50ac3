//! Conduit
//!
//! Client-side orchestration for LLM conversations. This crate re-exports
//! [`conduit_core`]; the `conduit` binary lives in `crates/conduit-cli`.

pub use conduit_core::*;
