//! Error types for Conduit
//!
//! A single crate-wide error enum carries every failure the core can surface.
//! Graph corruption has its own enum so callers can match on the offending
//! message identifier; provider failures use the provider-neutral taxonomy
//! from [`crate::provider::ProviderError`].

mod constructors;
mod conversions;
mod types;
mod unified_error;

pub use types::{ConduitError, ConduitResult, GraphIntegrityError, OptionExt, ResultExt, UnifiedError};
