//! Conduit Core Library
//!
//! Client-side orchestration for LLM conversations. Messages live in a
//! per-session graph where each message points at its predecessor, so
//! branches and edits never rewrite history. Provider calls go through a
//! fingerprinted response cache, and conversations are persisted through a
//! pluggable repository.

pub mod cache;
pub mod commands;
pub mod config;
pub mod conversation;
pub mod error;
pub mod events;
pub mod message;
pub mod orchestrator;
pub mod prompts;
pub mod provider;
pub mod recovery;
pub mod repository;
pub mod request;
pub mod session;
pub mod tools;
pub mod workflow;

// Re-export commonly used types
pub use cache::{CacheConfig, CacheStats, ConduitCache, ResponseCache};
pub use config::{ConduitConfig, LoggingConfig, load_config};
pub use conversation::{Conversation, ConversationView};
pub use error::{ConduitError, ConduitResult, GraphIntegrityError};
pub use events::{DisplayHandler, ProgressEvent};
pub use message::{Message, MessageContent, Role, ToolCall};
pub use orchestrator::{Conduit, ConduitOptions, TurnOutcome};
pub use provider::{OpenAiCompatibleProvider, ProviderAdapter, ProviderError};
pub use repository::{
    ConversationRepository, FileRepository, MemoryRepository, PersistenceMode,
};
pub use request::{GenerationParams, Request, Response, ResponseMetadata, StopReason};
pub use session::Session;
