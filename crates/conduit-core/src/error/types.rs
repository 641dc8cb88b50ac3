//! Core error types and traits for Conduit

use crate::provider::ProviderError;
use thiserror::Error;

/// Result type alias for Conduit operations
pub type ConduitResult<T> = Result<T, ConduitError>;

/// Common accessors shared by every Conduit error.
pub trait UnifiedError: std::error::Error + Send + Sync {
    /// Get the error code for programmatic handling
    fn error_code(&self) -> &str;

    /// Get the human-readable error message
    fn message(&self) -> &str;

    /// Get optional context about the error
    fn context(&self) -> Option<&str> {
        None
    }

    /// Check if this error is retryable
    fn is_retryable(&self) -> bool {
        false
    }
}

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error
    fn context<C: std::fmt::Display>(self, context: C) -> ConduitResult<T>;

    /// Add context lazily (only evaluated on error)
    fn with_context<C: std::fmt::Display, F: FnOnce() -> C>(self, f: F) -> ConduitResult<T>;
}

impl<T, E: std::fmt::Display> ResultExt<T> for Result<T, E> {
    fn context<C: std::fmt::Display>(self, context: C) -> ConduitResult<T> {
        self.map_err(|e| ConduitError::invalid_input(format!("{}: {}", context, e)))
    }

    fn with_context<C: std::fmt::Display, F: FnOnce() -> C>(self, f: F) -> ConduitResult<T> {
        self.map_err(|e| ConduitError::invalid_input(format!("{}: {}", f(), e)))
    }
}

/// Extension trait for adding context to Option types
pub trait OptionExt<T> {
    /// Convert Option to Result with context message
    fn context<C: std::fmt::Display>(self, context: C) -> ConduitResult<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn context<C: std::fmt::Display>(self, context: C) -> ConduitResult<T> {
        self.ok_or_else(|| ConduitError::invalid_input(context.to_string()))
    }
}

/// Corruption or misuse of a session's message graph.
///
/// Every variant names the message that triggered it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphIntegrityError {
    /// A predecessor link points at a message that is not in the graph
    #[error("message {message_id} references missing predecessor {missing_id}")]
    DanglingReference {
        message_id: String,
        missing_id: String,
    },

    /// Chain resolution revisited a message
    #[error("cycle detected while resolving chain at message {message_id}")]
    CycleDetected { message_id: String },

    /// The requested message is not registered
    #[error("message {message_id} is not registered in this session")]
    UnknownMessage { message_id: String },

    /// The message is already owned by another session
    #[error("message {message_id} belongs to session {found}, not {expected}")]
    ForeignSession {
        message_id: String,
        expected: String,
        found: String,
    },

    /// The identifier is taken by a message with a different payload
    #[error("message {message_id} is already registered with different content")]
    ContentConflict { message_id: String },

    /// A branch was requested from a message without a usable predecessor
    #[error("cannot branch from message {message_id}: {reason}")]
    InvalidBranch { message_id: String, reason: String },
}

impl GraphIntegrityError {
    /// Identifier of the offending message
    pub fn message_id(&self) -> &str {
        match self {
            Self::DanglingReference { message_id, .. }
            | Self::CycleDetected { message_id }
            | Self::UnknownMessage { message_id }
            | Self::ForeignSession { message_id, .. }
            | Self::ContentConflict { message_id }
            | Self::InvalidBranch { message_id, .. } => message_id,
        }
    }
}

/// Main error type for Conduit
#[derive(Error, Debug, Clone)]
pub enum ConduitError {
    /// Message graph corruption
    #[error("Graph integrity error: {0}")]
    GraphIntegrity(#[from] GraphIntegrityError),

    /// Conversation shape violations (role patterns, system placement)
    #[error("Conversation error: {message}")]
    Conversation {
        message: String,
        context: Option<String>,
    },

    /// Provider failures after retries are exhausted
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Repository failures
    #[error("Persistence error: {message}")]
    Persistence {
        message: String,
        context: Option<String>,
    },

    /// Cache failures
    #[error("Cache error: {message}")]
    Cache {
        message: String,
        context: Option<String>,
    },

    /// Tool execution errors
    #[error("Tool error: {tool_name}: {message}")]
    Tool { tool_name: String, message: String },

    /// Configuration related errors
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        context: Option<String>,
    },

    /// IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        path: Option<String>,
    },

    /// JSON serialization/deserialization errors
    #[error("JSON error: {message}")]
    Json { message: String },

    /// Invalid input errors
    #[error("Invalid input: {message}")]
    InvalidInput {
        message: String,
        field: Option<String>,
    },

    /// Operation was cancelled
    #[error("Operation was cancelled")]
    Cancelled,

    /// Operation timed out
    #[error("Operation timed out after {seconds} seconds")]
    Timeout { seconds: u64 },
}
