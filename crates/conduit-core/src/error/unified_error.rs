//! UnifiedError trait implementation for ConduitError

use super::types::{ConduitError, UnifiedError};

impl UnifiedError for ConduitError {
    fn error_code(&self) -> &str {
        match self {
            Self::GraphIntegrity(_) => "CONDUIT_GRAPH",
            Self::Conversation { .. } => "CONDUIT_CONVERSATION",
            Self::Provider(_) => "CONDUIT_PROVIDER",
            Self::Persistence { .. } => "CONDUIT_PERSISTENCE",
            Self::Cache { .. } => "CONDUIT_CACHE",
            Self::Tool { .. } => "CONDUIT_TOOL",
            Self::Config { .. } => "CONDUIT_CONFIG",
            Self::Io { .. } => "CONDUIT_IO",
            Self::Json { .. } => "CONDUIT_JSON",
            Self::InvalidInput { .. } => "CONDUIT_INVALID_INPUT",
            Self::Cancelled => "CONDUIT_CANCELLED",
            Self::Timeout { .. } => "CONDUIT_TIMEOUT",
        }
    }

    fn message(&self) -> &str {
        match self {
            Self::GraphIntegrity(e) => e.message_id(),
            Self::Conversation { message, .. } => message,
            Self::Provider(_) => "provider request failed",
            Self::Persistence { message, .. } => message,
            Self::Cache { message, .. } => message,
            Self::Tool { message, .. } => message,
            Self::Config { message, .. } => message,
            Self::Io { message, .. } => message,
            Self::Json { message } => message,
            Self::InvalidInput { message, .. } => message,
            Self::Cancelled => "Operation was cancelled",
            Self::Timeout { .. } => "Operation timed out",
        }
    }

    fn context(&self) -> Option<&str> {
        match self {
            Self::Conversation { context, .. }
            | Self::Persistence { context, .. }
            | Self::Cache { context, .. }
            | Self::Config { context, .. } => context.as_deref(),
            Self::Io { path, .. } => path.as_deref(),
            Self::InvalidInput { field, .. } => field.as_deref(),
            _ => None,
        }
    }

    fn is_retryable(&self) -> bool {
        match self {
            Self::Provider(e) => e.is_retryable(),
            Self::Timeout { .. } => true,
            _ => false,
        }
    }
}
