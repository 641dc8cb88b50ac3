//! Constructor methods for ConduitError

use super::types::ConduitError;

impl ConduitError {
    /// Create a conversation shape error
    pub fn conversation(message: impl Into<String>) -> Self {
        Self::Conversation {
            message: message.into(),
            context: None,
        }
    }

    /// Create a conversation error with context
    pub fn conversation_with_context(
        message: impl Into<String>,
        context: impl Into<String>,
    ) -> Self {
        Self::Conversation {
            message: message.into(),
            context: Some(context.into()),
        }
    }

    /// Create a new persistence error
    pub fn persistence(message: impl Into<String>) -> Self {
        Self::Persistence {
            message: message.into(),
            context: None,
        }
    }

    /// Create a persistence error with context
    pub fn persistence_with_context(
        message: impl Into<String>,
        context: impl Into<String>,
    ) -> Self {
        Self::Persistence {
            message: message.into(),
            context: Some(context.into()),
        }
    }

    /// Create a new cache error
    pub fn cache(message: impl Into<String>) -> Self {
        Self::Cache {
            message: message.into(),
            context: None,
        }
    }

    /// Create a cache error with context
    pub fn cache_with_context(message: impl Into<String>, context: impl Into<String>) -> Self {
        Self::Cache {
            message: message.into(),
            context: Some(context.into()),
        }
    }

    /// Create a new tool error
    pub fn tool(tool_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Tool {
            tool_name: tool_name.into(),
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            context: None,
        }
    }

    /// Create a configuration error with context
    pub fn config_with_context(message: impl Into<String>, context: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            context: Some(context.into()),
        }
    }

    /// Create a new IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
            path: None,
        }
    }

    /// Create an IO error with path
    pub fn io_with_path(message: impl Into<String>, path: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
            path: Some(path.into()),
        }
    }

    /// Create a new JSON error
    pub fn json(message: impl Into<String>) -> Self {
        Self::Json {
            message: message.into(),
        }
    }

    /// Create a new invalid input error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
            field: None,
        }
    }

    /// Create an invalid input error naming the field
    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create a timeout error
    pub fn timeout(seconds: u64) -> Self {
        Self::Timeout { seconds }
    }

    /// Whether callers should degrade instead of aborting.
    ///
    /// Cache and persistence failures never invalidate the in-memory
    /// conversation; graph corruption always does.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Cache { .. } | Self::Persistence { .. } | Self::Tool { .. }
        )
    }
}
