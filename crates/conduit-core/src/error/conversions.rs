//! From trait implementations for ConduitError conversions

use super::types::ConduitError;
use crate::provider::ProviderError;

impl From<anyhow::Error> for ConduitError {
    fn from(error: anyhow::Error) -> Self {
        Self::invalid_input(error.to_string())
    }
}

impl From<std::io::Error> for ConduitError {
    fn from(error: std::io::Error) -> Self {
        Self::io(error.to_string())
    }
}

impl From<serde_json::Error> for ConduitError {
    fn from(error: serde_json::Error) -> Self {
        Self::json(error.to_string())
    }
}

impl From<reqwest::Error> for ConduitError {
    fn from(error: reqwest::Error) -> Self {
        Self::Provider(ProviderError::from(error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GraphIntegrityError;

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing file");
        let err: ConduitError = io.into();
        assert!(matches!(err, ConduitError::Io { .. }));
        assert!(err.to_string().contains("missing file"));
    }

    #[test]
    fn test_json_error_conversion() {
        let parse = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: ConduitError = parse.into();
        assert!(matches!(err, ConduitError::Json { .. }));
    }

    #[test]
    fn test_graph_error_names_message() {
        let err: ConduitError = GraphIntegrityError::CycleDetected {
            message_id: "m-42".to_string(),
        }
        .into();
        assert!(err.to_string().contains("m-42"));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_recoverable_classification() {
        assert!(ConduitError::cache("disk full").is_recoverable());
        assert!(ConduitError::persistence("unreachable").is_recoverable());
        assert!(!ConduitError::config("bad").is_recoverable());
    }
}
