//! Logging configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Whether to log to file
    pub log_to_file: bool,
    /// Log file path
    pub log_file: Option<PathBuf>,
    /// Log format (json, pretty, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            log_to_file: false,
            log_file: None,
            format: "compact".to_string(),
        }
    }
}

impl LoggingConfig {
    /// Merge with another logging config
    pub fn merge(&mut self, other: LoggingConfig) {
        if !other.level.is_empty() {
            self.level = other.level;
        }

        self.log_to_file = other.log_to_file;

        if other.log_file.is_some() {
            self.log_file = other.log_file;
        }

        if !other.format.is_empty() {
            self.format = other.format;
        }
    }

    /// Log file to write to, when file logging is on
    pub fn resolved_log_file(&self) -> Option<PathBuf> {
        if !self.log_to_file {
            return None;
        }
        self.log_file.clone().or_else(|| {
            dirs::home_dir().map(|home| home.join(".conduit").join("conduit.log"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_config_default() {
        let config = LoggingConfig::default();
        assert_eq!(config.level, "warn");
        assert!(!config.log_to_file);
        assert_eq!(config.format, "compact");
        assert!(config.resolved_log_file().is_none());
    }

    #[test]
    fn test_logging_config_merge() {
        let mut config = LoggingConfig::default();
        config.merge(LoggingConfig {
            level: "debug".to_string(),
            log_to_file: true,
            log_file: Some(PathBuf::from("/tmp/conduit.log")),
            format: String::new(),
        });

        assert_eq!(config.level, "debug");
        assert!(config.log_to_file);
        assert_eq!(config.format, "compact");
        assert_eq!(
            config.resolved_log_file(),
            Some(PathBuf::from("/tmp/conduit.log"))
        );
    }
}
