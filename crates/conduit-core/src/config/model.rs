//! Configuration data model

use super::logging_config::LoggingConfig;
use crate::cache::CacheConfig;
use crate::recovery::RetryConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConduitConfig {
    /// Namespace for stored conversations
    pub project_name: String,
    pub default_model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    pub provider: ProviderConfig,
    pub cache: CacheConfig,
    pub repository: RepositoryConfig,
    pub retry: RetryConfig,
    pub logging: LoggingConfig,
}

impl Default for ConduitConfig {
    fn default() -> Self {
        Self {
            project_name: "default".to_string(),
            default_model: DEFAULT_MODEL.to_string(),
            system_prompt: None,
            provider: ProviderConfig::default(),
            cache: CacheConfig::default(),
            repository: RepositoryConfig::default(),
            retry: RetryConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Connection settings for an OpenAI-compatible endpoint
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub name: String,
    pub base_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    /// Per-request timeout
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            name: "openai".to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            organization: None,
            timeout: Duration::from_secs(120),
        }
    }
}

impl ProviderConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// API key with all but the edges masked, for display
    pub fn masked_api_key(&self) -> Option<String> {
        self.api_key.as_deref().map(mask_api_key)
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("name", &self.name)
            .field("base_url", &self.base_url)
            .field("api_key", &self.masked_api_key())
            .field("organization", &self.organization)
            .field("timeout", &self.timeout)
            .finish()
    }
}

fn mask_api_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    let len = chars.len();
    if len <= 12 {
        return "*".repeat(len);
    }

    let prefix: String = chars[..8].iter().collect();
    let suffix: String = chars[len - 4..].iter().collect();
    format!("{}{}...{}", prefix, "*".repeat((len - 12).min(8)), suffix)
}

/// Where conversations are stored
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryConfig {
    /// Keep conversations in memory only
    pub in_memory: bool,
    /// Base directory; defaults to ~/.conduit/conversations
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

impl RepositoryConfig {
    pub fn resolved_data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".conduit")
                .join("conversations")
        })
    }
}
