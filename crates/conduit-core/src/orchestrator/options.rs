//! Orchestrator context object

use crate::cache::{ConduitCache, ResponseCache};
use crate::config::ConduitConfig;
use crate::error::ConduitResult;
use crate::events::{DisplayHandler, TracingDisplay};
use crate::recovery::RetryConfig;
use crate::repository::{ConversationRepository, PersistenceMode, open_repository};
use crate::request::GenerationParams;
use crate::tools::ToolRegistry;
use std::sync::Arc;

pub const DEFAULT_MAX_TOOL_ROUNDS: usize = 5;

/// Everything a [`Conduit`](super::Conduit) needs besides the provider
#[derive(Clone)]
pub struct ConduitOptions {
    pub project_name: String,
    pub params: GenerationParams,
    /// Root message for new conversations
    pub system_prompt: Option<String>,
    pub cache: Option<Arc<dyn ResponseCache>>,
    pub repository: Option<Arc<dyn ConversationRepository>>,
    pub display: Arc<dyn DisplayHandler>,
    pub tools: Option<Arc<ToolRegistry>>,
    pub use_cache: bool,
    /// Send prior messages with each request, or only the system prompt
    pub include_history: bool,
    pub persistence_mode: PersistenceMode,
    /// Handle used when saving and as a load fallback
    pub conversation_name: Option<String>,
    pub retry: RetryConfig,
    pub max_tool_rounds: usize,
}

impl ConduitOptions {
    pub fn new(project_name: impl Into<String>, params: GenerationParams) -> Self {
        Self {
            project_name: project_name.into(),
            params,
            system_prompt: None,
            cache: None,
            repository: None,
            display: Arc::new(TracingDisplay),
            tools: None,
            use_cache: true,
            include_history: true,
            persistence_mode: PersistenceMode::default(),
            conversation_name: None,
            retry: RetryConfig::default(),
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
        }
    }

    /// Build cache and repository from configuration
    pub fn from_config(config: &ConduitConfig) -> ConduitResult<Self> {
        let cache: Option<Arc<dyn ResponseCache>> = if config.cache.enabled {
            Some(Arc::new(ConduitCache::from_config(&config.cache)?))
        } else {
            None
        };
        let repository = open_repository(config)?;

        Ok(Self {
            system_prompt: config.system_prompt.clone(),
            use_cache: config.cache.enabled,
            retry: config.retry.clone(),
            ..Self::new(
                config.project_name.clone(),
                GenerationParams::new(config.default_model.clone()),
            )
        }
        .with_cache(cache)
        .with_repository(Some(repository)))
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_cache(mut self, cache: Option<Arc<dyn ResponseCache>>) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_repository(mut self, repository: Option<Arc<dyn ConversationRepository>>) -> Self {
        self.repository = repository;
        self
    }

    pub fn with_display(mut self, display: Arc<dyn DisplayHandler>) -> Self {
        self.display = display;
        self
    }

    pub fn with_tools(mut self, tools: Arc<ToolRegistry>) -> Self {
        self.tools = Some(tools);
        self
    }

    pub fn with_use_cache(mut self, use_cache: bool) -> Self {
        self.use_cache = use_cache;
        self
    }

    pub fn with_include_history(mut self, include_history: bool) -> Self {
        self.include_history = include_history;
        self
    }

    pub fn with_persistence_mode(mut self, mode: PersistenceMode) -> Self {
        self.persistence_mode = mode;
        self
    }

    pub fn with_conversation_name(mut self, name: Option<String>) -> Self {
        self.conversation_name = name;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_max_tool_rounds(mut self, rounds: usize) -> Self {
        self.max_tool_rounds = rounds;
        self
    }
}

impl std::fmt::Debug for ConduitOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConduitOptions")
            .field("project_name", &self.project_name)
            .field("params", &self.params)
            .field("cache", &self.cache.as_ref().map(|c| c.name().to_string()))
            .field("repository", &self.repository.is_some())
            .field("tools", &self.tools)
            .field("use_cache", &self.use_cache)
            .field("include_history", &self.include_history)
            .field("persistence_mode", &self.persistence_mode)
            .field("max_tool_rounds", &self.max_tool_rounds)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheConfig;
    use crate::config::RepositoryConfig;

    #[test]
    fn test_from_config() {
        let config = ConduitConfig {
            project_name: "notes".into(),
            default_model: "gpt-4o".into(),
            system_prompt: Some("Be brief.".into()),
            cache: CacheConfig {
                enabled: false,
                ..Default::default()
            },
            repository: RepositoryConfig {
                in_memory: true,
                data_dir: None,
            },
            ..Default::default()
        };
        let options = ConduitOptions::from_config(&config).unwrap();

        assert_eq!(options.project_name, "notes");
        assert_eq!(options.params.model, "gpt-4o");
        assert_eq!(options.system_prompt.as_deref(), Some("Be brief."));
        assert!(options.cache.is_none());
        assert!(!options.use_cache);
        assert_eq!(options.repository.unwrap().project(), "notes");
        assert!(options.include_history);
        assert_eq!(options.max_tool_rounds, DEFAULT_MAX_TOOL_ROUNDS);
    }
}
