//! Environment variable overlay
//!
//! Variables use the `CONDUIT_` prefix. The provider API key also falls back
//! to `OPENAI_API_KEY`.

use super::model::ConduitConfig;
use crate::error::{ConduitError, ConduitResult};
use std::env;
use std::path::PathBuf;

/// Apply overrides from the process environment
pub fn apply_env(config: &mut ConduitConfig) -> ConduitResult<()> {
    apply_overrides(config, |key| env::var(key).ok())
}

/// Apply overrides from any variable source
pub fn apply_overrides<F>(config: &mut ConduitConfig, lookup: F) -> ConduitResult<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(project) = lookup("CONDUIT_PROJECT") {
        config.project_name = project;
    }
    if let Some(model) = lookup("CONDUIT_MODEL") {
        config.default_model = model;
    }
    if let Some(prompt) = lookup("CONDUIT_SYSTEM_PROMPT") {
        config.system_prompt = Some(prompt);
    }
    if let Some(base_url) = lookup("CONDUIT_BASE_URL") {
        config.provider.base_url = base_url;
    }
    if let Some(api_key) = lookup("CONDUIT_API_KEY").or_else(|| {
        config
            .provider
            .api_key
            .is_none()
            .then(|| lookup("OPENAI_API_KEY"))
            .flatten()
    }) {
        config.provider.api_key = Some(api_key);
    }
    if let Some(dir) = lookup("CONDUIT_CACHE_DIR") {
        config.cache.disk_cache_dir = Some(PathBuf::from(dir));
    }
    if let Some(dir) = lookup("CONDUIT_DATA_DIR") {
        config.repository.data_dir = Some(PathBuf::from(dir));
    }
    if let Some(level) = lookup("CONDUIT_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(value) = lookup("CONDUIT_NO_CACHE") {
        let disabled = parse_bool(&value)
            .ok_or_else(|| ConduitError::config("Invalid CONDUIT_NO_CACHE value"))?;
        config.cache.enabled = !disabled;
    }
    if let Some(value) = lookup("CONDUIT_MAX_RETRIES") {
        config.retry.max_attempts = value
            .parse()
            .map_err(|_| ConduitError::config("Invalid CONDUIT_MAX_RETRIES value"))?;
    }
    Ok(())
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn overlay(vars: &[(&str, &str)]) -> ConduitResult<ConduitConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let mut config = ConduitConfig::default();
        apply_overrides(&mut config, |k| vars.get(k).cloned())?;
        Ok(config)
    }

    #[test]
    fn test_overrides_apply() {
        let config = overlay(&[
            ("CONDUIT_PROJECT", "work"),
            ("CONDUIT_MODEL", "gpt-4o"),
            ("CONDUIT_BASE_URL", "http://localhost:11434/v1"),
            ("CONDUIT_DATA_DIR", "/tmp/conduit"),
            ("CONDUIT_NO_CACHE", "yes"),
        ])
        .unwrap();

        assert_eq!(config.project_name, "work");
        assert_eq!(config.default_model, "gpt-4o");
        assert_eq!(config.provider.base_url, "http://localhost:11434/v1");
        assert_eq!(config.repository.data_dir, Some(PathBuf::from("/tmp/conduit")));
        assert!(!config.cache.enabled);
    }

    #[test]
    fn test_api_key_precedence() {
        let config = overlay(&[("OPENAI_API_KEY", "fallback")]).unwrap();
        assert_eq!(config.provider.api_key.as_deref(), Some("fallback"));

        let config = overlay(&[("OPENAI_API_KEY", "fallback"), ("CONDUIT_API_KEY", "primary")])
            .unwrap();
        assert_eq!(config.provider.api_key.as_deref(), Some("primary"));
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(overlay(&[("CONDUIT_NO_CACHE", "maybe")]).is_err());
        assert!(overlay(&[("CONDUIT_MAX_RETRIES", "lots")]).is_err());
    }
}
