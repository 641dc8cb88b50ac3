//! Configuration validation

use super::model::ConduitConfig;
use crate::error::{ConduitError, ConduitResult};
use crate::request::GenerationParams;

/// Check a configuration for values that would fail at use time
pub fn validate_config(config: &ConduitConfig) -> ConduitResult<()> {
    if config.project_name.trim().is_empty() {
        return Err(ConduitError::config("project_name must not be empty"));
    }
    if !config
        .project_name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ConduitError::config_with_context(
            "project_name may only contain letters, digits, '-' and '_'",
            config.project_name.clone(),
        ));
    }
    if config.default_model.trim().is_empty() {
        return Err(ConduitError::config("default_model must not be empty"));
    }
    if config.provider.base_url.trim().is_empty() {
        return Err(ConduitError::config("provider.base_url must not be empty"));
    }
    if config.cache.memory_capacity == 0 {
        return Err(ConduitError::config("cache.memory_capacity must be at least 1"));
    }
    if !matches!(config.logging.format.as_str(), "pretty" | "compact" | "json") {
        return Err(ConduitError::config_with_context(
            "logging.format must be pretty, compact or json",
            config.logging.format.clone(),
        ));
    }
    GenerationParams::new(config.default_model.clone())
        .validate()
        .map_err(|e| ConduitError::config(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        validate_config(&ConduitConfig::default()).unwrap();
    }

    #[test]
    fn test_rejects_bad_values() {
        let cases: Vec<Box<dyn Fn(&mut ConduitConfig)>> = vec![
            Box::new(|c| c.project_name = String::new()),
            Box::new(|c| c.project_name = "has space".into()),
            Box::new(|c| c.default_model = " ".into()),
            Box::new(|c| c.cache.memory_capacity = 0),
            Box::new(|c| c.logging.format = "xml".into()),
        ];
        for mutate in cases {
            let mut config = ConduitConfig::default();
            mutate(&mut config);
            assert!(matches!(
                validate_config(&config).unwrap_err(),
                ConduitError::Config { .. }
            ));
        }
    }
}
