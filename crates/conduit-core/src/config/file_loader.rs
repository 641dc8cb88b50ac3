//! File-based configuration loading

use super::model::ConduitConfig;
use crate::error::{ConduitError, ConduitResult};
use std::fs;
use std::path::Path;

/// Load configuration from a JSON file.
///
/// Returns the default config if the file doesn't exist.
pub fn load_from_file(path: &Path) -> ConduitResult<ConduitConfig> {
    if !path.exists() {
        return Ok(ConduitConfig::default());
    }

    let content = fs::read_to_string(path).map_err(|e| {
        ConduitError::config_with_context(
            format!("Failed to read config file: {}", e),
            format!("Reading configuration from '{}'", path.display()),
        )
    })?;

    serde_json::from_str(&content).map_err(|e| {
        ConduitError::config_with_context(
            format!("Failed to parse JSON config: {}", e),
            format!("Deserializing configuration from '{}'", path.display()),
        )
    })
}

/// Write a configuration file; an existing file is only replaced with `force`
pub fn write_to_file(config: &ConduitConfig, path: &Path, force: bool) -> ConduitResult<()> {
    if path.exists() && !force {
        return Err(ConduitError::config_with_context(
            "Configuration file already exists",
            path.display().to_string(),
        ));
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|e| ConduitError::io_with_path(e.to_string(), parent.display().to_string()))?;
    }

    let json = serde_json::to_string_pretty(config)
        .map_err(|e| ConduitError::json(format!("Failed to serialize config: {}", e)))?;
    fs::write(path, json)
        .map_err(|e| ConduitError::io_with_path(e.to_string(), path.display().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let config = load_from_file(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config, ConduitConfig::default());
    }

    #[test]
    fn test_load_from_json_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("conduit_config.json");
        fs::write(
            &path,
            r#"{
                "project_name": "research",
                "default_model": "gpt-4o",
                "system_prompt": "Be brief.",
                "cache": {"enable_disk_cache": false, "ttl": "1h"},
                "logging": {"level": "debug", "format": "json"}
            }"#,
        )
        .unwrap();

        let config = load_from_file(&path).unwrap();
        assert_eq!(config.project_name, "research");
        assert_eq!(config.system_prompt.as_deref(), Some("Be brief."));
        assert!(!config.cache.enable_disk_cache);
        assert_eq!(config.cache.ttl, Some(std::time::Duration::from_secs(3600)));
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn test_invalid_json_is_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            load_from_file(&path).unwrap_err(),
            ConduitError::Config { .. }
        ));
    }

    #[test]
    fn test_write_refuses_to_clobber_without_force() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("conduit_config.json");
        let config = ConduitConfig::default();

        write_to_file(&config, &path, false).unwrap();
        assert!(write_to_file(&config, &path, false).is_err());
        write_to_file(&config, &path, true).unwrap();
        assert_eq!(load_from_file(&path).unwrap(), config);
    }
}
