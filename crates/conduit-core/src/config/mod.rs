//! Configuration
//!
//! Precedence: defaults < JSON file < `CONDUIT_*` environment variables.

mod env_loader;
mod file_loader;
mod logging_config;
mod model;
mod validation;

pub use env_loader::{apply_env, apply_overrides};
pub use file_loader::{load_from_file, write_to_file};
pub use logging_config::LoggingConfig;
pub use model::{
    ConduitConfig, DEFAULT_BASE_URL, DEFAULT_MODEL, ProviderConfig, RepositoryConfig,
};
pub use validation::validate_config;

use crate::error::ConduitResult;
use std::path::Path;

/// Default configuration file name, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "conduit_config.json";

/// Load, overlay and validate configuration
pub fn load_config(path: Option<&Path>) -> ConduitResult<ConduitConfig> {
    let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
    let mut config = load_from_file(path)?;
    apply_env(&mut config)?;
    validate_config(&config)?;
    Ok(config)
}
