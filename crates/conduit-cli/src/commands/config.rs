//! Configuration management commands

use crate::console::CliConsole;
use colored::*;
use conduit_core::config::{ConduitConfig, write_to_file};
use conduit_core::error::ConduitResult;
use std::path::Path;

/// Show the effective configuration (file, then environment)
pub fn show(config_file: &Path, config: &ConduitConfig) -> ConduitResult<()> {
    let console = CliConsole::new(true);
    console.print_header("Configuration");

    if config_file.exists() {
        console.success(&format!("Loaded configuration from: {}", config_file.display()));
    } else {
        console.warn(&format!(
            "Configuration file not found: {}",
            config_file.display()
        ));
        console.info("Using defaults and environment variables");
    }

    println!("  Project:        {}", config.project_name.green());
    println!("  Default model:  {}", config.default_model.yellow());
    if let Some(prompt) = &config.system_prompt {
        println!("  System prompt:  {}", crate::console::preview(prompt, 60));
    }

    console.print_header("Provider");
    println!("  Name:      {}", config.provider.name);
    println!("  Base URL:  {}", config.provider.base_url.cyan());
    println!(
        "  API key:   {}",
        config
            .provider
            .masked_api_key()
            .unwrap_or_else(|| "(not set)".red().to_string())
    );
    println!(
        "  Timeout:   {}s",
        config.provider.timeout.as_secs()
    );

    console.print_header("Storage");
    println!(
        "  Cache:         {}",
        if config.cache.enabled {
            "enabled".green()
        } else {
            "disabled".red()
        }
    );
    println!(
        "  Cache dir:     {}",
        config.cache.resolved_disk_dir().display()
    );
    if config.repository.in_memory {
        println!("  Conversations: {}", "in memory (not persisted)".yellow());
    } else {
        println!(
            "  Conversations: {}",
            config.repository.resolved_data_dir().display()
        );
    }
    println!("  Max retries:   {}", config.retry.max_attempts);
    println!("  Log level:     {}", config.logging.level);
    Ok(())
}

/// Write a default configuration file
pub fn init(config_file: &Path, force: bool) -> ConduitResult<()> {
    let console = CliConsole::new(true);
    console.print_header("Configuration Initialization");

    if let Err(e) = write_to_file(&ConduitConfig::default(), config_file, force) {
        if config_file.exists() && !force {
            console.info("Use --force to overwrite");
        }
        return Err(e);
    }

    console.success(&format!(
        "Created configuration file: {}",
        config_file.display()
    ));
    println!(
        "{}",
        "Set CONDUIT_API_KEY (or OPENAI_API_KEY) or add provider.api_key to the file.".dimmed()
    );
    Ok(())
}
