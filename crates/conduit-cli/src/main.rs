//! Conduit CLI application
//!
//! Ask questions, keep multi-turn conversations, and manage the stored
//! history and response cache from the terminal.
//!
//! # Installation
//!
//! ```bash
//! cargo install --path crates/conduit-cli
//! ```
//!
//! Conversations are stored per project under `~/.conduit/conversations`
//! and responses are cached under `~/.conduit/cache`; both locations can be
//! changed in `conduit_config.json` or with `CONDUIT_*` environment variables.

mod args;
mod commands;
mod console;
mod factory;
mod logging;
mod progress;
mod router;
mod signal_handler;

use anyhow::Context;
use args::Cli;
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = conduit_core::load_config(Some(&cli.config_file))
        .with_context(|| format!("loading configuration from {}", cli.config_file.display()))?;
    if let Some(project) = &cli.project {
        config.project_name = project.clone();
        conduit_core::config::validate_config(&config)?;
    }

    logging::init(&config.logging, cli.verbose)?;
    tracing::debug!("Using project {}", config.project_name);

    router::route(cli, config).await?;
    Ok(())
}
