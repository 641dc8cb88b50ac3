//! Command routing logic for CLI

use crate::args::{CacheAction, Cli, Commands, ConfigAction, HistoryAction};
use crate::commands;
use conduit_core::config::ConduitConfig;
use conduit_core::error::ConduitResult;

/// Route CLI commands to their respective handlers
pub async fn route(cli: Cli, config: ConduitConfig) -> ConduitResult<()> {
    let verbose = cli.verbose;
    match cli.command {
        Commands::Query(args) => commands::query::execute(&config, args, verbose).await,
        Commands::Chat(args) => commands::chat::execute(&config, args, verbose).await,
        Commands::History { action } => route_history(&config, action).await,
        Commands::Cache { action } => route_cache(&config, action).await,
        Commands::Config { action } => route_config(&cli.config_file, &config, action),
    }
}

async fn route_history(config: &ConduitConfig, action: HistoryAction) -> ConduitResult<()> {
    match action {
        HistoryAction::List { limit } => commands::history::list(config, limit).await,
        HistoryAction::Show { id } => commands::history::show(config, &id).await,
        HistoryAction::Remove { id, force } => commands::history::remove(config, &id, force).await,
        HistoryAction::Clear { force } => commands::history::clear(config, force).await,
    }
}

async fn route_cache(config: &ConduitConfig, action: CacheAction) -> ConduitResult<()> {
    match action {
        CacheAction::Stats => commands::cache::stats(config).await,
        CacheAction::Wipe => commands::cache::wipe(config).await,
    }
}

fn route_config(
    config_file: &std::path::Path,
    config: &ConduitConfig,
    action: ConfigAction,
) -> ConduitResult<()> {
    match action {
        ConfigAction::Show => commands::config::show(config_file, config),
        ConfigAction::Init { force } => commands::config::init(config_file, force),
    }
}
