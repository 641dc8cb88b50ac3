//! CLI argument definitions using clap
//!
//! - conduit query "question"        # One-shot question, fresh conversation
//! - conduit query -c "follow up"    # Continue the most recent conversation
//! - conduit query -r <id> "..."     # Continue a specific conversation
//! - conduit chat                    # Interactive loop with slash commands
//! - conduit history/cache/config    # Utility commands

use clap::{Args, Parser, Subcommand};
use conduit_core::PersistenceMode;
use conduit_core::config::DEFAULT_CONFIG_FILE;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "conduit")]
#[command(about = "Conduit - cached, resumable LLM conversations from the terminal")]
#[command(
    long_about = r#"Conduit - cached, resumable LLM conversations from the terminal

USAGE:
  conduit query "your question"        # Ask once in a new conversation
  conduit query -c "follow-up"         # Continue the most recent conversation
  conduit query -r <id> "follow-up"    # Continue a specific conversation
  conduit chat                         # Start an interactive chat

UTILITY COMMANDS:
  conduit history list                 # List stored conversations
  conduit cache stats                  # Show response cache statistics
  conduit config init                  # Create config file

For detailed help: conduit <command> --help"#
)]
#[command(version)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    pub config_file: PathBuf,

    /// Project namespace for stored conversations
    #[arg(long, global = true)]
    pub project: Option<String>,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Ask a single question and print the answer
    Query(QueryArgs),

    /// Chat interactively; type /help for commands
    Chat(ChatArgs),

    /// Inspect and manage stored conversations
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },

    /// Inspect and manage the response cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Manage configuration files
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Settings shared by every command that talks to a model
#[derive(Args, Clone, Debug, Default)]
pub struct SessionArgs {
    /// Model to use instead of the configured default
    #[arg(long, short)]
    pub model: Option<String>,

    /// Sampling temperature (0.0 - 2.0)
    #[arg(long, short)]
    pub temperature: Option<f64>,

    /// System prompt for new conversations
    #[arg(long, short)]
    pub system: Option<String>,

    /// Bypass the response cache
    #[arg(long)]
    pub no_cache: bool,

    /// Name to store the conversation under
    #[arg(long)]
    pub name: Option<String>,

    /// Resume a specific conversation by ID
    #[arg(short = 'r', long = "resume", conflicts_with = "continue_last")]
    pub resume: Option<String>,

    /// Resume the most recent conversation
    #[arg(short = 'c', long = "continue", conflicts_with = "resume")]
    pub continue_last: bool,
}

#[derive(Args, Clone, Debug)]
pub struct QueryArgs {
    /// Question to ask; read from stdin when omitted
    pub text: Option<String>,

    #[command(flatten)]
    pub session: SessionArgs,

    /// How to combine loading and saving (overwrite, resume, chat)
    #[arg(long)]
    pub mode: Option<PersistenceMode>,

    /// Send only the system prompt and this question, not the history
    #[arg(long)]
    pub no_history: bool,
}

#[derive(Args, Clone, Debug)]
pub struct ChatArgs {
    #[command(flatten)]
    pub session: SessionArgs,
}

#[derive(Subcommand, Clone, Debug)]
pub enum HistoryAction {
    /// List stored conversations, newest first
    List {
        /// Maximum number of conversations to show
        #[arg(long, short, default_value_t = 20)]
        limit: usize,
    },

    /// Show the active branch of a conversation
    Show {
        /// Conversation ID or name
        id: String,
    },

    /// Remove a stored conversation
    Remove {
        /// Conversation ID
        id: String,

        /// Skip the confirmation prompt
        #[arg(long, short)]
        force: bool,
    },

    /// Remove every conversation in the project
    Clear {
        /// Skip the confirmation prompt
        #[arg(long, short)]
        force: bool,
    },
}

#[derive(Subcommand, Clone, Debug)]
pub enum CacheAction {
    /// Show entry counts, size and hit rate
    Stats,

    /// Remove every entry in the configured cache namespace
    Wipe,
}

#[derive(Subcommand, Clone, Debug)]
pub enum ConfigAction {
    /// Display the effective configuration
    Show,

    /// Create a new configuration file with defaults
    Init {
        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },
}
