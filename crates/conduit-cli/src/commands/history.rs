//! Conversation history commands
//!
//! Commands for listing, showing, and removing stored conversations.

use crate::console::{CliConsole, format_relative_time, preview, role_label};
use colored::Colorize;
use conduit_core::config::ConduitConfig;
use conduit_core::error::ConduitResult;
use conduit_core::repository::{ConversationRepository, open_repository};
use conduit_core::{Conversation, Role};

/// List stored conversations, newest first
pub async fn list(config: &ConduitConfig, limit: usize) -> ConduitResult<()> {
    let repository = open_repository(config)?;
    let summaries = repository.list(Some(limit)).await?;

    if summaries.is_empty() {
        println!("{}", "No conversations found.".yellow());
        println!(
            "{}",
            format!("Project '{}' has no stored conversations yet.", repository.project())
                .dimmed()
        );
        return Ok(());
    }

    println!("\n{}", "Conversations".bold().underline());
    println!(
        "{}",
        format!("Showing {} conversation(s)", summaries.len()).dimmed()
    );
    println!();

    for summary in &summaries {
        let display_name = summary
            .title
            .as_deref()
            .or(summary.name.as_deref())
            .unwrap_or("(untitled)");
        let name_str = summary
            .name
            .as_ref()
            .map(|n| format!(" [{}]", n.green()))
            .unwrap_or_default();

        println!(
            "  {} {}{}",
            short_id(&summary.conversation_id).bright_cyan(),
            preview(display_name, 50).bright_white(),
            name_str
        );
        println!(
            "    {} {} {}",
            format!("{} msgs", summary.message_count).dimmed(),
            "|".dimmed(),
            format_relative_time(summary.updated_at).dimmed()
        );
    }

    println!();
    println!(
        "{}",
        "Use 'conduit query -r <id> \"...\"' or 'conduit chat -r <id>' to continue.".dimmed()
    );
    Ok(())
}

/// Print the active branch of a conversation
pub async fn show(config: &ConduitConfig, id: &str) -> ConduitResult<()> {
    let repository = open_repository(config)?;
    let found = match repository.load(id, None).await? {
        Some(conversation) => Some(conversation),
        None => repository.load_by_name(id).await?,
    };
    let Some(conversation) = found else {
        println!("{}", format!("Conversation '{}' not found.", id).red());
        return Ok(());
    };

    print_details(&conversation);
    let view = conversation.view()?;
    for message in view.messages() {
        if message.role() == Role::System {
            println!("{} {}", role_label(Role::System), preview(&message.text(), 80).dimmed());
        } else {
            println!("{} {}", role_label(message.role()), message.text());
        }
        println!();
    }
    Ok(())
}

/// Remove one conversation, confirming unless forced
pub async fn remove(config: &ConduitConfig, id: &str, force: bool) -> ConduitResult<()> {
    let console = CliConsole::new(true);
    let repository = open_repository(config)?;

    let Some(conversation) = repository.load(id, None).await? else {
        println!("{}", format!("Conversation '{}' not found.", id).red());
        return Ok(());
    };

    if !force {
        print_details(&conversation);
        if !console.confirm(&format!("Remove conversation '{}'?", id)) {
            println!("{}", "Removal cancelled.".dimmed());
            return Ok(());
        }
    }

    repository.remove(id).await?;
    console.success(&format!("Conversation '{}' removed.", id));
    Ok(())
}

/// Remove every conversation in the project, confirming unless forced
pub async fn clear(config: &ConduitConfig, force: bool) -> ConduitResult<()> {
    let console = CliConsole::new(true);
    let repository = open_repository(config)?;

    if !force
        && !console.confirm(&format!(
            "Remove ALL conversations in project '{}'?",
            repository.project()
        ))
    {
        println!("{}", "Nothing removed.".dimmed());
        return Ok(());
    }

    let removed = repository.wipe().await?;
    console.success(&format!("Removed {} conversation(s).", removed));
    Ok(())
}

fn print_details(conversation: &Conversation) {
    println!();
    println!(
        "{} {}",
        "Conversation".bold(),
        conversation.id().bright_cyan()
    );
    if let Some(title) = conversation.title() {
        println!("  {} {}", "Title:".dimmed(), title);
    }
    let branches = conversation.session().leaves().len();
    println!(
        "  {} {} messages, {} branch{}",
        "Size:".dimmed(),
        conversation.len(),
        branches,
        if branches == 1 { "" } else { "es" }
    );
    println!(
        "  {} {}",
        "Started:".dimmed(),
        format_relative_time(conversation.session().created_at())
    );
    println!();
}

fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}
