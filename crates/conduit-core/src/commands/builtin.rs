//! Built-in chat commands operating on a [`Conversation`]

use super::registry::{CommandOutcome, CommandRegistry, CommandSpec};
use crate::conversation::Conversation;
use crate::error::{ConduitError, ConduitResult};
use crate::message::Message;

const PREVIEW_CHARS: usize = 60;

/// Registry with `help`, `exit`, `clear`, `history`, `title`, `branches`,
/// `checkout` and `prune`
pub fn builtin_commands() -> CommandRegistry<Conversation> {
    let mut registry = CommandRegistry::new();

    registry.register(CommandSpec::new("help", "Show available commands"), |_, _| {
        Ok(CommandOutcome::Help)
    });
    registry.register(
        CommandSpec::new("exit", "Leave the chat")
            .with_alias("quit")
            .with_alias("q"),
        |_, _| Ok(CommandOutcome::Exit),
    );
    registry.register(
        CommandSpec::new("clear", "Start a new conversation with the same system prompt"),
        clear,
    );
    registry.register(
        CommandSpec::new("history", "Show the active conversation").with_alias("h"),
        history,
    );
    registry.register(
        CommandSpec::new("title", "Show the title, or set it with /title <text>"),
        title,
    );
    registry.register(
        CommandSpec::new("branches", "List every branch tip"),
        branches,
    );
    registry.register(
        CommandSpec::new("checkout", "Continue from a message: /checkout <id prefix>"),
        checkout,
    );
    registry.register(
        CommandSpec::new("prune", "Drop messages not on the active branch"),
        prune,
    );

    registry
}

fn clear(conversation: &mut Conversation, _args: &str) -> ConduitResult<CommandOutcome> {
    let system = conversation
        .view()?
        .system()
        .map(Message::text);
    *conversation = match system {
        Some(prompt) => Conversation::with_system(prompt),
        None => Conversation::new(),
    };
    Ok(CommandOutcome::Output(format!(
        "Started conversation {}",
        conversation.id()
    )))
}

fn history(conversation: &mut Conversation, _args: &str) -> ConduitResult<CommandOutcome> {
    let view = conversation.view()?;
    if view.is_empty() {
        return Ok(CommandOutcome::Output("(empty conversation)".to_string()));
    }
    let lines: Vec<String> = view
        .messages()
        .iter()
        .map(|m| format!("[{}] {}", m.role(), m.text()))
        .collect();
    Ok(CommandOutcome::Output(lines.join("\n")))
}

fn title(conversation: &mut Conversation, args: &str) -> ConduitResult<CommandOutcome> {
    if !args.is_empty() {
        conversation.set_title(args);
        return Ok(CommandOutcome::Output(format!("Title set to \"{}\"", args)));
    }
    let shown = conversation
        .title()
        .map(str::to_string)
        .or_else(|| conversation.auto_title())
        .unwrap_or_else(|| "(untitled)".to_string());
    Ok(CommandOutcome::Output(shown))
}

fn branches(conversation: &mut Conversation, _args: &str) -> ConduitResult<CommandOutcome> {
    let session = conversation.session();
    let current = session.leaf();
    let mut leaves = session.leaves();
    if leaves.is_empty() {
        return Ok(CommandOutcome::Output("(no messages)".to_string()));
    }
    leaves.sort_by_key(|m| m.created_at());

    let lines: Vec<String> = leaves
        .iter()
        .map(|leaf| {
            let marker = if Some(leaf.id()) == current { "*" } else { " " };
            format!(
                "{} {} [{}] {}",
                marker,
                short_id(leaf.id()),
                leaf.role(),
                preview(&leaf.text())
            )
        })
        .collect();
    Ok(CommandOutcome::Output(lines.join("\n")))
}

fn checkout(conversation: &mut Conversation, args: &str) -> ConduitResult<CommandOutcome> {
    if args.is_empty() {
        return Err(ConduitError::invalid_input("usage: /checkout <message id prefix>"));
    }
    let matches: Vec<String> = conversation
        .session()
        .messages()
        .filter(|m| m.id().starts_with(args))
        .map(|m| m.id().to_string())
        .collect();

    match matches.as_slice() {
        [id] => {
            conversation.session_mut().checkout(id)?;
            Ok(CommandOutcome::Output(format!("Now at {}", short_id(id))))
        }
        [] => Err(ConduitError::invalid_field(
            "message_id",
            format!("No message starts with '{}'", args),
        )),
        _ => Err(ConduitError::invalid_field(
            "message_id",
            format!("'{}' matches {} messages", args, matches.len()),
        )),
    }
}

fn prune(conversation: &mut Conversation, _args: &str) -> ConduitResult<CommandOutcome> {
    let removed = conversation.session_mut().prune()?;
    Ok(CommandOutcome::Output(format!("Removed {} messages", removed)))
}

fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

fn preview(text: &str) -> String {
    let single_line = text.replace('\n', " ");
    if single_line.chars().count() > PREVIEW_CHARS {
        let cut: String = single_line.chars().take(PREVIEW_CHARS).collect();
        format!("{}...", cut)
    } else {
        single_line
    }
}
