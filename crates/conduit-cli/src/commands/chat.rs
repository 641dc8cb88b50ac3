//! Interactive chat command

use crate::args::ChatArgs;
use crate::console::CliConsole;
use crate::factory;
use crate::signal_handler::SignalHandler;
use colored::*;
use conduit_core::commands::{CommandOutcome, builtin_commands};
use conduit_core::config::ConduitConfig;
use conduit_core::error::{ConduitError, ConduitResult};
use conduit_core::{Conduit, Conversation, ConversationRepository, PersistenceMode};

/// Run the interactive loop until `/exit` or end of input
pub async fn execute(config: &ConduitConfig, args: ChatArgs, verbose: bool) -> ConduitResult<()> {
    let console = CliConsole::new(verbose);
    let session = &args.session;
    let options = factory::session_options(config, session, PersistenceMode::Chat, verbose)?;
    let conduit = factory::create_conduit(config, options)?;

    let mut conversation = if session.continue_last || session.resume.is_some() {
        conduit
            .open(PersistenceMode::Chat, session.resume.as_deref())
            .await?
    } else {
        conduit.fresh_conversation(None)
    };
    let commands = builtin_commands();

    print_banner(&conversation);

    loop {
        let Some(line) = console.read_line("you>")? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(result) = commands.dispatch(line, &mut conversation) {
            match result {
                Ok(CommandOutcome::Exit) => break,
                Ok(CommandOutcome::Output(text)) => println!("{}", text),
                Ok(CommandOutcome::Handled) | Ok(CommandOutcome::Help) => {}
                Err(e) => console.error(&e.to_string()),
            }
            save(&conduit, &conversation, &console).await;
            continue;
        }

        let signals = SignalHandler::start();
        match conduit
            .run_turn(&mut conversation, line, signals.token())
            .await
        {
            Ok(outcome) => {
                println!("{} {}\n", "assistant>".cyan().bold(), outcome.content());
                if !outcome.persisted && conduit.options().repository.is_some() {
                    console.warn("The conversation could not be saved");
                }
            }
            Err(ConduitError::Cancelled) => console.warn("Cancelled"),
            Err(e) => console.error(&e.to_string()),
        }
    }

    println!("{}", format!("Left conversation {}", conversation.id()).dimmed());
    Ok(())
}

fn print_banner(conversation: &Conversation) {
    println!("{}", "Conduit chat".bold().underline());
    let resumed = conversation
        .view()
        .map(|view| view.turns().len())
        .unwrap_or_default();
    if resumed > 0 {
        println!(
            "{}",
            format!(
                "Resumed {} ({} earlier turn{})",
                conversation.title().unwrap_or(conversation.id()),
                resumed,
                if resumed == 1 { "" } else { "s" }
            )
            .dimmed()
        );
    }
    println!("{}", "Type /help for commands, /exit to leave.".dimmed());
    println!();
}

/// Persist after a slash command changed the conversation
async fn save(conduit: &Conduit, conversation: &Conversation, console: &CliConsole) {
    let Some(repository) = &conduit.options().repository else {
        return;
    };
    if conversation.view().map(|v| v.first_user().is_none()).unwrap_or(true) {
        return;
    }
    let name = conduit.options().conversation_name.as_deref();
    if let Err(e) = repository.save(conversation, name).await {
        console.warn(&format!("Could not save conversation: {}", e));
    }
}
