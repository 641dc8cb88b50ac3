//! One-shot query command

use crate::args::QueryArgs;
use crate::console::CliConsole;
use crate::factory;
use crate::signal_handler::SignalHandler;
use conduit_core::config::ConduitConfig;
use conduit_core::error::{ConduitError, ConduitResult};
use conduit_core::PersistenceMode;
use std::io::Read;

/// Ask one question and print the answer.
///
/// Without `-c`/`-r` the question starts a new conversation; otherwise it is
/// appended to the resumed one.
pub async fn execute(config: &ConduitConfig, args: QueryArgs, verbose: bool) -> ConduitResult<()> {
    let console = CliConsole::new(verbose);
    let text = match args.text {
        Some(text) => text,
        None => read_stdin()?,
    };
    if text.trim().is_empty() {
        return Err(ConduitError::invalid_input("nothing to ask"));
    }

    let session = &args.session;
    let resuming = session.continue_last || session.resume.is_some();
    let mode = args.mode.unwrap_or(if resuming {
        PersistenceMode::Resume
    } else {
        PersistenceMode::Overwrite
    });

    let options = factory::session_options(config, session, mode, verbose)?
        .with_include_history(!args.no_history);
    let conduit = factory::create_conduit(config, options)?;

    let mut conversation = if resuming || mode != PersistenceMode::Overwrite {
        conduit.open(mode, session.resume.as_deref()).await?
    } else {
        conduit.fresh_conversation(None)
    };

    let signals = SignalHandler::start();
    let outcome = conduit
        .run_turn(&mut conversation, text.trim(), signals.token())
        .await?;

    println!("{}", outcome.content());
    console.info(&format!(
        "conversation {}{}",
        outcome.conversation_id,
        if outcome.from_cache { " (cached)" } else { "" }
    ));
    if !outcome.persisted && conduit.options().repository.is_some() {
        console.warn("The conversation could not be saved");
    }
    Ok(())
}

fn read_stdin() -> ConduitResult<String> {
    let mut buffer = String::new();
    std::io::stdin().read_to_string(&mut buffer)?;
    Ok(buffer)
}
