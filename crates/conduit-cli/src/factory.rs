//! Shared factory for building a configured Conduit

use crate::args::SessionArgs;
use crate::progress::SpinnerDisplay;
use conduit_core::config::ConduitConfig;
use conduit_core::error::ConduitResult;
use conduit_core::{Conduit, ConduitOptions, OpenAiCompatibleProvider, PersistenceMode};
use std::sync::Arc;

/// Apply command-line session settings on top of configured options
pub fn session_options(
    config: &ConduitConfig,
    session: &SessionArgs,
    mode: PersistenceMode,
    verbose: bool,
) -> ConduitResult<ConduitOptions> {
    let mut options = ConduitOptions::from_config(config)?
        .with_display(Arc::new(SpinnerDisplay::new(verbose)))
        .with_persistence_mode(mode)
        .with_conversation_name(session.name.clone());

    if let Some(model) = &session.model {
        options.params.model = model.clone();
    }
    if let Some(temperature) = session.temperature {
        options.params.temperature = Some(temperature);
    }
    options.params.validate()?;
    if let Some(system) = &session.system {
        options = options.with_system_prompt(system.clone());
    }
    if session.no_cache {
        options = options.with_use_cache(false);
    }
    Ok(options)
}

/// Create a Conduit talking to the configured provider
pub fn create_conduit(config: &ConduitConfig, options: ConduitOptions) -> ConduitResult<Conduit> {
    let provider = OpenAiCompatibleProvider::new(config.provider.clone())?;
    Ok(Conduit::new(Arc::new(provider), options))
}
