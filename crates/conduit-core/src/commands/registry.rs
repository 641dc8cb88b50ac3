//! Slash command registry

use crate::error::{ConduitError, ConduitResult};
use std::collections::BTreeMap;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// What a command asks the caller to do next
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Print this text and keep going
    Output(String),
    /// Nothing to print
    Handled,
    /// Leave the interactive loop
    Exit,
    /// Show the registry's help listing
    Help,
}

type Handler<C> = Arc<dyn Fn(&mut C, &str) -> ConduitResult<CommandOutcome> + Send + Sync>;

/// Metadata shown in help output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub name: String,
    pub aliases: Vec<String>,
    pub description: String,
}

impl CommandSpec {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            description: description.into(),
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }
}

/// Maps `/name` commands onto handlers operating on a context `C`
pub struct CommandRegistry<C> {
    commands: BTreeMap<String, (CommandSpec, Handler<C>)>,
    aliases: HashMap<String, String>,
}

impl<C> CommandRegistry<C> {
    pub fn new() -> Self {
        Self {
            commands: BTreeMap::new(),
            aliases: HashMap::new(),
        }
    }

    /// Register a command; a later registration under the same name replaces it
    pub fn register<F>(&mut self, spec: CommandSpec, handler: F)
    where
        F: Fn(&mut C, &str) -> ConduitResult<CommandOutcome> + Send + Sync + 'static,
    {
        for alias in &spec.aliases {
            self.aliases.insert(alias.clone(), spec.name.clone());
        }
        self.commands
            .insert(spec.name.clone(), (spec, Arc::new(handler)));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.resolve(name).is_some()
    }

    pub fn specs(&self) -> impl Iterator<Item = &CommandSpec> {
        self.commands.values().map(|(spec, _)| spec)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    fn resolve(&self, name: &str) -> Option<&(CommandSpec, Handler<C>)> {
        self.commands.get(name).or_else(|| {
            self.aliases
                .get(name)
                .and_then(|canonical| self.commands.get(canonical))
        })
    }

    /// Help listing, one command per line
    pub fn help_text(&self) -> String {
        self.specs()
            .map(|spec| {
                let mut names = format!("/{}", spec.name);
                for alias in &spec.aliases {
                    names.push_str(&format!(", /{}", alias));
                }
                format!("  {:<22} {}", names, spec.description)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Run a `/name args` line.
    ///
    /// Returns `None` when the line is not a command and should be treated as
    /// ordinary input.
    pub fn dispatch(&self, line: &str, context: &mut C) -> Option<ConduitResult<CommandOutcome>> {
        let rest = line.trim().strip_prefix('/')?;
        let (name, args) = match rest.split_once(char::is_whitespace) {
            Some((name, args)) => (name, args.trim()),
            None => (rest, ""),
        };
        let name = name.to_ascii_lowercase();

        let Some((_, handler)) = self.resolve(&name) else {
            return Some(Err(ConduitError::invalid_field(
                "command",
                format!("Unknown command /{}; type /help for a list", name),
            )));
        };

        Some(handler(context, args).map(|outcome| match outcome {
            CommandOutcome::Help => CommandOutcome::Output(self.help_text()),
            other => other,
        }))
    }
}

impl<C> Default for CommandRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> fmt::Debug for CommandRegistry<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("commands", &self.commands.keys().collect::<Vec<_>>())
            .finish()
    }
}
