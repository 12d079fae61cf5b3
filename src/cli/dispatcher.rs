// src/cli/dispatcher.rs

use anyhow::Result;
use thiserror::Error;

use crate::{cli::handlers, state::AppContext};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum DispatchError {
    #[error("Unknown command '{0}'. Run `snipforge --help` to list the commands.")]
    UnknownCommand(String),
}

// --- Command Definition and Registry ---

/// A command, its aliases, and the handler receiving the arguments after the command name.
struct CommandDefinition {
    name: &'static str,
    aliases: &'static [&'static str],
    handler: fn(Vec<String>, &AppContext) -> Result<()>,
}

/// The single source of truth for all commands.
static COMMAND_REGISTRY: &[CommandDefinition] = &[
    CommandDefinition {
        name: "browse",
        aliases: &[],
        handler: handlers::browse::handle,
    },
    CommandDefinition {
        name: "print",
        aliases: &[],
        handler: handlers::print::handle,
    },
    CommandDefinition {
        name: "copy",
        aliases: &["cp"],
        handler: handlers::copy::handle,
    },
    CommandDefinition {
        name: "exec",
        aliases: &[],
        handler: handlers::exec::handle,
    },
    CommandDefinition {
        name: "export",
        aliases: &[],
        handler: handlers::export::handle,
    },
    CommandDefinition {
        name: "sync",
        aliases: &[],
        handler: handlers::sync::handle,
    },
    CommandDefinition {
        name: "manager",
        aliases: &[],
        handler: handlers::manager::handle,
    },
    CommandDefinition {
        name: "assistant",
        aliases: &[],
        handler: handlers::assistant::handle,
    },
    CommandDefinition {
        name: "ai",
        aliases: &[],
        handler: handlers::assistant::handle_start,
    },
    CommandDefinition {
        name: "config",
        aliases: &[],
        handler: handlers::config::handle,
    },
    CommandDefinition {
        name: "info",
        aliases: &[],
        handler: handlers::info::handle,
    },
];

/// Finds a command definition in the registry by its name or alias.
fn find_command(name: &str) -> Option<&'static CommandDefinition> {
    COMMAND_REGISTRY
        .iter()
        .find(|cmd| cmd.name == name || cmd.aliases.contains(&name))
}

/// Splits `args` into the command and its arguments, then runs the command.
/// Without arguments the picker opens in `exec` mode.
pub fn dispatch(args: Vec<String>, context: &AppContext) -> Result<()> {
    log::debug!("Dispatching args: {:?}", args);

    let mut args = args.into_iter();
    let Some(name) = args.next() else {
        return handlers::exec::handle(Vec::new(), context);
    };
    let command = find_command(&name).ok_or_else(|| DispatchError::UnknownCommand(name.clone()))?;
    log::trace!("Running command '{}'", command.name);
    (command.handler)(args.collect(), context)
}

// MARK: --- UNIT TESTS ---
