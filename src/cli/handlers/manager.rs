// src/cli/handlers/manager.rs

use anyhow::{Result, anyhow};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::{Select, theme::ColorfulTheme};

use crate::{
    cli::handlers::{commons, sync},
    core::{config, errors::AppError, managers},
    state::AppContext,
};

#[derive(Parser, Debug)]
#[command(no_binary_name = true, about = "Manages the snippet sources.")]
struct ManagerArgs {
    #[command(subcommand)]
    command: ManagerCommand,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum ManagerCommand {
    /// Enables one more manager with its default settings.
    Add,
    /// Syncs every enabled manager.
    Sync,
}

pub fn handle(args: Vec<String>, context: &AppContext) -> Result<()> {
    let manager_args = ManagerArgs::try_parse_from(&args)?;
    match manager_args.command {
        ManagerCommand::Add => add(context),
        ManagerCommand::Sync => sync::run(context),
    }
}

fn add(context: &AppContext) -> Result<()> {
    // 1. Offer the managers that are not configured yet.
    let service = context.config_service()?;
    let mut file = service.load()?;
    let candidates: Vec<_> = managers::catalog(&file.config)
        .into_iter()
        .filter(|d| !managers::is_configured(&file.config, &d.key))
        .collect();
    if candidates.is_empty() {
        println!("{}", "Every available manager is already configured.".yellow());
        return Ok(());
    }

    let labels: Vec<String> = candidates
        .iter()
        .map(|d| format!("{} - {}", d.name, d.description))
        .collect();
    let choice = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("Which manager do you want to add?")
        .items(&labels)
        .default(0)
        .interact_opt()?
        .ok_or(AppError::Cancelled)?;
    let chosen = candidates.get(choice).ok_or_else(|| anyhow!("Invalid selection."))?;

    // 2. Append its defaults and show what changes.
    let before = config::to_yaml(&file)?;
    file.config = managers::with_default_config(&file.config, &chosen.key)?;
    let after = config::to_yaml(&file)?;
    commons::confirm_config_change(&before, &after)?;

    // 3. Persist.
    service.save(&file)?;
    println!(
        "{} Manager '{}' added. Adjust its settings with `snipforge config edit`.",
        "✓".green(),
        chosen.key
    );
    Ok(())
}
