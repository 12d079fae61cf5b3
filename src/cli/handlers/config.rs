// src/cli/handlers/config.rs

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::{Confirm, theme::ColorfulTheme};
use std::fs;

use crate::{
    cli::handlers::commons,
    constants::CONFIG_FILENAME,
    core::{
        config::{self, ConfigError, ConfigService, diff, model::Config},
        errors::AppError,
        tempdir::TempDirService,
    },
    state::AppContext,
    system::editor,
};

#[derive(Parser, Debug)]
#[command(no_binary_name = true, about = "Creates, edits, migrates or deletes the configuration file.")]
struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigCommand {
    /// Creates the file with defaults discovered from the environment.
    Init,
    /// Opens the file in your editor and validates the result.
    Edit,
    /// Deletes the file.
    Clean,
    /// Upgrades a file written by an older version.
    Migrate,
}

pub fn handle(args: Vec<String>, context: &AppContext) -> Result<()> {
    let config_args = ConfigArgs::try_parse_from(&args)?;
    let service = context.config_service()?;
    match config_args.command {
        ConfigCommand::Init => init(&service),
        ConfigCommand::Edit => edit(&service),
        ConfigCommand::Clean => clean(&service),
        ConfigCommand::Migrate => migrate(&service),
    }
}

fn init(service: &ConfigService) -> Result<()> {
    let proposed = config::to_yaml(&config::discover_defaults())?;
    let current = if service.exists() {
        println!(
            "{} A configuration already exists at '{}'.",
            "!".yellow().bold(),
            service.path().display()
        );
        commons::confirm_or_cancel("Replace it with freshly discovered defaults?", false)?;
        service.read_raw()?
    } else {
        String::new()
    };

    commons::confirm_config_change(&current, &proposed)?;
    service.write_raw(&proposed)?;
    println!("{} Configuration written to '{}'.", "✓".green(), service.path().display());
    Ok(())
}

fn edit(service: &ConfigService) -> Result<()> {
    // 1. The editor comes from the config when it still loads.
    let editor_command = service
        .load()
        .map(|file| file.config.editor())
        .unwrap_or_else(|_| Config::default().editor());
    let original = service.read_raw()?;

    // 2. Edit a private copy until it validates or the user gives up.
    let temp = TempDirService::new()?;
    let copy = temp.create_file(CONFIG_FILENAME, &original)?;
    let edited = loop {
        editor::open_in_editor(&editor_command, &copy)?;
        let edited = fs::read_to_string(&copy)?;
        match config::parse_current(&edited) {
            Ok(_) => break edited,
            Err(e) => {
                eprintln!("{} {}", "The edited configuration is invalid:".red(), e);
                let retry = Confirm::with_theme(&ColorfulTheme::default())
                    .with_prompt("Edit it again?")
                    .default(true)
                    .interact()?;
                if !retry {
                    return Err(AppError::Cancelled.into());
                }
            }
        }
    };

    // 3. Confirm and write back.
    if !diff::has_changes(&original, &edited) {
        println!("No changes.");
        return Ok(());
    }
    commons::confirm_config_change(&original, &edited)?;
    service.write_raw(&edited)?;
    println!("{} Configuration updated.", "✓".green());
    Ok(())
}

fn clean(service: &ConfigService) -> Result<()> {
    if !service.exists() {
        return Err(ConfigError::NotFound(service.path().to_path_buf()).into());
    }
    commons::confirm_or_cancel(
        &format!("Delete the configuration at '{}'?", service.path().display()),
        false,
    )?;
    service.delete()?;
    println!("{} Configuration deleted.", "✓".green());
    Ok(())
}

fn migrate(service: &ConfigService) -> Result<()> {
    let Some(plan) = service.plan_migration()? else {
        println!("{} The configuration is already up to date.", "✓".green());
        return Ok(());
    };

    println!("Migrating configuration from {} to {}.", plan.from.yellow(), plan.to.green());
    commons::confirm_config_change(&plan.before, &plan.after)?;
    service.write_raw(&plan.after)?;
    println!("{} Configuration migrated to {}.", "✓".green(), plan.to);
    Ok(())
}
