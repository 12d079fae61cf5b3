// src/cli/handlers/info.rs

use anyhow::Result;
use clap::Parser;
use colored::*;

use crate::{core::managers, state::AppContext};

#[derive(Parser, Debug, Default)]
#[command(no_binary_name = true, about = "Shows the configuration path and the diagnostics of each manager.")]
struct InfoArgs {}

pub fn handle(args: Vec<String>, context: &AppContext) -> Result<()> {
    let _info_args = InfoArgs::try_parse_from(&args)?;

    let service = context.config_service()?;
    println!("{} {}", "Configuration:".bold(), service.path().display());

    let config = context.config()?;
    let aggregator = context.aggregator()?;
    println!("\n{}", "Managers".yellow().bold());
    for description in managers::catalog(config) {
        let state = if description.enabled {
            "enabled".green()
        } else {
            "disabled".dimmed()
        };
        println!("\n  {} ({}) [{}]", description.name.bold(), description.key.cyan(), state);
        println!("    {}", description.description.dimmed());

        let Some(manager) = aggregator.managers().iter().find(|m| m.key() == description.key) else {
            continue;
        };
        for line in manager.info() {
            println!("    {:<16} {}", format!("{}:", line.key), line.value);
        }
    }
    Ok(())
}
