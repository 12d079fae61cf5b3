// src/bin/snipforge.rs

use anyhow::Result;
use clap::Parser;
use colored::*;
use snipforge::{
    cli::{Cli, dispatcher},
    constants::LOG_FILE_ENV,
    core::{config::ConfigError, errors::AppError},
    state::AppContext,
};
use std::env;
use std::fs::File;

/// Sends logs to stderr, or to the file named by `SNIPFORGE_LOG_FILE` so they do not
/// tear the full-screen views. `RUST_LOG` still picks the filter.
fn init_logging() {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if let Ok(path) = env::var(LOG_FILE_ENV) {
        match File::create(&path) {
            Ok(file) => {
                builder.target(env_logger::Target::Pipe(Box::new(file)));
            }
            Err(e) => eprintln!("{} Cannot open log file '{}': {}", "!".yellow(), path, e),
        }
    }
    builder.init();
}

/// The main entry point of `snipforge`.
/// It sets up logging, parses the global flags, dispatches the command,
/// and performs centralized error handling.
fn main() {
    init_logging();

    if let Err(e) = run_cli(Cli::parse()) {
        // --- Centralized Error Handling ---
        if let Some(clap_err) = e.downcast_ref::<clap::Error>() {
            // Usage errors and `--help` of a command print themselves.
            let _ = clap_err.print();
            std::process::exit(clap_err.exit_code());
        }
        if let Some(AppError::Cancelled) = e.downcast_ref::<AppError>() {
            std::process::exit(0);
        }

        log::error!("Command failed: {:?}", e);
        eprintln!("\n{}: {}", "Error".red().bold(), e);
        for cause in e.chain().skip(1) {
            eprintln!("  {} {}", "caused by:".dimmed(), cause);
        }
        match e.downcast_ref::<ConfigError>() {
            Some(ConfigError::NeedsMigration { .. }) => {
                eprintln!("{} run `snipforge config migrate`", "hint:".cyan());
            }
            Some(ConfigError::NotFound(_)) => {
                eprintln!("{} run `snipforge config init`", "hint:".cyan());
            }
            _ => {}
        }
        std::process::exit(1);
    }
}

fn run_cli(cli: Cli) -> Result<()> {
    log::debug!("CLI args parsed: {:?}", cli);
    let context = AppContext::new(cli.config);
    dispatcher::dispatch(cli.args, &context)
}
