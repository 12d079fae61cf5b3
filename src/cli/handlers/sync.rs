// src/cli/handlers/sync.rs

use anyhow::Result;
use clap::Parser;
use colored::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use crate::{
    core::sync::{self, SyncMessage},
    models::SyncStatus,
    state::AppContext,
    ui::{
        TerminalSession,
        sync_screen::{self, ManagerRow, SyncScreenModel, SyncScreenResult},
    },
};

#[derive(Parser, Debug, Default)]
#[command(no_binary_name = true, about = "Syncs every enabled manager.")]
struct SyncArgs {}

pub fn handle(args: Vec<String>, context: &AppContext) -> Result<()> {
    let _sync_args = SyncArgs::try_parse_from(&args)?;
    run(context)
}

/// Runs the sync screen while a coordinator thread syncs the managers one by one.
pub fn run(context: &AppContext) -> Result<()> {
    // 1. Build the managers and hand them to the coordinator.
    let managers = context.aggregator()?.into_managers();
    if managers.is_empty() {
        println!("{}", "No managers are enabled. Add one with `snipforge manager add`.".yellow());
        return Ok(());
    }
    let keys: Vec<String> = managers.iter().map(|m| m.key().to_string()).collect();
    let mut model = SyncScreenModel::new(keys, context.hide_key_map()?);

    let (ui_tx, ui_rx) = crossbeam_channel::unbounded::<SyncMessage>();
    let stop = Arc::new(AtomicBool::new(false));
    let coordinator = {
        let stop = Arc::clone(&stop);
        thread::spawn(move || sync::run_sync(&managers, &ui_tx, &stop))
    };

    // 2. Drive the screen until everything is done or the user aborts.
    let outcome = {
        let mut session = TerminalSession::enter()?;
        sync_screen::run(&mut session, &mut model, &ui_rx, &context.theme()?)?
    };

    if matches!(outcome, SyncScreenResult::Aborted) {
        stop.store(true, Ordering::SeqCst);
    }

    // 3. Summary, then surface a crashed worker.
    print_summary(model.rows());
    match outcome {
        SyncScreenResult::Completed => {
            let result = coordinator
                .join()
                .map_err(|_| anyhow::anyhow!("The sync coordinator crashed."))?;
            result?;
        }
        SyncScreenResult::Aborted => {
            // The running worker finishes on its own; no further manager starts.
            println!("{}", "Sync aborted.".yellow());
        }
    }
    Ok(())
}

fn print_summary(rows: &[ManagerRow]) {
    for row in rows {
        let marker = match row.status {
            Some(SyncStatus::Finished) => "✓".green(),
            Some(SyncStatus::Aborted) => "✗".red(),
            _ => "…".dimmed(),
        };
        println!("{} {}  {}", marker, row.key.bold(), row.line);
    }
}
