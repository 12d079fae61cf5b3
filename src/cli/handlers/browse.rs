// src/cli/handlers/browse.rs

use anyhow::Result;
use clap::Parser;
use colored::*;

use crate::{cli::handlers::commons, state::AppContext};

#[derive(Parser, Debug, Default)]
#[command(no_binary_name = true, about = "Picks a snippet and prints its source without running it.")]
struct BrowseArgs {
    /// Show the snippet with this id instead of opening the picker.
    #[arg(long)]
    id: Option<String>,
}

pub fn handle(args: Vec<String>, context: &AppContext) -> Result<()> {
    let browse_args = BrowseArgs::try_parse_from(&args)?;
    let snippet = commons::resolve_snippet(context, browse_args.id.as_deref())?;

    println!("{} {}", snippet.title().bold(), format!("({})", snippet.id()).dimmed());
    if !snippet.tags().is_empty() {
        println!("{}", snippet.tags().iter().map(|t| format!("#{}", t)).collect::<Vec<_>>().join(" ").cyan());
    }
    println!();
    print!("{}", snippet.content());
    if !snippet.content().ends_with('\n') {
        println!();
    }
    Ok(())
}
