// src/cli/handlers/copy.rs

use anyhow::Result;
use clap::Parser;
use colored::*;

use crate::{
    cli::handlers::commons::{self, SnippetArgs},
    state::AppContext,
    system::clipboard,
};

#[derive(Parser, Debug, Default)]
#[command(no_binary_name = true, about = "Picks a snippet, fills its parameters and copies the script.")]
struct CopyArgs {
    #[command(flatten)]
    snippet: SnippetArgs,
}

pub fn handle(args: Vec<String>, context: &AppContext) -> Result<()> {
    let copy_args = CopyArgs::try_parse_from(&args)?;
    let script = commons::prepare_script(context, &copy_args.snippet)?;
    clipboard::copy_text(&script)?;
    println!("{} Script copied to the clipboard.", "✓".green());
    Ok(())
}
