// src/cli/handlers/print.rs

use anyhow::Result;
use clap::Parser;

use crate::{
    cli::handlers::commons::{self, SnippetArgs},
    state::AppContext,
};

#[derive(Parser, Debug, Default)]
#[command(no_binary_name = true, about = "Picks a snippet, fills its parameters and prints the script.")]
struct PrintArgs {
    #[command(flatten)]
    snippet: SnippetArgs,
}

pub fn handle(args: Vec<String>, context: &AppContext) -> Result<()> {
    let print_args = PrintArgs::try_parse_from(&args)?;
    let script = commons::prepare_script(context, &print_args.snippet)?;
    // Plain stdout so the output can be piped.
    print!("{}", script);
    if !script.ends_with('\n') {
        println!();
    }
    Ok(())
}
