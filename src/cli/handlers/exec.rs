// src/cli/handlers/exec.rs

use anyhow::Result;
use clap::Parser;
use colored::*;

use crate::{
    cli::handlers::commons::{self, SnippetArgs},
    state::AppContext,
    system::executor::{self, OutputMode},
};

#[derive(Parser, Debug, Default)]
#[command(no_binary_name = true, about = "Picks a snippet, fills its parameters and runs it in your shell.")]
struct ExecArgs {
    #[command(flatten)]
    snippet: SnippetArgs,

    /// Show the script and ask before running it.
    #[arg(long)]
    confirm: bool,

    /// Show the script before running it.
    #[arg(long)]
    print: bool,
}

pub fn handle(args: Vec<String>, context: &AppContext) -> Result<()> {
    // 1. Parse arguments; config defaults apply when a flag is absent.
    let exec_args = ExecArgs::try_parse_from(&args)?;
    let scripts = &context.config()?.scripts;
    let confirm = exec_args.confirm || scripts.exec_confirm;
    let print = exec_args.print || scripts.exec_print;

    // 2. Resolve, fill and render.
    let script = commons::prepare_script(context, &exec_args.snippet)?;

    // 3. Echo and confirm.
    if print || confirm {
        println!("{}", "--- script ---".dimmed());
        print!("{}", script);
        if !script.ends_with('\n') {
            println!();
        }
        println!("{}", "--------------".dimmed());
    }
    if confirm {
        commons::confirm_or_cancel("Run this script?", true)?;
    }

    // 4. Run with the terminal attached. A failing script is reported, not propagated.
    let shell = context.config()?.shell();
    log::info!("Executing snippet with '{}'", shell);
    let result = executor::execute_script(&shell, &script, OutputMode::Inherit)?;
    if !result.success() {
        let status = result
            .exit_code
            .map_or_else(|| "was terminated by a signal".to_string(), |code| format!("exited with code {}", code));
        eprintln!("{} The script {}.", "!".yellow().bold(), status);
    }
    log::debug!("Script finished in {:?}", result.duration);
    Ok(())
}

// MARK: --- UNIT TESTS ---

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exec_flags_parse() {
        let args = ExecArgs::try_parse_from(["--id", "fs-1", "--param", "A=1", "--param", "B=2", "--print"]).unwrap();
        assert_eq!(args.snippet.id.as_deref(), Some("fs-1"));
        assert_eq!(args.snippet.params.len(), 2);
        assert!(args.print);
        assert!(!args.confirm);
        assert!(ExecArgs::try_parse_from(["--param", "novalue"]).is_err());
    }
}
