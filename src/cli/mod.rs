// src/cli/mod.rs

use clap::Parser;
use std::path::PathBuf;

pub mod dispatcher;
pub mod handlers;

const HELP_TEMPLATE: &str = "\
<title>snipforge</title> {version}
Pick, fill and run shell snippets from your libraries, or have an assistant write them.

<title>USAGE</title>
  snipforge [--config <PATH>] <cmd><COMMAND></cmd> [ARGS...]

<group>SNIPPETS</group>
  <cmd>browse</cmd>                    Pick a snippet and show its source
  <cmd>print</cmd>                     Pick, fill parameters, print the script
  <cmd>copy</cmd>, <cmd>cp</cmd>                  Like print, but copy to the clipboard
  <cmd>exec</cmd>                      Pick, fill parameters, run in your shell
  <cmd>export</cmd>                    Write all snippets as json, json-pretty or xml

<group>MANAGERS</group>
  <cmd>sync</cmd>, <cmd>manager sync</cmd>        Sync every enabled manager
  <cmd>manager add</cmd>               Enable one more snippet source

<group>ASSISTANT</group>
  <cmd>assistant start</cmd>, <cmd>ai</cmd>       Generate scripts in a chat
  <cmd>assistant enable</cmd>          Choose the LLM provider

<group>CONFIGURATION</group>
  <cmd>config init</cmd>               Create the config file with discovered defaults
  <cmd>config edit</cmd>               Edit it in your editor
  <cmd>config migrate</cmd>            Upgrade an older config file
  <cmd>config clean</cmd>              <err>Delete</err> the config file
  <cmd>info</cmd>                      Show the config path and manager diagnostics

<dim>Run `snipforge <COMMAND> --help` for the flags of a command.</dim>
";

/// Builds the colored help text once per process.
fn build_help_string() -> &'static str {
    let use_colors = colored::control::SHOULD_COLORIZE.should_colorize();
    let style = |code: &'static str| if use_colors { code } else { "" };

    let formatted = HELP_TEMPLATE
        .replace("<title>", style("\x1b[1;33m"))
        .replace("</title>", style("\x1b[0m"))
        .replace("<group>", style("\x1b[1;32m"))
        .replace("</group>", style("\x1b[0m"))
        .replace("<cmd>", style("\x1b[36m"))
        .replace("</cmd>", style("\x1b[0m"))
        .replace("<err>", style("\x1b[91m"))
        .replace("</err>", style("\x1b[0m"))
        .replace("<dim>", style("\x1b[2m"))
        .replace("</dim>", style("\x1b[0m"));

    Box::leak(formatted.into_boxed_str())
}

/// snipforge: a snippet manager for the terminal.
#[derive(Parser, Debug)]
#[command(
    name = "snipforge",
    version,
    about,
    help_template = { build_help_string() },
    disable_help_subcommand = true,
    trailing_var_arg = true
)]
pub struct Cli {
    /// Use this configuration file instead of the default one.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// The command and its arguments.
    #[arg(allow_hyphen_values = true)]
    pub args: Vec<String>,
}
