// src/cli/handlers/export.rs

use anyhow::Result;
use clap::Parser;

use crate::{
    core::exporter::{self, ExportFormat},
    state::AppContext,
};

#[derive(Parser, Debug)]
#[command(no_binary_name = true, about = "Writes every snippet to stdout.")]
struct ExportArgs {
    /// Comma separated fields: id, title, content, parameters. All by default.
    #[arg(short, long, default_value = "")]
    fields: String,

    /// Output format: json, json-pretty or xml.
    #[arg(short, long, default_value = "json")]
    output: ExportFormat,
}

pub fn handle(args: Vec<String>, context: &AppContext) -> Result<()> {
    let export_args = ExportArgs::try_parse_from(&args)?;
    let fields = exporter::parse_fields(&export_args.fields)?;
    let snippets = context.aggregator()?.snippets();
    log::debug!("Exporting {} snippet(s) as {:?}", snippets.len(), export_args.output);
    let document = exporter::export(&snippets, &fields, export_args.output)?;
    println!("{}", document);
    Ok(())
}
