// src/cli/handlers/commons.rs

// Shared steps of the snippet commands: find a snippet, collect its values, render it.

use anyhow::Result;
use clap::Args;
use colored::*;
use dialoguer::{Confirm, theme::ColorfulTheme};
use std::sync::Arc;

use crate::{
    core::{config::diff, errors::AppError, parameters, snippet::Snippet},
    models::ParameterValue,
    state::AppContext,
    ui::{
        TerminalSession,
        form::{self, FormModel, FormOptions, FormResult},
        picker::{self, PickerItem, PickerModel, PickerResult},
    },
};

/// Flags shared by `print`, `copy` and `exec`.
#[derive(Args, Debug, Default, Clone)]
pub struct SnippetArgs {
    /// Use the snippet with this id instead of opening the picker.
    #[arg(long)]
    pub id: Option<String>,

    /// Set a parameter up front (repeatable). The form is skipped when every parameter is set.
    #[arg(long = "param", value_name = "KEY=VALUE")]
    pub params: Vec<ParameterValue>,
}

/// Gathers every snippet and lets the user pick one.
pub fn pick_snippet(context: &AppContext) -> Result<Arc<dyn Snippet>> {
    let snippets = context.aggregator()?.snippets();
    if snippets.is_empty() {
        return Err(AppError::NoSnippetsAvailable.into());
    }

    let items = snippets
        .iter()
        .map(|s| PickerItem {
            title: s.title().to_string(),
            tags: s.tags().to_vec(),
            preview: s.preview(),
        })
        .collect();
    let config = context.config()?;
    let mut model = PickerModel::new("Snippets", items, config.fuzzy_search, config.style.hide_key_map);

    let result = {
        let mut session = TerminalSession::enter()?;
        picker::run(&mut session, &mut model, &context.theme()?)?
    };
    match result {
        PickerResult::Selected(index) => snippets
            .get(index)
            .cloned()
            .ok_or_else(|| AppError::Cancelled.into()),
        PickerResult::Cancelled => Err(AppError::Cancelled.into()),
    }
}

/// Looks the snippet up by id when one is given, else opens the picker.
pub fn resolve_snippet(context: &AppContext, id: Option<&str>) -> Result<Arc<dyn Snippet>> {
    match id {
        Some(id) => context
            .aggregator()?
            .find_by_id(id)
            .ok_or_else(|| AppError::SnippetIdNotFound(id.to_string()).into()),
        None => pick_snippet(context),
    }
}

/// Returns one value per parameter of `snippet`, asking through the form for those not given
/// in `overrides`.
pub fn collect_values(context: &AppContext, snippet: &dyn Snippet, overrides: &[ParameterValue]) -> Result<Vec<String>> {
    let parameters = snippet.parameters();
    let initial = parameters::initial_values(&parameters, overrides);
    if parameters.is_empty() || parameters::all_overridden(&parameters, overrides) {
        log::debug!("No form needed for '{}'", snippet.id());
        return Ok(initial);
    }

    let mut model = FormModel::for_parameters(&parameters, &initial, FormOptions::standalone(snippet.title()));
    let result = {
        let mut session = TerminalSession::enter()?;
        form::run(&mut session, &mut model, &context.theme()?)?
    };
    match result {
        FormResult::Submitted(values) => Ok(values),
        FormResult::Cancelled => Err(AppError::Cancelled.into()),
    }
}

/// Finds the snippet, collects its values and renders it with the configured options.
pub fn prepare_script(context: &AppContext, args: &SnippetArgs) -> Result<String> {
    let snippet = resolve_snippet(context, args.id.as_deref())?;
    let values = collect_values(context, snippet.as_ref(), &args.params)?;
    let options = context.config()?.format_options();
    Ok(snippet.format(&values, &options))
}

/// Asks a yes/no question. Answering no ends the command as cancelled.
pub fn confirm_or_cancel(prompt: &str, default: bool) -> Result<()> {
    let confirmed = Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .default(default)
        .interact()?;
    if confirmed {
        Ok(())
    } else {
        println!("{}", "Operation cancelled.".yellow());
        Err(AppError::Cancelled.into())
    }
}

/// Prints the diff between two config documents and asks before anything is written.
pub fn confirm_config_change(old: &str, new: &str) -> Result<()> {
    println!("{}", diff::render(old, new));
    confirm_or_cancel("Write these changes?", true)
}

// MARK: --- UNIT TESTS ---

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::model::{Config, FsLibraryConfig};
    use crate::core::managers::fslibrary;
    use crate::core::secrets::MemoryStore;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    fn context_for(dir: &std::path::Path) -> AppContext {
        let mut config = Config::default();
        config.manager.fs_library = Some(FsLibraryConfig {
            library_path: vec![dir.display().to_string()],
            ..FsLibraryConfig::default()
        });
        AppContext::with_config(config, Arc::new(MemoryStore::default()))
    }

    #[test]
    fn test_prepare_by_id_skips_form_when_all_overridden() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("greet.sh");
        fs::write(&path, "# ${WHO} Name: Who\n# ${WHO} Default: world\necho \"hi ${WHO}\"\n").unwrap();
        let context = context_for(dir.path());

        let args = SnippetArgs {
            id: Some(fslibrary::snippet_id(&path)),
            params: vec!["WHO=bob".parse().unwrap()],
        };
        let script = prepare_script(&context, &args).unwrap();
        assert!(script.contains("WHO=\"bob\""));
    }

    #[test]
    fn test_snippet_without_parameters_needs_no_values() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("uptime.sh");
        fs::write(&path, "uptime\n").unwrap();
        let context = context_for(dir.path());

        let snippet = resolve_snippet(&context, Some(&fslibrary::snippet_id(&path))).unwrap();
        let values = collect_values(&context, snippet.as_ref(), &[]).unwrap();
        assert!(values.is_empty());
    }

    #[test]
    fn test_unknown_id_is_reported() {
        let dir = tempdir().unwrap();
        let context = context_for(dir.path());
        let error = resolve_snippet(&context, Some("fs-missing")).unwrap_err();
        assert_eq!(
            error.downcast_ref::<AppError>(),
            Some(&AppError::SnippetIdNotFound("fs-missing".to_string()))
        );
    }
}
