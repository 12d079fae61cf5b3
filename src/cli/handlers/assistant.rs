// src/cli/handlers/assistant.rs

use anyhow::{Result, anyhow};
use clap::{Parser, Subcommand};
use colored::*;
use crossbeam_channel::{Receiver, Sender};
use dialoguer::{Select, theme::ColorfulTheme};
use std::fs;
use std::thread;

use crate::{
    cli::handlers::commons,
    core::{
        assistant::{self, Assistant, providers},
        config::{self, model::ProviderKind},
        errors::AppError,
        formatter,
        managers::{Aggregator, SavedSnippet},
        snippet,
        tempdir::TempDirService,
    },
    state::AppContext,
    system::{
        editor,
        executor::{self, OutputMode},
        runtime,
    },
    ui::{
        TerminalSession,
        chat::{self, ChatAction, ChatEvent, ChatModel, SaveRequest},
    },
};

#[derive(Parser, Debug)]
#[command(no_binary_name = true, about = "Generates scripts with an LLM, or configures the provider.")]
struct AssistantArgs {
    #[command(subcommand)]
    command: Option<AssistantCommand>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum AssistantCommand {
    /// Opens the assistant chat (default).
    Start,
    /// Chooses the provider the assistant talks to.
    Enable,
}

pub fn handle(args: Vec<String>, context: &AppContext) -> Result<()> {
    let assistant_args = AssistantArgs::try_parse_from(&args)?;
    match assistant_args.command.unwrap_or(AssistantCommand::Start) {
        AssistantCommand::Start => start(context),
        AssistantCommand::Enable => enable(context),
    }
}

/// Entry point of the `ai` shortcut.
pub fn handle_start(args: Vec<String>, context: &AppContext) -> Result<()> {
    #[derive(Parser, Debug)]
    #[command(no_binary_name = true, about = "Opens the assistant chat.")]
    struct StartArgs {}

    let _start_args = StartArgs::try_parse_from(&args)?;
    start(context)
}

// --- ENABLE ---

fn enable(context: &AppContext) -> Result<()> {
    let service = context.config_service()?;
    let mut file = service.load()?;

    let labels: Vec<String> = ProviderKind::ALL
        .iter()
        .map(|kind| match providers::default_model(*kind) {
            Some(model) => format!("{} ({})", providers::display_name(*kind), model),
            None => providers::display_name(*kind).to_string(),
        })
        .collect();
    let choice = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("Which provider should the assistant use?")
        .items(&labels)
        .default(0)
        .interact_opt()?
        .ok_or(AppError::Cancelled)?;
    let kind = ProviderKind::ALL
        .get(choice)
        .copied()
        .ok_or_else(|| anyhow!("Invalid selection."))?;

    let before = config::to_yaml(&file)?;
    file.config = providers::auto_config(&file.config, kind);
    let after = config::to_yaml(&file)?;
    commons::confirm_config_change(&before, &after)?;
    service.save(&file)?;

    println!("{} {} is now the assistant provider.", "✓".green(), providers::display_name(kind));
    if providers::requires_api_key(kind) {
        println!(
            "  Export {} before starting the assistant.",
            providers::default_api_key_env(kind).cyan()
        );
    }
    Ok(())
}

// --- START ---

fn start(context: &AppContext) -> Result<()> {
    // 1. Everything that can fail up front happens before the screen opens.
    let config = context.config()?;
    let assistant = Assistant::initialize(&config.ai)?;
    let aggregator = context.aggregator()?;
    let theme = context.theme()?;
    let temp = TempDirService::new()?;

    let (events_tx, events_rx) = crossbeam_channel::unbounded::<ChatEvent>();
    let (prompts_tx, prompts_rx) = crossbeam_channel::unbounded::<String>();
    spawn_assistant_worker(assistant, prompts_rx, events_tx.clone());

    // 2. Re-enter the chat after each action the host performs.
    let mut model = ChatModel::new(config.style.hide_key_map);
    let mut session = TerminalSession::enter()?;
    let save = loop {
        let outcome = chat::run(&mut session, &mut model, &events_rx, &theme)?;
        log::debug!("Chat exited with {:?}", outcome.action);
        match outcome.action {
            ChatAction::Revise => {
                let prompt = outcome.prompt.unwrap_or_default();
                model.start_generating(&prompt);
                if prompts_tx.send(prompt).is_err() {
                    model.handle(ChatEvent::ScriptReady(Err("The assistant worker stopped.".to_string())));
                }
            }
            ChatAction::Execute => {
                let Some(script) = model.script() else {
                    model.push_error("There is no script to run yet.");
                    continue;
                };
                let rendered = formatter::format_snippet(&script.contents, &outcome.values, &config.format_options());
                model.begin_execution();
                spawn_execution(config.shell(), rendered, events_tx.clone());
            }
            ChatAction::Edit => {
                if let Err(e) = edit_script(&mut session, &mut model, &temp, &config.editor()) {
                    model.push_error(e.to_string());
                }
            }
            ChatAction::Cancel => break outcome.save,
            ChatAction::ExitNoSave => break None,
        }
    };
    drop(session);
    // Closing the prompt channel ends the worker once its current turn is done.
    drop(prompts_tx);

    // 3. Persist when the user asked for it.
    let (Some(request), Some(script)) = (save, model.script()) else {
        return Ok(());
    };
    let saved = save_script(&aggregator, config.ai.save_target.as_deref(), &script.contents, &request)?;
    println!(
        "{} Saved '{}' to '{}'.",
        "✓".green(),
        saved.filename,
        saved.path.display()
    );
    Ok(())
}

/// One long-lived worker answers prompts in order, keeping the conversation history.
fn spawn_assistant_worker(mut assistant: Assistant, prompts: Receiver<String>, events: Sender<ChatEvent>) {
    thread::spawn(move || {
        let runtime = runtime::current_thread();
        for prompt in prompts.iter() {
            let result = match &runtime {
                Ok(runtime) => runtime.block_on(assistant.query(&prompt)).map_err(|e| e.to_string()),
                Err(e) => Err(format!("Could not start the async runtime: {}", e)),
            };
            if let Err(message) = &result {
                log::error!("Assistant turn failed: {}", message);
            }
            if events.send(ChatEvent::ScriptReady(result)).is_err() {
                break;
            }
        }
        log::debug!("Assistant worker finished");
    });
}

fn spawn_execution(shell: String, script: String, events: Sender<ChatEvent>) {
    thread::spawn(move || {
        let result = executor::execute_script(&shell, &script, OutputMode::Capture).map_err(|e| e.to_string());
        let _ = events.send(ChatEvent::ExecutionFinished(result));
    });
}

/// Hands the current script to the editor with the screen suspended, then reloads it.
fn edit_script(session: &mut TerminalSession, model: &mut ChatModel, temp: &TempDirService, editor_command: &str) -> Result<()> {
    let Some(script) = model.script() else {
        return Ok(());
    };
    let name = script
        .filename
        .clone()
        .filter(|f| !f.trim().is_empty())
        .unwrap_or_else(assistant::default_filename);
    let path = temp.create_file(&name, &script.contents)?;

    session.suspend(|| editor::open_in_editor(editor_command, &path))??;
    let contents = fs::read_to_string(&path)?;
    model.replace_script(contents);
    Ok(())
}

/// Stores `contents` through the save target, with the snippet name as its title header.
fn save_script(aggregator: &Aggregator, preferred: Option<&str>, contents: &str, request: &SaveRequest) -> Result<SavedSnippet> {
    let manager = aggregator
        .save_target(preferred)
        .ok_or_else(|| anyhow!("No enabled manager can store assistant snippets. Enable `fsLibrary` first."))?;
    let target = manager
        .assistant_target()
        .ok_or_else(|| anyhow!("Manager '{}' cannot store assistant snippets.", manager.key()))?;

    let filename = if request.filename.is_empty() {
        assistant::default_filename()
    } else {
        request.filename.clone()
    };
    let contents = if request.name.is_empty() {
        contents.to_string()
    } else {
        snippet::with_title_header(contents, &request.name)
    };
    log::info!("Saving assistant snippet through '{}'", manager.key());
    Ok(target.save_assistant_snippet(&filename, contents.as_bytes())?)
}

// MARK: --- UNIT TESTS ---

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::model::FsLibraryConfig;
    use crate::core::managers::fslibrary::FsLibraryManager;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn library(dir: &std::path::Path) -> Aggregator {
        let manager = FsLibraryManager::new(FsLibraryConfig {
            library_path: vec![dir.display().to_string()],
            ..FsLibraryConfig::default()
        })
        .unwrap();
        Aggregator::new(vec![Box::new(manager)])
    }

    #[test]
    fn test_save_script_adds_title_and_avoids_collisions() {
        let dir = tempfile::tempdir().unwrap();
        let aggregator = library(dir.path());
        let request = SaveRequest {
            filename: "hello.sh".to_string(),
            name: "Say hello".to_string(),
        };

        let first = save_script(&aggregator, None, "echo hello\n", &request).unwrap();
        let second = save_script(&aggregator, Some("fsLibrary"), "echo hello\n", &request).unwrap();
        assert_eq!(first.filename, "hello.sh");
        assert_eq!(second.filename, "hello-1.sh");

        let saved = fs::read_to_string(&first.path).unwrap();
        assert!(saved.contains("# Say hello"));
        assert!(saved.ends_with("echo hello\n"));
    }

    #[test]
    fn test_save_script_without_target_fails() {
        let request = SaveRequest {
            filename: String::new(),
            name: String::new(),
        };
        assert!(save_script(&Aggregator::new(Vec::new()), None, "echo\n", &request).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_execution_reports_captured_output() {
        let (tx, rx) = crossbeam_channel::unbounded();
        spawn_execution("sh".to_string(), "echo out; echo err >&2; exit 3".to_string(), tx);
        let Ok(ChatEvent::ExecutionFinished(Ok(result))) = rx.recv_timeout(Duration::from_secs(10)) else {
            panic!("execution result expected");
        };
        assert_eq!(result.exit_code, Some(3));
        assert!(result.output.contains("out\n"));
        assert!(result.output.contains("err\n"));
    }

    #[test]
    fn test_start_is_the_default_subcommand() {
        assert_eq!(AssistantArgs::try_parse_from(Vec::<String>::new()).unwrap().command, None);
        assert_eq!(
            AssistantArgs::try_parse_from(["enable"]).unwrap().command,
            Some(AssistantCommand::Enable)
        );
    }
}
