// src/ui/chat/mod.rs

//! # Unified Chat
//!
//! The assistant session screen. Four modes (`Input`, `Generating`, `ScriptReady`,
//! `PostExecution`) and three overlays (parameters form, save form, executing notice).
//!
//! The screen never talks to the LLM or runs scripts itself. It exits with a [`ChatOutcome`]
//! whenever the host has work to do; the host starts a worker, tells the model what it is
//! waiting for (`start_generating`, `begin_execution`) and re-enters [`run`]. Worker results
//! come back as [`ChatEvent`]s on the inbox channel.

mod render;

use crate::constants::TICK_RATE_MS;
use crate::core::assistant;
use crate::core::parameters;
use crate::models::{HistoryEntry, Parameter, ParsedScript};
use crate::system::executor::ExecutionResult;
use crate::ui::form::field::Field;
use crate::ui::form::{FormModel, FormOptions, FormResult};
use crate::ui::text_input::TextInput;
use crate::ui::theme::Theme;
use crate::ui::{TerminalSession, is_ctrl_c};
use crossbeam_channel::Receiver;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use std::io;
use std::time::{Duration, Instant};

pub use render::{ChatLayout, layout};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Input,
    Generating,
    ScriptReady,
    PostExecution,
}

#[derive(Debug, Clone)]
pub enum Modal {
    None,
    Parameters(FormModel),
    Save(FormModel),
    Executing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatAction {
    Cancel,
    Execute,
    Edit,
    Revise,
    ExitNoSave,
}

/// Everything that can drive the model.
#[derive(Debug, Clone)]
pub enum ChatEvent {
    Key(KeyEvent),
    Tick,
    Resize(u16, u16),
    /// The assistant answered (or failed with a printable message).
    ScriptReady(Result<ParsedScript, String>),
    ExecutionFinished(Result<ExecutionResult, String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveRequest {
    pub filename: String,
    pub name: String,
}

/// Why the screen exited, with what the host needs to act on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatOutcome {
    pub action: ChatAction,
    /// The prompt to send, for `Revise`.
    pub prompt: Option<String>,
    /// Collected parameter values, for `Execute`.
    pub values: Vec<String>,
    /// Set when the user confirmed the save dialog.
    pub save: Option<SaveRequest>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EntryKind {
    User,
    Script { title: Option<String>, filename: Option<String> },
    Output { exit_code: Option<i32>, duration: Duration },
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatEntry {
    pub kind: EntryKind,
    pub text: String,
}

impl ChatEntry {
    fn new(kind: EntryKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

// --- ACTION BAR ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarAction {
    Execute,
    OpenEditor,
    Revise,
    Cancel,
    ExecuteAgain,
    SaveAndExit,
    ExitNoSave,
}

impl BarAction {
    pub fn label(&self) -> &'static str {
        match self {
            BarAction::Execute => "Execute",
            BarAction::OpenEditor => "Open editor",
            BarAction::Revise => "Revise",
            BarAction::Cancel => "Cancel",
            BarAction::ExecuteAgain => "Execute again",
            BarAction::SaveAndExit => "Save & Exit",
            BarAction::ExitNoSave => "Exit & Don't save",
        }
    }

    pub fn shortcut(&self) -> char {
        match self {
            BarAction::Execute | BarAction::ExecuteAgain => 'e',
            BarAction::OpenEditor => 'o',
            BarAction::Revise => 'r',
            BarAction::Cancel => 'c',
            BarAction::SaveAndExit => 's',
            BarAction::ExitNoSave => 'x',
        }
    }
}

const SCRIPT_READY_ACTIONS: [BarAction; 4] = [
    BarAction::Execute,
    BarAction::OpenEditor,
    BarAction::Revise,
    BarAction::Cancel,
];

const POST_EXECUTION_ACTIONS: [BarAction; 4] = [
    BarAction::ExecuteAgain,
    BarAction::Revise,
    BarAction::SaveAndExit,
    BarAction::ExitNoSave,
];

// --- MODEL ---

#[derive(Debug)]
pub struct ChatModel {
    messages: Vec<ChatEntry>,
    mode: Mode,
    modal: Modal,
    selected: usize,
    spinner: usize,
    script: Option<ParsedScript>,
    parameters: Vec<Parameter>,
    values: Option<Vec<String>>,
    executed: bool,
    latest_prompt: String,
    input: TextInput,
    history: Vec<HistoryEntry>,
    hide_key_map: bool,
    size: (u16, u16),
    viewport_height: u16,
    /// Lines scrolled up from the bottom of the conversation.
    scroll_back: usize,
}

impl ChatModel {
    pub fn new(hide_key_map: bool) -> Self {
        let mut model = Self {
            messages: vec![ChatEntry::new(
                EntryKind::Info,
                "Describe the script you need and press Enter.",
            )],
            mode: Mode::Input,
            modal: Modal::None,
            selected: 0,
            spinner: 0,
            script: None,
            parameters: Vec::new(),
            values: None,
            executed: false,
            latest_prompt: String::new(),
            input: TextInput::default(),
            history: Vec::new(),
            hide_key_map,
            size: (80, 24),
            viewport_height: 0,
            scroll_back: 0,
        };
        model.recompute_viewport();
        model
    }

    // --- Accessors ---

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn modal(&self) -> &Modal {
        &self.modal
    }

    pub fn messages(&self) -> &[ChatEntry] {
        &self.messages
    }

    pub fn script(&self) -> Option<&ParsedScript> {
        self.script.as_ref()
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn values(&self) -> Option<&[String]> {
        self.values.as_deref()
    }

    pub fn has_executed(&self) -> bool {
        self.executed
    }

    pub fn latest_prompt(&self) -> &str {
        &self.latest_prompt
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn viewport_height(&self) -> u16 {
        self.viewport_height
    }

    pub fn actions(&self) -> &'static [BarAction] {
        match self.mode {
            Mode::ScriptReady => &SCRIPT_READY_ACTIONS,
            Mode::PostExecution => &POST_EXECUTION_ACTIONS,
            Mode::Input | Mode::Generating => &[],
        }
    }

    pub fn selected_action(&self) -> Option<BarAction> {
        self.actions().get(self.selected).copied()
    }

    // --- Host notifications ---

    /// The host sent `prompt` to the assistant and waits for `ScriptReady`.
    pub fn start_generating(&mut self, prompt: &str) {
        self.latest_prompt = prompt.to_string();
        self.messages.push(ChatEntry::new(EntryKind::User, prompt));
        self.set_mode(Mode::Generating);
    }

    /// The host is running the script and will send `ExecutionFinished`.
    pub fn begin_execution(&mut self) {
        self.modal = Modal::Executing;
    }

    /// The script was changed outside the screen (editor). Parameters are re-extracted.
    pub fn replace_script(&mut self, contents: String) {
        let Some(script) = self.script.as_mut() else {
            return;
        };
        if script.contents == contents {
            self.push_info("The script was not modified.");
            return;
        }
        script.contents = contents;
        let (title, filename, contents) = (script.title.clone(), script.filename.clone(), script.contents.clone());
        self.parameters = parameters::parse_parameters(&contents);
        self.values = None;
        if let Some(entry) = self.history.last_mut() {
            entry.generated_script = contents.clone();
        }
        self.messages
            .push(ChatEntry::new(EntryKind::Script { title, filename }, contents));
        self.scroll_back = 0;
    }

    pub fn push_info(&mut self, text: impl Into<String>) {
        self.messages.push(ChatEntry::new(EntryKind::Info, text));
        self.scroll_back = 0;
    }

    pub fn push_error(&mut self, text: impl Into<String>) {
        self.messages.push(ChatEntry::new(EntryKind::Error, text));
        self.scroll_back = 0;
    }

    // --- Update ---

    pub fn handle(&mut self, event: ChatEvent) -> Option<ChatOutcome> {
        match event {
            ChatEvent::Key(key) if is_ctrl_c(&key) => Some(self.outcome(ChatAction::Cancel)),
            ChatEvent::Key(key) => self.handle_key(key),
            ChatEvent::Tick => {
                if self.mode == Mode::Generating || matches!(self.modal, Modal::Executing) {
                    self.spinner = self.spinner.wrapping_add(1);
                }
                None
            }
            ChatEvent::Resize(width, height) => {
                self.size = (width, height);
                self.recompute_viewport();
                None
            }
            ChatEvent::ScriptReady(result) => {
                self.on_script_ready(result);
                None
            }
            ChatEvent::ExecutionFinished(result) => {
                self.on_execution_finished(result);
                None
            }
        }
    }

    fn on_script_ready(&mut self, result: Result<ParsedScript, String>) {
        if self.mode != Mode::Generating {
            log::debug!("Discarding an assistant answer that arrived outside generation");
            return;
        }
        match result {
            Ok(script) => {
                self.parameters = parameters::parse_parameters(&script.contents);
                self.values = None;
                self.executed = false;
                self.history.push(HistoryEntry::new(self.latest_prompt.clone(), &script));
                self.messages.push(ChatEntry::new(
                    EntryKind::Script {
                        title: script.title.clone(),
                        filename: script.filename.clone(),
                    },
                    script.contents.clone(),
                ));
                self.script = Some(script);
                self.scroll_back = 0;
                self.set_mode(Mode::ScriptReady);
            }
            Err(message) => {
                self.push_error(message);
                // Back to the prompt so the user can retry or rephrase.
                self.set_mode(if self.script.is_some() { Mode::ScriptReady } else { Mode::Input });
            }
        }
    }

    fn on_execution_finished(&mut self, result: Result<ExecutionResult, String>) {
        self.modal = Modal::None;
        match result {
            Ok(execution) => {
                if let Some(entry) = self.history.last_mut() {
                    entry.execution_output = Some(execution.output.clone());
                    entry.exit_code = execution.exit_code;
                    entry.duration = Some(execution.duration);
                    entry.execution_time = Some(execution.started_at);
                }
                self.messages.push(ChatEntry::new(
                    EntryKind::Output {
                        exit_code: execution.exit_code,
                        duration: execution.duration,
                    },
                    execution.output,
                ));
                self.executed = true;
            }
            Err(message) => self.push_error(message),
        }
        self.scroll_back = 0;
        self.set_mode(Mode::PostExecution);
    }

    fn handle_key(&mut self, key: KeyEvent) -> Option<ChatOutcome> {
        // 1. An open modal takes all input.
        match &mut self.modal {
            Modal::Parameters(form) => {
                match form.handle_key(key) {
                    Some(FormResult::Submitted(values)) => {
                        self.values = Some(values);
                        self.modal = Modal::None;
                        return Some(self.outcome(ChatAction::Execute));
                    }
                    Some(FormResult::Cancelled) => self.modal = Modal::None,
                    None => {}
                }
                return None;
            }
            Modal::Save(form) => {
                match form.handle_key(key) {
                    Some(FormResult::Submitted(values)) => {
                        self.modal = Modal::None;
                        let mut values = values.into_iter();
                        let save = SaveRequest {
                            filename: values.next().unwrap_or_default().trim().to_string(),
                            name: values.next().unwrap_or_default().trim().to_string(),
                        };
                        let mut outcome = self.outcome(ChatAction::Cancel);
                        outcome.save = Some(save);
                        return Some(outcome);
                    }
                    Some(FormResult::Cancelled) => self.modal = Modal::None,
                    None => {}
                }
                return None;
            }
            Modal::Executing => return None,
            Modal::None => {}
        }

        // 2. Scrolling works in every mode.
        match key.code {
            KeyCode::PageUp => {
                self.scroll_back = self.scroll_back.saturating_add(usize::from(self.viewport_height.max(1)));
                return None;
            }
            KeyCode::PageDown => {
                self.scroll_back = self.scroll_back.saturating_sub(usize::from(self.viewport_height.max(1)));
                return None;
            }
            _ => {}
        }

        // 3. Mode specific keys.
        match self.mode {
            Mode::Input => match key.code {
                KeyCode::Esc => Some(self.outcome(ChatAction::Cancel)),
                KeyCode::Enter => {
                    let prompt = self.input.value().trim().to_string();
                    if prompt.is_empty() {
                        return None;
                    }
                    self.input.clear();
                    self.latest_prompt = prompt;
                    Some(self.outcome(ChatAction::Revise))
                }
                _ => {
                    self.input.handle_key(&key);
                    None
                }
            },
            Mode::Generating => match key.code {
                KeyCode::Esc => Some(self.outcome(ChatAction::Cancel)),
                _ => None,
            },
            Mode::ScriptReady | Mode::PostExecution => self.handle_action_bar(key),
        }
    }

    fn handle_action_bar(&mut self, key: KeyEvent) -> Option<ChatOutcome> {
        let actions = self.actions();
        match key.code {
            KeyCode::Left => {
                self.selected = self.selected.checked_sub(1).unwrap_or(actions.len().saturating_sub(1));
                None
            }
            KeyCode::Right | KeyCode::Tab => {
                self.selected = (self.selected + 1) % actions.len().max(1);
                None
            }
            KeyCode::Up => {
                self.scroll_back = self.scroll_back.saturating_add(1);
                None
            }
            KeyCode::Down => {
                self.scroll_back = self.scroll_back.saturating_sub(1);
                None
            }
            KeyCode::Enter => self.selected_action().and_then(|action| self.activate(action)),
            KeyCode::Char(c) => {
                let c = c.to_ascii_lowercase();
                let action = actions.iter().copied().find(|a| a.shortcut() == c)?;
                self.activate(action)
            }
            _ => None,
        }
    }

    fn activate(&mut self, action: BarAction) -> Option<ChatOutcome> {
        match action {
            BarAction::Execute | BarAction::ExecuteAgain => self.execute(),
            BarAction::OpenEditor => Some(self.outcome(ChatAction::Edit)),
            BarAction::Revise => {
                self.set_mode(Mode::Input);
                None
            }
            BarAction::Cancel => Some(self.outcome(ChatAction::Cancel)),
            BarAction::SaveAndExit => {
                self.open_save_dialog();
                None
            }
            BarAction::ExitNoSave => Some(self.outcome(ChatAction::ExitNoSave)),
        }
    }

    /// Opens the parameters modal when values are still needed; otherwise exits with `Execute`.
    /// After a run the modal opens again, prefilled with the previous values.
    fn execute(&mut self) -> Option<ChatOutcome> {
        if self.parameters.is_empty() {
            self.values = Some(Vec::new());
            return Some(self.outcome(ChatAction::Execute));
        }
        if self.values.is_some() && self.mode == Mode::ScriptReady {
            return Some(self.outcome(ChatAction::Execute));
        }
        let prefill = self
            .values
            .clone()
            .unwrap_or_else(|| parameters::initial_values(&self.parameters, &[]));
        let form = FormModel::for_parameters(
            &self.parameters,
            &prefill,
            FormOptions::embedded("Parameters", 'e', "Execute"),
        );
        self.modal = Modal::Parameters(form);
        None
    }

    fn open_save_dialog(&mut self) {
        let filename = self
            .script
            .as_ref()
            .and_then(|s| s.filename.clone())
            .filter(|f| !f.is_empty())
            .unwrap_or_else(assistant::default_filename);
        let name = self
            .script
            .as_ref()
            .and_then(|s| s.title.clone())
            .unwrap_or_default();
        let form = FormModel::new(
            vec![Field::new("Filename", filename), Field::new("Snippet Name", name)],
            FormOptions::embedded("Save snippet", 's', "Save"),
        );
        self.modal = Modal::Save(form);
    }

    fn outcome(&self, action: ChatAction) -> ChatOutcome {
        ChatOutcome {
            action,
            prompt: (action == ChatAction::Revise).then(|| self.latest_prompt.clone()),
            values: self.values.clone().unwrap_or_default(),
            save: None,
        }
    }

    fn set_mode(&mut self, mode: Mode) {
        log::trace!("Chat mode {:?} -> {:?}", self.mode, mode);
        self.mode = mode;
        self.selected = 0;
        self.recompute_viewport();
    }

    fn recompute_viewport(&mut self) {
        let (width, height) = self.size;
        let area = ratatui::layout::Rect::new(0, 0, width, height);
        self.viewport_height = layout(area, self.mode, self.hide_key_map).viewport.height;
    }
}

// --- RUN LOOP ---

/// Drives `model` until it produces an outcome. Worker results arrive on `inbox`.
pub fn run(
    session: &mut TerminalSession,
    model: &mut ChatModel,
    inbox: &Receiver<ChatEvent>,
    theme: &Theme,
) -> io::Result<ChatOutcome> {
    let tick = Duration::from_millis(TICK_RATE_MS);
    let mut last_tick = Instant::now();
    let size = session.terminal_mut().size()?;
    model.handle(ChatEvent::Resize(size.width, size.height));

    loop {
        session
            .terminal_mut()
            .draw(|frame| render::draw(frame, model, theme))?;

        for message in inbox.try_iter() {
            if let Some(outcome) = model.handle(message) {
                return Ok(outcome);
            }
        }

        let timeout = tick.saturating_sub(last_tick.elapsed());
        if event::poll(timeout)? {
            let outcome = match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => model.handle(ChatEvent::Key(key)),
                Event::Resize(width, height) => model.handle(ChatEvent::Resize(width, height)),
                _ => None,
            };
            if let Some(outcome) = outcome {
                return Ok(outcome);
            }
        }
        if last_tick.elapsed() >= tick {
            model.handle(ChatEvent::Tick);
            last_tick = Instant::now();
        }
    }
}

// MARK: --- UNIT TESTS ---
