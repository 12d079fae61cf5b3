// src/ui/sync_screen.rs

//! # Sync Screen
//!
//! One header line and one row per manager. Rows show the latest event of their manager.
//! A manager that needs an answer (a token, a keypress) takes over the input line until the
//! answer is sent back over its reply channel.

use crate::constants::TICK_RATE_MS;
use crate::core::sync::SyncMessage;
use crate::models::{SyncInputType, SyncReply, SyncStatus};
use crate::ui::text_input::TextInput;
use crate::ui::theme::Theme;
use crate::ui::{TerminalSession, is_ctrl_c, spinner_frame};
use crossbeam_channel::{Receiver, Sender, TryRecvError};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use std::io;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncScreenResult {
    /// Every manager had its turn.
    Completed,
    /// The user pressed Ctrl+C.
    Aborted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerRow {
    pub key: String,
    pub status: Option<SyncStatus>,
    pub line: String,
    pub done: bool,
}

#[derive(Debug)]
struct PendingInput {
    manager: String,
    content: String,
    input_type: SyncInputType,
    reply: Sender<SyncReply>,
    input: TextInput,
}

#[derive(Debug)]
pub struct SyncScreenModel {
    rows: Vec<ManagerRow>,
    pending: Option<PendingInput>,
    spinner: usize,
    hide_key_map: bool,
}

impl SyncScreenModel {
    pub fn new(keys: impl IntoIterator<Item = String>, hide_key_map: bool) -> Self {
        Self {
            rows: keys
                .into_iter()
                .map(|key| ManagerRow {
                    key,
                    status: None,
                    line: "Waiting…".to_string(),
                    done: false,
                })
                .collect(),
            pending: None,
            spinner: 0,
            hide_key_map,
        }
    }

    pub fn rows(&self) -> &[ManagerRow] {
        &self.rows
    }

    /// The manager whose prompt currently owns the input, if any.
    pub fn prompting(&self) -> Option<&str> {
        self.pending.as_ref().map(|p| p.manager.as_str())
    }

    fn row_mut(&mut self, manager: &str) -> Option<&mut ManagerRow> {
        if !self.rows.iter().any(|r| r.key == manager) {
            self.rows.push(ManagerRow {
                key: manager.to_string(),
                status: None,
                line: String::new(),
                done: false,
            });
        }
        self.rows.iter_mut().find(|r| r.key == manager)
    }

    pub fn handle_message(&mut self, message: SyncMessage) -> Option<SyncScreenResult> {
        match message {
            SyncMessage::Event { manager, event } => {
                log::trace!("Sync event from '{}': {:?} {:?}", manager, event.status, event.lines);
                if let Some(row) = self.row_mut(&manager) {
                    row.status = Some(event.status);
                    if let Some(line) = event.lines.last() {
                        row.line = line.clone();
                    }
                }
                if let Some(input) = event.input {
                    self.pending = Some(PendingInput {
                        manager,
                        content: input.content,
                        input_type: input.input_type,
                        reply: input.reply,
                        input: TextInput::default(),
                    });
                }
                None
            }
            SyncMessage::ManagerDone { manager, attempted } => {
                if let Some(row) = self.row_mut(&manager) {
                    row.done = true;
                    if !attempted {
                        row.status = Some(SyncStatus::Finished);
                        row.line = "Nothing to sync".to_string();
                    } else if row.status != Some(SyncStatus::Aborted) {
                        row.status = Some(SyncStatus::Finished);
                    }
                }
                // A prompt left unanswered belongs to a worker that already returned.
                if self.prompting() == Some(manager.as_str()) {
                    self.pending = None;
                }
                None
            }
            SyncMessage::AllDone => Some(SyncScreenResult::Completed),
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<SyncScreenResult> {
        if is_ctrl_c(&key) {
            if let Some(pending) = self.pending.take() {
                let _ = pending.reply.send(SyncReply::Abort);
            }
            return Some(SyncScreenResult::Aborted);
        }
        let pending = self.pending.as_mut()?;
        match key.code {
            KeyCode::Esc => {
                if let Some(pending) = self.pending.take() {
                    log::debug!("Prompt of '{}' dismissed", pending.manager);
                    let _ = pending.reply.send(SyncReply::Abort);
                }
            }
            KeyCode::Enter => {
                if let Some(pending) = self.pending.take() {
                    let reply = match pending.input_type {
                        SyncInputType::Text => SyncReply::Text(pending.input.value().to_string()),
                        SyncInputType::ContinueKeypress => SyncReply::Continue,
                    };
                    if pending.reply.send(reply).is_err() {
                        log::debug!("Manager '{}' stopped waiting for its answer", pending.manager);
                    }
                }
            }
            _ => {
                if pending.input_type == SyncInputType::Text {
                    pending.input.handle_key(&key);
                }
            }
        }
        None
    }

    pub fn tick(&mut self) {
        self.spinner = self.spinner.wrapping_add(1);
    }

    pub fn render(&self, frame: &mut Frame<'_>, theme: &Theme) {
        let area = frame.area();
        let mut lines = vec![
            Line::from(Span::styled("Syncing all managers…", theme.accent())),
            Line::default(),
        ];
        for row in &self.rows {
            let (marker, marker_style) = match row.status {
                Some(SyncStatus::Finished) => ("✓".to_string(), Style::default().fg(theme.success)),
                Some(SyncStatus::Aborted) => ("✗".to_string(), Style::default().fg(theme.error)),
                _ => (spinner_frame(self.spinner).to_string(), theme.accent()),
            };
            let line_style = if row.status == Some(SyncStatus::Aborted) {
                Style::default().fg(theme.error)
            } else {
                theme.muted()
            };
            lines.push(Line::from(vec![
                Span::styled(marker, marker_style),
                Span::raw(" "),
                Span::styled(row.key.clone(), Style::default().add_modifier(Modifier::BOLD)),
                Span::raw("  "),
                Span::styled(row.line.clone(), line_style),
            ]));
        }

        if let Some(pending) = &self.pending {
            lines.push(Line::default());
            lines.push(Line::from(Span::styled(
                format!("{}: {}", pending.manager, pending.content),
                theme.accent(),
            )));
            match pending.input_type {
                SyncInputType::Text => {
                    lines.push(Line::from(vec![
                        Span::styled("> ", theme.accent()),
                        Span::raw(pending.input.masked()),
                    ]));
                    let row = u16::try_from(lines.len()).unwrap_or(u16::MAX).saturating_sub(1);
                    let col = u16::try_from(pending.input.cursor()).unwrap_or(0).saturating_add(2);
                    if row < area.height {
                        frame.set_cursor_position((area.x + col.min(area.width.saturating_sub(1)), area.y + row));
                    }
                }
                SyncInputType::ContinueKeypress => {
                    lines.push(Line::from(Span::styled("Press Enter to continue", theme.muted())));
                }
            }
        }

        frame.render_widget(Paragraph::new(lines), area);

        if !self.hide_key_map && area.height > 1 {
            let help = if self.pending.is_some() {
                "enter send · esc skip · ctrl+c abort"
            } else {
                "ctrl+c abort"
            };
            let help_area = Rect::new(area.x, area.bottom() - 1, area.width, 1);
            frame.render_widget(Paragraph::new(Span::styled(help, theme.muted())), help_area);
        }
    }
}

/// Drives the screen until the coordinator reports `AllDone` or the user aborts.
/// A coordinator that hangs up early counts as completed.
pub fn run(
    session: &mut TerminalSession,
    model: &mut SyncScreenModel,
    inbox: &Receiver<SyncMessage>,
    theme: &Theme,
) -> io::Result<SyncScreenResult> {
    let tick = Duration::from_millis(TICK_RATE_MS);
    let mut last_tick = Instant::now();
    loop {
        session.terminal_mut().draw(|frame| model.render(frame, theme))?;

        loop {
            match inbox.try_recv() {
                Ok(message) => {
                    if let Some(result) = model.handle_message(message) {
                        return Ok(result);
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => return Ok(SyncScreenResult::Completed),
            }
        }

        let timeout = tick.saturating_sub(last_tick.elapsed());
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    if let Some(result) = model.handle_key(key) {
                        return Ok(result);
                    }
                }
            }
        }
        if last_tick.elapsed() >= tick {
            model.tick();
            last_tick = Instant::now();
        }
    }
}

// MARK: --- UNIT TESTS ---

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{InteractiveInput, SyncEvent};
    use crossterm::event::KeyModifiers;
    use pretty_assertions::assert_eq;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn event(manager: &str, status: SyncStatus, line: &str) -> SyncMessage {
        SyncMessage::Event {
            manager: manager.to_string(),
            event: SyncEvent::new(status, line),
        }
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn prompt(manager: &str, input_type: SyncInputType) -> (SyncMessage, Receiver<SyncReply>) {
        let (tx, rx) = crossbeam_channel::bounded(1);
        let message = SyncMessage::Event {
            manager: manager.to_string(),
            event: SyncEvent::new(SyncStatus::Started, "Waiting for an access token").with_input(InteractiveInput {
                content: "GitHub token".to_string(),
                input_type,
                reply: tx,
            }),
        };
        (message, rx)
    }

    #[test]
    fn test_rows_reflect_latest_event() {
        let mut model = SyncScreenModel::new(vec!["fsLibrary".to_string(), "githubGist".to_string()], false);
        model.handle_message(event("githubGist", SyncStatus::Started, "Downloading"));
        model.handle_message(event("githubGist", SyncStatus::Aborted, "HTTP 500"));
        model.handle_message(SyncMessage::ManagerDone {
            manager: "fsLibrary".to_string(),
            attempted: false,
        });

        let rows = model.rows();
        assert_eq!(rows[0].status, Some(SyncStatus::Finished));
        assert_eq!(rows[0].line, "Nothing to sync");
        assert_eq!(rows[1].status, Some(SyncStatus::Aborted));
        assert_eq!(rows[1].line, "HTTP 500");
        assert_eq!(
            model.handle_message(SyncMessage::AllDone),
            Some(SyncScreenResult::Completed)
        );
    }

    #[test]
    fn test_text_prompt_sends_typed_value() {
        let mut model = SyncScreenModel::new(vec!["githubGist".to_string()], false);
        let (message, replies) = prompt("githubGist", SyncInputType::Text);
        model.handle_message(message);
        assert_eq!(model.prompting(), Some("githubGist"));

        for c in "tok".chars() {
            model.handle_key(key(KeyCode::Char(c)));
        }
        assert_eq!(model.handle_key(key(KeyCode::Enter)), None);
        assert_eq!(replies.try_recv(), Ok(SyncReply::Text("tok".to_string())));
        assert_eq!(model.prompting(), None);
    }

    #[test]
    fn test_continue_prompt_and_escape() {
        let mut model = SyncScreenModel::new(Vec::<String>::new(), true);
        let (message, replies) = prompt("m", SyncInputType::ContinueKeypress);
        model.handle_message(message);
        model.handle_key(key(KeyCode::Char('x')));
        model.handle_key(key(KeyCode::Enter));
        assert_eq!(replies.try_recv(), Ok(SyncReply::Continue));

        let (message, replies) = prompt("m", SyncInputType::Text);
        model.handle_message(message);
        model.handle_key(key(KeyCode::Esc));
        assert_eq!(replies.try_recv(), Ok(SyncReply::Abort));
    }

    #[test]
    fn test_ctrl_c_aborts_pending_prompt_and_sync() {
        let mut model = SyncScreenModel::new(vec!["githubGist".to_string()], false);
        let (message, replies) = prompt("githubGist", SyncInputType::Text);
        model.handle_message(message);
        let result = model.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert_eq!(result, Some(SyncScreenResult::Aborted));
        assert_eq!(replies.try_recv(), Ok(SyncReply::Abort));
    }

    #[test]
    fn test_render_shows_markers() {
        let mut model = SyncScreenModel::new(vec!["a".to_string(), "b".to_string()], true);
        model.handle_message(event("a", SyncStatus::Finished, "12 snippets"));
        model.handle_message(event("b", SyncStatus::Aborted, "boom"));
        let mut terminal = Terminal::new(TestBackend::new(40, 6)).unwrap();
        terminal.draw(|frame| model.render(frame, &Theme::default())).unwrap();
        let text: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol().to_string())
            .collect();
        assert!(text.contains("Syncing all managers…"));
        assert!(text.contains("✓ a  12 snippets"));
        assert!(text.contains("✗ b  boom"));
    }
}
