// src/ui/form/mod.rs

//! # Form Engine
//!
//! A vertical list of fields plus an `[OK] [Cancel]` button row. Used standalone (full
//! screen, fields revealed one at a time) and embedded as a modal in the assistant chat.

pub mod completion;
pub mod field;

use crate::models::Parameter;
use crate::ui::theme::Theme;
use crate::ui::{self, TerminalSession};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use field::Field;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Clear, Paragraph, Widget};
use std::io;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormResult {
    Submitted(Vec<String>),
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Field(usize),
    Ok,
    Cancel,
}

#[derive(Debug, Clone)]
pub struct FormOptions {
    pub title: String,
    /// `Ctrl+<key>` submits from anywhere.
    pub submit_key: char,
    pub submit_label: String,
    pub show_all_fields: bool,
    pub embedded: bool,
}

impl FormOptions {
    /// Standalone wizard: fields appear as they are reached.
    pub fn standalone(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            submit_key: 'e',
            submit_label: "Execute".to_string(),
            show_all_fields: false,
            embedded: false,
        }
    }

    /// Modal inside another UI: every field is visible at once.
    pub fn embedded(title: impl Into<String>, submit_key: char, submit_label: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            submit_key,
            submit_label: submit_label.into(),
            show_all_fields: true,
            embedded: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FormModel {
    options: FormOptions,
    fields: Vec<Field>,
    focus: Focus,
    /// Highest field index focused so far, for progressive disclosure.
    reached: usize,
}

impl FormModel {
    pub fn new(fields: Vec<Field>, options: FormOptions) -> Self {
        let focus = if fields.is_empty() { Focus::Ok } else { Focus::Field(0) };
        Self {
            options,
            fields,
            focus,
            reached: 0,
        }
    }

    /// One field per parameter, prefilled with `values` (same order as `parameters`).
    pub fn for_parameters(parameters: &[Parameter], values: &[String], options: FormOptions) -> Self {
        let fields = parameters
            .iter()
            .enumerate()
            .map(|(i, p)| Field::from_parameter(p, values.get(i).map(String::as_str).unwrap_or_default()))
            .collect();
        Self::new(fields, options)
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn options(&self) -> &FormOptions {
        &self.options
    }

    pub fn values(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.value().to_string()).collect()
    }

    /// Number of fields currently displayed.
    pub fn visible_fields(&self) -> usize {
        if self.options.show_all_fields || !matches!(self.focus, Focus::Field(_)) {
            return self.fields.len();
        }
        (self.reached + 1).min(self.fields.len())
    }

    fn set_focus(&mut self, focus: Focus) {
        if let Focus::Field(i) = focus {
            self.reached = self.reached.max(i);
        }
        self.focus = focus;
    }

    fn next_focus(&self) -> Focus {
        match self.focus {
            Focus::Field(i) if i + 1 < self.fields.len() => Focus::Field(i + 1),
            Focus::Field(_) => Focus::Ok,
            Focus::Ok => Focus::Cancel,
            Focus::Cancel if self.fields.is_empty() => Focus::Ok,
            Focus::Cancel => Focus::Field(0),
        }
    }

    fn previous_focus(&self) -> Focus {
        match self.focus {
            Focus::Field(0) => Focus::Cancel,
            Focus::Field(i) => Focus::Field(i - 1),
            Focus::Ok => self.last_field_or(Focus::Cancel),
            Focus::Cancel => Focus::Ok,
        }
    }

    fn last_field_or(&self, fallback: Focus) -> Focus {
        self.fields.len().checked_sub(1).map_or(fallback, Focus::Field)
    }

    /// Feeds one key. Returns the result once the form is submitted or cancelled.
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<FormResult> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('c') if ctrl => return Some(FormResult::Cancelled),
            KeyCode::Char(c) if ctrl && c.eq_ignore_ascii_case(&self.options.submit_key) => {
                return Some(FormResult::Submitted(self.values()));
            }
            KeyCode::Esc => return Some(FormResult::Cancelled),
            KeyCode::Tab => {
                self.set_focus(self.next_focus());
                return None;
            }
            KeyCode::BackTab => {
                self.set_focus(self.previous_focus());
                return None;
            }
            _ => {}
        }

        match self.focus {
            Focus::Field(i) => {
                let consumed = self.fields.get_mut(i).is_some_and(|f| f.handle_key(&key));
                if consumed {
                    return None;
                }
                match key.code {
                    KeyCode::Enter | KeyCode::Down => self.set_focus(self.next_focus()),
                    KeyCode::Up if i > 0 => self.set_focus(Focus::Field(i - 1)),
                    _ => {}
                }
                None
            }
            Focus::Ok => match key.code {
                KeyCode::Enter => Some(FormResult::Submitted(self.values())),
                KeyCode::Right | KeyCode::Left => {
                    self.set_focus(Focus::Cancel);
                    None
                }
                KeyCode::Up => {
                    self.set_focus(self.last_field_or(Focus::Ok));
                    None
                }
                _ => None,
            },
            Focus::Cancel => match key.code {
                KeyCode::Enter => Some(FormResult::Cancelled),
                KeyCode::Left | KeyCode::Right => {
                    self.set_focus(Focus::Ok);
                    None
                }
                KeyCode::Up => {
                    self.set_focus(self.last_field_or(Focus::Cancel));
                    None
                }
                _ => None,
            },
        }
    }

    // --- RENDERING ---

    /// Rows needed to draw the form without scrolling.
    pub fn preferred_height(&self) -> u16 {
        let mut rows = 2 + 2; // borders and button row with its spacer
        for (i, field) in self.fields.iter().take(self.visible_fields()).enumerate() {
            rows += 2;
            if !field.description.is_empty() {
                rows += 1;
            }
            if self.focus == Focus::Field(i) {
                rows += field.suggestions().len().min(MAX_DROPDOWN_ROWS);
            }
        }
        u16::try_from(rows).unwrap_or(u16::MAX)
    }

    pub fn render(&self, area: Rect, buf: &mut Buffer, theme: &Theme) {
        Clear.render(area, buf);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme.border())
            .title(Span::styled(format!(" {} ", self.options.title), theme.accent()));
        let inner = block.inner(area);
        block.render(area, buf);

        let mut lines: Vec<Line<'_>> = Vec::new();
        for (i, field) in self.fields.iter().take(self.visible_fields()).enumerate() {
            let focused = self.focus == Focus::Field(i);
            let label_style = if focused { theme.accent() } else { Style::default() };
            lines.push(Line::from(Span::styled(field.label.clone(), label_style)));
            if !field.description.is_empty() {
                lines.push(Line::from(Span::styled(field.description.clone(), theme.muted())));
            }
            let marker = if focused { "> " } else { "  " };
            lines.push(Line::from(vec![
                Span::styled(marker, theme.accent()),
                Span::raw(field.display_value()),
            ]));
            if focused {
                lines.extend(dropdown_lines(field, theme));
            }
        }
        lines.push(Line::default());
        lines.push(self.button_row(theme));

        // Keep the focused field in view when the modal is too short.
        let overflow = lines.len().saturating_sub(usize::from(inner.height));
        let scroll = u16::try_from(overflow).unwrap_or(u16::MAX);
        Paragraph::new(lines).scroll((scroll, 0)).render(inner, buf);
    }

    fn button_row(&self, theme: &Theme) -> Line<'static> {
        let button = |label: String, focused: bool| {
            let style = if focused {
                theme.selected().add_modifier(Modifier::BOLD)
            } else {
                theme.muted()
            };
            Span::styled(format!("[ {} ]", label), style)
        };
        Line::from(vec![
            button(format!("OK (Ctrl+{})", self.options.submit_key.to_ascii_uppercase()), self.focus == Focus::Ok),
            Span::raw("  "),
            button("Cancel (Esc)".to_string(), self.focus == Focus::Cancel),
        ])
    }
}

const MAX_DROPDOWN_ROWS: usize = 6;

fn dropdown_lines(field: &Field, theme: &Theme) -> Vec<Line<'static>> {
    let highlighted = field.highlighted();
    let skip = highlighted.map_or(0, |h| (h + 1).saturating_sub(MAX_DROPDOWN_ROWS));
    field
        .suggestions()
        .iter()
        .enumerate()
        .skip(skip)
        .take(MAX_DROPDOWN_ROWS)
        .map(|(i, suggestion)| {
            let base = if highlighted == Some(i) {
                theme.selected()
            } else {
                theme.muted()
            };
            let mut spans = vec![Span::styled("    ", base)];
            match suggestion.highlight.clone() {
                Some(range) => {
                    let text = &suggestion.text;
                    let (before, matched, after) = (
                        text.get(..range.start).unwrap_or_default(),
                        text.get(range.clone()).unwrap_or_default(),
                        text.get(range.end..).unwrap_or_default(),
                    );
                    spans.push(Span::styled(before.to_string(), base));
                    spans.push(Span::styled(matched.to_string(), base.add_modifier(Modifier::UNDERLINED)));
                    spans.push(Span::styled(after.to_string(), base));
                }
                None => spans.push(Span::styled(suggestion.text.clone(), base)),
            }
            Line::from(spans)
        })
        .collect()
}

// --- STANDALONE RUNNER ---

/// Runs `model` full screen until it is submitted or cancelled.
pub fn run(session: &mut TerminalSession, model: &mut FormModel, theme: &Theme) -> io::Result<FormResult> {
    loop {
        session.terminal_mut().draw(|frame| {
            let area = frame.area();
            let width = area.width.min(90);
            let height = model.preferred_height().min(area.height);
            let rect = ui::overlay::centered(area, width, height);
            model.render(rect, frame.buffer_mut(), theme);
        })?;

        if !event::poll(Duration::from_millis(crate::constants::TICK_RATE_MS))? {
            continue;
        }
        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if let Some(result) = model.handle_key(key) {
                return Ok(result);
            }
        }
    }
}

// MARK: --- UNIT TESTS ---

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use ratatui::layout::Position;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn three_fields(options: FormOptions) -> FormModel {
        FormModel::new(
            vec![Field::new("A", "a"), Field::new("B", "b"), Field::new("C", "c")],
            options,
        )
    }

    #[test]
    fn test_tab_cycles_fields_and_buttons() {
        let mut form = three_fields(FormOptions::standalone("t"));
        let mut seen = vec![form.focus()];
        for _ in 0..5 {
            form.handle_key(key(KeyCode::Tab));
            seen.push(form.focus());
        }
        assert_eq!(
            seen,
            vec![
                Focus::Field(0),
                Focus::Field(1),
                Focus::Field(2),
                Focus::Ok,
                Focus::Cancel,
                Focus::Field(0)
            ]
        );
        form.handle_key(KeyEvent::new(KeyCode::BackTab, KeyModifiers::SHIFT));
        assert_eq!(form.focus(), Focus::Cancel);
    }

    #[test]
    fn test_enter_advances_then_submits() {
        let mut form = three_fields(FormOptions::standalone("t"));
        assert_eq!(form.handle_key(key(KeyCode::Enter)), None);
        assert_eq!(form.handle_key(key(KeyCode::Enter)), None);
        assert_eq!(form.handle_key(key(KeyCode::Enter)), None);
        assert_eq!(form.focus(), Focus::Ok);
        assert_eq!(
            form.handle_key(key(KeyCode::Enter)),
            Some(FormResult::Submitted(vec!["a".into(), "b".into(), "c".into()]))
        );
    }

    #[test]
    fn test_buttons_navigation_and_cancel() {
        let mut form = three_fields(FormOptions::standalone("t"));
        for _ in 0..3 {
            form.handle_key(key(KeyCode::Tab));
        }
        form.handle_key(key(KeyCode::Right));
        assert_eq!(form.focus(), Focus::Cancel);
        form.handle_key(key(KeyCode::Up));
        assert_eq!(form.focus(), Focus::Field(2));
        form.handle_key(key(KeyCode::Tab));
        form.handle_key(key(KeyCode::Tab));
        assert_eq!(form.handle_key(key(KeyCode::Enter)), Some(FormResult::Cancelled));
    }

    #[test]
    fn test_shortcut_and_escape_work_anywhere() {
        let mut form = three_fields(FormOptions::embedded("p", 'e', "Execute"));
        form.handle_key(key(KeyCode::Char('!')));
        assert_eq!(
            form.handle_key(ctrl('e')),
            Some(FormResult::Submitted(vec!["a!".into(), "b".into(), "c".into()]))
        );
        assert_eq!(form.handle_key(key(KeyCode::Esc)), Some(FormResult::Cancelled));
        assert_eq!(form.handle_key(ctrl('a')), None);
    }

    #[test]
    fn test_progressive_disclosure() {
        let mut form = three_fields(FormOptions::standalone("t"));
        assert_eq!(form.visible_fields(), 1);
        form.handle_key(key(KeyCode::Enter));
        assert_eq!(form.visible_fields(), 2);
        form.handle_key(key(KeyCode::Up));
        assert_eq!(form.visible_fields(), 2);

        let embedded = three_fields(FormOptions::embedded("p", 'e', "Execute"));
        assert_eq!(embedded.visible_fields(), 3);
    }

    #[test]
    fn test_enum_pick_submits_chosen_value() {
        let parameter = Parameter {
            values: vec!["dev".into(), "staging".into(), "prod".into()],
            ..Parameter::new("MODE")
        };
        let mut form = FormModel::for_parameters(&[parameter], &[String::new()], FormOptions::standalone("t"));
        assert_eq!(form.fields()[0].suggestions().len(), 3);
        form.handle_key(key(KeyCode::Down));
        form.handle_key(key(KeyCode::Down));
        form.handle_key(key(KeyCode::Enter));
        form.handle_key(key(KeyCode::Enter));
        assert_eq!(
            form.handle_key(key(KeyCode::Enter)),
            Some(FormResult::Submitted(vec!["staging".into()]))
        );
    }

    #[test]
    fn test_empty_form_focuses_ok() {
        let mut form = FormModel::new(Vec::new(), FormOptions::standalone("t"));
        assert_eq!(form.focus(), Focus::Ok);
        form.handle_key(key(KeyCode::Tab));
        form.handle_key(key(KeyCode::Tab));
        assert_eq!(form.focus(), Focus::Ok);
        assert_eq!(form.handle_key(key(KeyCode::Enter)), Some(FormResult::Submitted(Vec::new())));
    }

    #[test]
    fn test_render_shows_labels_and_buttons() {
        let form = three_fields(FormOptions::embedded("Parameters", 'e', "Execute"));
        let area = Rect::new(0, 0, 40, form.preferred_height());
        let mut buf = Buffer::empty(area);
        form.render(area, &mut buf, &Theme::default());
        let text: String = (0..area.height)
            .flat_map(|y| (0..area.width).map(move |x| (x, y)))
            .map(|(x, y)| buf.cell(Position::new(x, y)).unwrap().symbol().to_string())
            .collect();
        assert!(text.contains("Parameters"));
        assert!(text.contains("> a"));
        assert!(text.contains("[ OK (Ctrl+E) ]"));
        assert!(text.contains("[ Cancel (Esc) ]"));
    }
}
