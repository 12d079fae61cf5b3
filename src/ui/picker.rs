// src/ui/picker.rs

//! Full-screen snippet picker: a filter line, the ranked list, and a preview pane.

use crate::ui::TerminalSession;
use crate::ui::text_input::TextInput;
use crate::ui::theme::Theme;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use nucleo_matcher::pattern::{AtomKind, CaseMatching, Normalization, Pattern};
use nucleo_matcher::{Config, Matcher, Utf32Str};
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, List, ListItem, ListState, Paragraph, Wrap};
use std::io;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickerItem {
    pub title: String,
    pub tags: Vec<String>,
    pub preview: String,
}

impl PickerItem {
    /// The text the filter runs against.
    fn haystack(&self) -> String {
        if self.tags.is_empty() {
            self.title.clone()
        } else {
            format!("{} {}", self.title, self.tags.join(" "))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickerResult {
    /// Index into the items the picker was built with.
    Selected(usize),
    Cancelled,
}

pub struct PickerModel {
    title: String,
    items: Vec<PickerItem>,
    query: TextInput,
    fuzzy: bool,
    hide_key_map: bool,
    matcher: Matcher,
    /// Indices into `items`, best match first.
    filtered: Vec<usize>,
    selected: usize,
}

impl std::fmt::Debug for PickerModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PickerModel")
            .field("title", &self.title)
            .field("items", &self.items.len())
            .field("query", &self.query)
            .field("fuzzy", &self.fuzzy)
            .field("filtered", &self.filtered)
            .field("selected", &self.selected)
            .finish()
    }
}

impl PickerModel {
    pub fn new(title: impl Into<String>, items: Vec<PickerItem>, fuzzy: bool, hide_key_map: bool) -> Self {
        let mut model = Self {
            title: title.into(),
            filtered: (0..items.len()).collect(),
            items,
            query: TextInput::default(),
            fuzzy,
            hide_key_map,
            matcher: Matcher::new(Config::DEFAULT),
            selected: 0,
        };
        model.refilter();
        model
    }

    pub fn filtered(&self) -> &[usize] {
        &self.filtered
    }

    pub fn current(&self) -> Option<&PickerItem> {
        self.filtered.get(self.selected).and_then(|&i| self.items.get(i))
    }

    fn refilter(&mut self) {
        let query = self.query.value().trim().to_string();
        self.selected = 0;
        if query.is_empty() {
            self.filtered = (0..self.items.len()).collect();
            return;
        }

        if self.fuzzy {
            let pattern = Pattern::new(&query, CaseMatching::Smart, Normalization::Smart, AtomKind::Fuzzy);
            let mut buf = Vec::new();
            let mut scored: Vec<(usize, u32)> = self
                .items
                .iter()
                .enumerate()
                .filter_map(|(i, item)| {
                    let haystack = item.haystack();
                    pattern
                        .score(Utf32Str::new(&haystack, &mut buf), &mut self.matcher)
                        .map(|score| (i, score))
                })
                .collect();
            // Stable sort keeps source order among equal scores.
            scored.sort_by(|a, b| b.1.cmp(&a.1));
            self.filtered = scored.into_iter().map(|(i, _)| i).collect();
        } else {
            let needle = query.to_lowercase();
            self.filtered = self
                .items
                .iter()
                .enumerate()
                .filter(|(_, item)| item.haystack().to_lowercase().contains(&needle))
                .map(|(i, _)| i)
                .collect();
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<PickerResult> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => Some(PickerResult::Cancelled),
            KeyCode::Char('c') if ctrl => Some(PickerResult::Cancelled),
            KeyCode::Enter => self.filtered.get(self.selected).map(|&i| PickerResult::Selected(i)),
            KeyCode::Up => {
                self.selected = self.selected.saturating_sub(1);
                None
            }
            KeyCode::Char('p') if ctrl => {
                self.selected = self.selected.saturating_sub(1);
                None
            }
            KeyCode::Down => {
                self.move_down();
                None
            }
            KeyCode::Char('n') if ctrl => {
                self.move_down();
                None
            }
            _ => {
                if self.query.handle_key(&key) {
                    self.refilter();
                }
                None
            }
        }
    }

    fn move_down(&mut self) {
        if self.selected + 1 < self.filtered.len() {
            self.selected += 1;
        }
    }

    pub fn render(&self, frame: &mut Frame<'_>, theme: &Theme) {
        let area = frame.area();
        let help_height = if self.hide_key_map { 0 } else { 1 };
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(1), Constraint::Length(help_height)])
            .split(area);
        let (Some(&search_area), Some(&body_area), Some(&help_area)) = (rows.first(), rows.get(1), rows.get(2)) else {
            return;
        };

        let search = Paragraph::new(Line::from(vec![
            Span::styled("> ", theme.accent()),
            Span::raw(self.query.value().to_string()),
        ]))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(theme.border())
                .title(Span::styled(
                    format!(" {} ({}/{}) ", self.title, self.filtered.len(), self.items.len()),
                    theme.accent(),
                )),
        );
        frame.render_widget(search, search_area);
        let cursor_x = search_area.x + 3 + u16::try_from(self.query.cursor()).unwrap_or(0);
        frame.set_cursor_position((cursor_x.min(search_area.right().saturating_sub(2)), search_area.y + 1));

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
            .split(body_area);
        let (Some(&list_area), Some(&preview_area)) = (columns.first(), columns.get(1)) else {
            return;
        };

        let items: Vec<ListItem<'_>> = self
            .filtered
            .iter()
            .filter_map(|&i| self.items.get(i))
            .map(|item| {
                let mut spans = vec![Span::raw(item.title.clone())];
                for tag in &item.tags {
                    spans.push(Span::styled(format!(" #{}", tag), theme.muted()));
                }
                ListItem::new(Line::from(spans))
            })
            .collect();
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).border_style(theme.border()))
            .highlight_style(theme.selected());
        let mut state = ListState::default().with_selected((!self.filtered.is_empty()).then_some(self.selected));
        frame.render_stateful_widget(list, list_area, &mut state);

        let preview = Paragraph::new(self.current().map(|i| i.preview.clone()).unwrap_or_default())
            .style(ratatui::style::Style::default().fg(theme.code))
            .wrap(Wrap { trim: false })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(theme.border())
                    .title(Span::styled(" Preview ", theme.muted())),
            );
        frame.render_widget(preview, preview_area);

        if !self.hide_key_map {
            let help = Line::from(Span::styled(
                "↑/↓ move · enter select · esc cancel · type to filter",
                theme.muted(),
            ));
            frame.render_widget(Paragraph::new(help), help_area);
        }
    }
}

/// Runs the picker full screen.
pub fn run(session: &mut TerminalSession, model: &mut PickerModel, theme: &Theme) -> io::Result<PickerResult> {
    loop {
        session.terminal_mut().draw(|frame| model.render(frame, theme))?;
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
