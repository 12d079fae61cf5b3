// src/ui/chat/render.rs

use super::{ChatModel, EntryKind, Modal, Mode};
use crate::constants::RESPONSIVE_PADDING_MIN_WIDTH;
use crate::ui::form::FormModel;
use crate::ui::overlay;
use crate::ui::spinner_frame;
use crate::ui::theme::Theme;
use ratatui::Frame;
use ratatui::buffer::Buffer;
use ratatui::layout::{Position, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Clear, Paragraph, Widget};
use unicode_width::UnicodeWidthChar;

/// Screen regions of the chat, top to bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChatLayout {
    pub title: Rect,
    pub viewport: Rect,
    pub bar: Rect,
    pub help: Rect,
}

fn bar_height(mode: Mode) -> u16 {
    match mode {
        Mode::Input => 3,
        Mode::Generating | Mode::ScriptReady | Mode::PostExecution => 1,
    }
}

/// Splits `area` for `mode`. Wide terminals get one column of padding on each side.
pub fn layout(area: Rect, mode: Mode, hide_key_map: bool) -> ChatLayout {
    let area = if area.width >= RESPONSIVE_PADDING_MIN_WIDTH {
        Rect::new(area.x + 1, area.y, area.width - 2, area.height)
    } else {
        area
    };
    let help_height: u16 = if hide_key_map { 0 } else { 1 };
    let title_height = 1u16.min(area.height);
    let bar = bar_height(mode).min(area.height.saturating_sub(title_height));
    let help_height = help_height.min(area.height.saturating_sub(title_height + bar));
    let viewport_height = area.height.saturating_sub(title_height + bar + help_height);

    let title = Rect::new(area.x, area.y, area.width, title_height);
    let viewport = Rect::new(area.x, title.bottom(), area.width, viewport_height);
    let bar = Rect::new(area.x, viewport.bottom(), area.width, bar);
    let help = Rect::new(area.x, bar.bottom(), area.width, help_height);
    ChatLayout {
        title,
        viewport,
        bar,
        help,
    }
}

pub(super) fn draw(frame: &mut Frame<'_>, model: &ChatModel, theme: &Theme) {
    let regions = layout(frame.area(), model.mode, model.hide_key_map);

    let title = Line::from(vec![
        Span::styled(" snipforge ", theme.selected().add_modifier(Modifier::BOLD)),
        Span::styled(" assistant", theme.accent()),
    ]);
    frame.render_widget(Paragraph::new(title), regions.title);

    draw_conversation(frame, model, theme, regions.viewport);
    draw_bar(frame, model, theme, regions.bar);
    if regions.help.height > 0 {
        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(help_text(model), theme.muted()))),
            regions.help,
        );
    }

    match &model.modal {
        Modal::None => {}
        Modal::Parameters(form) | Modal::Save(form) => draw_form_modal(frame, form, theme),
        Modal::Executing => draw_executing(frame, model, theme),
    }
}

// --- Conversation ---

fn conversation_lines(model: &ChatModel, theme: &Theme, width: u16) -> Vec<Line<'static>> {
    let width = usize::from(width.max(1));
    let mut lines: Vec<Line<'static>> = Vec::new();
    let push_wrapped = |lines: &mut Vec<Line<'static>>, text: &str, prefix: &str, style: Style| {
        for raw in text.lines() {
            for chunk in wrap(raw, width.saturating_sub(prefix.chars().count()).max(1)) {
                lines.push(Line::from(vec![
                    Span::styled(prefix.to_string(), style),
                    Span::styled(chunk, style),
                ]));
            }
        }
    };

    for (i, entry) in model.messages.iter().enumerate() {
        if i > 0 {
            lines.push(Line::default());
        }
        match &entry.kind {
            EntryKind::User => push_wrapped(&mut lines, &entry.text, "› ", theme.accent()),
            EntryKind::Script { title, filename } => {
                let mut header = String::from("Script");
                if let Some(title) = title {
                    header.push_str(": ");
                    header.push_str(title);
                }
                if let Some(filename) = filename {
                    header.push_str(&format!(" ({})", filename));
                }
                lines.push(Line::from(Span::styled(header, theme.accent())));
                push_wrapped(&mut lines, &entry.text, "  ", Style::default().fg(theme.code));
            }
            EntryKind::Output { exit_code, duration } => {
                let (status, style) = match exit_code {
                    Some(0) => ("exit 0".to_string(), Style::default().fg(theme.success)),
                    Some(code) => (format!("exit {}", code), Style::default().fg(theme.error)),
                    None => ("terminated".to_string(), Style::default().fg(theme.error)),
                };
                lines.push(Line::from(Span::styled(
                    format!("Output ({}, {}ms)", status, duration.as_millis()),
                    style.add_modifier(Modifier::BOLD),
                )));
                push_wrapped(&mut lines, &entry.text, "  ", Style::default().fg(theme.text));
            }
            EntryKind::Info => push_wrapped(&mut lines, &entry.text, "", theme.muted()),
            EntryKind::Error => push_wrapped(&mut lines, &entry.text, "✗ ", Style::default().fg(theme.error)),
        }
    }

    if model.mode == Mode::Generating {
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            format!("{} Generating…", spinner_frame(model.spinner)),
            theme.accent(),
        )));
    }
    lines
}

fn draw_conversation(frame: &mut Frame<'_>, model: &ChatModel, theme: &Theme, area: Rect) {
    if area.height == 0 {
        return;
    }
    let lines = conversation_lines(model, theme, area.width);
    let height = usize::from(area.height);
    let max_back = lines.len().saturating_sub(height);
    let start = max_back.saturating_sub(model.scroll_back.min(max_back));
    let visible: Vec<Line<'static>> = lines.into_iter().skip(start).take(height).collect();
    frame.render_widget(Paragraph::new(visible), area);
}

/// Breaks `text` into chunks no wider than `width` terminal cells.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > width && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            used = 0;
        }
        current.push(c);
        used += w;
    }
    chunks.push(current);
    chunks
}

// --- Bottom bar ---

fn draw_bar(frame: &mut Frame<'_>, model: &ChatModel, theme: &Theme, area: Rect) {
    if area.height == 0 {
        return;
    }
    match model.mode {
        Mode::Input => {
            let block = Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(theme.border());
            let inner = block.inner(area);
            let prompt = Paragraph::new(Line::from(vec![
                Span::styled("> ", theme.accent()),
                Span::raw(model.input.value().to_string()),
            ]))
            .block(block);
            frame.render_widget(prompt, area);
            if matches!(model.modal, Modal::None) && inner.height > 0 {
                let cursor = u16::try_from(model.input.cursor()).unwrap_or(0);
                let x = (inner.x + 2 + cursor).min(inner.right().saturating_sub(1));
                frame.set_cursor_position((x, inner.y));
            }
        }
        Mode::Generating => {
            let line = Line::from(Span::styled(
                format!("{} Waiting for the assistant…", spinner_frame(model.spinner)),
                theme.muted(),
            ));
            frame.render_widget(Paragraph::new(line), area);
        }
        Mode::ScriptReady | Mode::PostExecution => {
            let mut spans = Vec::new();
            for (i, action) in model.actions().iter().enumerate() {
                if i > 0 {
                    spans.push(Span::raw("  "));
                }
                let style = if i == model.selected {
                    theme.selected().add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(theme.text)
                };
                spans.push(Span::styled(
                    format!("[{}] {}", action.shortcut().to_ascii_uppercase(), action.label()),
                    style,
                ));
            }
            frame.render_widget(Paragraph::new(Line::from(spans)), area);
        }
    }
}

fn help_text(model: &ChatModel) -> &'static str {
    match (&model.modal, model.mode) {
        (Modal::Parameters(_), _) => "tab next field · ctrl+e execute · esc close",
        (Modal::Save(_), _) => "tab next field · ctrl+s save · esc close",
        (Modal::Executing, _) => "ctrl+c quit",
        (Modal::None, Mode::Input) => "enter send · pgup/pgdn scroll · esc quit",
        (Modal::None, Mode::Generating) => "esc cancel",
        (Modal::None, _) => "←/→ choose · enter confirm · letter shortcut · ↑/↓ scroll · ctrl+c quit",
    }
}

// --- Modals ---

fn draw_form_modal(frame: &mut Frame<'_>, form: &FormModel, theme: &Theme) {
    let area = frame.area();
    let width = area.width.saturating_sub(4).min(72);
    let height = form.preferred_height().min(area.height.saturating_sub(2));
    let target = overlay::centered(area, width, height);
    if target.width == 0 || target.height == 0 {
        return;
    }
    let mut modal = Buffer::empty(Rect::new(0, 0, target.width, target.height));
    form.render(modal.area, &mut modal, theme);
    overlay::compose(frame.buffer_mut(), &modal, Position::new(target.x, target.y));
}

fn draw_executing(frame: &mut Frame<'_>, model: &ChatModel, theme: &Theme) {
    let target = overlay::centered(frame.area(), 30, 3);
    if target.width == 0 || target.height == 0 {
        return;
    }
    let mut modal = Buffer::empty(Rect::new(0, 0, target.width, target.height));
    Clear.render(modal.area, &mut modal);
    Paragraph::new(Line::from(Span::styled(
        format!("{} Executing…", spinner_frame(model.spinner)),
        theme.accent(),
    )))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme.border()),
    )
    .render(modal.area, &mut modal);
    overlay::compose(frame.buffer_mut(), &modal, Position::new(target.x, target.y));
}

// MARK: --- UNIT TESTS ---

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ParsedScript;
    use crate::ui::chat::ChatEvent;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use pretty_assertions::assert_eq;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn screen_text(model: &ChatModel, width: u16, height: u16) -> Vec<String> {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|frame| draw(frame, model, &Theme::default())).unwrap();
        let buffer = terminal.backend().buffer().clone();
        (0..height)
            .map(|y| {
                (0..width)
                    .map(|x| buffer.cell(Position::new(x, y)).unwrap().symbol().to_string())
                    .collect::<String>()
            })
            .collect()
    }

    #[test]
    fn test_layout_pads_wide_terminals() {
        let narrow = layout(Rect::new(0, 0, 80, 24), Mode::Input, false);
        assert_eq!(narrow.viewport, Rect::new(0, 1, 80, 19));
        assert_eq!(narrow.bar.height, 3);
        assert_eq!(narrow.help, Rect::new(0, 23, 80, 1));

        let wide = layout(Rect::new(0, 0, 120, 24), Mode::ScriptReady, true);
        assert_eq!(wide.viewport, Rect::new(1, 1, 118, 22));
        assert_eq!(wide.help.height, 0);
    }

    #[test]
    fn test_wrap_respects_cell_width() {
        assert_eq!(wrap("abcdef", 4), vec!["abcd".to_string(), "ef".to_string()]);
        assert_eq!(wrap("日本語", 4), vec!["日本".to_string(), "語".to_string()]);
        assert_eq!(wrap("", 4), vec![String::new()]);
    }

    #[test]
    fn test_modal_leaves_conversation_visible() {
        let mut model = ChatModel::new(false);
        model.start_generating("say hi");
        model.handle(ChatEvent::ScriptReady(Ok(ParsedScript {
            contents: "# ${WHO} Name: Who\necho hi $WHO\n".to_string(),
            title: Some("Hi".to_string()),
            filename: None,
        })));
        model.handle(ChatEvent::Key(KeyEvent::new(KeyCode::Char('e'), KeyModifiers::NONE)));
        assert!(matches!(model.modal, Modal::Parameters(_)));

        let rows = screen_text(&model, 80, 24);
        let all = rows.join("\n");
        assert!(rows.first().unwrap().contains("snipforge"));
        assert!(all.contains("› say hi"));
        assert!(all.contains("Parameters"));
        assert!(all.contains("OK (Ctrl+E)"));
        assert!(all.contains("[E] Execute"));
    }

    #[test]
    fn test_generating_shows_spinner() {
        let mut model = ChatModel::new(true);
        model.start_generating("x");
        let all = screen_text(&model, 60, 10).join("\n");
        assert!(all.contains("Generating…"));
        assert!(all.contains("Waiting for the assistant…"));
    }
}
