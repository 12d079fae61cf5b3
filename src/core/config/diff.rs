// src/core/config/diff.rs

//! # Config Diff Renderer
//!
//! Line diff of two YAML documents, compressed to the changes plus three lines of context,
//! rendered as two boxed columns. Small documents are shown as a single "new configuration"
//! column instead, since a side-by-side view of a near-empty file says nothing.

use colored::*;
use similar::{DiffTag, TextDiff};
use unicode_width::UnicodeWidthChar;

/// Unchanged lines kept around each change.
pub const CONTEXT_LINES: usize = 3;

/// Below this many meaningful lines on either side, the single-column view is used.
const MIN_MEANINGFUL_LINES: usize = 5;

const DEFAULT_WIDTH: usize = 100;
const MAX_COLUMN_WIDTH: usize = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffKind {
    Context,
    Added,
    Removed,
    Modified,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffLine {
    pub kind: DiffKind,
    pub old: Option<(usize, String)>,
    pub new: Option<(usize, String)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffRow {
    Line(DiffLine),
    Collapsed(usize),
}

/// Classifies every line of `old` and `new`. Replaced blocks are paired line by line as
/// `Modified`; any surplus on either side becomes `Removed` or `Added`.
pub fn diff_lines(old: &str, new: &str) -> Vec<DiffLine> {
    let diff = TextDiff::from_lines(old, new);
    let old_lines: Vec<&str> = old.lines().collect();
    let new_lines: Vec<&str> = new.lines().collect();
    let old_at = |i: usize| Some((i + 1, old_lines.get(i).copied().unwrap_or_default().to_string()));
    let new_at = |i: usize| Some((i + 1, new_lines.get(i).copied().unwrap_or_default().to_string()));

    let mut lines = Vec::new();
    for op in diff.ops() {
        let (tag, old_range, new_range) = op.as_tag_tuple();
        match tag {
            DiffTag::Equal => {
                for (o, n) in old_range.zip(new_range) {
                    lines.push(DiffLine {
                        kind: DiffKind::Context,
                        old: old_at(o),
                        new: new_at(n),
                    });
                }
            }
            DiffTag::Delete => {
                for o in old_range {
                    lines.push(DiffLine {
                        kind: DiffKind::Removed,
                        old: old_at(o),
                        new: None,
                    });
                }
            }
            DiffTag::Insert => {
                for n in new_range {
                    lines.push(DiffLine {
                        kind: DiffKind::Added,
                        old: None,
                        new: new_at(n),
                    });
                }
            }
            DiffTag::Replace => {
                let paired = old_range.len().min(new_range.len());
                let mut olds = old_range.clone();
                let mut news = new_range.clone();
                for _ in 0..paired {
                    lines.push(DiffLine {
                        kind: DiffKind::Modified,
                        old: olds.next().and_then(old_at),
                        new: news.next().and_then(new_at),
                    });
                }
                for o in olds {
                    lines.push(DiffLine {
                        kind: DiffKind::Removed,
                        old: old_at(o),
                        new: None,
                    });
                }
                for n in news {
                    lines.push(DiffLine {
                        kind: DiffKind::Added,
                        old: None,
                        new: new_at(n),
                    });
                }
            }
        }
    }
    lines
}

/// Keeps `context` unchanged lines around each change and folds longer unchanged runs.
pub fn compress(lines: Vec<DiffLine>, context: usize) -> Vec<DiffRow> {
    let changed: Vec<usize> = lines
        .iter()
        .enumerate()
        .filter(|(_, l)| l.kind != DiffKind::Context)
        .map(|(i, _)| i)
        .collect();
    let near_change = |index: usize| {
        changed
            .iter()
            .any(|&c| index + context >= c && index <= c + context)
    };

    let mut rows = Vec::new();
    let mut folded = 0;
    for (index, line) in lines.into_iter().enumerate() {
        if line.kind == DiffKind::Context && !near_change(index) {
            folded += 1;
            continue;
        }
        if folded > 0 {
            rows.push(DiffRow::Collapsed(folded));
            folded = 0;
        }
        rows.push(DiffRow::Line(line));
    }
    if folded > 0 {
        rows.push(DiffRow::Collapsed(folded));
    }
    rows
}

/// Lines that are neither blank nor comments.
pub fn meaningful_lines(text: &str) -> usize {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .count()
}

pub fn has_changes(old: &str, new: &str) -> bool {
    old != new
}

/// Renders the diff for the terminal.
pub fn render(old: &str, new: &str) -> String {
    let width = crossterm::terminal::size()
        .map(|(w, _)| w as usize)
        .unwrap_or(DEFAULT_WIDTH);
    render_with_width(old, new, width)
}

pub fn render_with_width(old: &str, new: &str, width: usize) -> String {
    if meaningful_lines(old) < MIN_MEANINGFUL_LINES || meaningful_lines(new) < MIN_MEANINGFUL_LINES {
        return render_single_column(new, width);
    }
    let rows = compress(diff_lines(old, new), CONTEXT_LINES);
    render_two_columns(&rows, width)
}

fn render_single_column(new: &str, width: usize) -> String {
    let inner = width.saturating_sub(4).clamp(20, MAX_COLUMN_WIDTH * 2);
    let mut out = String::new();
    out.push_str(&format!("┌{}┐\n", "─".repeat(inner + 2)));
    out.push_str(&format!("│ {} │\n", pad(&"New configuration".bold().to_string(), "New configuration", inner)));
    out.push_str(&format!("├{}┤\n", "─".repeat(inner + 2)));
    for line in new.lines() {
        let text = fit(line, inner);
        out.push_str(&format!("│ {} │\n", pad(&text.green().to_string(), &text, inner)));
    }
    out.push_str(&format!("└{}┘\n", "─".repeat(inner + 2)));
    out
}

fn render_two_columns(rows: &[DiffRow], width: usize) -> String {
    // "│ nnnn text │ nnnn text │"
    let column = (width.saturating_sub(7) / 2).clamp(20, MAX_COLUMN_WIDTH);
    let text_width = column.saturating_sub(5);
    let bar = "─".repeat(column + 2);

    let mut out = String::new();
    out.push_str(&format!("┌{}┬{}┐\n", bar, bar));
    out.push_str(&format!(
        "│ {} │ {} │\n",
        pad(&"Current".bold().to_string(), "Current", column),
        pad(&"Proposed".bold().to_string(), "Proposed", column)
    ));
    out.push_str(&format!("├{}┼{}┤\n", bar, bar));

    for row in rows {
        match row {
            DiffRow::Collapsed(count) => {
                let marker = format!("... ({} lines unchanged)", count);
                let plain = fit(&marker, column);
                out.push_str(&format!(
                    "│ {} │ {} │\n",
                    pad(&plain.dimmed().to_string(), &plain, column),
                    pad(&plain.dimmed().to_string(), &plain, column)
                ));
            }
            DiffRow::Line(line) => {
                let left = cell(line.old.as_ref(), text_width);
                let right = cell(line.new.as_ref(), text_width);
                let (left_styled, right_styled) = match line.kind {
                    DiffKind::Context => (left.dimmed(), right.dimmed()),
                    DiffKind::Added => (left.normal(), right.green()),
                    DiffKind::Removed => (left.red(), right.normal()),
                    DiffKind::Modified => (left.red(), right.green()),
                };
                out.push_str(&format!(
                    "│ {} │ {} │\n",
                    pad(&left_styled.to_string(), &left, column),
                    pad(&right_styled.to_string(), &right, column)
                ));
            }
        }
    }
    out.push_str(&format!("└{}┴{}┘\n", bar, bar));
    out
}

fn cell(line: Option<&(usize, String)>, text_width: usize) -> String {
    match line {
        Some((number, text)) => format!("{:>4} {}", number, fit(text, text_width)),
        None => String::new(),
    }
}

/// Truncates `text` to `width` display columns.
fn fit(text: &str, width: usize) -> String {
    let mut used = 0;
    let mut out = String::new();
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > width {
            break;
        }
        used += w;
        out.push(c);
    }
    out
}

/// Pads a styled string using the display width of its plain counterpart.
fn pad(styled: &str, plain: &str, width: usize) -> String {
    let used: usize = plain.chars().map(|c| c.width().unwrap_or(0)).sum();
    format!("{}{}", styled, " ".repeat(width.saturating_sub(used)))
}

// MARK: --- UNIT TESTS ---
