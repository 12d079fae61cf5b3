// src/core/snippet.rs

//! # Snippet Model
//!
//! A uniform, read-only view over a snippet regardless of the manager that produced it.
//! Parameters and formatting are derived from the content, so implementations only
//! provide identity, metadata and the raw text.

use crate::core::{formatter, parameters};
use crate::models::{Language, Parameter, SnippetFormatOptions};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Number of leading lines searched for a title header.
const TITLE_HEADER_WINDOW: usize = 6;

pub trait Snippet: Send + Sync + fmt::Debug {
    fn id(&self) -> &str;
    fn title(&self) -> &str;
    fn tags(&self) -> &[String];
    fn language(&self) -> Language;
    fn content(&self) -> &str;

    /// Content shown in previews. Managers that hide the title header prune it here.
    fn preview(&self) -> String {
        self.content().to_string()
    }

    fn parameters(&self) -> Vec<Parameter> {
        parameters::parse_parameters(self.content())
    }

    fn format(&self, values: &[String], options: &SnippetFormatOptions) -> String {
        formatter::format_snippet(self.content(), values, options)
    }
}

// --- TITLE HEADER ---

/// The `#` / `# <title>` / `#` block at the top of a snippet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleHeader {
    pub title: String,
    /// Index of the first `#` line.
    pub first_line: usize,
    /// Lines between the opening and closing `#` other than the title (e.g. `Filename:`).
    pub extra_lines: Vec<String>,
    /// Index one past the closing `#` line.
    pub end_line: usize,
}

impl TitleHeader {
    /// Returns the value of a `# Key: value` line inside the header block.
    pub fn field(&self, key: &str) -> Option<&str> {
        self.extra_lines.iter().find_map(|line| {
            let rest = line.strip_prefix('#')?.trim();
            let (k, v) = rest.split_once(':')?;
            (k.trim().eq_ignore_ascii_case(key)).then(|| v.trim())
        })
    }
}

/// Finds a title header within the first six lines. The block starts with a bare `#`,
/// is followed by `# <title>` and optional `# Key: value` lines, and ends with a bare `#`.
pub fn parse_title_header(content: &str) -> Option<TitleHeader> {
    let lines: Vec<&str> = content.lines().take(TITLE_HEADER_WINDOW).collect();

    for (start, line) in lines.iter().enumerate() {
        if line.trim_end() != "#" {
            continue;
        }
        let title = lines
            .get(start + 1)
            .and_then(|l| l.strip_prefix("# "))
            .map(str::trim)
            .filter(|t| !t.is_empty());
        let Some(title) = title else {
            continue;
        };

        let mut extra_lines = Vec::new();
        for (offset, candidate) in lines.iter().enumerate().skip(start + 2) {
            if candidate.trim_end() == "#" {
                return Some(TitleHeader {
                    title: title.to_string(),
                    first_line: start,
                    extra_lines,
                    end_line: offset + 1,
                });
            }
            if !candidate.starts_with("# ") {
                break;
            }
            extra_lines.push(candidate.to_string());
        }
    }
    None
}

/// Removes the title header block (if any) from `content`.
pub fn prune_title_header(content: &str) -> String {
    match parse_title_header(content) {
        Some(header) => remove_lines(content, header.first_line, header.end_line),
        None => content.to_string(),
    }
}

/// Removes lines `[from, to)` keeping the original line terminators of the rest.
pub(crate) fn remove_lines(content: &str, from: usize, to: usize) -> String {
    content
        .split_inclusive('\n')
        .enumerate()
        .filter(|(index, _)| *index < from || *index >= to)
        .map(|(_, line)| line)
        .collect()
}

/// Replaces the title of an existing header, or prepends a new header.
pub fn with_title_header(content: &str, title: &str) -> String {
    match parse_title_header(content) {
        Some(header) => content
            .split_inclusive('\n')
            .enumerate()
            .map(|(index, line)| {
                if index == header.first_line + 1 {
                    let terminator = if line.ends_with('\n') { "\n" } else { "" };
                    format!("# {}{}", title, terminator)
                } else {
                    line.to_string()
                }
            })
            .collect(),
        None => {
            // Keep a shebang on the first line.
            if let Some((shebang, rest)) = content.split_once('\n').filter(|(l, _)| l.starts_with("#!")) {
                format!("{}\n#\n# {}\n#\n{}", shebang, title, rest)
            } else {
                format!("#\n# {}\n#\n{}", title, content)
            }
        }
    }
}

// --- IMPLEMENTATIONS ---

/// A snippet whose content is already in memory.
#[derive(Debug, Clone)]
pub struct StaticSnippet {
    pub id: String,
    pub title: String,
    pub tags: Vec<String>,
    pub language: Language,
    pub content: String,
    pub hide_title_in_preview: bool,
}

impl StaticSnippet {
    pub fn new(id: impl Into<String>, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            tags: Vec::new(),
            language: Language::Bash,
            content: content.into(),
            hide_title_in_preview: false,
        }
    }
}

impl Snippet for StaticSnippet {
    fn id(&self) -> &str {
        &self.id
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn tags(&self) -> &[String] {
        &self.tags
    }

    fn language(&self) -> Language {
        self.language
    }

    fn content(&self) -> &str {
        &self.content
    }

    fn preview(&self) -> String {
        if self.hide_title_in_preview {
            prune_title_header(&self.content)
        } else {
            self.content.clone()
        }
    }
}

#[derive(Debug)]
struct LoadedFile {
    title: String,
    content: String,
}

/// A snippet backed by a file. The file is read on first access to its title or content
/// and cached for the lifetime of the value.
#[derive(Debug)]
pub struct FileSnippet {
    id: String,
    path: PathBuf,
    file_name: String,
    tags: Vec<String>,
    hide_title_in_preview: bool,
    loaded: OnceLock<LoadedFile>,
}

impl FileSnippet {
    pub fn new(id: impl Into<String>, path: &Path, hide_title_in_preview: bool) -> Self {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            id: id.into(),
            path: path.to_path_buf(),
            file_name,
            tags: Vec::new(),
            hide_title_in_preview,
            loaded: OnceLock::new(),
        }
    }

    /// Reads the file right away instead of on first access.
    pub fn eager(self) -> Self {
        let _ = self.load();
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> &LoadedFile {
        self.loaded.get_or_init(|| {
            log::trace!("Loading snippet content from '{}'", self.path.display());
            let content = fs::read_to_string(&self.path).unwrap_or_else(|e| {
                log::warn!("Failed to read snippet '{}': {}", self.path.display(), e);
                String::new()
            });
            let title = parse_title_header(&content)
                .map(|h| h.title)
                .unwrap_or_else(|| self.file_name.clone());
            LoadedFile { title, content }
        })
    }
}

impl Snippet for FileSnippet {
    fn id(&self) -> &str {
        &self.id
    }

    fn title(&self) -> &str {
        &self.load().title
    }

    fn tags(&self) -> &[String] {
        &self.tags
    }

    fn language(&self) -> Language {
        Language::from_filename(&self.file_name)
    }

    fn content(&self) -> &str {
        &self.load().content
    }

    fn preview(&self) -> String {
        if self.hide_title_in_preview {
            prune_title_header(self.content())
        } else {
            self.content().to_string()
        }
    }
}
