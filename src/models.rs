// src/models.rs

use chrono::{DateTime, Local};
use crossbeam_channel::Sender;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

// --- SNIPPET MODELS ---

/// The language of a snippet, derived from its file extension.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Bash,
    Yaml,
    Markdown,
    Toml,
    #[default]
    Unknown,
}

impl Language {
    /// Maps a file name (or bare extension) to a language using the fixed extension table.
    pub fn from_filename(name: &str) -> Self {
        let extension = name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        match extension.as_str() {
            "sh" => Language::Bash,
            "yaml" | "yml" => Language::Yaml,
            "md" => Language::Markdown,
            "toml" => Language::Toml,
            _ => Language::Unknown,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Language::Bash => "bash",
            Language::Yaml => "yaml",
            Language::Markdown => "markdown",
            Language::Toml => "toml",
            Language::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// The widget a parameter is collected with.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum ParameterType {
    #[default]
    Value,
    Path,
    Password,
}

impl ParameterType {
    /// Parses the value of a `Type:` hint. Anything unknown is treated as a plain value.
    pub fn from_hint(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "PATH" => ParameterType::Path,
            "PASSWORD" => ParameterType::Password,
            _ => ParameterType::Value,
        }
    }
}

impl fmt::Display for ParameterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ParameterType::Value => "VALUE",
            ParameterType::Path => "PATH",
            ParameterType::Password => "PASSWORD",
        };
        f.write_str(name)
    }
}

/// A named placeholder declared by hint comments inside a snippet.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct Parameter {
    pub key: String,
    pub name: String,
    pub description: String,
    #[serde(rename = "default")]
    pub default_value: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,
    #[serde(rename = "type")]
    pub param_type: ParameterType,
}

impl Parameter {
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            name: key.clone(),
            key,
            ..Default::default()
        }
    }
}

/// A `KEY=VALUE` pair supplied out-of-band (e.g. `--param`) and merged over parsed defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterValue {
    pub key: String,
    pub value: String,
}

impl std::str::FromStr for ParameterValue {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (key, value) = s
            .split_once('=')
            .ok_or_else(|| format!("Invalid parameter '{}', expected KEY=VALUE.", s))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(format!("Invalid parameter '{}', the key is empty.", s));
        }
        Ok(Self {
            key: key.to_string(),
            value: value.to_string(),
        })
    }
}

/// How parameter values are put back into a snippet.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum ParamMode {
    /// Inject `VAR="value"` assignments after each parameter's last hint.
    #[default]
    Set,
    /// Remove every hint line and substitute `${VAR}` occurrences inline.
    Replace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SnippetFormatOptions {
    pub param_mode: ParamMode,
    pub remove_comments: bool,
}

// --- MANAGER MODELS ---

/// One diagnostic line printed by `info`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerInfoLine {
    pub key: String,
    pub value: String,
}

impl ManagerInfoLine {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A catalog entry describing a manager kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerDescription {
    pub key: String,
    pub name: String,
    pub description: String,
    pub enabled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    Started,
    Finished,
    Aborted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncInputType {
    Text,
    ContinueKeypress,
}

/// The answer the sync screen sends back to a manager waiting on an interactive prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncReply {
    Text(String),
    Continue,
    Abort,
}

/// A prompt raised by a manager in the middle of a sync.
#[derive(Debug, Clone)]
pub struct InteractiveInput {
    pub content: String,
    pub input_type: SyncInputType,
    pub reply: Sender<SyncReply>,
}

#[derive(Debug, Clone)]
pub struct SyncEvent {
    pub status: SyncStatus,
    pub lines: Vec<String>,
    pub input: Option<InteractiveInput>,
}

impl SyncEvent {
    pub fn new(status: SyncStatus, line: impl Into<String>) -> Self {
        Self {
            status,
            lines: vec![line.into()],
            input: None,
        }
    }

    pub fn with_input(mut self, input: InteractiveInput) -> Self {
        self.input = Some(input);
        self
    }
}

// --- ASSISTANT MODELS ---

/// The script extracted from one assistant answer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedScript {
    pub contents: String,
    pub title: Option<String>,
    pub filename: Option<String>,
}

/// One completed turn of an assistant session.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub user_prompt: String,
    pub generated_script: String,
    pub script_filename: Option<String>,
    pub script_title: Option<String>,
    pub execution_output: Option<String>,
    pub exit_code: Option<i32>,
    pub duration: Option<Duration>,
    pub execution_time: Option<DateTime<Local>>,
}

impl HistoryEntry {
    pub fn new(user_prompt: impl Into<String>, script: &ParsedScript) -> Self {
        Self {
            user_prompt: user_prompt.into(),
            generated_script: script.contents.clone(),
            script_filename: script.filename.clone(),
            script_title: script.title.clone(),
            execution_output: None,
            exit_code: None,
            duration: None,
            execution_time: None,
        }
    }

    pub fn was_executed(&self) -> bool {
        self.execution_time.is_some()
    }
}
