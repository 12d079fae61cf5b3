// src/core/config/model.rs

use crate::constants::CURRENT_CONFIG_VERSION;
use crate::models::{ParamMode, SnippetFormatOptions};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::path::PathBuf;

/// The versioned envelope stored on disk.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ConfigFile {
    pub version: String,
    #[serde(default)]
    pub config: Config,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            version: CURRENT_CONFIG_VERSION.to_string(),
            config: Config::default(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub editor: String,
    pub style: StyleConfig,
    pub fuzzy_search: bool,
    pub secret_storage: SecretStorage,
    pub scripts: ScriptsConfig,
    pub ai: AiConfig,
    pub manager: ManagerConfigs,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            editor: String::new(),
            style: StyleConfig::default(),
            fuzzy_search: true,
            secret_storage: SecretStorage::default(),
            scripts: ScriptsConfig::default(),
            ai: AiConfig::default(),
            manager: ManagerConfigs::default(),
        }
    }
}

impl Config {
    /// The shell used to run scripts: the configured one, else `$SHELL`, else `/bin/sh`.
    pub fn shell(&self) -> String {
        non_empty(&self.scripts.shell)
            .or_else(|| env::var("SHELL").ok().filter(|s| !s.is_empty()))
            .unwrap_or_else(|| "/bin/sh".to_string())
    }

    /// The editor command: the configured one, else `$VISUAL`, `$EDITOR`, then `vim`.
    pub fn editor(&self) -> String {
        non_empty(&self.editor)
            .or_else(|| env::var("VISUAL").ok().filter(|s| !s.is_empty()))
            .or_else(|| env::var("EDITOR").ok().filter(|s| !s.is_empty()))
            .unwrap_or_else(|| "vim".to_string())
    }

    pub fn format_options(&self) -> SnippetFormatOptions {
        SnippetFormatOptions {
            param_mode: self.scripts.parameter_mode,
            remove_comments: self.scripts.remove_comments,
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

// --- STYLE ---

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct StyleConfig {
    pub theme: String,
    pub hide_key_map: bool,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            theme: "default".to_string(),
            hide_key_map: false,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SecretStorage {
    #[default]
    Keyring,
    None,
}

// --- SCRIPTS ---

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct ScriptsConfig {
    pub shell: String,
    pub parameter_mode: ParamMode,
    pub remove_comments: bool,
    pub exec_confirm: bool,
    pub exec_print: bool,
}

impl Default for ScriptsConfig {
    fn default() -> Self {
        Self {
            shell: String::new(),
            parameter_mode: ParamMode::Set,
            remove_comments: false,
            exec_confirm: false,
            exec_print: false,
        }
    }
}

// --- ASSISTANT ---

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct AiConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub save_target: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub providers: Vec<ProviderConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub demo: Option<DemoConfig>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    #[serde(rename = "openai")]
    OpenAi,
    #[serde(rename = "anthropic")]
    Anthropic,
    #[serde(rename = "gemini")]
    Gemini,
    #[serde(rename = "ollama")]
    Ollama,
    #[serde(rename = "openaiCompatible")]
    OpenAiCompatible,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 5] = [
        ProviderKind::OpenAi,
        ProviderKind::Anthropic,
        ProviderKind::Gemini,
        ProviderKind::Ollama,
        ProviderKind::OpenAiCompatible,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::Gemini => "gemini",
            ProviderKind::Ollama => "ollama",
            ProviderKind::OpenAiCompatible => "openaiCompatible",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.key() == key)
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    #[serde(rename = "type")]
    pub kind: ProviderKind,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub model: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub api_key_env: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_url: Option<String>,
}

/// Canned answers used for reproducible demos instead of a live provider.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DemoConfig {
    pub scripts: Vec<PathBuf>,
    #[serde(default = "default_query_delay_ms")]
    pub query_delay_ms: u64,
}

fn default_query_delay_ms() -> u64 {
    1500
}

// --- MANAGERS ---

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ManagerConfigs {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fs_library: Option<FsLibraryConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github_gist: Option<GistConfig>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct FsLibraryConfig {
    pub enabled: bool,
    pub library_path: Vec<String>,
    pub suffix_regex: Vec<String>,
    pub lazy_open: bool,
    pub hide_title_in_preview: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub save_directory: Option<String>,
}

impl Default for FsLibraryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            library_path: vec!["~/snippets".to_string()],
            suffix_regex: vec![r"\.(sh|bash)$".to_string()],
            lazy_open: true,
            hide_title_in_preview: false,
            save_directory: None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum GistAuthentication {
    #[default]
    None,
    Token,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct GistConfig {
    pub enabled: bool,
    pub user: String,
    pub authentication: GistAuthentication,
    pub api_url: String,
    pub hide_title_in_preview: bool,
}

impl Default for GistConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            user: String::new(),
            authentication: GistAuthentication::None,
            api_url: "https://api.github.com".to_string(),
            hide_title_in_preview: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_full_document() {
        let yaml = r#"
version: 1.1.2
config:
  editor: nvim
  style:
    theme: dracula
    hideKeyMap: true
  fuzzySearch: false
  secretStorage: none
  scripts:
    shell: /bin/zsh
    parameterMode: REPLACE
    removeComments: true
  ai:
    saveTarget: fsLibrary
    providers:
      - type: openaiCompatible
        enabled: true
        model: mistral
        apiKeyEnv: MY_KEY
        endpoint: http://localhost:8080/v1
  manager:
    fsLibrary:
      libraryPath: [/tmp/snips]
    githubGist:
      enabled: false
      user: octocat
      authentication: token
"#;
        let file: ConfigFile = serde_yaml::from_str(yaml).unwrap();
        let config = &file.config;
        assert_eq!(file.version, "1.1.2");
        assert_eq!(config.editor(), "nvim");
        assert_eq!(config.style.theme, "dracula");
        assert!(!config.fuzzy_search);
        assert_eq!(config.secret_storage, SecretStorage::None);
        assert_eq!(config.scripts.parameter_mode, ParamMode::Replace);
        assert_eq!(config.shell(), "/bin/zsh");
        let provider = &config.ai.providers[0];
        assert_eq!(provider.kind, ProviderKind::OpenAiCompatible);
        assert_eq!(provider.endpoint.as_deref(), Some("http://localhost:8080/v1"));
        let fs = config.manager.fs_library.as_ref().unwrap();
        assert!(fs.enabled);
        assert_eq!(fs.suffix_regex, vec![r"\.(sh|bash)$"]);
        let gist = config.manager.github_gist.as_ref().unwrap();
        assert_eq!(gist.authentication, GistAuthentication::Token);
        assert_eq!(gist.api_url, "https://api.github.com");
    }

    #[test]
    fn test_unknown_keys_are_tolerated() {
        let yaml = "version: 1.1.2\nconfig:\n  futureFlag: 3\n  style:\n    theme: simple\n";
        let file: ConfigFile = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(file.config.style.theme, "simple");
    }

    #[test]
    fn test_provider_kind_keys() {
        for kind in ProviderKind::ALL {
            assert_eq!(ProviderKind::from_key(kind.key()), Some(kind));
        }
        assert_eq!(ProviderKind::from_key("bard"), None);
    }
}
