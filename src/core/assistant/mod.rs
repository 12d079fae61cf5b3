// src/core/assistant/mod.rs

//! # Assistant Controller
//!
//! Holds one conversation with the enabled LLM provider. Every turn sends the full history,
//! and each answer is reduced to a [`ParsedScript`]. A demo mode replays canned scripts
//! instead of calling a provider.

pub mod client;
pub mod parse;
pub mod providers;

use crate::core::config::model::AiConfig;
use crate::models::ParsedScript;
use client::{ChatClient, ChatMessage, Role};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Instruction sent as the first message of every conversation.
pub const SYSTEM_PROMPT: &str = "You are a shell scripting assistant. Answer every request with a \
single POSIX shell script inside one ```bash fenced code block and nothing else of substance. \
Start the script with a header comment of exactly this form:\n\
#\n# <short title of the script>\n# Filename: <a-short-kebab-case-name>.sh\n#\n\
When the script needs values from the user, declare each one with hint comments such as \
`# ${VAR} Name: <label>`, `# ${VAR} Description: <text>`, `# ${VAR} Default: <value>`, \
`# ${VAR} Values: a,b,c` or `# ${VAR} Type: PATH`, and reference it as ${VAR}. \
When asked to revise, return the complete updated script.";

/// Filename used when the model did not suggest one: `assistant-<8 hex digits>.sh`.
pub fn default_filename() -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("assistant-{}.sh", id.get(..8).unwrap_or(&id))
}

#[derive(Error, Debug)]
pub enum AssistantError {
    #[error("No assistant provider is enabled. Run `snipforge assistant enable` first.")]
    NoAssistantEnabled,
    #[error("More than one assistant provider is enabled ({}). Run `snipforge assistant enable` to pick one.", .0.join(", "))]
    MultipleProvidersEnabled(Vec<String>),
    #[error("The environment variable '{0}' holding the API key is not set.")]
    MissingApiKey(String),
    #[error("Invalid provider configuration: {0}")]
    InvalidProvider(String),
    #[error("LLM request failed{}: {message}", .status.map(|s| format!(" with status {}", s)).unwrap_or_default())]
    RequestFailed { status: Option<u16>, message: String },
    #[error("Unexpected LLM response: {0}")]
    InvalidResponse(String),
    #[error("Could not read demo script '{path}': {source}")]
    DemoScript {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Demo mode has no scripts configured.")]
    EmptyDemo,
}

enum Backend {
    Live(Box<dyn ChatClient>),
    Demo {
        scripts: Vec<PathBuf>,
        delay: Duration,
        next: usize,
    },
}

pub struct Assistant {
    backend: Backend,
    history: Vec<ChatMessage>,
}

impl std::fmt::Debug for Assistant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Assistant")
            .field("demo", &self.is_demo())
            .field("messages", &self.history.len())
            .finish()
    }
}

impl Assistant {
    /// Resolves the enabled provider and builds its client. A configured demo takes precedence
    /// and never talks to a provider.
    pub fn initialize(ai: &AiConfig) -> Result<Self, AssistantError> {
        if let Some(demo) = &ai.demo {
            log::info!("Assistant running in demo mode with {} script(s)", demo.scripts.len());
            if demo.scripts.is_empty() {
                return Err(AssistantError::EmptyDemo);
            }
            return Ok(Self {
                backend: Backend::Demo {
                    scripts: demo.scripts.clone(),
                    delay: Duration::from_millis(demo.query_delay_ms),
                    next: 0,
                },
                history: Vec::new(),
            });
        }
        let provider = providers::active_provider(ai)?;
        Ok(Self::with_client(client::build_client(provider)?))
    }

    pub fn with_client(client: Box<dyn ChatClient>) -> Self {
        Self {
            backend: Backend::Live(client),
            history: Vec::new(),
        }
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    pub fn is_demo(&self) -> bool {
        matches!(self.backend, Backend::Demo { .. })
    }

    /// Performs one turn. The history keeps the exchange only when the provider answered.
    pub async fn query(&mut self, prompt: &str) -> Result<ParsedScript, AssistantError> {
        match &mut self.backend {
            Backend::Live(client) => {
                if self.history.is_empty() {
                    self.history.push(ChatMessage::new(Role::System, SYSTEM_PROMPT));
                }
                self.history.push(ChatMessage::new(Role::User, prompt));
                match client.chat(&self.history).await {
                    Ok(answer) => {
                        log::debug!("Assistant answered with {} bytes", answer.len());
                        let parsed = parse::parse_response(&answer);
                        self.history.push(ChatMessage::new(Role::Assistant, answer));
                        Ok(parsed)
                    }
                    Err(e) => {
                        self.history.pop();
                        Err(e)
                    }
                }
            }
            Backend::Demo {
                scripts,
                delay,
                next,
            } => {
                // The last script repeats once the list is exhausted.
                let index = (*next).min(scripts.len().saturating_sub(1));
                let path = scripts.get(index).cloned().ok_or(AssistantError::EmptyDemo)?;
                *next += 1;
                tokio::time::sleep(*delay).await;
                let content = fs::read_to_string(&path)
                    .map_err(|source| AssistantError::DemoScript { path, source })?;
                Ok(parse::parse_response(&content))
            }
        }
    }
}

// MARK: --- UNIT TESTS ---

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::core::config::model::DemoConfig;
    use crate::system::runtime;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::{Arc, Mutex};
    use tempfile::tempdir;

    /// Replays canned answers and records every conversation it was sent.
    pub(crate) struct ScriptedClient {
        pub answers: Mutex<Vec<Result<String, AssistantError>>>,
        pub received: Arc<Mutex<Vec<Vec<ChatMessage>>>>,
    }

    impl ScriptedClient {
        pub(crate) fn new(answers: Vec<Result<String, AssistantError>>) -> (Self, Arc<Mutex<Vec<Vec<ChatMessage>>>>) {
            let received = Arc::new(Mutex::new(Vec::new()));
            let mut answers = answers;
            answers.reverse();
            (
                Self {
                    answers: Mutex::new(answers),
                    received: received.clone(),
                },
                received,
            )
        }
    }

    #[async_trait]
    impl ChatClient for ScriptedClient {
        async fn chat(&self, messages: &[ChatMessage]) -> Result<String, AssistantError> {
            self.received.lock().unwrap().push(messages.to_vec());
            self.answers
                .lock()
                .unwrap()
                .pop()
                .unwrap_or(Err(AssistantError::InvalidResponse("no more answers".into())))
        }
    }

    #[test]
    fn test_two_turn_revise_carries_history() {
        let (client, received) = ScriptedClient::new(vec![
            Ok("```bash\necho hello\n```".to_string()),
            Ok("```bash\necho HELLO\n```".to_string()),
        ]);
        let mut assistant = Assistant::with_client(Box::new(client));

        let first = runtime::block_on(assistant.query("print hello")).unwrap().unwrap();
        assert_eq!(first.contents, "echo hello\n");
        let second = runtime::block_on(assistant.query("make it uppercase")).unwrap().unwrap();
        assert_eq!(second.contents, "echo HELLO\n");

        let received = received.lock().unwrap();
        let last = received.last().unwrap();
        let roles: Vec<Role> = last.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::System, Role::User, Role::Assistant, Role::User]);
        assert_eq!(last[1].content, "print hello");
        assert_eq!(last[3].content, "make it uppercase");
        assert_eq!(assistant.history().len(), 5);
    }

    #[test]
    fn test_failed_turn_is_not_kept() {
        let (client, _) = ScriptedClient::new(vec![Err(AssistantError::RequestFailed {
            status: Some(401),
            message: "Invalid key".into(),
        })]);
        let mut assistant = Assistant::with_client(Box::new(client));
        let err = runtime::block_on(assistant.query("hi")).unwrap().unwrap_err();
        assert_eq!(err.to_string(), "LLM request failed with status 401: Invalid key");
        assert_eq!(assistant.history().len(), 1);
    }

    #[test]
    fn test_demo_mode_replays_scripts_and_repeats_last() {
        let dir = tempdir().unwrap();
        let one = dir.path().join("one.sh");
        let two = dir.path().join("two.sh");
        fs::write(&one, "echo one\n").unwrap();
        fs::write(&two, "echo two\n").unwrap();

        let ai = AiConfig {
            demo: Some(DemoConfig {
                scripts: vec![one, two],
                query_delay_ms: 0,
            }),
            ..Default::default()
        };
        let mut assistant = Assistant::initialize(&ai).unwrap();
        assert!(assistant.is_demo());
        let mut answers = Vec::new();
        for prompt in ["a", "b", "c"] {
            answers.push(runtime::block_on(assistant.query(prompt)).unwrap().unwrap().contents);
        }
        assert_eq!(answers, vec!["echo one\n", "echo two\n", "echo two\n"]);
        assert!(assistant.history().is_empty());
    }

    #[test]
    fn test_default_filename_shape() {
        let name = default_filename();
        assert!(name.starts_with("assistant-") && name.ends_with(".sh"));
        assert_eq!(name.len(), "assistant-".len() + 8 + ".sh".len());
    }

    #[test]
    fn test_initialize_without_provider() {
        let err = Assistant::initialize(&AiConfig::default()).err().unwrap();
        assert!(matches!(err, AssistantError::NoAssistantEnabled));
    }
}
