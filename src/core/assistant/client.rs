// src/core/assistant/client.rs

//! Chat clients for the supported LLM providers. Each one takes the full conversation and
//! returns the text of the first answer.

use super::AssistantError;
use super::providers;
use crate::core::config::model::{ProviderConfig, ProviderKind};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::env;

const ANTHROPIC_VERSION: &str = "2023-06-01";
const ANTHROPIC_MAX_TOKENS: u32 = 4096;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn chat(&self, messages: &[ChatMessage]) -> Result<String, AssistantError>;
}

/// Builds the client for `provider`, reading its API key from the environment.
pub fn build_client(provider: &ProviderConfig) -> Result<Box<dyn ChatClient>, AssistantError> {
    let kind = provider.kind;
    let model = if provider.model.trim().is_empty() {
        providers::default_model(kind)
            .map(str::to_string)
            .ok_or_else(|| AssistantError::InvalidProvider(format!("provider '{}' needs a model", kind)))?
    } else {
        provider.model.trim().to_string()
    };

    let key_env = if provider.api_key_env.is_empty() {
        providers::default_api_key_env(kind).to_string()
    } else {
        provider.api_key_env.clone()
    };
    let api_key = if key_env.is_empty() {
        None
    } else {
        env::var(&key_env).ok().filter(|k| !k.is_empty())
    };
    if api_key.is_none() && providers::requires_api_key(kind) {
        return Err(AssistantError::MissingApiKey(key_env));
    }

    let base_url = match kind {
        ProviderKind::Ollama => provider.server_url.clone().or_else(|| provider.endpoint.clone()),
        _ => provider.endpoint.clone(),
    }
    .or_else(|| providers::default_endpoint(kind).map(str::to_string))
    .ok_or_else(|| AssistantError::InvalidProvider(format!("provider '{}' needs an endpoint", kind)))?;
    let base_url = base_url.trim_end_matches('/').to_string();

    let http = reqwest::Client::builder()
        .user_agent(crate::constants::APP_NAME)
        .build()
        .map_err(|e| AssistantError::InvalidProvider(e.to_string()))?;

    log::debug!("Using {} model '{}' at {}", kind, model, base_url);
    let client: Box<dyn ChatClient> = match kind {
        ProviderKind::OpenAi | ProviderKind::OpenAiCompatible => Box::new(OpenAiClient {
            http,
            base_url,
            model,
            api_key,
        }),
        ProviderKind::Anthropic => Box::new(AnthropicClient {
            http,
            base_url,
            model,
            api_key: api_key.unwrap_or_default(),
        }),
        ProviderKind::Gemini => Box::new(GeminiClient {
            http,
            base_url,
            model,
            api_key: api_key.unwrap_or_default(),
        }),
        ProviderKind::Ollama => Box::new(OllamaClient {
            http,
            base_url,
            model,
        }),
    };
    Ok(client)
}

// --- TRANSPORT HELPERS ---

async fn post_json(request: reqwest::RequestBuilder, body: &Value) -> Result<Value, AssistantError> {
    let response = request
        .json(body)
        .send()
        .await
        .map_err(|e| AssistantError::RequestFailed {
            status: None,
            message: e.to_string(),
        })?;
    let status = response.status();
    let text = response.text().await.map_err(|e| AssistantError::RequestFailed {
        status: Some(status.as_u16()),
        message: e.to_string(),
    })?;
    if !status.is_success() {
        return Err(AssistantError::RequestFailed {
            status: Some(status.as_u16()),
            message: extract_error_message(&text),
        });
    }
    serde_json::from_str(&text).map_err(|e| AssistantError::InvalidResponse(e.to_string()))
}

fn text_at(value: &Value, pointer: &str) -> Result<String, AssistantError> {
    value
        .pointer(pointer)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| AssistantError::InvalidResponse(format!("no text at '{}'", pointer)))
}

/// Best-effort extraction of a readable message from a provider error body.
pub fn extract_error_message(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "empty response body".to_string();
    }
    let Ok(value) = serde_json::from_str::<Value>(trimmed) else {
        return trimmed.to_string();
    };
    let candidates = ["/error/message", "/message", "/error/code", "/code", "/body", "/error"];
    candidates
        .iter()
        .filter_map(|pointer| value.pointer(pointer))
        .find_map(|found| match found {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .unwrap_or_else(|| trimmed.to_string())
}

// --- OPENAI AND COMPATIBLE ---

struct OpenAiClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

#[async_trait]
impl ChatClient for OpenAiClient {
    async fn chat(&self, messages: &[ChatMessage]) -> Result<String, AssistantError> {
        let mut request = self.http.post(format!("{}/chat/completions", self.base_url));
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        let body = json!({ "model": self.model, "messages": messages });
        let response = post_json(request, &body).await?;
        text_at(&response, "/choices/0/message/content")
    }
}

// --- ANTHROPIC ---

struct AnthropicClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

#[async_trait]
impl ChatClient for AnthropicClient {
    async fn chat(&self, messages: &[ChatMessage]) -> Result<String, AssistantError> {
        let system: Vec<&str> = messages
            .iter()
            .filter(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
            .collect();
        let turns: Vec<&ChatMessage> = messages.iter().filter(|m| m.role != Role::System).collect();

        let request = self
            .http
            .post(format!("{}/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION);
        let body = json!({
            "model": self.model,
            "max_tokens": ANTHROPIC_MAX_TOKENS,
            "system": system.join("\n\n"),
            "messages": turns,
        });
        let response = post_json(request, &body).await?;
        response
            .get("content")
            .and_then(Value::as_array)
            .and_then(|parts| {
                parts
                    .iter()
                    .find(|p| p.get("type").and_then(Value::as_str) == Some("text"))
            })
            .and_then(|p| p.get("text"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| AssistantError::InvalidResponse("no text content in answer".to_string()))
    }
}

// --- GEMINI ---

struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

#[async_trait]
impl ChatClient for GeminiClient {
    async fn chat(&self, messages: &[ChatMessage]) -> Result<String, AssistantError> {
        let system: Vec<Value> = messages
            .iter()
            .filter(|m| m.role == Role::System)
            .map(|m| json!({ "text": m.content }))
            .collect();
        let contents: Vec<Value> = messages
            .iter()
            .filter(|m| m.role != Role::System)
            .map(|m| {
                let role = if m.role == Role::Assistant { "model" } else { "user" };
                json!({ "role": role, "parts": [{ "text": m.content }] })
            })
            .collect();

        let request = self
            .http
            .post(format!("{}/models/{}:generateContent", self.base_url, self.model))
            .header("x-goog-api-key", &self.api_key);
        let body = json!({
            "systemInstruction": { "parts": system },
            "contents": contents,
        });
        let response = post_json(request, &body).await?;
        text_at(&response, "/candidates/0/content/parts/0/text")
    }
}

// --- OLLAMA ---

struct OllamaClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
}

#[async_trait]
impl ChatClient for OllamaClient {
    async fn chat(&self, messages: &[ChatMessage]) -> Result<String, AssistantError> {
        let request = self.http.post(format!("{}/api/chat", self.base_url));
        let body = json!({ "model": self.model, "messages": messages, "stream": false });
        let response = post_json(request, &body).await?;
        text_at(&response, "/message/content")
    }
}

// MARK: --- UNIT TESTS ---

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_extract_error_message() {
        assert_eq!(
            extract_error_message(r#"{"error":{"message":"Invalid key","code":"401"}}"#),
            "Invalid key"
        );
        assert_eq!(extract_error_message(r#"{"message":"Rate limited"}"#), "Rate limited");
        assert_eq!(extract_error_message(r#"{"error":{"code":429}}"#), "429");
        assert_eq!(extract_error_message(r#"{"body":"Bad gateway"}"#), "Bad gateway");
        assert_eq!(extract_error_message(r#"{"error":"model not found"}"#), "model not found");
        assert_eq!(extract_error_message(r#"{"status":"weird"}"#), r#"{"status":"weird"}"#);
        assert_eq!(extract_error_message("<html>502</html>"), "<html>502</html>");
        assert_eq!(extract_error_message("  "), "empty response body");
    }

    #[test]
    fn test_messages_serialize_with_lowercase_roles() {
        let json = serde_json::to_string(&ChatMessage::new(Role::Assistant, "hi")).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"hi"}"#);
    }

    #[test]
    fn test_missing_api_key_is_reported() {
        let provider = ProviderConfig {
            kind: ProviderKind::OpenAi,
            enabled: true,
            model: String::new(),
            api_key_env: "SNIPFORGE_TEST_SURELY_UNSET_KEY".to_string(),
            endpoint: None,
            server_url: None,
        };
        let err = build_client(&provider).err().unwrap();
        assert!(matches!(err, AssistantError::MissingApiKey(var) if var == "SNIPFORGE_TEST_SURELY_UNSET_KEY"));
    }

    #[test]
    fn test_ollama_needs_no_key() {
        let provider = providers::default_provider(ProviderKind::Ollama);
        assert!(build_client(&provider).is_ok());
    }

    #[test]
    fn test_compatible_provider_needs_model_and_endpoint() {
        let mut provider = providers::default_provider(ProviderKind::OpenAiCompatible);
        provider.api_key_env = "SNIPFORGE_TEST_SURELY_UNSET_KEY".to_string();
        assert!(matches!(build_client(&provider), Err(AssistantError::InvalidProvider(_))));
        provider.model = "mistral".to_string();
        assert!(matches!(build_client(&provider), Err(AssistantError::InvalidProvider(_))));
        provider.endpoint = Some("http://localhost:8080/v1".to_string());
        assert!(build_client(&provider).is_ok());
    }
}
