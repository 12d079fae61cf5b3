// src/core/assistant/providers.rs

use super::AssistantError;
use crate::core::config::model::{AiConfig, Config, ProviderConfig, ProviderKind};

pub fn display_name(kind: ProviderKind) -> &'static str {
    match kind {
        ProviderKind::OpenAi => "OpenAI",
        ProviderKind::Anthropic => "Anthropic",
        ProviderKind::Gemini => "Google Gemini",
        ProviderKind::Ollama => "Ollama (local)",
        ProviderKind::OpenAiCompatible => "OpenAI-compatible server",
    }
}

pub fn default_model(kind: ProviderKind) -> Option<&'static str> {
    match kind {
        ProviderKind::OpenAi => Some("gpt-4o"),
        ProviderKind::Anthropic => Some("claude-3-5-sonnet-latest"),
        ProviderKind::Gemini => Some("gemini-1.5-flash"),
        ProviderKind::Ollama => Some("llama3"),
        ProviderKind::OpenAiCompatible => None,
    }
}

/// Empty when the provider takes no key.
pub fn default_api_key_env(kind: ProviderKind) -> &'static str {
    match kind {
        ProviderKind::OpenAi | ProviderKind::OpenAiCompatible => "OPENAI_API_KEY",
        ProviderKind::Anthropic => "ANTHROPIC_API_KEY",
        ProviderKind::Gemini => "GEMINI_API_KEY",
        ProviderKind::Ollama => "",
    }
}

pub fn requires_api_key(kind: ProviderKind) -> bool {
    matches!(
        kind,
        ProviderKind::OpenAi | ProviderKind::Anthropic | ProviderKind::Gemini
    )
}

pub fn default_endpoint(kind: ProviderKind) -> Option<&'static str> {
    match kind {
        ProviderKind::OpenAi => Some("https://api.openai.com/v1"),
        ProviderKind::Anthropic => Some("https://api.anthropic.com/v1"),
        ProviderKind::Gemini => Some("https://generativelanguage.googleapis.com/v1beta"),
        ProviderKind::Ollama => Some("http://localhost:11434"),
        ProviderKind::OpenAiCompatible => None,
    }
}

/// A disabled provider entry carrying the canonical defaults.
pub fn default_provider(kind: ProviderKind) -> ProviderConfig {
    ProviderConfig {
        kind,
        enabled: false,
        model: default_model(kind).unwrap_or_default().to_string(),
        api_key_env: default_api_key_env(kind).to_string(),
        endpoint: None,
        server_url: (kind == ProviderKind::Ollama)
            .then(|| default_endpoint(kind).unwrap_or_default().to_string()),
    }
}

/// The single enabled provider.
pub fn active_provider(ai: &AiConfig) -> Result<&ProviderConfig, AssistantError> {
    let enabled: Vec<&ProviderConfig> = ai.providers.iter().filter(|p| p.enabled).collect();
    match enabled.as_slice() {
        [] => Err(AssistantError::NoAssistantEnabled),
        [provider] => Ok(*provider),
        many => Err(AssistantError::MultipleProvidersEnabled(
            many.iter().map(|p| p.kind.to_string()).collect(),
        )),
    }
}

/// Returns a copy of `config` where `kind` is the only enabled provider, appending a default
/// entry when the provider is not listed yet.
pub fn auto_config(config: &Config, kind: ProviderKind) -> Config {
    let mut updated = config.clone();
    let providers = &mut updated.ai.providers;
    if !providers.iter().any(|p| p.kind == kind) {
        providers.push(default_provider(kind));
    }
    let mut enabled_one = false;
    for provider in providers.iter_mut() {
        // Duplicate entries of the same kind: only the first one is enabled.
        provider.enabled = provider.kind == kind && !enabled_one;
        enabled_one |= provider.enabled;
    }
    updated
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_active_provider_rules() {
        let mut ai = AiConfig::default();
        assert!(matches!(active_provider(&ai), Err(AssistantError::NoAssistantEnabled)));

        ai.providers.push(default_provider(ProviderKind::OpenAi));
        ai.providers.push(default_provider(ProviderKind::Ollama));
        assert!(matches!(active_provider(&ai), Err(AssistantError::NoAssistantEnabled)));

        ai.providers[1].enabled = true;
        assert_eq!(active_provider(&ai).unwrap().kind, ProviderKind::Ollama);

        ai.providers[0].enabled = true;
        assert!(matches!(
            active_provider(&ai),
            Err(AssistantError::MultipleProvidersEnabled(kinds)) if kinds.len() == 2
        ));
    }

    #[test]
    fn test_auto_config_appends_and_enables_exactly_one() {
        let mut config = Config::default();
        config.ai.providers.push(ProviderConfig {
            enabled: true,
            ..default_provider(ProviderKind::OpenAi)
        });

        let updated = auto_config(&config, ProviderKind::Anthropic);
        assert_eq!(updated.ai.providers.len(), 2);
        let enabled: Vec<ProviderKind> = updated
            .ai
            .providers
            .iter()
            .filter(|p| p.enabled)
            .map(|p| p.kind)
            .collect();
        assert_eq!(enabled, vec![ProviderKind::Anthropic]);
        assert_eq!(updated.ai.providers[1].model, "claude-3-5-sonnet-latest");

        let again = auto_config(&updated, ProviderKind::OpenAi);
        assert_eq!(again.ai.providers.len(), 2);
        assert_eq!(active_provider(&again.ai).unwrap().kind, ProviderKind::OpenAi);
    }
}
