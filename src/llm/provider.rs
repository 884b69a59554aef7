//! Provider identity and credential selection.

use std::env;
use std::fmt;

use serde::Serialize;

use crate::error::LlmError;

/// Supported LLM providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Groq,
    OpenAi,
    Anthropic,
    Gemini,
}

impl Provider {
    /// Credential lookup order: the first provider with a key wins.
    pub const PRIORITY: [Provider; 4] = [
        Provider::Groq,
        Provider::OpenAi,
        Provider::Anthropic,
        Provider::Gemini,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Groq => "Groq",
            Provider::OpenAi => "OpenAI",
            Provider::Anthropic => "Anthropic",
            Provider::Gemini => "Gemini",
        }
    }

    /// Environment variable holding the API key.
    pub fn api_key_var(&self) -> &'static str {
        match self {
            Provider::Groq => "GROQ_API_KEY",
            Provider::OpenAi => "OPENAI_API_KEY",
            Provider::Anthropic => "ANTHROPIC_API_KEY",
            Provider::Gemini => "GEMINI_API_KEY",
        }
    }

    /// Environment variable naming a preferred model.
    pub fn model_var(&self) -> &'static str {
        match self {
            Provider::Groq => "GROQ_MODEL",
            Provider::OpenAi => "OPENAI_MODEL",
            Provider::Anthropic => "ANTHROPIC_MODEL",
            Provider::Gemini => "GEMINI_MODEL",
        }
    }

    /// Built-in candidate models, best first.
    pub fn default_models(&self) -> &'static [&'static str] {
        match self {
            Provider::Groq => &[
                "llama-3.3-70b-versatile",
                "llama-3.1-8b-instant",
                "gemma2-9b-it",
            ],
            Provider::OpenAi => &["gpt-4o-mini", "gpt-4o", "gpt-3.5-turbo"],
            Provider::Anthropic => &[
                "claude-3-5-haiku-latest",
                "claude-3-5-sonnet-latest",
                "claude-3-haiku-20240307",
            ],
            Provider::Gemini => &["gemini-1.5-flash", "gemini-1.5-pro", "gemini-pro"],
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The one credential selected for a suggestion request.
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderCredential {
    pub provider: Provider,
    pub api_key: String,
    /// Model tried first.
    pub model: String,
}

impl ProviderCredential {
    pub fn new(provider: Provider, api_key: impl Into<String>, model: Option<String>) -> Self {
        let model = model
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| provider.default_models()[0].to_string());
        Self {
            provider,
            api_key: api_key.into(),
            model,
        }
    }

    /// Select a credential from the environment in [`Provider::PRIORITY`] order.
    ///
    /// Only the first provider with a non-empty key is considered.
    pub fn from_env() -> Result<Self, LlmError> {
        Provider::PRIORITY
            .iter()
            .find_map(|&provider| {
                let key = env::var(provider.api_key_var()).ok()?;
                let key = key.trim();
                if key.is_empty() {
                    return None;
                }
                let model = env::var(provider.model_var()).ok();
                Some(ProviderCredential::new(provider, key, model))
            })
            .ok_or(LlmError::NoCredentialConfigured)
    }

    /// Models to try in order: the preferred model, then the built-in list.
    pub fn candidate_models(&self) -> Vec<String> {
        let mut models = vec![self.model.clone()];
        for model in self.provider.default_models() {
            if !models.iter().any(|m| m == model) {
                models.push(model.to_string());
            }
        }
        models
    }
}

impl fmt::Debug for ProviderCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderCredential")
            .field("provider", &self.provider)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .finish()
    }
}
