//! LLM providers, model fallback, and response parsing.

pub mod client;
pub mod fallback;
pub mod parse;
pub mod provider;
pub mod providers;

pub use client::{ProviderClient, build_http_client, client_for};
pub use fallback::{Completion, ModelFallback};
pub use parse::{ParsedSuggestion, parse_messages, parse_suggestions};
pub use provider::{Provider, ProviderCredential};
pub use providers::{AnthropicClient, GeminiClient, OpenAiCompatibleClient};
