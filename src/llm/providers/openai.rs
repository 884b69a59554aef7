//! OpenAI-style chat completions (OpenAI and Groq).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::LlmError;
use crate::llm::client::{MAX_OUTPUT_TOKENS, ProviderClient, TEMPERATURE, post_json};
use crate::llm::provider::Provider;

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: MessageContent,
}

#[derive(Deserialize)]
struct MessageContent {
    #[serde(default)]
    content: Option<String>,
}

/// Adapter for providers speaking the OpenAI chat completions protocol.
pub struct OpenAiCompatibleClient {
    provider: Provider,
    http: reqwest::Client,
    base_url: String,
}

impl OpenAiCompatibleClient {
    pub fn new(provider: Provider, http: reqwest::Client) -> Self {
        let base_url = match provider {
            Provider::Groq => GROQ_BASE_URL,
            _ => OPENAI_BASE_URL,
        };
        Self {
            provider,
            http,
            base_url: base_url.to_string(),
        }
    }

    /// Point the adapter at a different API root (e.g. a proxy or mock server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl ProviderClient for OpenAiCompatibleClient {
    fn provider(&self) -> Provider {
        self.provider
    }

    async fn complete(&self, api_key: &str, model: &str, prompt: &str) -> Result<String, LlmError> {
        let request = ChatRequest {
            model,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
            temperature: TEMPERATURE,
            max_tokens: MAX_OUTPUT_TOKENS,
        };

        let builder = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key);

        let response: ChatResponse = post_json(self.provider, model, builder, &request).await?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| LlmError::Transport {
                provider: self.provider,
                status: None,
                message: "response contained no message content".to_string(),
            })
    }
}
