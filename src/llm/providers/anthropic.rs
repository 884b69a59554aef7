//! Anthropic messages API.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::LlmError;
use crate::llm::client::{MAX_OUTPUT_TOKENS, ProviderClient, TEMPERATURE, post_json};
use crate::llm::provider::Provider;

const BASE_URL: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

pub struct AnthropicClient {
    http: reqwest::Client,
    base_url: String,
}

impl AnthropicClient {
    pub fn new(http: reqwest::Client) -> Self {
        Self {
            http,
            base_url: BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl ProviderClient for AnthropicClient {
    fn provider(&self) -> Provider {
        Provider::Anthropic
    }

    async fn complete(&self, api_key: &str, model: &str, prompt: &str) -> Result<String, LlmError> {
        let request = MessagesRequest {
            model,
            max_tokens: MAX_OUTPUT_TOKENS,
            temperature: TEMPERATURE,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
        };

        let builder = self
            .http
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", api_key)
            .header("anthropic-version", API_VERSION);

        let response: MessagesResponse =
            post_json(Provider::Anthropic, model, builder, &request).await?;

        let text: String = response
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text)
            .collect::<Vec<_>>()
            .join("\n");

        if text.trim().is_empty() {
            return Err(LlmError::Transport {
                provider: Provider::Anthropic,
                status: None,
                message: "response contained no text content".to_string(),
            });
        }
        Ok(text)
    }
}
