//! Google Gemini `generateContent`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::LlmError;
use crate::llm::client::{MAX_OUTPUT_TOKENS, ProviderClient, TEMPERATURE, post_json};
use crate::llm::provider::Provider;

const BASE_URL: &str = "https://generativelanguage.googleapis.com";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
    top_k: u32,
    max_output_tokens: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
}

impl GeminiClient {
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
impl ProviderClient for GeminiClient {
    fn provider(&self) -> Provider {
        Provider::Gemini
    }

    async fn complete(&self, api_key: &str, model: &str, prompt: &str) -> Result<String, LlmError> {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: TEMPERATURE,
                top_p: 0.8,
                top_k: 40,
                max_output_tokens: MAX_OUTPUT_TOKENS,
            },
        };

        let builder = self
            .http
            .post(format!(
                "{}/v1beta/models/{}:generateContent",
                self.base_url, model
            ))
            .header("x-goog-api-key", api_key);

        let response: GenerateResponse = post_json(Provider::Gemini, model, builder, &request).await?;

        response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().find_map(|p| p.text))
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| LlmError::Transport {
                provider: Provider::Gemini,
                status: None,
                message: "response contained no candidates".to_string(),
            })
    }
}
