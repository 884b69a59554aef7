//! The provider call contract and the HTTP plumbing shared by all adapters.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::error::LlmError;

use super::provider::Provider;
use super::providers::{AnthropicClient, GeminiClient, OpenAiCompatibleClient};

/// Sampling temperature sent to every provider.
pub(crate) const TEMPERATURE: f32 = 0.7;
/// Output token budget sent to every provider.
pub(crate) const MAX_OUTPUT_TOKENS: u32 = 1024;

/// Maximum characters of an unparseable error body kept in a message.
const MAX_ERROR_BODY_CHARS: usize = 300;

/// One provider's request/response adapter.
///
/// The same prompt goes out unchanged; only the envelope, endpoint, and
/// authentication differ per provider.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProviderClient: Send + Sync {
    /// Which provider this adapter talks to.
    fn provider(&self) -> Provider;

    /// Send `prompt` to `model` and return the raw response text.
    async fn complete(&self, api_key: &str, model: &str, prompt: &str) -> Result<String, LlmError>;
}

/// Build the shared HTTP client with the request timeout applied.
pub fn build_http_client(timeout: Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder().timeout(timeout).build()
}

/// The production adapter for `provider`.
pub fn client_for(provider: Provider, http: reqwest::Client) -> Box<dyn ProviderClient> {
    match provider {
        Provider::Groq | Provider::OpenAi => {
            Box::new(OpenAiCompatibleClient::new(provider, http))
        }
        Provider::Anthropic => Box::new(AnthropicClient::new(http)),
        Provider::Gemini => Box::new(GeminiClient::new(http)),
    }
}

/// POST a JSON body and decode a JSON response, classifying failures.
pub(crate) async fn post_json<B, R>(
    provider: Provider,
    model: &str,
    request: reqwest::RequestBuilder,
    body: &B,
) -> Result<R, LlmError>
where
    B: Serialize + ?Sized,
    R: DeserializeOwned,
{
    let response = request
        .json(body)
        .send()
        .await
        .map_err(|e| LlmError::Transport {
            provider,
            status: e.status().map(|s| s.as_u16()),
            message: e.to_string(),
        })?;

    let status = response.status();
    let text = response.text().await.map_err(|e| LlmError::Transport {
        provider,
        status: Some(status.as_u16()),
        message: format!("failed to read response body: {e}"),
    })?;

    if !status.is_success() {
        debug!("{} returned {} for model {}: {}", provider, status, model, text);
        return Err(classify_failure(provider, model, status.as_u16(), &text));
    }

    serde_json::from_str(&text).map_err(|e| LlmError::Transport {
        provider,
        status: Some(status.as_u16()),
        message: format!("unexpected response shape: {e}"),
    })
}

/// Map a non-success response to `ModelUnavailable` or `Transport`.
pub(crate) fn classify_failure(provider: Provider, model: &str, status: u16, body: &str) -> LlmError {
    let payload: Option<Value> = serde_json::from_str(body).ok();
    let message = payload
        .as_ref()
        .and_then(upstream_message)
        .unwrap_or_else(|| fallback_message(status, body));
    let code = payload.as_ref().and_then(upstream_code);

    if status == 404 || signals_missing_model(&message, code.as_deref()) {
        LlmError::ModelUnavailable {
            provider,
            model: model.to_string(),
            message,
        }
    } else {
        LlmError::Transport {
            provider,
            status: Some(status),
            message,
        }
    }
}

/// `error.message`, a bare `error` string, or a top-level `message`.
fn upstream_message(payload: &Value) -> Option<String> {
    let error = payload.get("error");
    error
        .and_then(|e| e.get("message"))
        .and_then(Value::as_str)
        .or_else(|| error.and_then(Value::as_str))
        .or_else(|| payload.get("message").and_then(Value::as_str))
        .map(str::to_string)
}

fn upstream_code(payload: &Value) -> Option<String> {
    let error = payload.get("error")?;
    ["code", "type", "status"]
        .iter()
        .find_map(|key| error.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}

fn fallback_message(status: u16, body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        return format!("HTTP {status}");
    }
    body.chars().take(MAX_ERROR_BODY_CHARS).collect()
}

fn signals_missing_model(message: &str, code: Option<&str>) -> bool {
    if matches!(code, Some("model_not_found") | Some("NOT_FOUND")) {
        return true;
    }
    let lower = message.to_lowercase();
    lower.contains("model")
        && [
            "not found",
            "does not exist",
            "not supported",
            "decommissioned",
            "unknown model",
            "invalid model",
        ]
        .iter()
        .any(|needle| lower.contains(needle))
}
