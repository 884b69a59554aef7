//! Model fallback within a single provider.

use tracing::{debug, warn};

use crate::error::LlmError;

use super::client::ProviderClient;
use super::provider::{Provider, ProviderCredential};

/// A successful provider call and the model that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub text: String,
    pub provider: Provider,
    pub model: String,
    /// Number of calls made, including the successful one.
    pub attempts: usize,
}

/// Walks an ordered candidate-model list until one answers.
///
/// Only `ModelUnavailable` advances to the next candidate. Calls are strictly
/// sequential and the prompt is never altered between them.
#[derive(Debug, Clone)]
pub struct ModelFallback {
    candidates: Vec<String>,
}

impl ModelFallback {
    pub fn new(candidates: Vec<String>) -> Self {
        Self { candidates }
    }

    /// Candidates for a credential: its preferred model, then the built-in list.
    pub fn for_credential(credential: &ProviderCredential) -> Self {
        Self::new(credential.candidate_models())
    }

    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    pub async fn run<C>(&self, client: &C, api_key: &str, prompt: &str) -> Result<Completion, LlmError>
    where
        C: ProviderClient + ?Sized,
    {
        let provider = client.provider();
        let mut tried = Vec::with_capacity(self.candidates.len());

        for model in &self.candidates {
            tried.push(model.clone());
            debug!("Calling {} with model {}", provider, model);

            match client.complete(api_key, model, prompt).await {
                Ok(text) => {
                    return Ok(Completion {
                        text,
                        provider,
                        model: model.clone(),
                        attempts: tried.len(),
                    });
                }
                Err(err) if err.is_model_unavailable() => {
                    warn!("{} model {} unavailable, trying next: {}", provider, model, err);
                }
                Err(err) => return Err(err),
            }
        }

        Err(LlmError::ModelsExhausted { provider, tried })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::llm::client::MockProviderClient;

    fn not_found(model: &str) -> LlmError {
        LlmError::ModelUnavailable {
            provider: Provider::Gemini,
            model: model.to_string(),
            message: "not found".to_string(),
        }
    }

    fn mock_with_calls(
        outcomes: impl Fn(&str) -> Result<String, LlmError> + Send + 'static,
    ) -> (MockProviderClient, Arc<Mutex<Vec<(String, String)>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&calls);
        let mut mock = MockProviderClient::new();
        mock.expect_provider().return_const(Provider::Gemini);
        mock.expect_complete().returning(move |_, model, prompt| {
            recorded
                .lock()
                .unwrap()
                .push((model.to_string(), prompt.to_string()));
            outcomes(model)
        });
        (mock, calls)
    }

    fn candidates() -> ModelFallback {
        ModelFallback::new(vec!["m1".into(), "m2".into(), "m3".into()])
    }

    #[tokio::test]
    async fn test_third_model_succeeds_after_two_not_found() {
        let (mock, calls) = mock_with_calls(|model| match model {
            "m3" => Ok("ok".to_string()),
            other => Err(not_found(other)),
        });

        let completion = candidates().run(&mock, "key", "the prompt").await.unwrap();

        assert_eq!(completion.text, "ok");
        assert_eq!(completion.model, "m3");
        assert_eq!(completion.provider, Provider::Gemini);
        assert_eq!(completion.attempts, 3);

        let calls = calls.lock().unwrap();
        let models: Vec<&str> = calls.iter().map(|(m, _)| m.as_str()).collect();
        assert_eq!(models, vec!["m1", "m2", "m3"]);
        assert!(calls.iter().all(|(_, p)| p == "the prompt"));
    }

    #[tokio::test]
    async fn test_first_success_makes_single_call() {
        let (mock, calls) = mock_with_calls(|_| Ok("fine".to_string()));

        let completion = candidates().run(&mock, "key", "p").await.unwrap();

        assert_eq!(completion.model, "m1");
        assert_eq!(completion.attempts, 1);
        assert_eq!(calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_transport_error_is_terminal() {
        let (mock, calls) = mock_with_calls(|_| {
            Err(LlmError::Transport {
                provider: Provider::Gemini,
                status: Some(401),
                message: "API key not valid".to_string(),
            })
        });

        let err = candidates().run(&mock, "key", "p").await.unwrap_err();

        assert!(matches!(err, LlmError::Transport { status: Some(401), .. }));
        assert_eq!(calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_exhausting_candidates_reports_every_model() {
        let (mock, _) = mock_with_calls(|model| Err(not_found(model)));

        let err = candidates().run(&mock, "key", "p").await.unwrap_err();

        match err {
            LlmError::ModelsExhausted { provider, tried } => {
                assert_eq!(provider, Provider::Gemini);
                assert_eq!(tried, vec!["m1", "m2", "m3"]);
            }
            other => panic!("expected ModelsExhausted, got {other:?}"),
        }
    }

    #[test]
    fn test_for_credential_uses_preferred_model_first() {
        let cred = ProviderCredential::new(Provider::Groq, "k", Some("gemma2-9b-it".into()));
        let fallback = ModelFallback::for_credential(&cred);
        assert_eq!(
            fallback.candidates(),
            ["gemma2-9b-it", "llama-3.3-70b-versatile", "llama-3.1-8b-instant"]
        );
    }
}
