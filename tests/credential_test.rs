//! Integration tests for environment-driven provider selection and config.

mod common;

use std::time::Duration;

use serial_test::serial;

use commit_suggester::config::{MAX_FILE_DIFF_CHARS_ENV, SuggestConfig, TIMEOUT_ENV};
use commit_suggester::{
    GitRepository, Provider, SuggestError, SuggestionEngine, SuggestionSource,
};
use common::TestRepo;

/// Every variable credential selection reads, unset.
fn no_credentials() -> Vec<(&'static str, Option<&'static str>)> {
    Provider::PRIORITY
        .iter()
        .flat_map(|p| [(p.api_key_var(), None), (p.model_var(), None)])
        .collect()
}

fn with_credentials(
    set: &[(&'static str, &'static str)],
) -> Vec<(&'static str, Option<&'static str>)> {
    let mut vars = no_credentials();
    for (key, value) in set {
        if let Some(slot) = vars.iter_mut().find(|(k, _)| k == key) {
            slot.1 = Some(*value);
        }
    }
    vars
}

fn staged_repo() -> (TestRepo, GitRepository) {
    let test_repo = TestRepo::new();
    test_repo.stage("docs/guide.md", "# Guide\n\nHow to use it.\n");
    let repo = GitRepository::open(test_repo.path()).expect("Failed to open test repo");
    (test_repo, repo)
}

#[test]
#[serial]
fn test_require_ai_without_key_is_an_error() {
    let (_guard, repo) = staged_repo();
    temp_env::with_vars(no_credentials(), || {
        let config = SuggestConfig {
            require_ai: true,
            ..SuggestConfig::default()
        };
        let result = SuggestionEngine::from_env(repo, config);
        assert!(matches!(result, Err(SuggestError::NoCredentialConfigured)));
    });
}

#[test]
#[serial]
fn test_first_configured_provider_is_selected() {
    let (_guard, repo) = staged_repo();
    let vars = with_credentials(&[
        ("ANTHROPIC_API_KEY", "ant-key"),
        ("GEMINI_API_KEY", "gem-key"),
    ]);
    temp_env::with_vars(vars, || {
        let engine = SuggestionEngine::from_env(repo, SuggestConfig::default()).unwrap();
        assert_eq!(engine.provider(), Some(Provider::Anthropic));
    });
}

#[test]
#[serial]
fn test_blank_key_does_not_select_provider() {
    let (_guard, repo) = staged_repo();
    temp_env::with_vars(with_credentials(&[("GROQ_API_KEY", "   ")]), || {
        let engine = SuggestionEngine::from_env(repo, SuggestConfig::default()).unwrap();
        assert_eq!(engine.provider(), None);
    });
}

#[tokio::test]
#[serial]
async fn test_without_key_engine_uses_rules() {
    let (_guard, repo) = staged_repo();
    temp_env::async_with_vars(no_credentials(), async move {
        let engine = SuggestionEngine::from_env(repo, SuggestConfig::default()).unwrap();
        let report = engine.generate_suggestions().await.unwrap();

        assert!(report.provider.is_none());
        assert_eq!(
            report.suggestions[0].message,
            "docs(docs): update documentation for guide"
        );
        assert_eq!(report.suggestions[0].source, SuggestionSource::Rule);
    })
    .await;
}

#[test]
#[serial]
fn test_config_env_overrides() {
    temp_env::with_vars(
        [(MAX_FILE_DIFF_CHARS_ENV, Some("1200")), (TIMEOUT_ENV, Some("15"))],
        || {
            let config = SuggestConfig::from_env();
            assert_eq!(config.limits.max_file_diff_chars, 1200);
            assert_eq!(config.request_timeout, Duration::from_secs(15));
            assert_eq!(config.max_subject_len, 72);
        },
    );
}

#[test]
#[serial]
fn test_config_invalid_timeout_keeps_default() {
    temp_env::with_var(TIMEOUT_ENV, Some("soon"), || {
        let config = SuggestConfig::from_env();
        assert_eq!(config.request_timeout, SuggestConfig::default().request_timeout);
    });
}
