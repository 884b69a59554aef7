//! Orchestrates one suggestion request: collect, prompt, call, parse, or
//! fall back to rules.

use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, warn};

use crate::commit::diff::DiffCollector;
use crate::commit::message::{CommitSuggestion, clamp_subject};
use crate::commit::prompt::{PromptBuilder, RepoContext};
use crate::commit::rules::RuleAnalyzer;
use crate::commit::summary::{ChangeSet, ChangeStats};
use crate::config::SuggestConfig;
use crate::error::{LlmError, SuggestError};
use crate::git::VcsSource;
use crate::llm::{
    Completion, ModelFallback, Provider, ProviderClient, ProviderCredential, build_http_client,
    client_for, parse_suggestions,
};

/// What a suggestion request returns.
#[derive(Debug, Clone, Serialize)]
pub struct SuggestionReport {
    /// Best first. Never empty.
    pub suggestions: Vec<CommitSuggestion>,
    pub stats: ChangeStats,
    pub scopes: Vec<String>,
    /// Set when the suggestions came from a provider.
    pub provider: Option<Provider>,
    pub model: Option<String>,
}

struct AiBackend {
    credential: ProviderCredential,
    client: Box<dyn ProviderClient>,
}

pub struct SuggestionEngine<V> {
    vcs: V,
    config: SuggestConfig,
    rules: RuleAnalyzer,
    ai: Option<AiBackend>,
}

impl<V: VcsSource> SuggestionEngine<V> {
    /// Select a provider from the environment.
    ///
    /// Without a credential the engine runs rules-only, unless
    /// `config.require_ai` is set.
    pub fn from_env(vcs: V, config: SuggestConfig) -> Result<Self, SuggestError> {
        let credential = match ProviderCredential::from_env() {
            Ok(credential) => credential,
            Err(_) if config.require_ai => return Err(SuggestError::NoCredentialConfigured),
            Err(e) => {
                debug!("{}; using rule-based suggestions", e);
                return Ok(Self::without_ai(vcs, config));
            }
        };

        match build_http_client(config.request_timeout) {
            Ok(http) => {
                let client = client_for(credential.provider, http);
                Ok(Self::with_ai(vcs, config, credential, client))
            }
            Err(e) => {
                warn!("Failed to build HTTP client, using rule-based suggestions: {}", e);
                Ok(Self::without_ai(vcs, config))
            }
        }
    }

    pub fn with_ai(
        vcs: V,
        config: SuggestConfig,
        credential: ProviderCredential,
        client: Box<dyn ProviderClient>,
    ) -> Self {
        let rules = RuleAnalyzer::new(&config.templates);
        Self {
            vcs,
            config,
            rules,
            ai: Some(AiBackend { credential, client }),
        }
    }

    pub fn without_ai(vcs: V, config: SuggestConfig) -> Self {
        let rules = RuleAnalyzer::new(&config.templates);
        Self {
            vcs,
            config,
            rules,
            ai: None,
        }
    }

    /// The provider that will be asked, if any.
    pub fn provider(&self) -> Option<Provider> {
        self.ai.as_ref().map(|ai| ai.credential.provider)
    }

    pub async fn generate_suggestions(&self) -> Result<SuggestionReport, SuggestError> {
        let changes = DiffCollector::new(&self.vcs, self.config.limits)
            .collect_all()
            .await?;
        let set = ChangeSet::new(changes);

        if let Some(ai) = &self.ai {
            match self.ai_suggestions(ai, &set).await {
                Ok((suggestions, completion)) => {
                    debug!(
                        "{} suggestion(s) from {} {} after {} attempt(s)",
                        suggestions.len(),
                        completion.provider,
                        completion.model,
                        completion.attempts
                    );
                    return Ok(SuggestionReport {
                        suggestions,
                        stats: set.stats(),
                        scopes: set.scopes().to_vec(),
                        provider: Some(completion.provider),
                        model: Some(completion.model),
                    });
                }
                Err(e) => warn!("AI suggestions failed, using rule-based fallback: {}", e),
            }
        }

        Ok(SuggestionReport {
            suggestions: self.rule_suggestions(&set),
            stats: set.stats(),
            scopes: set.scopes().to_vec(),
            provider: None,
            model: None,
        })
    }

    async fn ai_suggestions(
        &self,
        ai: &AiBackend,
        set: &ChangeSet,
    ) -> Result<(Vec<CommitSuggestion>, Completion), LlmError> {
        let context = self.repo_context().await;
        let prompt = PromptBuilder::new(self.config.max_suggestions, self.config.max_subject_len)
            .build(set, &context);
        debug!("Prompt length: {} chars", prompt.text().len());

        let completion = ModelFallback::for_credential(&ai.credential)
            .run(ai.client.as_ref(), &ai.credential.api_key, prompt.text())
            .await?;

        let parsed = parse_suggestions(&completion.text, prompt.suggestion_count())?;
        let suggestions: Vec<CommitSuggestion> = parsed
            .into_iter()
            .map(|p| {
                CommitSuggestion::from_ai(
                    clamp_subject(&p.message, self.config.max_subject_len),
                    p.explanation,
                )
            })
            .filter(|s| !s.message.is_empty())
            .collect();

        if suggestions.is_empty() {
            return Err(LlmError::ResponseParse(
                "every suggestion was empty after clamping".to_string(),
            ));
        }
        Ok((suggestions, completion))
    }

    /// One rule suggestion per file, duplicates dropped.
    fn rule_suggestions(&self, set: &ChangeSet) -> Vec<CommitSuggestion> {
        let mut seen = HashSet::new();
        self.rules
            .analyze_batch(set.changes())
            .into_iter()
            .map(|mut s| {
                s.message = clamp_subject(&s.message, self.config.max_subject_len);
                s
            })
            .filter(|s| seen.insert(s.message.clone()))
            .collect()
    }

    /// Branch and recent subjects; failures leave the field empty.
    async fn repo_context(&self) -> RepoContext {
        let branch = self.vcs.current_branch().await.unwrap_or_else(|e| {
            warn!("Could not read current branch: {}", e);
            String::new()
        });
        let recent_commits = self
            .vcs
            .recent_commit_subjects(self.config.recent_commit_count)
            .await
            .unwrap_or_else(|e| {
                warn!("Could not read recent commits: {}", e);
                Vec::new()
            });
        RepoContext {
            branch,
            recent_commits,
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::commit::message::SuggestionSource;
    use crate::error::GitError;
    use crate::llm::client::MockProviderClient;

    struct FakeVcs {
        files: Vec<(&'static str, &'static str, &'static str)>,
        identity: bool,
    }

    #[async_trait]
    impl VcsSource for FakeVcs {
        async fn list_changed_files(&self) -> Result<Vec<String>, GitError> {
            Ok(self.files.iter().map(|(p, _, _)| p.to_string()).collect())
        }

        async fn file_diff(&self, path: &str) -> Result<String, GitError> {
            Ok(self
                .files
                .iter()
                .find(|(p, _, _)| *p == path)
                .map(|(_, d, _)| d.to_string())
                .unwrap_or_default())
        }

        async fn file_status_code(&self, path: &str) -> Result<String, GitError> {
            Ok(self
                .files
                .iter()
                .find(|(p, _, _)| *p == path)
                .map(|(_, _, s)| s.to_string())
                .unwrap_or_default())
        }

        async fn current_branch(&self) -> Result<String, GitError> {
            Err(GitError::TaskFailed("no branch".into()))
        }

        async fn recent_commit_subjects(&self, _count: usize) -> Result<Vec<String>, GitError> {
            Ok(vec!["chore: init".into()])
        }

        async fn has_identity_configured(&self) -> Result<bool, GitError> {
            Ok(self.identity)
        }
    }

    fn login_vcs() -> FakeVcs {
        FakeVcs {
            files: vec![("src/auth/login.ts", "+a\n+b\n+c\n", "A")],
            identity: true,
        }
    }

    fn groq() -> ProviderCredential {
        ProviderCredential::new(Provider::Groq, "gsk", None)
    }

    fn mock_returning(text: &'static str) -> Box<dyn ProviderClient> {
        let mut mock = MockProviderClient::new();
        mock.expect_provider().return_const(Provider::Groq);
        mock.expect_complete()
            .returning(move |_, _, _| Ok(text.to_string()));
        Box::new(mock)
    }

    #[tokio::test]
    async fn test_ai_success_tags_ai_and_reports_model() {
        let client = mock_returning(
            r#"{"suggestions":[{"message":"feat(auth): add login","explanation":"new file"},"fix: b","docs: c","chore: d"]}"#,
        );
        let engine =
            SuggestionEngine::with_ai(login_vcs(), SuggestConfig::default(), groq(), client);

        let report = engine.generate_suggestions().await.unwrap();

        assert_eq!(report.suggestions.len(), 3);
        assert!(report.suggestions.iter().all(|s| s.source == SuggestionSource::Ai));
        assert_eq!(report.suggestions[0].scope.as_deref(), Some("auth"));
        assert_eq!(report.provider, Some(Provider::Groq));
        assert_eq!(report.model.as_deref(), Some("llama-3.3-70b-versatile"));
        assert_eq!(report.stats.additions, 3);
    }

    #[tokio::test]
    async fn test_unparseable_response_falls_back_to_rules() {
        let client = mock_returning("hello there");
        let engine =
            SuggestionEngine::with_ai(login_vcs(), SuggestConfig::default(), groq(), client);

        let report = engine.generate_suggestions().await.unwrap();

        assert_eq!(report.suggestions.len(), 1);
        assert_eq!(report.suggestions[0].source, SuggestionSource::Rule);
        assert_eq!(
            report.suggestions[0].message,
            "feat(auth): add login functionality"
        );
        assert!(report.provider.is_none());
    }

    #[tokio::test]
    async fn test_ai_messages_are_clamped() {
        let client = mock_returning(
            r#"{"suggestions":["feat(auth): add a very long description that keeps going and going"]}"#,
        );
        let config = SuggestConfig {
            max_subject_len: 30,
            ..SuggestConfig::default()
        };
        let engine = SuggestionEngine::with_ai(login_vcs(), config, groq(), client);

        let report = engine.generate_suggestions().await.unwrap();
        assert!(report.suggestions[0].message.chars().count() <= 30);
        assert_eq!(report.suggestions[0].message, "feat(auth): add a very long");
    }

    #[tokio::test]
    async fn test_missing_identity_is_terminal() {
        let vcs = FakeVcs {
            identity: false,
            ..login_vcs()
        };
        let engine = SuggestionEngine::without_ai(vcs, SuggestConfig::default());
        assert!(matches!(
            engine.generate_suggestions().await,
            Err(SuggestError::IdentityNotConfigured)
        ));
    }

    #[tokio::test]
    async fn test_no_changes_is_terminal() {
        let vcs = FakeVcs {
            files: Vec::new(),
            identity: true,
        };
        let engine = SuggestionEngine::without_ai(vcs, SuggestConfig::default());
        assert!(matches!(
            engine.generate_suggestions().await,
            Err(SuggestError::NoChangesFound)
        ));
    }

    #[tokio::test]
    async fn test_rule_suggestions_drop_duplicates() {
        let vcs = FakeVcs {
            files: vec![
                ("web/a/x.ts", "+1\n", "M"),
                ("web/b/x.ts", "+1\n", "M"),
                ("README.md", "+1\n", "M"),
            ],
            identity: true,
        };
        let engine = SuggestionEngine::without_ai(vcs, SuggestConfig::default());
        let report = engine.generate_suggestions().await.unwrap();
        let messages: Vec<&str> = report.suggestions.iter().map(|s| s.message.as_str()).collect();
        assert_eq!(
            messages,
            vec!["feat(web): add x functionality", "feat(general): add README functionality"]
        );
    }
}
