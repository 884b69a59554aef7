//! Error types for commit-suggester modules using thiserror.

use thiserror::Error;

use crate::llm::Provider;

/// Errors from the version-control collaborator.
#[derive(Error, Debug)]
pub enum GitError {
    #[error("Not a git repository")]
    NotARepository,

    #[error("Git identity (user.name / user.email) is not configured")]
    IdentityNotConfigured,

    #[error("Git operation failed: {0}")]
    Operation(#[source] git2::Error),

    #[error("Background git task failed: {0}")]
    TaskFailed(String),
}

/// Errors from the AI path: credential lookup, provider calls, and parsing.
#[derive(Error, Debug)]
pub enum LlmError {
    #[error(
        "No AI provider credential found. Set one of GROQ_API_KEY, OPENAI_API_KEY, ANTHROPIC_API_KEY or GEMINI_API_KEY"
    )]
    NoCredentialConfigured,

    #[error("{provider} model '{model}' is not available: {message}")]
    ModelUnavailable {
        provider: Provider,
        model: String,
        message: String,
    },

    #[error("{provider} request failed{}: {message}",
            .status.map_or(String::new(), |s| format!(" with status {s}")))]
    Transport {
        provider: Provider,
        status: Option<u16>,
        message: String,
    },

    #[error("{provider} has no available model (tried: {})", .tried.join(", "))]
    ModelsExhausted { provider: Provider, tried: Vec<String> },

    #[error("Could not parse suggestions from the model response: {0}")]
    ResponseParse(String),
}

impl LlmError {
    /// Whether the controller may recover by switching to the next candidate model.
    pub fn is_model_unavailable(&self) -> bool {
        matches!(self, LlmError::ModelUnavailable { .. })
    }

    /// Whether this error belongs to the provider-transport class.
    ///
    /// Exhausting every candidate model is reported as a transport failure.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            LlmError::Transport { .. } | LlmError::ModelsExhausted { .. }
        )
    }
}

/// Errors surfaced to callers of the suggestion engine.
#[derive(Error, Debug)]
pub enum SuggestError {
    #[error("Not a git repository. Initialize one first with: git init")]
    NotARepository,

    #[error(
        "Git user not configured. Run:\n  git config --global user.email \"you@example.com\"\n  git config --global user.name \"Your Name\""
    )]
    IdentityNotConfigured,

    #[error("No changes found to suggest a commit for. Stage changes with: git add <files>")]
    NoChangesFound,

    #[error(
        "No AI provider configured. Export one of:\n  GROQ_API_KEY\n  OPENAI_API_KEY\n  ANTHROPIC_API_KEY\n  GEMINI_API_KEY"
    )]
    NoCredentialConfigured,

    #[error("Invalid commit message: {0}")]
    Validation(String),

    #[error(transparent)]
    Git(GitError),
}

impl From<GitError> for SuggestError {
    fn from(err: GitError) -> Self {
        match err {
            GitError::NotARepository => SuggestError::NotARepository,
            GitError::IdentityNotConfigured => SuggestError::IdentityNotConfigured,
            other => SuggestError::Git(other),
        }
    }
}
