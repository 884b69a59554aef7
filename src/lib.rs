//! commit-suggester - suggests conventional commit messages for staged changes.
//!
//! # Overview
//!
//! commit-suggester reads the staged diff from git, asks one of several LLM
//! providers (Groq, OpenAI, Anthropic, Gemini) for ranked conventional-commit
//! messages, and falls back to deterministic rule-based suggestions when no
//! provider is configured or its answer cannot be used.

pub mod commit;
pub mod config;
pub mod error;
pub mod git;
pub mod llm;

// Re-export commonly used types
pub use commit::{
    ChangeSet, ChangeStats, CommitSuggestion, FileChange, FileStatus, SuggestionEngine,
    SuggestionReport, SuggestionSource,
};
pub use config::SuggestConfig;
pub use error::{GitError, LlmError, SuggestError};
pub use git::{GitRepository, VcsSource};
pub use llm::{Provider, ProviderCredential};
