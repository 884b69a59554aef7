//! Commit-message suggestions: diff collection, summarization, prompting,
//! rule-based analysis, and the engine that ties them together.

pub mod diff;
pub mod engine;
pub mod message;
pub mod prompt;
pub mod rules;
pub mod summary;

pub use diff::{DiffCollector, FileChange, FileStatus, TRUNCATION_MARKER};
pub use engine::{SuggestionEngine, SuggestionReport};
pub use message::{
    CommitSuggestion, SuggestionSource, clamp_subject, parse_header, validate_custom_message,
};
pub use prompt::{Prompt, PromptBuilder, RepoContext};
pub use rules::RuleAnalyzer;
pub use summary::{ChangeSet, ChangeStats, file_scope};
