//! Commit suggestions and conventional-commit message handling.

use std::fmt;
use std::sync::LazyLock;

use regex_lite::Regex;
use serde::Serialize;

use crate::error::SuggestError;

static HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([a-z]+)(?:\(([^)]+)\))?!?:\s*\S").expect("Invalid regex")
});

/// Where a suggestion came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionSource {
    Ai,
    Rule,
    Error,
}

impl fmt::Display for SuggestionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SuggestionSource::Ai => "ai",
            SuggestionSource::Rule => "rule",
            SuggestionSource::Error => "error",
        })
    }
}

/// A single candidate commit message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitSuggestion {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub commit_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    pub source: SuggestionSource,
}

impl CommitSuggestion {
    /// An AI suggestion, with type and scope read from its header when present.
    pub fn from_ai(message: String, explanation: Option<String>) -> Self {
        let (commit_type, scope) = match parse_header(&message) {
            Some((t, s)) => (Some(t), s),
            None => (None, None),
        };
        Self {
            message,
            explanation,
            commit_type,
            scope,
            source: SuggestionSource::Ai,
        }
    }
}

/// Split `type(scope): description` into its type and optional scope.
pub fn parse_header(message: &str) -> Option<(String, Option<String>)> {
    let caps = HEADER.captures(message.trim())?;
    let commit_type = caps.get(1)?.as_str().to_string();
    let scope = caps.get(2).map(|m| m.as_str().trim().to_string());
    Some((commit_type, scope))
}

/// Fit a message on one line of at most `max_len` characters.
///
/// Cuts at the last word boundary that fits and trims trailing punctuation.
pub fn clamp_subject(message: &str, max_len: usize) -> String {
    let line = message.lines().next().unwrap_or_default().trim();
    if line.chars().count() <= max_len {
        return line.trim_end_matches('.').to_string();
    }

    let hard_cut = line
        .char_indices()
        .nth(max_len)
        .map_or(line.len(), |(idx, _)| idx);
    let head = &line[..hard_cut];
    let cut = if line[hard_cut..].starts_with(char::is_whitespace) {
        head
    } else {
        match head.rfind(char::is_whitespace) {
            Some(space) if space > 0 => &head[..space],
            _ => head,
        }
    };

    cut.trim_end_matches(|c: char| c.is_whitespace() || matches!(c, '.' | ',' | ';' | ':' | '-'))
        .to_string()
}

/// Validate a message typed by the user, returning it trimmed.
pub fn validate_custom_message(message: &str) -> Result<String, SuggestError> {
    let trimmed = message.trim();
    if trimmed.is_empty() {
        return Err(SuggestError::Validation(
            "commit message cannot be empty".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}
