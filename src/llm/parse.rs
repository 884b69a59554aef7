//! Recovering commit-message suggestions from free-form model output.
//!
//! Providers are asked for a bare JSON object but regularly wrap it in
//! markdown fences, surround it with chatter, or ignore the format entirely.
//! Parsing runs an ordered list of strategies and stops at the first one
//! that yields at least one message.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex_lite::Regex;
use serde::Deserialize;
use tracing::debug;

use crate::error::LlmError;

/// One message recovered from a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSuggestion {
    pub message: String,
    pub explanation: Option<String>,
}

#[derive(Deserialize)]
struct SuggestionsPayload {
    suggestions: Vec<SuggestionItem>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SuggestionItem {
    Text(String),
    Detailed {
        message: String,
        #[serde(default)]
        explanation: Option<String>,
    },
}

impl From<SuggestionItem> for ParsedSuggestion {
    fn from(item: SuggestionItem) -> Self {
        match item {
            SuggestionItem::Text(message) => ParsedSuggestion {
                message,
                explanation: None,
            },
            SuggestionItem::Detailed {
                message,
                explanation,
            } => ParsedSuggestion {
                message,
                explanation: explanation.filter(|e| !e.trim().is_empty()),
            },
        }
    }
}

type Strategy = fn(&str) -> Option<Vec<ParsedSuggestion>>;

/// Strategies in the order they are attempted.
const STRATEGIES: [(&str, Strategy); 4] = [
    ("strict json", parse_strict),
    ("fenced block", parse_fenced),
    ("suggestions array salvage", salvage_suggestions_array),
    ("conventional commit lines", extract_commit_lines),
];

static SUGGESTIONS_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""suggestions"\s*:\s*\["#).expect("Invalid regex"));

static COMMIT_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(feat|fix|docs|style|refactor|test|chore|perf)(\([^)]*\))?!?:\s*\S")
        .expect("Invalid regex")
});

static LIST_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:[-*+•]\s+|\d+[.)]\s+)").expect("Invalid regex"));

static MESSAGE_FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^"?message"?\s*:\s*"#).expect("Invalid regex"));

/// Parse at most `max` suggestions out of `raw`, keeping the provider's order.
///
/// Fails with [`LlmError::ResponseParse`] when no strategy finds a message;
/// it never returns an empty list.
pub fn parse_suggestions(raw: &str, max: usize) -> Result<Vec<ParsedSuggestion>, LlmError> {
    for (name, strategy) in STRATEGIES {
        let Some(found) = strategy(raw) else {
            continue;
        };
        let mut suggestions = normalize(found);
        if suggestions.is_empty() {
            continue;
        }
        debug!("Parsed {} suggestion(s) via {}", suggestions.len(), name);
        suggestions.truncate(max);
        return Ok(suggestions);
    }

    let excerpt: String = raw.trim().chars().take(200).collect();
    Err(LlmError::ResponseParse(format!(
        "no suggestions found in response: {excerpt}"
    )))
}

/// Convenience wrapper returning only the message strings.
pub fn parse_messages(raw: &str, max: usize) -> Result<Vec<String>, LlmError> {
    Ok(parse_suggestions(raw, max)?
        .into_iter()
        .map(|s| s.message)
        .collect())
}

fn parse_strict(text: &str) -> Option<Vec<ParsedSuggestion>> {
    let payload: SuggestionsPayload = serde_json::from_str(text.trim()).ok()?;
    Some(payload.suggestions.into_iter().map(Into::into).collect())
}

/// Retry the strict parse on each fenced block, then on the text with every
/// fence marker stripped.
fn parse_fenced(text: &str) -> Option<Vec<ParsedSuggestion>> {
    if !text.contains("```") {
        return None;
    }

    for block in fenced_blocks(text) {
        if let Some(found) = parse_strict(block) {
            return Some(found);
        }
    }

    let stripped: String = text
        .lines()
        .map(|line| line.replace("```json", "").replace("```", ""))
        .collect::<Vec<_>>()
        .join("\n");
    parse_strict(&stripped)
}

/// Interiors of ```-fenced blocks, with any language tag dropped.
fn fenced_blocks(text: &str) -> Vec<&str> {
    let mut blocks = Vec::new();
    let mut rest = text;

    while let Some(open) = rest.find("```") {
        let after_open = &rest[open + 3..];
        let Some(close) = after_open.find("```") else {
            break;
        };
        let inner = &after_open[..close];
        // The language tag runs to the first newline.
        let body = match inner.split_once('\n') {
            Some((tag, body)) if !tag.trim_start().starts_with('{') => body,
            _ => inner,
        };
        blocks.push(body.trim());
        rest = &after_open[close + 3..];
    }

    blocks
}

fn salvage_suggestions_array(text: &str) -> Option<Vec<ParsedSuggestion>> {
    for found in SUGGESTIONS_KEY.find_iter(text) {
        // `found` ends just past the opening bracket.
        let array_start = found.end() - 1;
        let Some(array) = extract_balanced(&text[array_start..], '[', ']') else {
            continue;
        };
        if let Ok(items) = serde_json::from_str::<Vec<SuggestionItem>>(array) {
            return Some(items.into_iter().map(Into::into).collect());
        }
    }
    None
}

fn extract_commit_lines(text: &str) -> Option<Vec<ParsedSuggestion>> {
    let found: Vec<ParsedSuggestion> = text
        .lines()
        .map(clean_line)
        .filter(|line| line.contains(':') && COMMIT_LINE.is_match(line))
        .map(|message| ParsedSuggestion {
            message,
            explanation: None,
        })
        .collect();

    (!found.is_empty()).then_some(found)
}

/// Strip list markers and JSON field quoting from a candidate line.
fn clean_line(line: &str) -> String {
    let line = line.trim();
    let line = LIST_MARKER.replace(line, "");
    let line = MESSAGE_FIELD.replace(line.trim(), "");
    line.trim()
        .trim_end_matches(',')
        .trim_matches(|c| c == '"' || c == '\'' || c == '`')
        .trim()
        .to_string()
}

/// Extract a substring with balanced delimiters starting at `text`'s first char.
///
/// Tracks depth while respecting JSON string literals (including escaped
/// characters), so `["use ] carefully"]` is handled correctly.
fn extract_balanced(text: &str, open: char, close: char) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for (idx, ch) in text.char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match ch {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            c if c == open && !in_string => depth += 1,
            c if c == close && !in_string => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(&text[..idx + close.len_utf8()]);
                }
            }
            _ => {}
        }
    }

    None
}

/// First line only, quotes and trailing periods removed, duplicates dropped.
fn normalize(found: Vec<ParsedSuggestion>) -> Vec<ParsedSuggestion> {
    let mut seen = HashSet::new();
    found
        .into_iter()
        .filter_map(|s| {
            let message = s
                .message
                .lines()
                .map(str::trim)
                .find(|l| !l.is_empty())?
                .trim_matches(|c| c == '"' || c == '\'' || c == '`')
                .trim()
                .trim_end_matches('.')
                .trim_end()
                .to_string();
            if message.is_empty() || !seen.insert(message.clone()) {
                return None;
            }
            Some(ParsedSuggestion {
                message,
                explanation: s.explanation.map(|e| e.trim().to_string()),
            })
        })
        .collect()
}
