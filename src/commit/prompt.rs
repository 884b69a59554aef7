//! Prompt construction for commit-message suggestions.

use std::fmt::Write as _;

use crate::commit::summary::{ChangeSet, file_scope};

/// Commit types the model may choose from.
pub const COMMIT_TYPES: [&str; 8] = [
    "feat", "fix", "refactor", "style", "docs", "test", "chore", "perf",
];

/// Best-effort repository context; empty fields are simply omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepoContext {
    pub branch: String,
    pub recent_commits: Vec<String>,
}

/// A rendered prompt and the output contract it asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    text: String,
    suggestion_count: usize,
    max_subject_len: usize,
}

impl Prompt {
    pub fn text(&self) -> &str {
        &self.text
    }

    /// How many suggestions the model was asked for.
    pub fn suggestion_count(&self) -> usize {
        self.suggestion_count
    }

    pub fn max_subject_len(&self) -> usize {
        self.max_subject_len
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PromptBuilder {
    suggestion_count: usize,
    max_subject_len: usize,
}

impl PromptBuilder {
    pub fn new(suggestion_count: usize, max_subject_len: usize) -> Self {
        Self {
            suggestion_count,
            max_subject_len,
        }
    }

    /// Render the prompt. Deterministic for identical input.
    pub fn build(&self, changes: &ChangeSet, context: &RepoContext) -> Prompt {
        let stats = changes.stats();
        let count = self.suggestion_count;
        let max_len = self.max_subject_len;

        let mut text = String::from(
            "You are an expert developer analyzing git diffs to write commit messages. \
             Respond with valid JSON only.\n",
        );

        let context_section = render_context(context);
        if !context_section.is_empty() {
            text.push_str("\n## Repository Context\n");
            text.push_str(&context_section);
        }

        let _ = write!(
            text,
            "\n## Changes Summary\n\
             - Files changed: {}\n\
             - Total: +{} -{}\n\
             - Modified components: {}\n\
             \n## Changes\n",
            stats.files,
            stats.additions,
            stats.deletions,
            changes.scopes().join(", "),
        );

        for change in changes.changes() {
            let _ = write!(
                text,
                "\nFile: {}\nScope: {}\nChanges: +{} -{}\nStatus: {}\nDiff:\n{}\n",
                change.filename,
                file_scope(&change.filename),
                change.additions,
                change.deletions,
                change.status,
                sanitize_diff(&change.diff),
            );
        }

        let _ = write!(
            text,
            r#"
## Rules
Generate exactly {count} commit messages, best first:
1. Format: type(scope): description
2. Types: {types}
3. The whole first line must be at most {max_len} characters
4. Use imperative mood ("add", not "added")
5. No period at the end
6. Be specific but concise

Return ONLY a JSON object in this shape. Do not wrap it in a fenced code block:
{{"suggestions": [{{"message": "type(scope): description", "explanation": "why this message fits"}}]}}
"#,
            types = COMMIT_TYPES.join("|"),
        );

        Prompt {
            text,
            suggestion_count: count,
            max_subject_len: max_len,
        }
    }
}

fn render_context(context: &RepoContext) -> String {
    let mut out = String::new();
    if !context.branch.is_empty() {
        let _ = writeln!(out, "Branch: {}", context.branch);
    }
    if !context.recent_commits.is_empty() {
        out.push_str("Recent commits:\n");
        for subject in &context.recent_commits {
            let _ = writeln!(out, "- {}", sanitize_diff(subject));
        }
    }
    out
}

/// Make diff text safe to embed in the prompt.
///
/// Control characters (except newline and tab) and ANSI escape sequences are
/// removed, and triple backticks are neutralized so file content cannot close
/// or open fences.
pub fn sanitize_diff(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '\x1b' {
            // CSI sequence: ESC [ params final-byte
            if chars.peek() == Some(&'[') {
                chars.next();
                for c in chars.by_ref() {
                    if ('@'..='~').contains(&c) {
                        break;
                    }
                }
            }
            continue;
        }
        if ch.is_control() && ch != '\n' && ch != '\t' {
            continue;
        }
        out.push(ch);
    }

    out.replace("```", "'''")
}
