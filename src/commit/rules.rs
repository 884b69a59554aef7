//! Deterministic suggestions from file names and diff shape alone.

use std::collections::HashMap;

use crate::commit::diff::FileChange;
use crate::commit::message::{CommitSuggestion, SuggestionSource};

const STYLE_EXTENSIONS: [&str; 5] = ["css", "scss", "sass", "less", "styl"];

/// Built-in templates keyed by commit type.
const DEFAULT_TEMPLATES: [(&str, &str); 7] = [
    ("feat", "feat({scope}): add {component} functionality"),
    ("fix", "fix({scope}): resolve issue with {component}"),
    ("docs", "docs({scope}): update documentation for {component}"),
    ("style", "style({scope}): improve formatting of {component}"),
    ("refactor", "refactor({scope}): restructure {component}"),
    ("test", "test({scope}): add tests for {component}"),
    ("perf", "perf({scope}): improve performance of {component}"),
];

/// Produces exactly one suggestion per file change. Never fails.
#[derive(Debug, Clone)]
pub struct RuleAnalyzer {
    templates: HashMap<String, String>,
}

impl Default for RuleAnalyzer {
    fn default() -> Self {
        Self::new(&HashMap::new())
    }
}

impl RuleAnalyzer {
    /// Built-in templates with `overrides` merged on top.
    pub fn new(overrides: &HashMap<String, String>) -> Self {
        let mut templates: HashMap<String, String> = DEFAULT_TEMPLATES
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        templates.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
        Self { templates }
    }

    pub fn analyze_batch(&self, changes: &[FileChange]) -> Vec<CommitSuggestion> {
        changes.iter().map(|c| self.analyze(c)).collect()
    }

    pub fn analyze(&self, change: &FileChange) -> CommitSuggestion {
        let commit_type = change_type(change);
        let scope = rule_scope(&change.filename);
        let component = component(&change.filename);

        let message = match self.templates.get(commit_type) {
            Some(template) => template.clone(),
            None => format!("{commit_type}({{scope}}): update {{component}}"),
        }
        .replace("{scope}", &scope)
        .replace("{component}", &component);

        CommitSuggestion {
            message,
            explanation: Some(format!(
                "Based on changes to {} (+{}/-{})",
                change.filename, change.additions, change.deletions
            )),
            commit_type: Some(commit_type.to_string()),
            scope: Some(scope),
            source: SuggestionSource::Rule,
        }
    }
}

/// Ordered heuristics; the first match wins.
fn change_type(change: &FileChange) -> &'static str {
    let path = change.filename.to_lowercase();
    let ext = path.rsplit_once('.').map(|(_, ext)| ext).unwrap_or_default();

    if path.contains("test") {
        "test"
    } else if path.contains("docs") {
        "docs"
    } else if STYLE_EXTENSIONS.contains(&ext) || change.diff.contains("style") {
        "style"
    } else if change.additions > change.deletions * 2 {
        "feat"
    } else if change.deletions > change.additions * 2 {
        "refactor"
    } else {
        "fix"
    }
}

/// Directory-derived scope; `general` for root-level files.
fn rule_scope(path: &str) -> String {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    match segments.as_slice() {
        [root, sub, _, ..] if is_source_root(root) => sub.to_string(),
        [dir, _, ..] => dir.to_string(),
        _ => "general".to_string(),
    }
}

fn is_source_root(segment: &str) -> bool {
    matches!(segment, "src" | "lib" | "packages" | "app" | "apps" | "crates" | "pkg")
}

/// File name without its extension(s); dotfiles keep their name.
fn component(path: &str) -> String {
    let name = path.rsplit('/').next().unwrap_or(path);
    name.split('.')
        .find(|part| !part.is_empty())
        .unwrap_or(name)
        .to_string()
}
