//! Aggregate statistics and scope labels for a set of changes.

use serde::Serialize;

use crate::commit::diff::FileChange;

/// Top-level directories whose first subdirectory names the scope.
const SOURCE_ROOTS: [&str; 7] = ["src", "lib", "packages", "app", "apps", "crates", "pkg"];

const SOURCE_EXTENSIONS: [&str; 12] = [
    "ts", "tsx", "js", "jsx", "mjs", "cjs", "rs", "py", "go", "java", "rb", "kt",
];
const STYLE_EXTENSIONS: [&str; 5] = ["css", "scss", "sass", "less", "styl"];
const DOC_EXTENSIONS: [&str; 4] = ["md", "mdx", "rst", "txt"];
const CONFIG_EXTENSIONS: [&str; 6] = ["json", "toml", "yaml", "yml", "ini", "lock"];

/// Totals over a change set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ChangeStats {
    pub files: usize,
    pub additions: usize,
    pub deletions: usize,
}

impl ChangeStats {
    pub fn from_changes(changes: &[FileChange]) -> Self {
        changes.iter().fold(
            ChangeStats {
                files: changes.len(),
                ..Default::default()
            },
            |acc, c| ChangeStats {
                additions: acc.additions + c.additions,
                deletions: acc.deletions + c.deletions,
                ..acc
            },
        )
    }
}

/// Ordered file changes with derived totals and scopes.
///
/// The totals and scopes are computed once from the changes and cannot be
/// edited independently of them.
#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    changes: Vec<FileChange>,
    stats: ChangeStats,
    scopes: Vec<String>,
}

impl ChangeSet {
    pub fn new(changes: Vec<FileChange>) -> Self {
        let stats = ChangeStats::from_changes(&changes);
        let mut scopes: Vec<String> = Vec::new();
        for change in &changes {
            let scope = file_scope(&change.filename);
            if !scopes.contains(&scope) {
                scopes.push(scope);
            }
        }
        Self {
            changes,
            stats,
            scopes,
        }
    }

    pub fn changes(&self) -> &[FileChange] {
        &self.changes
    }

    pub fn stats(&self) -> ChangeStats {
        self.stats
    }

    /// Distinct scopes in first-seen order.
    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

/// Best-effort topical scope for a path.
///
/// `src/auth/login.ts` is `auth`, `docs/guide.md` is `docs`, and a root-level
/// file is classified by extension (`README.md` is `docs`).
pub fn file_scope(path: &str) -> String {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    if segments.len() > 2 && SOURCE_ROOTS.contains(&segments[0].to_lowercase().as_str()) {
        return segments[1].to_lowercase();
    }
    if segments.len() > 1 {
        return segments[0].to_lowercase();
    }

    extension_scope(path).to_string()
}

fn extension_scope(path: &str) -> &'static str {
    let lower = path.to_lowercase();
    let file_name = lower.rsplit('/').next().unwrap_or(&lower);
    let ext = match file_name.rsplit_once('.') {
        Some((_, ext)) => ext,
        None => return "core",
    };

    if SOURCE_EXTENSIONS.contains(&ext) {
        if file_name.contains("test") || file_name.contains("spec") {
            "tests"
        } else {
            "core"
        }
    } else if STYLE_EXTENSIONS.contains(&ext) {
        "styles"
    } else if DOC_EXTENSIONS.contains(&ext) {
        "docs"
    } else if CONFIG_EXTENSIONS.contains(&ext) {
        "config"
    } else {
        "core"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commit::diff::FileStatus;

    fn change(name: &str, additions: usize, deletions: usize) -> FileChange {
        FileChange {
            filename: name.to_string(),
            diff: String::new(),
            additions,
            deletions,
            status: FileStatus::Modified,
        }
    }

    #[test]
    fn test_stats_are_sums() {
        let set = ChangeSet::new(vec![change("a.rs", 3, 1), change("b.rs", 10, 4)]);
        assert_eq!(
            set.stats(),
            ChangeStats {
                files: 2,
                additions: 13,
                deletions: 5
            }
        );
    }

    #[test]
    fn test_empty_set_has_zeroed_stats() {
        let set = ChangeSet::new(Vec::new());
        assert!(set.is_empty());
        assert_eq!(set.stats(), ChangeStats::default());
        assert!(set.scopes().is_empty());
    }

    #[test]
    fn test_scopes_deduplicated_in_first_seen_order() {
        let set = ChangeSet::new(vec![
            change("src/auth/login.ts", 1, 0),
            change("README.md", 1, 0),
            change("src/auth/session.ts", 1, 0),
            change("styles.css", 1, 0),
        ]);
        assert_eq!(set.scopes(), ["auth", "docs", "styles"]);
    }

    #[test]
    fn test_file_scope_directory_rules() {
        assert_eq!(file_scope("src/auth/login.ts"), "auth");
        assert_eq!(file_scope("packages/ui/button/index.tsx"), "ui");
        assert_eq!(file_scope("docs/guide.md"), "docs");
        assert_eq!(file_scope("tests/engine_test.rs"), "tests");
        // A file directly under a source root takes the root as scope.
        assert_eq!(file_scope("src/main.rs"), "src");
    }

    #[test]
    fn test_file_scope_extension_rules() {
        assert_eq!(file_scope("index.ts"), "core");
        assert_eq!(file_scope("app.test.ts"), "tests");
        assert_eq!(file_scope("theme.scss"), "styles");
        assert_eq!(file_scope("CHANGELOG.md"), "docs");
        assert_eq!(file_scope("package.json"), "config");
        assert_eq!(file_scope("Makefile"), "core");
        assert_eq!(file_scope("logo.png"), "core");
    }
}
