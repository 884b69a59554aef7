//! `git2`-backed implementation of [`VcsSource`].

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use git2::{
    Delta, Diff, DiffFindOptions, DiffFormat, DiffOptions, ErrorCode, IndexAddOption, Oid,
    Repository, Sort, Tree,
};
use tracing::debug;

use crate::commit::validate_custom_message;
use crate::error::{GitError, SuggestError};

use super::VcsSource;

/// A working tree opened through libgit2.
///
/// Only the work-tree root is stored; every operation opens its own
/// `Repository` handle on a blocking task, so concurrent reads share nothing.
#[derive(Debug, Clone)]
pub struct GitRepository {
    root: PathBuf,
}

impl GitRepository {
    /// Discover the repository containing `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, GitError> {
        let repo = Repository::discover(path.as_ref()).map_err(map_open_error)?;
        let root = repo
            .workdir()
            .ok_or(GitError::NotARepository)?
            .to_path_buf();
        Ok(Self { root })
    }

    /// Root of the working tree.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Stage every change in the working tree (like `git add -A`).
    pub fn stage_all(&self) -> Result<(), GitError> {
        let repo = self.repository()?;
        let mut index = repo.index().map_err(GitError::Operation)?;
        index
            .add_all(["*"].iter(), IndexAddOption::DEFAULT, None)
            .map_err(GitError::Operation)?;
        index
            .update_all(["*"].iter(), None)
            .map_err(GitError::Operation)?;
        index.write().map_err(GitError::Operation)?;
        Ok(())
    }

    /// Create a commit from the current index with the configured identity.
    pub fn commit_staged(&self, message: &str) -> Result<Oid, SuggestError> {
        let message = validate_custom_message(message)?;
        let repo = self.repository()?;

        let mut index = repo.index().map_err(GitError::Operation)?;
        let tree_id = index.write_tree().map_err(GitError::Operation)?;
        let tree = repo.find_tree(tree_id).map_err(GitError::Operation)?;

        let parent = match repo.head() {
            Ok(head) => Some(head.peel_to_commit().map_err(GitError::Operation)?),
            Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => {
                None
            }
            Err(e) => return Err(GitError::Operation(e).into()),
        };

        let unchanged = match &parent {
            Some(commit) => commit.tree_id() == tree_id,
            None => tree.is_empty(),
        };
        if unchanged {
            return Err(SuggestError::NoChangesFound);
        }

        let sig = repo
            .signature()
            .map_err(|_| SuggestError::IdentityNotConfigured)?;
        let parents: Vec<&git2::Commit> = parent.iter().collect();

        let oid = repo
            .commit(Some("HEAD"), &sig, &sig, &message, &tree, &parents)
            .map_err(GitError::Operation)?;
        debug!("Created commit {}", oid);
        Ok(oid)
    }

    fn repository(&self) -> Result<Repository, GitError> {
        Repository::open(&self.root).map_err(map_open_error)
    }

    /// Run `op` against a fresh repository handle on the blocking pool.
    async fn run_blocking<T, F>(&self, op: F) -> Result<T, GitError>
    where
        T: Send + 'static,
        F: FnOnce(&Repository) -> Result<T, GitError> + Send + 'static,
    {
        let root = self.root.clone();
        tokio::task::spawn_blocking(move || {
            let repo = Repository::open(&root).map_err(map_open_error)?;
            op(&repo)
        })
        .await
        .map_err(|e| GitError::TaskFailed(e.to_string()))?
    }
}

#[async_trait]
impl VcsSource for GitRepository {
    async fn list_changed_files(&self) -> Result<Vec<String>, GitError> {
        self.run_blocking(|repo| {
            let diff = staged_diff(repo, None)?;
            let mut paths: Vec<String> = diff.deltas().filter_map(|d| delta_path(&d)).collect();
            paths.dedup();
            Ok(paths)
        })
        .await
    }

    async fn file_diff(&self, path: &str) -> Result<String, GitError> {
        let path = path.to_string();
        self.run_blocking(move |repo| {
            let diff = staged_diff(repo, Some(&path))?;
            render_patch(&diff)
        })
        .await
    }

    async fn file_status_code(&self, path: &str) -> Result<String, GitError> {
        let path = path.to_string();
        self.run_blocking(move |repo| {
            let diff = staged_diff(repo, None)?;
            let code = diff
                .deltas()
                .find(|d| delta_path(d).as_deref() == Some(path.as_str()))
                .map(|d| status_code(d.status()))
                .unwrap_or("");
            Ok(code.to_string())
        })
        .await
    }

    async fn current_branch(&self) -> Result<String, GitError> {
        self.run_blocking(|repo| match repo.head() {
            Ok(head) => Ok(head.shorthand().unwrap_or("HEAD").to_string()),
            Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => {
                let head = repo.find_reference("HEAD").map_err(GitError::Operation)?;
                Ok(head
                    .symbolic_target()
                    .and_then(|t| t.strip_prefix("refs/heads/"))
                    .unwrap_or_default()
                    .to_string())
            }
            Err(e) => Err(GitError::Operation(e)),
        })
        .await
    }

    async fn recent_commit_subjects(&self, count: usize) -> Result<Vec<String>, GitError> {
        self.run_blocking(move |repo| {
            if resolve_head_tree(repo)?.is_none() {
                return Ok(Vec::new());
            }

            let mut walk = repo.revwalk().map_err(GitError::Operation)?;
            walk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME).map_err(GitError::Operation)?;
            walk.push_head().map_err(GitError::Operation)?;

            let mut subjects = Vec::with_capacity(count);
            for oid in walk.take(count) {
                let oid = oid.map_err(GitError::Operation)?;
                let commit = repo.find_commit(oid).map_err(GitError::Operation)?;
                subjects.push(commit.summary().unwrap_or_default().to_string());
            }
            Ok(subjects)
        })
        .await
    }

    async fn has_identity_configured(&self) -> Result<bool, GitError> {
        self.run_blocking(|repo| {
            let config = repo.config().map_err(GitError::Operation)?;
            let is_set = |key: &str| {
                config
                    .get_string(key)
                    .map(|v| !v.trim().is_empty())
                    .unwrap_or(false)
            };
            Ok(is_set("user.name") && is_set("user.email"))
        })
        .await
    }
}

fn map_open_error(e: git2::Error) -> GitError {
    if e.code() == ErrorCode::NotFound {
        GitError::NotARepository
    } else {
        GitError::Operation(e)
    }
}

/// Resolve the HEAD tree, distinguishing empty-repo errors from real failures.
///
/// Returns `Ok(None)` for repos with no commits (unborn branch / not found).
fn resolve_head_tree(repo: &Repository) -> Result<Option<Tree<'_>>, GitError> {
    let head_ref = match repo.head() {
        Ok(r) => r,
        Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => {
            return Ok(None);
        }
        Err(e) => return Err(GitError::Operation(e)),
    };

    let tree = head_ref.peel_to_tree().map_err(GitError::Operation)?;
    Ok(Some(tree))
}

/// HEAD-to-index diff, optionally restricted to one literal path.
///
/// Without a path, renames and copies are detected so they report as a
/// single entry under the new path.
fn staged_diff<'r>(repo: &'r Repository, path: Option<&str>) -> Result<Diff<'r>, GitError> {
    let head_tree = resolve_head_tree(repo)?;

    let mut opts = DiffOptions::new();
    if let Some(path) = path {
        opts.pathspec(path).disable_pathspec_match(true);
    }

    let mut diff = repo
        .diff_tree_to_index(head_tree.as_ref(), None, Some(&mut opts))
        .map_err(GitError::Operation)?;

    if path.is_none() {
        let mut find = DiffFindOptions::new();
        find.renames(true).copies(true);
        diff.find_similar(Some(&mut find))
            .map_err(GitError::Operation)?;
    }

    Ok(diff)
}

fn delta_path(delta: &git2::DiffDelta<'_>) -> Option<String> {
    delta
        .new_file()
        .path()
        .or_else(|| delta.old_file().path())
        .map(|p| p.to_string_lossy().to_string())
        .filter(|p| !p.is_empty())
}

fn status_code(delta: Delta) -> &'static str {
    match delta {
        Delta::Added | Delta::Untracked => "A",
        Delta::Deleted => "D",
        Delta::Renamed => "R",
        Delta::Copied => "C",
        Delta::Conflicted => "U",
        _ => "M",
    }
}

/// Render a diff as unified patch text, including file headers.
fn render_patch(diff: &Diff<'_>) -> Result<String, GitError> {
    let mut text = String::new();
    diff.print(DiffFormat::Patch, |_delta, _hunk, line| {
        let origin = line.origin();
        if matches!(origin, '+' | '-' | ' ') {
            text.push(origin);
        }
        text.push_str(&String::from_utf8_lossy(line.content()));
        true
    })
    .map_err(GitError::Operation)?;
    Ok(text)
}
