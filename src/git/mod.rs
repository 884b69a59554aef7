//! Version-control collaborator: the git reads the suggestion pipeline needs.

pub mod repository;

use async_trait::async_trait;

use crate::error::GitError;

pub use repository::GitRepository;

/// Read access to a working tree's pending changes.
///
/// Implementations must be side-effect free: the diff collector issues
/// `file_diff` / `file_status_code` for many paths concurrently.
#[async_trait]
pub trait VcsSource: Send + Sync {
    /// Paths of the changed files, in a stable order.
    async fn list_changed_files(&self) -> Result<Vec<String>, GitError>;

    /// Unified diff text for one path.
    async fn file_diff(&self, path: &str) -> Result<String, GitError>;

    /// Short porcelain-style status code for one path (`A`, `M`, `D`, `R`, `C`, `U`).
    async fn file_status_code(&self, path: &str) -> Result<String, GitError>;

    /// Name of the checked-out branch.
    async fn current_branch(&self) -> Result<String, GitError>;

    /// Subject lines of the most recent commits, newest first.
    async fn recent_commit_subjects(&self, count: usize) -> Result<Vec<String>, GitError>;

    /// Whether `user.name` and `user.email` are both set.
    async fn has_identity_configured(&self) -> Result<bool, GitError>;
}
