//! Per-file diff collection with size bounds.

use std::fmt;

use futures::future::try_join_all;
use serde::Serialize;
use tracing::debug;

use crate::config::DiffLimits;
use crate::error::SuggestError;
use crate::git::VcsSource;

/// Marker appended to a diff cut at the per-file cap.
pub const TRUNCATION_MARKER: &str = "\n... (truncated)";

/// Change kind of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Added,
    Modified,
    Deleted,
    Renamed,
    Copied,
    Updated,
}

impl FileStatus {
    /// Map a porcelain status code. Only the index column is read;
    /// anything unrecognized is `Modified`.
    pub fn from_code(code: &str) -> Self {
        match code.trim().chars().next() {
            Some('A') => FileStatus::Added,
            Some('D') => FileStatus::Deleted,
            Some('R') => FileStatus::Renamed,
            Some('C') => FileStatus::Copied,
            Some('U') => FileStatus::Updated,
            _ => FileStatus::Modified,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileStatus::Added => "added",
            FileStatus::Modified => "modified",
            FileStatus::Deleted => "deleted",
            FileStatus::Renamed => "renamed",
            FileStatus::Copied => "copied",
            FileStatus::Updated => "updated",
        }
    }
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One changed file as seen by the rest of the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChange {
    pub filename: String,
    /// Possibly truncated or summarized diff text.
    pub diff: String,
    pub additions: usize,
    pub deletions: usize,
    pub status: FileStatus,
}

impl FileChange {
    /// Build a change from raw diff text, counting lines before any bounding.
    pub fn from_raw(filename: impl Into<String>, diff: String, status: FileStatus) -> Self {
        let (additions, deletions) = count_changes(&diff);
        Self {
            filename: filename.into(),
            diff,
            additions,
            deletions,
            status,
        }
    }
}

/// Count added and removed lines, skipping `+++`/`---` file headers.
pub fn count_changes(diff: &str) -> (usize, usize) {
    diff.lines().fold((0, 0), |(adds, dels), line| {
        if line.starts_with('+') && !line.starts_with("+++") {
            (adds + 1, dels)
        } else if line.starts_with('-') && !line.starts_with("---") {
            (adds, dels + 1)
        } else {
            (adds, dels)
        }
    })
}

/// Cut `diff` to at most `max_chars` characters and mark the cut.
pub fn truncate_diff(diff: &str, max_chars: usize) -> String {
    match diff.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}{}", &diff[..cut], TRUNCATION_MARKER),
        None => diff.to_string(),
    }
}

/// Keep the first and last `context` lines, noting how many were elided.
pub fn summarize_diff(diff: &str, context: usize) -> String {
    let lines: Vec<&str> = diff.lines().collect();
    if lines.len() <= context * 2 {
        return diff.to_string();
    }

    let skipped = lines.len() - context * 2;
    let mut out = lines[..context].join("\n");
    out.push_str(&format!("\n... [{skipped} lines skipped] ...\n"));
    out.push_str(&lines[lines.len() - context..].join("\n"));
    out
}

/// Apply the aggregate and per-file bounds to a freshly collected set.
pub fn bound_changes(changes: &mut [FileChange], limits: &DiffLimits) {
    let total: usize = changes.iter().map(|c| c.diff.len()).sum();
    if total > limits.max_total_diff_bytes {
        debug!(
            "Aggregate diff is {} bytes (limit {}), summarizing",
            total, limits.max_total_diff_bytes
        );
        for change in changes.iter_mut() {
            change.diff = summarize_diff(&change.diff, limits.summary_context_lines);
        }
    }

    for change in changes.iter_mut() {
        change.diff = truncate_diff(&change.diff, limits.max_file_diff_chars);
    }
}

/// Reads every changed file from a [`VcsSource`].
pub struct DiffCollector<'a> {
    vcs: &'a dyn VcsSource,
    limits: DiffLimits,
}

impl<'a> DiffCollector<'a> {
    pub fn new(vcs: &'a dyn VcsSource, limits: DiffLimits) -> Self {
        Self { vcs, limits }
    }

    /// Collect every changed file reported by the collaborator.
    ///
    /// Fails with `IdentityNotConfigured` before reading anything if no git
    /// identity is set, and with `NoChangesFound` if nothing changed.
    pub async fn collect_all(&self) -> Result<Vec<FileChange>, SuggestError> {
        if !self.vcs.has_identity_configured().await? {
            return Err(SuggestError::IdentityNotConfigured);
        }

        let paths = self.vcs.list_changed_files().await?;
        if paths.is_empty() {
            return Err(SuggestError::NoChangesFound);
        }

        self.collect(&paths).await
    }

    /// One [`FileChange`] per path, in the order given.
    ///
    /// Diff and status reads for all paths are issued concurrently.
    pub async fn collect(&self, paths: &[String]) -> Result<Vec<FileChange>, SuggestError> {
        let reads = paths.iter().map(|path| async move {
            let (diff, code) =
                futures::try_join!(self.vcs.file_diff(path), self.vcs.file_status_code(path))?;
            Ok::<_, SuggestError>(FileChange::from_raw(
                path.clone(),
                diff,
                FileStatus::from_code(&code),
            ))
        });

        let mut changes = try_join_all(reads).await?;
        bound_changes(&mut changes, &self.limits);
        Ok(changes)
    }
}
