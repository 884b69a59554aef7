//! Shared test utilities for integration tests.
//!
//! Not all functions are used by every test file, but they're shared across tests.
#![allow(dead_code)]

use std::path::{Path, PathBuf};

use git2::{Oid, Repository, Signature};

/// Get the path to test fixtures directory.
pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

/// Get the path to a provider response fixture.
pub fn response_fixture(name: &str) -> PathBuf {
    fixtures_dir().join("responses").join(name)
}

/// Read a fixture file as a string.
pub fn read_fixture(path: PathBuf) -> String {
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read fixture {:?}: {}", path, e))
}

/// A throwaway git repository for integration tests.
pub struct TestRepo {
    pub dir: tempfile::TempDir,
    pub repo: Repository,
}

impl TestRepo {
    /// Create a new empty git repository with an identity configured.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp directory");
        let repo = Self {
            repo: Repository::init(dir.path()).expect("Failed to init git repo"),
            dir,
        };
        let mut config = repo.repo.config().expect("Failed to open config");
        config
            .set_str("user.name", "Test User")
            .expect("Failed to set user.name");
        config
            .set_str("user.email", "test@example.com")
            .expect("Failed to set user.email");
        repo
    }

    /// Create a new empty git repository whose local config blanks the identity,
    /// shadowing any global `user.name` / `user.email`.
    pub fn without_identity() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp directory");
        let repo = Repository::init(dir.path()).expect("Failed to init git repo");
        let mut local = repo
            .config()
            .and_then(|c| c.open_level(git2::ConfigLevel::Local))
            .expect("Failed to open local config");
        local.set_str("user.name", "").expect("Failed to set user.name");
        local.set_str("user.email", "").expect("Failed to set user.email");
        Self { dir, repo }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write a file relative to the repository root, creating directories.
    pub fn write(&self, rel: &str, content: &str) {
        let full = self.dir.path().join(rel);
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create directories");
        }
        std::fs::write(full, content).expect("Failed to write file");
    }

    /// Write and stage a file.
    pub fn stage(&self, rel: &str, content: &str) {
        self.write(rel, content);
        let mut index = self.repo.index().expect("Failed to get index");
        index.add_path(Path::new(rel)).expect("Failed to add file");
        index.write().expect("Failed to write index");
    }

    /// Stage the removal of a tracked file.
    pub fn stage_removal(&self, rel: &str) {
        std::fs::remove_file(self.dir.path().join(rel)).expect("Failed to remove file");
        let mut index = self.repo.index().expect("Failed to get index");
        index.remove_path(Path::new(rel)).expect("Failed to remove from index");
        index.write().expect("Failed to write index");
    }

    /// Commit whatever is staged. Returns the commit OID.
    pub fn commit_index(&self, message: &str) -> Oid {
        let sig = Signature::now("Test User", "test@example.com").expect("Failed to create signature");
        let mut index = self.repo.index().expect("Failed to get index");
        let tree_id = index.write_tree().expect("Failed to write tree");
        let tree = self.repo.find_tree(tree_id).expect("Failed to find tree");

        let parent = self.repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent.iter().collect();

        self.repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .expect("Failed to create commit")
    }

    /// Stage `rel` with `content` and commit it.
    pub fn commit_file(&self, rel: &str, content: &str, message: &str) -> Oid {
        self.stage(rel, content);
        self.commit_index(message)
    }
}
