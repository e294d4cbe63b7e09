//! Git operations
//!
//! Resolves refs to commit SHAs through the object database (gix) and lists
//! changed files between two commits by shelling out to the VCS diff
//! command.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Git operation errors
#[derive(Error, Debug)]
pub enum GitError {
    /// Not a git repository
    #[error("Invalid repository at '{path}': {error}")]
    InvalidRepository { path: PathBuf, error: String },

    /// Ref not found
    #[error("Ref '{reference}' not found in repository")]
    RefNotFound { reference: String },

    /// Failed to resolve ref to SHA
    #[error("Failed to resolve ref '{reference}' to SHA: {error}")]
    ResolveFailed { reference: String, error: String },

    /// Diff command failed
    #[error("Diff between '{base}' and '{head}' failed: {error}")]
    DiffFailed {
        base: String,
        head: String,
        error: String,
    },
}

/// Git repository operations
#[derive(Debug)]
pub struct GitOperations {
    /// Repository working directory
    repo_dir: PathBuf,
}

impl GitOperations {
    /// Create a git operations handler for a repository directory
    pub fn new(repo_dir: PathBuf) -> Self {
        Self { repo_dir }
    }

    /// Get the repository directory
    pub fn repo_dir(&self) -> &PathBuf {
        &self.repo_dir
    }

    /// Resolve a ref (branch, tag, HEAD, or full SHA) to its commit SHA
    pub fn resolve_ref(&self, reference: &str) -> Result<String, GitError> {
        // A full hex SHA needs no repository lookup
        if reference.len() == 40 && reference.chars().all(|c| c.is_ascii_hexdigit()) {
            return Ok(reference.to_lowercase());
        }

        let repo = gix::open(&self.repo_dir).map_err(|e| GitError::InvalidRepository {
            path: self.repo_dir.clone(),
            error: e.to_string(),
        })?;

        let candidates = [
            reference.to_string(),
            format!("refs/tags/{reference}"),
            format!("refs/heads/{reference}"),
            format!("refs/remotes/origin/{reference}"),
        ];

        for candidate in &candidates {
            if let Ok(mut found) = repo.find_reference(candidate.as_str()) {
                let commit = found
                    .peel_to_commit()
                    .map_err(|e| GitError::ResolveFailed {
                        reference: reference.to_string(),
                        error: e.to_string(),
                    })?;
                return Ok(commit.id().to_hex().to_string());
            }
        }

        Err(GitError::RefNotFound {
            reference: reference.to_string(),
        })
    }

    /// List files changed between two commits, repository-relative,
    /// in diff order
    pub async fn changed_files(
        &self,
        base_sha: &str,
        head_sha: &str,
    ) -> Result<Vec<String>, GitError> {
        let output = tokio::process::Command::new("git")
            .args(["diff", "--name-only", base_sha, head_sha])
            .current_dir(&self.repo_dir)
            .output()
            .await
            .map_err(|e| GitError::DiffFailed {
                base: base_sha.to_string(),
                head: head_sha.to_string(),
                error: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(GitError::DiffFailed {
                base: base_sha.to_string(),
                head: head_sha.to_string(),
                error: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect())
    }
}
