use git2::{Diff, DiffFormat, DiffOptions, Repository};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum GitError {
    #[error("Not a git repository: {0}")]
    NotARepo(String),

    #[error("Git operation failed: {0}")]
    GitOperationFailed(#[from] git2::Error),
}

/// Which side of the index a diff compares
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffScope {
    /// Working tree against the index, like `git diff`
    #[default]
    Unstaged,
    /// Index against HEAD, like `git diff --staged`
    Staged,
}

/// Summary of diff statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffSummary {
    pub files_changed: usize,
    pub insertions: usize,
    pub deletions: usize,
}

/// Reads uncommitted changes out of a repository
#[derive(Debug, Clone, Default)]
pub struct DiffCapture {
    scope: DiffScope,
    paths: Vec<String>,
}

impl DiffCapture {
    pub fn new(scope: DiffScope) -> Self {
        Self {
            scope,
            paths: Vec::new(),
        }
    }

    /// Limit the diff to these pathspecs, like `git diff -- <paths>`
    pub fn with_paths(mut self, paths: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.paths = paths.into_iter().map(Into::into).collect();
        self
    }

    pub fn scope(&self) -> DiffScope {
        self.scope
    }

    /// Unified diff text of the changes in scope
    pub fn capture_diff(&self, working_dir: &Path) -> Result<String, GitError> {
        let repo = open(working_dir)?;
        let diff = self.diff(&repo)?;

        let mut diff_text = String::new();
        diff.print(DiffFormat::Patch, |_delta, _hunk, line| {
            if let origin @ ('+' | '-' | ' ') = line.origin() {
                diff_text.push(origin);
            }
            if let Ok(content) = std::str::from_utf8(line.content()) {
                diff_text.push_str(content);
            }
            true
        })?;

        debug!(scope = ?self.scope, paths = ?self.paths, diff_len = diff_text.len(), "Captured git diff");
        Ok(diff_text)
    }

    /// Paths touched by the changes in scope, in diff order
    pub fn changed_files(&self, working_dir: &Path) -> Result<Vec<String>, GitError> {
        let repo = open(working_dir)?;
        let diff = self.diff(&repo)?;

        let files = diff
            .deltas()
            .filter_map(|delta| {
                delta
                    .new_file()
                    .path()
                    .or_else(|| delta.old_file().path())
                    .map(|p| p.to_string_lossy().into_owned())
            })
            .collect();
        Ok(files)
    }

    /// Get a summary of changes (for logging)
    pub fn capture_summary(&self, working_dir: &Path) -> Result<DiffSummary, GitError> {
        let repo = open(working_dir)?;
        let stats = self.diff(&repo)?.stats()?;

        Ok(DiffSummary {
            files_changed: stats.files_changed(),
            insertions: stats.insertions(),
            deletions: stats.deletions(),
        })
    }

    fn diff<'r>(&self, repo: &'r Repository) -> Result<Diff<'r>, GitError> {
        let mut opts = DiffOptions::new();
        for path in &self.paths {
            opts.pathspec(path);
        }
        let diff = match self.scope {
            DiffScope::Unstaged => repo.diff_index_to_workdir(None, Some(&mut opts))?,
            DiffScope::Staged => {
                // Unborn HEAD: everything in the index counts as staged
                let head_tree = match repo.head() {
                    Ok(head) => Some(head.peel_to_tree()?),
                    Err(e) if e.code() == git2::ErrorCode::UnbornBranch => None,
                    Err(e) => return Err(GitError::GitOperationFailed(e)),
                };
                repo.diff_tree_to_index(head_tree.as_ref(), None, Some(&mut opts))?
            }
        };
        Ok(diff)
    }
}

fn open(working_dir: &Path) -> Result<Repository, GitError> {
    Repository::discover(working_dir)
        .map_err(|_| GitError::NotARepo(working_dir.display().to_string()))
}
