use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::diff::{DiffCapture, DiffScope, DiffSummary, GitError};

/// Uncommitted changes of a repository, ready to hand to reviewers
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChangeSet {
    pub scope: DiffScope,
    pub diff: String,
    pub files: Vec<String>,
    pub summary: DiffSummary,
}

impl ChangeSet {
    pub fn capture(working_dir: &Path, scope: DiffScope) -> Result<Self, GitError> {
        Self::capture_paths(working_dir, scope, &[])
    }

    /// Capture only the changes under `paths`; an empty list means everything
    pub fn capture_paths(
        working_dir: &Path,
        scope: DiffScope,
        paths: &[String],
    ) -> Result<Self, GitError> {
        let capture = DiffCapture::new(scope).with_paths(paths.iter().cloned());
        let change_set = Self {
            scope,
            diff: capture.capture_diff(working_dir)?,
            files: capture.changed_files(working_dir)?,
            summary: capture.capture_summary(working_dir)?,
        };
        info!(
            files = change_set.summary.files_changed,
            insertions = change_set.summary.insertions,
            deletions = change_set.summary.deletions,
            "Captured change set"
        );
        Ok(change_set)
    }

    pub fn is_empty(&self) -> bool {
        self.diff.trim().is_empty()
    }

    /// Shared context for reviewers: changed files, then whatever the developer said
    pub fn shared_context(&self, developer_context: Option<&str>) -> String {
        let mut parts = Vec::new();
        if !self.files.is_empty() {
            let files: Vec<String> = self.files.iter().map(|f| format!("- {}", f)).collect();
            parts.push(format!("## Changed Files\n{}", files.join("\n")));
        }
        if let Some(context) = developer_context.map(str::trim).filter(|c| !c.is_empty()) {
            parts.push(format!("## Developer Context\n{}", context));
        }
        parts.join("\n\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::tests::{committed_repo, stage};
    use std::fs;

    #[test]
    fn test_capture_and_context() {
        let dir = committed_repo();
        fs::write(dir.path().join("lib.rs"), "fn one() { todo!() }\n").unwrap();

        let changes = ChangeSet::capture(dir.path(), DiffScope::Unstaged).unwrap();
        assert!(!changes.is_empty());
        assert_eq!(changes.summary.files_changed, 1);

        let context = changes.shared_context(Some("  Filled in one()  "));
        assert_eq!(
            context,
            "## Changed Files\n- lib.rs\n\n## Developer Context\nFilled in one()"
        );
    }

    #[test]
    fn test_clean_tree_is_empty() {
        let dir = committed_repo();
        let changes = ChangeSet::capture(dir.path(), DiffScope::Staged).unwrap();
        assert!(changes.is_empty());
        assert!(changes.files.is_empty());
        assert_eq!(changes.shared_context(Some("   ")), "");
    }

    #[test]
    fn test_capture_paths_filters_files() {
        let dir = committed_repo();
        fs::write(dir.path().join("lib.rs"), "fn one() { 2 }\n").unwrap();
        fs::write(dir.path().join("extra.rs"), "fn extra() {}\n").unwrap();
        stage(dir.path(), "extra.rs");
        fs::write(dir.path().join("extra.rs"), "fn extra() { 1 }\n").unwrap();

        let changes =
            ChangeSet::capture_paths(dir.path(), DiffScope::Unstaged, &["extra.rs".to_string()])
                .unwrap();
        assert_eq!(changes.files, vec!["extra.rs"]);
        assert!(!changes.diff.contains("fn one()"));
    }

    #[test]
    fn test_staged_scope_ignores_worktree_edits() {
        let dir = committed_repo();
        fs::write(dir.path().join("new.rs"), "fn new() {}\n").unwrap();
        stage(dir.path(), "new.rs");
        fs::write(dir.path().join("lib.rs"), "fn changed() {}\n").unwrap();

        let changes = ChangeSet::capture(dir.path(), DiffScope::Staged).unwrap();
        assert_eq!(changes.files, vec!["new.rs"]);
        assert!(changes.shared_context(None).contains("- new.rs"));
    }
}
