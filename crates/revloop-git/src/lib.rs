//! # revloop-git
//!
//! Context provider for team reviews: reads uncommitted changes out of a
//! git repository with `git2`.
//!
//! ## Key Types
//!
//! - [`DiffCapture`] - unified diff, changed paths and stats for a [`DiffScope`]
//! - [`ChangeSet`] - everything captured at once, plus the reviewer context built from it
//!
//! ## Usage
//!
//! ```rust,ignore
//! use revloop_git::{ChangeSet, DiffScope};
//!
//! let changes = ChangeSet::capture(Path::new("."), DiffScope::Staged)?;
//! let context = changes.shared_context(Some("Refactored navigation stack"));
//! ```
//!
//! `DiffScope::Unstaged` mirrors `git diff`; `DiffScope::Staged` mirrors
//! `git diff --staged`. Untracked files are not part of either.

mod context;
mod diff;

pub use context::ChangeSet;
pub use diff::{DiffCapture, DiffScope, DiffSummary, GitError};
