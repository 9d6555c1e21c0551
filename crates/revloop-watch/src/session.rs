use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::debug;

use crate::parser::ConversationLog;

/// Tracks one conversation file between change notifications
#[derive(Debug)]
pub struct WatchSession {
    path: PathBuf,
    last_content: Option<String>,
}

impl WatchSession {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            last_content: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Re-read the file. Returns the submission awaiting review, if the
    /// content changed since the last poll and one is pending.
    pub fn poll(&mut self) -> Result<Option<String>> {
        let content = std::fs::read_to_string(&self.path)?;
        if self.last_content.as_deref() == Some(content.as_str()) {
            return Ok(None);
        }

        let pending = ConversationLog::parse(&content)
            .pending_submission()
            .map(str::to_string);
        debug!(pending = pending.is_some(), "Conversation file changed");
        self.last_content = Some(content);
        Ok(pending)
    }

    /// Append `review` and remember the resulting content, so the write does
    /// not trigger another review.
    pub fn record_review(&mut self, review: &str) -> Result<()> {
        ConversationLog::append_review(&self.path, review)?;
        self.last_content = Some(std::fs::read_to_string(&self.path)?);
        Ok(())
    }
}
