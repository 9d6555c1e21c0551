use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Local;
use tracing::debug;

use crate::types::{
    initial_content, LogEntry, Speaker, CRITIC_HEADING, GENERATOR_HEADING, PLACEHOLDERS,
};

/// Append-only markdown conversation between a generator and the critic
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationLog {
    entries: Vec<LogEntry>,
}

impl ConversationLog {
    /// Split the file into sections. Text before the first heading is ignored.
    pub fn parse(text: &str) -> Self {
        let mut entries = Vec::new();
        let mut current: Option<(Speaker, Option<String>, Vec<&str>)> = None;

        for line in text.lines() {
            if let Some((speaker, rest)) = Speaker::from_heading(line) {
                if let Some(entry) = current.take() {
                    entries.push(finish(entry));
                }
                let stamp = (!rest.is_empty()).then(|| rest.to_string());
                current = Some((speaker, stamp, Vec::new()));
            } else if let Some((_, _, body)) = current.as_mut() {
                body.push(line);
            }
        }
        if let Some(entry) = current {
            entries.push(finish(entry));
        }

        Self { entries }
    }

    /// Read and parse a conversation file
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read conversation file: {:?}", path))?;
        Ok(Self::parse(&text))
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn count(&self, speaker: Speaker) -> usize {
        self.entries.iter().filter(|e| e.speaker == speaker).count()
    }

    /// The latest generator section, if it has not been reviewed yet and holds
    /// more than the placeholder text
    pub fn pending_submission(&self) -> Option<&str> {
        if self.count(Speaker::Generator) <= self.count(Speaker::Critic) {
            return None;
        }
        self.entries
            .iter()
            .rev()
            .find(|e| e.speaker == Speaker::Generator)
            .filter(|e| !e.is_placeholder())
            .map(|e| e.body.as_str())
    }

    /// Create the file with its introduction if it does not exist yet.
    /// Returns whether a file was created.
    pub fn initialize(path: &Path) -> Result<bool> {
        if path.exists() {
            return Ok(false);
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {:?}", parent))?;
        }
        fs::write(path, initial_content())
            .with_context(|| format!("Failed to create conversation file: {:?}", path))?;
        Ok(true)
    }

    /// Append a timestamped critic section followed by a fresh generator placeholder
    pub fn append_review(path: &Path, review: &str) -> Result<()> {
        let stamp = Local::now().format("%H:%M:%S").to_string();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read conversation file: {:?}", path))?;
        let updated = render_review(&content, review, &stamp);
        fs::write(path, updated)
            .with_context(|| format!("Failed to write conversation file: {:?}", path))?;
        debug!(path = ?path, "Appended review");
        Ok(())
    }
}

fn finish((speaker, stamp, body): (Speaker, Option<String>, Vec<&str>)) -> LogEntry {
    LogEntry {
        speaker,
        stamp,
        body: body.join("\n").trim().to_string(),
    }
}

fn render_review(content: &str, review: &str, stamp: &str) -> String {
    format!(
        "{}\n\n{} ({})\n{}\n\n{}\n{}\n",
        content.trim_end(),
        CRITIC_HEADING,
        stamp,
        review.trim(),
        GENERATOR_HEADING,
        PLACEHOLDERS[1],
    )
}
