use serde::{Deserialize, Serialize};

/// Heading that opens a generator section
pub const GENERATOR_HEADING: &str = "## Generator:";
/// Heading that opens a critic section
pub const CRITIC_HEADING: &str = "## Critic:";

/// Bodies that mark an unfilled generator section
pub const PLACEHOLDERS: &[&str] = &["(Write your code or questions here)", "(Your response here)"];

/// Who wrote a section of the conversation file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    Generator,
    Critic,
}

impl Speaker {
    pub fn heading(&self) -> &'static str {
        match self {
            Speaker::Generator => GENERATOR_HEADING,
            Speaker::Critic => CRITIC_HEADING,
        }
    }

    /// Match a heading line, returning the speaker and whatever follows the colon
    pub(crate) fn from_heading(line: &str) -> Option<(Self, &str)> {
        [Speaker::Generator, Speaker::Critic]
            .into_iter()
            .find_map(|speaker| {
                line.strip_prefix(speaker.heading())
                    .map(|rest| (speaker, rest.trim()))
            })
    }
}

/// One section of the conversation file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub speaker: Speaker,
    /// Text after the heading, e.g. `(14:02:11)`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stamp: Option<String>,
    pub body: String,
}

impl LogEntry {
    pub fn is_placeholder(&self) -> bool {
        self.body.is_empty() || PLACEHOLDERS.contains(&self.body.as_str())
    }
}

/// Contents written to a conversation file that does not exist yet
pub fn initial_content() -> String {
    format!(
        "# Review Conversation

This file is shared between a code generator and the reviewer.

## How to use:
1. Write code or questions under a \"{generator}\" section
2. The reviewer answers under \"{critic}\"
3. Continue until the reviewer approves

---

{generator}
{placeholder}

",
        generator = GENERATOR_HEADING,
        critic = CRITIC_HEADING,
        placeholder = PLACEHOLDERS[0],
    )
}
