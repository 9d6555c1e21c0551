use serde::{Deserialize, Serialize};

const DEFAULT_NAME: &str = "Project";
const DEFAULT_LANGUAGE: &str = "general";

const GENERAL_FOCUS: &[&str] = &[
    "Code quality and best practices",
    "Error handling",
    "Performance considerations",
    "Security issues",
];

/// Project-specific context injected into reviewer instructions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectProfile {
    pub name: String,
    pub language: String,
    pub patterns: Vec<String>,
    pub review_focus: Vec<String>,
}

impl Default for ProjectProfile {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
            patterns: Vec::new(),
            review_focus: Vec::new(),
        }
    }
}

impl ProjectProfile {
    /// Whether the profile carries anything beyond the defaults
    pub fn is_named(&self) -> bool {
        !self.name.is_empty() && self.name != DEFAULT_NAME
    }

    /// Focus areas: explicit list, else the language defaults, else the general list
    pub fn effective_focus(&self) -> Vec<String> {
        if !self.review_focus.is_empty() {
            return self.review_focus.clone();
        }
        language_focus(&self.language)
            .unwrap_or(GENERAL_FOCUS)
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    /// Append project context to a reviewer's base instructions
    pub fn augment(&self, base: &str) -> String {
        let mut parts = vec![base.to_string()];

        if self.is_named() {
            parts.push(format!("\n## Project: {}", self.name));
        }

        if !self.language.is_empty() && self.language != DEFAULT_LANGUAGE {
            parts.push(format!("\nLanguage/Framework: {}", self.language));
        }

        if !self.patterns.is_empty() {
            parts.push("\n## Project-Specific Patterns".to_string());
            parts.extend(self.patterns.iter().map(|p| format!("- {}", p)));
        }

        let focus = self.effective_focus();
        if !focus.is_empty() {
            parts.push("\n## Review Focus Areas".to_string());
            parts.extend(focus.iter().map(|f| format!("- {}", f)));
        }

        parts.join("\n")
    }
}

fn language_focus(language: &str) -> Option<&'static [&'static str]> {
    match language.to_lowercase().as_str() {
        "swift" => Some(&[
            "Memory management (retain cycles, weak/unowned)",
            "Threading (MainActor, async/await patterns)",
            "SwiftUI state management (@State, @Binding, @Observable)",
            "Error handling (no force unwraps)",
            "Performance (unnecessary view rebuilds)",
        ]),
        "python" => Some(&[
            "Type hints and documentation",
            "Error handling and edge cases",
            "Performance and efficiency",
            "Security (input validation, injection)",
        ]),
        "typescript" => Some(&[
            "Type safety and proper typing",
            "Null/undefined handling",
            "Async/await patterns",
            "React hooks rules (if applicable)",
        ]),
        "javascript" => Some(&[
            "Error handling",
            "Async patterns (promises, callbacks)",
            "Security (XSS, injection)",
            "Performance",
        ]),
        _ => None,
    }
}
