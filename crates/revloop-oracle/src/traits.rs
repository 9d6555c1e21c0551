use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use revloop_roles::Role;

/// Errors that can occur while asking the oracle for a completion
#[derive(Error, Debug)]
pub enum OracleError {
    #[error("Failed to spawn oracle process: {0}")]
    SpawnFailed(#[from] std::io::Error),

    #[error("Oracle call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Oracle execution failed: {0}")]
    ExecutionFailed(String),

    #[error("Oracle returned an empty response")]
    EmptyResponse,
}

/// Who authored a message in the history handed to the oracle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

/// A single message of the history sent with a completion request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// Configuration for oracle execution
#[derive(Debug, Clone)]
pub struct OracleConfig {
    /// Working directory for the spawned process
    pub working_dir: PathBuf,
    /// Per-call timeout (None = no limit)
    pub timeout: Option<Duration>,
    /// Additional environment variables
    pub env_vars: HashMap<String, String>,
    /// Model to use (if the backend supports it)
    pub model: Option<String>,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            working_dir: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            timeout: None,
            env_vars: HashMap::new(),
            model: None,
        }
    }
}

impl OracleConfig {
    pub fn new(working_dir: PathBuf) -> Self {
        Self {
            working_dir,
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_model(mut self, model: String) -> Self {
        self.model = Some(model);
        self
    }

    pub fn with_env(mut self, key: String, value: String) -> Self {
        self.env_vars.insert(key, value);
        self
    }
}

/// Supported command-line backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OracleBackend {
    ClaudeCode,
    OpenCode,
}

impl std::fmt::Display for OracleBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OracleBackend::ClaudeCode => write!(f, "claude-code"),
            OracleBackend::OpenCode => write!(f, "opencode"),
        }
    }
}

impl std::str::FromStr for OracleBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "claude" | "claude-code" | "claudecode" => Ok(OracleBackend::ClaudeCode),
            "opencode" | "open-code" => Ok(OracleBackend::OpenCode),
            _ => Err(format!("Unknown oracle backend: {}", s)),
        }
    }
}

/// Stateless text-generation service invoked with a role and a message history
#[async_trait]
pub trait Oracle: Send + Sync {
    /// Human-readable name of the oracle
    fn name(&self) -> &str;

    /// Produce a completion for `history`, speaking as `role`
    async fn complete(
        &self,
        role: &Role,
        history: &[Message],
        temperature: f32,
    ) -> Result<String, OracleError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_from_str_aliases() {
        assert_eq!(
            "Claude".parse::<OracleBackend>().unwrap(),
            OracleBackend::ClaudeCode
        );
        assert_eq!(
            "open-code".parse::<OracleBackend>().unwrap(),
            OracleBackend::OpenCode
        );
        assert!("cursor".parse::<OracleBackend>().is_err());
    }

    #[test]
    fn test_message_constructors() {
        let user = Message::user("hi");
        assert_eq!(user.role, MessageRole::User);
        let assistant = Message::assistant(String::from("hello"));
        assert_eq!(assistant.role, MessageRole::Assistant);
        assert_eq!(assistant.content, "hello");
    }
}
