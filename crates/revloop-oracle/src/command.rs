use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::debug;

use revloop_roles::Role;

use crate::{Message, MessageRole, Oracle, OracleBackend, OracleConfig, OracleError, ProcessSpawner};

/// Oracle backed by a locally installed assistant CLI run in non-interactive mode
pub struct CommandOracle {
    backend: OracleBackend,
    binary_path: PathBuf,
    config: OracleConfig,
}

impl CommandOracle {
    pub fn new(backend: OracleBackend, config: OracleConfig) -> Self {
        let binary_path = match backend {
            OracleBackend::ClaudeCode => PathBuf::from("claude"),
            OracleBackend::OpenCode => PathBuf::from("opencode"),
        };
        Self {
            backend,
            binary_path,
            config,
        }
    }

    pub fn with_binary_path(mut self, path: PathBuf) -> Self {
        self.binary_path = path;
        self
    }

    pub fn backend(&self) -> OracleBackend {
        self.backend
    }

    pub fn binary_path(&self) -> &Path {
        &self.binary_path
    }

    /// Check if the backend CLI is installed
    pub async fn is_available(&self) -> bool {
        Command::new(&self.binary_path)
            .arg("--version")
            .output()
            .await
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    fn build_args<'a>(&'a self, role: &'a Role, prompt: &'a str) -> Vec<&'a str> {
        match self.backend {
            OracleBackend::ClaudeCode => {
                let mut args = vec!["--print", "--system-prompt", role.instructions.as_str()];
                if let Some(ref model) = self.config.model {
                    args.push("--model");
                    args.push(model);
                }
                // `--` keeps prompts starting with '-' from being read as options
                args.push("--");
                args.push(prompt);
                args
            }
            OracleBackend::OpenCode => {
                let mut args = vec!["run"];
                if let Some(ref model) = self.config.model {
                    args.push("--model");
                    args.push(model);
                }
                args.push("--prompt");
                args.push(prompt);
                args
            }
        }
    }
}

#[async_trait]
impl Oracle for CommandOracle {
    fn name(&self) -> &str {
        match self.backend {
            OracleBackend::ClaudeCode => "Claude Code",
            OracleBackend::OpenCode => "OpenCode",
        }
    }

    async fn complete(
        &self,
        role: &Role,
        history: &[Message],
        temperature: f32,
    ) -> Result<String, OracleError> {
        let transcript = render_transcript(history);
        // OpenCode has no system prompt flag, so the instructions lead the prompt
        let prompt = match self.backend {
            OracleBackend::ClaudeCode => transcript,
            OracleBackend::OpenCode => format!("{}\n\n---\n\n{}", role.instructions, transcript),
        };

        // Neither CLI exposes sampling temperature
        debug!(
            oracle = self.name(),
            role = %role.id,
            temperature,
            prompt_len = prompt.len(),
            "Requesting completion"
        );

        let args = self.build_args(role, &prompt);
        let output = ProcessSpawner::spawn(&self.binary_path, &args, &self.config).await?;

        if !output.success() {
            return Err(OracleError::ExecutionFailed(format!(
                "{} exited with code {}: {}",
                self.name(),
                output.exit_code,
                output.stderr_excerpt(5)
            )));
        }

        let text = output.stdout.trim();
        if text.is_empty() {
            return Err(OracleError::EmptyResponse);
        }
        Ok(text.to_string())
    }
}

/// Flatten a message history into a single prompt.
///
/// A lone user message is sent verbatim; longer histories are laid out as
/// labelled sections so the model can see who said what.
pub fn render_transcript(history: &[Message]) -> String {
    if let [only] = history {
        if only.role == MessageRole::User {
            return only.content.clone();
        }
    }

    let mut out = String::from("Conversation so far:\n");
    for message in history {
        let label = match message.role {
            MessageRole::User => "User",
            MessageRole::Assistant => "You (previous response)",
        };
        out.push_str(&format!("\n## {}\n{}\n", label, message.content));
    }
    out.push_str("\nRespond to the latest User message.");
    out
}
