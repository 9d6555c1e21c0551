use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;

use revloop_logging::{LogFormat, Logger};
use revloop_oracle::{create_oracle, CommandOracle, Oracle, OracleBackend, OracleConfig};

use crate::config::RevloopConfig;

/// Flags shared by every subcommand
#[derive(Debug, Clone)]
pub struct GlobalOptions {
    pub agent: Option<OracleBackend>,
    pub model: Option<String>,
    pub timeout_secs: Option<u64>,
    pub log_format: LogFormat,
    pub log_dir: Option<PathBuf>,
}

/// Everything a subcommand needs once flags and `revloop.toml` are merged
pub struct Runtime {
    pub config: RevloopConfig,
    pub oracle: Arc<dyn Oracle>,
    pub logger: Arc<Logger>,
}

impl Runtime {
    /// Resolve config for `working_dir` and make sure the agent CLI is installed.
    /// CLI flags win over file values.
    pub async fn prepare(options: &GlobalOptions, working_dir: &Path, quiet: bool) -> Result<Self> {
        let config = RevloopConfig::discover(working_dir)?.unwrap_or_default();

        let oracle = build_oracle(options, &config, working_dir)?;
        if !oracle.is_available().await {
            anyhow::bail!(
                "Agent '{}' is not available at {}. Make sure it's installed and in PATH.",
                oracle.backend(),
                oracle.binary_path().display()
            );
        }
        info!(agent = %oracle.backend(), working_dir = %working_dir.display(), "Oracle ready");

        let logger = if quiet {
            Logger::quiet()
        } else {
            match options.log_dir {
                Some(ref dir) => Logger::with_file(options.log_format, &dir.join("events.jsonl"))
                    .with_context(|| format!("Failed to open event log in {}", dir.display()))?,
                None => Logger::new(options.log_format),
            }
        };

        Ok(Self {
            config,
            oracle: Arc::new(oracle),
            logger: Arc::new(logger),
        })
    }
}

/// Command oracle from CLI flags layered over `revloop.toml`
fn build_oracle(
    options: &GlobalOptions,
    config: &RevloopConfig,
    working_dir: &Path,
) -> Result<CommandOracle> {
    let backend = match (options.agent, config.agent.as_deref()) {
        (Some(backend), _) => backend,
        (None, Some(name)) => name.parse().map_err(anyhow::Error::msg)?,
        (None, None) => OracleBackend::ClaudeCode,
    };

    let mut oracle_config = OracleConfig::new(working_dir.to_path_buf());
    if let Some(model) = options.model.clone().or_else(|| config.model.clone()) {
        oracle_config = oracle_config.with_model(model);
    }
    if let Some(secs) = options.timeout_secs.or(config.timeout_secs) {
        oracle_config = oracle_config.with_timeout(Duration::from_secs(secs));
    }
    for (key, value) in &config.env {
        oracle_config = oracle_config.with_env(key.clone(), value.clone());
    }

    let oracle = create_oracle(backend, oracle_config);
    Ok(match config.agent_path {
        Some(ref path) => oracle.with_binary_path(path.clone()),
        None => oracle,
    })
}

pub fn current_dir() -> Result<PathBuf> {
    std::env::current_dir().context("Failed to get current directory")
}

/// Read all of stdin when it is piped; `None` on a terminal
pub fn read_piped_stdin() -> Result<Option<String>> {
    use std::io::{IsTerminal, Read};

    let mut stdin = std::io::stdin();
    if stdin.is_terminal() {
        return Ok(None);
    }
    let mut buf = String::new();
    stdin
        .read_to_string(&mut buf)
        .context("Failed to read stdin")?;
    Ok(Some(buf))
}
