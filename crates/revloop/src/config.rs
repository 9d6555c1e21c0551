//! Project configuration file support for revloop.
//!
//! Loads configuration from `revloop.toml` in the working directory, falling
//! back to `revloop/config.toml` in the user config directory.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use revloop_roles::{ProjectProfile, RoleOverride, RoleRegistry, RoleSet};

/// Project-level configuration loaded from `revloop.toml`
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct RevloopConfig {
    /// Built-in generator/critic pair to start from
    pub role_set: Option<RoleSet>,
    /// Iteration budget for `converge`
    pub max_iterations: Option<usize>,
    /// Assistant CLI backing the oracle
    pub agent: Option<String>,
    /// Agent executable, when it is not on PATH under its usual name
    pub agent_path: Option<PathBuf>,
    /// Model to use (if the agent supports it)
    pub model: Option<String>,
    /// Per-call timeout in seconds
    pub timeout_secs: Option<u64>,
    /// Extra environment for the agent process
    #[serde(default)]
    pub env: HashMap<String, String>,
    /// Project context added to reviewer instructions
    pub project: Option<ProjectProfile>,
    /// Overrides merged into the role registry by id
    #[serde(default)]
    pub roles: Vec<RoleOverride>,
    /// Replacement perspective list for team reviews
    #[serde(default)]
    pub perspectives: Vec<RoleOverride>,
}

/// The config file name
pub const CONFIG_FILE_NAME: &str = "revloop.toml";

impl RevloopConfig {
    /// Load configuration from the working directory.
    ///
    /// Returns:
    /// - `Ok(Some(config))` if file exists and parses successfully
    /// - `Ok(None)` if file does not exist
    /// - `Err(...)` if file exists but fails to parse (hard error)
    pub fn load(working_dir: &Path) -> Result<Option<Self>> {
        Self::load_file(&working_dir.join(CONFIG_FILE_NAME))
    }

    /// Working-directory config first, then the user-level one
    pub fn discover(working_dir: &Path) -> Result<Option<Self>> {
        if let Some(config) = Self::load(working_dir)? {
            return Ok(Some(config));
        }
        match user_config_path() {
            Some(path) => Self::load_file(&path),
            None => Ok(None),
        }
    }

    fn load_file(config_path: &Path) -> Result<Option<Self>> {
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;

        let config: RevloopConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;

        Ok(Some(config))
    }

    /// Build the role registry: CLI role set > file role set > general,
    /// then role overrides, then the perspective list.
    pub fn registry(&self, cli_role_set: Option<RoleSet>) -> Result<RoleRegistry> {
        let role_set = cli_role_set.or(self.role_set).unwrap_or_default();
        let registry = RoleRegistry::new(role_set)
            .with_overrides(&self.roles)
            .context("Invalid [[roles]] entry")?
            .with_perspectives(&self.perspectives)
            .context("Invalid [[perspectives]] entry")?;
        Ok(registry)
    }
}

fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("revloop").join("config.toml"))
}
