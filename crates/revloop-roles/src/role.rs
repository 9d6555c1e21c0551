use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifier of the built-in generator role
pub const GENERATOR: &str = "generator";
/// Identifier of the built-in critic role
pub const CRITIC: &str = "critic";
/// Identifier of the built-in synthesis role
pub const LEAD_REVIEWER: &str = "lead-reviewer";
/// Identifier of the built-in single-shot reviewer role
pub const QUICK_REVIEWER: &str = "quick-reviewer";
/// Identifier of the built-in reviewer for git diffs
pub const DIFF_REVIEWER: &str = "diff-reviewer";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RoleError {
    #[error("Unknown role: {0}")]
    UnknownRole(String),

    #[error("Invalid role override: {0}")]
    InvalidOverride(String),
}

/// A persona the oracle speaks as. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Role {
    pub id: String,
    pub name: String,
    pub instructions: String,
    pub focus: Option<String>,
    pub temperature: f32,
}

impl Role {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        instructions: impl Into<String>,
        temperature: f32,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            instructions: instructions.into(),
            focus: None,
            temperature,
        }
    }

    pub fn with_focus(mut self, focus: impl Into<String>) -> Self {
        self.focus = Some(focus.into());
        self
    }

    /// Copy of this role with different instructions
    pub fn with_instructions(&self, instructions: impl Into<String>) -> Self {
        Self {
            instructions: instructions.into(),
            ..self.clone()
        }
    }

    pub fn focus_or_default(&self) -> &str {
        self.focus.as_deref().unwrap_or("General code quality")
    }
}

/// Which built-in generator/critic pair the registry starts from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleSet {
    #[default]
    General,
    Ios,
}

impl std::fmt::Display for RoleSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoleSet::General => write!(f, "general"),
            RoleSet::Ios => write!(f, "ios"),
        }
    }
}

impl std::str::FromStr for RoleSet {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "general" => Ok(RoleSet::General),
            "ios" | "swift" => Ok(RoleSet::Ios),
            _ => Err(format!("Unknown role set: {}", s)),
        }
    }
}

/// Externally supplied role data. Missing fields fall back to the built-in
/// entry with the same identifier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoleOverride {
    pub id: Option<String>,
    pub name: Option<String>,
    pub focus: Option<String>,
    pub instructions: Option<String>,
    pub temperature: Option<f32>,
}

impl RoleOverride {
    /// The identifier this override merges into: explicit id, else the slugged name
    pub fn key(&self) -> Result<String, RoleError> {
        match (&self.id, &self.name) {
            (Some(id), _) if !id.trim().is_empty() => Ok(id.trim().to_string()),
            (_, Some(name)) if !name.trim().is_empty() => Ok(slugify(name)),
            _ => Err(RoleError::InvalidOverride(
                "entry needs an id or a name".to_string(),
            )),
        }
    }

    /// Apply this override on top of an existing role
    pub fn apply_to(&self, base: &Role) -> Role {
        Role {
            id: base.id.clone(),
            name: self.name.clone().unwrap_or_else(|| base.name.clone()),
            instructions: self
                .instructions
                .clone()
                .unwrap_or_else(|| base.instructions.clone()),
            focus: self.focus.clone().or_else(|| base.focus.clone()),
            temperature: self.temperature.unwrap_or(base.temperature),
        }
    }
}

/// Lowercase, dash-separated identifier derived from a display name
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.trim().chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    slug.trim_end_matches('-').to_string()
}
