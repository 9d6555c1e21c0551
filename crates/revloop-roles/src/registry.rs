use std::collections::HashMap;
use tracing::debug;

use crate::perspectives::default_perspectives;
use crate::prompts;
use crate::{Prompts, Role, RoleError, RoleOverride, RoleSet};
use crate::{CRITIC, DIFF_REVIEWER, GENERATOR, LEAD_REVIEWER, QUICK_REVIEWER};

/// Maps role identifiers to roles.
///
/// Built once from a [`RoleSet`]; lookups never re-dispatch on the set.
#[derive(Debug, Clone)]
pub struct RoleRegistry {
    role_set: RoleSet,
    roles: HashMap<String, Role>,
    perspectives: Vec<String>,
}

impl RoleRegistry {
    pub fn new(role_set: RoleSet) -> Self {
        let (generator, critic) = match role_set {
            RoleSet::General => (prompts::GENERAL_GENERATOR, prompts::GENERAL_CRITIC),
            RoleSet::Ios => (prompts::IOS_GENERATOR, prompts::IOS_CRITIC),
        };

        let mut roles = HashMap::new();
        for role in [
            Role::new(GENERATOR, "Developer", generator, 0.3),
            Role::new(CRITIC, "Reviewer", critic, 0.2),
            Role::new(LEAD_REVIEWER, "Lead Reviewer", prompts::LEAD_REVIEWER, 0.2),
            Role::new(QUICK_REVIEWER, "Reviewer", prompts::QUICK_REVIEWER, 0.2),
            Role::new(DIFF_REVIEWER, "Diff Reviewer", prompts::DIFF_REVIEWER, 0.2),
        ] {
            roles.insert(role.id.clone(), role);
        }

        let mut perspectives = Vec::new();
        for role in default_perspectives(role_set) {
            perspectives.push(role.id.clone());
            roles.insert(role.id.clone(), role);
        }

        Self {
            role_set,
            roles,
            perspectives,
        }
    }

    pub fn role_set(&self) -> RoleSet {
        self.role_set
    }

    /// Look up a role by identifier
    pub fn resolve(&self, id: &str) -> Result<Role, RoleError> {
        self.roles
            .get(id)
            .cloned()
            .ok_or_else(|| RoleError::UnknownRole(id.to_string()))
    }

    /// Merge overrides into the registry by identifier.
    ///
    /// Existing entries keep any field the override leaves out. New entries
    /// need instructions or a focus to derive them from.
    pub fn with_overrides(mut self, overrides: &[RoleOverride]) -> Result<Self, RoleError> {
        for o in overrides {
            let key = o.key()?;
            let merged = self.merge(&key, o)?;
            debug!(role = %key, "Applied role override");
            self.roles.insert(key, merged);
        }
        Ok(self)
    }

    /// Replace the perspective list. Configured order wins; each entry merges
    /// with the built-in role of the same identifier when there is one.
    pub fn with_perspectives(mut self, entries: &[RoleOverride]) -> Result<Self, RoleError> {
        if entries.is_empty() {
            return Ok(self);
        }

        let mut ids = Vec::with_capacity(entries.len());
        for entry in entries {
            let key = entry.key()?;
            let merged = match self.roles.get(&key) {
                Some(existing) => entry.apply_to(existing),
                None => {
                    let focus = entry
                        .focus
                        .clone()
                        .unwrap_or_else(|| "General code quality".to_string());
                    Role {
                        id: key.clone(),
                        name: entry.name.clone().unwrap_or_else(|| "Reviewer".to_string()),
                        instructions: entry
                            .instructions
                            .clone()
                            .unwrap_or_else(|| Prompts::perspective_instructions(&focus)),
                        focus: Some(focus),
                        temperature: entry.temperature.unwrap_or(0.2),
                    }
                }
            };
            if !ids.contains(&key) {
                ids.push(key.clone());
            }
            self.roles.insert(key, merged);
        }

        debug!(count = ids.len(), "Configured custom perspectives");
        self.perspectives = ids;
        Ok(self)
    }

    /// Perspectives in their configured order
    pub fn perspectives(&self) -> Result<Vec<Role>, RoleError> {
        self.perspectives.iter().map(|id| self.resolve(id)).collect()
    }

    fn merge(&self, key: &str, o: &RoleOverride) -> Result<Role, RoleError> {
        if let Some(existing) = self.roles.get(key) {
            return Ok(o.apply_to(existing));
        }

        let instructions = match (&o.instructions, &o.focus) {
            (Some(instructions), _) => instructions.clone(),
            (None, Some(focus)) => Prompts::perspective_instructions(focus),
            (None, None) => {
                return Err(RoleError::InvalidOverride(format!(
                    "new role '{}' needs instructions or a focus",
                    key
                )))
            }
        };

        Ok(Role {
            id: key.to_string(),
            name: o.name.clone().unwrap_or_else(|| key.to_string()),
            instructions,
            focus: o.focus.clone(),
            temperature: o.temperature.unwrap_or(0.2),
        })
    }
}

impl Default for RoleRegistry {
    fn default() -> Self {
        Self::new(RoleSet::General)
    }
}
