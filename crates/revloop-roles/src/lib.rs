//! # revloop-roles
//!
//! Roles the oracle speaks as, and the lexical rules used to read verdicts
//! out of reviewer text.
//!
//! ## Key Types
//!
//! - [`RoleRegistry`] - identifier to [`Role`] lookup, built from a [`RoleSet`]
//! - [`RoleOverride`] - externally configured role data, merged by identifier
//! - [`ProjectProfile`] - project context appended to reviewer instructions
//! - [`CriticVerdict`] - leading-token verdict of the convergence loop
//! - [`synthesis_approved`] - substring verdict of synthesized reviews

mod perspectives;
mod profile;
mod prompts;
mod registry;
mod role;
mod verdict;

pub use perspectives::default_perspectives;
pub use profile::ProjectProfile;
pub use prompts::{truncate_chars, Prompts};
pub use registry::RoleRegistry;
pub use role::{
    slugify, Role, RoleError, RoleOverride, RoleSet, CRITIC, DIFF_REVIEWER, GENERATOR,
    LEAD_REVIEWER, QUICK_REVIEWER,
};
pub use verdict::{synthesis_approved, CriticVerdict, ACCEPT_TOKEN, CHANGES_TOKEN};
