use thiserror::Error;

use revloop_oracle::OracleError;
use revloop_roles::RoleError;

use crate::PerspectiveResult;

/// Failures of the convergence loop. No partial result accompanies them.
#[derive(Error, Debug)]
pub enum LoopError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Oracle error: {0}")]
    OracleError(#[from] OracleError),

    #[error(transparent)]
    UnknownRole(#[from] RoleError),
}

/// Failures of the multi-perspective team review
#[derive(Error, Debug)]
pub enum TeamReviewError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("All {} perspectives failed", .results.len())]
    AllPerspectivesFailed { results: Vec<PerspectiveResult> },

    #[error("Synthesis oracle error: {0}")]
    OracleError(#[from] OracleError),

    #[error(transparent)]
    UnknownRole(#[from] RoleError),
}
