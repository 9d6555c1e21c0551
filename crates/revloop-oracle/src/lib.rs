//! # revloop-oracle
//!
//! The completion oracle boundary: every text-generation call the core makes
//! goes through the [`Oracle`] trait. [`CommandOracle`] implements it on top
//! of a locally installed assistant CLI.

mod command;
mod output;
mod spawner;
mod traits;

pub use command::{render_transcript, CommandOracle};
pub use output::ProcessOutput;
pub use spawner::ProcessSpawner;
pub use traits::{Message, MessageRole, Oracle, OracleBackend, OracleConfig, OracleError};

/// Create a command-line oracle for the given backend
pub fn create_oracle(backend: OracleBackend, config: OracleConfig) -> CommandOracle {
    CommandOracle::new(backend, config)
}
