//! # revloop-watch
//!
//! File-based review mode. A generator writes under `## Generator:` sections
//! of a markdown file; every new submission gets a `## Critic:` section
//! appended in reply.
//!
//! - [`ConversationLog`] parses the file and appends reviews
//! - [`WatchSession`] decides, per change, whether a submission awaits review
//! - [`ConversationWatcher`] turns filesystem notifications into [`ConversationEvent`]s

pub mod parser;
pub mod session;
pub mod types;
pub mod watcher;

pub use parser::ConversationLog;
pub use session::WatchSession;
pub use types::{initial_content, LogEntry, Speaker, CRITIC_HEADING, GENERATOR_HEADING};
pub use watcher::{ConversationEvent, ConversationWatcher};
