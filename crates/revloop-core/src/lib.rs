//! # revloop-core
//!
//! The two review modes built on top of the oracle.
//!
//! - [`ConvergenceOrchestrator`] alternates generator and critic until the
//!   critic approves or the iteration budget runs out.
//! - [`TeamReview`] sends one artifact to every perspective at once through
//!   the [`FanOutCoordinator`], then merges the reviews with the
//!   [`SynthesisReducer`].
//! - [`QuickReview`] is a single reviewer call.
//!
//! ```ignore
//! let orchestrator = ConvergenceOrchestrator::new(oracle, registry, logger);
//! let result = orchestrator
//!     .run(ConvergenceRequest::new("add a retry to fetch()", 5))
//!     .await?;
//! ```

mod conversation;
mod error;
mod fanout;
mod orchestrator;
mod outcome;
mod quick;
mod synthesis;
mod team;

#[cfg(test)]
mod test_support;

pub use conversation::{ConversationState, Turn, TurnRole};
pub use error::{LoopError, TeamReviewError};
pub use fanout::{FanOutCoordinator, PerspectiveResult};
pub use orchestrator::{ConvergenceOrchestrator, ConvergenceRequest, RoleSelection};
pub use outcome::{LoopResult, EXHAUSTED_NOTE};
pub use quick::{QuickReview, ReviewOutcome};
pub use synthesis::{
    parse_issues, parse_summaries, Issue, Severity, SynthesisReducer, SynthesisReport,
    EXCERPT_BUDGET,
};
pub use team::{TeamReview, TeamReviewInput, TeamReviewOutcome};
