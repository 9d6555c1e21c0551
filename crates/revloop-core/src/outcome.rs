use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::conversation::{ConversationState, Turn};

/// Note attached to a run that ran out of iterations
pub const EXHAUSTED_NOTE: &str = "max iterations reached — human review recommended";

/// The final result of a convergence run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoopResult {
    pub approved: bool,
    pub iterations: usize,
    pub final_artifact: String,
    pub turn_log: Vec<Turn>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub total_duration_secs: f64,
}

impl LoopResult {
    pub(crate) fn approved(state: ConversationState, duration: Duration) -> Self {
        Self::finish(state, true, None, duration)
    }

    pub(crate) fn exhausted(state: ConversationState, duration: Duration) -> Self {
        Self::finish(state, false, Some(EXHAUSTED_NOTE.to_string()), duration)
    }

    fn finish(
        state: ConversationState,
        approved: bool,
        note: Option<String>,
        duration: Duration,
    ) -> Self {
        let iterations = state.iteration();
        let final_artifact = state.last_artifact().unwrap_or_default().to_string();
        Self {
            approved,
            iterations,
            final_artifact,
            turn_log: state.into_turns(),
            note,
            total_duration_secs: duration.as_secs_f64(),
        }
    }

    pub fn exit_code(&self) -> i32 {
        if self.approved {
            0
        } else {
            1
        }
    }
}
