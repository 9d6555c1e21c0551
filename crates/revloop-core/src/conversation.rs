use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use revloop_oracle::Message;
use revloop_roles::Prompts;

/// Who contributed a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnRole {
    /// The seed message built from the task
    Task,
    Generator,
    Critic,
}

/// One role's single contribution within an iteration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub role: TurnRole,
    /// 0 for the task seed, 1-based afterwards
    pub iteration: usize,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// Ordered turn log of one convergence run.
///
/// Owned by the run that created it; turns are only ever appended.
#[derive(Debug, Clone)]
pub struct ConversationState {
    turns: Vec<Turn>,
    iteration: usize,
}

impl ConversationState {
    /// Start a conversation seeded with the task message
    pub fn new(seed: String) -> Self {
        Self {
            turns: vec![Turn {
                role: TurnRole::Task,
                iteration: 0,
                content: seed,
                timestamp: Utc::now(),
            }],
            iteration: 0,
        }
    }

    /// Current iteration (0 before the first generator turn)
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    /// Advance to the next iteration and return its 1-based index
    pub fn begin_iteration(&mut self) -> usize {
        self.iteration += 1;
        self.iteration
    }

    pub fn push_generator(&mut self, content: String) {
        self.push(TurnRole::Generator, content);
    }

    pub fn push_critic(&mut self, content: String) {
        self.push(TurnRole::Critic, content);
    }

    fn push(&mut self, role: TurnRole, content: String) {
        debug_assert!(
            self.turns
                .last()
                .map_or(true, |last| (last.iteration, last.role) < (self.iteration, role)),
            "turns must be appended in iteration/role order"
        );
        self.turns.push(Turn {
            role,
            iteration: self.iteration,
            content,
            timestamp: Utc::now(),
        });
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// The most recent generator output
    pub fn last_artifact(&self) -> Option<&str> {
        self.turns
            .iter()
            .rev()
            .find(|t| t.role == TurnRole::Generator)
            .map(|t| t.content.as_str())
    }

    /// The full history as the generator sees it: its own answers as assistant
    /// messages, critic feedback wrapped as change requests.
    pub fn generator_history(&self) -> Vec<Message> {
        self.turns
            .iter()
            .map(|turn| match turn.role {
                TurnRole::Task => Message::user(turn.content.clone()),
                TurnRole::Generator => Message::assistant(turn.content.clone()),
                TurnRole::Critic => Message::user(Prompts::change_request(&turn.content)),
            })
            .collect()
    }

    pub fn into_turns(self) -> Vec<Turn> {
        self.turns
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use revloop_oracle::MessageRole;

    #[test]
    fn test_history_alternates_roles() {
        let mut state = ConversationState::new("Task: sum".into());
        assert_eq!(state.begin_iteration(), 1);
        state.push_generator("v1".into());
        state.push_critic("CHANGES_REQUESTED: handle overflow".into());
        assert_eq!(state.begin_iteration(), 2);

        let history = state.generator_history();
        let roles: Vec<_> = history.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![MessageRole::User, MessageRole::Assistant, MessageRole::User]
        );
        assert!(history[2].content.contains("handle overflow"));
        assert!(history[2]
            .content
            .starts_with("The reviewer has requested changes:"));
    }

    #[test]
    fn test_turns_are_ordered_by_iteration_then_role() {
        let mut state = ConversationState::new("seed".into());
        for i in 1..=3 {
            state.begin_iteration();
            state.push_generator(format!("v{}", i));
            state.push_critic(format!("fix {}", i));
        }
        let keys: Vec<_> = state.turns().iter().map(|t| (t.iteration, t.role)).collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
        assert_eq!(state.last_artifact(), Some("v3"));
        assert_eq!(state.into_turns().len(), 7);
    }

    #[test]
    fn test_no_artifact_before_generator() {
        let state = ConversationState::new("seed".into());
        assert_eq!(state.last_artifact(), None);
        assert_eq!(state.iteration(), 0);
    }
}
