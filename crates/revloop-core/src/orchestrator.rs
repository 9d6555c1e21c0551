use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use revloop_logging::{LogEvent, Logger};
use revloop_oracle::{Message, Oracle, OracleError};
use revloop_roles::{CriticVerdict, Prompts, Role, RoleRegistry, CRITIC, GENERATOR};

use crate::conversation::ConversationState;
use crate::error::LoopError;
use crate::outcome::LoopResult;

/// Which registry entries play the generator and critic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleSelection {
    pub generator: String,
    pub critic: String,
}

impl Default for RoleSelection {
    fn default() -> Self {
        Self {
            generator: GENERATOR.to_string(),
            critic: CRITIC.to_string(),
        }
    }
}

/// Input to a single convergence run
#[derive(Debug, Clone)]
pub struct ConvergenceRequest {
    pub task: String,
    pub artifact_context: Option<String>,
    pub max_iterations: usize,
    pub roles: RoleSelection,
}

impl ConvergenceRequest {
    pub fn new(task: impl Into<String>, max_iterations: usize) -> Self {
        Self {
            task: task.into(),
            artifact_context: None,
            max_iterations,
            roles: RoleSelection::default(),
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.artifact_context = Some(context.into());
        self
    }

    pub fn with_roles(mut self, roles: RoleSelection) -> Self {
        self.roles = roles;
        self
    }
}

enum LoopState {
    AwaitingGenerator,
    AwaitingCritic { candidate: String },
    Approved,
    Exhausted,
}

/// Drives the generator/critic loop until approval or the iteration budget runs out
pub struct ConvergenceOrchestrator {
    oracle: Arc<dyn Oracle>,
    registry: RoleRegistry,
    logger: Arc<Logger>,
}

impl ConvergenceOrchestrator {
    pub fn new(oracle: Arc<dyn Oracle>, registry: RoleRegistry, logger: Arc<Logger>) -> Self {
        Self {
            oracle,
            registry,
            logger,
        }
    }

    /// Run the loop to a terminal state.
    ///
    /// Any oracle failure aborts the run; no partial result is returned.
    pub async fn run(&self, request: ConvergenceRequest) -> Result<LoopResult, LoopError> {
        if request.max_iterations < 1 {
            return Err(LoopError::ConfigError(format!(
                "max_iterations must be at least 1, got {}",
                request.max_iterations
            )));
        }

        let generator = self.registry.resolve(&request.roles.generator)?;
        let critic = self.registry.resolve(&request.roles.critic)?;

        self.logger.log(&LogEvent::LoopStarted {
            task_preview: request.task.chars().take(100).collect(),
            max_iterations: request.max_iterations,
            role_set: self.registry.role_set().to_string(),
        });

        let started = Instant::now();
        let seed = Prompts::task(&request.task, request.artifact_context.as_deref());
        let mut conversation = ConversationState::new(seed);
        let mut state = LoopState::AwaitingGenerator;

        loop {
            state = match state {
                LoopState::AwaitingGenerator => {
                    let iteration = conversation.begin_iteration();
                    self.logger.log(&LogEvent::GeneratorStarted {
                        iteration,
                        max_iterations: request.max_iterations,
                    });

                    let history = conversation.generator_history();
                    let call_started = Instant::now();
                    let candidate = self
                        .call(&generator, &history, "generator")
                        .await?;

                    self.logger.log(&LogEvent::GeneratorCompleted {
                        iteration,
                        response_chars: candidate.chars().count(),
                        duration_secs: call_started.elapsed().as_secs_f64(),
                    });
                    conversation.push_generator(candidate.clone());
                    LoopState::AwaitingCritic { candidate }
                }
                LoopState::AwaitingCritic { candidate } => {
                    let iteration = conversation.iteration();
                    self.logger.log(&LogEvent::CriticStarted { iteration });

                    let request_message = [Message::user(Prompts::critic_request(&candidate))];
                    let call_started = Instant::now();
                    let review = self.call(&critic, &request_message, "critic").await?;
                    let verdict = CriticVerdict::from_leading_token(&review);

                    self.logger.log(&LogEvent::CriticCompleted {
                        iteration,
                        verdict: verdict.short_description().to_string(),
                        duration_secs: call_started.elapsed().as_secs_f64(),
                    });
                    conversation.push_critic(review);

                    if verdict.is_approved() {
                        LoopState::Approved
                    } else if iteration >= request.max_iterations {
                        LoopState::Exhausted
                    } else {
                        info!(iteration, "Changes requested, continuing");
                        LoopState::AwaitingGenerator
                    }
                }
                LoopState::Approved => {
                    let duration = started.elapsed();
                    self.logger.log(&LogEvent::LoopApproved {
                        iterations: conversation.iteration(),
                        duration_secs: duration.as_secs_f64(),
                    });
                    return Ok(LoopResult::approved(conversation, duration));
                }
                LoopState::Exhausted => {
                    self.logger.log(&LogEvent::MaxIterationsReached {
                        iterations: conversation.iteration(),
                    });
                    return Ok(LoopResult::exhausted(conversation, started.elapsed()));
                }
            };
        }
    }

    async fn call(
        &self,
        role: &Role,
        history: &[Message],
        stage: &str,
    ) -> Result<String, OracleError> {
        debug!(role = %role.id, messages = history.len(), temperature = role.temperature, "Calling oracle");
        self.oracle
            .complete(role, history, role.temperature)
            .await
            .inspect_err(|e| {
                warn!(stage, error = %e, "Oracle call failed");
                self.logger.log(&LogEvent::OracleFailed {
                    stage: stage.to_string(),
                    error: e.to_string(),
                });
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::TurnRole;
    use crate::outcome::EXHAUSTED_NOTE;
    use crate::test_support::ScriptedOracle;
    use revloop_oracle::MessageRole;
    use revloop_roles::RoleSet;

    fn orchestrator(oracle: Arc<ScriptedOracle>) -> ConvergenceOrchestrator {
        ConvergenceOrchestrator::new(
            oracle,
            RoleRegistry::new(RoleSet::General),
            Arc::new(Logger::quiet()),
        )
    }

    #[tokio::test]
    async fn test_first_response_approved() {
        let oracle = Arc::new(
            ScriptedOracle::new()
                .reply(GENERATOR, "fn add(a: i32, b: i32) -> i32 { a + b }")
                .reply(CRITIC, "APPROVED\nLooks good."),
        );
        let result = orchestrator(oracle.clone())
            .run(ConvergenceRequest::new("write add", 5))
            .await
            .unwrap();

        assert!(result.approved);
        assert_eq!(result.iterations, 1);
        assert_eq!(
            result.final_artifact,
            "fn add(a: i32, b: i32) -> i32 { a + b }"
        );
        assert!(result.note.is_none());
        assert_eq!(oracle.call_count(), 2);
        assert_eq!(result.exit_code(), 0);
    }

    #[tokio::test]
    async fn test_accept_token_is_case_insensitive() {
        let oracle = Arc::new(
            ScriptedOracle::new()
                .reply(GENERATOR, "v1")
                .reply(CRITIC, "  approved - ship it"),
        );
        let result = orchestrator(oracle)
            .run(ConvergenceRequest::new("task", 3))
            .await
            .unwrap();
        assert!(result.approved);
    }

    #[tokio::test]
    async fn test_exhausts_budget_without_approval() {
        let oracle = Arc::new(
            ScriptedOracle::new()
                .reply(GENERATOR, "v1")
                .reply(GENERATOR, "v2")
                .reply(GENERATOR, "v3")
                .reply(CRITIC, "CHANGES_REQUESTED: still wrong"),
        );
        let result = orchestrator(oracle.clone())
            .run(ConvergenceRequest::new("task", 3))
            .await
            .unwrap();

        assert!(!result.approved);
        assert_eq!(result.iterations, 3);
        assert_eq!(result.final_artifact, "v3");
        assert_eq!(result.note.as_deref(), Some(EXHAUSTED_NOTE));
        assert_eq!(oracle.call_count(), 6);
        assert_eq!(result.exit_code(), 1);
    }

    #[tokio::test]
    async fn test_unrecognized_verdict_requests_changes() {
        let oracle = Arc::new(
            ScriptedOracle::new()
                .reply(GENERATOR, "draft")
                .reply(CRITIC, "The code mentions APPROVED but does not lead with it")
                .reply(CRITIC, "APPROVED"),
        );
        let result = orchestrator(oracle)
            .run(ConvergenceRequest::new("task", 4))
            .await
            .unwrap();
        assert!(result.approved);
        assert_eq!(result.iterations, 2);
    }

    #[tokio::test]
    async fn test_zero_iterations_makes_no_calls() {
        let oracle = Arc::new(ScriptedOracle::new().reply(GENERATOR, "x"));
        let err = orchestrator(oracle.clone())
            .run(ConvergenceRequest::new("task", 0))
            .await
            .unwrap_err();

        assert!(matches!(err, LoopError::ConfigError(_)));
        assert_eq!(oracle.call_count(), 0);
    }

    #[tokio::test]
    async fn test_unknown_role_is_reported() {
        let oracle = Arc::new(ScriptedOracle::new());
        let roles = RoleSelection {
            generator: "nobody".into(),
            critic: CRITIC.into(),
        };
        let err = orchestrator(oracle.clone())
            .run(ConvergenceRequest::new("task", 2).with_roles(roles))
            .await
            .unwrap_err();
        assert!(matches!(err, LoopError::UnknownRole(_)));
        assert_eq!(oracle.call_count(), 0);
    }

    #[tokio::test]
    async fn test_oracle_failure_aborts_run() {
        let oracle = Arc::new(
            ScriptedOracle::new()
                .reply(GENERATOR, "v1")
                .fail(CRITIC, "rate limited"),
        );
        let err = orchestrator(oracle)
            .run(ConvergenceRequest::new("task", 3))
            .await
            .unwrap_err();
        assert!(matches!(err, LoopError::OracleError(_)));
    }

    #[tokio::test]
    async fn test_critic_sees_only_latest_artifact() {
        let oracle = Arc::new(
            ScriptedOracle::new()
                .reply(GENERATOR, "first draft")
                .reply(GENERATOR, "second draft")
                .reply(CRITIC, "CHANGES_REQUESTED: rename x")
                .reply(CRITIC, "APPROVED"),
        );
        let result = orchestrator(oracle.clone())
            .run(ConvergenceRequest::new("task", 5).with_context("fn x() {}"))
            .await
            .unwrap();
        assert_eq!(result.iterations, 2);

        let critic_calls = oracle.calls_for(CRITIC);
        assert_eq!(critic_calls.len(), 2);
        assert_eq!(critic_calls[1].len(), 1);
        assert!(critic_calls[1][0].content.contains("second draft"));
        assert!(!critic_calls[1][0].content.contains("first draft"));

        let generator_calls = oracle.calls_for(GENERATOR);
        assert_eq!(generator_calls[0].len(), 1);
        assert!(generator_calls[0][0].content.contains("fn x() {}"));
        let second: Vec<_> = generator_calls[1].iter().map(|m| m.role).collect();
        assert_eq!(
            second,
            vec![MessageRole::User, MessageRole::Assistant, MessageRole::User]
        );
        assert!(generator_calls[1][2].content.contains("rename x"));
    }

    #[tokio::test]
    async fn test_turn_log_records_every_turn() {
        let oracle = Arc::new(
            ScriptedOracle::new()
                .reply(GENERATOR, "v1")
                .reply(GENERATOR, "v2")
                .reply(CRITIC, "CHANGES_REQUESTED")
                .reply(CRITIC, "APPROVED"),
        );
        let result = orchestrator(oracle)
            .run(ConvergenceRequest::new("task", 5))
            .await
            .unwrap();

        let log: Vec<_> = result
            .turn_log
            .iter()
            .map(|t| (t.iteration, t.role))
            .collect();
        assert_eq!(
            log,
            vec![
                (0, TurnRole::Task),
                (1, TurnRole::Generator),
                (1, TurnRole::Critic),
                (2, TurnRole::Generator),
                (2, TurnRole::Critic),
            ]
        );
        assert!(result.iterations <= 5);
    }
}
