use serde::Serialize;
use std::sync::Arc;

use revloop_logging::{LogEvent, Logger};
use revloop_oracle::{Message, Oracle, OracleError};
use revloop_roles::{
    synthesis_approved, ProjectProfile, Prompts, Role, RoleError, RoleRegistry, DIFF_REVIEWER,
    QUICK_REVIEWER,
};

/// Result of a single-shot review
#[derive(Debug, Clone, Serialize)]
pub struct ReviewOutcome {
    pub text: String,
    pub approved: bool,
}

impl ReviewOutcome {
    pub fn from_text(text: String) -> Self {
        Self {
            approved: synthesis_approved(&text),
            text,
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

/// One reviewer, one call, no iteration
pub struct QuickReview {
    oracle: Arc<dyn Oracle>,
    reviewer: Role,
    logger: Arc<Logger>,
}

impl QuickReview {
    pub fn new(
        oracle: Arc<dyn Oracle>,
        registry: &RoleRegistry,
        logger: Arc<Logger>,
    ) -> Result<Self, RoleError> {
        Ok(Self {
            oracle,
            reviewer: registry.resolve(QUICK_REVIEWER)?,
            logger,
        })
    }

    /// Single reviewer for git diffs, reading them against the developer's intent
    pub fn for_diff(
        oracle: Arc<dyn Oracle>,
        registry: &RoleRegistry,
        logger: Arc<Logger>,
    ) -> Result<Self, RoleError> {
        Ok(Self {
            oracle,
            reviewer: registry.resolve(DIFF_REVIEWER)?,
            logger,
        })
    }

    pub async fn review(
        &self,
        artifact: &str,
        question: Option<&str>,
        project: Option<&ProjectProfile>,
    ) -> Result<ReviewOutcome, OracleError> {
        self.ask(Prompts::quick_review(artifact, question), project, "review")
            .await
    }

    pub async fn review_diff(
        &self,
        diff: &str,
        files: &[String],
        developer_context: Option<&str>,
        project: Option<&ProjectProfile>,
    ) -> Result<ReviewOutcome, OracleError> {
        let request = Prompts::diff_review(diff, files, developer_context);
        self.ask(request, project, "diff review").await
    }

    async fn ask(
        &self,
        request: String,
        project: Option<&ProjectProfile>,
        stage: &str,
    ) -> Result<ReviewOutcome, OracleError> {
        let reviewer = match project {
            Some(project) => self
                .reviewer
                .with_instructions(project.augment(&self.reviewer.instructions)),
            None => self.reviewer.clone(),
        };
        let request = [Message::user(request)];

        let text = self
            .oracle
            .complete(&reviewer, &request, reviewer.temperature)
            .await
            .inspect_err(|e| {
                self.logger.log(&LogEvent::OracleFailed {
                    stage: stage.to_string(),
                    error: e.to_string(),
                });
            })?;
        Ok(ReviewOutcome::from_text(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedOracle;
    use revloop_roles::RoleSet;

    fn quick(oracle: Arc<ScriptedOracle>) -> QuickReview {
        QuickReview::new(
            oracle,
            &RoleRegistry::new(RoleSet::General),
            Arc::new(Logger::quiet()),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_quick_review_verdict() {
        let oracle = Arc::new(ScriptedOracle::new().reply(QUICK_REVIEWER, "**APPROVED**\nNo issues."));
        let outcome = quick(oracle.clone())
            .review("fn f() {}", Some("Is this thread safe?"), None)
            .await
            .unwrap();
        assert!(outcome.approved);
        assert_eq!(outcome.exit_code(), 0);

        let request = &oracle.calls_for(QUICK_REVIEWER)[0][0].content;
        assert!(request.contains("fn f() {}"));
        assert!(request.contains("Specific question: Is this thread safe?"));
    }

    #[tokio::test]
    async fn test_mixed_tokens_are_not_approved() {
        let oracle = Arc::new(
            ScriptedOracle::new().reply(QUICK_REVIEWER, "CHANGES_REQUESTED, not APPROVED yet"),
        );
        let outcome = quick(oracle).review("x", None, None).await.unwrap();
        assert!(!outcome.approved);
        assert_eq!(outcome.exit_code(), 1);
    }

    #[tokio::test]
    async fn test_project_profile_is_applied() {
        let oracle = Arc::new(ScriptedOracle::new().reply(QUICK_REVIEWER, "APPROVED"));
        let project = ProjectProfile {
            name: "Atlas".into(),
            ..ProjectProfile::default()
        };
        quick(oracle.clone())
            .review("x", None, Some(&project))
            .await
            .unwrap();
        assert!(oracle.instructions_for(QUICK_REVIEWER)[0].contains("## Project: Atlas"));
    }

    #[tokio::test]
    async fn test_diff_review_uses_diff_reviewer() {
        let oracle = Arc::new(ScriptedOracle::new().reply(DIFF_REVIEWER, "**APPROVED** looks right"));
        let reviewer = QuickReview::for_diff(
            oracle.clone(),
            &RoleRegistry::new(RoleSet::General),
            Arc::new(Logger::quiet()),
        )
        .unwrap();

        let files = vec!["src/list.rs".to_string()];
        let outcome = reviewer
            .review_diff("+fn refresh() {}", &files, Some("added a refresh button"), None)
            .await
            .unwrap();
        assert!(outcome.approved);

        let request = &oracle.calls_for(DIFF_REVIEWER)[0][0].content;
        assert!(request.starts_with("## Developer Context\nadded a refresh button"));
        assert!(request.contains("- src/list.rs"));
        assert!(request.contains("```diff\n+fn refresh() {}\n```"));
        assert_eq!(oracle.calls_for(QUICK_REVIEWER).len(), 0);
    }
}
