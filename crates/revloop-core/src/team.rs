use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use revloop_logging::Logger;
use revloop_oracle::Oracle;
use revloop_roles::{ProjectProfile, Role, RoleRegistry, LEAD_REVIEWER};

use crate::error::TeamReviewError;
use crate::fanout::{FanOutCoordinator, PerspectiveResult};
use crate::synthesis::{SynthesisReducer, SynthesisReport};

/// Input to one team review
#[derive(Debug, Clone)]
pub struct TeamReviewInput<'a> {
    pub artifact: &'a str,
    pub shared_context: &'a str,
    pub perspectives: Vec<Role>,
    /// Appended to every perspective's instructions
    pub project: Option<&'a ProjectProfile>,
}

/// The synthesized report alongside every perspective slot, failed ones included
#[derive(Debug, Clone, Serialize)]
pub struct TeamReviewOutcome {
    pub report: SynthesisReport,
    pub perspectives: Vec<PerspectiveResult>,
}

impl TeamReviewOutcome {
    pub fn failed_perspectives(&self) -> impl Iterator<Item = &PerspectiveResult> {
        self.perspectives.iter().filter(|p| !p.ok)
    }

    pub fn exit_code(&self) -> i32 {
        if self.report.overall_approved {
            0
        } else {
            1
        }
    }
}

/// Fan-out over the perspectives followed by synthesis
pub struct TeamReview {
    fan_out: FanOutCoordinator,
    reducer: SynthesisReducer,
}

impl TeamReview {
    pub fn new(
        oracle: Arc<dyn Oracle>,
        registry: &RoleRegistry,
        logger: Arc<Logger>,
    ) -> Result<Self, TeamReviewError> {
        let lead = registry.resolve(LEAD_REVIEWER)?;
        Ok(Self {
            fan_out: FanOutCoordinator::new(Arc::clone(&oracle), Arc::clone(&logger)),
            reducer: SynthesisReducer::new(oracle, lead, logger),
        })
    }

    pub async fn run(
        &self,
        input: TeamReviewInput<'_>,
    ) -> Result<TeamReviewOutcome, TeamReviewError> {
        let perspectives: Vec<Role> = match input.project {
            Some(project) => input
                .perspectives
                .iter()
                .map(|p| p.with_instructions(project.augment(&p.instructions)))
                .collect(),
            None => input.perspectives,
        };

        let results = self
            .fan_out
            .review_all_perspectives(input.artifact, input.shared_context, &perspectives)
            .await?;

        let report = self.reducer.synthesize(&results, input.artifact).await?;
        info!(
            approved = report.overall_approved,
            issues = report.ranked_issues.len(),
            omitted = report.omitted_perspectives.len(),
            "Team review complete"
        );

        Ok(TeamReviewOutcome {
            report,
            perspectives: results,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedOracle;
    use revloop_roles::RoleSet;

    const LEAD_TEXT: &str = "**CHANGES_REQUESTED**

### Priority-Ranked Issues
1. [IMPORTANT] Force unwrap on optional (from: Bug Hunter) - line 8
2. [CRITICAL] Retain cycle in closure (from: iOS Architect) - line 20

### Summary by Perspective
- iOS Architect: retain cycle
- Bug Hunter: force unwrap";

    #[tokio::test]
    async fn test_team_review_with_one_failed_perspective() {
        let registry = RoleRegistry::new(RoleSet::Ios);
        let perspectives = registry.perspectives().unwrap();
        assert_eq!(perspectives.len(), 4);

        let oracle = Arc::new(
            ScriptedOracle::new()
                .reply(&perspectives[0].id, "retain cycle at line 20")
                .fail(&perspectives[1].id, "rate limited")
                .reply(&perspectives[2].id, "force unwrap at line 8")
                .reply(&perspectives[3].id, "ok to ship")
                .reply(LEAD_REVIEWER, LEAD_TEXT),
        );
        let team = TeamReview::new(oracle.clone(), &registry, Arc::new(Logger::quiet())).unwrap();

        let outcome = team
            .run(TeamReviewInput {
                artifact: "+ let x = y!",
                shared_context: "Refactored navigation stack",
                perspectives: perspectives.clone(),
                project: None,
            })
            .await
            .unwrap();

        assert_eq!(outcome.perspectives.len(), 4);
        assert_eq!(outcome.failed_perspectives().count(), 1);
        assert_eq!(
            outcome.report.omitted_perspectives,
            vec![perspectives[1].id.clone()]
        );
        assert!(!outcome.report.overall_approved);
        assert_eq!(outcome.exit_code(), 1);
        assert_eq!(outcome.report.ranked_issues.len(), 2);
        assert_eq!(
            outcome.report.ranked_issues[0].description,
            "Retain cycle in closure"
        );
        assert_eq!(outcome.report.perspective_summaries.len(), 2);

        let lead_request = &oracle.calls_for(LEAD_REVIEWER)[0][0].content;
        assert_eq!(lead_request.matches("## Review from:").count(), 3);
    }

    #[tokio::test]
    async fn test_project_profile_reaches_perspectives() {
        let registry = RoleRegistry::new(RoleSet::General);
        let perspective = registry.perspectives().unwrap().remove(0);
        let project = ProjectProfile {
            name: "Ledger".into(),
            language: "rust".into(),
            patterns: vec!["No unwrap outside tests".into()],
            review_focus: vec![],
        };

        let oracle = Arc::new(
            ScriptedOracle::new()
                .reply(&perspective.id, "fine")
                .reply(LEAD_REVIEWER, "APPROVED"),
        );
        let team = TeamReview::new(oracle.clone(), &registry, Arc::new(Logger::quiet())).unwrap();
        let perspective_id = perspective.id.clone();

        let outcome = team
            .run(TeamReviewInput {
                artifact: "fn main() {}",
                shared_context: "",
                perspectives: vec![perspective],
                project: Some(&project),
            })
            .await
            .unwrap();

        assert!(outcome.report.overall_approved);
        assert_eq!(outcome.exit_code(), 0);
        let seen = &oracle.instructions_for(&perspective_id)[0];
        assert!(seen.contains("## Project: Ledger"));
        assert!(seen.contains("- No unwrap outside tests"));
        assert!(!oracle.instructions_for(LEAD_REVIEWER)[0].contains("## Project: Ledger"));
    }

    #[tokio::test]
    async fn test_all_perspectives_failing_skips_synthesis() {
        let registry = RoleRegistry::new(RoleSet::General);
        let perspectives: Vec<Role> = registry.perspectives().unwrap().into_iter().take(3).collect();
        let oracle = perspectives
            .iter()
            .fold(ScriptedOracle::new(), |o, p| o.fail(&p.id, "offline"))
            .reply(LEAD_REVIEWER, "APPROVED");
        let oracle = Arc::new(oracle);
        let team = TeamReview::new(oracle.clone(), &registry, Arc::new(Logger::quiet())).unwrap();

        let err = team
            .run(TeamReviewInput {
                artifact: "x",
                shared_context: "",
                perspectives,
                project: None,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, TeamReviewError::AllPerspectivesFailed { ref results } if results.len() == 3));
        assert!(oracle.calls_for(LEAD_REVIEWER).is_empty());
    }
}
