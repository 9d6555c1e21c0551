//! Reduction of several perspective reviews into one ranked verdict.
//!
//! The lead reviewer writes free text; everything the caller relies on is read
//! out of it with plain lexical rules:
//!
//! | Field | Rule |
//! |-------|------|
//! | `overall_approved` | [`synthesis_approved`]: contains `APPROVED`, not `CHANGES_REQUESTED` |
//! | `ranked_issues` | numbered lines tagged `[CRITICAL]`, `[IMPORTANT]` or `[MINOR]` |
//! | `perspective_summaries` | bullets under the "Summary by Perspective" heading |

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

use revloop_logging::{LogEvent, Logger};
use revloop_oracle::{Message, Oracle};
use revloop_roles::{slugify, synthesis_approved, truncate_chars, Prompts, Role, LEAD_REVIEWER};

use crate::error::TeamReviewError;
use crate::fanout::PerspectiveResult;

/// Maximum characters of the artifact forwarded to the lead reviewer
pub const EXCERPT_BUDGET: usize = 3000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    Important,
    Minor,
}

impl Severity {
    fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_uppercase().as_str() {
            "CRITICAL" => Some(Self::Critical),
            "IMPORTANT" => Some(Self::Important),
            "MINOR" => Some(Self::Minor),
            _ => None,
        }
    }
}

/// One deduplicated issue from the synthesized review
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub description: String,
    pub severity: Severity,
    pub source_perspective_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_ref: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisReport {
    pub overall_approved: bool,
    /// Critical first, then important, then minor; ties keep the reviewer's order
    pub ranked_issues: Vec<Issue>,
    pub perspective_summaries: Vec<String>,
    pub synthesis_text: String,
    /// Perspectives whose reviews failed and were left out of the synthesis
    pub omitted_perspectives: Vec<String>,
}

/// Issues one more oracle call as the lead reviewer over all successful reviews
pub struct SynthesisReducer {
    oracle: Arc<dyn Oracle>,
    lead: Role,
    logger: Arc<Logger>,
}

impl SynthesisReducer {
    pub fn new(oracle: Arc<dyn Oracle>, lead: Role, logger: Arc<Logger>) -> Self {
        Self {
            oracle,
            lead,
            logger,
        }
    }

    pub async fn synthesize(
        &self,
        results: &[PerspectiveResult],
        artifact: &str,
    ) -> Result<SynthesisReport, TeamReviewError> {
        let successful: Vec<&PerspectiveResult> = results.iter().filter(|r| r.ok).collect();
        if successful.is_empty() {
            return Err(TeamReviewError::AllPerspectivesFailed {
                results: results.to_vec(),
            });
        }
        let omitted_perspectives: Vec<String> = results
            .iter()
            .filter(|r| !r.ok)
            .map(|r| r.perspective_id.clone())
            .collect();

        self.logger.log(&LogEvent::SynthesisStarted {
            reviews: successful.len(),
            omitted: omitted_perspectives.len(),
        });

        let reviews: Vec<(&str, &str, &str)> = successful
            .iter()
            .map(|r| {
                (
                    r.perspective_name.as_str(),
                    r.focus.as_str(),
                    r.raw_text.as_str(),
                )
            })
            .collect();
        let excerpt = truncate_chars(artifact, EXCERPT_BUDGET);
        let request = [Message::user(Prompts::synthesis_request(&reviews, excerpt))];

        let started = Instant::now();
        let synthesis_text = self
            .oracle
            .complete(&self.lead, &request, self.lead.temperature)
            .await
            .inspect_err(|e| {
                self.logger.log(&LogEvent::OracleFailed {
                    stage: "synthesis".to_string(),
                    error: e.to_string(),
                });
            })?;
        debug!(elapsed = ?started.elapsed(), "Synthesis returned");

        let report = SynthesisReport {
            overall_approved: synthesis_approved(&synthesis_text),
            ranked_issues: parse_issues(&synthesis_text, results),
            perspective_summaries: parse_summaries(&synthesis_text),
            synthesis_text,
            omitted_perspectives,
        };

        self.logger.log(&LogEvent::SynthesisCompleted {
            approved: report.overall_approved,
            issues: report.ranked_issues.len(),
        });
        Ok(report)
    }
}

/// Extract `N. [SEVERITY] description (from: Name) - ref` lines, ranked by severity
pub fn parse_issues(text: &str, results: &[PerspectiveResult]) -> Vec<Issue> {
    let mut issues: Vec<Issue> = text
        .lines()
        .filter_map(|line| parse_issue_line(line, results))
        .collect();
    issues.sort_by_key(|issue| issue.severity);
    issues
}

fn parse_issue_line(line: &str, results: &[PerspectiveResult]) -> Option<Issue> {
    let line = line.replace('*', "");
    let rest = strip_list_number(line.trim())?;
    let rest = rest.strip_prefix('[')?;
    let (tag, rest) = rest.split_once(']')?;
    let severity = Severity::from_tag(tag)?;
    let rest = rest.trim();

    let (description, source, line_ref) = match find_ignore_case(rest, "(from:") {
        Some(start) => {
            let after = &rest[start + "(from:".len()..];
            let (name, tail) = after.split_once(')').unwrap_or((after, ""));
            let tail = tail.trim().trim_start_matches(['-', '–', '—', ':']).trim();
            (
                rest[..start].trim(),
                resolve_source(name.trim(), results),
                (!tail.is_empty()).then(|| tail.to_string()),
            )
        }
        None => (rest, LEAD_REVIEWER.to_string(), None),
    };

    if description.is_empty() {
        return None;
    }
    Some(Issue {
        description: description.to_string(),
        severity,
        source_perspective_id: source,
        line_ref,
    })
}

fn strip_list_number(line: &str) -> Option<&str> {
    let digits = line.find(|c: char| !c.is_ascii_digit())?;
    if digits == 0 {
        return None;
    }
    let rest = &line[digits..];
    let rest = rest.strip_prefix('.').or_else(|| rest.strip_prefix(')'))?;
    Some(rest.trim_start())
}

fn find_ignore_case(haystack: &str, needle: &str) -> Option<usize> {
    haystack.to_ascii_lowercase().find(needle)
}

/// Map the reviewer-facing name back to a perspective id
fn resolve_source(name: &str, results: &[PerspectiveResult]) -> String {
    let slug = slugify(name);
    results
        .iter()
        .find(|r| r.perspective_name.eq_ignore_ascii_case(name) || r.perspective_id == slug)
        .map(|r| r.perspective_id.clone())
        .unwrap_or(slug)
}

/// Bullets under the "Summary by Perspective" heading, up to the next heading
pub fn parse_summaries(text: &str) -> Vec<String> {
    let mut summaries = Vec::new();
    let mut in_section = false;

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with('#') {
            in_section = trimmed
                .to_ascii_lowercase()
                .contains("summary by perspective");
            continue;
        }
        if !in_section {
            continue;
        }
        if let Some(item) = trimmed
            .strip_prefix("- ")
            .or_else(|| trimmed.strip_prefix("* "))
        {
            let item = item.replace("**", "");
            let item = item.trim();
            if !item.is_empty() {
                summaries.push(item.to_string());
            }
        }
    }
    summaries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedOracle;
    use revloop_roles::{RoleRegistry, RoleSet};

    fn result(id: &str, name: &str, ok: bool) -> PerspectiveResult {
        let role = Role::new(id, name, "review", 0.2).with_focus(format!("{} focus", name));
        if ok {
            PerspectiveResult::succeeded(&role, format!("review by {}", name), 0.1)
        } else {
            PerspectiveResult::failed(&role, "timeout".into(), 0.1)
        }
    }

    fn reducer(oracle: Arc<ScriptedOracle>) -> SynthesisReducer {
        let lead = RoleRegistry::new(RoleSet::General)
            .resolve(LEAD_REVIEWER)
            .unwrap();
        SynthesisReducer::new(oracle, lead, Arc::new(Logger::quiet()))
    }

    const SYNTHESIS: &str = "**CHANGES_REQUESTED**

### Priority-Ranked Issues
1. [MINOR] Rename `tmp` (from: Architect) - line 3
2. **[CRITICAL]** Index out of bounds (from: Bug Hunter) - line 12
3. [IMPORTANT] Missing timeout on request (from: production readiness)
4. [IMPORTANT] Unchecked input
5. Not an issue line

### Summary by Perspective
- Architect: layout is fine
- **Bug Hunter**: one crash
* Security: nothing found

### Recommendation
- fix the crash first";

    #[test]
    fn test_issues_are_ranked_by_severity() {
        let results = vec![
            result("architect", "Architect", true),
            result("bug-hunter", "Bug Hunter", true),
            result("production-readiness", "Production Readiness", true),
        ];
        let issues = parse_issues(SYNTHESIS, &results);

        let severities: Vec<_> = issues.iter().map(|i| i.severity).collect();
        assert_eq!(
            severities,
            vec![
                Severity::Critical,
                Severity::Important,
                Severity::Important,
                Severity::Minor
            ]
        );
        assert_eq!(issues[0].description, "Index out of bounds");
        assert_eq!(issues[0].source_perspective_id, "bug-hunter");
        assert_eq!(issues[0].line_ref.as_deref(), Some("line 12"));
        assert_eq!(issues[1].source_perspective_id, "production-readiness");
        assert_eq!(issues[1].line_ref, None);
        assert_eq!(issues[2].source_perspective_id, LEAD_REVIEWER);
        assert_eq!(issues[3].description, "Rename `tmp`");
    }

    #[test]
    fn test_unknown_source_name_is_slugified() {
        let issues = parse_issues("1. [MINOR] Typo (from: Style Police)", &[]);
        assert_eq!(issues[0].source_perspective_id, "style-police");
    }

    #[test]
    fn test_summaries_stop_at_next_heading() {
        let summaries = parse_summaries(SYNTHESIS);
        assert_eq!(
            summaries,
            vec![
                "Architect: layout is fine",
                "Bug Hunter: one crash",
                "Security: nothing found"
            ]
        );
    }

    #[tokio::test]
    async fn test_only_successful_reviews_are_synthesized() {
        let oracle = Arc::new(ScriptedOracle::new().reply(LEAD_REVIEWER, "**APPROVED**"));
        let results = vec![
            result("architect", "Architect", true),
            result("security", "Security", false),
            result("bug-hunter", "Bug Hunter", true),
            result("production-readiness", "Production Readiness", true),
        ];

        let report = reducer(oracle.clone())
            .synthesize(&results, "fn main() {}")
            .await
            .unwrap();

        assert!(report.overall_approved);
        assert_eq!(report.omitted_perspectives, vec!["security"]);

        let calls = oracle.calls_for(LEAD_REVIEWER);
        assert_eq!(calls.len(), 1);
        let request = &calls[0][0].content;
        assert_eq!(request.matches("## Review from:").count(), 3);
        assert!(!request.contains("## Review from: Security"));
        assert!(request.contains("fn main() {}"));
    }

    #[tokio::test]
    async fn test_both_tokens_mean_not_approved() {
        let oracle = Arc::new(ScriptedOracle::new().reply(
            LEAD_REVIEWER,
            "APPROVED for style, but CHANGES_REQUESTED for safety",
        ));
        let results = vec![result("architect", "Architect", true)];
        let report = reducer(oracle)
            .synthesize(&results, "x")
            .await
            .unwrap();
        assert!(!report.overall_approved);
    }

    #[tokio::test]
    async fn test_excerpt_is_bounded() {
        let oracle = Arc::new(ScriptedOracle::new().reply(LEAD_REVIEWER, "APPROVED"));
        let artifact = "é".repeat(EXCERPT_BUDGET + 500);
        let results = vec![result("architect", "Architect", true)];

        reducer(oracle.clone())
            .synthesize(&results, &artifact)
            .await
            .unwrap();

        let request = &oracle.calls_for(LEAD_REVIEWER)[0][0].content;
        assert_eq!(request.matches('é').count(), EXCERPT_BUDGET);
    }

    #[tokio::test]
    async fn test_no_successful_reviews_fails() {
        let oracle = Arc::new(ScriptedOracle::new().reply(LEAD_REVIEWER, "APPROVED"));
        let results = vec![result("architect", "Architect", false)];
        let err = reducer(oracle.clone())
            .synthesize(&results, "x")
            .await
            .unwrap_err();
        assert!(matches!(err, TeamReviewError::AllPerspectivesFailed { .. }));
        assert_eq!(oracle.call_count(), 0);
    }
}
