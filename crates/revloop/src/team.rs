use std::path::PathBuf;

use anyhow::{Context, Result};
use colored::Colorize;

use revloop_core::{Severity, TeamReview, TeamReviewError, TeamReviewInput, TeamReviewOutcome};
use revloop_git::{ChangeSet, DiffScope};
use revloop_roles::RoleSet;

use crate::setup::{read_piped_stdin, GlobalOptions, Runtime};

pub struct TeamReviewArgs {
    pub repo: PathBuf,
    pub context: Option<String>,
    pub staged: bool,
    pub role_set: Option<RoleSet>,
    pub json: bool,
}

pub async fn handle_team_review_command(
    options: &GlobalOptions,
    args: TeamReviewArgs,
) -> Result<u8> {
    let repo = args
        .repo
        .canonicalize()
        .with_context(|| format!("Repository not found: {}", args.repo.display()))?;
    let scope = if args.staged {
        DiffScope::Staged
    } else {
        DiffScope::Unstaged
    };

    let changes = ChangeSet::capture(&repo, scope)?;
    if changes.is_empty() {
        eprintln!("No uncommitted changes found. Make your changes first, then run the review.");
        return Ok(0);
    }

    let developer_context = match args.context {
        Some(context) => Some(context),
        None => read_piped_stdin()?,
    };

    let runtime = Runtime::prepare(options, &repo, false).await?;
    let registry = runtime.config.registry(args.role_set)?;
    let perspectives = registry.perspectives()?;

    if let Some(ref project) = runtime.config.project {
        if project.is_named() {
            eprintln!("{} {}", "Project:".bold(), project.name);
        }
    }
    eprintln!("{} {}", "Changed files:".bold(), changes.files.join(", "));

    let team = TeamReview::new(runtime.oracle.clone(), &registry, runtime.logger.clone())?;
    let shared_context = changes.shared_context(developer_context.as_deref());
    let outcome = team
        .run(TeamReviewInput {
            artifact: &changes.diff,
            shared_context: &shared_context,
            perspectives,
            project: runtime.config.project.as_ref(),
        })
        .await;

    let outcome = match outcome {
        Ok(outcome) => outcome,
        Err(TeamReviewError::AllPerspectivesFailed { results }) => {
            for result in &results {
                eprintln!(
                    "  {} {}: {}",
                    "✗".red(),
                    result.perspective_name,
                    result.error.as_deref().unwrap_or("unknown error")
                );
            }
            anyhow::bail!("All {} perspectives failed", results.len());
        }
        Err(e) => return Err(e.into()),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print_outcome(&outcome);
    }

    Ok(outcome.exit_code() as u8)
}

fn print_outcome(outcome: &TeamReviewOutcome) {
    eprintln!();
    for result in &outcome.perspectives {
        if result.ok {
            eprintln!(
                "  {} {} ({:.1}s)",
                "✓".green(),
                result.perspective_name,
                result.duration_secs
            );
        } else {
            eprintln!(
                "  {} {} failed: {}",
                "✗".red(),
                result.perspective_name,
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    let report = &outcome.report;
    if !report.omitted_perspectives.is_empty() {
        eprintln!(
            "{}",
            format!(
                "Synthesis ran without: {}",
                report.omitted_perspectives.join(", ")
            )
            .yellow()
        );
    }

    let critical = report
        .ranked_issues
        .iter()
        .filter(|i| i.severity == Severity::Critical)
        .count();
    eprintln!();
    eprintln!("{}", "═".repeat(60));
    if report.overall_approved {
        eprintln!("{}", "APPROVED".bright_green().bold());
    } else {
        eprintln!(
            "{} ({} issue(s), {} critical)",
            "CHANGES_REQUESTED".yellow().bold(),
            report.ranked_issues.len(),
            critical
        );
    }
    eprintln!("{}", "═".repeat(60));
    eprintln!();

    println!("{}", report.synthesis_text);
}
