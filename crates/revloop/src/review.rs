use std::path::PathBuf;

use anyhow::{Context, Result};
use colored::Colorize;

use revloop_core::{QuickReview, ReviewOutcome};
use revloop_git::{ChangeSet, DiffScope};

use crate::setup::{current_dir, read_piped_stdin, GlobalOptions, Runtime};

pub async fn handle_review_command(
    options: &GlobalOptions,
    file: Option<PathBuf>,
    question: Option<String>,
    repo: Option<PathBuf>,
) -> Result<u8> {
    let artifact = match file {
        Some(ref path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => read_piped_stdin()?.context("No code provided. Use --file or pipe code via stdin")?,
    };
    if artifact.trim().is_empty() {
        anyhow::bail!("Nothing to review: input is empty");
    }

    let working_dir = match repo {
        Some(repo) => repo,
        None => current_dir()?,
    };
    let runtime = Runtime::prepare(options, &working_dir, false).await?;
    let registry = runtime.config.registry(None)?;

    let reviewer = QuickReview::new(runtime.oracle.clone(), &registry, runtime.logger.clone())?;
    let outcome = reviewer
        .review(
            &artifact,
            question.as_deref(),
            runtime.config.project.as_ref(),
        )
        .await?;

    Ok(print_outcome(&outcome))
}

pub struct DiffReviewArgs {
    pub repo: PathBuf,
    pub files: Vec<String>,
    pub staged: bool,
    pub context: Option<String>,
    pub context_file: Option<PathBuf>,
}

/// Review the repository's uncommitted changes with a single reviewer
pub async fn handle_diff_review_command(options: &GlobalOptions, args: DiffReviewArgs) -> Result<u8> {
    let repo = args
        .repo
        .canonicalize()
        .with_context(|| format!("Repository not found: {}", args.repo.display()))?;
    let scope = if args.staged {
        DiffScope::Staged
    } else {
        DiffScope::Unstaged
    };

    let developer_context = match (args.context_file, args.context) {
        (Some(path), _) => Some(
            std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read context file {}", path.display()))?,
        ),
        (None, Some(context)) => Some(context),
        (None, None) => read_piped_stdin()?,
    };

    let changes = ChangeSet::capture_paths(&repo, scope, &args.files)?;
    if changes.is_empty() {
        eprintln!("No changes detected. Nothing to review.");
        eprintln!("Tip: make sure you have uncommitted changes, or use --staged for staged changes.");
        return Ok(0);
    }

    let runtime = Runtime::prepare(options, &repo, false).await?;
    let registry = runtime.config.registry(None)?;
    let project = runtime.config.project.as_ref();

    if let Some(project) = project.filter(|p| p.is_named()) {
        eprintln!("{} {}", "Project:".bold(), project.name);
    }
    eprintln!("{} {}", "Reviewing changes in:".bold(), changes.files.join(", "));
    if let Some(ref context) = developer_context {
        let preview: String = context.trim().chars().take(100).collect();
        eprintln!("{} {}", "Context:".bold(), preview);
    }

    let reviewer = QuickReview::for_diff(runtime.oracle.clone(), &registry, runtime.logger.clone())?;
    let outcome = reviewer
        .review_diff(
            &changes.diff,
            &changes.files,
            developer_context.as_deref(),
            project,
        )
        .await?;

    Ok(print_outcome(&outcome))
}

/// Review text on stdout, verdict banner on stderr; returns the exit code
fn print_outcome(outcome: &ReviewOutcome) -> u8 {
    println!("{}", outcome.text);
    eprintln!();
    if outcome.approved {
        eprintln!("{}", "APPROVED".bright_green().bold());
    } else {
        eprintln!("{}", "CHANGES_REQUESTED".yellow().bold());
    }
    outcome.exit_code() as u8
}
