use std::path::PathBuf;

use anyhow::{Context, Result};
use colored::Colorize;

use revloop_core::{ConvergenceOrchestrator, ConvergenceRequest, LoopResult};
use revloop_roles::RoleSet;

use crate::setup::{current_dir, GlobalOptions, Runtime};

const DEFAULT_MAX_ITERATIONS: usize = 5;

pub struct ConvergeArgs {
    pub task: String,
    pub files: Vec<PathBuf>,
    pub role_set: Option<RoleSet>,
    pub max_iterations: Option<usize>,
    pub output: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub async fn handle_converge_command(options: &GlobalOptions, args: ConvergeArgs) -> Result<u8> {
    let working_dir = current_dir()?;
    let runtime = Runtime::prepare(options, &working_dir, args.quiet).await?;

    let registry = runtime.config.registry(args.role_set)?;
    let max_iterations = args
        .max_iterations
        .or(runtime.config.max_iterations)
        .unwrap_or(DEFAULT_MAX_ITERATIONS);

    let mut request = ConvergenceRequest::new(args.task, max_iterations);
    if !args.files.is_empty() {
        request = request.with_context(load_file_context(&args.files)?);
    }

    let orchestrator =
        ConvergenceOrchestrator::new(runtime.oracle.clone(), registry, runtime.logger.clone());
    let result = orchestrator.run(request).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_result(&result);
    }

    if let Some(ref output) = args.output {
        std::fs::write(output, &result.final_artifact)
            .with_context(|| format!("Failed to write {}", output.display()))?;
        eprintln!("Saved to {}", output.display());
    }

    Ok(result.exit_code() as u8)
}

/// Concatenate files as `// File: <path>` blocks
fn load_file_context(paths: &[PathBuf]) -> Result<String> {
    let parts = paths
        .iter()
        .map(|path| {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read context file {}", path.display()))?;
            Ok(format!("// File: {}\n{}", path.display(), content))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(parts.join("\n\n"))
}

fn print_result(result: &LoopResult) {
    eprintln!();
    eprintln!("{}", "═".repeat(60));
    if result.approved {
        eprintln!(
            "{}",
            format!("APPROVED after {} iteration(s)", result.iterations)
                .bright_green()
                .bold()
        );
    } else {
        eprintln!(
            "{}",
            format!("INCOMPLETE after {} iteration(s)", result.iterations)
                .yellow()
                .bold()
        );
        if let Some(ref note) = result.note {
            eprintln!("Note: {}", note);
        }
    }
    eprintln!("Duration: {:.1}s", result.total_duration_secs);
    eprintln!("{}", "═".repeat(60));
    eprintln!();

    println!("{}", result.final_artifact);
}
