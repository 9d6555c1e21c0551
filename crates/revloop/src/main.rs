use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;

use revloop_logging::{init_tracing, LogFormat};
use revloop_oracle::OracleBackend;
use revloop_roles::RoleSet;

mod config;
mod converge;
mod review;
mod setup;
mod team;
mod watch;

/// Exit code for anything that is neither approved nor rejected
const EXIT_FAILURE: u8 = 2;

#[derive(Parser, Debug)]
#[command(
    name = "revloop",
    about = "Generator/critic review loops on top of coding assistants",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Assistant CLI that answers for every role
    #[arg(long, value_enum, global = true)]
    agent: Option<AgentChoice>,

    /// Model to use (if the agent supports it)
    #[arg(long, global = true)]
    model: Option<String>,

    /// Per-call timeout in seconds
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    /// Log output format
    #[arg(long, value_enum, default_value = "pretty", global = true)]
    log_format: LogFormatChoice,

    /// Diagnostic log level (RUST_LOG takes precedence)
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,

    /// Also write diagnostics and JSON events to this directory
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Iterate generator and critic until the critic approves
    Converge {
        /// The development task to accomplish
        #[arg(short, long)]
        task: String,

        /// Files to include as context
        #[arg(short, long, num_args = 1..)]
        files: Vec<PathBuf>,

        /// Built-in role pair
        #[arg(long, value_enum)]
        role_set: Option<RoleSetChoice>,

        /// Maximum iterations before stopping (default: 5)
        #[arg(short, long)]
        max_iterations: Option<usize>,

        /// Write the final artifact to this file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output the result as JSON
        #[arg(long)]
        json: bool,

        /// Suppress progress output
        #[arg(short, long)]
        quiet: bool,
    },

    /// Review uncommitted changes from several perspectives at once
    TeamReview {
        /// Path to the git repository
        #[arg(short, long, default_value = ".")]
        repo: PathBuf,

        /// What you just did (read from stdin when omitted and piped)
        #[arg(short, long)]
        context: Option<String>,

        /// Review staged changes only
        #[arg(short, long)]
        staged: bool,

        /// Built-in perspective set
        #[arg(long, value_enum)]
        role_set: Option<RoleSetChoice>,

        /// Output the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Single review of a file or stdin
    Review {
        /// File to review (stdin when omitted)
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Specific question about the code
        #[arg(short, long)]
        question: Option<String>,

        /// Repository whose revloop.toml supplies project context
        #[arg(short, long)]
        repo: Option<PathBuf>,
    },

    /// Single review of uncommitted git changes, read against what you meant to do
    DiffReview {
        /// Path to the git repository
        #[arg(short, long, default_value = ".")]
        repo: PathBuf,

        /// Only review changes under these paths
        #[arg(short, long, num_args = 1..)]
        files: Vec<String>,

        /// Review staged changes only
        #[arg(short, long)]
        staged: bool,

        /// What you just did (read from stdin when omitted and piped)
        #[arg(short, long)]
        context: Option<String>,

        /// Read the developer context from a file
        #[arg(long, conflicts_with = "context")]
        context_file: Option<PathBuf>,
    },

    /// Answer new submissions in a shared conversation file
    Watch {
        /// Conversation file (created when missing)
        #[arg(short, long, default_value = "conversation.md")]
        file: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum AgentChoice {
    Claude,
    Opencode,
}

impl From<AgentChoice> for OracleBackend {
    fn from(choice: AgentChoice) -> Self {
        match choice {
            AgentChoice::Claude => OracleBackend::ClaudeCode,
            AgentChoice::Opencode => OracleBackend::OpenCode,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum RoleSetChoice {
    General,
    Ios,
}

impl From<RoleSetChoice> for RoleSet {
    fn from(choice: RoleSetChoice) -> Self {
        match choice {
            RoleSetChoice::General => RoleSet::General,
            RoleSetChoice::Ios => RoleSet::Ios,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormatChoice {
    Pretty,
    Json,
    Compact,
}

impl From<LogFormatChoice> for LogFormat {
    fn from(choice: LogFormatChoice) -> Self {
        match choice {
            LogFormatChoice::Pretty => LogFormat::Pretty,
            LogFormatChoice::Json => LogFormat::Json,
            LogFormatChoice::Compact => LogFormat::Compact,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let log_format: LogFormat = cli.log_format.into();
    let _guard = init_tracing(&cli.log_level, log_format, cli.log_dir.as_deref());

    match run(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("{} {:#}", "error:".red().bold(), e);
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

async fn run(cli: Cli) -> Result<u8> {
    let options = setup::GlobalOptions {
        agent: cli.agent.map(Into::into),
        model: cli.model,
        timeout_secs: cli.timeout_secs,
        log_format: cli.log_format.into(),
        log_dir: cli.log_dir,
    };

    match cli.command {
        Command::Converge {
            task,
            files,
            role_set,
            max_iterations,
            output,
            json,
            quiet,
        } => {
            converge::handle_converge_command(
                &options,
                converge::ConvergeArgs {
                    task,
                    files,
                    role_set: role_set.map(Into::into),
                    max_iterations,
                    output,
                    json,
                    quiet,
                },
            )
            .await
        }
        Command::TeamReview {
            repo,
            context,
            staged,
            role_set,
            json,
        } => {
            team::handle_team_review_command(
                &options,
                team::TeamReviewArgs {
                    repo,
                    context,
                    staged,
                    role_set: role_set.map(Into::into),
                    json,
                },
            )
            .await
        }
        Command::Review {
            file,
            question,
            repo,
        } => review::handle_review_command(&options, file, question, repo).await,
        Command::DiffReview {
            repo,
            files,
            staged,
            context,
            context_file,
        } => {
            review::handle_diff_review_command(
                &options,
                review::DiffReviewArgs {
                    repo,
                    files,
                    staged,
                    context,
                    context_file,
                },
            )
            .await
        }
        Command::Watch { file } => watch::handle_watch_command(&options, file).await,
    }
}
