use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Structured log events for the review loops
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LogEvent {
    LoopStarted {
        task_preview: String,
        max_iterations: usize,
        role_set: String,
    },
    GeneratorStarted {
        iteration: usize,
        max_iterations: usize,
    },
    GeneratorCompleted {
        iteration: usize,
        response_chars: usize,
        duration_secs: f64,
    },
    CriticStarted {
        iteration: usize,
    },
    CriticCompleted {
        iteration: usize,
        verdict: String,
        duration_secs: f64,
    },
    LoopApproved {
        iterations: usize,
        duration_secs: f64,
    },
    MaxIterationsReached {
        iterations: usize,
    },
    OracleFailed {
        stage: String,
        error: String,
    },
    TeamReviewStarted {
        perspectives: Vec<String>,
    },
    PerspectiveCompleted {
        perspective: String,
        ok: bool,
        duration_secs: f64,
        error: Option<String>,
    },
    SynthesisStarted {
        reviews: usize,
        omitted: usize,
    },
    SynthesisCompleted {
        approved: bool,
        issues: usize,
    },
    WatchStarted {
        file: PathBuf,
    },
    SubmissionDetected {
        preview: String,
    },
    ReviewAppended {
        approved: bool,
    },
}

impl LogEvent {
    /// Add a timestamp to serialize with the event
    fn with_timestamp(&self) -> serde_json::Value {
        let mut value = serde_json::to_value(self).unwrap_or_default();
        if let Some(obj) = value.as_object_mut() {
            obj.insert(
                "timestamp".to_string(),
                serde_json::Value::String(chrono::Utc::now().to_rfc3339()),
            );
        }
        value
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable format with colors and visual structure
    #[default]
    Pretty,
    /// JSON lines format for machine consumption
    Json,
    /// Compact single-line format
    Compact,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            "compact" => Ok(LogFormat::Compact),
            _ => Err(format!("Unknown log format: {}", s)),
        }
    }
}

/// Logger for revloop events - console output plus optional JSONL file
pub struct Logger {
    format: LogFormat,
    quiet: bool,
    file_writer: Option<Mutex<File>>,
}

impl Logger {
    pub fn new(format: LogFormat) -> Self {
        Self {
            format,
            quiet: false,
            file_writer: None,
        }
    }

    /// A logger that writes nothing to the console
    pub fn quiet() -> Self {
        Self {
            format: LogFormat::Compact,
            quiet: true,
            file_writer: None,
        }
    }

    /// Create a logger with file output in addition to console
    pub fn with_file(format: LogFormat, log_path: &Path) -> std::io::Result<Self> {
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)?;

        Ok(Self {
            format,
            quiet: false,
            file_writer: Some(Mutex::new(file)),
        })
    }

    pub fn log(&self, event: &LogEvent) {
        // File output is always JSON
        if let Some(ref writer) = self.file_writer {
            if let Ok(mut file) = writer.lock() {
                let json = event.with_timestamp();
                let _ = writeln!(file, "{}", json);
            }
        }

        if self.quiet {
            return;
        }

        match self.format {
            LogFormat::Json => self.log_json(event),
            LogFormat::Pretty => self.log_pretty(event),
            LogFormat::Compact => self.log_compact(event),
        }
    }

    fn log_json(&self, event: &LogEvent) {
        if let Ok(json) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{}", json);
        }
    }

    fn log_pretty(&self, event: &LogEvent) {
        let mut stderr = std::io::stderr();
        match event {
            LogEvent::LoopStarted {
                task_preview,
                max_iterations,
                role_set,
            } => {
                let _ = writeln!(stderr);
                let _ = writeln!(
                    stderr,
                    "{}",
                    "╭─────────────────────────────────────────────────────────────────────╮"
                        .bright_blue()
                );
                let _ = writeln!(
                    stderr,
                    "{}  {}{}",
                    "│".bright_blue(),
                    "revloop".bold().bright_white(),
                    " ".repeat(60) + &"│".bright_blue().to_string()
                );
                let _ = writeln!(
                    stderr,
                    "{}  {} {}",
                    "│".bright_blue(),
                    "Task:".dimmed(),
                    Self::truncate_with_padding(task_preview, 60, 62).dimmed()
                );
                let _ = writeln!(
                    stderr,
                    "{}  {} {}",
                    "│".bright_blue(),
                    "Roles:".dimmed(),
                    Self::truncate_with_padding(
                        &format!("{} / max {} iterations", role_set, max_iterations),
                        58,
                        61
                    )
                    .dimmed()
                );
                let _ = writeln!(
                    stderr,
                    "{}",
                    "╰─────────────────────────────────────────────────────────────────────╯"
                        .bright_blue()
                );
                let _ = writeln!(stderr);
            }
            LogEvent::GeneratorStarted {
                iteration,
                max_iterations,
            } => {
                let iter_text = format!("─ Iteration {}/{} ", iteration, max_iterations);
                let padding = "─".repeat(67usize.saturating_sub(iter_text.chars().count()));
                let _ = writeln!(
                    stderr,
                    "{}{}{}",
                    "┌".bright_blue(),
                    iter_text.bright_blue().bold(),
                    padding.bright_blue()
                );
                let _ = writeln!(
                    stderr,
                    "  {} {}",
                    "▶".bright_cyan(),
                    "GENERATOR".bright_cyan().bold()
                );
            }
            LogEvent::GeneratorCompleted {
                response_chars,
                duration_secs,
                ..
            } => {
                let _ = writeln!(
                    stderr,
                    "    {} {} chars ({:.1}s)",
                    "✓".bright_green(),
                    response_chars,
                    duration_secs
                );
            }
            LogEvent::CriticStarted { .. } => {
                let _ = writeln!(
                    stderr,
                    "  {} {}",
                    "▶".bright_magenta(),
                    "CRITIC".bright_magenta().bold()
                );
            }
            LogEvent::CriticCompleted {
                verdict,
                duration_secs,
                ..
            } => {
                let line = format!("Verdict: {} ({:.1}s)", verdict, duration_secs);
                let styled = if verdict == "APPROVED" {
                    format!("✓ {}", line).bright_green().to_string()
                } else {
                    format!("→ {}", line).bright_yellow().to_string()
                };
                let _ = writeln!(stderr, "    {}", styled);
                let _ = writeln!(
                    stderr,
                    "{}",
                    "└─────────────────────────────────────────────────────────────────────┘"
                        .bright_blue()
                );
                let _ = writeln!(stderr);
            }
            LogEvent::LoopApproved { .. } => {
                // The final result is printed by the CLI
            }
            LogEvent::MaxIterationsReached { iterations } => {
                let _ = writeln!(
                    stderr,
                    "{} Maximum iterations reached ({})",
                    "⚠".bright_yellow(),
                    iterations
                );
            }
            LogEvent::OracleFailed { stage, error } => {
                let _ = writeln!(
                    stderr,
                    "{} {} failed: {}",
                    "✗".bright_red(),
                    stage,
                    error.bright_red()
                );
            }
            LogEvent::TeamReviewStarted { perspectives } => {
                let _ = writeln!(
                    stderr,
                    "\n{} {}",
                    "👥 Team Review:".bold(),
                    perspectives.join(", ")
                );
                let _ = writeln!(stderr, "{}", "━".repeat(60).dimmed());
            }
            LogEvent::PerspectiveCompleted {
                perspective,
                ok,
                duration_secs,
                error,
            } => {
                if *ok {
                    let _ = writeln!(
                        stderr,
                        "  {} {} review complete ({:.1}s)",
                        "✓".bright_green(),
                        perspective,
                        duration_secs
                    );
                } else {
                    let _ = writeln!(
                        stderr,
                        "  {} {} review failed: {}",
                        "✗".bright_red(),
                        perspective,
                        error.as_deref().unwrap_or("unknown error").bright_red()
                    );
                }
            }
            LogEvent::SynthesisStarted { reviews, omitted } => {
                let _ = writeln!(stderr);
                if *omitted > 0 {
                    let _ = writeln!(
                        stderr,
                        "{} Synthesizing {} reviews ({} failed and omitted)...",
                        "🔄".dimmed(),
                        reviews,
                        omitted
                    );
                } else {
                    let _ = writeln!(
                        stderr,
                        "{} Synthesizing {} reviews...",
                        "🔄".dimmed(),
                        reviews
                    );
                }
            }
            LogEvent::SynthesisCompleted { approved, issues } => {
                let verdict = if *approved {
                    "APPROVED".bright_green()
                } else {
                    "CHANGES_REQUESTED".bright_yellow()
                };
                let _ = writeln!(stderr, "  Verdict: {} ({} ranked issues)", verdict, issues);
                let _ = writeln!(stderr, "{}", "━".repeat(60).dimmed());
            }
            LogEvent::WatchStarted { file } => {
                let _ = writeln!(
                    stderr,
                    "{} Watching {} (Ctrl+C to stop)",
                    "👀".dimmed(),
                    file.display().to_string().bold()
                );
            }
            LogEvent::SubmissionDetected { preview } => {
                let _ = writeln!(
                    stderr,
                    "{} New submission: {}",
                    "▶".bright_cyan(),
                    preview.dimmed()
                );
            }
            LogEvent::ReviewAppended { approved } => {
                let status = if *approved {
                    "APPROVED".bright_green()
                } else {
                    "CHANGES_REQUESTED".bright_yellow()
                };
                let _ = writeln!(stderr, "  {} Review added: {}", "✓".bright_green(), status);
            }
        }
    }

    fn log_compact(&self, event: &LogEvent) {
        let mut stderr = std::io::stderr();
        let timestamp = chrono::Utc::now().format("%H:%M:%S");
        let msg = match event {
            LogEvent::LoopStarted { max_iterations, .. } => {
                format!("[{}] loop:start max={}", timestamp, max_iterations)
            }
            LogEvent::GeneratorStarted { iteration, .. } => {
                format!("[{}] generator:start:{}", timestamp, iteration)
            }
            LogEvent::GeneratorCompleted {
                iteration,
                response_chars,
                duration_secs,
            } => format!(
                "[{}] generator:done:{} {}c {:.1}s",
                timestamp, iteration, response_chars, duration_secs
            ),
            LogEvent::CriticStarted { iteration } => {
                format!("[{}] critic:start:{}", timestamp, iteration)
            }
            LogEvent::CriticCompleted {
                iteration, verdict, ..
            } => format!("[{}] critic:done:{} {}", timestamp, iteration, verdict),
            LogEvent::LoopApproved {
                iterations,
                duration_secs,
            } => format!(
                "[{}] loop:approved:{} {:.1}s",
                timestamp, iterations, duration_secs
            ),
            LogEvent::MaxIterationsReached { iterations } => {
                format!("[{}] loop:limit:{}", timestamp, iterations)
            }
            LogEvent::OracleFailed { stage, error } => {
                format!("[{}] error:{}:{}", timestamp, stage, error)
            }
            LogEvent::TeamReviewStarted { perspectives } => {
                format!("[{}] team:start:{}", timestamp, perspectives.len())
            }
            LogEvent::PerspectiveCompleted {
                perspective, ok, ..
            } => format!(
                "[{}] perspective:{}:{}",
                timestamp,
                perspective,
                if *ok { "ok" } else { "failed" }
            ),
            LogEvent::SynthesisStarted { reviews, omitted } => {
                format!("[{}] synthesis:start {}+{}", timestamp, reviews, omitted)
            }
            LogEvent::SynthesisCompleted { approved, issues } => format!(
                "[{}] synthesis:done approved={} issues={}",
                timestamp, approved, issues
            ),
            LogEvent::WatchStarted { file } => {
                format!("[{}] watch:start {}", timestamp, file.display())
            }
            LogEvent::SubmissionDetected { .. } => format!("[{}] watch:submission", timestamp),
            LogEvent::ReviewAppended { approved } => {
                format!("[{}] watch:review approved={}", timestamp, approved)
            }
        };
        let _ = writeln!(stderr, "{}", msg);
    }

    /// Truncate a string and pad to exact width
    fn truncate_with_padding(s: &str, max_len: usize, total_width: usize) -> String {
        let truncated = if s.chars().count() > max_len {
            let head: String = s.chars().take(max_len - 3).collect();
            format!("{}...", head)
        } else {
            s.to_string()
        };

        let padding_needed = total_width.saturating_sub(truncated.chars().count() + 1);
        format!("{}{}│", truncated, " ".repeat(padding_needed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_serialize_with_tag() {
        let event = LogEvent::PerspectiveCompleted {
            perspective: "Bug Hunter".into(),
            ok: false,
            duration_secs: 1.5,
            error: Some("timeout".into()),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "perspective_completed");
        assert_eq!(json["perspective"], "Bug Hunter");
        assert_eq!(json["ok"], false);
    }

    #[test]
    fn test_file_logger_appends_json_lines() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("logs").join("revloop.jsonl");
        let logger = Logger::with_file(LogFormat::Compact, &path).unwrap();

        logger.log(&LogEvent::CriticStarted { iteration: 1 });
        logger.log(&LogEvent::MaxIterationsReached { iterations: 3 });

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second["event"], "max_iterations_reached");
        assert!(second["timestamp"].is_string());
    }

    #[test]
    fn test_truncate_with_padding() {
        let padded = Logger::truncate_with_padding("short", 10, 12);
        assert_eq!(padded, "short      │");
        let cut = Logger::truncate_with_padding("a much longer string", 10, 12);
        assert!(cut.starts_with("a much ..."));
    }

    #[test]
    fn test_log_format_parse() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert!("xml".parse::<LogFormat>().is_err());
    }
}
