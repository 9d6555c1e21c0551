use std::path::Path;
use std::process::Stdio;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, trace, warn};

use crate::{OracleConfig, OracleError, ProcessOutput};

/// Utility for spawning oracle processes
pub struct ProcessSpawner;

impl ProcessSpawner {
    /// Spawn a process and capture its output, honouring the configured timeout
    pub async fn spawn(
        binary: &Path,
        args: &[&str],
        config: &OracleConfig,
    ) -> Result<ProcessOutput, OracleError> {
        match config.timeout {
            Some(limit) => match tokio::time::timeout(limit, Self::run(binary, args, config)).await
            {
                Ok(result) => result,
                Err(_) => {
                    warn!(binary = %binary.display(), timeout = ?limit, "Oracle process timed out");
                    Err(OracleError::Timeout(limit))
                }
            },
            None => Self::run(binary, args, config).await,
        }
    }

    async fn run(
        binary: &Path,
        args: &[&str],
        config: &OracleConfig,
    ) -> Result<ProcessOutput, OracleError> {
        let start = Instant::now();

        debug!(
            binary = %binary.display(),
            arg_count = args.len(),
            working_dir = %config.working_dir.display(),
            "Spawning oracle process"
        );

        let mut cmd = Command::new(binary);
        cmd.args(args)
            .current_dir(&config.working_dir)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .stdin(Stdio::null())
            .kill_on_drop(true);

        for (key, value) in &config.env_vars {
            cmd.env(key, value);
        }

        let mut child = cmd.spawn()?;

        let stdout_handle = child
            .stdout
            .take()
            .ok_or_else(|| OracleError::ExecutionFailed("stdout not captured".to_string()))?;
        let stderr_handle = child
            .stderr
            .take()
            .ok_or_else(|| OracleError::ExecutionFailed("stderr not captured".to_string()))?;

        let mut stdout_reader = BufReader::new(stdout_handle).lines();
        let mut stderr_reader = BufReader::new(stderr_handle).lines();

        let mut stdout = String::new();
        let mut stderr = String::new();
        let mut stderr_open = true;

        // Read both streams concurrently
        loop {
            tokio::select! {
                biased;

                result = stdout_reader.next_line() => {
                    match result {
                        Ok(Some(line)) => {
                            trace!(line = %line, "stdout");
                            push_line(&mut stdout, &line);
                        }
                        Ok(None) => {
                            // stdout closed, drain stderr
                            while stderr_open {
                                match stderr_reader.next_line().await {
                                    Ok(Some(line)) => {
                                        trace!(line = %line, "stderr");
                                        push_line(&mut stderr, &line);
                                    }
                                    _ => stderr_open = false,
                                }
                            }
                            break;
                        }
                        Err(e) => {
                            return Err(OracleError::ExecutionFailed(format!(
                                "Failed to read stdout: {}",
                                e
                            )));
                        }
                    }
                }
                result = stderr_reader.next_line(), if stderr_open => {
                    match result {
                        Ok(Some(line)) => {
                            trace!(line = %line, "stderr");
                            push_line(&mut stderr, &line);
                        }
                        Ok(None) => stderr_open = false,
                        Err(e) => {
                            return Err(OracleError::ExecutionFailed(format!(
                                "Failed to read stderr: {}",
                                e
                            )));
                        }
                    }
                }
            }
        }

        let status = child.wait().await?;
        let duration = start.elapsed();

        debug!(
            exit_code = status.code().unwrap_or(-1),
            duration_ms = duration.as_millis(),
            "Oracle process completed"
        );

        Ok(ProcessOutput::new(
            stdout,
            stderr,
            status.code().unwrap_or(-1),
            duration,
        ))
    }
}

fn push_line(buf: &mut String, line: &str) {
    if !buf.is_empty() {
        buf.push('\n');
    }
    buf.push_str(line);
}
