use std::time::Duration;

/// Output captured from one oracle process run
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub duration: Duration,
}

impl ProcessOutput {
    pub fn new(stdout: String, stderr: String, exit_code: i32, duration: Duration) -> Self {
        Self {
            stdout,
            stderr,
            exit_code,
            duration,
        }
    }

    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// The first few stderr lines, for error reporting
    pub fn stderr_excerpt(&self, max_lines: usize) -> String {
        self.stderr
            .lines()
            .take(max_lines)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stderr_excerpt_limits_lines() {
        let output = ProcessOutput::new(
            String::new(),
            "one\ntwo\nthree".to_string(),
            1,
            Duration::from_millis(5),
        );
        assert!(!output.success());
        assert_eq!(output.stderr_excerpt(2), "one\ntwo");
    }
}
