//! External command execution.
//!
//! Every query wayr makes to the host (`ps`, `lsof`, `systemctl`, `docker`,
//! `man`) goes through [`CommandRunner`], so collectors can be driven with
//! canned output in tests.
//!
//! Commands run to completion with stdout and stderr fully captured. There is
//! no timeout: a hung external command blocks the caller.
//!
//! # Example
//!
//! ```ignore
//! use wayr_core::collect::tool_runner::{query, SystemRunner};
//!
//! let runner = SystemRunner::new();
//! if let Some(stdout) = query(&runner, "ps", &["-eo", "pid=,ppid="]) {
//!     println!("{stdout}");
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::process::Command;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, instrument, trace};

/// Environment variables passed through to child commands.
const PASSTHROUGH_ENV: &[&str] = &["PATH", "HOME", "DOCKER_HOST", "MANPATH"];

/// Errors that can occur during command execution.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("command not found: {0}")]
    CommandNotFound(String),

    #[error("command failed to spawn: {0}")]
    SpawnFailed(String),

    #[error("command exited with non-zero status: {code}")]
    NonZeroExit { code: i32 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Output from a command execution.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolOutput {
    /// Command that was executed.
    pub command: String,

    /// Arguments passed to the command.
    pub args: Vec<String>,

    /// Standard output.
    pub stdout: Vec<u8>,

    /// Standard error.
    pub stderr: Vec<u8>,

    /// Exit code (None when killed by a signal).
    pub exit_code: Option<i32>,

    /// Execution duration.
    pub duration: Duration,
}

impl ToolOutput {
    /// Get stdout as string (lossy UTF-8 conversion).
    pub fn stdout_str(&self) -> String {
        String::from_utf8_lossy(&self.stdout).to_string()
    }

    /// Get stderr as string (lossy UTF-8 conversion).
    pub fn stderr_str(&self) -> String {
        String::from_utf8_lossy(&self.stderr).to_string()
    }

    /// Check if the command succeeded (exit code 0).
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Runs an external command and captures its output.
pub trait CommandRunner {
    fn run(&self, cmd: &str, args: &[&str]) -> Result<ToolOutput, ToolError>;
}

/// Runs commands on the host with a minimal, locale-stable environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl SystemRunner {
    pub fn new() -> Self {
        SystemRunner
    }

    fn build_command(&self, cmd: &str, args: &[&str]) -> Command {
        let mut command = Command::new(cmd);
        command.args(args);

        // Clear environment variables that could change tool output format
        command.env_clear();
        for key in PASSTHROUGH_ENV {
            if let Ok(value) = std::env::var(key) {
                command.env(key, value);
            }
        }
        command.env("LC_ALL", "C");
        command.env("LANG", "C");

        command
    }
}

impl CommandRunner for SystemRunner {
    #[instrument(skip(self, args), fields(cmd = %cmd))]
    fn run(&self, cmd: &str, args: &[&str]) -> Result<ToolOutput, ToolError> {
        let start = Instant::now();
        let output = self
            .build_command(cmd, args)
            .output()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => ToolError::CommandNotFound(cmd.to_string()),
                _ => ToolError::SpawnFailed(format!("{cmd}: {e}")),
            })?;

        let result = ToolOutput {
            command: cmd.to_string(),
            args: args.iter().map(|s| s.to_string()).collect(),
            stdout: output.stdout,
            stderr: output.stderr,
            exit_code: output.status.code(),
            duration: start.elapsed(),
        };

        trace!(
            exit_code = ?result.exit_code,
            stdout_bytes = result.stdout.len(),
            elapsed_ms = result.duration.as_millis() as u64,
            "command finished"
        );

        Ok(result)
    }
}

/// Run a command and return its stdout only when it exited successfully.
///
/// Failures are logged at debug level and reported as "no data".
pub fn query(runner: &dyn CommandRunner, cmd: &str, args: &[&str]) -> Option<String> {
    match runner.run(cmd, args) {
        Ok(output) if output.success() => Some(output.stdout_str()),
        Ok(output) => {
            let err = ToolError::NonZeroExit {
                code: output.exit_code.unwrap_or(-1),
            };
            debug!(cmd, ?args, error = %err, "query returned no data");
            None
        }
        Err(err) => {
            debug!(cmd, ?args, error = %err, "query returned no data");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_echo() {
        let runner = SystemRunner::new();
        let output = runner.run("echo", &["hello", "world"]).unwrap();

        assert!(output.success());
        assert_eq!(output.stdout_str().trim(), "hello world");
        assert_eq!(output.command, "echo");
        assert_eq!(output.args, vec!["hello", "world"]);
    }

    #[test]
    fn test_run_with_stderr() {
        let runner = SystemRunner::new();
        let output = runner.run("sh", &["-c", "echo error >&2"]).unwrap();

        assert!(output.success());
        assert!(output.stderr_str().contains("error"));
    }

    #[test]
    fn test_nonzero_exit() {
        let runner = SystemRunner::new();
        let output = runner.run("sh", &["-c", "exit 42"]).unwrap();

        assert!(!output.success());
        assert_eq!(output.exit_code, Some(42));
    }

    #[test]
    fn test_command_not_found() {
        let runner = SystemRunner::new();
        let result = runner.run("/nonexistent/command/that/does/not/exist", &[]);

        match result {
            Err(ToolError::CommandNotFound(cmd)) => assert!(cmd.contains("nonexistent")),
            other => panic!("expected CommandNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_locale_is_pinned() {
        let runner = SystemRunner::new();
        let output = runner.run("sh", &["-c", "echo $LC_ALL"]).unwrap();
        assert_eq!(output.stdout_str().trim(), "C");
    }

    #[test]
    fn test_query_discards_failed_output() {
        let runner = SystemRunner::new();
        assert_eq!(query(&runner, "sh", &["-c", "echo partial; exit 1"]), None);
        assert_eq!(
            query(&runner, "sh", &["-c", "echo ok"]).as_deref(),
            Some("ok\n")
        );
        assert_eq!(query(&runner, "/nonexistent/wayr-tool", &[]), None);
    }
}
