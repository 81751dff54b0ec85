//! Running the configured command.
//!
//! The [`CommandExecutor`] trait is the seam between the dispatcher and the
//! operating system. [`ShellExecutor`] is the real implementation: it hands
//! the command text to a shell and lets the child write straight to this
//! process's stdout and stderr.

use std::future::Future;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tokio::time::Instant;

use crate::error::ExecutionError;

/// The result of a successful command run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionOutcome {
    /// The exit code reported by the OS.
    pub exit_code: Option<i32>,

    /// Wall time from spawn to exit.
    pub elapsed: Duration,
}

/// Runs command text to completion.
///
/// Implementations must not return until the command has finished: the
/// dispatcher relies on that to keep at most one run in flight.
pub trait CommandExecutor: Send + 'static {
    /// Runs `command` and waits for it.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutionError::Spawn`] if the command cannot be started
    /// and [`ExecutionError::Failed`] if it exits unsuccessfully.
    fn execute(
        &mut self,
        command: &str,
    ) -> impl Future<Output = Result<ExecutionOutcome, ExecutionError>> + Send;
}

/// Executes commands through a shell interpreter.
///
/// Defaults to `sh -c` (`cmd /C` on Windows). The child inherits stdout and
/// stderr, reads from a null stdin and is killed if the run is cancelled.
///
/// # Examples
///
/// ```no_run
/// use wr_runner::{CommandExecutor, ShellExecutor};
///
/// # async fn example() -> Result<(), wr_runner::ExecutionError> {
/// let mut shell = ShellExecutor::default();
/// let outcome = shell.execute("echo rebuilt").await?;
/// assert_eq!(outcome.exit_code, Some(0));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellExecutor {
    program: String,
    flag: String,
}

impl ShellExecutor {
    /// Creates an executor using a specific shell, e.g. `("bash", "-c")`.
    #[must_use]
    pub fn with_shell(program: impl Into<String>, flag: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            flag: flag.into(),
        }
    }

    /// Returns the shell program.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    fn command(&self, text: &str) -> Command {
        let mut command = Command::new(&self.program);
        command
            .arg(&self.flag)
            .arg(text)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);
        command
    }
}

impl Default for ShellExecutor {
    #[cfg(not(windows))]
    fn default() -> Self {
        Self::with_shell("sh", "-c")
    }

    #[cfg(windows)]
    fn default() -> Self {
        Self::with_shell("cmd", "/C")
    }
}

impl CommandExecutor for ShellExecutor {
    async fn execute(&mut self, command: &str) -> Result<ExecutionOutcome, ExecutionError> {
        let started = Instant::now();
        tracing::info!(command, shell = %self.program, "Running command");

        let status = self
            .command(command)
            .status()
            .await
            .map_err(|source| ExecutionError::Spawn {
                command: command.to_owned(),
                source,
            })?;

        let elapsed = started.elapsed();

        if !status.success() {
            return Err(ExecutionError::Failed {
                command: command.to_owned(),
                code: status.code(),
            });
        }

        tracing::debug!(
            command,
            elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            "Command finished"
        );

        Ok(ExecutionOutcome {
            exit_code: status.code(),
            elapsed,
        })
    }
}
