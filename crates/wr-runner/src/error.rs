//! Error types for the wr-runner crate.
//!
//! - [`SessionError`]: startup failures (configuration, registration).
//! - [`ExecutionError`]: the command could not be started or failed.
//! - [`RunError`]: why a running watch ended abnormally.

use wr_core::ConfigError;
use wr_watcher::WatchError;

/// Errors that prevent a watch session from starting.
///
/// Configuration is validated before anything is registered with the OS,
/// so a [`SessionError::Config`] guarantees no watch was ever created.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The configuration is unusable (e.g. empty command).
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The watch path could not be registered.
    #[error(transparent)]
    Registration(#[from] WatchError),
}

/// A failed run of the configured command.
#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    /// The shell process could not be started.
    #[error("failed to start `{command}`: {source}")]
    Spawn {
        /// The command text.
        command: String,
        /// The underlying spawn error.
        #[source]
        source: std::io::Error,
    },

    /// The command ran but did not succeed.
    #[error("`{command}` {}", describe_exit(.code))]
    Failed {
        /// The command text.
        command: String,
        /// Exit code, or `None` when terminated by a signal.
        code: Option<i32>,
    },
}

impl ExecutionError {
    /// Returns the exit code, if the command ran and exited normally.
    #[must_use]
    pub const fn exit_code(&self) -> Option<i32> {
        match self {
            Self::Failed { code, .. } => *code,
            Self::Spawn { .. } => None,
        }
    }

    /// Returns the command text that failed.
    #[must_use]
    pub fn command(&self) -> &str {
        match self {
            Self::Spawn { command, .. } | Self::Failed { command, .. } => command,
        }
    }
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exited with status {code}"),
        None => "was terminated by a signal".to_owned(),
    }
}

/// Reasons a running watch ended with an error.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// The command failed under the fatal failure policy.
    #[error("command failed: {0}")]
    Execution(#[from] ExecutionError),

    /// The event loop task panicked or was aborted.
    #[error("event loop task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl RunError {
    /// Returns the execution error, if that is what ended the watch.
    #[must_use]
    pub const fn as_execution(&self) -> Option<&ExecutionError> {
        match self {
            Self::Execution(error) => Some(error),
            Self::Task(_) => None,
        }
    }
}
