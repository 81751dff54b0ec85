//! Configuration structures for the wrun tool.
//!
//! This module provides the configuration consumed by the watch session:
//!
//! - [`RunnerConfig`] - command text, watch path and failure policy
//! - [`FailurePolicy`] - how a failed command affects the running watch
//!
//! The debounce delay is not configurable; every session uses
//! [`QUIESCENCE_INTERVAL`].

use std::time::Duration;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Fixed delay after the last qualifying event before the command runs.
///
/// Every new qualifying event restarts the countdown.
pub const QUIESCENCE_INTERVAL: Duration = Duration::from_millis(500);

/// What happens to the watch when the command fails to start or exits
/// with a non-zero status.
///
/// # Examples
///
/// ```
/// use wr_core::FailurePolicy;
///
/// assert_eq!(FailurePolicy::default(), FailurePolicy::Fatal);
/// assert!(FailurePolicy::Fatal.is_fatal());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum FailurePolicy {
    /// Terminate the whole watch with a non-zero exit code.
    #[default]
    Fatal,
    /// Log the failure and keep watching.
    Continue,
}

impl FailurePolicy {
    /// Returns `true` if a command failure ends the watch.
    #[inline]
    #[must_use]
    pub const fn is_fatal(self) -> bool {
        matches!(self, Self::Fatal)
    }

    /// Returns a short lowercase label for logging.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Fatal => "fatal",
            Self::Continue => "continue",
        }
    }
}

/// Configuration for one watch session.
///
/// Both strings are taken verbatim from the operator. Call
/// [`RunnerConfig::validate`] before registering anything with the OS.
///
/// # Examples
///
/// ```
/// use wr_core::RunnerConfig;
///
/// let config = RunnerConfig::new("cargo test");
/// assert!(config.validate().is_ok());
/// assert!(config.watch_path.is_none());
///
/// assert!(RunnerConfig::new("   ").validate().is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Shell command line executed after each quiet period.
    pub command: String,

    /// File or directory to observe.
    ///
    /// `None` (or an empty path) means the current working directory.
    pub watch_path: Option<Utf8PathBuf>,

    /// Behavior when the command fails.
    pub failure_policy: FailurePolicy,
}

impl RunnerConfig {
    /// Creates a configuration that runs `command` in the current directory.
    #[must_use]
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ..Self::default()
        }
    }

    /// Sets the path to watch.
    #[must_use]
    pub fn with_watch_path(mut self, path: impl Into<Utf8PathBuf>) -> Self {
        self.watch_path = Some(path.into());
        self
    }

    /// Sets the failure policy.
    #[must_use]
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Checks that the configuration can start a watch.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingCommand`] if the command text is empty
    /// or only whitespace.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.command.trim().is_empty() {
            return Err(ConfigError::MissingCommand);
        }
        Ok(())
    }

    /// Returns the path to watch, falling back to the current directory.
    ///
    /// The returned path is not checked for existence; that happens when the
    /// path is registered with the event source.
    pub fn resolve_watch_path(&self) -> Result<Utf8PathBuf, ConfigError> {
        match &self.watch_path {
            Some(path) if !path.as_str().is_empty() => Ok(path.clone()),
            _ => {
                let cwd = std::env::current_dir().map_err(ConfigError::CurrentDir)?;
                Utf8PathBuf::from_path_buf(cwd).map_err(ConfigError::NonUtf8Path)
            }
        }
    }
}
