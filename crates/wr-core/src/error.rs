//! Error types for the wr-core crate.
//!
//! This module provides the [`ConfigError`] type for configuration problems
//! detected before any watch is established.

use std::path::PathBuf;

/// Errors that can occur while validating a [`RunnerConfig`].
///
/// Every variant is fatal at startup: the process reports it and exits
/// before any filesystem registration takes place.
///
/// # Examples
///
/// ```
/// use wr_core::ConfigError;
///
/// let error = ConfigError::MissingCommand;
/// assert!(error.to_string().contains("command"));
/// ```
///
/// [`RunnerConfig`]: crate::RunnerConfig
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// No command text was provided (empty or whitespace only).
    #[error("no command to run: pass one with --command/-c")]
    MissingCommand,

    /// The current working directory could not be read.
    ///
    /// Only reached when no watch path was configured.
    #[error("failed to resolve current directory: {0}")]
    CurrentDir(#[source] std::io::Error),

    /// The resolved watch path is not valid UTF-8.
    #[error("watch path is not valid UTF-8: {}", _0.display())]
    NonUtf8Path(PathBuf),
}
