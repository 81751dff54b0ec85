//! Core configuration and errors for the wrun watch-and-run tool.
//!
//! This crate provides the foundational types used across the workspace:
//!
//! - [`RunnerConfig`] - the two operator inputs (command text, watch path)
//!   plus the execution failure policy
//! - [`FailurePolicy`] - what a failed command does to the watch
//! - [`QUIESCENCE_INTERVAL`] - the fixed debounce delay
//! - [`ConfigError`] - startup configuration failures
//!
//! # Crate Dependencies
//!
//! ```text
//! wr-cli ──► wr-runner ──► wr-watcher ──► wr-core
//!                      └─────────────────►
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod config;
pub mod error;

pub use config::{FailurePolicy, QUIESCENCE_INTERVAL, RunnerConfig};
pub use error::ConfigError;
