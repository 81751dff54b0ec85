//! Debounced command execution driven by filesystem events.
//!
//! This crate is the control loop of wrun: it consumes the channels of a
//! [`wr_watcher::EventSource`], keeps only qualifying changes, coalesces
//! bursts with a restartable timer and runs the configured shell command
//! once activity has been quiet for [`wr_core::QUIESCENCE_INTERVAL`].
//!
//! # Architecture
//!
//! ```text
//! main task                         event loop task (tokio::spawn)
//! ─────────                         ──────────────────────────────
//! WatchSession::start               Dispatcher::run
//!   validate config                   select! {
//!   register EventSource ──────────►    shutdown  -> stop
//! WatchSession::run                     event     -> filter, arm timer
//!   await JoinHandle ◄── completion     error     -> log, continue
//!                                       timer     -> execute command
//!                                     }
//! ```
//!
//! # State Machine
//!
//! ```text
//!            qualifying event               qualifying event
//!   ┌──────┐ ───────────────► ┌─────────┐ ◄──────────────┐ (re-arm)
//!   │ IDLE │                  │ PENDING │ ───────────────┘
//!   └──────┘ ◄─────────────── └─────────┘
//!            timer fired: run command synchronously
//! ```
//!
//! Remove and other events never change state. Only one command runs at a
//! time; events that arrive while it runs stay buffered in the channel and
//! produce at most one follow-up run.
//!
//! # Error Handling
//!
//! - Startup failures are [`SessionError`]s and no watch is left running.
//! - Transport errors from the event source are logged and ignored.
//! - A failed command is an [`ExecutionError`]; under
//!   [`FailurePolicy::Fatal`](wr_core::FailurePolicy::Fatal) it ends the
//!   watch with [`RunError::Execution`].

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod debounce;
pub mod dispatch;
pub mod error;
pub mod exec;
pub mod session;

pub use debounce::DelayTimer;
pub use dispatch::{DispatchState, DispatchSummary, Dispatcher};
pub use error::{ExecutionError, RunError, SessionError};
pub use exec::{CommandExecutor, ExecutionOutcome, ShellExecutor};
pub use session::WatchSession;
