//! The long-lived state of one watch.
//!
//! A [`WatchSession`] is built once at startup and consumed by
//! [`WatchSession::run`], which moves the event source and dispatcher into a
//! spawned task and waits on its join handle as the completion signal.

use camino::Utf8Path;
use tokio_util::sync::CancellationToken;
use wr_core::{FailurePolicy, RunnerConfig};
use wr_watcher::EventSource;

use crate::dispatch::{DispatchSummary, Dispatcher};
use crate::error::{RunError, SessionError};
use crate::exec::{CommandExecutor, ShellExecutor};

/// One registered watch plus the command it runs.
///
/// # Examples
///
/// ```no_run
/// use wr_core::RunnerConfig;
/// use wr_runner::WatchSession;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let session = WatchSession::start(RunnerConfig::new("cargo check").with_watch_path("src"))?;
/// let summary = session.run().await?;
/// println!("ran {} times", summary.executions);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct WatchSession {
    command: String,
    policy: FailurePolicy,
    source: EventSource,
    shutdown: CancellationToken,
}

impl WatchSession {
    /// Validates `config` and registers its watch path.
    ///
    /// Configuration is checked before anything is registered with the OS.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Config`] for an empty command or an
    /// unresolvable working directory, and [`SessionError::Registration`]
    /// if the path cannot be watched.
    pub fn start(config: RunnerConfig) -> Result<Self, SessionError> {
        config.validate()?;
        let path = config.resolve_watch_path()?;
        let source = EventSource::register(&path)?;

        tracing::info!(
            command = %config.command,
            path = %source.watch_path(),
            on_failure = config.failure_policy.label(),
            "Watch session started"
        );

        Ok(Self {
            command: config.command,
            policy: config.failure_policy,
            source,
            shutdown: CancellationToken::new(),
        })
    }

    /// Returns the command text.
    #[must_use]
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Returns the canonical watched path.
    #[must_use]
    pub fn watch_path(&self) -> &Utf8Path {
        self.source.watch_path()
    }

    /// Returns a token that stops the session when cancelled.
    #[must_use]
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Runs the watch with the default shell executor.
    ///
    /// # Errors
    ///
    /// See [`WatchSession::run_with`].
    pub async fn run(self) -> Result<DispatchSummary, RunError> {
        self.run_with(ShellExecutor::default()).await
    }

    /// Runs the watch until the event source closes, the shutdown token is
    /// cancelled or the command fails fatally.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::Execution`] for a fatal command failure and
    /// [`RunError::Task`] if the event loop task panicked.
    pub async fn run_with<E: CommandExecutor>(self, executor: E) -> Result<DispatchSummary, RunError> {
        let Self {
            command,
            policy,
            mut source,
            shutdown,
        } = self;

        let mut dispatcher = Dispatcher::new(command, executor, policy);

        let event_loop = tokio::spawn(async move {
            let (events, errors) = source.channels();
            let result = dispatcher.run(events, errors, &shutdown).await;
            source.close();
            result
        });

        let summary = event_loop.await??;

        tracing::info!(
            events = summary.events,
            executions = summary.executions,
            failures = summary.failures,
            transport_errors = summary.transport_errors,
            "Watch session finished"
        );

        Ok(summary)
    }
}
