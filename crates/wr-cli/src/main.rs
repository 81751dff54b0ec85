//! CLI entry point for wrun.
//!
//! Watches a file or directory and runs a shell command once changes have
//! settled for half a second.
//!
//! # Usage
//!
//! ```bash
//! wrun [OPTIONS] --command <COMMAND>
//!
//! # Rebuild whenever something in the current directory changes
//! wrun -c "make"
//!
//! # Watch a specific directory and keep going when the command fails
//! wrun -c "cargo test" -w src --on-failure continue
//! ```
//!
//! # Exit Codes
//!
//! - `0`: stopped by SIGINT / SIGTERM
//! - non-zero: missing command, unwatchable path, or a failed command under
//!   the default `--on-failure fatal`

#![deny(clippy::all)]
#![warn(missing_docs)]

use camino::Utf8PathBuf;
use clap::{Parser, ValueEnum};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use wr_core::{FailurePolicy, RunnerConfig};
use wr_runner::WatchSession;

// =============================================================================
// CLI ARGUMENT TYPES
// =============================================================================

/// Run a shell command whenever a file or directory changes.
///
/// Bursts of writes are coalesced: the command runs once, 500ms after the
/// last write, create or rename. Deletions are ignored.
#[derive(Parser)]
#[command(name = "wrun", version, about, long_about = None)]
struct Cli {
    /// Shell command line to execute.
    #[arg(short, long, env = "WRUN_COMMAND")]
    command: Option<String>,

    /// File or directory to watch.
    ///
    /// Defaults to the current working directory. Directories are watched
    /// non-recursively; whether nested changes are reported depends on the
    /// platform.
    #[arg(short, long, env = "WRUN_WATCH")]
    watch: Option<Utf8PathBuf>,

    /// What to do when the command fails.
    #[arg(long, value_enum, default_value_t = OnFailure::Fatal)]
    on_failure: OnFailure,

    /// Enable verbose logging (debug level).
    #[arg(short, long)]
    verbose: bool,

    /// Disable colored output.
    #[arg(long)]
    no_color: bool,
}

/// Failure policy as spelled on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OnFailure {
    /// Stop watching and exit non-zero.
    Fatal,
    /// Log the failure and keep watching.
    Continue,
}

impl From<OnFailure> for FailurePolicy {
    fn from(value: OnFailure) -> Self {
        match value {
            OnFailure::Fatal => Self::Fatal,
            OnFailure::Continue => Self::Continue,
        }
    }
}

// =============================================================================
// INITIALIZATION FUNCTIONS
// =============================================================================

/// Initializes the tracing subscriber for logging.
///
/// Respects `RUST_LOG` if set, otherwise `debug` with `--verbose` and `info`
/// by default. Logs go to stderr so the command's stdout stays clean.
fn init_tracing(verbose: bool, no_color: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = if verbose { "debug" } else { "info" };
        EnvFilter::new(format!("{level},mio=warn,notify=warn"))
    });

    let use_ansi = !no_color && std::env::var("NO_COLOR").is_err();

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_ansi(use_ansi)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

/// Builds a [`RunnerConfig`] from CLI arguments.
///
/// Validation happens in [`WatchSession::start`], so an absent command is
/// passed through as empty text.
fn build_config(cli: &Cli) -> RunnerConfig {
    RunnerConfig {
        command: cli.command.clone().unwrap_or_default(),
        watch_path: cli.watch.clone(),
        failure_policy: cli.on_failure.into(),
    }
}

// =============================================================================
// COMMAND IMPLEMENTATION
// =============================================================================

/// Completes on SIGINT or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            warn!(%error, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(error) => {
                warn!(%error, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}

/// Starts the watch and blocks until it ends.
///
/// # Errors
///
/// Returns an error if the session cannot start or the command fails
/// fatally.
async fn run_watch(config: RunnerConfig) -> color_eyre::Result<()> {
    let session = WatchSession::start(config)?;
    let shutdown = session.shutdown_token();

    let run = session.run();
    tokio::pin!(run);

    let summary = tokio::select! {
        result = &mut run => result?,
        () = shutdown_signal() => {
            info!("Received shutdown signal, stopping");
            shutdown.cancel();
            run.await?
        }
    };

    info!(executions = summary.executions, "Exiting");
    Ok(())
}

// =============================================================================
// MAIN ENTRY POINT
// =============================================================================

/// Application entry point.
#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.no_color);

    run_watch(build_config(&cli)).await
}
