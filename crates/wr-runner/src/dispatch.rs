//! The filter / debounce / dispatch loop.
//!
//! [`Dispatcher`] owns the pending [`DelayTimer`] and the executor, and is
//! driven by [`Dispatcher::run`] from a single task. Nothing else touches
//! the timer, which is what makes the lock-free restart-on-activity policy
//! correct.

use std::ops::ControlFlow;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use wr_core::{FailurePolicy, QUIESCENCE_INTERVAL};
use wr_watcher::{ChangeEvent, ErrorReceiver, EventFilter, EventReceiver, QualifyingFilter};

use crate::debounce::DelayTimer;
use crate::error::{ExecutionError, RunError};
use crate::exec::CommandExecutor;

/// Where the dispatcher is in its IDLE / PENDING cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    /// No timer armed.
    Idle,
    /// Timer armed, counting down to a run.
    Pending,
}

/// Counters accumulated over the life of a dispatcher.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatchSummary {
    /// Change events received.
    pub events: u64,

    /// Events rejected by the filter (remove, other).
    pub ignored: u64,

    /// Command runs started.
    pub executions: u64,

    /// Runs that ended in an [`ExecutionError`].
    pub failures: u64,

    /// Transport errors received from the event source.
    pub transport_errors: u64,
}

/// Drives command execution from a stream of change events.
pub struct Dispatcher<E, F = QualifyingFilter> {
    command: String,
    executor: E,
    filter: F,
    policy: FailurePolicy,
    timer: DelayTimer,
    summary: DispatchSummary,
}

impl<E, F> std::fmt::Debug for Dispatcher<E, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("command", &self.command)
            .field("policy", &self.policy)
            .field("timer", &self.timer)
            .field("summary", &self.summary)
            .finish_non_exhaustive()
    }
}

impl<E: CommandExecutor> Dispatcher<E, QualifyingFilter> {
    /// Creates a dispatcher that runs `command` after each quiet period.
    pub fn new(command: impl Into<String>, executor: E, policy: FailurePolicy) -> Self {
        Self {
            command: command.into(),
            executor,
            filter: QualifyingFilter,
            policy,
            timer: DelayTimer::new(QUIESCENCE_INTERVAL),
            summary: DispatchSummary::default(),
        }
    }
}

impl<E: CommandExecutor, F: EventFilter> Dispatcher<E, F> {
    /// Replaces the event filter.
    pub fn with_filter<G: EventFilter>(self, filter: G) -> Dispatcher<E, G> {
        Dispatcher {
            command: self.command,
            executor: self.executor,
            filter,
            policy: self.policy,
            timer: self.timer,
            summary: self.summary,
        }
    }

    /// Returns the current state.
    #[must_use]
    pub const fn state(&self) -> DispatchState {
        if self.timer.is_pending() {
            DispatchState::Pending
        } else {
            DispatchState::Idle
        }
    }

    /// Returns the counters so far.
    #[must_use]
    pub const fn summary(&self) -> DispatchSummary {
        self.summary
    }

    /// Returns the pending timer.
    #[must_use]
    pub const fn timer(&self) -> &DelayTimer {
        &self.timer
    }

    /// Returns the executor.
    pub const fn executor(&self) -> &E {
        &self.executor
    }

    /// Feeds one change event into the state machine.
    ///
    /// A qualifying event (re)arms the timer; anything else is counted and
    /// dropped without touching it. Returns `true` if the timer was armed.
    pub fn observe(&mut self, event: &ChangeEvent) -> bool {
        self.summary.events += 1;

        if !self.filter.accepts(event) {
            self.summary.ignored += 1;
            tracing::trace!(kind = %event.kind, path = %event.path, "Ignoring change");
            return false;
        }

        let restarted = self.timer.arm();
        tracing::debug!(
            kind = %event.kind,
            path = %event.path,
            restarted,
            "Change detected, debouncing"
        );
        true
    }

    /// Runs the loop until the event channel closes or `shutdown` fires.
    ///
    /// A pending timer is discarded when the loop ends. A running command
    /// is killed if `shutdown` fires while it runs.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::Execution`] when the command fails under
    /// [`FailurePolicy::Fatal`]; no further events are processed.
    pub async fn run(
        &mut self,
        events: &mut EventReceiver,
        errors: &mut ErrorReceiver,
        shutdown: &CancellationToken,
    ) -> Result<DispatchSummary, RunError> {
        let mut errors_open = true;

        loop {
            tokio::select! {
                biased;

                () = shutdown.cancelled() => {
                    tracing::debug!("Shutdown requested, stopping event loop");
                    break;
                }

                maybe_event = events.recv() => {
                    let Some(event) = maybe_event else {
                        tracing::debug!("Event channel closed, stopping event loop");
                        break;
                    };
                    self.observe(&event);
                }

                maybe_error = errors.recv(), if errors_open => match maybe_error {
                    Some(error) => {
                        self.summary.transport_errors += 1;
                        tracing::warn!(error = %error, "Watcher error");
                    }
                    None => errors_open = false,
                },

                () = self.timer.expired() => {
                    self.timer.disarm();
                    if self.dispatch(shutdown).await?.is_break() {
                        break;
                    }
                }
            }
        }

        if self.timer.disarm() {
            tracing::debug!("Discarding pending run");
        }

        Ok(self.summary)
    }

    /// Runs the command once, applying the failure policy.
    async fn dispatch(
        &mut self,
        shutdown: &CancellationToken,
    ) -> Result<ControlFlow<()>, ExecutionError> {
        self.summary.executions += 1;

        let result = tokio::select! {
            biased;

            () = shutdown.cancelled() => {
                tracing::info!(command = %self.command, "Shutdown requested, killing command");
                return Ok(ControlFlow::Break(()));
            }

            result = self.executor.execute(&self.command) => result,
        };

        match result {
            Ok(outcome) => {
                tracing::info!(
                    exit_code = ?outcome.exit_code,
                    elapsed_ms = u64::try_from(outcome.elapsed.as_millis()).unwrap_or(u64::MAX),
                    "Command succeeded"
                );
                Ok(ControlFlow::Continue(()))
            }
            Err(error) => {
                self.summary.failures += 1;
                if self.policy.is_fatal() {
                    tracing::error!(error = %error, "Command failed, stopping watch");
                    Err(error)
                } else {
                    tracing::warn!(error = %error, "Command failed, continuing to watch");
                    Ok(ControlFlow::Continue(()))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::sync::mpsc;
    use tokio::time::{Instant, sleep, sleep_until};
    use wr_watcher::{ChangeKind, KindFilter, TransportError};

    use crate::exec::ExecutionOutcome;

    /// Records when it was called instead of spawning anything.
    #[derive(Debug, Default)]
    struct RecordingExecutor {
        runs: Vec<Instant>,
        fail_with: Option<i32>,
        busy_for: Duration,
    }

    impl CommandExecutor for RecordingExecutor {
        async fn execute(&mut self, command: &str) -> Result<ExecutionOutcome, ExecutionError> {
            self.runs.push(Instant::now());
            sleep(self.busy_for).await;
            match self.fail_with {
                Some(code) => Err(ExecutionError::Failed {
                    command: command.to_owned(),
                    code: Some(code),
                }),
                None => Ok(ExecutionOutcome {
                    exit_code: Some(0),
                    elapsed: self.busy_for,
                }),
            }
        }
    }

    enum Step {
        Event(u64, ChangeKind),
        Error(u64),
    }

    struct Outcome {
        result: Result<DispatchSummary, RunError>,
        run_offsets: Vec<Duration>,
    }

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    /// Feeds `steps` at their offsets (ms), then closes the channels after
    /// `close_at` ms and returns what the dispatcher did.
    async fn drive(
        executor: RecordingExecutor,
        policy: FailurePolicy,
        steps: Vec<Step>,
        close_at: u64,
    ) -> Outcome {
        let start = Instant::now();
        let (event_tx, mut events) = mpsc::unbounded_channel();
        let (error_tx, mut errors) = mpsc::unbounded_channel();
        let shutdown = CancellationToken::new();
        let mut dispatcher = Dispatcher::new("make", executor, policy);

        let producer = async move {
            for step in steps {
                match step {
                    Step::Event(at, kind) => {
                        sleep_until(start + ms(at)).await;
                        let _ = event_tx.send(ChangeEvent::new(kind, "/w/file.txt"));
                    }
                    Step::Error(at) => {
                        sleep_until(start + ms(at)).await;
                        let _ = error_tx
                            .send(TransportError::from(notify::Error::generic("queue overflow")));
                    }
                }
            }
            sleep_until(start + ms(close_at)).await;
            drop(event_tx);
            drop(error_tx);
        };

        let (result, ()) = tokio::join!(
            dispatcher.run(&mut events, &mut errors, &shutdown),
            producer
        );

        let run_offsets = dispatcher
            .executor()
            .runs
            .iter()
            .map(|at| at.duration_since(start))
            .collect();

        Outcome {
            result,
            run_offsets,
        }
    }

    fn assert_runs_at(actual: &[Duration], expected_ms: &[u64]) {
        assert_eq!(
            actual.len(),
            expected_ms.len(),
            "runs at {actual:?}, expected {expected_ms:?} ms"
        );
        for (actual, expected) in actual.iter().zip(expected_ms) {
            let expected = ms(*expected);
            assert!(
                *actual >= expected && *actual < expected + ms(5),
                "run at {actual:?}, expected {expected:?}"
            );
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_runs_once_after_last_event() {
        let steps = vec![
            Step::Event(0, ChangeKind::Write),
            Step::Event(100, ChangeKind::Write),
            Step::Event(200, ChangeKind::Create),
            Step::Event(300, ChangeKind::Rename),
        ];
        let outcome = drive(RecordingExecutor::default(), FailurePolicy::Fatal, steps, 2_000).await;

        assert_runs_at(&outcome.run_offsets, &[800]);
        let summary = outcome.result.expect("loop should end cleanly");
        assert_eq!(summary.events, 4);
        assert_eq!(summary.executions, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_create_then_write_fires_after_later_event() {
        let steps = vec![
            Step::Event(0, ChangeKind::Create),
            Step::Event(100, ChangeKind::Write),
        ];
        let outcome = drive(RecordingExecutor::default(), FailurePolicy::Fatal, steps, 2_000).await;

        assert_runs_at(&outcome.run_offsets, &[600]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_remove_and_other_while_idle_never_run() {
        let steps = vec![
            Step::Event(0, ChangeKind::Remove),
            Step::Event(100, ChangeKind::Other),
        ];
        let outcome = drive(RecordingExecutor::default(), FailurePolicy::Fatal, steps, 2_000).await;

        assert!(outcome.run_offsets.is_empty());
        let summary = outcome.result.expect("loop should end cleanly");
        assert_eq!(summary.ignored, 2);
        assert_eq!(summary.executions, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_remove_while_pending_does_not_cancel_or_restart() {
        let steps = vec![
            Step::Event(0, ChangeKind::Create),
            Step::Event(100, ChangeKind::Remove),
        ];
        let outcome = drive(RecordingExecutor::default(), FailurePolicy::Fatal, steps, 2_000).await;

        assert_runs_at(&outcome.run_offsets, &[500]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_separated_events_run_twice() {
        let steps = vec![
            Step::Event(0, ChangeKind::Write),
            Step::Event(700, ChangeKind::Write),
        ];
        let outcome = drive(RecordingExecutor::default(), FailurePolicy::Fatal, steps, 3_000).await;

        assert_runs_at(&outcome.run_offsets, &[500, 1_200]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_events_during_run_coalesce_into_one_follow_up() {
        let executor = RecordingExecutor {
            busy_for: ms(1_000),
            ..RecordingExecutor::default()
        };
        let steps = vec![
            Step::Event(0, ChangeKind::Write),
            Step::Event(600, ChangeKind::Write),
            Step::Event(700, ChangeKind::Write),
            Step::Event(800, ChangeKind::Write),
        ];
        let outcome = drive(executor, FailurePolicy::Fatal, steps, 5_000).await;

        // First run occupies 500..1500; buffered events arm once it returns.
        assert_runs_at(&outcome.run_offsets, &[500, 2_000]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fatal_failure_stops_loop() {
        let executor = RecordingExecutor {
            fail_with: Some(1),
            ..RecordingExecutor::default()
        };
        let steps = vec![
            Step::Event(0, ChangeKind::Write),
            Step::Event(700, ChangeKind::Write),
        ];
        let outcome = drive(executor, FailurePolicy::Fatal, steps, 3_000).await;

        assert_runs_at(&outcome.run_offsets, &[500]);
        let err = outcome.result.expect_err("fatal policy should stop the loop");
        assert_eq!(err.as_execution().and_then(ExecutionError::exit_code), Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_continue_policy_keeps_watching() {
        let executor = RecordingExecutor {
            fail_with: Some(1),
            ..RecordingExecutor::default()
        };
        let steps = vec![
            Step::Event(0, ChangeKind::Write),
            Step::Event(700, ChangeKind::Write),
        ];
        let outcome = drive(executor, FailurePolicy::Continue, steps, 3_000).await;

        assert_runs_at(&outcome.run_offsets, &[500, 1_200]);
        let summary = outcome.result.expect("continue policy should not fail");
        assert_eq!(summary.failures, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_errors_are_tolerated() {
        let steps = vec![
            Step::Error(0),
            Step::Event(50, ChangeKind::Write),
            Step::Error(100),
        ];
        let outcome = drive(RecordingExecutor::default(), FailurePolicy::Fatal, steps, 2_000).await;

        assert_runs_at(&outcome.run_offsets, &[550]);
        let summary = outcome.result.expect("transport errors are not fatal");
        assert_eq!(summary.transport_errors, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_discards_pending_run() {
        let steps = vec![Step::Event(0, ChangeKind::Write)];
        let outcome = drive(RecordingExecutor::default(), FailurePolicy::Fatal, steps, 100).await;

        assert!(outcome.run_offsets.is_empty());
        assert!(outcome.result.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_kills_running_command() {
        let executor = RecordingExecutor {
            busy_for: ms(60_000),
            ..RecordingExecutor::default()
        };
        let (event_tx, mut events) = mpsc::unbounded_channel();
        let (_error_tx, mut errors) = mpsc::unbounded_channel();
        let shutdown = CancellationToken::new();
        let mut dispatcher = Dispatcher::new("make", executor, FailurePolicy::Fatal);

        event_tx
            .send(ChangeEvent::new(ChangeKind::Write, "a"))
            .expect("receiver alive");

        let start = Instant::now();
        let canceller = async {
            sleep(ms(1_000)).await;
            shutdown.cancel();
        };
        let (result, ()) = tokio::join!(
            dispatcher.run(&mut events, &mut errors, &shutdown),
            canceller
        );

        assert!(result.is_ok());
        assert!(start.elapsed() < ms(2_000));
        assert_eq!(dispatcher.executor().runs.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_observe_transitions() {
        let mut dispatcher =
            Dispatcher::new("make", RecordingExecutor::default(), FailurePolicy::Fatal);
        assert_eq!(dispatcher.state(), DispatchState::Idle);

        assert!(!dispatcher.observe(&ChangeEvent::new(ChangeKind::Remove, "a")));
        assert_eq!(dispatcher.state(), DispatchState::Idle);

        assert!(dispatcher.observe(&ChangeEvent::new(ChangeKind::Create, "a")));
        assert_eq!(dispatcher.state(), DispatchState::Pending);
        let first = dispatcher.timer().deadline();

        sleep(ms(100)).await;
        assert!(!dispatcher.observe(&ChangeEvent::new(ChangeKind::Other, "a")));
        assert_eq!(dispatcher.timer().deadline(), first);

        assert!(dispatcher.observe(&ChangeEvent::new(ChangeKind::Write, "a")));
        assert!(dispatcher.timer().deadline() > first);
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_filter() {
        let mut dispatcher =
            Dispatcher::new("make", RecordingExecutor::default(), FailurePolicy::Fatal)
                .with_filter(KindFilter::new(&[ChangeKind::Remove]));

        assert!(!dispatcher.observe(&ChangeEvent::new(ChangeKind::Write, "a")));
        assert!(dispatcher.observe(&ChangeEvent::new(ChangeKind::Remove, "a")));
        assert_eq!(dispatcher.state(), DispatchState::Pending);
    }
}
