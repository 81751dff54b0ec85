//! Restart-on-activity delay timer.
//!
//! [`DelayTimer`] is the single pending timer of a watch session. It is a
//! plain deadline owned by the event loop: arming it replaces whatever was
//! pending, so at most one countdown exists at any time and no lock is
//! involved. The loop waits on [`DelayTimer::expired`] next to its channels.
//!
//! # Examples
//!
//! ```
//! use std::time::Duration;
//! use wr_runner::DelayTimer;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let mut timer = DelayTimer::new(Duration::from_millis(10));
//! assert!(!timer.is_pending());
//!
//! timer.arm();
//! timer.expired().await;
//! timer.disarm();
//! # }
//! ```

use std::time::Duration;

use tokio::time::{Instant, sleep_until};

/// A single-shot, restartable deadline.
#[derive(Debug, Clone)]
pub struct DelayTimer {
    /// Quiet period between the last arm and expiry.
    interval: Duration,

    /// When the pending countdown ends. `None` while idle.
    deadline: Option<Instant>,
}

impl DelayTimer {
    /// Creates an idle timer with the given interval.
    #[must_use]
    pub const fn new(interval: Duration) -> Self {
        Self {
            interval,
            deadline: None,
        }
    }

    /// Starts a fresh countdown from now.
    ///
    /// Returns `true` if a pending countdown was replaced.
    pub fn arm(&mut self) -> bool {
        self.deadline.replace(Instant::now() + self.interval).is_some()
    }

    /// Cancels the pending countdown.
    ///
    /// Returns `true` if one was pending.
    pub fn disarm(&mut self) -> bool {
        self.deadline.take().is_some()
    }

    /// Returns `true` while a countdown is pending.
    #[inline]
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Returns the pending deadline, if any.
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns the configured interval.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Completes when the pending countdown reaches its deadline.
    ///
    /// Never completes while idle. Does not disarm the timer; the caller
    /// does that when it acts on the expiry.
    pub async fn expired(&self) {
        match self.deadline {
            Some(deadline) => sleep_until(deadline).await,
            None => std::future::pending().await,
        }
    }
}
