//! The filesystem event source.
//!
//! [`EventSource`] owns the OS watcher for one registered path and exposes
//! two ordered, unbounded receivers: change events and transport errors.
//!
//! # Lifecycle
//!
//! 1. **Registration**: [`EventSource::register`] checks the path exists,
//!    creates the `notify` watcher and registers the path non-recursively.
//! 2. **Reception**: [`EventSource::events`] and [`EventSource::errors`]
//!    (or [`EventSource::channels`] for both at once inside `select!`).
//! 3. **Close**: [`EventSource::close`] or dropping the source releases the
//!    OS watcher. Once the backend thread exits, both channels report
//!    closed after their buffered items are drained. A closed source cannot
//!    be reopened.
//!
//! # Usage
//!
//! ```no_run
//! use wr_watcher::EventSource;
//! use camino::Utf8Path;
//!
//! # async fn example() -> Result<(), wr_watcher::WatchError> {
//! let mut source = EventSource::register(Utf8Path::new("."))?;
//! let (events, errors) = source.channels();
//!
//! loop {
//!     tokio::select! {
//!         Some(event) = events.recv() => println!("{event}"),
//!         Some(error) = errors.recv() => eprintln!("{error}"),
//!         else => break,
//!     }
//! }
//! # Ok(())
//! # }
//! ```

use camino::{Utf8Path, Utf8PathBuf};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::error::{TransportError, WatchError};
use crate::events::ChangeEvent;

/// Receiving half of the change event channel.
pub type EventReceiver = mpsc::UnboundedReceiver<ChangeEvent>;

/// Receiving half of the transport error channel.
pub type ErrorReceiver = mpsc::UnboundedReceiver<TransportError>;

/// A registered filesystem watch delivering events to async code.
///
/// The `notify` backend runs its own thread; its callback converts raw
/// events into [`ChangeEvent`]s and pushes them into unbounded channels, so
/// a slow consumer (for instance one blocked on a running command) never
/// loses events, it only sees them later.
pub struct EventSource {
    /// The OS watcher. `None` once closed.
    watcher: Option<RecommendedWatcher>,

    /// Change events in arrival order.
    event_rx: EventReceiver,

    /// Transport faults in arrival order.
    error_rx: ErrorReceiver,

    /// The canonical path being watched.
    watch_path: Utf8PathBuf,
}

impl std::fmt::Debug for EventSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSource")
            .field("watch_path", &self.watch_path)
            .field("is_open", &self.is_open())
            .finish_non_exhaustive()
    }
}

impl EventSource {
    /// Registers `path` with the OS notification mechanism.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::PathNotFound`] if the path doesn't exist,
    /// [`WatchError::Notify`] if the OS watcher cannot be created and
    /// [`WatchError::Register`] if the path cannot be watched.
    pub fn register(path: &Utf8Path) -> Result<Self, WatchError> {
        if !path.exists() {
            return Err(WatchError::path_not_found(path));
        }

        let watch_path = path.canonicalize_utf8()?;

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (error_tx, error_rx) = mpsc::unbounded_channel();

        let mut watcher = notify::recommended_watcher(
            move |res: notify::Result<notify::Event>| match res {
                Ok(event) => {
                    for change in ChangeEvent::from_notify(event) {
                        tracing::trace!(kind = %change.kind, path = %change.path, "Change event");
                        if event_tx.send(change).is_err() {
                            tracing::debug!("Event channel closed, dropping change");
                            break;
                        }
                    }
                }
                Err(error) => {
                    if error_tx.send(TransportError::from(error)).is_err() {
                        tracing::debug!("Error channel closed, dropping transport error");
                    }
                }
            },
        )?;

        watcher
            .watch(watch_path.as_std_path(), RecursiveMode::NonRecursive)
            .map_err(|source| WatchError::Register {
                path: watch_path.clone(),
                source,
            })?;

        tracing::info!(path = %watch_path, recursive = false, "File watcher started");

        Ok(Self {
            watcher: Some(watcher),
            event_rx,
            error_rx,
            watch_path,
        })
    }

    /// Returns the change event receiver.
    ///
    /// Yields `None` once the source is closed and drained.
    pub fn events(&mut self) -> &mut EventReceiver {
        &mut self.event_rx
    }

    /// Returns the transport error receiver.
    pub fn errors(&mut self) -> &mut ErrorReceiver {
        &mut self.error_rx
    }

    /// Returns both receivers for use in a single `tokio::select!`.
    pub fn channels(&mut self) -> (&mut EventReceiver, &mut ErrorReceiver) {
        (&mut self.event_rx, &mut self.error_rx)
    }

    /// Returns the canonical path being watched.
    #[must_use]
    pub fn watch_path(&self) -> &Utf8Path {
        &self.watch_path
    }

    /// Returns `true` until [`close`](Self::close) is called.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.watcher.is_some()
    }

    /// Releases the OS watcher. Calling it again does nothing.
    pub fn close(&mut self) {
        if let Some(watcher) = self.watcher.take() {
            drop(watcher);
            tracing::info!(path = %self.watch_path, "File watcher stopped");
        }
    }
}

impl Drop for EventSource {
    fn drop(&mut self) {
        self.close();
    }
}
