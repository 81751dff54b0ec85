//! Filesystem event source for wrun.
//!
//! This crate wraps the `notify` crate's recommended OS watcher for a single
//! registered path and bridges its callback thread into two tokio channels:
//! one for change events and one for transport errors.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │              notify backend thread (inotify, ...)        │
//! │  ┌──────────────────┐      ┌──────────────────────────┐  │
//! │  │ RecommendedWatcher│ ───► │ callback: EventKind ->   │  │
//! │  │ (NonRecursive)   │      │ ChangeKind, one per path │  │
//! │  └──────────────────┘      └───────┬──────────┬───────┘  │
//! └────────────────────────────────────│──────────│──────────┘
//!                            events    │          │ errors
//!                                      ▼          ▼
//! ┌──────────────────────────────────────────────────────────┐
//! │                  Async Runtime (tokio)                   │
//! │   UnboundedReceiver<ChangeEvent>  UnboundedReceiver<     │
//! │                                     TransportError>      │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! # Scope
//!
//! Registration is non-recursive. Whether changes inside subdirectories of a
//! watched directory are reported depends on the platform backend: inotify
//! only reports direct children, while FSEvents and `ReadDirectoryChangesW`
//! may report more. The crate does not paper over that difference.
//!
//! # Usage
//!
//! ```no_run
//! use wr_watcher::{EventFilter, EventSource, QualifyingFilter};
//! use camino::Utf8Path;
//!
//! # async fn example() -> Result<(), wr_watcher::WatchError> {
//! let mut source = EventSource::register(Utf8Path::new("./src"))?;
//! let filter = QualifyingFilter;
//!
//! while let Some(event) = source.events().recv().await {
//!     if filter.accepts(&event) {
//!         println!("{} {}", event.kind, event.path);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod error;
pub mod events;
pub mod filter;
pub mod watcher;

// Re-export error types
pub use error::{TransportError, WatchError};

// Re-export event types
pub use events::{ChangeEvent, ChangeKind};

// Re-export filter types
pub use filter::{EventFilter, KindFilter, QualifyingFilter};

// Re-export watcher types
pub use watcher::{ErrorReceiver, EventReceiver, EventSource};
