//! Error types for the wr-watcher crate.
//!
//! Two kinds of failure come out of the event source:
//!
//! - [`WatchError`] is returned by [`EventSource::register`] and ends startup.
//! - [`TransportError`] arrives on the error channel while watching. The
//!   watch keeps running after it.
//!
//! [`EventSource::register`]: crate::EventSource::register

use camino::Utf8PathBuf;

/// Errors that prevent a path from being watched.
///
/// # Error Recovery Strategy
///
/// All variants are fatal at startup: no partial watch is left behind.
///
/// # Examples
///
/// ```
/// use wr_watcher::WatchError;
///
/// let err = WatchError::path_not_found("/nope");
/// assert!(err.is_fatal());
/// assert_eq!(err.path().map(|p| p.as_str()), Some("/nope"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    /// The specified path does not exist.
    #[error("path does not exist: {0}")]
    PathNotFound(Utf8PathBuf),

    /// The OS watcher could not be created.
    #[error("failed to create filesystem watcher: {0}")]
    Notify(#[from] notify::Error),

    /// The OS watcher rejected the path (permissions, limits, ...).
    #[error("failed to watch {path}: {source}")]
    Register {
        /// The path that could not be registered.
        path: Utf8PathBuf,
        /// The underlying notify error.
        #[source]
        source: notify::Error,
    },

    /// An I/O error occurred while resolving the path.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl WatchError {
    /// Creates a new [`WatchError::PathNotFound`] error.
    #[inline]
    pub fn path_not_found(path: impl Into<Utf8PathBuf>) -> Self {
        Self::PathNotFound(path.into())
    }

    /// Returns `true` if this error is fatal.
    ///
    /// Registration errors always are; the method exists so callers can
    /// treat [`WatchError`] and [`TransportError`] uniformly.
    #[inline]
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        true
    }

    /// Returns the path associated with this error, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Utf8PathBuf> {
        match self {
            Self::PathNotFound(path) | Self::Register { path, .. } => Some(path),
            Self::Notify(_) | Self::Io(_) => None,
        }
    }
}

/// A fault reported by the notification layer while watching.
///
/// Typical causes are a kernel event queue overflow or a backend read
/// failure. These are logged and the watch continues.
#[derive(Debug, thiserror::Error)]
#[error("filesystem notification error: {0}")]
pub struct TransportError(#[from] pub notify::Error);

impl TransportError {
    /// Returns `true` if this error is recoverable (watching continues).
    #[inline]
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        true
    }

    /// Returns the paths the backend attached to the error.
    #[must_use]
    pub fn paths(&self) -> &[std::path::PathBuf] {
        &self.0.paths
    }
}
