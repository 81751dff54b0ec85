//! Event types for filesystem change notifications.
//!
//! `notify` reports rich, platform-specific [`notify::EventKind`]s. The rest
//! of wrun only cares about five operation kinds, so every raw event is
//! collapsed into a [`ChangeKind`] and split into one [`ChangeEvent`] per
//! affected path.
//!
//! # Event Flow
//!
//! ```text
//! notify::Event { kind, paths: [a, b] }
//!        │
//!        ▼
//!   ChangeKind::from(kind)
//!        │
//!        ▼
//!   ChangeEvent(kind, a), ChangeEvent(kind, b)
//! ```

use std::fmt;

use camino::Utf8PathBuf;
use notify::event::{EventKind, ModifyKind};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// The operation behind a filesystem change.
///
/// # Examples
///
/// ```
/// use wr_watcher::ChangeKind;
///
/// assert!(ChangeKind::Write.is_qualifying());
/// assert!(!ChangeKind::Remove.is_qualifying());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// File contents were written.
    Write,
    /// A file or directory was created.
    Create,
    /// A file or directory was renamed or moved.
    Rename,
    /// A file or directory was removed.
    Remove,
    /// Anything else (access, metadata, backend-specific).
    Other,
}

impl ChangeKind {
    /// Returns `true` for write, create and rename.
    ///
    /// Only these kinds arm the debounce timer.
    #[inline]
    #[must_use]
    pub const fn is_qualifying(self) -> bool {
        matches!(self, Self::Write | Self::Create | Self::Rename)
    }

    /// Returns a short lowercase label for logging.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Write => "write",
            Self::Create => "create",
            Self::Rename => "rename",
            Self::Remove => "remove",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<EventKind> for ChangeKind {
    fn from(kind: EventKind) -> Self {
        match kind {
            EventKind::Create(_) => Self::Create,
            // Backends that cannot tell what changed (kqueue, Windows) emit `Any`.
            EventKind::Modify(ModifyKind::Data(_) | ModifyKind::Any) => Self::Write,
            EventKind::Modify(ModifyKind::Name(_)) => Self::Rename,
            EventKind::Remove(_) => Self::Remove,
            EventKind::Modify(ModifyKind::Metadata(_) | ModifyKind::Other)
            | EventKind::Access(_)
            | EventKind::Any
            | EventKind::Other => Self::Other,
        }
    }
}

/// A single (operation, path) change produced by the event source.
///
/// Transient: consumed by the dispatcher as soon as it is received.
///
/// # Examples
///
/// ```
/// use wr_watcher::{ChangeEvent, ChangeKind};
///
/// let event = ChangeEvent::new(ChangeKind::Create, "src/main.rs");
/// assert_eq!(event.path.as_str(), "src/main.rs");
/// assert!(event.is_qualifying());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    /// What happened.
    pub kind: ChangeKind,

    /// Where it happened.
    ///
    /// Empty when the backend did not attach a path.
    pub path: Utf8PathBuf,
}

impl ChangeEvent {
    /// Creates a new change event.
    #[inline]
    #[must_use]
    pub fn new(kind: ChangeKind, path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            kind,
            path: path.into(),
        }
    }

    /// Returns `true` if this event should arm the debounce timer.
    #[inline]
    #[must_use]
    pub const fn is_qualifying(&self) -> bool {
        self.kind.is_qualifying()
    }

    /// Splits a raw notify event into one change event per path.
    ///
    /// Non-UTF-8 paths are converted lossily rather than dropped, so a
    /// qualifying change is never lost because of its file name. An event
    /// with no paths still yields one change with an empty path.
    #[must_use]
    pub fn from_notify(event: notify::Event) -> SmallVec<[Self; 2]> {
        let kind = ChangeKind::from(event.kind);

        if event.paths.is_empty() {
            return smallvec::smallvec![Self::new(kind, Utf8PathBuf::new())];
        }

        event
            .paths
            .into_iter()
            .map(|path| {
                let path = Utf8PathBuf::from_path_buf(path).unwrap_or_else(|raw| {
                    tracing::debug!(path = %raw.display(), "Converting non-UTF-8 path lossily");
                    Utf8PathBuf::from(raw.to_string_lossy().into_owned())
                });
                Self::new(kind, path)
            })
            .collect()
    }
}

impl fmt::Display for ChangeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.path)
    }
}
