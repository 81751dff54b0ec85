//! Event filtering for the dispatcher.
//!
//! The event source forwards every change it sees; deciding which ones are
//! worth a command run happens in the consumer through an [`EventFilter`].
//! Keeping the decision out of the callback thread lets the consumer count
//! what it ignored.
//!
//! # Examples
//!
//! ```
//! use wr_watcher::{ChangeEvent, ChangeKind, EventFilter, QualifyingFilter};
//!
//! let filter = QualifyingFilter;
//!
//! assert!(filter.accepts(&ChangeEvent::new(ChangeKind::Write, "a.txt")));
//! assert!(!filter.accepts(&ChangeEvent::new(ChangeKind::Remove, "a.txt")));
//! ```

use smallvec::SmallVec;

use crate::events::{ChangeEvent, ChangeKind};

/// A predicate deciding whether a change event should arm the timer.
///
/// Filters must be [`Send`] and `'static` because they move into the
/// spawned event loop task.
pub trait EventFilter: Send + 'static {
    /// Returns `true` if the event should (re)start the debounce countdown.
    fn accepts(&self, event: &ChangeEvent) -> bool;
}

/// The default filter: accepts write, create and rename.
///
/// Remove events never trigger a run, nor do metadata or access changes.
#[derive(Debug, Clone, Copy, Default)]
pub struct QualifyingFilter;

impl EventFilter for QualifyingFilter {
    #[inline]
    fn accepts(&self, event: &ChangeEvent) -> bool {
        event.is_qualifying()
    }
}

/// A filter accepting an explicit set of change kinds.
///
/// # Examples
///
/// ```
/// use wr_watcher::{ChangeEvent, ChangeKind, EventFilter, KindFilter};
///
/// let filter = KindFilter::new(&[ChangeKind::Create]);
/// assert!(filter.accepts(&ChangeEvent::new(ChangeKind::Create, "x")));
/// assert!(!filter.accepts(&ChangeEvent::new(ChangeKind::Write, "x")));
/// ```
#[derive(Debug, Clone)]
pub struct KindFilter {
    kinds: SmallVec<[ChangeKind; 5]>,
}

impl KindFilter {
    /// Creates a filter accepting exactly `kinds`.
    #[must_use]
    pub fn new(kinds: &[ChangeKind]) -> Self {
        let mut filter = Self {
            kinds: SmallVec::new(),
        };
        for kind in kinds {
            filter = filter.with_kind(*kind);
        }
        filter
    }

    /// Creates a filter equivalent to [`QualifyingFilter`].
    #[must_use]
    pub fn qualifying() -> Self {
        Self::new(&[ChangeKind::Write, ChangeKind::Create, ChangeKind::Rename])
    }

    /// Adds a kind to the accepted set.
    #[must_use]
    pub fn with_kind(mut self, kind: ChangeKind) -> Self {
        if !self.kinds.contains(&kind) {
            self.kinds.push(kind);
        }
        self
    }

    /// Returns the accepted kinds.
    #[must_use]
    pub fn kinds(&self) -> &[ChangeKind] {
        &self.kinds
    }
}

impl Default for KindFilter {
    fn default() -> Self {
        Self::qualifying()
    }
}

impl EventFilter for KindFilter {
    fn accepts(&self, event: &ChangeEvent) -> bool {
        self.kinds.contains(&event.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [ChangeKind; 5] = [
        ChangeKind::Write,
        ChangeKind::Create,
        ChangeKind::Rename,
        ChangeKind::Remove,
        ChangeKind::Other,
    ];

    #[test]
    fn test_qualifying_filter() {
        let filter = QualifyingFilter;
        let accepted: Vec<_> = ALL
            .into_iter()
            .filter(|kind| filter.accepts(&ChangeEvent::new(*kind, "f")))
            .collect();
        assert_eq!(
            accepted,
            vec![ChangeKind::Write, ChangeKind::Create, ChangeKind::Rename]
        );
    }

    #[test]
    fn test_kind_filter_matches_qualifying() {
        let kinds = KindFilter::qualifying();
        for kind in ALL {
            let event = ChangeEvent::new(kind, "f");
            assert_eq!(kinds.accepts(&event), QualifyingFilter.accepts(&event));
        }
    }

    #[test]
    fn test_kind_filter_dedups() {
        let filter = KindFilter::new(&[ChangeKind::Remove])
            .with_kind(ChangeKind::Remove)
            .with_kind(ChangeKind::Other);
        assert_eq!(filter.kinds(), &[ChangeKind::Remove, ChangeKind::Other]);
        assert!(filter.accepts(&ChangeEvent::new(ChangeKind::Remove, "f")));
        assert!(!filter.accepts(&ChangeEvent::new(ChangeKind::Write, "f")));
    }

    #[test]
    fn test_empty_kind_filter_rejects_everything() {
        let filter = KindFilter::new(&[]);
        assert!(ALL
            .into_iter()
            .all(|kind| !filter.accepts(&ChangeEvent::new(kind, "f"))));
    }
}
