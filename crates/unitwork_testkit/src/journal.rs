//! Shared recorder for storage calls.

use parking_lot::Mutex;
use std::sync::Arc;
use unitwork_core::Schedule;

/// One storage call observed during a flush.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageCall {
    /// Which operation was invoked on the record.
    pub operation: Schedule,
    /// The record's tag (see [`MemRecord`](crate::MemRecord)).
    pub tag: String,
}

/// Records every storage call made by a flush, in order.
///
/// The journal is shared by cloning: hand one to every record (via the
/// mapper) and keep a clone in the test. Ledger `clear` drops the
/// records, but the journal outlives them, so assertions about call
/// counts and ordering remain possible after a commit.
#[derive(Debug, Clone, Default)]
pub struct StorageJournal {
    calls: Arc<Mutex<Vec<StorageCall>>>,
}

impl StorageJournal {
    /// Creates an empty journal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a call to the journal.
    pub fn record(&self, operation: Schedule, tag: impl Into<String>) {
        self.calls.lock().push(StorageCall {
            operation,
            tag: tag.into(),
        });
    }

    /// Returns all recorded calls in order.
    #[must_use]
    pub fn calls(&self) -> Vec<StorageCall> {
        self.calls.lock().clone()
    }

    /// Returns the operations in call order, without tags.
    #[must_use]
    pub fn operations(&self) -> Vec<Schedule> {
        self.calls.lock().iter().map(|c| c.operation).collect()
    }

    /// Returns how many calls of the given operation were recorded.
    #[must_use]
    pub fn count_of(&self, operation: Schedule) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|c| c.operation == operation)
            .count()
    }

    /// Returns the total number of recorded calls.
    #[must_use]
    pub fn len(&self) -> usize {
        self.calls.lock().len()
    }

    /// Checks whether no calls were recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.calls.lock().is_empty()
    }
}
