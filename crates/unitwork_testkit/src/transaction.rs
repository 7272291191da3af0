//! Nesting-aware in-memory transaction primitive.

use parking_lot::Mutex;
use std::sync::Arc;
use unitwork_core::{TransactionHandle, TransactionProvider, WorkError, WorkResult};

#[derive(Debug, Default)]
struct ConnState {
    level: u32,
    active: bool,
    commits: u32,
    rollbacks: u32,
    fail_next_commit: bool,
}

/// An in-memory connection whose transactions collapse nested begins
/// into one physical transaction with a level counter.
///
/// `begin` at rest opens the physical transaction at level 1; while one
/// is open, further begins just increment the level. `commit` and
/// `roll_back` decrement it, ending the physical transaction on the
/// transition to zero. Counters expose how many physical commits and
/// rollbacks actually happened.
#[derive(Debug, Clone, Default)]
pub struct MemConnection {
    state: Arc<Mutex<ConnState>>,
}

impl MemConnection {
    /// Creates a connection with no open transaction.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current nesting level (0 = no transaction).
    #[must_use]
    pub fn level(&self) -> u32 {
        self.state.lock().level
    }

    /// Whether a physical transaction is open.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state.lock().active
    }

    /// Number of physical commits issued.
    #[must_use]
    pub fn commits(&self) -> u32 {
        self.state.lock().commits
    }

    /// Number of physical rollbacks issued.
    #[must_use]
    pub fn rollbacks(&self) -> u32 {
        self.state.lock().rollbacks
    }

    /// Scripts the next physical commit to fail with a backend error.
    pub fn fail_next_commit(&self) {
        self.state.lock().fail_next_commit = true;
    }
}

impl TransactionProvider for MemConnection {
    type Handle = MemTransaction;

    fn begin(&mut self) -> WorkResult<Self::Handle> {
        let mut state = self.state.lock();
        if state.active {
            state.level += 1;
        } else {
            state.active = true;
            state.level = 1;
        }
        Ok(MemTransaction {
            state: Arc::clone(&self.state),
        })
    }
}

/// Handle onto a [`MemConnection`]'s physical transaction.
#[derive(Debug)]
pub struct MemTransaction {
    state: Arc<Mutex<ConnState>>,
}

impl TransactionHandle for MemTransaction {
    fn level(&self) -> u32 {
        self.state.lock().level
    }

    fn is_active(&self) -> bool {
        self.state.lock().active
    }

    fn commit(&mut self) -> WorkResult<()> {
        let mut state = self.state.lock();
        if !state.active {
            return Err(WorkError::backend("commit with no open transaction"));
        }
        if state.level == 1 && state.fail_next_commit {
            state.fail_next_commit = false;
            return Err(WorkError::backend("scripted commit failure"));
        }
        state.level -= 1;
        if state.level == 0 {
            state.active = false;
            state.commits += 1;
        }
        Ok(())
    }

    fn roll_back(&mut self) -> WorkResult<()> {
        let mut state = self.state.lock();
        if !state.active {
            return Err(WorkError::backend("rollback with no open transaction"));
        }
        state.level -= 1;
        if state.level == 0 {
            state.active = false;
            state.rollbacks += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn begin_opens_at_level_one() {
        let mut conn = MemConnection::new();
        let handle = conn.begin().unwrap();

        assert_eq!(handle.level(), 1);
        assert!(handle.is_active());
    }

    #[test]
    fn nested_begins_share_one_physical_transaction() {
        let mut conn = MemConnection::new();
        let _outer = conn.begin().unwrap();
        let mut inner = conn.begin().unwrap();

        assert_eq!(inner.level(), 2);

        inner.commit().unwrap();
        assert_eq!(conn.level(), 1);
        assert!(conn.is_active());
        assert_eq!(conn.commits(), 0);

        inner.commit().unwrap();
        assert!(!conn.is_active());
        assert_eq!(conn.commits(), 1);
    }

    #[test]
    fn rollback_ends_transaction_at_level_zero() {
        let mut conn = MemConnection::new();
        let mut handle = conn.begin().unwrap();

        handle.roll_back().unwrap();

        assert!(!conn.is_active());
        assert_eq!(conn.rollbacks(), 1);
    }

    #[test]
    fn commit_without_transaction_is_backend_error() {
        let mut conn = MemConnection::new();
        let mut handle = conn.begin().unwrap();
        handle.commit().unwrap();

        let err = handle.commit().unwrap_err();
        assert!(matches!(err, WorkError::Backend { .. }));
    }

    #[test]
    fn scripted_commit_failure() {
        let mut conn = MemConnection::new();
        conn.fail_next_commit();
        let mut handle = conn.begin().unwrap();

        let err = handle.commit().unwrap_err();
        assert!(matches!(err, WorkError::Backend { .. }));
        // The transaction stays open for a rollback.
        assert!(conn.is_active());
    }
}
