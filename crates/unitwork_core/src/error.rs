//! Error types for the unit-of-work core.

use crate::entity::EntityKey;
use crate::unit_of_work::Schedule;
use thiserror::Error;

/// Result type for unit-of-work operations.
pub type WorkResult<T> = Result<T, WorkError>;

/// Errors that can occur while scheduling or flushing work.
///
/// Every precondition violation is a hard failure. Double-scheduling and
/// stale entity handles indicate application-level logic errors, so none
/// of these are recovered from silently.
#[derive(Debug, Error)]
pub enum WorkError {
    /// An entity was persisted while already tracked in some bucket.
    #[error("entity {key} is already scheduled")]
    AlreadyScheduled {
        /// Identity of the offending entity.
        key: EntityKey,
    },

    /// An update was scheduled for an entity that is not tracked for
    /// insertion or update (including one already marked for deletion).
    #[error("entity {key} is not tracked for update")]
    NotTracked {
        /// Identity of the offending entity.
        key: EntityKey,
    },

    /// A deletion was scheduled for an entity that is not tracked.
    #[error("entity {key} is not scheduled")]
    NotScheduled {
        /// Identity of the offending entity.
        key: EntityKey,
    },

    /// A storage operation did not report the expected success signal
    /// during flush. The ledger is left un-cleared; the caller is
    /// expected to roll the transaction back.
    #[error("storage {operation} failed for entity {key}")]
    PersistenceFailure {
        /// Which bucket's operation failed.
        operation: Schedule,
        /// Identity of the entity whose record failed.
        key: EntityKey,
    },

    /// Commit or rollback was requested with no transaction begun.
    #[error("no active transaction")]
    NoActiveTransaction,

    /// The underlying connection or transaction primitive failed.
    #[error("backend error: {message}")]
    Backend {
        /// Description of the driver-level failure.
        message: String,
    },
}

impl WorkError {
    /// Creates an already-scheduled error.
    pub fn already_scheduled(key: EntityKey) -> Self {
        Self::AlreadyScheduled { key }
    }

    /// Creates a not-tracked error.
    pub fn not_tracked(key: EntityKey) -> Self {
        Self::NotTracked { key }
    }

    /// Creates a not-scheduled error.
    pub fn not_scheduled(key: EntityKey) -> Self {
        Self::NotScheduled { key }
    }

    /// Creates a persistence-failure error.
    pub fn persistence_failure(operation: Schedule, key: EntityKey) -> Self {
        Self::PersistenceFailure { operation, key }
    }

    /// Creates a backend error.
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }
}
