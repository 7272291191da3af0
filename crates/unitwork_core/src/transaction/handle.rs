//! Reentrant transaction primitive contract.

use crate::error::WorkResult;

/// A handle onto the one physical transaction of a connection.
///
/// The primitive is reentrant: nested `begin` calls collapse into the
/// same physical transaction and bump a nesting counter. `level` reports
/// that counter (1 = outermost), and `commit`/`roll_back` decrement it,
/// only ending the physical transaction on the transition to zero.
pub trait TransactionHandle {
    /// Current nesting level. The outermost transaction is level 1.
    fn level(&self) -> u32;

    /// Whether the physical transaction is still open.
    fn is_active(&self) -> bool;

    /// Commits one nesting level, issuing the physical commit when the
    /// level reaches zero.
    ///
    /// # Errors
    ///
    /// Returns [`WorkError::Backend`](crate::WorkError::Backend) if the
    /// underlying driver fails.
    fn commit(&mut self) -> WorkResult<()>;

    /// Rolls back one nesting level, issuing the physical rollback when
    /// the level reaches zero.
    ///
    /// # Errors
    ///
    /// Returns [`WorkError::Backend`](crate::WorkError::Backend) if the
    /// underlying driver fails.
    fn roll_back(&mut self) -> WorkResult<()>;
}

/// Source of transaction handles, typically a database connection.
///
/// Calling `begin` while a transaction is already open joins it (the
/// returned handle sees an incremented nesting level) rather than
/// opening a second physical transaction.
pub trait TransactionProvider {
    /// Handle type for the provider's transactions.
    type Handle: TransactionHandle;

    /// Starts or joins the physical transaction.
    ///
    /// # Errors
    ///
    /// Returns [`WorkError::Backend`](crate::WorkError::Backend) if the
    /// underlying driver fails to open a transaction.
    fn begin(&mut self) -> WorkResult<Self::Handle>;
}
