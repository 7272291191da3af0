//! Nesting-aware commit/rollback gate around the unit of work.

use crate::entity::Tracked;
use crate::error::{WorkError, WorkResult};
use crate::mapper::EntityMapper;
use crate::record::PersistableRecord;
use crate::transaction::{TransactionHandle, TransactionProvider};
use crate::unit_of_work::UnitOfWork;
use std::fmt;
use tracing::debug;

/// Owns a unit of work and gates its flush on the transaction lifecycle.
///
/// The boundary wraps one logical transaction. Nested `begin` calls
/// collapse into the same physical transaction via the provider; the
/// ledger flushes exactly once, at the outermost commit, *before* the
/// physical commit is issued — so a flush failure propagates to the
/// caller with the physical transaction still open for rollback. On any
/// rollback the ledger is discarded without flushing, once the physical
/// transaction reports fully inactive.
///
/// Scheduling calls are re-exposed by delegation so application code
/// holds a single façade:
///
/// ```rust,ignore
/// let mut boundary = TransactionBoundary::new(connection);
/// boundary.begin()?;
/// let entity = Tracked::new(User::new("ada"));
/// boundary.persist(&entity, &mapper)?;
/// boundary.commit()?;
/// ```
pub struct TransactionBoundary<P: TransactionProvider, R> {
    provider: P,
    unit: UnitOfWork<R>,
    handle: Option<P::Handle>,
}

impl<P: TransactionProvider, R> TransactionBoundary<P, R> {
    /// Creates a boundary around a transaction provider with an empty
    /// unit of work.
    #[must_use]
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            unit: UnitOfWork::new(),
            handle: None,
        }
    }

    /// Starts or joins the physical transaction.
    ///
    /// # Errors
    ///
    /// Propagates [`WorkError::Backend`] from the provider.
    pub fn begin(&mut self) -> WorkResult<()> {
        let handle = self.provider.begin()?;
        debug!(level = handle.level(), "transaction begun");
        self.handle = Some(handle);
        Ok(())
    }

    /// Commits one nesting level.
    ///
    /// At nesting level 1 (the outermost commit) the ledger is flushed
    /// first; only if the flush succeeds is the physical commit issued.
    /// Afterwards the ledger is cleared if the physical transaction has
    /// fully ended.
    ///
    /// # Errors
    ///
    /// Returns [`WorkError::NoActiveTransaction`] if no transaction was
    /// begun, any [`WorkError::PersistenceFailure`] from the flush, or
    /// [`WorkError::Backend`] from the driver. After a flush failure the
    /// physical transaction is still open; the caller is expected to
    /// [`roll_back`](Self::roll_back).
    pub fn commit(&mut self) -> WorkResult<()>
    where
        R: PersistableRecord,
    {
        let handle = self.handle.as_mut().ok_or(WorkError::NoActiveTransaction)?;
        if handle.level() == 1 {
            debug!(pending = self.unit.pending_count(), "outermost commit, flushing ledger");
            self.unit.commit()?;
        }
        handle.commit()?;
        self.clear();
        Ok(())
    }

    /// Rolls back one nesting level, discarding the ledger without
    /// flushing once the physical transaction is fully inactive.
    ///
    /// # Errors
    ///
    /// Returns [`WorkError::NoActiveTransaction`] if no transaction was
    /// begun, or [`WorkError::Backend`] from the driver.
    pub fn roll_back(&mut self) -> WorkResult<()> {
        let handle = self.handle.as_mut().ok_or(WorkError::NoActiveTransaction)?;
        handle.roll_back()?;
        debug!("transaction rolled back");
        self.clear();
        Ok(())
    }

    /// Clears the ledger if the physical transaction is confirmed
    /// inactive. Safe to call redundantly; a no-op while any nesting
    /// level remains open.
    pub fn clear(&mut self) {
        let inactive = self.handle.as_ref().map_or(true, |h| !h.is_active());
        if inactive {
            self.unit.clear();
        }
    }

    /// Whether the physical transaction is currently open.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.handle.as_ref().is_some_and(TransactionHandle::is_active)
    }

    /// Read-only access to the owned unit of work.
    #[must_use]
    pub fn unit_of_work(&self) -> &UnitOfWork<R> {
        &self.unit
    }

    /// Schedules a never-persisted entity for insertion.
    ///
    /// Delegates to [`UnitOfWork::persist`].
    ///
    /// # Errors
    ///
    /// See [`UnitOfWork::persist`].
    pub fn persist<E, M>(&mut self, entity: &Tracked<E>, mapper: &M) -> WorkResult<()>
    where
        M: EntityMapper<E, R> + ?Sized,
    {
        self.unit.persist(entity, mapper)
    }

    /// Re-applies an entity's fields onto its tracked record.
    ///
    /// Delegates to [`UnitOfWork::schedule_for_update`].
    ///
    /// # Errors
    ///
    /// See [`UnitOfWork::schedule_for_update`].
    pub fn schedule_for_update<E, M>(&mut self, entity: &Tracked<E>, mapper: &M) -> WorkResult<()>
    where
        M: EntityMapper<E, R> + ?Sized,
    {
        self.unit.schedule_for_update(entity, mapper)
    }

    /// Schedules a tracked entity for deletion.
    ///
    /// Delegates to [`UnitOfWork::schedule_for_delete`].
    ///
    /// # Errors
    ///
    /// See [`UnitOfWork::schedule_for_delete`].
    pub fn schedule_for_delete<E>(&mut self, entity: &Tracked<E>) -> WorkResult<()> {
        self.unit.schedule_for_delete(entity)
    }

    /// Hydrates an entity from a stored record and tracks it for update.
    ///
    /// Delegates to [`UnitOfWork::get_for_update`].
    pub fn get_for_update<E, M>(&mut self, record: R, mapper: &M) -> Tracked<E>
    where
        M: EntityMapper<E, R> + ?Sized,
    {
        self.unit.get_for_update(record, mapper)
    }
}

impl<P: TransactionProvider, R> fmt::Debug for TransactionBoundary<P, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransactionBoundary")
            .field("active", &self.is_active())
            .field("pending", &self.unit.pending_count())
            .finish_non_exhaustive()
    }
}
