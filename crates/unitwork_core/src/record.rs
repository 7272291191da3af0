//! Persistable record contract.

/// A storage-layer record the flush can drive.
///
/// Records are produced by an
/// [`EntityMapper`](crate::mapper::EntityMapper) and held in the ledger
/// until [`UnitOfWork::commit`](crate::UnitOfWork::commit) invokes one
/// of the three operations below. The return values are raw driver
/// signals; the unit of work converts anything unexpected into a
/// [`PersistenceFailure`](crate::WorkError::PersistenceFailure).
pub trait PersistableRecord {
    /// Inserts the record as a new row. Returns `true` on success.
    fn insert(&mut self) -> bool;

    /// Writes the record's current field values to its existing row.
    /// Returns `true` on success.
    fn update(&mut self) -> bool;

    /// Deletes the record's row, returning the affected-row count.
    /// A successful single-row delete reports exactly 1.
    fn delete(&mut self) -> u64;
}
