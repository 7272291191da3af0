//! Configurable in-memory persistable record.

use crate::journal::StorageJournal;
use std::collections::BTreeMap;
use unitwork_core::{PersistableRecord, Schedule};

/// An in-memory record double with scripted storage outcomes.
///
/// Columns are plain string key/value pairs the mapper writes into;
/// every `insert`/`update`/`delete` lands in the shared
/// [`StorageJournal`] under the record's tag. Outcomes default to
/// success (`insert`/`update` report `true`, `delete` reports one
/// affected row) and can be scripted to fail for testing the flush's
/// abort path.
#[derive(Debug, Clone)]
pub struct MemRecord {
    tag: String,
    columns: BTreeMap<String, String>,
    journal: StorageJournal,
    insert_ok: bool,
    update_ok: bool,
    delete_rows: u64,
}

impl MemRecord {
    /// Creates a record wired to the given journal.
    #[must_use]
    pub fn new(journal: &StorageJournal, tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            columns: BTreeMap::new(),
            journal: journal.clone(),
            insert_ok: true,
            update_ok: true,
            delete_rows: 1,
        }
    }

    /// Scripts `insert` to report failure.
    #[must_use]
    pub fn failing_insert(mut self) -> Self {
        self.insert_ok = false;
        self
    }

    /// Scripts `update` to report failure.
    #[must_use]
    pub fn failing_update(mut self) -> Self {
        self.update_ok = false;
        self
    }

    /// Scripts `delete` to report the given affected-row count.
    #[must_use]
    pub fn with_delete_rows(mut self, rows: u64) -> Self {
        self.delete_rows = rows;
        self
    }

    /// Returns the record's tag.
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Writes a column value.
    pub fn set(&mut self, column: impl Into<String>, value: impl Into<String>) {
        self.columns.insert(column.into(), value.into());
    }

    /// Reads a column value.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&str> {
        self.columns.get(column).map(String::as_str)
    }
}

impl PersistableRecord for MemRecord {
    fn insert(&mut self) -> bool {
        self.journal.record(Schedule::Insert, self.tag.clone());
        self.insert_ok
    }

    fn update(&mut self) -> bool {
        self.journal.record(Schedule::Update, self.tag.clone());
        self.update_ok
    }

    fn delete(&mut self) -> u64 {
        self.journal.record(Schedule::Delete, self.tag.clone());
        self.delete_rows
    }
}
