//! Sample domain entity and mapper.

use crate::journal::StorageJournal;
use crate::record::MemRecord;
use unitwork_core::EntityMapper;

/// A small sample domain entity for exercising the unit of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Widget {
    /// Display name; doubles as the record tag.
    pub name: String,
    /// Stock quantity.
    pub quantity: u32,
}

impl Widget {
    /// Creates a widget.
    #[must_use]
    pub fn new(name: impl Into<String>, quantity: u32) -> Self {
        Self {
            name: name.into(),
            quantity,
        }
    }
}

/// Maps [`Widget`] entities onto [`MemRecord`]s.
///
/// New records are wired to the mapper's journal and tagged with the
/// widget's name at creation time, so a record's journal entries stay
/// attributable even after later renames.
#[derive(Debug, Clone)]
pub struct WidgetMapper {
    journal: StorageJournal,
}

impl WidgetMapper {
    /// Creates a mapper producing records wired to the given journal.
    #[must_use]
    pub fn new(journal: &StorageJournal) -> Self {
        Self {
            journal: journal.clone(),
        }
    }

    /// Builds a record as it would come back from storage, for feeding
    /// into `get_for_update`.
    #[must_use]
    pub fn stored(&self, name: &str, quantity: u32) -> MemRecord {
        let mut record = MemRecord::new(&self.journal, name);
        record.set("name", name);
        record.set("quantity", quantity.to_string());
        record
    }
}

impl EntityMapper<Widget, MemRecord> for WidgetMapper {
    fn create(&self, entity: &Widget) -> MemRecord {
        let mut record = MemRecord::new(&self.journal, entity.name.clone());
        self.update(entity, &mut record);
        record
    }

    fn update(&self, entity: &Widget, record: &mut MemRecord) {
        record.set("name", entity.name.clone());
        record.set("quantity", entity.quantity.to_string());
    }

    fn hydrate(&self, record: &MemRecord) -> Widget {
        Widget {
            name: record.get("name").unwrap_or_default().to_string(),
            quantity: record
                .get("quantity")
                .and_then(|q| q.parse().ok())
                .unwrap_or_default(),
        }
    }
}
