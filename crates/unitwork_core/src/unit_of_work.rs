//! Pending-operation ledger and flush state machine.

use crate::entity::{EntityKey, Tracked};
use crate::error::{WorkError, WorkResult};
use crate::mapper::EntityMapper;
use crate::record::PersistableRecord;
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, trace};

/// Which bucket an entity is scheduled in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    /// Scheduled for insertion (a new record, never persisted).
    Insert,
    /// Scheduled for update (loaded from storage, pending modification).
    Update,
    /// Scheduled for deletion (loaded from storage, marked for removal).
    Delete,
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Schedule::Insert => write!(f, "insert"),
            Schedule::Update => write!(f, "update"),
            Schedule::Delete => write!(f, "delete"),
        }
    }
}

/// The pending-operation ledger.
///
/// Tracks, per entity key, which of three disjoint buckets (insertions,
/// updates, deletions) the entity is scheduled in. A key appears in at
/// most one bucket at any time. Scheduling calls move entries between
/// buckets; [`commit`](UnitOfWork::commit) flushes all buckets through
/// the records' storage operations and clears the ledger on full
/// success.
///
/// One `UnitOfWork` belongs to one logical transaction. It is not
/// shareable across threads; callers needing concurrency must serialize
/// access or give each transaction its own instance.
pub struct UnitOfWork<R> {
    insertions: HashMap<EntityKey, R>,
    updates: HashMap<EntityKey, R>,
    deletions: HashMap<EntityKey, R>,
}

impl<R> UnitOfWork<R> {
    /// Creates an empty unit of work.
    #[must_use]
    pub fn new() -> Self {
        Self {
            insertions: HashMap::new(),
            updates: HashMap::new(),
            deletions: HashMap::new(),
        }
    }

    /// Schedules a never-persisted entity for insertion.
    ///
    /// The mapper builds a new record from the entity's current state.
    ///
    /// # Errors
    ///
    /// Returns [`WorkError::AlreadyScheduled`] if the entity is already
    /// tracked in any bucket.
    pub fn persist<E, M>(&mut self, entity: &Tracked<E>, mapper: &M) -> WorkResult<()>
    where
        M: EntityMapper<E, R> + ?Sized,
    {
        let key = entity.key();
        if self.schedule_of(key).is_some() {
            return Err(WorkError::already_scheduled(key));
        }
        trace!(%key, "scheduling insert");
        self.insertions.insert(key, mapper.create(entity.entity()));
        Ok(())
    }

    /// Schedules a tracked entity for deletion.
    ///
    /// An entity still in the insertions bucket was never persisted, so
    /// its deletion is a pure cancellation: the entry is removed and no
    /// storage call will ever be issued for it. An entity in the updates
    /// bucket moves to the deletions bucket along with its record.
    ///
    /// # Errors
    ///
    /// Returns [`WorkError::NotScheduled`] if the entity is untracked,
    /// including when it is already scheduled for deletion.
    pub fn schedule_for_delete<E>(&mut self, entity: &Tracked<E>) -> WorkResult<()> {
        let key = entity.key();
        if self.insertions.remove(&key).is_some() {
            trace!(%key, "cancelling pending insert");
            return Ok(());
        }
        if let Some(record) = self.updates.remove(&key) {
            trace!(%key, "scheduling delete");
            self.deletions.insert(key, record);
            return Ok(());
        }
        Err(WorkError::not_scheduled(key))
    }

    /// Re-applies the entity's current field values onto its tracked
    /// record.
    ///
    /// The mapper's `update` runs eagerly, on every call; repeated calls
    /// with changed entity fields each land on the record immediately
    /// rather than being diffed at commit time. The entity stays in
    /// whichever bucket it already occupies.
    ///
    /// # Errors
    ///
    /// Returns [`WorkError::NotTracked`] if the entity is untracked or
    /// already scheduled for deletion.
    pub fn schedule_for_update<E, M>(&mut self, entity: &Tracked<E>, mapper: &M) -> WorkResult<()>
    where
        M: EntityMapper<E, R> + ?Sized,
    {
        let key = entity.key();
        if let Some(record) = self.insertions.get_mut(&key) {
            trace!(%key, "applying update to pending insert");
            mapper.update(entity.entity(), record);
            return Ok(());
        }
        if let Some(record) = self.updates.get_mut(&key) {
            trace!(%key, "applying update");
            mapper.update(entity.entity(), record);
            return Ok(());
        }
        Err(WorkError::not_tracked(key))
    }

    /// Hydrates an entity from a stored record and tracks it for update.
    ///
    /// The record enters the updates bucket under a freshly minted key;
    /// the returned handle carries that key alongside the hydrated
    /// entity.
    pub fn get_for_update<E, M>(&mut self, record: R, mapper: &M) -> Tracked<E>
    where
        M: EntityMapper<E, R> + ?Sized,
    {
        let entity = mapper.hydrate(&record);
        let key = EntityKey::new();
        trace!(%key, "tracking hydrated entity for update");
        self.updates.insert(key, record);
        Tracked::from_parts(key, entity)
    }

    /// Returns which bucket the key is scheduled in, if any.
    #[must_use]
    pub fn schedule_of(&self, key: EntityKey) -> Option<Schedule> {
        if self.insertions.contains_key(&key) {
            Some(Schedule::Insert)
        } else if self.updates.contains_key(&key) {
            Some(Schedule::Update)
        } else if self.deletions.contains_key(&key) {
            Some(Schedule::Delete)
        } else {
            None
        }
    }

    /// Checks whether the key is tracked in any bucket.
    #[must_use]
    pub fn is_tracked(&self, key: EntityKey) -> bool {
        self.schedule_of(key).is_some()
    }

    /// Returns the number of pending operations across all buckets.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.insertions.len() + self.updates.len() + self.deletions.len()
    }

    /// Checks whether the ledger is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending_count() == 0
    }

    /// Empties all three buckets unconditionally.
    ///
    /// Used both after a successful flush and when a transaction is
    /// discarded.
    pub fn clear(&mut self) {
        self.insertions.clear();
        self.updates.clear();
        self.deletions.clear();
    }
}

impl<R: PersistableRecord> UnitOfWork<R> {
    /// Flushes all buckets, then clears the ledger.
    ///
    /// Buckets flush in a fixed order: deletions, then insertions, then
    /// updates. Within a bucket the order is map iteration order;
    /// callers must not rely on it. Each record's storage operation must
    /// report success (`delete` exactly one affected row, `insert` and
    /// `update` `true`); the first unexpected signal aborts the flush
    /// immediately, leaving the ledger un-cleared so the surrounding
    /// transaction can be rolled back.
    ///
    /// # Errors
    ///
    /// Returns [`WorkError::PersistenceFailure`] naming the failed
    /// operation and entity.
    pub fn commit(&mut self) -> WorkResult<()> {
        debug!(
            deletions = self.deletions.len(),
            insertions = self.insertions.len(),
            updates = self.updates.len(),
            "flushing unit of work"
        );
        for (key, record) in &mut self.deletions {
            if record.delete() != 1 {
                return Err(WorkError::persistence_failure(Schedule::Delete, *key));
            }
        }
        for (key, record) in &mut self.insertions {
            if !record.insert() {
                return Err(WorkError::persistence_failure(Schedule::Insert, *key));
            }
        }
        for (key, record) in &mut self.updates {
            if !record.update() {
                return Err(WorkError::persistence_failure(Schedule::Update, *key));
            }
        }
        self.clear();
        Ok(())
    }
}

impl<R> Default for UnitOfWork<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> fmt::Debug for UnitOfWork<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnitOfWork")
            .field("insertions", &self.insertions.len())
            .field("updates", &self.updates.len())
            .field("deletions", &self.deletions.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    type CallLog = Rc<RefCell<Vec<String>>>;

    struct Person {
        name: String,
    }

    struct Row {
        name: String,
        log: CallLog,
        insert_ok: bool,
        update_ok: bool,
        delete_rows: u64,
    }

    impl PersistableRecord for Row {
        fn insert(&mut self) -> bool {
            self.log.borrow_mut().push(format!("insert:{}", self.name));
            self.insert_ok
        }

        fn update(&mut self) -> bool {
            self.log.borrow_mut().push(format!("update:{}", self.name));
            self.update_ok
        }

        fn delete(&mut self) -> u64 {
            self.log.borrow_mut().push(format!("delete:{}", self.name));
            self.delete_rows
        }
    }

    struct PersonMapper {
        log: CallLog,
        insert_ok: bool,
        update_ok: bool,
        delete_rows: u64,
    }

    impl PersonMapper {
        fn new(log: &CallLog) -> Self {
            Self {
                log: Rc::clone(log),
                insert_ok: true,
                update_ok: true,
                delete_rows: 1,
            }
        }

        fn row(&self, name: &str) -> Row {
            Row {
                name: name.to_string(),
                log: Rc::clone(&self.log),
                insert_ok: self.insert_ok,
                update_ok: self.update_ok,
                delete_rows: self.delete_rows,
            }
        }
    }

    impl EntityMapper<Person, Row> for PersonMapper {
        fn create(&self, entity: &Person) -> Row {
            self.log.borrow_mut().push("map:create".to_string());
            self.row(&entity.name)
        }

        fn update(&self, entity: &Person, record: &mut Row) {
            self.log.borrow_mut().push("map:update".to_string());
            record.name = entity.name.clone();
        }

        fn hydrate(&self, record: &Row) -> Person {
            self.log.borrow_mut().push("map:hydrate".to_string());
            Person {
                name: record.name.clone(),
            }
        }
    }

    fn setup() -> (UnitOfWork<Row>, PersonMapper, CallLog) {
        let log: CallLog = Rc::new(RefCell::new(Vec::new()));
        (UnitOfWork::new(), PersonMapper::new(&log), log)
    }

    fn person(name: &str) -> Tracked<Person> {
        Tracked::new(Person {
            name: name.to_string(),
        })
    }

    fn storage_calls(log: &CallLog) -> Vec<String> {
        log.borrow()
            .iter()
            .filter(|c| !c.starts_with("map:"))
            .cloned()
            .collect()
    }

    #[test]
    fn persist_schedules_insert() {
        let (mut uow, mapper, _log) = setup();
        let alice = person("alice");

        uow.persist(&alice, &mapper).unwrap();

        assert_eq!(uow.schedule_of(alice.key()), Some(Schedule::Insert));
        assert_eq!(uow.pending_count(), 1);
    }

    #[test]
    fn persist_twice_is_already_scheduled() {
        let (mut uow, mapper, _log) = setup();
        let alice = person("alice");

        uow.persist(&alice, &mapper).unwrap();
        let err = uow.persist(&alice, &mapper).unwrap_err();

        assert!(matches!(err, WorkError::AlreadyScheduled { key } if key == alice.key()));
    }

    #[test]
    fn persist_then_commit_issues_one_insert() {
        let (mut uow, mapper, log) = setup();
        let alice = person("alice");

        uow.persist(&alice, &mapper).unwrap();
        uow.commit().unwrap();

        assert_eq!(storage_calls(&log), vec!["insert:alice"]);
    }

    #[test]
    fn get_for_update_hydrates_and_tracks() {
        let (mut uow, mapper, _log) = setup();

        let bob: Tracked<Person> = uow.get_for_update(mapper.row("bob"), &mapper);

        assert_eq!(bob.name, "bob");
        assert_eq!(uow.schedule_of(bob.key()), Some(Schedule::Update));
    }

    #[test]
    fn update_then_commit_issues_one_update() {
        let (mut uow, mapper, log) = setup();

        let bob: Tracked<Person> = uow.get_for_update(mapper.row("bob"), &mapper);
        uow.schedule_for_update(&bob, &mapper).unwrap();
        uow.commit().unwrap();

        assert_eq!(storage_calls(&log), vec!["update:bob"]);
    }

    #[test]
    fn update_applies_mapper_eagerly() {
        let (mut uow, mapper, log) = setup();

        let mut bob: Tracked<Person> = uow.get_for_update(mapper.row("bob"), &mapper);
        bob.name = "robert".to_string();
        uow.schedule_for_update(&bob, &mapper).unwrap();

        // Mapper ran before any flush, and each re-schedule runs it again.
        assert_eq!(log.borrow().last().unwrap(), "map:update");
        uow.schedule_for_update(&bob, &mapper).unwrap();
        let maps = log.borrow().iter().filter(|c| *c == "map:update").count();
        assert_eq!(maps, 2);

        uow.commit().unwrap();
        assert_eq!(storage_calls(&log), vec!["update:robert"]);
    }

    #[test]
    fn update_on_pending_insert_stays_in_insertions() {
        let (mut uow, mapper, log) = setup();
        let mut alice = person("alice");

        uow.persist(&alice, &mapper).unwrap();
        alice.name = "alicia".to_string();
        uow.schedule_for_update(&alice, &mapper).unwrap();

        assert_eq!(uow.schedule_of(alice.key()), Some(Schedule::Insert));

        uow.commit().unwrap();
        assert_eq!(storage_calls(&log), vec!["insert:alicia"]);
    }

    #[test]
    fn delete_on_pending_insert_cancels_entirely() {
        let (mut uow, mapper, log) = setup();
        let alice = person("alice");

        uow.persist(&alice, &mapper).unwrap();
        uow.schedule_for_delete(&alice).unwrap();

        assert!(uow.is_empty());
        uow.commit().unwrap();
        assert!(storage_calls(&log).is_empty());
    }

    #[test]
    fn delete_on_tracked_update_issues_one_delete() {
        let (mut uow, mapper, log) = setup();

        let bob: Tracked<Person> = uow.get_for_update(mapper.row("bob"), &mapper);
        uow.schedule_for_update(&bob, &mapper).unwrap();
        uow.schedule_for_delete(&bob).unwrap();

        assert_eq!(uow.schedule_of(bob.key()), Some(Schedule::Delete));

        uow.commit().unwrap();
        assert_eq!(storage_calls(&log), vec!["delete:bob"]);
    }

    #[test]
    fn delete_untracked_is_not_scheduled() {
        let (mut uow, _mapper, _log) = setup();
        let ghost = person("ghost");

        let err = uow.schedule_for_delete(&ghost).unwrap_err();
        assert!(matches!(err, WorkError::NotScheduled { key } if key == ghost.key()));
    }

    #[test]
    fn delete_twice_is_not_scheduled() {
        let (mut uow, mapper, _log) = setup();

        let bob: Tracked<Person> = uow.get_for_update(mapper.row("bob"), &mapper);
        uow.schedule_for_delete(&bob).unwrap();

        let err = uow.schedule_for_delete(&bob).unwrap_err();
        assert!(matches!(err, WorkError::NotScheduled { .. }));
    }

    #[test]
    fn update_after_delete_is_not_tracked() {
        let (mut uow, mapper, _log) = setup();

        let bob: Tracked<Person> = uow.get_for_update(mapper.row("bob"), &mapper);
        uow.schedule_for_delete(&bob).unwrap();

        let err = uow.schedule_for_update(&bob, &mapper).unwrap_err();
        assert!(matches!(err, WorkError::NotTracked { key } if key == bob.key()));
    }

    #[test]
    fn update_untracked_is_not_tracked() {
        let (mut uow, mapper, _log) = setup();
        let ghost = person("ghost");

        let err = uow.schedule_for_update(&ghost, &mapper).unwrap_err();
        assert!(matches!(err, WorkError::NotTracked { .. }));
    }

    #[test]
    fn flush_order_is_delete_insert_update() {
        let (mut uow, mapper, log) = setup();

        let doomed: Tracked<Person> = uow.get_for_update(mapper.row("doomed"), &mapper);
        uow.schedule_for_delete(&doomed).unwrap();
        let fresh = person("fresh");
        uow.persist(&fresh, &mapper).unwrap();
        let changed: Tracked<Person> = uow.get_for_update(mapper.row("changed"), &mapper);
        uow.schedule_for_update(&changed, &mapper).unwrap();

        uow.commit().unwrap();

        assert_eq!(
            storage_calls(&log),
            vec!["delete:doomed", "insert:fresh", "update:changed"]
        );
    }

    #[test]
    fn commit_clears_ledger() {
        let (mut uow, mapper, log) = setup();
        let alice = person("alice");

        uow.persist(&alice, &mapper).unwrap();
        uow.commit().unwrap();

        assert!(uow.is_empty());
        assert!(!uow.is_tracked(alice.key()));

        // Second commit has nothing to flush.
        uow.commit().unwrap();
        assert_eq!(storage_calls(&log).len(), 1);
    }

    #[test]
    fn failed_delete_aborts_flush_and_keeps_ledger() {
        let (mut uow, mut mapper, log) = setup();
        mapper.delete_rows = 0;

        let bob: Tracked<Person> = uow.get_for_update(mapper.row("bob"), &mapper);
        uow.schedule_for_delete(&bob).unwrap();
        let fresh = person("fresh");
        uow.persist(&fresh, &mapper).unwrap();

        let err = uow.commit().unwrap_err();
        assert!(matches!(
            err,
            WorkError::PersistenceFailure {
                operation: Schedule::Delete,
                ..
            }
        ));

        // Flush stopped at the failed delete; later buckets untouched.
        assert_eq!(storage_calls(&log), vec!["delete:bob"]);
        assert_eq!(uow.pending_count(), 2);
    }

    #[test]
    fn failed_insert_aborts_flush() {
        let (mut uow, mut mapper, _log) = setup();
        mapper.insert_ok = false;
        let alice = person("alice");

        uow.persist(&alice, &mapper).unwrap();
        let err = uow.commit().unwrap_err();

        assert!(matches!(
            err,
            WorkError::PersistenceFailure {
                operation: Schedule::Insert,
                ..
            }
        ));
        assert_eq!(uow.pending_count(), 1);
    }

    #[test]
    fn failed_update_aborts_flush() {
        let (mut uow, mut mapper, _log) = setup();
        mapper.update_ok = false;

        let bob: Tracked<Person> = uow.get_for_update(mapper.row("bob"), &mapper);
        uow.schedule_for_update(&bob, &mapper).unwrap();

        let err = uow.commit().unwrap_err();
        assert!(matches!(
            err,
            WorkError::PersistenceFailure {
                operation: Schedule::Update,
                ..
            }
        ));
    }

    #[test]
    fn clear_empties_all_buckets() {
        let (mut uow, mapper, _log) = setup();

        let doomed: Tracked<Person> = uow.get_for_update(mapper.row("doomed"), &mapper);
        uow.schedule_for_delete(&doomed).unwrap();
        uow.persist(&person("fresh"), &mapper).unwrap();
        let _kept: Tracked<Person> = uow.get_for_update(mapper.row("kept"), &mapper);

        assert_eq!(uow.pending_count(), 3);
        uow.clear();
        assert!(uow.is_empty());
    }

    // === Ledger invariant (property-based) ===

    mod invariants {
        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, Clone)]
        enum Op {
            Persist,
            GetForUpdate,
            Update(prop::sample::Index),
            Delete(prop::sample::Index),
        }

        fn op_strategy() -> impl Strategy<Value = Op> {
            prop_oneof![
                Just(Op::Persist),
                Just(Op::GetForUpdate),
                any::<prop::sample::Index>().prop_map(Op::Update),
                any::<prop::sample::Index>().prop_map(Op::Delete),
            ]
        }

        proptest! {
            #[test]
            fn each_key_occupies_at_most_one_bucket(
                ops in prop::collection::vec(op_strategy(), 1..40)
            ) {
                let (mut uow, mapper, _log) = setup();
                let mut handles: Vec<Tracked<Person>> = Vec::new();

                for op in ops {
                    match op {
                        Op::Persist => {
                            let e = person("p");
                            uow.persist(&e, &mapper).unwrap();
                            handles.push(e);
                        }
                        Op::GetForUpdate => {
                            handles.push(uow.get_for_update(mapper.row("g"), &mapper));
                        }
                        Op::Update(idx) => {
                            if !handles.is_empty() {
                                let e = &handles[idx.index(handles.len())];
                                // Legal only from Insert/Update; errors are fine.
                                let _ = uow.schedule_for_update(e, &mapper);
                            }
                        }
                        Op::Delete(idx) => {
                            if !handles.is_empty() {
                                let e = &handles[idx.index(handles.len())];
                                let _ = uow.schedule_for_delete(e);
                            }
                        }
                    }

                    let tracked = handles
                        .iter()
                        .filter(|e| uow.is_tracked(e.key()))
                        .count();
                    prop_assert_eq!(tracked, uow.pending_count());
                }

                uow.clear();
                prop_assert!(uow.is_empty());
            }
        }
    }
}
