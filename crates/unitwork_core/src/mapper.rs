//! Entity-to-record mapping strategy.

/// Trait for mapping domain entities onto storage records.
///
/// Implementors bridge one entity type `E` to the storage engine's
/// record representation `R`. The unit of work never inspects entity
/// fields itself; every conversion goes through one of these three
/// capabilities:
///
/// - `create`: build a brand-new record from an entity about to be
///   persisted for the first time
/// - `update`: copy the entity's current field values onto a record
///   that already exists in the ledger
/// - `hydrate`: reconstruct a domain entity from a record loaded out
///   of storage
///
/// # Example
///
/// ```rust,ignore
/// use unitwork_core::EntityMapper;
///
/// struct User {
///     name: String,
///     age: u32,
/// }
///
/// struct UserMapper;
///
/// impl EntityMapper<User, UserRow> for UserMapper {
///     fn create(&self, entity: &User) -> UserRow {
///         UserRow::new(&entity.name, entity.age)
///     }
///
///     fn update(&self, entity: &User, record: &mut UserRow) {
///         record.set_name(&entity.name);
///         record.set_age(entity.age);
///     }
///
///     fn hydrate(&self, record: &UserRow) -> User {
///         User {
///             name: record.name().to_string(),
///             age: record.age(),
///         }
///     }
/// }
/// ```
pub trait EntityMapper<E, R> {
    /// Builds a new persistable record representing the entity's
    /// current state.
    fn create(&self, entity: &E) -> R;

    /// Mutates `record` in place to reflect the entity's current field
    /// values.
    fn update(&self, entity: &E, record: &mut R);

    /// Constructs a fresh domain entity from a persisted record's data.
    fn hydrate(&self, record: &R) -> E;
}
