//! Entity identity token.

use std::fmt;
use uuid::Uuid;

/// Identity token for a tracked entity.
///
/// The ledger needs to tell entity A from entity B without inspecting
/// their fields, and Rust exposes no stable object-identity hash. Keys
/// are therefore minted explicitly — by [`Tracked::new`] before a
/// persist, or by the unit of work when it hydrates an entity for
/// update — and carried alongside the entity for as long as it is
/// tracked.
///
/// Keys are:
/// - Unique per tracked entity object
/// - Immutable once minted
/// - Never reused
///
/// [`Tracked::new`]: crate::Tracked::new
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityKey(Uuid);

impl EntityKey {
    /// Mints a new random entity key.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an entity key from a UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Converts to a UUID.
    #[must_use]
    pub const fn to_uuid(self) -> Uuid {
        self.0
    }
}

impl Default for EntityKey {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityKey({})", self.0)
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for EntityKey {
    fn from(uuid: Uuid) -> Self {
        Self::from_uuid(uuid)
    }
}

impl From<EntityKey> for Uuid {
    fn from(key: EntityKey) -> Self {
        key.to_uuid()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_is_unique() {
        let k1 = EntityKey::new();
        let k2 = EntityKey::new();
        assert_ne!(k1, k2);
    }

    #[test]
    fn uuid_roundtrip() {
        let uuid = Uuid::new_v4();
        let key = EntityKey::from_uuid(uuid);
        assert_eq!(key.to_uuid(), uuid);
    }

    #[test]
    fn display() {
        let key = EntityKey::new();
        let s = format!("{key}");
        assert!(!s.is_empty());
    }
}
