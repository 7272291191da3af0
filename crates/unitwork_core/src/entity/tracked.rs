//! Tracking handle tying an entity to its identity key.

use crate::entity::EntityKey;
use std::ops::{Deref, DerefMut};

/// A domain entity paired with the key the ledger tracks it under.
///
/// The handle derefs to the entity, so domain code can read and mutate
/// fields through it directly; only scheduling calls care about the key.
///
/// Construct one with [`Tracked::new`] before persisting a fresh entity,
/// or receive one from
/// [`UnitOfWork::get_for_update`](crate::UnitOfWork::get_for_update)
/// for an entity hydrated from storage.
#[derive(Debug, Clone)]
pub struct Tracked<E> {
    key: EntityKey,
    entity: E,
}

impl<E> Tracked<E> {
    /// Wraps an entity, minting a fresh identity key for it.
    #[must_use]
    pub fn new(entity: E) -> Self {
        Self {
            key: EntityKey::new(),
            entity,
        }
    }

    /// Pairs an entity with an existing key.
    pub(crate) fn from_parts(key: EntityKey, entity: E) -> Self {
        Self { key, entity }
    }

    /// Returns the identity key.
    #[must_use]
    pub const fn key(&self) -> EntityKey {
        self.key
    }

    /// Returns a reference to the entity.
    #[must_use]
    pub const fn entity(&self) -> &E {
        &self.entity
    }

    /// Consumes the handle, returning the entity.
    #[must_use]
    pub fn into_inner(self) -> E {
        self.entity
    }
}

impl<E> Deref for Tracked<E> {
    type Target = E;

    fn deref(&self) -> &Self::Target {
        &self.entity
    }
}

impl<E> DerefMut for Tracked<E> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.entity
    }
}
