// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory document store and identity provider.
//!
//! Neither persists anything, all state is lost when the process ends. Use them only in
//! development or test contexts.
mod content;
mod entities;
mod identity;
mod principals;
mod transaction;

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use nexus_core::{
    AccessCode, Content, ContentId, Entity, EntityId, EntityKind, NewEntity, Principal,
    PrincipalId, Timestamp,
};

use crate::error::StoreError;

pub use identity::{MIN_PASSWORD_LEN, MemoryIdentityProvider};
pub use transaction::MemoryTransaction;

/// Collections of the in-memory document store.
#[derive(Clone, Debug, Default)]
pub struct InnerMemoryStore {
    entities: HashMap<EntityKind, BTreeMap<EntityId, Entity>>,
    codes: HashMap<(EntityKind, AccessCode), EntityId>,
    principals: BTreeMap<PrincipalId, Principal>,
    content: BTreeMap<ContentId, Content>,
    last_timestamp: Timestamp,
}

impl InnerMemoryStore {
    /// Server timestamp, strictly increasing within one store.
    fn next_timestamp(&mut self) -> Timestamp {
        let now = Timestamp::now();
        let timestamp = if now > self.last_timestamp {
            now
        } else {
            self.last_timestamp.saturating_add(Duration::from_micros(1))
        };
        self.last_timestamp = timestamp;
        timestamp
    }

    fn entity(&self, kind: EntityKind, id: &EntityId) -> Option<&Entity> {
        self.entities.get(&kind).and_then(|entities| entities.get(id))
    }

    fn entity_mut(&mut self, kind: EntityKind, id: &EntityId) -> Option<&mut Entity> {
        self.entities
            .get_mut(&kind)
            .and_then(|entities| entities.get_mut(id))
    }

    /// Store a new entity under the given id. Returns `None` if the id or access code is taken.
    fn add_entity(&mut self, id: EntityId, entity: NewEntity) -> Option<Entity> {
        let kind = entity.kind();
        let code_key = (kind, entity.access_code.clone());
        if self.codes.contains_key(&code_key) || self.entity(kind, &id).is_some() {
            return None;
        }

        let created_at = self.next_timestamp();
        let entity = entity.into_entity(id, created_at);
        self.codes.insert(code_key, id);
        self.entities
            .entry(kind)
            .or_default()
            .insert(id, entity.clone());
        Some(entity)
    }

    /// Remove an entity, release its code and drop every reference to it from principal sets
    /// and content.
    fn remove_entity(&mut self, kind: EntityKind, id: &EntityId) -> Option<Entity> {
        let entity = self.entities.get_mut(&kind)?.remove(id)?;
        self.codes.remove(&(kind, entity.access_code.clone()));
        for principal in self.principals.values_mut() {
            principal.memberships.forget(kind, id);
        }
        self.content.retain(|_, content| &content.parent != id);
        Some(entity)
    }

    /// Remove a content item together with the items referring to it.
    fn remove_content(&mut self, id: &ContentId) -> Option<Content> {
        let content = self.content.remove(id)?;
        self.content.retain(|_, item| item.refers_to() != Some(id));
        Some(content)
    }
}

/// An in-memory document store holding entities, principals and content.
///
/// `MemoryStore` supports usage in asynchronous and multi-threaded contexts by wrapping an
/// `InnerMemoryStore` with an `RwLock` and `Arc`. Convenience methods are provided to obtain a
/// read- or write-lock on the underlying store.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<InnerMemoryStore>>,
    unavailable: Arc<AtomicBool>,
}

impl MemoryStore {
    /// Create a new in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Let all following requests fail with [`StoreError::Unavailable`] until switched back.
    ///
    /// Used to exercise error paths of callers.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store switched off".into()));
        }
        Ok(())
    }

    /// Obtain a read-lock on the store.
    pub fn read_store(&self) -> Result<RwLockReadGuard<'_, InnerMemoryStore>, StoreError> {
        self.check_available()?;
        self.inner.read().map_err(|_| StoreError::Poisoned)
    }

    /// Obtain a write-lock on the store.
    pub fn write_store(&self) -> Result<RwLockWriteGuard<'_, InnerMemoryStore>, StoreError> {
        self.check_available()?;
        self.inner.write().map_err(|_| StoreError::Poisoned)
    }
}

#[cfg(test)]
mod tests {
    use super::InnerMemoryStore;

    #[test]
    fn timestamps_strictly_increase() {
        let mut store = InnerMemoryStore::default();
        let mut last = store.next_timestamp();
        for _ in 0..100 {
            let next = store.next_timestamp();
            assert!(next > last);
            last = next;
        }
    }
}
