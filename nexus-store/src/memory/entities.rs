// SPDX-License-Identifier: MIT OR Apache-2.0

use nexus_core::{AccessCode, Counter, Entity, EntityId, EntityKind, EntityPatch, NewEntity};

use crate::entities::{EntityStore, MAX_BATCH_SIZE};
use crate::error::StoreError;
use crate::memory::MemoryStore;
use crate::query::{EntityQuery, Order};

impl EntityStore for MemoryStore {
    async fn insert_entity(&self, entity: NewEntity) -> Result<Option<Entity>, StoreError> {
        let mut store = self.write_store()?;

        let kind = entity.kind();
        if store.codes.contains_key(&(kind, entity.access_code.clone())) {
            return Ok(None);
        }

        let mut rng = rand::rng();
        let id = loop {
            let id = EntityId::random(&mut rng);
            if store.entity(kind, &id).is_none() {
                break id;
            }
        };

        Ok(store.add_entity(id, entity))
    }

    async fn get_entity(
        &self,
        kind: EntityKind,
        id: &EntityId,
    ) -> Result<Option<Entity>, StoreError> {
        Ok(self.read_store()?.entity(kind, id).cloned())
    }

    async fn get_entities(
        &self,
        kind: EntityKind,
        ids: &[EntityId],
    ) -> Result<Vec<Entity>, StoreError> {
        if ids.len() > MAX_BATCH_SIZE {
            return Err(StoreError::BatchTooLarge(ids.len(), MAX_BATCH_SIZE));
        }

        let store = self.read_store()?;
        Ok(ids
            .iter()
            .filter_map(|id| store.entity(kind, id).cloned())
            .collect())
    }

    async fn find_by_code(
        &self,
        kind: EntityKind,
        code: &AccessCode,
    ) -> Result<Option<Entity>, StoreError> {
        let store = self.read_store()?;
        let entity = store
            .codes
            .get(&(kind, code.clone()))
            .and_then(|id| store.entity(kind, id))
            .cloned();
        Ok(entity)
    }

    async fn query_entities(
        &self,
        kind: EntityKind,
        query: &EntityQuery,
    ) -> Result<Vec<Entity>, StoreError> {
        let store = self.read_store()?;
        let Some(entities) = store.entities.get(&kind) else {
            return Ok(Vec::new());
        };

        let mut result: Vec<Entity> = entities
            .values()
            .filter(|entity| query.matches(entity))
            .cloned()
            .collect();
        result.sort_by_key(|entity| entity.created_at);
        if query.order == Order::Descending {
            result.reverse();
        }
        if let Some(limit) = query.limit {
            result.truncate(limit);
        }

        Ok(result)
    }

    async fn update_entity(
        &self,
        kind: EntityKind,
        id: &EntityId,
        patch: &EntityPatch,
    ) -> Result<bool, StoreError> {
        let mut store = self.write_store()?;
        if store.entity(kind, id).is_none() {
            return Ok(false);
        }

        let updated_at = store.next_timestamp();
        if let Some(entity) = store.entity_mut(kind, id) {
            patch.apply(&mut entity.details);
            entity.updated_at = Some(updated_at);
        }

        Ok(true)
    }

    async fn increment(
        &self,
        kind: EntityKind,
        id: &EntityId,
        counter: Counter,
        delta: i64,
    ) -> Result<Option<u64>, StoreError> {
        let mut store = self.write_store()?;
        Ok(store
            .entity_mut(kind, id)
            .map(|entity| entity.counters.apply(counter, delta)))
    }

    async fn set_counter(
        &self,
        kind: EntityKind,
        id: &EntityId,
        counter: Counter,
        value: u64,
    ) -> Result<bool, StoreError> {
        let mut store = self.write_store()?;
        let Some(entity) = store.entity_mut(kind, id) else {
            return Ok(false);
        };

        entity.counters.set(counter, value);
        Ok(true)
    }

    async fn delete_entity(&self, kind: EntityKind, id: &EntityId) -> Result<bool, StoreError> {
        let mut store = self.write_store()?;
        Ok(store.remove_entity(kind, id).is_some())
    }
}
