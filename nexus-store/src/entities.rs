// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait definitions for the entity collections.
use nexus_core::{
    AccessCode, Counter, Entity, EntityId, EntityKind, EntityPatch, NewEntity,
};

use crate::error::StoreError;
use crate::query::EntityQuery;

/// Maximum number of ids accepted by a single batched get.
pub const MAX_BATCH_SIZE: usize = 10;

/// Interface for storing, updating and querying resources, courses and projects.
///
/// Two variants of the trait are provided: one which is thread-safe (implementing `Sync`) and one
/// which is purely intended for single-threaded execution contexts.
#[trait_variant::make(EntityStore: Send)]
pub trait LocalEntityStore {
    /// Insert a new entity under a store-generated id.
    ///
    /// Access codes are unique per entity kind. The insert is conditional: when another entity
    /// of the same kind already uses the code nothing is written and `None` is returned.
    async fn insert_entity(&self, entity: NewEntity) -> Result<Option<Entity>, StoreError>;

    /// Get an entity by id.
    async fn get_entity(&self, kind: EntityKind, id: &EntityId)
    -> Result<Option<Entity>, StoreError>;

    /// Get up to [`MAX_BATCH_SIZE`] entities in one request.
    ///
    /// Entities are returned in the order of the requested ids, missing ids are skipped.
    async fn get_entities(
        &self,
        kind: EntityKind,
        ids: &[EntityId],
    ) -> Result<Vec<Entity>, StoreError>;

    /// Look up an entity by its normalised access code.
    async fn find_by_code(
        &self,
        kind: EntityKind,
        code: &AccessCode,
    ) -> Result<Option<Entity>, StoreError>;

    /// List entities of one kind matching the query.
    async fn query_entities(
        &self,
        kind: EntityKind,
        query: &EntityQuery,
    ) -> Result<Vec<Entity>, StoreError>;

    /// Apply a partial update and bump the update timestamp.
    ///
    /// Returns `false` when the entity does not exist.
    async fn update_entity(
        &self,
        kind: EntityKind,
        id: &EntityId,
        patch: &EntityPatch,
    ) -> Result<bool, StoreError>;

    /// Atomically add a delta to one of the entity's counters.
    ///
    /// Returns the new value or `None` when the entity does not exist.
    async fn increment(
        &self,
        kind: EntityKind,
        id: &EntityId,
        counter: Counter,
        delta: i64,
    ) -> Result<Option<u64>, StoreError>;

    /// Overwrite a counter. Only used for repairing denormalised state.
    async fn set_counter(
        &self,
        kind: EntityKind,
        id: &EntityId,
        counter: Counter,
        value: u64,
    ) -> Result<bool, StoreError>;

    /// Delete an entity and release its access code.
    ///
    /// The id is dropped from every principal's sets and content posted on the entity is
    /// deleted along with it.
    ///
    /// Returns `true` when the removal occurred and `false` when the entity was not found.
    async fn delete_entity(&self, kind: EntityKind, id: &EntityId) -> Result<bool, StoreError>;
}
