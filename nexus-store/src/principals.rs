// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait definitions for the principal collection.
use nexus_core::{EntityId, MembershipSet, Principal, PrincipalId, PrincipalPatch};

use crate::error::StoreError;

/// Interface for storing principal records and mutating their membership sets.
///
/// Two variants of the trait are provided: one which is thread-safe (implementing `Sync`) and one
/// which is purely intended for single-threaded execution contexts.
#[trait_variant::make(PrincipalStore: Send)]
pub trait LocalPrincipalStore {
    /// Insert a principal record.
    ///
    /// Returns `true` when the insert occurred, or `false` when a record with the same id
    /// already existed and nothing was written.
    async fn insert_principal(&self, principal: Principal) -> Result<bool, StoreError>;

    async fn get_principal(&self, id: &PrincipalId) -> Result<Option<Principal>, StoreError>;

    /// Apply a profile update. Returns `false` when the record does not exist.
    async fn update_principal(
        &self,
        id: &PrincipalId,
        patch: &PrincipalPatch,
    ) -> Result<bool, StoreError>;

    /// Atomically add an entity id to one of the principal's sets.
    ///
    /// Returns `true` if the set changed and `false` if the id was already contained. Fails with
    /// [`StoreError::MissingDocument`] when the principal record does not exist.
    async fn add_to_set(
        &self,
        id: &PrincipalId,
        set: MembershipSet,
        entity: &EntityId,
    ) -> Result<bool, StoreError>;

    /// Atomically remove an entity id from one of the principal's sets.
    ///
    /// Returns `true` if the set changed.
    async fn remove_from_set(
        &self,
        id: &PrincipalId,
        set: MembershipSet,
        entity: &EntityId,
    ) -> Result<bool, StoreError>;

    /// All principals whose given set contains the entity id.
    async fn principals_with(
        &self,
        set: MembershipSet,
        entity: &EntityId,
    ) -> Result<Vec<Principal>, StoreError>;
}
