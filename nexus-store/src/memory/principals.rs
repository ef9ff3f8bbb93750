// SPDX-License-Identifier: MIT OR Apache-2.0

use nexus_core::{EntityId, MembershipSet, Principal, PrincipalId, PrincipalPatch};

use crate::error::StoreError;
use crate::memory::MemoryStore;
use crate::principals::PrincipalStore;

impl PrincipalStore for MemoryStore {
    async fn insert_principal(&self, principal: Principal) -> Result<bool, StoreError> {
        let mut store = self.write_store()?;
        if store.principals.contains_key(&principal.id) {
            return Ok(false);
        }

        store.principals.insert(principal.id.clone(), principal);
        Ok(true)
    }

    async fn get_principal(&self, id: &PrincipalId) -> Result<Option<Principal>, StoreError> {
        Ok(self.read_store()?.principals.get(id).cloned())
    }

    async fn update_principal(
        &self,
        id: &PrincipalId,
        patch: &PrincipalPatch,
    ) -> Result<bool, StoreError> {
        let mut store = self.write_store()?;
        let updated_at = store.next_timestamp();
        let Some(principal) = store.principals.get_mut(id) else {
            return Ok(false);
        };

        patch.apply(principal);
        principal.updated_at = Some(updated_at);
        Ok(true)
    }

    async fn add_to_set(
        &self,
        id: &PrincipalId,
        set: MembershipSet,
        entity: &EntityId,
    ) -> Result<bool, StoreError> {
        let mut store = self.write_store()?;
        let principal = store
            .principals
            .get_mut(id)
            .ok_or_else(|| StoreError::MissingDocument(id.to_string()))?;
        Ok(principal.memberships.get_mut(set).insert(*entity))
    }

    async fn remove_from_set(
        &self,
        id: &PrincipalId,
        set: MembershipSet,
        entity: &EntityId,
    ) -> Result<bool, StoreError> {
        let mut store = self.write_store()?;
        let principal = store
            .principals
            .get_mut(id)
            .ok_or_else(|| StoreError::MissingDocument(id.to_string()))?;
        Ok(principal.memberships.get_mut(set).remove(entity))
    }

    async fn principals_with(
        &self,
        set: MembershipSet,
        entity: &EntityId,
    ) -> Result<Vec<Principal>, StoreError> {
        let store = self.read_store()?;
        Ok(store
            .principals
            .values()
            .filter(|principal| principal.memberships.contains(set, entity))
            .cloned()
            .collect())
    }
}
