// SPDX-License-Identifier: MIT OR Apache-2.0

//! Starring resources, liking projects and counting views.
use nexus_core::{Counter, EntityId, EntityKind, MembershipSet, PrincipalId};
use nexus_store::{DocumentStore, Transaction, TransactionError, Write};
use tracing::debug;

use crate::accessor::fetch_entity;
use crate::error::NexusError;

#[derive(Clone, Debug)]
pub struct Favourites<S> {
    store: S,
}

impl<S> Favourites<S>
where
    S: DocumentStore,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    async fn is_in_set(
        &self,
        principal_id: &PrincipalId,
        set: MembershipSet,
        entity_id: &EntityId,
    ) -> Result<bool, NexusError> {
        let principal = self
            .store
            .get_principal(principal_id)
            .await?
            .ok_or(NexusError::NotFound)?;
        Ok(principal.memberships.contains(set, entity_id))
    }

    /// Star or unstar a resource. Returns `true` if the resource is starred afterwards.
    pub async fn toggle_star(
        &self,
        principal_id: &PrincipalId,
        resource_id: &EntityId,
    ) -> Result<bool, NexusError> {
        fetch_entity(&self.store, EntityKind::Resource, resource_id).await?;

        let set = MembershipSet::StarredResources;
        let starred = if self.is_in_set(principal_id, set, resource_id).await? {
            self.store
                .remove_from_set(principal_id, set, resource_id)
                .await?;
            false
        } else {
            self.store.add_to_set(principal_id, set, resource_id).await?;
            true
        };

        debug!(principal = %principal_id, id = %resource_id, starred, "toggled star");
        Ok(starred)
    }

    /// Like or unlike a project and adjust its like counter in the same transaction.
    ///
    /// Returns `true` if the project is liked afterwards. When a concurrent toggle of the same
    /// principal won the race, the state it left behind is returned.
    pub async fn toggle_like(
        &self,
        principal_id: &PrincipalId,
        project_id: &EntityId,
    ) -> Result<bool, NexusError> {
        let kind = EntityKind::Project;
        fetch_entity(&self.store, kind, project_id).await?;

        let set = MembershipSet::LikedProjects;
        let liked = !self.is_in_set(principal_id, set, project_id).await?;

        let mut tx = self.store.begin().await?;
        if liked {
            tx.stage(Write::AddToSet {
                principal: principal_id.clone(),
                set,
                entity: *project_id,
                must_change: true,
            });
        } else {
            tx.stage(Write::RemoveFromSet {
                principal: principal_id.clone(),
                set,
                entity: *project_id,
                must_change: true,
            });
        }
        tx.stage(Write::Increment {
            kind,
            entity: *project_id,
            counter: Counter::Likes,
            delta: if liked { 1 } else { -1 },
        });

        match tx.commit().await {
            Ok(()) => {
                debug!(principal = %principal_id, id = %project_id, liked, "toggled like");
                Ok(liked)
            }
            Err(TransactionError::Conflict(write)) => match *write {
                Write::AddToSet { .. } | Write::RemoveFromSet { .. } => {
                    self.is_in_set(principal_id, set, project_id).await
                }
                _ => Err(NexusError::NotFound),
            },
            Err(TransactionError::Store(err)) => Err(err.into()),
        }
    }

    /// Count a view of an entity and return the new number of views.
    pub async fn record_view(
        &self,
        kind: EntityKind,
        entity_id: &EntityId,
    ) -> Result<u64, NexusError> {
        self.store
            .increment(kind, entity_id, Counter::Views, 1)
            .await?
            .ok_or(NexusError::NotFound)
    }
}
