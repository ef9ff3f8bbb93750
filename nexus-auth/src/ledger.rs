// SPDX-License-Identifier: MIT OR Apache-2.0

//! Membership ledger keeping principals' joined sets and member counters consistent.
//!
//! A membership is stored twice: as the entity id inside the principal's joined set and as the
//! entity's member counter. Joining and leaving change both inside one store transaction. The
//! set write is conditional, a transaction which would add an id already contained in the set
//! (or remove one which is missing) aborts as a whole, so a counter is never moved without its
//! set entry.
use nexus_core::{
    Collaborator, Counter, Entity, EntityId, EntityKind, MembershipSet, Principal, PrincipalId,
    ProjectStatus,
};
use nexus_store::{DocumentStore, Transaction, TransactionError, Write};
use tracing::{debug, warn};

use crate::access::{Action, require};
use crate::accessor::fetch_entity;
use crate::codes::resolve;
use crate::error::NexusError;

/// Role given to project collaborators who did not pick one when joining.
pub const DEFAULT_COLLABORATOR_ROLE: &str = "Contributor";

#[derive(Clone, Debug)]
pub struct MembershipLedger<S> {
    store: S,
}

impl<S> MembershipLedger<S>
where
    S: DocumentStore,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    async fn fetch_principal(&self, id: &PrincipalId) -> Result<Principal, NexusError> {
        self.store
            .get_principal(id)
            .await?
            .ok_or(NexusError::NotFound)
    }

    /// Add a principal as member of an entity and return the updated entity.
    ///
    /// Fails with [`NexusError::SelfJoinForbidden`] for the owner, with
    /// [`NexusError::AlreadyMember`] when the principal joined before (also when a concurrent
    /// join won the race) and, for projects, with [`NexusError::NotOpen`] unless the project is
    /// open. Project members are added to the collaborator roster with the given role.
    pub async fn join(
        &self,
        principal_id: &PrincipalId,
        kind: EntityKind,
        entity_id: &EntityId,
        role: Option<&str>,
    ) -> Result<Entity, NexusError> {
        let entity = fetch_entity(&self.store, kind, entity_id).await?;
        let principal = self.fetch_principal(principal_id).await?;

        if entity.is_owner(principal_id) {
            warn!(%kind, id = %entity_id, principal = %principal_id, "owner tried to join");
            return Err(NexusError::SelfJoinForbidden);
        }

        if principal.is_member_of(kind, entity_id) {
            return Err(NexusError::AlreadyMember);
        }

        if let Some(project) = entity.details.as_project() {
            if project.status != ProjectStatus::Open {
                return Err(NexusError::NotOpen);
            }
        }

        let mut tx = self.store.begin().await?;
        tx.stage(Write::AddToSet {
            principal: principal_id.clone(),
            set: MembershipSet::Joined(kind),
            entity: *entity_id,
            must_change: true,
        });
        tx.stage(Write::Increment {
            kind,
            entity: *entity_id,
            counter: Counter::Members,
            delta: 1,
        });
        if kind == EntityKind::Project {
            tx.stage(Write::AddCollaborator {
                project: *entity_id,
                collaborator: Collaborator {
                    principal_id: principal_id.clone(),
                    name: principal.name(),
                    role: role.unwrap_or(DEFAULT_COLLABORATOR_ROLE).to_string(),
                },
            });
        }

        match tx.commit().await {
            Ok(()) => (),
            Err(TransactionError::Conflict(write)) => {
                warn!(%kind, id = %entity_id, principal = %principal_id, ?write, "join conflicted");
                return match *write {
                    Write::AddToSet { .. } => Err(NexusError::AlreadyMember),
                    _ => Err(NexusError::NotFound),
                };
            }
            Err(TransactionError::Store(err)) => return Err(err.into()),
        }

        let entity = fetch_entity(&self.store, kind, entity_id).await?;
        debug!(
            %kind,
            id = %entity_id,
            principal = %principal_id,
            members = entity.counters.members,
            "joined"
        );

        Ok(entity)
    }

    /// Remove a collaborator from a project and return the updated project.
    ///
    /// Enrollments in resources and courses are permanent, only projects can be left.
    pub async fn leave(
        &self,
        principal_id: &PrincipalId,
        project_id: &EntityId,
    ) -> Result<Entity, NexusError> {
        let kind = EntityKind::Project;
        let entity = fetch_entity(&self.store, kind, project_id).await?;
        if entity.is_owner(principal_id) {
            return Err(NexusError::OwnerCannotLeave);
        }

        let principal = self.fetch_principal(principal_id).await?;
        if !principal.is_member_of(kind, project_id) {
            return Err(NexusError::NotMember);
        }

        let mut tx = self.store.begin().await?;
        tx.stage(Write::RemoveFromSet {
            principal: principal_id.clone(),
            set: MembershipSet::Joined(kind),
            entity: *project_id,
            must_change: true,
        });
        tx.stage(Write::RemoveCollaborator {
            project: *project_id,
            principal: principal_id.clone(),
        });
        tx.stage(Write::Increment {
            kind,
            entity: *project_id,
            counter: Counter::Members,
            delta: -1,
        });

        match tx.commit().await {
            Ok(()) => (),
            Err(TransactionError::Conflict(write)) => {
                return match *write {
                    Write::RemoveFromSet { .. } => Err(NexusError::NotMember),
                    _ => Err(NexusError::NotFound),
                };
            }
            Err(TransactionError::Store(err)) => return Err(err.into()),
        }

        let entity = fetch_entity(&self.store, kind, project_id).await?;
        debug!(
            id = %project_id,
            principal = %principal_id,
            members = entity.counters.members,
            "left project"
        );

        Ok(entity)
    }

    /// Resolve an access code typed by the principal and join the entity using it.
    pub async fn enroll_by_code(
        &self,
        principal_id: &PrincipalId,
        kind: EntityKind,
        code: &str,
    ) -> Result<Entity, NexusError> {
        let entity = resolve(&self.store, kind, code).await?;
        self.join(principal_id, kind, &entity.id, None).await
    }

    /// Enroll a student directly, performed by the entity's owner.
    pub async fn enroll(
        &self,
        actor: &Principal,
        kind: EntityKind,
        entity_id: &EntityId,
        student_id: &PrincipalId,
    ) -> Result<Entity, NexusError> {
        let entity = fetch_entity(&self.store, kind, entity_id).await?;
        require(actor, Some(&entity), Action::EnrollStudent)?;
        self.join(student_id, kind, entity_id, None).await
    }

    /// Principals whose joined set contains the entity. The owner is not included.
    pub async fn members(
        &self,
        kind: EntityKind,
        entity_id: &EntityId,
    ) -> Result<Vec<Principal>, NexusError> {
        Ok(self
            .store
            .principals_with(MembershipSet::Joined(kind), entity_id)
            .await?)
    }

    /// Recompute the member counter from the joined sets and return the corrected count.
    ///
    /// Repairs counters written outside of transactions, for example by older clients.
    pub async fn reconcile(
        &self,
        kind: EntityKind,
        entity_id: &EntityId,
    ) -> Result<u64, NexusError> {
        let entity = fetch_entity(&self.store, kind, entity_id).await?;
        let members = self.members(kind, entity_id).await?.len() as u64;

        if entity.counters.members != members {
            warn!(
                %kind,
                id = %entity_id,
                stored = entity.counters.members,
                actual = members,
                "repairing member counter"
            );
            if !self
                .store
                .set_counter(kind, entity_id, Counter::Members, members)
                .await?
            {
                return Err(NexusError::NotFound);
            }
        }

        Ok(members)
    }
}
