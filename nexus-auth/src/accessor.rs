// SPDX-License-Identifier: MIT OR Apache-2.0

//! Creating, reading, updating, deleting and listing entities of all kinds.
use nexus_core::{
    Collaborator, ContentKind, Entity, EntityDetails, EntityId, EntityKind, EntityPatch,
    MembershipSet, NewEntity, PROJECT_LEAD_ROLE, Principal,
};
use nexus_store::{
    ContentQuery, DocumentStore, EntityQuery, EntityStore, StoreError, Transaction,
    TransactionError, Write,
};
use rand::Rng;
use rand::rngs::StdRng;
use tracing::{debug, warn};

use crate::access::{Action, require};
use crate::codes::CodeGenerator;
use crate::config::Config;
use crate::error::NexusError;

/// Get an entity or fail with [`NexusError::NotFound`].
pub(crate) async fn fetch_entity<S>(
    store: &S,
    kind: EntityKind,
    id: &EntityId,
) -> Result<Entity, NexusError>
where
    S: EntityStore,
{
    store
        .get_entity(kind, id)
        .await?
        .ok_or(NexusError::NotFound)
}

/// Entity store accessor.
///
/// All calls go straight to the store, nothing is cached and failing store requests are not
/// retried.
#[derive(Clone, Debug)]
pub struct EntityAccessor<S, R = StdRng> {
    store: S,
    codes: CodeGenerator<R>,
    config: Config,
}

impl<S, R> EntityAccessor<S, R>
where
    S: DocumentStore,
    R: Rng,
{
    pub fn new(store: S, codes: CodeGenerator<R>, config: Config) -> Self {
        Self {
            store,
            codes,
            config,
        }
    }

    /// Create an entity owned by the actor. The kind follows from the details.
    ///
    /// Resources and courses can only be created by teachers. The entity receives a fresh access
    /// code, colliding codes are regenerated up to the configured number of attempts. Projects
    /// list their owner as first collaborator with the "Project Lead" role.
    ///
    /// The entity and the owner's set entry are written in one transaction, a missing owner
    /// record leaves nothing behind.
    pub async fn create(
        &self,
        actor: &Principal,
        mut details: EntityDetails,
    ) -> Result<Entity, NexusError> {
        let kind = details.kind();
        require(actor, None, Action::CreateEntity(kind))?;

        if let Some(project) = details.as_project_mut() {
            project
                .collaborators
                .retain(|collaborator| collaborator.principal_id != actor.id);
            project.collaborators.insert(
                0,
                Collaborator {
                    principal_id: actor.id.clone(),
                    name: actor.name(),
                    role: PROJECT_LEAD_ROLE.to_string(),
                },
            );
        }

        let mut created = None;
        for attempt in 1..=self.config.code_attempts {
            let id = EntityId::random(&mut rand::rng());
            let new_entity = NewEntity {
                owner_id: actor.id.clone(),
                owner_name: actor.name(),
                access_code: self.codes.generate(kind.code_format()),
                details: details.clone(),
            };

            let mut tx = self.store.begin().await?;
            tx.stage(Write::InsertEntity {
                id,
                entity: new_entity,
            });
            tx.stage(Write::AddToSet {
                principal: actor.id.clone(),
                set: MembershipSet::Owned(kind),
                entity: id,
                must_change: false,
            });

            match tx.commit().await {
                Ok(()) => {
                    created = Some(id);
                    break;
                }
                Err(TransactionError::Conflict(write)) => match *write {
                    Write::InsertEntity { .. } => debug!(%kind, attempt, "access code collision"),
                    _ => {
                        warn!(%kind, owner = %actor.id, "owner record missing, entity not created");
                        return Err(NexusError::CollaboratorUnavailable(
                            StoreError::MissingDocument(actor.id.to_string()),
                        ));
                    }
                },
                Err(TransactionError::Store(err)) => return Err(err.into()),
            }
        }

        let Some(id) = created else {
            warn!(%kind, attempts = self.config.code_attempts, "no free access code found");
            return Err(NexusError::CodeSpaceExhausted);
        };
        let entity = fetch_entity(&self.store, kind, &id).await?;

        debug!(
            %kind,
            id = %entity.id,
            code = %entity.access_code,
            owner = %actor.id,
            "created entity"
        );

        Ok(entity)
    }

    pub async fn get(&self, kind: EntityKind, id: &EntityId) -> Result<Entity, NexusError> {
        fetch_entity(&self.store, kind, id).await
    }

    /// Apply a partial update and return the updated entity.
    ///
    /// Resources and courses can only be updated by their owner. Collaborators may update
    /// projects, except the category which stays owner-only.
    pub async fn update(
        &self,
        actor: &Principal,
        kind: EntityKind,
        id: &EntityId,
        patch: &EntityPatch,
    ) -> Result<Entity, NexusError> {
        if patch.is_empty() {
            return Err(NexusError::Invalid("update without any changes".into()));
        }

        let entity = fetch_entity(&self.store, kind, id).await?;
        let action = match kind {
            EntityKind::Project if !patch.touches_owner_fields() => Action::EditProject,
            _ => Action::UpdateEntity,
        };
        require(actor, Some(&entity), action)?;

        if !self.store.update_entity(kind, id, patch).await? {
            return Err(NexusError::NotFound);
        }

        debug!(%kind, %id, actor = %actor.id, "updated entity");
        fetch_entity(&self.store, kind, id).await
    }

    /// Delete an entity owned by the actor.
    ///
    /// The store removes the entity id from the owner's and every member's sets, from stars and
    /// likes, deletes all owned content and releases the access code in one transaction. Joins
    /// racing the delete are swept as well.
    pub async fn delete(
        &self,
        actor: &Principal,
        kind: EntityKind,
        id: &EntityId,
    ) -> Result<(), NexusError> {
        let entity = fetch_entity(&self.store, kind, id).await?;
        require(actor, Some(&entity), Action::DeleteEntity)?;

        let mut tx = self.store.begin().await?;
        tx.stage(Write::DeleteEntity {
            kind,
            entity: *id,
        });

        match tx.commit().await {
            Ok(()) => {
                debug!(%kind, %id, "deleted entity");
                Ok(())
            }
            // Someone else deleted the entity in the meantime.
            Err(TransactionError::Conflict(_)) => Err(NexusError::NotFound),
            Err(TransactionError::Store(err)) => Err(err.into()),
        }
    }

    pub async fn list(
        &self,
        kind: EntityKind,
        query: &EntityQuery,
    ) -> Result<Vec<Entity>, NexusError> {
        Ok(self.store.query_entities(kind, query).await?)
    }

    /// Fetch many entities, split into batched gets the store accepts.
    ///
    /// Missing entities are skipped, the order of the requested ids is kept.
    pub async fn get_many(
        &self,
        kind: EntityKind,
        ids: &[EntityId],
    ) -> Result<Vec<Entity>, NexusError> {
        let mut entities = Vec::with_capacity(ids.len());
        for chunk in ids.chunks(self.config.effective_batch_size()) {
            entities.extend(self.store.get_entities(kind, chunk).await?);
        }
        Ok(entities)
    }

    /// Entities of the given kind created by the principal.
    pub async fn owned_by(
        &self,
        principal: &Principal,
        kind: EntityKind,
    ) -> Result<Vec<Entity>, NexusError> {
        self.entities_in(principal, MembershipSet::Owned(kind), kind)
            .await
    }

    /// Entities of the given kind the principal enrolled in or collaborates on.
    pub async fn joined_by(
        &self,
        principal: &Principal,
        kind: EntityKind,
    ) -> Result<Vec<Entity>, NexusError> {
        self.entities_in(principal, MembershipSet::Joined(kind), kind)
            .await
    }

    /// Resources starred by the principal.
    pub async fn starred_by(&self, principal: &Principal) -> Result<Vec<Entity>, NexusError> {
        self.entities_in(principal, MembershipSet::StarredResources, EntityKind::Resource)
            .await
    }

    /// Projects liked by the principal.
    pub async fn liked_by(&self, principal: &Principal) -> Result<Vec<Entity>, NexusError> {
        self.entities_in(principal, MembershipSet::LikedProjects, EntityKind::Project)
            .await
    }

    async fn entities_in(
        &self,
        principal: &Principal,
        set: MembershipSet,
        kind: EntityKind,
    ) -> Result<Vec<Entity>, NexusError> {
        let ids: Vec<EntityId> = principal.memberships.get(set).iter().copied().collect();
        self.get_many(kind, &ids).await
    }

    /// Number of owned content items of a kind, used by dashboards.
    pub async fn count_content(
        &self,
        entity: &Entity,
        kind: ContentKind,
    ) -> Result<usize, NexusError> {
        let content = self
            .store
            .query_content(&ContentQuery::new(entity.id, kind))
            .await?;
        Ok(content.len())
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use nexus_core::{
        ContentBody, ContentKind, EntityDetails, EntityKind, EntityPatch, MembershipSet,
        NewContent, PROJECT_LEAD_ROLE, Principal, ProjectDetails, ProjectStatus,
    };
    use nexus_store::test_utils::{student, teacher};
    use nexus_store::{
        ContentQuery, ContentStore, EntityQuery, EntityStore, MemoryStore, Order, PrincipalStore,
        StoreError,
    };
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    use crate::access::DenyReason;
    use crate::codes::CodeGenerator;
    use crate::{Config, NexusError};

    use super::EntityAccessor;

    fn accessor(store: &MemoryStore, seed: u8) -> EntityAccessor<MemoryStore, ChaCha20Rng> {
        EntityAccessor::new(
            store.clone(),
            CodeGenerator::from_rng(ChaCha20Rng::from_seed([seed; 32])),
            Config::default(),
        )
    }

    fn resource_details(subject: &str) -> EntityDetails {
        EntityDetails::Resource {
            name: "Databases".into(),
            subject: subject.into(),
            description: "Relational algebra and SQL".into(),
        }
    }

    fn project_details() -> EntityDetails {
        EntityDetails::Project(ProjectDetails {
            title: "Study Buddy".into(),
            description: "Match students by course".into(),
            category: "Web".into(),
            tech: vec!["Rust".into()],
            ..Default::default()
        })
    }

    async fn principal(store: &MemoryStore, principal: Principal) -> Principal {
        store.insert_principal(principal.clone()).await.unwrap();
        principal
    }

    async fn refreshed(store: &MemoryStore, principal: &Principal) -> Principal {
        store.get_principal(&principal.id).await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn teachers_create_resources() {
        let store = MemoryStore::new();
        let accessor = accessor(&store, 1);
        let alice = principal(&store, teacher("alice")).await;
        let sam = principal(&store, student("sam")).await;

        let resource = accessor
            .create(&alice, resource_details("CS"))
            .await
            .unwrap();
        assert_eq!(resource.kind(), EntityKind::Resource);
        assert_eq!(resource.owner_id, alice.id);
        assert_eq!(resource.access_code.as_str().len(), 6);
        assert_eq!(resource.counters.members, 0);

        let alice = refreshed(&store, &alice).await;
        assert!(
            alice
                .memberships
                .contains(MembershipSet::Owned(EntityKind::Resource), &resource.id)
        );

        assert_matches!(
            accessor.create(&sam, resource_details("CS")).await,
            Err(NexusError::Denied(DenyReason::NotInstructor))
        );
    }

    #[tokio::test]
    async fn students_create_projects_as_lead() {
        let store = MemoryStore::new();
        let accessor = accessor(&store, 1);
        let sam = principal(&store, student("sam")).await;

        let project = accessor.create(&sam, project_details()).await.unwrap();
        let details = project.details.as_project().unwrap();
        assert_eq!(details.collaborators.len(), 1);
        assert_eq!(details.collaborators[0].principal_id, sam.id);
        assert_eq!(details.collaborators[0].role, PROJECT_LEAD_ROLE);
        assert_eq!(details.status, ProjectStatus::Open);

        // The lead is never counted as member.
        assert_eq!(project.counters.members, 0);
    }

    #[tokio::test]
    async fn colliding_codes_are_regenerated() {
        let store = MemoryStore::new();
        let alice = principal(&store, teacher("alice")).await;

        let first = accessor(&store, 7)
            .create(&alice, resource_details("CS"))
            .await
            .unwrap();

        // Same seed produces the same first code, which is taken by now.
        let second = accessor(&store, 7)
            .create(&alice, resource_details("CS"))
            .await
            .unwrap();
        assert_ne!(first.access_code, second.access_code);
    }

    #[tokio::test]
    async fn code_space_exhausted() {
        let store = MemoryStore::new();
        let alice = principal(&store, teacher("alice")).await;
        accessor(&store, 7)
            .create(&alice, resource_details("CS"))
            .await
            .unwrap();

        let single_attempt = EntityAccessor::new(
            store.clone(),
            CodeGenerator::from_rng(ChaCha20Rng::from_seed([7; 32])),
            Config {
                code_attempts: 1,
                ..Default::default()
            },
        );
        assert_matches!(
            single_attempt.create(&alice, resource_details("CS")).await,
            Err(NexusError::CodeSpaceExhausted)
        );
    }

    #[tokio::test]
    async fn missing_owner_record_leaves_nothing_behind() {
        let store = MemoryStore::new();
        // Never written to the store.
        let alice = teacher("alice");

        assert_matches!(
            accessor(&store, 7).create(&alice, resource_details("CS")).await,
            Err(NexusError::CollaboratorUnavailable(StoreError::MissingDocument(ref id)))
                if id == "alice"
        );
        assert!(
            accessor(&store, 7)
                .list(EntityKind::Resource, &EntityQuery::new())
                .await
                .unwrap()
                .is_empty()
        );

        // The same code can be handed out once the owner exists.
        let alice = principal(&store, alice).await;
        let resource = accessor(&store, 7)
            .create(&alice, resource_details("CS"))
            .await
            .unwrap();
        let all = accessor(&store, 7)
            .list(EntityKind::Resource, &EntityQuery::new())
            .await
            .unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, resource.id);
    }

    #[tokio::test]
    async fn updates_are_gated() {
        let store = MemoryStore::new();
        let accessor = accessor(&store, 1);
        let alice = principal(&store, teacher("alice")).await;
        let tom = principal(&store, teacher("tom")).await;
        let paula = principal(&store, student("paula")).await;

        let resource = accessor
            .create(&alice, resource_details("CS"))
            .await
            .unwrap();
        let patch = EntityPatch {
            title: Some("Advanced Databases".into()),
            ..Default::default()
        };
        assert_matches!(
            accessor
                .update(&tom, EntityKind::Resource, &resource.id, &patch)
                .await,
            Err(NexusError::Denied(DenyReason::NotOwner))
        );
        let updated = accessor
            .update(&alice, EntityKind::Resource, &resource.id, &patch)
            .await
            .unwrap();
        assert_eq!(updated.details.title(), "Advanced Databases");
        assert_matches!(
            accessor
                .update(&alice, EntityKind::Resource, &resource.id, &EntityPatch::default())
                .await,
            Err(NexusError::Invalid(_))
        );

        // Collaborators edit projects but not their category.
        let project = accessor.create(&paula, project_details()).await.unwrap();
        store
            .add_to_set(&tom.id, MembershipSet::Joined(EntityKind::Project), &project.id)
            .await
            .unwrap();
        let tom = refreshed(&store, &tom).await;

        let status = EntityPatch {
            status: Some(ProjectStatus::InProgress),
            ..Default::default()
        };
        accessor
            .update(&tom, EntityKind::Project, &project.id, &status)
            .await
            .unwrap();

        let category = EntityPatch {
            category: Some("Games".into()),
            ..Default::default()
        };
        assert_matches!(
            accessor
                .update(&tom, EntityKind::Project, &project.id, &category)
                .await,
            Err(NexusError::Denied(DenyReason::NotOwner))
        );
        assert_matches!(
            accessor
                .update(&alice, EntityKind::Project, &project.id, &status)
                .await,
            Err(NexusError::Denied(DenyReason::NotMember))
        );
    }

    #[tokio::test]
    async fn delete_cascades() {
        let store = MemoryStore::new();
        let accessor = accessor(&store, 1);
        let alice = principal(&store, teacher("alice")).await;
        let sam = principal(&store, student("sam")).await;

        let resource = accessor
            .create(&alice, resource_details("CS"))
            .await
            .unwrap();
        for set in [
            MembershipSet::Joined(EntityKind::Resource),
            MembershipSet::StarredResources,
        ] {
            store.add_to_set(&sam.id, set, &resource.id).await.unwrap();
        }
        store
            .insert_content(NewContent {
                parent: resource.id,
                author_id: alice.id.clone(),
                author_name: alice.name(),
                body: ContentBody::Announcement {
                    text: "Welcome".into(),
                },
            })
            .await
            .unwrap();

        assert_matches!(
            accessor
                .delete(&sam, EntityKind::Resource, &resource.id)
                .await,
            Err(NexusError::Denied(DenyReason::NotOwner))
        );

        let alice = refreshed(&store, &alice).await;
        accessor
            .delete(&alice, EntityKind::Resource, &resource.id)
            .await
            .unwrap();

        assert_matches!(
            accessor.get(EntityKind::Resource, &resource.id).await,
            Err(NexusError::NotFound)
        );
        let sam = refreshed(&store, &sam).await;
        assert!(sam.memberships.enrolled_resources.is_empty());
        assert!(sam.memberships.starred_resources.is_empty());
        let alice = refreshed(&store, &alice).await;
        assert!(alice.memberships.owned_resources.is_empty());

        let remaining = store
            .query_content(&ContentQuery::new(resource.id, ContentKind::Announcement))
            .await
            .unwrap();
        assert!(remaining.is_empty());

        // The access code is free again.
        assert!(
            store
                .find_by_code(EntityKind::Resource, &resource.access_code)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn list_and_batched_lookups() {
        let store = MemoryStore::new();
        let accessor = EntityAccessor::new(
            store.clone(),
            CodeGenerator::from_rng(ChaCha20Rng::from_seed([3; 32])),
            Config {
                batch_size: 3,
                ..Default::default()
            },
        );
        let alice = principal(&store, teacher("alice")).await;

        let mut created = Vec::new();
        for i in 0..12 {
            let subject = if i % 2 == 0 { "Math" } else { "Physics" };
            created.push(
                accessor
                    .create(&alice, resource_details(subject))
                    .await
                    .unwrap(),
            );
        }

        let math = accessor
            .list(
                EntityKind::Resource,
                &EntityQuery::new().subject("Math").order(Order::Ascending),
            )
            .await
            .unwrap();
        assert_eq!(math.len(), 6);
        assert_eq!(math[0].id, created[0].id);

        // More ids than fit into one batch.
        let alice = refreshed(&store, &alice).await;
        let owned = accessor
            .owned_by(&alice, EntityKind::Resource)
            .await
            .unwrap();
        assert_eq!(owned.len(), 12);
        assert!(
            accessor
                .joined_by(&alice, EntityKind::Resource)
                .await
                .unwrap()
                .is_empty()
        );

        let count = accessor
            .count_content(&created[0], ContentKind::Material)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }
}
