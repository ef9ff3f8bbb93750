// SPDX-License-Identifier: MIT OR Apache-2.0

use nexus_auth::{
    Action, CodeGenerator, Config, ContentBoard, EntityAccessor, Favourites, GradeEntry,
    IdentityResolver, MembershipLedger, NexusError, StudentGrades, require,
};
use nexus_core::{
    Content, ContentKind, Entity, EntityDetails, EntityId, EntityKind, EntityPatch,
    MilestoneStatus, Principal, PrincipalId, PrincipalPatch,
};
use nexus_store::{DocumentStore, EntityQuery, FederatedProvider, IdentityProvider};
use rand::Rng;
use rand::rngs::StdRng;
use tracing::debug;

use crate::builder::NexusBuilder;

/// Resource or course shown on an instructor's dashboard.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DashboardEntry {
    pub entity: Entity,
    pub assignments: usize,
    pub materials: usize,
}

/// Skill Nexus service.
///
/// Methods without explicit actor act on behalf of the principal currently signed in with the
/// identity provider and fail with [`NexusError::Unauthenticated`] when nobody is.
#[derive(Clone, Debug)]
pub struct Nexus<S, I, R = StdRng> {
    identity: IdentityResolver<S, I>,
    entities: EntityAccessor<S, R>,
    ledger: MembershipLedger<S>,
    content: ContentBoard<S>,
    favourites: Favourites<S>,
    config: Config,
}

impl<S, I> Nexus<S, I>
where
    S: DocumentStore,
    I: IdentityProvider,
{
    pub fn builder(store: S, identity: I) -> NexusBuilder<S, I> {
        NexusBuilder::new(store, identity)
    }

    /// Service with default configuration and access codes from an OS-seeded generator.
    pub fn new(store: S, identity: I) -> Self {
        Self::builder(store, identity).build()
    }
}

impl<S, I, R> Nexus<S, I, R>
where
    S: DocumentStore,
    I: IdentityProvider,
    R: Rng,
{
    pub(crate) fn from_parts(
        store: S,
        identity: I,
        codes: CodeGenerator<R>,
        config: Config,
    ) -> Self {
        Self {
            identity: IdentityResolver::new(store.clone(), identity),
            entities: EntityAccessor::new(store.clone(), codes, config.clone()),
            ledger: MembershipLedger::new(store.clone()),
            content: ContentBoard::new(store.clone()).with_message_limit(config.message_limit),
            favourites: Favourites::new(store),
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn identity(&self) -> &IdentityResolver<S, I> {
        &self.identity
    }

    pub fn entities(&self) -> &EntityAccessor<S, R> {
        &self.entities
    }

    pub fn ledger(&self) -> &MembershipLedger<S> {
        &self.ledger
    }

    pub fn content(&self) -> &ContentBoard<S> {
        &self.content
    }

    pub fn favourites(&self) -> &Favourites<S> {
        &self.favourites
    }

    // Identity

    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<Principal, NexusError> {
        self.identity.sign_up(email, password, display_name).await
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Principal, NexusError> {
        self.identity.sign_in(email, password).await
    }

    pub async fn federated_sign_in(
        &self,
        provider: FederatedProvider,
        token: &str,
    ) -> Result<Principal, NexusError> {
        self.identity.federated_sign_in(provider, token).await
    }

    pub async fn sign_out(&self) -> Result<(), NexusError> {
        self.identity.sign_out().await
    }

    pub async fn reset_password(&self, email: &str) -> Result<(), NexusError> {
        self.identity.reset_password(email).await
    }

    /// The signed in principal with up-to-date membership sets.
    pub async fn current(&self) -> Result<Principal, NexusError> {
        self.identity.current().await
    }

    pub async fn update_profile(&self, patch: &PrincipalPatch) -> Result<Principal, NexusError> {
        self.identity.update_profile(patch).await
    }

    // Entities

    pub async fn create(&self, details: EntityDetails) -> Result<Entity, NexusError> {
        let actor = self.current().await?;
        self.entities.create(&actor, details).await
    }

    /// Get an entity and count the view.
    pub async fn view(&self, kind: EntityKind, id: &EntityId) -> Result<Entity, NexusError> {
        self.favourites.record_view(kind, id).await?;
        self.entities.get(kind, id).await
    }

    pub async fn update(
        &self,
        kind: EntityKind,
        id: &EntityId,
        patch: &EntityPatch,
    ) -> Result<Entity, NexusError> {
        let actor = self.current().await?;
        self.entities.update(&actor, kind, id, patch).await
    }

    pub async fn delete(&self, kind: EntityKind, id: &EntityId) -> Result<(), NexusError> {
        let actor = self.current().await?;
        self.entities.delete(&actor, kind, id).await
    }

    pub async fn list(
        &self,
        kind: EntityKind,
        query: &EntityQuery,
    ) -> Result<Vec<Entity>, NexusError> {
        self.entities.list(kind, query).await
    }

    /// Entities of the given kind created by the signed in principal.
    pub async fn owned(&self, kind: EntityKind) -> Result<Vec<Entity>, NexusError> {
        let actor = self.current().await?;
        self.entities.owned_by(&actor, kind).await
    }

    /// Entities of the given kind the signed in principal joined.
    pub async fn joined(&self, kind: EntityKind) -> Result<Vec<Entity>, NexusError> {
        let actor = self.current().await?;
        self.entities.joined_by(&actor, kind).await
    }

    /// Owned resources and courses of the signed in teacher with content statistics.
    pub async fn instructor_dashboard(&self) -> Result<Vec<DashboardEntry>, NexusError> {
        let actor = self.current().await?;
        require(&actor, None, Action::InstructorDashboard)?;

        let mut entries = Vec::new();
        for kind in [EntityKind::Resource, EntityKind::Course] {
            for entity in self.entities.owned_by(&actor, kind).await? {
                let assignments = self
                    .entities
                    .count_content(&entity, ContentKind::Assignment)
                    .await?;
                let materials = self
                    .entities
                    .count_content(&entity, ContentKind::Material)
                    .await?;
                entries.push(DashboardEntry {
                    entity,
                    assignments,
                    materials,
                });
            }
        }

        debug!(principal = %actor.id, entries = entries.len(), "built instructor dashboard");
        Ok(entries)
    }

    // Membership

    /// Join an entity by id. Project collaborators can pick their role.
    pub async fn join(
        &self,
        kind: EntityKind,
        id: &EntityId,
        role: Option<&str>,
    ) -> Result<Entity, NexusError> {
        let actor = self.current().await?;
        self.ledger.join(&actor.id, kind, id, role).await
    }

    /// Join an entity by its access code.
    pub async fn enroll_by_code(&self, kind: EntityKind, code: &str) -> Result<Entity, NexusError> {
        let actor = self.current().await?;
        self.ledger.enroll_by_code(&actor.id, kind, code).await
    }

    /// Enroll another principal into an entity owned by the signed in principal.
    pub async fn enroll(
        &self,
        kind: EntityKind,
        id: &EntityId,
        student_id: &PrincipalId,
    ) -> Result<Entity, NexusError> {
        let actor = self.current().await?;
        self.ledger.enroll(&actor, kind, id, student_id).await
    }

    pub async fn leave(&self, project_id: &EntityId) -> Result<Entity, NexusError> {
        let actor = self.current().await?;
        self.ledger.leave(&actor.id, project_id).await
    }

    pub async fn members(
        &self,
        kind: EntityKind,
        id: &EntityId,
    ) -> Result<Vec<Principal>, NexusError> {
        self.ledger.members(kind, id).await
    }

    // Favourites and chat

    pub async fn toggle_star(&self, resource_id: &EntityId) -> Result<bool, NexusError> {
        let actor = self.current().await?;
        self.favourites.toggle_star(&actor.id, resource_id).await
    }

    pub async fn toggle_like(&self, project_id: &EntityId) -> Result<bool, NexusError> {
        let actor = self.current().await?;
        self.favourites.toggle_like(&actor.id, project_id).await
    }

    pub async fn post_message(
        &self,
        project_id: &EntityId,
        text: &str,
    ) -> Result<Content, NexusError> {
        let actor = self.current().await?;
        self.content.post_message(&actor, project_id, text).await
    }

    pub async fn messages(&self, project_id: &EntityId) -> Result<Vec<Content>, NexusError> {
        self.content.messages(project_id, None).await
    }

    pub async fn update_milestone(
        &self,
        project_id: &EntityId,
        index: usize,
        status: MilestoneStatus,
    ) -> Result<Entity, NexusError> {
        let actor = self.current().await?;
        self.content
            .update_milestone(&actor, project_id, index, status)
            .await
    }

    // Grades

    /// Submitted assignments of the signed in principal with their grades.
    pub async fn grades(
        &self,
        kind: EntityKind,
        id: &EntityId,
    ) -> Result<Vec<GradeEntry>, NexusError> {
        let actor = self.current().await?;
        self.content.student_grades(&actor, kind, id).await
    }

    /// Grades of all enrolled students, for the owner.
    pub async fn gradebook(
        &self,
        kind: EntityKind,
        id: &EntityId,
    ) -> Result<Vec<StudentGrades>, NexusError> {
        let actor = self.current().await?;
        self.content.gradebook(&actor, kind, id).await
    }
}
