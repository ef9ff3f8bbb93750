// SPDX-License-Identifier: MIT OR Apache-2.0

use nexus_core::EntityKind;
use tracing::debug;

use crate::error::{StoreError, TransactionError};
use crate::memory::{InnerMemoryStore, MemoryStore};
use crate::transactions::{Transaction, WritableStore, Write};

/// Write transaction on the in-memory store.
///
/// On commit all staged writes are applied to a copy of the store state under one write lock.
/// The copy only replaces the state when every write succeeded.
#[derive(Debug)]
pub struct MemoryTransaction {
    store: MemoryStore,
    writes: Vec<Write>,
}

impl InnerMemoryStore {
    /// Apply a single write. Returns `false` when a precondition does not hold.
    fn apply(&mut self, write: &Write) -> bool {
        match write {
            Write::InsertEntity { id, entity } => self.add_entity(*id, entity.clone()).is_some(),
            Write::AddToSet {
                principal,
                set,
                entity,
                must_change,
            } => {
                let Some(principal) = self.principals.get_mut(principal) else {
                    return false;
                };
                let changed = principal.memberships.get_mut(*set).insert(*entity);
                changed || !must_change
            }
            Write::RemoveFromSet {
                principal,
                set,
                entity,
                must_change,
            } => {
                let Some(principal) = self.principals.get_mut(principal) else {
                    return false;
                };
                let changed = principal.memberships.get_mut(*set).remove(entity);
                changed || !must_change
            }
            Write::Increment {
                kind,
                entity,
                counter,
                delta,
            } => {
                let Some(entity) = self.entity_mut(*kind, entity) else {
                    return false;
                };
                entity.counters.apply(*counter, *delta);
                true
            }
            Write::AddCollaborator {
                project,
                collaborator,
            } => {
                let Some(project) = self
                    .entity_mut(EntityKind::Project, project)
                    .and_then(|entity| entity.details.as_project_mut())
                else {
                    return false;
                };
                if project.collaborator(&collaborator.principal_id).is_none() {
                    project.collaborators.push(collaborator.clone());
                }
                true
            }
            Write::RemoveCollaborator { project, principal } => {
                let Some(project) = self
                    .entity_mut(EntityKind::Project, project)
                    .and_then(|entity| entity.details.as_project_mut())
                else {
                    return false;
                };
                project
                    .collaborators
                    .retain(|collaborator| &collaborator.principal_id != principal);
                true
            }
            Write::SetMilestoneStatus {
                project,
                index,
                status,
            } => {
                let updated_at = self.next_timestamp();
                let Some(entity) = self.entity_mut(EntityKind::Project, project) else {
                    return false;
                };
                let changed = entity
                    .details
                    .as_project_mut()
                    .is_some_and(|project| project.set_milestone_status(*index, *status));
                entity.updated_at = Some(updated_at);
                changed
            }
            Write::DeleteEntity { kind, entity } => self.remove_entity(*kind, entity).is_some(),
            Write::DeleteContent { id } => {
                self.remove_content(id);
                true
            }
        }
    }
}

impl Transaction for MemoryTransaction {
    fn stage(&mut self, write: Write) {
        self.writes.push(write);
    }

    fn len(&self) -> usize {
        self.writes.len()
    }

    async fn commit(self) -> Result<(), TransactionError> {
        let mut store = self.store.write_store()?;
        let mut draft = store.clone();

        for write in &self.writes {
            if !draft.apply(write) {
                debug!(?write, "abort transaction");
                return Err(TransactionError::Conflict(Box::new(write.clone())));
            }
        }

        *store = draft;
        Ok(())
    }

    async fn rollback(self) -> Result<(), StoreError> {
        Ok(())
    }
}

impl WritableStore for MemoryStore {
    type Transaction = MemoryTransaction;

    async fn begin(&self) -> Result<Self::Transaction, StoreError> {
        self.check_available()?;
        Ok(MemoryTransaction {
            store: self.clone(),
            writes: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use nexus_core::{
        Collaborator, ContentBody, ContentKind, Counter, EntityDetails, EntityId, EntityKind,
        MembershipSet, Milestone, MilestoneStatus, NewContent, PrincipalId, ProjectDetails,
    };

    use crate::test_utils::{new_project, new_resource, student};
    use crate::{
        ContentQuery, ContentStore, EntityStore, MemoryStore, PrincipalStore, Transaction,
        TransactionError, WritableStore, Write,
    };

    #[tokio::test]
    async fn commit_applies_all_writes() {
        let store = MemoryStore::new();
        store.insert_principal(student("bob")).await.unwrap();
        let project = store
            .insert_entity(new_project("ada", "ABCDEF"))
            .await
            .unwrap()
            .unwrap();
        let bob = PrincipalId::from("bob");

        let mut tx = store.begin().await.unwrap();
        tx.stage(Write::AddToSet {
            principal: bob.clone(),
            set: MembershipSet::Joined(EntityKind::Project),
            entity: project.id,
            must_change: true,
        });
        tx.stage(Write::Increment {
            kind: EntityKind::Project,
            entity: project.id,
            counter: Counter::Members,
            delta: 1,
        });
        tx.stage(Write::AddCollaborator {
            project: project.id,
            collaborator: Collaborator {
                principal_id: bob.clone(),
                name: "Bob".into(),
                role: "Developer".into(),
            },
        });
        assert_eq!(tx.len(), 3);

        // Nothing is visible before commit.
        let principal = store.get_principal(&bob).await.unwrap().unwrap();
        assert!(!principal.is_member_of(EntityKind::Project, &project.id));

        tx.commit().await.unwrap();

        let principal = store.get_principal(&bob).await.unwrap().unwrap();
        assert!(principal.is_member_of(EntityKind::Project, &project.id));
        let project = store
            .get_entity(EntityKind::Project, &project.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(project.counters.members, 1);
        assert!(project.details.as_project().unwrap().collaborator(&bob).is_some());
    }

    #[tokio::test]
    async fn conflict_aborts_everything() {
        let store = MemoryStore::new();
        store.insert_principal(student("bob")).await.unwrap();
        let project = store
            .insert_entity(new_project("ada", "ABCDEF"))
            .await
            .unwrap()
            .unwrap();
        let bob = PrincipalId::from("bob");
        let set = MembershipSet::Joined(EntityKind::Project);
        store.add_to_set(&bob, set, &project.id).await.unwrap();

        let mut tx = store.begin().await.unwrap();
        tx.stage(Write::Increment {
            kind: EntityKind::Project,
            entity: project.id,
            counter: Counter::Members,
            delta: 1,
        });
        tx.stage(Write::AddToSet {
            principal: bob,
            set,
            entity: project.id,
            must_change: true,
        });

        let result = tx.commit().await;
        assert!(matches!(result, Err(TransactionError::Conflict(_))));

        // The increment staged before the conflicting write was not applied.
        let project = store
            .get_entity(EntityKind::Project, &project.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(project.counters.members, 0);
    }

    #[tokio::test]
    async fn delete_inside_transaction_releases_code() {
        let store = MemoryStore::new();
        let project = store
            .insert_entity(new_project("ada", "ABCDEF"))
            .await
            .unwrap()
            .unwrap();

        let mut tx = store.begin().await.unwrap();
        tx.stage(Write::DeleteEntity {
            kind: EntityKind::Project,
            entity: project.id,
        });
        tx.commit().await.unwrap();

        assert!(
            store
                .get_entity(EntityKind::Project, &project.id)
                .await
                .unwrap()
                .is_none()
        );
        assert!(
            store
                .insert_entity(new_project("ada", "ABCDEF"))
                .await
                .unwrap()
                .is_some()
        );
    }

    #[tokio::test]
    async fn rollback_discards_writes() {
        let store = MemoryStore::new();
        let project = store
            .insert_entity(new_project("ada", "ABCDEF"))
            .await
            .unwrap()
            .unwrap();

        let mut tx = store.begin().await.unwrap();
        tx.stage(Write::DeleteEntity {
            kind: EntityKind::Project,
            entity: project.id,
        });
        tx.rollback().await.unwrap();

        assert!(
            store
                .get_entity(EntityKind::Project, &project.id)
                .await
                .unwrap()
                .is_some()
        );
    }

    #[tokio::test]
    async fn insert_entity_with_owner_set() {
        let store = MemoryStore::new();
        store.insert_principal(student("ada")).await.unwrap();
        let ada = PrincipalId::from("ada");
        let id = EntityId::from_bytes([9; 16]);

        let mut tx = store.begin().await.unwrap();
        tx.stage(Write::InsertEntity {
            id,
            entity: new_project("ada", "ABCDEF"),
        });
        tx.stage(Write::AddToSet {
            principal: ada.clone(),
            set: MembershipSet::Owned(EntityKind::Project),
            entity: id,
            must_change: false,
        });
        tx.commit().await.unwrap();

        let project = store
            .get_entity(EntityKind::Project, &id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(project.access_code.as_str(), "ABCDEF");
        let ada = store.get_principal(&ada).await.unwrap().unwrap();
        assert!(ada.memberships.projects.contains(&id));

        // Same code again conflicts on the insert itself.
        let mut tx = store.begin().await.unwrap();
        let write = Write::InsertEntity {
            id: EntityId::from_bytes([10; 16]),
            entity: new_project("ada", "ABCDEF"),
        };
        tx.stage(write.clone());
        let result = tx.commit().await;
        assert!(matches!(result, Err(TransactionError::Conflict(ref failed)) if **failed == write));
    }

    #[tokio::test]
    async fn insert_without_owner_record_leaves_nothing() {
        let store = MemoryStore::new();
        let id = EntityId::from_bytes([9; 16]);

        let mut tx = store.begin().await.unwrap();
        tx.stage(Write::InsertEntity {
            id,
            entity: new_resource("ada", "ABCDEF"),
        });
        tx.stage(Write::AddToSet {
            principal: PrincipalId::from("ada"),
            set: MembershipSet::Owned(EntityKind::Resource),
            entity: id,
            must_change: false,
        });
        assert!(matches!(
            tx.commit().await,
            Err(TransactionError::Conflict(_))
        ));

        assert!(
            store
                .get_entity(EntityKind::Resource, &id)
                .await
                .unwrap()
                .is_none()
        );
        // The code is still free.
        assert!(
            store
                .insert_entity(new_resource("ada", "ABCDEF"))
                .await
                .unwrap()
                .is_some()
        );
    }

    #[tokio::test]
    async fn delete_sweeps_memberships_joined_after_begin() {
        let store = MemoryStore::new();
        store.insert_principal(student("bob")).await.unwrap();
        let resource = store
            .insert_entity(new_resource("ada", "ABCDEF"))
            .await
            .unwrap()
            .unwrap();
        let bob = PrincipalId::from("bob");

        let mut tx = store.begin().await.unwrap();
        tx.stage(Write::DeleteEntity {
            kind: EntityKind::Resource,
            entity: resource.id,
        });

        // Concurrent join and post land before the delete commits.
        store
            .add_to_set(&bob, MembershipSet::Joined(EntityKind::Resource), &resource.id)
            .await
            .unwrap();
        store
            .add_to_set(&bob, MembershipSet::StarredResources, &resource.id)
            .await
            .unwrap();
        store
            .insert_content(NewContent {
                parent: resource.id,
                author_id: PrincipalId::from("ada"),
                author_name: "ada".into(),
                body: ContentBody::Announcement {
                    text: "Welcome".into(),
                },
            })
            .await
            .unwrap();

        tx.commit().await.unwrap();

        let bob = store.get_principal(&bob).await.unwrap().unwrap();
        assert!(!bob.is_member_of(EntityKind::Resource, &resource.id));
        assert!(bob.memberships.starred_resources.is_empty());
        let announcements = store
            .query_content(&ContentQuery::new(resource.id, ContentKind::Announcement))
            .await
            .unwrap();
        assert!(announcements.is_empty());
    }

    #[tokio::test]
    async fn milestone_status_updates_progress() {
        let store = MemoryStore::new();
        let mut new_entity = new_project("ada", "ABCDEF");
        new_entity.details = EntityDetails::Project(ProjectDetails {
            title: "Campus Rover".into(),
            milestones: vec![Milestone::new("Chassis"), Milestone::new("Navigation")],
            ..Default::default()
        });
        let project = store.insert_entity(new_entity).await.unwrap().unwrap();

        let mut tx = store.begin().await.unwrap();
        tx.stage(Write::SetMilestoneStatus {
            project: project.id,
            index: 0,
            status: MilestoneStatus::Completed,
        });
        tx.commit().await.unwrap();

        let stored = store
            .get_entity(EntityKind::Project, &project.id)
            .await
            .unwrap()
            .unwrap();
        let details = stored.details.as_project().unwrap();
        assert_eq!(details.milestones[0].status, MilestoneStatus::Completed);
        assert_eq!(details.progress, 50);
        assert!(stored.updated_at.is_some());

        let mut tx = store.begin().await.unwrap();
        tx.stage(Write::SetMilestoneStatus {
            project: project.id,
            index: 2,
            status: MilestoneStatus::Completed,
        });
        assert!(matches!(
            tx.commit().await,
            Err(TransactionError::Conflict(_))
        ));
    }
}
